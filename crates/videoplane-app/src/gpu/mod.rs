pub mod camera;
pub mod context;
pub mod placeholder;
pub mod surface_pass;
pub mod uniforms;

pub use camera::Camera;
pub use context::GpuContext;
pub use surface_pass::SurfacePass;
