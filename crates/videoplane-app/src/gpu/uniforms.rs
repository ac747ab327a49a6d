use bytemuck::{Pod, Zeroable};
use glam::{Mat4, Vec2};

/// Per-draw uniforms for `surface.wgsl` (112 bytes).
/// Must be kept in sync with the WGSL `SurfaceUniforms` struct.
#[repr(C)]
#[derive(Debug, Copy, Clone, Pod, Zeroable)]
pub struct SurfaceUniforms {
    pub view_proj: [[f32; 4]; 4],
    /// center.xy, size.xy
    pub rect: [f32; 4],
    pub color: [f32; 4],
    /// x: 0 = textured quad, 1 = solid disc
    pub mode: [f32; 4],
}

pub const MODE_TEXTURED: f32 = 0.0;
pub const MODE_DISC: f32 = 1.0;

impl SurfaceUniforms {
    pub fn textured(view_proj: Mat4, center: Vec2, size: Vec2) -> Self {
        Self {
            view_proj: view_proj.to_cols_array_2d(),
            rect: [center.x, center.y, size.x, size.y],
            color: [1.0; 4],
            mode: [MODE_TEXTURED, 0.0, 0.0, 0.0],
        }
    }

    pub fn disc(view_proj: Mat4, center: Vec2, diameter: f32, color: [f32; 4]) -> Self {
        Self {
            view_proj: view_proj.to_cols_array_2d(),
            rect: [center.x, center.y, diameter, diameter],
            color,
            mode: [MODE_DISC, 0.0, 0.0, 0.0],
        }
    }
}
