pub mod audio;
pub mod decoder;
pub mod live_texture;
pub mod source;
pub mod types;

pub use audio::AudioOutput;
pub use live_texture::{LiveTexture, SampledFrame};
pub use source::{MediaSource, SharedMedia};
pub use types::{DecodedFrame, MediaEvent, MediaLocator, Readiness};
