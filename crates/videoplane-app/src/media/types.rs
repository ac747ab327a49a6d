use std::fmt;
use std::path::Path;
use std::sync::Arc;

use crate::error::SceneError;

/// A decoded frame ready for GPU upload.
pub struct DecodedFrame {
    pub data: Vec<u8>, // RGBA8
    pub width: u32,
    pub height: u32,
}

impl DecodedFrame {
    /// Frames with a zero dimension cannot be uploaded.
    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0 || self.data.is_empty()
    }
}

/// Interleaved f32 PCM for a whole clip.
#[derive(Debug, Clone, PartialEq)]
pub struct DecodedAudio {
    pub samples: Vec<f32>,
    pub sample_rate: u32,
    pub channels: u16,
}

impl DecodedAudio {
    /// Number of sample frames (one sample per channel).
    pub fn frames(&self) -> usize {
        self.samples.len() / usize::from(self.channels.max(1))
    }

    pub fn duration_secs(&self) -> f64 {
        if self.sample_rate == 0 {
            return 0.0;
        }
        self.frames() as f64 / f64::from(self.sample_rate)
    }
}

/// A fully pre-decoded clip. Frames are shared so the texture can hold on to
/// the last uploaded one without copying.
pub struct DecodedClip {
    pub width: u32,
    pub height: u32,
    pub fps: f64,
    pub duration_secs: f64,
    pub frames: Vec<Arc<DecodedFrame>>,
    /// `None` when the clip has no audio stream or it failed to decode.
    pub audio: Option<Arc<DecodedAudio>>,
}

impl DecodedClip {
    /// Frame index shown at `time_secs`, clamped to the last frame.
    pub fn frame_index_at(&self, time_secs: f64) -> Option<usize> {
        if self.frames.is_empty() || self.fps <= 0.0 {
            return None;
        }
        let idx = (time_secs.max(0.0) * self.fps).floor() as usize;
        Some(idx.min(self.frames.len() - 1))
    }
}

/// Where a media source comes from: a file path or a URL, passed through to
/// ffmpeg untouched.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MediaLocator(String);

impl MediaLocator {
    pub fn new(locator: impl Into<String>) -> Self {
        Self(locator.into())
    }

    pub fn from_path(path: &Path) -> Self {
        Self(path.to_string_lossy().into_owned())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Last path segment, for display.
    pub fn display_name(&self) -> &str {
        self.0
            .rsplit(['/', '\\'])
            .find(|s| !s.is_empty())
            .unwrap_or(&self.0)
    }
}

impl fmt::Display for MediaLocator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Load state of a media source.
#[derive(Debug, Clone, PartialEq)]
pub enum Readiness {
    /// Metadata and frames not known yet.
    Loading,
    Ready,
    /// Loading failed. The source stays usable but never yields a frame.
    Unavailable(String),
}

/// Emitted by `MediaSource::poll_loader` when the load state changes.
#[derive(Debug, Clone, PartialEq)]
pub enum MediaEvent {
    Ready {
        width: u32,
        height: u32,
        duration_secs: f64,
    },
    Unavailable(SceneError),
}
