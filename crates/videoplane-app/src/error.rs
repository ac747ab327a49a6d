use thiserror::Error;

/// Errors raised by the scene core. None of these are fatal: the worst outcome
/// is a surface that renders the placeholder or ignores a gesture.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SceneError {
    /// Media or texture is not ready yet (no metadata, no decodable frame).
    #[error("media unavailable: {0}")]
    MediaUnavailable(String),

    /// Malformed user input rejected at the boundary.
    #[error("invalid input: {0}")]
    InputError(String),

    /// A gesture was requested while another one is active.
    #[error("another gesture is already active")]
    GestureConflict,
}

/// Failures of the external transcoding collaborator. These never cross the
/// job boundary; see `transcode::TranscodeJob`.
#[derive(Error, Debug)]
pub enum TranscodeError {
    #[error("ffmpeg not found on PATH")]
    FfmpegNotFound,

    #[error("failed to run ffmpeg: {0}")]
    Spawn(#[from] std::io::Error),

    #[error("ffmpeg exited with {0}")]
    Failed(std::process::ExitStatus),

    #[error("unsupported target format: {0:?}")]
    BadFormat(String),

    #[error("output {} would overwrite the source", .0.display())]
    OutputIsSource(std::path::PathBuf),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scene_error_messages() {
        assert_eq!(
            SceneError::InputError("abc".into()).to_string(),
            "invalid input: abc"
        );
        assert_eq!(
            SceneError::GestureConflict.to_string(),
            "another gesture is already active"
        );
    }
}
