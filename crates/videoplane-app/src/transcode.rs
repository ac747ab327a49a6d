//! Transcoding collaborator. The scene only ever sees "a playable locator" or
//! "no output"; ffmpeg failures stop at the job boundary.

use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use std::sync::atomic::{AtomicU32, Ordering};

use crossbeam_channel::{Receiver, TryRecvError};

use crate::error::TranscodeError;
use crate::media::MediaLocator;

pub trait Transcoder: Send + 'static {
    fn transcode(
        &self,
        source: &MediaLocator,
        target_format: &str,
    ) -> Result<MediaLocator, TranscodeError>;
}

/// Runs `ffmpeg -y -i <source> <output_dir>/<stem>-<n>.<format>`.
pub struct FfmpegTranscoder {
    pub output_dir: PathBuf,
}

impl FfmpegTranscoder {
    pub fn new() -> Self {
        Self {
            output_dir: std::env::temp_dir().join("videoplane"),
        }
    }

    /// Fresh output path for one run. Numbered per process so a transcode of
    /// an earlier output never writes over its own input.
    pub fn output_path(&self, source: &MediaLocator, target_format: &str) -> PathBuf {
        static NEXT: AtomicU32 = AtomicU32::new(1);
        let n = NEXT.fetch_add(1, Ordering::Relaxed);
        self.output_dir
            .join(format!("{}-{n}.{target_format}", output_stem(source)))
    }
}

/// File stem of the source, reduced to characters safe in a file name.
fn output_stem(source: &MediaLocator) -> String {
    let stem: String = Path::new(source.display_name())
        .file_stem()
        .map(|s| s.to_string_lossy())
        .unwrap_or_default()
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_'))
        .collect();
    if stem.is_empty() {
        "output".to_string()
    } else {
        stem
    }
}

impl Default for FfmpegTranscoder {
    fn default() -> Self {
        Self::new()
    }
}

fn valid_format(format: &str) -> bool {
    !format.is_empty() && format.chars().all(|c| c.is_ascii_alphanumeric())
}

impl Transcoder for FfmpegTranscoder {
    fn transcode(
        &self,
        source: &MediaLocator,
        target_format: &str,
    ) -> Result<MediaLocator, TranscodeError> {
        if !valid_format(target_format) {
            return Err(TranscodeError::BadFormat(target_format.to_string()));
        }
        if !crate::media::decoder::ffmpeg_available() {
            return Err(TranscodeError::FfmpegNotFound);
        }
        let output = self.output_path(source, target_format);
        if Path::new(source.as_str()) == output {
            return Err(TranscodeError::OutputIsSource(output));
        }
        std::fs::create_dir_all(&self.output_dir)?;

        let status = Command::new("ffmpeg")
            .args(["-y", "-v", "error", "-i", source.as_str()])
            .arg(&output)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::inherit())
            .status()?;

        if !status.success() {
            return Err(TranscodeError::Failed(status));
        }
        Ok(MediaLocator::from_path(&output))
    }
}

/// Finished job: a playable locator, or nothing.
pub type TranscodeOutcome = Option<MediaLocator>;

/// How a finished job applies to the media currently on screen.
#[derive(Debug, PartialEq, Eq)]
pub enum Completion {
    /// Output is ready and the source is still the current media.
    Replace(MediaLocator),
    Failed,
    /// The user moved on to other media while the job ran.
    Stale,
}

/// A transcode running on its own thread.
pub struct TranscodeJob {
    rx: Receiver<Result<MediaLocator, TranscodeError>>,
    source: MediaLocator,
}

impl TranscodeJob {
    pub fn spawn<T: Transcoder>(
        transcoder: T,
        source: MediaLocator,
        target_format: String,
    ) -> Self {
        let (tx, rx) = crossbeam_channel::bounded(1);
        let job_source = source.clone();
        log::info!("Transcoding started: {source} -> {target_format}");
        let spawned = std::thread::Builder::new()
            .name("transcode".into())
            .spawn(move || {
                let _ = tx.send(transcoder.transcode(&job_source, &target_format));
            });
        if let Err(e) = spawned {
            log::error!("Failed to spawn transcode thread: {e}");
        }
        Self { rx, source }
    }

    /// `None` while running; `Some(outcome)` once finished.
    pub fn poll(&self) -> Option<TranscodeOutcome> {
        match self.rx.try_recv() {
            Ok(Ok(locator)) => {
                log::info!("Transcoding complete: {locator}");
                Some(Some(locator))
            }
            Ok(Err(e)) => {
                log::error!("Error during transcoding of {}: {e}", self.source);
                Some(None)
            }
            Err(TryRecvError::Empty) => None,
            Err(TryRecvError::Disconnected) => {
                log::error!("Transcode thread for {} exited without a result", self.source);
                Some(None)
            }
        }
    }

    /// Like `poll`, but judged against `current`: output for media that is no
    /// longer shown is discarded.
    pub fn completion(&self, current: &MediaLocator) -> Option<Completion> {
        let outcome = self.poll()?;
        if &self.source != current {
            log::info!(
                "Discarding transcode of {}: {} is now open",
                self.source,
                current
            );
            return Some(Completion::Stale);
        }
        Some(match outcome {
            Some(locator) => Completion::Replace(locator),
            None => Completion::Failed,
        })
    }

    pub fn source(&self) -> &MediaLocator {
        &self.source
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::{Duration, Instant};

    struct Fixed(Result<&'static str, ()>);

    impl Transcoder for Fixed {
        fn transcode(&self, _: &MediaLocator, fmt: &str) -> Result<MediaLocator, TranscodeError> {
            match self.0 {
                Ok(out) => Ok(MediaLocator::new(format!("{out}.{fmt}"))),
                Err(()) => Err(TranscodeError::FfmpegNotFound),
            }
        }
    }

    fn wait_completion(job: &TranscodeJob, current: &MediaLocator) -> Completion {
        let deadline = Instant::now() + Duration::from_secs(5);
        loop {
            if let Some(completion) = job.completion(current) {
                return completion;
            }
            assert!(Instant::now() < deadline, "transcode job never finished");
            std::thread::sleep(Duration::from_millis(5));
        }
    }

    fn wait(job: &TranscodeJob) -> TranscodeOutcome {
        let deadline = Instant::now() + Duration::from_secs(5);
        loop {
            if let Some(outcome) = job.poll() {
                return outcome;
            }
            assert!(Instant::now() < deadline, "transcode job never finished");
            std::thread::sleep(Duration::from_millis(5));
        }
    }

    #[test]
    fn success_yields_locator() {
        let job = TranscodeJob::spawn(Fixed(Ok("out")), MediaLocator::new("in.webm"), "mp4".into());
        assert_eq!(wait(&job), Some(MediaLocator::new("out.mp4")));
        assert_eq!(job.source().as_str(), "in.webm");
    }

    #[test]
    fn failure_is_no_output() {
        let job = TranscodeJob::spawn(Fixed(Err(())), MediaLocator::new("in.webm"), "mp4".into());
        assert_eq!(wait(&job), None);
    }

    #[test]
    fn completion_replaces_current_media() {
        let source = MediaLocator::new("a.webm");
        let job = TranscodeJob::spawn(Fixed(Ok("a-out")), source.clone(), "mp4".into());
        assert_eq!(
            wait_completion(&job, &source),
            Completion::Replace(MediaLocator::new("a-out.mp4"))
        );
    }

    #[test]
    fn completion_after_switching_media_is_stale() {
        let job = TranscodeJob::spawn(Fixed(Ok("a-out")), MediaLocator::new("a.webm"), "mp4".into());
        assert_eq!(
            wait_completion(&job, &MediaLocator::new("b.webm")),
            Completion::Stale
        );

        let failing = TranscodeJob::spawn(Fixed(Err(())), MediaLocator::new("a.webm"), "mp4".into());
        assert_eq!(
            wait_completion(&failing, &MediaLocator::new("a.webm")),
            Completion::Failed
        );
    }

    #[test]
    fn output_paths_are_unique_per_run() {
        let t = FfmpegTranscoder {
            output_dir: PathBuf::from("/tmp/vp"),
        };
        let source = MediaLocator::new("/videos/My Clip.avi");
        let first = t.output_path(&source, "mp4");
        let second = t.output_path(&source, "mp4");
        assert_ne!(first, second);
        assert_eq!(first.parent(), Some(Path::new("/tmp/vp")));
        let name = first.file_name().unwrap().to_string_lossy().into_owned();
        assert!(name.starts_with("MyClip-"), "{name}");
        assert!(name.ends_with(".mp4"), "{name}");

        // Transcoding an earlier output picks a new name
        let again = t.output_path(&MediaLocator::from_path(&first), "mp4");
        assert_ne!(again, first);
    }

    #[test]
    fn output_stem_fallback() {
        assert_eq!(output_stem(&MediaLocator::new("")), "output");
        assert_eq!(output_stem(&MediaLocator::new("/x/..webm")), "output");
        assert_eq!(output_stem(&MediaLocator::new("clip_01.mov")), "clip_01");
    }

    #[test]
    fn rejects_odd_target_format() {
        let t = FfmpegTranscoder::new();
        let err = t
            .transcode(&MediaLocator::new("in.webm"), "../mp4")
            .unwrap_err();
        assert!(matches!(err, TranscodeError::BadFormat(_)));
    }

    #[test]
    fn format_validation() {
        assert!(valid_format("mp4"));
        assert!(valid_format("webm"));
        assert!(!valid_format(""));
        assert!(!valid_format("mp4 -f"));
    }
}
