//! Audio output for the current media source.
//!
//! The decoded track plays through a cpal output stream. The media source's
//! clock stays authoritative: every tick the cursor takes the source's play
//! state and gain, and jumps to the source's time when it has drifted.

use std::sync::atomic::{AtomicBool, AtomicU32, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use anyhow::Result;
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::Stream;

use super::source::MediaSource;
use super::types::DecodedAudio;

/// Drift between audio and the media clock that forces a jump.
const RESYNC_SECS: f64 = 0.2;

/// What the output should be doing, read off the media source.
#[derive(Debug, Clone, PartialEq)]
pub struct AudioTarget {
    pub track: Option<Arc<DecodedAudio>>,
    pub playing: bool,
    pub gain: f32,
    pub time_secs: f64,
}

impl AudioTarget {
    pub fn of(media: &MediaSource) -> Self {
        Self {
            track: media.audio().cloned(),
            playing: !media.paused() && media.is_ready(),
            gain: media.gain(),
            time_secs: media.current_time(),
        }
    }
}

/// Playback cursor shared between the event loop and the output callback.
pub struct AudioCursor {
    track: Mutex<Option<Arc<DecodedAudio>>>,
    /// Position in source sample frames, as `f64` bits.
    position: AtomicU64,
    playing: AtomicBool,
    /// Gain as `f32` bits.
    gain: AtomicU32,
}

impl Default for AudioCursor {
    fn default() -> Self {
        Self {
            track: Mutex::new(None),
            position: AtomicU64::new(0f64.to_bits()),
            playing: AtomicBool::new(false),
            gain: AtomicU32::new(1f32.to_bits()),
        }
    }
}

impl AudioCursor {
    /// Bring the cursor in line with `target`.
    pub fn apply(&self, target: &AudioTarget) {
        {
            let mut track = self.track.lock().unwrap_or_else(PoisonError::into_inner);
            let same_track = match (track.as_ref(), target.track.as_ref()) {
                (Some(a), Some(b)) => Arc::ptr_eq(a, b),
                (None, None) => true,
                _ => false,
            };
            if !same_track {
                *track = target.track.clone();
            }
            if let Some(current) = track.as_ref() {
                let drift = (self.position_secs(current) - target.time_secs).abs();
                if !same_track || drift > RESYNC_SECS {
                    let frames = target.time_secs.max(0.0) * f64::from(current.sample_rate);
                    self.position.store(frames.to_bits(), Ordering::Release);
                }
            }
        }
        self.gain
            .store(target.gain.clamp(0.0, 1.0).to_bits(), Ordering::Relaxed);
        self.playing.store(target.playing, Ordering::Release);
    }

    fn position_secs(&self, track: &DecodedAudio) -> f64 {
        if track.sample_rate == 0 {
            return 0.0;
        }
        f64::from_bits(self.position.load(Ordering::Acquire)) / f64::from(track.sample_rate)
    }

    /// Fill one device buffer of interleaved samples. Silence while paused,
    /// past the end of the track, or when the event loop holds the lock.
    pub fn fill(&self, out: &mut [f32], out_channels: usize, out_rate: u32) {
        if !self.playing.load(Ordering::Acquire) || out_channels == 0 || out_rate == 0 {
            out.fill(0.0);
            return;
        }
        let Ok(track) = self.track.try_lock() else {
            out.fill(0.0);
            return;
        };
        let Some(track) = track.as_ref() else {
            out.fill(0.0);
            return;
        };

        let gain = f32::from_bits(self.gain.load(Ordering::Relaxed));
        let src_channels = usize::from(track.channels.max(1));
        let total = track.frames();
        // Nearest-sample rate conversion
        let step = f64::from(track.sample_rate) / f64::from(out_rate);
        let mut pos = f64::from_bits(self.position.load(Ordering::Acquire));

        for frame in out.chunks_mut(out_channels) {
            let idx = pos as usize;
            if idx >= total {
                frame.fill(0.0);
                continue;
            }
            let base = idx * src_channels;
            for (c, sample) in frame.iter_mut().enumerate() {
                *sample = track.samples[base + c.min(src_channels - 1)] * gain;
            }
            pos += step;
        }
        self.position.store(pos.to_bits(), Ordering::Release);
    }
}

/// Default output device playing whatever the cursor points at.
pub struct AudioOutput {
    _stream: Stream,
    cursor: Arc<AudioCursor>,
}

impl AudioOutput {
    pub fn new() -> Result<Self> {
        let host = cpal::default_host();
        let device = host
            .default_output_device()
            .ok_or_else(|| anyhow::anyhow!("No audio output device found"))?;

        let device_name = device
            .description()
            .map(|d| d.name().to_string())
            .unwrap_or_else(|_| "Unknown".into());
        log::info!("Audio output device: {device_name}");

        let config = device.default_output_config()?;
        if config.sample_format() != cpal::SampleFormat::F32 {
            anyhow::bail!("unsupported output sample format {:?}", config.sample_format());
        }
        let sample_rate = config.sample_rate();
        let channels = usize::from(config.channels());
        log::info!("Audio output config: {sample_rate}Hz, {channels}ch");

        let cursor = Arc::new(AudioCursor::default());
        let callback_cursor = cursor.clone();

        let stream = device.build_output_stream(
            &config.into(),
            move |data: &mut [f32], _: &cpal::OutputCallbackInfo| {
                callback_cursor.fill(data, channels, sample_rate);
            },
            |err| {
                log::error!("Audio output error: {err}");
            },
            None,
        )?;

        stream.play()?;

        Ok(Self {
            _stream: stream,
            cursor,
        })
    }

    /// Follow the media source: track, play state, gain and position.
    pub fn sync(&self, media: &MediaSource) {
        self.cursor.apply(&AudioTarget::of(media));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::media::source::tests::test_clip;
    use crate::media::MediaLocator;

    /// Mono ramp: sample `i` has value `i`.
    fn ramp(frames: usize, sample_rate: u32) -> Arc<DecodedAudio> {
        Arc::new(DecodedAudio {
            samples: (0..frames).map(|i| i as f32).collect(),
            sample_rate,
            channels: 1,
        })
    }

    fn playing(track: &Arc<DecodedAudio>, time_secs: f64, gain: f32) -> AudioTarget {
        AudioTarget {
            track: Some(track.clone()),
            playing: true,
            gain,
            time_secs,
        }
    }

    #[test]
    fn idle_cursor_is_silent() {
        let cursor = AudioCursor::default();
        let mut out = [1.0; 8];
        cursor.fill(&mut out, 2, 48_000);
        assert_eq!(out, [0.0; 8]);
    }

    #[test]
    fn plays_from_media_time_and_upmixes() {
        let track = ramp(100, 10);
        let cursor = AudioCursor::default();
        cursor.apply(&playing(&track, 2.0, 1.0));

        let mut out = [0.0; 6];
        cursor.fill(&mut out, 2, 10);
        assert_eq!(out, [20.0, 20.0, 21.0, 21.0, 22.0, 22.0]);
    }

    #[test]
    fn mute_is_zero_gain() {
        let track = ramp(100, 10);
        let cursor = AudioCursor::default();
        cursor.apply(&playing(&track, 5.0, 0.0));
        let mut out = [9.0; 4];
        cursor.fill(&mut out, 1, 10);
        assert_eq!(out, [0.0; 4]);

        cursor.apply(&playing(&track, 5.4, 0.5));
        cursor.fill(&mut out, 1, 10);
        assert_eq!(out, [27.0, 27.5, 28.0, 28.5]);
    }

    #[test]
    fn pause_keeps_position() {
        let track = ramp(100, 10);
        let cursor = AudioCursor::default();
        cursor.apply(&playing(&track, 1.0, 1.0));
        cursor.apply(&AudioTarget {
            playing: false,
            ..playing(&track, 1.0, 1.0)
        });
        let mut out = [5.0; 2];
        cursor.fill(&mut out, 1, 10);
        assert_eq!(out, [0.0; 2]);

        cursor.apply(&playing(&track, 1.0, 1.0));
        cursor.fill(&mut out, 1, 10);
        assert_eq!(out, [10.0, 11.0]);
    }

    #[test]
    fn small_drift_is_tolerated_large_drift_resyncs() {
        let track = ramp(1000, 10);
        let cursor = AudioCursor::default();
        cursor.apply(&playing(&track, 0.0, 1.0));
        let mut out = [0.0; 1];
        cursor.fill(&mut out, 1, 10);
        assert_eq!(out, [0.0]);

        // 0.1s off: keep streaming where we are
        cursor.apply(&playing(&track, 0.0, 1.0));
        cursor.fill(&mut out, 1, 10);
        assert_eq!(out, [1.0]);

        // Seek
        cursor.apply(&playing(&track, 30.0, 1.0));
        cursor.fill(&mut out, 1, 10);
        assert_eq!(out, [300.0]);
    }

    #[test]
    fn new_track_starts_at_media_time() {
        let first = ramp(100, 10);
        let second = Arc::new(DecodedAudio {
            samples: vec![0.25; 100],
            sample_rate: 10,
            channels: 1,
        });
        let cursor = AudioCursor::default();
        cursor.apply(&playing(&first, 5.0, 1.0));
        cursor.apply(&playing(&second, 0.0, 1.0));
        let mut out = [0.0; 2];
        cursor.fill(&mut out, 1, 10);
        assert_eq!(out, [0.25, 0.25]);
    }

    #[test]
    fn past_the_end_is_silent() {
        let track = ramp(4, 10);
        let cursor = AudioCursor::default();
        cursor.apply(&playing(&track, 0.2, 1.0));
        let mut out = [9.0; 4];
        cursor.fill(&mut out, 1, 10);
        assert_eq!(out, [2.0, 3.0, 0.0, 0.0]);
    }

    #[test]
    fn rate_conversion_steps_through_source() {
        let track = ramp(100, 20);
        let cursor = AudioCursor::default();
        cursor.apply(&playing(&track, 0.0, 1.0));
        let mut out = [0.0; 3];
        cursor.fill(&mut out, 1, 10);
        assert_eq!(out, [0.0, 2.0, 4.0]);
    }

    #[test]
    fn target_reads_media_state() {
        let mut clip = test_clip(10, 10.0);
        let track = ramp(10, 10);
        clip.audio = Some(track.clone());
        let mut media = MediaSource::from_clip(MediaLocator::new("a.mp4"), clip);
        media.set_volume(0.5);
        media.play();
        media.advance(0.3);

        let target = AudioTarget::of(&media);
        assert!(target.playing);
        assert_eq!(target.gain, 0.5);
        assert!((target.time_secs - 0.3).abs() < 1e-9);
        assert!(Arc::ptr_eq(target.track.as_ref().unwrap(), &track));

        media.toggle_mute();
        media.pause();
        let target = AudioTarget::of(&media);
        assert!(!target.playing);
        assert_eq!(target.gain, 0.0);
        assert_eq!(media.volume(), 0.5);
    }
}
