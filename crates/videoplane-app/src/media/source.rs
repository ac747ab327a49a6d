use std::cell::RefCell;
use std::rc::Rc;
use std::sync::Arc;

use crossbeam_channel::{Receiver, TryRecvError};

use super::decoder::{self, LoadResult};
use super::types::{
    DecodedAudio, DecodedClip, DecodedFrame, MediaEvent, MediaLocator, Readiness,
};
use crate::error::SceneError;

/// Handle to the scene's single media source. Owned by the scene; the live
/// texture and the transport control hold clones and mutate it only through
/// `MediaSource` methods.
pub type SharedMedia = Rc<RefCell<MediaSource>>;

/// One playable media element: transport operations plus read-only playback
/// state. Duration is 0 until the loader reports metadata.
pub struct MediaSource {
    locator: MediaLocator,
    paused: bool,
    current_time: f64,
    duration: f64,
    volume: f32,
    muted: bool,
    looping: bool,
    readiness: Readiness,
    clip: Option<DecodedClip>,
    loader: Option<Receiver<LoadResult>>,
}

impl MediaSource {
    /// Start loading `locator` in the background.
    pub fn open(locator: MediaLocator) -> Self {
        let rx = decoder::spawn_loader(locator.clone());
        Self::with_loader(locator, rx)
    }

    /// Source whose clip arrives on `loader`.
    pub fn with_loader(locator: MediaLocator, loader: Receiver<LoadResult>) -> Self {
        Self {
            locator,
            paused: true,
            current_time: 0.0,
            duration: 0.0,
            volume: 1.0,
            muted: false,
            looping: false,
            readiness: Readiness::Loading,
            clip: None,
            loader: Some(loader),
        }
    }

    /// Placeholder source used before anything is opened. Never becomes ready.
    pub fn empty() -> Self {
        let mut source = Self::with_loader(MediaLocator::new(""), crossbeam_channel::never());
        source.loader = None;
        source.readiness = Readiness::Unavailable("no media opened".into());
        source
    }

    /// Source with an already decoded clip.
    pub fn from_clip(locator: MediaLocator, clip: DecodedClip) -> Self {
        let (tx, rx) = crossbeam_channel::bounded(1);
        let _ = tx.send(Ok(clip));
        let mut source = Self::with_loader(locator, rx);
        source.poll_loader();
        source
    }

    pub fn into_shared(self) -> SharedMedia {
        Rc::new(RefCell::new(self))
    }

    /// Drain the loader channel. Returns an event when the load state changed.
    pub fn poll_loader(&mut self) -> Option<MediaEvent> {
        let rx = self.loader.as_ref()?;
        let result = match rx.try_recv() {
            Ok(result) => result,
            Err(TryRecvError::Empty) => return None,
            Err(TryRecvError::Disconnected) => Err("media loader exited without a result".into()),
        };
        self.loader = None;

        match result {
            Ok(clip) if clip.width > 0 && clip.height > 0 && !clip.frames.is_empty() => {
                self.duration = clip.duration_secs.max(0.0);
                // A seek issued before metadata arrived may point past the end
                if self.duration > 0.0 {
                    self.current_time = self.current_time.min(self.duration);
                }
                let event = MediaEvent::Ready {
                    width: clip.width,
                    height: clip.height,
                    duration_secs: self.duration,
                };
                log::info!(
                    "Media ready: {} ({}x{}, {:.2}s)",
                    self.locator.display_name(),
                    clip.width,
                    clip.height,
                    self.duration
                );
                self.clip = Some(clip);
                self.readiness = Readiness::Ready;
                Some(event)
            }
            Ok(_) => self.mark_unavailable("decoded clip has no frames".into()),
            Err(reason) => self.mark_unavailable(reason),
        }
    }

    fn mark_unavailable(&mut self, reason: String) -> Option<MediaEvent> {
        log::warn!("Media unavailable: {}: {reason}", self.locator);
        self.readiness = Readiness::Unavailable(reason.clone());
        Some(MediaEvent::Unavailable(SceneError::MediaUnavailable(reason)))
    }

    pub fn play(&mut self) {
        if !self.paused {
            return;
        }
        if self.ended() {
            self.current_time = 0.0;
        }
        self.paused = false;
        log::debug!("play at {:.2}s", self.current_time);
    }

    pub fn pause(&mut self) {
        if self.paused {
            return;
        }
        self.paused = true;
        log::debug!("pause at {:.2}s", self.current_time);
    }

    pub fn toggle_play(&mut self) {
        if self.paused {
            self.play();
        } else {
            self.pause();
        }
    }

    /// Seek by `delta_secs`. Clamped to `[0, duration]` once the duration is
    /// known; before that only the lower bound applies.
    pub fn seek_relative(&mut self, delta_secs: f64) {
        if !delta_secs.is_finite() {
            return;
        }
        self.seek_absolute(self.current_time + delta_secs);
    }

    pub fn seek_absolute(&mut self, time_secs: f64) {
        if !time_secs.is_finite() {
            return;
        }
        self.current_time = if self.duration_known() {
            time_secs.clamp(0.0, self.duration)
        } else {
            time_secs.max(0.0)
        };
    }

    pub fn go_to_start(&mut self) {
        self.seek_absolute(0.0);
    }

    /// No-op while the duration is unknown.
    pub fn go_to_end(&mut self) {
        if self.duration_known() {
            self.seek_absolute(self.duration);
        }
    }

    /// Set volume in `[0, 1]`; out-of-range input is clamped, NaN ignored.
    pub fn set_volume(&mut self, volume: f32) {
        if volume.is_nan() {
            log::warn!("Ignoring NaN volume");
            return;
        }
        self.volume = volume.clamp(0.0, 1.0);
    }

    /// Flip the mute flag. Volume is left as is.
    pub fn toggle_mute(&mut self) {
        self.muted = !self.muted;
    }

    pub fn set_looping(&mut self, looping: bool) {
        self.looping = looping;
    }

    /// Advance playback by `dt_secs`. Called once per render tick.
    pub fn advance(&mut self, dt_secs: f64) {
        if self.paused || !self.is_ready() || !dt_secs.is_finite() || dt_secs <= 0.0 {
            return;
        }
        self.current_time += dt_secs;
        if self.duration_known() && self.current_time >= self.duration {
            if self.looping {
                self.current_time %= self.duration;
            } else {
                self.current_time = self.duration;
                self.paused = true;
                log::debug!("playback ended: {}", self.locator.display_name());
            }
        }
    }

    /// Frame index and frame at the current time, if one is decodable.
    pub fn current_frame(&self) -> Option<(usize, Arc<DecodedFrame>)> {
        let clip = self.clip.as_ref()?;
        let idx = clip.frame_index_at(self.current_time)?;
        let frame = clip.frames.get(idx)?;
        if frame.is_empty() {
            return None;
        }
        Some((idx, Arc::clone(frame)))
    }

    fn duration_known(&self) -> bool {
        self.duration > 0.0
    }

    fn ended(&self) -> bool {
        self.duration_known() && self.current_time >= self.duration
    }

    pub fn locator(&self) -> &MediaLocator {
        &self.locator
    }

    pub fn paused(&self) -> bool {
        self.paused
    }

    pub fn current_time(&self) -> f64 {
        self.current_time
    }

    pub fn duration(&self) -> f64 {
        self.duration
    }

    pub fn volume(&self) -> f32 {
        self.volume
    }

    pub fn muted(&self) -> bool {
        self.muted
    }

    pub fn looping(&self) -> bool {
        self.looping
    }

    pub fn readiness(&self) -> &Readiness {
        &self.readiness
    }

    pub fn is_ready(&self) -> bool {
        self.readiness == Readiness::Ready
    }

    /// Output gain: zero while muted, the volume otherwise.
    pub fn gain(&self) -> f32 {
        if self.muted { 0.0 } else { self.volume }
    }

    pub fn audio(&self) -> Option<&Arc<DecodedAudio>> {
        self.clip.as_ref()?.audio.as_ref()
    }
}
