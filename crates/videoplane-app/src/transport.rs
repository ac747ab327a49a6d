use crate::error::SceneError;
use crate::media::SharedMedia;

/// Buttons on the transport panel. Each maps straight onto a `MediaSource`
/// operation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum TransportCommand {
    #[default]
    PlayPause,
    Rewind,
    Forward,
    GoToStart,
    GoToEnd,
    ToggleMute,
}

impl TransportCommand {
    pub const ALL: &[TransportCommand] = &[
        TransportCommand::PlayPause,
        TransportCommand::Rewind,
        TransportCommand::Forward,
        TransportCommand::GoToStart,
        TransportCommand::GoToEnd,
        TransportCommand::ToggleMute,
    ];

    pub fn display_name(&self) -> &'static str {
        match self {
            TransportCommand::PlayPause => "Play/Pause",
            TransportCommand::Rewind => "Rewind",
            TransportCommand::Forward => "Forward",
            TransportCommand::GoToStart => "Go to Start",
            TransportCommand::GoToEnd => "Go to End",
            TransportCommand::ToggleMute => "Mute/Unmute",
        }
    }
}

/// Command dispatcher for the shared media source, plus the volume value the
/// slider shows. Owns no playback state of its own.
pub struct TransportControl {
    media: SharedMedia,
    seek_step_secs: f64,
    /// 0..=100. Mirrors the source volume unless `editing_volume`.
    displayed_volume: u8,
    editing_volume: bool,
}

impl TransportControl {
    pub fn new(media: SharedMedia, seek_step_secs: f64) -> Self {
        let displayed_volume = volume_to_percent(media.borrow().volume());
        Self {
            media,
            seek_step_secs,
            displayed_volume,
            editing_volume: false,
        }
    }

    pub fn dispatch(&self, command: TransportCommand) {
        let mut media = self.media.borrow_mut();
        match command {
            TransportCommand::PlayPause => media.toggle_play(),
            TransportCommand::Rewind => media.seek_relative(-self.seek_step_secs),
            TransportCommand::Forward => media.seek_relative(self.seek_step_secs),
            TransportCommand::GoToStart => media.go_to_start(),
            TransportCommand::GoToEnd => media.go_to_end(),
            TransportCommand::ToggleMute => media.toggle_mute(),
        }
        log::debug!("{command:?} -> t={:.2}s", media.current_time());
    }

    /// Raw text from a volume input. Integers are clamped to 0..=100; anything
    /// else is rejected and nothing changes.
    pub fn handle_volume_change(&mut self, raw: &str) -> Result<u8, SceneError> {
        let parsed: i64 = raw
            .trim()
            .parse()
            .map_err(|_| SceneError::InputError(format!("volume must be an integer, got {raw:?}")))?;
        let percent = parsed.clamp(0, 100) as u8;
        self.displayed_volume = percent;
        self.editing_volume = false;
        self.push_volume();
        Ok(percent)
    }

    /// Slider is being dragged: move only the displayed value.
    pub fn preview_volume(&mut self, percent: u8) {
        self.displayed_volume = percent.min(100);
        self.editing_volume = true;
    }

    /// Slider released: push the displayed value to the source.
    pub fn commit_volume(&mut self) {
        self.editing_volume = false;
        self.push_volume();
    }

    fn push_volume(&self) {
        self.media
            .borrow_mut()
            .set_volume(f32::from(self.displayed_volume) / 100.0);
    }

    /// Re-read the source so the displayed volume follows changes made
    /// elsewhere. Skipped while the user is mid-drag.
    pub fn sync(&mut self) {
        if !self.editing_volume {
            self.displayed_volume = volume_to_percent(self.media.borrow().volume());
        }
    }

    pub fn displayed_volume(&self) -> u8 {
        self.displayed_volume
    }

    pub fn is_editing_volume(&self) -> bool {
        self.editing_volume
    }

    pub fn media(&self) -> &SharedMedia {
        &self.media
    }
}

fn volume_to_percent(volume: f32) -> u8 {
    (volume.clamp(0.0, 1.0) * 100.0).round() as u8
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::media::source::tests::ready_source;

    fn control() -> TransportControl {
        TransportControl::new(ready_source(200, 10.0).into_shared(), 5.0)
    }

    #[test]
    fn buttons_dispatch_to_media() {
        let t = control();
        t.dispatch(TransportCommand::PlayPause);
        assert!(!t.media().borrow().paused());
        t.dispatch(TransportCommand::PlayPause);
        assert!(t.media().borrow().paused());

        t.dispatch(TransportCommand::Forward);
        t.dispatch(TransportCommand::Forward);
        assert_eq!(t.media().borrow().current_time(), 10.0);
        t.dispatch(TransportCommand::Rewind);
        assert_eq!(t.media().borrow().current_time(), 5.0);

        t.dispatch(TransportCommand::GoToEnd);
        assert_eq!(t.media().borrow().current_time(), 20.0);
        t.dispatch(TransportCommand::GoToStart);
        assert_eq!(t.media().borrow().current_time(), 0.0);

        t.dispatch(TransportCommand::ToggleMute);
        assert!(t.media().borrow().muted());
    }

    #[test]
    fn rewind_past_start_clamps() {
        let t = control();
        t.dispatch(TransportCommand::Rewind);
        assert_eq!(t.media().borrow().current_time(), 0.0);
    }

    #[test]
    fn volume_text_input() {
        let mut t = control();
        assert_eq!(t.handle_volume_change("40"), Ok(40));
        assert_eq!(t.displayed_volume(), 40);
        assert_eq!(t.media().borrow().volume(), 0.4);

        assert_eq!(t.handle_volume_change(" 250 "), Ok(100));
        assert_eq!(t.media().borrow().volume(), 1.0);
        assert_eq!(t.handle_volume_change("-10"), Ok(0));
        assert_eq!(t.media().borrow().volume(), 0.0);
    }

    #[test]
    fn malformed_volume_is_rejected() {
        let mut t = control();
        t.handle_volume_change("70").unwrap();
        for raw in ["abc", "", "4.5", "NaN"] {
            let err = t.handle_volume_change(raw).unwrap_err();
            assert!(matches!(err, SceneError::InputError(_)), "{raw:?}");
            assert_eq!(t.displayed_volume(), 70);
            assert_eq!(t.media().borrow().volume(), 0.7);
        }
    }

    #[test]
    fn slider_preview_then_commit() {
        let mut t = control();
        t.preview_volume(30);
        assert_eq!(t.displayed_volume(), 30);
        assert_eq!(t.media().borrow().volume(), 1.0);

        // Sync does not fight the drag
        t.sync();
        assert_eq!(t.displayed_volume(), 30);

        t.commit_volume();
        assert!(!t.is_editing_volume());
        assert_eq!(t.media().borrow().volume(), 0.3);
    }

    #[test]
    fn sync_mirrors_source() {
        let mut t = control();
        t.media().borrow_mut().set_volume(0.55);
        t.sync();
        assert_eq!(t.displayed_volume(), 55);
    }

    #[test]
    fn mute_does_not_touch_displayed_volume() {
        let mut t = control();
        t.handle_volume_change("80").unwrap();
        t.dispatch(TransportCommand::ToggleMute);
        t.sync();
        assert_eq!(t.displayed_volume(), 80);
    }
}
