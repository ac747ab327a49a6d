use glam::Vec2;

use crate::error::SceneError;
use crate::gpu::camera::Camera;
use crate::media::{LiveTexture, MediaEvent, MediaSource, SampledFrame, SharedMedia};
use crate::settings::SettingsConfig;
use crate::surface::{GestureKind, ManipulableSurface, PointerCapture, SurfaceConfig};
use crate::transport::{TransportCommand, TransportControl};

/// One surface and one transport panel bound to one shared media source.
pub struct Scene {
    media: SharedMedia,
    texture: LiveTexture,
    surface: ManipulableSurface,
    transport: TransportControl,
    capture: PointerCapture,
    pub camera: Camera,
    seek_step_secs: f64,
}

impl Scene {
    pub fn new(media: MediaSource, settings: &SettingsConfig, camera: Camera) -> Self {
        let surface = ManipulableSurface::new(
            Vec2::from(settings.initial_size),
            SurfaceConfig::from(settings),
        );
        let (media, texture, transport) = Self::bind_media(
            media,
            settings.seek_step_secs,
            settings.initial_volume,
            settings.looping,
        );
        Self {
            media,
            texture,
            surface,
            transport,
            capture: PointerCapture::new(),
            camera,
            seek_step_secs: settings.seek_step_secs,
        }
    }

    fn bind_media(
        mut media: MediaSource,
        seek_step_secs: f64,
        volume_percent: u8,
        looping: bool,
    ) -> (SharedMedia, LiveTexture, TransportControl) {
        media.set_volume(f32::from(volume_percent.min(100)) / 100.0);
        media.set_looping(looping);
        let media = media.into_shared();
        let texture = LiveTexture::new(media.clone());
        let transport = TransportControl::new(media.clone(), seek_step_secs);
        (media, texture, transport)
    }

    /// Swap in a new media source. The texture and transport are rebuilt
    /// around it; geometry is kept and any active gesture is released.
    /// Volume, mute and loop settings carry over.
    pub fn replace_media(&mut self, mut media: MediaSource) {
        self.surface.pointer_up();
        let (volume, muted, looping) = {
            let old = self.media.borrow();
            (old.volume(), old.muted(), old.looping())
        };
        if muted {
            media.toggle_mute();
        }
        log::info!("Replacing media with {}", media.locator());
        let volume_percent = (volume * 100.0).round() as u8;
        let (media, texture, transport) =
            Self::bind_media(media, self.seek_step_secs, volume_percent, looping);
        self.media = media;
        self.texture = texture;
        self.transport = transport;
    }

    /// Pointer pressed (logical window coordinates). A press during an active
    /// gesture is a normal input race and is dropped quietly.
    pub fn pointer_down(&mut self, screen: Vec2) -> GestureKind {
        match self.surface.pointer_down(screen, &self.camera, &self.capture) {
            Ok(kind) => kind,
            Err(SceneError::GestureConflict) => {
                log::trace!("pointer down at {screen} ignored: gesture active");
                self.surface.gesture()
            }
            Err(e) => {
                log::warn!("pointer down at {screen}: {e}");
                self.surface.gesture()
            }
        }
    }

    pub fn pointer_move(&mut self, screen: Vec2) -> bool {
        self.surface.pointer_move(screen)
    }

    pub fn pointer_up(&mut self) -> GestureKind {
        self.surface.pointer_up()
    }

    pub fn pointer_left(&mut self) -> GestureKind {
        self.surface.pointer_left()
    }

    pub fn focus_lost(&mut self) -> GestureKind {
        self.surface.focus_lost()
    }

    /// Whether pointer events must reach the scene regardless of what else is
    /// under the cursor.
    pub fn captures_pointer(&self) -> bool {
        self.capture.is_held()
    }

    /// Per-frame update: collect loader results, advance playback, refresh the
    /// transport's mirrored volume.
    pub fn tick(&mut self, dt_secs: f64) -> Option<MediaEvent> {
        let event = {
            let mut media = self.media.borrow_mut();
            let event = media.poll_loader();
            media.advance(dt_secs);
            event
        };
        self.transport.sync();
        event
    }

    pub fn sample_texture(&mut self) -> SampledFrame {
        self.texture.sample()
    }

    pub fn dispatch(&self, command: TransportCommand) {
        self.transport.dispatch(command);
    }

    pub fn transport(&self) -> &TransportControl {
        &self.transport
    }

    pub fn transport_mut(&mut self) -> &mut TransportControl {
        &mut self.transport
    }

    pub fn surface(&self) -> &ManipulableSurface {
        &self.surface
    }

    pub fn media(&self) -> &SharedMedia {
        &self.media
    }

    pub fn texture(&self) -> &LiveTexture {
        &self.texture
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::media::source::tests::{ready_source, test_clip};
    use crate::media::MediaLocator;

    fn scene() -> Scene {
        Scene::new(
            ready_source(100, 10.0),
            &SettingsConfig::default(),
            Camera::new(800.0, 450.0),
        )
    }

    #[test]
    fn components_share_one_media_source() {
        let s = scene();
        assert!(s.texture().is_bound_to(s.media()));
        assert!(std::rc::Rc::ptr_eq(s.transport().media(), s.media()));
    }

    #[test]
    fn drag_scenario() {
        let mut s = scene();
        assert_eq!(s.pointer_down(Vec2::new(100.0, 100.0)), GestureKind::Dragging);
        assert!(s.captures_pointer());
        s.pointer_move(Vec2::new(150.0, 130.0));
        let p = s.surface().geometry().position;
        assert!((p - Vec2::new(0.5, -0.3)).length() < 1e-4);

        assert_eq!(s.pointer_up(), GestureKind::Dragging);
        assert!(!s.captures_pointer());
        s.pointer_move(Vec2::new(0.0, 0.0));
        assert_eq!(s.surface().geometry().position, p);
    }

    #[test]
    fn second_pointer_down_is_swallowed() {
        let mut s = scene();
        s.pointer_down(Vec2::new(400.0, 225.0));
        let anchor = s.surface().drag_anchor();
        assert_eq!(s.pointer_down(Vec2::new(300.0, 200.0)), GestureKind::Dragging);
        assert_eq!(s.surface().drag_anchor(), anchor);
    }

    #[test]
    fn pointer_leaving_window_ends_gesture() {
        let mut s = scene();
        s.pointer_down(Vec2::new(400.0, 225.0));
        assert_eq!(s.pointer_left(), GestureKind::Dragging);
        assert!(!s.captures_pointer());
    }

    #[test]
    fn focus_loss_mid_resize_releases_capture() {
        let mut s = scene();
        let handle = s
            .camera
            .scene_to_screen(s.surface().geometry().handle_position().extend(0.0))
            .unwrap();
        assert_eq!(s.pointer_down(handle), GestureKind::Resizing);
        assert!(s.captures_pointer());

        assert_eq!(s.focus_lost(), GestureKind::Resizing);
        assert!(!s.captures_pointer());
        // The next press starts a fresh gesture
        assert_eq!(s.pointer_down(Vec2::new(400.0, 225.0)), GestureKind::Dragging);
    }

    #[test]
    fn geometry_changes_do_not_touch_playback() {
        let mut s = scene();
        s.dispatch(TransportCommand::PlayPause);
        s.tick(1.0);
        s.pointer_down(Vec2::new(400.0, 225.0));
        s.pointer_move(Vec2::new(500.0, 300.0));
        s.pointer_up();
        let media = s.media().borrow();
        assert!(!media.paused());
        assert!((media.current_time() - 1.0).abs() < 1e-9);
    }

    #[test]
    fn tick_streams_frames_into_texture() {
        let mut s = scene();
        assert!(matches!(s.sample_texture(), SampledFrame::Upload(_)));
        assert!(matches!(s.sample_texture(), SampledFrame::Unchanged));
        s.dispatch(TransportCommand::PlayPause);
        s.tick(0.5);
        match s.sample_texture() {
            SampledFrame::Upload(frame) => assert_eq!(frame.data[0], 5),
            _ => panic!("expected a new frame after advancing"),
        }
    }

    #[test]
    fn tick_reports_loader_events() {
        let (tx, rx) = crossbeam_channel::bounded(1);
        let media = MediaSource::with_loader(MediaLocator::new("late.mp4"), rx);
        let mut s = Scene::new(media, &SettingsConfig::default(), Camera::new(800.0, 450.0));
        assert!(s.tick(0.016).is_none());
        assert!(matches!(s.sample_texture(), SampledFrame::NotReady));

        tx.send(Ok(test_clip(10, 10.0))).unwrap();
        assert!(matches!(s.tick(0.016), Some(MediaEvent::Ready { .. })));
        assert!(matches!(s.sample_texture(), SampledFrame::Upload(_)));
    }

    #[test]
    fn go_to_end_before_metadata_is_harmless() {
        let (_tx, rx) = crossbeam_channel::bounded(1);
        let media = MediaSource::with_loader(MediaLocator::new("late.mp4"), rx);
        let s = Scene::new(media, &SettingsConfig::default(), Camera::new(800.0, 450.0));
        s.dispatch(TransportCommand::GoToEnd);
        assert_eq!(s.media().borrow().current_time(), 0.0);
    }

    #[test]
    fn settings_seed_volume_and_loop() {
        let settings = SettingsConfig {
            initial_volume: 25,
            looping: true,
            ..SettingsConfig::default()
        };
        let s = Scene::new(ready_source(1, 1.0), &settings, Camera::new(800.0, 450.0));
        assert_eq!(s.media().borrow().volume(), 0.25);
        assert!(s.media().borrow().looping());
        assert_eq!(s.transport().displayed_volume(), 25);
    }

    #[test]
    fn replace_media_rebinds_and_keeps_geometry() {
        let mut s = scene();
        s.pointer_down(Vec2::new(400.0, 225.0));
        s.pointer_move(Vec2::new(500.0, 225.0));
        s.dispatch(TransportCommand::ToggleMute);
        s.transport_mut().handle_volume_change("60").unwrap();
        let geometry = *s.surface().geometry();
        let old = s.media().clone();

        s.replace_media(ready_source(10, 10.0));

        assert!(!std::rc::Rc::ptr_eq(&old, s.media()));
        assert!(s.texture().is_bound_to(s.media()));
        assert!(std::rc::Rc::ptr_eq(s.transport().media(), s.media()));
        assert!(!s.captures_pointer());
        assert_eq!(*s.surface().geometry(), geometry);
        assert!(s.media().borrow().muted());
        assert_eq!(s.media().borrow().volume(), 0.6);
    }

    #[test]
    fn dropping_scene_releases_capture() {
        let mut s = scene();
        s.pointer_down(Vec2::new(400.0, 225.0));
        let capture = s.capture.clone();
        assert!(capture.is_held());
        drop(s);
        assert!(!capture.is_held());
    }
}
