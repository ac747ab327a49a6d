use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

use anyhow::Result;
use glam::Vec2;
use winit::window::Window;

use crate::gpu::{Camera, GpuContext, SurfacePass};
use crate::media::{AudioOutput, MediaEvent, MediaLocator, MediaSource, SampledFrame};
use crate::scene::Scene;
use crate::settings::SettingsConfig;
use crate::transcode::{Completion, FfmpegTranscoder, TranscodeJob};
use crate::transport::TransportCommand;
use crate::ui::EguiOverlay;
use crate::ui::panels::status_bar::TOGGLE_THEME;
use crate::ui::panels::transport_panel::{TransportInfo, signals};

pub const STATUS_TRANSCODE_STARTED: &str = "Transcoding started\u{2026}";
pub const STATUS_TRANSCODE_DONE: &str = "Transcoding complete!";
pub const STATUS_TRANSCODE_FAILED: &str = "Error during transcoding.";

/// Status bar message. Only transcoding writes it; opening other media
/// clears it.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct StatusLine(Option<String>);

impl StatusLine {
    pub fn transcode_started(&mut self) {
        self.0 = Some(STATUS_TRANSCODE_STARTED.to_string());
    }

    /// A stale job leaves the line alone; the media it was for is gone.
    pub fn transcode_finished(&mut self, completion: &Completion) {
        match completion {
            Completion::Replace(_) => self.0 = Some(STATUS_TRANSCODE_DONE.to_string()),
            Completion::Failed => self.0 = Some(STATUS_TRANSCODE_FAILED.to_string()),
            Completion::Stale => {}
        }
    }

    /// Load progress is shown by the readiness dot, not here.
    pub fn media_event(&mut self, event: &MediaEvent) {
        match event {
            MediaEvent::Ready {
                width,
                height,
                duration_secs,
            } => log::debug!("media ready {width}x{height}, {duration_secs:.2}s"),
            MediaEvent::Unavailable(e) => log::debug!("{e}"),
        }
    }

    pub fn clear(&mut self) {
        self.0 = None;
    }

    pub fn as_deref(&self) -> Option<&str> {
        self.0.as_deref()
    }
}

/// What the UI asked for this frame that the host has to act on.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct UiRequests {
    pub open_media: bool,
}

pub struct App {
    pub gpu: GpuContext,
    pub window: Arc<Window>,
    pub scene: Scene,
    pub surface_pass: SurfacePass,
    pub egui_overlay: EguiOverlay,
    pub settings: SettingsConfig,
    pub status: StatusLine,
    pub volume_error: Option<String>,
    pub transcode: Option<TranscodeJob>,
    /// `None` when no output device could be opened; playback stays silent.
    pub audio: Option<AudioOutput>,
    /// Last cursor position in logical pixels; `None` while outside the window.
    pub last_pointer: Option<Vec2>,
    pub last_frame: Instant,
    pub dt_secs: f32,
}

impl App {
    pub fn new(
        window: Arc<Window>,
        settings: SettingsConfig,
        locator: Option<MediaLocator>,
    ) -> Result<Self> {
        let gpu = GpuContext::new(window.clone())?;
        let surface_pass = SurfacePass::new(&gpu.device, &gpu.queue, gpu.format);
        let egui_overlay = EguiOverlay::new(&gpu.device, gpu.format, &window, settings.theme);

        let logical = window.inner_size().to_logical::<f32>(window.scale_factor());
        let camera = Camera::new(logical.width, logical.height);
        let media = match locator {
            Some(locator) => MediaSource::open(locator),
            None => MediaSource::empty(),
        };
        let scene = Scene::new(media, &settings, camera);

        let audio = match AudioOutput::new() {
            Ok(audio) => Some(audio),
            Err(e) => {
                log::warn!("Audio output unavailable: {e}");
                None
            }
        };

        Ok(Self {
            gpu,
            window,
            scene,
            surface_pass,
            egui_overlay,
            settings,
            status: StatusLine::default(),
            volume_error: None,
            transcode: None,
            audio,
            last_pointer: None,
            last_frame: Instant::now(),
            dt_secs: 0.0,
        })
    }

    pub fn resize(&mut self, width: u32, height: u32) {
        self.gpu.resize(width, height);
        let scale = self.window.scale_factor();
        let logical = winit::dpi::PhysicalSize::new(width, height).to_logical::<f32>(scale);
        self.scene.camera.set_viewport(logical.width, logical.height);
        self.egui_overlay.resize(width, height, scale as f32);
    }

    /// Pointer position in logical window coordinates.
    pub fn logical_pointer(&self, position: winit::dpi::PhysicalPosition<f64>) -> Vec2 {
        let logical = position.to_logical::<f32>(self.window.scale_factor());
        Vec2::new(logical.x, logical.y)
    }

    /// Per-frame tick: playback, loader results, transcode progress.
    pub fn update(&mut self) {
        let now = Instant::now();
        self.dt_secs = now.duration_since(self.last_frame).as_secs_f32();
        self.last_frame = now;

        if let Some(event) = self.scene.tick(f64::from(self.dt_secs)) {
            self.status.media_event(&event);
        }
        if let Some(audio) = &self.audio {
            audio.sync(&self.scene.media().borrow());
        }

        self.poll_transcode();
    }

    /// Start transcoding the current media into the configured format.
    pub fn start_transcode(&mut self) {
        if self.transcode.is_some() {
            return;
        }
        let source = self.scene.media().borrow().locator().clone();
        if source.as_str().is_empty() {
            log::warn!("Nothing to transcode");
            return;
        }
        let job = TranscodeJob::spawn(
            FfmpegTranscoder::new(),
            source,
            self.settings.transcode_format.clone(),
        );
        self.transcode = Some(job);
        self.status.transcode_started();
    }

    fn poll_transcode(&mut self) {
        let Some(job) = &self.transcode else {
            return;
        };
        let current = self.scene.media().borrow().locator().clone();
        let Some(completion) = job.completion(&current) else {
            return;
        };
        self.transcode = None;
        self.status.transcode_finished(&completion);
        if let Completion::Replace(locator) = completion {
            self.scene.replace_media(MediaSource::open(locator));
        }
    }

    pub fn open_media(&mut self, path: PathBuf) {
        log::info!("Opening {}", path.display());
        if let Some(job) = self.transcode.take() {
            log::info!("Abandoning transcode of {}", job.source());
        }
        self.volume_error = None;
        self.status.clear();
        self.scene
            .replace_media(MediaSource::open(MediaLocator::from_path(&path)));
    }

    pub fn transport_info(&self) -> TransportInfo {
        let media = self.scene.media().borrow();
        let title = match media.locator().display_name() {
            "" => "No media".to_string(),
            name => name.to_string(),
        };
        TransportInfo {
            title,
            ready: media.is_ready(),
            paused: media.paused(),
            muted: media.muted(),
            looping: media.looping(),
            current_time: media.current_time(),
            duration: media.duration(),
            displayed_volume: self.scene.transport().displayed_volume(),
            volume_error: self.volume_error.clone(),
            transcoding: self.transcode.is_some(),
        }
    }

    /// Build the egui frame and apply whatever the panels signalled.
    pub fn draw_ui(&mut self) -> UiRequests {
        let info = self.transport_info();
        let readiness = self.scene.media().borrow().readiness().clone();

        let status = self.status.as_deref();
        let dt_secs = self.dt_secs;
        let theme = self.egui_overlay.theme();
        self.egui_overlay.run(&self.window, |ctx| {
            crate::ui::panels::draw_panels(ctx, &info, &readiness, status, dt_secs, theme);
        });

        let ctx = self.egui_overlay.context();
        self.apply_ui_signals(&ctx)
    }

    fn apply_ui_signals(&mut self, ctx: &egui::Context) -> UiRequests {
        let take = |name: &str| -> Option<bool> {
            ctx.data_mut(|d| d.remove_temp(egui::Id::new(name)))
        };

        let command: Option<TransportCommand> =
            ctx.data_mut(|d| d.remove_temp(egui::Id::new(signals::COMMAND)));
        if let Some(command) = command {
            self.scene.dispatch(command);
        }

        let preview: Option<u8> =
            ctx.data_mut(|d| d.remove_temp(egui::Id::new(signals::VOLUME_PREVIEW)));
        if let Some(percent) = preview {
            self.scene.transport_mut().preview_volume(percent);
            self.volume_error = None;
        }
        if take(signals::VOLUME_COMMIT).is_some() {
            self.scene.transport_mut().commit_volume();
        }

        let text: Option<String> =
            ctx.data_mut(|d| d.remove_temp(egui::Id::new(signals::VOLUME_TEXT)));
        if let Some(text) = text {
            self.volume_error = match self.scene.transport_mut().handle_volume_change(&text) {
                Ok(_) => None,
                Err(e) => Some(e.to_string()),
            };
        }

        if let Some(looping) = take(signals::LOOP) {
            self.scene.media().borrow_mut().set_looping(looping);
            self.settings.looping = looping;
            self.settings.save();
        }

        if take(signals::TRANSCODE).is_some() {
            self.start_transcode();
        }

        if take(TOGGLE_THEME).is_some() {
            let theme = self.egui_overlay.theme().toggle();
            self.egui_overlay.set_theme(theme);
            self.settings.theme = theme;
            self.settings.save();
        }

        UiRequests {
            open_media: take(signals::OPEN_MEDIA).is_some(),
        }
    }

    pub fn render(&mut self) -> Result<(), wgpu::SurfaceError> {
        match self.scene.sample_texture() {
            SampledFrame::Upload(frame) => {
                self.surface_pass
                    .upload_frame(&self.gpu.device, &self.gpu.queue, &frame);
            }
            SampledFrame::NotReady if self.surface_pass.has_frame() => {
                self.surface_pass.reset_frame(&self.gpu.device);
            }
            SampledFrame::NotReady | SampledFrame::Unchanged => {}
        }
        let surface = self.scene.surface();
        self.surface_pass.update(
            &self.gpu.queue,
            &self.scene.camera,
            surface.geometry(),
            surface.config().handle_pick_radius_px,
        );

        let output = self.gpu.surface.get_current_texture()?;
        let surface_view = output
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        let mut encoder =
            self.gpu
                .device
                .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                    label: Some("videoplane-encoder"),
                });

        self.surface_pass.draw(&mut encoder, &surface_view);
        self.egui_overlay
            .render(&self.gpu.device, &self.gpu.queue, &mut encoder, &surface_view);

        self.gpu.queue.submit(std::iter::once(encoder.finish()));
        output.present();

        Ok(())
    }
}
