mod app;
mod error;
mod gpu;
mod media;
mod scene;
mod settings;
mod surface;
mod transcode;
mod transport;
mod ui;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use crossbeam_channel::Receiver;
use winit::application::ApplicationHandler;
use winit::event::{ElementState, KeyEvent, MouseButton, WindowEvent};
use winit::event_loop::{ActiveEventLoop, EventLoop};
use winit::keyboard::{KeyCode, PhysicalKey};
use winit::window::{Fullscreen, Window, WindowAttributes, WindowId};

use app::App;
use media::MediaLocator;
use settings::SettingsConfig;
use transport::TransportCommand;

/// `videoplane [LOCATOR] [--transcode[=FORMAT]]`
#[derive(Debug, Default, PartialEq, Eq)]
struct CliArgs {
    locator: Option<String>,
    /// `Some("")` means "use the configured format".
    transcode: Option<String>,
}

impl CliArgs {
    fn parse(args: impl IntoIterator<Item = String>) -> Self {
        let mut parsed = Self::default();
        for arg in args {
            if arg == "--transcode" {
                parsed.transcode = Some(String::new());
            } else if let Some(format) = arg.strip_prefix("--transcode=") {
                parsed.transcode = Some(format.to_string());
            } else if arg.starts_with("--") {
                log::warn!("Ignoring unknown option {arg}");
            } else if parsed.locator.is_none() {
                parsed.locator = Some(arg);
            } else {
                log::warn!("Ignoring extra argument {arg}");
            }
        }
        parsed
    }
}

struct VideoplaneApp {
    app: Option<App>,
    window: Option<Arc<Window>>,
    args: CliArgs,
    file_dialog_rx: Option<Receiver<PathBuf>>,
}

impl VideoplaneApp {
    fn new(args: CliArgs) -> Self {
        Self {
            app: None,
            window: None,
            args,
            file_dialog_rx: None,
        }
    }

    fn open_file_dialog(&mut self) {
        if self.file_dialog_rx.is_some() {
            return;
        }
        let (tx, rx) = crossbeam_channel::bounded(1);
        self.file_dialog_rx = Some(rx);
        std::thread::Builder::new()
            .name("file-dialog".into())
            .spawn(move || {
                let dialog = rfd::FileDialog::new()
                    .add_filter("Video", media::decoder::VIDEO_EXTENSIONS)
                    .add_filter("All files", &["*"]);
                if let Some(path) = dialog.pick_file() {
                    let _ = tx.send(path);
                }
            })
            .ok();
    }

    fn poll_file_dialog(&mut self) {
        let Some(rx) = &self.file_dialog_rx else {
            return;
        };
        match rx.try_recv() {
            Ok(path) => {
                if let Some(app) = self.app.as_mut() {
                    app.open_media(path);
                }
                self.file_dialog_rx = None;
            }
            // Cancelled: sender dropped without sending
            Err(crossbeam_channel::TryRecvError::Disconnected) => {
                self.file_dialog_rx = None;
            }
            Err(crossbeam_channel::TryRecvError::Empty) => {}
        }
    }
}

impl ApplicationHandler for VideoplaneApp {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_some() {
            return;
        }

        let attrs = WindowAttributes::default()
            .with_title("videoplane")
            .with_inner_size(winit::dpi::LogicalSize::new(800, 450));

        let window = match event_loop.create_window(attrs) {
            Ok(window) => Arc::new(window),
            Err(e) => {
                log::error!("Failed to create window: {e}");
                event_loop.exit();
                return;
            }
        };
        self.window = Some(window.clone());

        let mut settings = SettingsConfig::load();
        let locator = self.args.locator.clone().map(MediaLocator::new);
        let transcode = self.args.transcode.take();
        if let Some(format) = transcode.as_deref().filter(|f| !f.is_empty()) {
            settings.transcode_format = format.to_string();
        }

        match App::new(window, settings, locator) {
            Ok(mut app) => {
                if transcode.is_some() {
                    app.start_transcode();
                }
                self.app = Some(app);
                log::info!("videoplane initialized");
            }
            Err(e) => {
                log::error!("Failed to initialize app: {e}");
                event_loop.exit();
            }
        }
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        _window_id: WindowId,
        event: WindowEvent,
    ) {
        let Some(app) = self.app.as_mut() else {
            return;
        };

        let egui_consumed = app.egui_overlay.handle_event(&app.window, &event);
        // An active gesture owns the pointer even over panels
        let capturing = app.scene.captures_pointer();

        match event {
            WindowEvent::CloseRequested => {
                event_loop.exit();
            }
            WindowEvent::Resized(size) => {
                app.resize(size.width, size.height);
            }
            WindowEvent::CursorMoved { position, .. } => {
                let pointer = app.logical_pointer(position);
                app.last_pointer = Some(pointer);
                app.scene.pointer_move(pointer);
            }
            WindowEvent::CursorLeft { .. } => {
                app.last_pointer = None;
                app.scene.pointer_left();
            }
            WindowEvent::Focused(false) => {
                app.scene.focus_lost();
            }
            WindowEvent::MouseInput {
                state,
                button: MouseButton::Left,
                ..
            } => match state {
                ElementState::Pressed if capturing || !app.egui_overlay.wants_mouse() => {
                    if let Some(pointer) = app.last_pointer {
                        app.scene.pointer_down(pointer);
                    }
                }
                ElementState::Pressed => {}
                ElementState::Released => {
                    app.scene.pointer_up();
                }
            },
            WindowEvent::KeyboardInput {
                event:
                    KeyEvent {
                        physical_key: PhysicalKey::Code(key),
                        state: ElementState::Pressed,
                        repeat: false,
                        ..
                    },
                ..
            } if !egui_consumed || !app.egui_overlay.wants_keyboard() => match key {
                KeyCode::Escape => event_loop.exit(),
                KeyCode::KeyF => {
                    let window = &app.window;
                    if window.fullscreen().is_some() {
                        window.set_fullscreen(None);
                    } else {
                        window.set_fullscreen(Some(Fullscreen::Borderless(None)));
                    }
                }
                KeyCode::Space => app.scene.dispatch(TransportCommand::PlayPause),
                KeyCode::ArrowLeft => app.scene.dispatch(TransportCommand::Rewind),
                KeyCode::ArrowRight => app.scene.dispatch(TransportCommand::Forward),
                KeyCode::Home => app.scene.dispatch(TransportCommand::GoToStart),
                KeyCode::End => app.scene.dispatch(TransportCommand::GoToEnd),
                KeyCode::KeyM => app.scene.dispatch(TransportCommand::ToggleMute),
                _ => {}
            },
            WindowEvent::RedrawRequested => {
                app.update();
                let requests = app.draw_ui();

                match app.render() {
                    Ok(()) => {}
                    Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                        let w = app.gpu.surface_config.width;
                        let h = app.gpu.surface_config.height;
                        app.resize(w, h);
                    }
                    Err(wgpu::SurfaceError::OutOfMemory) => {
                        log::error!("Out of GPU memory");
                        event_loop.exit();
                    }
                    Err(e) => {
                        log::warn!("Surface error: {e}");
                    }
                }

                app.window.request_redraw();

                if requests.open_media {
                    self.open_file_dialog();
                }
                self.poll_file_dialog();
            }
            _ => {}
        }
    }
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp_millis()
        .init();

    let args = CliArgs::parse(std::env::args().skip(1));
    if args.transcode.is_some() && args.locator.is_none() {
        log::warn!("--transcode given without a media locator; nothing to transcode");
    }

    let event_loop = EventLoop::new()?;
    event_loop.set_control_flow(winit::event_loop::ControlFlow::Poll);

    let mut app = VideoplaneApp::new(args);
    event_loop.run_app(&mut app)?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> CliArgs {
        CliArgs::parse(args.iter().map(|s| s.to_string()))
    }

    #[test]
    fn no_args() {
        assert_eq!(parse(&[]), CliArgs::default());
    }

    #[test]
    fn locator_only() {
        let args = parse(&["clip.mp4"]);
        assert_eq!(args.locator.as_deref(), Some("clip.mp4"));
        assert_eq!(args.transcode, None);
    }

    #[test]
    fn transcode_flag_with_and_without_format() {
        let args = parse(&["--transcode", "clip.avi"]);
        assert_eq!(args.locator.as_deref(), Some("clip.avi"));
        assert_eq!(args.transcode.as_deref(), Some(""));

        let args = parse(&["clip.avi", "--transcode=webm"]);
        assert_eq!(args.transcode.as_deref(), Some("webm"));
    }

    #[test]
    fn extra_and_unknown_args_ignored() {
        let args = parse(&["a.mp4", "b.mp4", "--loud"]);
        assert_eq!(args.locator.as_deref(), Some("a.mp4"));
        assert_eq!(args.transcode, None);
    }
}
