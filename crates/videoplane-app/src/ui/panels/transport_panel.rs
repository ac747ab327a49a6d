use egui::{RichText, Ui};

use crate::transport::TransportCommand;
use crate::ui::theme::tokens::*;

/// Snapshot of the transport state, collected before the UI borrow.
pub struct TransportInfo {
    pub title: String,
    pub ready: bool,
    pub paused: bool,
    pub muted: bool,
    pub looping: bool,
    pub current_time: f64,
    pub duration: f64,
    pub displayed_volume: u8,
    pub volume_error: Option<String>,
    pub transcoding: bool,
}

/// Signals written to egui temp data for the host to drain after the frame.
pub mod signals {
    pub const COMMAND: &str = "transport_command";
    pub const VOLUME_PREVIEW: &str = "volume_preview";
    pub const VOLUME_COMMIT: &str = "volume_commit";
    pub const VOLUME_TEXT: &str = "volume_text";
    pub const LOOP: &str = "media_loop";
    pub const OPEN_MEDIA: &str = "open_media";
    pub const TRANSCODE: &str = "transcode_media";
}

const VOLUME_TEXT_BUF: &str = "volume_text_buf";

pub fn draw_transport_panel(ui: &mut Ui, info: &TransportInfo) {
    ui.horizontal(|ui| {
        ui.label(RichText::new(&info.title).size(BODY_SIZE).strong());
        ui.label(
            RichText::new(format!(
                "{} / {}",
                format_time(info.current_time),
                format_time(info.duration)
            ))
            .size(SMALL_SIZE)
            .monospace()
            .color(TEXT_SECONDARY),
        );
    });

    ui.add_space(4.0);

    ui.horizontal(|ui| {
        for &command in TransportCommand::ALL {
            let label = match command {
                TransportCommand::PlayPause if info.paused => "Play",
                TransportCommand::PlayPause => "Pause",
                TransportCommand::ToggleMute if info.muted => "Unmute",
                TransportCommand::ToggleMute => "Mute",
                other => other.display_name(),
            };
            if ui
                .add_enabled(
                    info.ready,
                    egui::Button::new(RichText::new(label).size(SMALL_SIZE)),
                )
                .clicked()
            {
                ui.ctx().data_mut(|d| {
                    d.insert_temp(egui::Id::new(signals::COMMAND), command);
                });
            }
        }

        let mut looping = info.looping;
        if ui.checkbox(&mut looping, "Loop").changed() {
            ui.ctx().data_mut(|d| {
                d.insert_temp(egui::Id::new(signals::LOOP), looping);
            });
        }
    });

    ui.horizontal(|ui| {
        ui.label(
            RichText::new("Volume")
                .size(SMALL_SIZE)
                .color(TEXT_SECONDARY),
        );

        let mut volume = info.displayed_volume;
        let slider = ui.add(
            egui::Slider::new(&mut volume, 0..=100)
                .show_value(true)
                .custom_formatter(|v, _| format!("{v:.0}%")),
        );
        if slider.changed() {
            ui.ctx().data_mut(|d| {
                d.insert_temp(egui::Id::new(signals::VOLUME_PREVIEW), volume);
            });
        }
        // A click without drag commits immediately
        if slider.drag_stopped() || (slider.changed() && !slider.dragged()) {
            ui.ctx().data_mut(|d| {
                d.insert_temp(egui::Id::new(signals::VOLUME_COMMIT), true);
            });
        }

        let mut text: String = ui
            .ctx()
            .data_mut(|d| d.get_temp(egui::Id::new(VOLUME_TEXT_BUF)).unwrap_or_default());
        let response = ui.add(
            egui::TextEdit::singleline(&mut text)
                .hint_text("0-100")
                .desired_width(48.0),
        );
        if response.lost_focus() && ui.input(|i| i.key_pressed(egui::Key::Enter)) {
            ui.ctx().data_mut(|d| {
                d.insert_temp(egui::Id::new(signals::VOLUME_TEXT), text.clone());
            });
            text.clear();
        }
        ui.ctx().data_mut(|d| {
            d.insert_temp(egui::Id::new(VOLUME_TEXT_BUF), text);
        });
    });

    if let Some(err) = &info.volume_error {
        ui.colored_label(ERROR, RichText::new(err).size(SMALL_SIZE));
    }

    ui.add_space(4.0);

    ui.horizontal(|ui| {
        if ui
            .button(RichText::new("Open\u{2026}").size(SMALL_SIZE))
            .clicked()
        {
            ui.ctx().data_mut(|d| {
                d.insert_temp(egui::Id::new(signals::OPEN_MEDIA), true);
            });
        }
        let transcode_label = if info.transcoding {
            "Transcoding\u{2026}"
        } else {
            "Transcode"
        };
        if ui
            .add_enabled(
                !info.transcoding,
                egui::Button::new(RichText::new(transcode_label).size(SMALL_SIZE)),
            )
            .clicked()
        {
            ui.ctx().data_mut(|d| {
                d.insert_temp(egui::Id::new(signals::TRANSCODE), true);
            });
        }
    });
}

/// `m:ss`, or `h:mm:ss` past the hour. Negative and non-finite input shows 0:00.
pub fn format_time(secs: f64) -> String {
    let total = if secs.is_finite() && secs > 0.0 {
        secs.floor() as u64
    } else {
        0
    };
    let (h, m, s) = (total / 3600, (total / 60) % 60, total % 60);
    if h > 0 {
        format!("{h}:{m:02}:{s:02}")
    } else {
        format!("{m}:{s:02}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn formats_minutes_and_seconds() {
        assert_eq!(format_time(0.0), "0:00");
        assert_eq!(format_time(5.9), "0:05");
        assert_eq!(format_time(65.0), "1:05");
    }

    #[test]
    fn formats_hours() {
        assert_eq!(format_time(3723.0), "1:02:03");
    }

    #[test]
    fn bad_input_shows_zero() {
        assert_eq!(format_time(-3.0), "0:00");
        assert_eq!(format_time(f64::NAN), "0:00");
        assert_eq!(format_time(f64::INFINITY), "0:00");
    }

    #[test]
    fn command_signal_is_taken_once() {
        let ctx = egui::Context::default();
        let id = egui::Id::new(signals::COMMAND);
        ctx.data_mut(|d| d.insert_temp(id, TransportCommand::GoToEnd));

        let first: Option<TransportCommand> = ctx.data_mut(|d| d.remove_temp(id));
        assert_eq!(first, Some(TransportCommand::GoToEnd));
        let second: Option<TransportCommand> = ctx.data_mut(|d| d.remove_temp(id));
        assert_eq!(second, None);
    }
}
