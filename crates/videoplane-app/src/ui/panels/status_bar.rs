use egui::{RichText, Ui, Vec2};

use crate::media::Readiness;
use crate::ui::theme::ThemeMode;
use crate::ui::theme::tokens::*;

pub const TOGGLE_THEME: &str = "toggle_theme";

pub fn draw_status_bar(
    ui: &mut Ui,
    readiness: &Readiness,
    status_message: Option<&str>,
    dt_secs: f32,
    theme: ThemeMode,
) {
    ui.horizontal(|ui| {
        let (color, label) = match readiness {
            Readiness::Loading => (WARNING, "Loading".to_string()),
            Readiness::Ready => (SUCCESS, "Ready".to_string()),
            Readiness::Unavailable(reason) => (ERROR, format!("Unavailable: {reason}")),
        };
        let (dot_rect, _) = ui.allocate_exact_size(Vec2::new(8.0, 8.0), egui::Sense::hover());
        ui.painter().circle_filled(dot_rect.center(), 3.0, color);
        ui.label(RichText::new(label).size(SMALL_SIZE).color(color));

        if let Some(message) = status_message {
            ui.separator();
            ui.label(RichText::new(message).size(SMALL_SIZE));
        }

        ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
            let fps = if dt_secs > 0.0 {
                (1.0 / dt_secs) as u32
            } else {
                0
            };
            ui.label(
                RichText::new(format!("{fps}"))
                    .size(SMALL_SIZE)
                    .color(TEXT_SECONDARY),
            );

            if ui
                .small_button(theme.toggle().display_name())
                .on_hover_text("Switch theme")
                .clicked()
            {
                ui.ctx().data_mut(|d| {
                    d.insert_temp(egui::Id::new(TOGGLE_THEME), true);
                });
            }
        });
    });
}
