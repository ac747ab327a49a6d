pub mod status_bar;
pub mod transport_panel;

use egui::Context;

use crate::media::Readiness;
use crate::ui::theme::ThemeMode;
use transport_panel::TransportInfo;

/// Draw the transport panel and status bar.
pub fn draw_panels(
    ctx: &Context,
    transport: &TransportInfo,
    readiness: &Readiness,
    status_message: Option<&str>,
    dt_secs: f32,
    theme: ThemeMode,
) {
    egui::TopBottomPanel::bottom("status_bar").show(ctx, |ui| {
        status_bar::draw_status_bar(ui, readiness, status_message, dt_secs, theme);
    });

    egui::TopBottomPanel::bottom("transport_panel")
        .resizable(false)
        .show(ctx, |ui| {
            transport_panel::draw_transport_panel(ui, transport);
        });
}
