use egui::{Color32, Context, CornerRadius, FontId, Stroke, TextStyle, Visuals};
use serde::{Deserialize, Serialize};

pub mod tokens {
    use egui::Color32;

    pub const TEXT_SECONDARY: Color32 = Color32::from_rgb(0xA0, 0xA0, 0xA0);
    pub const ERROR: Color32 = Color32::from_rgb(0xE0, 0x60, 0x60);
    pub const WARNING: Color32 = Color32::from_rgb(0xD4, 0xA0, 0x40);
    pub const SUCCESS: Color32 = Color32::from_rgb(0x50, 0xC0, 0x70);

    pub const PANEL_ROUNDING: u8 = 6;
    pub const WIDGET_ROUNDING: u8 = 4;
    pub const SPACING: f32 = 8.0;
    pub const SPACING_Y: f32 = 4.0;
    pub const MIN_INTERACT_HEIGHT: f32 = 28.0;
    pub const MIN_INTERACT_WIDTH: f32 = 44.0;

    pub const BODY_SIZE: f32 = 14.0;
    pub const MONO_SIZE: f32 = 13.0;
    pub const SMALL_SIZE: f32 = 12.0;
}

use tokens::{PANEL_ROUNDING, WIDGET_ROUNDING};

/// Install `theme`'s visuals plus the shared spacing and text sizes.
pub fn apply(ctx: &Context, theme: ThemeMode) {
    ctx.set_visuals(theme.visuals());
    ctx.style_mut(|style| {
        style.spacing.interact_size =
            egui::vec2(tokens::MIN_INTERACT_WIDTH, tokens::MIN_INTERACT_HEIGHT);
        style.spacing.item_spacing = egui::vec2(tokens::SPACING, tokens::SPACING_Y);
        style.spacing.button_padding = egui::vec2(6.0, 2.0);
        style
            .text_styles
            .insert(TextStyle::Body, FontId::proportional(tokens::BODY_SIZE));
        style
            .text_styles
            .insert(TextStyle::Small, FontId::proportional(tokens::SMALL_SIZE));
        style
            .text_styles
            .insert(TextStyle::Monospace, FontId::monospace(tokens::MONO_SIZE));
    });
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum ThemeMode {
    #[default]
    Dark,
    Light,
}

impl ThemeMode {
    pub fn display_name(&self) -> &'static str {
        match self {
            ThemeMode::Dark => "Dark",
            ThemeMode::Light => "Light",
        }
    }

    pub fn visuals(&self) -> Visuals {
        match self {
            ThemeMode::Dark => themed(Visuals::dark(), &DARK),
            ThemeMode::Light => themed(Visuals::light(), &LIGHT),
        }
    }

    pub fn toggle(&self) -> Self {
        match self {
            ThemeMode::Dark => ThemeMode::Light,
            ThemeMode::Light => ThemeMode::Dark,
        }
    }
}

struct Palette {
    canvas: Color32,
    panel: Color32,
    text: Color32,
    text_secondary: Color32,
    accent: Color32,
    widget: Color32,
    widget_hover: Color32,
    widget_active: Color32,
    separator: Color32,
}

const DARK: Palette = Palette {
    canvas: Color32::from_rgb(0x12, 0x12, 0x12),
    panel: Color32::from_rgb(0x1E, 0x1E, 0x1E),
    text: Color32::from_rgb(0xE8, 0xE8, 0xE8),
    text_secondary: tokens::TEXT_SECONDARY,
    accent: Color32::from_rgb(0x4D, 0xA8, 0xDA),
    widget: Color32::from_rgb(0x2A, 0x2A, 0x2A),
    widget_hover: Color32::from_rgb(0x35, 0x35, 0x35),
    widget_active: Color32::from_rgb(0x40, 0x40, 0x40),
    separator: Color32::from_rgb(0x3A, 0x3A, 0x3A),
};

const LIGHT: Palette = Palette {
    canvas: Color32::from_rgb(0xF5, 0xF5, 0xF5),
    panel: Color32::from_rgb(0xFF, 0xFF, 0xFF),
    text: Color32::from_rgb(0x1A, 0x1A, 0x1A),
    text_secondary: Color32::from_rgb(0x5A, 0x5A, 0x5A),
    accent: Color32::from_rgb(0x09, 0x69, 0xA8),
    widget: Color32::from_rgb(0xE8, 0xE8, 0xE8),
    widget_hover: Color32::from_rgb(0xDD, 0xDD, 0xDD),
    widget_active: Color32::from_rgb(0xD0, 0xD0, 0xD0),
    separator: Color32::from_rgb(0xD5, 0xD5, 0xD5),
};

fn themed(mut v: Visuals, p: &Palette) -> Visuals {
    let rounding = CornerRadius::same(WIDGET_ROUNDING);

    v.panel_fill = p.panel;
    v.window_fill = p.panel;
    v.extreme_bg_color = p.canvas;
    v.override_text_color = Some(p.text);
    v.selection.bg_fill = p.accent.gamma_multiply(0.3);
    v.selection.stroke = Stroke::new(1.0, p.accent);

    let w = &mut v.widgets;
    w.noninteractive.bg_fill = p.panel;
    w.noninteractive.fg_stroke = Stroke::new(1.0, p.text_secondary);
    w.noninteractive.bg_stroke = Stroke::new(0.5, p.separator);
    w.inactive.bg_fill = p.widget;
    w.inactive.fg_stroke = Stroke::new(1.0, p.text);
    w.inactive.bg_stroke = Stroke::new(0.5, p.separator);
    w.hovered.bg_fill = p.widget_hover;
    w.hovered.fg_stroke = Stroke::new(1.0, p.text);
    w.hovered.bg_stroke = Stroke::new(1.0, p.accent);
    w.active.bg_fill = p.widget_active;
    w.active.fg_stroke = Stroke::new(1.0, p.text);
    w.active.bg_stroke = Stroke::new(1.0, p.accent);
    for state in [
        &mut w.noninteractive,
        &mut w.inactive,
        &mut w.hovered,
        &mut w.active,
        &mut w.open,
    ] {
        state.corner_radius = rounding;
    }

    v.window_corner_radius = CornerRadius::same(PANEL_ROUNDING);
    v.window_stroke = Stroke::new(1.0, p.separator);
    v
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_is_dark() {
        assert_eq!(ThemeMode::default(), ThemeMode::Dark);
        assert!(ThemeMode::Dark.visuals().dark_mode);
        assert!(!ThemeMode::Light.visuals().dark_mode);
    }

    #[test]
    fn apply_switches_visuals_and_keeps_spacing() {
        let ctx = Context::default();
        apply(&ctx, ThemeMode::Light);
        assert!(!ctx.style().visuals.dark_mode);
        assert_eq!(ctx.style().spacing.interact_size.y, tokens::MIN_INTERACT_HEIGHT);

        apply(&ctx, ThemeMode::Dark);
        assert!(ctx.style().visuals.dark_mode);
        assert_eq!(ctx.style().spacing.item_spacing.x, tokens::SPACING);
    }

    #[test]
    fn toggle_round_trips() {
        assert_eq!(ThemeMode::Dark.toggle().toggle(), ThemeMode::Dark);
    }

    #[test]
    fn serde_uses_variant_names() {
        let json = serde_json::to_string(&ThemeMode::Light).unwrap();
        assert_eq!(json, "\"Light\"");
        let back: ThemeMode = serde_json::from_str(&json).unwrap();
        assert_eq!(back, ThemeMode::Light);
    }
}
