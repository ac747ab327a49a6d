use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::ui::theme::ThemeMode;

/// Scene units per screen pixel while dragging.
pub const DEFAULT_DRAG_SENSITIVITY: f32 = 0.01;
/// Scene units per screen pixel while resizing.
pub const DEFAULT_RESIZE_SENSITIVITY: f32 = 0.05;
/// Per-axis floor for surface width/height, in scene units.
pub const DEFAULT_MIN_SIZE: f32 = 1.0;
pub const DEFAULT_SURFACE_SIZE: [f32; 2] = [16.0, 9.0];
pub const DEFAULT_SEEK_STEP_SECS: f64 = 5.0;
/// Pick radius for the resize marker, in logical pixels. Independent of the
/// surface scale so the marker stays clickable when the plane is small.
pub const DEFAULT_HANDLE_PICK_RADIUS_PX: f32 = 10.0;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SettingsConfig {
    #[serde(default = "default_version")]
    pub version: u32,
    #[serde(default)]
    pub theme: ThemeMode,
    #[serde(default = "default_drag_sensitivity")]
    pub drag_sensitivity: f32,
    #[serde(default = "default_resize_sensitivity")]
    pub resize_sensitivity: f32,
    #[serde(default = "default_min_size")]
    pub min_size: f32,
    #[serde(default = "default_surface_size")]
    pub initial_size: [f32; 2],
    #[serde(default = "default_seek_step")]
    pub seek_step_secs: f64,
    #[serde(default = "default_pick_radius")]
    pub handle_pick_radius_px: f32,
    /// Initial volume, 0..=100.
    #[serde(default = "default_volume")]
    pub initial_volume: u8,
    #[serde(default)]
    pub looping: bool,
    #[serde(default = "default_transcode_format")]
    pub transcode_format: String,
}

fn default_version() -> u32 {
    1
}
fn default_drag_sensitivity() -> f32 {
    DEFAULT_DRAG_SENSITIVITY
}
fn default_resize_sensitivity() -> f32 {
    DEFAULT_RESIZE_SENSITIVITY
}
fn default_min_size() -> f32 {
    DEFAULT_MIN_SIZE
}
fn default_surface_size() -> [f32; 2] {
    DEFAULT_SURFACE_SIZE
}
fn default_seek_step() -> f64 {
    DEFAULT_SEEK_STEP_SECS
}
fn default_pick_radius() -> f32 {
    DEFAULT_HANDLE_PICK_RADIUS_PX
}
fn default_volume() -> u8 {
    100
}
fn default_transcode_format() -> String {
    "mp4".to_string()
}

impl Default for SettingsConfig {
    fn default() -> Self {
        Self {
            version: default_version(),
            theme: ThemeMode::Dark,
            drag_sensitivity: DEFAULT_DRAG_SENSITIVITY,
            resize_sensitivity: DEFAULT_RESIZE_SENSITIVITY,
            min_size: DEFAULT_MIN_SIZE,
            initial_size: DEFAULT_SURFACE_SIZE,
            seek_step_secs: DEFAULT_SEEK_STEP_SECS,
            handle_pick_radius_px: DEFAULT_HANDLE_PICK_RADIUS_PX,
            initial_volume: 100,
            looping: false,
            transcode_format: default_transcode_format(),
        }
    }
}

impl SettingsConfig {
    fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|d| d.join("videoplane").join("settings.json"))
    }

    pub fn load() -> Self {
        match Self::default_path() {
            Some(path) => Self::load_from(&path),
            None => Self::default(),
        }
    }

    pub fn load_from(path: &Path) -> Self {
        let settings = match std::fs::read_to_string(path) {
            Ok(json) => serde_json::from_str(&json).unwrap_or_else(|e| {
                log::warn!("Ignoring malformed settings {}: {e}", path.display());
                Self::default()
            }),
            Err(_) => Self::default(),
        };
        settings.sanitized()
    }

    pub fn save(&self) {
        if let Some(path) = Self::default_path() {
            self.save_to(&path);
        }
    }

    pub fn save_to(&self, path: &Path) {
        if let Some(dir) = path.parent() {
            let _ = std::fs::create_dir_all(dir);
        }
        if let Ok(json) = serde_json::to_string_pretty(self) {
            if let Err(e) = std::fs::write(path, json) {
                log::warn!("Failed to save settings {}: {e}", path.display());
            }
        }
    }

    /// Replace nonsensical values from a hand-edited file with defaults.
    fn sanitized(mut self) -> Self {
        if !(self.min_size.is_finite() && self.min_size > 0.0) {
            self.min_size = DEFAULT_MIN_SIZE;
        }
        if !self.drag_sensitivity.is_finite() {
            self.drag_sensitivity = DEFAULT_DRAG_SENSITIVITY;
        }
        if !self.resize_sensitivity.is_finite() {
            self.resize_sensitivity = DEFAULT_RESIZE_SENSITIVITY;
        }
        for axis in &mut self.initial_size {
            if !axis.is_finite() {
                *axis = self.min_size;
            }
            *axis = axis.max(self.min_size);
        }
        if !(self.handle_pick_radius_px.is_finite() && self.handle_pick_radius_px > 0.0) {
            self.handle_pick_radius_px = DEFAULT_HANDLE_PICK_RADIUS_PX;
        }
        if !(self.seek_step_secs.is_finite() && self.seek_step_secs > 0.0) {
            self.seek_step_secs = DEFAULT_SEEK_STEP_SECS;
        }
        self.initial_volume = self.initial_volume.min(100);
        self
    }
}
