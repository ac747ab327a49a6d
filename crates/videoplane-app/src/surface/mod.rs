//! The manipulable plane: geometry plus the drag/resize gesture state machine.
//!
//! States are `Idle -> Dragging -> Idle` and `Idle -> Resizing -> Idle`. Every
//! active state owns a [`CaptureGuard`], so leaving it (pointer-up, pointer
//! leaving the window, surface dropped) releases the window-wide capture.

pub mod capture;
pub mod geometry;

use glam::{Vec2, Vec3};

use crate::error::SceneError;
use crate::gpu::camera::Camera;
use crate::settings::SettingsConfig;
pub use capture::{CaptureGuard, PointerCapture};
pub use geometry::SurfaceGeometry;

/// Tuning for the gesture math. Defaults come from `SettingsConfig`.
#[derive(Debug, Clone, Copy)]
pub struct SurfaceConfig {
    pub drag_sensitivity: f32,
    pub resize_sensitivity: f32,
    pub min_size: f32,
    pub handle_pick_radius_px: f32,
}

impl From<&SettingsConfig> for SurfaceConfig {
    fn from(s: &SettingsConfig) -> Self {
        Self {
            drag_sensitivity: s.drag_sensitivity,
            resize_sensitivity: s.resize_sensitivity,
            min_size: s.min_size,
            handle_pick_radius_px: s.handle_pick_radius_px,
        }
    }
}

impl Default for SurfaceConfig {
    fn default() -> Self {
        Self::from(&SettingsConfig::default())
    }
}

/// Reference captured when a drag starts.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DragAnchor {
    pub pointer_origin_screen: Vec2,
    pub surface_origin_scene: Vec2,
}

#[derive(Debug)]
pub enum InteractionState {
    Idle,
    Dragging {
        anchor: DragAnchor,
        _capture: CaptureGuard,
    },
    Resizing {
        /// Pointer position at the previous move; deltas are frame-to-frame.
        last_pointer: Vec2,
        _capture: CaptureGuard,
    },
}

/// Which gesture is active, without the state payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GestureKind {
    Idle,
    Dragging,
    Resizing,
}

/// What a pointer-down landed on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HitTarget {
    ResizeHandle,
    Body,
    Miss,
}

pub struct ManipulableSurface {
    geometry: SurfaceGeometry,
    state: InteractionState,
    config: SurfaceConfig,
}

impl ManipulableSurface {
    pub fn new(size: Vec2, config: SurfaceConfig) -> Self {
        let size = size.max(Vec2::splat(config.min_size));
        Self {
            geometry: SurfaceGeometry::new(size),
            state: InteractionState::Idle,
            config,
        }
    }

    pub fn geometry(&self) -> &SurfaceGeometry {
        &self.geometry
    }

    pub fn gesture(&self) -> GestureKind {
        match self.state {
            InteractionState::Idle => GestureKind::Idle,
            InteractionState::Dragging { .. } => GestureKind::Dragging,
            InteractionState::Resizing { .. } => GestureKind::Resizing,
        }
    }

    pub fn drag_anchor(&self) -> Option<DragAnchor> {
        match self.state {
            InteractionState::Dragging { anchor, .. } => Some(anchor),
            _ => None,
        }
    }

    pub fn config(&self) -> &SurfaceConfig {
        &self.config
    }

    /// Resolve what is under `screen`. The resize marker is checked first and
    /// picked in screen space so it stays reachable at any surface scale.
    pub fn hit_test(&self, screen: Vec2, camera: &Camera) -> HitTarget {
        let handle = self.geometry.handle_position();
        if let Some(handle_screen) = camera.scene_to_screen(Vec3::new(handle.x, handle.y, 0.0)) {
            if handle_screen.distance(screen) <= self.config.handle_pick_radius_px {
                return HitTarget::ResizeHandle;
            }
        }
        match camera.screen_to_plane(screen) {
            Some(p) if self.geometry.contains(p) => HitTarget::Body,
            _ => HitTarget::Miss,
        }
    }

    /// Pointer pressed at `screen`. Hit-tests, then starts a gesture.
    pub fn pointer_down(
        &mut self,
        screen: Vec2,
        camera: &Camera,
        capture: &PointerCapture,
    ) -> Result<GestureKind, SceneError> {
        if !matches!(self.state, InteractionState::Idle) {
            return Err(SceneError::GestureConflict);
        }
        let target = self.hit_test(screen, camera);
        self.begin_gesture(target, screen, capture)
    }

    /// Start a gesture on an already resolved target. Only valid from Idle; an
    /// active gesture makes this a `GestureConflict` with nothing changed.
    pub fn begin_gesture(
        &mut self,
        target: HitTarget,
        screen: Vec2,
        capture: &PointerCapture,
    ) -> Result<GestureKind, SceneError> {
        if !matches!(self.state, InteractionState::Idle) {
            return Err(SceneError::GestureConflict);
        }
        if target == HitTarget::Miss {
            return Ok(GestureKind::Idle);
        }
        let guard = capture.acquire().ok_or(SceneError::GestureConflict)?;

        self.state = if target == HitTarget::Body {
            let anchor = DragAnchor {
                pointer_origin_screen: screen,
                surface_origin_scene: self.geometry.position,
            };
            log::debug!("drag start at {screen}, surface at {}", anchor.surface_origin_scene);
            InteractionState::Dragging {
                anchor,
                _capture: guard,
            }
        } else {
            log::debug!("resize start at {screen}, size {}", self.geometry.size);
            InteractionState::Resizing {
                last_pointer: screen,
                _capture: guard,
            }
        };
        Ok(self.gesture())
    }

    /// Pointer moved to `screen` (window coordinates, wherever the pointer is).
    /// Returns true if the geometry changed.
    pub fn pointer_move(&mut self, screen: Vec2) -> bool {
        match &mut self.state {
            InteractionState::Idle => false,
            InteractionState::Dragging { anchor, .. } => {
                let position = geometry::drag_position(
                    anchor.surface_origin_scene,
                    anchor.pointer_origin_screen,
                    screen,
                    self.config.drag_sensitivity,
                );
                let changed = position != self.geometry.position;
                self.geometry.position = position;
                changed
            }
            InteractionState::Resizing { last_pointer, .. } => {
                let movement = screen - *last_pointer;
                *last_pointer = screen;
                let size = geometry::resized(
                    self.geometry.size,
                    movement,
                    self.config.resize_sensitivity,
                    self.config.min_size,
                );
                let changed = size != self.geometry.size;
                self.geometry.size = size;
                changed
            }
        }
    }

    /// Pointer released anywhere. Ends any active gesture.
    pub fn pointer_up(&mut self) -> GestureKind {
        self.end_gesture("pointer up")
    }

    /// Pointer left the window. Treated exactly like a release.
    pub fn pointer_left(&mut self) -> GestureKind {
        self.end_gesture("pointer left")
    }

    /// Window lost focus; the release may never be delivered.
    pub fn focus_lost(&mut self) -> GestureKind {
        self.end_gesture("focus lost")
    }

    /// Returns the gesture that ended (`Idle` if none was active).
    fn end_gesture(&mut self, reason: &str) -> GestureKind {
        let ended = self.gesture();
        if ended != GestureKind::Idle {
            log::debug!(
                "{ended:?} end ({reason}): position {}, size {}",
                self.geometry.position,
                self.geometry.size
            );
        }
        // Dropping the old state releases its capture guard
        self.state = InteractionState::Idle;
        ended
    }
}
