use glam::Vec2;

/// Position (center) and size of the surface in scene units.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SurfaceGeometry {
    pub position: Vec2,
    pub size: Vec2,
}

impl SurfaceGeometry {
    pub fn new(size: Vec2) -> Self {
        Self {
            position: Vec2::ZERO,
            size,
        }
    }

    pub fn contains(&self, point: Vec2) -> bool {
        let half = self.size * 0.5;
        let d = (point - self.position).abs();
        d.x <= half.x && d.y <= half.y
    }

    /// Where the resize marker sits: the positive (top-right) corner.
    pub fn handle_position(&self) -> Vec2 {
        self.position + self.size * 0.5
    }
}

/// Absolute drag: anchor origin plus the scaled pointer offset, Y inverted.
/// Depends only on the latest pointer, not on the path taken.
pub fn drag_position(
    surface_origin: Vec2,
    pointer_origin: Vec2,
    pointer: Vec2,
    sensitivity: f32,
) -> Vec2 {
    let d = pointer - pointer_origin;
    surface_origin + Vec2::new(d.x, -d.y) * sensitivity
}

/// Incremental resize, floored per axis at `min_size`.
pub fn resized(size: Vec2, movement: Vec2, sensitivity: f32, min_size: f32) -> Vec2 {
    (size + movement * sensitivity).max(Vec2::splat(min_size))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn contains_edges_and_outside() {
        let g = SurfaceGeometry::new(Vec2::new(16.0, 9.0));
        assert!(g.contains(Vec2::ZERO));
        assert!(g.contains(Vec2::new(8.0, 4.5)));
        assert!(!g.contains(Vec2::new(8.1, 0.0)));
        assert!(!g.contains(Vec2::new(0.0, -4.6)));
    }

    #[test]
    fn handle_tracks_corner() {
        let mut g = SurfaceGeometry::new(Vec2::new(16.0, 9.0));
        assert_eq!(g.handle_position(), Vec2::new(8.0, 4.5));
        g.position = Vec2::new(1.0, -1.0);
        g.size = Vec2::new(2.0, 2.0);
        assert_eq!(g.handle_position(), Vec2::new(2.0, 0.0));
    }

    #[test]
    fn drag_inverts_y() {
        let p = drag_position(Vec2::ZERO, Vec2::new(100.0, 100.0), Vec2::new(150.0, 130.0), 0.01);
        assert!((p - Vec2::new(0.5, -0.3)).length() < 1e-6);
    }

    #[test]
    fn resize_floors_each_axis() {
        let s = resized(Vec2::new(2.0, 9.0), Vec2::new(-100.0, 10.0), 0.05, 1.0);
        assert_eq!(s, Vec2::new(1.0, 9.5));
    }
}
