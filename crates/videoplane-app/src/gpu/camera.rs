use glam::{Mat4, Vec2, Vec3};

/// Perspective camera looking down -Z at the z = 0 plane the surface lives on.
/// Screen coordinates are logical pixels with the origin at the top-left and
/// Y growing downward; scene Y grows upward.
#[derive(Debug, Clone, Copy)]
pub struct Camera {
    pub eye: Vec3,
    pub fov_y_deg: f32,
    pub near: f32,
    pub far: f32,
    pub viewport: Vec2,
}

impl Camera {
    pub fn new(viewport_width: f32, viewport_height: f32) -> Self {
        Self {
            eye: Vec3::new(0.0, 0.0, 10.0),
            fov_y_deg: 50.0,
            near: 0.1,
            far: 1000.0,
            viewport: Vec2::new(viewport_width.max(1.0), viewport_height.max(1.0)),
        }
    }

    pub fn set_viewport(&mut self, width: f32, height: f32) {
        self.viewport = Vec2::new(width.max(1.0), height.max(1.0));
    }

    pub fn view_proj(&self) -> Mat4 {
        let aspect = self.viewport.x / self.viewport.y;
        let proj = Mat4::perspective_rh(self.fov_y_deg.to_radians(), aspect, self.near, self.far);
        let view = Mat4::look_at_rh(self.eye, Vec3::new(self.eye.x, self.eye.y, 0.0), Vec3::Y);
        proj * view
    }

    fn screen_to_ndc(&self, screen: Vec2) -> Vec2 {
        Vec2::new(
            2.0 * screen.x / self.viewport.x - 1.0,
            1.0 - 2.0 * screen.y / self.viewport.y,
        )
    }

    /// Cast a ray through `screen` and intersect it with the z = 0 plane.
    pub fn screen_to_plane(&self, screen: Vec2) -> Option<Vec2> {
        let ndc = self.screen_to_ndc(screen);
        let inv = self.view_proj().inverse();
        let near = inv.project_point3(Vec3::new(ndc.x, ndc.y, 0.0));
        let far = inv.project_point3(Vec3::new(ndc.x, ndc.y, 1.0));
        let dir = far - near;
        if dir.z.abs() < f32::EPSILON {
            return None;
        }
        let t = -near.z / dir.z;
        if !t.is_finite() || t < 0.0 {
            return None;
        }
        Some((near + dir * t).truncate())
    }

    /// Scene units covered by one screen pixel on the z = 0 plane.
    pub fn units_per_pixel(&self) -> f32 {
        let visible_height = 2.0 * self.eye.z.abs() * (self.fov_y_deg.to_radians() * 0.5).tan();
        visible_height / self.viewport.y
    }

    /// Project a scene point to screen pixels. `None` when behind the camera.
    pub fn scene_to_screen(&self, point: Vec3) -> Option<Vec2> {
        let clip = self.view_proj() * point.extend(1.0);
        if clip.w <= 0.0 {
            return None;
        }
        let ndc = clip.truncate() / clip.w;
        Some(Vec2::new(
            (ndc.x + 1.0) * 0.5 * self.viewport.x,
            (1.0 - ndc.y) * 0.5 * self.viewport.y,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx(a: Vec2, b: Vec2) -> bool {
        (a - b).length() < 1e-2
    }

    #[test]
    fn viewport_center_hits_origin() {
        let cam = Camera::new(800.0, 450.0);
        let p = cam.screen_to_plane(Vec2::new(400.0, 225.0)).unwrap();
        assert!(approx(p, Vec2::ZERO), "got {p}");
    }

    #[test]
    fn screen_up_is_scene_up() {
        let cam = Camera::new(800.0, 450.0);
        let p = cam.screen_to_plane(Vec2::new(400.0, 0.0)).unwrap();
        // Half the visible height at distance 10 with a 50 degree fov
        let expected = 10.0 * 25f32.to_radians().tan();
        assert!(approx(p, Vec2::new(0.0, expected)), "got {p}");
    }

    #[test]
    fn project_then_unproject() {
        let cam = Camera::new(800.0, 450.0);
        let scene = Vec3::new(3.0, -2.0, 0.0);
        let screen = cam.scene_to_screen(scene).unwrap();
        let back = cam.screen_to_plane(screen).unwrap();
        assert!(approx(back, scene.truncate()), "got {back}");
    }

    #[test]
    fn units_per_pixel_matches_projection() {
        let cam = Camera::new(800.0, 450.0);
        let a = cam.screen_to_plane(Vec2::new(400.0, 225.0)).unwrap();
        let b = cam.screen_to_plane(Vec2::new(400.0, 125.0)).unwrap();
        assert!(((b.y - a.y) - 100.0 * cam.units_per_pixel()).abs() < 1e-2);
    }

    #[test]
    fn point_behind_camera_has_no_screen_position() {
        let cam = Camera::new(800.0, 450.0);
        assert!(cam.scene_to_screen(Vec3::new(0.0, 0.0, 20.0)).is_none());
    }
}
