use crate::geometry::{Color, Rect};
use glam::Vec2;

/// Position, size, and per-frame screen rectangles of anything drawable.
///
/// `world` is the level position and never changes with the camera.
/// `destination` and `rendered` are derived by [`RenderState::prepare_frame`]
/// and must be refreshed before every draw.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderState {
    pub world: Vec2,
    pub size: Vec2,
    pub destination: Rect,
    pub rendered: Rect,
    pub source: Option<Rect>,
    pub color: Color,
    pub scale: f32,
}

impl RenderState {
    pub fn new(world: Vec2, size: Vec2) -> Self {
        let rect = Rect::from_pos_size(world, size);
        Self {
            world,
            size,
            destination: rect,
            rendered: rect,
            source: None,
            color: Color::WHITE,
            scale: 1.0,
        }
    }

    pub fn world_rect(&self) -> Rect {
        Rect::from_pos_size(self.world, self.size)
    }

    /// World-space center, used for use-distance and lighting checks.
    pub fn origin(&self) -> Vec2 {
        self.world + self.size * 0.5
    }

    pub fn prepare_frame(&mut self, camera: Vec2, scale: f32) {
        self.scale = scale;
        self.destination = Rect::from_pos_size(self.world - camera, self.size);
        self.rendered = self.destination.scaled_about_center(scale);
    }

    /// Screen-space widgets have no camera offset.
    pub fn prepare_screen(&mut self) {
        self.prepare_frame(Vec2::ZERO, self.scale);
    }
}

impl Default for RenderState {
    fn default() -> Self {
        Self::new(Vec2::ZERO, Vec2::ZERO)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prepare_frame_subtracts_camera() {
        let mut r = RenderState::new(Vec2::new(100.0, 50.0), Vec2::new(64.0, 64.0));
        r.prepare_frame(Vec2::new(30.0, 20.0), 1.0);
        assert_eq!(r.destination, Rect::new(70.0, 30.0, 64.0, 64.0));
        assert_eq!(r.rendered, r.destination);
    }

    #[test]
    fn prepare_frame_scales_around_destination_center() {
        let mut r = RenderState::new(Vec2::new(0.0, 0.0), Vec2::new(64.0, 64.0));
        r.prepare_frame(Vec2::ZERO, 0.5);
        assert_eq!(r.rendered, Rect::new(16.0, 16.0, 32.0, 32.0));
        assert_eq!(r.rendered.center(), r.destination.center());
    }

    #[test]
    fn prepare_frame_is_idempotent() {
        let mut r = RenderState::new(Vec2::new(12.0, 7.0), Vec2::new(10.0, 20.0));
        r.prepare_frame(Vec2::new(3.0, 4.0), 1.5);
        let first = r.clone();
        r.prepare_frame(Vec2::new(3.0, 4.0), 1.5);
        assert_eq!(r, first);
    }

    #[test]
    fn origin_is_world_center() {
        let r = RenderState::new(Vec2::new(10.0, 10.0), Vec2::new(20.0, 40.0));
        assert_eq!(r.origin(), Vec2::new(20.0, 30.0));
    }
}
