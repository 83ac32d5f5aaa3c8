//! Screen ↔ world transform for the sprite-sheet editor.
//!
//! `screen = world * scale + origin`. The scale is uniform and never drops
//! below `MIN_SCALE`, so the inverse transform is always defined.

use glam::Vec2;

pub const MIN_SCALE: f32 = 0.1;
pub const DEFAULT_SCALE: f32 = 2.0;
pub const ZOOM_STEP: f32 = 0.1;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    pub origin: Vec2,
    scale: f32,
}

impl Viewport {
    pub fn new(origin: Vec2, scale: f32) -> Self {
        Self {
            origin,
            scale: scale.max(MIN_SCALE),
        }
    }

    /// Viewport centred on a canvas of the given size at the default scale.
    pub fn centered(canvas_size: Vec2) -> Self {
        Self::new(canvas_size * 0.5, DEFAULT_SCALE)
    }

    pub fn scale(&self) -> f32 {
        self.scale
    }

    pub fn screen_to_world(&self, screen: Vec2) -> Vec2 {
        (screen - self.origin) / self.scale
    }

    pub fn world_to_screen(&self, world: Vec2) -> Vec2 {
        world * self.scale + self.origin
    }

    /// Zoom toward `pivot` (screen space). Scrolling up (negative delta)
    /// zooms in. The world point under the pivot stays under the pivot.
    pub fn zoom(&mut self, wheel_delta: f32, pivot: Vec2) {
        let world_pivot = self.screen_to_world(pivot);
        let stepped = if wheel_delta < 0.0 {
            self.scale + ZOOM_STEP
        } else {
            self.scale - ZOOM_STEP
        };
        self.scale = stepped.max(MIN_SCALE);
        self.origin = pivot - world_pivot * self.scale;
    }

    pub fn pan_to(&mut self, origin: Vec2) {
        self.origin = origin;
    }

    pub fn reset(&mut self, canvas_size: Vec2) {
        *self = Self::centered(canvas_size);
    }
}

impl Default for Viewport {
    fn default() -> Self {
        Self::new(Vec2::ZERO, DEFAULT_SCALE)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx(a: Vec2, b: Vec2) -> bool {
        (a - b).length() < 1e-3
    }

    #[test]
    fn screen_world_roundtrip() {
        let vp = Viewport::new(Vec2::new(640.0, 360.0), 2.0);
        let world = vp.screen_to_world(Vec2::new(700.0, 300.0));
        assert!(approx(world, Vec2::new(30.0, -30.0)));
        assert!(approx(vp.world_to_screen(world), Vec2::new(700.0, 300.0)));
    }

    #[test]
    fn zoom_keeps_point_under_cursor() {
        let mut vp = Viewport::new(Vec2::new(100.0, 50.0), 1.7);
        let pivot = Vec2::new(412.0, 233.0);
        let before = vp.screen_to_world(pivot);

        vp.zoom(-120.0, pivot);
        assert!((vp.scale() - 1.8).abs() < 1e-5);
        assert!(approx(vp.world_to_screen(before), pivot));

        vp.zoom(120.0, pivot);
        vp.zoom(120.0, pivot);
        assert!((vp.scale() - 1.6).abs() < 1e-5);
        assert!(approx(vp.world_to_screen(before), pivot));
    }

    #[test]
    fn zoom_out_clamps_to_minimum() {
        let mut vp = Viewport::new(Vec2::ZERO, 0.15);
        let pivot = Vec2::new(50.0, 50.0);
        let before = vp.screen_to_world(pivot);
        for _ in 0..5 {
            vp.zoom(1.0, pivot);
        }
        assert!((vp.scale() - MIN_SCALE).abs() < 1e-6);
        assert!(approx(vp.world_to_screen(before), pivot));
    }

    #[test]
    fn new_clamps_scale() {
        assert_eq!(Viewport::new(Vec2::ZERO, 0.0).scale(), MIN_SCALE);
        assert_eq!(Viewport::new(Vec2::ZERO, -3.0).scale(), MIN_SCALE);
    }

    #[test]
    fn reset_centres_canvas() {
        let mut vp = Viewport::new(Vec2::new(-40.0, 12.0), 5.0);
        vp.reset(Vec2::new(800.0, 600.0));
        assert_eq!(vp.origin, Vec2::new(400.0, 300.0));
        assert_eq!(vp.scale(), DEFAULT_SCALE);
    }

    #[test]
    fn pan_moves_origin_only() {
        let mut vp = Viewport::default();
        vp.pan_to(Vec2::new(25.0, -5.0));
        assert_eq!(vp.origin, Vec2::new(25.0, -5.0));
        assert_eq!(vp.scale(), DEFAULT_SCALE);
    }
}
