use eframe::egui::{Pos2, Vec2};

pub const MIN_ZOOM: f32 = 0.3;
pub const MAX_ZOOM: f32 = 3.0;
const ZOOM_IN_STEP: f32 = 1.1;
const ZOOM_OUT_STEP: f32 = 0.9;

/// Pan/zoom between world space and a surface whose centre is `screen_center`.
///
/// `screen = world * zoom + pan + screen_center`
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ViewTransform {
    pub pan: Vec2,
    pub zoom: f32,
}

impl Default for ViewTransform {
    fn default() -> Self {
        Self {
            pan: Vec2::ZERO,
            zoom: 1.0,
        }
    }
}

impl ViewTransform {
    pub fn world_to_screen(&self, screen_center: Pos2, world: Vec2) -> Pos2 {
        screen_center + self.pan + world * self.zoom
    }

    pub fn screen_to_world(&self, screen_center: Pos2, screen: Pos2) -> Vec2 {
        (screen - screen_center - self.pan) / self.zoom
    }

    /// Applies wheel notches: positive zooms in by 10% each, negative out.
    pub fn zoom_notches(&mut self, notches: i32) {
        let step = if notches >= 0 {
            ZOOM_IN_STEP
        } else {
            ZOOM_OUT_STEP
        };
        for _ in 0..notches.unsigned_abs() {
            self.zoom = (self.zoom * step).clamp(MIN_ZOOM, MAX_ZOOM);
        }
    }

    pub fn pan_by(&mut self, screen_delta: Vec2) {
        self.pan += screen_delta;
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

#[cfg(test)]
mod tests {
    use eframe::egui::{pos2, vec2};

    use super::*;

    #[test]
    fn forward_and_inverse_agree() {
        let transform = ViewTransform {
            pan: vec2(30.0, -12.0),
            zoom: 1.7,
        };
        let center = pos2(400.0, 300.0);
        let world = vec2(120.0, -40.0);

        let screen = transform.world_to_screen(center, world);
        assert!((screen - pos2(634.0, 220.0)).length() < 1e-3);
        assert!((transform.screen_to_world(center, screen) - world).length() < 1e-4);
    }

    #[test]
    fn zoom_steps_and_clamps() {
        let mut transform = ViewTransform::default();
        transform.zoom_notches(1);
        assert!((transform.zoom - 1.1).abs() < 1e-6);
        transform.zoom_notches(-1);
        assert!((transform.zoom - 0.99).abs() < 1e-6);

        transform.zoom_notches(100);
        assert_eq!(transform.zoom, MAX_ZOOM);
        transform.zoom_notches(-100);
        assert_eq!(transform.zoom, MIN_ZOOM);
    }

    #[test]
    fn reset_restores_identity() {
        let mut transform = ViewTransform::default();
        transform.pan_by(vec2(5.0, 5.0));
        transform.zoom_notches(3);
        transform.reset();
        assert_eq!(transform, ViewTransform::default());
    }
}
