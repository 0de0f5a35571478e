use eframe::egui::Vec2;

pub(in crate::app) const MIN_SCALE: f32 = 0.1;
pub(in crate::app) const MAX_SCALE: f32 = 8.0;
const TWEEN_SECONDS: f64 = 0.75;

/// Canvas-local affine view: `screen = world * scale + translate`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub(in crate::app) struct Camera {
    pub(in crate::app) translate: Vec2,
    pub(in crate::app) scale: f32,
}

impl Default for Camera {
    fn default() -> Self {
        Self {
            translate: Vec2::ZERO,
            scale: 1.0,
        }
    }
}

impl Camera {
    pub(in crate::app) fn world_to_screen(self, world: Vec2) -> Vec2 {
        world * self.scale + self.translate
    }

    pub(in crate::app) fn screen_to_world(self, screen: Vec2) -> Vec2 {
        (screen - self.translate) / self.scale
    }

    /// Zooms by `factor` keeping the world point under `anchor` fixed.
    pub(in crate::app) fn zoom_at(&mut self, anchor: Vec2, factor: f32) {
        if !factor.is_finite() || factor <= 0.0 {
            return;
        }

        let world = self.screen_to_world(anchor);
        self.scale = (self.scale * factor).clamp(MIN_SCALE, MAX_SCALE);
        self.translate = anchor - world * self.scale;
    }

    pub(in crate::app) fn pan(&mut self, delta: Vec2) {
        self.translate += delta;
    }

    /// Same scale, translated so `world` lands on the viewport center.
    pub(in crate::app) fn centered_on(self, world: Vec2, viewport: Vec2) -> Self {
        Self {
            translate: viewport * 0.5 - world * self.scale,
            scale: self.scale,
        }
    }

    fn lerp(self, other: Self, t: f32) -> Self {
        Self {
            translate: self.translate + (other.translate - self.translate) * t,
            scale: self.scale + (other.scale - self.scale) * t,
        }
    }
}

fn ease_cubic_in_out(t: f32) -> f32 {
    if t < 0.5 {
        4.0 * t * t * t
    } else {
        1.0 - (-2.0 * t + 2.0).powi(3) / 2.0
    }
}

#[derive(Clone, Copy, Debug)]
pub(in crate::app) struct CameraTween {
    from: Camera,
    to: Camera,
    started_at: f64,
}

impl CameraTween {
    pub(in crate::app) fn new(from: Camera, to: Camera, now: f64) -> Self {
        Self {
            from,
            to,
            started_at: now,
        }
    }

    /// Camera at `now`, and whether the tween has finished.
    pub(in crate::app) fn sample(&self, now: f64) -> (Camera, bool) {
        let t = ((now - self.started_at) / TWEEN_SECONDS).clamp(0.0, 1.0) as f32;
        if t >= 1.0 {
            return (self.to, true);
        }
        (self.from.lerp(self.to, ease_cubic_in_out(t)), false)
    }
}
