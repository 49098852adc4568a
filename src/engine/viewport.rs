use eframe::egui::{Pos2, Vec2};
use tracing::warn;

use crate::config::ViewportConfig;
use crate::error::{EngineError, Result};

/// Screen-space transform: `screen = translate + world * scale`. It is only ever composed with
/// node positions at draw time.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ViewportState {
    pub translate: Vec2,
    pub scale: f32,
}

impl Default for ViewportState {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl ViewportState {
    pub const IDENTITY: Self = Self {
        translate: Vec2::ZERO,
        scale: 1.0,
    };

    pub fn world_to_screen(&self, world: Vec2) -> Pos2 {
        (self.translate + world * self.scale).to_pos2()
    }

    pub fn screen_to_world(&self, screen: Pos2) -> Vec2 {
        (screen.to_vec2() - self.translate) / self.scale
    }

    pub fn check(&self, limits: &ViewportConfig) -> Result<()> {
        if self.scale.is_finite()
            && self.scale >= limits.min_scale
            && self.scale <= limits.max_scale
            && self.translate.is_finite()
        {
            Ok(())
        } else {
            Err(EngineError::InvalidTransform { scale: self.scale })
        }
    }

    /// Clamps an out-of-range transform back into the limits and logs it.
    pub fn sanitized(self, limits: &ViewportConfig) -> Self {
        let Err(error) = self.check(limits) else {
            return self;
        };
        warn!(%error, "clamping viewport transform");

        let scale = if self.scale.is_finite() {
            self.scale.clamp(limits.min_scale, limits.max_scale)
        } else {
            1.0_f32.clamp(limits.min_scale, limits.max_scale)
        };
        let translate = if self.translate.is_finite() {
            self.translate
        } else {
            Vec2::ZERO
        };
        Self { translate, scale }
    }

    /// Zooms by `factor` keeping the world point under `pointer` fixed on screen.
    pub fn zoomed_around(self, factor: f32, pointer: Pos2, limits: &ViewportConfig) -> Self {
        let current = self.sanitized(limits);
        let scale = (current.scale * factor).clamp(limits.min_scale, limits.max_scale);
        let anchor = pointer.to_vec2();
        Self {
            translate: anchor - (anchor - current.translate) * (scale / current.scale),
            scale,
        }
    }

    pub fn panned(self, delta: Vec2) -> Self {
        Self {
            translate: self.translate + delta,
            scale: self.scale,
        }
    }

    /// Fits the whole logical canvas inside a screen area, centered.
    pub fn fit(canvas: Vec2, screen: Vec2, limits: &ViewportConfig) -> Self {
        if canvas.x <= 0.0 || canvas.y <= 0.0 || screen.x <= 0.0 || screen.y <= 0.0 {
            return Self::IDENTITY;
        }
        let scale = (screen.x / canvas.x)
            .min(screen.y / canvas.y)
            .clamp(limits.min_scale, limits.max_scale);
        Self {
            translate: (screen - canvas * scale) * 0.5,
            scale,
        }
    }

    /// Keeps the scale and moves `world` to the middle of the screen area.
    pub fn centered_on(self, world: Vec2, screen: Vec2) -> Self {
        Self {
            translate: screen * 0.5 - world * self.scale,
            scale: self.scale,
        }
    }
}

pub struct ViewportController {
    state: ViewportState,
    limits: ViewportConfig,
}

impl ViewportController {
    pub fn new(limits: ViewportConfig) -> Self {
        Self {
            state: ViewportState::IDENTITY.sanitized(&limits),
            limits,
        }
    }

    pub fn state(&self) -> ViewportState {
        self.state
    }

    pub fn limits(&self) -> &ViewportConfig {
        &self.limits
    }

    /// Positive `delta` (scrolling down) zooms out.
    pub fn on_wheel(&mut self, delta: f32, pointer: Pos2) -> ViewportState {
        let factor = 2.0_f32.powf(-delta * self.limits.wheel_sensitivity);
        self.state = self.state.zoomed_around(factor, pointer, &self.limits);
        self.state
    }

    pub fn on_pan_drag(&mut self, delta: Vec2) -> ViewportState {
        self.state = self.state.panned(delta);
        self.state
    }

    pub fn set(&mut self, state: ViewportState) -> ViewportState {
        self.state = state.sanitized(&self.limits);
        self.state
    }
}

#[cfg(test)]
mod tests {
    use eframe::egui::{pos2, vec2};

    use super::*;

    fn limits() -> ViewportConfig {
        ViewportConfig::default()
    }

    fn close(a: Pos2, b: Pos2) -> bool {
        (a - b).length() < 1e-3
    }

    #[test]
    fn zoom_keeps_the_point_under_the_cursor() {
        let mut controller = ViewportController::new(limits());
        controller.set(ViewportState {
            translate: vec2(-120.0, 45.0),
            scale: 0.8,
        });

        for (delta, pointer) in [
            (-120.0, pos2(400.0, 300.0)),
            (240.0, pos2(10.0, 900.0)),
            (-30.0, pos2(1500.0, 20.0)),
        ] {
            let before = controller.state();
            let world = before.screen_to_world(pointer);
            let after = controller.on_wheel(delta, pointer);
            assert!(close(after.world_to_screen(world), pointer));
        }
    }

    #[test]
    fn zoom_is_clamped_and_still_anchored() {
        let mut controller = ViewportController::new(limits());
        let pointer = pos2(640.0, 360.0);
        let world = controller.state().screen_to_world(pointer);

        for _ in 0..50 {
            controller.on_wheel(-500.0, pointer);
        }
        assert_eq!(controller.state().scale, 4.0);
        assert!(close(controller.state().world_to_screen(world), pointer));

        for _ in 0..50 {
            controller.on_wheel(500.0, pointer);
        }
        assert!((controller.state().scale - 0.1).abs() < 1e-6);
        assert!(close(controller.state().world_to_screen(world), pointer));
    }

    #[test]
    fn wheel_direction_matches_scroll_convention() {
        let mut controller = ViewportController::new(limits());
        assert!(controller.on_wheel(-100.0, Pos2::ZERO).scale > 1.0);
        let mut controller = ViewportController::new(limits());
        assert!(controller.on_wheel(100.0, Pos2::ZERO).scale < 1.0);
    }

    #[test]
    fn pan_accumulates_without_clamping() {
        let mut controller = ViewportController::new(limits());
        controller.on_pan_drag(vec2(10.0, -5.0));
        let state = controller.on_pan_drag(vec2(-50_000.0, 2.5));
        assert_eq!(state.translate, vec2(-49_990.0, -2.5));
        assert_eq!(state.scale, 1.0);
    }

    #[test]
    fn invalid_scale_is_clamped_not_propagated() {
        let state = ViewportState {
            translate: vec2(5.0, 5.0),
            scale: 12.0,
        };
        assert_eq!(
            state.check(&limits()),
            Err(EngineError::InvalidTransform { scale: 12.0 })
        );
        assert_eq!(state.sanitized(&limits()).scale, 4.0);

        let broken = ViewportState {
            translate: vec2(f32::NAN, 0.0),
            scale: f32::NAN,
        };
        let fixed = broken.sanitized(&limits());
        assert_eq!(fixed, ViewportState::IDENTITY);
    }

    #[test]
    fn fit_centers_the_canvas() {
        let state = ViewportState::fit(vec2(1920.0, 1080.0), vec2(960.0, 1080.0), &limits());
        assert_eq!(state.scale, 0.5);
        assert_eq!(state.world_to_screen(vec2(960.0, 540.0)), pos2(480.0, 540.0));
    }

    #[test]
    fn centered_on_moves_world_point_to_screen_middle() {
        let state = ViewportState {
            translate: Vec2::ZERO,
            scale: 2.0,
        }
        .centered_on(vec2(100.0, 50.0), vec2(800.0, 600.0));
        assert_eq!(state.world_to_screen(vec2(100.0, 50.0)), pos2(400.0, 300.0));
    }
}
