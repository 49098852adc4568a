use std::fs;
use std::path::Path;

use anyhow::{Context, Result, ensure};
use eframe::egui::{Vec2, vec2};
use serde::Deserialize;

/// Top-level viewer configuration. Every section falls back to its defaults, so a config file
/// only has to name the values it overrides.
#[derive(Clone, Debug, Default, Deserialize, PartialEq)]
#[serde(default)]
pub struct ExplorerConfig {
    pub canvas: CanvasConfig,
    pub simulation: SimulationConfig,
    pub interaction: InteractionConfig,
    pub viewport: ViewportConfig,
}

impl ExplorerConfig {
    pub fn from_file(path: &Path) -> Result<Self> {
        let raw = fs::read_to_string(path)
            .with_context(|| format!("failed to read config file {}", path.display()))?;
        Self::from_json(&raw).with_context(|| format!("invalid config file {}", path.display()))
    }

    pub fn from_json(raw: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(raw).context("config is not valid JSON")?;
        config.validate()?;
        Ok(config)
    }

    /// Rejects values the engine cannot run with: inverted or out-of-range zoom limits, an
    /// empty canvas, or a cooling schedule that never reaches `alpha_min`.
    pub fn validate(&self) -> Result<()> {
        self.canvas.validate().context("invalid canvas section")?;
        self.simulation
            .validate()
            .context("invalid simulation section")?;
        self.interaction
            .validate()
            .context("invalid interaction section")?;
        self.viewport
            .validate()
            .context("invalid viewport section")?;
        Ok(())
    }
}

/// Logical drawing surface in world units.
#[derive(Clone, Copy, Debug, Deserialize, PartialEq)]
#[serde(default)]
pub struct CanvasConfig {
    pub width: f32,
    pub height: f32,
    pub margin: f32,
}

impl CanvasConfig {
    pub fn validate(&self) -> Result<()> {
        ensure!(
            self.width.is_finite() && self.width > 0.0,
            "width must be positive, got {}",
            self.width
        );
        ensure!(
            self.height.is_finite() && self.height > 0.0,
            "height must be positive, got {}",
            self.height
        );
        ensure!(
            self.margin.is_finite() && self.margin >= 0.0,
            "margin must be non-negative, got {}",
            self.margin
        );
        Ok(())
    }

    pub fn size(&self) -> Vec2 {
        vec2(self.width, self.height)
    }

    pub fn center(&self) -> Vec2 {
        self.size() * 0.5
    }
}

impl Default for CanvasConfig {
    fn default() -> Self {
        Self {
            width: 1920.0,
            height: 1080.0,
            margin: 20.0,
        }
    }
}

#[derive(Clone, Copy, Debug, Deserialize, PartialEq)]
#[serde(default)]
pub struct SimulationConfig {
    pub link_distance: f32,
    pub link_strength: f32,
    pub charge_strength: f32,
    pub center_strength: f32,
    pub collision_radius: f32,
    pub collision_strength: f32,
    pub velocity_decay: f32,
    pub alpha_start: f32,
    pub alpha_decay: f32,
    pub alpha_min: f32,
    pub alpha_hot: f32,
    pub cooling_alpha: f32,
    pub barnes_hut_threshold: usize,
    pub theta: f32,
    pub seed_radius: f32,
    pub seed_jitter: f32,
}

impl SimulationConfig {
    pub fn validate(&self) -> Result<()> {
        let finite = [
            ("link_distance", self.link_distance),
            ("link_strength", self.link_strength),
            ("charge_strength", self.charge_strength),
            ("center_strength", self.center_strength),
            ("collision_radius", self.collision_radius),
            ("collision_strength", self.collision_strength),
            ("alpha_start", self.alpha_start),
            ("alpha_hot", self.alpha_hot),
            ("cooling_alpha", self.cooling_alpha),
            ("theta", self.theta),
            ("seed_radius", self.seed_radius),
            ("seed_jitter", self.seed_jitter),
        ];
        for (name, value) in finite {
            ensure!(value.is_finite(), "{name} must be finite, got {value}");
        }

        ensure!(
            self.alpha_decay > 0.0 && self.alpha_decay < 1.0,
            "alpha_decay must be in (0, 1), got {}",
            self.alpha_decay
        );
        ensure!(
            self.alpha_min.is_finite() && self.alpha_min > 0.0,
            "alpha_min must be positive, got {}",
            self.alpha_min
        );
        ensure!(
            self.velocity_decay >= 0.0 && self.velocity_decay < 1.0,
            "velocity_decay must be in [0, 1), got {}",
            self.velocity_decay
        );
        ensure!(
            self.link_distance > 0.0,
            "link_distance must be positive, got {}",
            self.link_distance
        );
        ensure!(
            self.collision_radius >= 0.0 && self.theta >= 0.0,
            "collision_radius and theta must be non-negative"
        );
        Ok(())
    }
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            link_distance: 60.0,
            link_strength: 1.0,
            charge_strength: -300.0,
            center_strength: 0.1,
            collision_radius: 15.0,
            collision_strength: 1.0,
            velocity_decay: 0.4,
            alpha_start: 1.0,
            alpha_decay: 0.99,
            alpha_min: 0.001,
            alpha_hot: 0.3,
            cooling_alpha: 0.1,
            barnes_hut_threshold: 500,
            theta: 0.9,
            seed_radius: 40.0,
            seed_jitter: 6.0,
        }
    }
}

#[derive(Clone, Copy, Debug, Deserialize, PartialEq)]
#[serde(default)]
pub struct InteractionConfig {
    pub click_max_distance: f32,
    pub click_max_secs: f64,
}

impl InteractionConfig {
    pub fn validate(&self) -> Result<()> {
        ensure!(
            self.click_max_distance.is_finite() && self.click_max_distance >= 0.0,
            "click_max_distance must be non-negative, got {}",
            self.click_max_distance
        );
        ensure!(
            self.click_max_secs.is_finite() && self.click_max_secs >= 0.0,
            "click_max_secs must be non-negative, got {}",
            self.click_max_secs
        );
        Ok(())
    }
}

impl Default for InteractionConfig {
    fn default() -> Self {
        Self {
            click_max_distance: 5.0,
            click_max_secs: 0.25,
        }
    }
}

#[derive(Clone, Copy, Debug, Deserialize, PartialEq)]
#[serde(default)]
pub struct ViewportConfig {
    pub min_scale: f32,
    pub max_scale: f32,
    pub wheel_sensitivity: f32,
}

impl ViewportConfig {
    pub const SCALE_FLOOR: f32 = 0.1;
    pub const SCALE_CEILING: f32 = 4.0;

    pub fn validate(&self) -> Result<()> {
        let allowed = Self::SCALE_FLOOR..=Self::SCALE_CEILING;
        ensure!(
            allowed.contains(&self.min_scale) && allowed.contains(&self.max_scale),
            "zoom limits must lie within [{}, {}], got [{}, {}]",
            Self::SCALE_FLOOR,
            Self::SCALE_CEILING,
            self.min_scale,
            self.max_scale
        );
        ensure!(
            self.min_scale <= self.max_scale,
            "min_scale {} is greater than max_scale {}",
            self.min_scale,
            self.max_scale
        );
        ensure!(
            self.wheel_sensitivity.is_finite() && self.wheel_sensitivity > 0.0,
            "wheel_sensitivity must be positive, got {}",
            self.wheel_sensitivity
        );
        Ok(())
    }
}

impl Default for ViewportConfig {
    fn default() -> Self {
        Self {
            min_scale: 0.1,
            max_scale: 4.0,
            wheel_sensitivity: 0.002,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_json_keeps_defaults() {
        let config = ExplorerConfig::from_json(
            r#"{ "simulation": { "link_distance": 80.0 }, "canvas": { "width": 800 } }"#,
        )
        .unwrap();

        assert_eq!(config.simulation.link_distance, 80.0);
        assert_eq!(config.simulation.charge_strength, -300.0);
        assert_eq!(config.canvas.width, 800.0);
        assert_eq!(config.canvas.height, 1080.0);
        assert_eq!(config.viewport, ViewportConfig::default());
    }

    #[test]
    fn empty_object_is_default() {
        assert_eq!(
            ExplorerConfig::from_json("{}").unwrap(),
            ExplorerConfig::default()
        );
    }

    fn rejection(raw: &str) -> String {
        let error = ExplorerConfig::from_json(raw).unwrap_err();
        format!("{error:#}")
    }

    #[test]
    fn zoom_limits_outside_the_allowed_range_are_rejected() {
        let message = rejection(r#"{ "viewport": { "max_scale": 50 } }"#);
        assert!(message.contains("viewport section"), "{message}");
        assert!(message.contains("zoom limits"), "{message}");

        assert!(ExplorerConfig::from_json(r#"{ "viewport": { "min_scale": 0.01 } }"#).is_err());
    }

    #[test]
    fn inverted_zoom_limits_are_rejected() {
        let message = rejection(r#"{ "viewport": { "min_scale": 3.0, "max_scale": 0.5 } }"#);
        assert!(message.contains("greater than max_scale"), "{message}");

        // min above the default max
        assert!(ExplorerConfig::from_json(r#"{ "viewport": { "min_scale": 5 } }"#).is_err());
    }

    #[test]
    fn narrowed_zoom_limits_are_accepted() {
        let config = ExplorerConfig::from_json(
            r#"{ "viewport": { "min_scale": 0.5, "max_scale": 2.0 } }"#,
        )
        .unwrap();
        assert_eq!(config.viewport.min_scale, 0.5);
        assert_eq!(config.viewport.max_scale, 2.0);
    }

    #[test]
    fn non_positive_wheel_sensitivity_is_rejected() {
        assert!(
            ExplorerConfig::from_json(r#"{ "viewport": { "wheel_sensitivity": 0 } }"#).is_err()
        );
    }

    #[test]
    fn empty_canvas_is_rejected() {
        let message = rejection(r#"{ "canvas": { "width": -10 } }"#);
        assert!(message.contains("canvas section"), "{message}");
        assert!(message.contains("width"), "{message}");

        assert!(ExplorerConfig::from_json(r#"{ "canvas": { "height": 0 } }"#).is_err());
        assert!(ExplorerConfig::from_json(r#"{ "canvas": { "margin": -1 } }"#).is_err());
    }

    #[test]
    fn cooling_schedule_must_terminate() {
        for raw in [
            r#"{ "simulation": { "alpha_decay": 1.0 } }"#,
            r#"{ "simulation": { "alpha_decay": 1.5 } }"#,
            r#"{ "simulation": { "alpha_decay": 0.0 } }"#,
            r#"{ "simulation": { "alpha_min": 0.0 } }"#,
            r#"{ "simulation": { "alpha_min": -0.1 } }"#,
        ] {
            let message = rejection(raw);
            assert!(message.contains("simulation section"), "{raw}: {message}");
        }
    }

    #[test]
    fn velocity_decay_must_leave_motion_bounded() {
        assert!(
            ExplorerConfig::from_json(r#"{ "simulation": { "velocity_decay": 1.0 } }"#).is_err()
        );
        assert!(
            ExplorerConfig::from_json(r#"{ "simulation": { "velocity_decay": -0.2 } }"#).is_err()
        );
    }

    #[test]
    fn non_finite_simulation_values_are_rejected() {
        let mut config = ExplorerConfig::default();
        config.simulation.alpha_hot = f32::NAN;
        assert!(config.validate().is_err());

        let mut config = ExplorerConfig::default();
        config.simulation.alpha_start = f32::INFINITY;
        assert!(config.validate().is_err());
    }

    #[test]
    fn negative_click_thresholds_are_rejected() {
        assert!(
            ExplorerConfig::from_json(r#"{ "interaction": { "click_max_secs": -1 } }"#).is_err()
        );
    }

    #[test]
    fn defaults_pass_validation() {
        assert!(ExplorerConfig::default().validate().is_ok());
    }

    #[test]
    fn malformed_json_is_reported() {
        assert!(ExplorerConfig::from_json("{ simulation: ").is_err());
    }
}
