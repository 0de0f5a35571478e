use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct ForcesSettings {
    pub center_strength: f32,
    /// Negative values repel.
    pub repulsion_strength: f32,
    pub link_strength: f32,
    pub link_distance: f32,
    pub collision_radius: f32,
    pub radial_radius: f32,
}

impl Default for ForcesSettings {
    fn default() -> Self {
        Self {
            center_strength: 0.05,
            repulsion_strength: -120.0,
            link_strength: 0.7,
            link_distance: 60.0,
            collision_radius: 16.0,
            radial_radius: 220.0,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct DisplaySettings {
    pub show_arrows: bool,
    pub show_link_labels: bool,
    /// Screen-space radius in pixels.
    pub node_radius: f32,
    /// Screen-space stroke width in pixels.
    pub link_width: f32,
}

impl Default for DisplaySettings {
    fn default() -> Self {
        Self {
            show_arrows: true,
            show_link_labels: false,
            node_radius: 8.0,
            link_width: 1.5,
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct AdvancedToggles {
    pub jitter: bool,
    pub gravity_well: bool,
    pub orbiting: bool,
    pub repulsion_zones: bool,
    pub elastic_links: bool,
    pub group_clustering: bool,
    pub edge_bundling: bool,
}

/// Externally owned configuration. The engine reads it every tick and render
/// and never writes to it.
#[derive(Clone, Copy, Debug, Default, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct Settings {
    pub forces: ForcesSettings,
    pub display: DisplaySettings,
    pub advanced: AdvancedToggles,
}

impl Settings {
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let Some(path) = path else {
            return Ok(Self::default());
        };

        let raw = fs::read_to_string(path)
            .with_context(|| format!("failed to read settings from {}", path.display()))?;
        let settings = serde_json::from_str::<Self>(&raw)
            .with_context(|| format!("failed to parse settings in {}", path.display()))?;
        tracing::info!(path = %path.display(), "loaded settings");
        Ok(settings.sanitized())
    }

    /// Clamps values the UI sliders would never produce but a hand-written
    /// settings file might.
    pub fn sanitized(mut self) -> Self {
        let forces = &mut self.forces;
        forces.center_strength = finite_or(forces.center_strength, 0.05).clamp(0.0, 1.0);
        forces.repulsion_strength = finite_or(forces.repulsion_strength, -120.0).clamp(-2000.0, 200.0);
        forces.link_strength = finite_or(forces.link_strength, 0.7).clamp(0.0, 1.0);
        forces.link_distance = finite_or(forces.link_distance, 60.0).clamp(1.0, 1000.0);
        forces.collision_radius = finite_or(forces.collision_radius, 16.0).clamp(0.0, 200.0);
        forces.radial_radius = finite_or(forces.radial_radius, 220.0).clamp(0.0, 4000.0);

        let display = &mut self.display;
        display.node_radius = finite_or(display.node_radius, 8.0).clamp(1.0, 64.0);
        display.link_width = finite_or(display.link_width, 1.5).clamp(0.1, 16.0);
        self
    }
}

fn finite_or(value: f32, fallback: f32) -> f32 {
    if value.is_finite() { value } else { fallback }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_document_keeps_defaults() {
        let settings: Settings = serde_json::from_str(
            r#"{ "forces": { "link_distance": 90.0 }, "advanced": { "edge_bundling": true } }"#,
        )
        .expect("valid settings json");

        assert_eq!(settings.forces.link_distance, 90.0);
        assert_eq!(
            settings.forces.repulsion_strength,
            ForcesSettings::default().repulsion_strength
        );
        assert_eq!(settings.display, DisplaySettings::default());
        assert!(settings.advanced.edge_bundling);
        assert!(!settings.advanced.orbiting);
    }

    #[test]
    fn empty_document_is_default() {
        let settings: Settings = serde_json::from_str("{}").expect("valid settings json");
        assert_eq!(settings, Settings::default());
    }

    #[test]
    fn sanitize_clamps_out_of_range_values() {
        let mut settings = Settings::default();
        settings.display.node_radius = -4.0;
        settings.forces.link_strength = f32::NAN;
        settings.forces.link_distance = 0.0;

        let settings = settings.sanitized();
        assert_eq!(settings.display.node_radius, 1.0);
        assert_eq!(settings.forces.link_strength, 0.7);
        assert_eq!(settings.forces.link_distance, 1.0);
    }

    #[test]
    fn missing_path_yields_defaults() {
        let settings = Settings::load(None).expect("defaults");
        assert_eq!(settings, Settings::default());
    }
}
