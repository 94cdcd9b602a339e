use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

/// Force model constants. Distances are world units, forces are applied per tick.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PhysicsConfig {
    pub repulsion: f32,
    pub spring_length: f32,
    pub spring_strength: f32,
    pub center_strength: f32,
    pub damping: f32,
    pub max_speed: f32,
    /// Node count above which repulsion uses the Barnes-Hut approximation.
    pub barnes_hut_threshold: usize,
    pub barnes_hut_theta: f32,
}

impl Default for PhysicsConfig {
    fn default() -> Self {
        Self {
            repulsion: 300.0,
            spring_length: 200.0,
            spring_strength: 0.08,
            center_strength: 0.005,
            damping: 0.85,
            max_speed: 40.0,
            barnes_hut_threshold: 150,
            barnes_hut_theta: 0.72,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewConfig {
    pub tick_ms: u64,
    pub node_radius: f32,
    pub selected_node_radius: f32,
    pub floating_radius: f32,
    pub grid_spacing: f32,
    pub grid_columns: usize,
    pub title_chars: usize,
    /// Carry positions of surviving events across graph rebuilds.
    pub keep_positions_on_rebuild: bool,
}

impl Default for ViewConfig {
    fn default() -> Self {
        Self {
            tick_ms: 50,
            node_radius: 35.0,
            selected_node_radius: 40.0,
            floating_radius: 80.0,
            grid_spacing: 150.0,
            grid_columns: 5,
            title_chars: 15,
            keep_positions_on_rebuild: true,
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub physics: PhysicsConfig,
    pub view: ViewConfig,
}

impl Settings {
    /// Reads a TOML settings file. Missing fields take their defaults; an unreadable or
    /// malformed file is logged and ignored.
    pub fn load(path: Option<&Path>) -> Self {
        let Some(path) = path else {
            return Self::default();
        };

        let content = match fs::read_to_string(path) {
            Ok(content) => content,
            Err(err) => {
                tracing::warn!("Failed to read settings at {:?}: {}", path, err);
                return Self::default();
            }
        };

        match toml::from_str(&content) {
            Ok(settings) => settings,
            Err(err) => {
                tracing::warn!("Failed to parse settings at {:?}: {}", path, err);
                Self::default()
            }
        }
    }
}
