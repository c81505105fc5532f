//! Flocking tuning parameters
//!
//! All values are set once at construction; nothing here is reconfigured
//! mid-tick. Loaded from JSON when the host wants data-driven tuning.

use std::path::Path;

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::error::{FlockError, Result};
use crate::sim::Bounds;

/// Tuning preset levels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum FlockPreset {
    /// Loose flocks, wide spacing
    Sparse,
    #[default]
    Default,
    /// Tight, fast-moving swarms
    Swarm,
}

impl FlockPreset {
    pub fn as_str(&self) -> &'static str {
        match self {
            FlockPreset::Sparse => "Sparse",
            FlockPreset::Default => "Default",
            FlockPreset::Swarm => "Swarm",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "sparse" => Some(FlockPreset::Sparse),
            "default" => Some(FlockPreset::Default),
            "swarm" => Some(FlockPreset::Swarm),
            _ => None,
        }
    }
}

/// Per-rule weight factors applied when summing steering forces
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RuleWeights {
    pub follow: f32,
    pub contain: f32,
    pub alignment: f32,
    pub cohesion: f32,
    pub separation: f32,
}

impl Default for RuleWeights {
    fn default() -> Self {
        Self {
            follow: 1.0,
            contain: 4.0,
            alignment: 1.0,
            cohesion: 0.8,
            separation: 1.8,
        }
    }
}

impl RuleWeights {
    fn all(&self) -> [f32; 5] {
        [
            self.follow,
            self.contain,
            self.alignment,
            self.cohesion,
            self.separation,
        ]
    }
}

/// Complete flocking configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FlockConfig {
    // === Neighbor radii ===
    /// Radius within which neighbor headings are averaged
    pub alignment_radius: f32,
    /// Radius within which neighbor positions are averaged
    pub cohesion_radius: f32,
    /// Extra spacing added to the sum of both agents' radii for separation
    pub separation_margin: f32,
    /// Body radius of an agent with size 1.0
    pub agent_radius: f32,
    /// Largest size factor an agent may have (spawns are clamped to it)
    pub max_agent_size: f32,

    // === Motion ===
    /// Base max speed (world units/sec), scaled per agent by its speed multiplier
    pub max_speed: f32,
    /// Max magnitude of any single steering force
    pub max_force: f32,
    /// Exponential smoothing rate for facing rotation (1/sec)
    pub turn_speed: f32,
    /// Follow force falls off as d0 / (d0 + distance); 0 disables damping
    pub follow_interest_distance: f32,

    // === Rules ===
    pub weights: RuleWeights,
    /// Skip same-kind neighbors in alignment and cohesion (never in separation)
    pub exclude_same_kind: bool,

    // === World ===
    pub bounds: Bounds,
    /// Containment steers toward the bounds shrunk by this margin
    pub contain_margin: f32,

    // === Resources ===
    /// Max simultaneous agents
    pub capacity: usize,
    /// Worker threads for per-cell jobs (0 = one per available core)
    pub worker_threads: usize,
}

impl Default for FlockConfig {
    fn default() -> Self {
        Self {
            // Radii
            alignment_radius: 50.0,
            cohesion_radius: 60.0,
            separation_margin: 6.0,
            agent_radius: 4.0,
            max_agent_size: 3.0,

            // Motion
            max_speed: 120.0,
            max_force: 240.0,
            turn_speed: 8.0,
            follow_interest_distance: 400.0,

            // Rules
            weights: RuleWeights::default(),
            exclude_same_kind: false,

            // World
            bounds: Bounds::new(Vec2::new(-1000.0, -750.0), Vec2::new(1000.0, 750.0)),
            contain_margin: 20.0,

            // Resources
            capacity: 8192,
            worker_threads: 0,
        }
    }
}

impl FlockConfig {
    /// Create a config from a preset (applies preset defaults)
    pub fn from_preset(preset: FlockPreset) -> Self {
        let mut config = Self::default();
        config.apply_preset(preset);
        config
    }

    /// Apply a preset on top of the current values
    pub fn apply_preset(&mut self, preset: FlockPreset) {
        match preset {
            FlockPreset::Sparse => {
                self.alignment_radius = 80.0;
                self.cohesion_radius = 90.0;
                self.separation_margin = 24.0;
                self.weights.cohesion = 0.4;
                self.weights.separation = 2.5;
            }
            FlockPreset::Default => {
                let defaults = RuleWeights::default();
                self.alignment_radius = 50.0;
                self.cohesion_radius = 60.0;
                self.separation_margin = 6.0;
                self.weights.cohesion = defaults.cohesion;
                self.weights.separation = defaults.separation;
            }
            FlockPreset::Swarm => {
                self.alignment_radius = 35.0;
                self.cohesion_radius = 40.0;
                self.separation_margin = 2.0;
                self.max_speed = 180.0;
                self.weights.cohesion = 1.2;
                self.weights.separation = 1.2;
            }
        }
    }

    /// Largest separation distance between two agents of maximum size
    pub fn separation_reach(&self) -> f32 {
        2.0 * self.agent_radius * self.max_agent_size + self.separation_margin
    }

    /// Grid cell size: the largest neighbor-interaction radius
    pub fn cell_size(&self) -> f32 {
        self.alignment_radius
            .max(self.cohesion_radius)
            .max(self.separation_reach())
    }

    /// Reject values the simulation cannot run with
    pub fn validate(&self) -> Result<()> {
        let positive = [
            ("alignment_radius", self.alignment_radius),
            ("cohesion_radius", self.cohesion_radius),
            ("agent_radius", self.agent_radius),
            ("max_agent_size", self.max_agent_size),
            ("max_speed", self.max_speed),
        ];
        for (name, value) in positive {
            if !(value.is_finite() && value > 0.0) {
                return Err(FlockError::InvalidConfig(format!(
                    "{name} must be positive and finite (got {value})"
                )));
            }
        }

        let non_negative = [
            ("separation_margin", self.separation_margin),
            ("max_force", self.max_force),
            ("turn_speed", self.turn_speed),
            ("follow_interest_distance", self.follow_interest_distance),
            ("contain_margin", self.contain_margin),
        ];
        for (name, value) in non_negative {
            if !(value.is_finite() && value >= 0.0) {
                return Err(FlockError::InvalidConfig(format!(
                    "{name} must be non-negative and finite (got {value})"
                )));
            }
        }

        if self.weights.all().iter().any(|w| !w.is_finite()) {
            return Err(FlockError::InvalidConfig(
                "rule weights must be finite".to_string(),
            ));
        }

        let size = self.bounds.size();
        if !(size.x > 0.0 && size.y > 0.0) {
            return Err(FlockError::InvalidConfig(
                "bounds must have positive width and height".to_string(),
            ));
        }
        if self.contain_margin * 2.0 >= size.min_element() {
            return Err(FlockError::InvalidConfig(
                "contain_margin leaves no interior inside bounds".to_string(),
            ));
        }

        if self.capacity == 0 {
            return Err(FlockError::InvalidConfig(
                "capacity must be at least 1".to_string(),
            ));
        }

        Ok(())
    }

    /// Parse and validate a JSON config
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Load and validate a JSON config file
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path)?;
        let config = Self::from_json_str(&json)?;
        log::info!("Loaded tuning from {}", path.display());
        Ok(config)
    }

    /// Serialize to pretty JSON
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}
