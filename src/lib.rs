//! Swarm Core - spatial-hash flocking with parallel per-cell steering
//!
//! Core modules:
//! - `sim`: Grid, steering rules, job partitioning, executors and the tick
//! - `tuning`: Data-driven flocking parameters
//! - `spawn`: Seeded spawn-request generator
//! - `render`: Instance records for a drawing collaborator
//! - `error`: Error taxonomy

pub mod error;
pub mod render;
pub mod sim;
pub mod spawn;
pub mod tuning;

pub use error::{FlockError, Result};
pub use tuning::{FlockConfig, FlockPreset, RuleWeights};

use glam::Vec2;

/// Simulation constants
pub mod consts {
    /// Default simulation timestep (60 Hz)
    pub const SIM_DT: f32 = 1.0 / 60.0;
    /// Maximum substeps per frame to prevent spiral of death
    pub const MAX_SUBSTEPS: u32 = 8;
}

/// Normalized angle to [-π, π)
#[inline]
pub fn normalize_angle(mut angle: f32) -> f32 {
    use std::f32::consts::PI;
    if !angle.is_finite() {
        return 0.0;
    }
    while angle >= PI {
        angle -= 2.0 * PI;
    }
    while angle < -PI {
        angle += 2.0 * PI;
    }
    angle
}

/// Convert polar (r, theta) to cartesian (x, y)
#[inline]
pub fn polar_to_cartesian(r: f32, theta: f32) -> Vec2 {
    Vec2::new(r * theta.cos(), r * theta.sin())
}
