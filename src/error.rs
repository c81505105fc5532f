//! Error types for the flocking core
//!
//! Steering and grid functions are total and never fail. Only capacity limits,
//! configuration problems and worker faults surface here.

use glam::IVec2;
use thiserror::Error;

/// Errors raised at the store/simulator boundary.
#[derive(Debug, Error)]
pub enum FlockError {
    /// Agent store is full; the new agent was dropped.
    #[error("agent store is full (capacity {capacity})")]
    CapacityExceeded { capacity: usize },

    /// Tuning values that cannot be used (e.g. non-positive radius).
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// Tuning file could not be parsed.
    #[error("failed to parse configuration: {0}")]
    ConfigParse(#[from] serde_json::Error),

    /// Tuning file could not be read.
    #[error("failed to read configuration: {0}")]
    ConfigIo(#[from] std::io::Error),

    /// Worker pool could not be created.
    #[error("failed to build worker pool: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),

    /// A per-cell job panicked; the tick was abandoned before commit.
    #[error("steering job for cell ({}, {}) panicked: {message}", cell.x, cell.y)]
    JobPanicked { cell: IVec2, message: String },
}

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, FlockError>;
