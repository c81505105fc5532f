//! Flocking simulation core
//!
//! Per tick the simulator rebuilds the spatial hash grid, splits occupied
//! cells into independent jobs, runs them on the executor against a stable
//! snapshot, waits for all of them, then commits the results:
//! - The grid and snapshot are only read during the parallel phase
//! - Each job writes only its own cell's output chunk
//! - Ticks never overlap

pub mod agent;
pub mod executor;
pub mod grid;
pub mod partition;
pub mod steering;
pub mod tick;

pub use agent::{Agent, AgentStore, FLAG_REMOVE, SpawnRequest, heading};
pub use executor::{JobExecutor, JobFn, RayonExecutor, SerialExecutor, run_job};
pub use grid::{NEIGHBORHOOD_3X3, SpatialHashGrid};
pub use partition::{CellJob, CellSpan, Partition};
pub use steering::{
    Bounds, Neighborhood, SteeringParams, SteeringRule, alignment, cohesion, contain, follow,
    separation, total_force,
};
pub use tick::{FlockSimulator, FollowTarget, TickInput, TickStats, integrate};
