//! Seeded spawn-request generator
//!
//! Stands in for a wave/spawner collaborator in the demo and benchmarks. It
//! only produces `SpawnRequest`s; deciding when and how many to spawn is left
//! to the caller.

use glam::Vec2;
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;

use crate::polar_to_cartesian;
use crate::sim::{Bounds, SpawnRequest};

/// Deterministic scatter of spawn requests
#[derive(Debug, Clone)]
pub struct Scatter {
    seed: u64,
    rng: Pcg32,
    /// Number of distinct kinds handed out round-robin
    pub kinds: u32,
    /// Initial speed of scattered agents
    pub speed: f32,
    /// Size factors are drawn from this range
    pub size_range: (f32, f32),
}

impl Scatter {
    pub fn new(seed: u64) -> Self {
        Self {
            seed,
            rng: Pcg32::seed_from_u64(seed),
            kinds: 1,
            speed: 40.0,
            size_range: (1.0, 1.0),
        }
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    fn size(&mut self) -> f32 {
        let (lo, hi) = self.size_range;
        if hi > lo {
            self.rng.random_range(lo..hi)
        } else {
            lo
        }
    }

    fn kind(&self, i: usize) -> u32 {
        (i as u32) % self.kinds.max(1)
    }

    /// `count` requests uniformly inside `bounds`, heading in random directions
    pub fn uniform(&mut self, bounds: &Bounds, count: usize) -> Vec<SpawnRequest> {
        (0..count)
            .map(|i| {
                let pos = Vec2::new(
                    self.rng.random_range(bounds.min.x..bounds.max.x),
                    self.rng.random_range(bounds.min.y..bounds.max.y),
                );
                let angle = self.rng.random_range(0.0..std::f32::consts::TAU);
                SpawnRequest {
                    pos,
                    vel: Vec2::from_angle(angle) * self.speed,
                    kind: self.kind(i),
                    size: self.size(),
                    ..Default::default()
                }
            })
            .collect()
    }

    /// `count` requests evenly spaced on a ring, moving tangentially
    pub fn ring(&mut self, center: Vec2, radius: f32, count: usize) -> Vec<SpawnRequest> {
        let step = std::f32::consts::TAU / count.max(1) as f32;
        (0..count)
            .map(|i| {
                let theta = i as f32 * step;
                SpawnRequest {
                    pos: center + polar_to_cartesian(radius, theta),
                    vel: polar_to_cartesian(self.speed, theta + std::f32::consts::FRAC_PI_2),
                    kind: self.kind(i),
                    size: self.size(),
                    ..Default::default()
                }
            })
            .collect()
    }
}
