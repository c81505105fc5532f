//! Fixed-order simulation tick
//!
//! One tick: clear grid -> rebuild grid -> snapshot -> per-cell jobs on the
//! executor -> barrier -> commit. Only the job phase runs in parallel; every
//! other phase is sequential and bounds the achievable speedup.

use glam::Vec2;

use super::agent::{Agent, AgentStore, SpawnRequest, heading};
use super::executor::{JobExecutor, RayonExecutor};
use super::grid::SpatialHashGrid;
use super::partition::{CellJob, Partition};
use super::steering::{Neighborhood, SteeringParams, total_force};
use crate::error::Result;
use crate::normalize_angle;
use crate::tuning::FlockConfig;

/// Position the flock follows, e.g. the player
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct FollowTarget {
    pub pos: Vec2,
    /// Dead or absent targets exert no pull
    pub alive: bool,
}

impl FollowTarget {
    pub fn alive(pos: Vec2) -> Self {
        Self { pos, alive: true }
    }

    pub fn absent() -> Self {
        Self::default()
    }

    #[inline]
    pub fn position(&self) -> Option<Vec2> {
        self.alive.then_some(self.pos)
    }
}

/// Per-tick inputs from collaborators
#[derive(Debug, Clone, Default)]
pub struct TickInput {
    pub target: FollowTarget,
}

/// What a tick did
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TickStats {
    /// Tick number after this tick
    pub tick: u64,
    /// Live agents simulated
    pub agents: usize,
    /// Jobs dispatched (one per occupied cell)
    pub jobs: usize,
}

/// Integrate one agent: velocity, position, then eased facing
pub fn integrate(agent: &mut Agent, force: Vec2, dt: f32, params: &SteeringParams) {
    agent.vel = (agent.vel + force * dt).clamp_length_max(agent.max_speed(params.max_speed));
    agent.pos += agent.vel * dt;

    // Zero velocity keeps the current facing
    if let Some(target) = heading(agent.vel) {
        let blend = 1.0 - (-params.turn_speed * dt).exp();
        let delta = normalize_angle(target - agent.rotation);
        agent.rotation = normalize_angle(agent.rotation + delta * blend);
    }
}

/// Steer and integrate every member of one cell, writing into the job's chunk
fn step_cell(
    job: CellJob<'_>,
    hood: &Neighborhood<'_>,
    target: Option<Vec2>,
    params: &SteeringParams,
    dt: f32,
) {
    let CellJob {
        members, output, ..
    } = job;
    for (slot, &idx) in output.iter_mut().zip(members) {
        let idx = idx as usize;
        let force = total_force(idx, hood, target, params);
        let mut agent = hood.agents[idx];
        integrate(&mut agent, force, dt, params);
        *slot = agent;
    }
}

/// Owns the agents, the grid and the double buffer, and runs ticks
pub struct FlockSimulator<E: JobExecutor = RayonExecutor> {
    config: FlockConfig,
    params: SteeringParams,
    agents: AgentStore,
    grid: SpatialHashGrid<u32>,
    partition: Partition,
    /// Write side of the double buffer, laid out in partition order
    output: Vec<Agent>,
    executor: E,
    ticks: u64,
}

impl FlockSimulator<RayonExecutor> {
    /// Simulator on a rayon pool sized by `config.worker_threads`
    pub fn new(config: FlockConfig) -> Result<Self> {
        config.validate()?;
        let executor = RayonExecutor::new(config.worker_threads)?;
        Self::with_executor(config, executor)
    }
}

impl<E: JobExecutor> FlockSimulator<E> {
    pub fn with_executor(config: FlockConfig, executor: E) -> Result<Self> {
        config.validate()?;
        let cell_size = config.cell_size();
        log::info!(
            "Flock simulator: capacity={}, cell_size={:.1}, workers={}",
            config.capacity,
            cell_size,
            executor.workers()
        );
        Ok(Self {
            params: SteeringParams::from_config(&config),
            agents: AgentStore::with_capacity(config.capacity),
            grid: SpatialHashGrid::new(cell_size),
            partition: Partition::new(),
            output: Vec::with_capacity(config.capacity),
            executor,
            ticks: 0,
            config,
        })
    }

    pub fn config(&self) -> &FlockConfig {
        &self.config
    }

    pub fn params(&self) -> &SteeringParams {
        &self.params
    }

    pub fn executor(&self) -> &E {
        &self.executor
    }

    /// Live agents, read-only (e.g. for drawing)
    pub fn agents(&self) -> &AgentStore {
        &self.agents
    }

    /// Mutable store access for gameplay between ticks
    pub fn agents_mut(&mut self) -> &mut AgentStore {
        &mut self.agents
    }

    /// Grid built during the last tick, for collision/damage queries.
    ///
    /// It indexes positions from the start of that tick, before integration,
    /// so payloads may sit one step behind the agents' current cells. Filter
    /// candidates against `agents()` positions.
    pub fn grid(&self) -> &SpatialHashGrid<u32> {
        &self.grid
    }

    /// Job layout of the last tick
    pub fn partition(&self) -> &Partition {
        &self.partition
    }

    pub fn tick_count(&self) -> u64 {
        self.ticks
    }

    /// Add an agent from a spawner request. Sizes above `max_agent_size` are
    /// clamped so neighbour scans stay within one cell.
    pub fn spawn(&mut self, request: &SpawnRequest) -> Result<usize> {
        let mut agent = Agent::from_request(request);
        agent.size = agent.size.min(self.config.max_agent_size);
        self.agents.insert(agent).inspect_err(|e| {
            log::warn!("Spawn rejected: {e}");
        })
    }

    /// Swap-remove agents gameplay has marked. Call between ticks only.
    pub fn remove_marked(&mut self) -> usize {
        let removed = self.agents.purge_marked();
        if removed > 0 {
            log::debug!("Removed {} marked agents ({} live)", removed, self.agents.len());
        }
        removed
    }

    /// Advance all agents by `dt` seconds.
    ///
    /// On error (a job panicked) the agent store is left exactly as it was.
    pub fn tick(&mut self, input: &TickInput, dt: f32) -> Result<TickStats> {
        // 1. Clear
        self.grid.clear();

        let count = self.agents.len();
        if count == 0 {
            self.partition.build(&self.grid);
            self.ticks += 1;
            return Ok(TickStats {
                tick: self.ticks,
                agents: 0,
                jobs: 0,
            });
        }

        // 2. Rebuild
        for (idx, pos) in self.agents.positions().enumerate() {
            self.grid.insert_at(pos, idx as u32);
        }

        // 3. Snapshot: the store is the read side; output is the write side
        self.partition.build(&self.grid);
        self.output.clear();
        self.output.resize(count, Agent::default());

        // Sizes written directly through the store may exceed the configured
        // cap; widen the separation reach so both sides of a pair see each other
        let largest = self.agents.iter().fold(0.0f32, |m, a| m.max(a.size));
        let params = SteeringParams {
            max_agent_size: self.params.max_agent_size.max(largest),
            ..self.params
        };

        // 4-5. Dispatch and wait
        let hood = Neighborhood::new(self.agents.as_slice(), &self.grid);
        let params = &params;
        let target = input.target.position();
        let jobs = self.partition.split(&mut self.output);
        let job_count = jobs.len();

        self.executor
            .execute(jobs, &|job: CellJob<'_>| {
                step_cell(job, &hood, target, params, dt);
            })
            .inspect_err(|e| log::error!("Tick {} aborted: {e}", self.ticks + 1))?;

        // 6. Commit
        self.partition
            .commit(&self.output, self.agents.as_mut_slice());
        self.ticks += 1;

        let stats = TickStats {
            tick: self.ticks,
            agents: count,
            jobs: job_count,
        };
        log::debug!("{stats:?}");
        Ok(stats)
    }
}
