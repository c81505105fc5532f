//! Headless flocking demo
//!
//! Usage: swarm-core [config.json] [agents] [seconds]
//!
//! Spawns a scattered flock, drives a follow target around a circle and logs
//! tick timings. Set `RUST_LOG=debug` for per-tick stats.

use std::time::{Duration, Instant};

use glam::Vec2;
use swarm_core::consts::{MAX_SUBSTEPS, SIM_DT};
use swarm_core::sim::{FlockSimulator, FollowTarget, JobExecutor, TickInput};
use swarm_core::spawn::Scatter;
use swarm_core::{FlockConfig, FlockError, polar_to_cartesian};

const DEFAULT_AGENTS: usize = 4000;
const DEFAULT_SECONDS: f32 = 10.0;
/// Simulated render frame time; slower than SIM_DT so substepping kicks in
const FRAME_DT: f32 = 1.0 / 30.0;

fn main() {
    env_logger::init();
    log::info!("Swarm Core (headless) starting...");

    if let Err(e) = run() {
        log::error!("{e}");
        std::process::exit(1);
    }
}

fn run() -> Result<(), FlockError> {
    let mut args = std::env::args().skip(1);
    let config = match args.next() {
        Some(path) if path != "-" => FlockConfig::load(&path)?,
        _ => FlockConfig::default(),
    };
    let agents: usize = args
        .next()
        .and_then(|s| s.parse().ok())
        .unwrap_or(DEFAULT_AGENTS);
    let seconds: f32 = args
        .next()
        .and_then(|s| s.parse().ok())
        .unwrap_or(DEFAULT_SECONDS);

    let bounds = config.bounds;
    let mut sim = FlockSimulator::new(config)?;

    let mut scatter = Scatter::new(0x5eed);
    scatter.kinds = 3;
    scatter.size_range = (0.8, 1.6);
    let mut rejected = 0;
    for request in scatter.uniform(&bounds.shrink(50.0), agents) {
        if sim.spawn(&request).is_err() {
            rejected += 1;
        }
    }
    log::info!(
        "Spawned {} agents ({} rejected)",
        sim.agents().len(),
        rejected
    );

    let orbit = bounds.size().min_element() * 0.3;
    let frames = (seconds / FRAME_DT).ceil() as u32;
    let mut accumulator = 0.0;
    let mut sim_time = 0.0f32;
    let mut busy = Duration::ZERO;
    let mut ticks = 0u64;

    for frame in 0..frames {
        accumulator += FRAME_DT;
        let mut substeps = 0;
        while accumulator >= SIM_DT && substeps < MAX_SUBSTEPS {
            let input = TickInput {
                target: FollowTarget::alive(bounds.center() + polar_to_cartesian(orbit, sim_time * 0.5)),
            };
            let started = Instant::now();
            let stats = sim.tick(&input, SIM_DT)?;
            busy += started.elapsed();
            ticks += 1;

            if stats.tick % 120 == 0 {
                log::info!(
                    "tick {}: {} agents in {} cells",
                    stats.tick,
                    stats.agents,
                    stats.jobs
                );
            }

            accumulator -= SIM_DT;
            sim_time += SIM_DT;
            substeps += 1;
        }
        if substeps == MAX_SUBSTEPS {
            log::warn!("Frame {frame}: hit substep cap, dropping {accumulator:.3}s");
            accumulator = 0.0;
        }
    }

    let centroid = sim.agents().positions().fold(Vec2::ZERO, |acc, p| acc + p)
        / sim.agents().len().max(1) as f32;
    let per_tick = busy.as_secs_f64() * 1000.0 / ticks.max(1) as f64;
    log::info!(
        "Ran {} ticks on {} workers: {:.3} ms/tick, flock centroid ({:.1}, {:.1})",
        ticks,
        sim.executor().workers(),
        per_tick,
        centroid.x,
        centroid.y
    );
    Ok(())
}
