//! Job executors
//!
//! An executor runs every `CellJob` of a tick and returns only when all of
//! them have finished. A panic inside a job is caught and reported as
//! `FlockError::JobPanicked`, so the tick fails instead of committing stale
//! output for that cell.

use std::any::Any;
use std::panic::{AssertUnwindSafe, catch_unwind};

use rayon::prelude::*;

use super::partition::CellJob;
use crate::error::{FlockError, Result};

/// Work applied to each job
pub type JobFn<'w> = dyn Fn(CellJob<'_>) + Sync + 'w;

/// Runs independent per-cell jobs and blocks until all complete
pub trait JobExecutor: Send + Sync {
    /// Number of worker threads jobs may run on
    fn workers(&self) -> usize;

    /// Run every job; returns after the last one finishes (the barrier)
    fn execute(&self, jobs: Vec<CellJob<'_>>, work: &JobFn<'_>) -> Result<()>;
}

/// Run one job, converting a panic into an error tagged with the job's cell
pub fn run_job(job: CellJob<'_>, work: &JobFn<'_>) -> Result<()> {
    let cell = job.cell;
    catch_unwind(AssertUnwindSafe(|| work(job))).map_err(|payload| FlockError::JobPanicked {
        cell,
        message: panic_message(payload.as_ref()),
    })
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(msg) = payload.downcast_ref::<&str>() {
        (*msg).to_string()
    } else if let Some(msg) = payload.downcast_ref::<String>() {
        msg.clone()
    } else {
        "unknown panic payload".to_string()
    }
}

/// Fixed-size rayon worker pool
pub struct RayonExecutor {
    pool: rayon::ThreadPool,
}

impl RayonExecutor {
    /// Build a pool with `threads` workers (0 = one per available core)
    pub fn new(threads: usize) -> Result<Self> {
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(threads)
            .thread_name(|i| format!("flock-worker-{i}"))
            .build()?;
        Ok(Self { pool })
    }
}

impl std::fmt::Debug for RayonExecutor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RayonExecutor")
            .field("workers", &self.pool.current_num_threads())
            .finish()
    }
}

impl JobExecutor for RayonExecutor {
    fn workers(&self) -> usize {
        self.pool.current_num_threads()
    }

    fn execute(&self, jobs: Vec<CellJob<'_>>, work: &JobFn<'_>) -> Result<()> {
        self.pool
            .install(|| jobs.into_par_iter().try_for_each(|job| run_job(job, work)))
    }
}

/// Runs jobs in order on the calling thread
#[derive(Debug, Clone, Copy, Default)]
pub struct SerialExecutor;

impl JobExecutor for SerialExecutor {
    fn workers(&self) -> usize {
        1
    }

    fn execute(&self, jobs: Vec<CellJob<'_>>, work: &JobFn<'_>) -> Result<()> {
        jobs.into_iter().try_for_each(|job| run_job(job, work))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::agent::Agent;
    use crate::sim::grid::SpatialHashGrid;
    use crate::sim::partition::Partition;
    use glam::Vec2;

    fn layout(count: usize) -> (Partition, Vec<Agent>) {
        let mut grid = SpatialHashGrid::new(10.0);
        grid.rebuild((0..count).map(|i| Vec2::new(i as f32 * 4.0, 0.0)));
        let mut partition = Partition::new();
        partition.build(&grid);
        (partition, vec![Agent::default(); count])
    }

    fn check_writes_every_slot(executor: &dyn JobExecutor) {
        let (partition, mut output) = layout(64);
        let jobs = partition.split(&mut output);
        executor
            .execute(jobs, &|job: CellJob<'_>| {
                for (slot, &idx) in job.output.iter_mut().zip(job.members) {
                    slot.kind = idx + 1;
                }
            })
            .expect("no job fails");
        assert!(output.iter().all(|a| a.kind > 0));
    }

    #[test]
    fn test_serial_executor_runs_all_jobs() {
        check_writes_every_slot(&SerialExecutor);
    }

    #[test]
    fn test_rayon_executor_runs_all_jobs() {
        let executor = RayonExecutor::new(4).expect("pool");
        assert_eq!(executor.workers(), 4);
        check_writes_every_slot(&executor);
    }

    #[test]
    fn test_job_panic_is_reported_with_cell() {
        let executor = RayonExecutor::new(2).expect("pool");
        for exec in [&executor as &dyn JobExecutor, &SerialExecutor] {
            let (partition, mut output) = layout(64);
            let bad = partition.spans()[1].cell;
            let jobs = partition.split(&mut output);
            let result = exec.execute(jobs, &|job: CellJob<'_>| {
                if job.cell == bad {
                    panic!("injected fault");
                }
            });
            match result {
                Err(FlockError::JobPanicked { cell, message }) => {
                    assert_eq!(cell, bad);
                    assert_eq!(message, "injected fault");
                }
                other => panic!("expected JobPanicked, got {other:?}"),
            }
        }
    }

    #[test]
    fn test_panic_message_formats() {
        let owned: Box<dyn Any + Send> = Box::new(String::from("owned"));
        assert_eq!(panic_message(owned.as_ref()), "owned");
        let other: Box<dyn Any + Send> = Box::new(42u32);
        assert_eq!(panic_message(other.as_ref()), "unknown panic payload");
    }
}
