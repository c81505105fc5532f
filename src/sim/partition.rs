//! Per-cell job partitioning
//!
//! After a grid rebuild every live agent sits in exactly one cell. The
//! partition lays those cells out back to back in a flat index list, so the
//! output buffer can be carved into one exclusive chunk per cell. Two jobs can
//! never address the same output slot: each holds its own `&mut` chunk.

use glam::IVec2;

use super::agent::Agent;
use super::grid::SpatialHashGrid;

/// One occupied cell's slice of the flat member list
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CellSpan {
    pub cell: IVec2,
    pub start: usize,
    pub len: usize,
}

/// Unit of work: one cell's members and the output slots they write
#[derive(Debug)]
pub struct CellJob<'a> {
    pub cell: IVec2,
    /// Indices into the snapshot; `output[k]` receives the new state of `members[k]`
    pub members: &'a [u32],
    pub output: &'a mut [Agent],
}

/// Cell-ordered assignment of agent indices to jobs
#[derive(Debug, Clone, Default)]
pub struct Partition {
    spans: Vec<CellSpan>,
    order: Vec<u32>,
}

impl Partition {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuild from the grid, reusing allocations. Empty cells get no span.
    pub fn build(&mut self, grid: &SpatialHashGrid<u32>) {
        self.spans.clear();
        self.order.clear();

        let mut cells: Vec<(IVec2, &[u32])> = grid.occupied_cells().collect();
        // Stable job layout regardless of hash iteration order
        cells.sort_unstable_by_key(|(cell, _)| (cell.y, cell.x));

        for (cell, members) in cells {
            self.spans.push(CellSpan {
                cell,
                start: self.order.len(),
                len: members.len(),
            });
            self.order.extend_from_slice(members);
        }
    }

    /// Number of jobs (occupied cells)
    #[inline]
    pub fn job_count(&self) -> usize {
        self.spans.len()
    }

    /// Number of agent indices assigned across all jobs
    #[inline]
    pub fn assignment_count(&self) -> usize {
        self.order.len()
    }

    pub fn spans(&self) -> &[CellSpan] {
        &self.spans
    }

    pub fn members(&self, span: &CellSpan) -> &[u32] {
        &self.order[span.start..span.start + span.len]
    }

    /// Members of a given cell, if it is occupied
    pub fn members_of(&self, cell: IVec2) -> Option<&[u32]> {
        self.spans
            .iter()
            .find(|span| span.cell == cell)
            .map(|span| self.members(span))
    }

    /// True when every index in `0..live` is assigned to exactly one job
    pub fn covers_exactly(&self, live: usize) -> bool {
        if self.order.len() != live {
            return false;
        }
        let mut seen = vec![false; live];
        for &idx in &self.order {
            match seen.get_mut(idx as usize) {
                Some(slot) if !*slot => *slot = true,
                _ => return false,
            }
        }
        true
    }

    /// Carve `output` into one exclusive chunk per cell.
    ///
    /// `output` must hold exactly `assignment_count()` agents.
    pub fn split<'a>(&'a self, output: &'a mut [Agent]) -> Vec<CellJob<'a>> {
        debug_assert_eq!(output.len(), self.order.len());
        let mut jobs = Vec::with_capacity(self.spans.len());
        let mut rest = output;
        for span in &self.spans {
            let (chunk, tail) = std::mem::take(&mut rest).split_at_mut(span.len);
            rest = tail;
            jobs.push(CellJob {
                cell: span.cell,
                members: &self.order[span.start..span.start + span.len],
                output: chunk,
            });
        }
        jobs
    }

    /// Scatter cell-ordered results back to their canonical indices
    pub fn commit(&self, output: &[Agent], agents: &mut [Agent]) {
        debug_assert_eq!(output.len(), self.order.len());
        for (&idx, agent) in self.order.iter().zip(output) {
            agents[idx as usize] = *agent;
        }
    }
}
