//! Uniform spatial hash grid
//!
//! Buckets payloads (agent indices) into square cells keyed by integer cell
//! coordinate. The grid never searches neighbouring cells on its own; callers
//! compose neighbourhood scans from single-cell queries.

use glam::{IVec2, Vec2};
use rustc_hash::FxHashMap;

/// Offsets of the 3x3 block centred on a cell
pub const NEIGHBORHOOD_3X3: [IVec2; 9] = [
    IVec2::new(-1, -1),
    IVec2::new(0, -1),
    IVec2::new(1, -1),
    IVec2::new(-1, 0),
    IVec2::new(0, 0),
    IVec2::new(1, 0),
    IVec2::new(-1, 1),
    IVec2::new(0, 1),
    IVec2::new(1, 1),
];

/// Hash grid mapping cell coordinates to unordered payload lists
#[derive(Debug, Clone)]
pub struct SpatialHashGrid<T = u32> {
    cell_size: f32,
    cells: FxHashMap<IVec2, Vec<T>>,
    len: usize,
}

impl<T: Copy> SpatialHashGrid<T> {
    /// Create an empty grid. `cell_size` must be positive; `FlockConfig::validate`
    /// guarantees this for simulator-owned grids.
    pub fn new(cell_size: f32) -> Self {
        Self {
            cell_size,
            cells: FxHashMap::default(),
            len: 0,
        }
    }

    #[inline]
    pub fn cell_size(&self) -> f32 {
        self.cell_size
    }

    /// Total payloads stored
    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Number of cells holding at least one payload
    pub fn cell_count(&self) -> usize {
        self.cells.values().filter(|list| !list.is_empty()).count()
    }

    /// Remove all payloads.
    ///
    /// Lists that held entries keep their allocation for the next rebuild;
    /// lists that were already empty are dropped.
    pub fn clear(&mut self) {
        self.cells.retain(|_, list| {
            let keep = !list.is_empty();
            list.clear();
            keep
        });
        self.len = 0;
    }

    /// Cell containing `position`, flooring toward negative infinity
    #[inline]
    pub fn cell_coord(&self, position: Vec2) -> IVec2 {
        (position / self.cell_size).floor().as_ivec2()
    }

    /// Append a payload to a cell, creating the list if absent
    #[inline]
    pub fn insert(&mut self, cell: IVec2, payload: T) {
        self.cells.entry(cell).or_default().push(payload);
        self.len += 1;
    }

    /// Insert a payload into the cell containing `position`
    #[inline]
    pub fn insert_at(&mut self, position: Vec2, payload: T) -> IVec2 {
        let cell = self.cell_coord(position);
        self.insert(cell, payload);
        cell
    }

    /// Payloads of exactly this cell.
    ///
    /// A never-populated cell and a cell emptied by `clear` both return `None`.
    #[inline]
    pub fn query(&self, cell: IVec2) -> Option<&[T]> {
        self.cells
            .get(&cell)
            .filter(|list| !list.is_empty())
            .map(Vec::as_slice)
    }

    /// Occupied cells with their payloads, in no particular order
    pub fn occupied_cells(&self) -> impl Iterator<Item = (IVec2, &[T])> + '_ {
        self.cells
            .iter()
            .filter(|(_, list)| !list.is_empty())
            .map(|(cell, list)| (*cell, list.as_slice()))
    }

    /// How many cells out from the centre a scan must reach to cover `radius`.
    ///
    /// Infinite radii saturate to `i32::MAX`; NaN reads as the minimum reach.
    #[inline]
    pub fn reach_for(&self, radius: f32) -> i32 {
        ((radius / self.cell_size).ceil() as i32).max(1)
    }

    /// Visit every payload in the `(2 * reach + 1)^2` block centred on `center`.
    ///
    /// Cells whose coordinate would fall outside `i32` are skipped. When the
    /// block holds more cells than the grid has lists, the occupied cells are
    /// filtered instead of walking the block.
    pub fn for_each_in_neighborhood(&self, center: IVec2, reach: i32, mut f: impl FnMut(T)) {
        let reach = reach.max(0);
        if reach == 1 {
            for offset in NEIGHBORHOOD_3X3 {
                if let Some(list) = offset_cell(center, offset).and_then(|cell| self.query(cell)) {
                    list.iter().copied().for_each(&mut f);
                }
            }
            return;
        }

        let side = 2 * reach as i64 + 1;
        if side.saturating_mul(side) > self.cells.len() as i64 {
            for (cell, list) in self.occupied_cells() {
                if chebyshev(cell, center) <= reach as i64 {
                    list.iter().copied().for_each(&mut f);
                }
            }
            return;
        }

        for dy in -reach..=reach {
            for dx in -reach..=reach {
                let cell = offset_cell(center, IVec2::new(dx, dy));
                if let Some(list) = cell.and_then(|cell| self.query(cell)) {
                    list.iter().copied().for_each(&mut f);
                }
            }
        }
    }

    /// Write candidate payloads whose cells could lie within `radius` of
    /// `position` into `buf` (cleared first). No distance filtering.
    pub fn query_radius_into(&self, position: Vec2, radius: f32, buf: &mut Vec<T>) {
        buf.clear();
        let center = self.cell_coord(position);
        self.for_each_in_neighborhood(center, self.reach_for(radius), |payload| buf.push(payload));
    }
}

/// `center + offset`, or `None` if either axis leaves the `i32` range
#[inline]
fn offset_cell(center: IVec2, offset: IVec2) -> Option<IVec2> {
    Some(IVec2::new(
        center.x.checked_add(offset.x)?,
        center.y.checked_add(offset.y)?,
    ))
}

/// Largest per-axis distance between two cells, without overflow
#[inline]
fn chebyshev(a: IVec2, b: IVec2) -> i64 {
    let dx = (a.x as i64 - b.x as i64).abs();
    let dy = (a.y as i64 - b.y as i64).abs();
    dx.max(dy)
}

impl SpatialHashGrid<u32> {
    /// Clear and repopulate from positions, using each position's index as payload
    pub fn rebuild(&mut self, positions: impl IntoIterator<Item = Vec2>) {
        self.clear();
        for (idx, pos) in positions.into_iter().enumerate() {
            self.insert_at(pos, idx as u32);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_cell_coord_floors_negative() {
        let grid = SpatialHashGrid::<u32>::new(50.0);
        assert_eq!(grid.cell_coord(Vec2::new(-0.1, -0.1)), IVec2::new(-1, -1));
        assert_eq!(grid.cell_coord(Vec2::new(0.0, 0.0)), IVec2::new(0, 0));
        assert_eq!(grid.cell_coord(Vec2::new(49.9, 50.0)), IVec2::new(0, 1));
        assert_eq!(grid.cell_coord(Vec2::new(-50.0, -50.1)), IVec2::new(-1, -2));
    }

    #[test]
    fn test_query_miss_is_none() {
        let mut grid = SpatialHashGrid::<u32>::new(10.0);
        assert!(grid.query(IVec2::ZERO).is_none());

        grid.insert(IVec2::ZERO, 7);
        assert_eq!(grid.query(IVec2::ZERO), Some(&[7][..]));
        assert!(grid.query(IVec2::new(1, 0)).is_none());

        // Retained-but-empty lists read as absent
        grid.clear();
        assert!(grid.query(IVec2::ZERO).is_none());
        assert!(grid.is_empty());
        assert_eq!(grid.cell_count(), 0);
    }

    #[test]
    fn test_clear_drops_stale_cells() {
        let mut grid = SpatialHashGrid::<u32>::new(10.0);
        grid.insert(IVec2::new(3, 3), 1);
        grid.clear();
        // Cell kept once (had entries), dropped on the following clear
        assert_eq!(grid.cells.len(), 1);
        grid.clear();
        assert_eq!(grid.cells.len(), 0);
    }

    #[test]
    fn test_scenario_two_agents_share_origin_cell() {
        let mut grid = SpatialHashGrid::<u32>::new(50.0);
        grid.rebuild([Vec2::new(0.0, 0.0), Vec2::new(10.0, 10.0)]);
        assert_eq!(grid.len(), 2);
        assert_eq!(grid.cell_count(), 1);
        let mut members = grid.query(IVec2::ZERO).expect("origin cell").to_vec();
        members.sort_unstable();
        assert_eq!(members, vec![0, 1]);
    }

    #[test]
    fn test_neighborhood_scan_reach() {
        let mut grid = SpatialHashGrid::<u32>::new(10.0);
        grid.insert(IVec2::new(1, 1), 1);
        grid.insert(IVec2::new(2, 0), 2);
        grid.insert(IVec2::new(-1, 0), 3);

        let mut found = Vec::new();
        grid.for_each_in_neighborhood(IVec2::ZERO, 1, |p| found.push(p));
        found.sort_unstable();
        assert_eq!(found, vec![1, 3]);

        found.clear();
        grid.for_each_in_neighborhood(IVec2::ZERO, 2, |p| found.push(p));
        found.sort_unstable();
        assert_eq!(found, vec![1, 2, 3]);
    }

    #[test]
    fn test_wide_reach_walks_block_in_dense_grid() {
        let mut grid = SpatialHashGrid::<u32>::new(10.0);
        for x in -20..20 {
            grid.insert(IVec2::new(x, 0), (x + 20) as u32);
        }
        let mut found = Vec::new();
        grid.for_each_in_neighborhood(IVec2::ZERO, 2, |p| found.push(p));
        found.sort_unstable();
        assert_eq!(found, vec![18, 19, 20, 21, 22]);
    }

    #[test]
    fn test_query_radius_into_reuses_buffer() {
        let mut grid = SpatialHashGrid::<u32>::new(10.0);
        grid.rebuild([Vec2::new(1.0, 1.0), Vec2::new(25.0, 1.0), Vec2::new(-300.0, 0.0)]);

        let mut buf = vec![99];
        grid.query_radius_into(Vec2::new(2.0, 2.0), 25.0, &mut buf);
        buf.sort_unstable();
        assert_eq!(buf, vec![0, 1]);
        assert_eq!(grid.reach_for(25.0), 3);
        assert_eq!(grid.reach_for(0.0), 1);
    }

    #[test]
    fn test_far_positions_do_not_overflow() {
        let mut grid = SpatialHashGrid::<u32>::new(50.0);
        let far = Vec2::new(1.0e12, 1.0e12);
        grid.rebuild([far, Vec2::new(-1.0e12, 0.0)]);
        assert_eq!(grid.cell_coord(far), IVec2::splat(i32::MAX));
        assert_eq!(grid.cell_coord(Vec2::new(-1.0e12, 0.0)), IVec2::new(i32::MIN, 0));

        let mut buf = Vec::new();
        grid.query_radius_into(far, 10.0, &mut buf);
        assert_eq!(buf, vec![0]);
        grid.query_radius_into(Vec2::new(-1.0e12, 0.0), 120.0, &mut buf);
        assert_eq!(buf, vec![1]);
    }

    #[test]
    fn test_unbounded_radius_visits_every_cell_once() {
        let mut grid = SpatialHashGrid::<u32>::new(10.0);
        grid.rebuild([Vec2::new(1.0, 1.0), Vec2::new(-500.0, 70.0), Vec2::new(1.0e12, -3.0)]);
        assert_eq!(grid.reach_for(f32::INFINITY), i32::MAX);
        assert_eq!(grid.reach_for(f32::NAN), 1);

        let mut buf = Vec::new();
        grid.query_radius_into(Vec2::ZERO, f32::INFINITY, &mut buf);
        buf.sort_unstable();
        assert_eq!(buf, vec![0, 1, 2]);

        // Wide but finite reach falls back to the occupied cells and still filters by block
        grid.query_radius_into(Vec2::ZERO, 600.0, &mut buf);
        buf.sort_unstable();
        assert_eq!(buf, vec![0, 1]);
    }

    proptest! {
        #[test]
        fn prop_cell_coord_is_floor(x in -1.0e5f32..1.0e5, y in -1.0e5f32..1.0e5, size in 1.0f32..200.0) {
            let grid = SpatialHashGrid::<u32>::new(size);
            let cell = grid.cell_coord(Vec2::new(x, y));
            let expected = IVec2::new((x / size).floor() as i32, (y / size).floor() as i32);
            prop_assert_eq!(cell, expected);
            prop_assert_eq!(grid.cell_coord(Vec2::new(x, y)), cell);
            if x < 0.0 {
                prop_assert!(cell.x < 0);
            }
            if y < 0.0 {
                prop_assert!(cell.y < 0);
            }
        }

        #[test]
        fn prop_rebuild_places_each_index_once(
            points in prop::collection::vec((-500.0f32..500.0, -500.0f32..500.0), 0..200)
        ) {
            let positions: Vec<Vec2> = points.iter().map(|&(x, y)| Vec2::new(x, y)).collect();
            let mut grid = SpatialHashGrid::<u32>::new(37.0);
            grid.rebuild(positions.iter().copied());

            let mut seen = vec![0u32; positions.len()];
            for (cell, members) in grid.occupied_cells() {
                for &idx in members {
                    seen[idx as usize] += 1;
                    prop_assert_eq!(cell, grid.cell_coord(positions[idx as usize]));
                }
            }
            prop_assert!(seen.iter().all(|&count| count == 1));
            prop_assert_eq!(grid.len(), positions.len());
        }

        #[test]
        fn prop_3x3_scan_covers_radius(
            ax in -300.0f32..300.0, ay in -300.0f32..300.0,
            angle in 0.0f32..std::f32::consts::TAU, frac in 0.0f32..1.0,
        ) {
            let cell_size = 40.0;
            let a = Vec2::new(ax, ay);
            let b = a + Vec2::from_angle(angle) * (cell_size * frac);

            let mut grid = SpatialHashGrid::<u32>::new(cell_size);
            grid.rebuild([a, b]);

            let mut found = false;
            grid.for_each_in_neighborhood(grid.cell_coord(a), 1, |p| found |= p == 1);
            prop_assert!(found);
        }
    }
}
