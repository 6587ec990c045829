//! A reusable worklist-based flood fill (spec §9: "implement once as a
//! reusable BFS taking a predicate and a visitor").
//!
//! Used by the plateau expansion in [`crate::maxima`], the contiguous
//! above-saddle recount in [`crate::analysis`], and the mask rasteriser's
//! object labelling in [`crate::result`]. `LISTED` is a per-phase scratch
//! bit, cleared on every voxel before this function returns.

use maxfind_geom::{for_each_neighbor, Dims3, Voxel};

use crate::flags::Flags;

/// Flood-fills from `start`, visiting every connected voxel for which
/// `should_visit` returns `true`, and returns the voxels visited in fill
/// order (always including `start`).
///
/// `should_visit` is consulted once per candidate neighbour before it is
/// queued. `visit` runs once per dequeued voxel, in fill order, and may
/// mutate external state (a label map, running totals) — it does not see
/// `flags`, since `flags` is already borrowed for the `LISTED` scratch bit.
pub fn bfs(
    dims: &Dims3,
    start: Voxel,
    flags: &mut [Flags],
    mut should_visit: impl FnMut(Voxel) -> bool,
    mut visit: impl FnMut(Voxel),
) -> Vec<Voxel> {
    let mut stack = vec![start];
    let mut collected = Vec::new();
    flags[dims.index(start)].insert(Flags::LISTED);

    while let Some(v) = stack.pop() {
        visit(v);
        collected.push(v);

        let mut to_queue: arrayvec::ArrayVec<(usize, Voxel), 26> = arrayvec::ArrayVec::new();
        for_each_neighbor(dims, v, |_, n| {
            let idx = dims.index(n);
            if !flags[idx].intersects(Flags::LISTED) && should_visit(n) {
                to_queue.push((idx, n));
            }
        });
        for (idx, n) in to_queue {
            flags[idx].insert(Flags::LISTED);
            stack.push(n);
        }
    }

    for v in &collected {
        flags[dims.index(*v)].remove(Flags::LISTED);
    }
    collected
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn visits_equal_valued_plateau_only() {
        let dims = Dims3::new(5, 1, 1).unwrap();
        let values = [1.0f32, 3.0, 3.0, 3.0, 1.0];
        let mut flags = vec![Flags::empty(); 5];
        let visited = bfs(
            &dims,
            Voxel::new(2, 0, 0),
            &mut flags,
            |n| values[dims.index(n)] == 3.0,
            |_| {},
        );
        assert_eq!(visited.len(), 3);
        for f in &flags {
            assert!(!f.contains(Flags::LISTED));
        }
    }
}
