//! Maxima finder (C5).

use maxfind_geom::{for_each_neighbor, Dims3, Voxel};

use crate::error::FindMaximaError;
use crate::flags::Flags;
use crate::flood::bfs;
use crate::image::ImageSource;

/// One seed maximum: the chosen voxel (plateau centre, or the voxel
/// itself for an isolated peak) and its value.
#[derive(Copy, Clone, PartialEq, Debug)]
pub struct Seed {
    pub voxel: Voxel,
    pub value: f32,
}

/// Locates every local maximum above `threshold`, seeds the label map, and
/// returns the seeds sorted by value descending (ties broken by discovery
/// order, spec §4.4).
///
/// On return, `flags` carries `MAXIMUM | MAX_AREA | PLATEAU` where
/// appropriate and `labels` carries the final (post-sort) id for every
/// plateau voxel; isolated seeds are labelled by the caller once ids are
/// final, since a single voxel has no plateau membership to remap.
pub fn find_maxima_seeds(
    image: &dyn ImageSource,
    flags: &mut [Flags],
    labels: &mut [i32],
    threshold: f32,
    global_min: f32,
    max_seeds: usize,
) -> Result<Vec<Seed>, FindMaximaError> {
    let dims = image.dims();
    let mut seeds: Vec<Seed> = Vec::new();
    // raw_id[i] = 1-based discovery order of the seed whose plateau voxel i belongs to.
    let mut raw_id = vec![0u32; image.pixel_count()];

    for i in 0..image.pixel_count() {
        let skip = flags[i].intersects(
            Flags::EXCLUDED | Flags::MAX_AREA | Flags::PLATEAU | Flags::NOT_MAXIMUM,
        );
        if skip {
            continue;
        }
        let v = image.value(i);
        if v < threshold || v == global_min {
            continue;
        }

        let here = dims.coords(i);
        let mut higher_neighbor = false;
        let mut equal_neighbor = false;
        for_each_neighbor(&dims, here, |_, n| {
            let nv = image.value(dims.index(n));
            if nv > v {
                higher_neighbor = true;
            } else if nv == v {
                equal_neighbor = true;
            } else {
                // Pruning optimisation: a strictly lower neighbour can never
                // itself be a maximum once this voxel out-ranks it.
                flags[dims.index(n)].insert(Flags::NOT_MAXIMUM);
            }
        });

        if higher_neighbor {
            continue;
        }

        if seeds.len() >= max_seeds {
            return Err(FindMaximaError::CapacityExceeded(format!(
                "seed count reached configured capacity {}",
                max_seeds
            )));
        }

        if equal_neighbor {
            seed_plateau(image, &dims, flags, labels, &mut raw_id, here, v, &mut seeds, max_seeds)?;
        } else {
            flags[i].insert(Flags::MAXIMUM | Flags::MAX_AREA);
            let id = seeds.len() as u32 + 1;
            raw_id[i] = id;
            seeds.push(Seed { voxel: here, value: v });
        }
    }

    // Sort descending by value; `sort_by` is stable, so equal values keep
    // their discovery order (spec §4.4's deterministic tiebreak).
    let mut order: Vec<usize> = (0..seeds.len()).collect();
    order.sort_by(|&a, &b| seeds[b].value.partial_cmp(&seeds[a].value).unwrap());

    let mut remap = vec![0u32; seeds.len() + 1];
    for (new_pos, &old_idx) in order.iter().enumerate() {
        remap[old_idx as usize + 1] = new_pos as u32 + 1;
    }
    for i in 0..image.pixel_count() {
        if raw_id[i] != 0 {
            labels[i] = remap[raw_id[i] as usize] as i32;
        }
    }

    let sorted: Vec<Seed> = order.iter().map(|&i| seeds[i]).collect();
    Ok(sorted)
}

#[allow(clippy::too_many_arguments)]
fn seed_plateau(
    image: &dyn ImageSource,
    dims: &Dims3,
    flags: &mut [Flags],
    labels: &mut [i32],
    raw_id: &mut [u32],
    start: Voxel,
    value: f32,
    seeds: &mut Vec<Seed>,
    max_seeds: usize,
) -> Result<(), FindMaximaError> {
    let mut disqualified = false;
    let mut sum = Voxel::zero();

    let plateau = bfs(
        dims,
        start,
        flags,
        |n| image.value(dims.index(n)) == value && !flags[dims.index(n)].intersects(Flags::EXCLUDED),
        |v| {
            flags[dims.index(v)].insert(Flags::PLATEAU);
            sum.x += v.x;
            sum.y += v.y;
            sum.z += v.z;
            for_each_neighbor(dims, v, |_, n| {
                if image.value(dims.index(n)) > value {
                    disqualified = true;
                }
            });
        },
    );

    if disqualified {
        for v in &plateau {
            flags[dims.index(*v)].insert(Flags::NOT_MAXIMUM);
        }
        return Ok(());
    }

    if seeds.len() >= max_seeds {
        return Err(FindMaximaError::CapacityExceeded(format!(
            "seed count reached configured capacity {}",
            max_seeds
        )));
    }

    let n = plateau.len() as i32;
    let centroid = Voxel::new(sum.x / n, sum.y / n, sum.z / n);
    let centre = plateau
        .iter()
        .copied()
        .min_by_key(|v| v.distance_sqd(centroid))
        .unwrap_or(start);

    let id = seeds.len() as u32 + 1;
    for v in &plateau {
        let idx = dims.index(*v);
        labels[idx] = id as i32;
        raw_id[idx] = id;
        flags[idx].insert(Flags::MAX_AREA);
    }
    flags[dims.index(centre)].insert(Flags::MAXIMUM);
    seeds.push(Seed { voxel: centre, value });
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::image::VoxelBuffer;

    #[test]
    fn single_peak_3x3() {
        let image = VoxelBuffer::from_u8(3, 3, 1, &[1, 1, 1, 1, 5, 1, 1, 1, 1]).unwrap();
        let mut flags = vec![Flags::empty(); 9];
        let mut labels = vec![0i32; 9];
        let seeds = find_maxima_seeds(&image, &mut flags, &mut labels, 2.0, 1.0, 100).unwrap();
        assert_eq!(seeds.len(), 1);
        assert_eq!(seeds[0].voxel, Voxel::new(1, 1, 0));
        assert_eq!(seeds[0].value, 5.0);
    }

    #[test]
    fn plateau_centre_is_middle_voxel() {
        let image = VoxelBuffer::from_u8(5, 1, 1, &[1, 3, 3, 3, 1]).unwrap();
        let mut flags = vec![Flags::empty(); 5];
        let mut labels = vec![0i32; 5];
        let seeds = find_maxima_seeds(&image, &mut flags, &mut labels, 0.0, 1.0, 100).unwrap();
        assert_eq!(seeds.len(), 1);
        assert_eq!(seeds[0].voxel, Voxel::new(2, 0, 0));
        assert_eq!(labels[1..4], [1, 1, 1]);
    }

    #[test]
    fn two_seeds_sorted_descending_by_value() {
        let image = VoxelBuffer::from_u8(9, 1, 1, &[1, 4, 2, 3, 2, 6, 1, 0, 0]).unwrap();
        let mut flags = vec![Flags::empty(); 9];
        let mut labels = vec![0i32; 9];
        let seeds = find_maxima_seeds(&image, &mut flags, &mut labels, 0.0, 0.0, 100).unwrap();
        assert_eq!(seeds.len(), 2);
        assert_eq!(seeds[0].value, 6.0);
        assert_eq!(seeds[1].value, 4.0);
    }

    #[test]
    fn capacity_exceeded() {
        let image = VoxelBuffer::from_u8(3, 1, 1, &[5, 0, 5]).unwrap();
        let mut flags = vec![Flags::empty(); 3];
        let mut labels = vec![0i32; 3];
        let err = find_maxima_seeds(&image, &mut flags, &mut labels, 0.0, 0.0, 1).unwrap_err();
        assert!(matches!(err, FindMaximaError::CapacityExceeded(_)));
    }
}
