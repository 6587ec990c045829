//! Three-pass peak merging (C9): by height, then by size, then by
//! above-saddle size.
//!
//! Each pass repeatedly absorbs the weakest disqualified peak into its
//! highest neighbour until no peak in the current set is disqualified,
//! since absorbing one peak can change whether its neighbour's own
//! prominence or size now passes. Absorbed peaks are marked `alive = false`
//! rather than removed, so indices stay stable across a pass (spec §9's
//! `alive`-flag alternative to the source's sentinel removal).

use crate::peak::PeakRecord;

/// Union-find-style id resolver: follows `id_map` until it reaches a fixed
/// point, then path-compresses.
fn resolve(id_map: &mut [u32], id: u32) -> u32 {
    let mut root = id;
    while id_map[root as usize] != root {
        root = id_map[root as usize];
    }
    let mut cur = id;
    while id_map[cur as usize] != root {
        let next = id_map[cur as usize];
        id_map[cur as usize] = root;
        cur = next;
    }
    root
}

fn absorb(peaks: &mut [PeakRecord], id_map: &mut [u32], absorbed_id: u32, target_id: u32) {
    let (lo, hi) = if absorbed_id < target_id {
        (absorbed_id, target_id)
    } else {
        (target_id, absorbed_id)
    };
    let (left, right) = peaks.split_at_mut(hi as usize - 1);
    let (absorbed, target) = if absorbed_id == lo {
        (&mut left[lo as usize - 1], &mut right[0])
    } else {
        (&mut right[0], &mut left[lo as usize - 1])
    };

    target.count += absorbed.count;
    target.total_intensity += absorbed.total_intensity;
    target.count_above_saddle += absorbed.count_above_saddle;
    target.intensity_above_saddle += absorbed.intensity_above_saddle;
    target.intensity_above_background += absorbed.intensity_above_background;
    target.intensity_above_image_minimum += absorbed.intensity_above_image_minimum;
    target.max_value = target.max_value.max(absorbed.max_value);
    target.bbox.union(&absorbed.bbox);
    target.saddles.remove_neighbor(absorbed_id);
    absorbed.saddles.remove_neighbor(target_id);
    target.saddles.merge_from(&absorbed.saddles);
    absorbed.alive = false;

    id_map[absorbed_id as usize] = target_id;

    for peak in peaks.iter_mut() {
        if peak.alive {
            peak.saddles.remap(id_map, peak.id);
            if let Some(highest) = peak.saddles.highest() {
                peak.highest_saddle_value = highest.value;
                peak.saddle_neighbor_id = highest.neighbor_id;
            }
        }
    }
}

/// Pass 1 (spec §4.9): a peak whose prominence (`max_value` minus its
/// highest saddle, or `background` if it has none) is below `peak_heights`
/// merges into its highest-saddle neighbour.
pub fn merge_by_height(peaks: &mut [PeakRecord], background: f32, peak_heights: &[f32]) {
    let mut id_map: Vec<u32> = (0..=peaks.len() as u32).collect();
    loop {
        let mut merged_any = false;
        for i in 0..peaks.len() {
            if !peaks[i].alive {
                continue;
            }
            let id = peaks[i].id;
            if peaks[i].prominence(background) >= peak_heights[id as usize - 1] {
                continue;
            }
            let Some(neighbor) = peaks[i].saddles.highest() else {
                peaks[i].alive = false;
                merged_any = true;
                continue;
            };
            let target = resolve(&mut id_map, neighbor.neighbor_id);
            if target == id || target as usize - 1 >= peaks.len() || !peaks[target as usize - 1].alive {
                continue;
            }
            absorb(peaks, &mut id_map, id, target);
            merged_any = true;
        }
        if !merged_any {
            break;
        }
    }
}

/// Passes 2/3 (spec §4.9): a peak below `min_size` (by `count` or
/// `count_above_saddle`, per `selector`) merges into its highest-saddle
/// neighbour, or is simply dropped if it has none.
pub fn merge_by_size(peaks: &mut [PeakRecord], min_size: u64, selector: impl Fn(&PeakRecord) -> u64) {
    let mut id_map: Vec<u32> = (0..=peaks.len() as u32).collect();
    loop {
        let mut merged_any = false;
        for i in 0..peaks.len() {
            if !peaks[i].alive || selector(&peaks[i]) >= min_size {
                continue;
            }
            let id = peaks[i].id;
            match peaks[i].saddles.highest() {
                None => {
                    peaks[i].alive = false;
                    merged_any = true;
                }
                Some(neighbor) => {
                    let target = resolve(&mut id_map, neighbor.neighbor_id);
                    if target == id || target as usize - 1 >= peaks.len() || !peaks[target as usize - 1].alive
                    {
                        continue;
                    }
                    absorb(peaks, &mut id_map, id, target);
                    merged_any = true;
                }
            }
        }
        if !merged_any {
            break;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use maxfind_geom::Voxel;

    fn peak(id: u32, max: f32) -> PeakRecord {
        PeakRecord::new(id, Voxel::new(id as i32, 0, 0), max, 0.0)
    }

    #[test]
    fn low_prominence_peak_merges_into_taller_neighbor() {
        let mut peaks = vec![peak(1, 10.0), peak(2, 3.0)];
        peaks[0].count = 5;
        peaks[1].count = 2;
        peaks[0].saddles.update(2, 2.5);
        peaks[1].saddles.update(1, 2.5);
        peaks[0].highest_saddle_value = 2.5;
        peaks[1].highest_saddle_value = 2.5;
        peaks[0].saddle_neighbor_id = 2;
        peaks[1].saddle_neighbor_id = 1;

        // peak 2's prominence is 3.0 - 2.5 = 0.5, below a height of 1.0.
        merge_by_height(&mut peaks, 0.0, &[1.0, 1.0]);

        assert!(peaks[0].alive);
        assert!(!peaks[1].alive);
        assert_eq!(peaks[0].count, 7);
    }

    #[test]
    fn undersized_peak_with_no_saddle_is_dropped() {
        let mut peaks = vec![peak(1, 10.0)];
        peaks[0].count = 1;
        merge_by_size(&mut peaks, 5, |p| p.count);
        assert!(!peaks[0].alive);
    }

    #[test]
    fn undersized_peak_merges_by_count_above_saddle_selector() {
        let mut peaks = vec![peak(1, 10.0), peak(2, 6.0)];
        peaks[0].count = 10;
        peaks[1].count_above_saddle = 1;
        peaks[1].saddles.update(1, 4.0);
        peaks[0].saddles.update(2, 4.0);
        peaks[1].highest_saddle_value = 4.0;
        peaks[1].saddle_neighbor_id = 1;

        merge_by_size(&mut peaks, 5, |p| p.count_above_saddle);

        assert!(!peaks[1].alive);
        assert!(peaks[0].alive);
    }
}
