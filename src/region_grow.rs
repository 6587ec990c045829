//! Steepest-ascent region growth (C6).
//!
//! Starting from the seeds `maxima.rs` placed in `labels`, every remaining
//! non-excluded voxel is assigned to a peak by propagating labels from
//! already-assigned, strictly-higher-or-equal neighbours in descending
//! value order. A voxel touched by two or more distinct labels at the same
//! level is a saddle contact; it is recorded for `saddle.rs` rather than
//! resolved here.

use maxfind_geom::{for_each_neighbor, Voxel};

use crate::error::FindMaximaError;
use crate::flags::Flags;
use crate::image::ImageSource;
use crate::peak::PeakRecord;

/// A candidate saddle edge observed while growing: two peaks met at
/// `value` when voxel adjacency first connected their regions.
#[derive(Copy, Clone, PartialEq, Debug)]
pub struct Contact {
    pub a: u32,
    pub b: u32,
    pub value: f32,
}

/// How often `interrupt` is polled, in voxels processed (spec §5: "polled
/// at per-level iterations").
const POLL_INTERVAL: usize = 4096;

/// Grows every seeded region outward to its per-peak search threshold.
///
/// `labels` must already carry the seed ids `maxima.rs` assigned (1-based,
/// `0` = unassigned); `peaks` must be indexed by `id - 1` and already
/// contain each seed's own statistics contribution. `search_thresholds[i]`
/// is `tau_p` for `peaks[i]` (spec §4.6); a voxel below its neighbour's
/// threshold is left unassigned rather than joining that region.
pub fn grow_regions(
    image: &dyn ImageSource,
    flags: &mut [Flags],
    labels: &mut [i32],
    peaks: &mut [PeakRecord],
    background: f32,
    global_min: f32,
    search_thresholds: &[f32],
    interrupt: &dyn Fn() -> bool,
) -> Result<Vec<Contact>, FindMaximaError> {
    let dims = image.dims();
    let mut order: Vec<usize> = (0..image.pixel_count())
        .filter(|&i| !flags[i].contains(Flags::EXCLUDED))
        .collect();
    order.sort_by(|&a, &b| image.value(b).partial_cmp(&image.value(a)).unwrap());

    let mut contacts: Vec<Contact> = Vec::new();

    for (step, &i) in order.iter().enumerate() {
        if step % POLL_INTERVAL == 0 && interrupt() {
            return Err(FindMaximaError::Cancelled);
        }

        let value = image.value(i);
        let here = dims.coords(i);

        if labels[i] != 0 {
            // Seeded voxel; maxima.rs already folded it into its peak.
            continue;
        }

        let mut best_id = 0u32;
        let mut best_value = f32::NEG_INFINITY;
        let mut distinct = Vec::new();
        for_each_neighbor(&dims, here, |_, n| {
            let nid = labels[dims.index(n)];
            if nid > 0 {
                let nid = nid as u32;
                if !distinct.contains(&nid) {
                    distinct.push(nid);
                }
                let nv = image.value(dims.index(n));
                if nv > best_value || (nv == best_value && nid < best_id) {
                    best_value = nv;
                    best_id = nid;
                }
            }
        });

        if distinct.len() > 1 {
            distinct.sort_unstable();
            for w in 0..distinct.len() {
                for v in (w + 1)..distinct.len() {
                    contacts.push(Contact { a: distinct[w], b: distinct[v], value });
                }
            }
        }

        if best_id == 0 {
            continue;
        }
        if value < search_thresholds[best_id as usize - 1] {
            continue;
        }

        labels[i] = best_id as i32;
        flags[i].insert(Flags::MAX_AREA);
        let peak = &mut peaks[best_id as usize - 1];
        peak.count += 1;
        peak.total_intensity += value as f64;
        peak.bbox.expand(here);
        peak.intensity_above_background += (value - background).max(0.0) as f64;
        peak.intensity_above_image_minimum += (value - global_min).max(0.0) as f64;
    }

    Ok(contacts)
}
