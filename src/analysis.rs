//! Peak analysis: above-saddle statistics (C8).

use maxfind_geom::Voxel;

use crate::config::Options;
use crate::flags::Flags;
use crate::flood;
use crate::image::ImageSource;
use crate::peak::PeakRecord;

/// Fills in `count_above_saddle`/`intensity_above_saddle` for every peak
/// (spec §4.8).
///
/// With [`Options::CONTIGUOUS_ABOVE_SADDLE`], only the voxels reachable
/// from the peak's own seed without dropping below its cutoff count —
/// disconnected above-cutoff fragments of the same label are excluded.
/// Without it, every voxel carrying the peak's label above the cutoff
/// counts, contiguous or not.
pub fn analyze_peaks(
    image: &dyn ImageSource,
    flags: &mut [Flags],
    labels: &[i32],
    peaks: &mut [PeakRecord],
    background: f32,
    options: Options,
) {
    let dims = image.dims();
    let contiguous = options.contains(Options::CONTIGUOUS_ABOVE_SADDLE);

    for peak in peaks.iter_mut() {
        if !peak.alive {
            continue;
        }
        let cutoff = if peak.saddles.is_empty() { background } else { peak.highest_saddle_value };

        if contiguous {
            let id = peak.id as i32;
            let seed = peak.seed();
            let visited = flood::bfs(
                &dims,
                seed,
                flags,
                |n| labels[dims.index(n)] == id && image.value(dims.index(n)) > cutoff,
                |_| {},
            );
            peak.count_above_saddle = visited.len() as u64;
            peak.intensity_above_saddle =
                visited.iter().map(|v| image.value(dims.index(*v)) as f64).sum();
        } else {
            let id = peak.id as i32;
            let mut count = 0u64;
            let mut intensity = 0.0f64;
            for i in 0..image.pixel_count() {
                if labels[i] == id && image.value(i) > cutoff {
                    count += 1;
                    intensity += image.value(i) as f64;
                }
            }
            peak.count_above_saddle = count;
            peak.intensity_above_saddle = intensity;
        }
    }
}

/// Returns `true` for a peak whose above-saddle count would fail
/// [`Options::MINIMUM_ABOVE_SADDLE`]'s `min_size` test, i.e. a candidate
/// for removal in the size-filter merge pass (spec §4.9).
pub fn below_minimum_size(peak: &PeakRecord, options: Options, min_size: u64) -> bool {
    let effective = if options.contains(Options::MINIMUM_ABOVE_SADDLE) {
        peak.count_above_saddle
    } else {
        peak.count
    };
    effective < min_size
}
