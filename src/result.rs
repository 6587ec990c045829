//! Final sort, renumbering, and mask rasterization (C10).

use maxfind_geom::Dims3;

use crate::config::{MaskMode, OutputType, SortKey};
use crate::error::FindMaximaError;
use crate::histogram::ImageStatistics;
use crate::image::ImageSource;
use crate::peak::PeakRecord;

/// A labelled mask is rejected past this many peaks (spec §7: "the final
/// peak count exceeded 65535 while a labelled mask was requested").
const MAX_MASK_LABELS: usize = 65_535;

/// The artefacts a `find_maxima` invocation returns to its caller.
pub struct FindMaximaResult {
    /// Surviving peaks, sorted per the configured key and renumbered `1..N`
    /// in that order.
    pub peaks: Vec<PeakRecord>,
    /// One label per voxel (`0` = not part of any peak), present only when
    /// `output_type` requested one.
    pub mask: Option<Vec<i32>>,
    pub stats: ImageStatistics,
}

fn sort_value(peak: &PeakRecord, key: SortKey, background: f32) -> f64 {
    match key {
        SortKey::Intensity => peak.total_intensity,
        SortKey::IntensityAboveBackground => peak.intensity_above_background,
        SortKey::Count => peak.count as f64,
        SortKey::MaxValue => peak.max_value as f64,
        SortKey::AverageIntensity => peak.average_intensity(),
        SortKey::SaddleHeight => peak.highest_saddle_value as f64,
        SortKey::CountAboveSaddle => peak.count_above_saddle as f64,
        SortKey::IntensityAboveSaddle => peak.intensity_above_saddle,
        SortKey::AbsoluteHeight => peak.prominence(background) as f64,
        SortKey::RelativeHeight => {
            if peak.max_value == 0.0 {
                0.0
            } else {
                (peak.prominence(background) / peak.max_value) as f64
            }
        }
        SortKey::Xyz => 0.0,
        SortKey::PeakId => -(peak.id as f64),
    }
}

/// Sorts, filters dead peaks, and renumbers ids to `1..=N` in the new
/// order, returning the old-id -> new-id map (`0` for a dropped peak).
fn sort_and_renumber(mut peaks: Vec<PeakRecord>, key: SortKey, background: f32) -> (Vec<PeakRecord>, Vec<u32>) {
    let max_old_id = peaks.iter().map(|p| p.id).max().unwrap_or(0);
    let mut alive: Vec<PeakRecord> = peaks.drain(..).filter(|p| p.alive).collect();

    if key == SortKey::Xyz {
        alive.sort_by(|a, b| (a.z, a.y, a.x).cmp(&(b.z, b.y, b.x)));
    } else {
        alive.sort_by(|a, b| {
            sort_value(b, key, background)
                .partial_cmp(&sort_value(a, key, background))
                .unwrap_or(core::cmp::Ordering::Equal)
                .then(a.id.cmp(&b.id))
        });
    }

    let mut id_map = vec![0u32; max_old_id as usize + 1];
    for (new_pos, peak) in alive.iter().enumerate() {
        id_map[peak.id as usize] = new_pos as u32 + 1;
    }
    for peak in alive.iter_mut() {
        let old_id = peak.id;
        peak.id = id_map[old_id as usize];
        peak.saddles.remap(&id_map, peak.id);
        if peak.saddle_neighbor_id != 0 {
            peak.saddle_neighbor_id = id_map.get(peak.saddle_neighbor_id as usize).copied().unwrap_or(0);
        }
    }
    (alive, id_map)
}

fn mask_membership(peak: &PeakRecord, value: f32, background: f32, mode: MaskMode) -> bool {
    match mode {
        MaskMode::Thresholded => true,
        MaskMode::AboveSaddle => {
            let cutoff = if peak.saddles.is_empty() { background } else { peak.highest_saddle_value };
            value > cutoff
        }
        MaskMode::FractionOfIntensity => {
            let average = peak.average_intensity() as f32;
            value >= average
        }
        MaskMode::FractionOfHeight => {
            let cutoff = if peak.saddles.is_empty() { background } else { peak.highest_saddle_value };
            value > cutoff + 0.5 * (peak.max_value - cutoff)
        }
    }
}

fn rasterize_mask(
    image: &dyn ImageSource,
    dims: Dims3,
    labels: &[i32],
    id_map: &[u32],
    peaks: &[PeakRecord],
    background: f32,
    output_type: OutputType,
    mask_mode: MaskMode,
) -> Vec<i32> {
    let mut mask = vec![0i32; dims.voxel_count()];

    if output_type.contains(OutputType::SINGLE_POINTS) {
        for peak in peaks {
            mask[dims.index(peak.seed())] = peak.id as i32;
        }
        return mask;
    }

    for i in 0..image.pixel_count() {
        let old_id = labels[i];
        if old_id <= 0 {
            continue;
        }
        let new_id = *id_map.get(old_id as usize).unwrap_or(&0);
        if new_id == 0 {
            continue;
        }
        let peak = &peaks[new_id as usize - 1];
        let value = image.value(i);
        let member = if output_type.contains(OutputType::IN_TOLERANCE) {
            mask_membership(peak, value, background, mask_mode)
        } else {
            output_type.contains(OutputType::SEGMENTED)
        };
        if member {
            mask[i] = new_id as i32;
        }
    }
    mask
}

/// Produces the final sorted peak list and, if requested, the rasterized
/// label mask (spec §4.10).
pub fn build_result(
    image: &dyn ImageSource,
    labels: &[i32],
    peaks: Vec<PeakRecord>,
    sort_index: SortKey,
    output_type: OutputType,
    mask_mode: MaskMode,
    background: f32,
    stats: ImageStatistics,
) -> Result<FindMaximaResult, FindMaximaError> {
    let (sorted, id_map) = sort_and_renumber(peaks, sort_index, background);

    if sorted.len() > MAX_MASK_LABELS && output_type.any() {
        return Err(FindMaximaError::CapacityExceeded(format!(
            "{} surviving peaks exceeds the {} a labelled mask can address",
            sorted.len(),
            MAX_MASK_LABELS
        )));
    }

    let mask = if output_type.any() {
        Some(rasterize_mask(
            image,
            image.dims(),
            labels,
            &id_map,
            &sorted,
            background,
            output_type,
            mask_mode,
        ))
    } else {
        None
    };

    Ok(FindMaximaResult { peaks: sorted, mask, stats })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::histogram::Statistics;
    use crate::image::VoxelBuffer;
    use maxfind_geom::Voxel;

    fn stats() -> ImageStatistics {
        let zero = Statistics { min: 0.0, max: 0.0, mean: 0.0, stddev: 0.0, sum: 0.0, count: 0 };
        ImageStatistics {
            image_minimum: 0.0,
            inside: zero,
            outside: zero,
            background: 0.0,
            total_above_background: 0.0,
            total_above_image_minimum: 0.0,
        }
    }

    #[test]
    fn sorts_descending_by_intensity_and_renumbers() {
        let mut a = PeakRecord::new(1, Voxel::new(0, 0, 0), 3.0, 0.0);
        a.total_intensity = 10.0;
        let mut b = PeakRecord::new(2, Voxel::new(1, 0, 0), 9.0, 0.0);
        b.total_intensity = 50.0;
        let image = VoxelBuffer::from_u8(2, 1, 1, &[3, 9]).unwrap();
        let labels = vec![1, 2];

        let result =
            build_result(&image, &labels, vec![a, b], SortKey::Intensity, OutputType::empty(), MaskMode::Thresholded, 0.0, stats())
                .unwrap();

        assert_eq!(result.peaks[0].id, 1);
        assert_eq!(result.peaks[0].max_value, 9.0);
        assert_eq!(result.peaks[1].id, 2);
        assert!(result.mask.is_none());
    }

    #[test]
    fn dead_peaks_are_dropped_from_output() {
        let mut a = PeakRecord::new(1, Voxel::new(0, 0, 0), 3.0, 0.0);
        a.alive = false;
        let b = PeakRecord::new(2, Voxel::new(1, 0, 0), 9.0, 0.0);
        let image = VoxelBuffer::from_u8(2, 1, 1, &[3, 9]).unwrap();
        let labels = vec![0, 2];

        let result = build_result(
            &image,
            &labels,
            vec![a, b],
            SortKey::MaxValue,
            OutputType::empty(),
            MaskMode::Thresholded,
            0.0,
            stats(),
        )
        .unwrap();

        assert_eq!(result.peaks.len(), 1);
        assert_eq!(result.peaks[0].id, 1);
    }

    #[test]
    fn single_points_mask_marks_only_seeds() {
        let a = PeakRecord::new(1, Voxel::new(0, 0, 0), 3.0, 0.0);
        let image = VoxelBuffer::from_u8(2, 1, 1, &[3, 1]).unwrap();
        let labels = vec![1, 1];

        let result = build_result(
            &image,
            &labels,
            vec![a],
            SortKey::MaxValue,
            OutputType::SINGLE_POINTS,
            MaskMode::Thresholded,
            0.0,
            stats(),
        )
        .unwrap();

        let mask = result.mask.unwrap();
        assert_eq!(mask, vec![1, 0]);
    }
}
