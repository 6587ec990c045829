//! Histogram & statistics (C2).

use crate::external::{ExternalMask, Roi};
use crate::flags::Flags;
use crate::image::{BitDepth, ImageSource};

/// Which voxels contribute to a histogram or statistics pass (spec §4.2).
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub enum InclusionRule {
    All,
    ExcludedIsZero,
    ExcludedIsNonZero,
}

impl InclusionRule {
    #[inline]
    fn include(&self, flags: Flags) -> bool {
        match self {
            InclusionRule::All => true,
            InclusionRule::ExcludedIsZero => !flags.contains(Flags::EXCLUDED),
            InclusionRule::ExcludedIsNonZero => flags.contains(Flags::EXCLUDED),
        }
    }
}

/// An integer-bin histogram for 8/16-bit sources, or a compacted float
/// histogram — one interface, two representations (spec §4.2).
#[derive(Clone, Debug)]
pub enum Histogram {
    Integer { counts: Vec<u32> },
    Float { counts: Vec<u32>, min: f32, max: f32 },
}

/// Float histograms are compacted to at most this many bins so
/// integer-threshold algorithms (Otsu, multi-Otsu) apply identically.
pub const MAX_FLOAT_BINS: usize = 1 << 16;

impl Histogram {
    pub fn build(image: &dyn ImageSource, flags: &[Flags], rule: InclusionRule) -> Self {
        match image.bit_depth() {
            BitDepth::U8 | BitDepth::U16 => {
                let mut counts = vec![0u32; image.bit_depth().histogram_bins()];
                for i in 0..image.pixel_count() {
                    if rule.include(flags[i]) {
                        counts[image.value(i) as usize] += 1;
                    }
                }
                Histogram::Integer { counts }
            }
            BitDepth::F32 => {
                let mut min = f32::INFINITY;
                let mut max = f32::NEG_INFINITY;
                for i in 0..image.pixel_count() {
                    if rule.include(flags[i]) {
                        let v = image.value(i);
                        min = min.min(v);
                        max = max.max(v);
                    }
                }
                if !min.is_finite() {
                    // Nothing included: defined as all-zero stats (spec §7).
                    return Histogram::Float { counts: vec![0; 1], min: 0.0, max: 0.0 };
                }
                let n_bins = MAX_FLOAT_BINS;
                let mut counts = vec![0u32; n_bins];
                let scale = if max > min { (n_bins - 1) as f32 / (max - min) } else { 0.0 };
                for i in 0..image.pixel_count() {
                    if rule.include(flags[i]) {
                        let v = image.value(i);
                        let bin = ((v - min) * scale).round() as usize;
                        counts[bin.min(n_bins - 1)] += 1;
                    }
                }
                Histogram::Float { counts, min, max }
            }
        }
    }

    pub fn counts(&self) -> &[u32] {
        match self {
            Histogram::Integer { counts } | Histogram::Float { counts, .. } => counts,
        }
    }

    pub fn num_bins(&self) -> usize {
        self.counts().len()
    }

    /// The bin index for a given voxel value.
    pub fn bin(&self, value: f32) -> usize {
        match self {
            Histogram::Integer { counts } => (value as usize).min(counts.len() - 1),
            Histogram::Float { counts, min, max } => {
                if *max > *min {
                    let scale = (counts.len() - 1) as f32 / (max - min);
                    (((value - min) * scale).round() as usize).min(counts.len() - 1)
                } else {
                    0
                }
            }
        }
    }

    /// The representative value of a bin.
    pub fn value(&self, bin: usize) -> f32 {
        match self {
            Histogram::Integer { .. } => bin as f32,
            Histogram::Float { counts, min, max } => {
                if counts.len() <= 1 || *max <= *min {
                    *min
                } else {
                    min + bin as f32 * (max - min) / (counts.len() - 1) as f32
                }
            }
        }
    }

    /// The bin index holding the resolved background level.
    pub fn background_bin(&self, background: f32) -> usize {
        self.bin(background)
    }
}

/// Summary statistics over a set of voxels (spec §3).
#[derive(Copy, Clone, PartialEq, Debug)]
pub struct Statistics {
    pub min: f32,
    pub max: f32,
    pub mean: f64,
    pub stddev: f64,
    pub sum: f64,
    pub count: u64,
}

impl Statistics {
    pub fn compute(image: &dyn ImageSource, flags: &[Flags], rule: InclusionRule) -> Self {
        let mut min = f32::INFINITY;
        let mut max = f32::NEG_INFINITY;
        let mut sum = 0.0f64;
        let mut count = 0u64;
        for i in 0..image.pixel_count() {
            if rule.include(flags[i]) {
                let v = image.value(i);
                min = min.min(v);
                max = max.max(v);
                sum += v as f64;
                count += 1;
            }
        }
        if count == 0 {
            // Empty histogram / no included voxels: all stats zero (spec §7).
            return Statistics { min: 0.0, max: 0.0, mean: 0.0, stddev: 0.0, sum: 0.0, count: 0 };
        }
        let mean = sum / count as f64;
        let stddev = if count < 2 {
            0.0
        } else {
            let mut acc = 0.0f64;
            for i in 0..image.pixel_count() {
                if rule.include(flags[i]) {
                    let d = image.value(i) as f64 - mean;
                    acc += d * d;
                }
            }
            (acc / (count as f64 - 1.0)).sqrt()
        };
        Statistics { min, max, mean, stddev, sum, count }
    }
}

/// The full image statistics record (spec §3).
#[derive(Copy, Clone, PartialEq, Debug)]
pub struct ImageStatistics {
    pub image_minimum: f32,
    pub inside: Statistics,
    pub outside: Statistics,
    pub background: f32,
    pub total_above_background: f64,
    pub total_above_image_minimum: f64,
}

/// Builds the exclusion-derived statistics an implementation needs before
/// a background threshold can be resolved: global min plus whole-image
/// ("inside") and outside-ROI statistics.
pub fn image_statistics(
    image: &dyn ImageSource,
    flags: &[Flags],
    background: f32,
) -> ImageStatistics {
    let image_minimum = {
        let mut m = f32::INFINITY;
        for i in 0..image.pixel_count() {
            m = m.min(image.value(i));
        }
        if m.is_finite() {
            m
        } else {
            0.0
        }
    };
    let inside = Statistics::compute(image, flags, InclusionRule::ExcludedIsZero);
    let outside = Statistics::compute(image, flags, InclusionRule::ExcludedIsNonZero);

    let mut total_above_background = 0.0f64;
    let mut total_above_image_minimum = 0.0f64;
    for i in 0..image.pixel_count() {
        if !flags[i].contains(Flags::EXCLUDED) {
            let v = image.value(i);
            total_above_background += (v - background).max(0.0) as f64;
            total_above_image_minimum += (v - image_minimum).max(0.0) as f64;
        }
    }

    ImageStatistics {
        image_minimum,
        inside,
        outside,
        background,
        total_above_background,
        total_above_image_minimum,
    }
}

/// Rasterizes a [`Roi`] and [`ExternalMask`] into `EXCLUDED` flags (C4).
/// Returns `true` if any voxel was excluded.
pub fn build_exclusion(
    image: &dyn ImageSource,
    roi: &Roi,
    mask: &ExternalMask,
    flags: &mut [Flags],
) -> bool {
    let dims = image.dims();
    let mut any = false;
    for z in 0..dims.depth() as i32 {
        for y in 0..dims.height() as i32 {
            for x in 0..dims.width() as i32 {
                let excluded = !roi.contains(x, y) || !mask.contains(x, y, z);
                if excluded {
                    let idx = dims.index(maxfind_geom::Voxel::new(x, y, z));
                    flags[idx].insert(Flags::EXCLUDED);
                    any = true;
                }
            }
        }
    }
    any
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::image::VoxelBuffer;

    #[test]
    fn integer_histogram_counts_values() {
        let image = VoxelBuffer::from_u8(3, 1, 1, &[1, 1, 5]).unwrap();
        let flags = vec![Flags::empty(); 3];
        let hist = Histogram::build(&image, &flags, InclusionRule::All);
        assert_eq!(hist.counts()[1], 2);
        assert_eq!(hist.counts()[5], 1);
    }

    #[test]
    fn zero_variance_stats() {
        let image = VoxelBuffer::from_u8(3, 1, 1, &[4, 4, 4]).unwrap();
        let flags = vec![Flags::empty(); 3];
        let stats = Statistics::compute(&image, &flags, InclusionRule::All);
        assert_eq!(stats.stddev, 0.0);
        assert_eq!(stats.mean, 4.0);
    }

    #[test]
    fn empty_histogram_is_all_zero() {
        let image = VoxelBuffer::from_u8(2, 1, 1, &[1, 2]).unwrap();
        let mut flags = vec![Flags::empty(); 2];
        for f in flags.iter_mut() {
            f.insert(Flags::EXCLUDED);
        }
        let stats = Statistics::compute(&image, &flags, InclusionRule::ExcludedIsZero);
        assert_eq!(stats.count, 0);
        assert_eq!(stats.min, 0.0);
        assert_eq!(stats.stddev, 0.0);
    }

    #[test]
    fn rectangle_roi_excludes_outside() {
        let image = VoxelBuffer::from_u8(3, 3, 1, &[0; 9]).unwrap();
        let roi = Roi::Rectangle { x: 1, y: 1, w: 1, h: 1 };
        let mut flags = vec![Flags::empty(); 9];
        let any = build_exclusion(&image, &roi, &ExternalMask::None, &mut flags);
        assert!(any);
        assert!(!flags[4].contains(Flags::EXCLUDED)); // (1,1) is index 4
        assert!(flags[0].contains(Flags::EXCLUDED));
    }
}
