//! Background, search-threshold and peak-height formulas (C4.6).
//!
//! These are pure functions over already-computed statistics; nothing
//! here touches the label map or flag buffer.
//!
//! [SUPPLEMENT] The reference implementation this spec distils exposes a
//! separate "noise" pre-pass that excludes sub-threshold voxels before
//! statistics are computed. Distilled spec.md folds that into
//! `BackgroundMethod::Absolute`, and this crate keeps that folding —
//! `background_parameter` already *is* the noise floor when
//! `BackgroundMethod::Absolute` is selected.

use crate::config::{BackgroundMethod, PeakHeightMethod, SearchMethod};
use crate::external::AutoThresholdStrategy;
use crate::histogram::{Histogram, Statistics};
use crate::image::BitDepth;

/// Resolves the background threshold for a region (spec §4.6).
pub fn resolve_background(
    method: BackgroundMethod,
    parameter: f32,
    region_stats: &Statistics,
    auto_threshold: Option<(&dyn AutoThresholdStrategy, &Histogram)>,
) -> f32 {
    match method {
        BackgroundMethod::Absolute => parameter.max(0.0),
        BackgroundMethod::AutoThreshold => {
            if let Some((strategy, histogram)) = auto_threshold {
                histogram.value(strategy.threshold(histogram.counts()))
            } else {
                0.0
            }
        }
        BackgroundMethod::Mean => region_stats.mean as f32,
        BackgroundMethod::StdDevAboveMean => {
            (region_stats.mean + parameter.max(0.0) as f64 * region_stats.stddev) as f32
        }
        BackgroundMethod::MinRoi => region_stats.min,
        BackgroundMethod::None => 0.0,
    }
}

/// Resolves a peak's search threshold `tau_p` (spec §4.6). Voxels of the
/// peak below this value are excluded after region growing.
pub fn search_threshold(method: SearchMethod, parameter: f32, background: f32, v_max: f32) -> f32 {
    match method {
        SearchMethod::AboveBackground => background,
        SearchMethod::FractionOfPeakMinusBackground => {
            background + parameter * (v_max - background)
        }
        SearchMethod::HalfPeakValue => background + 0.5 * (v_max - background),
    }
}

/// Resolves a peak's minimum prominence `h_p` (spec §4.6). Integer images
/// round to the nearest integer and clamp to at least 1.
pub fn peak_height(
    method: PeakHeightMethod,
    parameter: f32,
    v_max: f32,
    background: f32,
    bit_depth: BitDepth,
) -> f32 {
    let h = match method {
        PeakHeightMethod::Absolute => parameter,
        PeakHeightMethod::Relative => parameter * v_max,
        PeakHeightMethod::RelativeAboveBackground => parameter * (v_max - background),
    };
    if bit_depth.is_integer() {
        h.round().max(1.0)
    } else {
        h
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stats(min: f32, max: f32, mean: f64, stddev: f64) -> Statistics {
        Statistics { min, max, mean, stddev, sum: 0.0, count: 1 }
    }

    #[test]
    fn absolute_background_clamps_negative() {
        assert_eq!(resolve_background(BackgroundMethod::Absolute, -5.0, &stats(0.0, 0.0, 0.0, 0.0), None), 0.0);
    }

    #[test]
    fn std_dev_above_mean() {
        let v = resolve_background(
            BackgroundMethod::StdDevAboveMean,
            2.0,
            &stats(0.0, 10.0, 5.0, 1.5),
            None,
        );
        assert!((v - 8.0).abs() < 1e-5);
    }

    #[test]
    fn integer_peak_height_rounds_and_clamps() {
        let h = peak_height(PeakHeightMethod::Absolute, 0.2, 10.0, 0.0, BitDepth::U8);
        assert_eq!(h, 1.0);
    }

    #[test]
    fn float_peak_height_is_exact() {
        let h = peak_height(PeakHeightMethod::Absolute, 0.2, 10.0, 0.0, BitDepth::F32);
        assert!((h - 0.2).abs() < 1e-6);
    }

    #[test]
    fn half_peak_value_midpoint() {
        let v = search_threshold(SearchMethod::HalfPeakValue, 0.0, 2.0, 10.0);
        assert_eq!(v, 6.0);
    }
}
