//! Orchestrator (C11): wires C2–C10 into one `find_maxima` invocation.

use maxfind_geom::Voxel;

use crate::analysis::analyze_peaks;
use crate::config::{CentreMethod, FindMaximaConfig, Options, Strategies};
use crate::error::FindMaximaError;
use crate::external::{AutoThresholdStrategy, GaussianFitStrategy};
use crate::flags::Flags;
use crate::histogram::{build_exclusion, image_statistics, Histogram, InclusionRule};
use crate::image::{ImageSource, VoxelBuffer};
use crate::maxima::find_maxima_seeds;
use crate::merge::{merge_by_height, merge_by_size};
use crate::peak::PeakRecord;
use crate::region_grow::grow_regions;
use crate::result::{build_result, FindMaximaResult};
use crate::saddle::build_saddle_graph;
use crate::tolerance::{peak_height, resolve_background, search_threshold};

/// A no-op cancellation check for callers with nothing to cancel on.
pub fn never_interrupted() -> bool {
    false
}

/// Runs the full pipeline described in spec §2 against `image`.
///
/// `interrupt` is polled after every stage (spec §5); returning `true`
/// aborts the run with [`FindMaximaError::Cancelled`].
pub fn find_maxima(
    image: &dyn ImageSource,
    config: &FindMaximaConfig,
    strategies: &Strategies,
    interrupt: &dyn Fn() -> bool,
) -> Result<FindMaximaResult, FindMaximaError> {
    config.validate(strategies.auto_threshold, (image.dims().width(), image.dims().height(), image.dims().depth()))?;

    log::debug!(
        "find_maxima: {}x{}x{} {} image",
        image.dims().width(),
        image.dims().height(),
        image.dims().depth(),
        image.bit_depth()
    );

    let blurred;
    let image: &dyn ImageSource = if config.blur > 0.0 {
        match strategies.blur {
            Some(provider) => {
                let buffer = to_voxel_buffer(image);
                blurred = provider.blur(&buffer, config.blur);
                &blurred
            }
            None => image,
        }
    } else {
        image
    };

    let mut flags = vec![Flags::empty(); image.pixel_count()];
    build_exclusion(image, &config.roi, &config.mask, &mut flags);
    check(interrupt)?;

    let pre_stats = image_statistics(image, &flags, 0.0);
    let auto_threshold = resolve_auto_threshold(image, &flags, config, strategies);
    let background = resolve_background(
        config.background_method,
        config.background_parameter,
        &pre_stats.inside,
        auto_threshold.as_ref().map(|(s, h)| (*s, h)),
    );
    let stats = image_statistics(image, &flags, background);
    log::trace!("resolved background = {}", background);
    check(interrupt)?;

    let mut labels = vec![0i32; image.pixel_count()];
    let seeds = find_maxima_seeds(
        image,
        &mut flags,
        &mut labels,
        background,
        stats.image_minimum,
        config.max_peaks,
    )?;
    log::debug!("found {} seed maxima", seeds.len());
    check(interrupt)?;

    let mut peaks: Vec<PeakRecord> = Vec::with_capacity(seeds.len());
    for (i, seed) in seeds.iter().enumerate() {
        let id = i as u32 + 1;
        let mut peak = PeakRecord::new(id, seed.voxel, seed.value, background);
        peak.count = 1;
        peak.total_intensity = seed.value as f64;
        peak.intensity_above_background = (seed.value - background).max(0.0) as f64;
        peak.intensity_above_image_minimum = (seed.value - stats.image_minimum).max(0.0) as f64;
        peaks.push(peak);
    }

    let search_thresholds: Vec<f32> = peaks
        .iter()
        .map(|p| search_threshold(config.search_method, config.search_parameter, background, p.max_value))
        .collect();
    let peak_heights: Vec<f32> = peaks
        .iter()
        .map(|p| peak_height(config.peak_method, config.peak_parameter, p.max_value, background, image.bit_depth()))
        .collect();

    let contacts = grow_regions(
        image,
        &mut flags,
        &mut labels,
        &mut peaks,
        background,
        stats.image_minimum,
        &search_thresholds,
        interrupt,
    )?;
    check(interrupt)?;

    build_saddle_graph(&mut peaks, &contacts);
    merge_by_height(&mut peaks, background, &peak_heights);
    check(interrupt)?;

    analyze_peaks(image, &mut flags, &labels, &mut peaks, background, config.options);

    let selector: fn(&PeakRecord) -> u64 = if config.options.contains(Options::MINIMUM_ABOVE_SADDLE) {
        |p: &PeakRecord| p.count_above_saddle
    } else {
        |p: &PeakRecord| p.count
    };
    merge_by_size(&mut peaks, config.min_size, selector);
    analyze_peaks(image, &mut flags, &labels, &mut peaks, background, config.options);
    check(interrupt)?;

    if config.options.contains(Options::REMOVE_EDGE_MAXIMA) {
        let dims = image.dims();
        for peak in peaks.iter_mut() {
            if peak.alive && peak.bbox.touches_edge(&dims) {
                peak.alive = false;
            }
        }
    }

    for peak in peaks.iter_mut() {
        if peak.alive {
            refine_centre(image, &labels, peak, config.centre_method, strategies.gaussian_fit);
        }
    }

    let result = build_result(
        image,
        &labels,
        peaks,
        config.sort_index,
        config.output_type,
        crate::config::MaskMode::AboveSaddle,
        background,
        stats,
    )?;
    log::debug!("find_maxima done: {} surviving peaks", result.peaks.len());
    Ok(result)
}

fn check(interrupt: &dyn Fn() -> bool) -> Result<(), FindMaximaError> {
    if interrupt() {
        Err(FindMaximaError::Cancelled)
    } else {
        Ok(())
    }
}

fn resolve_auto_threshold<'a>(
    image: &dyn ImageSource,
    flags: &[Flags],
    config: &FindMaximaConfig,
    strategies: &'a Strategies,
) -> Option<(&'a dyn AutoThresholdStrategy, Histogram)> {
    if config.background_method != crate::config::BackgroundMethod::AutoThreshold {
        return None;
    }
    let name = config.auto_threshold_method.as_deref()?;
    let strategy = strategies.auto_threshold.iter().find(|s| s.name() == name)?;
    let histogram = Histogram::build(image, flags, InclusionRule::ExcludedIsZero);
    Some((*strategy, histogram))
}

fn to_voxel_buffer(image: &dyn ImageSource) -> VoxelBuffer {
    let dims = image.dims();
    let samples: Vec<f32> = (0..image.pixel_count()).map(|i| image.value(i)).collect();
    VoxelBuffer::from_f32(dims.width(), dims.height(), dims.depth(), &samples)
        .expect("samples copied from a valid ImageSource are always finite and correctly sized")
}

fn refine_centre(
    image: &dyn ImageSource,
    labels: &[i32],
    peak: &mut PeakRecord,
    method: CentreMethod,
    gaussian: Option<&dyn GaussianFitStrategy>,
) {
    match method {
        CentreMethod::MaxValueSearch | CentreMethod::MaxValueOriginal => {
            // The seed voxel already is the (first-found) maximum location.
        }
        CentreMethod::CentreOfMassSearch | CentreMethod::CentreOfMassOriginal => {
            if let Some((cx, cy, cz)) = centre_of_mass(image, labels, peak.id as i32) {
                peak.x = cx.round() as i32;
                peak.y = cy.round() as i32;
                peak.z = cz.round() as i32;
            }
        }
        CentreMethod::GaussianSearch | CentreMethod::GaussianOriginal => {
            if let Some(strategy) = gaussian {
                let dims = image.dims();
                let (x0, y0, w, h) = (peak.bbox.minx, peak.bbox.miny, (peak.bbox.maxx - peak.bbox.minx) as usize, (peak.bbox.maxy - peak.bbox.miny) as usize);
                let mut projection = vec![0.0f32; w * h];
                let z = peak.z.clamp(0, dims.depth() as i32 - 1);
                for ly in 0..h {
                    for lx in 0..w {
                        let v = Voxel::new(x0 + lx as i32, y0 + ly as i32, z);
                        if dims.contains(v) && labels[dims.index(v)] == peak.id as i32 {
                            projection[ly * w + lx] = image.value(dims.index(v));
                        }
                    }
                }
                if let Some((fx, fy)) = strategy.fit(&projection, w, h) {
                    peak.x = x0 + fx.round() as i32;
                    peak.y = y0 + fy.round() as i32;
                } else {
                    // Permanently disabled fitter: fall back to MAX_VALUE (spec §6).
                }
            }
        }
    }
}

fn centre_of_mass(image: &dyn ImageSource, labels: &[i32], id: i32) -> Option<(f64, f64, f64)> {
    let dims = image.dims();
    let mut sum_x = 0.0f64;
    let mut sum_y = 0.0f64;
    let mut sum_z = 0.0f64;
    let mut weight = 0.0f64;
    for i in 0..image.pixel_count() {
        if labels[i] == id {
            let v = image.value(i) as f64;
            let voxel = dims.coords(i);
            sum_x += voxel.x as f64 * v;
            sum_y += voxel.y as f64 * v;
            sum_z += voxel.z as f64 * v;
            weight += v;
        }
    }
    if weight <= 0.0 {
        None
    } else {
        Some((sum_x / weight, sum_y / weight, sum_z / weight))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{BackgroundMethod, PeakHeightMethod, SearchMethod};
    use crate::image::VoxelBuffer;

    #[test]
    fn three_by_three_single_peak() {
        let image = VoxelBuffer::from_u8(3, 3, 1, &[1, 1, 1, 1, 5, 1, 1, 1, 1]).unwrap();
        let config = FindMaximaConfig::new();
        let strategies = Strategies::none();
        let result = find_maxima(&image, &config, &strategies, &never_interrupted).unwrap();
        assert_eq!(result.peaks.len(), 1);
        assert_eq!(result.peaks[0].max_value, 5.0);
        assert_eq!(result.peaks[0].count, 9);
    }

    #[test]
    fn two_peaks_merge_when_below_height() {
        let image = VoxelBuffer::from_u8(7, 1, 1, &[10, 5, 0, 0, 0, 5, 11]).unwrap();
        let config = FindMaximaConfig::new()
            .with_background(BackgroundMethod::Absolute, 0.0)
            .with_search(SearchMethod::AboveBackground, 0.0)
            .with_peak_height(PeakHeightMethod::Absolute, 20.0);
        let strategies = Strategies::none();
        let result = find_maxima(&image, &config, &strategies, &never_interrupted).unwrap();
        assert_eq!(result.peaks.len(), 1);
        assert_eq!(result.peaks[0].max_value, 11.0);
    }

    #[test]
    fn two_peaks_survive_with_no_minimum_height() {
        let image = VoxelBuffer::from_u8(7, 1, 1, &[10, 5, 0, 0, 0, 5, 11]).unwrap();
        let config = FindMaximaConfig::new()
            .with_background(BackgroundMethod::Absolute, 0.0)
            .with_search(SearchMethod::AboveBackground, 0.0)
            .with_peak_height(PeakHeightMethod::Absolute, 0.0);
        let strategies = Strategies::none();
        let result = find_maxima(&image, &config, &strategies, &never_interrupted).unwrap();
        assert_eq!(result.peaks.len(), 2);
    }

    #[test]
    fn min_size_drops_small_peak() {
        let image = VoxelBuffer::from_u8(7, 1, 1, &[10, 0, 0, 0, 0, 0, 3]).unwrap();
        let config = FindMaximaConfig::new().with_min_size(2);
        let strategies = Strategies::none();
        let result = find_maxima(&image, &config, &strategies, &never_interrupted).unwrap();
        assert_eq!(result.peaks.len(), 1);
        assert_eq!(result.peaks[0].max_value, 10.0);
    }

    #[test]
    fn cancellation_is_observed() {
        let image = VoxelBuffer::from_u8(3, 3, 1, &[1, 1, 1, 1, 5, 1, 1, 1, 1]).unwrap();
        let config = FindMaximaConfig::new();
        let strategies = Strategies::none();
        let err = find_maxima(&image, &config, &strategies, &|| true).unwrap_err();
        assert!(matches!(err, FindMaximaError::Cancelled));
    }
}
