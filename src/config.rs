//! The configuration surface (spec §6).

use crate::error::FindMaximaError;
use crate::external::{AutoThresholdStrategy, BlurProvider, ExternalMask, GaussianFitStrategy, Roi};

/// How the background threshold is resolved (spec §4.6).
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub enum BackgroundMethod {
    None,
    Absolute,
    AutoThreshold,
    Mean,
    StdDevAboveMean,
    MinRoi,
}

/// How a peak's search threshold `tau_p` is derived from its maximum and
/// the background (spec §4.6).
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub enum SearchMethod {
    AboveBackground,
    FractionOfPeakMinusBackground,
    HalfPeakValue,
}

/// How a peak's minimum prominence is derived (spec §4.6).
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub enum PeakHeightMethod {
    Absolute,
    Relative,
    RelativeAboveBackground,
}

/// Centroid-refinement strategy (spec §4.10).
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub enum CentreMethod {
    MaxValueSearch,
    MaxValueOriginal,
    CentreOfMassSearch,
    CentreOfMassOriginal,
    GaussianSearch,
    GaussianOriginal,
}

/// The sort key applied to the final peak list (spec §4.10).
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub enum SortKey {
    Intensity,
    IntensityAboveBackground,
    Count,
    MaxValue,
    AverageIntensity,
    SaddleHeight,
    CountAboveSaddle,
    IntensityAboveSaddle,
    AbsoluteHeight,
    RelativeHeight,
    Xyz,
    PeakId,
}

/// Mask-rasterization mode (spec §4.10).
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub enum MaskMode {
    AboveSaddle,
    FractionOfIntensity,
    FractionOfHeight,
    Thresholded,
}

/// Bitmask of recognised `options` flags (spec §6).
#[repr(transparent)]
#[derive(Copy, Clone, PartialEq, Eq, Default, Debug)]
pub struct Options(u8);

impl Options {
    pub const MINIMUM_ABOVE_SADDLE: Options = Options(1 << 0);
    pub const CONTIGUOUS_ABOVE_SADDLE: Options = Options(1 << 1);
    pub const REMOVE_EDGE_MAXIMA: Options = Options(1 << 2);
    pub const STATS_INSIDE: Options = Options(1 << 3);
    pub const STATS_OUTSIDE: Options = Options(1 << 4);

    pub const fn empty() -> Self {
        Options(0)
    }

    pub fn contains(&self, other: Options) -> bool {
        self.0 & other.0 == other.0
    }
}

impl core::ops::BitOr for Options {
    type Output = Options;

    fn bitor(self, rhs: Options) -> Options {
        Options(self.0 | rhs.0)
    }
}

/// Output mask-build flags (spec §6 `outputType`). Requesting no flags
/// means no labelled mask is produced.
#[repr(transparent)]
#[derive(Copy, Clone, PartialEq, Eq, Default, Debug)]
pub struct OutputType(u8);

impl OutputType {
    pub const SINGLE_POINTS: OutputType = OutputType(1 << 0);
    pub const IN_TOLERANCE: OutputType = OutputType(1 << 1);
    pub const SEGMENTED: OutputType = OutputType(1 << 2);
    pub const MARK_MAXIMA: OutputType = OutputType(1 << 3);
    pub const SHOW_BORDER: OutputType = OutputType(1 << 4);

    pub const fn empty() -> Self {
        OutputType(0)
    }

    pub fn contains(&self, other: OutputType) -> bool {
        self.0 & other.0 == other.0
    }

    pub fn any(&self) -> bool {
        self.0 != 0
    }
}

impl core::ops::BitOr for OutputType {
    type Output = OutputType;

    fn bitor(self, rhs: OutputType) -> OutputType {
        OutputType(self.0 | rhs.0)
    }
}

/// The full parameter surface for one `find_maxima` invocation.
///
/// Built with [`FindMaximaConfig::new`] plus the `with_*` builder methods
/// (teacher's builder-by-value style, see `Paint`), then validated by
/// [`FindMaximaConfig::validate`], which the pipeline calls before `Init`.
#[derive(Clone)]
pub struct FindMaximaConfig {
    pub background_method: BackgroundMethod,
    pub background_parameter: f32,
    pub auto_threshold_method: Option<String>,
    pub search_method: SearchMethod,
    pub search_parameter: f32,
    pub max_peaks: usize,
    pub min_size: u64,
    pub peak_method: PeakHeightMethod,
    pub peak_parameter: f32,
    pub output_type: OutputType,
    pub sort_index: SortKey,
    pub options: Options,
    pub blur: f32,
    pub centre_method: CentreMethod,
    pub centre_parameter: f32,
    pub fraction_parameter: f32,
    pub roi: Roi,
    pub mask: ExternalMask,
}

impl FindMaximaConfig {
    /// A configuration matching spec §8's "no merges occur" law:
    /// `backgroundMethod = NONE`, `searchMethod = ABOVE_BACKGROUND`,
    /// `minSize = 1`, `peakParameter = 0`.
    pub fn new() -> Self {
        FindMaximaConfig {
            background_method: BackgroundMethod::None,
            background_parameter: 0.0,
            auto_threshold_method: None,
            search_method: SearchMethod::AboveBackground,
            search_parameter: 0.0,
            max_peaks: 1 << 20,
            min_size: 1,
            peak_method: PeakHeightMethod::Absolute,
            peak_parameter: 0.0,
            output_type: OutputType::empty(),
            sort_index: SortKey::Intensity,
            options: Options::empty(),
            blur: 0.0,
            centre_method: CentreMethod::MaxValueSearch,
            centre_parameter: 3.0,
            fraction_parameter: 0.5,
            roi: Roi::None,
            mask: ExternalMask::None,
        }
    }

    pub fn with_background(mut self, method: BackgroundMethod, parameter: f32) -> Self {
        self.background_method = method;
        self.background_parameter = parameter;
        self
    }

    pub fn with_auto_threshold_method(mut self, name: impl Into<String>) -> Self {
        self.auto_threshold_method = Some(name.into());
        self
    }

    pub fn with_search(mut self, method: SearchMethod, parameter: f32) -> Self {
        self.search_method = method;
        self.search_parameter = parameter;
        self
    }

    pub fn with_peak_height(mut self, method: PeakHeightMethod, parameter: f32) -> Self {
        self.peak_method = method;
        self.peak_parameter = parameter;
        self
    }

    pub fn with_min_size(mut self, min_size: u64) -> Self {
        self.min_size = min_size;
        self
    }

    pub fn with_max_peaks(mut self, max_peaks: usize) -> Self {
        self.max_peaks = max_peaks;
        self
    }

    pub fn with_options(mut self, options: Options) -> Self {
        self.options = options;
        self
    }

    pub fn with_output_type(mut self, output_type: OutputType) -> Self {
        self.output_type = output_type;
        self
    }

    pub fn with_sort_index(mut self, sort_index: SortKey) -> Self {
        self.sort_index = sort_index;
        self
    }

    pub fn with_roi(mut self, roi: Roi) -> Self {
        self.roi = roi;
        self
    }

    pub fn with_mask(mut self, mask: ExternalMask) -> Self {
        self.mask = mask;
        self
    }

    pub fn with_blur(mut self, sigma: f32) -> Self {
        self.blur = sigma;
        self
    }

    pub fn with_centre(mut self, method: CentreMethod, parameter: f32) -> Self {
        self.centre_method = method;
        self.centre_parameter = parameter;
        self
    }

    /// Checks for mutually exclusive options, an unresolvable
    /// auto-threshold name, and mask/image dimension mismatches, returning
    /// `InvalidConfiguration` on the first problem found.
    pub fn validate(
        &self,
        registry: &[&dyn AutoThresholdStrategy],
        image_dims: (u32, u32, u32),
    ) -> Result<(), FindMaximaError> {
        if self.background_method == BackgroundMethod::AutoThreshold {
            let name = self.auto_threshold_method.as_deref().ok_or_else(|| {
                FindMaximaError::InvalidConfiguration(
                    "backgroundMethod = AUTO_THRESHOLD requires autoThresholdMethod".into(),
                )
            })?;
            if !registry.iter().any(|s| s.name() == name) {
                return Err(FindMaximaError::InvalidConfiguration(format!(
                    "unknown auto-threshold method '{}'",
                    name
                )));
            }
        }

        if self.max_peaks == 0 {
            return Err(FindMaximaError::InvalidConfiguration("maxPeaks must be > 0".into()));
        }

        let (w, h, d) = image_dims;
        match &self.mask {
            ExternalMask::Mask2D { w: mw, h: mh, .. } if (*mw, *mh) != (w, h) => {
                return Err(FindMaximaError::InvalidConfiguration(format!(
                    "2D mask dimensions {}x{} do not match image {}x{}",
                    mw, mh, w, h
                )));
            }
            ExternalMask::Mask3D { w: mw, h: mh, d: md, .. } if (*mw, *mh, *md) != (w, h, d) => {
                return Err(FindMaximaError::InvalidConfiguration(format!(
                    "3D mask dimensions {}x{}x{} do not match image {}x{}x{}",
                    mw, mh, md, w, h, d
                )));
            }
            _ => {}
        }

        Ok(())
    }
}

impl Default for FindMaximaConfig {
    fn default() -> Self {
        Self::new()
    }
}

/// Injected strategy table (spec §9: "passed in as an injected strategy
/// table rather than held in process-wide state").
pub struct Strategies<'a> {
    pub auto_threshold: &'a [&'a dyn AutoThresholdStrategy],
    pub gaussian_fit: Option<&'a dyn GaussianFitStrategy>,
    pub blur: Option<&'a dyn BlurProvider>,
}

impl<'a> Strategies<'a> {
    pub fn none() -> Self {
        Strategies { auto_threshold: &[], gaussian_fit: None, blur: None }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_zero_max_peaks() {
        let cfg = FindMaximaConfig::new().with_max_peaks(0);
        let err = cfg.validate(&[], (4, 4, 1)).unwrap_err();
        assert!(matches!(err, FindMaximaError::InvalidConfiguration(_)));
    }

    #[test]
    fn rejects_unknown_auto_threshold_name() {
        let cfg = FindMaximaConfig::new()
            .with_background(BackgroundMethod::AutoThreshold, 0.0)
            .with_auto_threshold_method("nonexistent");
        let err = cfg.validate(&[], (4, 4, 1)).unwrap_err();
        assert!(matches!(err, FindMaximaError::InvalidConfiguration(_)));
    }
}
