/*!
A watershed-with-merging peak finder for 2D and 3D greyscale images.

`maxfind` locates intensity maxima ("foci") in a scalar-per-voxel image,
grows a region around each one by steepest ascent, and merges regions that
are too small or too shallow a bump on a shared neighbour, following the
watershed-with-merging design used by ImageJ/GDSC's `FindMaxima`.

The crate does no image decoding, blurring, or auto-thresholding itself —
those are narrow [`external`] trait contracts the caller injects, so this
crate's only inputs are a voxel buffer and a configuration.

```
use maxfind::{find_maxima, FindMaximaConfig, Strategies, VoxelBuffer};

let image = VoxelBuffer::from_u8(3, 3, 1, &[1, 1, 1, 1, 5, 1, 1, 1, 1]).unwrap();
let result = find_maxima(
    &image,
    &FindMaximaConfig::new(),
    &Strategies::none(),
    &maxfind::never_interrupted,
)
.unwrap();
assert_eq!(result.peaks.len(), 1);
```
*/

#![warn(missing_copy_implementations)]
#![warn(missing_debug_implementations)]

mod analysis;
mod config;
mod error;
mod external;
mod flags;
mod flood;
mod histogram;
mod image;
mod maxima;
mod merge;
mod peak;
mod pipeline;
mod region_grow;
mod result;
mod saddle;
mod tolerance;

#[cfg(feature = "rayon-batch")]
mod batch;

pub use config::{
    BackgroundMethod, CentreMethod, FindMaximaConfig, MaskMode, Options, OutputType,
    PeakHeightMethod, SearchMethod, SortKey, Strategies,
};
pub use error::{FindMaximaError, Result};
pub use external::{AutoThresholdStrategy, BlurProvider, ExternalMask, GaussianFitStrategy, Roi};
pub use flags::Flags;
pub use histogram::{Histogram, ImageStatistics, InclusionRule, Statistics};
pub use image::{BitDepth, ImageSource, VoxelBuffer};
pub use peak::{BBox, PeakRecord, SaddleEntry, SaddleList};
pub use pipeline::{find_maxima, never_interrupted};
pub use region_grow::Contact;
pub use result::FindMaximaResult;

#[cfg(feature = "rayon-batch")]
pub use batch::find_maxima_batch;

pub use maxfind_geom::{Dims3, Voxel};
