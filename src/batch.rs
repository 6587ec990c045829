//! Multi-image fan-out (spec §5: "permitted to amortize ... over a worker
//! pool with a shared atomic progress counter"). Additive: `find_maxima`
//! itself has no dependency on this module or on `rayon`.

use std::sync::atomic::{AtomicUsize, Ordering};

use rayon::prelude::*;

use crate::config::{FindMaximaConfig, Strategies};
use crate::error::FindMaximaError;
use crate::image::ImageSource;
use crate::pipeline::find_maxima;
use crate::result::FindMaximaResult;

/// Runs `find_maxima` over every image in `images` on a `rayon` thread
/// pool, sharing one `config`/`strategies` and one cancellation flag across
/// the batch. `on_progress` is called once per completed image from
/// whichever worker finished it, with the running completed count.
pub fn find_maxima_batch<I: ImageSource + Sync>(
    images: &[I],
    config: &FindMaximaConfig,
    strategies: &Strategies,
    interrupt: &(dyn Fn() -> bool + Sync),
    on_progress: impl Fn(usize) + Sync,
) -> Vec<Result<FindMaximaResult, FindMaximaError>> {
    let completed = AtomicUsize::new(0);
    images
        .par_iter()
        .map(|image| {
            let result = find_maxima(image, config, strategies, interrupt);
            on_progress(completed.fetch_add(1, Ordering::Relaxed) + 1);
            result
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::image::VoxelBuffer;
    use crate::pipeline::never_interrupted;
    use std::sync::atomic::AtomicUsize;

    #[test]
    fn runs_every_image_and_reports_progress() {
        let images = vec![
            VoxelBuffer::from_u8(3, 3, 1, &[1, 1, 1, 1, 5, 1, 1, 1, 1]).unwrap(),
            VoxelBuffer::from_u8(3, 3, 1, &[0, 0, 0, 0, 9, 0, 0, 0, 0]).unwrap(),
        ];
        let config = FindMaximaConfig::new();
        let strategies = Strategies::none();
        let progress_count = AtomicUsize::new(0);

        let results = find_maxima_batch(&images, &config, &strategies, &never_interrupted, |_| {
            progress_count.fetch_add(1, Ordering::Relaxed);
        });

        assert_eq!(results.len(), 2);
        assert!(results.iter().all(|r| r.is_ok()));
        assert_eq!(progress_count.load(Ordering::Relaxed), 2);
    }
}
