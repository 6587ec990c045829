//! Error kinds surfaced by the pipeline. See spec §7.

/// Failure modes of a `find_maxima` invocation.
///
/// None of these are logged-and-swallowed: every stage either completes or
/// returns one of these to the caller. `NoPeaks` is deliberately absent —
/// an image with no surviving peaks is not an error, it is an empty
/// `FindMaximaResult::peaks` with populated statistics.
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum FindMaximaError {
    /// The pixel format was not one of 8-bit, 16-bit or 32-bit float, or
    /// the image carried extra channels/frames the core cannot address as
    /// one scalar per voxel.
    #[error("unsupported image: {0}")]
    UnsupportedImage(String),

    /// Either the seed count reached the configured search capacity, or
    /// the final peak count exceeded 65535 while a labelled mask was
    /// requested.
    #[error("capacity exceeded: {0}")]
    CapacityExceeded(String),

    /// Mutually exclusive options, an unknown auto-threshold strategy
    /// name, or mismatched mask dimensions.
    #[error("invalid configuration: {0}")]
    InvalidConfiguration(String),

    /// Cooperative cancellation was observed; returned artefacts (if any)
    /// must be discarded by the caller.
    #[error("cancelled")]
    Cancelled,
}

/// Convenience alias used throughout the pipeline.
pub type Result<T> = core::result::Result<T, FindMaximaError>;
