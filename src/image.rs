//! The "one scalar per voxel" image source contract (spec §6).
//!
//! Mirrors `Pixmap`'s shape — an owned buffer plus its dimensions, with
//! `Option`-returning constructors that enforce the crate's invariants up
//! front instead of panicking deep inside the pipeline.

use maxfind_geom::Dims3;

use crate::error::FindMaximaError;

/// The three pixel formats the core can address as one scalar per voxel.
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub enum BitDepth {
    U8,
    U16,
    F32,
}

impl BitDepth {
    /// `true` for the two integer formats, where tolerances and
    /// thresholds round to the nearest integer (spec §4.6).
    #[inline]
    pub fn is_integer(&self) -> bool {
        !matches!(self, BitDepth::F32)
    }

    /// Number of histogram bins for the integer formats (`2^bitDepth`).
    /// Not meaningful for `F32`.
    #[inline]
    pub fn histogram_bins(&self) -> usize {
        match self {
            BitDepth::U8 => 1 << 8,
            BitDepth::U16 => 1 << 16,
            BitDepth::F32 => 0,
        }
    }

    #[inline]
    fn label(&self) -> &'static str {
        match self {
            BitDepth::U8 => "8-bit",
            BitDepth::U16 => "16-bit",
            BitDepth::F32 => "float32",
        }
    }
}

/// The image-source contract the pipeline drives (spec §6).
///
/// Implemented by [`VoxelBuffer`]; callers with their own stack/ROI/mask
/// container may implement it directly instead of copying into a
/// `VoxelBuffer`.
pub trait ImageSource {
    /// The voxel grid dimensions.
    fn dims(&self) -> Dims3;

    /// The pixel format, which chooses the histogram strategy (C2).
    fn bit_depth(&self) -> BitDepth;

    /// The scalar value of voxel `index` (`0 <= index < pixel_count()`).
    fn value(&self, index: usize) -> f32;

    /// `W * H * D`.
    #[inline]
    fn pixel_count(&self) -> usize {
        self.dims().voxel_count()
    }
}

/// An owned voxel buffer: one `f32` scalar per voxel plus the bit depth it
/// was ingested at.
///
/// Values are stored as `f32` regardless of source format so every later
/// stage shares one arithmetic path; `bit_depth` records which rounding and
/// histogram-binning rules apply.
#[derive(Clone, Debug)]
pub struct VoxelBuffer {
    data: Vec<f32>,
    dims: Dims3,
    bit_depth: BitDepth,
}

impl VoxelBuffer {
    /// Builds a buffer from 8-bit samples in `(x, y, z)` z-major order.
    pub fn from_u8(width: u32, height: u32, depth: u32, data: &[u8]) -> Result<Self, FindMaximaError> {
        let dims = Self::checked_dims(width, height, depth, data.len())?;
        Ok(VoxelBuffer {
            data: data.iter().map(|&v| v as f32).collect(),
            dims,
            bit_depth: BitDepth::U8,
        })
    }

    /// Builds a buffer from 16-bit samples in `(x, y, z)` z-major order.
    pub fn from_u16(width: u32, height: u32, depth: u32, data: &[u16]) -> Result<Self, FindMaximaError> {
        let dims = Self::checked_dims(width, height, depth, data.len())?;
        Ok(VoxelBuffer {
            data: data.iter().map(|&v| v as f32).collect(),
            dims,
            bit_depth: BitDepth::U16,
        })
    }

    /// Builds a buffer from single-precision float samples in `(x, y, z)`
    /// z-major order. Every sample must be finite.
    pub fn from_f32(width: u32, height: u32, depth: u32, data: &[f32]) -> Result<Self, FindMaximaError> {
        let dims = Self::checked_dims(width, height, depth, data.len())?;
        if data.iter().any(|v| !v.is_finite()) {
            return Err(FindMaximaError::UnsupportedImage(
                "float image contains NaN or infinite samples".into(),
            ));
        }
        Ok(VoxelBuffer { data: data.to_vec(), dims, bit_depth: BitDepth::F32 })
    }

    fn checked_dims(width: u32, height: u32, depth: u32, len: usize) -> Result<Dims3, FindMaximaError> {
        let dims = Dims3::new(width, height, depth).ok_or_else(|| {
            FindMaximaError::UnsupportedImage(format!(
                "invalid dimensions {}x{}x{}",
                width, height, depth
            ))
        })?;
        if dims.voxel_count() != len {
            return Err(FindMaximaError::UnsupportedImage(format!(
                "sample count {} does not match {}x{}x{} ({})",
                len,
                width,
                height,
                depth,
                dims.voxel_count()
            )));
        }
        Ok(dims)
    }

    /// The global minimum sample value.
    pub fn global_min(&self) -> f32 {
        self.data.iter().copied().fold(f32::INFINITY, f32::min)
    }

    /// The global maximum sample value.
    pub fn global_max(&self) -> f32 {
        self.data.iter().copied().fold(f32::NEG_INFINITY, f32::max)
    }

    /// Borrows the raw `f32` samples.
    pub fn samples(&self) -> &[f32] {
        &self.data
    }
}

impl ImageSource for VoxelBuffer {
    #[inline]
    fn dims(&self) -> Dims3 {
        self.dims
    }

    #[inline]
    fn bit_depth(&self) -> BitDepth {
        self.bit_depth
    }

    #[inline]
    fn value(&self, index: usize) -> f32 {
        self.data[index]
    }
}

impl core::fmt::Display for BitDepth {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.label())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_mismatched_sample_count() {
        let err = VoxelBuffer::from_u8(2, 2, 1, &[1, 2, 3]).unwrap_err();
        assert!(matches!(err, FindMaximaError::UnsupportedImage(_)));
    }

    #[test]
    fn rejects_non_finite_floats() {
        let err = VoxelBuffer::from_f32(1, 1, 1, &[f32::NAN]).unwrap_err();
        assert!(matches!(err, FindMaximaError::UnsupportedImage(_)));
    }

    #[test]
    fn u8_roundtrip() {
        let buf = VoxelBuffer::from_u8(2, 2, 1, &[1, 2, 3, 4]).unwrap();
        assert_eq!(buf.value(0), 1.0);
        assert_eq!(buf.value(3), 4.0);
        assert_eq!(buf.global_min(), 1.0);
        assert_eq!(buf.global_max(), 4.0);
        assert_eq!(buf.bit_depth(), BitDepth::U8);
    }
}
