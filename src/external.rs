//! External collaborator contracts (spec §6).
//!
//! These are the narrow interfaces the orchestrator drives; none of them
//! are implemented by this crate. The injection style mirrors the
//! teacher's `PaintSource`/`Shader` trait-object pattern rather than a
//! global strategy registry (spec §9).

use crate::image::VoxelBuffer;

/// A region of interest, tested per `(x, y)` and replicated through every
/// z-slice (spec §4.3).
#[derive(Clone)]
pub enum Roi {
    /// Nothing excluded; the fast path.
    None,
    /// An axis-aligned rectangle; the other fast path.
    Rectangle { x: i32, y: i32, w: u32, h: u32 },
    /// A rectangle with rounded corners, tested with a per-corner
    /// Euclidean distance check.
    RoundRectangle { x: i32, y: i32, w: u32, h: u32, arc_radius: f32 },
    /// An axis-aligned ellipse inscribed in `x, y, w, h`.
    Ellipse { x: i32, y: i32, w: u32, h: u32 },
    /// A freehand or otherwise arbitrary region, rasterized to a 2D mask.
    Mask { x: i32, y: i32, w: u32, h: u32, mask: Vec<bool> },
}

impl Roi {
    /// `true` for every variant except `None` (spec's `roi.is_area()`).
    pub fn is_area(&self) -> bool {
        !matches!(self, Roi::None)
    }

    /// `(x, y, w, h)` of the ROI's bounding box.
    pub fn bounds(&self) -> (i32, i32, u32, u32) {
        match self {
            Roi::None => (0, 0, 0, 0),
            Roi::Rectangle { x, y, w, h }
            | Roi::RoundRectangle { x, y, w, h, .. }
            | Roi::Ellipse { x, y, w, h }
            | Roi::Mask { x, y, w, h, .. } => (*x, *y, *w, *h),
        }
    }

    /// `true` if `(x, y)` lies within the ROI.
    pub fn contains(&self, px: i32, py: i32) -> bool {
        match self {
            Roi::None => true,
            Roi::Rectangle { x, y, w, h } => {
                px >= *x && py >= *y && px < x + *w as i32 && py < y + *h as i32
            }
            Roi::RoundRectangle { x, y, w, h, arc_radius } => {
                rect_contains(*x, *y, *w, *h, px, py)
                    && round_rect_contains(*x, *y, *w, *h, *arc_radius, px, py)
            }
            Roi::Ellipse { x, y, w, h } => ellipse_contains(*x, *y, *w, *h, px, py),
            Roi::Mask { x, y, w, h, mask } => {
                if !rect_contains(*x, *y, *w, *h, px, py) {
                    return false;
                }
                let lx = (px - x) as usize;
                let ly = (py - y) as usize;
                mask[ly * *w as usize + lx]
            }
        }
    }
}

fn rect_contains(x: i32, y: i32, w: u32, h: u32, px: i32, py: i32) -> bool {
    px >= x && py >= y && px < x + w as i32 && py < y + h as i32
}

fn ellipse_contains(x: i32, y: i32, w: u32, h: u32, px: i32, py: i32) -> bool {
    let rx = w as f32 / 2.0;
    let ry = h as f32 / 2.0;
    if rx <= 0.0 || ry <= 0.0 {
        return false;
    }
    let cx = x as f32 + rx;
    let cy = y as f32 + ry;
    let dx = (px as f32 + 0.5 - cx) / rx;
    let dy = (py as f32 + 0.5 - cy) / ry;
    dx * dx + dy * dy <= 1.0
}

fn round_rect_contains(x: i32, y: i32, w: u32, h: u32, arc: f32, px: i32, py: i32) -> bool {
    let arc = arc.max(0.0);
    let (right, bottom) = (x + w as i32, y + h as i32);
    let corner_x = if px < x + arc as i32 {
        x as f32 + arc
    } else if px >= right - arc as i32 {
        right as f32 - arc
    } else {
        return true;
    };
    let corner_y = if py < y + arc as i32 {
        y as f32 + arc
    } else if py >= bottom - arc as i32 {
        bottom as f32 - arc
    } else {
        return true;
    };
    let dx = px as f32 + 0.5 - corner_x;
    let dy = py as f32 + 0.5 - corner_y;
    dx * dx + dy * dy <= arc * arc
}

/// An external mask, combined with the ROI to build the exclusion set
/// (spec §4.3). A 2D mask is replicated across every z-slice; a 3D mask is
/// used slice-by-slice.
#[derive(Clone)]
pub enum ExternalMask {
    None,
    Mask2D { w: u32, h: u32, data: Vec<bool> },
    Mask3D { w: u32, h: u32, d: u32, data: Vec<bool> },
}

impl ExternalMask {
    pub fn contains(&self, x: i32, y: i32, z: i32) -> bool {
        match self {
            ExternalMask::None => true,
            ExternalMask::Mask2D { w, data, .. } => {
                data[y as usize * *w as usize + x as usize]
            }
            ExternalMask::Mask3D { w, h, data, .. } => {
                let plane = *w as usize * *h as usize;
                data[z as usize * plane + y as usize * *w as usize + x as usize]
            }
        }
    }
}

/// `blur(image, sigma) -> image`, pure, returns the original when
/// `sigma <= 0` (spec §6).
pub trait BlurProvider {
    fn blur(&self, image: &VoxelBuffer, sigma: f32) -> VoxelBuffer;
}

/// `threshold(histogram) -> bin_index` (spec §6). Implementations are
/// looked up by name from a caller-supplied registry rather than a
/// process-wide table (spec §9).
pub trait AutoThresholdStrategy {
    /// The name this strategy is registered under, validated against
    /// `autoThresholdMethod` at configuration time.
    fn name(&self) -> &str;

    /// Resolves a bin index from an integer-valued histogram.
    fn threshold(&self, histogram: &[u32]) -> usize;
}

/// `fit(projection, w, h) -> (cx, cy) | null` (spec §6). May be
/// permanently disabled, in which case `GAUSSIAN_*` centre methods fall
/// back to `MAX_VALUE`.
pub trait GaussianFitStrategy {
    fn fit(&self, projection: &[f32], w: usize, h: usize) -> Option<(f32, f32)>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rectangle_roi_excludes_outside() {
        let roi = Roi::Rectangle { x: 1, y: 1, w: 2, h: 2 };
        assert!(roi.contains(1, 1));
        assert!(roi.contains(2, 2));
        assert!(!roi.contains(3, 1));
        assert!(!roi.contains(0, 1));
    }

    #[test]
    fn ellipse_roi_excludes_corners() {
        let roi = Roi::Ellipse { x: 0, y: 0, w: 4, h: 4 };
        assert!(roi.contains(2, 2));
        assert!(!roi.contains(0, 0));
    }

    #[test]
    fn external_mask_3d_indexes_by_slice() {
        let mask = ExternalMask::Mask3D {
            w: 2,
            h: 2,
            d: 2,
            data: vec![true, false, false, true, false, false, false, false],
        };
        assert!(mask.contains(0, 0, 0));
        assert!(!mask.contains(1, 0, 0));
        assert!(mask.contains(1, 1, 0));
        assert!(!mask.contains(0, 0, 1));
    }
}
