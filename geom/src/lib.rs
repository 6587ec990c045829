//! Voxel-grid geometry primitives shared by the `maxfind` peak finder.
//!
//! Provides the linear addressing scheme for a `W x H x D` voxel buffer,
//! the 26-connected (and half, 13-connected) neighbour offset tables, and
//! the in-bounds predicate used to avoid per-voxel bounds checks on the
//! interior of a volume.
//!
//! Note that all coordinates use `i32`, just like the rest of `maxfind`.

#![no_std]
#![warn(missing_docs)]
#![warn(missing_copy_implementations)]
#![warn(missing_debug_implementations)]
#![allow(clippy::too_many_arguments)]

extern crate alloc;

mod dims;
mod neighborhood;
mod voxel;

pub use dims::Dims3;
pub use neighborhood::{for_each_neighbor, Direction, DIRECTIONS_13, DIRECTIONS_26, FLAT_EDGE};
pub use voxel::Voxel;

/// An integer length that is guaranteed to be > 0.
type LengthU32 = core::num::NonZeroU32;
