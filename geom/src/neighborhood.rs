use crate::{Dims3, Voxel};

/// One of the 26 directions from a voxel to a neighbour.
///
/// Ordering matches the layout used throughout `maxfind`: the 8 in-plane
/// neighbours of the centre voxel (anti-clockwise, beginning north), then
/// the 9 neighbours at `z-1` (centre last), then the 9 at `z+1` (centre
/// last).
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub struct Direction(pub(crate) u8);

impl Direction {
    /// The raw index into [`DIRECTIONS_26`], in `0..26`.
    #[inline]
    pub fn index(&self) -> usize {
        self.0 as usize
    }

    /// The `(dx, dy, dz)` offset for this direction.
    #[inline]
    pub fn offset(&self) -> (i32, i32, i32) {
        DIRECTIONS_26[self.index()]
    }

    /// `true` iff `|dx| + |dy| + |dz| == 1`: a face (6-connected) neighbour
    /// rather than an edge- or corner-touching one.
    #[inline]
    pub fn is_flat_edge(&self) -> bool {
        FLAT_EDGE[self.index()]
    }
}

const fn in_plane_offsets() -> [(i32, i32, i32); 8] {
    // Anti-clockwise starting at north: N, NW, W, SW, S, SE, E, NE.
    [
        (0, -1, 0),
        (-1, -1, 0),
        (-1, 0, 0),
        (-1, 1, 0),
        (0, 1, 0),
        (1, 1, 0),
        (1, 0, 0),
        (1, -1, 0),
    ]
}

/// The full 26-neighbour offset table.
pub static DIRECTIONS_26: [(i32, i32, i32); 26] = {
    let plane = in_plane_offsets();
    [
        plane[0], plane[1], plane[2], plane[3], plane[4], plane[5], plane[6], plane[7],
        (plane[0].0, plane[0].1, -1),
        (plane[1].0, plane[1].1, -1),
        (plane[2].0, plane[2].1, -1),
        (plane[3].0, plane[3].1, -1),
        (plane[4].0, plane[4].1, -1),
        (plane[5].0, plane[5].1, -1),
        (plane[6].0, plane[6].1, -1),
        (plane[7].0, plane[7].1, -1),
        (0, 0, -1),
        (plane[0].0, plane[0].1, 1),
        (plane[1].0, plane[1].1, 1),
        (plane[2].0, plane[2].1, 1),
        (plane[3].0, plane[3].1, 1),
        (plane[4].0, plane[4].1, 1),
        (plane[5].0, plane[5].1, 1),
        (plane[6].0, plane[6].1, 1),
        (plane[7].0, plane[7].1, 1),
        (0, 0, 1),
    ]
};

/// `true` at index `d` iff `DIRECTIONS_26[d]` is a face neighbour
/// (`|dx| + |dy| + |dz| == 1`).
pub static FLAT_EDGE: [bool; 26] = {
    let mut flags = [false; 26];
    let mut i = 0;
    while i < 26 {
        let (dx, dy, dz) = DIRECTIONS_26[i];
        let sum = dx.unsigned_abs() + dy.unsigned_abs() + dz.unsigned_abs();
        flags[i] = sum == 1;
        i += 1;
    }
    flags
};

/// The half (13-direction) offset table: one representative per antipodal
/// pair of [`DIRECTIONS_26`], used to enumerate adjacent-region pairs
/// exactly once.
pub static DIRECTIONS_13: [(i32, i32, i32); 13] = [
    DIRECTIONS_26[0],
    DIRECTIONS_26[1],
    DIRECTIONS_26[2],
    DIRECTIONS_26[3],
    DIRECTIONS_26[8],
    DIRECTIONS_26[9],
    DIRECTIONS_26[10],
    DIRECTIONS_26[11],
    DIRECTIONS_26[12],
    DIRECTIONS_26[13],
    DIRECTIONS_26[14],
    DIRECTIONS_26[15],
    DIRECTIONS_26[16],
];

/// Returns `true` when direction `d` stays within `dims` from `v`.
///
/// Callers should fast-path with [`Dims3::is_interior`] when `v` is known
/// to be strictly interior, since every direction is then trivially valid.
#[inline]
pub fn within(dims: &Dims3, v: Voxel, d: Direction) -> bool {
    let (dx, dy, dz) = d.offset();
    dims.contains(v.offset(dx, dy, dz))
}

/// Returns the neighbour voxel of `v` in direction `d`, if in bounds.
#[inline]
pub fn neighbor(dims: &Dims3, v: Voxel, d: Direction) -> Option<Voxel> {
    let (dx, dy, dz) = d.offset();
    let n = v.offset(dx, dy, dz);
    if dims.contains(n) {
        Some(n)
    } else {
        None
    }
}

/// Number of connectivity directions to consider for a given volume: 8 for
/// a 2D image (`dims.is_2d()`), 26 for a 3D one.
#[inline]
pub fn connectivity(dims: &Dims3) -> usize {
    if dims.is_2d() {
        8
    } else {
        26
    }
}

/// Iterates the in-bounds neighbours of `v`, restricted to [`connectivity`]
/// directions for `dims`.
pub fn for_each_neighbor(dims: &Dims3, v: Voxel, mut f: impl FnMut(Direction, Voxel)) {
    let n = connectivity(dims);
    if dims.is_interior(v) {
        for i in 0..n {
            let d = Direction(i as u8);
            let (dx, dy, dz) = d.offset();
            f(d, v.offset(dx, dy, dz));
        }
    } else {
        for i in 0..n {
            let d = Direction(i as u8);
            if let Some(nv) = neighbor(dims, v, d) {
                f(d, nv);
            }
        }
    }
}
