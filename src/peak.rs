//! Peak and saddle records (spec §3).

use maxfind_geom::{Dims3, Voxel};

/// `NO_SADDLE_VALUE`: the highest-saddle sentinel for a peak with no
/// neighbour. `0` when background is non-negative, `-inf` otherwise, so
/// a peak's prominence (`v_max - peakBase`) is still well ordered.
#[inline]
pub fn no_saddle_value(background: f32) -> f32 {
    if background >= 0.0 {
        0.0
    } else {
        f32::NEG_INFINITY
    }
}

/// One entry in a peak's saddle list: the neighbour peak id and the
/// height at which the two regions meet.
#[derive(Copy, Clone, PartialEq, Debug)]
pub struct SaddleEntry {
    pub neighbor_id: u32,
    pub value: f32,
}

/// A peak's saddle list, kept sorted by `value` descending then
/// `neighbor_id` ascending, with duplicate neighbour ids collapsed to
/// their maximum value (spec §3).
#[derive(Clone, Debug, Default)]
pub struct SaddleList(Vec<SaddleEntry>);

impl SaddleList {
    pub fn new() -> Self {
        SaddleList(Vec::new())
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &SaddleEntry> {
        self.0.iter()
    }

    /// The highest saddle, if any (`list[0]` once sorted).
    pub fn highest(&self) -> Option<SaddleEntry> {
        self.0.first().copied()
    }

    /// Records a saddle to `neighbor_id` at `value`, keeping the maximum
    /// value seen for that neighbour. Does not re-sort; call [`Self::sort`]
    /// once all updates for a pass are in.
    pub fn update(&mut self, neighbor_id: u32, value: f32) {
        if let Some(entry) = self.0.iter_mut().find(|e| e.neighbor_id == neighbor_id) {
            if value > entry.value {
                entry.value = value;
            }
        } else {
            self.0.push(SaddleEntry { neighbor_id, value });
        }
    }

    /// Drops any entry referencing `neighbor_id`.
    pub fn remove_neighbor(&mut self, neighbor_id: u32) {
        self.0.retain(|e| e.neighbor_id != neighbor_id);
    }

    /// Sorts by `value` descending, then `neighbor_id` ascending.
    pub fn sort(&mut self) {
        self.0.sort_by(|a, b| {
            b.value
                .partial_cmp(&a.value)
                .unwrap_or(core::cmp::Ordering::Equal)
                .then(a.neighbor_id.cmp(&b.neighbor_id))
        });
    }

    /// Merges `other` into `self`, taking the max value for any neighbour
    /// id present in both, then re-sorts.
    pub fn merge_from(&mut self, other: &SaddleList) {
        for entry in other.iter() {
            self.update(entry.neighbor_id, entry.value);
        }
        self.sort();
    }

    /// Remaps every `neighbor_id` through `peak_id_map` (old id -> new id,
    /// `0` meaning removed). Entries mapping to `0` or to `self_id` are
    /// dropped (a merged-away neighbour, or a self-reference created by a
    /// merge), duplicates created by the remap are collapsed to their max.
    pub fn remap(&mut self, peak_id_map: &[u32], self_id: u32) {
        let mut remapped = SaddleList::new();
        for entry in self.0.drain(..) {
            let mapped = peak_id_map
                .get(entry.neighbor_id as usize)
                .copied()
                .unwrap_or(entry.neighbor_id);
            if mapped != 0 && mapped != self_id {
                remapped.update(mapped, entry.value);
            }
        }
        remapped.sort();
        *self = remapped;
    }
}

/// A peak's bounding box, half-open on the upper bound (`maxx` etc. are
/// one past the last included coordinate).
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub struct BBox {
    pub minx: i32,
    pub maxx: i32,
    pub miny: i32,
    pub maxy: i32,
    pub minz: i32,
    pub maxz: i32,
}

impl BBox {
    pub fn at(v: Voxel) -> Self {
        BBox { minx: v.x, maxx: v.x + 1, miny: v.y, maxy: v.y + 1, minz: v.z, maxz: v.z + 1 }
    }

    pub fn expand(&mut self, v: Voxel) {
        self.minx = self.minx.min(v.x);
        self.maxx = self.maxx.max(v.x + 1);
        self.miny = self.miny.min(v.y);
        self.maxy = self.maxy.max(v.y + 1);
        self.minz = self.minz.min(v.z);
        self.maxz = self.maxz.max(v.z + 1);
    }

    pub fn union(&mut self, other: &BBox) {
        self.minx = self.minx.min(other.minx);
        self.maxx = self.maxx.max(other.maxx);
        self.miny = self.miny.min(other.miny);
        self.maxy = self.maxy.max(other.maxy);
        self.minz = self.minz.min(other.minz);
        self.maxz = self.maxz.max(other.maxz);
    }

    /// `true` when the box touches any face of the volume (spec §8,
    /// `REMOVE_EDGE_MAXIMA`).
    pub fn touches_edge(&self, dims: &Dims3) -> bool {
        self.minx <= 0
            || self.miny <= 0
            || self.minz <= 0
            || self.maxx >= dims.width() as i32
            || self.maxy >= dims.height() as i32
            || self.maxz >= dims.depth() as i32
    }
}

/// One surviving (or in-progress) peak. See spec §3 for field semantics
/// and invariants.
#[derive(Clone, Debug)]
pub struct PeakRecord {
    pub id: u32,
    pub x: i32,
    pub y: i32,
    pub z: i32,
    pub max_value: f32,
    pub count: u64,
    pub total_intensity: f64,
    pub highest_saddle_value: f32,
    pub saddle_neighbor_id: u32,
    pub count_above_saddle: u64,
    pub intensity_above_saddle: f64,
    pub bbox: BBox,
    pub intensity_above_background: f64,
    pub intensity_above_image_minimum: f64,
    pub saddles: SaddleList,
    /// Replaces the source algorithm's `totalIntensity = -inf` removal
    /// sentinel (spec §9 names this as an explicit alternative). Dead
    /// peaks are filtered with `Vec::retain` instead of a sentinel scan.
    pub alive: bool,
}

impl PeakRecord {
    pub fn new(id: u32, seed: Voxel, value: f32, background: f32) -> Self {
        PeakRecord {
            id,
            x: seed.x,
            y: seed.y,
            z: seed.z,
            max_value: value,
            count: 0,
            total_intensity: 0.0,
            highest_saddle_value: no_saddle_value(background),
            saddle_neighbor_id: 0,
            count_above_saddle: 0,
            intensity_above_saddle: 0.0,
            bbox: BBox::at(seed),
            intensity_above_background: 0.0,
            intensity_above_image_minimum: 0.0,
            saddles: SaddleList::new(),
            alive: true,
        }
    }

    pub fn average_intensity(&self) -> f64 {
        if self.count == 0 {
            0.0
        } else {
            self.total_intensity / self.count as f64
        }
    }

    /// `v_max - peakBase`, where `peakBase` is the highest saddle if one
    /// exists, else `background`.
    pub fn prominence(&self, background: f32) -> f32 {
        let base = if self.saddles.is_empty() {
            background
        } else {
            self.highest_saddle_value
        };
        self.max_value - base
    }

    pub fn seed(&self) -> Voxel {
        Voxel::new(self.x, self.y, self.z)
    }
}
