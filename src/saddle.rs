//! Saddle-graph construction (C7).
//!
//! Folds the contact list `region_grow.rs` observed into each peak's
//! [`SaddleList`](crate::peak::SaddleList), then resolves the single
//! highest saddle per peak that `merge.rs` compares heights against.

use crate::peak::PeakRecord;
use crate::region_grow::Contact;

/// Folds `contacts` into every peak's saddle list and resolves
/// `highest_saddle_value`/`saddle_neighbor_id` (spec §4.7).
///
/// A peak with no recorded contact keeps the `NO_SADDLE_VALUE` sentinel
/// [`PeakRecord::new`] seeded it with.
pub fn build_saddle_graph(peaks: &mut [PeakRecord], contacts: &[Contact]) {
    for contact in contacts {
        let (a, b, value) = (contact.a, contact.b, contact.value);
        if a == b {
            continue;
        }
        peaks[a as usize - 1].saddles.update(b, value);
        peaks[b as usize - 1].saddles.update(a, value);
    }

    for peak in peaks.iter_mut() {
        peak.saddles.sort();
        if let Some(highest) = peak.saddles.highest() {
            peak.highest_saddle_value = highest.value;
            peak.saddle_neighbor_id = highest.neighbor_id;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use maxfind_geom::Voxel;

    #[test]
    fn contact_becomes_mutual_saddle() {
        let mut peaks = vec![
            PeakRecord::new(1, Voxel::new(0, 0, 0), 5.0, 0.0),
            PeakRecord::new(2, Voxel::new(4, 0, 0), 6.0, 0.0),
        ];
        build_saddle_graph(&mut peaks, &[Contact { a: 1, b: 2, value: 2.0 }]);

        assert_eq!(peaks[0].highest_saddle_value, 2.0);
        assert_eq!(peaks[0].saddle_neighbor_id, 2);
        assert_eq!(peaks[1].highest_saddle_value, 2.0);
        assert_eq!(peaks[1].saddle_neighbor_id, 1);
    }

    #[test]
    fn repeated_contact_keeps_the_maximum() {
        let mut peaks = vec![
            PeakRecord::new(1, Voxel::new(0, 0, 0), 5.0, 0.0),
            PeakRecord::new(2, Voxel::new(4, 0, 0), 6.0, 0.0),
        ];
        build_saddle_graph(
            &mut peaks,
            &[
                Contact { a: 1, b: 2, value: 2.0 },
                Contact { a: 1, b: 2, value: 3.5 },
            ],
        );
        assert_eq!(peaks[0].highest_saddle_value, 3.5);
    }

    #[test]
    fn peak_with_no_contact_keeps_sentinel() {
        let mut peaks = vec![PeakRecord::new(1, Voxel::new(0, 0, 0), 5.0, 0.0)];
        build_saddle_graph(&mut peaks, &[]);
        assert_eq!(peaks[0].saddle_neighbor_id, 0);
    }
}
