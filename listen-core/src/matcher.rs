//! Nearest-note classification against a [`NoteTable`].

use crate::tuning::{Note, NoteTable};

/// Finds the note in `table` whose frequency is closest to `freq`.
///
/// The scan is linear over every entry. Only a strictly smaller distance
/// replaces the current candidate, so when `freq` sits exactly halfway
/// between two notes the lower one wins.
pub fn nearest(freq: f64, table: &NoteTable) -> &Note {
    let mut notes = table.iter();
    // The table is never empty; fall back to its lowest note regardless.
    let Some(mut closest) = notes.next() else {
        return table.lowest();
    };
    let mut min_diff = (freq - closest.frequency).abs();

    for note in notes {
        let diff = (freq - note.frequency).abs();
        if diff < min_diff {
            min_diff = diff;
            closest = note;
        }
    }
    closest
}
