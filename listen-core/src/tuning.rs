//! # Note Table Module
//!
//! Equal-tempered reference notes for the detector. The table covers five
//! octaves (C2 to C7, 61 keys) around A4 and is built once, then shared
//! read-only by every detection.
//!
//! ## Features
//! - Equal temperament frequency calculation around a reference pitch
//! - Note name lookups ("A4", "C#3")
//! - A lazily built process-wide table for the standard A4 = 440 Hz tuning

use once_cell::sync::Lazy;
use serde::Serialize;
use std::collections::BTreeMap;

/// Chromatic name cycle, starting at C.
const NOTE_NAMES: [&str; 12] = [
    "C", "C#", "D", "D#", "E", "F", "F#", "G", "G#", "A", "A#", "B",
];

/// Number of notes in the table (five octaves plus the closing C).
pub const TABLE_LEN: usize = 61;

/// Octave number of the lowest note in the table.
const LOWEST_OCTAVE: usize = 2;

/// Standard concert pitch.
pub const REFERENCE_FREQUENCY: f64 = 440.0;

/// Index of A4 in the table (semitones above C2).
pub const REFERENCE_INDEX: usize = 33;

/// Represents a single musical note with its name and frequency.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Note {
    /// Note name (e.g., "A4", "C#3")
    pub name: String,
    /// Frequency in Hz
    pub frequency: f64,
}

/// The standard table, computed on first use.
static STANDARD: Lazy<NoteTable> =
    Lazy::new(|| NoteTable::build(REFERENCE_FREQUENCY, REFERENCE_INDEX));

/// Immutable list of reference notes, strictly ascending by frequency.
#[derive(Debug, Clone)]
pub struct NoteTable {
    notes: Vec<Note>,
    by_name: BTreeMap<String, usize>,
}

impl NoteTable {
    /// Builds the 61-note table.
    ///
    /// `reference_index` is the position of the reference pitch in the
    /// table, so the note at index `i` sits `i - reference_index` semitones
    /// away from `reference_freq`:
    ///
    /// `f(i) = reference_freq * 2^((i - reference_index) / 12)`
    ///
    /// Names always start at C2 and cycle through the 12 pitch classes,
    /// moving up an octave every 12 entries.
    pub fn build(reference_freq: f64, reference_index: usize) -> Self {
        let notes: Vec<Note> = (0..TABLE_LEN)
            .map(|i| {
                let offset = i as f64 - reference_index as f64;
                let frequency = reference_freq * 2.0_f64.powf(offset / 12.0);
                let octave = LOWEST_OCTAVE + i / 12;
                let name = format!("{}{}", NOTE_NAMES[i % 12], octave);
                Note { name, frequency }
            })
            .collect();

        let by_name = notes
            .iter()
            .enumerate()
            .map(|(i, note)| (note.name.clone(), i))
            .collect();

        Self { notes, by_name }
    }

    /// The process-wide table tuned to A4 = 440 Hz.
    pub fn standard() -> &'static NoteTable {
        &STANDARD
    }

    /// Looks a note up by name, e.g. `"A4"`.
    pub fn find(&self, name: &str) -> Option<&Note> {
        self.by_name.get(name).map(|&i| &self.notes[i])
    }

    pub fn get(&self, index: usize) -> Option<&Note> {
        self.notes.get(index)
    }

    pub fn len(&self) -> usize {
        self.notes.len()
    }

    /// Always false; the table is never empty by construction.
    pub fn is_empty(&self) -> bool {
        self.notes.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Note> {
        self.notes.iter()
    }

    pub fn lowest(&self) -> &Note {
        &self.notes[0]
    }

    pub fn highest(&self) -> &Note {
        &self.notes[self.notes.len() - 1]
    }

    pub fn as_slice(&self) -> &[Note] {
        &self.notes
    }
}

impl Default for NoteTable {
    fn default() -> Self {
        Self::build(REFERENCE_FREQUENCY, REFERENCE_INDEX)
    }
}

impl<'a> IntoIterator for &'a NoteTable {
    type Item = &'a Note;
    type IntoIter = std::slice::Iter<'a, Note>;

    fn into_iter(self) -> Self::IntoIter {
        self.notes.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn table_is_strictly_ascending() {
        let table = NoteTable::standard();
        for pair in table.as_slice().windows(2) {
            assert!(pair[0].frequency < pair[1].frequency, "{:?}", pair);
        }
    }

    #[test]
    fn table_size_and_reference_point() {
        let table = NoteTable::standard();
        assert_eq!(table.len(), 61);

        let a4 = table.get(REFERENCE_INDEX).unwrap();
        assert_eq!(a4.name, "A4");
        assert!((a4.frequency - 440.0).abs() < 1e-6);
    }

    #[test]
    fn names_cycle_from_c2_to_c7() {
        let table = NoteTable::standard();
        assert_eq!(table.lowest().name, "C2");
        assert_eq!(table.highest().name, "C7");
        assert_eq!(table.get(1).unwrap().name, "C#2");
        assert_eq!(table.get(12).unwrap().name, "C3");
        assert_eq!(table.get(23).unwrap().name, "B3");
        assert_eq!(table.get(24).unwrap().name, "C4");

        assert!((table.lowest().frequency - 65.406).abs() < 1e-3);
        assert!((table.highest().frequency - 2093.005).abs() < 1e-3);
    }

    #[test]
    fn octaves_double_in_frequency() {
        let table = NoteTable::standard();
        for i in 0..(table.len() - 12) {
            let low = table.get(i).unwrap().frequency;
            let high = table.get(i + 12).unwrap().frequency;
            assert!((high / low - 2.0).abs() < 1e-12);
        }
    }

    #[test]
    fn lookup_by_name() {
        let table = NoteTable::standard();
        assert!((table.find("A3").unwrap().frequency - 220.0).abs() < 1e-9);
        assert!((table.find("C4").unwrap().frequency - 261.626).abs() < 1e-3);
        assert!(table.find("A1").is_none());
        assert!(table.find("Bb4").is_none());
    }

    #[test]
    fn custom_reference_shifts_every_note() {
        let table = NoteTable::build(442.0, REFERENCE_INDEX);
        let standard = NoteTable::standard();
        for (tuned, reference) in table.iter().zip(standard) {
            assert_eq!(tuned.name, reference.name);
            assert!((tuned.frequency / reference.frequency - 442.0 / 440.0).abs() < 1e-12);
        }
    }
}
