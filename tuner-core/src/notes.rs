//! # Note Lookup Module
//!
//! Maps a frequency to a note label through a table of ascending frequency
//! thresholds. A frequency gets the label of the greatest threshold not
//! exceeding it; frequencies below the first threshold are unrecognized.
//!
//! ## Table format
//! One header row, then `threshold<TAB or ,>label` per line:
//!
//! ```text
//! frequency,note
//! 427.47,A4
//! 452.89,A#4
//! ```

use once_cell::sync::Lazy;
use std::fs;
use std::path::Path;

use crate::error::{Result, TunerError};

/// Label shown when a frequency matches no table entry.
pub const UNKNOWN_NOTE: &str = "--";

/// A single threshold and the label it starts.
#[derive(Debug, Clone, PartialEq)]
pub struct NoteEntry {
    /// Lowest frequency in Hz that maps to `label`.
    pub threshold: f64,
    pub label: String,
}

/// Note entries sorted ascending by threshold.
#[derive(Debug, Clone, Default)]
pub struct NoteTable {
    entries: Vec<NoteEntry>,
}

/// Quarter-tone thresholds for a standard 88-key piano (A0 to C8), A4 = 440 Hz.
///
/// Each key starts a quarter tone below its equal-temperament frequency, so
/// a lookup returns the nearest key.
static EQUAL_TEMPERAMENT: Lazy<NoteTable> = Lazy::new(|| {
    const NOTE_NAMES: [&str; 12] = [
        "A", "A#", "B", "C", "C#", "D", "D#", "E", "F", "F#", "G", "G#",
    ];
    let quarter_tone_down = 2.0_f64.powf(-1.0 / 24.0);

    let entries = (0..88)
        .map(|i| {
            // A4 is key 48 counting from A0.
            let frequency = 440.0 * 2.0_f64.powf((i as f64 - 48.0) / 12.0);
            // The octave number changes at C.
            let octave = (i + 9) / 12;
            NoteEntry {
                threshold: frequency * quarter_tone_down,
                label: format!("{}{}", NOTE_NAMES[i % 12], octave),
            }
        })
        .collect();
    NoteTable { entries }
});

impl NoteTable {
    /// Builds a table, rejecting non-finite or descending thresholds.
    pub fn new(entries: Vec<NoteEntry>) -> Result<Self> {
        for (i, entry) in entries.iter().enumerate() {
            if !entry.threshold.is_finite() {
                return Err(TunerError::NoteTable {
                    line: i + 1,
                    message: format!("threshold {} is not finite", entry.threshold),
                });
            }
            if i > 0 && entry.threshold < entries[i - 1].threshold {
                return Err(TunerError::NoteTable {
                    line: i + 1,
                    message: "thresholds must be ascending".into(),
                });
            }
        }
        Ok(Self { entries })
    }

    /// Parses the two-column text format. The first line is a header and
    /// is skipped; blank lines are ignored. Error line numbers refer to the text.
    pub fn parse(text: &str) -> Result<Self> {
        let mut entries = Vec::new();
        let mut last_threshold = f64::NEG_INFINITY;

        for (index, raw) in text.lines().enumerate().skip(1) {
            let line_no = index + 1;
            let line = raw.trim();
            if line.is_empty() {
                continue;
            }

            let (threshold, label) = line
                .split_once('\t')
                .or_else(|| line.split_once(','))
                .ok_or_else(|| TunerError::NoteTable {
                    line: line_no,
                    message: "expected two tab- or comma-separated columns".into(),
                })?;

            let threshold: f64 = threshold.trim().parse().map_err(|_| TunerError::NoteTable {
                line: line_no,
                message: format!("invalid frequency {:?}", threshold.trim()),
            })?;
            if !threshold.is_finite() || threshold < last_threshold {
                return Err(TunerError::NoteTable {
                    line: line_no,
                    message: "thresholds must be finite and ascending".into(),
                });
            }
            last_threshold = threshold;

            let label = label.trim();
            if label.is_empty() {
                return Err(TunerError::NoteTable {
                    line: line_no,
                    message: "missing note label".into(),
                });
            }
            entries.push(NoteEntry {
                threshold,
                label: label.to_string(),
            });
        }

        Ok(Self { entries })
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let text = fs::read_to_string(path.as_ref())?;
        let table = Self::parse(&text)?;
        log::debug!(
            "Loaded {} notes from {}",
            table.len(),
            path.as_ref().display()
        );
        Ok(table)
    }

    /// The built-in 88-key equal-temperament table.
    pub fn equal_temperament() -> &'static NoteTable {
        &EQUAL_TEMPERAMENT
    }

    pub fn entries(&self) -> &[NoteEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Label of the greatest threshold `<= freq`, or `None` when `freq` is
    /// below every threshold (or NaN).
    pub fn lookup(&self, freq: f64) -> Option<&str> {
        let count = self.entries.partition_point(|e| e.threshold <= freq);
        count
            .checked_sub(1)
            .map(|i| self.entries[i].label.as_str())
    }

    /// Display label for an optional frequency; [`UNKNOWN_NOTE`] when there is
    /// no frequency or no matching entry.
    pub fn label_for(&self, freq: Option<f64>) -> &str {
        freq.and_then(|f| self.lookup(f)).unwrap_or(UNKNOWN_NOTE)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TABLE: &str = "frequency\tnote\n100\tLOW\n200.5\tMID\n\n400,HIGH\n";

    #[test]
    fn parses_mixed_delimiters() {
        let table = NoteTable::parse(TABLE).unwrap();
        assert_eq!(table.len(), 3);
        assert_eq!(table.entries()[1], NoteEntry { threshold: 200.5, label: "MID".into() });
        assert_eq!(table.entries()[2].label, "HIGH");
    }

    #[test]
    fn lookup_takes_greatest_threshold_not_above() {
        let table = NoteTable::parse(TABLE).unwrap();
        assert_eq!(table.lookup(99.9), None);
        assert_eq!(table.lookup(100.0), Some("LOW"));
        assert_eq!(table.lookup(200.4), Some("LOW"));
        assert_eq!(table.lookup(200.5), Some("MID"));
        assert_eq!(table.lookup(10_000.0), Some("HIGH"));
        assert_eq!(table.lookup(f64::NAN), None);
    }

    #[test]
    fn label_for_falls_back_to_unknown() {
        let table = NoteTable::parse(TABLE).unwrap();
        assert_eq!(table.label_for(None), UNKNOWN_NOTE);
        assert_eq!(table.label_for(Some(50.0)), UNKNOWN_NOTE);
        assert_eq!(table.label_for(Some(450.0)), "HIGH");
    }

    #[test]
    fn rejects_malformed_rows() {
        let err = NoteTable::parse("f\tn\n100\tA\n90\tB\n").unwrap_err();
        assert!(matches!(err, TunerError::NoteTable { line: 3, .. }));

        let err = NoteTable::parse("f\tn\nabc\tA\n").unwrap_err();
        assert!(matches!(err, TunerError::NoteTable { line: 2, .. }));

        let err = NoteTable::parse("f\tn\n100\n").unwrap_err();
        assert!(matches!(err, TunerError::NoteTable { line: 2, .. }));
    }

    #[test]
    fn new_rejects_descending_entries() {
        let entries = vec![
            NoteEntry { threshold: 2.0, label: "B".into() },
            NoteEntry { threshold: 1.0, label: "A".into() },
        ];
        assert!(NoteTable::new(entries).is_err());
    }

    #[test]
    fn equal_temperament_names_nearest_key() {
        let table = NoteTable::equal_temperament();
        assert_eq!(table.len(), 88);
        assert_eq!(table.lookup(440.0), Some("A4"));
        assert_eq!(table.lookup(441.43), Some("A4"));
        assert_eq!(table.lookup(261.63), Some("C4"));
        assert_eq!(table.lookup(27.5), Some("A0"));
        assert_eq!(table.lookup(20.0), None);
        assert_eq!(table.entries()[87].label, "C8");
    }
}
