use crate::cell::{CellResult, ERROR_MARKER};
use crate::key::{CoordinateKey, Coordinates};
use matrix_protocol::{CellEntry, MatrixPayload};
use std::collections::HashMap;

static ABSENT: CellResult = CellResult::Absent;

/// Immutable snapshot of the sparse key -> cell map for one payload.
///
/// Keys are parsed and cells resolved once at construction; lookups are a
/// single hash probe. Safe to share between concurrent readers.
#[derive(Debug, Clone, Default)]
pub struct CoordinateSpace {
    cells: HashMap<CoordinateKey, CellResult>,
    raw_keys: Vec<String>,
    malformed_keys: usize,
    unrecognized_values: usize,
}

impl CoordinateSpace {
    pub fn from_payload(payload: &MatrixPayload) -> Self {
        Self::from_payload_with_marker(payload, ERROR_MARKER)
    }

    pub fn from_payload_with_marker(payload: &MatrixPayload, error_marker: &str) -> Self {
        match payload.coordinates_by_indices.as_ref() {
            Some(entries) => Self::from_entries(entries, error_marker),
            None => Self::default(),
        }
    }

    pub fn from_entries<'a, I>(entries: I, error_marker: &str) -> Self
    where
        I: IntoIterator<Item = (&'a String, &'a CellEntry)>,
    {
        let mut space = Self::default();
        for (raw_key, entry) in entries {
            space.raw_keys.push(raw_key.clone());
            let key = match CoordinateKey::parse(raw_key) {
                Ok(key) => key,
                Err(err) => {
                    log::debug!("{err}; cell is unreachable");
                    space.malformed_keys += 1;
                    continue;
                }
            };
            if matches!(entry, CellEntry::Unrecognized(_)) {
                log::debug!("Unrecognized cell value at {raw_key:?}");
                space.unrecognized_values += 1;
            }
            let cell = CellResult::resolve(entry, error_marker);
            if !matches!(cell, CellResult::Absent) {
                space.cells.insert(key, cell);
            }
        }
        space
    }

    /// Resolve the cell for a coordinate assignment.
    ///
    /// The key is the contiguous prefix of `coords` starting at dimension 0;
    /// an empty prefix or an unknown key is [`CellResult::Absent`].
    pub fn lookup(&self, coords: &Coordinates) -> &CellResult {
        CoordinateKey::encode(coords).map_or(&ABSENT, |key| self.get(&key))
    }

    pub fn get(&self, key: &CoordinateKey) -> &CellResult {
        self.cells.get(key).unwrap_or(&ABSENT)
    }

    /// Every key present in the payload, including unreachable ones.
    pub fn raw_keys(&self) -> impl Iterator<Item = &str> {
        self.raw_keys.iter().map(String::as_str)
    }

    pub fn cells(&self) -> impl Iterator<Item = (&CoordinateKey, &CellResult)> {
        self.cells.iter()
    }

    /// Number of keys in the payload.
    pub fn len(&self) -> usize {
        self.raw_keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.raw_keys.is_empty()
    }

    pub fn malformed_keys(&self) -> usize {
        self.malformed_keys
    }

    /// Well-formed keys whose stored value had an unknown shape.
    pub fn unrecognized_values(&self) -> usize {
        self.unrecognized_values
    }
}
