use crate::error::{MatrixError, Result};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// Dimension index -> value index.
pub type Coordinates = BTreeMap<usize, usize>;

/// Canonical address of a cell: value indices for dimensions `0..len`, no gaps.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CoordinateKey(Vec<usize>);

impl CoordinateKey {
    /// Build the key for a coordinate assignment.
    ///
    /// Walks dimensions from 0 upward and stops at the first missing one, so
    /// `{1: b}` yields no key at all rather than something that could match `"b,*"`.
    pub fn encode(coords: &Coordinates) -> Option<Self> {
        let values: Vec<usize> = (0..)
            .map_while(|dimension| coords.get(&dimension).copied())
            .collect();
        (!values.is_empty()).then_some(Self(values))
    }

    /// Parse a stored key. Only the canonical rendering is accepted.
    pub fn parse(raw: &str) -> Result<Self> {
        if raw.is_empty() {
            return Err(MatrixError::MalformedKey(raw.to_string()));
        }
        let values = raw
            .split(',')
            .map(|segment| {
                let canonical = !segment.is_empty()
                    && segment.bytes().all(|b| b.is_ascii_digit())
                    && (segment == "0" || !segment.starts_with('0'));
                if canonical {
                    segment.parse::<usize>().ok()
                } else {
                    None
                }
            })
            .collect::<Option<Vec<_>>>()
            .ok_or_else(|| MatrixError::MalformedKey(raw.to_string()))?;
        Ok(Self(values))
    }

    pub fn values(&self) -> &[usize] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for CoordinateKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (position, value) in self.0.iter().enumerate() {
            if position > 0 {
                f.write_str(",")?;
            }
            write!(f, "{value}")?;
        }
        Ok(())
    }
}

impl FromStr for CoordinateKey {
    type Err = MatrixError;

    fn from_str(raw: &str) -> Result<Self> {
        Self::parse(raw)
    }
}

/// Lenient per-position reading used by discovery.
///
/// Every segment counts toward the key length; segments that are negative
/// (the producer's `-1` "unset" sentinel) or not numeric yield `None`.
pub fn key_segments(raw: &str) -> Vec<Option<usize>> {
    raw.split(',')
        .map(|segment| {
            segment
                .trim()
                .parse::<i64>()
                .ok()
                .and_then(|value| usize::try_from(value).ok())
        })
        .collect()
}

/// Parse a dimension reference: `v3`, `V3` or plain `3`.
pub fn parse_dimension_ref(raw: &str) -> Result<usize> {
    let trimmed = raw.trim();
    let digits = trimmed
        .strip_prefix('v')
        .or_else(|| trimmed.strip_prefix('V'))
        .unwrap_or(trimmed);
    digits
        .parse::<usize>()
        .map_err(|_| MatrixError::unknown_dimension(raw))
}

/// `v{index}` label used in serialized coordinate maps.
pub fn dimension_key(index: usize) -> String {
    format!("v{index}")
}
