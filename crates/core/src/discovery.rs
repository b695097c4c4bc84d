use crate::key::{dimension_key, key_segments, parse_dimension_ref};
use matrix_protocol::MatrixPayload;
use std::collections::{BTreeMap, BTreeSet};

/// One varied parameter of the task, as discovered from the coordinate keys.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Dimension {
    /// Position in the coordinate key
    pub index: usize,

    /// Human-readable name from `variables_map`; `None` for anonymous dimensions
    pub name: Option<String>,

    /// Distinct value indices observed in the keys, ascending
    pub values: Vec<usize>,

    /// Display labels by value index, from `variables_map`
    pub labels: Vec<String>,
}

impl Dimension {
    /// `v{index}`
    pub fn key(&self) -> String {
        dimension_key(self.index)
    }

    pub fn is_named(&self) -> bool {
        self.name.is_some()
    }

    /// Name shown to the user; anonymous dimensions read `dimension {index}`.
    pub fn display_name(&self) -> String {
        match &self.name {
            Some(name) => name.clone(),
            None => format!("dimension {}", self.index),
        }
    }

    /// Label for a value index, falling back to the index itself.
    pub fn label(&self, value: usize) -> String {
        match self.labels.get(value) {
            Some(label) if !label.is_empty() => label.clone(),
            _ => value.to_string(),
        }
    }

    /// Smallest observed value, or `0` when nothing was observed.
    pub fn default_value(&self) -> usize {
        self.values.first().copied().unwrap_or(0)
    }

    /// Whether `value` may be used as a filter for this dimension.
    pub fn accepts(&self, value: usize) -> bool {
        self.values.binary_search(&value).is_ok()
    }

    /// Values laid out along an axis: observed indices plus every labelled index, ascending.
    pub fn axis_values(&self) -> Vec<usize> {
        let mut values: BTreeSet<usize> = self.values.iter().copied().collect();
        values.extend(0..self.labels.len());
        values.into_iter().collect()
    }
}

/// Name and value labels the producer supplied for a dimension.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NamedDimension {
    pub name: Option<String>,
    pub labels: Vec<String>,
}

pub type NamedDimensions = BTreeMap<usize, NamedDimension>;

/// Read `variables_map` into dimension-indexed names and labels.
pub fn named_dimensions(payload: &MatrixPayload) -> NamedDimensions {
    let mut named = NamedDimensions::new();
    for (raw_key, def) in payload.variables_map.iter().flatten() {
        match parse_dimension_ref(raw_key) {
            Ok(index) => {
                named.insert(
                    index,
                    NamedDimension {
                        name: def.display_name().map(str::to_string),
                        labels: def.labels(),
                    },
                );
            }
            Err(err) => log::warn!("Skipping variable definition: {err}"),
        }
    }
    named
}

/// Full discovery outcome, including payload diagnostics.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DiscoveryReport {
    pub dimensions: Vec<Dimension>,
    pub total_dimensions: usize,
    /// Keys disagreed on their segment count
    pub inconsistent_key_lengths: bool,
    /// Named dimensions that no key reaches
    pub unused_named: Vec<usize>,
}

impl DiscoveryReport {
    pub fn dimension(&self, index: usize) -> Option<&Dimension> {
        self.dimensions.get(index)
    }
}

/// Infer the dimension set from raw coordinate keys.
pub fn discover<'a, I>(raw_keys: I, named: &NamedDimensions) -> Vec<Dimension>
where
    I: IntoIterator<Item = &'a str>,
{
    analyze(raw_keys, named).dimensions
}

/// Same as [`discover`], keeping the diagnostics.
pub fn analyze<'a, I>(raw_keys: I, named: &NamedDimensions) -> DiscoveryReport
where
    I: IntoIterator<Item = &'a str>,
{
    let mut observed: Vec<BTreeSet<usize>> = Vec::new();
    let mut lengths: BTreeSet<usize> = BTreeSet::new();

    for raw in raw_keys {
        let segments = key_segments(raw);
        lengths.insert(segments.len());
        if observed.len() < segments.len() {
            observed.resize_with(segments.len(), BTreeSet::new);
        }
        for (position, value) in segments.into_iter().enumerate() {
            if let Some(value) = value {
                observed[position].insert(value);
            }
        }
    }

    let total_dimensions = observed.len();
    let inconsistent_key_lengths = lengths.len() > 1;
    if inconsistent_key_lengths {
        log::warn!(
            "Coordinate keys have inconsistent lengths {:?}; using {} dimensions",
            lengths,
            total_dimensions
        );
    }

    let unused_named: Vec<usize> = if total_dimensions == 0 {
        Vec::new()
    } else {
        named
            .keys()
            .copied()
            .filter(|index| *index >= total_dimensions)
            .collect()
    };
    if !unused_named.is_empty() {
        log::warn!(
            "Named dimensions {:?} do not appear in any coordinate key",
            unused_named
        );
    }

    let dimensions = observed
        .into_iter()
        .enumerate()
        .map(|(index, values)| {
            let supplied = named.get(&index).cloned().unwrap_or_default();
            Dimension {
                index,
                name: supplied.name,
                values: values.into_iter().collect(),
                labels: supplied.labels,
            }
        })
        .collect();

    DiscoveryReport {
        dimensions,
        total_dimensions,
        inconsistent_key_lengths,
        unused_named,
    }
}

/// Discover dimensions straight from a payload.
pub fn discover_payload(payload: &MatrixPayload) -> DiscoveryReport {
    let named = named_dimensions(payload);
    let keys = payload
        .coordinates_by_indices
        .iter()
        .flat_map(|entries| entries.keys().map(String::as_str));
    analyze(keys, &named)
}
