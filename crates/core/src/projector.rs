use crate::cell::CellResult;
use crate::config::ProjectorConfig;
use crate::discovery::Dimension;
use crate::error::{MatrixError, Result};
use crate::key::Coordinates;
use crate::space::CoordinateSpace;
use crate::table::{DisplayCell, DisplayRow, DisplayTable, EmptyReason};
use matrix_protocol::ROW_FIELDS;
use std::collections::HashMap;

/// Dimensions chosen as display axes. X and Y never name the same dimension.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct AxisSelection {
    x: Option<usize>,
    y: Option<usize>,
}

impl AxisSelection {
    pub fn new(x: Option<usize>, y: Option<usize>) -> Result<Self> {
        match (x, y) {
            (Some(a), Some(b)) if a == b => Err(MatrixError::DuplicateAxis { dimension: a }),
            _ => Ok(Self { x, y }),
        }
    }

    pub fn none() -> Self {
        Self::default()
    }

    pub fn x(&self) -> Option<usize> {
        self.x
    }

    pub fn y(&self) -> Option<usize> {
        self.y
    }

    pub fn is_empty(&self) -> bool {
        self.x.is_none() && self.y.is_none()
    }

    pub fn is_axis(&self, dimension: usize) -> bool {
        self.x == Some(dimension) || self.y == Some(dimension)
    }

    /// Same axes with X and Y exchanged.
    #[must_use]
    pub fn swapped(self) -> Self {
        Self {
            x: self.y,
            y: self.x,
        }
    }

    /// Initial axes for a freshly loaded payload.
    ///
    /// The first two named dimensions become X and Y; a single named dimension
    /// is X only. Anonymous dimensions are picked only when nothing is named.
    pub fn default_for(dimensions: &[Dimension]) -> Self {
        let named: Vec<usize> = dimensions
            .iter()
            .filter(|d| d.is_named())
            .map(|d| d.index)
            .collect();
        let picks = if named.is_empty() {
            dimensions.iter().map(|d| d.index).collect::<Vec<_>>()
        } else {
            named
        };
        let mut picks = picks.into_iter();
        Self {
            x: picks.next(),
            y: picks.next(),
        }
    }
}

/// Fixed value for a non-axis dimension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DimensionFilter {
    pub dimension: usize,
    pub value: usize,
}

impl DimensionFilter {
    pub fn new(dimension: usize, value: usize) -> Self {
        Self { dimension, value }
    }
}

/// Smallest observed value for every non-axis dimension.
///
/// Callers re-run this whenever the axes change; previous choices are not carried over.
pub fn default_filters(dimensions: &[Dimension], axes: AxisSelection) -> Vec<DimensionFilter> {
    dimensions
        .iter()
        .filter(|d| !axes.is_axis(d.index))
        .map(|d| DimensionFilter::new(d.index, d.default_value()))
        .collect()
}

/// Merge caller filters with defaults into a complete assignment for the non-axis dimensions.
///
/// Filters on axis dimensions or unknown dimensions are ignored; a value the
/// dimension never produced falls back to its default.
pub fn resolve_filters(
    dimensions: &[Dimension],
    axes: AxisSelection,
    filters: &[DimensionFilter],
) -> Coordinates {
    let requested: HashMap<usize, usize> = filters
        .iter()
        .map(|filter| (filter.dimension, filter.value))
        .collect();

    dimensions
        .iter()
        .filter(|d| !axes.is_axis(d.index))
        .map(|d| {
            let value = match requested.get(&d.index) {
                Some(&value) if d.accepts(value) => value,
                Some(&value) => {
                    log::debug!(
                        "Filter {}={} was never observed; using {}",
                        d.key(),
                        value,
                        d.default_value()
                    );
                    d.default_value()
                }
                None => d.default_value(),
            };
            (d.index, value)
        })
        .collect()
}

/// Projects a [`CoordinateSpace`] onto one or two axes.
///
/// Every call is a full recomputation; the projector holds no state between calls.
pub struct AxisProjector<'a> {
    space: &'a CoordinateSpace,
    dimensions: &'a [Dimension],
    config: ProjectorConfig,
}

struct Axis<'d> {
    dimension: &'d Dimension,
    values: Vec<usize>,
    labels: Vec<String>,
}

impl<'d> Axis<'d> {
    fn new(dimension: &'d Dimension) -> Self {
        let values = dimension.axis_values();
        let labels = unique_labels(dimension, &values);
        Self {
            dimension,
            values,
            labels,
        }
    }
}

impl<'a> AxisProjector<'a> {
    pub fn new(space: &'a CoordinateSpace, dimensions: &'a [Dimension]) -> Self {
        Self {
            space,
            dimensions,
            config: ProjectorConfig::default(),
        }
    }

    #[must_use]
    pub fn with_config(mut self, config: ProjectorConfig) -> Self {
        self.config = config;
        self
    }

    pub fn config(&self) -> &ProjectorConfig {
        &self.config
    }

    fn dimension(&self, index: Option<usize>) -> Option<&'a Dimension> {
        let index = index?;
        let found = self.dimensions.iter().find(|d| d.index == index);
        if found.is_none() {
            log::debug!("Axis v{index} is not a known dimension; treating it as unset");
        }
        found
    }

    /// Build the display table for `axes`, holding other dimensions at `filters`.
    pub fn project(&self, axes: AxisSelection, filters: &[DimensionFilter]) -> DisplayTable {
        if self.dimensions.is_empty() {
            return DisplayTable::empty(EmptyReason::NoDimensions);
        }

        let x_axis = self.dimension(axes.x()).map(Axis::new);
        let y_axis = self.dimension(axes.y()).map(Axis::new);
        if x_axis.is_none() && y_axis.is_none() {
            return DisplayTable::empty(EmptyReason::NoAxisSelected);
        }

        let effective = AxisSelection {
            x: x_axis.as_ref().map(|axis| axis.dimension.index),
            y: y_axis.as_ref().map(|axis| axis.dimension.index),
        };
        let base = resolve_filters(self.dimensions, effective, filters);

        let columns: Vec<String> = match &x_axis {
            Some(axis) => axis.labels.clone(),
            None => vec![self.config.column_placeholder.clone()],
        };

        // (row key, title, y value index)
        let row_specs: Vec<(String, String, Option<usize>)> = match &y_axis {
            Some(axis) => axis
                .values
                .iter()
                .zip(&axis.labels)
                .map(|(value, label)| (format!("row-{value}"), label.clone(), Some(*value)))
                .collect(),
            None => vec![(
                "single-row".to_string(),
                self.config.row_placeholder.clone(),
                None,
            )],
        };

        let rows: Vec<DisplayRow> = row_specs
            .into_iter()
            .map(|(key, title, y_value)| {
                let y = y_axis
                    .as_ref()
                    .zip(y_value)
                    .map(|(axis, value)| (axis.dimension.index, value, title.as_str()));
                let cells = match &x_axis {
                    Some(axis) => axis
                        .values
                        .iter()
                        .zip(&axis.labels)
                        .map(|(value, label)| {
                            let x = (axis.dimension.index, *value, label.as_str());
                            self.cell(&base, Some(x), y)
                        })
                        .collect(),
                    None => vec![self.cell(&base, None, y)],
                };
                DisplayRow { key, title, cells }
            })
            .collect();

        let mut table = DisplayTable {
            x_axis: effective.x,
            y_axis: effective.y,
            columns,
            rows,
            empty_reason: None,
        };
        let has_data = table
            .cells()
            .any(|cell| !matches!(cell.result, CellResult::Absent));
        if !has_data {
            table.empty_reason = Some(EmptyReason::NoMatchingCells);
        }

        log::debug!(
            "Projected {} rows x {} columns (x={:?}, y={:?}, keys={}, valid={}, errors={})",
            table.rows.len(),
            table.columns.len(),
            table.x_axis,
            table.y_axis,
            self.space.len(),
            table.valid_cells(),
            table.error_cells()
        );
        table
    }

    fn cell(
        &self,
        base: &Coordinates,
        x: Option<(usize, usize, &str)>,
        y: Option<(usize, usize, &str)>,
    ) -> DisplayCell {
        let mut coordinates = base.clone();
        for (dimension, value, _) in x.iter().chain(y.iter()) {
            coordinates.insert(*dimension, *value);
        }
        let result = self.space.lookup(&coordinates).clone();
        DisplayCell {
            coordinates,
            x_label: x.map(|(_, _, label)| label.to_string()),
            y_label: y.map(|(_, _, label)| label.to_string()),
            result,
        }
    }
}

/// Labels for `values`, suffixed with ` #{value}` where two values share a label
/// or a label would shadow a serialized row field.
fn unique_labels(dimension: &Dimension, values: &[usize]) -> Vec<String> {
    let labels: Vec<String> = values.iter().map(|v| dimension.label(*v)).collect();
    let mut counts: HashMap<&str, usize> = HashMap::new();
    for label in &labels {
        *counts.entry(label.as_str()).or_insert(0) += 1;
    }
    labels
        .iter()
        .zip(values)
        .map(|(label, value)| {
            if counts[label.as_str()] > 1 || ROW_FIELDS.contains(&label.as_str()) {
                format!("{label} #{value}")
            } else {
                label.clone()
            }
        })
        .collect()
}

/// Validate the axis pair and project.
///
/// Rejects `x == y`; every other degenerate input yields an empty table with a reason.
pub fn project(
    space: &CoordinateSpace,
    dimensions: &[Dimension],
    x_axis: Option<usize>,
    y_axis: Option<usize>,
    filters: &[DimensionFilter],
) -> Result<DisplayTable> {
    let axes = AxisSelection::new(x_axis, y_axis)?;
    Ok(AxisProjector::new(space, dimensions).project(axes, filters))
}
