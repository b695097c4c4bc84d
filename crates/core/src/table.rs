use crate::cell::CellResult;
use crate::key::{dimension_key, Coordinates};
use matrix_protocol::{CellDisplayData, DisplayTableDocument, TableRowDocument};
use std::cmp::Ordering;
use std::fmt;

/// One projected cell.
#[derive(Debug, Clone, PartialEq)]
pub struct DisplayCell {
    /// Full assignment used for the lookup
    pub coordinates: Coordinates,
    pub x_label: Option<String>,
    pub y_label: Option<String>,
    pub result: CellResult,
}

impl DisplayCell {
    pub fn has_valid_image(&self) -> bool {
        self.result.is_success()
    }

    pub fn error_message(&self) -> Option<&str> {
        self.result.error_message()
    }

    fn to_document(&self) -> CellDisplayData {
        let (url, urls) = match &self.result {
            CellResult::Success { urls, .. } => (
                urls.first().cloned().unwrap_or_default(),
                if urls.len() > 1 { urls.clone() } else { Vec::new() },
            ),
            _ => (String::new(), Vec::new()),
        };
        let meta = self.result.meta().cloned().unwrap_or_default();
        CellDisplayData {
            url,
            urls,
            x_value: self.x_label.clone().unwrap_or_default(),
            y_value: self.y_label.clone().unwrap_or_default(),
            coordinates: self
                .coordinates
                .iter()
                .map(|(dimension, value)| (dimension_key(*dimension), *value))
                .collect(),
            has_valid_image: self.has_valid_image(),
            error_message: self.error_message().map(str::to_string),
            subtask_id: meta.subtask_id,
            rating: meta.rating,
            evaluation: meta.evaluation,
            status: meta.status,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct DisplayRow {
    pub key: String,
    pub title: String,
    /// Aligned with [`DisplayTable::columns`]
    pub cells: Vec<DisplayCell>,
}

/// Why a projection has nothing to show.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EmptyReason {
    NoDimensions,
    NoAxisSelected,
    NoMatchingCells,
}

impl fmt::Display for EmptyReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            EmptyReason::NoDimensions => {
                "Not enough dimensions: the task has no completed cells yet, so there is nothing to project."
            }
            EmptyReason::NoAxisSelected => "Select an X or Y axis to build a table.",
            EmptyReason::NoMatchingCells => {
                "No cell matched the current selection. Likely causes: the dimension filters are too strict, \
                 the task is still running, or the coordinate keys do not follow the expected format."
            }
        };
        f.write_str(text)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortDirection {
    Ascending,
    Descending,
}

/// Dense 1-D or 2-D projection of a coordinate space.
#[derive(Debug, Clone, PartialEq)]
pub struct DisplayTable {
    pub x_axis: Option<usize>,
    pub y_axis: Option<usize>,
    pub columns: Vec<String>,
    pub rows: Vec<DisplayRow>,
    pub(crate) empty_reason: Option<EmptyReason>,
}

impl DisplayTable {
    pub(crate) fn empty(reason: EmptyReason) -> Self {
        Self {
            x_axis: None,
            y_axis: None,
            columns: Vec::new(),
            rows: Vec::new(),
            empty_reason: Some(reason),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Explanation to show instead of the table, if any.
    pub fn empty_reason(&self) -> Option<EmptyReason> {
        self.empty_reason
    }

    pub fn cell(&self, row: usize, column: usize) -> Option<&DisplayCell> {
        self.rows.get(row).and_then(|r| r.cells.get(column))
    }

    pub fn cells(&self) -> impl Iterator<Item = &DisplayCell> {
        self.rows.iter().flat_map(|row| row.cells.iter())
    }

    pub fn valid_cells(&self) -> usize {
        self.cells().filter(|cell| cell.has_valid_image()).count()
    }

    pub fn error_cells(&self) -> usize {
        self.cells().filter(|cell| cell.result.is_error()).count()
    }

    /// Reorder rows by title. Numeric titles compare as numbers; ties keep projection order.
    #[must_use]
    pub fn sorted_by_title(mut self, direction: SortDirection) -> Self {
        self.rows.sort_by(|a, b| {
            let ordering = compare_titles(&a.title, &b.title);
            match direction {
                SortDirection::Ascending => ordering,
                SortDirection::Descending => ordering.reverse(),
            }
        });
        self
    }

    /// Keep the first `max_rows` rows; returns how many were dropped.
    pub fn truncate(&mut self, max_rows: usize) -> usize {
        let hidden = self.rows.len().saturating_sub(max_rows);
        self.rows.truncate(max_rows);
        hidden
    }

    pub fn to_document(&self, hidden_rows: usize) -> DisplayTableDocument {
        DisplayTableDocument {
            x_axis: self.x_axis.map(dimension_key),
            y_axis: self.y_axis.map(dimension_key),
            columns: self.columns.clone(),
            rows: self
                .rows
                .iter()
                .map(|row| TableRowDocument {
                    key: row.key.clone(),
                    row_title: row.title.clone(),
                    cells: self
                        .columns
                        .iter()
                        .cloned()
                        .zip(row.cells.iter().map(DisplayCell::to_document))
                        .collect(),
                })
                .collect(),
            valid_cells: self.valid_cells(),
            error_cells: self.error_cells(),
            empty_reason: self.empty_reason.map(|reason| reason.to_string()),
            hidden_rows,
        }
    }
}

fn compare_titles(a: &str, b: &str) -> Ordering {
    match (parse_number(a), parse_number(b)) {
        (Some(x), Some(y)) => x.total_cmp(&y),
        _ => a.cmp(b),
    }
}

fn parse_number(text: &str) -> Option<f64> {
    text.trim().parse::<f64>().ok().filter(|value| value.is_finite())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cell::CellMeta;
    use pretty_assertions::assert_eq;

    fn row(title: &str) -> DisplayRow {
        DisplayRow {
            key: format!("row-{title}"),
            title: title.to_string(),
            cells: Vec::new(),
        }
    }

    fn table(titles: &[&str]) -> DisplayTable {
        DisplayTable {
            x_axis: None,
            y_axis: Some(0),
            columns: vec!["result".to_string()],
            rows: titles.iter().map(|t| row(t)).collect(),
            empty_reason: None,
        }
    }

    fn titles(table: &DisplayTable) -> Vec<&str> {
        table.rows.iter().map(|r| r.title.as_str()).collect()
    }

    #[test]
    fn numeric_titles_sort_numerically() {
        let sorted = table(&["10", "9", "2.5"]).sorted_by_title(SortDirection::Ascending);
        assert_eq!(titles(&sorted), vec!["2.5", "9", "10"]);
    }

    #[test]
    fn mixed_titles_sort_lexically_descending() {
        let sorted = table(&["b", "a", "c"]).sorted_by_title(SortDirection::Descending);
        assert_eq!(titles(&sorted), vec!["c", "b", "a"]);
    }

    #[test]
    fn truncate_reports_hidden_rows() {
        let mut t = table(&["1", "2", "3"]);
        assert_eq!(t.truncate(2), 1);
        assert_eq!(t.rows.len(), 2);
        assert_eq!(t.truncate(5), 0);
    }

    #[test]
    fn document_keeps_column_alignment() {
        let mut coords = Coordinates::new();
        coords.insert(0, 1);
        coords.insert(1, 0);
        let success = DisplayCell {
            coordinates: coords.clone(),
            x_label: Some("b".to_string()),
            y_label: None,
            result: CellResult::Success {
                urls: vec!["b.png".to_string(), "b2.png".to_string()],
                meta: CellMeta {
                    subtask_id: Some("s1".to_string()),
                    ..Default::default()
                },
            },
        };
        let table = DisplayTable {
            x_axis: Some(0),
            y_axis: None,
            columns: vec!["b".to_string()],
            rows: vec![DisplayRow {
                key: "single-row".to_string(),
                title: "result".to_string(),
                cells: vec![success],
            }],
            empty_reason: None,
        };

        let doc = table.to_document(0);
        assert_eq!(doc.x_axis.as_deref(), Some("v0"));
        assert_eq!(doc.valid_cells, 1);
        let (column, cell) = &doc.rows[0].cells[0];
        assert_eq!(column, "b");
        assert_eq!(cell.url, "b.png");
        assert_eq!(cell.urls.len(), 2);
        assert_eq!(cell.coordinates.get("v1"), Some(&0));
        assert_eq!(cell.subtask_id.as_deref(), Some("s1"));
        assert_eq!(cell.y_value, "");
    }

    #[test]
    fn empty_reasons_explain_causes() {
        let text = EmptyReason::NoMatchingCells.to_string();
        assert!(text.contains("filters"));
        assert!(text.contains("still running"));
        assert!(DisplayTable::empty(EmptyReason::NoAxisSelected).is_empty());
    }
}
