use crate::cell::CellResult;
use crate::discovery::DiscoveryReport;
use crate::space::CoordinateSpace;
use serde::Serialize;

/// Counts of stored outcomes across the whole payload.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ResultStatistics {
    pub with_result: usize,
    pub with_error: usize,
    pub pending: usize,
    /// Keys that are malformed or whose value shape was not understood
    pub unrecognized: usize,
}

/// Payload-level overview.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct MatrixSummary {
    pub total_dimensions: usize,
    pub named_dimensions: usize,
    /// Product of each dimension's axis value count
    pub total_combinations: usize,
    pub mapped_coordinates: usize,
    pub inconsistent_key_lengths: bool,
    pub result_statistics: ResultStatistics,
}

impl MatrixSummary {
    pub fn compute(space: &CoordinateSpace, report: &DiscoveryReport) -> Self {
        let mut stats = ResultStatistics {
            unrecognized: space.malformed_keys() + space.unrecognized_values(),
            ..Default::default()
        };
        for (_, cell) in space.cells() {
            match cell {
                CellResult::Success { .. } => stats.with_result += 1,
                CellResult::Error { .. } => stats.with_error += 1,
                CellResult::Pending { .. } => stats.pending += 1,
                CellResult::Absent => {}
            }
        }

        let total_combinations = if report.dimensions.is_empty() {
            0
        } else {
            report
                .dimensions
                .iter()
                .map(|d| d.axis_values().len())
                .fold(1usize, usize::saturating_mul)
        };

        Self {
            total_dimensions: report.total_dimensions,
            named_dimensions: report.dimensions.iter().filter(|d| d.is_named()).count(),
            total_combinations,
            mapped_coordinates: space.len(),
            inconsistent_key_lengths: report.inconsistent_key_lengths,
            result_statistics: stats,
        }
    }
}
