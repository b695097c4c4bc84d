use matrix_core::{CellResult, Dimension, DisplayCell, DisplayTable, MatrixSummary};
use unicode_segmentation::UnicodeSegmentation;

const ABSENT_MARK: &str = "-";
const PENDING_MARK: &str = "pending";

/// Plain-text grid; every column is padded to its widest grapheme count.
pub fn render_text(
    table: &DisplayTable,
    dimensions: &[Dimension],
    label_max_chars: usize,
    hidden_rows: usize,
) -> String {
    let mut out = String::new();
    if let Some(reason) = table.empty_reason() {
        out.push_str(&format!("{reason}\n"));
        if table.is_empty() {
            return out;
        }
        out.push('\n');
    }

    let mut grid: Vec<Vec<String>> = Vec::with_capacity(table.rows.len() + 1);
    let mut header = vec![truncate_label(&corner(table, dimensions), label_max_chars)];
    header.extend(
        table
            .columns
            .iter()
            .map(|column| truncate_label(column, label_max_chars)),
    );
    grid.push(header);
    for row in &table.rows {
        let mut line = vec![truncate_label(&row.title, label_max_chars)];
        line.extend(
            row.cells
                .iter()
                .map(|cell| truncate_label(&cell_text(cell), label_max_chars)),
        );
        grid.push(line);
    }

    let columns = grid.first().map_or(0, Vec::len);
    let widths: Vec<usize> = (0..columns)
        .map(|c| grid.iter().map(|line| width(&line[c])).max().unwrap_or(0))
        .collect();

    for (i, line) in grid.iter().enumerate() {
        let padded: Vec<String> = line
            .iter()
            .zip(&widths)
            .map(|(text, w)| pad(text, *w))
            .collect();
        out.push_str(padded.join("  ").trim_end());
        out.push('\n');
        if i == 0 {
            let rule: Vec<String> = widths.iter().map(|w| "-".repeat(*w)).collect();
            out.push_str(&rule.join("  "));
            out.push('\n');
        }
    }

    out.push_str(&footer(table, hidden_rows));
    out
}

pub fn render_markdown(
    table: &DisplayTable,
    dimensions: &[Dimension],
    label_max_chars: usize,
    hidden_rows: usize,
) -> String {
    let mut md = String::new();
    if let Some(reason) = table.empty_reason() {
        md.push_str(&format!("> {reason}\n\n"));
        if table.is_empty() {
            return md;
        }
    }

    md.push_str(&format!(
        "| {} |",
        escape_cell(&truncate_label(&corner(table, dimensions), label_max_chars))
    ));
    for column in &table.columns {
        md.push_str(&format!(
            " {} |",
            escape_cell(&truncate_label(column, label_max_chars))
        ));
    }
    md.push('\n');
    md.push_str("|---|");
    for _ in &table.columns {
        md.push_str("---|");
    }
    md.push('\n');

    for row in &table.rows {
        md.push_str(&format!(
            "| {} |",
            escape_cell(&truncate_label(&row.title, label_max_chars))
        ));
        for cell in &row.cells {
            let text = match &cell.result {
                CellResult::Success { urls, .. } => urls
                    .iter()
                    .map(|url| format!("`{}`", escape_cell(url)))
                    .collect::<Vec<_>>()
                    .join("<br>"),
                CellResult::Error { message, .. } => {
                    format!("**error:** {}", escape_cell(&truncate_one_line(message, 120)))
                }
                CellResult::Pending { .. } => format!("_{PENDING_MARK}_"),
                CellResult::Absent => String::new(),
            };
            md.push_str(&format!(" {text} |"));
        }
        md.push('\n');
    }
    md.push('\n');
    md.push_str(&footer(table, hidden_rows));
    md
}

pub fn render_summary(dimensions: &[Dimension], summary: &MatrixSummary) -> String {
    let mut out = String::new();
    out.push_str(&format!(
        "dimensions: {} ({} named)\n",
        summary.total_dimensions, summary.named_dimensions
    ));
    for dimension in dimensions {
        let values: Vec<String> = dimension
            .values
            .iter()
            .map(|value| format!("{value}={}", dimension.label(*value)))
            .collect();
        out.push_str(&format!(
            "  {:<4} {}: {}\n",
            dimension.key(),
            dimension.display_name(),
            truncate_one_line(&values.join(", "), 120)
        ));
    }
    let stats = &summary.result_statistics;
    out.push_str(&format!(
        "coordinates: {} mapped of {} combinations\n",
        summary.mapped_coordinates, summary.total_combinations
    ));
    out.push_str(&format!(
        "results: {} ok, {} error, {} pending, {} unrecognized\n",
        stats.with_result, stats.with_error, stats.pending, stats.unrecognized
    ));
    if summary.inconsistent_key_lengths {
        out.push_str("warning: coordinate keys have inconsistent lengths\n");
    }
    out
}

fn corner(table: &DisplayTable, dimensions: &[Dimension]) -> String {
    let name = |index: Option<usize>| {
        index
            .and_then(|i| dimensions.iter().find(|d| d.index == i))
            .map(Dimension::display_name)
    };
    match (name(table.y_axis), name(table.x_axis)) {
        (Some(y), Some(x)) => format!("{y} \\ {x}"),
        (Some(y), None) => y,
        (None, Some(x)) => x,
        (None, None) => String::new(),
    }
}

fn cell_text(cell: &DisplayCell) -> String {
    match &cell.result {
        CellResult::Success { urls, .. } => match urls.as_slice() {
            [only] => only.clone(),
            [first, rest @ ..] => format!("{first} (+{})", rest.len()),
            [] => ABSENT_MARK.to_string(),
        },
        CellResult::Error { message, .. } => format!("error: {}", truncate_one_line(message, 120)),
        CellResult::Pending { .. } => PENDING_MARK.to_string(),
        CellResult::Absent => ABSENT_MARK.to_string(),
    }
}

fn footer(table: &DisplayTable, hidden_rows: usize) -> String {
    let mut out = format!(
        "{} rows, {} columns, {} ok, {} errors\n",
        table.rows.len(),
        table.columns.len(),
        table.valid_cells(),
        table.error_cells()
    );
    if hidden_rows > 0 {
        out.push_str(&format!(
            "{hidden_rows} more rows hidden (raise --max-rows to show them)\n"
        ));
    }
    out
}

fn width(text: &str) -> usize {
    text.graphemes(true).count()
}

fn pad(text: &str, target: usize) -> String {
    let mut padded = text.to_string();
    padded.push_str(&" ".repeat(target.saturating_sub(width(text))));
    padded
}

/// Shorten to `max_chars` graphemes, marking the cut with an ellipsis.
pub fn truncate_label(text: &str, max_chars: usize) -> String {
    let text = truncate_one_line(text, usize::MAX);
    if width(&text) <= max_chars {
        return text;
    }
    let kept: String = text
        .graphemes(true)
        .take(max_chars.saturating_sub(1))
        .collect();
    format!("{kept}…")
}

fn truncate_one_line(text: &str, max_chars: usize) -> String {
    let mut s = text.replace(['\n', '\r', '\t'], " ");
    s = s.split_whitespace().collect::<Vec<_>>().join(" ");
    if s.chars().count() <= max_chars {
        return s;
    }
    let truncated: String = s.chars().take(max_chars.saturating_sub(1)).collect();
    format!("{truncated}…")
}

fn escape_cell(text: &str) -> String {
    text.replace('|', "\\|")
}
