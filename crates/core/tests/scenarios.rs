use matrix_core::{
    default_filters, discover_payload, project, AxisProjector, AxisSelection, CoordinateSpace,
    DimensionFilter, DisplayTable, EmptyReason, MatrixSummary, ProjectorConfig,
};
use matrix_protocol::{serialize_json, MatrixPayload};
use pretty_assertions::assert_eq;
use serde_json::json;

fn payload(value: serde_json::Value) -> MatrixPayload {
    serde_json::from_value(value).expect("valid payload")
}

fn run(payload: &MatrixPayload, x: Option<usize>, y: Option<usize>) -> DisplayTable {
    let space = CoordinateSpace::from_payload(payload);
    let report = discover_payload(payload);
    project(&space, &report.dimensions, x, y, &[]).expect("projection")
}

fn one_dimension(coordinates: serde_json::Value) -> MatrixPayload {
    payload(json!({
        "variables_map": {"v0": {"name": "v0", "values": [{"value": "a"}, {"value": "b"}, {"value": "c"}]}},
        "coordinates_by_indices": coordinates
    }))
}

#[test]
fn single_axis_over_three_values() {
    let payload = one_dimension(json!({"0": "img0.png", "1": "img1.png", "2": "img2.png"}));
    let table = run(&payload, Some(0), None);

    assert_eq!(table.rows.len(), 1);
    assert_eq!(table.columns, vec!["a", "b", "c"]);
    assert!(table.cells().all(|cell| cell.has_valid_image()));
    assert_eq!(
        table.cell(0, 1).and_then(|c| c.result.primary_url()),
        Some("img1.png")
    );
}

#[test]
fn missing_coordinate_keeps_its_column() {
    let payload = one_dimension(json!({"0": "img0.png", "2": "img2.png"}));
    let table = run(&payload, Some(0), None);

    assert_eq!(table.columns, vec!["a", "b", "c"]);
    let b = table.cell(0, 1).expect("column b");
    assert!(!b.has_valid_image());
    assert_eq!(b.error_message(), None);
}

#[test]
fn two_axes_with_an_error_cell() {
    let payload = payload(json!({
        "variables_map": {
            "v0": {"name": "v0", "values": ["x0", "x1"]},
            "v1": {"name": "v1", "values": ["y0", "y1"]}
        },
        "coordinates_by_indices": {
            "0,0": "a.png",
            "0,1": "ERROR: timeout",
            "1,0": "b.png",
            "1,1": "c.png"
        }
    }));
    let table = run(&payload, Some(0), Some(1));

    assert_eq!(table.rows.len(), 2);
    assert_eq!(table.columns, vec!["x0", "x1"]);
    let titles: Vec<&str> = table.rows.iter().map(|r| r.title.as_str()).collect();
    assert_eq!(titles, vec!["y0", "y1"]);

    let origin = table.cell(0, 0).expect("cell");
    assert_eq!(origin.result.primary_url(), Some("a.png"));
    let failed = table.cell(1, 0).expect("cell");
    assert!(!failed.has_valid_image());
    assert_eq!(failed.error_message(), Some("timeout"));
    assert_eq!(
        table.cell(1, 1).and_then(|c| c.result.primary_url()),
        Some("c.png")
    );
    assert_eq!(table.error_cells(), 1);
    assert_eq!(table.valid_cells(), 3);
}

#[test]
fn unnamed_dimension_is_still_filterable() {
    let payload = payload(json!({
        "variables_map": {
            "v0": {"name": "prompt", "values": ["p0", "p1"]},
            "v1": {"name": "seed", "values": ["1", "2"]}
        },
        "coordinates_by_indices": {
            "0,0,3": "a.png",
            "0,1,1": "b.png",
            "1,0,5": "c.png",
            "1,1,1": "d.png"
        }
    }));
    let report = discover_payload(&payload);
    let anonymous = &report.dimensions[2];

    assert!(!anonymous.is_named());
    assert_eq!(anonymous.display_name(), "dimension 2");
    assert_eq!(anonymous.values, vec![1, 3, 5]);
    assert_eq!(anonymous.default_value(), 1);

    let axes = AxisSelection::default_for(&report.dimensions);
    assert_eq!((axes.x(), axes.y()), (Some(0), Some(1)));
    let filters = default_filters(&report.dimensions, axes);
    assert_eq!(filters, vec![DimensionFilter::new(2, 1)]);

    let space = CoordinateSpace::from_payload(&payload);
    let table = AxisProjector::new(&space, &report.dimensions).project(axes, &filters);
    assert_eq!(
        table.cell(1, 1).and_then(|c| c.result.primary_url()),
        Some("d.png")
    );
    assert!(!table.cell(0, 0).expect("cell").has_valid_image());
}

#[test]
fn projection_output_is_byte_identical() {
    let payload = payload(json!({
        "coordinates_by_indices": {
            "2,1,0": "c.png", "0,0,0": "a.png", "1,1,1": "ERROR: nope",
            "0,1,0": {"url": "b.png", "subtask_id": "s-1", "rating": 2, "evaluation": ["ok"]}
        }
    }));
    let render = || {
        let space = CoordinateSpace::from_payload(&payload);
        let report = discover_payload(&payload);
        let table = project(
            &space,
            &report.dimensions,
            Some(0),
            Some(1),
            &[DimensionFilter::new(2, 0)],
        )
        .expect("projection");
        serialize_json(&table.to_document(0)).expect("json")
    };
    assert_eq!(render(), render());
}

#[test]
fn error_and_absent_render_differently() {
    let payload = payload(json!({"coordinates_by_indices": {"0,1": "ERROR: render failed", "0,0": "ok.png"}}));
    let table = run(&payload, Some(1), Some(0));
    let doc = serde_json::to_value(table.to_document(0)).expect("json");

    let row = &doc["rows"][0];
    assert_eq!(row["1"]["hasValidImage"], false);
    assert_eq!(row["1"]["errorMessage"], "render failed");
    assert_eq!(row["0"]["hasValidImage"], true);
    assert_eq!(row["0"]["coordinates"], json!({"v0": 0, "v1": 0}));
}

#[test]
fn absent_cell_has_no_error_message() {
    let payload = payload(json!({"coordinates_by_indices": {"0,0": "a.png", "1,1": "b.png"}}));
    let table = run(&payload, Some(0), Some(1));
    let doc = serde_json::to_value(table.to_document(0)).expect("json");
    assert_eq!(doc["rows"][0]["1"]["hasValidImage"], false);
    assert!(doc["rows"][0]["1"].get("errorMessage").is_none());
}

#[test]
fn empty_payload_explains_itself() {
    let payload = payload(json!({"variables_map": {"v0": {"name": "seed", "values": ["1"]}}}));
    let table = run(&payload, Some(0), None);
    assert!(table.is_empty());
    assert_eq!(table.empty_reason(), Some(EmptyReason::NoDimensions));
    let doc = serde_json::to_value(table.to_document(0)).expect("json");
    assert!(doc["empty_reason"]
        .as_str()
        .unwrap_or_default()
        .contains("no completed cells"));
}

#[test]
fn custom_error_marker_from_config() {
    let config = ProjectorConfig::from_toml_str("error_marker = \"FAILED \"\nrow_placeholder = \"images\"\n")
        .expect("config");
    let payload = payload(json!({"coordinates_by_indices": {"0": "FAILED oom", "1": "b.png"}}));
    let space = CoordinateSpace::from_payload_with_marker(&payload, &config.error_marker);
    let report = discover_payload(&payload);
    let table = AxisProjector::new(&space, &report.dimensions)
        .with_config(config)
        .project(AxisSelection::new(Some(0), None).expect("axes"), &[]);

    assert_eq!(table.rows[0].title, "images");
    assert_eq!(table.cell(0, 0).and_then(|c| c.error_message()), Some("oom"));
}

#[test]
fn objects_without_url_do_not_count_as_results() {
    let payload = MatrixPayload::from_json_slice(
        br#"{"coordinates_by_indices": {"0": {}, "1": {"foo": 1}}}"#,
    )
    .expect("payload");
    let table = run(&payload, Some(0), None);
    assert_eq!(table.columns, vec!["0", "1"]);
    assert_eq!(table.empty_reason(), Some(EmptyReason::NoMatchingCells));

    let space = CoordinateSpace::from_payload(&payload);
    let summary = MatrixSummary::compute(&space, &discover_payload(&payload));
    assert_eq!(summary.result_statistics.pending, 0);
    assert_eq!(summary.result_statistics.unrecognized, 2);
}
