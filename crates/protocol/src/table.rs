use schemars::JsonSchema;
use serde::ser::SerializeMap;
use serde::{Deserialize, Serialize, Serializer};
use std::collections::BTreeMap;

/// Serialized form of one projected cell.
#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct CellDisplayData {
    pub url: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub urls: Vec<String>,
    pub x_value: String,
    pub y_value: String,
    /// `v{dimension}` -> value index used for the lookup.
    pub coordinates: BTreeMap<String, usize>,
    pub has_valid_image: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subtask_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rating: Option<f64>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub evaluation: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
}

/// Field names every serialized row carries before its columns.
pub const ROW_FIELDS: [&str; 2] = ["key", "rowTitle"];

/// One table row: `key`, `rowTitle`, then one entry per column label, in column order.
///
/// Column labels must not repeat each other or any of [`ROW_FIELDS`].
#[derive(Debug, Clone, PartialEq)]
pub struct TableRowDocument {
    pub key: String,
    pub row_title: String,
    pub cells: Vec<(String, CellDisplayData)>,
}

impl Serialize for TableRowDocument {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.cells.len() + 2))?;
        map.serialize_entry(ROW_FIELDS[0], &self.key)?;
        map.serialize_entry(ROW_FIELDS[1], &self.row_title)?;
        for (column, cell) in &self.cells {
            map.serialize_entry(column, cell)?;
        }
        map.end()
    }
}

#[derive(Debug, Serialize, Clone, PartialEq)]
pub struct DisplayTableDocument {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub x_axis: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub y_axis: Option<String>,
    pub columns: Vec<String>,
    pub rows: Vec<TableRowDocument>,
    pub valid_cells: usize,
    pub error_cells: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub empty_reason: Option<String>,
    #[serde(skip_serializing_if = "is_zero")]
    pub hidden_rows: usize,
}

fn is_zero(value: &usize) -> bool {
    *value == 0
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn row_serializes_columns_in_order() {
        let cell = |url: &str| CellDisplayData {
            url: url.to_string(),
            has_valid_image: !url.is_empty(),
            ..Default::default()
        };
        let row = TableRowDocument {
            key: "single-row".to_string(),
            row_title: "result".to_string(),
            cells: vec![
                ("zeta".to_string(), cell("z.png")),
                ("alpha".to_string(), cell("")),
            ],
        };
        let raw = serde_json::to_string(&row).expect("json");
        let zeta = raw.find("\"zeta\"").expect("zeta");
        let alpha = raw.find("\"alpha\"").expect("alpha");
        assert!(zeta < alpha, "columns reordered: {raw}");
        assert!(raw.starts_with(r#"{"key":"single-row","rowTitle":"result""#));

        let value: serde_json::Value = serde_json::from_str(&raw).expect("value");
        assert_eq!(value["zeta"]["hasValidImage"], true);
        assert_eq!(value["alpha"]["hasValidImage"], false);
        assert!(value["alpha"].get("errorMessage").is_none());
    }
}
