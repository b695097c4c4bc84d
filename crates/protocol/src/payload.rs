use anyhow::{bail, Context};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Top-level keys that identify a bare matrix payload.
const PAYLOAD_FIELDS: [&str; 2] = ["variables_map", "coordinates_by_indices"];

/// Envelope used by the results service around every response body.
#[derive(Debug, Serialize, Deserialize, Clone, JsonSchema)]
pub struct ApiEnvelope<T> {
    #[serde(default)]
    pub code: Option<i64>,
    #[serde(default)]
    pub message: Option<String>,
    pub data: T,
}

/// Matrix payload for a single task: variable definitions plus the sparse coordinate map.
#[derive(Debug, Serialize, Deserialize, Clone, Default, JsonSchema)]
pub struct MatrixPayload {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub task_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub task_name: Option<String>,
    /// Dimension definitions keyed by `v{index}` (or a bare index).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub variables_map: Option<BTreeMap<String, VariableDef>>,
    /// Comma-joined coordinate key -> cell.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub coordinates_by_indices: Option<BTreeMap<String, CellEntry>>,
}

impl MatrixPayload {
    /// Parse either a bare payload or one wrapped in an [`ApiEnvelope`].
    ///
    /// A document with a `data` key is always treated as an envelope, so a
    /// malformed `data` is an error rather than an empty payload.
    pub fn from_json_slice(bytes: &[u8]) -> anyhow::Result<Self> {
        let document: serde_json::Value = serde_json::from_slice(bytes)?;
        let is_envelope = document
            .as_object()
            .is_some_and(|fields| fields.contains_key("data"));
        if is_envelope {
            let envelope: ApiEnvelope<serde_json::Value> =
                serde_json::from_value(document).context("Invalid API envelope")?;
            return Self::from_value(envelope.data).context("Invalid `data` in API envelope");
        }
        Self::from_value(document)
    }

    fn from_value(document: serde_json::Value) -> anyhow::Result<Self> {
        let Some(fields) = document.as_object() else {
            bail!("Matrix payload must be a JSON object");
        };
        if !PAYLOAD_FIELDS.iter().any(|field| fields.contains_key(*field)) {
            bail!(
                "Not a matrix payload: expected one of {}",
                PAYLOAD_FIELDS.join(", ")
            );
        }
        Ok(serde_json::from_value(document)?)
    }

    pub fn coordinate_count(&self) -> usize {
        self.coordinates_by_indices
            .as_ref()
            .map_or(0, BTreeMap::len)
    }
}

/// One varied parameter as described by the task producer.
#[derive(Debug, Serialize, Deserialize, Clone, Default, JsonSchema)]
pub struct VariableDef {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub values: Vec<VariableValue>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub values_count: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tag_id: Option<serde_json::Value>,
}

impl VariableDef {
    /// Blank names mark the dimension as anonymous.
    pub fn display_name(&self) -> Option<&str> {
        let trimmed = self.name.trim();
        (!trimmed.is_empty()).then_some(trimmed)
    }

    pub fn labels(&self) -> Vec<String> {
        self.values.iter().map(VariableValue::label).collect()
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, JsonSchema)]
#[serde(untagged)]
pub enum VariableValue {
    Detailed(VariableValueRecord),
    Plain(serde_json::Value),
}

#[derive(Debug, Serialize, Deserialize, Clone, JsonSchema)]
pub struct VariableValueRecord {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<serde_json::Value>,
    pub value: serde_json::Value,
    #[serde(default, rename = "type", skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
}

impl VariableValue {
    /// Human-readable label shown for this value.
    pub fn label(&self) -> String {
        match self {
            VariableValue::Detailed(record) => scalar_label(&record.value),
            VariableValue::Plain(value) => scalar_label(value),
        }
    }
}

fn scalar_label(value: &serde_json::Value) -> String {
    match value {
        serde_json::Value::String(text) => text.clone(),
        serde_json::Value::Null => String::new(),
        other => other.to_string(),
    }
}

/// Stored value for a coordinate key.
///
/// `Legacy` is the older single-string encoding, `Record` the structured one.
/// Anything else, including objects without a `url`, is kept as `Unrecognized`
/// and treated as missing.
#[derive(Debug, Serialize, Deserialize, Clone, JsonSchema)]
#[serde(untagged)]
pub enum CellEntry {
    Legacy(String),
    Record(CellRecord),
    Unrecognized(serde_json::Value),
}

#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq, JsonSchema)]
pub struct CellRecord {
    pub url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub urls: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subtask_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rating: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub evaluation: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
}
