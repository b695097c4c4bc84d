use anyhow::Result;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

pub mod payload;
pub mod table;

pub use payload::{
    ApiEnvelope, CellEntry, CellRecord, MatrixPayload, VariableDef, VariableValue,
    VariableValueRecord,
};
pub use table::{CellDisplayData, DisplayTableDocument, TableRowDocument, ROW_FIELDS};

#[derive(Debug, Serialize, Deserialize, Clone, JsonSchema)]
pub struct ErrorEnvelope {
    pub code: String,
    pub message: String,
    pub details: Option<serde_json::Value>,
    pub hint: Option<String>,
}

impl ErrorEnvelope {
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
            details: None,
            hint: None,
        }
    }

    #[must_use]
    pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
        self.hint = Some(hint.into());
        self
    }
}

pub fn serialize_json<T: Serialize>(value: &T) -> Result<String> {
    serde_json::to_string(value).map_err(Into::into)
}

/// Hex SHA-256 of the compact JSON encoding; identical documents hash identically.
pub fn fingerprint<T: Serialize>(value: &T) -> Result<String> {
    let raw = serialize_json(value)?;
    let digest = Sha256::digest(raw.as_bytes());
    Ok(digest.iter().map(|b| format!("{b:02x}")).collect())
}

/// JSON Schema of the accepted input payload.
pub fn payload_schema() -> schemars::Schema {
    schemars::schema_for!(MatrixPayload)
}
