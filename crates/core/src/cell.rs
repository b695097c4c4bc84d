use matrix_protocol::{CellEntry, CellRecord};

/// Reserved prefix marking an error in either cell encoding.
pub const ERROR_MARKER: &str = "ERROR: ";

/// Secondary fields the producer attaches to a cell, passed through untouched.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CellMeta {
    pub subtask_id: Option<String>,
    pub rating: Option<f64>,
    pub evaluation: Vec<String>,
    pub status: Option<String>,
}

impl CellMeta {
    fn from_record(record: &CellRecord) -> Self {
        Self {
            subtask_id: record.subtask_id.clone(),
            rating: record.rating,
            evaluation: record.evaluation.clone().unwrap_or_default(),
            status: record.status.clone(),
        }
    }
}

/// Outcome stored at one coordinate.
#[derive(Debug, Clone, PartialEq)]
pub enum CellResult {
    /// At least one artifact. `urls[0]` is the primary artifact.
    Success { urls: Vec<String>, meta: CellMeta },
    /// The subtask failed.
    Error { message: String, meta: CellMeta },
    /// An entry exists but no artifact has been produced yet.
    Pending { meta: CellMeta },
    /// No entry for the requested key.
    Absent,
}

impl CellResult {
    /// Resolve a stored entry using the default [`ERROR_MARKER`].
    pub fn from_entry(entry: &CellEntry) -> Self {
        Self::resolve(entry, ERROR_MARKER)
    }

    /// Resolve a stored entry. Unrecognized shapes and empty legacy strings are `Absent`.
    pub fn resolve(entry: &CellEntry, error_marker: &str) -> Self {
        match entry {
            CellEntry::Legacy(text) => {
                if let Some(message) = text.strip_prefix(error_marker) {
                    Self::Error {
                        message: message.to_string(),
                        meta: CellMeta::default(),
                    }
                } else if text.is_empty() {
                    Self::Absent
                } else {
                    Self::Success {
                        urls: vec![text.clone()],
                        meta: CellMeta::default(),
                    }
                }
            }
            CellEntry::Record(record) => Self::from_record(record, error_marker),
            CellEntry::Unrecognized(_) => Self::Absent,
        }
    }

    fn from_record(record: &CellRecord, error_marker: &str) -> Self {
        let meta = CellMeta::from_record(record);
        if let Some(message) = record.url.strip_prefix(error_marker) {
            return Self::Error {
                message: message.to_string(),
                meta,
            };
        }

        let mut urls: Vec<String> = Vec::new();
        if !record.url.is_empty() {
            urls.push(record.url.clone());
        }
        for extra in record.urls.iter().flatten() {
            if !extra.is_empty() && !urls.contains(extra) {
                urls.push(extra.clone());
            }
        }

        if urls.is_empty() {
            Self::Pending { meta }
        } else {
            Self::Success { urls, meta }
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success { .. })
    }

    pub fn is_error(&self) -> bool {
        matches!(self, Self::Error { .. })
    }

    pub fn primary_url(&self) -> Option<&str> {
        match self {
            Self::Success { urls, .. } => urls.first().map(String::as_str),
            _ => None,
        }
    }

    pub fn error_message(&self) -> Option<&str> {
        match self {
            Self::Error { message, .. } => Some(message.as_str()),
            _ => None,
        }
    }

    pub fn meta(&self) -> Option<&CellMeta> {
        match self {
            Self::Success { meta, .. } | Self::Error { meta, .. } | Self::Pending { meta } => {
                Some(meta)
            }
            Self::Absent => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn legacy(text: &str) -> CellEntry {
        CellEntry::Legacy(text.to_string())
    }

    #[test]
    fn legacy_strings() {
        assert_eq!(
            CellResult::from_entry(&legacy("img0.png")).primary_url(),
            Some("img0.png")
        );
        assert_eq!(
            CellResult::from_entry(&legacy("ERROR: render failed")).error_message(),
            Some("render failed")
        );
        assert_eq!(CellResult::from_entry(&legacy("")), CellResult::Absent);
    }

    #[test]
    fn record_with_error_url() {
        let record = CellRecord {
            url: "ERROR: timeout".to_string(),
            subtask_id: Some("st-1".to_string()),
            status: Some("failed".to_string()),
            ..Default::default()
        };
        let cell = CellResult::from_entry(&CellEntry::Record(record));
        assert_eq!(cell.error_message(), Some("timeout"));
        assert_eq!(
            cell.meta().and_then(|m| m.subtask_id.as_deref()),
            Some("st-1")
        );
    }

    #[test]
    fn record_batch_urls_fill_blank_primary() {
        let record = CellRecord {
            url: String::new(),
            urls: Some(vec!["a.png".to_string(), "b.png".to_string()]),
            rating: Some(3.0),
            evaluation: Some(vec!["sharp".to_string()]),
            ..Default::default()
        };
        match CellResult::from_entry(&CellEntry::Record(record)) {
            CellResult::Success { urls, meta } => {
                assert_eq!(urls, vec!["a.png", "b.png"]);
                assert_eq!(meta.rating, Some(3.0));
                assert_eq!(meta.evaluation, vec!["sharp"]);
            }
            other => panic!("expected success, got {other:?}"),
        }
    }

    #[test]
    fn record_without_artifact_is_pending() {
        let record = CellRecord {
            status: Some("running".to_string()),
            ..Default::default()
        };
        let cell = CellResult::from_entry(&CellEntry::Record(record));
        assert!(matches!(cell, CellResult::Pending { .. }));
        assert_eq!(cell.primary_url(), None);
        assert_eq!(cell.error_message(), None);
    }

    #[test]
    fn unrecognized_is_absent() {
        let entry = CellEntry::Unrecognized(serde_json::json!(42));
        assert_eq!(CellResult::from_entry(&entry), CellResult::Absent);
    }

    #[test]
    fn objects_without_url_are_absent() {
        for raw in [r#"{"foo": 1}"#, "{}", r#"{"status": "running"}"#] {
            let entry: CellEntry = serde_json::from_str(raw).expect("entry");
            assert!(matches!(entry, CellEntry::Unrecognized(_)), "{raw}");
            assert_eq!(CellResult::from_entry(&entry), CellResult::Absent, "{raw}");
        }

        let entry: CellEntry =
            serde_json::from_str(r#"{"url": "", "status": "running"}"#).expect("entry");
        assert!(matches!(CellResult::from_entry(&entry), CellResult::Pending { .. }));
    }

    #[test]
    fn custom_marker() {
        let cell = CellResult::resolve(&legacy("FAIL:oom"), "FAIL:");
        assert_eq!(cell.error_message(), Some("oom"));
    }
}
