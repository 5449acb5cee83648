//! Export bundle format and import results.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize, Serializer};
use serde_json::Value as JsonValue;

use crate::error::{ParleyError, Result};

/// A portable snapshot of one session's stored values.
///
/// ```json
/// {
///   "version": "2.0.0",
///   "timestamp": "2024-01-01T00:00:00.000Z",
///   "sessionId": "session_1704067200000_k3j2h1g0f",
///   "data": { "settings": "{\"autoSave\":true}" }
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportBundle {
    pub version: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub session_id: Option<String>,
    /// Logical key to raw stored string.
    pub data: BTreeMap<String, String>,
}

impl ExportBundle {
    /// Parses and validates a bundle.
    ///
    /// `version` must be a non-empty string and `data` an object. Non-string
    /// data values are kept as their JSON text. An empty `sessionId` counts
    /// as absent.
    pub fn parse(json: &str) -> Result<Self> {
        let root: JsonValue = serde_json::from_str(json)?;
        let JsonValue::Object(mut root) = root else {
            return Err(ParleyError::invalid_bundle("bundle is not a JSON object"));
        };

        let version = match root.remove("version") {
            Some(JsonValue::String(v)) if !v.is_empty() => v,
            _ => return Err(ParleyError::invalid_bundle("missing version")),
        };

        let data = match root.remove("data") {
            Some(JsonValue::Object(map)) => map
                .into_iter()
                .map(|(key, value)| match value {
                    JsonValue::String(s) => (key, s),
                    other => (key, other.to_string()),
                })
                .collect(),
            _ => return Err(ParleyError::invalid_bundle("missing data")),
        };

        let string_field = |value: Option<JsonValue>| match value {
            Some(JsonValue::String(s)) if !s.is_empty() => Some(s),
            _ => None,
        };

        if semver::Version::parse(&version).is_err() {
            tracing::warn!("[Storage] Bundle version '{}' is not semver, importing anyway", version);
        }

        Ok(Self {
            version,
            timestamp: string_field(root.remove("timestamp")),
            session_id: string_field(root.remove("sessionId")),
            data,
        })
    }

    pub fn item_count(&self) -> usize {
        self.data.len()
    }
}

/// Summary of a successful import.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportSummary {
    pub item_count: usize,
    pub version: String,
    pub timestamp: Option<String>,
}

/// Result of `import_data`.
///
/// Serializes as `{"success":true,"itemCount":..,"version":..,"timestamp":..}`
/// or `{"success":false,"error":..}`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImportResult {
    Imported(ImportSummary),
    Failed { error: String },
}

impl ImportResult {
    pub fn failed(error: impl Into<String>) -> Self {
        Self::Failed {
            error: error.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Self::Imported(_))
    }

    pub fn item_count(&self) -> Option<usize> {
        match self {
            Self::Imported(summary) => Some(summary.item_count),
            Self::Failed { .. } => None,
        }
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ImportResultWire<'a> {
    success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    item_count: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    version: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    timestamp: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<&'a str>,
}

impl Serialize for ImportResult {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let wire = match self {
            Self::Imported(summary) => ImportResultWire {
                success: true,
                item_count: Some(summary.item_count),
                version: Some(&summary.version),
                timestamp: summary.timestamp.as_deref(),
                error: None,
            },
            Self::Failed { error } => ImportResultWire {
                success: false,
                item_count: None,
                version: None,
                timestamp: None,
                error: Some(error),
            },
        };
        wire.serialize(serializer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_minimal_bundle() {
        let bundle =
            ExportBundle::parse(r#"{"version":"2.0.0","data":{"settings":"{\"autoSave\":true}"}}"#)
                .unwrap();
        assert_eq!(bundle.item_count(), 1);
        assert_eq!(bundle.data["settings"], r#"{"autoSave":true}"#);
        assert!(bundle.session_id.is_none());
    }

    #[test]
    fn test_parse_rejects_missing_fields() {
        assert!(ExportBundle::parse("{}").unwrap_err().is_invalid_bundle());
        assert!(
            ExportBundle::parse(r#"{"version":"2.0.0"}"#)
                .unwrap_err()
                .is_invalid_bundle()
        );
        assert!(
            ExportBundle::parse(r#"{"version":"","data":{}}"#)
                .unwrap_err()
                .is_invalid_bundle()
        );
        assert!(ExportBundle::parse("not json").unwrap_err().is_serialization());
    }

    #[test]
    fn test_non_string_values_keep_json_text() {
        let bundle = ExportBundle::parse(r#"{"version":"2.0.0","data":{"messages":[1,2]}}"#).unwrap();
        assert_eq!(bundle.data["messages"], "[1,2]");
    }

    #[test]
    fn test_import_result_wire_shape() {
        let ok = ImportResult::Imported(ImportSummary {
            item_count: 1,
            version: "2.0.0".to_string(),
            timestamp: None,
        });
        let value = serde_json::to_value(&ok).unwrap();
        assert_eq!(value["success"], true);
        assert_eq!(value["itemCount"], 1);

        let failed = serde_json::to_value(ImportResult::failed("bad")).unwrap();
        assert_eq!(failed["success"], false);
        assert_eq!(failed["error"], "bad");
    }
}
