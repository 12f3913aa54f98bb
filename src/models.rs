//! Data types shared by the tooltip engine and its collaborators.

use std::fmt;

use serde::{Deserialize, Deserializer, Serialize};

use crate::geometry::Point;

/// Opaque identifier of an analysis result row.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RecordId(String);

impl RecordId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for RecordId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl From<String> for RecordId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl From<u64> for RecordId {
    fn from(id: u64) -> Self {
        Self(id.to_string())
    }
}

/// The record under the pointer and where the pointer was when it got there.
#[derive(Debug, Clone, PartialEq)]
pub struct HoverTarget {
    pub record_id: RecordId,
    pub anchor: Point,
}

impl HoverTarget {
    pub fn new(record_id: impl Into<RecordId>, anchor: Point) -> Self {
        Self {
            record_id: record_id.into(),
            anchor,
        }
    }
}

/// Details of a classified record as returned by the backend.
///
/// Every field is optional and kept as display text. The backend sends some
/// columns as strings and others as numbers depending on the upload, so
/// scalars of any JSON type are accepted.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RecordDetails {
    #[serde(default, deserialize_with = "display_value")]
    pub mssql_sxclass_name: Option<String>,
    #[serde(default, deserialize_with = "display_value")]
    pub created_date: Option<String>,
    #[serde(default, deserialize_with = "display_value")]
    pub created_by: Option<String>,
    #[serde(default, deserialize_with = "display_value")]
    pub modified_date: Option<String>,
    #[serde(default, deserialize_with = "display_value")]
    pub modified_by: Option<String>,
    #[serde(default, deserialize_with = "display_value")]
    pub folder_paths: Option<String>,
    #[serde(default, deserialize_with = "display_value")]
    pub object_count: Option<String>,
    #[serde(default, deserialize_with = "display_value")]
    pub last_object_created: Option<String>,
    #[serde(default, deserialize_with = "display_value")]
    pub last_object_modified: Option<String>,
    /// Object id in the source system, used for deep links.
    #[serde(default, deserialize_with = "display_value")]
    pub a_ouid: Option<String>,
    /// Root of the source system's admin UI, used for deep links.
    #[serde(default, deserialize_with = "display_value")]
    pub base_url: Option<String>,
}

impl RecordDetails {
    /// Whether the record has at least one object.
    pub fn has_objects(&self) -> bool {
        self.object_count
            .as_deref()
            .and_then(|count| count.trim().parse::<f64>().ok())
            .is_some_and(|count| count > 0.0)
    }
}

/// Response body of the record details endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct DetailsEnvelope {
    pub success: bool,
    #[serde(default)]
    pub details: Option<RecordDetails>,
    #[serde(default)]
    pub error: Option<String>,
}

fn display_value<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(match value {
        None | Some(serde_json::Value::Null) => None,
        Some(serde_json::Value::String(s)) => Some(s),
        Some(serde_json::Value::Bool(b)) => Some(b.to_string()),
        Some(serde_json::Value::Number(n)) => Some(n.to_string()),
        Some(other) => Some(other.to_string()),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_details_accepts_mixed_scalars() {
        let details: RecordDetails = serde_json::from_value(serde_json::json!({
            "mssql_sxclass_name": "Foo",
            "object_count": 12,
            "a_ouid": 40412,
            "created_by": null,
            "unknown_column": "ignored"
        }))
        .unwrap();

        assert_eq!(details.mssql_sxclass_name.as_deref(), Some("Foo"));
        assert_eq!(details.object_count.as_deref(), Some("12"));
        assert_eq!(details.a_ouid.as_deref(), Some("40412"));
        assert!(details.created_by.is_none());
        assert!(details.modified_by.is_none());
    }

    #[test]
    fn test_has_objects() {
        let mut details = RecordDetails::default();
        assert!(!details.has_objects());

        details.object_count = Some("0".to_string());
        assert!(!details.has_objects());

        details.object_count = Some("Нет данных".to_string());
        assert!(!details.has_objects());

        details.object_count = Some(" 3 ".to_string());
        assert!(details.has_objects());
    }

    #[test]
    fn test_envelope_failure_without_details() {
        let envelope: DetailsEnvelope =
            serde_json::from_str(r#"{"success": false, "error": "not found"}"#).unwrap();
        assert!(!envelope.success);
        assert!(envelope.details.is_none());
        assert_eq!(envelope.error.as_deref(), Some("not found"));
    }

    #[test]
    fn test_record_id_display() {
        assert_eq!(RecordId::from(42u64).to_string(), "42");
        assert_eq!(RecordId::from("7").as_str(), "7");
    }
}
