//! Typed resources returned by the Ditto HTTP API.
//!
//! Every model keeps the fields the CLI reasons about as typed members and
//! captures the rest of the payload in a flattened extension bag, so unknown
//! or newly introduced server fields survive a round trip untouched.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Open-ended key/value overflow attached to a typed model.
///
/// Backed by an insertion-ordered map so rendered output keeps the order the
/// server produced.
pub type ExtensionData = Map<String, Value>;

/// Digital twin with attributes and features.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Thing {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    /// Fully qualified thing identifier (`namespace:name`).
    pub thing_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    /// Policy governing access to the thing.
    pub policy_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    /// Optional definition identifier (`namespace:name:version`).
    pub definition: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    /// Free-form attribute tree.
    pub attributes: Option<ExtensionData>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    /// Feature map keyed by feature identifier.
    pub features: Option<ExtensionData>,
    #[serde(flatten)]
    /// Fields outside the fixed schema (`_revision`, `_modified`, ...).
    pub additional_data: ExtensionData,
}

impl Thing {
    /// Number of features carried by the thing.
    #[must_use]
    pub fn feature_count(&self) -> usize {
        self.features.as_ref().map_or(0, Map::len)
    }
}

/// Managed integration channel (broker or protocol binding).
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Connection {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    /// Connection identifier.
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    /// Desired status (`open`, `closed`).
    pub connection_status: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    /// Protocol type (`amqp-091`, `mqtt`, `kafka`, ...).
    pub connection_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    /// Endpoint URI of the remote broker.
    pub uri: Option<String>,
    #[serde(flatten)]
    /// Remaining connection definition (sources, targets, mappings, ...).
    pub additional_data: ExtensionData,
}

/// Identity information of the authenticated caller.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct WhoAmI {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    /// Subject used when no explicit subject is selected.
    pub default_subject: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    /// All subjects resolved for the caller.
    pub subjects: Vec<String>,
    #[serde(flatten)]
    /// Any further fields returned by the server.
    pub additional_data: ExtensionData,
}

/// Page of things returned by the search endpoint.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct SearchResult {
    #[serde(default)]
    /// Matching things for the current page.
    pub items: Vec<Thing>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    /// Cursor for the next page when more results exist.
    pub cursor: Option<String>,
}

/// Error document returned by Ditto for non-2xx responses.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ProblemDetails {
    /// HTTP status code mirrored in the body.
    pub status: u16,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    /// Machine-readable error code (for example `things:thing.notfound`).
    pub error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    /// Human-readable summary.
    pub message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    /// Additional hint on how to resolve the problem.
    pub description: Option<String>,
}

impl ProblemDetails {
    /// Best human-readable text for the problem, preferring the message.
    #[must_use]
    pub fn summary(&self) -> Option<String> {
        match (&self.message, &self.description) {
            (Some(message), Some(description)) => Some(format!("{message} ({description})")),
            (Some(message), None) => Some(message.clone()),
            (None, Some(description)) => Some(description.clone()),
            (None, None) => self.error.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Result;
    use serde_json::json;

    #[test]
    fn thing_keeps_unknown_fields_in_extension_bag() -> Result<()> {
        let thing: Thing = serde_json::from_value(json!({
            "thingId": "org.example:sensor-1",
            "policyId": "org.example:policy",
            "attributes": {"location": "kitchen"},
            "_revision": 7
        }))?;

        assert_eq!(thing.thing_id.as_deref(), Some("org.example:sensor-1"));
        assert_eq!(thing.feature_count(), 0);
        assert_eq!(thing.additional_data.get("_revision"), Some(&json!(7)));
        assert!(!thing.additional_data.contains_key("thingId"));
        Ok(())
    }

    #[test]
    fn search_result_tolerates_missing_items() -> Result<()> {
        let page: SearchResult = serde_json::from_value(json!({}))?;
        assert!(page.items.is_empty());
        assert!(page.cursor.is_none());
        Ok(())
    }

    #[test]
    fn problem_summary_prefers_message_and_description() {
        let problem = ProblemDetails {
            status: 404,
            error: Some("things:thing.notfound".into()),
            message: Some("The Thing could not be found".into()),
            description: Some("Check the identifier".into()),
        };
        assert_eq!(
            problem.summary().as_deref(),
            Some("The Thing could not be found (Check the identifier)")
        );

        let bare = ProblemDetails {
            status: 500,
            error: Some("internal".into()),
            message: None,
            description: None,
        };
        assert_eq!(bare.summary().as_deref(), Some("internal"));
    }
}
