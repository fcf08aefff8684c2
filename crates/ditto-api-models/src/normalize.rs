//! Canonical record extraction for API responses.
//!
//! # Design
//! - Typed fields are copied first, in declared order, and only when present
//!   and non-empty; absent values never surface as `null` keys.
//! - The extension bag is merged afterwards. A bag key that collides with a
//!   typed field overwrites it in place and is reported through `tracing`.
//! - A missing response is [`Normalized::NotFound`], never an empty record.

use serde_json::{Map, Value};

use crate::models::{Connection, ExtensionData, Thing, WhoAmI};

/// Ordered field-name to JSON-value mapping describing one resource.
pub type NormalizedRecord = Map<String, Value>;

/// Outcome of normalizing an optional API response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Normalized {
    /// The response was present; carries its canonical record.
    Found(NormalizedRecord),
    /// The response was absent (404, empty body, or JSON `null`).
    NotFound,
}

impl Normalized {
    /// Consume the outcome, yielding the record when one was found.
    #[must_use]
    pub fn into_record(self) -> Option<NormalizedRecord> {
        match self {
            Self::Found(record) => Some(record),
            Self::NotFound => None,
        }
    }

    /// Whether the response was present.
    #[must_use]
    pub const fn is_found(&self) -> bool {
        matches!(self, Self::Found(_))
    }
}

/// Resource exposing typed fields plus an open extension bag.
pub trait ApiResource {
    /// Typed fields in their declared order, omitting absent or empty ones.
    fn structured_fields(&self) -> NormalizedRecord {
        NormalizedRecord::new()
    }

    /// Open-ended overflow fields.
    fn extension_data(&self) -> &ExtensionData;

    /// Merge typed fields and extension data into one canonical record.
    fn to_record(&self) -> NormalizedRecord {
        let mut record = self.structured_fields();
        for (key, value) in self.extension_data() {
            if record.contains_key(key) {
                tracing::warn!(key = %key, "extension data overrides a structured field");
            }
            record.insert(key.clone(), value.clone());
        }
        record
    }
}

/// Normalize an optional response into a record or the not-found signal.
#[must_use]
pub fn normalize<R: ApiResource + ?Sized>(response: Option<&R>) -> Normalized {
    response.map_or(Normalized::NotFound, |resource| {
        Normalized::Found(resource.to_record())
    })
}

/// Every resource kind the CLI renders, tagged by shape.
#[derive(Debug, Clone, PartialEq)]
pub enum Resource {
    /// Digital twin.
    Thing(Thing),
    /// Managed connection.
    Connection(Connection),
    /// Caller identity.
    WhoAmI(WhoAmI),
    /// Schemaless document (policies, permission results, logging and
    /// service configuration).
    Document(ExtensionData),
}

impl ApiResource for Resource {
    fn structured_fields(&self) -> NormalizedRecord {
        match self {
            Self::Thing(thing) => thing.structured_fields(),
            Self::Connection(connection) => connection.structured_fields(),
            Self::WhoAmI(identity) => identity.structured_fields(),
            Self::Document(document) => document.structured_fields(),
        }
    }

    fn extension_data(&self) -> &ExtensionData {
        match self {
            Self::Thing(thing) => thing.extension_data(),
            Self::Connection(connection) => connection.extension_data(),
            Self::WhoAmI(identity) => identity.extension_data(),
            Self::Document(document) => document,
        }
    }
}

impl ApiResource for Thing {
    fn structured_fields(&self) -> NormalizedRecord {
        let mut record = NormalizedRecord::new();
        insert_text(&mut record, "thingId", self.thing_id.as_deref());
        insert_text(&mut record, "policyId", self.policy_id.as_deref());
        insert_text(&mut record, "definition", self.definition.as_deref());
        insert_object(&mut record, "attributes", self.attributes.as_ref());
        insert_object(&mut record, "features", self.features.as_ref());
        record
    }

    fn extension_data(&self) -> &ExtensionData {
        &self.additional_data
    }
}

impl ApiResource for Connection {
    fn structured_fields(&self) -> NormalizedRecord {
        let mut record = NormalizedRecord::new();
        insert_text(&mut record, "id", self.id.as_deref());
        insert_text(
            &mut record,
            "connectionStatus",
            self.connection_status.as_deref(),
        );
        insert_text(&mut record, "connectionType", self.connection_type.as_deref());
        insert_text(&mut record, "uri", self.uri.as_deref());
        record
    }

    fn extension_data(&self) -> &ExtensionData {
        &self.additional_data
    }
}

/// `subjects` is always emitted, even when empty.
impl ApiResource for WhoAmI {
    fn structured_fields(&self) -> NormalizedRecord {
        let mut record = NormalizedRecord::new();
        insert_text(&mut record, "defaultSubject", self.default_subject.as_deref());
        let subjects = self.subjects.iter().cloned().map(Value::String).collect();
        record.insert("subjects".to_string(), Value::Array(subjects));
        record
    }

    fn extension_data(&self) -> &ExtensionData {
        &self.additional_data
    }
}

impl ApiResource for ExtensionData {
    fn extension_data(&self) -> &ExtensionData {
        self
    }
}

fn insert_text(record: &mut NormalizedRecord, key: &str, value: Option<&str>) {
    if let Some(text) = value.filter(|text| !text.is_empty()) {
        record.insert(key.to_string(), Value::String(text.to_string()));
    }
}

fn insert_object(record: &mut NormalizedRecord, key: &str, value: Option<&ExtensionData>) {
    if let Some(map) = value.filter(|map| !map.is_empty()) {
        record.insert(key.to_string(), Value::Object(map.clone()));
    }
}
