//! Change-log records as delivered by the table's stream binding.

use crate::attribute::NativeImage;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;

/// The kind of row mutation a change record describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum EventKind {
    /// A new row was created (`INSERT`).
    Insert,
    /// An existing row changed (`MODIFY`).
    Update,
    /// A row was removed (`REMOVE`).
    Delete,
    /// Missing, non-string, or unrecognised event name.
    #[default]
    Unknown,
}

impl EventKind {
    /// Maps a wire `eventName` to a kind. Unrecognised names become `Unknown`.
    pub fn from_event_name(name: &str) -> Self {
        match name {
            "INSERT" => Self::Insert,
            "MODIFY" => Self::Update,
            "REMOVE" => Self::Delete,
            _ => Self::Unknown,
        }
    }

    /// Returns the wire `eventName` for this kind.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Insert => "INSERT",
            Self::Update => "MODIFY",
            Self::Delete => "REMOVE",
            Self::Unknown => "UNKNOWN",
        }
    }
}

impl std::fmt::Display for EventKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for EventKind {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for EventKind {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = Value::deserialize(deserializer)?;
        Ok(raw
            .as_str()
            .map(Self::from_event_name)
            .unwrap_or_default())
    }
}

/// Reads an optional correlation field, treating a value of the wrong type
/// as absent.
fn lenient_field<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let raw = Value::deserialize(deserializer)?;
    Ok(T::deserialize(raw).ok())
}

/// The `dynamodb` section of a change record.
///
/// Only `NewImage` drives behaviour; the remaining fields are carried for
/// log correlation and never fail the record when they are oddly typed.
/// `NewImage` is kept as raw JSON so that a malformed image is rejected
/// when it is decoded, against this record alone.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct StreamRecord {
    #[serde(default, deserialize_with = "lenient_field", skip_serializing_if = "Option::is_none")]
    pub keys: Option<NativeImage>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub new_image: Option<Value>,
    #[serde(default, deserialize_with = "lenient_field", skip_serializing_if = "Option::is_none")]
    pub old_image: Option<NativeImage>,
    #[serde(default, deserialize_with = "lenient_field", skip_serializing_if = "Option::is_none")]
    pub sequence_number: Option<String>,
    #[serde(default, deserialize_with = "lenient_field", skip_serializing_if = "Option::is_none")]
    pub size_bytes: Option<u64>,
    #[serde(default, deserialize_with = "lenient_field", skip_serializing_if = "Option::is_none")]
    pub stream_view_type: Option<String>,
    #[serde(default, deserialize_with = "lenient_field", skip_serializing_if = "Option::is_none")]
    pub approximate_creation_date_time: Option<f64>,
}

/// One notification of a row mutation read from the change log.
///
/// `NewImage` stays in its native encoding so that a malformed attribute
/// is reported against this record alone rather than failing the batch.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangeRecord {
    #[serde(
        rename = "eventID",
        default,
        deserialize_with = "lenient_field",
        skip_serializing_if = "Option::is_none"
    )]
    pub event_id: Option<String>,

    #[serde(rename = "eventName", default)]
    pub event_kind: EventKind,

    #[serde(default, deserialize_with = "lenient_field", skip_serializing_if = "Option::is_none")]
    pub event_source: Option<String>,

    #[serde(default, deserialize_with = "lenient_field", skip_serializing_if = "Option::is_none")]
    pub aws_region: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dynamodb: Option<StreamRecord>,
}

impl ChangeRecord {
    /// Builds a record of the given kind carrying `new_image`.
    pub fn new(event_kind: EventKind, new_image: Option<NativeImage>) -> Self {
        Self {
            event_kind,
            dynamodb: Some(StreamRecord {
                new_image: new_image.map(Value::Object),
                ..StreamRecord::default()
            }),
            ..Self::default()
        }
    }

    /// Shorthand for an `INSERT` record with a new image.
    pub fn insert(new_image: NativeImage) -> Self {
        Self::new(EventKind::Insert, Some(new_image))
    }

    /// Sets the `eventID`.
    pub fn with_event_id(mut self, event_id: impl Into<String>) -> Self {
        self.event_id = Some(event_id.into());
        self
    }

    /// The raw post-mutation row, if the record carries one. A JSON `null`
    /// counts as absent.
    pub fn new_image(&self) -> Option<&Value> {
        self.dynamodb
            .as_ref()?
            .new_image
            .as_ref()
            .filter(|image| !image.is_null())
    }

    /// The stream sequence number, if present.
    pub fn sequence_number(&self) -> Option<&str> {
        self.dynamodb.as_ref()?.sequence_number.as_deref()
    }
}

/// A batch of change records as delivered to one invocation.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StreamEvent {
    /// Records in delivery order. An entry that does not parse as a change
    /// record keeps whatever `eventID`, `eventName` and `NewImage` can be read
    /// from it instead of rejecting its neighbours.
    #[serde(rename = "Records", default, deserialize_with = "lenient_records")]
    pub records: Vec<ChangeRecord>,
}

fn lenient_records<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<ChangeRecord>, D::Error> {
    let raw = Vec::<Value>::deserialize(deserializer)?;
    Ok(raw
        .into_iter()
        .map(|value| {
            ChangeRecord::deserialize(&value).unwrap_or_else(|_| salvage_record(&value))
        })
        .collect())
}

fn salvage_record(value: &Value) -> ChangeRecord {
    let new_image = value
        .pointer("/dynamodb/NewImage")
        .filter(|image| !image.is_null())
        .cloned();
    ChangeRecord {
        event_id: value
            .get("eventID")
            .and_then(Value::as_str)
            .map(str::to_string),
        event_kind: value
            .get("eventName")
            .and_then(Value::as_str)
            .map(EventKind::from_event_name)
            .unwrap_or_default(),
        dynamodb: new_image.map(|image| StreamRecord {
            new_image: Some(image),
            ..StreamRecord::default()
        }),
        ..ChangeRecord::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn parses_full_stream_record() {
        let event: StreamEvent = serde_json::from_value(json!({
            "Records": [{
                "eventID": "c4ca4238a0b923820dcc509a6f75849b",
                "eventName": "INSERT",
                "eventVersion": "1.1",
                "eventSource": "aws:dynamodb",
                "awsRegion": "us-east-1",
                "dynamodb": {
                    "Keys": {"id": {"S": "1"}},
                    "NewImage": {"id": {"S": "1"}, "name": {"S": "Widget"}},
                    "ApproximateCreationDateTime": 1428537600.0,
                    "SequenceNumber": "4421584500000000017450439091",
                    "SizeBytes": 26,
                    "StreamViewType": "NEW_IMAGE"
                },
                "eventSourceARN": "arn:aws:dynamodb:us-east-1:123456789012:table/ProductTable/stream/2015-06-27T00:48:05.899"
            }]
        }))
        .unwrap();

        assert_eq!(event.records.len(), 1);
        let record = &event.records[0];
        assert_eq!(record.event_kind, EventKind::Insert);
        assert_eq!(record.event_id.as_deref(), Some("c4ca4238a0b923820dcc509a6f75849b"));
        assert_eq!(record.aws_region.as_deref(), Some("us-east-1"));
        assert_eq!(record.sequence_number(), Some("4421584500000000017450439091"));
        assert_eq!(record.new_image().unwrap()["name"], json!({"S": "Widget"}));
    }

    #[test]
    fn event_names_map_to_kinds() {
        for (name, kind) in [
            ("INSERT", EventKind::Insert),
            ("MODIFY", EventKind::Update),
            ("REMOVE", EventKind::Delete),
            ("TRUNCATE", EventKind::Unknown),
        ] {
            let record: ChangeRecord =
                serde_json::from_value(json!({ "eventName": name })).unwrap();
            assert_eq!(record.event_kind, kind, "eventName {name}");
        }
    }

    #[test]
    fn missing_or_non_string_event_name_is_unknown() {
        let missing: ChangeRecord = serde_json::from_value(json!({})).unwrap();
        assert_eq!(missing.event_kind, EventKind::Unknown);

        let numeric: ChangeRecord = serde_json::from_value(json!({ "eventName": 7 })).unwrap();
        assert_eq!(numeric.event_kind, EventKind::Unknown);
    }

    #[test]
    fn malformed_entry_does_not_reject_batch() {
        let event: StreamEvent = serde_json::from_value(json!({
            "Records": [
                {"eventID": "bad", "eventName": "INSERT", "dynamodb": "not-an-object"},
                {"eventName": "INSERT", "dynamodb": {"NewImage": {"id": {"S": "2"}}}},
                42
            ]
        }))
        .unwrap();

        assert_eq!(event.records.len(), 3);
        assert_eq!(event.records[0].event_kind, EventKind::Insert);
        assert_eq!(event.records[0].event_id.as_deref(), Some("bad"));
        assert!(event.records[0].new_image().is_none());
        assert_eq!(event.records[1].event_kind, EventKind::Insert);
        assert_eq!(event.records[2].event_kind, EventKind::Unknown);
    }

    #[test]
    fn oddly_typed_correlation_fields_keep_the_record() {
        let record: ChangeRecord = serde_json::from_value(json!({
            "eventID": 17,
            "eventName": "INSERT",
            "awsRegion": ["us-east-1"],
            "eventSource": {"name": "aws:dynamodb"},
            "dynamodb": {
                "NewImage": {"id": {"S": "1"}},
                "ApproximateCreationDateTime": "2024-03-01T10:00:00Z",
                "SizeBytes": "26",
                "SequenceNumber": 4421,
                "Keys": "id"
            }
        }))
        .unwrap();

        assert_eq!(record.event_kind, EventKind::Insert);
        assert_eq!(record.event_id, None);
        assert_eq!(record.aws_region, None);
        assert_eq!(record.sequence_number(), None);
        assert_eq!(record.new_image(), Some(&json!({"id": {"S": "1"}})));
    }

    #[test]
    fn non_object_image_is_kept_for_decoding() {
        let record: ChangeRecord = serde_json::from_value(json!({
            "eventName": "INSERT",
            "dynamodb": {"NewImage": ["id", "1"]}
        }))
        .unwrap();

        assert_eq!(record.event_kind, EventKind::Insert);
        assert_eq!(record.new_image(), Some(&json!(["id", "1"])));
    }

    #[test]
    fn null_image_counts_as_absent() {
        let record: ChangeRecord = serde_json::from_value(json!({
            "eventName": "INSERT",
            "dynamodb": {"NewImage": null}
        }))
        .unwrap();
        assert!(record.new_image().is_none());
    }

    #[test]
    fn missing_records_key_is_empty_batch() {
        let event: StreamEvent = serde_json::from_value(json!({})).unwrap();
        assert!(event.records.is_empty());
    }

    #[test]
    fn serializes_with_wire_event_name() {
        let record = ChangeRecord::new(EventKind::Update, None).with_event_id("e-1");
        let value = serde_json::to_value(&record).unwrap();
        assert_eq!(value["eventName"], "MODIFY");
        assert_eq!(value["eventID"], "e-1");
    }
}
