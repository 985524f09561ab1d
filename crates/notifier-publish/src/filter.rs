//! Change-event eligibility.
//!
//! Only row creations are forwarded. The check is pure and fails closed:
//! anything that is not an `INSERT` carrying a non-empty `NewImage` is
//! skipped rather than treated as an error. An image that is present but not
//! an attribute map is passed on so that decoding reports it.

use notifier_types::{ChangeRecord, EventKind};
use serde::Serialize;
use serde_json::Value;

/// Why a record was not forwarded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum SkipReason {
    /// The record is not a row creation.
    NotInsert { event_kind: EventKind },
    /// The record has no `NewImage`.
    MissingImage,
    /// The `NewImage` has no attributes.
    EmptyImage,
}

impl std::fmt::Display for SkipReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NotInsert { event_kind } => write!(f, "event {event_kind} is not forwarded"),
            Self::MissingImage => f.write_str("record has no new image"),
            Self::EmptyImage => f.write_str("new image is empty"),
        }
    }
}

/// Returns the record's raw new image if it should be forwarded.
pub fn check(record: &ChangeRecord) -> Result<&Value, SkipReason> {
    if record.event_kind != EventKind::Insert {
        return Err(SkipReason::NotInsert {
            event_kind: record.event_kind,
        });
    }
    match record.new_image() {
        None => Err(SkipReason::MissingImage),
        Some(Value::Object(map)) if map.is_empty() => Err(SkipReason::EmptyImage),
        Some(image) => Ok(image),
    }
}

/// True iff the record is an `INSERT` with a non-empty new image.
pub fn is_eligible(record: &ChangeRecord) -> bool {
    check(record).is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use notifier_types::{NativeImage, StreamRecord};
    use serde_json::json;

    fn image() -> NativeImage {
        json!({"id": {"S": "1"}}).as_object().cloned().unwrap()
    }

    #[test]
    fn insert_with_image_is_eligible() {
        assert!(is_eligible(&ChangeRecord::insert(image())));
    }

    #[test]
    fn update_and_delete_are_not_eligible() {
        for kind in [EventKind::Update, EventKind::Delete, EventKind::Unknown] {
            let record = ChangeRecord::new(kind, Some(image()));
            assert_eq!(
                check(&record).unwrap_err(),
                SkipReason::NotInsert { event_kind: kind }
            );
        }
    }

    #[test]
    fn insert_without_image_is_not_eligible() {
        let record = ChangeRecord::new(EventKind::Insert, None);
        assert_eq!(check(&record).unwrap_err(), SkipReason::MissingImage);

        let no_dynamodb = ChangeRecord {
            event_kind: EventKind::Insert,
            ..ChangeRecord::default()
        };
        assert_eq!(check(&no_dynamodb).unwrap_err(), SkipReason::MissingImage);
    }

    #[test]
    fn insert_with_empty_image_is_not_eligible() {
        let record = ChangeRecord::new(EventKind::Insert, Some(NativeImage::new()));
        assert_eq!(check(&record).unwrap_err(), SkipReason::EmptyImage);
    }

    #[test]
    fn non_map_image_is_forwarded_for_decoding() {
        let record: ChangeRecord = serde_json::from_value(json!({
            "eventName": "INSERT",
            "dynamodb": {"NewImage": ["id", "1"]}
        }))
        .unwrap();
        assert_eq!(check(&record), Ok(&json!(["id", "1"])));
    }

    #[test]
    fn keys_alone_do_not_make_a_record_eligible() {
        let record = ChangeRecord {
            event_kind: EventKind::Insert,
            dynamodb: Some(StreamRecord {
                keys: Some(image()),
                ..StreamRecord::default()
            }),
            ..ChangeRecord::default()
        };
        assert!(!is_eligible(&record));
    }

    #[test]
    fn malformed_record_fails_closed() {
        let record: ChangeRecord = serde_json::from_value(json!({
            "dynamodb": {"NewImage": {"id": {"S": "1"}}}
        }))
        .unwrap();
        assert!(!is_eligible(&record));
    }

    #[test]
    fn repeated_checks_agree() {
        let records = [
            ChangeRecord::insert(image()),
            ChangeRecord::new(EventKind::Update, Some(image())),
            ChangeRecord::new(EventKind::Insert, None),
        ];
        for record in &records {
            assert_eq!(is_eligible(record), is_eligible(record));
            assert_eq!(check(record), check(record));
        }
    }
}
