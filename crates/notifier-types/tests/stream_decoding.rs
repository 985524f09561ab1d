use notifier_types::{marshall, unmarshall, unmarshall_value, EventKind, PublishPayload, StreamEvent};
use serde_json::json;

#[test]
fn insert_record_decodes_into_publish_payload() {
    let event: StreamEvent = serde_json::from_value(json!({
        "Records": [{
            "eventID": "1",
            "eventName": "INSERT",
            "dynamodb": {
                "NewImage": {
                    "id": {"S": "1"},
                    "name": {"S": "Widget"},
                    "__typename": {"S": "Product"},
                    "createdAt": {"S": "2024-03-01T10:00:00.000Z"}
                }
            }
        }]
    }))
    .unwrap();

    let record = &event.records[0];
    assert_eq!(record.event_kind, EventKind::Insert);

    let row = unmarshall_value(record.new_image().unwrap()).unwrap();
    let payload = PublishPayload::from_row(&row).unwrap();

    let decoded: serde_json::Value = serde_json::from_str(payload.data()).unwrap();
    assert_eq!(
        decoded,
        json!({
            "id": "1",
            "name": "Widget",
            "__typename": "Product",
            "createdAt": "2024-03-01T10:00:00.000Z"
        })
    );
}

#[test]
fn row_survives_marshall_and_payload_round_trip() {
    let row = json!({
        "id": "p-42",
        "owner": "a1b2c3",
        "stock": 12,
        "ratio": 0.125,
        "flags": {"featured": true, "archived": null},
        "history": [1, "two", {"three": 3}]
    });
    let row = row.as_object().unwrap().clone();

    let native = marshall(&row);
    let plain = unmarshall(&native).unwrap();
    assert_eq!(plain, row);

    let payload = PublishPayload::from_row(&plain).unwrap();
    assert_eq!(payload.row().unwrap(), row);
}
