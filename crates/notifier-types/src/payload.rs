use crate::attribute::PlainRow;
use serde::{Deserialize, Serialize};

/// The outbound message for the `publish` mutation.
///
/// `data` is the row serialised to a JSON string, sent as the mutation's
/// single `AWSJSON` argument. The pipeline never looks inside it again.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PublishPayload {
    data: String,
}

impl PublishPayload {
    /// Serialises a plain row into a payload.
    pub fn from_row(row: &PlainRow) -> Result<Self, serde_json::Error> {
        Ok(Self {
            data: serde_json::to_string(row)?,
        })
    }

    /// The string-encoded row.
    pub fn data(&self) -> &str {
        &self.data
    }

    /// Parses `data` back into a plain row.
    pub fn row(&self) -> Result<PlainRow, serde_json::Error> {
        serde_json::from_str(&self.data)
    }

    /// The GraphQL variables object for the mutation: `{"data": "<string>"}`.
    pub fn variables(&self) -> serde_json::Value {
        serde_json::json!({ "data": self.data })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn data_is_compact_json_string() {
        let row = json!({"id": "1", "name": "Widget"});
        let payload = PublishPayload::from_row(row.as_object().unwrap()).unwrap();
        assert_eq!(payload.data(), r#"{"id":"1","name":"Widget"}"#);
        assert_eq!(
            payload.variables(),
            json!({"data": "{\"id\":\"1\",\"name\":\"Widget\"}"})
        );
    }

    #[test]
    fn row_restores_nested_values() {
        let row = json!({
            "id": "9",
            "price": 3.5,
            "owner": {"sub": "u-1", "groups": ["admin", "ops"]},
            "note": "line one\nline \"two\""
        });
        let payload = PublishPayload::from_row(row.as_object().unwrap()).unwrap();
        assert_eq!(&payload.row().unwrap(), row.as_object().unwrap());
    }
}
