use notifier_types::PublishPayload;
use serde::Serialize;
use serde_json::Value;

/// The mutation that fans a row out to subscribers.
pub const PUBLISH_MUTATION: &str = "mutation Publish($data: AWSJSON) { publish(data: $data) }";

/// Operation name sent alongside [`PUBLISH_MUTATION`].
pub const PUBLISH_OPERATION_NAME: &str = "Publish";

/// A GraphQL request body: `{query, operationName, variables}`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GraphqlOperation {
    pub query: String,
    pub operation_name: String,
    pub variables: Value,
}

impl GraphqlOperation {
    pub fn new(query: impl Into<String>, operation_name: impl Into<String>, variables: Value) -> Self {
        Self {
            query: query.into(),
            operation_name: operation_name.into(),
            variables,
        }
    }

    /// The `publish` mutation carrying `payload` as its `data` argument.
    pub fn publish(payload: &PublishPayload) -> Self {
        Self::new(PUBLISH_MUTATION, PUBLISH_OPERATION_NAME, payload.variables())
    }

    /// Serialises the body exactly once; these are the bytes that get signed
    /// and sent.
    pub fn to_body(&self) -> Result<Vec<u8>, serde_json::Error> {
        serde_json::to_vec(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn publish_body_has_expected_shape() {
        let row = json!({"id": "1", "name": "Widget"});
        let payload = PublishPayload::from_row(row.as_object().unwrap()).unwrap();
        let body = GraphqlOperation::publish(&payload).to_body().unwrap();

        let parsed: Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(
            parsed,
            json!({
                "query": "mutation Publish($data: AWSJSON) { publish(data: $data) }",
                "operationName": "Publish",
                "variables": {"data": "{\"id\":\"1\",\"name\":\"Widget\"}"}
            })
        );
    }
}
