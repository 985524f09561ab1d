#![allow(dead_code)]

use async_trait::async_trait;
use notifier_publish::{GraphqlOperation, GraphqlTransport, ResponseBody, TransportError};
use notifier_types::{marshall, ChangeRecord, EventKind, NativeImage};
use serde_json::{json, Value};
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

/// A transport that records every operation and replays queued responses.
///
/// Once the queue is empty every call succeeds with a generic publish reply.
#[derive(Default)]
pub struct RecordingTransport {
    calls: Mutex<Vec<GraphqlOperation>>,
    responses: Mutex<VecDeque<Result<ResponseBody, TransportError>>>,
}

impl RecordingTransport {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn with_responses(
        responses: impl IntoIterator<Item = Result<ResponseBody, TransportError>>,
    ) -> Arc<Self> {
        let transport = Self::default();
        transport.responses.lock().unwrap().extend(responses);
        Arc::new(transport)
    }

    pub fn calls(&self) -> Vec<GraphqlOperation> {
        self.calls.lock().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }
}

#[async_trait]
impl GraphqlTransport for RecordingTransport {
    async fn execute(&self, operation: &GraphqlOperation) -> Result<ResponseBody, TransportError> {
        self.calls.lock().unwrap().push(operation.clone());
        self.responses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Ok(publish_reply("{}")))
    }
}

pub fn publish_reply(data: &str) -> ResponseBody {
    ResponseBody::Json(json!({ "data": { "publish": data } }))
}

pub fn row(value: Value) -> serde_json::Map<String, Value> {
    value.as_object().cloned().expect("row must be a JSON object")
}

/// An `INSERT` record whose new image is `plain` in native encoding.
pub fn insert(event_id: &str, plain: Value) -> ChangeRecord {
    ChangeRecord::insert(marshall(&row(plain))).with_event_id(event_id)
}

pub fn record_of(kind: EventKind, event_id: &str, plain: Value) -> ChangeRecord {
    ChangeRecord::new(kind, Some(marshall(&row(plain)))).with_event_id(event_id)
}

pub fn native(value: Value) -> NativeImage {
    row(value)
}

/// `variables.data` of a recorded publish call, parsed back into JSON.
pub fn published_data(operation: &GraphqlOperation) -> Value {
    let data = operation.variables["data"]
        .as_str()
        .expect("variables.data must be a string");
    serde_json::from_str(data).expect("variables.data must hold JSON")
}
