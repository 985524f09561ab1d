//! Per-record and per-batch outcomes.

use crate::error::{PipelineError, TransportErrorKind};
use crate::filter::SkipReason;
use crate::transport::ResponseBody;
use serde::Serialize;
use serde_json::{json, Value};

/// Legacy status code for a published record.
pub const LEGACY_SUCCESS_CODE: u16 = 200;

/// Legacy status code for every failure. It is a sentinel and does not mean
/// "not found".
pub const LEGACY_FAILURE_CODE: u16 = 404;

/// Why an eligible record could not be published.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, thiserror::Error)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PublishFailure {
    /// The native row encoding was malformed.
    #[error("row deserialization failed at `{path}`: {detail}")]
    Deserialization { path: String, detail: String },

    /// The decoded row could not be serialised.
    #[error("payload encoding failed: {detail}")]
    Encoding { detail: String },

    /// The signed call failed.
    #[error("transport failed: {detail}")]
    Transport {
        cause: TransportErrorKind,
        #[serde(skip_serializing_if = "Option::is_none")]
        status: Option<u16>,
        detail: String,
    },

    /// Publishing panicked; the panic was contained to this record.
    #[error("unexpected failure: {detail}")]
    Unexpected { detail: String },
}

impl From<PipelineError> for PublishFailure {
    fn from(err: PipelineError) -> Self {
        match err {
            PipelineError::Deserialization(inner) => Self::Deserialization {
                path: inner.path().to_string(),
                detail: inner.to_string(),
            },
            PipelineError::Encoding(inner) => Self::Encoding {
                detail: inner.to_string(),
            },
            PipelineError::Transport(inner) => Self::Transport {
                cause: inner.kind(),
                status: inner.status(),
                detail: inner.to_string(),
            },
        }
    }
}

/// What happened to one record of a batch.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum RecordOutcome {
    /// The mutation was accepted; `response` is the endpoint's reply.
    Published { response: ResponseBody },
    /// The record was filtered out and never reached the transport.
    Skipped {
        #[serde(flatten)]
        reason: SkipReason,
    },
    /// The record was eligible but publishing failed.
    Failed { error: PublishFailure },
}

impl RecordOutcome {
    /// Published or failed: the record reached the publish step.
    pub fn is_terminal(&self) -> bool {
        !matches!(self, Self::Skipped { .. })
    }

    /// The legacy sentinel status code, or `None`
    /// for skipped records.
    pub fn legacy_status_code(&self) -> Option<u16> {
        match self {
            Self::Published { .. } => Some(LEGACY_SUCCESS_CODE),
            Self::Failed { .. } => Some(LEGACY_FAILURE_CODE),
            Self::Skipped { .. } => None,
        }
    }

    /// The legacy `{statusCode, body}` object for this record.
    pub fn legacy_response(&self) -> Option<Value> {
        match self {
            Self::Published { response } => Some(json!({
                "statusCode": LEGACY_SUCCESS_CODE,
                "body": response,
            })),
            Self::Failed { error } => Some(json!({
                "statusCode": LEGACY_FAILURE_CODE,
                "body": { "error": error.to_string() },
            })),
            Self::Skipped { .. } => None,
        }
    }
}

/// One record's outcome, tagged with its position in the batch.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RecordReport {
    pub index: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub event_id: Option<String>,
    #[serde(flatten)]
    pub outcome: RecordOutcome,
}

/// Summary status of a whole invocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum BatchStatus {
    /// No record was eligible; nothing was sent.
    Noop,
    /// Every attempted record was published.
    Ok,
    /// Some attempted records were published and some failed.
    Partial,
    /// Every attempted record failed.
    Error,
}

/// The result of one pipeline invocation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BatchResult {
    pub status: BatchStatus,
    pub published: usize,
    pub failed: usize,
    pub skipped: usize,
    pub records: Vec<RecordReport>,
}

impl BatchResult {
    pub fn from_reports(records: Vec<RecordReport>) -> Self {
        let mut published = 0;
        let mut failed = 0;
        let mut skipped = 0;
        for report in &records {
            match report.outcome {
                RecordOutcome::Published { .. } => published += 1,
                RecordOutcome::Failed { .. } => failed += 1,
                RecordOutcome::Skipped { .. } => skipped += 1,
            }
        }

        let status = match (published, failed) {
            (0, 0) => BatchStatus::Noop,
            (_, 0) => BatchStatus::Ok,
            (0, _) => BatchStatus::Error,
            _ => BatchStatus::Partial,
        };

        Self {
            status,
            published,
            failed,
            skipped,
            records,
        }
    }

    /// Number of records that reached the publish step.
    pub fn attempted(&self) -> usize {
        self.published + self.failed
    }

    /// The first record that was published or failed.
    pub fn first_terminal(&self) -> Option<&RecordReport> {
        self.records.iter().find(|r| r.outcome.is_terminal())
    }

    /// Failed records, in batch order.
    pub fn failures(&self) -> impl Iterator<Item = &RecordReport> {
        self.records
            .iter()
            .filter(|r| matches!(r.outcome, RecordOutcome::Failed { .. }))
    }

    /// The legacy single-outcome response: the first terminal
    /// record's `{statusCode, body}`, or `{"status": "noop"}`.
    pub fn legacy_response(&self) -> Value {
        self.first_terminal()
            .and_then(|report| report.outcome.legacy_response())
            .unwrap_or_else(|| json!({ "status": "noop" }))
    }
}
