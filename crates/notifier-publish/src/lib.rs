//! Change-capture to publish pipeline.
//!
//! Consumes batches of change-log records, keeps only row creations, and
//! republishes each new row through the GraphQL `publish` mutation so that
//! subscribers are notified. The pieces:
//!
//! - [`filter`]: pure eligibility check (`INSERT` with a non-empty image).
//! - [`AppSyncTransport`]: builds, signs, and sends one `POST` per record.
//! - [`PublishPipeline`]: sequential orchestration with a per-record
//!   [`BatchResult`].
//!
//! Delivery is best-effort and at-least-once: nothing is retried here and no
//! dedup state is kept, so an upstream redelivery republishes its rows.

mod error;
pub mod filter;
mod operation;
mod pipeline;
mod result;
mod transport;

pub use error::{PipelineError, TransportError, TransportErrorKind};
pub use filter::{is_eligible, SkipReason};
pub use operation::{GraphqlOperation, PUBLISH_MUTATION, PUBLISH_OPERATION_NAME};
pub use pipeline::{BatchStrategy, ParseBatchStrategyError, PublishPipeline};
pub use result::{
    BatchResult, BatchStatus, PublishFailure, RecordOutcome, RecordReport, LEGACY_FAILURE_CODE,
    LEGACY_SUCCESS_CODE,
};
pub use transport::{
    AppSyncTransport, GraphqlTransport, ResponseBody, TransportConfig, DEFAULT_TIMEOUT,
};
