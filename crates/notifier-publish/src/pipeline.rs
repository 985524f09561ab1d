//! The publish pipeline: filter, decode, serialise, sign and send, report.
//!
//! Records are processed one at a time in delivery order; the next record
//! is not touched while a request is outstanding. Every failure is turned
//! into a [`RecordOutcome`], including a panic raised while publishing;
//! nothing escapes [`PublishPipeline::handle_batch`].

use crate::error::PipelineError;
use crate::filter;
use crate::operation::GraphqlOperation;
use crate::result::{BatchResult, PublishFailure, RecordOutcome, RecordReport};
use crate::transport::{GraphqlTransport, ResponseBody};
use futures_util::FutureExt;
use notifier_types::{unmarshall_value, ChangeRecord, PublishPayload};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::any::Any;
use std::panic::AssertUnwindSafe;
use tracing::Instrument;

/// How much of a batch to process.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum BatchStrategy {
    /// Stop after the first record that is published or fails; later records
    /// are never attempted. This is the legacy handler's behaviour.
    FirstOnly,
    /// Attempt every eligible record.
    #[default]
    All,
}

impl BatchStrategy {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::FirstOnly => "first-only",
            Self::All => "all",
        }
    }
}

impl std::fmt::Display for BatchStrategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when parsing an unknown strategy name.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown batch strategy: {0} (expected `all` or `first-only`)")]
pub struct ParseBatchStrategyError(pub String);

impl std::str::FromStr for BatchStrategy {
    type Err = ParseBatchStrategyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "all" => Ok(Self::All),
            "first-only" | "first_only" | "first" => Ok(Self::FirstOnly),
            _ => Err(ParseBatchStrategyError(s.to_string())),
        }
    }
}

/// Forwards newly inserted rows to the GraphQL `publish` mutation.
///
/// Holds no mutable state; one instance can serve any number of invocations.
#[derive(Debug)]
pub struct PublishPipeline<T> {
    transport: T,
    strategy: BatchStrategy,
}

impl<T: GraphqlTransport> PublishPipeline<T> {
    pub fn new(transport: T) -> Self {
        Self {
            transport,
            strategy: BatchStrategy::default(),
        }
    }

    pub fn with_strategy(mut self, strategy: BatchStrategy) -> Self {
        self.strategy = strategy;
        self
    }

    pub fn strategy(&self) -> BatchStrategy {
        self.strategy
    }

    /// Processes one delivered batch.
    pub async fn handle_batch(&self, records: &[ChangeRecord]) -> BatchResult {
        let invocation_id = uuid::Uuid::new_v4();
        let span = tracing::info_span!(
            "invocation",
            %invocation_id,
            records = records.len(),
            strategy = %self.strategy
        );
        self.process(records).instrument(span).await
    }

    async fn process(&self, records: &[ChangeRecord]) -> BatchResult {
        let mut reports = Vec::with_capacity(records.len());

        for (index, record) in records.iter().enumerate() {
            let event_id = record.event_id.as_deref().unwrap_or("-");
            let sequence_number = record.sequence_number().unwrap_or("-");
            let outcome = match filter::check(record) {
                Err(reason) => {
                    tracing::debug!(index, event_id, sequence_number, %reason, "skipping record");
                    RecordOutcome::Skipped { reason }
                }
                Ok(image) => match self.publish(image).await {
                    Ok(response) => {
                        tracing::debug!(index, event_id, sequence_number, "published record");
                        RecordOutcome::Published { response }
                    }
                    Err(error) => {
                        tracing::warn!(
                            index,
                            event_id,
                            sequence_number,
                            %error,
                            "failed to publish record"
                        );
                        RecordOutcome::Failed { error }
                    }
                },
            };

            let terminal = outcome.is_terminal();
            reports.push(RecordReport {
                index,
                event_id: record.event_id.clone(),
                outcome,
            });

            if terminal && self.strategy == BatchStrategy::FirstOnly {
                let remaining = records.len() - index - 1;
                if remaining > 0 {
                    tracing::debug!(remaining, "first-only strategy: leaving rest of batch");
                }
                break;
            }
        }

        let result = BatchResult::from_reports(reports);
        tracing::info!(
            status = ?result.status,
            attempted = result.attempted(),
            published = result.published,
            failed = result.failed,
            skipped = result.skipped,
            "batch processed"
        );
        result
    }

    /// Publishes one image. A panic anywhere below is caught and reported
    /// as [`PublishFailure::Unexpected`].
    async fn publish(&self, image: &Value) -> Result<ResponseBody, PublishFailure> {
        match AssertUnwindSafe(self.try_publish(image)).catch_unwind().await {
            Ok(result) => result.map_err(PublishFailure::from),
            Err(panic) => Err(PublishFailure::Unexpected {
                detail: panic_message(panic.as_ref()),
            }),
        }
    }

    async fn try_publish(&self, image: &Value) -> Result<ResponseBody, PipelineError> {
        let row = unmarshall_value(image)?;
        let payload = PublishPayload::from_row(&row).map_err(PipelineError::Encoding)?;
        let operation = GraphqlOperation::publish(&payload);
        Ok(self.transport.execute(&operation).await?)
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        format!("publish panicked: {s}")
    } else if let Some(s) = panic.downcast_ref::<String>() {
        format!("publish panicked: {s}")
    } else {
        "publish panicked".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strategy_parses_from_config_strings() {
        assert_eq!("all".parse::<BatchStrategy>().unwrap(), BatchStrategy::All);
        assert_eq!(
            "First-Only".parse::<BatchStrategy>().unwrap(),
            BatchStrategy::FirstOnly
        );
        assert!("some".parse::<BatchStrategy>().is_err());
    }

    #[test]
    fn default_strategy_processes_everything() {
        assert_eq!(BatchStrategy::default(), BatchStrategy::All);
    }

    #[test]
    fn panic_payloads_become_messages() {
        let literal: Box<dyn Any + Send> = Box::new("boom");
        assert_eq!(panic_message(literal.as_ref()), "publish panicked: boom");

        let formatted: Box<dyn Any + Send> = Box::new(format!("bad {}", 7));
        assert_eq!(panic_message(formatted.as_ref()), "publish panicked: bad 7");

        let opaque: Box<dyn Any + Send> = Box::new(7_u8);
        assert_eq!(panic_message(opaque.as_ref()), "publish panicked");
    }

    #[test]
    fn strategy_deserializes_kebab_case() {
        let parsed: BatchStrategy = serde_json::from_str("\"first-only\"").unwrap();
        assert_eq!(parsed, BatchStrategy::FirstOnly);
    }
}
