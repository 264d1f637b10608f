//! Typed failure taxonomy for the pipeline.
//!
//! Only failures that make the requested computation meaningless get a variant
//! here; they are wrapped into `anyhow::Error` at the call site so integration
//! callers can `downcast_ref::<CoreError>()`. Per-item failures inside a batch
//! (malformed ingest records, one headline failing to process) are logged and
//! skipped, never surfaced through this type.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum CoreError {
    #[error("headline {0} not found")]
    HeadlineNotFound(i64),

    #[error("ticker '{0}' not found")]
    TickerNotFound(String),

    /// A collaborator or the store returned an empty/insufficient series.
    #[error("no data: {0}")]
    NoData(String),
}
