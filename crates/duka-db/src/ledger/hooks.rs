//! # Post-commit Hooks
//!
//! Best-effort side effects that run after a receipt is durably committed:
//! tax-authority submission, printer dispatch, live dashboards.
//!
//! ```text
//! commit_receipt ──► COMMIT ──► return CommittedReceipt to caller
//!                        │
//!                        └──► tokio::spawn ──► sink A ──► error? warn!, drop
//!                                         └──► sink B ──► error? warn!, drop
//! ```
//!
//! A sink can never fail or roll back the sale it is told about.

use std::error::Error;
use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, warn};

use duka_core::CommittedReceipt;

/// Error type sinks report. Only ever logged.
pub type SinkError = Box<dyn Error + Send + Sync>;

/// Receives every committed receipt.
#[async_trait]
pub trait ReceiptSink: Send + Sync {
    /// Short name used in log events.
    fn name(&self) -> &str;

    async fn receipt_committed(&self, committed: &CommittedReceipt) -> Result<(), SinkError>;
}

/// Runs every sink on a background task and returns immediately.
///
/// Must be called from within a Tokio runtime.
pub(crate) fn dispatch(sinks: &[Arc<dyn ReceiptSink>], committed: &CommittedReceipt) {
    if sinks.is_empty() {
        return;
    }

    let sinks = sinks.to_vec();
    let committed = committed.clone();

    tokio::spawn(async move {
        for sink in sinks {
            match sink.receipt_committed(&committed).await {
                Ok(()) => debug!(
                    sink = sink.name(),
                    receipt_number = %committed.receipt.receipt_number,
                    "Receipt sink completed"
                ),
                Err(e) => warn!(
                    sink = sink.name(),
                    receipt_number = %committed.receipt.receipt_number,
                    error = %e,
                    "Receipt sink failed; ignoring"
                ),
            }
        }
    });
}
