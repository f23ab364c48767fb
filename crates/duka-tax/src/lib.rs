//! # duka-tax: Tax Authority Submission for DukaPOS
//!
//! A [`ReceiptSink`](duka_db::ReceiptSink) that turns each committed
//! receipt into a tax invoice and posts it over HTTPS.
//!
//! ## Modules
//!
//! - [`config`] - `tax.toml` and `DUKA_TAX_*` environment overrides
//! - [`payload`] - Invoice JSON built from a committed receipt
//! - [`submitter`] - reqwest client and the sink implementation
//! - [`error`] - Tax error types
//!
//! ## Usage
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use duka_tax::{TaxConfig, TaxSubmitter};
//!
//! let submitter = TaxSubmitter::new(TaxConfig::load(None)?, db.clone())?;
//! let ledger = Ledger::new(db, config.station_id())?.with_sink(Arc::new(submitter));
//! ```

pub mod config;
pub mod error;
pub mod payload;
pub mod submitter;

pub use config::TaxConfig;
pub use error::{TaxError, TaxResult};
pub use payload::{InvoiceLine, ReceiptType, TaxInvoice, TransactionType};
pub use submitter::{SubmissionOutcome, TaxSubmitter};
