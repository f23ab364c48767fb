//! # duka-db: Database Layer and Ledger for DukaPOS
//!
//! SQLite storage for the till, and the transactional ledger that keeps
//! stock, customer credit, receipt numbers and shift cash consistent.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        DukaPOS Data Flow                                │
//! │                                                                         │
//! │  HTTP router / webhook (not in this workspace)                         │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                     duka-db (THIS CRATE)                        │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────────┐    ┌───────────────┐    ┌──────────────┐  │   │
//! │  │   │    Ledger     │    │  Repositories │    │  Migrations  │  │   │
//! │  │   │  (ledger/)    │───►│ (repository/) │    │  (embedded)  │  │   │
//! │  │   │               │    │               │    │              │  │   │
//! │  │   │ commit_receipt│    │ ProductRepo   │    │ 0001_initial │  │   │
//! │  │   │ open/close    │    │ CustomerRepo  │    │   _schema    │  │   │
//! │  │   │ shift         │    │ ShiftRepo ... │    │              │  │   │
//! │  │   └───────┬───────┘    └───────┬───────┘    └──────────────┘  │   │
//! │  │           │    ReceiptSink     │                               │   │
//! │  │           ▼  (duka-tax, ...)   ▼                               │   │
//! │  │                      Database (pool.rs)                        │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                     SQLite Database (WAL)                       │   │
//! │  │   ~/.local/share/dukapos/duka.db                                │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Organization
//!
//! - [`pool`] - Connection pool creation and configuration
//! - [`config`] - Station configuration file and environment
//! - [`migrations`] - Embedded database migrations
//! - [`error`] - Database and ledger error types
//! - [`repository`] - Repository implementations
//! - [`ledger`] - Receipt commit, numbering, shifts, repayments
//!
//! ## Usage
//!
//! ```rust,ignore
//! use duka_db::{Database, DukaConfig, Ledger};
//!
//! let config = DukaConfig::load(None)?;
//! let db = Database::new(config.db_config()?).await?;
//! let ledger = Ledger::new(db, config.station_id())?;
//!
//! let shift = ledger.open_shift(&staff_id, 50_000).await?;
//! let committed = ledger.commit_receipt(request).await?;
//! let report = ledger.close_shift(&shift.id, 90_000).await?;
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod config;
pub mod error;
pub mod ledger;
pub mod migrations;
pub mod pool;
pub mod repository;

// =============================================================================
// Re-exports
// =============================================================================

pub use config::DukaConfig;
pub use error::{DbError, DbResult, LedgerError, LedgerResult};
pub use ledger::{allocate_receipt_number, Ledger, ReceiptSink, SinkError};
pub use pool::{Database, DbConfig};

// Repository re-exports for convenience
pub use repository::customer::CustomerRepository;
pub use repository::product::ProductRepository;
pub use repository::receipt::ReceiptRepository;
pub use repository::sequence::SequenceRepository;
pub use repository::shift::ShiftRepository;
pub use repository::staff::StaffRepository;
