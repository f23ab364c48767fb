//! # Repository Module
//!
//! Database repository implementations for DukaPOS.
//!
//! ## Two Ways In
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │  Standalone reads/writes               Inside a ledger transaction     │
//! │  ─────────────────────────             ───────────────────────────     │
//! │  db.products().get_by_id(id)           let mut tx = pool.begin()       │
//! │       │                                product::apply_stock_delta(     │
//! │       │  own pooled connection             &mut tx, id, -2)            │
//! │       ▼                                customer::apply_balance_delta(  │
//! │  ProductRepository                         &mut tx, id, 20_000)        │
//! │                                        tx.commit()                      │
//! │                                                                         │
//! │  The free functions take `&mut SqliteConnection`, so the caller decides │
//! │  which transaction they belong to. Nothing here opens a transaction.   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Available Repositories
//!
//! - [`StaffRepository`](staff::StaffRepository) - Cashiers and admins
//! - [`ProductRepository`](product::ProductRepository) - Catalog and stock
//! - [`CustomerRepository`](customer::CustomerRepository) - Credit ledger
//! - [`ShiftRepository`](shift::ShiftRepository) - Shift rows and tender lines
//! - [`ReceiptRepository`](receipt::ReceiptRepository) - Receipts, tenders, items
//! - [`SequenceRepository`](sequence::SequenceRepository) - Station counters

pub mod customer;
pub mod product;
pub mod receipt;
pub mod sequence;
pub mod shift;
pub mod staff;
