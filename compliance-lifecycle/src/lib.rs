//! Compliance version lifecycle
//!
//! Owns the mutable half of the compliance engine: immutable report
//! versions, their exactly-one companion record (obligation or earned
//! credit), supersession of corrected versions, and the invoice rule chain
//! driving obligation/penalty status.
//!
//! # Transaction model
//!
//! Every lifecycle operation stages its mutations into a [`store::Transaction`]
//! and commits them under one write lock; all mutations land together or
//! none do. Integration side effects (ledger sync, notifications) run after
//! the local commit and never roll it back; failures are queued for retry.

#![forbid(unsafe_code)]
#![warn(missing_docs, rust_2018_idioms, unused_qualifications)]

pub mod error;
pub mod invoice;
pub mod lifecycle;
pub mod records;
pub mod store;

// Re-exports
pub use error::{Error, Result};
pub use invoice::{InvoiceRuleChain, InvoiceSnapshot};
pub use lifecycle::ComplianceVersionLifecycle;
pub use records::*;
pub use store::{ComplianceStore, Transaction};
