//! Integration boundary for the compliance engine
//!
//! The engine produces obligations and earned credits; this crate carries
//! them across process boundaries:
//!
//! - **Sync**: `ObligationSync` pushes new obligations to the external
//!   carbon-registry ledger, fire-and-forget from the engine's perspective
//! - **Retry**: failed syncs land in a retry queue with exponential backoff;
//!   adapter failures never roll back committed compliance state
//! - **Notify**: `NotificationService` informs operators of no-obligation
//!   outcomes and supplementary status transitions

#![forbid(unsafe_code)]
#![warn(missing_docs, rust_2018_idioms, unused_qualifications)]

pub mod error;
pub mod notify;
pub mod registry;
pub mod retry;
pub mod sync;

// Re-exports
pub use error::{Error, Result};
pub use notify::{LogNotifier, NotificationService};
pub use registry::CarbonRegistryClient;
pub use retry::{SyncJob, SyncRetryQueue};
pub use sync::ObligationSync;
