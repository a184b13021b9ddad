//! Obligation sync interface

use crate::Result;
use async_trait::async_trait;
use uuid::Uuid;

/// Pushes compliance obligations to the external carbon-registry ledger.
///
/// Implementations are constructor-injected; `ensure_authenticated` is an
/// explicit precondition of `sync_obligation`, not a hidden side effect of
/// a global client.
#[async_trait]
pub trait ObligationSync: Send + Sync {
    /// Establish or refresh credentials with the external ledger
    async fn ensure_authenticated(&self) -> Result<()>;

    /// Push one obligation to the ledger
    async fn sync_obligation(&self, obligation_id: Uuid) -> Result<()>;

    /// Health check against the ledger
    async fn health_check(&self) -> Result<()>;

    /// Adapter name for logging
    fn name(&self) -> &str;
}
