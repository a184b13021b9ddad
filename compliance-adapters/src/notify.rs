//! Operator notifications
//!
//! Fired on a no-obligation/no-credit outcome and on supplementary status
//! transitions. Delivery guarantees belong to the implementation, not the
//! engine.

use crate::Result;
use async_trait::async_trait;
use tracing::info;
use uuid::Uuid;

/// Notification sink for compliance outcomes
#[async_trait]
pub trait NotificationService: Send + Sync {
    /// A version determined with neither obligation nor earned credits
    async fn notify_no_obligation(&self, version_id: Uuid) -> Result<()>;

    /// A supplementary version changed the report's status
    async fn notify_status_transition(
        &self,
        version_id: Uuid,
        old_status: &str,
        new_status: &str,
    ) -> Result<()>;
}

/// Notification sink that emits tracing events; used in tests and as a
/// stand-in where no delivery channel is configured
#[derive(Debug, Default)]
pub struct LogNotifier;

impl LogNotifier {
    /// Create a log-only notifier
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl NotificationService for LogNotifier {
    async fn notify_no_obligation(&self, version_id: Uuid) -> Result<()> {
        info!(%version_id, "No obligation or earned credits for version");
        Ok(())
    }

    async fn notify_status_transition(
        &self,
        version_id: Uuid,
        old_status: &str,
        new_status: &str,
    ) -> Result<()> {
        info!(
            %version_id,
            old_status,
            new_status,
            "Compliance status transition"
        );
        Ok(())
    }
}
