use async_trait::async_trait;

use crate::{SettlementError, SettlementReceipt, SettlementSubmission};

/// Client for the settlement layer that finalizes proven batches.
#[cfg_attr(feature = "test-utils", mockall::automock)]
#[async_trait]
pub trait SettlementClient: Send + Sync + 'static {
    /// Whether the client currently has a usable connection.
    async fn is_connected(&self) -> bool;

    /// Submits a proof and its public values for the `old_root -> new_root` transition.
    async fn submit(
        &self,
        submission: SettlementSubmission,
    ) -> Result<SettlementReceipt, SettlementError>;
}
