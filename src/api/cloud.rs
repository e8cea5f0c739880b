use crate::api::Identity;
use crate::model::FuelTransaction;
use crate::Result;
use chrono::{DateTime, Utc};
use tracing::info;

/// Pushes the local collection to cloud storage on behalf of `identity`.
#[async_trait::async_trait]
pub trait CloudSync: Send + Sync {
    /// Returns the time of the completed sync.
    async fn sync(
        &self,
        identity: &Identity,
        transactions: &[FuelTransaction],
    ) -> Result<DateTime<Utc>>;
}

/// Pretends to sync and returns the current time.
#[derive(Debug, Clone, Copy, Default)]
pub struct MockCloudSync;

#[async_trait::async_trait]
impl CloudSync for MockCloudSync {
    async fn sync(
        &self,
        identity: &Identity,
        transactions: &[FuelTransaction],
    ) -> Result<DateTime<Utc>> {
        info!(
            "Syncing {} transactions for {}",
            transactions.len(),
            identity.email
        );
        Ok(Utc::now())
    }
}
