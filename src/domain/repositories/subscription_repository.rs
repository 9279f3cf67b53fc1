use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::domain::entities::{note::Note, receipt_info::ReceiptInfo, subscription::Subscription};

/// Looks up the last known state of a subscription.
#[async_trait]
pub trait SubscriptionFetch: Send + Sync {
    async fn fetch(&self, original_transaction_id: &str) -> anyhow::Result<Subscription>;
}

/// Persists notification or receipt state ahead of dispatch.
#[async_trait]
pub trait SubscriptionUpdater: Send + Sync {
    async fn update_with_note(&self, note: &Note) -> anyhow::Result<()>;

    async fn update_with_receipt(&self, receipt: &ReceiptInfo) -> anyhow::Result<()>;
}

/// Selects receipts whose subscriptions are about to expire. Yields the
/// Base64 receipt data for each, ready for verification.
#[async_trait]
pub trait ExpiringSubscriptions: Send + Sync {
    async fn expiring(&self, now: DateTime<Utc>) -> anyhow::Result<Vec<String>>;
}

/// Updater that stores nothing.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopUpdater;

#[async_trait]
impl SubscriptionUpdater for NoopUpdater {
    async fn update_with_note(&self, _note: &Note) -> anyhow::Result<()> {
        Ok(())
    }

    async fn update_with_receipt(&self, _receipt: &ReceiptInfo) -> anyhow::Result<()> {
        Ok(())
    }
}
