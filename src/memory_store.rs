use std::{collections::HashMap, sync::RwLock};

use anyhow::{anyhow, Context};
use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};

use crate::domain::{
    entities::{note::Note, receipt_info::ReceiptInfo, subscription::Subscription},
    repositories::subscription_repository::{
        ExpiringSubscriptions, SubscriptionFetch, SubscriptionUpdater,
    },
};

struct Entry {
    subscription: Subscription,
    receipt_data: Option<String>,
}

/// Process-local subscription store. Serves lookups, applies updates from
/// notifications and receipts, and selects receipts whose subscriptions
/// expire within `expiry_window`.
pub struct MemorySubscriptionStore {
    entries: RwLock<HashMap<String, Entry>>,
    expiry_window: Duration,
}

impl MemorySubscriptionStore {
    pub fn new(expiry_window: Duration) -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            expiry_window,
        }
    }

    /// Adds or replaces a subscription. `receipt_data` is the Base64 receipt
    /// used to re-verify it when it nears expiration.
    pub fn insert(
        &self,
        subscription: Subscription,
        receipt_data: Option<String>,
    ) -> anyhow::Result<()> {
        let mut entries = self
            .entries
            .write()
            .map_err(|_| anyhow!("subscription store lock poisoned"))?;
        entries.insert(
            subscription.original_transaction_id.clone(),
            Entry {
                subscription,
                receipt_data,
            },
        );
        Ok(())
    }

    pub fn get(&self, original_transaction_id: &str) -> Option<Subscription> {
        let entries = self.entries.read().ok()?;
        entries
            .get(original_transaction_id)
            .map(|e| e.subscription.clone())
    }

    pub fn len(&self) -> usize {
        self.entries.read().map(|e| e.len()).unwrap_or_default()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn update(
        &self,
        original_transaction_id: &str,
        apply: impl FnOnce(&mut Subscription),
    ) -> anyhow::Result<()> {
        let mut entries = self
            .entries
            .write()
            .map_err(|_| anyhow!("subscription store lock poisoned"))?;
        // Unknown subscriptions are reported by the lookup that follows.
        if let Some(entry) = entries.get_mut(original_transaction_id) {
            apply(&mut entry.subscription);
        }
        Ok(())
    }
}

#[async_trait]
impl SubscriptionFetch for MemorySubscriptionStore {
    async fn fetch(&self, original_transaction_id: &str) -> anyhow::Result<Subscription> {
        self.get(original_transaction_id)
            .with_context(|| format!("unknown subscription {original_transaction_id}"))
    }
}

#[async_trait]
impl SubscriptionUpdater for MemorySubscriptionStore {
    async fn update_with_note(&self, note: &Note) -> anyhow::Result<()> {
        self.update(&note.original_transaction_id, |s| {
            s.auto_renew_status = note.auto_renew_status;
            s.is_trial_period = note.is_trial_period;
            if note.expires_at.is_some() {
                s.expires_at = note.expires_at;
            }
        })
    }

    async fn update_with_receipt(&self, receipt: &ReceiptInfo) -> anyhow::Result<()> {
        self.update(&receipt.original_transaction_id, |s| {
            s.auto_renew_status = receipt.auto_renew_status;
            s.is_trial_period = receipt.is_trial_period;
            s.product_id = receipt.product_id.clone();
            s.expires_at = receipt.expires_at;
        })
    }
}

#[async_trait]
impl ExpiringSubscriptions for MemorySubscriptionStore {
    async fn expiring(&self, now: DateTime<Utc>) -> anyhow::Result<Vec<String>> {
        let entries = self
            .entries
            .read()
            .map_err(|_| anyhow!("subscription store lock poisoned"))?;
        let horizon = now
            .checked_add_signed(self.expiry_window)
            .with_context(|| format!("expiry window {} overflows from {now}", self.expiry_window))?;
        let mut expiring: Vec<(&DateTime<Utc>, &String)> = entries
            .values()
            .filter_map(|e| {
                let expires_at = e.subscription.expires_at.as_ref()?;
                let receipt_data = e.receipt_data.as_ref()?;
                (*expires_at <= horizon).then_some((expires_at, receipt_data))
            })
            .collect();
        expiring.sort();
        Ok(expiring.into_iter().map(|(_, r)| r.clone()).collect())
    }
}
