#![allow(dead_code)]

use std::{
    path::PathBuf,
    sync::{Arc, Mutex},
    time::Duration,
};

use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use fractic_iap_relay::{
    config::VerifyEndpoints,
    domain::{
        entities::{
            event::{Event, EventKind},
            subscription::{Subscription, User},
        },
        listeners::event_listener::EventListener,
    },
};

pub const SHARED_SECRET: &str = "test-shared-secret";
pub const ORIGINAL_TRANSACTION_ID: &str = "123456789012345";
pub const PRODUCT_ID: &str = "year-premium";
pub const NEW_PRODUCT_ID: &str = "month-premium";

pub fn expires_at() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2019, 3, 13, 19, 11, 36).unwrap()
}

pub fn purchased_at() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2019, 3, 6, 20, 11, 36).unwrap()
}

pub fn cancelled_at() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2019, 3, 6, 17, 30, 17).unwrap()
}

pub fn fixture(name: &str) -> String {
    let path: PathBuf = [env!("CARGO_MANIFEST_DIR"), "tests", "fixtures", name]
        .iter()
        .collect();
    std::fs::read_to_string(&path).unwrap_or_else(|e| panic!("reading {path:?}: {e}"))
}

pub fn subscription(expires_at: Option<DateTime<Utc>>) -> Subscription {
    Subscription {
        original_transaction_id: ORIGINAL_TRANSACTION_ID.to_string(),
        product_id: PRODUCT_ID.to_string(),
        auto_renew_status: true,
        is_trial_period: false,
        expires_at,
        currency: "USD".to_string(),
        price: 9.99,
        user: User {
            user_id: "user-1".to_string(),
            email: Some("someone@example.com".to_string()),
            premium_access: true,
            ..Default::default()
        },
    }
}

pub fn endpoints(base_url: &str) -> VerifyEndpoints {
    VerifyEndpoints {
        production_url: format!("{base_url}/production"),
        sandbox_url: format!("{base_url}/sandbox"),
        timeout: Duration::from_secs(2),
    }
}

pub type Calls = Arc<Mutex<Vec<(String, EventKind, Event)>>>;

/// Listener that records every call into a shared log and optionally fails.
pub struct RecordingListener {
    name: String,
    fail: bool,
    calls: Calls,
}

impl RecordingListener {
    pub fn new(name: &str, calls: &Calls) -> Arc<Self> {
        Arc::new(Self {
            name: name.to_string(),
            fail: false,
            calls: calls.clone(),
        })
    }

    pub fn failing(name: &str, calls: &Calls) -> Arc<Self> {
        Arc::new(Self {
            name: name.to_string(),
            fail: true,
            calls: calls.clone(),
        })
    }

    fn record(&self, kind: EventKind, event: &Event) -> anyhow::Result<()> {
        self.calls
            .lock()
            .unwrap()
            .push((self.name.clone(), kind, event.clone()));
        if self.fail {
            anyhow::bail!("{} rejected {kind}", self.name);
        }
        Ok(())
    }
}

#[async_trait]
impl EventListener for RecordingListener {
    fn name(&self) -> &str {
        &self.name
    }

    async fn changed_auto_renew_product(&self, event: &Event) -> anyhow::Result<()> {
        self.record(EventKind::ChangedAutoRenewProduct, event)
    }

    async fn changed_auto_renew_status(&self, event: &Event) -> anyhow::Result<()> {
        self.record(EventKind::ChangedAutoRenewStatus, event)
    }

    async fn paid(&self, event: &Event) -> anyhow::Result<()> {
        self.record(EventKind::Paid, event)
    }

    async fn refunded(&self, event: &Event) -> anyhow::Result<()> {
        self.record(EventKind::Refunded, event)
    }

    async fn started_trial(&self, event: &Event) -> anyhow::Result<()> {
        self.record(EventKind::StartedTrial, event)
    }
}

pub fn kinds(calls: &Calls) -> Vec<(String, EventKind)> {
    calls
        .lock()
        .unwrap()
        .iter()
        .map(|(name, kind, _)| (name.clone(), *kind))
        .collect()
}
