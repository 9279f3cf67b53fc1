use std::fmt;

use chrono::{DateTime, Utc};
use serde::Serialize;

use super::{note::Note, receipt_info::ReceiptInfo, subscription::Subscription, subscription::User};

/// The operations a listener can receive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum EventKind {
    ChangedAutoRenewProduct,
    ChangedAutoRenewStatus,
    Paid,
    Refunded,
    StartedTrial,
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            EventKind::ChangedAutoRenewProduct => "ChangedAutoRenewProduct",
            EventKind::ChangedAutoRenewStatus => "ChangedAutoRenewStatus",
            EventKind::Paid => "Paid",
            EventKind::Refunded => "Refunded",
            EventKind::StartedTrial => "StartedTrial",
        };
        f.write_str(name)
    }
}

/// What an event is synthesized from.
#[derive(Debug, Clone, Copy)]
pub enum EventSource<'a> {
    Note(&'a Note),
    Receipt(&'a ReceiptInfo),
}

impl<'a> From<&'a Note> for EventSource<'a> {
    fn from(note: &'a Note) -> Self {
        EventSource::Note(note)
    }
}

impl<'a> From<&'a ReceiptInfo> for EventSource<'a> {
    fn from(receipt: &'a ReceiptInfo) -> Self {
        EventSource::Receipt(receipt)
    }
}

/// Canonical business event handed to listeners. Combines the notification or
/// receipt data with the subscription's pricing and owner.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Event {
    pub original_transaction_id: String,
    pub product_id: String,

    pub auto_renew_status: bool,
    pub auto_renew_product: Option<String>,
    pub auto_renew_changed_at: Option<DateTime<Utc>>,
    pub is_trial_period: bool,

    pub currency: String,
    pub price: f64,

    pub cancelled_at: Option<DateTime<Utc>>,
    pub expires_at: Option<DateTime<Utc>>,
    pub grace_period_expires_at: Option<DateTime<Utc>>,
    pub paid_at: Option<DateTime<Utc>>,
    pub refunded_at: Option<DateTime<Utc>>,
    pub started_trial_at: Option<DateTime<Utc>>,

    pub user: User,
}

impl Event {
    /// Pure: the same source and subscription always yield the same event.
    pub fn synthesize<'a>(source: impl Into<EventSource<'a>>, subscription: &Subscription) -> Self {
        let mut event = match source.into() {
            EventSource::Note(note) => Event {
                original_transaction_id: note.original_transaction_id.clone(),
                product_id: note.product_id.clone(),
                auto_renew_status: note.auto_renew_status,
                auto_renew_product: note.auto_renew_product.clone(),
                auto_renew_changed_at: note.auto_renew_changed_at,
                is_trial_period: note.is_trial_period,
                currency: String::new(),
                price: 0.0,
                cancelled_at: note.cancelled_at,
                expires_at: note.expires_at,
                grace_period_expires_at: note.grace_period_expires_at,
                paid_at: note.paid_at,
                refunded_at: note.refunded_at(),
                started_trial_at: note.started_trial_at(),
                user: User::default(),
            },
            EventSource::Receipt(receipt) => Event {
                original_transaction_id: receipt.original_transaction_id.clone(),
                product_id: receipt.product_id.clone(),
                auto_renew_status: receipt.auto_renew_status,
                auto_renew_product: receipt.auto_renew_product.clone(),
                auto_renew_changed_at: None,
                is_trial_period: receipt.is_trial_period,
                currency: String::new(),
                price: 0.0,
                cancelled_at: receipt.cancelled_at,
                expires_at: receipt.expires_at,
                grace_period_expires_at: receipt.grace_period_expires_at,
                paid_at: receipt.paid_at,
                refunded_at: receipt.refunded_at(),
                started_trial_at: receipt.original_purchased_at,
                user: User::default(),
            },
        };
        event.currency = subscription.currency.clone();
        event.price = subscription.price;
        event.user = subscription.user.clone();
        event
    }
}
