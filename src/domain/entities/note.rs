use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{event::EventKind, verify_status::VerifyStatus};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Environment {
    Sandbox,
    #[serde(rename = "PROD", alias = "Production")]
    Production,
}

/// Status update notification types:
/// https://developer.apple.com/documentation/appstoreservernotifications/notification_type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum NoteType {
    /// Apple customer support cancelled the subscription. The cancellation
    /// date is the refund time.
    Cancel,
    /// Automatic renewal of an expired subscription.
    Renewal,
    /// The customer renewed interactively after the subscription lapsed.
    InteractiveRenewal,
    /// First purchase of the subscription.
    InitialBuy,
    /// The customer changed the plan that takes effect at the next renewal.
    DidChangeRenewalPref,
    /// The subscription renewal status changed.
    DidChangeRenewalStatus,
}

impl NoteType {
    pub const ALL: [NoteType; 6] = [
        NoteType::Cancel,
        NoteType::Renewal,
        NoteType::InteractiveRenewal,
        NoteType::InitialBuy,
        NoteType::DidChangeRenewalPref,
        NoteType::DidChangeRenewalStatus,
    ];
}

/// Canonical decoded webhook notification.
#[derive(Debug, Clone, PartialEq)]
pub struct Note {
    pub note_type: NoteType,
    pub environment: Environment,
    pub status: VerifyStatus,

    pub auto_renew_status: bool,
    pub auto_renew_product: Option<String>,
    pub auto_renew_changed_at: Option<DateTime<Utc>>,

    pub cancelled_at: Option<DateTime<Utc>>,
    pub expires_at: Option<DateTime<Utc>>,
    pub grace_period_expires_at: Option<DateTime<Utc>>,
    pub is_trial_period: bool,
    pub original_transaction_id: String,
    pub original_purchased_at: Option<DateTime<Utc>>,
    pub paid_at: Option<DateTime<Utc>>,
    pub product_id: String,
}

impl Note {
    /// Dispatcher operation for this notification. Every note type maps to
    /// exactly one operation.
    pub fn event_kind(&self) -> EventKind {
        match self.note_type {
            NoteType::Cancel => EventKind::Refunded,
            NoteType::Renewal | NoteType::InteractiveRenewal => EventKind::Paid,
            NoteType::InitialBuy if self.is_trial_period => EventKind::StartedTrial,
            NoteType::InitialBuy => EventKind::Paid,
            NoteType::DidChangeRenewalPref => EventKind::ChangedAutoRenewProduct,
            NoteType::DidChangeRenewalStatus => EventKind::ChangedAutoRenewStatus,
        }
    }

    pub fn is_sandbox(&self) -> bool {
        self.environment == Environment::Sandbox
    }

    /// Refund time, which only exists when a cancellation date was sent.
    pub fn refunded_at(&self) -> Option<DateTime<Utc>> {
        self.cancelled_at
    }

    /// A trial starts with the original purchase.
    pub fn started_trial_at(&self) -> Option<DateTime<Utc>> {
        self.original_purchased_at
    }
}
