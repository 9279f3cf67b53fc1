use chrono::{DateTime, Utc};

use super::verify_status::VerifyStatus;

/// Canonical snapshot of the authoritative transaction in a verified receipt.
///
/// Built fresh from every verification response, whichever receipt shape the
/// App Store returned.
#[derive(Debug, Clone, PartialEq)]
pub struct ReceiptInfo {
    pub status: VerifyStatus,
    /// True if either the response's auto-renew flag or the first pending
    /// renewal record has auto-renew enabled.
    pub auto_renew_status: bool,
    /// Product the subscription renews into, from the first pending renewal
    /// record.
    pub auto_renew_product: Option<String>,
    pub cancelled_at: Option<DateTime<Utc>>,
    pub expires_at: Option<DateTime<Utc>>,
    pub grace_period_expires_at: Option<DateTime<Utc>>,
    pub is_trial_period: bool,
    pub original_transaction_id: String,
    pub original_purchased_at: Option<DateTime<Utc>>,
    /// Purchase time of the authoritative transaction.
    pub paid_at: Option<DateTime<Utc>>,
    pub product_id: String,
}

impl ReceiptInfo {
    /// Refund time, which only exists when the transaction was cancelled.
    pub fn refunded_at(&self) -> Option<DateTime<Utc>> {
        self.cancelled_at
    }
}
