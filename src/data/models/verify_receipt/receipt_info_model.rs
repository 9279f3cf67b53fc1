#![allow(dead_code)]

use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_with::{serde_as, DisplayFromStr, PickFirst};

use crate::data::models::apple_time::AppleTime;

/// One purchase transaction, as found in the `receipt`, `in_app`,
/// `latest_receipt_info` and `latest_expired_receipt_info` fields.
///
/// https://developer.apple.com/documentation/appstorereceipts/responsebody/latest_receipt_info
///
/// The legacy (iOS 6 style) object and the per-transaction array entries share
/// this model. They differ in which field carries the expiration:
/// `expires_date_formatted` for legacy objects, `expires_date` (or
/// `expires_date_ms`) for array entries.
#[serde_as]
#[derive(Debug, Clone, Default, Deserialize)]
pub(crate) struct ReceiptInfoModel {
    /// The unique identifier of the product purchased.
    #[serde(default)]
    pub(crate) product_id: String,
    /// The transaction identifier of the original purchase.
    #[serde(default)]
    pub(crate) original_transaction_id: String,
    /// A unique identifier for a transaction such as a purchase, restore, or
    /// renewal.
    pub(crate) transaction_id: Option<String>,

    /// The time the App Store charged the user's account for a purchased or
    /// restored product, or the time the App Store charged the user's account
    /// for a subscription purchase or renewal after a lapse.
    #[serde_as(as = "AppleTime")]
    #[serde(default)]
    pub(crate) purchase_date: Option<DateTime<Utc>>,
    #[serde_as(as = "AppleTime")]
    #[serde(default)]
    pub(crate) purchase_date_ms: Option<DateTime<Utc>>,

    /// The time of the original app purchase.
    #[serde_as(as = "AppleTime")]
    #[serde(default)]
    pub(crate) original_purchase_date: Option<DateTime<Utc>>,
    #[serde_as(as = "AppleTime")]
    #[serde(default)]
    pub(crate) original_purchase_date_ms: Option<DateTime<Utc>>,

    /// The time the App Store refunded a transaction or revoked it from family
    /// sharing.
    #[serde_as(as = "AppleTime")]
    #[serde(default)]
    pub(crate) cancellation_date: Option<DateTime<Utc>>,
    #[serde_as(as = "AppleTime")]
    #[serde(default)]
    pub(crate) cancellation_date_ms: Option<DateTime<Utc>>,

    /// The time a subscription expires or when it will renew.
    #[serde_as(as = "AppleTime")]
    #[serde(default)]
    pub(crate) expires_date: Option<DateTime<Utc>>,
    #[serde_as(as = "AppleTime")]
    #[serde(default)]
    pub(crate) expires_date_ms: Option<DateTime<Utc>>,
    /// Legacy receipts only.
    #[serde_as(as = "AppleTime")]
    #[serde(default)]
    pub(crate) expires_date_formatted: Option<DateTime<Utc>>,

    /// An indicator of whether a subscription is in the free trial period.
    #[serde_as(as = "PickFirst<(DisplayFromStr, _)>")]
    #[serde(default)]
    pub(crate) is_trial_period: bool,

    /// In-app purchase receipts, present on the top-level `receipt` object.
    #[serde(default)]
    pub(crate) in_app: Vec<ReceiptInfoModel>,
}

impl ReceiptInfoModel {
    pub(crate) fn purchased_at(&self) -> Option<DateTime<Utc>> {
        self.purchase_date_ms.or(self.purchase_date)
    }

    pub(crate) fn original_purchased_at(&self) -> Option<DateTime<Utc>> {
        self.original_purchase_date_ms.or(self.original_purchase_date)
    }

    pub(crate) fn cancelled_at(&self) -> Option<DateTime<Utc>> {
        self.cancellation_date_ms.or(self.cancellation_date)
    }

    pub(crate) fn legacy_expires_at(&self) -> Option<DateTime<Utc>> {
        self.expires_date_formatted.or(self.expires_date)
    }

    pub(crate) fn expires_at(&self) -> Option<DateTime<Utc>> {
        self.expires_date_ms.or(self.expires_date)
    }
}
