#![allow(dead_code)]

use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_with::{serde_as, DisplayFromStr, PickFirst};

use crate::data::models::apple_time::AppleTime;

/// An array of elements that refers to open or failed auto-renewable
/// subscription renewals.
///
/// https://developer.apple.com/documentation/appstorereceipts/responsebody/pending_renewal_info
///
/// Apple documents the numeric flags as strings, but older sandbox responses
/// sent plain integers, so both are accepted.
#[serde_as]
#[derive(Debug, Clone, Default, Deserialize)]
pub(crate) struct PendingRenewalInfoModel {
    /// The value for this key corresponds to the productIdentifier property of
    /// the product that the customer's subscription renews.
    pub(crate) auto_renew_product_id: Option<String>,
    /// The current renewal status for the auto-renewable subscription.
    /// 1: The subscription will renew at the end of the current period.
    /// 0: The customer has turned off automatic renewal.
    #[serde_as(as = "Option<PickFirst<(DisplayFromStr, _)>>")]
    #[serde(default)]
    pub(crate) auto_renew_status: Option<u8>,
    /// The reason a subscription expired. Only present for a receipt that
    /// contains an expired auto-renewable subscription.
    #[serde_as(as = "Option<PickFirst<(DisplayFromStr, _)>>")]
    #[serde(default)]
    pub(crate) expiration_intent: Option<u8>,
    /// The time at which the grace period for subscription renewals expires,
    /// in milliseconds since the epoch.
    #[serde_as(as = "AppleTime")]
    #[serde(default)]
    pub(crate) grace_period_expires_date_ms: Option<DateTime<Utc>>,
    /// A flag that indicates Apple is attempting to renew an expired
    /// subscription automatically.
    #[serde_as(as = "Option<PickFirst<(DisplayFromStr, _)>>")]
    #[serde(default)]
    pub(crate) is_in_billing_retry_period: Option<u8>,
    /// The transaction identifier of the original purchase.
    pub(crate) original_transaction_id: Option<String>,
    /// The unique identifier of the product purchased.
    pub(crate) product_id: Option<String>,
}

impl PendingRenewalInfoModel {
    pub(crate) fn will_auto_renew(&self) -> bool {
        self.auto_renew_status == Some(1)
    }
}
