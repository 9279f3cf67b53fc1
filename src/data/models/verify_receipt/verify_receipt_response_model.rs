#![allow(dead_code)]

use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_repr::Deserialize_repr;
use serde_with::serde_as;

use super::pending_renewal_info_model::PendingRenewalInfoModel;
use crate::data::models::apple_time::AppleTime;

/// Response body returned by the verifyReceipt endpoint.
///
/// https://developer.apple.com/documentation/appstorereceipts/responsebody
///
/// The receipt payloads are kept as raw JSON since their shape (a single
/// legacy object or an array of transactions) is only known after decoding.
#[serde_as]
#[derive(Debug, Deserialize)]
pub(crate) struct VerifyReceiptResponseModel {
    /// Either 0 if the receipt is valid, or a status code if there is an
    /// error.
    pub(crate) status: i32,
    /// The environment for which the receipt was generated.
    pub(crate) environment: Option<String>,
    /// An indicator that an error occurred during the request. A value of 1
    /// indicates a temporary issue; retry validation for this receipt at a
    /// later time.
    #[serde(rename = "is-retryable", default)]
    pub(crate) is_retryable: Option<bool>,
    /// Legacy top-level auto-renew flag.
    pub(crate) auto_renew_status: Option<AutoRenewFlag>,
    /// Legacy top-level cancellation date.
    #[serde_as(as = "AppleTime")]
    #[serde(default)]
    pub(crate) cancellation_date: Option<DateTime<Utc>>,
    /// The latest Base64 encoded app receipt.
    pub(crate) latest_receipt: Option<String>,
    /// The decoded receipt that was sent for verification.
    pub(crate) receipt: Option<serde_json::Value>,
    /// An array that contains all in-app purchase transactions, or the latest
    /// renewal as a single object for legacy receipts.
    pub(crate) latest_receipt_info: Option<serde_json::Value>,
    /// Legacy receipts only. The expired transaction when the subscription is
    /// no longer active.
    pub(crate) latest_expired_receipt_info: Option<serde_json::Value>,
    /// In the JSON file, an array where each element contains the pending
    /// renewal information for each auto-renewable subscription identified by
    /// the product_id.
    #[serde(default)]
    pub(crate) pending_renewal_info: Vec<PendingRenewalInfoModel>,
}

#[derive(Debug, Clone, Copy, PartialEq, Deserialize_repr)]
#[repr(u8)]
pub(crate) enum AutoRenewFlag {
    Off = 0,
    On = 1,
}
