#![allow(dead_code)]

use serde::Deserialize;

use crate::data::models::verify_receipt::pending_renewal_info_model::PendingRenewalInfoModel;

/// An object that contains information about the most recent in-app purchase
/// transactions for the app.
///
/// https://developer.apple.com/documentation/appstoreservernotifications/unified_receipt
#[derive(Debug, Deserialize)]
pub(crate) struct UnifiedReceiptModel {
    /// The environment for which App Store generated the receipt.
    pub(crate) environment: Option<String>,
    /// The latest Base64-encoded app receipt.
    pub(crate) latest_receipt: Option<String>,
    /// An array that contains the latest 100 in-app purchase transactions of
    /// the decoded value in latest_receipt.
    pub(crate) latest_receipt_info: Option<serde_json::Value>,
    /// An array where each element contains the pending renewal information
    /// for each auto-renewable subscription identified in product_id.
    #[serde(default)]
    pub(crate) pending_renewal_info: Vec<PendingRenewalInfoModel>,
    /// The status code, where 0 indicates that the notification is valid.
    #[serde(default)]
    pub(crate) status: i32,
}
