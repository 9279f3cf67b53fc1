#![allow(dead_code)]

use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_with::{serde_as, DisplayFromStr, PickFirst};

use super::unified_receipt_model::UnifiedReceiptModel;
use crate::{
    data::models::apple_time::AppleTime,
    domain::entities::note::{Environment, NoteType},
};

/// Body of a status update notification posted by the App Store.
///
/// https://developer.apple.com/documentation/appstoreservernotifications/responsebody
///
/// Receipt sub-objects are kept as raw JSON and go through the same shape
/// detection as verifyReceipt responses.
#[serde_as]
#[derive(Debug, Deserialize)]
pub(crate) struct NotificationModel {
    /// The environment for which App Store generated the receipt.
    pub(crate) environment: Environment,
    /// The subscription event that triggered the notification.
    pub(crate) notification_type: NoteType,
    /// The same value as the shared secret you submit in the password field
    /// of the requestBody when validating receipts.
    #[serde(default)]
    pub(crate) password: String,

    /// The time that Apple customer support canceled a transaction.
    #[serde_as(as = "AppleTime")]
    #[serde(default)]
    pub(crate) cancellation_date: Option<DateTime<Utc>>,
    #[serde_as(as = "AppleTime")]
    #[serde(default)]
    pub(crate) cancellation_date_ms: Option<DateTime<Utc>>,
    /// The primary key for identifying a subscription purchase.
    pub(crate) web_order_line_item_id: Option<String>,

    /// The latest Base64-encoded transaction receipt.
    pub(crate) latest_receipt: Option<String>,
    /// The JSON representation of the receipt for the most recent renewal.
    pub(crate) latest_receipt_info: Option<serde_json::Value>,
    /// The latest Base64-encoded transaction receipt of an expired
    /// subscription.
    pub(crate) latest_expired_receipt: Option<String>,
    /// The JSON representation of the receipt for the expired subscription.
    pub(crate) latest_expired_receipt_info: Option<serde_json::Value>,

    /// The current renewal status, sent as "true" or "false".
    #[serde_as(as = "Option<PickFirst<(DisplayFromStr, _)>>")]
    #[serde(default)]
    pub(crate) auto_renew_status: Option<bool>,
    /// The time at which the user turned on or off the renewal status.
    #[serde_as(as = "AppleTime")]
    #[serde(default)]
    pub(crate) auto_renew_status_change_date: Option<DateTime<Utc>>,
    #[serde_as(as = "AppleTime")]
    #[serde(default)]
    pub(crate) auto_renew_status_change_date_ms: Option<DateTime<Utc>>,
    /// An identifier of the subscription product the user renews into.
    pub(crate) auto_renew_adam_id: Option<String>,
    /// The product identifier of the subscription the user renews into.
    pub(crate) auto_renew_product_id: Option<String>,
    /// The reason a subscription expired.
    pub(crate) expiration_intent: Option<String>,

    /// Receipt data in the format introduced with the unified app receipt.
    pub(crate) unified_receipt: Option<UnifiedReceiptModel>,
}

impl NotificationModel {
    pub(crate) fn cancelled_at(&self) -> Option<DateTime<Utc>> {
        self.cancellation_date_ms.or(self.cancellation_date)
    }

    pub(crate) fn auto_renew_status_changed_at(&self) -> Option<DateTime<Utc>> {
        self.auto_renew_status_change_date_ms
            .or(self.auto_renew_status_change_date)
    }
}
