use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Owner of a subscription, as known to the subscription store.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub user_id: String,
    pub facebook_id: Option<String>,
    pub signed_up_at: Option<DateTime<Utc>>,

    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub email: Option<String>,
    pub image_url: Option<String>,

    pub advertising_id: Option<String>,
    pub device_ip: Option<String>,
    pub premium_access: bool,

    /// Free-form values used by individual listeners (e.g. attribution ids).
    #[serde(default)]
    pub attributes: HashMap<String, String>,
}

impl User {
    pub fn attribute(&self, key: &str) -> Option<&str> {
        self.attributes.get(key).map(String::as_str)
    }
}

/// Last known state of a subscription, keyed by original transaction id.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Subscription {
    pub original_transaction_id: String,
    pub product_id: String,

    pub auto_renew_status: bool,
    pub is_trial_period: bool,
    pub expires_at: Option<DateTime<Utc>>,

    pub currency: String,
    pub price: f64,

    pub user: User,
}

impl Subscription {
    /// Whether `expires_at` moves the subscription's expiration strictly
    /// forward. An unknown new expiration never counts as an advance.
    pub fn is_extended_by(&self, expires_at: Option<DateTime<Utc>>) -> bool {
        match (expires_at, self.expires_at) {
            (Some(new), Some(known)) => new > known,
            (Some(_), None) => true,
            (None, _) => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    #[test]
    fn test_is_extended_by() {
        let known = Utc.with_ymd_and_hms(2019, 3, 13, 19, 11, 36).unwrap();
        let sub = Subscription {
            expires_at: Some(known),
            ..Default::default()
        };

        assert!(!sub.is_extended_by(Some(known)));
        assert!(!sub.is_extended_by(Some(known - chrono::Duration::days(1))));
        assert!(sub.is_extended_by(Some(known + chrono::Duration::seconds(1))));
        assert!(!sub.is_extended_by(None));

        let unknown = Subscription::default();
        assert!(unknown.is_extended_by(Some(known)));
    }

    #[test]
    fn test_user_attribute() {
        let mut user = User::default();
        user.attributes
            .insert("appsflyer_id".to_string(), "1552385472000-123".to_string());
        assert_eq!(user.attribute("appsflyer_id"), Some("1552385472000-123"));
        assert_eq!(user.attribute("missing"), None);
    }
}
