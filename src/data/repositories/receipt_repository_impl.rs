use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::{
    config::VerifyEndpoints,
    data::{
        datasources::{
            status_update_notification_datasource::{
                StatusUpdateNotificationDatasource, StatusUpdateNotificationDatasourceImpl,
            },
            verify_receipt_datasource::{VerifyReceiptDatasource, VerifyReceiptDatasourceImpl},
        },
        models::{
            status_update_notifications::notification_model::NotificationModel,
            verify_receipt::{
                receipt_payload::ReceiptPayload,
                verify_receipt_response_model::{AutoRenewFlag, VerifyReceiptResponseModel},
            },
        },
    },
    domain::{
        entities::{
            note::{Note, NoteType},
            receipt_info::ReceiptInfo,
            verify_status::VerifyStatus,
        },
        repositories::receipt_repository::ReceiptRepository,
    },
    errors::RelayError,
};

pub struct ReceiptRepositoryImpl<
    V: VerifyReceiptDatasource,
    N: StatusUpdateNotificationDatasource,
> {
    verify_receipt_datasource: V,
    status_update_notification_datasource: N,
    shared_secret: String,
}

#[async_trait]
impl<V, N> ReceiptRepository for ReceiptRepositoryImpl<V, N>
where
    V: VerifyReceiptDatasource + 'static,
    N: StatusUpdateNotificationDatasource + 'static,
{
    async fn verify_receipt(&self, receipt_data: &str) -> Result<ReceiptInfo, RelayError> {
        let m = self
            .verify_receipt_datasource
            .verify_receipt(receipt_data, &self.shared_secret)
            .await?;
        ReceiptInfo::from_verify_response(m)
    }

    fn parse_notification(&self, body: &[u8]) -> Result<Note, RelayError> {
        let m = self
            .status_update_notification_datasource
            .parse_notification(body)?;
        if m.password != self.shared_secret {
            return Err(RelayError::SharedSecretMismatch);
        }
        Note::from_notification(m, Utc::now())
    }
}

impl ReceiptRepositoryImpl<VerifyReceiptDatasourceImpl, StatusUpdateNotificationDatasourceImpl> {
    pub(crate) fn new(shared_secret: &str, endpoints: &VerifyEndpoints) -> Result<Self, RelayError> {
        if shared_secret.is_empty() {
            return Err(RelayError::Config(
                "shared secret must not be empty".to_string(),
            ));
        }
        Ok(Self {
            verify_receipt_datasource: VerifyReceiptDatasourceImpl::new(endpoints)?,
            status_update_notification_datasource: StatusUpdateNotificationDatasourceImpl::new(),
            shared_secret: shared_secret.to_string(),
        })
    }
}

impl ReceiptInfo {
    fn from_verify_response(m: VerifyReceiptResponseModel) -> Result<Self, RelayError> {
        let status = VerifyStatus::from(m.status);

        // An expired subscription is described by the expired payload, which
        // is only sent alongside 21006 or in place of latest_receipt_info.
        let payload = m
            .latest_expired_receipt_info
            .or(m.latest_receipt_info)
            .or(m.receipt)
            .ok_or_else(|| {
                RelayError::UnrecognizedReceiptShape("response carries no receipt".to_string())
            })?;
        let (latest, expires_at) = ReceiptPayload::decode(payload)?.into_latest();

        let pending = m.pending_renewal_info.first();
        let auto_renew_status = m.auto_renew_status == Some(AutoRenewFlag::On)
            || pending.is_some_and(|p| p.will_auto_renew());

        Ok(ReceiptInfo {
            status,
            auto_renew_status,
            auto_renew_product: pending.and_then(|p| p.auto_renew_product_id.clone()),
            cancelled_at: latest.cancelled_at().or(m.cancellation_date),
            expires_at,
            grace_period_expires_at: pending.and_then(|p| p.grace_period_expires_date_ms),
            is_trial_period: latest.is_trial_period,
            original_transaction_id: latest.original_transaction_id.clone(),
            original_purchased_at: latest.original_purchased_at(),
            paid_at: latest.purchased_at(),
            product_id: latest.product_id,
        })
    }
}

impl Note {
    fn from_notification(m: NotificationModel, now: DateTime<Utc>) -> Result<Self, RelayError> {
        let cancelled_at = m.cancelled_at();
        // Apple sends no change date for plan changes.
        let auto_renew_changed_at = match m.notification_type {
            NoteType::DidChangeRenewalPref => Some(now),
            _ => m.auto_renew_status_changed_at(),
        };
        let (status, pending, unified_payload) = match m.unified_receipt {
            Some(unified) => (
                VerifyStatus::from(unified.status),
                unified.pending_renewal_info.into_iter().next(),
                unified.latest_receipt_info,
            ),
            None => (VerifyStatus::Valid, None, None),
        };

        // A cancelled subscription is described by the expired sub-object,
        // falling back to the latest one when Apple omits it.
        let payload = if cancelled_at.is_some() {
            m.latest_expired_receipt_info.or(m.latest_receipt_info)
        } else {
            m.latest_receipt_info.or(m.latest_expired_receipt_info)
        }
        .or(unified_payload)
        .ok_or_else(|| {
            RelayError::UnrecognizedReceiptShape("notification carries no receipt".to_string())
        })?;
        let (latest, expires_at) = ReceiptPayload::decode(payload)?.into_latest();

        let auto_renew_status = m
            .auto_renew_status
            .unwrap_or_else(|| pending.as_ref().is_some_and(|p| p.will_auto_renew()));
        let auto_renew_product = m
            .auto_renew_product_id
            .or_else(|| pending.as_ref().and_then(|p| p.auto_renew_product_id.clone()));

        Ok(Note {
            note_type: m.notification_type,
            environment: m.environment,
            status,
            auto_renew_status,
            auto_renew_product,
            auto_renew_changed_at,
            cancelled_at: cancelled_at.or(latest.cancelled_at()),
            expires_at,
            grace_period_expires_at: pending.and_then(|p| p.grace_period_expires_date_ms),
            is_trial_period: latest.is_trial_period,
            original_transaction_id: latest.original_transaction_id.clone(),
            original_purchased_at: latest.original_purchased_at(),
            paid_at: latest.purchased_at(),
            product_id: latest.product_id,
        })
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;
    use serde_json::json;

    use super::*;
    use crate::{
        data::datasources::verify_receipt_datasource::decode_verify_response,
        domain::entities::note::Environment,
    };

    fn receipt(body: serde_json::Value) -> Result<ReceiptInfo, RelayError> {
        let m = decode_verify_response(body.to_string().as_bytes())?;
        ReceiptInfo::from_verify_response(m)
    }

    fn note(body: serde_json::Value) -> Result<Note, RelayError> {
        let m = StatusUpdateNotificationDatasourceImpl::new()
            .parse_notification(body.to_string().as_bytes())?;
        Note::from_notification(m, now())
    }

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2019, 6, 10, 21, 39, 47).unwrap()
    }

    fn expires() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2019, 3, 13, 19, 11, 36).unwrap()
    }

    fn purchased() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2019, 3, 6, 20, 11, 36).unwrap()
    }

    #[test]
    fn test_legacy_and_array_shapes_agree() {
        let legacy = receipt(json!({
            "status": 0,
            "auto_renew_status": 1,
            "latest_receipt_info": {
                "product_id": "year-premium",
                "original_transaction_id": "123456789012345",
                "purchase_date": "2019-03-06 20:11:36 Etc/GMT",
                "original_purchase_date": "2019-03-06 20:11:36 Etc/GMT",
                "expires_date": "1552504296000",
                "expires_date_formatted": "2019-03-13 19:11:36 Etc/GMT",
                "is_trial_period": "true",
            },
        }))
        .unwrap();
        let modern = receipt(json!({
            "status": 0,
            "latest_receipt_info": [{
                "product_id": "year-premium",
                "original_transaction_id": "123456789012345",
                "purchase_date_ms": "1551903096000",
                "original_purchase_date_ms": "1551903096000",
                "expires_date": "2019-03-13 19:11:36 Etc/GMT",
                "is_trial_period": "true",
            }],
            "pending_renewal_info": [{
                "auto_renew_product_id": "year-premium",
                "auto_renew_status": "1",
                "original_transaction_id": "123456789012345",
                "product_id": "year-premium",
            }],
        }))
        .unwrap();

        assert_eq!(legacy.expires_at, Some(expires()));
        assert_eq!(legacy.paid_at, Some(purchased()));
        assert_eq!(legacy.status, modern.status);
        assert_eq!(legacy.auto_renew_status, modern.auto_renew_status);
        assert_eq!(legacy.cancelled_at, modern.cancelled_at);
        assert_eq!(legacy.expires_at, modern.expires_at);
        assert_eq!(legacy.is_trial_period, modern.is_trial_period);
        assert_eq!(legacy.original_transaction_id, modern.original_transaction_id);
        assert_eq!(legacy.original_purchased_at, modern.original_purchased_at);
        assert_eq!(legacy.paid_at, modern.paid_at);
        assert_eq!(legacy.product_id, modern.product_id);
    }

    #[test]
    fn test_latest_transaction_is_authoritative() {
        let info = receipt(json!({
            "status": 0,
            "latest_receipt_info": [
                {"product_id": "month-premium", "original_transaction_id": "123456789012345",
                 "purchase_date_ms": "1551200000000", "expires_date_ms": "1551800000000"},
                {"product_id": "year-premium", "original_transaction_id": "123456789012345",
                 "purchase_date_ms": "1552400000000", "expires_date_ms": "1553000000000"},
                {"product_id": "month-premium", "original_transaction_id": "123456789012345",
                 "purchase_date_ms": "1551800000000", "expires_date_ms": "1552400000000"},
            ],
        }))
        .unwrap();
        assert_eq!(info.product_id, "year-premium");
        assert_eq!(info.expires_at, DateTime::from_timestamp_millis(1_553_000_000_000));
    }

    #[test]
    fn test_auto_renew_from_either_flag() {
        let top_level = receipt(json!({
            "status": 0, "auto_renew_status": 1,
            "latest_receipt_info": [{"product_id": "year-premium"}],
            "pending_renewal_info": [{"auto_renew_status": "0"}],
        }))
        .unwrap();
        let pending = receipt(json!({
            "status": 0, "auto_renew_status": 0,
            "latest_receipt_info": [{"product_id": "year-premium"}],
            "pending_renewal_info": [{"auto_renew_status": "1", "auto_renew_product_id": "month-premium"}],
        }))
        .unwrap();
        let neither = receipt(json!({
            "status": 0,
            "latest_receipt_info": [{"product_id": "year-premium"}],
        }))
        .unwrap();
        assert!(top_level.auto_renew_status);
        assert!(pending.auto_renew_status);
        assert_eq!(pending.auto_renew_product.as_deref(), Some("month-premium"));
        assert!(!neither.auto_renew_status);
    }

    #[test]
    fn test_expired_payload_preferred() {
        let info = receipt(json!({
            "status": 21006,
            "receipt": {"product_id": "month-premium"},
            "latest_expired_receipt_info": {
                "product_id": "year-premium",
                "original_transaction_id": "123456789012345",
                "expires_date_formatted": "2019-03-13 19:11:36 Etc/GMT",
            },
        }))
        .unwrap();
        assert_eq!(info.status, VerifyStatus::SubscriptionExpired);
        assert_eq!(info.product_id, "year-premium");
        assert_eq!(info.expires_at, Some(expires()));
    }

    #[test]
    fn test_grace_period_from_pending_renewal() {
        let info = receipt(json!({
            "status": 0,
            "latest_receipt_info": [{"product_id": "year-premium"}],
            "pending_renewal_info": [{"grace_period_expires_date_ms": "1552385472000"}],
        }))
        .unwrap();
        assert_eq!(
            info.grace_period_expires_at,
            Some(Utc.with_ymd_and_hms(2019, 3, 12, 10, 11, 12).unwrap())
        );
    }

    #[test]
    fn test_receipt_shape_errors() {
        match receipt(json!({"status": 0, "latest_receipt_info": "abc"})) {
            Err(RelayError::UnrecognizedReceiptShape(_)) => {}
            other => panic!("unexpected {other:?}"),
        }
        match receipt(json!({"status": 0})) {
            Err(RelayError::UnrecognizedReceiptShape(_)) => {}
            other => panic!("unexpected {other:?}"),
        }
        match decode_verify_response(b"{\"status\": ") {
            Err(RelayError::Decode(_)) => {}
            other => panic!("unexpected {other:?}"),
        }
    }

    fn legacy_receipt_info(product_id: &str, trial: bool) -> serde_json::Value {
        json!({
            "product_id": product_id,
            "original_transaction_id": "123456789012345",
            "purchase_date": "2019-03-06 20:11:36 Etc/GMT",
            "original_purchase_date": "2019-03-06 20:11:36 Etc/GMT",
            "expires_date_formatted": "2019-03-13 19:11:36 Etc/GMT",
            "is_trial_period": trial.to_string(),
        })
    }

    #[test]
    fn test_note_every_type_decodes() {
        for (name, note_type) in [
            ("CANCEL", NoteType::Cancel),
            ("RENEWAL", NoteType::Renewal),
            ("INTERACTIVE_RENEWAL", NoteType::InteractiveRenewal),
            ("INITIAL_BUY", NoteType::InitialBuy),
            ("DID_CHANGE_RENEWAL_PREF", NoteType::DidChangeRenewalPref),
            ("DID_CHANGE_RENEWAL_STATUS", NoteType::DidChangeRenewalStatus),
        ] {
            let n = note(json!({
                "environment": "PROD",
                "notification_type": name,
                "password": "secret",
                "auto_renew_status": "true",
                "latest_receipt_info": legacy_receipt_info("year-premium", false),
            }))
            .unwrap();
            assert_eq!(n.note_type, note_type);
            assert_eq!(n.environment, Environment::Production);
            assert_eq!(n.original_transaction_id, "123456789012345");
        }
    }

    #[test]
    fn test_unknown_note_type_fails() {
        let result = note(json!({
            "environment": "PROD",
            "notification_type": "PRICE_INCREASE_CONSENT",
            "latest_receipt_info": legacy_receipt_info("year-premium", false),
        }));
        match result {
            Err(RelayError::Decode(_)) => {}
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_cancelled_note_reads_expired_receipt() {
        let n = note(json!({
            "environment": "PROD",
            "notification_type": "CANCEL",
            "cancellation_date": "2019-03-06 17:30:17 Etc/GMT",
            "auto_renew_status": "false",
            "latest_receipt_info": legacy_receipt_info("month-premium", true),
            "latest_expired_receipt_info": legacy_receipt_info("year-premium", false),
        }))
        .unwrap();
        assert_eq!(n.product_id, "year-premium");
        assert!(!n.is_trial_period);
        assert_eq!(
            n.refunded_at(),
            Some(Utc.with_ymd_and_hms(2019, 3, 6, 17, 30, 17).unwrap())
        );
    }

    #[test]
    fn test_cancelled_note_without_expired_receipt_uses_latest() {
        let n = note(json!({
            "environment": "PROD",
            "notification_type": "CANCEL",
            "cancellation_date": "2019-03-06 17:30:17 Etc/GMT",
            "auto_renew_status": "false",
            "latest_receipt_info": legacy_receipt_info("month-premium", true),
        }))
        .unwrap();
        assert_eq!(n.product_id, "month-premium");
        assert!(n.is_trial_period);
        assert_eq!(n.expires_at, Some(expires()));
        assert!(n.refunded_at().is_some());
    }

    #[test]
    fn test_renewal_pref_change_is_stamped_now() {
        let n = note(json!({
            "environment": "PROD",
            "notification_type": "DID_CHANGE_RENEWAL_PREF",
            "auto_renew_product_id": "month-premium",
            "auto_renew_status": "true",
            "auto_renew_status_change_date": "2019-01-01 00:00:00 Etc/GMT",
            "latest_receipt_info": legacy_receipt_info("year-premium", false),
        }))
        .unwrap();
        assert_eq!(n.auto_renew_changed_at, Some(now()));
        assert_eq!(n.auto_renew_product.as_deref(), Some("month-premium"));
    }

    #[test]
    fn test_renewal_status_change_uses_payload_date() {
        let n = note(json!({
            "environment": "PROD",
            "notification_type": "DID_CHANGE_RENEWAL_STATUS",
            "auto_renew_status": "false",
            "auto_renew_status_change_date": "2019-05-01 12:00:00 Etc/GMT",
            "latest_receipt_info": legacy_receipt_info("year-premium", false),
        }))
        .unwrap();
        assert!(!n.auto_renew_status);
        assert_eq!(
            n.auto_renew_changed_at,
            Some(Utc.with_ymd_and_hms(2019, 5, 1, 12, 0, 0).unwrap())
        );
    }

    #[test]
    fn test_unified_receipt_envelope() {
        let n = note(json!({
            "environment": "PROD",
            "notification_type": "RENEWAL",
            "unified_receipt": {
                "environment": "Production",
                "status": 0,
                "latest_receipt_info": [
                    {"product_id": "year-premium", "original_transaction_id": "123456789012345",
                     "purchase_date_ms": "1551903096000", "expires_date_ms": "1552504296000",
                     "is_trial_period": "false"},
                ],
                "pending_renewal_info": [
                    {"auto_renew_product_id": "month-premium", "auto_renew_status": "1",
                     "grace_period_expires_date_ms": "1552385472000"},
                ],
            },
        }))
        .unwrap();
        assert_eq!(n.status, VerifyStatus::Valid);
        assert!(n.auto_renew_status);
        assert_eq!(n.auto_renew_product.as_deref(), Some("month-premium"));
        assert_eq!(n.expires_at, Some(expires()));
        assert_eq!(n.paid_at, Some(purchased()));
        assert!(n.grace_period_expires_at.is_some());
    }
}
