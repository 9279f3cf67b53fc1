mod common;

use std::time::Duration;

use common::{
    endpoints, expires_at, fixture, purchased_at, ORIGINAL_TRANSACTION_ID, PRODUCT_ID, SHARED_SECRET,
};
use fractic_iap_relay::{
    config::VerifyEndpoints,
    domain::entities::verify_status::VerifyStatus,
    errors::{RelayError, VerificationError},
    util::ReceiptUtil,
};
use httpmock::prelude::*;
use serde_json::json;

const RECEIPT_DATA: &str = "ewoJInNpZ25hdHVyZSIgPSAiQTFCMkMzRDQiOwp9";

fn valid_body() -> serde_json::Value {
    serde_json::from_str(&fixture("verify_receipt_valid.json")).unwrap()
}

#[tokio::test]
async fn production_receipt_is_normalized() {
    let server = MockServer::start_async().await;
    let production = server
        .mock_async(|when, then| {
            when.method(POST).path("/production").json_body(json!({
                "receipt-data": RECEIPT_DATA,
                "password": SHARED_SECRET,
                "exclude-old-transactions": true,
            }));
            then.status(200).json_body(valid_body());
        })
        .await;
    let sandbox = server
        .mock_async(|when, then| {
            when.method(POST).path("/sandbox");
            then.status(200).json_body(valid_body());
        })
        .await;

    let receipts = ReceiptUtil::new(SHARED_SECRET, endpoints(&server.base_url())).unwrap();
    let info = receipts.verify(RECEIPT_DATA).await.unwrap();

    assert_eq!(info.status, VerifyStatus::Valid);
    assert_eq!(info.product_id, PRODUCT_ID);
    assert_eq!(info.original_transaction_id, ORIGINAL_TRANSACTION_ID);
    assert_eq!(info.expires_at, Some(expires_at()));
    assert_eq!(info.paid_at, Some(purchased_at()));
    assert!(info.auto_renew_status);
    production.assert_async().await;
    assert_eq!(sandbox.hits_async().await, 0);
}

#[tokio::test]
async fn test_environment_receipt_falls_back_to_sandbox() {
    let server = MockServer::start_async().await;
    let production = server
        .mock_async(|when, then| {
            when.method(POST).path("/production");
            then.status(200).json_body(json!({"status": 21007}));
        })
        .await;
    let sandbox = server
        .mock_async(|when, then| {
            when.method(POST).path("/sandbox").json_body(json!({
                "receipt-data": RECEIPT_DATA,
                "password": SHARED_SECRET,
                "exclude-old-transactions": true,
            }));
            then.status(200).json_body(valid_body());
        })
        .await;

    let receipts = ReceiptUtil::new(SHARED_SECRET, endpoints(&server.base_url())).unwrap();
    let info = receipts.verify(RECEIPT_DATA).await.unwrap();

    assert_eq!(info.product_id, PRODUCT_ID);
    production.assert_async().await;
    sandbox.assert_async().await;
}

#[tokio::test]
async fn sandbox_failure_returns_original_error() {
    for sandbox_response in [json!({"status": 21007}), json!({"status": 21002})] {
        let server = MockServer::start_async().await;
        let production = server
            .mock_async(|when, then| {
                when.method(POST).path("/production");
                then.status(200).json_body(json!({"status": 21007}));
            })
            .await;
        let sandbox = server
            .mock_async(|when, then| {
                when.method(POST).path("/sandbox");
                then.status(200).json_body(sandbox_response.clone());
            })
            .await;

        let receipts = ReceiptUtil::new(SHARED_SECRET, endpoints(&server.base_url())).unwrap();
        match receipts.verify(RECEIPT_DATA).await {
            Err(RelayError::Verification(e)) => {
                assert!(e.is_retryable());
                assert_eq!(e.status(), Some(VerifyStatus::ReceiptFromTest));
            }
            other => panic!("unexpected {other:?}"),
        }
        production.assert_hits_async(1).await;
        sandbox.assert_hits_async(1).await;
    }
}

#[tokio::test]
async fn sandbox_http_error_returns_original_error() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(POST).path("/production");
            then.status(200).json_body(json!({"status": 21007}));
        })
        .await;
    server
        .mock_async(|when, then| {
            when.method(POST).path("/sandbox");
            then.status(502);
        })
        .await;

    let receipts = ReceiptUtil::new(SHARED_SECRET, endpoints(&server.base_url())).unwrap();
    let err = receipts.verify(RECEIPT_DATA).await.unwrap_err();
    match err {
        RelayError::Verification(e) => assert_eq!(e.status(), Some(VerifyStatus::ReceiptFromTest)),
        other => panic!("unexpected {other:?}"),
    }
}

#[tokio::test]
async fn vendor_statuses_map_to_error_kinds() {
    for (code, retryable) in [(21000, true), (21005, true), (21002, false), (21003, false), (21004, false)] {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(POST).path("/production");
                then.status(200).json_body(json!({"status": code}));
            })
            .await;
        let sandbox = server
            .mock_async(|when, then| {
                when.method(POST).path("/sandbox");
                then.status(200).json_body(json!({"status": 0}));
            })
            .await;

        let receipts = ReceiptUtil::new(SHARED_SECRET, endpoints(&server.base_url())).unwrap();
        match receipts.verify(RECEIPT_DATA).await {
            Err(RelayError::Verification(e)) => {
                assert_eq!(e.is_retryable(), retryable, "{code}");
                assert_eq!(e.status().map(|s| s.code()), Some(code));
            }
            other => panic!("{code}: unexpected {other:?}"),
        }
        assert_eq!(sandbox.hits_async().await, 0, "{code}");
    }
}

#[tokio::test]
async fn wrong_shared_secret_is_not_flagged_for_follow_up() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(POST).path("/production");
            then.status(200).json_body(json!({"status": 21004}));
        })
        .await;

    let receipts = ReceiptUtil::new(SHARED_SECRET, endpoints(&server.base_url())).unwrap();
    match receipts.verify(RECEIPT_DATA).await {
        Err(RelayError::Verification(VerificationError::Permanent { follow_up, .. })) => {
            assert!(!follow_up)
        }
        other => panic!("unexpected {other:?}"),
    }
}

#[tokio::test]
async fn http_failures_are_retryable() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(POST).path("/production");
            then.status(503).body("Service Unavailable");
        })
        .await;

    let receipts = ReceiptUtil::new(SHARED_SECRET, endpoints(&server.base_url())).unwrap();
    match receipts.verify(RECEIPT_DATA).await {
        Err(RelayError::Verification(e)) => assert!(e.is_retryable()),
        other => panic!("unexpected {other:?}"),
    }
}

#[tokio::test]
async fn slow_endpoint_times_out_as_retryable() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(POST).path("/production");
            then.status(200)
                .delay(Duration::from_secs(2))
                .json_body(valid_body());
        })
        .await;

    let endpoints = VerifyEndpoints {
        timeout: Duration::from_millis(200),
        ..endpoints(&server.base_url())
    };
    let receipts = ReceiptUtil::new(SHARED_SECRET, endpoints).unwrap();
    match receipts.verify(RECEIPT_DATA).await {
        Err(RelayError::Verification(e)) => {
            assert!(e.is_retryable());
            assert_eq!(e.status(), None);
        }
        other => panic!("unexpected {other:?}"),
    }
}

#[tokio::test]
async fn empty_shared_secret_is_rejected() {
    match ReceiptUtil::new("", VerifyEndpoints::default()) {
        Err(RelayError::Config(_)) => {}
        Err(other) => panic!("unexpected {other:?}"),
        Ok(_) => panic!("empty shared secret accepted"),
    }
}
