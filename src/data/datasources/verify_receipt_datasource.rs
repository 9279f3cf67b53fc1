use async_trait::async_trait;
use tracing::{debug, warn};

use crate::{
    config::VerifyEndpoints,
    data::models::verify_receipt::{
        verify_receipt_request_model::VerifyReceiptRequestModel,
        verify_receipt_response_model::VerifyReceiptResponseModel,
    },
    domain::entities::verify_status::VerifyStatus,
    errors::{RelayError, VerificationError},
};

#[async_trait]
pub(crate) trait VerifyReceiptDatasource: Send + Sync {
    /// Verify Receipt:
    /// https://developer.apple.com/documentation/appstorereceipts/verifyreceipt
    ///
    /// receipt_data:
    ///   The Base64-encoded receipt data.
    /// shared_secret:
    ///   The app's shared secret, sent as the request password.
    ///
    /// Only returns responses whose status carries receipt data (valid or
    /// subscription expired).
    async fn verify_receipt(
        &self,
        receipt_data: &str,
        shared_secret: &str,
    ) -> Result<VerifyReceiptResponseModel, RelayError>;
}

pub struct VerifyReceiptDatasourceImpl {
    client: reqwest::Client,
    production_url: String,
    sandbox_url: String,
}

#[async_trait]
impl VerifyReceiptDatasource for VerifyReceiptDatasourceImpl {
    async fn verify_receipt(
        &self,
        receipt_data: &str,
        shared_secret: &str,
    ) -> Result<VerifyReceiptResponseModel, RelayError> {
        if shared_secret.is_empty() {
            return Err(RelayError::Config(
                "shared secret must not be empty".to_string(),
            ));
        }
        let body = serde_json::to_vec(&VerifyReceiptRequestModel::new(
            receipt_data,
            shared_secret,
        ))?;
        self.callout_with_sandbox_fallback(body).await
    }
}

impl VerifyReceiptDatasourceImpl {
    pub(crate) fn new(endpoints: &VerifyEndpoints) -> Result<Self, RelayError> {
        let client = reqwest::Client::builder()
            .timeout(endpoints.timeout)
            .build()
            .map_err(|e| RelayError::Config(format!("failed to build HTTP client: {e}")))?;
        Ok(Self {
            client,
            production_url: endpoints.production_url.clone(),
            sandbox_url: endpoints.sandbox_url.clone(),
        })
    }

    async fn callout_with_sandbox_fallback(
        &self,
        body: Vec<u8>,
    ) -> Result<VerifyReceiptResponseModel, RelayError> {
        // Apple asks for production first. A receipt from the test environment
        // is answered with 21007, in which case the same body goes to the
        // sandbox exactly once.
        //
        // If the sandbox also fails, the production error is returned.
        match self.callout(&self.production_url, body.clone()).await {
            Err(RelayError::Verification(production_error))
                if production_error.status() == Some(VerifyStatus::ReceiptFromTest) =>
            {
                debug!("receipt is from the test environment, retrying against sandbox");
                match self.callout(&self.sandbox_url, body).await {
                    Ok(sandbox_response) => Ok(sandbox_response),
                    Err(sandbox_error) => {
                        warn!(error = %sandbox_error, "sandbox verification failed");
                        Err(production_error.into())
                    }
                }
            }
            other => other,
        }
    }

    async fn callout(
        &self,
        url: &str,
        body: Vec<u8>,
    ) -> Result<VerifyReceiptResponseModel, RelayError> {
        let response = self
            .client
            .post(url)
            .header(reqwest::header::CONTENT_TYPE, "application/json")
            .body(body)
            .send()
            .await
            .map_err(|e| VerificationError::Retryable {
                status: None,
                reason: format!("callout to {url} failed to send: {e}"),
            })?;

        let http_status = response.status();
        if !http_status.is_success() {
            return Err(VerificationError::Retryable {
                status: None,
                reason: format!(
                    "callout to {url} returned {http_status}: {}",
                    response.text().await.unwrap_or_default()
                ),
            }
            .into());
        }

        let bytes = response.bytes().await.map_err(|e| VerificationError::Retryable {
            status: None,
            reason: format!("failed to read response from {url}: {e}"),
        })?;
        let model = decode_verify_response(&bytes)?;
        check_status(&model)?;
        Ok(model)
    }
}

pub(crate) fn decode_verify_response(
    bytes: &[u8],
) -> Result<VerifyReceiptResponseModel, RelayError> {
    Ok(serde_json::from_slice(bytes)?)
}

/// Maps a vendor status code to the local error taxonomy.
pub(crate) fn check_status(model: &VerifyReceiptResponseModel) -> Result<(), VerificationError> {
    let status = VerifyStatus::from(model.status);
    if status.has_receipt() {
        return Ok(());
    }
    let reason = status.description().to_string();
    if model.is_retryable == Some(true) {
        return Err(VerificationError::Retryable {
            status: Some(status),
            reason,
        });
    }
    Err(match status {
        VerifyStatus::Unreadable
        | VerifyStatus::Unreachable
        | VerifyStatus::ReceiptFromTest
        | VerifyStatus::InternalDataAccess(_) => VerificationError::Retryable {
            status: Some(status),
            reason,
        },
        VerifyStatus::ReceiptMalformed
        | VerifyStatus::NotAuthenticated
        | VerifyStatus::Unauthorized
        | VerifyStatus::Unknown(_) => VerificationError::Permanent {
            status: Some(status),
            reason,
            follow_up: true,
        },
        VerifyStatus::MismatchedSecret | VerifyStatus::ReceiptFromProd => {
            VerificationError::Permanent {
                status: Some(status),
                reason,
                follow_up: false,
            }
        }
        VerifyStatus::Valid | VerifyStatus::SubscriptionExpired => return Ok(()),
    })
}
