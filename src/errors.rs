use thiserror::Error;

use crate::domain::entities::{event::EventKind, verify_status::VerifyStatus};

#[derive(Debug, Error)]
pub enum RelayError {
    #[error("Failed to decode payload: {0}")]
    Decode(String),

    #[error("Unrecognized receipt shape: {0}")]
    UnrecognizedReceiptShape(String),

    #[error("Malformed timestamp: {0:?}")]
    MalformedTimestamp(String),

    #[error(transparent)]
    Verification(#[from] VerificationError),

    #[error("Notification password does not match the configured shared secret.")]
    SharedSecretMismatch,

    #[error("Subscription lookup failed: {0}")]
    SubscriptionLookup(#[source] anyhow::Error),

    #[error("Subscription update failed: {0}")]
    SubscriptionUpdate(#[source] anyhow::Error),

    #[error(transparent)]
    Dispatch(#[from] DispatchError),

    #[error("Invalid configuration: {0}")]
    Config(String),
}

impl From<serde_json::Error> for RelayError {
    fn from(e: serde_json::Error) -> Self {
        RelayError::Decode(e.to_string())
    }
}

/// Outcome of a receipt verification callout that did not produce a usable
/// receipt.
#[derive(Debug, Error)]
pub enum VerificationError {
    /// Transient; the receipt should be verified again on a later attempt.
    #[error("Retryable verification failure ({status:?}): {reason}")]
    Retryable {
        status: Option<VerifyStatus>,
        reason: String,
    },

    /// Retrying will not help. `follow_up` marks receipts that need manual
    /// attention, as opposed to configuration problems on our side.
    #[error("Permanent verification failure ({status:?}): {reason}")]
    Permanent {
        status: Option<VerifyStatus>,
        reason: String,
        follow_up: bool,
    },
}

impl VerificationError {
    pub fn status(&self) -> Option<VerifyStatus> {
        match self {
            VerificationError::Retryable { status, .. } => *status,
            VerificationError::Permanent { status, .. } => *status,
        }
    }

    pub fn is_retryable(&self) -> bool {
        matches!(self, VerificationError::Retryable { .. })
    }
}

/// Failure of a must-succeed listener. Aborts the remaining dispatch.
#[derive(Debug, Error)]
#[error("Listener '{listener}' failed on {kind}: {source}")]
pub struct DispatchError {
    pub listener: String,
    pub kind: EventKind,
    #[source]
    pub source: anyhow::Error,
}
