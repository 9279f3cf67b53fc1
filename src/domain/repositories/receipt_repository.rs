use async_trait::async_trait;

use crate::{
    domain::entities::{note::Note, receipt_info::ReceiptInfo},
    errors::RelayError,
};

#[async_trait]
pub trait ReceiptRepository: Send + Sync + 'static {
    /// Verifies a Base64 receipt with the App Store and returns its
    /// authoritative transaction.
    async fn verify_receipt(&self, receipt_data: &str) -> Result<ReceiptInfo, RelayError>;

    /// Decodes a raw status update notification body. Fails with
    /// `SharedSecretMismatch` if the notification password is not the
    /// configured shared secret.
    fn parse_notification(&self, body: &[u8]) -> Result<Note, RelayError>;
}
