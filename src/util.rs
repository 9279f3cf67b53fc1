use crate::{
    config::VerifyEndpoints,
    data::{
        datasources::{
            status_update_notification_datasource::StatusUpdateNotificationDatasourceImpl,
            verify_receipt_datasource::VerifyReceiptDatasourceImpl,
        },
        repositories::receipt_repository_impl::ReceiptRepositoryImpl,
    },
    domain::{
        entities::{note::Note, receipt_info::ReceiptInfo},
        repositories::receipt_repository::ReceiptRepository,
    },
    errors::RelayError,
};

pub struct ReceiptUtil<R: ReceiptRepository> {
    receipt_repository: R,
}

impl<R: ReceiptRepository> ReceiptUtil<R> {
    pub fn from_repository(receipt_repository: R) -> Self {
        Self { receipt_repository }
    }

    pub async fn verify(&self, receipt_data: &str) -> Result<ReceiptInfo, RelayError> {
        self.receipt_repository.verify_receipt(receipt_data).await
    }

    pub fn parse_notification(&self, body: &[u8]) -> Result<Note, RelayError> {
        self.receipt_repository.parse_notification(body)
    }
}

impl
    ReceiptUtil<
        ReceiptRepositoryImpl<VerifyReceiptDatasourceImpl, StatusUpdateNotificationDatasourceImpl>,
    >
{
    pub fn new(shared_secret: &str, endpoints: VerifyEndpoints) -> Result<Self, RelayError> {
        Ok(Self {
            receipt_repository: ReceiptRepositoryImpl::new(shared_secret, &endpoints)?,
        })
    }
}
