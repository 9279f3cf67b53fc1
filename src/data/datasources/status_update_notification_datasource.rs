use crate::{
    data::models::status_update_notifications::notification_model::NotificationModel,
    errors::RelayError,
};

pub(crate) trait StatusUpdateNotificationDatasource: Send + Sync {
    /// Parse Status Update Notification:
    /// https://developer.apple.com/documentation/appstoreservernotifications/responsebody
    ///
    /// body:
    ///   The raw POST body of the notification.
    fn parse_notification(&self, body: &[u8]) -> Result<NotificationModel, RelayError>;
}

pub struct StatusUpdateNotificationDatasourceImpl;

impl StatusUpdateNotificationDatasource for StatusUpdateNotificationDatasourceImpl {
    fn parse_notification(&self, body: &[u8]) -> Result<NotificationModel, RelayError> {
        serde_json::from_slice(body)
            .map_err(|e| RelayError::Decode(format!("failed to parse notification: {e}")))
    }
}

impl StatusUpdateNotificationDatasourceImpl {
    pub(crate) fn new() -> Self {
        Self
    }
}
