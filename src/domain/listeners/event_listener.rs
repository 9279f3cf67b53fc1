use async_trait::async_trait;

use crate::domain::entities::event::Event;

/// A downstream consumer of subscription events, registered with the
/// dispatcher as must-succeed or best-effort.
#[async_trait]
pub trait EventListener: Send + Sync {
    /// Identifies the listener in logs and dispatch errors.
    fn name(&self) -> &str;

    async fn changed_auto_renew_product(&self, event: &Event) -> anyhow::Result<()>;

    async fn changed_auto_renew_status(&self, event: &Event) -> anyhow::Result<()>;

    async fn paid(&self, event: &Event) -> anyhow::Result<()>;

    async fn refunded(&self, event: &Event) -> anyhow::Result<()>;

    async fn started_trial(&self, event: &Event) -> anyhow::Result<()>;
}
