use async_trait::async_trait;
use tracing::info;

use crate::domain::{entities::event::Event, listeners::event_listener::EventListener};

/// Writes every event to the log. Never fails.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogListener;

impl LogListener {
    fn log(&self, operation: &str, event: &Event) {
        info!(
            operation,
            original_transaction_id = %event.original_transaction_id,
            product_id = %event.product_id,
            user_id = %event.user.user_id,
            auto_renew_status = event.auto_renew_status,
            is_trial_period = event.is_trial_period,
            currency = %event.currency,
            price = event.price,
            expires_at = ?event.expires_at,
            "subscription event"
        );
    }
}

#[async_trait]
impl EventListener for LogListener {
    fn name(&self) -> &str {
        "log"
    }

    async fn changed_auto_renew_product(&self, event: &Event) -> anyhow::Result<()> {
        self.log("changed_auto_renew_product", event);
        Ok(())
    }

    async fn changed_auto_renew_status(&self, event: &Event) -> anyhow::Result<()> {
        self.log("changed_auto_renew_status", event);
        Ok(())
    }

    async fn paid(&self, event: &Event) -> anyhow::Result<()> {
        self.log("paid", event);
        Ok(())
    }

    async fn refunded(&self, event: &Event) -> anyhow::Result<()> {
        self.log("refunded", event);
        Ok(())
    }

    async fn started_trial(&self, event: &Event) -> anyhow::Result<()> {
        self.log("started_trial", event);
        Ok(())
    }
}
