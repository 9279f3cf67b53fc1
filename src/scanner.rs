use std::{sync::Arc, time::Duration};

use chrono::{DateTime, Utc};
use tokio::{sync::watch, time::MissedTickBehavior};
use tracing::{debug, info, warn};

use crate::{
    dispatcher::Dispatcher,
    domain::{
        entities::event::{Event, EventSource},
        repositories::{
            receipt_repository::ReceiptRepository,
            subscription_repository::{
                ExpiringSubscriptions, SubscriptionFetch, SubscriptionUpdater,
            },
        },
    },
    errors::RelayError,
    util::ReceiptUtil,
};

/// Counts from one pass over the expiring receipts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ScanSummary {
    pub checked: usize,
    pub paid: usize,
    pub unchanged: usize,
    pub failed: usize,
}

enum ScanOutcome {
    Paid,
    Unchanged,
}

/// Periodically re-verifies receipts that are about to expire and dispatches
/// `Paid` when a renewal moved the expiration forward.
pub struct Scanner<R: ReceiptRepository> {
    receipts: Arc<ReceiptUtil<R>>,
    dispatcher: Arc<Dispatcher>,
    subscriptions: Arc<dyn SubscriptionFetch>,
    updater: Arc<dyn SubscriptionUpdater>,
    matcher: Arc<dyn ExpiringSubscriptions>,
    shutdown: watch::Receiver<bool>,
}

impl<R: ReceiptRepository> Scanner<R> {
    pub fn new(
        receipts: Arc<ReceiptUtil<R>>,
        dispatcher: Arc<Dispatcher>,
        subscriptions: Arc<dyn SubscriptionFetch>,
        updater: Arc<dyn SubscriptionUpdater>,
        matcher: Arc<dyn ExpiringSubscriptions>,
    ) -> Self {
        // Never signalled; replaced through `with_shutdown`.
        let (_, shutdown) = watch::channel(false);
        Self {
            receipts,
            dispatcher,
            subscriptions,
            updater,
            matcher,
            shutdown,
        }
    }

    /// Stops the scanner once `true` is sent. A scan in progress finishes the
    /// receipt it is working on and skips the rest.
    pub fn with_shutdown(mut self, shutdown: watch::Receiver<bool>) -> Self {
        self.shutdown = shutdown;
        self
    }

    fn stopping(&self) -> bool {
        *self.shutdown.borrow()
    }

    /// Scans immediately, then once per `interval` until shut down. Scans run
    /// back to back and never overlap.
    pub async fn run(mut self, interval: Duration) {
        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        info!(interval_secs = interval.as_secs(), "expiration scanner started");
        // A dropped sender can no longer request shutdown.
        let mut sender_alive = true;
        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    let summary = self.scan(Utc::now()).await;
                    info!(
                        checked = summary.checked,
                        paid = summary.paid,
                        unchanged = summary.unchanged,
                        failed = summary.failed,
                        "expiration scan finished"
                    );
                }
                changed = self.shutdown.changed(), if sender_alive => {
                    match changed {
                        Ok(()) if *self.shutdown.borrow() => break,
                        Ok(()) => {}
                        Err(_) => sender_alive = false,
                    }
                }
            }
        }
        info!("expiration scanner stopped");
    }

    /// One pass. Failures are logged per receipt and never abort the batch.
    pub async fn scan(&self, now: DateTime<Utc>) -> ScanSummary {
        let mut summary = ScanSummary::default();
        let expiring = match self.matcher.expiring(now).await {
            Ok(expiring) => expiring,
            Err(e) => {
                warn!(error = %e, "failed to select expiring subscriptions");
                return summary;
            }
        };
        debug!(count = expiring.len(), "scanning expiring receipts");

        for receipt_data in &expiring {
            if self.stopping() {
                debug!("shutdown requested, leaving scan early");
                break;
            }
            summary.checked += 1;
            match self.check(receipt_data).await {
                Ok(ScanOutcome::Paid) => summary.paid += 1,
                Ok(ScanOutcome::Unchanged) => summary.unchanged += 1,
                Err(e) => {
                    summary.failed += 1;
                    match &e {
                        RelayError::Verification(v) if !v.is_retryable() => {
                            warn!(error = %e, "receipt failed verification permanently")
                        }
                        _ => warn!(error = %e, "skipping receipt for this scan"),
                    }
                }
            }
        }
        summary
    }

    async fn check(&self, receipt_data: &str) -> Result<ScanOutcome, RelayError> {
        let receipt = self.receipts.verify(receipt_data).await?;
        let subscription = self
            .subscriptions
            .fetch(&receipt.original_transaction_id)
            .await
            .map_err(RelayError::SubscriptionLookup)?;

        if !subscription.is_extended_by(receipt.expires_at) {
            debug!(
                original_transaction_id = %receipt.original_transaction_id,
                "expiration unchanged"
            );
            return Ok(ScanOutcome::Unchanged);
        }

        let event = Event::synthesize(EventSource::Receipt(&receipt), &subscription);
        info!(
            original_transaction_id = %event.original_transaction_id,
            expires_at = ?event.expires_at,
            "subscription renewed"
        );
        // The new expiration is stored only once the event is delivered, so a
        // failed dispatch is retried on the next scan.
        self.dispatcher.paid(&event).await?;

        self.updater
            .update_with_receipt(&receipt)
            .await
            .map_err(RelayError::SubscriptionUpdate)?;
        Ok(ScanOutcome::Paid)
    }
}
