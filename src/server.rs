use std::{future::Future, sync::Arc, time::Duration};

use axum::{
    body::Bytes,
    extract::State,
    http::StatusCode,
    routing::post,
    Router,
};
use tokio::{net::TcpListener, sync::watch};
use tracing::{debug, error, info, warn};

use crate::{
    config::RelayConfig,
    dispatcher::Dispatcher,
    domain::{
        entities::event::{Event, EventSource},
        listeners::event_listener::EventListener,
        repositories::{
            receipt_repository::ReceiptRepository,
            subscription_repository::{
                ExpiringSubscriptions, NoopUpdater, SubscriptionFetch, SubscriptionUpdater,
            },
        },
    },
    errors::RelayError,
    scanner::Scanner,
    util::ReceiptUtil,
};

pub const DEFAULT_WEBHOOK_PATH: &str = "/app-store/notifications";

/// Shared state of the notification endpoint.
pub struct WebhookState<R: ReceiptRepository> {
    pub receipts: Arc<ReceiptUtil<R>>,
    pub dispatcher: Arc<Dispatcher>,
    pub subscriptions: Arc<dyn SubscriptionFetch>,
    pub updater: Arc<dyn SubscriptionUpdater>,
}

impl<R: ReceiptRepository> Clone for WebhookState<R> {
    fn clone(&self) -> Self {
        Self {
            receipts: self.receipts.clone(),
            dispatcher: self.dispatcher.clone(),
            subscriptions: self.subscriptions.clone(),
            updater: self.updater.clone(),
        }
    }
}

pub fn webhook_router<R: ReceiptRepository>(path: &str, state: WebhookState<R>) -> Router {
    Router::new()
        .route(path, post(handle_notification::<R>))
        .with_state(state)
}

/// Status update notification endpoint. Callers only ever see the status
/// code.
async fn handle_notification<R: ReceiptRepository>(
    State(state): State<WebhookState<R>>,
    body: Bytes,
) -> StatusCode {
    match process_notification(&state, &body).await {
        Ok(()) => StatusCode::OK,
        Err(status) => status,
    }
}

async fn process_notification<R: ReceiptRepository>(
    state: &WebhookState<R>,
    body: &[u8],
) -> Result<(), StatusCode> {
    if body.is_empty() {
        warn!("empty notification body");
        return Err(StatusCode::BAD_REQUEST);
    }

    let note = state.receipts.parse_notification(body).map_err(|e| match e {
        RelayError::SharedSecretMismatch => {
            warn!("notification password mismatch");
            StatusCode::FORBIDDEN
        }
        e => {
            error!(error = %e, "failed to decode notification");
            StatusCode::INTERNAL_SERVER_ERROR
        }
    })?;

    if note.is_sandbox() {
        info!(
            original_transaction_id = %note.original_transaction_id,
            note_type = ?note.note_type,
            "rejecting sandbox notification"
        );
        return Err(StatusCode::FORBIDDEN);
    }

    state.updater.update_with_note(&note).await.map_err(|e| {
        error!(
            original_transaction_id = %note.original_transaction_id,
            error = %e,
            "failed to update subscription from notification"
        );
        StatusCode::INTERNAL_SERVER_ERROR
    })?;

    let subscription = state
        .subscriptions
        .fetch(&note.original_transaction_id)
        .await
        .map_err(|e| {
            warn!(
                original_transaction_id = %note.original_transaction_id,
                error = %e,
                "subscription lookup failed"
            );
            StatusCode::NOT_FOUND
        })?;

    let kind = note.event_kind();
    let event = Event::synthesize(EventSource::Note(&note), &subscription);
    debug!(
        original_transaction_id = %event.original_transaction_id,
        note_type = ?note.note_type,
        %kind,
        "dispatching notification"
    );
    state
        .dispatcher
        .dispatch(kind, &event)
        .await
        .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)
}

/// Webhook endpoint plus expiration scanner, run together until shutdown.
pub struct Server<R: ReceiptRepository> {
    receipts: Arc<ReceiptUtil<R>>,
    dispatcher: Dispatcher,
    subscriptions: Arc<dyn SubscriptionFetch>,
    updater: Arc<dyn SubscriptionUpdater>,
    matcher: Arc<dyn ExpiringSubscriptions>,
    webhook_path: String,
    scan_interval: Duration,
    shutdown_grace: Duration,
}

impl<R: ReceiptRepository> Server<R> {
    pub fn new(
        receipts: Arc<ReceiptUtil<R>>,
        subscriptions: Arc<dyn SubscriptionFetch>,
        matcher: Arc<dyn ExpiringSubscriptions>,
    ) -> Self {
        Self {
            receipts,
            dispatcher: Dispatcher::new(),
            subscriptions,
            updater: Arc::new(NoopUpdater),
            matcher,
            webhook_path: DEFAULT_WEBHOOK_PATH.to_string(),
            scan_interval: Duration::from_secs(3600),
            shutdown_grace: Duration::from_secs(15),
        }
    }

    pub fn with_updater(mut self, updater: Arc<dyn SubscriptionUpdater>) -> Self {
        self.updater = updater;
        self
    }

    pub fn with_config(mut self, config: &RelayConfig) -> Self {
        self.webhook_path = config.webhook_path.clone();
        self.scan_interval = config.scan_interval();
        self.shutdown_grace = config.shutdown_grace();
        self
    }

    pub fn add_listener(&mut self, listener: Arc<dyn EventListener>, must_succeed: bool) {
        self.dispatcher.add_listener(listener, must_succeed);
    }

    /// Freezes the listener list and splits the server into its HTTP router
    /// and its scanner.
    pub fn into_parts(self) -> (Router, Scanner<R>) {
        let dispatcher = Arc::new(self.dispatcher);
        let router = webhook_router(
            &self.webhook_path,
            WebhookState {
                receipts: self.receipts.clone(),
                dispatcher: dispatcher.clone(),
                subscriptions: self.subscriptions.clone(),
                updater: self.updater.clone(),
            },
        );
        let scanner = Scanner::new(
            self.receipts,
            dispatcher,
            self.subscriptions,
            self.updater,
            self.matcher,
        );
        (router, scanner)
    }

    /// Serves the webhook and runs the scanner until `shutdown` resolves.
    ///
    /// Shutdown stops the scanner and waits for its current receipt, then
    /// drains in-flight requests. Each step is bounded by the shutdown grace,
    /// after which its task is aborted.
    pub async fn serve(
        self,
        listener: TcpListener,
        shutdown: impl Future<Output = ()> + Send + 'static,
    ) -> anyhow::Result<()> {
        if self.dispatcher.is_empty() {
            warn!("no listeners registered, events will be dropped");
        }
        let scan_interval = self.scan_interval;
        let shutdown_grace = self.shutdown_grace;
        let webhook_path = self.webhook_path.clone();
        let (router, scanner) = self.into_parts();

        let (scanner_stop_tx, scanner_stop_rx) = watch::channel(false);
        let (http_stop_tx, mut http_stop_rx) = watch::channel(false);

        let mut scanner_task =
            tokio::spawn(scanner.with_shutdown(scanner_stop_rx).run(scan_interval));

        info!(addr = ?listener.local_addr().ok(), path = %webhook_path, "webhook server listening");
        let mut http_task = tokio::spawn(async move {
            axum::serve(listener, router)
                .with_graceful_shutdown(async move {
                    let _ = http_stop_rx.wait_for(|stop| *stop).await;
                })
                .await
        });

        let early_exit = tokio::select! {
            _ = shutdown => None,
            result = &mut http_task => Some(result),
        };

        info!("shutting down");
        let _ = scanner_stop_tx.send(true);
        match tokio::time::timeout(shutdown_grace, &mut scanner_task).await {
            Ok(Ok(())) => debug!("expiration scanner drained"),
            Ok(Err(e)) => error!(error = %e, "scanner task failed"),
            Err(_) => {
                warn!(
                    grace_secs = shutdown_grace.as_secs(),
                    "scan did not finish in time, aborting"
                );
                scanner_task.abort();
            }
        }

        let _ = http_stop_tx.send(true);
        let http_result = match early_exit {
            Some(result) => Some(result),
            None => match tokio::time::timeout(shutdown_grace, &mut http_task).await {
                Ok(result) => Some(result),
                Err(_) => {
                    warn!(
                        grace_secs = shutdown_grace.as_secs(),
                        "in-flight requests did not drain in time, aborting"
                    );
                    http_task.abort();
                    None
                }
            },
        };

        match http_result {
            Some(Ok(Ok(()))) | None => Ok(()),
            Some(Ok(Err(e))) => Err(e.into()),
            Some(Err(e)) => Err(e.into()),
        }
    }
}
