use std::sync::Arc;

use tracing::{debug, error, warn};

use crate::{
    domain::{
        entities::event::{Event, EventKind},
        listeners::event_listener::EventListener,
    },
    errors::DispatchError,
};

struct Registration {
    listener: Arc<dyn EventListener>,
    must_succeed: bool,
}

/// Ordered fan-out of events to registered listeners.
///
/// Must-succeed listeners always run before best-effort ones; within each
/// group, listeners run in registration order. The first must-succeed failure
/// aborts the dispatch and is returned. Best-effort failures are logged and
/// skipped.
///
/// Listeners are registered during setup. The dispatcher is read-only once
/// shared.
#[derive(Default)]
pub struct Dispatcher {
    registrations: Vec<Registration>,
}

impl Dispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_listener(&mut self, listener: Arc<dyn EventListener>, must_succeed: bool) {
        let registration = Registration {
            listener,
            must_succeed,
        };
        if must_succeed {
            let end_of_must_succeed = self
                .registrations
                .iter()
                .position(|r| !r.must_succeed)
                .unwrap_or(self.registrations.len());
            self.registrations.insert(end_of_must_succeed, registration);
        } else {
            self.registrations.push(registration);
        }
    }

    /// Listener names in dispatch order.
    pub fn listener_names(&self) -> Vec<&str> {
        self.registrations.iter().map(|r| r.listener.name()).collect()
    }

    pub fn is_empty(&self) -> bool {
        self.registrations.is_empty()
    }

    pub async fn dispatch(&self, kind: EventKind, event: &Event) -> Result<(), DispatchError> {
        for registration in &self.registrations {
            let listener = registration.listener.as_ref();
            let result = match kind {
                EventKind::ChangedAutoRenewProduct => listener.changed_auto_renew_product(event).await,
                EventKind::ChangedAutoRenewStatus => listener.changed_auto_renew_status(event).await,
                EventKind::Paid => listener.paid(event).await,
                EventKind::Refunded => listener.refunded(event).await,
                EventKind::StartedTrial => listener.started_trial(event).await,
            };
            let Err(source) = result else {
                debug!(listener = listener.name(), %kind, "listener handled event");
                continue;
            };
            if registration.must_succeed {
                error!(
                    listener = listener.name(),
                    %kind,
                    original_transaction_id = %event.original_transaction_id,
                    error = %source,
                    "must-succeed listener failed, aborting dispatch"
                );
                return Err(DispatchError {
                    listener: listener.name().to_string(),
                    kind,
                    source,
                });
            }
            warn!(
                listener = listener.name(),
                %kind,
                original_transaction_id = %event.original_transaction_id,
                error = %source,
                "best-effort listener failed"
            );
        }
        Ok(())
    }

    pub async fn paid(&self, event: &Event) -> Result<(), DispatchError> {
        self.dispatch(EventKind::Paid, event).await
    }

    pub async fn refunded(&self, event: &Event) -> Result<(), DispatchError> {
        self.dispatch(EventKind::Refunded, event).await
    }

    pub async fn started_trial(&self, event: &Event) -> Result<(), DispatchError> {
        self.dispatch(EventKind::StartedTrial, event).await
    }

    pub async fn changed_auto_renew_product(&self, event: &Event) -> Result<(), DispatchError> {
        self.dispatch(EventKind::ChangedAutoRenewProduct, event).await
    }

    pub async fn changed_auto_renew_status(&self, event: &Event) -> Result<(), DispatchError> {
        self.dispatch(EventKind::ChangedAutoRenewStatus, event).await
    }
}
