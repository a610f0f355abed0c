//! Outbox dispatcher: claims pending rows and publishes them.
//!
//! The dispatcher is scheduled independently of command processing. Several
//! instances may run at once — the store's claim is atomic, so a row is held
//! by at most one dispatcher per lease period. Rows are marked dispatched
//! only after the bus confirmed the send; a crash in between leaves the
//! lease to lapse and the row to be re-published. That duplicate is the
//! accepted cost of never losing a message.

use charges_core::bus::MessageBus;
use charges_core::error::ChargesError;
use charges_core::events::EventKind;
use charges_core::outbox::OutboxRepository;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tracing::{debug, error, info};

/// Tuning knobs for the dispatch loop.
#[derive(Clone, Debug)]
pub struct DispatcherConfig {
    /// Delay between polls when the outbox is drained.
    pub poll_interval: Duration,
    /// Maximum rows claimed per cycle.
    pub batch_size: usize,
    /// How long a claim shields a row from other dispatchers.
    pub lease: Duration,
}

impl Default for DispatcherConfig {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_secs(1),
            batch_size: 100,
            lease: Duration::from_secs(30),
        }
    }
}

/// Periodic claim → publish → mark loop over the outbox.
pub struct OutboxDispatcher {
    repository: Arc<dyn OutboxRepository>,
    bus: Arc<dyn MessageBus>,
    config: DispatcherConfig,
}

impl OutboxDispatcher {
    /// Creates a dispatcher over the given store and bus.
    #[must_use]
    pub fn new(
        repository: Arc<dyn OutboxRepository>,
        bus: Arc<dyn MessageBus>,
        config: DispatcherConfig,
    ) -> Self {
        Self {
            repository,
            bus,
            config,
        }
    }

    /// Runs until the shutdown signal flips to `true` or its sender drops.
    ///
    /// Infrastructure errors are logged and retried next cycle;
    /// configuration errors (an event type no kind maps to) abort the loop.
    pub async fn run(&self, mut shutdown: watch::Receiver<bool>) {
        info!("outbox dispatcher started");
        let mut ticker = tokio::time::interval(self.config.poll_interval);
        loop {
            tokio::select! {
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        break;
                    }
                },
                _ = ticker.tick() => {
                    match self.dispatch_batch().await {
                        Ok(0) => {},
                        Ok(count) => debug!(count, "dispatched outbox batch"),
                        Err(e) if matches!(e, ChargesError::UnknownMessageType(_)) => {
                            error!(error = %e, "outbox carries an unmapped event type, stopping");
                            break;
                        },
                        Err(e) => error!(error = %e, "outbox dispatch cycle failed"),
                    }
                },
            }
        }
        info!("outbox dispatcher stopped");
    }

    /// Claims one batch, publishes every row and marks confirmed sends.
    ///
    /// # Errors
    ///
    /// Returns [`ChargesError::Store`] or [`ChargesError::Transport`] on
    /// infrastructure failure (the claimed rows simply lapse back), and
    /// [`ChargesError::UnknownMessageType`] when a row's event type maps to
    /// no known kind — a configuration bug, not retryable.
    pub async fn dispatch_batch(&self) -> Result<usize, ChargesError> {
        let batch = self
            .repository
            .claim_batch(self.config.batch_size, self.config.lease)
            .await?;

        let mut dispatched = 0;
        for message in batch {
            let Some(kind) = EventKind::from_event_type(&message.event_type) else {
                return Err(ChargesError::UnknownMessageType(message.event_type));
            };
            self.bus
                .publish(kind.topic(), &message.payload, &message.correlation_id)
                .await?;
            self.repository.mark_dispatched(message.id).await?;
            dispatched += 1;
        }
        Ok(dispatched)
    }
}
