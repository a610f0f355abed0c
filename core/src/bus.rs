//! Message bus abstraction for publishing outcome events.

use crate::error::ChargesError;
use crate::ids::CorrelationId;
use async_trait::async_trait;

/// Publish-side contract of the message bus.
///
/// At-least-once: a publish that returns `Ok` was confirmed by the bus, but
/// callers may still resend after a crash, so downstream consumers must be
/// idempotent. The correlation id travels as transport metadata, unchanged.
#[async_trait]
pub trait MessageBus: Send + Sync {
    /// Publishes one payload to a logical topic.
    ///
    /// # Errors
    ///
    /// Returns [`ChargesError::Transport`] when the bus rejects or the send
    /// is not confirmed.
    async fn publish(
        &self,
        topic: &str,
        payload: &[u8],
        correlation_id: &CorrelationId,
    ) -> Result<(), ChargesError>;
}
