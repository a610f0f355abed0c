//! Transactional outbox: durable intent-to-publish records.
//!
//! An [`OutboxMessage`] is appended in the same transaction as any domain
//! write its processing caused, which makes domain state and "intent to
//! publish" atomic. A separately scheduled dispatcher later claims
//! un-dispatched rows, publishes them and marks them dispatched only after a
//! confirmed send — at-least-once delivery. Downstream consumers dedupe by
//! `(event_type, correlation_id)` or tolerate duplicates.
//!
//! Claiming uses a lease: a row is claimable when it is un-dispatched and its
//! `claimed_until` is absent or expired. A dispatcher that crashes between
//! send and mark simply lets the lease lapse, and the row is re-published.

use crate::error::ChargesError;
use crate::events::OutcomeEvent;
use crate::ids::CorrelationId;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use uuid::Uuid;

/// One durable intent-to-publish row.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutboxMessage {
    /// Row identity.
    pub id: Uuid,
    /// Versioned event type name of the payload.
    pub event_type: String,
    /// Serialized event payload.
    pub payload: Vec<u8>,
    /// Correlation id of the originating request.
    pub correlation_id: CorrelationId,
    /// When the row was appended.
    pub created_at: DateTime<Utc>,
    /// Set once after a confirmed send; never cleared.
    pub dispatched_at: Option<DateTime<Utc>>,
    /// Lease expiry while a dispatcher is working the row.
    pub claimed_until: Option<DateTime<Utc>>,
}

impl OutboxMessage {
    /// Builds an outbox row from an outcome event.
    ///
    /// # Errors
    ///
    /// Returns [`ChargesError::Serialization`] when the event payload cannot
    /// be encoded.
    pub fn from_event(
        event: &OutcomeEvent,
        id: Uuid,
        created_at: DateTime<Utc>,
    ) -> Result<Self, ChargesError> {
        Ok(Self {
            id,
            event_type: event.kind().event_type().to_string(),
            payload: event.to_payload()?,
            correlation_id: event.correlation_id().clone(),
            created_at,
            dispatched_at: None,
            claimed_until: None,
        })
    }

    /// True when the row has not yet been confirmed as sent.
    #[must_use]
    pub const fn is_pending(&self) -> bool {
        self.dispatched_at.is_none()
    }
}

/// Store-side contract the outbox dispatcher runs against.
///
/// Multiple dispatcher instances may run concurrently; `claim_batch` must be
/// atomic so no two dispatchers hold the same row within one lease period.
#[async_trait]
pub trait OutboxRepository: Send + Sync {
    /// Atomically claims up to `limit` un-dispatched rows for `lease`.
    ///
    /// # Errors
    ///
    /// Returns [`ChargesError::Store`] on store failure.
    async fn claim_batch(
        &self,
        limit: usize,
        lease: Duration,
    ) -> Result<Vec<OutboxMessage>, ChargesError>;

    /// Marks a row dispatched after a confirmed send.
    ///
    /// # Errors
    ///
    /// Returns [`ChargesError::Store`] on store failure.
    async fn mark_dispatched(&self, id: Uuid) -> Result<(), ChargesError>;
}
