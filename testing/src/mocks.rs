//! Mock implementations of the core contracts.

use async_trait::async_trait;
use charges_core::available_data::{AvailableData, AvailableDataStore};
use charges_core::bus::MessageBus;
use charges_core::environment::{Clock, IdProvider};
use charges_core::error::ChargesError;
use charges_core::ids::{CorrelationId, MarketParticipantId, MeteringPointId};
use charges_core::links::{LinkErrorCode, MeteringPoint, ReplyHandler};
use charges_core::notification::{MessageHubClient, Notification};
use charges_core::outbox::{OutboxMessage, OutboxRepository};
use charges_core::participant::{MarketParticipant, MarketParticipantRole};
use charges_core::repository::{
    CommandPersistence, DomainWrite, MarketParticipantRepository, MeteringPointRepository,
};
use chrono::{DateTime, Duration as ChronoDuration, Utc};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;
use uuid::Uuid;

fn lock<T>(mutex: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Fixed clock for deterministic tests: always returns the same time.
#[derive(Debug, Clone)]
pub struct FixedClock {
    time: DateTime<Utc>,
}

impl FixedClock {
    /// Creates a clock pinned to the given time.
    #[must_use]
    pub const fn new(time: DateTime<Utc>) -> Self {
        Self { time }
    }
}

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.time
    }
}

/// Deterministic id provider: ids are sequential uuids starting at 1.
#[derive(Debug, Default)]
pub struct SequenceIdProvider {
    next: AtomicU64,
}

impl SequenceIdProvider {
    /// Creates a provider whose first id is `Uuid::from_u128(1)`.
    #[must_use]
    pub fn new() -> Self {
        Self {
            next: AtomicU64::new(1),
        }
    }
}

impl IdProvider for SequenceIdProvider {
    fn new_id(&self) -> Uuid {
        Uuid::from_u128(u128::from(self.next.fetch_add(1, Ordering::Relaxed)))
    }
}

/// In-memory outbox honoring the atomic-claim contract under one process.
#[derive(Default)]
pub struct InMemoryOutboxRepository {
    rows: Mutex<Vec<OutboxMessage>>,
}

impl InMemoryOutboxRepository {
    /// Creates an empty outbox.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a row, as the transactional persistence would.
    pub fn enqueue(&self, message: OutboxMessage) {
        lock(&self.rows).push(message);
    }

    /// Snapshot of all rows.
    #[must_use]
    pub fn rows(&self) -> Vec<OutboxMessage> {
        lock(&self.rows).clone()
    }

    /// Rows not yet marked dispatched.
    #[must_use]
    pub fn pending(&self) -> Vec<OutboxMessage> {
        lock(&self.rows)
            .iter()
            .filter(|row| row.is_pending())
            .cloned()
            .collect()
    }
}

#[async_trait]
impl OutboxRepository for InMemoryOutboxRepository {
    async fn claim_batch(
        &self,
        limit: usize,
        lease: Duration,
    ) -> Result<Vec<OutboxMessage>, ChargesError> {
        let now = Utc::now();
        let lease = ChronoDuration::from_std(lease)
            .map_err(|e| ChargesError::Store(e.to_string()))?;
        let mut rows = lock(&self.rows);
        let mut claimed = Vec::new();
        for row in rows.iter_mut() {
            if claimed.len() == limit {
                break;
            }
            let claimable =
                row.is_pending() && row.claimed_until.is_none_or(|until| until <= now);
            if claimable {
                row.claimed_until = Some(now + lease);
                claimed.push(row.clone());
            }
        }
        Ok(claimed)
    }

    async fn mark_dispatched(&self, id: Uuid) -> Result<(), ChargesError> {
        let mut rows = lock(&self.rows);
        match rows.iter_mut().find(|row| row.id == id) {
            Some(row) => {
                row.dispatched_at = Some(Utc::now());
                Ok(())
            },
            None => Err(ChargesError::Store(format!("no outbox row {id}"))),
        }
    }
}

/// In-memory transactional persistence recording domain writes and feeding
/// an [`InMemoryOutboxRepository`].
pub struct InMemoryCommandPersistence {
    outbox: Arc<InMemoryOutboxRepository>,
    writes: Mutex<Vec<DomainWrite>>,
    fail_next: Mutex<Option<String>>,
}

impl InMemoryCommandPersistence {
    /// Creates a persistence writing into the given outbox.
    #[must_use]
    pub fn new(outbox: Arc<InMemoryOutboxRepository>) -> Self {
        Self {
            outbox,
            writes: Mutex::new(Vec::new()),
            fail_next: Mutex::new(None),
        }
    }

    /// Makes the next `persist` call fail with a store error.
    pub fn fail_next_with(&self, message: impl Into<String>) {
        *lock(&self.fail_next) = Some(message.into());
    }

    /// Domain writes recorded so far.
    #[must_use]
    pub fn writes(&self) -> Vec<DomainWrite> {
        lock(&self.writes).clone()
    }
}

#[async_trait]
impl CommandPersistence for InMemoryCommandPersistence {
    async fn persist(
        &self,
        write: DomainWrite,
        outbox: OutboxMessage,
    ) -> Result<(), ChargesError> {
        if let Some(message) = lock(&self.fail_next).take() {
            return Err(ChargesError::Store(message));
        }
        lock(&self.writes).push(write);
        self.outbox.enqueue(outbox);
        Ok(())
    }
}

/// One message captured by [`RecordingMessageBus`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PublishedMessage {
    /// Logical topic the message went to.
    pub topic: String,
    /// Raw payload.
    pub payload: Vec<u8>,
    /// Correlation id carried as metadata.
    pub correlation_id: CorrelationId,
}

/// Message bus double that records every publish.
#[derive(Default)]
pub struct RecordingMessageBus {
    published: Mutex<Vec<PublishedMessage>>,
    fail: Mutex<bool>,
}

impl RecordingMessageBus {
    /// Creates an empty recording bus.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes every subsequent publish fail with a transport error.
    pub fn fail_publishes(&self) {
        *lock(&self.fail) = true;
    }

    /// Everything published so far.
    #[must_use]
    pub fn published(&self) -> Vec<PublishedMessage> {
        lock(&self.published).clone()
    }
}

#[async_trait]
impl MessageBus for RecordingMessageBus {
    async fn publish(
        &self,
        topic: &str,
        payload: &[u8],
        correlation_id: &CorrelationId,
    ) -> Result<(), ChargesError> {
        if *lock(&self.fail) {
            return Err(ChargesError::Transport("publish refused".to_string()));
        }
        lock(&self.published).push(PublishedMessage {
            topic: topic.to_string(),
            payload: payload.to_vec(),
            correlation_id: correlation_id.clone(),
        });
        Ok(())
    }
}

/// MessageHub client double that records every notification.
#[derive(Default)]
pub struct RecordingMessageHubClient {
    notified: Mutex<Vec<(CorrelationId, Notification)>>,
}

impl RecordingMessageHubClient {
    /// Creates an empty recording client.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Every notification sent so far.
    #[must_use]
    pub fn notified(&self) -> Vec<(CorrelationId, Notification)> {
        lock(&self.notified).clone()
    }
}

#[async_trait]
impl MessageHubClient for RecordingMessageHubClient {
    async fn notify(
        &self,
        correlation_id: &CorrelationId,
        notification: &Notification,
    ) -> Result<(), ChargesError> {
        lock(&self.notified).push((correlation_id.clone(), notification.clone()));
        Ok(())
    }
}

/// In-memory append-only available-data store.
#[derive(Default)]
pub struct InMemoryAvailableDataStore {
    rows: Mutex<Vec<AvailableData>>,
}

impl InMemoryAvailableDataStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of all rows.
    #[must_use]
    pub fn rows(&self) -> Vec<AvailableData> {
        lock(&self.rows).clone()
    }
}

#[async_trait]
impl AvailableDataStore for InMemoryAvailableDataStore {
    async fn store(&self, rows: &[AvailableData]) -> Result<(), ChargesError> {
        lock(&self.rows).extend_from_slice(rows);
        Ok(())
    }

    async fn get_by_reference_ids(
        &self,
        reference_ids: &[Uuid],
    ) -> Result<Vec<AvailableData>, ChargesError> {
        Ok(lock(&self.rows)
            .iter()
            .filter(|row| reference_ids.contains(&row.reference_id))
            .cloned()
            .collect())
    }
}

/// In-memory market participant reference data.
#[derive(Default)]
pub struct InMemoryMarketParticipantRepository {
    participants: Mutex<Vec<MarketParticipant>>,
}

impl InMemoryMarketParticipantRepository {
    /// Creates a repository holding the given participants.
    #[must_use]
    pub fn with_participants(participants: Vec<MarketParticipant>) -> Self {
        Self {
            participants: Mutex::new(participants),
        }
    }
}

#[async_trait]
impl MarketParticipantRepository for InMemoryMarketParticipantRepository {
    async fn find_by_id(
        &self,
        id: &MarketParticipantId,
    ) -> Result<Option<MarketParticipant>, ChargesError> {
        Ok(lock(&self.participants)
            .iter()
            .find(|p| &p.id == id)
            .cloned())
    }

    async fn active_grid_access_providers(
        &self,
    ) -> Result<Vec<MarketParticipant>, ChargesError> {
        Ok(lock(&self.participants)
            .iter()
            .filter(|p| p.active && p.role == MarketParticipantRole::GridAccessProvider)
            .cloned()
            .collect())
    }
}

/// In-memory metering point reference data.
#[derive(Default)]
pub struct InMemoryMeteringPointRepository {
    points: Mutex<Vec<MeteringPoint>>,
}

impl InMemoryMeteringPointRepository {
    /// Creates a repository holding the given metering points.
    #[must_use]
    pub fn with_points(points: Vec<MeteringPoint>) -> Self {
        Self {
            points: Mutex::new(points),
        }
    }
}

#[async_trait]
impl MeteringPointRepository for InMemoryMeteringPointRepository {
    async fn find_by_id(
        &self,
        id: &MeteringPointId,
    ) -> Result<Option<MeteringPoint>, ChargesError> {
        Ok(lock(&self.points).iter().find(|p| &p.id == id).cloned())
    }
}

/// Reply handler double recording which continuation ran.
#[derive(Default)]
pub struct RecordingReplyHandler {
    successes: Mutex<Vec<(MeteringPointId, bool)>>,
    failures: Mutex<Vec<(MeteringPointId, LinkErrorCode)>>,
}

impl RecordingReplyHandler {
    /// Creates an empty recording handler.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Success continuations observed so far.
    #[must_use]
    pub fn successes(&self) -> Vec<(MeteringPointId, bool)> {
        lock(&self.successes).clone()
    }

    /// Failure continuations observed so far.
    #[must_use]
    pub fn failures(&self) -> Vec<(MeteringPointId, LinkErrorCode)> {
        lock(&self.failures).clone()
    }
}

#[async_trait]
impl ReplyHandler for RecordingReplyHandler {
    async fn on_success(&self, metering_point_id: MeteringPointId, did_create_links: bool) {
        lock(&self.successes).push((metering_point_id, did_create_links));
    }

    async fn on_failure(&self, metering_point_id: MeteringPointId, error_code: LinkErrorCode) {
        lock(&self.failures).push((metering_point_id, error_code));
    }
}
