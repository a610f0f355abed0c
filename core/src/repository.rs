//! Repository and persistence contracts implemented by the storage crate.
//!
//! The traits here are deliberately narrow: each names exactly the queries
//! the pipeline needs. Implementations must be `Send + Sync` so they can be
//! shared as `Arc<dyn …>` across concurrent worker invocations.

use crate::charge::Charge;
use crate::command::ChargeLinkOperation;
use crate::error::ChargesError;
use crate::ids::{MarketParticipantId, MeteringPointId};
use crate::links::MeteringPoint;
use crate::outbox::OutboxMessage;
use crate::participant::MarketParticipant;
use async_trait::async_trait;

/// Read access to registered market participants.
#[async_trait]
pub trait MarketParticipantRepository: Send + Sync {
    /// Resolves a participant by id.
    ///
    /// # Errors
    ///
    /// Returns [`ChargesError::Store`] on lookup failure.
    async fn find_by_id(
        &self,
        id: &MarketParticipantId,
    ) -> Result<Option<MarketParticipant>, ChargesError>;

    /// All currently active grid access providers, used for charge
    /// broadcast fan-out.
    ///
    /// # Errors
    ///
    /// Returns [`ChargesError::Store`] on lookup failure.
    async fn active_grid_access_providers(&self)
    -> Result<Vec<MarketParticipant>, ChargesError>;
}

/// Read access to metering points.
#[async_trait]
pub trait MeteringPointRepository: Send + Sync {
    /// Resolves a metering point by id.
    ///
    /// # Errors
    ///
    /// Returns [`ChargesError::Store`] on lookup failure.
    async fn find_by_id(
        &self,
        id: &MeteringPointId,
    ) -> Result<Option<MeteringPoint>, ChargesError>;
}

/// The domain write an accepted command causes, persisted atomically with
/// its outbox row.
#[derive(Clone, Debug, PartialEq)]
pub enum DomainWrite {
    /// Nothing to write (rejections only record their outcome).
    None,
    /// Upsert charges from an accepted charge command, one per operation.
    Charges(Vec<Charge>),
    /// Insert charge links from an accepted link command.
    ChargeLinks(Vec<ChargeLinkOperation>),
}

/// Transactional persistence boundary for one processing attempt.
///
/// One call covers the whole attempt: the implementation opens a single
/// unit of work, applies the domain write and appends the outbox row inside
/// it, and commits. Either both land or neither does.
#[async_trait]
pub trait CommandPersistence: Send + Sync {
    /// Atomically persists a domain write together with its outbox row.
    ///
    /// # Errors
    ///
    /// Returns [`ChargesError::Store`] when the transaction fails; the
    /// caller treats that as infrastructure and propagates.
    async fn persist(
        &self,
        write: DomainWrite,
        outbox: OutboxMessage,
    ) -> Result<(), ChargesError>;
}
