//! Ingestion boundary: wire bytes in, received event recorded, command out.
//!
//! Decoding happens before anything else. A decode or schema failure is
//! returned as a [`DecodeError`] and takes a distinct path back to the
//! transport layer — it never enters the rule engine and produces no
//! outcome event. Successfully decoded commands are recorded with a
//! received event in the outbox before validation starts.

use crate::factory::OutcomeEventFactory;
use charges_core::command::{
    ChargeCommand, ChargeLinkCommand, decode_charge_command, decode_charge_link_command,
};
use charges_core::correlation::CorrelationContext;
use charges_core::environment::{Clock, IdProvider};
use charges_core::error::{ChargesError, DecodeError};
use charges_core::outbox::OutboxMessage;
use charges_core::repository::{CommandPersistence, DomainWrite};
use std::sync::Arc;
use thiserror::Error;
use tracing::debug;

/// Failures at the ingestion boundary.
#[derive(Error, Debug)]
pub enum IngestionError {
    /// The bytes never became a command; reported to the transport layer.
    #[error(transparent)]
    Decode(#[from] DecodeError),

    /// Recording the received event failed; the host retries the delivery.
    #[error(transparent)]
    Pipeline(#[from] ChargesError),
}

/// Decodes inbound bytes and records the received event.
pub struct CommandIngestion {
    persistence: Arc<dyn CommandPersistence>,
    clock: Arc<dyn Clock>,
    ids: Arc<dyn IdProvider>,
    factory: OutcomeEventFactory,
}

impl CommandIngestion {
    /// Creates an ingestion boundary with its injected collaborators.
    #[must_use]
    pub fn new(
        persistence: Arc<dyn CommandPersistence>,
        clock: Arc<dyn Clock>,
        ids: Arc<dyn IdProvider>,
    ) -> Self {
        let factory = OutcomeEventFactory::new(Arc::clone(&clock));
        Self {
            persistence,
            clock,
            ids,
            factory,
        }
    }

    /// Ingests one charge command delivery.
    ///
    /// # Errors
    ///
    /// Returns [`IngestionError::Decode`] when the bytes are not a valid
    /// command (no event is recorded) and [`IngestionError::Pipeline`] when
    /// recording the received event fails.
    pub async fn ingest_charge(
        &self,
        bytes: &[u8],
        context: &CorrelationContext,
    ) -> Result<ChargeCommand, IngestionError> {
        let command = decode_charge_command(bytes)?;
        let correlation_id = context.require_id().map_err(IngestionError::Pipeline)?;
        debug!(correlation_id = %correlation_id, "charge command decoded");

        let event = self.factory.charge_received(command.clone(), correlation_id);
        let outbox = OutboxMessage::from_event(&event, self.ids.new_id(), self.clock.now())
            .map_err(IngestionError::Pipeline)?;
        self.persistence
            .persist(DomainWrite::None, outbox)
            .await
            .map_err(IngestionError::Pipeline)?;
        Ok(command)
    }

    /// Ingests one charge link command delivery.
    ///
    /// # Errors
    ///
    /// Same contract as [`CommandIngestion::ingest_charge`].
    pub async fn ingest_charge_link(
        &self,
        bytes: &[u8],
        context: &CorrelationContext,
    ) -> Result<ChargeLinkCommand, IngestionError> {
        let command = decode_charge_link_command(bytes)?;
        let correlation_id = context.require_id().map_err(IngestionError::Pipeline)?;
        debug!(correlation_id = %correlation_id, "charge link command decoded");

        let event = self.factory.link_received(command.clone(), correlation_id);
        let outbox = OutboxMessage::from_event(&event, self.ids.new_id(), self.clock.now())
            .map_err(IngestionError::Pipeline)?;
        self.persistence
            .persist(DomainWrite::None, outbox)
            .await
            .map_err(IngestionError::Pipeline)?;
        Ok(command)
    }
}
