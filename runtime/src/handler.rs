//! Command handlers: validate, persist, emit exactly one outcome event.
//!
//! The handler is the single exception boundary of the pipeline. A
//! domain-class error raised anywhere while validating or persisting is
//! caught exactly once here and folded into a rejected event with that
//! error's message as its only reason. Infrastructure and configuration
//! errors propagate untouched so the host can retry or fail loudly.

use crate::factory::OutcomeEventFactory;
use charges_core::command::{ChargeCommand, ChargeLinkCommand};
use charges_core::environment::{Clock, IdProvider};
use charges_core::error::ChargesError;
use charges_core::events::OutcomeEvent;
use charges_core::ids::CorrelationId;
use charges_core::outbox::OutboxMessage;
use charges_core::repository::{CommandPersistence, DomainWrite};
use charges_core::validation::document::DocumentValidationRulesFactory;
use charges_core::validation::input::{InputValidationRulesFactory, ValidationConfig};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Handles inbound charge commands.
pub struct ChargeCommandHandler {
    config: ValidationConfig,
    document_rules: DocumentValidationRulesFactory,
    persistence: Arc<dyn CommandPersistence>,
    clock: Arc<dyn Clock>,
    ids: Arc<dyn IdProvider>,
    factory: OutcomeEventFactory,
}

impl ChargeCommandHandler {
    /// Creates a handler with its injected collaborators.
    #[must_use]
    pub fn new(
        config: ValidationConfig,
        document_rules: DocumentValidationRulesFactory,
        persistence: Arc<dyn CommandPersistence>,
        clock: Arc<dyn Clock>,
        ids: Arc<dyn IdProvider>,
    ) -> Self {
        let factory = OutcomeEventFactory::new(Arc::clone(&clock));
        Self {
            config,
            document_rules,
            persistence,
            clock,
            ids,
            factory,
        }
    }

    /// Processes one charge command to exactly one outcome event.
    ///
    /// # Errors
    ///
    /// Returns infrastructure or configuration errors unchanged; every
    /// domain-class failure is folded into the returned rejected event.
    pub async fn handle(
        &self,
        command: ChargeCommand,
        correlation_id: &CorrelationId,
    ) -> Result<OutcomeEvent, ChargesError> {
        match self.process(command.clone(), correlation_id).await {
            Ok(event) => Ok(event),
            Err(error) if error.is_foldable() => {
                warn!(correlation_id = %correlation_id, error = %error, "folding domain error into rejection");
                let event = self.factory.charge_rejected_with_reason(
                    command,
                    correlation_id,
                    error.to_string(),
                );
                self.persist(&event, DomainWrite::None).await?;
                Ok(event)
            },
            Err(error) => Err(error),
        }
    }

    async fn process(
        &self,
        command: ChargeCommand,
        correlation_id: &CorrelationId,
    ) -> Result<OutcomeEvent, ChargesError> {
        let now = self.clock.now();
        debug!(document_id = %command.document.id, "validating charge command");

        let input =
            InputValidationRulesFactory::create_rules_for_charge(&command, &self.config, now)
                .validate();
        if !input.is_succeeded() {
            let event = self.factory.charge_outcome(command, correlation_id, &input);
            self.persist(&event, DomainWrite::None).await?;
            return Ok(event);
        }

        let document = self
            .document_rules
            .create_rules(&command.document)
            .await?
            .validate();
        if !document.is_succeeded() {
            let event = self
                .factory
                .charge_outcome(command, correlation_id, &document);
            self.persist(&event, DomainWrite::None).await?;
            return Ok(event);
        }

        let charges = command.operations.iter().map(|op| op.to_charge()).collect();
        let event = self
            .factory
            .charge_outcome(command, correlation_id, &document);
        self.persist(&event, DomainWrite::Charges(charges)).await?;
        info!(correlation_id = %correlation_id, "charge command accepted");
        Ok(event)
    }

    async fn persist(
        &self,
        event: &OutcomeEvent,
        write: DomainWrite,
    ) -> Result<(), ChargesError> {
        let outbox = OutboxMessage::from_event(event, self.ids.new_id(), self.clock.now())?;
        self.persistence.persist(write, outbox).await
    }
}

/// Handles inbound charge link commands.
pub struct ChargeLinkCommandHandler {
    config: ValidationConfig,
    document_rules: DocumentValidationRulesFactory,
    persistence: Arc<dyn CommandPersistence>,
    clock: Arc<dyn Clock>,
    ids: Arc<dyn IdProvider>,
    factory: OutcomeEventFactory,
}

impl ChargeLinkCommandHandler {
    /// Creates a handler with its injected collaborators.
    #[must_use]
    pub fn new(
        config: ValidationConfig,
        document_rules: DocumentValidationRulesFactory,
        persistence: Arc<dyn CommandPersistence>,
        clock: Arc<dyn Clock>,
        ids: Arc<dyn IdProvider>,
    ) -> Self {
        let factory = OutcomeEventFactory::new(Arc::clone(&clock));
        Self {
            config,
            document_rules,
            persistence,
            clock,
            ids,
            factory,
        }
    }

    /// Processes one charge link command to exactly one outcome event.
    ///
    /// # Errors
    ///
    /// Returns infrastructure or configuration errors unchanged; every
    /// domain-class failure is folded into the returned rejected event.
    pub async fn handle(
        &self,
        command: ChargeLinkCommand,
        correlation_id: &CorrelationId,
    ) -> Result<OutcomeEvent, ChargesError> {
        match self.process(command.clone(), correlation_id).await {
            Ok(event) => Ok(event),
            Err(error) if error.is_foldable() => {
                warn!(correlation_id = %correlation_id, error = %error, "folding domain error into rejection");
                let event = self.factory.link_rejected_with_reason(
                    command,
                    correlation_id,
                    error.to_string(),
                );
                self.persist(&event, DomainWrite::None).await?;
                Ok(event)
            },
            Err(error) => Err(error),
        }
    }

    async fn process(
        &self,
        command: ChargeLinkCommand,
        correlation_id: &CorrelationId,
    ) -> Result<OutcomeEvent, ChargesError> {
        let now = self.clock.now();
        debug!(document_id = %command.document.id, "validating charge link command");

        let input =
            InputValidationRulesFactory::create_rules_for_link(&command, &self.config, now)
                .validate();
        if !input.is_succeeded() {
            let event = self.factory.link_outcome(command, correlation_id, &input);
            self.persist(&event, DomainWrite::None).await?;
            return Ok(event);
        }

        let document = self
            .document_rules
            .create_rules(&command.document)
            .await?
            .validate();
        if !document.is_succeeded() {
            let event = self.factory.link_outcome(command, correlation_id, &document);
            self.persist(&event, DomainWrite::None).await?;
            return Ok(event);
        }

        let links = command.operations.clone();
        let event = self.factory.link_outcome(command, correlation_id, &document);
        self.persist(&event, DomainWrite::ChargeLinks(links)).await?;
        info!(correlation_id = %correlation_id, "charge link command accepted");
        Ok(event)
    }

    async fn persist(
        &self,
        event: &OutcomeEvent,
        write: DomainWrite,
    ) -> Result<(), ChargesError> {
        let outbox = OutboxMessage::from_event(event, self.ids.new_id(), self.clock.now())?;
        self.persistence.persist(write, outbox).await
    }
}
