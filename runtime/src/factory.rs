//! Outcome event factory: one event per processing attempt, no exceptions.

use charges_core::command::{ChargeCommand, ChargeLinkCommand};
use charges_core::environment::Clock;
use charges_core::events::OutcomeEvent;
use charges_core::ids::CorrelationId;
use charges_core::validation::ValidationResult;
use std::sync::Arc;

/// Turns a command plus a validation result (or a folded error) into
/// exactly one outcome event, stamped with the process clock.
pub struct OutcomeEventFactory {
    clock: Arc<dyn Clock>,
}

impl OutcomeEventFactory {
    /// Creates a factory using the given clock.
    #[must_use]
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self { clock }
    }

    /// Records that a charge command entered the pipeline.
    #[must_use]
    pub fn charge_received(
        &self,
        command: ChargeCommand,
        correlation_id: &CorrelationId,
    ) -> OutcomeEvent {
        OutcomeEvent::ChargeCommandReceived {
            published_time: self.clock.now(),
            correlation_id: correlation_id.clone(),
            command,
        }
    }

    /// Records that a charge link command entered the pipeline.
    #[must_use]
    pub fn link_received(
        &self,
        command: ChargeLinkCommand,
        correlation_id: &CorrelationId,
    ) -> OutcomeEvent {
        OutcomeEvent::ChargeLinkCommandReceived {
            published_time: self.clock.now(),
            correlation_id: correlation_id.clone(),
            command,
        }
    }

    /// Builds the outcome for a charge command from its validation result.
    #[must_use]
    pub fn charge_outcome(
        &self,
        command: ChargeCommand,
        correlation_id: &CorrelationId,
        validation: &ValidationResult,
    ) -> OutcomeEvent {
        if validation.is_succeeded() {
            OutcomeEvent::ChargeCommandAccepted {
                published_time: self.clock.now(),
                correlation_id: correlation_id.clone(),
                command,
            }
        } else {
            OutcomeEvent::ChargeCommandRejected {
                published_time: self.clock.now(),
                correlation_id: correlation_id.clone(),
                command,
                reasons: OutcomeEvent::reasons_from(validation),
            }
        }
    }

    /// Builds the outcome for a charge link command from its validation
    /// result.
    #[must_use]
    pub fn link_outcome(
        &self,
        command: ChargeLinkCommand,
        correlation_id: &CorrelationId,
        validation: &ValidationResult,
    ) -> OutcomeEvent {
        if validation.is_succeeded() {
            OutcomeEvent::ChargeLinkCommandAccepted {
                published_time: self.clock.now(),
                correlation_id: correlation_id.clone(),
                command,
            }
        } else {
            OutcomeEvent::ChargeLinkCommandRejected {
                published_time: self.clock.now(),
                correlation_id: correlation_id.clone(),
                command,
                reasons: OutcomeEvent::reasons_from(validation),
            }
        }
    }

    /// Folds a domain-class error into a single-reason rejection.
    ///
    /// Callers must check the error class first: infrastructure and
    /// configuration errors are never folded.
    #[must_use]
    pub fn charge_rejected_with_reason(
        &self,
        command: ChargeCommand,
        correlation_id: &CorrelationId,
        reason: String,
    ) -> OutcomeEvent {
        OutcomeEvent::ChargeCommandRejected {
            published_time: self.clock.now(),
            correlation_id: correlation_id.clone(),
            command,
            reasons: vec![reason],
        }
    }

    /// Folds a domain-class error into a single-reason link rejection.
    #[must_use]
    pub fn link_rejected_with_reason(
        &self,
        command: ChargeLinkCommand,
        correlation_id: &CorrelationId,
        reason: String,
    ) -> OutcomeEvent {
        OutcomeEvent::ChargeLinkCommandRejected {
            published_time: self.clock.now(),
            correlation_id: correlation_id.clone(),
            command,
            reasons: vec![reason],
        }
    }
}
