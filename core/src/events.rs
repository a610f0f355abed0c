//! Outcome events and their topic mapping.
//!
//! Every processing attempt terminates in exactly one outcome event —
//! accepted or rejected — and the ingestion boundary additionally records a
//! received event per inbound command. Events are immutable once built and
//! serialized with `serde_json` for the outbox.

use crate::command::{ChargeCommand, ChargeLinkCommand};
use crate::error::ChargesError;
use crate::ids::CorrelationId;
use crate::validation::ValidationResult;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// The kinds of events this core publishes, and their logical destinations.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum EventKind {
    /// A charge command entered the pipeline.
    ChargeCommandReceived,
    /// A charge command passed all rules.
    ChargeCommandAccepted,
    /// A charge command violated at least one rule.
    ChargeCommandRejected,
    /// A charge link command entered the pipeline.
    ChargeLinkCommandReceived,
    /// A charge link command passed all rules.
    ChargeLinkCommandAccepted,
    /// A charge link command violated at least one rule.
    ChargeLinkCommandRejected,
}

impl EventKind {
    /// Logical topic this kind is published to.
    ///
    /// The physical configuration of the destination is external; the
    /// kind-to-name mapping is part of this core's contract.
    #[must_use]
    pub const fn topic(self) -> &'static str {
        match self {
            Self::ChargeCommandReceived => "charge-command-received",
            Self::ChargeCommandAccepted => "charge-command-accepted",
            Self::ChargeCommandRejected => "charge-command-rejected",
            Self::ChargeLinkCommandReceived => "charge-link-command-received",
            Self::ChargeLinkCommandAccepted => "charge-link-command-accepted",
            Self::ChargeLinkCommandRejected => "charge-link-command-rejected",
        }
    }

    /// Versioned event type name stored alongside the payload.
    #[must_use]
    pub const fn event_type(self) -> &'static str {
        match self {
            Self::ChargeCommandReceived => "ChargeCommandReceived.v1",
            Self::ChargeCommandAccepted => "ChargeCommandAccepted.v1",
            Self::ChargeCommandRejected => "ChargeCommandRejected.v1",
            Self::ChargeLinkCommandReceived => "ChargeLinkCommandReceived.v1",
            Self::ChargeLinkCommandAccepted => "ChargeLinkCommandAccepted.v1",
            Self::ChargeLinkCommandRejected => "ChargeLinkCommandRejected.v1",
        }
    }

    /// Resolves a kind from its stored event type name.
    #[must_use]
    pub fn from_event_type(event_type: &str) -> Option<Self> {
        match event_type {
            "ChargeCommandReceived.v1" => Some(Self::ChargeCommandReceived),
            "ChargeCommandAccepted.v1" => Some(Self::ChargeCommandAccepted),
            "ChargeCommandRejected.v1" => Some(Self::ChargeCommandRejected),
            "ChargeLinkCommandReceived.v1" => Some(Self::ChargeLinkCommandReceived),
            "ChargeLinkCommandAccepted.v1" => Some(Self::ChargeLinkCommandAccepted),
            "ChargeLinkCommandRejected.v1" => Some(Self::ChargeLinkCommandRejected),
            _ => None,
        }
    }
}

/// One outcome (or ingestion) event, created once and never mutated.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum OutcomeEvent {
    /// A charge command entered the pipeline.
    ChargeCommandReceived {
        /// Process-clock time the event was built.
        published_time: DateTime<Utc>,
        /// Correlation id of the originating request, unchanged.
        correlation_id: CorrelationId,
        /// The command as received.
        command: ChargeCommand,
    },
    /// A charge command passed all rules.
    ChargeCommandAccepted {
        /// Process-clock time the event was built.
        published_time: DateTime<Utc>,
        /// Correlation id of the originating request, unchanged.
        correlation_id: CorrelationId,
        /// The accepted command.
        command: ChargeCommand,
    },
    /// A charge command violated at least one rule.
    ChargeCommandRejected {
        /// Process-clock time the event was built.
        published_time: DateTime<Utc>,
        /// Correlation id of the originating request, unchanged.
        correlation_id: CorrelationId,
        /// The rejected command.
        command: ChargeCommand,
        /// Violated rule codes in factory declaration order, or a single
        /// folded error message.
        reasons: Vec<String>,
    },
    /// A charge link command entered the pipeline.
    ChargeLinkCommandReceived {
        /// Process-clock time the event was built.
        published_time: DateTime<Utc>,
        /// Correlation id of the originating request, unchanged.
        correlation_id: CorrelationId,
        /// The command as received.
        command: ChargeLinkCommand,
    },
    /// A charge link command passed all rules.
    ChargeLinkCommandAccepted {
        /// Process-clock time the event was built.
        published_time: DateTime<Utc>,
        /// Correlation id of the originating request, unchanged.
        correlation_id: CorrelationId,
        /// The accepted command.
        command: ChargeLinkCommand,
    },
    /// A charge link command violated at least one rule.
    ChargeLinkCommandRejected {
        /// Process-clock time the event was built.
        published_time: DateTime<Utc>,
        /// Correlation id of the originating request, unchanged.
        correlation_id: CorrelationId,
        /// The rejected command.
        command: ChargeLinkCommand,
        /// Violated rule codes in factory declaration order, or a single
        /// folded error message.
        reasons: Vec<String>,
    },
}

impl OutcomeEvent {
    /// The kind of this event.
    #[must_use]
    pub const fn kind(&self) -> EventKind {
        match self {
            Self::ChargeCommandReceived { .. } => EventKind::ChargeCommandReceived,
            Self::ChargeCommandAccepted { .. } => EventKind::ChargeCommandAccepted,
            Self::ChargeCommandRejected { .. } => EventKind::ChargeCommandRejected,
            Self::ChargeLinkCommandReceived { .. } => EventKind::ChargeLinkCommandReceived,
            Self::ChargeLinkCommandAccepted { .. } => EventKind::ChargeLinkCommandAccepted,
            Self::ChargeLinkCommandRejected { .. } => EventKind::ChargeLinkCommandRejected,
        }
    }

    /// Correlation id of the originating request.
    #[must_use]
    pub const fn correlation_id(&self) -> &CorrelationId {
        match self {
            Self::ChargeCommandReceived { correlation_id, .. }
            | Self::ChargeCommandAccepted { correlation_id, .. }
            | Self::ChargeCommandRejected { correlation_id, .. }
            | Self::ChargeLinkCommandReceived { correlation_id, .. }
            | Self::ChargeLinkCommandAccepted { correlation_id, .. }
            | Self::ChargeLinkCommandRejected { correlation_id, .. } => correlation_id,
        }
    }

    /// Serializes the event for the outbox.
    ///
    /// # Errors
    ///
    /// Returns [`ChargesError::Serialization`] when the payload cannot be
    /// encoded.
    pub fn to_payload(&self) -> Result<Vec<u8>, ChargesError> {
        serde_json::to_vec(self).map_err(|e| ChargesError::Serialization(e.to_string()))
    }

    /// Decodes an event from an outbox payload.
    ///
    /// # Errors
    ///
    /// Returns [`ChargesError::Serialization`] when the payload cannot be
    /// decoded.
    pub fn from_payload(payload: &[u8]) -> Result<Self, ChargesError> {
        serde_json::from_slice(payload).map_err(|e| ChargesError::Serialization(e.to_string()))
    }

    /// Renders the ordered reasons for a rejection from a validation result.
    #[must_use]
    pub fn reasons_from(validation: &ValidationResult) -> Vec<String> {
        validation
            .failed_rules()
            .iter()
            .map(|id| id.code().to_string())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::validation::{RuleIdentifier, ValidationResult};

    #[test]
    fn event_type_round_trips_through_kind() {
        for kind in [
            EventKind::ChargeCommandReceived,
            EventKind::ChargeCommandAccepted,
            EventKind::ChargeCommandRejected,
            EventKind::ChargeLinkCommandReceived,
            EventKind::ChargeLinkCommandAccepted,
            EventKind::ChargeLinkCommandRejected,
        ] {
            assert_eq!(EventKind::from_event_type(kind.event_type()), Some(kind));
        }
        assert_eq!(EventKind::from_event_type("Unrelated.v1"), None);
    }

    #[test]
    fn every_kind_has_a_distinct_topic() {
        let kinds = [
            EventKind::ChargeCommandReceived,
            EventKind::ChargeCommandAccepted,
            EventKind::ChargeCommandRejected,
            EventKind::ChargeLinkCommandReceived,
            EventKind::ChargeLinkCommandAccepted,
            EventKind::ChargeLinkCommandRejected,
        ];
        let topics: std::collections::HashSet<&str> =
            kinds.iter().map(|k| k.topic()).collect();
        assert_eq!(topics.len(), kinds.len());
    }

    #[test]
    fn rejection_reasons_preserve_declaration_order() {
        let validation = ValidationResult::from_failures(vec![
            RuleIdentifier::ChargeIdRequired,
            RuleIdentifier::StartDateValidation,
        ]);
        assert_eq!(
            OutcomeEvent::reasons_from(&validation),
            vec!["VR223".to_string(), "VR209".to_string()]
        );
    }
}
