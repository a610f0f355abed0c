//! Error taxonomy for the charges core.
//!
//! Every failure is classified into one of three classes, and the class
//! decides its path through the pipeline:
//!
//! - **Domain**: a business-level failure. Folded exactly once into a
//!   rejected outcome event at the handler boundary; never propagates.
//! - **Infrastructure**: a lookup or transport failure. Propagates so the
//!   host can retry the whole invocation.
//! - **Configuration**: a programming or deployment bug (unknown message
//!   type prefix, missing required argument, mixed bundle). Fatal; requires
//!   a fix, not a retry.

use thiserror::Error;

/// Classification of a [`ChargesError`].
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum ErrorClass {
    /// Business-level failure, folded into a rejected event.
    Domain,
    /// Transient failure, propagated for host retry.
    Infrastructure,
    /// Fatal misconfiguration or programming error.
    Configuration,
}

/// Errors raised across the charges core.
#[derive(Error, Debug)]
pub enum ChargesError {
    /// A command was invalid at the business level.
    #[error("invalid command: {0}")]
    InvalidCommand(String),

    /// A repository or store call failed.
    #[error("store failure: {0}")]
    Store(String),

    /// A message bus or queue call failed.
    #[error("transport failure: {0}")]
    Transport(String),

    /// A referenced record was not (yet) present in the store.
    #[error("not found: {0}")]
    NotFound(String),

    /// A payload could not be serialized or deserialized.
    #[error("serialization failure: {0}")]
    Serialization(String),

    /// A message type prefix matched no configured bundle creator.
    #[error("unknown message type: {0}")]
    UnknownMessageType(String),

    /// A bundle request referenced rows with mixed header fields.
    #[error("mixed bundle: {0}")]
    MixedBundle(String),

    /// A required argument was absent or blank.
    #[error("missing required argument: {0}")]
    MissingArgument(&'static str),

    /// A correlation id was set twice for one invocation.
    #[error("correlation id already set")]
    CorrelationAlreadySet,

    /// No correlation id was set for the current invocation.
    #[error("no correlation id set")]
    CorrelationMissing,
}

impl ChargesError {
    /// The class this error belongs to.
    #[must_use]
    pub const fn class(&self) -> ErrorClass {
        match self {
            Self::InvalidCommand(_) => ErrorClass::Domain,
            Self::Store(_) | Self::Transport(_) | Self::NotFound(_) | Self::Serialization(_) => {
                ErrorClass::Infrastructure
            },
            Self::UnknownMessageType(_)
            | Self::MixedBundle(_)
            | Self::MissingArgument(_)
            | Self::CorrelationAlreadySet
            | Self::CorrelationMissing => ErrorClass::Configuration,
        }
    }

    /// True when the handler boundary may fold this error into a rejection.
    #[must_use]
    pub const fn is_foldable(&self) -> bool {
        matches!(self.class(), ErrorClass::Domain)
    }
}

/// Errors raised while decoding inbound wire bytes.
///
/// Decode failures take a distinct path: they are reported to the sender by
/// the transport layer and never enter the rule engine.
#[derive(Error, Debug)]
pub enum DecodeError {
    /// The bytes were not a structurally valid command.
    #[error("malformed command payload: {0}")]
    Malformed(String),

    /// The command carried no operations.
    #[error("command carries no operations")]
    EmptyOperations,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classes_partition_the_taxonomy() {
        assert_eq!(
            ChargesError::InvalidCommand("x".into()).class(),
            ErrorClass::Domain
        );
        assert_eq!(ChargesError::Store("x".into()).class(), ErrorClass::Infrastructure);
        assert_eq!(
            ChargesError::Transport("x".into()).class(),
            ErrorClass::Infrastructure
        );
        assert_eq!(
            ChargesError::UnknownMessageType("x".into()).class(),
            ErrorClass::Configuration
        );
        assert_eq!(
            ChargesError::MixedBundle("x".into()).class(),
            ErrorClass::Configuration
        );
        assert_eq!(
            ChargesError::MissingArgument("request").class(),
            ErrorClass::Configuration
        );
    }

    #[test]
    fn only_domain_errors_fold_into_rejections() {
        assert!(ChargesError::InvalidCommand("x".into()).is_foldable());
        assert!(!ChargesError::Store("x".into()).is_foldable());
        assert!(!ChargesError::MixedBundle("x".into()).is_foldable());
    }
}
