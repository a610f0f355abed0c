//! Per-invocation carrier of the correlation id.
//!
//! The host creates one context per inbound invocation and hands it to the
//! components that need the id. The id is immutable once set: setting it a
//! second time is a configuration error, because it would break the
//! end-to-end propagation invariant.

use crate::error::ChargesError;
use crate::ids::CorrelationId;
use std::sync::OnceLock;

/// Invocation-scoped carrier of the correlation id.
#[derive(Debug, Default)]
pub struct CorrelationContext {
    id: OnceLock<CorrelationId>,
}

impl CorrelationContext {
    /// Creates an empty context.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a context pre-populated with an id.
    #[must_use]
    pub fn with_id(id: CorrelationId) -> Self {
        let context = Self::new();
        let _ = context.id.set(id);
        context
    }

    /// Sets the id for this invocation.
    ///
    /// # Errors
    ///
    /// Returns [`ChargesError::CorrelationAlreadySet`] when an id was
    /// already set.
    pub fn set_id(&self, id: CorrelationId) -> Result<(), ChargesError> {
        self.id
            .set(id)
            .map_err(|_| ChargesError::CorrelationAlreadySet)
    }

    /// The id, if one was set.
    #[must_use]
    pub fn id(&self) -> Option<&CorrelationId> {
        self.id.get()
    }

    /// The id, or a configuration error when none was set.
    ///
    /// # Errors
    ///
    /// Returns [`ChargesError::CorrelationMissing`] when no id was set.
    pub fn require_id(&self) -> Result<&CorrelationId, ChargesError> {
        self.id.get().ok_or(ChargesError::CorrelationMissing)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn id_is_immutable_once_set() {
        let context = CorrelationContext::new();
        context
            .set_id(CorrelationId::new("corr-1".to_string()))
            .unwrap();
        let second = context.set_id(CorrelationId::new("corr-2".to_string()));
        assert!(matches!(second, Err(ChargesError::CorrelationAlreadySet)));
        assert_eq!(context.id().map(CorrelationId::as_str), Some("corr-1"));
    }

    #[test]
    fn require_id_fails_on_empty_context() {
        let context = CorrelationContext::new();
        assert!(matches!(
            context.require_id(),
            Err(ChargesError::CorrelationMissing)
        ));
    }
}
