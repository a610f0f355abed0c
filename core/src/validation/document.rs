//! Document rules: validations that need externally-resolved reference data.
//!
//! The factory resolves the sender through the market participant repository
//! before any rule is built. A failed lookup is an infrastructure error and
//! propagates; it is never folded into a rejection.

use crate::command::Document;
use crate::error::ChargesError;
use crate::participant::{MarketParticipant, MarketParticipantRole};
use crate::repository::MarketParticipantRepository;
use crate::validation::{RuleIdentifier, ValidationRule, ValidationRuleSet};
use std::sync::Arc;

struct SenderRegisteredRule {
    sender: Option<MarketParticipant>,
}

impl ValidationRule for SenderRegisteredRule {
    fn is_valid(&self) -> bool {
        self.sender.as_ref().is_some_and(|s| s.active)
    }

    fn identifier(&self) -> RuleIdentifier {
        RuleIdentifier::SenderRegistered
    }
}

struct RecipientRoleRule {
    role: MarketParticipantRole,
}

impl ValidationRule for RecipientRoleRule {
    fn is_valid(&self) -> bool {
        self.role == MarketParticipantRole::MeteringPointAdministrator
    }

    fn identifier(&self) -> RuleIdentifier {
        RuleIdentifier::RecipientRoleMustBeAdministrator
    }
}

/// Builds document rules after resolving the entities they judge.
pub struct DocumentValidationRulesFactory {
    participants: Arc<dyn MarketParticipantRepository>,
}

impl DocumentValidationRulesFactory {
    /// Creates a factory backed by the given participant repository.
    #[must_use]
    pub fn new(participants: Arc<dyn MarketParticipantRepository>) -> Self {
        Self { participants }
    }

    /// Declares the document rules for the given document.
    ///
    /// # Errors
    ///
    /// Returns [`ChargesError::Store`] when the sender lookup fails; the
    /// caller must let that propagate rather than reject the command.
    pub async fn create_rules(&self, document: &Document) -> Result<ValidationRuleSet, ChargesError> {
        let sender = self.participants.find_by_id(&document.sender.id).await?;

        Ok(ValidationRuleSet::from_rules(vec![
            Box::new(SenderRegisteredRule { sender }),
            Box::new(RecipientRoleRule {
                role: document.recipient.role,
            }),
        ]))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::command::BusinessReasonCode;
    use crate::ids::{DocumentId, MarketParticipantId};
    use crate::participant::MarketParticipantRef;
    use async_trait::async_trait;
    use chrono::{TimeZone, Utc};

    struct StubParticipants {
        participant: Option<MarketParticipant>,
        fail: bool,
    }

    #[async_trait]
    impl MarketParticipantRepository for StubParticipants {
        async fn find_by_id(
            &self,
            _id: &MarketParticipantId,
        ) -> Result<Option<MarketParticipant>, ChargesError> {
            if self.fail {
                return Err(ChargesError::Store("connection refused".to_string()));
            }
            Ok(self.participant.clone())
        }

        async fn active_grid_access_providers(
            &self,
        ) -> Result<Vec<MarketParticipant>, ChargesError> {
            Ok(Vec::new())
        }
    }

    fn document(recipient_role: MarketParticipantRole) -> Document {
        Document {
            id: DocumentId::new("doc-1".to_string()),
            sender: MarketParticipantRef::new(
                MarketParticipantId::new("5790000000001".to_string()),
                MarketParticipantRole::GridAccessProvider,
            ),
            recipient: MarketParticipantRef::new(
                MarketParticipantId::new("5790000000002".to_string()),
                recipient_role,
            ),
            business_reason_code: BusinessReasonCode::UpdateChargeInformation,
            created_at: Utc.with_ymd_and_hms(2021, 1, 1, 0, 0, 0).unwrap(),
            request_date: Utc.with_ymd_and_hms(2021, 1, 1, 0, 0, 0).unwrap(),
        }
    }

    fn registered_sender() -> MarketParticipant {
        MarketParticipant::new(
            MarketParticipantId::new("5790000000001".to_string()),
            MarketParticipantRole::GridAccessProvider,
            true,
        )
    }

    #[tokio::test]
    async fn registered_active_sender_and_administrator_recipient_pass() {
        let factory = DocumentValidationRulesFactory::new(Arc::new(StubParticipants {
            participant: Some(registered_sender()),
            fail: false,
        }));
        let rules = factory
            .create_rules(&document(MarketParticipantRole::MeteringPointAdministrator))
            .await
            .unwrap();
        assert!(rules.validate().is_succeeded());
    }

    #[tokio::test]
    async fn unknown_sender_fails_sender_rule() {
        let factory = DocumentValidationRulesFactory::new(Arc::new(StubParticipants {
            participant: None,
            fail: false,
        }));
        let rules = factory
            .create_rules(&document(MarketParticipantRole::MeteringPointAdministrator))
            .await
            .unwrap();
        assert_eq!(
            rules.validate().failed_rules(),
            &[RuleIdentifier::SenderRegistered]
        );
    }

    #[tokio::test]
    async fn inactive_sender_fails_sender_rule() {
        let mut sender = registered_sender();
        sender.active = false;
        let factory = DocumentValidationRulesFactory::new(Arc::new(StubParticipants {
            participant: Some(sender),
            fail: false,
        }));
        let rules = factory
            .create_rules(&document(MarketParticipantRole::MeteringPointAdministrator))
            .await
            .unwrap();
        assert_eq!(
            rules.validate().failed_rules(),
            &[RuleIdentifier::SenderRegistered]
        );
    }

    #[tokio::test]
    async fn wrong_recipient_role_fails_recipient_rule() {
        let factory = DocumentValidationRulesFactory::new(Arc::new(StubParticipants {
            participant: Some(registered_sender()),
            fail: false,
        }));
        let rules = factory
            .create_rules(&document(MarketParticipantRole::EnergySupplier))
            .await
            .unwrap();
        assert_eq!(
            rules.validate().failed_rules(),
            &[RuleIdentifier::RecipientRoleMustBeAdministrator]
        );
    }

    #[tokio::test]
    async fn lookup_failure_propagates_instead_of_rejecting() {
        let factory = DocumentValidationRulesFactory::new(Arc::new(StubParticipants {
            participant: None,
            fail: true,
        }));
        let result = factory
            .create_rules(&document(MarketParticipantRole::MeteringPointAdministrator))
            .await;
        assert!(matches!(result, Err(ChargesError::Store(_))));
    }
}
