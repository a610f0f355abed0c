//! Two-tier validation rule engine.
//!
//! Rules come in two tiers built by two independent factories:
//!
//! - **Input rules** ([`input`]): pure functions of the command snapshot —
//!   required fields, length caps, precision caps, enumeration membership,
//!   per-charge-type price and resolution rules, the start-date window.
//! - **Document rules** ([`document`]): require an external lookup before
//!   they can be built, e.g. "the sender is a registered, active market
//!   participant".
//!
//! Both tiers evaluate **exhaustively** — no short-circuiting — so one
//! submission reports all simultaneous violations. [`ValidationResult`]
//! preserves the factories' declaration order, which downstream error-code
//! mapping depends on: repeated runs against the same command are
//! deterministic.
//!
//! A rule never mutates its input and has no side effects; only
//! [`ValidationRule::is_valid`] and [`ValidationRule::identifier`] are
//! observable.

pub mod document;
pub mod input;

use serde::{Deserialize, Serialize};
use std::fmt;

/// Stable identifier of a business validation rule.
///
/// The codes are part of the external contract: rejected events carry them
/// and recipients map them to their own error catalogs. They never change
/// meaning once published.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RuleIdentifier {
    /// Document id must be present.
    DocumentIdRequired,
    /// Business reason code must be a known member.
    BusinessReasonCodeKnown,
    /// Charge id must be present.
    ChargeIdRequired,
    /// Charge id must not exceed its maximum length.
    ChargeIdMaximumLength,
    /// Charge owner must be present.
    ChargeOwnerRequired,
    /// Charge type must be a known member.
    ChargeTypeKnown,
    /// Charge name must not exceed its maximum length.
    ChargeNameMaximumLength,
    /// Charge description must not exceed its maximum length.
    ChargeDescriptionMaximumLength,
    /// Resolution must be supported for the charge type.
    ResolutionSupportedForChargeType,
    /// Fees and subscriptions carry exactly one price.
    SinglePricePointRequired,
    /// Tariff price count must match the resolution over the billing period.
    PriceCountMatchesResolution,
    /// Prices carry at most eight integer digits and six decimals.
    PricePrecision,
    /// Prices must not be negative.
    PriceNotNegative,
    /// Validity start must fall inside the configured admissibility window.
    StartDateValidation,
    /// Metering point id must be present on a link operation.
    MeteringPointIdRequired,
    /// Link factor must be strictly positive.
    FactorPositive,
    /// Sender must be a registered, active market participant.
    SenderRegistered,
    /// Recipient role must be the metering point administrator.
    RecipientRoleMustBeAdministrator,
}

impl RuleIdentifier {
    /// Stable external code for this rule.
    #[must_use]
    pub const fn code(self) -> &'static str {
        match self {
            Self::DocumentIdRequired => "VR900",
            Self::BusinessReasonCodeKnown => "VR424",
            Self::ChargeIdRequired => "VR223",
            Self::ChargeIdMaximumLength => "VR441",
            Self::ChargeOwnerRequired => "VR404",
            Self::ChargeTypeKnown => "VR449",
            Self::ChargeNameMaximumLength => "VR446",
            Self::ChargeDescriptionMaximumLength => "VR447",
            Self::ResolutionSupportedForChargeType => "VR505",
            Self::SinglePricePointRequired => "VR507",
            Self::PriceCountMatchesResolution => "VR509",
            Self::PricePrecision => "VR457",
            Self::PriceNotNegative => "VR486",
            Self::StartDateValidation => "VR209",
            Self::MeteringPointIdRequired => "VR629",
            Self::FactorPositive => "VR630",
            Self::SenderRegistered => "VR150",
            Self::RecipientRoleMustBeAdministrator => "VR153",
        }
    }
}

impl fmt::Display for RuleIdentifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// A stateless predicate over a command snapshot.
///
/// Rules own the (cheap) data they judge, taken from the command at
/// construction time, so evaluation cannot observe later mutation and rules
/// within one set may run in any order.
pub trait ValidationRule: Send + Sync {
    /// Whether the snapshot satisfies this rule.
    fn is_valid(&self) -> bool;

    /// The stable identifier reported when the rule fails.
    fn identifier(&self) -> RuleIdentifier;
}

/// An ordered, immutable set of validation rules.
pub struct ValidationRuleSet {
    rules: Vec<Box<dyn ValidationRule>>,
}

impl ValidationRuleSet {
    /// Builds a rule set, preserving the given declaration order.
    #[must_use]
    pub fn from_rules(rules: Vec<Box<dyn ValidationRule>>) -> Self {
        Self { rules }
    }

    /// The rules in declaration order.
    #[must_use]
    pub fn rules(&self) -> &[Box<dyn ValidationRule>] {
        &self.rules
    }

    /// Evaluates every rule — no short-circuiting — and collects the failed
    /// identifiers in declaration order.
    #[must_use]
    pub fn validate(&self) -> ValidationResult {
        let failed: Vec<RuleIdentifier> = self
            .rules
            .iter()
            .filter(|rule| !rule.is_valid())
            .map(|rule| rule.identifier())
            .collect();
        ValidationResult::from_failures(failed)
    }
}

/// Aggregated outcome of evaluating a rule set.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ValidationResult {
    failed: Vec<RuleIdentifier>,
}

impl ValidationResult {
    /// A result with no failed rules.
    #[must_use]
    pub const fn succeeded() -> Self {
        Self { failed: Vec::new() }
    }

    /// A result carrying the given failures, already in declaration order.
    #[must_use]
    pub fn from_failures(failed: Vec<RuleIdentifier>) -> Self {
        Self { failed }
    }

    /// True iff no rule evaluated false.
    #[must_use]
    pub fn is_succeeded(&self) -> bool {
        self.failed.is_empty()
    }

    /// Failed rule identifiers in factory declaration order.
    #[must_use]
    pub fn failed_rules(&self) -> &[RuleIdentifier] {
        &self.failed
    }

    /// Merges another result after this one, keeping both orders.
    #[must_use]
    pub fn merged_with(mut self, other: Self) -> Self {
        self.failed.extend(other.failed);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FixedRule {
        identifier: RuleIdentifier,
        valid: bool,
    }

    impl ValidationRule for FixedRule {
        fn is_valid(&self) -> bool {
            self.valid
        }

        fn identifier(&self) -> RuleIdentifier {
            self.identifier
        }
    }

    fn rule(identifier: RuleIdentifier, valid: bool) -> Box<dyn ValidationRule> {
        Box::new(FixedRule { identifier, valid })
    }

    #[test]
    fn from_rules_round_trips_identity_and_order() {
        let identifiers = [
            RuleIdentifier::ChargeIdRequired,
            RuleIdentifier::StartDateValidation,
            RuleIdentifier::PriceNotNegative,
        ];
        let set = ValidationRuleSet::from_rules(
            identifiers.iter().map(|id| rule(*id, true)).collect(),
        );
        let round_tripped: Vec<RuleIdentifier> =
            set.rules().iter().map(|r| r.identifier()).collect();
        assert_eq!(round_tripped, identifiers);
    }

    #[test]
    fn validate_is_exhaustive_and_order_preserving() {
        let set = ValidationRuleSet::from_rules(vec![
            rule(RuleIdentifier::ChargeIdRequired, false),
            rule(RuleIdentifier::ChargeNameMaximumLength, true),
            rule(RuleIdentifier::PriceNotNegative, false),
            rule(RuleIdentifier::StartDateValidation, false),
        ]);
        let result = set.validate();
        assert!(!result.is_succeeded());
        assert_eq!(
            result.failed_rules(),
            &[
                RuleIdentifier::ChargeIdRequired,
                RuleIdentifier::PriceNotNegative,
                RuleIdentifier::StartDateValidation,
            ]
        );
    }

    #[test]
    fn success_means_zero_failed_rules() {
        let set = ValidationRuleSet::from_rules(vec![
            rule(RuleIdentifier::ChargeIdRequired, true),
            rule(RuleIdentifier::PriceNotNegative, true),
        ]);
        assert!(set.validate().is_succeeded());
        assert!(set.validate().failed_rules().is_empty());
    }

    #[test]
    fn merged_results_keep_both_orders() {
        let first = ValidationResult::from_failures(vec![RuleIdentifier::SenderRegistered]);
        let second = ValidationResult::from_failures(vec![
            RuleIdentifier::ChargeIdRequired,
            RuleIdentifier::StartDateValidation,
        ]);
        let merged = first.merged_with(second);
        assert_eq!(
            merged.failed_rules(),
            &[
                RuleIdentifier::SenderRegistered,
                RuleIdentifier::ChargeIdRequired,
                RuleIdentifier::StartDateValidation,
            ]
        );
    }
}
