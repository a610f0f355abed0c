//! Property tests for the rule engine aggregation invariants.

use charges_core::notification::relative_weight;
use charges_core::validation::{RuleIdentifier, ValidationRule, ValidationRuleSet};
use proptest::prelude::*;

struct FlaggedRule {
    identifier: RuleIdentifier,
    valid: bool,
}

impl ValidationRule for FlaggedRule {
    fn is_valid(&self) -> bool {
        self.valid
    }

    fn identifier(&self) -> RuleIdentifier {
        self.identifier
    }
}

const IDENTIFIERS: [RuleIdentifier; 6] = [
    RuleIdentifier::DocumentIdRequired,
    RuleIdentifier::ChargeIdRequired,
    RuleIdentifier::ChargeNameMaximumLength,
    RuleIdentifier::PriceNotNegative,
    RuleIdentifier::StartDateValidation,
    RuleIdentifier::SenderRegistered,
];

proptest! {
    // However rules pass or fail, the failed list is exactly the failing
    // identifiers in declaration order, and success means zero failures.
    #[test]
    fn failed_rules_are_the_failing_subsequence(flags in proptest::collection::vec(any::<bool>(), 1..=6)) {
        let rules: Vec<Box<dyn ValidationRule>> = flags
            .iter()
            .zip(IDENTIFIERS.iter().cycle())
            .map(|(valid, id)| {
                Box::new(FlaggedRule { identifier: *id, valid: *valid }) as Box<dyn ValidationRule>
            })
            .collect();
        let expected: Vec<RuleIdentifier> = flags
            .iter()
            .zip(IDENTIFIERS.iter().cycle())
            .filter(|(valid, _)| !**valid)
            .map(|(_, id)| *id)
            .collect();

        let result = ValidationRuleSet::from_rules(rules).validate();
        prop_assert_eq!(result.failed_rules(), expected.as_slice());
        prop_assert_eq!(result.is_succeeded(), expected.is_empty());
    }

    // Notification weights are positive for every line item count.
    #[test]
    fn weights_are_always_positive(count in 0usize..100_000) {
        prop_assert!(relative_weight(count, 5.0, 0.2) > 0);
        prop_assert!(relative_weight(count, 1.0, 0.0) > 0);
    }
}
