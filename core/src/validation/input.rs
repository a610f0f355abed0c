//! Input rules: pure functions of the command snapshot.
//!
//! [`InputValidationRulesFactory`] declares the rule order. That order is an
//! external contract — rejected events list violations in exactly this
//! order.

use crate::charge::{ChargeType, PricePoint, Resolution};
use crate::command::{BusinessReasonCode, ChargeCommand, ChargeLinkCommand};
use crate::validation::{RuleIdentifier, ValidationRule, ValidationRuleSet};
use chrono::{DateTime, Duration, LocalResult, TimeZone, Utc};
use chrono_tz::Tz;

/// Maximum length of a sender-issued charge id.
pub const CHARGE_ID_MAX_LENGTH: usize = 10;
/// Maximum length of a charge name.
pub const CHARGE_NAME_MAX_LENGTH: usize = 132;
/// Maximum length of a charge description.
pub const CHARGE_DESCRIPTION_MAX_LENGTH: usize = 2048;
/// Upper bound (exclusive) on a price: at most eight integer digits.
pub const PRICE_MAX_EXCLUSIVE: f64 = 100_000_000.0;

/// Start-date admissibility window for the VR209 rule.
///
/// Given a validity start `S`, the rule is valid iff
/// `midnight - start_days <= S <= midnight + end_days`, where `midnight` is
/// the start of the current day in the market time zone. Both boundaries are
/// inclusive: a charge may be back-dated up to `start_days` days and
/// forward-dated up to `end_days` days.
#[derive(Copy, Clone, Debug)]
pub struct StartDateWindow {
    start_days: i64,
    end_days: i64,
    time_zone: Tz,
}

impl StartDateWindow {
    /// Creates a window of `start_days` back and `end_days` forward,
    /// evaluated in `time_zone`.
    #[must_use]
    pub const fn new(start_days: i64, end_days: i64, time_zone: Tz) -> Self {
        Self {
            start_days,
            end_days,
            time_zone,
        }
    }

    /// Whether `start` falls inside the window anchored at `now`.
    #[must_use]
    pub fn contains(&self, start: DateTime<Utc>, now: DateTime<Utc>) -> bool {
        let local_day = now.with_timezone(&self.time_zone).date_naive();
        let Some(naive_midnight) = local_day.and_hms_opt(0, 0, 0) else {
            return false;
        };
        let midnight = match self.time_zone.from_local_datetime(&naive_midnight) {
            LocalResult::Single(dt) | LocalResult::Ambiguous(dt, _) => dt.with_timezone(&Utc),
            LocalResult::None => return false,
        };
        let lower = midnight - Duration::days(self.start_days);
        let upper = midnight + Duration::days(self.end_days);
        lower <= start && start <= upper
    }
}

/// Configuration consumed by the input rule factory.
#[derive(Copy, Clone, Debug)]
pub struct ValidationConfig {
    /// Window for the start-date admissibility rule.
    pub start_date_window: StartDateWindow,
}

struct NonEmpty {
    value: String,
    identifier: RuleIdentifier,
}

impl ValidationRule for NonEmpty {
    fn is_valid(&self) -> bool {
        !self.value.trim().is_empty()
    }

    fn identifier(&self) -> RuleIdentifier {
        self.identifier
    }
}

struct MaxLength {
    value: String,
    max: usize,
    identifier: RuleIdentifier,
}

impl ValidationRule for MaxLength {
    fn is_valid(&self) -> bool {
        self.value.chars().count() <= self.max
    }

    fn identifier(&self) -> RuleIdentifier {
        self.identifier
    }
}

struct BusinessReasonCodeKnownRule {
    code: BusinessReasonCode,
}

impl ValidationRule for BusinessReasonCodeKnownRule {
    fn is_valid(&self) -> bool {
        self.code != BusinessReasonCode::Unknown
    }

    fn identifier(&self) -> RuleIdentifier {
        RuleIdentifier::BusinessReasonCodeKnown
    }
}

struct ChargeTypeKnownRule {
    charge_type: ChargeType,
}

impl ValidationRule for ChargeTypeKnownRule {
    fn is_valid(&self) -> bool {
        self.charge_type != ChargeType::Unknown
    }

    fn identifier(&self) -> RuleIdentifier {
        RuleIdentifier::ChargeTypeKnown
    }
}

struct ResolutionSupportedRule {
    charge_type: ChargeType,
    resolution: Resolution,
}

impl ValidationRule for ResolutionSupportedRule {
    fn is_valid(&self) -> bool {
        match self.charge_type {
            ChargeType::Tariff => matches!(
                self.resolution,
                Resolution::QuarterHourly | Resolution::Hourly | Resolution::Daily
            ),
            ChargeType::Fee | ChargeType::Subscription => {
                self.resolution == Resolution::Monthly
            },
            // Judged by the charge type rule instead.
            ChargeType::Unknown => true,
        }
    }

    fn identifier(&self) -> RuleIdentifier {
        RuleIdentifier::ResolutionSupportedForChargeType
    }
}

struct SinglePricePointRule {
    charge_type: ChargeType,
    point_count: usize,
}

impl ValidationRule for SinglePricePointRule {
    fn is_valid(&self) -> bool {
        match self.charge_type {
            ChargeType::Fee | ChargeType::Subscription => self.point_count == 1,
            ChargeType::Tariff | ChargeType::Unknown => true,
        }
    }

    fn identifier(&self) -> RuleIdentifier {
        RuleIdentifier::SinglePricePointRequired
    }
}

struct PriceCountMatchesResolutionRule {
    charge_type: ChargeType,
    resolution: Resolution,
    point_count: usize,
}

impl ValidationRule for PriceCountMatchesResolutionRule {
    fn is_valid(&self) -> bool {
        if self.charge_type != ChargeType::Tariff {
            return true;
        }
        match self.resolution.expected_price_points() {
            Some(expected) => self.point_count == expected,
            // Judged by the resolution rule instead.
            None => true,
        }
    }

    fn identifier(&self) -> RuleIdentifier {
        RuleIdentifier::PriceCountMatchesResolution
    }
}

struct PricePrecisionRule {
    points: Vec<PricePoint>,
}

fn has_at_most_six_decimals(price: f64) -> bool {
    let scaled = price * 1_000_000.0;
    (scaled.round() / 1_000_000.0 - price).abs() < f64::EPSILON * scaled.abs().max(1.0)
}

impl ValidationRule for PricePrecisionRule {
    fn is_valid(&self) -> bool {
        self.points
            .iter()
            .all(|p| p.price.abs() < PRICE_MAX_EXCLUSIVE && has_at_most_six_decimals(p.price))
    }

    fn identifier(&self) -> RuleIdentifier {
        RuleIdentifier::PricePrecision
    }
}

struct PriceNotNegativeRule {
    points: Vec<PricePoint>,
}

impl ValidationRule for PriceNotNegativeRule {
    fn is_valid(&self) -> bool {
        self.points.iter().all(|p| p.price >= 0.0)
    }

    fn identifier(&self) -> RuleIdentifier {
        RuleIdentifier::PriceNotNegative
    }
}

struct StartDateRule {
    start_date: DateTime<Utc>,
    window: StartDateWindow,
    now: DateTime<Utc>,
}

impl ValidationRule for StartDateRule {
    fn is_valid(&self) -> bool {
        self.window.contains(self.start_date, self.now)
    }

    fn identifier(&self) -> RuleIdentifier {
        RuleIdentifier::StartDateValidation
    }
}

struct FactorPositiveRule {
    factor: i32,
}

impl ValidationRule for FactorPositiveRule {
    fn is_valid(&self) -> bool {
        self.factor > 0
    }

    fn identifier(&self) -> RuleIdentifier {
        RuleIdentifier::FactorPositive
    }
}

/// Builds the input rule sets for both command shapes.
///
/// The factory is stateless; `now` is resolved once by the caller so that
/// every rule in one evaluation judges against the same instant.
pub struct InputValidationRulesFactory;

impl InputValidationRulesFactory {
    /// Declares the input rules for a charge command.
    ///
    /// Document rules come first, then per-operation rules in sender order.
    #[must_use]
    pub fn create_rules_for_charge(
        command: &ChargeCommand,
        config: &ValidationConfig,
        now: DateTime<Utc>,
    ) -> ValidationRuleSet {
        let mut rules: Vec<Box<dyn ValidationRule>> = vec![
            Box::new(NonEmpty {
                value: command.document.id.as_str().to_string(),
                identifier: RuleIdentifier::DocumentIdRequired,
            }),
            Box::new(BusinessReasonCodeKnownRule {
                code: command.document.business_reason_code,
            }),
        ];

        for operation in &command.operations {
            rules.push(Box::new(NonEmpty {
                value: operation.charge_id.as_str().to_string(),
                identifier: RuleIdentifier::ChargeIdRequired,
            }));
            rules.push(Box::new(MaxLength {
                value: operation.charge_id.as_str().to_string(),
                max: CHARGE_ID_MAX_LENGTH,
                identifier: RuleIdentifier::ChargeIdMaximumLength,
            }));
            rules.push(Box::new(NonEmpty {
                value: operation.owner.id.as_str().to_string(),
                identifier: RuleIdentifier::ChargeOwnerRequired,
            }));
            rules.push(Box::new(ChargeTypeKnownRule {
                charge_type: operation.charge_type,
            }));
            rules.push(Box::new(MaxLength {
                value: operation.name.clone(),
                max: CHARGE_NAME_MAX_LENGTH,
                identifier: RuleIdentifier::ChargeNameMaximumLength,
            }));
            rules.push(Box::new(MaxLength {
                value: operation.description.clone(),
                max: CHARGE_DESCRIPTION_MAX_LENGTH,
                identifier: RuleIdentifier::ChargeDescriptionMaximumLength,
            }));
            rules.push(Box::new(ResolutionSupportedRule {
                charge_type: operation.charge_type,
                resolution: operation.resolution,
            }));
            rules.push(Box::new(SinglePricePointRule {
                charge_type: operation.charge_type,
                point_count: operation.points.len(),
            }));
            rules.push(Box::new(PriceCountMatchesResolutionRule {
                charge_type: operation.charge_type,
                resolution: operation.resolution,
                point_count: operation.points.len(),
            }));
            rules.push(Box::new(PricePrecisionRule {
                points: operation.points.clone(),
            }));
            rules.push(Box::new(PriceNotNegativeRule {
                points: operation.points.clone(),
            }));
            rules.push(Box::new(StartDateRule {
                start_date: operation.start_date,
                window: config.start_date_window,
                now,
            }));
        }

        ValidationRuleSet::from_rules(rules)
    }

    /// Declares the input rules for a charge link command.
    #[must_use]
    pub fn create_rules_for_link(
        command: &ChargeLinkCommand,
        config: &ValidationConfig,
        now: DateTime<Utc>,
    ) -> ValidationRuleSet {
        let mut rules: Vec<Box<dyn ValidationRule>> = vec![
            Box::new(NonEmpty {
                value: command.document.id.as_str().to_string(),
                identifier: RuleIdentifier::DocumentIdRequired,
            }),
            Box::new(BusinessReasonCodeKnownRule {
                code: command.document.business_reason_code,
            }),
        ];

        for operation in &command.operations {
            rules.push(Box::new(NonEmpty {
                value: operation.metering_point_id.as_str().to_string(),
                identifier: RuleIdentifier::MeteringPointIdRequired,
            }));
            rules.push(Box::new(NonEmpty {
                value: operation.charge_id.as_str().to_string(),
                identifier: RuleIdentifier::ChargeIdRequired,
            }));
            rules.push(Box::new(MaxLength {
                value: operation.charge_id.as_str().to_string(),
                max: CHARGE_ID_MAX_LENGTH,
                identifier: RuleIdentifier::ChargeIdMaximumLength,
            }));
            rules.push(Box::new(ChargeTypeKnownRule {
                charge_type: operation.charge_type,
            }));
            rules.push(Box::new(FactorPositiveRule {
                factor: operation.factor,
            }));
            rules.push(Box::new(StartDateRule {
                start_date: operation.start_date,
                window: config.start_date_window,
                now,
            }));
        }

        ValidationRuleSet::from_rules(rules)
    }
}
