//! Charge master data: types, resolutions, prices and the persisted entity.

use crate::ids::{ChargeId, MarketParticipantId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Kind of charge a market participant maintains.
///
/// Unrecognized wire values decode to [`ChargeType::Unknown`] so that the
/// rule engine can reject them with a stable rule identifier instead of the
/// decoder failing the whole document.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String")]
pub enum ChargeType {
    /// Recurring subscription amount, one price per billing period.
    Subscription,
    /// One-off fee, one price per billing period.
    Fee,
    /// Consumption tariff priced per resolution interval.
    Tariff,
    /// Any wire value outside the enumeration.
    Unknown,
}

impl From<String> for ChargeType {
    fn from(value: String) -> Self {
        match value.as_str() {
            "Subscription" => Self::Subscription,
            "Fee" => Self::Fee,
            "Tariff" => Self::Tariff,
            _ => Self::Unknown,
        }
    }
}

impl fmt::Display for ChargeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Subscription => write!(f, "Subscription"),
            Self::Fee => write!(f, "Fee"),
            Self::Tariff => write!(f, "Tariff"),
            Self::Unknown => write!(f, "Unknown"),
        }
    }
}

/// Price resolution of a charge over its billing period.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String")]
pub enum Resolution {
    /// One price per quarter of an hour.
    QuarterHourly,
    /// One price per hour.
    Hourly,
    /// One price per day.
    Daily,
    /// One price per month.
    Monthly,
    /// Any wire value outside the enumeration.
    Unknown,
}

impl From<String> for Resolution {
    fn from(value: String) -> Self {
        // Accepts both the enum names and the ISO codes used on the wire.
        match value.as_str() {
            "QuarterHourly" | "PT15M" => Self::QuarterHourly,
            "Hourly" | "PT1H" => Self::Hourly,
            "Daily" | "P1D" => Self::Daily,
            "Monthly" | "P1M" => Self::Monthly,
            _ => Self::Unknown,
        }
    }
}

impl Resolution {
    /// ISO 8601 duration code used on the wire.
    #[must_use]
    pub const fn iso_code(self) -> &'static str {
        match self {
            Self::QuarterHourly => "PT15M",
            Self::Hourly => "PT1H",
            Self::Daily => "P1D",
            Self::Monthly => "P1M",
            Self::Unknown => "Unknown",
        }
    }

    /// Number of price points one billing day of this resolution carries.
    ///
    /// Monthly charges are priced once per period, so they expect a single
    /// point just like daily ones.
    #[must_use]
    pub const fn expected_price_points(self) -> Option<usize> {
        match self {
            Self::QuarterHourly => Some(96),
            Self::Hourly => Some(24),
            Self::Daily | Self::Monthly => Some(1),
            Self::Unknown => None,
        }
    }
}

impl fmt::Display for Resolution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.iso_code())
    }
}

/// VAT classification of a charge.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String")]
pub enum VatClassification {
    /// No VAT is applied.
    NoVat,
    /// Standard 25% VAT is applied.
    Vat25,
    /// Any wire value outside the enumeration.
    Unknown,
}

impl From<String> for VatClassification {
    fn from(value: String) -> Self {
        match value.as_str() {
            "NoVat" => Self::NoVat,
            "Vat25" => Self::Vat25,
            _ => Self::Unknown,
        }
    }
}

/// A single price in a charge's price series.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PricePoint {
    /// Start of the interval this price applies to.
    pub time: DateTime<Utc>,
    /// Price amount. At most eight integer digits and six decimals; the
    /// bounds are enforced by the input rules, not by this type.
    pub price: f64,
}

impl PricePoint {
    /// Creates a new price point.
    #[must_use]
    pub const fn new(time: DateTime<Utc>, price: f64) -> Self {
        Self { time, price }
    }
}

/// A charge as persisted after a create/modify command was accepted.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Charge {
    /// Sender-issued charge identifier, unique per owner and type.
    pub id: ChargeId,
    /// Market participant that owns and maintains the charge.
    pub owner: MarketParticipantId,
    /// Kind of charge.
    pub charge_type: ChargeType,
    /// Display name.
    pub name: String,
    /// Free-text description.
    pub description: String,
    /// Price resolution.
    pub resolution: Resolution,
    /// Whether the charge is a tax collected on behalf of the authorities.
    pub tax_indicator: bool,
    /// Whether the charge must be itemized on invoices.
    pub transparent_invoicing: bool,
    /// VAT classification.
    pub vat_classification: VatClassification,
    /// Start of the validity period.
    pub start_date: DateTime<Utc>,
    /// Optional end of the validity period.
    pub end_date: Option<DateTime<Utc>>,
    /// Price series for the validity period.
    pub points: Vec<PricePoint>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolution_expected_price_points_follow_billing_day() {
        assert_eq!(Resolution::QuarterHourly.expected_price_points(), Some(96));
        assert_eq!(Resolution::Hourly.expected_price_points(), Some(24));
        assert_eq!(Resolution::Daily.expected_price_points(), Some(1));
        assert_eq!(Resolution::Monthly.expected_price_points(), Some(1));
        assert_eq!(Resolution::Unknown.expected_price_points(), None);
    }

    #[test]
    fn unknown_wire_values_decode_to_unknown_variants() {
        let charge_type: ChargeType = serde_json::from_str("\"D99\"").unwrap();
        assert_eq!(charge_type, ChargeType::Unknown);

        let resolution: Resolution = serde_json::from_str("\"P7D\"").unwrap();
        assert_eq!(resolution, Resolution::Unknown);
    }
}
