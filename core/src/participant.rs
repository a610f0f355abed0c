//! Market participants and their roles.

use crate::ids::MarketParticipantId;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Business role a market participant acts in.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String")]
pub enum MarketParticipantRole {
    /// Supplies energy to metering points.
    EnergySupplier,
    /// Operates the grid a metering point is connected to.
    GridAccessProvider,
    /// Transmission system operator.
    SystemOperator,
    /// Administers metering point master data for the market.
    MeteringPointAdministrator,
    /// Any wire value outside the enumeration.
    Unknown,
}

impl From<String> for MarketParticipantRole {
    fn from(value: String) -> Self {
        Self::from_name(&value)
    }
}

impl MarketParticipantRole {
    /// Resolves a role from its stored name; anything else is `Unknown`.
    #[must_use]
    pub fn from_name(name: &str) -> Self {
        match name {
            "EnergySupplier" => Self::EnergySupplier,
            "GridAccessProvider" => Self::GridAccessProvider,
            "SystemOperator" => Self::SystemOperator,
            "MeteringPointAdministrator" => Self::MeteringPointAdministrator,
            _ => Self::Unknown,
        }
    }
}

impl fmt::Display for MarketParticipantRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EnergySupplier => write!(f, "EnergySupplier"),
            Self::GridAccessProvider => write!(f, "GridAccessProvider"),
            Self::SystemOperator => write!(f, "SystemOperator"),
            Self::MeteringPointAdministrator => write!(f, "MeteringPointAdministrator"),
            Self::Unknown => write!(f, "Unknown"),
        }
    }
}

/// A market participant as registered in the reference data.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MarketParticipant {
    /// GLN or EIC identifier.
    pub id: MarketParticipantId,
    /// Role the participant is registered with.
    pub role: MarketParticipantRole,
    /// Whether the participant is currently active in the market.
    pub active: bool,
}

impl MarketParticipant {
    /// Creates a new market participant.
    #[must_use]
    pub const fn new(id: MarketParticipantId, role: MarketParticipantRole, active: bool) -> Self {
        Self { id, role, active }
    }
}

/// Sender or recipient reference inside a business document.
///
/// Unlike [`MarketParticipant`] this is only a claim made by the document;
/// document rules verify it against the registered reference data.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MarketParticipantRef {
    /// Claimed participant identifier.
    pub id: MarketParticipantId,
    /// Claimed role.
    pub role: MarketParticipantRole,
}

impl MarketParticipantRef {
    /// Creates a new participant reference.
    #[must_use]
    pub const fn new(id: MarketParticipantId, role: MarketParticipantRole) -> Self {
        Self { id, role }
    }
}
