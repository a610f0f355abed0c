//! Inbound market commands: documents, operations and wire decoding.
//!
//! A command arrives as opaque bytes plus a correlation id, already
//! schema-validated by the external decoder. [`decode_charge_command`] and
//! [`decode_charge_link_command`] are the only entry points; a decode failure
//! is a [`DecodeError`] and never reaches the rule engine.

use crate::charge::{ChargeType, PricePoint, Resolution, VatClassification};
use crate::error::DecodeError;
use crate::ids::{ChargeId, DocumentId, MeteringPointId};
use crate::participant::MarketParticipantRef;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Enumerated reason a market message was sent.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String")]
pub enum BusinessReasonCode {
    /// Update of charge master data (D18).
    UpdateChargeInformation,
    /// Update of charge price lists (D08).
    UpdateChargePrices,
    /// Any wire value outside the enumeration.
    Unknown,
}

impl From<String> for BusinessReasonCode {
    fn from(value: String) -> Self {
        // Accepts both the enum names and the document codes.
        match value.as_str() {
            "UpdateChargeInformation" | "D18" => Self::UpdateChargeInformation,
            "UpdateChargePrices" | "D08" => Self::UpdateChargePrices,
            _ => Self::Unknown,
        }
    }
}

impl BusinessReasonCode {
    /// Stable wire code for this reason.
    #[must_use]
    pub const fn code(self) -> &'static str {
        match self {
            Self::UpdateChargeInformation => "D18",
            Self::UpdateChargePrices => "D08",
            Self::Unknown => "Unknown",
        }
    }

    /// Resolves a reason from its stable code; anything else is `Unknown`.
    #[must_use]
    pub fn from_code(code: &str) -> Self {
        match code {
            "D18" => Self::UpdateChargeInformation,
            "D08" => Self::UpdateChargePrices,
            _ => Self::Unknown,
        }
    }
}

impl fmt::Display for BusinessReasonCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// The business document wrapping one or more operations.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Document {
    /// Sender-issued document id.
    pub id: DocumentId,
    /// Claimed sender of the document.
    pub sender: MarketParticipantRef,
    /// Claimed recipient of the document.
    pub recipient: MarketParticipantRef,
    /// Why the message was sent.
    pub business_reason_code: BusinessReasonCode,
    /// When the sender created the document.
    pub created_at: DateTime<Utc>,
    /// When the request was made.
    pub request_date: DateTime<Utc>,
}

/// One create/modify operation on a charge.
///
/// Fields that the sender may omit arrive as empty strings; the required-field
/// input rules reject them with stable identifiers rather than the type
/// refusing to construct.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ChargeOperation {
    /// Sender-issued operation id, used in receipts.
    pub operation_id: String,
    /// Identifier of the charge, unique per owner and type.
    pub charge_id: ChargeId,
    /// Market participant owning the charge.
    pub owner: MarketParticipantRef,
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
    /// Price series.
    pub points: Vec<PricePoint>,
}

impl ChargeOperation {
    /// Builds the charge entity this operation creates or modifies.
    #[must_use]
    pub fn to_charge(&self) -> crate::charge::Charge {
        crate::charge::Charge {
            id: self.charge_id.clone(),
            owner: self.owner.id.clone(),
            charge_type: self.charge_type,
            name: self.name.clone(),
            description: self.description.clone(),
            resolution: self.resolution,
            tax_indicator: self.tax_indicator,
            transparent_invoicing: self.transparent_invoicing,
            vat_classification: self.vat_classification,
            start_date: self.start_date,
            end_date: self.end_date,
            points: self.points.clone(),
        }
    }
}

/// A validated-shape charge command: one document, one or more operations.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ChargeCommand {
    /// The wrapping business document.
    pub document: Document,
    /// Operations in sender order.
    pub operations: Vec<ChargeOperation>,
}

/// One create/modify operation on a charge link.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ChargeLinkOperation {
    /// Sender-issued operation id, used in receipts.
    pub operation_id: String,
    /// Metering point the charge is linked to.
    pub metering_point_id: MeteringPointId,
    /// Charge being linked.
    pub charge_id: ChargeId,
    /// Owner of the charge being linked.
    pub charge_owner: MarketParticipantRef,
    /// Kind of the linked charge.
    pub charge_type: ChargeType,
    /// Multiplier applied to the charge for this link.
    pub factor: i32,
    /// Start of the link's effective period.
    pub start_date: DateTime<Utc>,
    /// Optional end of the link's effective period.
    pub end_date: Option<DateTime<Utc>>,
}

/// A validated-shape charge link command.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ChargeLinkCommand {
    /// The wrapping business document.
    pub document: Document,
    /// Operations in sender order.
    pub operations: Vec<ChargeLinkOperation>,
}

/// Decodes an inbound charge command from its wire bytes.
///
/// # Errors
///
/// Returns [`DecodeError`] when the bytes are not a structurally valid
/// command. Such failures never enter the rule engine.
pub fn decode_charge_command(bytes: &[u8]) -> Result<ChargeCommand, DecodeError> {
    let command: ChargeCommand =
        serde_json::from_slice(bytes).map_err(|e| DecodeError::Malformed(e.to_string()))?;
    if command.operations.is_empty() {
        return Err(DecodeError::EmptyOperations);
    }
    Ok(command)
}

/// Decodes an inbound charge link command from its wire bytes.
///
/// # Errors
///
/// Returns [`DecodeError`] when the bytes are not a structurally valid
/// command.
pub fn decode_charge_link_command(bytes: &[u8]) -> Result<ChargeLinkCommand, DecodeError> {
    let command: ChargeLinkCommand =
        serde_json::from_slice(bytes).map_err(|e| DecodeError::Malformed(e.to_string()))?;
    if command.operations.is_empty() {
        return Err(DecodeError::EmptyOperations);
    }
    Ok(command)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decode_rejects_malformed_bytes_before_validation() {
        let result = decode_charge_command(b"not json at all");
        assert!(matches!(result, Err(DecodeError::Malformed(_))));
    }

    #[test]
    fn decode_rejects_commands_without_operations() {
        let command = serde_json::json!({
            "document": {
                "id": "doc-1",
                "sender": { "id": "5790000000001", "role": "GridAccessProvider" },
                "recipient": { "id": "5790000000002", "role": "MeteringPointAdministrator" },
                "business_reason_code": "UpdateChargeInformation",
                "created_at": "2021-01-01T00:00:00Z",
                "request_date": "2021-01-01T00:00:00Z"
            },
            "operations": []
        });
        let bytes = serde_json::to_vec(&command).unwrap();
        assert!(matches!(
            decode_charge_command(&bytes),
            Err(DecodeError::EmptyOperations)
        ));
    }
}
