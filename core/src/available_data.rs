//! Available data: immutable, recipient-scoped records ready for retrieval.
//!
//! One outcome event fans out into zero or more rows, one per intended
//! recipient. Rows are append-only: created when the event is processed and
//! never updated afterwards. Each row gets a fresh `id` and a fresh
//! `reference_id`; the reference id is the uuid recipients later hand back
//! through the peek protocol.
//!
//! Because reference ids are minted per factory invocation, redelivery of
//! the same upstream event produces an independent, duplicate-but-valid row.
//! True de-duplication needs an upstream inbox key and is out of scope.

use crate::charge::PricePoint;
use crate::command::BusinessReasonCode;
use crate::error::ChargesError;
use crate::ids::{ChargeId, MarketParticipantId, MeteringPointId};
use crate::participant::MarketParticipantRole;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Category an available-data row belongs to.
///
/// The category decides the message type prefix the bundle creators route
/// on.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AvailableDataKind {
    /// Charge master data / prices.
    Charge,
    /// Charge link data.
    ChargeLink,
    /// Confirmation or rejection receipt for a charge command.
    ChargeReceipt,
    /// Confirmation or rejection receipt for a charge link command.
    ChargeLinkReceipt,
}

impl AvailableDataKind {
    /// Fixed message type prefix for this category.
    #[must_use]
    pub const fn message_type_prefix(self) -> &'static str {
        match self {
            Self::Charge => "ChargeDataAvailable",
            Self::ChargeLink => "ChargeLinkDataAvailable",
            Self::ChargeReceipt => "ChargeReceiptDataAvailable",
            Self::ChargeLinkReceipt => "ChargeLinkReceiptDataAvailable",
        }
    }
}

/// Receipt outcome carried by receipt rows.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ReceiptStatus {
    /// The command was accepted.
    Confirmed,
    /// The command was rejected.
    Rejected,
}

/// Category-specific body of an available-data row.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum AvailableDataDetail {
    /// Charge master data broadcast.
    Charge {
        /// Charge the data describes.
        charge_id: ChargeId,
        /// Owner of the charge.
        charge_owner: MarketParticipantId,
        /// Price series carried to the recipient.
        points: Vec<PricePoint>,
    },
    /// Charge link data for the metering point's grid operator.
    ChargeLink {
        /// Metering point the link applies to.
        metering_point_id: MeteringPointId,
        /// Linked charge.
        charge_id: ChargeId,
        /// Link multiplier.
        factor: i32,
    },
    /// Receipt back to the command sender. The status is read-only, set at
    /// creation.
    Receipt {
        /// Confirmed or rejected.
        status: ReceiptStatus,
        /// Sender-issued id of the operation the receipt answers.
        operation_id: String,
        /// Rejection reasons, empty for confirmations.
        reasons: Vec<String>,
        /// Whether the receipt answers a link command.
        for_link: bool,
    },
}

impl AvailableDataDetail {
    /// The category this body belongs to.
    #[must_use]
    pub const fn kind(&self) -> AvailableDataKind {
        match self {
            Self::Charge { .. } => AvailableDataKind::Charge,
            Self::ChargeLink { .. } => AvailableDataKind::ChargeLink,
            Self::Receipt { for_link: false, .. } => AvailableDataKind::ChargeReceipt,
            Self::Receipt { for_link: true, .. } => AvailableDataKind::ChargeLinkReceipt,
        }
    }

    /// Number of line items the body carries, used for notification
    /// weighting.
    #[must_use]
    pub fn line_item_count(&self) -> usize {
        match self {
            Self::Charge { points, .. } => points.len(),
            Self::ChargeLink { .. } => 1,
            Self::Receipt { reasons, .. } => reasons.len().max(1),
        }
    }
}

/// One immutable, recipient-scoped unit of output ready for retrieval.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AvailableData {
    /// Fresh, globally unique row identity.
    pub id: Uuid,
    /// Fresh, globally unique id used for notification correlation.
    pub reference_id: Uuid,
    /// Recipient of this unit of data.
    pub recipient_id: MarketParticipantId,
    /// Role the recipient receives the data in.
    pub recipient_role: MarketParticipantRole,
    /// Reason code of the originating document.
    pub business_reason_code: BusinessReasonCode,
    /// Request timestamp of the originating document.
    pub request_timestamp: DateTime<Utc>,
    /// Category-specific body.
    pub detail: AvailableDataDetail,
}

impl AvailableData {
    /// The category of this row.
    #[must_use]
    pub const fn kind(&self) -> AvailableDataKind {
        self.detail.kind()
    }

    /// Message type string consumed by bundle routing:
    /// category prefix + `"_"` + business reason code.
    #[must_use]
    pub fn message_type(&self) -> String {
        format!(
            "{}_{}",
            self.kind().message_type_prefix(),
            self.business_reason_code.code()
        )
    }
}

/// Append-only store for available-data rows.
#[async_trait]
pub trait AvailableDataStore: Send + Sync {
    /// Persists a batch of freshly created rows.
    ///
    /// # Errors
    ///
    /// Returns [`ChargesError::Store`] on store failure.
    async fn store(&self, rows: &[AvailableData]) -> Result<(), ChargesError>;

    /// Fetches rows by the reference ids previously issued in
    /// notifications. Unknown ids are simply absent from the result.
    ///
    /// # Errors
    ///
    /// Returns [`ChargesError::Store`] on store failure.
    async fn get_by_reference_ids(
        &self,
        reference_ids: &[Uuid],
    ) -> Result<Vec<AvailableData>, ChargesError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn message_type_joins_prefix_and_reason_code() {
        let row = AvailableData {
            id: Uuid::from_u128(1),
            reference_id: Uuid::from_u128(2),
            recipient_id: MarketParticipantId::new("5790000000001".to_string()),
            recipient_role: MarketParticipantRole::GridAccessProvider,
            business_reason_code: BusinessReasonCode::UpdateChargeInformation,
            request_timestamp: Utc::now(),
            detail: AvailableDataDetail::Charge {
                charge_id: ChargeId::new("TAR-001".to_string()),
                charge_owner: MarketParticipantId::new("5790000000002".to_string()),
                points: Vec::new(),
            },
        };
        assert_eq!(row.message_type(), "ChargeDataAvailable_D18");
    }

    #[test]
    fn receipt_kind_splits_on_command_shape() {
        let charge_receipt = AvailableDataDetail::Receipt {
            status: ReceiptStatus::Confirmed,
            operation_id: "op-1".to_string(),
            reasons: Vec::new(),
            for_link: false,
        };
        let link_receipt = AvailableDataDetail::Receipt {
            status: ReceiptStatus::Rejected,
            operation_id: "op-2".to_string(),
            reasons: vec!["VR209".to_string()],
            for_link: true,
        };
        assert_eq!(charge_receipt.kind(), AvailableDataKind::ChargeReceipt);
        assert_eq!(link_receipt.kind(), AvailableDataKind::ChargeLinkReceipt);
    }

    #[test]
    fn line_item_count_never_zero_for_receipts() {
        let receipt = AvailableDataDetail::Receipt {
            status: ReceiptStatus::Confirmed,
            operation_id: "op-1".to_string(),
            reasons: Vec::new(),
            for_link: false,
        };
        assert_eq!(receipt.line_item_count(), 1);
    }
}
