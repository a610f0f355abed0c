//! Notifications and bundle requests exchanged with the MessageHub.

use crate::command::BusinessReasonCode;
use crate::error::ChargesError;
use crate::ids::{CorrelationId, MarketParticipantId};
use crate::participant::MarketParticipantRole;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Origin domain stamped on every notification.
pub const NOTIFICATION_ORIGIN: &str = "Charges";

/// A data-available notification sent to the MessageHub.
///
/// The `id` is the available-data row's reference id; recipients hand it
/// back in peek requests. `relative_weight` is always positive — the
/// external scheduler uses it to size physical bundles.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    /// Reference id of the available-data row.
    pub id: Uuid,
    /// Recipient of the data.
    pub recipient_id: MarketParticipantId,
    /// Role the recipient receives the data in.
    pub recipient_role: MarketParticipantRole,
    /// Routing key: category prefix + `"_"` + business reason code.
    pub message_type: String,
    /// Domain that produced the data.
    pub origin: String,
    /// Whether the data may be bundled with others of the same type.
    pub supports_bundling: bool,
    /// Positive weight used by the external scheduler to size bundles.
    pub relative_weight: i32,
}

/// Computes a notification weight from a line item count.
///
/// `round_away_from_zero(base + count * per_item)` — `f64::round` rounds
/// half-way cases away from zero, which is exactly the required midpoint
/// behavior.
#[must_use]
#[allow(clippy::cast_possible_truncation)] // Weights are small by construction.
pub fn relative_weight(line_item_count: usize, base: f64, per_item: f64) -> i32 {
    let count = line_item_count as f64;
    let weight = count.mul_add(per_item, base).round() as i32;
    weight.max(1)
}

/// A peek request for a bundle of previously-notified data.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BundleRequest {
    /// Idempotency key of the peek attempt.
    pub idempotency_id: Uuid,
    /// Routing key the bundle was notified under.
    pub message_type: String,
    /// Reference ids of the rows to bundle.
    pub notification_ids: Vec<Uuid>,
}

impl BundleRequest {
    /// The category prefix part of the message type.
    #[must_use]
    pub fn message_type_prefix(&self) -> &str {
        self.message_type
            .split_once('_')
            .map_or(self.message_type.as_str(), |(prefix, _)| prefix)
    }

    /// The business reason code part of the message type, if present.
    #[must_use]
    pub fn business_reason_code(&self) -> Option<BusinessReasonCode> {
        let (_, code) = self.message_type.split_once('_')?;
        match code {
            "D18" => Some(BusinessReasonCode::UpdateChargeInformation),
            "D08" => Some(BusinessReasonCode::UpdateChargePrices),
            _ => None,
        }
    }
}

/// External MessageHub collaborator notified of available data.
///
/// The send is fire-and-forget from this core's perspective; delivery retry
/// is the collaborator's responsibility.
#[async_trait]
pub trait MessageHubClient: Send + Sync {
    /// Notifies the hub that one unit of data is ready for retrieval.
    ///
    /// # Errors
    ///
    /// Returns [`ChargesError::Transport`] when the notify call fails.
    async fn notify(
        &self,
        correlation_id: &CorrelationId,
        notification: &Notification,
    ) -> Result<(), ChargesError>;
}

/// Reply collaborator handing a bundle stream back to the requester.
#[async_trait]
pub trait BundleReplySender: Send + Sync {
    /// Sends the bundle as the reply to one peek request.
    ///
    /// # Errors
    ///
    /// Returns [`ChargesError::Transport`] when the reply cannot be sent.
    async fn send_reply(
        &self,
        request: &BundleRequest,
        bundle: Vec<u8>,
    ) -> Result<(), ChargesError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn charge_weight_fixture() {
        // weight(points) == round_away_from_zero(points * 0.2 + 5)
        assert_eq!(relative_weight(0, 5.0, 0.2), 5);
        assert_eq!(relative_weight(1, 5.0, 0.2), 5);
        assert_eq!(relative_weight(24, 5.0, 0.2), 10);
        assert_eq!(relative_weight(100, 5.0, 0.2), 25);
        assert_eq!(relative_weight(96, 5.0, 0.2), 24);
    }

    #[test]
    fn midpoints_round_away_from_zero() {
        // 6.5 must become 7, not banker's 6.
        assert_eq!(relative_weight(3, 5.0, 0.5), 7);
    }

    #[test]
    fn weight_is_always_positive() {
        assert_eq!(relative_weight(0, 0.0, 0.2), 1);
    }

    #[test]
    fn bundle_request_splits_message_type() {
        let request = BundleRequest {
            idempotency_id: Uuid::from_u128(7),
            message_type: "ChargeDataAvailable_D18".to_string(),
            notification_ids: vec![],
        };
        assert_eq!(request.message_type_prefix(), "ChargeDataAvailable");
        assert_eq!(
            request.business_reason_code(),
            Some(BusinessReasonCode::UpdateChargeInformation)
        );
    }
}
