//! Converts stored available-data rows into weighted notifications.

use charges_core::available_data::{AvailableData, AvailableDataKind, AvailableDataStore};
use charges_core::error::ChargesError;
use charges_core::ids::CorrelationId;
use charges_core::notification::{
    MessageHubClient, NOTIFICATION_ORIGIN, Notification, relative_weight,
};
use std::sync::Arc;
use tracing::debug;

/// Base weight of a charge data notification.
pub const CHARGE_BASE_WEIGHT: f64 = 5.0;
/// Additional weight per charge price point.
pub const CHARGE_POINT_WEIGHT: f64 = 0.2;
/// Base weight for link and receipt notifications.
pub const DEFAULT_BASE_WEIGHT: f64 = 1.0;

/// Persists fan-out rows and notifies the MessageHub about each of them.
///
/// The notify call is fire-and-forget from this component's perspective:
/// a failure is reported to the caller, but delivery retry belongs to the
/// collaborator.
pub struct AvailableDataNotifier {
    store: Arc<dyn AvailableDataStore>,
    client: Arc<dyn MessageHubClient>,
}

impl AvailableDataNotifier {
    /// Creates a notifier over the given store and hub client.
    #[must_use]
    pub fn new(store: Arc<dyn AvailableDataStore>, client: Arc<dyn MessageHubClient>) -> Self {
        Self { store, client }
    }

    /// Stores the rows append-only, then sends one notification per row.
    ///
    /// # Errors
    ///
    /// Returns [`ChargesError::Store`] when persisting fails and
    /// [`ChargesError::Transport`] when a notify call fails.
    pub async fn publish(
        &self,
        correlation_id: &CorrelationId,
        rows: &[AvailableData],
    ) -> Result<(), ChargesError> {
        if rows.is_empty() {
            return Ok(());
        }
        self.store.store(rows).await?;

        for row in rows {
            let notification = build_notification(row);
            debug!(
                reference_id = %notification.id,
                message_type = %notification.message_type,
                weight = notification.relative_weight,
                "notifying message hub"
            );
            self.client.notify(correlation_id, &notification).await?;
        }
        Ok(())
    }
}

/// Builds the notification for one stored row.
#[must_use]
pub fn build_notification(row: &AvailableData) -> Notification {
    let weight = match row.kind() {
        AvailableDataKind::Charge => {
            relative_weight(row.detail.line_item_count(), CHARGE_BASE_WEIGHT, CHARGE_POINT_WEIGHT)
        },
        AvailableDataKind::ChargeLink
        | AvailableDataKind::ChargeReceipt
        | AvailableDataKind::ChargeLinkReceipt => {
            relative_weight(row.detail.line_item_count(), DEFAULT_BASE_WEIGHT, 0.0)
        },
    };
    Notification {
        id: row.reference_id,
        recipient_id: row.recipient_id.clone(),
        recipient_role: row.recipient_role,
        message_type: row.message_type(),
        origin: NOTIFICATION_ORIGIN.to_string(),
        supports_bundling: true,
        relative_weight: weight,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use charges_core::available_data::AvailableDataDetail;
    use charges_core::charge::PricePoint;
    use charges_core::command::BusinessReasonCode;
    use charges_core::ids::{ChargeId, MarketParticipantId};
    use charges_core::participant::MarketParticipantRole;
    use chrono::{TimeZone, Utc};
    use uuid::Uuid;

    fn charge_row(point_count: usize) -> AvailableData {
        let start = Utc.with_ymd_and_hms(2021, 1, 1, 0, 0, 0).unwrap();
        AvailableData {
            id: Uuid::from_u128(1),
            reference_id: Uuid::from_u128(2),
            recipient_id: MarketParticipantId::new("5790000000001".to_string()),
            recipient_role: MarketParticipantRole::GridAccessProvider,
            business_reason_code: BusinessReasonCode::UpdateChargePrices,
            request_timestamp: start,
            detail: AvailableDataDetail::Charge {
                charge_id: ChargeId::new("TAR-001".to_string()),
                charge_owner: MarketParticipantId::new("5790000000009".to_string()),
                points: (0..point_count)
                    .map(|i| {
                        PricePoint::new(start + chrono::Duration::hours(i as i64), 0.25)
                    })
                    .collect(),
            },
        }
    }

    #[test]
    fn charge_notification_weight_follows_point_count() {
        // round_away_from_zero(points * 0.2 + 5)
        assert_eq!(build_notification(&charge_row(0)).relative_weight, 5);
        assert_eq!(build_notification(&charge_row(24)).relative_weight, 10);
        assert_eq!(build_notification(&charge_row(96)).relative_weight, 24);
    }

    #[test]
    fn notification_uses_reference_id_and_supports_bundling() {
        let notification = build_notification(&charge_row(1));
        assert_eq!(notification.id, Uuid::from_u128(2));
        assert!(notification.supports_bundling);
        assert_eq!(notification.origin, "Charges");
        assert_eq!(notification.message_type, "ChargeDataAvailable_D08");
        assert!(notification.relative_weight > 0);
    }
}
