//! Per-event-kind fan-out into recipient-scoped available-data rows.
//!
//! Fan-out is conditional, not blanket:
//!
//! - Charge data is broadcast to the active grid access providers **only**
//!   when the charge carries the tax indicator. Non-tax charges are
//!   self-maintained by their owner and produce no broadcast rows.
//! - Charge link data goes to the grid access provider operating the
//!   metering point's grid area.
//! - Confirmation and rejection receipts go back to the command sender.
//!
//! Every row gets a fresh id and reference id from the id provider. Under
//! upstream redelivery the same event therefore mints an independent,
//! duplicate-but-valid set of rows; de-duplication would need an inbox key
//! upstream and is out of scope here.

use charges_core::available_data::{AvailableData, AvailableDataDetail, ReceiptStatus};
use charges_core::command::{ChargeCommand, ChargeLinkCommand};
use charges_core::environment::IdProvider;
use charges_core::error::ChargesError;
use charges_core::events::OutcomeEvent;
use charges_core::repository::{MarketParticipantRepository, MeteringPointRepository};
use std::sync::Arc;
use tracing::{debug, warn};

/// Builds available-data rows for one outcome event.
pub struct AvailableDataFactory {
    participants: Arc<dyn MarketParticipantRepository>,
    metering_points: Arc<dyn MeteringPointRepository>,
    ids: Arc<dyn IdProvider>,
}

impl AvailableDataFactory {
    /// Creates a factory with its reference data and id source.
    #[must_use]
    pub fn new(
        participants: Arc<dyn MarketParticipantRepository>,
        metering_points: Arc<dyn MeteringPointRepository>,
        ids: Arc<dyn IdProvider>,
    ) -> Self {
        Self {
            participants,
            metering_points,
            ids,
        }
    }

    /// Fans one event out into zero or more rows.
    ///
    /// Received events produce nothing; accepted events produce data rows
    /// plus confirmation receipts; rejected events produce rejection
    /// receipts.
    ///
    /// # Errors
    ///
    /// Returns [`ChargesError::Store`] when a reference-data lookup fails.
    pub async fn create(&self, event: &OutcomeEvent) -> Result<Vec<AvailableData>, ChargesError> {
        match event {
            // Received events carry no outcome yet, and a rejected charge
            // command is answered over the transport reply path — neither
            // leaves anything to retrieve.
            OutcomeEvent::ChargeCommandReceived { .. }
            | OutcomeEvent::ChargeLinkCommandReceived { .. }
            | OutcomeEvent::ChargeCommandRejected { .. } => Ok(Vec::new()),
            OutcomeEvent::ChargeCommandAccepted { command, .. } => {
                let mut rows = self.charge_broadcast_rows(command).await?;
                rows.extend(self.charge_receipt_rows(command, ReceiptStatus::Confirmed, &[]));
                Ok(rows)
            },
            OutcomeEvent::ChargeLinkCommandAccepted { command, .. } => {
                let mut rows = self.link_rows(command).await?;
                rows.extend(self.link_receipt_rows(command, ReceiptStatus::Confirmed, &[]));
                Ok(rows)
            },
            OutcomeEvent::ChargeLinkCommandRejected {
                command, reasons, ..
            } => Ok(self.link_receipt_rows(command, ReceiptStatus::Rejected, reasons)),
        }
    }

    async fn charge_broadcast_rows(
        &self,
        command: &ChargeCommand,
    ) -> Result<Vec<AvailableData>, ChargesError> {
        let taxed: Vec<_> = command
            .operations
            .iter()
            .filter(|op| op.tax_indicator)
            .collect();
        if taxed.is_empty() {
            debug!(document_id = %command.document.id, "no tax charges, nothing to broadcast");
            return Ok(Vec::new());
        }

        let providers = self.participants.active_grid_access_providers().await?;
        let mut rows = Vec::with_capacity(taxed.len() * providers.len());
        for operation in taxed {
            for provider in &providers {
                rows.push(AvailableData {
                    id: self.ids.new_id(),
                    reference_id: self.ids.new_id(),
                    recipient_id: provider.id.clone(),
                    recipient_role: provider.role,
                    business_reason_code: command.document.business_reason_code,
                    request_timestamp: command.document.request_date,
                    detail: AvailableDataDetail::Charge {
                        charge_id: operation.charge_id.clone(),
                        charge_owner: operation.owner.id.clone(),
                        points: operation.points.clone(),
                    },
                });
            }
        }
        Ok(rows)
    }

    async fn link_rows(
        &self,
        command: &ChargeLinkCommand,
    ) -> Result<Vec<AvailableData>, ChargesError> {
        let mut rows = Vec::with_capacity(command.operations.len());
        for operation in &command.operations {
            let Some(metering_point) = self
                .metering_points
                .find_by_id(&operation.metering_point_id)
                .await?
            else {
                // The command was accepted, so the point existed when the
                // document rules ran; a miss here is stale reference data.
                warn!(
                    metering_point_id = %operation.metering_point_id,
                    "metering point vanished between validation and fan-out"
                );
                continue;
            };
            let Some(provider) = self
                .participants
                .find_by_id(&metering_point.grid_access_provider_id)
                .await?
            else {
                warn!(
                    grid_access_provider_id = %metering_point.grid_access_provider_id,
                    "grid access provider unknown, skipping link fan-out"
                );
                continue;
            };
            rows.push(AvailableData {
                id: self.ids.new_id(),
                reference_id: self.ids.new_id(),
                recipient_id: provider.id.clone(),
                recipient_role: provider.role,
                business_reason_code: command.document.business_reason_code,
                request_timestamp: command.document.request_date,
                detail: AvailableDataDetail::ChargeLink {
                    metering_point_id: operation.metering_point_id.clone(),
                    charge_id: operation.charge_id.clone(),
                    factor: operation.factor,
                },
            });
        }
        Ok(rows)
    }

    fn charge_receipt_rows(
        &self,
        command: &ChargeCommand,
        status: ReceiptStatus,
        reasons: &[String],
    ) -> Vec<AvailableData> {
        command
            .operations
            .iter()
            .map(|operation| AvailableData {
                id: self.ids.new_id(),
                reference_id: self.ids.new_id(),
                recipient_id: command.document.sender.id.clone(),
                recipient_role: command.document.sender.role,
                business_reason_code: command.document.business_reason_code,
                request_timestamp: command.document.request_date,
                detail: AvailableDataDetail::Receipt {
                    status,
                    operation_id: operation.operation_id.clone(),
                    reasons: reasons.to_vec(),
                    for_link: false,
                },
            })
            .collect()
    }

    fn link_receipt_rows(
        &self,
        command: &ChargeLinkCommand,
        status: ReceiptStatus,
        reasons: &[String],
    ) -> Vec<AvailableData> {
        command
            .operations
            .iter()
            .map(|operation| AvailableData {
                id: self.ids.new_id(),
                reference_id: self.ids.new_id(),
                recipient_id: command.document.sender.id.clone(),
                recipient_role: command.document.sender.role,
                business_reason_code: command.document.business_reason_code,
                request_timestamp: command.document.request_date,
                detail: AvailableDataDetail::Receipt {
                    status,
                    operation_id: operation.operation_id.clone(),
                    reasons: reasons.to_vec(),
                    for_link: true,
                },
            })
            .collect()
    }
}
