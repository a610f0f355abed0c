//! PostgreSQL available-data store: append-only rows, fetched back by the
//! reference ids recipients hand in through peek requests.

use charges_core::available_data::{AvailableData, AvailableDataStore};
use charges_core::command::BusinessReasonCode;
use charges_core::error::ChargesError;
use charges_core::ids::MarketParticipantId;
use charges_core::participant::MarketParticipantRole;
use sqlx::{PgPool, Row};
use uuid::Uuid;

/// PostgreSQL-backed available-data store.
pub struct PostgresAvailableDataStore {
    pool: PgPool,
}

impl PostgresAvailableDataStore {
    /// Creates a store over the given connection pool.
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait::async_trait]
impl AvailableDataStore for PostgresAvailableDataStore {
    async fn store(&self, rows: &[AvailableData]) -> Result<(), ChargesError> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| ChargesError::Store(e.to_string()))?;

        for row in rows {
            let detail = serde_json::to_value(&row.detail)
                .map_err(|e| ChargesError::Serialization(e.to_string()))?;
            sqlx::query(
                r"
                INSERT INTO available_data (
                    id, reference_id, recipient_id, recipient_role,
                    business_reason_code, request_timestamp, detail
                ) VALUES ($1, $2, $3, $4, $5, $6, $7)
                ",
            )
            .bind(row.id)
            .bind(row.reference_id)
            .bind(row.recipient_id.as_str())
            .bind(row.recipient_role.to_string())
            .bind(row.business_reason_code.code())
            .bind(row.request_timestamp)
            .bind(detail)
            .execute(&mut *tx)
            .await
            .map_err(|e| ChargesError::Store(e.to_string()))?;
        }

        tx.commit()
            .await
            .map_err(|e| ChargesError::Store(e.to_string()))?;
        metrics::counter!("charges.available_data.stored").increment(rows.len() as u64);
        Ok(())
    }

    async fn get_by_reference_ids(
        &self,
        reference_ids: &[Uuid],
    ) -> Result<Vec<AvailableData>, ChargesError> {
        let rows = sqlx::query(
            r"
            SELECT id, reference_id, recipient_id, recipient_role,
                   business_reason_code, request_timestamp, detail
            FROM available_data
            WHERE reference_id = ANY($1)
            ORDER BY request_timestamp
            ",
        )
        .bind(reference_ids)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| ChargesError::Store(e.to_string()))?;

        rows.iter()
            .map(|row| {
                let recipient: String = row
                    .try_get("recipient_id")
                    .map_err(|e| ChargesError::Store(e.to_string()))?;
                let role: String = row
                    .try_get("recipient_role")
                    .map_err(|e| ChargesError::Store(e.to_string()))?;
                let reason: String = row
                    .try_get("business_reason_code")
                    .map_err(|e| ChargesError::Store(e.to_string()))?;
                let detail: serde_json::Value = row
                    .try_get("detail")
                    .map_err(|e| ChargesError::Store(e.to_string()))?;
                Ok(AvailableData {
                    id: row
                        .try_get("id")
                        .map_err(|e| ChargesError::Store(e.to_string()))?,
                    reference_id: row
                        .try_get("reference_id")
                        .map_err(|e| ChargesError::Store(e.to_string()))?,
                    recipient_id: MarketParticipantId::new(recipient),
                    recipient_role: MarketParticipantRole::from_name(&role),
                    business_reason_code: BusinessReasonCode::from_code(&reason),
                    request_timestamp: row
                        .try_get("request_timestamp")
                        .map_err(|e| ChargesError::Store(e.to_string()))?,
                    detail: serde_json::from_value(detail)
                        .map_err(|e| ChargesError::Serialization(e.to_string()))?,
                })
            })
            .collect()
    }
}
