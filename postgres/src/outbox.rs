//! PostgreSQL outbox store.
//!
//! `enqueue` takes the caller's open transaction — the explicit unit of work
//! shared with the domain write — so the outcome row and the domain state
//! land atomically. Claiming uses `FOR UPDATE SKIP LOCKED` inside a single
//! statement: the row lock lives only for that statement, never across the
//! publish call, and concurrent dispatchers skip each other's rows.

use charges_core::error::ChargesError;
use charges_core::ids::CorrelationId;
use charges_core::outbox::{OutboxMessage, OutboxRepository};
use chrono::{DateTime, Utc};
use sqlx::{PgPool, Postgres, Row, Transaction};
use std::time::Duration;
use uuid::Uuid;

/// PostgreSQL-backed outbox.
pub struct PostgresOutboxStore {
    pool: PgPool,
}

impl PostgresOutboxStore {
    /// Creates a store over the given connection pool.
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Appends a row inside the caller's transaction.
    ///
    /// # Errors
    ///
    /// Returns [`ChargesError::Store`] when the insert fails.
    pub async fn enqueue(
        tx: &mut Transaction<'_, Postgres>,
        message: &OutboxMessage,
    ) -> Result<(), ChargesError> {
        sqlx::query(
            r"
            INSERT INTO outbox_messages (
                id, event_type, payload, correlation_id, created_at
            ) VALUES ($1, $2, $3, $4, $5)
            ",
        )
        .bind(message.id)
        .bind(&message.event_type)
        .bind(&message.payload)
        .bind(message.correlation_id.as_str())
        .bind(message.created_at)
        .execute(&mut **tx)
        .await
        .map_err(|e| ChargesError::Store(e.to_string()))?;

        tracing::debug!(
            outbox_id = %message.id,
            event_type = %message.event_type,
            "outbox row enqueued"
        );
        metrics::counter!("charges.outbox.enqueued", "event_type" => message.event_type.clone())
            .increment(1);
        Ok(())
    }
}

fn row_to_message(row: &sqlx::postgres::PgRow) -> Result<OutboxMessage, ChargesError> {
    let correlation: String = row
        .try_get("correlation_id")
        .map_err(|e| ChargesError::Store(e.to_string()))?;
    Ok(OutboxMessage {
        id: row
            .try_get("id")
            .map_err(|e| ChargesError::Store(e.to_string()))?,
        event_type: row
            .try_get("event_type")
            .map_err(|e| ChargesError::Store(e.to_string()))?,
        payload: row
            .try_get("payload")
            .map_err(|e| ChargesError::Store(e.to_string()))?,
        correlation_id: CorrelationId::new(correlation),
        created_at: row
            .try_get("created_at")
            .map_err(|e| ChargesError::Store(e.to_string()))?,
        dispatched_at: row
            .try_get("dispatched_at")
            .map_err(|e| ChargesError::Store(e.to_string()))?,
        claimed_until: row
            .try_get("claimed_until")
            .map_err(|e| ChargesError::Store(e.to_string()))?,
    })
}

#[async_trait::async_trait]
impl OutboxRepository for PostgresOutboxStore {
    async fn claim_batch(
        &self,
        limit: usize,
        lease: Duration,
    ) -> Result<Vec<OutboxMessage>, ChargesError> {
        let now = Utc::now();
        let until: DateTime<Utc> = now
            + chrono::Duration::from_std(lease)
                .map_err(|e| ChargesError::Store(e.to_string()))?;

        #[allow(clippy::cast_possible_wrap)] // Batch sizes are small.
        let rows = sqlx::query(
            r"
            UPDATE outbox_messages
            SET claimed_until = $1
            WHERE id IN (
                SELECT id FROM outbox_messages
                WHERE dispatched_at IS NULL
                  AND (claimed_until IS NULL OR claimed_until < $2)
                ORDER BY created_at
                LIMIT $3
                FOR UPDATE SKIP LOCKED
            )
            RETURNING id, event_type, payload, correlation_id, created_at,
                      dispatched_at, claimed_until
            ",
        )
        .bind(until)
        .bind(now)
        .bind(limit as i64)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| ChargesError::Store(e.to_string()))?;

        rows.iter().map(row_to_message).collect()
    }

    async fn mark_dispatched(&self, id: Uuid) -> Result<(), ChargesError> {
        let result = sqlx::query(
            r"
            UPDATE outbox_messages
            SET dispatched_at = $1
            WHERE id = $2 AND dispatched_at IS NULL
            ",
        )
        .bind(Utc::now())
        .bind(id)
        .execute(&self.pool)
        .await
        .map_err(|e| ChargesError::Store(e.to_string()))?;

        if result.rows_affected() == 0 {
            return Err(ChargesError::Store(format!(
                "outbox row {id} missing or already dispatched"
            )));
        }
        metrics::counter!("charges.outbox.dispatched").increment(1);
        Ok(())
    }
}
