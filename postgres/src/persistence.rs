//! Transactional persistence for one processing attempt.
//!
//! One call, one transaction: the domain write and the outbox append either
//! both commit or neither does. The transaction value is passed explicitly
//! to each write — never ambient state.

use crate::outbox::PostgresOutboxStore;
use charges_core::charge::Charge;
use charges_core::command::ChargeLinkOperation;
use charges_core::error::ChargesError;
use charges_core::outbox::OutboxMessage;
use charges_core::repository::{CommandPersistence, DomainWrite};
use sqlx::{PgPool, Postgres, Transaction};

/// PostgreSQL implementation of the per-attempt persistence boundary.
pub struct PostgresCommandPersistence {
    pool: PgPool,
}

impl PostgresCommandPersistence {
    /// Creates a persistence over the given connection pool.
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn insert_charge(
        tx: &mut Transaction<'_, Postgres>,
        charge: &Charge,
    ) -> Result<(), ChargesError> {
        let points = serde_json::to_value(&charge.points)
            .map_err(|e| ChargesError::Serialization(e.to_string()))?;
        sqlx::query(
            r"
            INSERT INTO charges (
                id, owner_id, charge_type, name, description, resolution,
                tax_indicator, transparent_invoicing, vat_classification,
                start_date, end_date, points
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
            ON CONFLICT (id, owner_id, charge_type) DO UPDATE SET
                name = EXCLUDED.name,
                description = EXCLUDED.description,
                resolution = EXCLUDED.resolution,
                tax_indicator = EXCLUDED.tax_indicator,
                transparent_invoicing = EXCLUDED.transparent_invoicing,
                vat_classification = EXCLUDED.vat_classification,
                start_date = EXCLUDED.start_date,
                end_date = EXCLUDED.end_date,
                points = EXCLUDED.points
            ",
        )
        .bind(charge.id.as_str())
        .bind(charge.owner.as_str())
        .bind(charge.charge_type.to_string())
        .bind(&charge.name)
        .bind(&charge.description)
        .bind(charge.resolution.iso_code())
        .bind(charge.tax_indicator)
        .bind(charge.transparent_invoicing)
        .bind(format!("{:?}", charge.vat_classification))
        .bind(charge.start_date)
        .bind(charge.end_date)
        .bind(points)
        .execute(&mut **tx)
        .await
        .map_err(|e| ChargesError::Store(e.to_string()))?;
        Ok(())
    }

    async fn insert_link(
        tx: &mut Transaction<'_, Postgres>,
        link: &ChargeLinkOperation,
    ) -> Result<(), ChargesError> {
        sqlx::query(
            r"
            INSERT INTO charge_links (
                metering_point_id, charge_id, charge_owner_id, charge_type,
                factor, start_date, end_date
            ) VALUES ($1, $2, $3, $4, $5, $6, $7)
            ",
        )
        .bind(link.metering_point_id.as_str())
        .bind(link.charge_id.as_str())
        .bind(link.charge_owner.id.as_str())
        .bind(link.charge_type.to_string())
        .bind(link.factor)
        .bind(link.start_date)
        .bind(link.end_date)
        .execute(&mut **tx)
        .await
        .map_err(|e| ChargesError::Store(e.to_string()))?;
        Ok(())
    }
}

#[async_trait::async_trait]
impl CommandPersistence for PostgresCommandPersistence {
    async fn persist(
        &self,
        write: DomainWrite,
        outbox: OutboxMessage,
    ) -> Result<(), ChargesError> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| ChargesError::Store(e.to_string()))?;

        match &write {
            DomainWrite::None => {},
            DomainWrite::Charges(charges) => {
                for charge in charges {
                    Self::insert_charge(&mut tx, charge).await?;
                }
            },
            DomainWrite::ChargeLinks(links) => {
                for link in links {
                    Self::insert_link(&mut tx, link).await?;
                }
            },
        }

        PostgresOutboxStore::enqueue(&mut tx, &outbox).await?;

        tx.commit()
            .await
            .map_err(|e| ChargesError::Store(e.to_string()))?;
        tracing::debug!(outbox_id = %outbox.id, "processing attempt committed");
        Ok(())
    }
}
