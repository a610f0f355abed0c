//! Reference-data repositories: market participants and metering points.

use charges_core::error::ChargesError;
use charges_core::ids::{MarketParticipantId, MeteringPointId};
use charges_core::links::{MeteringPoint, MeteringPointType};
use charges_core::participant::{MarketParticipant, MarketParticipantRole};
use charges_core::repository::{MarketParticipantRepository, MeteringPointRepository};
use sqlx::{PgPool, Row};

/// PostgreSQL market participant repository.
pub struct PostgresMarketParticipantRepository {
    pool: PgPool,
}

impl PostgresMarketParticipantRepository {
    /// Creates a repository over the given connection pool.
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn row_to_participant(row: &sqlx::postgres::PgRow) -> Result<MarketParticipant, ChargesError> {
    let id: String = row
        .try_get("id")
        .map_err(|e| ChargesError::Store(e.to_string()))?;
    let role: String = row
        .try_get("role")
        .map_err(|e| ChargesError::Store(e.to_string()))?;
    let active: bool = row
        .try_get("active")
        .map_err(|e| ChargesError::Store(e.to_string()))?;
    Ok(MarketParticipant::new(
        MarketParticipantId::new(id),
        MarketParticipantRole::from_name(&role),
        active,
    ))
}

#[async_trait::async_trait]
impl MarketParticipantRepository for PostgresMarketParticipantRepository {
    async fn find_by_id(
        &self,
        id: &MarketParticipantId,
    ) -> Result<Option<MarketParticipant>, ChargesError> {
        let row = sqlx::query(
            r"
            SELECT id, role, active
            FROM market_participants
            WHERE id = $1
            ",
        )
        .bind(id.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| ChargesError::Store(e.to_string()))?;

        row.as_ref().map(row_to_participant).transpose()
    }

    async fn active_grid_access_providers(
        &self,
    ) -> Result<Vec<MarketParticipant>, ChargesError> {
        let rows = sqlx::query(
            r"
            SELECT id, role, active
            FROM market_participants
            WHERE active AND role = 'GridAccessProvider'
            ORDER BY id
            ",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|e| ChargesError::Store(e.to_string()))?;

        rows.iter().map(row_to_participant).collect()
    }
}

/// PostgreSQL metering point repository.
pub struct PostgresMeteringPointRepository {
    pool: PgPool,
}

impl PostgresMeteringPointRepository {
    /// Creates a repository over the given connection pool.
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait::async_trait]
impl MeteringPointRepository for PostgresMeteringPointRepository {
    async fn find_by_id(
        &self,
        id: &MeteringPointId,
    ) -> Result<Option<MeteringPoint>, ChargesError> {
        let row = sqlx::query(
            r"
            SELECT id, metering_point_type, grid_access_provider_id
            FROM metering_points
            WHERE id = $1
            ",
        )
        .bind(id.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| ChargesError::Store(e.to_string()))?;

        row.map(|row| {
            let id: String = row
                .try_get("id")
                .map_err(|e| ChargesError::Store(e.to_string()))?;
            let point_type: String = row
                .try_get("metering_point_type")
                .map_err(|e| ChargesError::Store(e.to_string()))?;
            let provider: String = row
                .try_get("grid_access_provider_id")
                .map_err(|e| ChargesError::Store(e.to_string()))?;
            Ok(MeteringPoint {
                id: MeteringPointId::new(id),
                metering_point_type: MeteringPointType::from_name(&point_type),
                grid_access_provider_id: MarketParticipantId::new(provider),
            })
        })
        .transpose()
    }
}
