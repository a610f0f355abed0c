//! # Charges Postgres
//!
//! PostgreSQL implementations of the charges storage contracts:
//!
//! - [`PostgresCommandPersistence`] — one transaction per processing
//!   attempt, domain write and outbox append atomic
//! - [`PostgresOutboxStore`] — lease-based atomic claiming for concurrent
//!   dispatchers
//! - [`PostgresAvailableDataStore`] — append-only retrieval rows
//! - [`PostgresMarketParticipantRepository`] /
//!   [`PostgresMeteringPointRepository`] — reference data lookups
//!
//! Expected schema (managed by external migration tooling):
//!
//! ```sql
//! CREATE TABLE outbox_messages (
//!     id UUID PRIMARY KEY,
//!     event_type TEXT NOT NULL,
//!     payload BYTEA NOT NULL,
//!     correlation_id TEXT NOT NULL,
//!     created_at TIMESTAMPTZ NOT NULL,
//!     dispatched_at TIMESTAMPTZ,
//!     claimed_until TIMESTAMPTZ
//! );
//!
//! CREATE TABLE charges (
//!     id TEXT NOT NULL,
//!     owner_id TEXT NOT NULL,
//!     charge_type TEXT NOT NULL,
//!     name TEXT NOT NULL,
//!     description TEXT NOT NULL,
//!     resolution TEXT NOT NULL,
//!     tax_indicator BOOLEAN NOT NULL,
//!     transparent_invoicing BOOLEAN NOT NULL,
//!     vat_classification TEXT NOT NULL,
//!     start_date TIMESTAMPTZ NOT NULL,
//!     end_date TIMESTAMPTZ,
//!     points JSONB NOT NULL,
//!     PRIMARY KEY (id, owner_id, charge_type)
//! );
//!
//! CREATE TABLE charge_links (
//!     metering_point_id TEXT NOT NULL,
//!     charge_id TEXT NOT NULL,
//!     charge_owner_id TEXT NOT NULL,
//!     charge_type TEXT NOT NULL,
//!     factor INTEGER NOT NULL,
//!     start_date TIMESTAMPTZ NOT NULL,
//!     end_date TIMESTAMPTZ
//! );
//!
//! CREATE TABLE available_data (
//!     id UUID PRIMARY KEY,
//!     reference_id UUID NOT NULL UNIQUE,
//!     recipient_id TEXT NOT NULL,
//!     recipient_role TEXT NOT NULL,
//!     business_reason_code TEXT NOT NULL,
//!     request_timestamp TIMESTAMPTZ NOT NULL,
//!     detail JSONB NOT NULL
//! );
//!
//! CREATE TABLE market_participants (
//!     id TEXT PRIMARY KEY,
//!     role TEXT NOT NULL,
//!     active BOOLEAN NOT NULL
//! );
//!
//! CREATE TABLE metering_points (
//!     id TEXT PRIMARY KEY,
//!     metering_point_type TEXT NOT NULL,
//!     grid_access_provider_id TEXT NOT NULL
//! );
//! ```

pub mod available_data;
pub mod outbox;
pub mod participants;
pub mod persistence;

pub use available_data::PostgresAvailableDataStore;
pub use outbox::PostgresOutboxStore;
pub use participants::{PostgresMarketParticipantRepository, PostgresMeteringPointRepository};
pub use persistence::PostgresCommandPersistence;
