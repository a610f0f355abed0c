//! # Charges Runtime
//!
//! Orchestration for the charges system: command handlers that drive the
//! two-tier validation to exactly one outcome event, the transactional
//! outbox dispatcher, and the receiving half of the default charge-link
//! request/reply protocol.
//!
//! Every worker invocation is stateless; the only shared state is the
//! injected thread-safe collaborators (`Arc<dyn …>`) and the long-lived
//! sender provider cache. All loops take a shutdown signal so a host can
//! abort in-flight work.

pub mod dispatcher;
pub mod factory;
pub mod handler;
pub mod ingestion;
pub mod providers;
pub mod reply;

pub use dispatcher::{DispatcherConfig, OutboxDispatcher};
pub use factory::OutcomeEventFactory;
pub use handler::{ChargeCommandHandler, ChargeLinkCommandHandler};
pub use ingestion::{CommandIngestion, IngestionError};
pub use providers::{ReplySenderProvider, SenderKey};
pub use reply::{DeliveryStatus, ReplyReader};
