//! # Charges Core
//!
//! Domain model and core contracts for the charges system: market commands
//! over charges and charge links, the two-tier validation rule engine,
//! outcome events with their topic mapping, the transactional outbox row
//! model, available-data records for the poll-based retrieval protocol, and
//! the correlated default charge-link request/reply types.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────┐   input rules    ┌──────────────────┐
//! │   Command    ├─────────────────►│ ValidationResult │
//! │ (decoded)    │   document rules └────────┬─────────┘
//! └──────────────┘   (async lookups)         │
//!                                            ▼
//!                                  ┌──────────────────┐
//!                                  │  OutcomeEvent    │  exactly one per
//!                                  │ Accepted/Rejected│  processing attempt
//!                                  └────────┬─────────┘
//!                                           │ same transaction as the
//!                                           ▼ domain write
//!                                  ┌──────────────────┐
//!                                  │     Outbox       │  at-least-once
//!                                  └────────┬─────────┘
//!                                           ▼
//!                                  ┌──────────────────┐
//!                                  │  AvailableData   │  per-recipient
//!                                  │  + Notification  │  fan-out
//!                                  └──────────────────┘
//! ```
//!
//! This crate holds no I/O. Storage lives in `charges-postgres`, transport
//! in `charges-redpanda`, the fan-out and bundling pipeline in
//! `charges-messagehub`, and orchestration in `charges-runtime`.

pub mod available_data;
pub mod bus;
pub mod charge;
pub mod command;
pub mod correlation;
pub mod environment;
pub mod error;
pub mod events;
pub mod ids;
pub mod links;
pub mod notification;
pub mod outbox;
pub mod participant;
pub mod repository;
pub mod validation;

pub use error::{ChargesError, DecodeError, ErrorClass};
