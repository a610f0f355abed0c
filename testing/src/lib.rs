//! # Charges Testing
//!
//! Testing utilities and deterministic mocks for the charges system:
//!
//! - `FixedClock` — pinned time, reproducible runs
//! - `SequenceIdProvider` — predictable uuids
//! - In-memory stores for the outbox, available data and reference data
//! - Recording doubles for the message bus and the MessageHub client
//!
//! Everything here is deterministic and allocation-only; no I/O.

pub mod mocks;

pub use mocks::{
    FixedClock, InMemoryAvailableDataStore, InMemoryCommandPersistence,
    InMemoryMarketParticipantRepository, InMemoryMeteringPointRepository,
    InMemoryOutboxRepository, RecordingMessageBus, RecordingMessageHubClient,
    RecordingReplyHandler, SequenceIdProvider,
};
