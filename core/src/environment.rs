//! Injected environment dependencies: clock and id generation.
//!
//! Handlers and factories never call `Utc::now()` or `Uuid::new_v4()`
//! directly; they go through these traits so tests can pin time and ids.

use chrono::{DateTime, Utc};
use uuid::Uuid;

/// Source of the current instant.
pub trait Clock: Send + Sync {
    /// The current instant.
    fn now(&self) -> DateTime<Utc>;
}

/// System clock for production use.
#[derive(Clone, Copy, Debug, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Source of fresh, globally unique ids.
pub trait IdProvider: Send + Sync {
    /// A fresh id, never repeated.
    fn new_id(&self) -> Uuid;
}

/// Random v4 uuid provider for production use.
#[derive(Clone, Copy, Debug, Default)]
pub struct RandomIdProvider;

impl IdProvider for RandomIdProvider {
    fn new_id(&self) -> Uuid {
        Uuid::new_v4()
    }
}
