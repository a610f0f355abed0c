//! # Charges MessageHub
//!
//! The "post office" side of the charges system: fans accepted and rejected
//! outcome events out into immutable, recipient-scoped available-data rows,
//! notifies the external MessageHub with weighted notifications, and fulfils
//! peek requests by bundling homogeneous row sets back to recipients.
//!
//! ```text
//! OutcomeEvent ──► AvailableDataFactory ──► rows ──► AvailableDataNotifier
//!                                                        │ notify(weight)
//!                                                        ▼
//!                                                   MessageHub
//!                                                        │ peek(ids)
//!                                                        ▼
//!              BundleCreatorProvider ──► BundleCreator ──► reply bytes
//! ```

pub mod bundle;
pub mod factory;
pub mod notifier;

pub use bundle::{
    BundleCreator, BundleCreatorProvider, BundleSerializer, JsonBundleSerializer, PeekHandler,
};
pub use charges_core::notification::BundleReplySender;
pub use factory::AvailableDataFactory;
pub use notifier::AvailableDataNotifier;
