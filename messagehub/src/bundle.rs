//! Bundle creation and peek fulfillment.
//!
//! A peek request names a message type and the notification reference ids
//! the recipient wants bundled. Routing between creators is a prefix-keyed
//! lookup; an unknown prefix is a configuration bug and fails loudly rather
//! than being retried.
//!
//! A bundle is homogeneous by contract: one business reason code, one
//! recipient. The creator verifies that explicitly over every fetched row
//! and refuses mixed bundles instead of guessing header fields from the
//! first row.

use charges_core::available_data::{AvailableData, AvailableDataKind, AvailableDataStore};
use charges_core::error::ChargesError;
use charges_core::notification::{BundleReplySender, BundleRequest};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::debug;

/// Serializes a homogeneous set of rows into the recipient's wire format.
pub trait BundleSerializer: Send + Sync {
    /// Encodes the rows into one bundle byte stream.
    ///
    /// # Errors
    ///
    /// Returns [`ChargesError::Serialization`] when encoding fails.
    fn serialize(&self, rows: &[AvailableData]) -> Result<Vec<u8>, ChargesError>;
}

/// JSON bundle encoding.
#[derive(Clone, Copy, Debug, Default)]
pub struct JsonBundleSerializer;

impl BundleSerializer for JsonBundleSerializer {
    fn serialize(&self, rows: &[AvailableData]) -> Result<Vec<u8>, ChargesError> {
        serde_json::to_vec(rows).map_err(|e| ChargesError::Serialization(e.to_string()))
    }
}

/// Creates bundles for one available-data category.
pub struct BundleCreator {
    kind: AvailableDataKind,
    store: Arc<dyn AvailableDataStore>,
    serializer: Arc<dyn BundleSerializer>,
}

impl BundleCreator {
    /// Creates a bundle creator for the given category.
    #[must_use]
    pub fn new(
        kind: AvailableDataKind,
        store: Arc<dyn AvailableDataStore>,
        serializer: Arc<dyn BundleSerializer>,
    ) -> Self {
        Self {
            kind,
            store,
            serializer,
        }
    }

    /// The message type prefix this creator serves.
    #[must_use]
    pub const fn message_type_prefix(&self) -> &'static str {
        self.kind.message_type_prefix()
    }

    /// Fulfils one peek request.
    ///
    /// # Errors
    ///
    /// - [`ChargesError::UnknownMessageType`] when the request's message
    ///   type does not carry this creator's prefix — a routing bug.
    /// - [`ChargesError::MissingArgument`] when the request names no ids.
    /// - [`ChargesError::NotFound`] when none of the ids resolve to rows.
    /// - [`ChargesError::MixedBundle`] when the rows disagree on business
    ///   reason code or recipient.
    /// - [`ChargesError::Store`] / [`ChargesError::Serialization`] on
    ///   infrastructure failure.
    pub async fn create(&self, request: &BundleRequest) -> Result<Vec<u8>, ChargesError> {
        if request.message_type_prefix() != self.message_type_prefix() {
            return Err(ChargesError::UnknownMessageType(
                request.message_type.clone(),
            ));
        }
        if request.notification_ids.is_empty() {
            return Err(ChargesError::MissingArgument("notification_ids"));
        }

        let rows = self
            .store
            .get_by_reference_ids(&request.notification_ids)
            .await?;
        if rows.is_empty() {
            return Err(ChargesError::NotFound(format!(
                "no available data for {} notification ids",
                request.notification_ids.len()
            )));
        }

        validate_homogeneity(&rows)?;
        debug!(
            idempotency_id = %request.idempotency_id,
            rows = rows.len(),
            message_type = %request.message_type,
            "serializing bundle"
        );
        self.serializer.serialize(&rows)
    }
}

/// Refuses bundles whose rows disagree on reason code or recipient.
fn validate_homogeneity(rows: &[AvailableData]) -> Result<(), ChargesError> {
    let Some(first) = rows.first() else {
        return Ok(());
    };
    for row in rows.iter().skip(1) {
        if row.business_reason_code != first.business_reason_code {
            return Err(ChargesError::MixedBundle(format!(
                "business reason codes {} and {} in one bundle",
                first.business_reason_code, row.business_reason_code
            )));
        }
        if row.recipient_id != first.recipient_id || row.recipient_role != first.recipient_role {
            return Err(ChargesError::MixedBundle(format!(
                "recipients {} and {} in one bundle",
                first.recipient_id, row.recipient_id
            )));
        }
        if row.kind() != first.kind() {
            return Err(ChargesError::MixedBundle(
                "mixed data categories in one bundle".to_string(),
            ));
        }
    }
    Ok(())
}

/// Prefix-keyed routing across the configured bundle creators.
pub struct BundleCreatorProvider {
    creators: HashMap<&'static str, Arc<BundleCreator>>,
}

impl BundleCreatorProvider {
    /// Builds the provider from the configured creators.
    #[must_use]
    pub fn new(creators: Vec<Arc<BundleCreator>>) -> Self {
        Self {
            creators: creators
                .into_iter()
                .map(|c| (c.message_type_prefix(), c))
                .collect(),
        }
    }

    /// Resolves the creator for a message type.
    ///
    /// # Errors
    ///
    /// Returns [`ChargesError::UnknownMessageType`] when no creator serves
    /// the prefix. That is a deployment bug: the external provider routes by
    /// prefix, so an unknown one means the configuration is wrong.
    pub fn get(&self, message_type: &str) -> Result<&Arc<BundleCreator>, ChargesError> {
        let prefix = message_type
            .split_once('_')
            .map_or(message_type, |(prefix, _)| prefix);
        self.creators
            .get(prefix)
            .ok_or_else(|| ChargesError::UnknownMessageType(message_type.to_string()))
    }
}

/// End-to-end peek fulfillment: route, bundle, reply.
pub struct PeekHandler {
    provider: BundleCreatorProvider,
    reply: Arc<dyn BundleReplySender>,
}

impl PeekHandler {
    /// Creates a handler over the configured creators and reply sender.
    #[must_use]
    pub fn new(provider: BundleCreatorProvider, reply: Arc<dyn BundleReplySender>) -> Self {
        Self { provider, reply }
    }

    /// Handles one peek request.
    ///
    /// # Errors
    ///
    /// Propagates creator and transport errors; see [`BundleCreator::create`].
    pub async fn handle(&self, request: &BundleRequest) -> Result<(), ChargesError> {
        let creator = self.provider.get(&request.message_type)?;
        let bundle = creator.create(request).await?;
        self.reply.send_reply(request, bundle).await
    }
}
