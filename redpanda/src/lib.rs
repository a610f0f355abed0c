//! # Charges Redpanda
//!
//! Redpanda (Kafka-compatible) transport for the charges system:
//!
//! - [`KafkaMessageBus`] — publishes outcome events to their per-kind
//!   topics, correlation id carried as a message header
//! - [`KafkaMessageHubClient`] — data-available notifications to the
//!   MessageHub topic
//! - [`KafkaDefaultChargeLinkRequester`] — correlated request/reply sender
//!   for default charge-link creation (`reply-to` + `correlation-id`
//!   headers, exactly one send, no internal retry)
//! - [`KafkaBundleReplySender`] — peek replies back to the requester
//!
//! # Delivery semantics
//!
//! At-least-once: a send returning `Ok` was acknowledged by the broker, but
//! callers (the outbox dispatcher in particular) may resend after a crash.
//! Consumers dedupe by `(event_type, correlation_id)` or tolerate
//! duplicates. Send timeout policy lives here, in the transport layer —
//! nothing above it holds a lock across these calls.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

use async_trait::async_trait;
use charges_core::bus::MessageBus;
use charges_core::error::ChargesError;
use charges_core::ids::CorrelationId;
use charges_core::links::{CreateDefaultChargeLinksRequest, DefaultChargeLinkRequester};
use charges_core::notification::{BundleReplySender, BundleRequest, MessageHubClient, Notification};
use rdkafka::config::ClientConfig;
use rdkafka::message::{Header, OwnedHeaders};
use rdkafka::producer::{FutureProducer, FutureRecord};
use rdkafka::util::Timeout;
use std::time::Duration;

/// Header carrying the correlation id on every message.
pub const CORRELATION_ID_HEADER: &str = "correlation-id";
/// Header naming the queue a reply must go to.
pub const REPLY_TO_HEADER: &str = "reply-to";

/// Builder for the shared Kafka producer configuration.
///
/// # Example
///
/// ```no_run
/// use charges_redpanda::KafkaMessageBus;
/// use std::time::Duration;
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let bus = KafkaMessageBus::builder()
///     .brokers("localhost:9092")
///     .producer_acks("all")
///     .timeout(Duration::from_secs(5))
///     .build()?;
/// # Ok(())
/// # }
/// ```
#[derive(Default)]
pub struct KafkaProducerBuilder {
    brokers: Option<String>,
    producer_acks: Option<String>,
    compression: Option<String>,
    timeout: Option<Duration>,
}

impl KafkaProducerBuilder {
    /// Sets the comma-separated broker addresses.
    #[must_use]
    pub fn brokers(mut self, brokers: impl Into<String>) -> Self {
        self.brokers = Some(brokers.into());
        self
    }

    /// Sets the acknowledgment mode: "0", "1" or "all". Default: "1".
    #[must_use]
    pub fn producer_acks(mut self, acks: impl Into<String>) -> Self {
        self.producer_acks = Some(acks.into());
        self
    }

    /// Sets the compression codec. Default: "none".
    #[must_use]
    pub fn compression(mut self, compression: impl Into<String>) -> Self {
        self.compression = Some(compression.into());
        self
    }

    /// Sets the send timeout. Default: 5 seconds.
    #[must_use]
    pub const fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    fn build_producer(self) -> Result<(FutureProducer, Duration), ChargesError> {
        let brokers = self
            .brokers
            .ok_or(ChargesError::MissingArgument("brokers"))?;
        let producer = ClientConfig::new()
            .set("bootstrap.servers", &brokers)
            .set("acks", self.producer_acks.as_deref().unwrap_or("1"))
            .set(
                "compression.codec",
                self.compression.as_deref().unwrap_or("none"),
            )
            .set("message.timeout.ms", "30000")
            .create()
            .map_err(|e| ChargesError::Transport(e.to_string()))?;
        Ok((producer, self.timeout.unwrap_or(Duration::from_secs(5))))
    }

    /// Builds a [`KafkaMessageBus`].
    ///
    /// # Errors
    ///
    /// Returns [`ChargesError::MissingArgument`] when no brokers were set
    /// and [`ChargesError::Transport`] when the producer cannot be created.
    pub fn build(self) -> Result<KafkaMessageBus, ChargesError> {
        let (producer, timeout) = self.build_producer()?;
        Ok(KafkaMessageBus { producer, timeout })
    }
}

async fn send_with_headers(
    producer: &FutureProducer,
    timeout: Duration,
    topic: &str,
    payload: &[u8],
    headers: OwnedHeaders,
) -> Result<(), ChargesError> {
    let record: FutureRecord<'_, (), [u8]> =
        FutureRecord::to(topic).payload(payload).headers(headers);
    producer
        .send(record, Timeout::After(timeout))
        .await
        .map_err(|(e, _)| ChargesError::Transport(e.to_string()))?;
    Ok(())
}

fn correlation_headers(correlation_id: &CorrelationId) -> OwnedHeaders {
    OwnedHeaders::new().insert(Header {
        key: CORRELATION_ID_HEADER,
        value: Some(correlation_id.as_str().as_bytes()),
    })
}

/// Kafka-backed message bus for outcome-event publication.
pub struct KafkaMessageBus {
    producer: FutureProducer,
    timeout: Duration,
}

impl KafkaMessageBus {
    /// Creates a bus with default configuration.
    ///
    /// # Errors
    ///
    /// Returns [`ChargesError::Transport`] when the producer cannot be
    /// created.
    pub fn new(brokers: &str) -> Result<Self, ChargesError> {
        Self::builder().brokers(brokers).build()
    }

    /// Creates a builder for custom configuration.
    #[must_use]
    pub fn builder() -> KafkaProducerBuilder {
        KafkaProducerBuilder::default()
    }
}

#[async_trait]
impl MessageBus for KafkaMessageBus {
    async fn publish(
        &self,
        topic: &str,
        payload: &[u8],
        correlation_id: &CorrelationId,
    ) -> Result<(), ChargesError> {
        send_with_headers(
            &self.producer,
            self.timeout,
            topic,
            payload,
            correlation_headers(correlation_id),
        )
        .await?;
        tracing::debug!(topic, correlation_id = %correlation_id, "event published");
        Ok(())
    }
}

/// Kafka-backed MessageHub notification client.
pub struct KafkaMessageHubClient {
    producer: FutureProducer,
    topic: String,
    timeout: Duration,
}

impl KafkaMessageHubClient {
    /// Creates a client publishing notifications to `topic`.
    ///
    /// # Errors
    ///
    /// Returns [`ChargesError::MissingArgument`] or
    /// [`ChargesError::Transport`] when the producer cannot be created.
    pub fn new(builder: KafkaProducerBuilder, topic: impl Into<String>) -> Result<Self, ChargesError> {
        let (producer, timeout) = builder.build_producer()?;
        Ok(Self {
            producer,
            topic: topic.into(),
            timeout,
        })
    }
}

#[async_trait]
impl MessageHubClient for KafkaMessageHubClient {
    async fn notify(
        &self,
        correlation_id: &CorrelationId,
        notification: &Notification,
    ) -> Result<(), ChargesError> {
        let payload = serde_json::to_vec(notification)
            .map_err(|e| ChargesError::Serialization(e.to_string()))?;
        send_with_headers(
            &self.producer,
            self.timeout,
            &self.topic,
            &payload,
            correlation_headers(correlation_id),
        )
        .await?;
        tracing::debug!(
            reference_id = %notification.id,
            message_type = %notification.message_type,
            "message hub notified"
        );
        Ok(())
    }
}

/// Kafka-backed sender for the default charge-link request protocol.
///
/// Sends exactly once per call: argument validation happens before any
/// transport interaction, and there is no internal retry — a resend is not
/// guaranteed idempotent on the receiver.
pub struct KafkaDefaultChargeLinkRequester {
    producer: FutureProducer,
    request_topic: String,
    reply_topic: String,
    timeout: Duration,
}

impl KafkaDefaultChargeLinkRequester {
    /// Creates a requester over the given queue pair.
    ///
    /// # Errors
    ///
    /// Returns [`ChargesError::MissingArgument`] or
    /// [`ChargesError::Transport`] when the producer cannot be created.
    pub fn new(
        builder: KafkaProducerBuilder,
        request_topic: impl Into<String>,
        reply_topic: impl Into<String>,
    ) -> Result<Self, ChargesError> {
        let (producer, timeout) = builder.build_producer()?;
        Ok(Self {
            producer,
            request_topic: request_topic.into(),
            reply_topic: reply_topic.into(),
            timeout,
        })
    }
}

#[async_trait]
impl DefaultChargeLinkRequester for KafkaDefaultChargeLinkRequester {
    async fn request_default_links(
        &self,
        request: &CreateDefaultChargeLinksRequest,
        correlation_id: &CorrelationId,
    ) -> Result<(), ChargesError> {
        if request.metering_point_id.is_empty() {
            return Err(ChargesError::MissingArgument("metering_point_id"));
        }
        if correlation_id.is_empty() {
            return Err(ChargesError::MissingArgument("correlation_id"));
        }

        let payload = serde_json::to_vec(request)
            .map_err(|e| ChargesError::Serialization(e.to_string()))?;
        let headers = correlation_headers(correlation_id).insert(Header {
            key: REPLY_TO_HEADER,
            value: Some(self.reply_topic.as_bytes()),
        });
        send_with_headers(
            &self.producer,
            self.timeout,
            &self.request_topic,
            &payload,
            headers,
        )
        .await?;
        tracing::debug!(
            metering_point_id = %request.metering_point_id,
            correlation_id = %correlation_id,
            "default charge link request sent"
        );
        Ok(())
    }
}

/// Kafka-backed peek reply sender.
pub struct KafkaBundleReplySender {
    producer: FutureProducer,
    reply_topic: String,
    timeout: Duration,
}

impl KafkaBundleReplySender {
    /// Creates a sender replying on `reply_topic`.
    ///
    /// # Errors
    ///
    /// Returns [`ChargesError::MissingArgument`] or
    /// [`ChargesError::Transport`] when the producer cannot be created.
    pub fn new(
        builder: KafkaProducerBuilder,
        reply_topic: impl Into<String>,
    ) -> Result<Self, ChargesError> {
        let (producer, timeout) = builder.build_producer()?;
        Ok(Self {
            producer,
            reply_topic: reply_topic.into(),
            timeout,
        })
    }
}

#[async_trait]
impl BundleReplySender for KafkaBundleReplySender {
    async fn send_reply(
        &self,
        request: &BundleRequest,
        bundle: Vec<u8>,
    ) -> Result<(), ChargesError> {
        let idempotency_id = request.idempotency_id.to_string();
        let headers = OwnedHeaders::new().insert(Header {
            key: "idempotency-id",
            value: Some(idempotency_id.as_bytes()),
        });
        send_with_headers(
            &self.producer,
            self.timeout,
            &self.reply_topic,
            &bundle,
            headers,
        )
        .await?;
        tracing::debug!(
            idempotency_id = %request.idempotency_id,
            bytes = bundle.len(),
            "bundle reply sent"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use charges_core::ids::MeteringPointId;

    fn requester() -> KafkaDefaultChargeLinkRequester {
        // A producer can be constructed without a live broker; sends would
        // time out, but argument validation happens first.
        KafkaDefaultChargeLinkRequester::new(
            KafkaMessageBus::builder().brokers("localhost:9092"),
            "create-link-request",
            "create-link-reply",
        )
        .unwrap()
    }

    #[tokio::test]
    async fn blank_metering_point_id_fails_before_any_send() {
        let request = CreateDefaultChargeLinksRequest {
            metering_point_id: MeteringPointId::new(String::new()),
        };
        let result = requester()
            .request_default_links(&request, &CorrelationId::new("corr-1".to_string()))
            .await;
        assert!(matches!(result, Err(ChargesError::MissingArgument("metering_point_id"))));
    }

    #[tokio::test]
    async fn blank_correlation_id_fails_before_any_send() {
        let request = CreateDefaultChargeLinksRequest {
            metering_point_id: MeteringPointId::new("571313180000000005".to_string()),
        };
        let result = requester()
            .request_default_links(&request, &CorrelationId::new(String::new()))
            .await;
        assert!(matches!(result, Err(ChargesError::MissingArgument("correlation_id"))));
    }
}
