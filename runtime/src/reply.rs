//! Reply reader for the default charge-link protocol.
//!
//! For every reply message, exactly one of the two injected continuations is
//! invoked — never both, never neither. Undeliverable or undecodable
//! replies route to the failure continuation with `Unspecified`.

use charges_core::ids::MeteringPointId;
use charges_core::links::{CreateDefaultChargeLinksReply, LinkErrorCode, ReplyHandler};
use std::sync::Arc;
use tracing::warn;

/// Transport-level delivery status tag accompanying raw reply bytes.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum DeliveryStatus {
    /// The reply arrived on the reply queue.
    Delivered,
    /// The transport gave up delivering the request or reply.
    DeadLettered,
}

/// Parses raw reply bytes and dispatches the matching continuation.
pub struct ReplyReader {
    handler: Arc<dyn ReplyHandler>,
}

impl ReplyReader {
    /// Creates a reader over the given continuations.
    #[must_use]
    pub fn new(handler: Arc<dyn ReplyHandler>) -> Self {
        Self { handler }
    }

    /// Processes one reply message.
    pub async fn read(&self, bytes: &[u8], status: DeliveryStatus) {
        if status == DeliveryStatus::DeadLettered {
            let metering_point_id = Self::recover_metering_point_id(bytes);
            warn!(metering_point_id = %metering_point_id, "default link reply dead-lettered");
            self.handler
                .on_failure(metering_point_id, LinkErrorCode::Unspecified)
                .await;
            return;
        }

        match serde_json::from_slice::<CreateDefaultChargeLinksReply>(bytes) {
            Ok(CreateDefaultChargeLinksReply::Succeeded {
                metering_point_id,
                did_create_links,
            }) => {
                self.handler
                    .on_success(metering_point_id, did_create_links)
                    .await;
            },
            Ok(CreateDefaultChargeLinksReply::Failed {
                metering_point_id,
                error_code,
            }) => {
                self.handler.on_failure(metering_point_id, error_code).await;
            },
            Err(e) => {
                warn!(error = %e, "undecodable default link reply");
                self.handler
                    .on_failure(
                        MeteringPointId::new(String::new()),
                        LinkErrorCode::Unspecified,
                    )
                    .await;
            },
        }
    }

    /// Best-effort extraction of the metering point id from a dead-lettered
    /// payload, so the failure continuation can still name its subject.
    fn recover_metering_point_id(bytes: &[u8]) -> MeteringPointId {
        serde_json::from_slice::<CreateDefaultChargeLinksReply>(bytes)
            .map(|reply| match reply {
                CreateDefaultChargeLinksReply::Succeeded {
                    metering_point_id, ..
                }
                | CreateDefaultChargeLinksReply::Failed {
                    metering_point_id, ..
                } => metering_point_id,
            })
            .unwrap_or_else(|_| MeteringPointId::new(String::new()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use charges_testing::RecordingReplyHandler;

    fn succeeded_bytes() -> Vec<u8> {
        serde_json::to_vec(&CreateDefaultChargeLinksReply::Succeeded {
            metering_point_id: MeteringPointId::new("mp-1".to_string()),
            did_create_links: true,
        })
        .unwrap()
    }

    #[tokio::test]
    async fn delivered_success_invokes_only_the_success_continuation() {
        let handler = Arc::new(RecordingReplyHandler::new());
        let reader = ReplyReader::new(handler.clone());
        reader.read(&succeeded_bytes(), DeliveryStatus::Delivered).await;
        assert_eq!(handler.successes().len(), 1);
        assert!(handler.failures().is_empty());
    }

    #[tokio::test]
    async fn delivered_failure_invokes_only_the_failure_continuation() {
        let bytes = serde_json::to_vec(&CreateDefaultChargeLinksReply::Failed {
            metering_point_id: MeteringPointId::new("mp-2".to_string()),
            error_code: LinkErrorCode::MeteringPointUnknown,
        })
        .unwrap();
        let handler = Arc::new(RecordingReplyHandler::new());
        let reader = ReplyReader::new(handler.clone());
        reader.read(&bytes, DeliveryStatus::Delivered).await;
        assert!(handler.successes().is_empty());
        assert_eq!(
            handler.failures(),
            vec![(
                MeteringPointId::new("mp-2".to_string()),
                LinkErrorCode::MeteringPointUnknown
            )]
        );
    }

    #[tokio::test]
    async fn undecodable_bytes_still_invoke_exactly_one_continuation() {
        let handler = Arc::new(RecordingReplyHandler::new());
        let reader = ReplyReader::new(handler.clone());
        reader.read(b"garbage", DeliveryStatus::Delivered).await;
        assert!(handler.successes().is_empty());
        assert_eq!(handler.failures().len(), 1);
        assert_eq!(handler.failures()[0].1, LinkErrorCode::Unspecified);
    }

    #[tokio::test]
    async fn dead_lettered_reply_routes_to_failure_with_recovered_id() {
        let handler = Arc::new(RecordingReplyHandler::new());
        let reader = ReplyReader::new(handler.clone());
        reader
            .read(&succeeded_bytes(), DeliveryStatus::DeadLettered)
            .await;
        assert!(handler.successes().is_empty());
        assert_eq!(
            handler.failures(),
            vec![(
                MeteringPointId::new("mp-1".to_string()),
                LinkErrorCode::Unspecified
            )]
        );
    }
}
