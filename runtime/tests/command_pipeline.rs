//! End-to-end pipeline tests over in-memory collaborators: one command in,
//! exactly one outcome event out, outbox dispatch behind it.

use charges_core::charge::{ChargeType, PricePoint, Resolution, VatClassification};
use charges_core::command::{
    BusinessReasonCode, ChargeCommand, ChargeOperation, Document,
};
use charges_core::correlation::CorrelationContext;
use charges_core::error::ChargesError;
use charges_core::events::{EventKind, OutcomeEvent};
use charges_core::ids::{ChargeId, CorrelationId, DocumentId, MarketParticipantId};
use charges_core::outbox::OutboxRepository;
use charges_core::participant::{MarketParticipant, MarketParticipantRef, MarketParticipantRole};
use charges_core::repository::DomainWrite;
use charges_core::validation::document::DocumentValidationRulesFactory;
use charges_core::validation::input::{StartDateWindow, ValidationConfig};
use charges_runtime::{
    ChargeCommandHandler, CommandIngestion, DispatcherConfig, IngestionError, OutboxDispatcher,
};
use charges_testing::{
    FixedClock, InMemoryCommandPersistence, InMemoryMarketParticipantRepository,
    InMemoryOutboxRepository, RecordingMessageBus, SequenceIdProvider,
};
use chrono::{TimeZone, Utc};
use chrono_tz::Europe::Copenhagen;
use std::sync::Arc;
use std::time::Duration;

fn sender() -> MarketParticipant {
    MarketParticipant::new(
        MarketParticipantId::new("5790000000001".to_string()),
        MarketParticipantRole::GridAccessProvider,
        true,
    )
}

fn document() -> Document {
    Document {
        id: DocumentId::new("doc-1".to_string()),
        sender: MarketParticipantRef::new(sender().id, MarketParticipantRole::GridAccessProvider),
        recipient: MarketParticipantRef::new(
            MarketParticipantId::new("5790000000002".to_string()),
            MarketParticipantRole::MeteringPointAdministrator,
        ),
        business_reason_code: BusinessReasonCode::UpdateChargeInformation,
        created_at: Utc.with_ymd_and_hms(2020, 5, 8, 10, 0, 0).unwrap(),
        request_date: Utc.with_ymd_and_hms(2020, 5, 8, 10, 0, 0).unwrap(),
    }
}

fn fee_operation(charge_id: &str) -> ChargeOperation {
    ChargeOperation {
        operation_id: "op-1".to_string(),
        charge_id: ChargeId::new(charge_id.to_string()),
        owner: MarketParticipantRef::new(sender().id, MarketParticipantRole::GridAccessProvider),
        charge_type: ChargeType::Fee,
        name: "Connection fee".to_string(),
        description: "One-off connection fee".to_string(),
        resolution: Resolution::Monthly,
        tax_indicator: false,
        transparent_invoicing: true,
        vat_classification: VatClassification::Vat25,
        start_date: Utc.with_ymd_and_hms(2020, 5, 8, 22, 0, 0).unwrap(),
        end_date: None,
        points: vec![PricePoint::new(
            Utc.with_ymd_and_hms(2020, 5, 8, 22, 0, 0).unwrap(),
            125.50,
        )],
    }
}

fn command(charge_id: &str) -> ChargeCommand {
    ChargeCommand {
        document: document(),
        operations: vec![fee_operation(charge_id)],
    }
}

struct Pipeline {
    handler: ChargeCommandHandler,
    outbox: Arc<InMemoryOutboxRepository>,
    persistence: Arc<InMemoryCommandPersistence>,
}

fn pipeline(participants: Vec<MarketParticipant>) -> Pipeline {
    let outbox = Arc::new(InMemoryOutboxRepository::new());
    let persistence = Arc::new(InMemoryCommandPersistence::new(outbox.clone()));
    let clock = Arc::new(FixedClock::new(
        Utc.with_ymd_and_hms(2020, 5, 8, 10, 0, 0).unwrap(),
    ));
    let handler = ChargeCommandHandler::new(
        ValidationConfig {
            start_date_window: StartDateWindow::new(3, 1, Copenhagen),
        },
        DocumentValidationRulesFactory::new(Arc::new(
            InMemoryMarketParticipantRepository::with_participants(participants),
        )),
        persistence.clone(),
        clock,
        Arc::new(SequenceIdProvider::new()),
    );
    Pipeline {
        handler,
        outbox,
        persistence,
    }
}

#[tokio::test]
async fn valid_command_yields_exactly_one_accepted_event() {
    let pipeline = pipeline(vec![sender()]);
    let correlation_id = CorrelationId::new("corr-1".to_string());

    let event = pipeline
        .handler
        .handle(command("FEE-A"), &correlation_id)
        .await
        .unwrap();

    assert_eq!(event.kind(), EventKind::ChargeCommandAccepted);
    assert_eq!(event.correlation_id(), &correlation_id);
    // One domain write, one outbox row.
    let writes = pipeline.persistence.writes();
    assert_eq!(writes.len(), 1);
    assert!(matches!(&writes[0], DomainWrite::Charges(charges) if charges.len() == 1));
    let rows = pipeline.outbox.rows();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].event_type, "ChargeCommandAccepted.v1");
}

#[tokio::test]
async fn missing_charge_id_yields_one_rejected_event_with_stable_code() {
    let pipeline = pipeline(vec![sender()]);
    let correlation_id = CorrelationId::new("corr-2".to_string());

    let event = pipeline
        .handler
        .handle(command(""), &correlation_id)
        .await
        .unwrap();

    let OutcomeEvent::ChargeCommandRejected { reasons, .. } = &event else {
        panic!("expected rejection, got {event:?}");
    };
    // VR223 is the stable code for "charge id required".
    assert!(reasons.contains(&"VR223".to_string()));
    // No domain write happened, only the outcome row.
    let writes = pipeline.persistence.writes();
    assert_eq!(writes.len(), 1);
    assert!(matches!(writes[0], DomainWrite::None));
    assert_eq!(pipeline.outbox.rows().len(), 1);
    assert_eq!(
        pipeline.outbox.rows()[0].event_type,
        "ChargeCommandRejected.v1"
    );
}

#[tokio::test]
async fn unknown_sender_yields_document_rule_rejection() {
    // Repository knows nobody.
    let pipeline = pipeline(Vec::new());
    let event = pipeline
        .handler
        .handle(command("FEE-A"), &CorrelationId::new("corr-3".to_string()))
        .await
        .unwrap();
    let OutcomeEvent::ChargeCommandRejected { reasons, .. } = &event else {
        panic!("expected rejection, got {event:?}");
    };
    assert_eq!(reasons, &vec!["VR150".to_string()]);
}

#[tokio::test]
async fn infrastructure_failure_propagates_instead_of_rejecting() {
    let pipeline = pipeline(vec![sender()]);
    pipeline.persistence.fail_next_with("connection reset");

    let result = pipeline
        .handler
        .handle(command("FEE-A"), &CorrelationId::new("corr-4".to_string()))
        .await;

    assert!(matches!(result, Err(ChargesError::Store(_))));
    // The attempt produced no event at all; the host will redeliver.
    assert!(pipeline.outbox.rows().is_empty());
}

#[tokio::test]
async fn dispatcher_publishes_claimed_rows_and_marks_them() {
    let pipeline = pipeline(vec![sender()]);
    let correlation_id = CorrelationId::new("corr-5".to_string());
    pipeline
        .handler
        .handle(command("FEE-A"), &correlation_id)
        .await
        .unwrap();

    let bus = Arc::new(RecordingMessageBus::new());
    let dispatcher = OutboxDispatcher::new(
        pipeline.outbox.clone(),
        bus.clone(),
        DispatcherConfig::default(),
    );

    let dispatched = dispatcher.dispatch_batch().await.unwrap();
    assert_eq!(dispatched, 1);
    assert!(pipeline.outbox.pending().is_empty());

    let published = bus.published();
    assert_eq!(published.len(), 1);
    assert_eq!(published[0].topic, "charge-command-accepted");
    assert_eq!(published[0].correlation_id, correlation_id);
    // The payload round-trips to the original event.
    let event = OutcomeEvent::from_payload(&published[0].payload).unwrap();
    assert_eq!(event.kind(), EventKind::ChargeCommandAccepted);
}

#[tokio::test]
async fn failed_publish_leaves_the_row_pending() {
    let pipeline = pipeline(vec![sender()]);
    pipeline
        .handler
        .handle(command("FEE-A"), &CorrelationId::new("corr-6".to_string()))
        .await
        .unwrap();

    let bus = Arc::new(RecordingMessageBus::new());
    bus.fail_publishes();
    let dispatcher = OutboxDispatcher::new(
        pipeline.outbox.clone(),
        bus,
        DispatcherConfig::default(),
    );

    assert!(matches!(
        dispatcher.dispatch_batch().await,
        Err(ChargesError::Transport(_))
    ));
    // Not marked dispatched; the lease will lapse and the row be retried.
    assert_eq!(pipeline.outbox.pending().len(), 1);
}

#[tokio::test]
async fn ingestion_records_a_received_event_before_validation() {
    let pipeline = pipeline(vec![sender()]);
    let ingestion = CommandIngestion::new(
        pipeline.persistence.clone(),
        Arc::new(FixedClock::new(
            Utc.with_ymd_and_hms(2020, 5, 8, 10, 0, 0).unwrap(),
        )),
        Arc::new(SequenceIdProvider::new()),
    );
    let context = CorrelationContext::with_id(CorrelationId::new("corr-8".to_string()));

    let bytes = serde_json::to_vec(&command("FEE-A")).unwrap();
    let decoded = ingestion.ingest_charge(&bytes, &context).await.unwrap();
    assert_eq!(decoded, command("FEE-A"));
    let rows = pipeline.outbox.rows();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].event_type, "ChargeCommandReceived.v1");
}

#[tokio::test]
async fn decode_failure_takes_a_distinct_path_and_records_nothing() {
    let pipeline = pipeline(vec![sender()]);
    let ingestion = CommandIngestion::new(
        pipeline.persistence.clone(),
        Arc::new(FixedClock::new(
            Utc.with_ymd_and_hms(2020, 5, 8, 10, 0, 0).unwrap(),
        )),
        Arc::new(SequenceIdProvider::new()),
    );
    let context = CorrelationContext::with_id(CorrelationId::new("corr-9".to_string()));

    let result = ingestion.ingest_charge(b"not a command", &context).await;
    assert!(matches!(result, Err(IngestionError::Decode(_))));
    // No received event, no outcome event: the rule engine never ran.
    assert!(pipeline.outbox.rows().is_empty());
    assert!(pipeline.persistence.writes().is_empty());
}

#[tokio::test]
async fn claimed_rows_are_shielded_from_a_second_dispatcher() {
    let pipeline = pipeline(vec![sender()]);
    pipeline
        .handler
        .handle(command("FEE-A"), &CorrelationId::new("corr-7".to_string()))
        .await
        .unwrap();

    let first = pipeline
        .outbox
        .claim_batch(10, Duration::from_secs(30))
        .await
        .unwrap();
    assert_eq!(first.len(), 1);

    // A concurrent dispatcher claims nothing while the lease holds.
    let second = pipeline
        .outbox
        .claim_batch(10, Duration::from_secs(30))
        .await
        .unwrap();
    assert!(second.is_empty());
}
