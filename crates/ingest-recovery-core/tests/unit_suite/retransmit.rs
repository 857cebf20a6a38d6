//! Offset retransmitter tests.
//!
//! Covers fan-out order, error wrapping and the storage-backed indicator.

use parking_lot::Mutex;
use std::sync::Arc;

use ingest_recovery_core::{
    Error, MemoryOffsetBackend, OffsetBackend, OffsetChangeIndicator, OffsetRetransmitter,
    PartitionOffset, RecoveryMetrics, StorageOffsetChangeIndicator, SubscriptionName,
};
use ingest_recovery_core::storage::MemoryBackend;

use super::helpers::{init_tracing, MoveRecord, RecordingBackend, StaticIndicator};

fn subscription() -> SubscriptionName {
    SubscriptionName::from_string("pl.allegro.tech.hermes.test$sub-A").unwrap()
}

fn two_partitions() -> Vec<PartitionOffset> {
    vec![
        PartitionOffset::new("pl.allegro.tech.hermes.test", 0, 100),
        PartitionOffset::new("pl.allegro.tech.hermes.test", 1, 250),
    ]
}

#[tokio::test]
async fn moves_every_partition_in_every_backend() {
    let log: Arc<Mutex<Vec<MoveRecord>>> = Arc::default();
    let indicator = Arc::new(StaticIndicator::returning(two_partitions()));
    let retransmitter = OffsetRetransmitter::new(
        indicator.clone(),
        vec![
            Arc::new(RecordingBackend::new("a", log.clone())),
            Arc::new(RecordingBackend::new("b", log.clone())),
        ],
        "primary-dc",
    );

    let report = retransmitter.reload_offsets(&subscription()).await.unwrap();

    assert_eq!(report.partitions, 2);
    assert_eq!(report.writes, 4);
    // Partitions outer, backends inner
    assert_eq!(
        *log.lock(),
        vec![
            ("a".to_string(), 0, 100),
            ("b".to_string(), 0, 100),
            ("a".to_string(), 1, 250),
            ("b".to_string(), 1, 250),
        ]
    );
    assert_eq!(
        *indicator.calls.lock(),
        vec![(
            "pl.allegro.tech.hermes.test".to_string(),
            "sub-A".to_string(),
            "primary-dc".to_string()
        )]
    );
}

#[tokio::test]
async fn indicator_failure_is_wrapped_and_nothing_is_written() {
    let log: Arc<Mutex<Vec<MoveRecord>>> = Arc::default();
    let retransmitter = OffsetRetransmitter::new(
        Arc::new(StaticIndicator::failing()),
        vec![
            Arc::new(RecordingBackend::new("a", log.clone())),
            Arc::new(RecordingBackend::new("b", log.clone())),
        ],
        "primary-dc",
    );

    let err = retransmitter.reload_offsets(&subscription()).await.unwrap_err();

    match &err {
        Error::Retransmission { subscription, source } => {
            assert_eq!(subscription, "pl.allegro.tech.hermes.test$sub-A");
            assert!(source.to_string().contains("indicator unreachable"));
        }
        other => panic!("expected retransmission error, got {:?}", other),
    }
    assert!(log.lock().is_empty());
}

#[tokio::test]
async fn backend_failure_stops_the_run_without_rollback() {
    init_tracing();
    let log: Arc<Mutex<Vec<MoveRecord>>> = Arc::default();
    let metrics = Arc::new(RecoveryMetrics::new());
    let retransmitter = OffsetRetransmitter::new(
        Arc::new(StaticIndicator::returning(two_partitions())),
        vec![
            Arc::new(RecordingBackend::new("a", log.clone())),
            Arc::new(RecordingBackend::new("b", log.clone()).failing_on(1)),
        ],
        "primary-dc",
    )
    .with_metrics(metrics.clone());

    let err = retransmitter.reload_offsets(&subscription()).await.unwrap_err();

    assert!(matches!(err, Error::Retransmission { .. }));
    assert!(err.to_string().contains("b is read-only"));
    // Partition 0 fully applied, partition 1 only reached backend a
    assert_eq!(
        *log.lock(),
        vec![
            ("a".to_string(), 0, 100),
            ("b".to_string(), 0, 100),
            ("a".to_string(), 1, 250),
        ]
    );
    assert!(metrics.encode().contains("status=\"failure\""));
}

#[tokio::test]
async fn empty_indicator_writes_nothing() {
    let log: Arc<Mutex<Vec<MoveRecord>>> = Arc::default();
    let retransmitter = OffsetRetransmitter::new(
        Arc::new(StaticIndicator::returning(Vec::new())),
        vec![Arc::new(RecordingBackend::new("a", log.clone()))],
        "primary-dc",
    );

    let report = retransmitter.reload_offsets(&subscription()).await.unwrap();

    assert_eq!(report.writes, 0);
    assert!(log.lock().is_empty());
}

#[tokio::test]
async fn requested_offsets_reach_memory_backends() {
    let indicator = Arc::new(StorageOffsetChangeIndicator::new(Arc::new(
        MemoryBackend::new(),
    )));
    let subscription = subscription();
    for offset in two_partitions() {
        indicator
            .set_subscription_offset(
                subscription.topic_name(),
                subscription.name(),
                "primary-dc",
                &offset,
            )
            .await
            .unwrap();
    }

    let first = Arc::new(MemoryOffsetBackend::new());
    let second = Arc::new(MemoryOffsetBackend::new());
    let backends: Vec<Arc<dyn OffsetBackend>> = vec![first.clone(), second.clone()];
    let retransmitter = OffsetRetransmitter::new(indicator, backends, "primary-dc");

    retransmitter.reload_offsets(&subscription).await.unwrap();

    for backend in [&first, &second] {
        let offsets = backend.get_subscription_offsets(&subscription).await.unwrap();
        let values: Vec<(i32, i64)> = offsets.iter().map(|o| (o.partition, o.offset)).collect();
        assert_eq!(values, vec![(0, 100), (1, 250)]);
    }

    // Re-running applies the same values again
    retransmitter.reload_offsets(&subscription).await.unwrap();
    assert_eq!(first.len(), 2);
}

#[tokio::test]
async fn other_clusters_are_not_read() {
    let indicator = Arc::new(StorageOffsetChangeIndicator::new(Arc::new(
        MemoryBackend::new(),
    )));
    let subscription = subscription();
    indicator
        .set_subscription_offset(
            subscription.topic_name(),
            subscription.name(),
            "secondary-dc",
            &PartitionOffset::new("pl.allegro.tech.hermes.test", 0, 5),
        )
        .await
        .unwrap();

    let backend = Arc::new(MemoryOffsetBackend::new());
    let backends: Vec<Arc<dyn OffsetBackend>> = vec![backend.clone()];
    let report = OffsetRetransmitter::new(indicator, backends, "primary-dc")
        .reload_offsets(&subscription)
        .await
        .unwrap();

    assert_eq!(report.partitions, 0);
    assert!(backend.is_empty());
}
