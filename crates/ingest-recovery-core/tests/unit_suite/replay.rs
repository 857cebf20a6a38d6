//! Backup replay engine tests.
//!
//! Covers:
//! - Age based dropping
//! - Bounded resend with per-attempt error notification
//! - Topic availability backpressure
//! - Unknown topics and store cleanup

use std::sync::Arc;

use ingest_recovery_core::{
    BackupReplayEngine, DeliveryError, InMemoryTopicDirectory, MemoryMessageStore, MessageStore,
    RecoveryMetrics, ReplayOptions, SqliteMessageStore, TopicName,
};

use super::helpers::{
    init_tracing, message_of_age, replay_options, topic, topic_name, RecordingListener,
    ScriptedSender, SendBehaviour,
};

fn engine(
    options: ReplayOptions,
    sender: &Arc<ScriptedSender>,
    listener: &Arc<RecordingListener>,
) -> BackupReplayEngine {
    BackupReplayEngine::new(
        options,
        sender.clone(),
        Arc::new(InMemoryTopicDirectory::with_topics([topic()])),
        listener.clone(),
    )
}

// ============================================================================
// Sending and resending
// ============================================================================

#[tokio::test]
async fn sends_fresh_message_once_when_producer_succeeds() {
    let sender = Arc::new(ScriptedSender::new(SendBehaviour::AlwaysSucceed));
    let listener = Arc::new(RecordingListener::default());
    let store = MemoryMessageStore::new();
    store.save(&message_of_age("m1", 1), &topic_name()).await.unwrap();

    let report = engine(replay_options(8, 2), &sender, &listener)
        .load_messages(&store)
        .await
        .unwrap();

    assert_eq!(sender.send_count(), 1);
    assert_eq!(listener.count(), 0);
    assert_eq!(report.sent, 1);
}

#[tokio::test]
async fn resends_until_retry_budget_is_exhausted() {
    init_tracing();
    let sender = Arc::new(ScriptedSender::new(SendBehaviour::AlwaysFail));
    let listener = Arc::new(RecordingListener::default());
    let store = MemoryMessageStore::new();
    store.save(&message_of_age("m1", 1), &topic_name()).await.unwrap();

    let report = engine(replay_options(8, 1), &sender, &listener)
        .load_messages(&store)
        .await
        .unwrap();

    // One initial attempt plus one retry, each reported once
    assert_eq!(sender.send_count(), 2);
    assert_eq!(listener.count(), 2);
    assert_eq!(report.retries_exhausted, 1);
    assert_eq!(store.count().await.unwrap(), 0);

    for (id, topic, error) in listener.errors.lock().iter() {
        assert_eq!(id, "m1");
        assert_eq!(topic, &topic_name());
        assert_eq!(error, &DeliveryError::Broker("test".to_string()));
    }
}

#[tokio::test]
async fn zero_retries_means_a_single_attempt() {
    let sender = Arc::new(ScriptedSender::new(SendBehaviour::AlwaysFail));
    let listener = Arc::new(RecordingListener::default());
    let store = MemoryMessageStore::new();
    store.save(&message_of_age("m1", 1), &topic_name()).await.unwrap();

    engine(replay_options(8, 0), &sender, &listener)
        .load_messages(&store)
        .await
        .unwrap();

    assert_eq!(sender.send_count(), 1);
    assert_eq!(listener.count(), 1);
}

#[tokio::test]
async fn stops_resending_after_first_success() {
    let sender = Arc::new(ScriptedSender::new(SendBehaviour::FailFirst(2)));
    let listener = Arc::new(RecordingListener::default());
    let store = MemoryMessageStore::new();
    store.save(&message_of_age("m1", 1), &topic_name()).await.unwrap();

    let report = engine(replay_options(8, 5), &sender, &listener)
        .load_messages(&store)
        .await
        .unwrap();

    assert_eq!(sender.send_count(), 3);
    assert_eq!(listener.count(), 2);
    assert_eq!(report.sent, 1);
    assert_eq!(report.send_attempts, 3);
}

#[tokio::test]
async fn failed_message_does_not_stop_the_others() {
    // Only the first send fails, and there is no retry budget
    let sender = Arc::new(ScriptedSender::new(SendBehaviour::FailFirst(1)));
    let listener = Arc::new(RecordingListener::default());
    let store = MemoryMessageStore::new();
    for id in ["m1", "m2", "m3"] {
        store.save(&message_of_age(id, 1), &topic_name()).await.unwrap();
    }

    let report = engine(replay_options(8, 0), &sender, &listener)
        .load_messages(&store)
        .await
        .unwrap();

    assert_eq!(report.retries_exhausted, 1);
    assert_eq!(report.sent, 2);
    assert_eq!(*sender.sent_ids.lock(), vec!["m1", "m2", "m3"]);
}

// ============================================================================
// Message age
// ============================================================================

#[tokio::test]
async fn does_not_send_old_messages() {
    let sender = Arc::new(ScriptedSender::new(SendBehaviour::AlwaysSucceed));
    let listener = Arc::new(RecordingListener::default());
    let store = MemoryMessageStore::new();
    store.save(&message_of_age("fresh", 1), &topic_name()).await.unwrap();
    store.save(&message_of_age("old-1", 10), &topic_name()).await.unwrap();
    store.save(&message_of_age("old-2", 10), &topic_name()).await.unwrap();

    let report = engine(replay_options(8, 2), &sender, &listener)
        .load_messages(&store)
        .await
        .unwrap();

    assert_eq!(sender.send_count(), 1);
    assert_eq!(*sender.sent_ids.lock(), vec!["fresh"]);
    assert_eq!(report.stale, 2);
    // Stale drops are not delivery errors
    assert_eq!(listener.count(), 0);
    assert_eq!(store.count().await.unwrap(), 0);
}

// ============================================================================
// Topic availability
// ============================================================================

#[tokio::test]
async fn sends_only_when_topic_is_available() {
    let sender = Arc::new(
        ScriptedSender::new(SendBehaviour::AlwaysSucceed).with_availability([false, false, true]),
    );
    let listener = Arc::new(RecordingListener::default());
    let store = MemoryMessageStore::new();
    store.save(&message_of_age("m1", 1), &topic_name()).await.unwrap();

    engine(replay_options(10, 5), &sender, &listener)
        .load_messages(&store)
        .await
        .unwrap();

    assert_eq!(sender.availability_check_count(), 3);
    assert_eq!(sender.send_count(), 1);
}

#[tokio::test]
async fn unavailable_topic_consumes_attempts_without_sending() {
    let sender = Arc::new(ScriptedSender::new(SendBehaviour::AlwaysSucceed).unavailable());
    let listener = Arc::new(RecordingListener::default());
    let store = MemoryMessageStore::new();
    store.save(&message_of_age("m1", 1), &topic_name()).await.unwrap();

    let options = ReplayOptions {
        topic_availability_max_polls: 4,
        ..replay_options(8, 2)
    };
    let report = engine(options, &sender, &listener)
        .load_messages(&store)
        .await
        .unwrap();

    // Three attempts, each bounded at four polls
    assert_eq!(sender.availability_check_count(), 12);
    assert_eq!(sender.send_count(), 0);
    assert_eq!(report.retries_exhausted, 1);
    assert_eq!(listener.count(), 0);
}

// ============================================================================
// Topic resolution and store handling
// ============================================================================

#[tokio::test]
async fn drops_and_reports_messages_for_unknown_topics() {
    let sender = Arc::new(ScriptedSender::new(SendBehaviour::AlwaysSucceed));
    let listener = Arc::new(RecordingListener::default());
    let store = MemoryMessageStore::new();
    let unknown = TopicName::new("pl.allegro", "unknown");
    store.save(&message_of_age("m1", 1), &unknown).await.unwrap();

    let report = engine(replay_options(8, 2), &sender, &listener)
        .load_messages(&store)
        .await
        .unwrap();

    assert_eq!(sender.send_count(), 0);
    assert_eq!(report.topic_not_found, 1);

    let errors = listener.errors.lock();
    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0].1, unknown);
    assert_eq!(
        errors[0].2,
        DeliveryError::TopicNotFound("pl.allegro.unknown".to_string())
    );
}

#[tokio::test]
async fn replays_in_storage_order_and_empties_the_store() {
    init_tracing();
    let temp_dir = tempfile::TempDir::new().unwrap();
    let store = SqliteMessageStore::new(temp_dir.path().join("messages.db"))
        .await
        .unwrap();
    for i in 0..5 {
        store
            .save(&message_of_age(&format!("m{}", i), 1), &topic_name())
            .await
            .unwrap();
    }

    let sender = Arc::new(ScriptedSender::new(SendBehaviour::AlwaysSucceed));
    let listener = Arc::new(RecordingListener::default());
    let metrics = Arc::new(RecoveryMetrics::new());

    let report = engine(replay_options(8, 2), &sender, &listener)
        .with_metrics(metrics.clone())
        .load_messages(&store)
        .await
        .unwrap();

    assert_eq!(report.loaded, 5);
    assert_eq!(*sender.sent_ids.lock(), vec!["m0", "m1", "m2", "m3", "m4"]);
    assert_eq!(store.count().await.unwrap(), 0);
    assert!(metrics
        .encode()
        .contains("ingest_backup_messages_resent_total{topic=\"pl.allegro.tech.hermes.test\"} 5"));
}

#[tokio::test]
async fn waits_for_topic_directory_before_loading() {
    let directory = Arc::new(InMemoryTopicDirectory::new());
    let sender = Arc::new(ScriptedSender::new(SendBehaviour::AlwaysSucceed));
    let store = MemoryMessageStore::new();
    store.save(&message_of_age("m1", 1), &topic_name()).await.unwrap();

    let engine = BackupReplayEngine::new(
        replay_options(8, 0),
        sender.clone(),
        directory.clone(),
        Arc::new(RecordingListener::default()),
    );

    // Populate the directory shortly after replay starts
    let feeder = {
        let directory = directory.clone();
        tokio::spawn(async move {
            tokio::time::sleep(std::time::Duration::from_millis(50)).await;
            directory.add_topic(topic());
            directory.mark_ready();
        })
    };

    let report = engine.load_messages(&store).await.unwrap();
    feeder.await.unwrap();

    assert_eq!(report.sent, 1);
    assert_eq!(sender.send_count(), 1);
}
