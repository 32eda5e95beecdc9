use std::sync::Arc;

use serde_json::json;
use stepwise_core::{
    Backend, ChangeFilter, ChangeKind, MemoryBackend, OnlineStatus, OperationType, SessionBuilder,
};
use tempfile::TempDir;

#[tokio::test]
async fn test_queue_persists_across_sessions() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let path = temp_dir.path().join("drafts.db");
    let backend = Arc::new(MemoryBackend::new());

    let session = SessionBuilder::new()
        .with_store_path(Some(&path))
        .with_backend(Arc::clone(&backend) as Arc<dyn Backend>)
        .with_online_status(OnlineStatus::Offline)
        .build()
        .await
        .unwrap();
    session.update_field("firmName", json!("Offline Ltd")).await.unwrap();
    let saved = session.save().await;
    assert!(saved.success);
    assert!(saved.saved_locally);
    drop(session);

    let session = SessionBuilder::new()
        .with_store_path(Some(&path))
        .with_backend(Arc::clone(&backend) as Arc<dyn Backend>)
        .with_online_status(OnlineStatus::Online)
        .build()
        .await
        .unwrap();
    let pending = session.queue().pending();
    assert_eq!(pending.len(), 1);
    assert_eq!(pending[0].kind, OperationType::Save);

    let mut changes = backend.subscribe(ChangeFilter::all().kind(ChangeKind::Insert));
    let summary = session.sync_pending().await.unwrap();
    assert_eq!(summary.processed, 1);

    let event = changes.next().await.expect("insert event");
    assert_eq!(event.record.data["formData"]["firmName"], "Offline Ltd");
}

#[tokio::test]
async fn test_server_copy_wins_when_online() {
    let backend = Arc::new(MemoryBackend::new());
    let writer = SessionBuilder::new()
        .in_memory()
        .with_backend(Arc::clone(&backend) as Arc<dyn Backend>)
        .with_online_status(OnlineStatus::Online)
        .build()
        .await
        .unwrap();
    writer.update_field("firmName", json!("From server")).await.unwrap();
    assert!(writer.save().await.success);

    // A second device with no local draft picks up the server copy
    let reader = SessionBuilder::new()
        .in_memory()
        .with_backend(Arc::clone(&backend) as Arc<dyn Backend>)
        .with_online_status(OnlineStatus::Online)
        .build()
        .await
        .unwrap();
    let loaded = reader.resume().await;
    assert!(!loaded.from_local);
    assert_eq!(
        reader.wizard().lock().await.form_data().get_str("firmName"),
        Some("From server")
    );
}

#[tokio::test]
async fn test_unavailable_server_falls_back_to_local() {
    let backend = Arc::new(MemoryBackend::new());
    let session = SessionBuilder::new()
        .in_memory()
        .with_backend(Arc::clone(&backend) as Arc<dyn Backend>)
        .with_online_status(OnlineStatus::Online)
        .build()
        .await
        .unwrap();

    backend.set_available(false);
    let saved = session.save().await;
    assert!(saved.success);
    assert_eq!(saved.error.as_deref(), Some("Server save failed, saved locally"));
    assert_eq!(session.queue().len(), 1);

    let loaded = session.resume().await;
    assert!(loaded.from_local);
    assert!(loaded.data.is_some());
}
