//! Tests for the session module.

use std::time::Duration;

use serde_json::json;
use tempfile::TempDir;

use super::*;
use crate::{
    backend::MemoryBackend,
    models::{SaveStatus, StepDefinition},
};

/// Helper function to create a session backed by a temporary database
async fn create_test_session(dir: &TempDir) -> Session {
    SessionBuilder::new()
        .with_store_path(Some(dir.path().join("nested").join("drafts.db")))
        .build()
        .await
        .expect("Failed to create session")
}

#[tokio::test]
async fn test_builder_creates_store_directory() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let session = create_test_session(&temp_dir).await;

    let path = session.store_path().expect("file-backed session");
    assert!(path.exists());
    assert_eq!(session.registry().len(), StepRegistry::dfsa().len());
    assert_eq!(session.online_status(), OnlineStatus::Unknown);
}

#[tokio::test]
async fn test_rejects_empty_namespace() {
    let result = SessionBuilder::new().in_memory().with_namespace("  ").build().await;
    assert!(matches!(result, Err(WizardError::InvalidInput { .. })));
}

#[tokio::test]
async fn test_save_and_resume_across_sessions() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");

    {
        let session = create_test_session(&temp_dir).await;
        session
            .update_field("firmName", json!("Acme Capital"))
            .await
            .unwrap();
        let saved = session.save().await;
        assert!(saved.success);
        assert!(session.wizard().lock().await.last_saved().is_some());
    }

    let session = create_test_session(&temp_dir).await;
    let loaded = session.resume().await;
    assert!(loaded.from_local);
    assert!(loaded.data.is_some());

    let wizard = session.wizard();
    let wizard = wizard.lock().await;
    assert_eq!(wizard.form_data().get_str("firmName"), Some("Acme Capital"));
    assert_eq!(wizard.current_step_id(), Some("step-1-1"));
}

#[tokio::test]
async fn test_resume_without_draft_keeps_fresh_state() {
    let session = SessionBuilder::new().in_memory().build().await.unwrap();
    let loaded = session.resume().await;
    assert!(loaded.data.is_none());
    assert!(loaded.error.is_none());
    assert_eq!(session.draft_metadata().await.unwrap(), None);
}

#[tokio::test]
async fn test_namespaces_are_isolated() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let path = temp_dir.path().join("drafts.db");

    let first = SessionBuilder::new()
        .with_store_path(Some(&path))
        .with_namespace("app-one")
        .build()
        .await
        .unwrap();
    assert!(first.save().await.success);

    let second = SessionBuilder::new()
        .with_store_path(Some(&path))
        .with_namespace("app-two")
        .build()
        .await
        .unwrap();
    assert!(second.draft_metadata().await.unwrap().is_none());
    assert!(first.draft_metadata().await.unwrap().is_some());
}

#[tokio::test]
async fn test_offline_save_syncs_when_back_online() {
    let backend = Arc::new(MemoryBackend::new());
    let mut session = SessionBuilder::new()
        .in_memory()
        .with_backend(Arc::clone(&backend) as Arc<dyn Backend>)
        .with_online_status(OnlineStatus::Offline)
        .build()
        .await
        .unwrap();

    let saved = session.save().await;
    assert!(saved.success);
    assert_eq!(session.queue().len(), 1);
    assert_eq!(session.save_indicator(), SaveIndicator::Offline);

    // Nothing is replayed while offline
    assert_eq!(session.sync_pending().await.unwrap(), ProcessSummary::default());

    session.set_online_status(OnlineStatus::Online);
    let summary = session.sync_pending().await.unwrap();
    assert_eq!(summary.processed, 1);
    assert!(session.queue().is_empty());

    let record = backend
        .get("dfsa-fs-application-draft")
        .await
        .unwrap()
        .expect("draft synced");
    assert!(record.data.get("formData").is_some());
}

#[tokio::test]
async fn test_clear_draft_removes_draft_and_queue() {
    let session = SessionBuilder::new()
        .in_memory()
        .with_backend(Arc::new(MemoryBackend::new()))
        .with_online_status(OnlineStatus::Offline)
        .build()
        .await
        .unwrap();

    session.save().await;
    assert!(session.drafts().has_draft());

    session.clear_draft().await.unwrap();
    assert!(!session.drafts().has_draft());
    assert!(session.queue().is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_auto_save_reports_through_session() {
    let registry = StepRegistry::new(vec![StepDefinition::always("only", 1, "Only", "Only")], vec![])
        .unwrap();
    let mut session = SessionBuilder::new()
        .in_memory()
        .with_registry(registry)
        .with_auto_save_period(Duration::from_secs(10))
        .build()
        .await
        .unwrap();
    let mut status = session.subscribe_save_status();

    session.start_auto_save();
    tokio::time::sleep(Duration::from_secs(11)).await;
    status.wait_for(|s| s.status == SaveStatus::Saved).await.unwrap();

    assert_eq!(session.save_indicator(), SaveIndicator::Saved);
    assert_eq!(
        session.draft_metadata().await.unwrap().unwrap().current_step,
        "only"
    );
    session.stop_auto_save();
}

#[tokio::test]
async fn test_manual_save_updates_status() {
    let session = SessionBuilder::new().in_memory().build().await.unwrap();
    assert_eq!(session.save_indicator(), SaveIndicator::Idle);

    let result = session.save_now().await;
    assert!(result.success);
    assert_eq!(session.save_state().status, SaveStatus::Saved);
}
