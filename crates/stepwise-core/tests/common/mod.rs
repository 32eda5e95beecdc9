use serde_json::{json, Value};
use stepwise_core::{Session, SessionBuilder};
use tempfile::TempDir;

/// Helper function to create a session backed by a temporary database
pub async fn create_test_session() -> (TempDir, Session) {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let session = open_session(&temp_dir).await;
    (temp_dir, session)
}

/// Opens another session on the database in `temp_dir`.
pub async fn open_session(temp_dir: &TempDir) -> Session {
    SessionBuilder::new()
        .with_store_path(Some(temp_dir.path().join("drafts.db")))
        .build()
        .await
        .expect("Failed to create session")
}

/// Answers that satisfy the Introduction & Disclosure step.
pub fn introduction_answers() -> Vec<(&'static str, Value)> {
    vec![
        ("submitterName", json!("Jane Doe")),
        ("submitterFunction", json!("Compliance Officer")),
        ("submitterEmail", json!("jane@acme.example")),
        ("submitterPhone", json!("+971 4 000 0000")),
        ("instructionsConfirmed", json!(true)),
        ("disclosureAcknowledged", json!(true)),
        ("informationAccurate", json!(true)),
        ("authorizedToSubmit", json!(true)),
        ("difcaConsent", json!(true)),
    ]
}

pub async fn answer(session: &Session, answers: Vec<(&'static str, Value)>) {
    for (path, value) in answers {
        session
            .update_field(path, value)
            .await
            .expect("Failed to update field");
    }
}
