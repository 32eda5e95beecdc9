//! Support ticket submission.
//!
//! A request is validated on the client, mapped onto the ticket endpoint's
//! schema and posted once as JSON. Attachments travel base64 encoded inside
//! the payload, which is why their sizes are capped tightly.

use std::path::Path;

use base64::{engine::general_purpose::STANDARD, Engine as _};
use jiff::Timestamp;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use crate::{
    error::{Result, WizardError},
    validation::is_valid_email,
};

/// Endpoint used when none is configured.
pub const DEFAULT_SUPPORT_ENDPOINT: &str =
    "https://kfrealexpressserver.vercel.app/api/v1/support/create-support-request";

/// Azure id sent when the requester has none.
pub const DEFAULT_AZURE_ID: &str = "00000000-0000-0000-0000-000000000000";

pub const MAX_ATTACHMENTS: usize = 2;
pub const MAX_ATTACHMENT_BYTES: u64 = 500 * 1024;
pub const MAX_TOTAL_ATTACHMENT_BYTES: u64 = 1024 * 1024;

/// A file already encoded for upload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attachment {
    pub filename: String,
    /// Base64 content
    pub content: String,
    pub mimetype: String,
}

impl Attachment {
    pub fn from_bytes(filename: impl Into<String>, mimetype: impl Into<String>, bytes: &[u8]) -> Self {
        Self {
            filename: filename.into(),
            content: STANDARD.encode(bytes),
            mimetype: mimetype.into(),
        }
    }

    /// Reads and encodes a file, guessing its type from the extension.
    pub fn from_path(path: &Path) -> Result<Self> {
        let bytes = std::fs::read(path).map_err(|source| WizardError::FileSystem {
            path: path.to_path_buf(),
            source,
        })?;
        let filename = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default();
        Ok(Self::from_bytes(filename, guess_mimetype(path), &bytes))
    }

    /// Size of the decoded file in bytes.
    pub fn size(&self) -> u64 {
        let padding = self.content.bytes().rev().take_while(|b| *b == b'=').count();
        (self.content.len() / 4 * 3).saturating_sub(padding) as u64
    }
}

fn guess_mimetype(path: &Path) -> &'static str {
    let extension = path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(str::to_ascii_lowercase);
    match extension.as_deref() {
        Some("pdf") => "application/pdf",
        Some("png") => "image/png",
        Some("jpg" | "jpeg") => "image/jpeg",
        Some("gif") => "image/gif",
        Some("txt" | "log") => "text/plain",
        Some("json") => "application/json",
        Some("csv") => "text/csv",
        _ => "application/octet-stream",
    }
}

/// What the user fills in.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SupportRequest {
    pub name: String,
    pub email: String,
    pub subject: String,
    /// Short code such as `technical` or `billing`
    pub category: String,
    pub priority: String,
    pub message: String,
    pub attachments: Vec<Attachment>,
    pub azure_id: Option<String>,
}

/// Body posted to the ticket endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SupportPayload {
    pub form_id: String,
    pub azure_id: String,
    pub full_name: String,
    pub email_address: String,
    pub subject: String,
    pub category: String,
    pub priority: String,
    pub message: String,
    /// Base64 contents only
    pub attachments: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SupportResponse {
    pub success: bool,
    pub ticket_id: Option<String>,
    pub message: String,
}

/// Messages for every missing or malformed field, in form order.
pub fn validate_support_request(request: &SupportRequest) -> Vec<String> {
    let mut errors = Vec::new();
    let blank = |value: &str| value.trim().is_empty();

    if blank(&request.name) {
        errors.push("Name is required".to_string());
    }
    if blank(&request.email) {
        errors.push("Email is required".to_string());
    } else if !is_valid_email(&request.email) {
        errors.push("Please enter a valid email address".to_string());
    }
    if blank(&request.subject) {
        errors.push("Subject is required".to_string());
    }
    if blank(&request.category) {
        errors.push("Category is required".to_string());
    }
    if blank(&request.message) {
        errors.push("Message is required".to_string());
    }

    errors
}

/// Size checks for files about to be attached, given as `(name, bytes)`.
pub fn validate_files<'a, I>(files: I) -> Vec<String>
where
    I: IntoIterator<Item = (&'a str, u64)>,
{
    let files: Vec<_> = files.into_iter().collect();
    let mut errors = Vec::new();

    if files.len() > MAX_ATTACHMENTS {
        errors.push(format!(
            "Maximum {MAX_ATTACHMENTS} files allowed due to server limits"
        ));
    }

    let mut total: u64 = 0;
    for (name, size) in &files {
        total += *size;
        if *size > MAX_ATTACHMENT_BYTES {
            errors.push(format!("File \"{name}\" exceeds 500KB limit"));
        }
    }

    if total > MAX_TOTAL_ATTACHMENT_BYTES {
        errors.push(format!(
            "Total file size exceeds 1MB limit. Current: {:.0}KB",
            total as f64 / 1024.0
        ));
    }

    errors
}

/// Every problem that keeps a request from being sent: missing fields and
/// attachment limits.
pub fn validate_submission(request: &SupportRequest) -> Vec<String> {
    let mut errors = validate_support_request(request);
    errors.extend(validate_files(
        request
            .attachments
            .iter()
            .map(|attachment| (attachment.filename.as_str(), attachment.size())),
    ));
    errors
}

/// Endpoint category for a short category code.
pub fn map_category(category: &str) -> &'static str {
    match category.to_lowercase().as_str() {
        "technical" => "Technical Issue",
        "billing" => "Billing Question",
        "account" => "Account Management",
        "feature" => "Feature Request",
        "other" => "Other",
        _ => "General Inquiry",
    }
}

/// `"hIGH"` becomes `"High"`.
pub fn capitalize(value: &str) -> String {
    let mut chars = value.chars();
    match chars.next() {
        Some(first) => {
            let rest = chars.as_str().to_lowercase();
            first.to_uppercase().chain(rest.chars()).collect()
        }
        None => String::new(),
    }
}

fn random_suffix() -> u128 {
    Uuid::new_v4().as_u128() % 1000
}

fn generate_ticket_id() -> String {
    format!("TKT-{}-{}", Timestamp::now().as_millisecond(), random_suffix())
}

/// Posts support requests to the ticket endpoint.
#[derive(Debug, Clone)]
pub struct SupportClient {
    client: reqwest::Client,
    endpoint: String,
    default_azure_id: String,
}

impl Default for SupportClient {
    fn default() -> Self {
        Self::new(DEFAULT_SUPPORT_ENDPOINT)
    }
}

impl SupportClient {
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            endpoint: endpoint.into(),
            default_azure_id: DEFAULT_AZURE_ID.to_string(),
        }
    }

    /// Azure id used for requests that carry none.
    pub fn with_default_azure_id(mut self, azure_id: impl Into<String>) -> Self {
        self.default_azure_id = azure_id.into();
        self
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Maps a request onto the endpoint schema.
    pub fn build_payload(&self, request: &SupportRequest) -> SupportPayload {
        SupportPayload {
            form_id: format!("FORM-{}-{}", Timestamp::now().as_millisecond(), random_suffix()),
            azure_id: request
                .azure_id
                .clone()
                .filter(|id| !id.is_empty())
                .unwrap_or_else(|| self.default_azure_id.clone()),
            full_name: request.name.clone(),
            email_address: request.email.clone(),
            subject: request.subject.clone(),
            category: map_category(&request.category).to_string(),
            priority: capitalize(&request.priority),
            message: request.message.clone(),
            attachments: request
                .attachments
                .iter()
                .map(|attachment| attachment.content.clone())
                .collect(),
        }
    }

    /// Submits once. Failures are reported in the response, never raised.
    ///
    /// Requests that fail [`validate_submission`] are refused without
    /// contacting the endpoint.
    pub async fn submit(&self, request: &SupportRequest) -> SupportResponse {
        let errors = validate_submission(request);
        if !errors.is_empty() {
            log::debug!("Support request refused: {errors:?}");
            return SupportResponse {
                success: false,
                ticket_id: None,
                message: errors.join("; "),
            };
        }

        let payload = self.build_payload(request);
        log::debug!("Submitting support request {}", payload.form_id);

        match self.post(&payload).await {
            Ok(body) => interpret_success(&body),
            Err(e) => {
                log::warn!("Support request failed: {e}");
                let detail = match e {
                    WizardError::Network { message, .. } => message,
                    other => other.to_string(),
                };
                SupportResponse {
                    success: false,
                    ticket_id: None,
                    message: format!("Failed to submit support request: {detail}"),
                }
            }
        }
    }

    async fn post(&self, payload: &SupportPayload) -> Result<Value> {
        let response = self
            .client
            .post(&self.endpoint)
            .header("Accept", "application/json")
            .json(payload)
            .send()
            .await
            .map_err(|e| WizardError::network(e.to_string()))?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| WizardError::network(e.to_string()))?;

        if !status.is_success() {
            return Err(WizardError::Network {
                message: error_message(status.as_u16(), &text),
                status: Some(status.as_u16()),
            });
        }

        serde_json::from_str(&text).map_err(|e| WizardError::network(format!("Invalid response: {e}")))
    }
}

/// Message for a non-2xx response: the body's `message` or `error` when it
/// is JSON, "Server Error" for an HTML page, the raw body otherwise.
pub(crate) fn error_message(status: u16, body: &str) -> String {
    if let Ok(json) = serde_json::from_str::<Value>(body) {
        let field = |name: &str| {
            json.get(name)
                .and_then(Value::as_str)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
        };
        return field("message")
            .or_else(|| field("error"))
            .unwrap_or_else(|| body.to_string());
    }

    if body.contains("<!DOCTYPE") {
        "Server Error".to_string()
    } else if body.is_empty() {
        format!("HTTP {status}")
    } else {
        body.to_string()
    }
}

pub(crate) fn interpret_success(body: &Value) -> SupportResponse {
    let text = |name: &str| match body.get(name) {
        Some(Value::String(s)) if !s.is_empty() => Some(s.clone()),
        Some(Value::Number(n)) => Some(n.to_string()),
        _ => None,
    };

    SupportResponse {
        success: true,
        ticket_id: Some(
            text("ticketId")
                .or_else(|| text("id"))
                .or_else(|| text("ticket_id"))
                .unwrap_or_else(generate_ticket_id),
        ),
        message: text("message")
            .unwrap_or_else(|| "Support request submitted successfully".to_string()),
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{
        atomic::{AtomicUsize, Ordering},
        Arc,
    };

    use serde_json::json;

    use super::*;

    fn request() -> SupportRequest {
        SupportRequest {
            name: "Jane Doe".to_string(),
            email: "jane@example.com".to_string(),
            subject: "Cannot upload".to_string(),
            category: "technical".to_string(),
            priority: "hIGH".to_string(),
            message: "The upload button does nothing".to_string(),
            attachments: vec![Attachment::from_bytes("log.txt", "text/plain", b"hello")],
            azure_id: None,
        }
    }

    #[test]
    fn test_payload_mapping() {
        let payload = SupportClient::default().build_payload(&request());

        assert!(payload.form_id.starts_with("FORM-"));
        assert_eq!(payload.azure_id, DEFAULT_AZURE_ID);
        assert_eq!(payload.full_name, "Jane Doe");
        assert_eq!(payload.category, "Technical Issue");
        assert_eq!(payload.priority, "High");
        assert_eq!(payload.attachments, vec!["aGVsbG8=".to_string()]);

        let value = serde_json::to_value(&payload).unwrap();
        assert_eq!(value["emailAddress"], "jane@example.com");
        assert!(value.get("formId").is_some());
    }

    #[test]
    fn test_category_mapping() {
        assert_eq!(map_category("Billing"), "Billing Question");
        assert_eq!(map_category("account"), "Account Management");
        assert_eq!(map_category("feature"), "Feature Request");
        assert_eq!(map_category("other"), "Other");
        assert_eq!(map_category("bug"), "General Inquiry");
        assert_eq!(map_category(""), "General Inquiry");
    }

    #[test]
    fn test_request_validation() {
        assert!(validate_support_request(&request()).is_empty());

        let errors = validate_support_request(&SupportRequest {
            email: "not-an-email".to_string(),
            ..SupportRequest::default()
        });
        assert_eq!(
            errors,
            vec![
                "Name is required",
                "Please enter a valid email address",
                "Subject is required",
                "Category is required",
                "Message is required",
            ]
        );
    }

    #[test]
    fn test_file_limits() {
        assert!(validate_files([("a.pdf", 100 * 1024), ("b.png", 400 * 1024)]).is_empty());

        let errors = validate_files([("a.pdf", 600 * 1024), ("b.pdf", 500 * 1024), ("c.pdf", 1)]);
        assert_eq!(
            errors,
            vec![
                "Maximum 2 files allowed due to server limits".to_string(),
                "File \"a.pdf\" exceeds 500KB limit".to_string(),
                "Total file size exceeds 1MB limit. Current: 1100KB".to_string(),
            ]
        );
    }

    #[test]
    fn test_error_messages() {
        assert_eq!(error_message(400, r#"{"message":"Bad email"}"#), "Bad email");
        assert_eq!(error_message(500, r#"{"error":"Boom"}"#), "Boom");
        assert_eq!(error_message(502, "<!DOCTYPE html><html></html>"), "Server Error");
        assert_eq!(error_message(503, ""), "HTTP 503");
        assert_eq!(error_message(500, "plain failure"), "plain failure");
    }

    #[test]
    fn test_success_ticket_fallbacks() {
        let response = interpret_success(&json!({ "ticketId": "TCK-1", "message": "Created" }));
        assert_eq!(response.ticket_id.as_deref(), Some("TCK-1"));
        assert_eq!(response.message, "Created");

        let response = interpret_success(&json!({ "ticket_id": "T-9" }));
        assert_eq!(response.ticket_id.as_deref(), Some("T-9"));
        assert_eq!(response.message, "Support request submitted successfully");

        let response = interpret_success(&json!({ "id": 42 }));
        assert_eq!(response.ticket_id.as_deref(), Some("42"));

        let response = interpret_success(&json!({}));
        assert!(response.ticket_id.unwrap().starts_with("TKT-"));
    }

    #[tokio::test]
    async fn test_unreachable_endpoint_reports_failure() {
        let client = SupportClient::new("http://127.0.0.1:9/support");
        let response = client.submit(&request()).await;
        assert!(!response.success);
        assert!(response.ticket_id.is_none());
        assert!(response.message.starts_with("Failed to submit support request"));
    }

    #[tokio::test]
    async fn test_invalid_requests_never_reach_endpoint() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let endpoint = format!("http://{}/support", listener.local_addr().unwrap());
        let connections = Arc::new(AtomicUsize::new(0));
        let accepted = Arc::clone(&connections);
        let server = tokio::spawn(async move {
            while listener.accept().await.is_ok() {
                accepted.fetch_add(1, Ordering::SeqCst);
            }
        });

        let client = SupportClient::new(endpoint);
        let oversize = SupportRequest {
            attachments: vec![Attachment::from_bytes(
                "scan.pdf",
                "application/pdf",
                &vec![0u8; 600 * 1024],
            )],
            ..request()
        };
        let response = client.submit(&oversize).await;
        assert!(!response.success);
        assert!(response.ticket_id.is_none());
        assert_eq!(response.message, "File \"scan.pdf\" exceeds 500KB limit");

        let incomplete = SupportRequest {
            message: "  ".to_string(),
            ..request()
        };
        let response = client.submit(&incomplete).await;
        assert_eq!(response.message, "Message is required");

        tokio::time::sleep(std::time::Duration::from_millis(50)).await;
        assert_eq!(connections.load(Ordering::SeqCst), 0);
        server.abort();
    }

    #[test]
    fn test_attachment_size() {
        let sizes = [0usize, 1, 2, 3, 4, 5, 1024];
        for size in sizes {
            let attachment = Attachment::from_bytes("f", "text/plain", &vec![7u8; size]);
            assert_eq!(attachment.size(), size as u64);
        }
    }

    #[test]
    fn test_attachment_from_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("Report.PDF");
        std::fs::write(&path, b"%PDF").unwrap();

        let attachment = Attachment::from_path(&path).unwrap();
        assert_eq!(attachment.filename, "Report.PDF");
        assert_eq!(attachment.mimetype, "application/pdf");
        assert_eq!(attachment.content, "JVBERg==");

        assert!(Attachment::from_path(&dir.path().join("missing")).is_err());
    }
}
