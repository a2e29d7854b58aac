//! Outbound side-effect collaborators: email, webhook HTTP, and task
//! creation.
//!
//! Each concern sits behind a trait so tests can stub delivery; the provided
//! implementations use lettre (SMTP) and reqwest.

pub mod email;
pub mod http;
pub mod task;

use async_trait::async_trait;
use serde_json::Value;
use std::collections::BTreeMap;
use std::time::Duration;

use crate::error::EngineError;
use crate::types::WebhookMethod;

/// Email-sending collaborator.
#[async_trait]
pub trait EmailSender: Send + Sync {
    /// Sends one message. Failures are reported as errors, never panics.
    async fn send(&self, to: &str, subject: &str, body: &str) -> Result<(), EngineError>;
}

/// Response from an outbound HTTP call.
#[derive(Debug, Clone)]
pub struct HttpResponse {
    pub status: u16,
    pub body: String,
}

impl HttpResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// HTTP collaborator used by the webhook action.
#[async_trait]
pub trait HttpClient: Send + Sync {
    /// Sends `body` as JSON with a bounded timeout. Network and timeout
    /// failures come back as errors; non-2xx responses come back as
    /// `HttpResponse` so the caller decides what counts as failure.
    async fn request(
        &self,
        method: WebhookMethod,
        url: &str,
        body: &Value,
        headers: &BTreeMap<String, String>,
        timeout: Duration,
    ) -> Result<HttpResponse, EngineError>;
}

/// A task-creation request emitted by the create_task action.
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct TaskRequest {
    pub title: String,
    pub description: String,
    /// Record the task relates to.
    pub related_to: String,
}

/// Task collaborator; current scope treats task creation as fire-and-forget.
#[async_trait]
pub trait TaskSink: Send + Sync {
    async fn create_task(&self, task: TaskRequest) -> Result<(), EngineError>;
}

pub use email::SmtpEmailSender;
pub use http::ReqwestHttpClient;
pub use task::LoggingTaskSink;
