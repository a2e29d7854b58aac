use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;
use std::collections::BTreeMap;
use std::time::Duration;

use super::{HttpClient, HttpResponse};
use crate::error::EngineError;
use crate::types::WebhookMethod;

/// reqwest-backed HTTP collaborator for webhook calls.
pub struct ReqwestHttpClient {
    client: Client,
}

impl ReqwestHttpClient {
    pub fn new() -> Self {
        Self {
            client: Client::new(),
        }
    }
}

impl Default for ReqwestHttpClient {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl HttpClient for ReqwestHttpClient {
    async fn request(
        &self,
        method: WebhookMethod,
        url: &str,
        body: &Value,
        headers: &BTreeMap<String, String>,
        timeout: Duration,
    ) -> Result<HttpResponse, EngineError> {
        let mut request = match method {
            WebhookMethod::Post => self.client.post(url),
            WebhookMethod::Put => self.client.put(url),
            WebhookMethod::Patch => self.client.patch(url),
        }
        .timeout(timeout)
        .json(body);

        for (key, value) in headers {
            request = request.header(key, value);
        }

        let response = request.send().await.map_err(|e| {
            if e.is_timeout() {
                EngineError::timeout(format!("webhook {url} exceeded {timeout:?}"))
            } else {
                EngineError::send_failed(e.to_string())
            }
        })?;

        let status = response.status().as_u16();
        let body = response.text().await.unwrap_or_default();
        Ok(HttpResponse { status, body })
    }
}
