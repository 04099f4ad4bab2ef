//! Forward-and-normalize client for the external debt-sheet backend.
//!
//! Every proxy route and page loader funnels through [`UpstreamClient`]: build
//! the URL from the configured base plus a fixed path, issue the request with a
//! bounded timeout, then classify the outcome into [`ProxyError`] so callers
//! only ever deal with one failure taxonomy.

use std::time::Duration;

use reqwest::multipart::Form;
use serde_json::Value;
use thiserror::Error;
use tracing::debug;

/// Uniform failure classes for anything that talks to the upstream backend.
#[derive(Debug, Error)]
pub enum ProxyError {
    /// Required input missing or malformed; detected locally, upstream never
    /// contacted.
    #[error("{0}")]
    Validation(String),
    /// Upstream answered with a non-success status. `body` is the parsed error
    /// body when the upstream sent one.
    #[error("upstream request failed with status: {status}")]
    Upstream { status: u16, body: Option<Value> },
    /// Network-level failure: connect error, DNS, or timeout.
    #[error("upstream unreachable: {0}")]
    Unreachable(String),
    /// Upstream reported success but the body was not valid JSON.
    #[error("malformed upstream body: {0}")]
    MalformedBody(String),
}

impl ProxyError {
    /// Best-effort human-readable message for the `{error}` envelope. Prefers
    /// a `message` field from the upstream error body, then the whole body,
    /// then a status-derived fallback.
    pub fn envelope_message(&self) -> Value {
        match self {
            ProxyError::Upstream { status, body } => match body {
                Some(Value::Object(map)) => match map.get("message") {
                    Some(Value::String(msg)) => Value::String(msg.clone()),
                    _ => Value::Object(map.clone()),
                },
                Some(other) => other.clone(),
                None => Value::String(format!("upstream request failed with status: {status}")),
            },
            other => Value::String(other.to_string()),
        }
    }
}

/// A success response forwarded from upstream: the status to mirror plus the
/// parsed JSON body to relay unchanged.
#[derive(Debug, Clone)]
pub struct Forwarded {
    pub status: u16,
    pub body: Value,
}

#[derive(Clone)]
pub struct UpstreamClient {
    client: reqwest::Client,
    base_url: String,
}

impl UpstreamClient {
    pub fn new(base_url: &str, timeout: Duration) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self { client, base_url: base_url.trim_end_matches('/').to_string() })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    pub async fn get_json(&self, path: &str) -> Result<Forwarded, ProxyError> {
        self.forward(self.client.get(self.url(path))).await
    }

    pub async fn post_json(&self, path: &str, body: &Value) -> Result<Forwarded, ProxyError> {
        self.forward(self.client.post(self.url(path)).json(body)).await
    }

    pub async fn post_multipart(&self, path: &str, form: Form) -> Result<Forwarded, ProxyError> {
        self.forward(self.client.post(self.url(path)).multipart(form)).await
    }

    pub async fn delete(&self, path: &str) -> Result<Forwarded, ProxyError> {
        self.forward(self.client.delete(self.url(path))).await
    }

    async fn forward(&self, req: reqwest::RequestBuilder) -> Result<Forwarded, ProxyError> {
        let resp = req
            .send()
            .await
            .map_err(|e| ProxyError::Unreachable(e.to_string()))?;
        let status = resp.status();
        debug!(status = status.as_u16(), "upstream responded");
        if !status.is_success() {
            let body = resp.json::<Value>().await.ok();
            return Err(ProxyError::Upstream { status: status.as_u16(), body });
        }
        let body = resp
            .json::<Value>()
            .await
            .map_err(|e| ProxyError::MalformedBody(e.to_string()))?;
        Ok(Forwarded { status: status.as_u16(), body })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn url_joins_without_duplicate_slashes() {
        let c = UpstreamClient::new("http://backend:5000/", Duration::from_secs(30)).unwrap();
        assert_eq!(c.url("/project/get_projects/u1"), "http://backend:5000/project/get_projects/u1");
        assert_eq!(c.url("analyze_tags"), "http://backend:5000/analyze_tags");
    }

    #[test]
    fn envelope_message_prefers_upstream_message_field() {
        let e = ProxyError::Upstream { status: 404, body: Some(json!({"message": "no such project"})) };
        assert_eq!(e.envelope_message(), json!("no such project"));
    }

    #[test]
    fn envelope_message_falls_back_to_status() {
        let e = ProxyError::Upstream { status: 502, body: None };
        assert_eq!(e.envelope_message(), json!("upstream request failed with status: 502"));
    }

    #[test]
    fn envelope_message_keeps_structured_error_bodies() {
        let body = json!({"code": 7, "detail": "bad dataset"});
        let e = ProxyError::Upstream { status: 422, body: Some(body.clone()) };
        assert_eq!(e.envelope_message(), body);
    }
}
