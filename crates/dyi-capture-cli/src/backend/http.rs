//! Async HTTP backend client wrapping reqwest.
//!
//! One POST per captured link. No retries, no backoff.

use std::time::Duration;

use async_trait::async_trait;
use dyi_capture::{parse_analysis_response, AnalysisError, AnalysisRequest, AnalysisResult};

use super::AnalysisBackend;

/// HTTP client for the analysis backend.
#[derive(Clone)]
pub struct HttpBackend {
    client: reqwest::Client,
    endpoint: String,
    timeout: Duration,
}

impl HttpBackend {
    /// Create a client posting to `endpoint`, giving up after `timeout`.
    pub fn new(endpoint: impl Into<String>, timeout: Duration) -> Self {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .redirect(reqwest::redirect::Policy::limited(5))
            .user_agent(concat!("dyi-capture/", env!("CARGO_PKG_VERSION")))
            .build()
            .unwrap_or_else(|e| {
                tracing::warn!("HTTP client setup failed ({e}); using defaults");
                reqwest::Client::new()
            });

        Self {
            client,
            endpoint: endpoint.into(),
            timeout,
        }
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl AnalysisBackend for HttpBackend {
    async fn analyze(&self, request: &AnalysisRequest) -> Result<AnalysisResult, AnalysisError> {
        tracing::info!("Submitting download link to {}", self.endpoint);

        let resp = self
            .client
            .post(&self.endpoint)
            .json(request)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    AnalysisError::TimedOut(self.timeout.as_secs())
                } else {
                    AnalysisError::Transport(e.to_string())
                }
            })?;

        let status = resp.status().as_u16();
        let body = resp.text().await.map_err(|e| {
            if e.is_timeout() {
                AnalysisError::TimedOut(self.timeout.as_secs())
            } else {
                AnalysisError::Transport(e.to_string())
            }
        })?;

        tracing::debug!("Backend answered HTTP {status} ({} bytes)", body.len());
        parse_analysis_response(status, &body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_http_backend_creation() {
        let backend = HttpBackend::new("http://127.0.0.1:5000/analyze", Duration::from_secs(5));
        assert_eq!(backend.endpoint(), "http://127.0.0.1:5000/analyze");
    }
}
