use std::time::Duration;

use reqwest::Client;
use serde_json::Value;
use tracing::debug;

use crate::error::{CloudError, Result};
use crate::types::{FalOutput, FalRequest, FalStatus};

const DEFAULT_BASE_URL: &str = "https://queue.fal.run";
const POLL_INTERVAL: Duration = Duration::from_secs(3);

/// Client for a fal.ai-style queued generation API.
///
/// Requests are submitted to a per-model queue, polled for status, and
/// resolved to a final response carrying image URLs. The completion wait
/// has the same coarse semantics as the render-server poller: network
/// errors during polling are swallowed and the wall-clock budget decides.
#[derive(Debug, Clone)]
pub struct FalClient {
    http: Client,
    api_key: String,
    base_url: String,
}

impl FalClient {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            http: Client::new(),
            api_key: api_key.into(),
            base_url: DEFAULT_BASE_URL.to_string(),
        }
    }

    /// Point at a different queue host (for self-hosted gateways).
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    /// Use a custom `reqwest::Client`.
    pub fn with_http_client(mut self, client: Client) -> Self {
        self.http = client;
        self
    }

    /// Submit a request to the model's queue. Returns the request id.
    pub async fn submit(&self, model: &str, request: &FalRequest) -> Result<String> {
        let url = format!("{}/{}", self.base_url, model);
        let resp = self
            .http
            .post(&url)
            .header("Authorization", format!("Key {}", self.api_key))
            .timeout(Duration::from_secs(30))
            .json(request)
            .send()
            .await
            .map_err(|e| CloudError::Network {
                context: format!("Cannot reach fal queue at {}", self.base_url),
                source: e,
            })?;

        if !resp.status().is_success() {
            let status = resp.status().as_u16();
            let body = resp.text().await.unwrap_or_default();
            return Err(CloudError::Http { status, body });
        }

        let json: Value = resp.json().await.map_err(|e| CloudError::Network {
            context: "Failed to parse fal submit response".into(),
            source: e,
        })?;

        json.get("request_id")
            .and_then(|v| v.as_str())
            .map(|s| s.to_string())
            .ok_or_else(|| CloudError::InvalidResponse("Response missing request_id".into()))
    }

    /// Query the queue status of a submitted request.
    pub async fn status(&self, model: &str, request_id: &str) -> Result<FalStatus> {
        let url = format!("{}/{}/requests/{}/status", self.base_url, model, request_id);
        let resp = self
            .http
            .get(&url)
            .header("Authorization", format!("Key {}", self.api_key))
            .timeout(Duration::from_secs(10))
            .send()
            .await
            .map_err(|e| CloudError::Network {
                context: "Failed to fetch fal request status".into(),
                source: e,
            })?;

        if !resp.status().is_success() {
            let status = resp.status().as_u16();
            let body = resp.text().await.unwrap_or_default();
            return Err(CloudError::Http { status, body });
        }

        let json: Value = resp.json().await.map_err(|e| CloudError::Network {
            context: "Failed to parse fal status response".into(),
            source: e,
        })?;

        json.get("status")
            .cloned()
            .and_then(|v| serde_json::from_value(v).ok())
            .ok_or_else(|| CloudError::InvalidResponse("Response missing status".into()))
    }

    /// Fetch the final response of a completed request.
    pub async fn result(&self, model: &str, request_id: &str) -> Result<FalOutput> {
        let url = format!("{}/{}/requests/{}", self.base_url, model, request_id);
        let resp = self
            .http
            .get(&url)
            .header("Authorization", format!("Key {}", self.api_key))
            .timeout(Duration::from_secs(30))
            .send()
            .await
            .map_err(|e| CloudError::Network {
                context: "Failed to fetch fal request result".into(),
                source: e,
            })?;

        if !resp.status().is_success() {
            let status = resp.status().as_u16();
            let body = resp.text().await.unwrap_or_default();
            return Err(CloudError::Http { status, body });
        }

        resp.json().await.map_err(|e| CloudError::Network {
            context: "Failed to parse fal result response".into(),
            source: e,
        })
    }

    /// Submit and poll until the request completes, fails, or the
    /// wall-clock budget elapses.
    pub async fn generate(
        &self,
        model: &str,
        request: &FalRequest,
        timeout: Duration,
    ) -> Result<FalOutput> {
        let request_id = self.submit(model, request).await?;
        let start = std::time::Instant::now();
        loop {
            if start.elapsed() > timeout {
                return Err(CloudError::Timeout);
            }
            match self.status(model, &request_id).await {
                Ok(FalStatus::Completed) => return self.result(model, &request_id).await,
                Ok(FalStatus::Failed) => {
                    return Err(CloudError::GenerationFailed(format!(
                        "fal request {} failed",
                        request_id
                    )))
                }
                Ok(state) => debug!(%request_id, ?state, "fal request still queued"),
                Err(e) => debug!(%request_id, error = %e, "status poll failed, retrying"),
            }
            tokio::time::sleep(POLL_INTERVAL).await;
        }
    }

    /// Download a produced image by its URL. Returns raw bytes.
    pub async fn fetch(&self, url: &str) -> Result<Vec<u8>> {
        let resp = self
            .http
            .get(url)
            .timeout(Duration::from_secs(60))
            .send()
            .await
            .map_err(|e| CloudError::Network {
                context: format!("Failed to fetch image {}", url),
                source: e,
            })?;

        if !resp.status().is_success() {
            return Err(CloudError::Http {
                status: resp.status().as_u16(),
                body: format!("Failed to fetch image {}", url),
            });
        }

        let bytes = resp.bytes().await.map_err(|e| CloudError::Network {
            context: "Failed to read image bytes".into(),
            source: e,
        })?;
        Ok(bytes.to_vec())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_base_url_normalized() {
        let client = FalClient::new("key").with_base_url("https://gw.example.com/");
        assert_eq!(client.base_url, "https://gw.example.com");
    }

    #[test]
    fn test_parse_submit_response() {
        let json: Value =
            serde_json::from_str(r#"{"request_id": "req-123", "gateway_request_id": "g-1"}"#)
                .unwrap();
        assert_eq!(json.get("request_id").and_then(|v| v.as_str()), Some("req-123"));
    }

    #[test]
    fn test_parse_status_response() {
        let json: Value = serde_json::from_str(r#"{"status": "IN_QUEUE", "queue_position": 2}"#)
            .unwrap();
        let status: FalStatus = serde_json::from_value(json["status"].clone()).unwrap();
        assert_eq!(status, FalStatus::InQueue);
    }

    #[tokio::test]
    async fn test_generate_fails_fast_on_dead_endpoint() {
        // Submission errors are not swallowed; only status polls are.
        let client = FalClient::new("key").with_base_url("http://127.0.0.1:1");
        let err = client
            .generate(
                "fal-ai/flux/schnell",
                &FalRequest::new("p"),
                Duration::from_millis(200),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, CloudError::Network { .. }));
    }
}
