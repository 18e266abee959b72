use std::time::Duration;

use reqwest::Client;
use tracing::{debug, warn};

use crate::error::{CloudError, Result};
use crate::types::HfRequest;

const DEFAULT_BASE_URL: &str = "https://api-inference.huggingface.co";
const DEFAULT_LOADING_ATTEMPTS: u32 = 3;
const DEFAULT_LOADING_DELAY: Duration = Duration::from_secs(20);

/// Client for a Hugging Face inference-style API.
///
/// A single POST returns the generated image bytes directly. Hosted
/// models may answer 503 while loading; those responses are retried with
/// a capped-attempts loop and a fixed delay before giving up.
#[derive(Debug, Clone)]
pub struct HfClient {
    http: Client,
    token: String,
    base_url: String,
    loading_attempts: u32,
    loading_delay: Duration,
}

impl HfClient {
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            http: Client::new(),
            token: token.into(),
            base_url: DEFAULT_BASE_URL.to_string(),
            loading_attempts: DEFAULT_LOADING_ATTEMPTS,
            loading_delay: DEFAULT_LOADING_DELAY,
        }
    }

    /// Point at a different inference host.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    /// Use a custom `reqwest::Client`.
    pub fn with_http_client(mut self, client: Client) -> Self {
        self.http = client;
        self
    }

    /// Tune the model-loading retry policy. Attempts below 1 are treated
    /// as 1.
    pub fn with_loading_retries(mut self, attempts: u32, delay: Duration) -> Self {
        self.loading_attempts = attempts;
        self.loading_delay = delay;
        self
    }

    /// Generate an image. Returns the raw image bytes on success.
    pub async fn generate(&self, model: &str, request: &HfRequest) -> Result<Vec<u8>> {
        let url = format!("{}/models/{}", self.base_url, model);

        // At least one request always goes out, whatever the retry knob.
        let attempts = self.loading_attempts.max(1);
        for attempt in 1..=attempts {
            let resp = self
                .http
                .post(&url)
                .bearer_auth(&self.token)
                .timeout(Duration::from_secs(90))
                .json(request)
                .send()
                .await
                .map_err(|e| CloudError::Network {
                    context: format!("Cannot reach inference API at {}", self.base_url),
                    source: e,
                })?;

            let status = resp.status();
            if status.is_success() {
                let bytes = resp.bytes().await.map_err(|e| CloudError::Network {
                    context: "Failed to read image bytes".into(),
                    source: e,
                })?;
                return Ok(bytes.to_vec());
            }

            let body = resp.text().await.unwrap_or_default();
            if status.as_u16() == 503 && body.to_lowercase().contains("loading") {
                warn!(model, attempt, "hosted model still loading, waiting before retry");
                if attempt < attempts {
                    tokio::time::sleep(self.loading_delay).await;
                }
                continue;
            }

            debug!(model, status = status.as_u16(), "inference request rejected");
            return Err(CloudError::Http {
                status: status.as_u16(),
                body: body.chars().take(200).collect(),
            });
        }

        Err(CloudError::ModelLoading { attempts })
    }
}
