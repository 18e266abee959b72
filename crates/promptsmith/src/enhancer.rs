use std::time::Duration;

use reqwest::Client;
use serde_json::{json, Value};
use tracing::{debug, warn};

use crate::error::{EnhanceError, Result};
use crate::parser::parse_enhancement;
use crate::types::{Enhancement, RecommendedSettings};

/// Quality descriptors appended by the offline fallback.
pub const FALLBACK_KEYWORDS: &[&str] = &[
    "professional photography",
    "high quality",
    "detailed",
    "sharp focus",
    "perfect lighting",
    "cinematic composition",
    "8k resolution",
    "masterpiece",
];

/// Fixed negative prompt returned by the offline fallback.
pub const FALLBACK_NEGATIVE: &str =
    "blurry, low quality, distorted, amateur, bad lighting, pixelated, ugly, deformed, watermark";

const PROBE_TIMEOUT: Duration = Duration::from_secs(5);
const GENERATE_TIMEOUT: Duration = Duration::from_secs(30);

/// Prompt enhancer backed by a local Ollama-style text-generation server.
///
/// [`Enhancer::enhance`] never fails: if the server is unreachable,
/// returns a non-200 status, or produces unparseable output, a
/// deterministic local fallback is applied instead.
///
/// # Example
/// ```no_run
/// use promptsmith::Enhancer;
///
/// # async fn example() {
/// let enhancer = Enhancer::new("http://127.0.0.1:11434", "mistral");
/// let enhancement = enhancer.enhance("a cat on a windowsill").await;
/// println!("{}", enhancement.optimized_prompt);
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct Enhancer {
    http: Client,
    endpoint: String,
    model: String,
    temperature: f64,
    top_p: f64,
    max_tokens: u32,
}

impl Enhancer {
    /// Create a new enhancer for the given endpoint and model.
    pub fn new(endpoint: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            http: Client::new(),
            endpoint: endpoint.into().trim_end_matches('/').to_string(),
            model: model.into(),
            temperature: 0.7,
            top_p: 0.9,
            max_tokens: 300,
        }
    }

    /// Use a custom `reqwest::Client`.
    pub fn with_http_client(mut self, client: Client) -> Self {
        self.http = client;
        self
    }

    /// Set the sampling temperature.
    pub fn with_temperature(mut self, temperature: f64) -> Self {
        self.temperature = temperature;
        self
    }

    /// Set nucleus sampling top_p.
    pub fn with_top_p(mut self, top_p: f64) -> Self {
        self.top_p = top_p;
        self
    }

    /// Set the maximum number of tokens to generate.
    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    /// Returns the configured endpoint URL.
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Probe a list of candidate endpoints and return the first one whose
    /// `/api/tags` answers successfully.
    pub async fn discover(endpoints: &[&str]) -> Option<String> {
        let http = Client::new();
        for endpoint in endpoints {
            let endpoint = endpoint.trim_end_matches('/');
            let url = format!("{}/api/tags", endpoint);
            match http.get(&url).timeout(PROBE_TIMEOUT).send().await {
                Ok(resp) if resp.status().is_success() => {
                    debug!(endpoint, "text-generation endpoint responding");
                    return Some(endpoint.to_string());
                }
                Ok(resp) => debug!(endpoint, status = resp.status().as_u16(), "probe rejected"),
                Err(e) => debug!(endpoint, error = %e, "probe failed"),
            }
        }
        None
    }

    /// Check whether the configured endpoint is reachable.
    pub async fn available(&self) -> bool {
        let url = format!("{}/api/tags", self.endpoint);
        matches!(
            self.http.get(&url).timeout(PROBE_TIMEOUT).send().await,
            Ok(resp) if resp.status().is_success()
        )
    }

    /// Enhance a base prompt, falling back locally on any failure.
    pub async fn enhance(&self, base_prompt: &str) -> Enhancement {
        match self.try_enhance(base_prompt).await {
            Ok(enhancement) => enhancement,
            Err(e) => {
                warn!(error = %e, "enhancement failed, using local fallback");
                Self::fallback(base_prompt)
            }
        }
    }

    /// Enhance a base prompt via the remote model, surfacing failures.
    pub async fn try_enhance(&self, base_prompt: &str) -> Result<Enhancement> {
        let body = json!({
            "model": self.model,
            "prompt": instruction(base_prompt),
            "stream": false,
            "options": {
                "temperature": self.temperature,
                "top_p": self.top_p,
                "num_predict": self.max_tokens,
            },
        });

        let url = format!("{}/api/generate", self.endpoint);
        let resp = self
            .http
            .post(&url)
            .timeout(GENERATE_TIMEOUT)
            .json(&body)
            .send()
            .await
            .map_err(|e| EnhanceError::Network {
                context: format!("Cannot connect to text-generation server at {}", self.endpoint),
                source: e,
            })?;

        if !resp.status().is_success() {
            let status = resp.status().as_u16();
            let body = resp.text().await.unwrap_or_default();
            return Err(EnhanceError::Http { status, body });
        }

        let json_response: Value = resp.json().await.map_err(|e| EnhanceError::Network {
            context: "Failed to parse generate response".into(),
            source: e,
        })?;

        let text = json_response
            .get("response")
            .and_then(|v| v.as_str())
            .unwrap_or("");

        parse_enhancement(text).ok_or_else(|| {
            EnhanceError::Unparseable(text.chars().take(200).collect())
        })
    }

    /// Deterministic local fallback: append the fixed quality descriptors
    /// and return the fixed negative prompt with default settings.
    pub fn fallback(base_prompt: &str) -> Enhancement {
        Enhancement {
            optimized_prompt: format!("{}, {}", base_prompt, FALLBACK_KEYWORDS.join(", ")),
            negative_prompt: FALLBACK_NEGATIVE.to_string(),
            style_notes: "offline fallback enhancement".to_string(),
            recommended_settings: RecommendedSettings::default(),
        }
    }
}

/// Instruction template wrapped around the base prompt.
fn instruction(base_prompt: &str) -> String {
    format!(
        "You are an expert image-generation prompt engineer. Transform this basic \
prompt into a detailed, high-quality generation prompt:\n\"{}\"\n\n\
Focus on visual details, lighting, composition, and artistic style.\n\
Respond in this exact JSON format:\n\
{{\n\
    \"optimized_prompt\": \"enhanced prompt with technical details\",\n\
    \"negative_prompt\": \"specific things to avoid\",\n\
    \"style_notes\": \"brief explanation of improvements\",\n\
    \"recommended_settings\": {{\"steps\": 25, \"cfg\": 7.5, \"sampler\": \"euler\"}}\n\
}}",
        base_prompt
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fallback_is_deterministic() {
        let a = Enhancer::fallback("red apple on a table");
        let b = Enhancer::fallback("red apple on a table");
        assert_eq!(a, b);
    }

    #[test]
    fn test_fallback_appends_joined_keywords() {
        let e = Enhancer::fallback("red apple on a table");
        assert_eq!(
            e.optimized_prompt,
            format!("red apple on a table, {}", FALLBACK_KEYWORDS.join(", "))
        );
        assert_eq!(e.negative_prompt, FALLBACK_NEGATIVE);
        assert_eq!(e.recommended_settings, RecommendedSettings::default());
    }

    #[test]
    fn test_instruction_embeds_base_prompt() {
        let text = instruction("a cat on a windowsill");
        assert!(text.contains("a cat on a windowsill"));
        assert!(text.contains("optimized_prompt"));
    }

    #[test]
    fn test_builder_knobs() {
        let enhancer = Enhancer::new("http://localhost:11434/", "mistral")
            .with_temperature(0.85)
            .with_top_p(0.92)
            .with_max_tokens(200);
        assert_eq!(enhancer.endpoint(), "http://localhost:11434");
        assert_eq!(enhancer.temperature, 0.85);
        assert_eq!(enhancer.top_p, 0.92);
        assert_eq!(enhancer.max_tokens, 200);
    }

    #[tokio::test]
    async fn test_enhance_unreachable_uses_fallback() {
        let enhancer = Enhancer::new("http://127.0.0.1:1", "mistral");
        let e = enhancer.enhance("red apple on a table").await;
        assert_eq!(e, Enhancer::fallback("red apple on a table"));
    }

    #[tokio::test]
    async fn test_available_false_for_dead_endpoint() {
        let enhancer = Enhancer::new("http://127.0.0.1:1", "mistral");
        assert!(!enhancer.available().await);
    }

    #[tokio::test]
    async fn test_discover_skips_dead_endpoints() {
        let found = Enhancer::discover(&["http://127.0.0.1:1", "http://127.0.0.1:2"]).await;
        assert!(found.is_none());
    }
}
