use std::collections::BTreeMap;
use std::time::Duration;

use reqwest::Client;
use serde::Deserialize;
use tracing::debug;

use crate::error::{CivitaiError, Result};
use crate::types::{Model, ModelFile, ModelVersion};

const DEFAULT_BASE_URL: &str = "https://civitai.com/api/v1";

#[derive(Debug, Deserialize)]
struct SearchPage {
    #[serde(default)]
    items: Vec<Model>,
}

/// Client for the CivitAI model index.
///
/// Searches are unauthenticated; the API key is only attached when
/// downloading gated files.
#[derive(Debug, Clone)]
pub struct CivitaiClient {
    http: Client,
    api_key: Option<String>,
    base_url: String,
}

impl CivitaiClient {
    pub fn new(api_key: Option<String>) -> Self {
        Self {
            http: Client::new(),
            api_key,
            base_url: DEFAULT_BASE_URL.to_string(),
        }
    }

    /// Point at a different API host.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    /// Use a custom `reqwest::Client`.
    pub fn with_http_client(mut self, client: Client) -> Self {
        self.http = client;
        self
    }

    /// Search for LoRA models, highest rated this month first.
    pub async fn search(&self, query: &str, limit: u32) -> Result<Vec<Model>> {
        let url = format!("{}/models", self.base_url);
        let resp = self
            .http
            .get(&url)
            .query(&[
                ("limit", limit.to_string().as_str()),
                ("query", query),
                ("types", "LORA"),
                ("sort", "Highest Rated"),
                ("period", "Month"),
            ])
            .timeout(Duration::from_secs(30))
            .send()
            .await
            .map_err(|e| CivitaiError::Network {
                context: format!("Cannot reach CivitAI at {}", self.base_url),
                source: e,
            })?;

        if !resp.status().is_success() {
            let status = resp.status().as_u16();
            let body = resp.text().await.unwrap_or_default();
            return Err(CivitaiError::Http { status, body });
        }

        let page: SearchPage = resp.json().await.map_err(|e| CivitaiError::Network {
            context: "Failed to parse CivitAI search response".into(),
            source: e,
        })?;
        Ok(page.items)
    }

    /// Run several searches, de-duplicate by model id, and rank by rating.
    pub async fn search_many(
        &self,
        queries: &[&str],
        per_query: u32,
        top: usize,
    ) -> Result<Vec<Model>> {
        let mut unique: BTreeMap<u64, Model> = BTreeMap::new();
        for query in queries {
            match self.search(query, per_query).await {
                Ok(models) => {
                    for model in models {
                        unique.entry(model.id).or_insert(model);
                    }
                }
                Err(e) => debug!(query, error = %e, "search query failed, continuing"),
            }
        }

        let mut models: Vec<Model> = unique.into_values().collect();
        models.sort_by(|a, b| {
            b.stats
                .rating
                .partial_cmp(&a.stats.rating)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        models.truncate(top);
        Ok(models)
    }

    /// Fetch the full detail for a model by id.
    pub async fn model(&self, id: u64) -> Result<Model> {
        let url = format!("{}/models/{}", self.base_url, id);
        let resp = self
            .http
            .get(&url)
            .timeout(Duration::from_secs(30))
            .send()
            .await
            .map_err(|e| CivitaiError::Network {
                context: format!("Cannot reach CivitAI at {}", self.base_url),
                source: e,
            })?;

        if !resp.status().is_success() {
            let status = resp.status().as_u16();
            let body = resp.text().await.unwrap_or_default();
            return Err(CivitaiError::Http { status, body });
        }

        resp.json().await.map_err(|e| CivitaiError::Network {
            context: "Failed to parse CivitAI model response".into(),
            source: e,
        })
    }

    /// Download a model file's bytes, attaching the API key when present.
    pub async fn download(&self, file: &ModelFile) -> Result<Vec<u8>> {
        let mut req = self
            .http
            .get(&file.download_url)
            .timeout(Duration::from_secs(600));
        if let Some(key) = &self.api_key {
            req = req.bearer_auth(key);
        }

        let resp = req.send().await.map_err(|e| CivitaiError::Network {
            context: format!("Failed to download {}", file.name),
            source: e,
        })?;

        if !resp.status().is_success() {
            return Err(CivitaiError::Http {
                status: resp.status().as_u16(),
                body: format!("Failed to download {}", file.name),
            });
        }

        let bytes = resp.bytes().await.map_err(|e| CivitaiError::Network {
            context: "Failed to read file bytes".into(),
            source: e,
        })?;
        Ok(bytes.to_vec())
    }
}

/// Pick the downloadable `Model`-type file from a version, falling back
/// to the first file when no type is marked.
pub fn primary_file(version: &ModelVersion) -> Option<&ModelFile> {
    version
        .files
        .iter()
        .find(|f| f.r#type.as_deref() == Some("Model"))
        .or_else(|| version.files.first())
}

/// Strip characters that are unsafe in a local filename.
pub fn safe_filename(name: &str) -> String {
    name.chars()
        .filter(|c| c.is_alphanumeric() || matches!(c, '.' | '_' | '-'))
        .collect()
}
