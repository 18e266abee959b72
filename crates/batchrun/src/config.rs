use std::collections::HashMap;
use std::path::Path;

use tracing::debug;

use crate::error::ConfigError;

const DEFAULT_RENDER_URL: &str = "http://127.0.0.1:8188";
const DEFAULT_OLLAMA_URL: &str = "http://127.0.0.1:11434";
const DEFAULT_OLLAMA_MODEL: &str = "mistral";

/// Endpoint hosts and credentials for a batch run.
///
/// Built explicitly from a dotenv-style secrets file and passed to each
/// component at initialization, with no process-wide singletons. Values
/// already present in the process environment take precedence over the
/// file, so CI overrides work without editing secrets.
#[derive(Debug, Clone)]
pub struct Config {
    pub render_url: String,
    pub ollama_url: String,
    pub ollama_model: String,
    pub fal_api: Option<String>,
    pub hf_token: Option<String>,
    pub civitai_token: Option<String>,
}

impl Config {
    /// Load configuration from a dotenv-style file.
    ///
    /// The file must exist and parse; endpoint hosts fall back to
    /// localhost defaults when unset. Credentials stay optional here;
    /// call [`Config::require`] for the providers a run actually uses.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let mut values = HashMap::new();
        let iter = dotenvy::from_path_iter(path).map_err(|e| ConfigError::Unreadable {
            path: path.to_path_buf(),
            source: e,
        })?;
        for entry in iter {
            let (key, value) = entry.map_err(|e| ConfigError::Unreadable {
                path: path.to_path_buf(),
                source: e,
            })?;
            values.insert(key, value);
        }
        debug!(path = %path.display(), keys = values.len(), "loaded secrets file");
        Ok(Self::from_values(values))
    }

    fn from_values(values: HashMap<String, String>) -> Self {
        let get = |key: &str| -> Option<String> {
            std::env::var(key).ok().or_else(|| values.get(key).cloned())
        };
        Self {
            render_url: get("RENDER_URL").unwrap_or_else(|| DEFAULT_RENDER_URL.to_string()),
            ollama_url: get("OLLAMA_URL").unwrap_or_else(|| DEFAULT_OLLAMA_URL.to_string()),
            ollama_model: get("OLLAMA_MODEL").unwrap_or_else(|| DEFAULT_OLLAMA_MODEL.to_string()),
            fal_api: get("FAL_API"),
            hf_token: get("HF_TOKEN"),
            civitai_token: get("CIVITAI_TOKEN"),
        }
    }

    /// Verify that the named credential keys are present, reporting every
    /// missing one at once.
    pub fn require(&self, keys: &[&str]) -> Result<(), ConfigError> {
        let missing: Vec<String> = keys
            .iter()
            .filter(|key| !self.has(key))
            .map(|key| key.to_string())
            .collect();
        if missing.is_empty() {
            Ok(())
        } else {
            Err(ConfigError::MissingKeys(missing))
        }
    }

    fn has(&self, key: &str) -> bool {
        match key {
            "FAL_API" => self.fal_api.is_some(),
            "HF_TOKEN" => self.hf_token.is_some(),
            "CIVITAI_TOKEN" => self.civitai_token.is_some(),
            "RENDER_URL" | "OLLAMA_URL" | "OLLAMA_MODEL" => true,
            _ => false,
        }
    }
}
