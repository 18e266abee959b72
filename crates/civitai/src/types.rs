use serde::{Deserialize, Serialize};

/// A model entry from the CivitAI index.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Model {
    pub id: u64,
    pub name: String,
    #[serde(default)]
    pub r#type: Option<String>,
    #[serde(default)]
    pub stats: ModelStats,
    #[serde(default)]
    pub model_versions: Vec<ModelVersion>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModelStats {
    #[serde(default)]
    pub rating: f64,
    #[serde(default)]
    pub download_count: u64,
}

/// A published version of a model.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModelVersion {
    pub id: u64,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub trained_words: Vec<String>,
    #[serde(default)]
    pub files: Vec<ModelFile>,
}

/// A downloadable file attached to a model version.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModelFile {
    pub name: String,
    #[serde(default)]
    pub r#type: Option<String>,
    pub download_url: String,
    #[serde(default)]
    pub size_kb: Option<f64>,
}
