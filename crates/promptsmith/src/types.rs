use serde::{Deserialize, Serialize};

/// Generation settings suggested by the enhancement model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecommendedSettings {
    #[serde(default = "default_steps")]
    pub steps: u32,
    #[serde(default = "default_cfg")]
    pub cfg: f64,
    #[serde(default = "default_sampler")]
    pub sampler: String,
}

fn default_steps() -> u32 {
    25
}

fn default_cfg() -> f64 {
    7.5
}

fn default_sampler() -> String {
    "euler".to_string()
}

impl Default for RecommendedSettings {
    fn default() -> Self {
        Self {
            steps: default_steps(),
            cfg: default_cfg(),
            sampler: default_sampler(),
        }
    }
}

/// Result of enhancing a base prompt. Produced once per prompt and never
/// mutated afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Enhancement {
    pub optimized_prompt: String,
    pub negative_prompt: String,
    #[serde(default)]
    pub style_notes: String,
    #[serde(default)]
    pub recommended_settings: RecommendedSettings,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_settings_defaults() {
        let settings = RecommendedSettings::default();
        assert_eq!(settings.steps, 25);
        assert_eq!(settings.cfg, 7.5);
        assert_eq!(settings.sampler, "euler");
    }

    #[test]
    fn test_enhancement_tolerates_missing_fields() {
        let enhancement: Enhancement = serde_json::from_str(
            r#"{"optimized_prompt": "a cat, detailed", "negative_prompt": "blurry"}"#,
        )
        .unwrap();
        assert_eq!(enhancement.optimized_prompt, "a cat, detailed");
        assert!(enhancement.style_notes.is_empty());
        assert_eq!(enhancement.recommended_settings.steps, 25);
    }

    #[test]
    fn test_settings_partial_object() {
        let settings: RecommendedSettings =
            serde_json::from_str(r#"{"steps": 30}"#).unwrap();
        assert_eq!(settings.steps, 30);
        assert_eq!(settings.cfg, 7.5);
    }
}
