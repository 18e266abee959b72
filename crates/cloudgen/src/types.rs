use serde::{Deserialize, Serialize};

/// Request body for a fal.ai-style generation endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FalRequest {
    pub prompt: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub negative_prompt: Option<String>,
    /// Named size preset, e.g. "landscape_4_3", "square_hd".
    pub image_size: String,
    pub num_inference_steps: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub seed: Option<u64>,
    pub enable_safety_checker: bool,
}

impl FalRequest {
    pub fn new(prompt: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            negative_prompt: None,
            image_size: "landscape_4_3".to_string(),
            num_inference_steps: 4,
            seed: None,
            enable_safety_checker: true,
        }
    }

    pub fn negative(mut self, prompt: impl Into<String>) -> Self {
        self.negative_prompt = Some(prompt.into());
        self
    }

    pub fn image_size(mut self, size: impl Into<String>) -> Self {
        self.image_size = size.into();
        self
    }

    pub fn steps(mut self, steps: u32) -> Self {
        self.num_inference_steps = steps;
        self
    }

    pub fn seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Pick a fresh random seed, as the batch scripts do per image.
    pub fn random_seed(mut self) -> Self {
        self.seed = Some(rand::random::<u32>() as u64);
        self
    }
}

/// Status of a queued fal.ai request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FalStatus {
    InQueue,
    InProgress,
    Completed,
    Failed,
}

/// An image produced by a hosted provider, addressed by URL.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HostedImage {
    pub url: String,
    #[serde(default)]
    pub width: Option<u32>,
    #[serde(default)]
    pub height: Option<u32>,
}

/// Final response of a completed fal.ai request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FalOutput {
    pub images: Vec<HostedImage>,
    #[serde(default)]
    pub seed: Option<u64>,
}

/// Request body for a Hugging Face inference-style endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HfRequest {
    pub inputs: String,
    pub parameters: HfParameters,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HfParameters {
    pub num_inference_steps: u32,
    pub guidance_scale: f64,
    pub width: u32,
    pub height: u32,
}

impl HfRequest {
    pub fn new(prompt: impl Into<String>) -> Self {
        Self {
            inputs: prompt.into(),
            parameters: HfParameters {
                num_inference_steps: 4,
                guidance_scale: 0.0,
                width: 1024,
                height: 768,
            },
        }
    }

    pub fn steps(mut self, steps: u32) -> Self {
        self.parameters.num_inference_steps = steps;
        self
    }

    pub fn guidance(mut self, scale: f64) -> Self {
        self.parameters.guidance_scale = scale;
        self
    }

    pub fn size(mut self, width: u32, height: u32) -> Self {
        self.parameters.width = width;
        self.parameters.height = height;
        self
    }
}
