use rand::Rng;

use crate::graph::{Graph, Node, NodeInput};

/// Builder for a txt2img workflow graph.
///
/// Constructs the standard pipeline: checkpoint loader → CLIP text encoders
/// → sampler → VAE decode → save, with optional LoRA loaders spliced
/// between the checkpoint and its consumers.
///
/// # Example
/// ```
/// use graphgen::Txt2ImgGraph;
///
/// let (graph, seed) = Txt2ImgGraph::new("a cat in space", "dreamshaper_8.safetensors")
///     .negative("lowres, blurry")
///     .size(512, 768)
///     .steps(25)
///     .cfg(7.5)
///     .build();
///
/// assert!(seed >= 0);
/// assert!(graph.validate().is_ok());
/// ```
#[derive(Debug, Clone)]
pub struct Txt2ImgGraph {
    pub positive_prompt: String,
    pub negative_prompt: String,
    pub checkpoint: String,
    pub width: u32,
    pub height: u32,
    pub steps: u32,
    pub cfg: f64,
    pub sampler: String,
    pub scheduler: String,
    pub seed: i64,
    pub batch_size: u32,
    pub filename_prefix: String,
    pub loras: Vec<(String, f64)>,
}

impl Txt2ImgGraph {
    /// Create a new builder with a prompt and checkpoint. Uses sensible
    /// defaults for everything else (512x768, 25 steps, cfg 7.5,
    /// euler/normal).
    pub fn new(prompt: impl Into<String>, checkpoint: impl Into<String>) -> Self {
        Self {
            positive_prompt: prompt.into(),
            negative_prompt: String::new(),
            checkpoint: checkpoint.into(),
            width: 512,
            height: 768,
            steps: 25,
            cfg: 7.5,
            sampler: "euler".to_string(),
            scheduler: "normal".to_string(),
            seed: -1,
            batch_size: 1,
            filename_prefix: "graphgen".to_string(),
            loras: Vec::new(),
        }
    }

    /// Set the negative prompt.
    pub fn negative(mut self, prompt: impl Into<String>) -> Self {
        self.negative_prompt = prompt.into();
        self
    }

    /// Set output dimensions.
    pub fn size(mut self, width: u32, height: u32) -> Self {
        self.width = width;
        self.height = height;
        self
    }

    /// Set the number of sampling steps.
    pub fn steps(mut self, steps: u32) -> Self {
        self.steps = steps;
        self
    }

    /// Set the classifier-free guidance scale.
    pub fn cfg(mut self, cfg: f64) -> Self {
        self.cfg = cfg;
        self
    }

    /// Set the sampler algorithm (e.g. "euler", "dpmpp_2m").
    pub fn sampler(mut self, sampler: impl Into<String>) -> Self {
        self.sampler = sampler.into();
        self
    }

    /// Set the noise scheduler (e.g. "normal", "karras").
    pub fn scheduler(mut self, scheduler: impl Into<String>) -> Self {
        self.scheduler = scheduler.into();
        self
    }

    /// Set a specific seed. Use -1 (the default) for random.
    pub fn seed(mut self, seed: i64) -> Self {
        self.seed = seed;
        self
    }

    /// Set the batch size (number of images per generation).
    pub fn batch_size(mut self, size: u32) -> Self {
        self.batch_size = size;
        self
    }

    /// Set the output filename prefix on the render server.
    pub fn filename_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.filename_prefix = prefix.into();
        self
    }

    /// Stack a LoRA onto the model. The same strength is applied to the
    /// model and CLIP weights. Multiple LoRAs chain in insertion order.
    pub fn lora(mut self, name: impl Into<String>, strength: f64) -> Self {
        self.loras.push((name.into(), strength));
        self
    }

    /// Build the workflow graph and resolve the seed.
    ///
    /// Returns `(graph, actual_seed)`. When `seed` is -1, a random seed is
    /// generated and returned so it can be stored alongside the output.
    /// The built graph always passes [`Graph::validate`].
    pub fn build(&self) -> (Graph, i64) {
        let seed = if self.seed < 0 {
            rand::rng().random_range(0..i64::MAX)
        } else {
            self.seed
        };

        let mut graph = Graph::new();
        graph.add(
            "1",
            Node::new("CheckpointLoaderSimple").input("ckpt_name", self.checkpoint.clone()),
        );

        // Chain LoRA loaders between the checkpoint and its consumers.
        let mut model_src = ("1".to_string(), 0u32);
        let mut clip_src = ("1".to_string(), 1u32);
        for (i, (name, strength)) in self.loras.iter().enumerate() {
            let id = format!("lora{}", i + 1);
            graph.add(
                id.clone(),
                Node::new("LoraLoader")
                    .input("lora_name", name.clone())
                    .input("strength_model", *strength)
                    .input("strength_clip", *strength)
                    .input("model", NodeInput::slot(model_src.0.clone(), model_src.1))
                    .input("clip", NodeInput::slot(clip_src.0.clone(), clip_src.1)),
            );
            model_src = (id.clone(), 0);
            clip_src = (id, 1);
        }

        graph.add(
            "2",
            Node::new("EmptyLatentImage")
                .input("width", self.width)
                .input("height", self.height)
                .input("batch_size", self.batch_size),
        );
        graph.add(
            "3",
            Node::new("CLIPTextEncode")
                .input("text", self.positive_prompt.clone())
                .input("clip", NodeInput::slot(clip_src.0.clone(), clip_src.1)),
        );
        graph.add(
            "4",
            Node::new("CLIPTextEncode")
                .input("text", self.negative_prompt.clone())
                .input("clip", NodeInput::slot(clip_src.0.clone(), clip_src.1)),
        );
        graph.add(
            "5",
            Node::new("KSampler")
                .input("seed", seed)
                .input("steps", self.steps)
                .input("cfg", self.cfg)
                .input("sampler_name", self.sampler.clone())
                .input("scheduler", self.scheduler.clone())
                .input("denoise", 1.0)
                .input("model", NodeInput::slot(model_src.0.clone(), model_src.1))
                .input("positive", NodeInput::slot("3", 0))
                .input("negative", NodeInput::slot("4", 0))
                .input("latent_image", NodeInput::slot("2", 0)),
        );
        graph.add(
            "6",
            Node::new("VAEDecode")
                .input("samples", NodeInput::slot("5", 0))
                .input("vae", NodeInput::slot("1", 2)),
        );
        graph.add(
            "7",
            Node::new("SaveImage")
                .input("filename_prefix", self.filename_prefix.clone())
                .input("images", NodeInput::slot("6", 0)),
        );

        (graph, seed)
    }
}

/// Builder for a FLUX txt2img workflow graph.
///
/// FLUX splits the single checkpoint loader into three components:
/// `UNETLoader` for the diffusion model, `DualCLIPLoader` for the paired
/// T5/CLIP-L text encoders, and `VAELoader` for the decoder. The rest of
/// the pipeline matches [`Txt2ImgGraph`], including LoRA splicing between
/// the loaders and their consumers.
///
/// # Example
/// ```
/// use graphgen::FluxGraph;
///
/// let (graph, seed) = FluxGraph::new("a cat in space", "flux1-dev.safetensors")
///     .clips("t5xxl_fp16.safetensors", "clip_l.safetensors")
///     .vae("ae.safetensors")
///     .lora("style.safetensors", 0.8)
///     .build();
///
/// assert!(seed >= 0);
/// assert!(graph.validate().is_ok());
/// ```
#[derive(Debug, Clone)]
pub struct FluxGraph {
    pub positive_prompt: String,
    pub negative_prompt: String,
    pub unet: String,
    pub clip_1: String,
    pub clip_2: String,
    pub vae: String,
    pub width: u32,
    pub height: u32,
    pub steps: u32,
    pub cfg: f64,
    pub sampler: String,
    pub scheduler: String,
    pub seed: i64,
    pub batch_size: u32,
    pub filename_prefix: String,
    pub loras: Vec<(String, f64)>,
}

impl FluxGraph {
    /// Create a new builder with a prompt and UNET model name. Defaults:
    /// 1024x1024, 20 steps, cfg 7.0, euler/normal.
    pub fn new(prompt: impl Into<String>, unet: impl Into<String>) -> Self {
        Self {
            positive_prompt: prompt.into(),
            negative_prompt: "blurry, low quality, distorted".to_string(),
            unet: unet.into(),
            clip_1: "t5xxl_fp16.safetensors".to_string(),
            clip_2: "clip_l.safetensors".to_string(),
            vae: "ae.safetensors".to_string(),
            width: 1024,
            height: 1024,
            steps: 20,
            cfg: 7.0,
            sampler: "euler".to_string(),
            scheduler: "normal".to_string(),
            seed: -1,
            batch_size: 1,
            filename_prefix: "flux".to_string(),
            loras: Vec::new(),
        }
    }

    /// Set the negative prompt.
    pub fn negative(mut self, prompt: impl Into<String>) -> Self {
        self.negative_prompt = prompt.into();
        self
    }

    /// Set the paired text-encoder model names (T5, CLIP-L).
    pub fn clips(mut self, clip_1: impl Into<String>, clip_2: impl Into<String>) -> Self {
        self.clip_1 = clip_1.into();
        self.clip_2 = clip_2.into();
        self
    }

    /// Set the VAE model name.
    pub fn vae(mut self, vae: impl Into<String>) -> Self {
        self.vae = vae.into();
        self
    }

    /// Set output dimensions.
    pub fn size(mut self, width: u32, height: u32) -> Self {
        self.width = width;
        self.height = height;
        self
    }

    /// Set the number of sampling steps.
    pub fn steps(mut self, steps: u32) -> Self {
        self.steps = steps;
        self
    }

    /// Set the classifier-free guidance scale.
    pub fn cfg(mut self, cfg: f64) -> Self {
        self.cfg = cfg;
        self
    }

    /// Set the sampler algorithm.
    pub fn sampler(mut self, sampler: impl Into<String>) -> Self {
        self.sampler = sampler.into();
        self
    }

    /// Set the noise scheduler.
    pub fn scheduler(mut self, scheduler: impl Into<String>) -> Self {
        self.scheduler = scheduler.into();
        self
    }

    /// Set a specific seed. Use -1 (the default) for random.
    pub fn seed(mut self, seed: i64) -> Self {
        self.seed = seed;
        self
    }

    /// Set the batch size (number of images per generation).
    pub fn batch_size(mut self, size: u32) -> Self {
        self.batch_size = size;
        self
    }

    /// Set the output filename prefix on the render server.
    pub fn filename_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.filename_prefix = prefix.into();
        self
    }

    /// Stack a LoRA onto the model. The same strength is applied to the
    /// model and CLIP weights. Multiple LoRAs chain in insertion order.
    pub fn lora(mut self, name: impl Into<String>, strength: f64) -> Self {
        self.loras.push((name.into(), strength));
        self
    }

    /// Build the workflow graph and resolve the seed.
    ///
    /// Same contract as [`Txt2ImgGraph::build`]: returns
    /// `(graph, actual_seed)` and the graph always passes
    /// [`Graph::validate`].
    pub fn build(&self) -> (Graph, i64) {
        let seed = if self.seed < 0 {
            rand::rng().random_range(0..i64::MAX)
        } else {
            self.seed
        };

        let mut graph = Graph::new();
        graph.add("10", Node::new("UNETLoader").input("unet_name", self.unet.clone()));
        graph.add(
            "11",
            Node::new("DualCLIPLoader")
                .input("clip_name1", self.clip_1.clone())
                .input("clip_name2", self.clip_2.clone()),
        );
        graph.add("12", Node::new("VAELoader").input("vae_name", self.vae.clone()));

        // Both encoders read the dual-CLIP output slot 0, unlike the
        // checkpoint pipeline where CLIP is slot 1.
        let mut model_src = ("10".to_string(), 0u32);
        let mut clip_src = ("11".to_string(), 0u32);
        for (i, (name, strength)) in self.loras.iter().enumerate() {
            let id = format!("lora{}", i + 1);
            graph.add(
                id.clone(),
                Node::new("LoraLoader")
                    .input("lora_name", name.clone())
                    .input("strength_model", *strength)
                    .input("strength_clip", *strength)
                    .input("model", NodeInput::slot(model_src.0.clone(), model_src.1))
                    .input("clip", NodeInput::slot(clip_src.0.clone(), clip_src.1)),
            );
            model_src = (id.clone(), 0);
            clip_src = (id, 1);
        }

        graph.add(
            "1",
            Node::new("EmptyLatentImage")
                .input("width", self.width)
                .input("height", self.height)
                .input("batch_size", self.batch_size),
        );
        graph.add(
            "2",
            Node::new("CLIPTextEncode")
                .input("text", self.positive_prompt.clone())
                .input("clip", NodeInput::slot(clip_src.0.clone(), clip_src.1)),
        );
        graph.add(
            "3",
            Node::new("CLIPTextEncode")
                .input("text", self.negative_prompt.clone())
                .input("clip", NodeInput::slot(clip_src.0.clone(), clip_src.1)),
        );
        graph.add(
            "4",
            Node::new("KSampler")
                .input("seed", seed)
                .input("steps", self.steps)
                .input("cfg", self.cfg)
                .input("sampler_name", self.sampler.clone())
                .input("scheduler", self.scheduler.clone())
                .input("denoise", 1.0)
                .input("model", NodeInput::slot(model_src.0.clone(), model_src.1))
                .input("positive", NodeInput::slot("2", 0))
                .input("negative", NodeInput::slot("3", 0))
                .input("latent_image", NodeInput::slot("1", 0)),
        );
        graph.add(
            "5",
            Node::new("VAEDecode")
                .input("samples", NodeInput::slot("4", 0))
                .input("vae", NodeInput::slot("12", 0)),
        );
        graph.add(
            "6",
            Node::new("SaveImage")
                .input("filename_prefix", self.filename_prefix.clone())
                .input("images", NodeInput::slot("5", 0)),
        );

        (graph, seed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::NodeInput;
    use serde_json::json;

    fn make_request() -> Txt2ImgGraph {
        Txt2ImgGraph::new("masterpiece, best quality, a cat", "dreamshaper_8.safetensors")
            .negative("lowres, blurry")
            .size(512, 768)
            .steps(25)
            .cfg(7.5)
            .sampler("dpmpp_2m")
            .scheduler("karras")
            .seed(12345)
    }

    #[test]
    fn test_build_has_all_nodes() {
        let (graph, _) = make_request().build();
        for i in 1..=7 {
            assert!(graph.get(&i.to_string()).is_some(), "Missing node {}", i);
        }
    }

    #[test]
    fn test_build_validates() {
        let (graph, _) = make_request().build();
        assert!(graph.validate().is_ok());
    }

    #[test]
    fn test_checkpoint_loader() {
        let (graph, _) = make_request().build();
        let node = graph.get("1").unwrap();
        assert_eq!(node.class_type, "CheckpointLoaderSimple");
        assert_eq!(
            node.inputs["ckpt_name"],
            NodeInput::Value(json!("dreamshaper_8.safetensors"))
        );
    }

    #[test]
    fn test_sampler_settings() {
        let (graph, seed) = make_request().build();
        let node = graph.get("5").unwrap();
        assert_eq!(node.class_type, "KSampler");
        assert_eq!(seed, 12345);
        assert_eq!(node.inputs["seed"], NodeInput::Value(json!(12345)));
        assert_eq!(node.inputs["steps"], NodeInput::Value(json!(25)));
        assert_eq!(node.inputs["cfg"], NodeInput::Value(json!(7.5)));
        assert_eq!(node.inputs["sampler_name"], NodeInput::Value(json!("dpmpp_2m")));
        assert_eq!(node.inputs["scheduler"], NodeInput::Value(json!("karras")));
    }

    #[test]
    fn test_random_seed_when_negative() {
        let (graph, seed) = make_request().seed(-1).build();
        assert!(seed >= 0, "Random seed should be non-negative");
        assert_eq!(
            graph.get("5").unwrap().inputs["seed"],
            NodeInput::Value(json!(seed))
        );
    }

    #[test]
    fn test_text_encoders() {
        let (graph, _) = make_request().build();
        assert_eq!(
            graph.get("3").unwrap().inputs["text"],
            NodeInput::Value(json!("masterpiece, best quality, a cat"))
        );
        assert_eq!(graph.get("3").unwrap().inputs["clip"], NodeInput::slot("1", 1));
        assert_eq!(
            graph.get("4").unwrap().inputs["text"],
            NodeInput::Value(json!("lowres, blurry"))
        );
    }

    #[test]
    fn test_node_connections() {
        let (graph, _) = make_request().build();
        let sampler = graph.get("5").unwrap();
        assert_eq!(sampler.inputs["model"], NodeInput::slot("1", 0));
        assert_eq!(sampler.inputs["positive"], NodeInput::slot("3", 0));
        assert_eq!(sampler.inputs["negative"], NodeInput::slot("4", 0));
        assert_eq!(sampler.inputs["latent_image"], NodeInput::slot("2", 0));
        assert_eq!(graph.get("6").unwrap().inputs["samples"], NodeInput::slot("5", 0));
        assert_eq!(graph.get("6").unwrap().inputs["vae"], NodeInput::slot("1", 2));
        assert_eq!(graph.get("7").unwrap().inputs["images"], NodeInput::slot("6", 0));
    }

    #[test]
    fn test_single_lora_chain() {
        let (graph, _) = make_request().lora("instagram_v2.safetensors", 0.8).build();
        let lora = graph.get("lora1").unwrap();
        assert_eq!(lora.class_type, "LoraLoader");
        assert_eq!(lora.inputs["model"], NodeInput::slot("1", 0));
        assert_eq!(lora.inputs["clip"], NodeInput::slot("1", 1));
        assert_eq!(lora.inputs["strength_model"], NodeInput::Value(json!(0.8)));

        // Sampler and encoders re-route through the LoRA outputs.
        assert_eq!(graph.get("5").unwrap().inputs["model"], NodeInput::slot("lora1", 0));
        assert_eq!(graph.get("3").unwrap().inputs["clip"], NodeInput::slot("lora1", 1));
        // VAE still comes from the checkpoint.
        assert_eq!(graph.get("6").unwrap().inputs["vae"], NodeInput::slot("1", 2));
        assert!(graph.validate().is_ok());
    }

    #[test]
    fn test_stacked_loras_chain_in_order() {
        let (graph, _) = make_request()
            .lora("style.safetensors", 0.7)
            .lora("detail.safetensors", 0.5)
            .build();
        let second = graph.get("lora2").unwrap();
        assert_eq!(second.inputs["model"], NodeInput::slot("lora1", 0));
        assert_eq!(second.inputs["clip"], NodeInput::slot("lora1", 1));
        assert_eq!(graph.get("5").unwrap().inputs["model"], NodeInput::slot("lora2", 0));
        assert!(graph.validate().is_ok());
    }

    #[test]
    fn test_defaults() {
        let req = Txt2ImgGraph::new("test prompt", "model.safetensors");
        assert_eq!(req.width, 512);
        assert_eq!(req.height, 768);
        assert_eq!(req.steps, 25);
        assert_eq!(req.cfg, 7.5);
        assert_eq!(req.sampler, "euler");
        assert_eq!(req.scheduler, "normal");
        assert_eq!(req.seed, -1);
        assert_eq!(req.batch_size, 1);
        assert!(req.negative_prompt.is_empty());
        assert!(req.loras.is_empty());
    }

    #[test]
    fn test_wire_serialization() {
        let (graph, _) = make_request().build();
        let value = graph.to_value().unwrap();
        assert_eq!(value["5"]["inputs"]["model"], json!(["1", 0]));
        assert_eq!(value["7"]["class_type"], json!("SaveImage"));
    }

    fn make_flux_request() -> FluxGraph {
        FluxGraph::new("a cat in space, detailed", "flux1-dev.safetensors")
            .clips("t5xxl_fp16.safetensors", "clip_l.safetensors")
            .vae("ae.safetensors")
            .negative("blurry")
            .seed(777)
    }

    #[test]
    fn test_flux_split_loaders() {
        let (graph, _) = make_flux_request().build();
        assert_eq!(graph.get("10").unwrap().class_type, "UNETLoader");
        assert_eq!(
            graph.get("10").unwrap().inputs["unet_name"],
            NodeInput::Value(json!("flux1-dev.safetensors"))
        );
        let dual = graph.get("11").unwrap();
        assert_eq!(dual.class_type, "DualCLIPLoader");
        assert_eq!(dual.inputs["clip_name1"], NodeInput::Value(json!("t5xxl_fp16.safetensors")));
        assert_eq!(dual.inputs["clip_name2"], NodeInput::Value(json!("clip_l.safetensors")));
        assert_eq!(graph.get("12").unwrap().class_type, "VAELoader");
        assert_eq!(
            graph.get("12").unwrap().inputs["vae_name"],
            NodeInput::Value(json!("ae.safetensors"))
        );
    }

    #[test]
    fn test_flux_node_connections() {
        let (graph, _) = make_flux_request().build();
        let sampler = graph.get("4").unwrap();
        assert_eq!(sampler.inputs["model"], NodeInput::slot("10", 0));
        assert_eq!(sampler.inputs["positive"], NodeInput::slot("2", 0));
        assert_eq!(sampler.inputs["negative"], NodeInput::slot("3", 0));
        assert_eq!(sampler.inputs["latent_image"], NodeInput::slot("1", 0));
        // Both encoders read the dual-CLIP output slot 0.
        assert_eq!(graph.get("2").unwrap().inputs["clip"], NodeInput::slot("11", 0));
        assert_eq!(graph.get("3").unwrap().inputs["clip"], NodeInput::slot("11", 0));
        assert_eq!(graph.get("5").unwrap().inputs["samples"], NodeInput::slot("4", 0));
        assert_eq!(graph.get("5").unwrap().inputs["vae"], NodeInput::slot("12", 0));
        assert_eq!(graph.get("6").unwrap().inputs["images"], NodeInput::slot("5", 0));
        assert!(graph.validate().is_ok());
    }

    #[test]
    fn test_flux_lora_splice() {
        let (graph, _) = make_flux_request().lora("style.safetensors", 0.8).build();
        let lora = graph.get("lora1").unwrap();
        assert_eq!(lora.class_type, "LoraLoader");
        assert_eq!(lora.inputs["model"], NodeInput::slot("10", 0));
        assert_eq!(lora.inputs["clip"], NodeInput::slot("11", 0));
        assert_eq!(lora.inputs["strength_model"], NodeInput::Value(json!(0.8)));

        // Sampler and encoders re-route through the LoRA outputs.
        assert_eq!(graph.get("4").unwrap().inputs["model"], NodeInput::slot("lora1", 0));
        assert_eq!(graph.get("2").unwrap().inputs["clip"], NodeInput::slot("lora1", 1));
        // VAE still comes from its own loader.
        assert_eq!(graph.get("5").unwrap().inputs["vae"], NodeInput::slot("12", 0));
        assert!(graph.validate().is_ok());
    }

    #[test]
    fn test_flux_stacked_loras_chain_in_order() {
        let (graph, _) = make_flux_request()
            .lora("style.safetensors", 0.7)
            .lora("detail.safetensors", 0.5)
            .build();
        let second = graph.get("lora2").unwrap();
        assert_eq!(second.inputs["model"], NodeInput::slot("lora1", 0));
        assert_eq!(second.inputs["clip"], NodeInput::slot("lora1", 1));
        assert_eq!(graph.get("4").unwrap().inputs["model"], NodeInput::slot("lora2", 0));
        assert!(graph.validate().is_ok());
    }

    #[test]
    fn test_flux_defaults() {
        let req = FluxGraph::new("test prompt", "flux1-schnell.safetensors");
        assert_eq!(req.width, 1024);
        assert_eq!(req.height, 1024);
        assert_eq!(req.steps, 20);
        assert_eq!(req.cfg, 7.0);
        assert_eq!(req.sampler, "euler");
        assert_eq!(req.scheduler, "normal");
        assert_eq!(req.seed, -1);
        assert_eq!(req.filename_prefix, "flux");
        assert!(req.loras.is_empty());
    }

    #[test]
    fn test_flux_random_seed_when_negative() {
        let (graph, seed) = make_flux_request().seed(-1).build();
        assert!(seed >= 0);
        assert_eq!(
            graph.get("4").unwrap().inputs["seed"],
            NodeInput::Value(json!(seed))
        );
    }
}
