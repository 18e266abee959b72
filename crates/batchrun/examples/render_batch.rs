//! Enhance a list of prompts, submit them to a local render server, and
//! wait for each to complete behind a 3-permit concurrency gate.
//!
//! Expects a `secrets.env` in the working directory (or SECRETS_FILE
//! pointing elsewhere) and a render server at RENDER_URL.
//!
//! ```sh
//! cargo run --example render_batch
//! ```

use std::path::PathBuf;
use std::time::Duration;

use batchrun::{save_json, BatchRunner, Config, ItemHandler, ItemResult};
use graphgen::{JobOutcome, RenderClient, Txt2ImgGraph};
use promptsmith::Enhancer;

const PROMPTS: &[(&str, &str)] = &[
    ("apple", "red apple on a table"),
    ("beach", "yoga pose on a beach at golden hour"),
    ("city", "rainy city street at night, neon reflections"),
];

struct RenderHandler {
    client: RenderClient,
    enhancer: Enhancer,
    checkpoint: String,
    workdir: PathBuf,
}

impl ItemHandler<String> for RenderHandler {
    async fn process(&self, name: &str, prompt: &String) -> anyhow::Result<ItemResult> {
        let enhancement = self.enhancer.enhance(prompt).await;
        save_json(&self.workdir, &format!("{name}_enhancement.json"), &enhancement)?;

        let (graph, _seed) = Txt2ImgGraph::new(&enhancement.optimized_prompt, &self.checkpoint)
            .negative(&enhancement.negative_prompt)
            .steps(enhancement.recommended_settings.steps)
            .cfg(enhancement.recommended_settings.cfg)
            .sampler(&enhancement.recommended_settings.sampler)
            .filename_prefix(name)
            .build();
        save_json(&self.workdir, &format!("{name}_graph.json"), &graph)?;

        let job_id = self.client.submit(&graph).await?;
        match self
            .client
            .wait_for_completion(&job_id, Duration::from_secs(300))
            .await
        {
            JobOutcome::Completed { images } => {
                for img in &images {
                    let bytes = self.client.fetch_image(img).await?;
                    std::fs::write(self.workdir.join(&img.filename), bytes)?;
                }
                Ok(ItemResult::success(job_id))
            }
            JobOutcome::Failed { error } => Ok(ItemResult::failure(error)),
            JobOutcome::TimedOut => Ok(ItemResult::failure("timed out after 300s")),
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    batchrun::init_tracing();

    let secrets = std::env::var("SECRETS_FILE").unwrap_or_else(|_| "secrets.env".to_string());
    let config = Config::load(&secrets)?;

    let client = RenderClient::new(&config.render_url);
    if !client.health().await? {
        anyhow::bail!("render server at {} is not responding", config.render_url);
    }

    let checkpoints = client.checkpoints().await?;
    let checkpoint = checkpoints
        .first()
        .cloned()
        .ok_or_else(|| anyhow::anyhow!("no checkpoints installed"))?;
    println!("Using checkpoint: {checkpoint}");

    let handler = RenderHandler {
        client,
        enhancer: Enhancer::new(&config.ollama_url, &config.ollama_model),
        checkpoint,
        workdir: PathBuf::from("generated"),
    };

    let items: Vec<(String, String)> = PROMPTS
        .iter()
        .map(|(name, prompt)| (name.to_string(), prompt.to_string()))
        .collect();

    let summary = BatchRunner::new().run(handler, items).await;
    let log = summary.write(&PathBuf::from("generated"))?;

    println!(
        "Done: {}/{} succeeded in {:.1}s (log: {})",
        summary.succeeded,
        summary.total,
        summary.elapsed_ms as f64 / 1000.0,
        log.display()
    );
    Ok(())
}
