//! Generate a single image from a text prompt.
//!
//! Requires a running render server at http://127.0.0.1:8188
//! with at least one checkpoint installed.
//!
//! ```sh
//! cargo run --example generate
//! ```

use graphgen::{JobOutcome, RenderClient, Txt2ImgGraph};
use std::time::Duration;

#[tokio::main]
async fn main() -> std::result::Result<(), Box<dyn std::error::Error>> {
    let client = RenderClient::new("http://127.0.0.1:8188");

    if !client.health().await? {
        eprintln!("Render server is not responding");
        return Ok(());
    }
    println!("Render server is online");

    let checkpoints = client.checkpoints().await?;
    if checkpoints.is_empty() {
        eprintln!("No checkpoints found — install a model first");
        return Ok(());
    }
    println!("Using checkpoint: {}", checkpoints[0]);

    let (graph, seed) = Txt2ImgGraph::new("a red apple on a table", &checkpoints[0])
        .negative("blurry, low quality")
        .steps(25)
        .cfg(7.5)
        .build();
    println!("Seed: {}", seed);

    let job_id = client.submit(&graph).await?;
    println!("Submitted job: {}", job_id);

    match client
        .wait_for_completion(&job_id, Duration::from_secs(120))
        .await
    {
        JobOutcome::Completed { images } => {
            println!("Generated {} image(s)", images.len());
            for img in &images {
                let bytes = client.fetch_image(img).await?;
                std::fs::write(&img.filename, &bytes)?;
                println!("Saved: {}", img.filename);
            }
        }
        JobOutcome::Failed { error } => eprintln!("Generation failed: {}", error),
        JobOutcome::TimedOut => eprintln!("Generation timed out"),
    }

    Ok(())
}
