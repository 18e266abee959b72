//! # graphgen
//!
//! Typed workflow graphs and an async client for a node-graph image
//! render server.
//!
//! A workflow is a mapping from node id to an operation with named inputs;
//! inputs are either literal parameters or `["node_id", slot]` references
//! to another node's output. [`Txt2ImgGraph`] assembles the standard
//! checkpoint txt2img pipeline (text encoders → sampler → decode → save),
//! [`FluxGraph`] the split-loader FLUX variant, and [`RenderClient`]
//! submits graphs, polls the history endpoint for completion, and
//! downloads outputs.
//!
//! ## Quick Start
//!
//! ```no_run
//! use graphgen::{JobOutcome, RenderClient, Txt2ImgGraph};
//! use std::time::Duration;
//!
//! # async fn example() -> graphgen::Result<()> {
//! let client = RenderClient::new("http://127.0.0.1:8188");
//!
//! let (graph, seed) = Txt2ImgGraph::new("a sunset over mountains", "dreamshaper_8.safetensors")
//!     .negative("lowres, blurry")
//!     .steps(25)
//!     .build();
//!
//! let job_id = client.submit(&graph).await?;
//! let outcome = client
//!     .wait_for_completion(&job_id, Duration::from_secs(120))
//!     .await;
//!
//! if let JobOutcome::Completed { images } = outcome {
//!     for img in &images {
//!         let bytes = client.fetch_image(img).await?;
//!         std::fs::write(&img.filename, &bytes).ok();
//!     }
//! }
//! # Ok(())
//! # }
//! ```

pub mod client;
pub mod error;
pub mod graph;
pub mod types;
pub mod workflow;

pub use client::RenderClient;
pub use error::{RenderError, Result};
pub use graph::{Graph, Node, NodeInput};
pub use types::{ImageRef, JobHistory, JobOutcome};
pub use workflow::{FluxGraph, Txt2ImgGraph};
