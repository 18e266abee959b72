//! # civitai
//!
//! Read-mostly client for the CivitAI model index. Searches for LoRA
//! models, fetches version metadata, resolves the downloadable file for
//! a version, and downloads it with optional API-key auth.

pub mod client;
pub mod error;
pub mod types;

pub use client::{primary_file, safe_filename, CivitaiClient};
pub use error::{CivitaiError, Result};
pub use types::{Model, ModelFile, ModelStats, ModelVersion};
