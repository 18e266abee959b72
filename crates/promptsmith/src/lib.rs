//! # promptsmith
//!
//! Rewrites terse image-generation prompts into detailed ones using a
//! local Ollama-style text-generation server, with defensive JSON
//! extraction and a deterministic offline fallback.
//!
//! The remote path POSTs an instruction template to `/api/generate` and
//! parses the model's `response` field through a two-stage decode (strict
//! JSON, then bounded best-effort extraction). Any failure (unreachable
//! server, non-200 status, unparseable output) degrades to a fixed set of
//! quality descriptors appended to the base prompt and a fixed negative
//! prompt.
//!
//! ## Quick Start
//!
//! ```no_run
//! use promptsmith::Enhancer;
//!
//! # async fn example() {
//! let endpoint = Enhancer::discover(&[
//!     "http://127.0.0.1:11434",
//!     "http://localhost:11434",
//! ])
//! .await
//! .unwrap_or_else(|| "http://127.0.0.1:11434".to_string());
//!
//! let enhancer = Enhancer::new(endpoint, "mistral");
//! let enhancement = enhancer.enhance("a cat on a windowsill").await;
//! println!("{}", enhancement.optimized_prompt);
//! println!("avoid: {}", enhancement.negative_prompt);
//! # }
//! ```

pub mod enhancer;
pub mod error;
pub mod parser;
pub mod types;

pub use enhancer::{Enhancer, FALLBACK_KEYWORDS, FALLBACK_NEGATIVE};
pub use error::{EnhanceError, Result};
pub use parser::parse_enhancement;
pub use types::{Enhancement, RecommendedSettings};
