//! # cloudgen
//!
//! Thin clients for hosted image-generation APIs.
//!
//! Two provider shapes are covered:
//!
//! - [`FalClient`] is a queued API: POST the request to a per-model queue,
//!   receive a request id, poll status until `COMPLETED`, then fetch the
//!   final response carrying image URLs.
//! - [`HfClient`] is a synchronous inference API: a single POST returns
//!   the image bytes, with a capped retry loop for 503 "model loading"
//!   responses.
//!
//! Generation itself is entirely the provider's business; these clients
//! only shape requests, enforce timeouts, and classify failures so a
//! batch can continue past a bad item.

pub mod error;
pub mod fal;
pub mod hf;
pub mod types;

pub use error::{CloudError, Result};
pub use fal::FalClient;
pub use hf::HfClient;
pub use types::{FalOutput, FalRequest, FalStatus, HfParameters, HfRequest, HostedImage};
