use std::time::Duration;

use reqwest::Client;
use serde_json::Value;
use tracing::{debug, warn};

use crate::error::{RenderError, Result};
use crate::graph::Graph;
use crate::types::*;

const POLL_INTERVAL: Duration = Duration::from_secs(2);
const MAX_ERROR_BODY: usize = 500;

fn normalize(endpoint: String) -> String {
    endpoint.trim_end_matches('/').to_string()
}

fn truncate_body(mut body: String) -> String {
    if body.len() > MAX_ERROR_BODY {
        let mut end = MAX_ERROR_BODY;
        while !body.is_char_boundary(end) {
            end -= 1;
        }
        body.truncate(end);
        body.push('…');
    }
    body
}

/// Async client for a node-graph render server.
///
/// Provides job submission, history retrieval, polling-based completion
/// waiting, image download, and model discovery.
///
/// # Example
/// ```no_run
/// use graphgen::RenderClient;
///
/// # async fn example() -> graphgen::Result<()> {
/// let client = RenderClient::new("http://127.0.0.1:8188");
/// let healthy = client.health().await?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct RenderClient {
    http: Client,
    endpoint: String,
    client_id: String,
}

impl RenderClient {
    /// Create a new client pointing at the given render-server endpoint.
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            http: Client::new(),
            endpoint: normalize(endpoint.into()),
            client_id: "graphgen".to_string(),
        }
    }

    /// Use a custom `reqwest::Client` (for connection pooling, timeouts, TLS).
    pub fn with_http_client(mut self, client: Client) -> Self {
        self.http = client;
        self
    }

    /// Set the client ID sent with each submission.
    pub fn with_client_id(mut self, id: impl Into<String>) -> Self {
        self.client_id = id.into();
        self
    }

    /// Returns the configured endpoint URL.
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Returns the configured client ID.
    pub fn client_id(&self) -> &str {
        &self.client_id
    }

    // ── Health ──────────────────────────────────────────────────────

    /// Check whether the render server is reachable via `/system_stats`.
    pub async fn health(&self) -> Result<bool> {
        let url = format!("{}/system_stats", self.endpoint);
        let resp = self
            .http
            .get(&url)
            .timeout(Duration::from_secs(5))
            .send()
            .await
            .map_err(|e| RenderError::Network {
                context: format!(
                    "Cannot connect to render server at {} — is the service running?",
                    self.endpoint
                ),
                source: e,
            })?;
        Ok(resp.status().is_success())
    }

    // ── Submission ──────────────────────────────────────────────────

    /// Submit a workflow graph for execution. Returns the job id.
    ///
    /// No retries are performed and no deduplication happens server-side:
    /// submitting the same graph twice yields two independent job ids.
    pub async fn submit(&self, graph: &Graph) -> Result<String> {
        let url = format!("{}/prompt", self.endpoint);
        let body = serde_json::json!({
            "prompt": graph,
            "client_id": self.client_id,
        });

        let resp = self
            .http
            .post(&url)
            .timeout(Duration::from_secs(30))
            .json(&body)
            .send()
            .await
            .map_err(|e| RenderError::Network {
                context: format!(
                    "Cannot connect to render server at {} — is the service running?",
                    self.endpoint
                ),
                source: e,
            })?;

        if !resp.status().is_success() {
            let status = resp.status().as_u16();
            let body_text = truncate_body(resp.text().await.unwrap_or_default());
            warn!(status, body = %body_text, "graph submission rejected");
            return Err(RenderError::Http {
                status,
                body: body_text,
            });
        }

        let json: Value = resp.json().await.map_err(|e| RenderError::Network {
            context: "Failed to parse submit response".into(),
            source: e,
        })?;

        if let Some(errors) = json.get("node_errors") {
            if let Some(obj) = errors.as_object() {
                if !obj.is_empty() {
                    return Err(RenderError::NodeErrors(
                        serde_json::to_string_pretty(errors).unwrap_or_default(),
                    ));
                }
            }
        }

        json.get("prompt_id")
            .and_then(|v| v.as_str())
            .map(|s| s.to_string())
            .ok_or_else(|| RenderError::InvalidResponse("Response missing prompt_id".into()))
    }

    // ── History ─────────────────────────────────────────────────────

    /// Fetch the history entry for a job. Returns `None` until the job id
    /// appears as a key in the history response.
    pub async fn history(&self, job_id: &str) -> Result<Option<JobHistory>> {
        let url = format!("{}/history/{}", self.endpoint, job_id);
        let resp = self
            .http
            .get(&url)
            .timeout(Duration::from_secs(10))
            .send()
            .await
            .map_err(|e| RenderError::Network {
                context: "Failed to fetch job history".into(),
                source: e,
            })?;

        if !resp.status().is_success() {
            return Ok(None);
        }

        let json: Value = resp.json().await.map_err(|e| RenderError::Network {
            context: "Failed to parse history response".into(),
            source: e,
        })?;

        let entry = match json.get(job_id) {
            Some(e) => e,
            None => return Ok(None),
        };

        let status = entry
            .pointer("/status/status_str")
            .and_then(|v| v.as_str())
            .unwrap_or("unknown");

        let completed = entry
            .pointer("/status/completed")
            .and_then(|v| v.as_bool())
            .unwrap_or(false);

        let mut images = Vec::new();
        if let Some(outputs) = entry.get("outputs").and_then(|o| o.as_object()) {
            for node_output in outputs.values() {
                if let Some(imgs) = node_output.get("images").and_then(|i| i.as_array()) {
                    for img in imgs {
                        if let Some(filename) = img.get("filename").and_then(|f| f.as_str()) {
                            let subfolder =
                                img.get("subfolder").and_then(|s| s.as_str()).unwrap_or("");
                            let img_type =
                                img.get("type").and_then(|t| t.as_str()).unwrap_or("output");
                            images.push(ImageRef {
                                filename: filename.to_string(),
                                subfolder: subfolder.to_string(),
                                img_type: img_type.to_string(),
                            });
                        }
                    }
                }
            }
        }

        Ok(Some(JobHistory {
            status: status.to_string(),
            completed,
            images,
        }))
    }

    // ── Completion waiting ──────────────────────────────────────────

    /// Poll `/history` until the job completes, fails, or times out.
    ///
    /// This is a coarse binary wait: no partial-progress reporting.
    /// Network errors during polling are treated as "not yet complete"
    /// and polling continues until the wall-clock budget elapses.
    pub async fn wait_for_completion(&self, job_id: &str, timeout: Duration) -> JobOutcome {
        self.wait_with_interval(job_id, POLL_INTERVAL, timeout).await
    }

    /// Poll with a custom interval.
    pub async fn wait_with_interval(
        &self,
        job_id: &str,
        poll_interval: Duration,
        timeout: Duration,
    ) -> JobOutcome {
        let start = std::time::Instant::now();
        loop {
            if start.elapsed() > timeout {
                return JobOutcome::TimedOut;
            }
            match self.history(job_id).await {
                Ok(Some(history)) => {
                    if history.completed {
                        return JobOutcome::Completed {
                            images: history.images,
                        };
                    } else if history.status == "error" {
                        return JobOutcome::Failed {
                            error: "render server reported generation failure".into(),
                        };
                    }
                }
                Ok(None) => {}
                Err(e) => {
                    debug!(job_id, error = %e, "poll attempt failed, retrying");
                }
            }
            tokio::time::sleep(poll_interval).await;
        }
    }

    // ── Image download ──────────────────────────────────────────────

    /// Download an output image by its reference. Returns raw bytes.
    pub async fn fetch_image(&self, img: &ImageRef) -> Result<Vec<u8>> {
        let url = reqwest::Url::parse_with_params(
            &format!("{}/view", self.endpoint),
            &[
                ("filename", img.filename.as_str()),
                ("subfolder", img.subfolder.as_str()),
                ("type", img.img_type.as_str()),
            ],
        )
        .map_err(|e| RenderError::InvalidResponse(format!("Bad image URL: {}", e)))?;

        let resp = self
            .http
            .get(url)
            .timeout(Duration::from_secs(30))
            .send()
            .await
            .map_err(|e| RenderError::Network {
                context: format!("Failed to fetch image {}", img.filename),
                source: e,
            })?;

        if !resp.status().is_success() {
            return Err(RenderError::Http {
                status: resp.status().as_u16(),
                body: format!("Failed to fetch image {}", img.filename),
            });
        }

        let bytes = resp.bytes().await.map_err(|e| RenderError::Network {
            context: "Failed to read image bytes".into(),
            source: e,
        })?;
        Ok(bytes.to_vec())
    }

    // ── Model discovery ─────────────────────────────────────────────

    /// List available checkpoint models.
    pub async fn checkpoints(&self) -> Result<Vec<String>> {
        self.object_info_list(
            "CheckpointLoaderSimple",
            "/CheckpointLoaderSimple/input/required/ckpt_name/0",
        )
        .await
    }

    /// List available LoRA models.
    pub async fn loras(&self) -> Result<Vec<String>> {
        self.object_info_list("LoraLoader", "/LoraLoader/input/required/lora_name/0")
            .await
    }

    /// List available sampler algorithms.
    pub async fn samplers(&self) -> Result<Vec<String>> {
        self.object_info_list("KSampler", "/KSampler/input/required/sampler_name/0")
            .await
    }

    /// List available noise schedulers.
    pub async fn schedulers(&self) -> Result<Vec<String>> {
        self.object_info_list("KSampler", "/KSampler/input/required/scheduler/0")
            .await
    }

    async fn object_info_list(&self, node: &str, pointer: &str) -> Result<Vec<String>> {
        let url = format!("{}/object_info/{}", self.endpoint, node);
        let resp = self
            .http
            .get(&url)
            .timeout(Duration::from_secs(10))
            .send()
            .await
            .map_err(|e| RenderError::Network {
                context: format!(
                    "Cannot connect to render server at {} — is the service running?",
                    self.endpoint
                ),
                source: e,
            })?;

        if !resp.status().is_success() {
            return Ok(Vec::new());
        }

        let json: Value = resp.json().await.map_err(|e| RenderError::Network {
            context: format!("Failed to parse {} object_info", node),
            source: e,
        })?;

        Ok(json
            .pointer(pointer)
            .and_then(|v| v.as_array())
            .map(|arr| {
                arr.iter()
                    .filter_map(|v| v.as_str().map(String::from))
                    .collect()
            })
            .unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Instant;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    /// Serve one canned HTTP response per incoming connection, in order,
    /// then stop accepting. Returns the base URL to point a client at.
    async fn spawn_stub(responses: Vec<String>) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            for response in responses {
                let Ok((mut socket, _)) = listener.accept().await else {
                    return;
                };
                let mut buf = vec![0u8; 4096];
                let mut seen = Vec::new();
                loop {
                    match socket.read(&mut buf).await {
                        Ok(0) => break,
                        Ok(n) => {
                            seen.extend_from_slice(&buf[..n]);
                            if request_complete(&seen) {
                                break;
                            }
                        }
                        Err(_) => break,
                    }
                }
                let _ = socket.write_all(response.as_bytes()).await;
                let _ = socket.shutdown().await;
            }
        });
        format!("http://{}", addr)
    }

    /// Headers plus, when a content-length is declared, the full body.
    fn request_complete(seen: &[u8]) -> bool {
        let Some(header_end) = seen.windows(4).position(|w| w == b"\r\n\r\n") else {
            return false;
        };
        let headers = String::from_utf8_lossy(&seen[..header_end]).to_lowercase();
        let body_len = headers
            .lines()
            .find_map(|l| l.strip_prefix("content-length:"))
            .and_then(|v| v.trim().parse::<usize>().ok())
            .unwrap_or(0);
        seen.len() >= header_end + 4 + body_len
    }

    fn http_response(status_line: &str, body: &str) -> String {
        format!(
            "HTTP/1.1 {}\r\ncontent-type: application/json\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{}",
            status_line,
            body.len(),
            body
        )
    }

    #[test]
    fn test_normalize_endpoint() {
        assert_eq!(normalize("http://localhost:8188/".into()), "http://localhost:8188");
        assert_eq!(normalize("http://localhost:8188".into()), "http://localhost:8188");
        assert_eq!(normalize("http://host:8188///".into()), "http://host:8188");
    }

    #[test]
    fn test_truncate_body() {
        let short = truncate_body("tiny".into());
        assert_eq!(short, "tiny");
        let long = truncate_body("x".repeat(2000));
        assert!(long.len() < 520);
        assert!(long.ends_with('…'));
    }

    #[test]
    fn test_client_builder() {
        let client = RenderClient::new("http://127.0.0.1:8188").with_client_id("my-app");
        assert_eq!(client.endpoint(), "http://127.0.0.1:8188");
        assert_eq!(client.client_id(), "my-app");
    }

    #[test]
    fn test_parse_submit_response() {
        let json: Value = serde_json::from_str(
            r#"{
            "prompt_id": "abc123",
            "number": 1,
            "node_errors": {}
        }"#,
        )
        .unwrap();

        assert_eq!(json.get("prompt_id").and_then(|v| v.as_str()), Some("abc123"));
        assert!(json
            .get("node_errors")
            .and_then(|v| v.as_object())
            .unwrap()
            .is_empty());
    }

    #[test]
    fn test_parse_history_response() {
        let json: Value = serde_json::from_str(
            r#"{
            "abc123": {
                "status": {"status_str": "success", "completed": true},
                "outputs": {
                    "7": {
                        "images": [
                            {"filename": "graphgen_00001_.png", "subfolder": "", "type": "output"}
                        ]
                    }
                }
            }
        }"#,
        )
        .unwrap();

        let entry = json.get("abc123").unwrap();
        assert_eq!(
            entry.pointer("/status/status_str").and_then(|v| v.as_str()),
            Some("success")
        );
        assert_eq!(
            entry.pointer("/status/completed").and_then(|v| v.as_bool()),
            Some(true)
        );
        let images = entry.pointer("/outputs/7/images").and_then(|v| v.as_array());
        assert_eq!(images.unwrap()[0]["filename"], "graphgen_00001_.png");
    }

    #[test]
    fn test_history_missing_job_key() {
        let json: Value = serde_json::from_str(r#"{"other-job": {}}"#).unwrap();
        assert!(json.get("abc123").is_none());
    }

    #[test]
    fn test_parse_checkpoint_object_info() {
        let json: Value = serde_json::from_str(
            r#"{
            "CheckpointLoaderSimple": {
                "input": {
                    "required": {
                        "ckpt_name": [
                            ["dreamshaper_8.safetensors", "deliberate_v3.safetensors"]
                        ]
                    }
                }
            }
        }"#,
        )
        .unwrap();

        let checkpoints = json
            .pointer("/CheckpointLoaderSimple/input/required/ckpt_name/0")
            .and_then(|v| v.as_array())
            .map(|arr| {
                arr.iter()
                    .filter_map(|v| v.as_str().map(String::from))
                    .collect::<Vec<_>>()
            })
            .unwrap_or_default();

        assert_eq!(checkpoints.len(), 2);
        assert_eq!(checkpoints[0], "dreamshaper_8.safetensors");
    }

    #[tokio::test]
    async fn test_submit_500_yields_http_error() {
        let base = spawn_stub(vec![http_response(
            "500 Internal Server Error",
            r#"{"error": "queue unavailable"}"#,
        )])
        .await;
        let client = RenderClient::new(&base);
        let (graph, _) = crate::workflow::Txt2ImgGraph::new("a cat", "model.safetensors").build();

        let err = client.submit(&graph).await.unwrap_err();
        match err {
            RenderError::Http { status, body } => {
                assert_eq!(status, 500);
                assert!(body.contains("queue unavailable"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn test_wait_completes_once_history_appears() {
        // The job id is absent from the first two polls and completed on
        // the third; the poller must keep going and resolve it.
        let history = r#"{
            "abc123": {
                "status": {"status_str": "success", "completed": true},
                "outputs": {
                    "7": {"images": [{"filename": "out_00001_.png", "subfolder": "", "type": "output"}]}
                }
            }
        }"#;
        let base = spawn_stub(vec![
            http_response("200 OK", "{}"),
            http_response("200 OK", "{}"),
            http_response("200 OK", history),
        ])
        .await;
        let client = RenderClient::new(&base);

        let outcome = client
            .wait_with_interval("abc123", Duration::from_millis(20), Duration::from_secs(5))
            .await;
        match outcome {
            JobOutcome::Completed { images } => {
                assert_eq!(images.len(), 1);
                assert_eq!(images[0].filename, "out_00001_.png");
            }
            other => panic!("unexpected outcome: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_wait_times_out_against_dead_endpoint() {
        // Connection errors are swallowed and the wall-clock budget wins.
        let client = RenderClient::new("http://127.0.0.1:1");
        let timeout = Duration::from_millis(300);
        let start = Instant::now();
        let outcome = client
            .wait_with_interval("never-completes", Duration::from_millis(50), timeout)
            .await;
        assert!(matches!(outcome, JobOutcome::TimedOut));
        assert!(start.elapsed() >= timeout);
        assert!(start.elapsed() < Duration::from_secs(5));
    }
}
