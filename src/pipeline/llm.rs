//! Generation-service interaction: send one prompt, return the raw body.
//!
//! The request body is the local Ollama `/api/generate` contract:
//!
//! ```json
//! {"model": "...", "prompt": "...", "stream": false, "format": "json",
//!  "options": {"temperature": 0.1, "seed": 42}}
//! ```
//!
//! The response body is returned untouched; decoding it is the validator's
//! job so that malformed answers can be reported with the raw text.
//!
//! ## Timeout and retry policy
//!
//! Each request carries the configured timeout (default 120 s). Transport
//! failures and 5xx answers are retried `max_retries` times with doubling
//! backoff (`retry_backoff_ms * 2^attempt`, capped at one minute). The default of zero retries
//! keeps the one-attempt-per-document behaviour.

use crate::config::ExtractionConfig;
use crate::error::{DocumentError, StatementError};
use crate::pipeline::prompt::{ExtractionPrompt, SamplingOptions};
use async_trait::async_trait;
use serde::Serialize;
use std::time::{Duration, Instant};
use tokio::time::sleep;
use tracing::{debug, warn};

/// Anything that can turn a prompt into a raw response body.
///
/// [`OllamaClient`] is the production implementation; tests substitute
/// in-process stubs.
#[async_trait]
pub trait GenerationBackend: Send + Sync {
    async fn generate(&self, prompt: &ExtractionPrompt) -> Result<String, DocumentError>;
}

/// Wire shape of a generate request.
#[derive(Debug, Serialize)]
pub struct GenerateRequest<'a> {
    pub model: &'a str,
    pub prompt: &'a str,
    pub stream: bool,
    pub format: &'a str,
    pub options: SamplingOptions,
}

impl<'a> GenerateRequest<'a> {
    pub fn from_prompt(p: &'a ExtractionPrompt) -> Self {
        Self {
            model: &p.options.model,
            prompt: &p.prompt,
            stream: false,
            format: p.options.format,
            options: p.options.sampling,
        }
    }
}

/// HTTP client for a local Ollama-compatible generate endpoint.
#[derive(Debug, Clone)]
pub struct OllamaClient {
    http: reqwest::Client,
    endpoint: String,
    timeout_secs: Option<u64>,
    max_retries: u32,
    retry_backoff_ms: u64,
}

impl OllamaClient {
    pub fn new(config: &ExtractionConfig) -> Result<Self, StatementError> {
        let mut builder = reqwest::Client::builder();
        if let Some(secs) = config.request_timeout_secs {
            builder = builder.timeout(Duration::from_secs(secs));
        }
        let http = builder
            .build()
            .map_err(|e| StatementError::ClientBuildFailed {
                endpoint: config.endpoint.clone(),
                reason: e.to_string(),
            })?;

        Ok(Self {
            http,
            endpoint: config.endpoint.clone(),
            timeout_secs: config.request_timeout_secs,
            max_retries: config.max_retries,
            retry_backoff_ms: config.retry_backoff_ms,
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    async fn attempt(&self, body: &GenerateRequest<'_>) -> Result<String, Attempt> {
        let response = self
            .http
            .post(&self.endpoint)
            .json(body)
            .send()
            .await
            .map_err(|e| Attempt::retryable(self.describe(&e), None))?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            let message = if text.trim().is_empty() {
                format!("HTTP {} from {}", status, self.endpoint)
            } else {
                format!("HTTP {} from {}: {}", status, self.endpoint, text.trim())
            };
            return Err(Attempt {
                message,
                status: Some(status.as_u16()),
                retryable: status.is_server_error(),
            });
        }

        response
            .text()
            .await
            .map_err(|e| Attempt::retryable(self.describe(&e), Some(status.as_u16())))
    }

    fn describe(&self, e: &reqwest::Error) -> String {
        if e.is_timeout() {
            match self.timeout_secs {
                Some(secs) => format!("Request to {} timed out after {}s", self.endpoint, secs),
                None => format!("Request to {} timed out", self.endpoint),
            }
        } else if e.is_connect() {
            format!(
                "Could not connect to {} (is the model service running?): {}",
                self.endpoint, e
            )
        } else {
            format!("Request to {} failed: {}", self.endpoint, e)
        }
    }
}

/// Longest pause between two attempts.
pub const MAX_RETRY_DELAY_MS: u64 = 60_000;

/// Delay before retry number `attempt + 1`: `base_ms * 2^attempt`, capped at
/// [`MAX_RETRY_DELAY_MS`].
pub fn retry_delay_ms(base_ms: u64, attempt: u32) -> u64 {
    let factor = 2u64.checked_pow(attempt).unwrap_or(u64::MAX);
    base_ms.saturating_mul(factor).min(MAX_RETRY_DELAY_MS)
}

/// Outcome of a single failed attempt.
struct Attempt {
    message: String,
    status: Option<u16>,
    retryable: bool,
}

impl Attempt {
    fn retryable(message: String, status: Option<u16>) -> Self {
        Self {
            message,
            status,
            retryable: true,
        }
    }
}

#[async_trait]
impl GenerationBackend for OllamaClient {
    async fn generate(&self, prompt: &ExtractionPrompt) -> Result<String, DocumentError> {
        let body = GenerateRequest::from_prompt(prompt);
        let start = Instant::now();
        let mut attempt = 0u32;

        loop {
            match self.attempt(&body).await {
                Ok(text) => {
                    debug!(
                        "Generate: {} bytes from {} in {:?}",
                        text.len(),
                        self.endpoint,
                        start.elapsed()
                    );
                    return Ok(text);
                }
                Err(failure) if failure.retryable && attempt < self.max_retries => {
                    let backoff = retry_delay_ms(self.retry_backoff_ms, attempt);
                    attempt += 1;
                    warn!(
                        "Generate: attempt {} failed: {}; retry {}/{} after {}ms",
                        attempt, failure.message, attempt, self.max_retries, backoff
                    );
                    sleep(Duration::from_millis(backoff)).await;
                }
                Err(failure) => {
                    warn!("Generate: giving up: {}", failure.message);
                    return Err(DocumentError::Transport {
                        message: failure.message,
                        status: failure.status,
                    });
                }
            }
        }
    }
}
