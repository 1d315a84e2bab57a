//! Configuration types for statement extraction.
//!
//! All extraction behaviour is controlled through [`ExtractionConfig`], built
//! via its [`ExtractionConfigBuilder`]. One config is shared by every
//! document of a batch; nothing in it changes between documents, which is
//! what makes two runs over the same files comparable.

use crate::error::StatementError;
use crate::progress::ProgressCallback;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

/// Model used when none is configured.
pub const DEFAULT_MODEL: &str = "llama3.2:1b";

/// Generate endpoint of a stock local Ollama install.
pub const DEFAULT_ENDPOINT: &str = "http://localhost:11434/api/generate";

/// Page-1 text shorter than this pulls in the next page.
pub const MIN_HEADER_CHARS: usize = 100;

/// Never read past this many pages looking for header text.
pub const MAX_HEADER_PAGES: usize = 2;

/// Characters of statement text embedded in the prompt.
pub const MAX_PROMPT_CHARS: usize = 2500;

/// Upper bound accepted for `max_retries`.
pub const MAX_RETRIES_LIMIT: u32 = 10;

pub const DEFAULT_TEMPERATURE: f32 = 0.1;
pub const DEFAULT_SEED: u64 = 42;

/// Configuration for statement extraction.
///
/// # Example
/// ```rust
/// use edgequake_statement::ExtractionConfig;
///
/// let config = ExtractionConfig::builder()
///     .model("llama3.2:3b")
///     .request_timeout_secs(60)
///     .build()
///     .unwrap();
/// assert_eq!(config.seed, 42);
/// ```
#[derive(Clone)]
pub struct ExtractionConfig {
    /// Model identifier sent in every request. Default: `llama3.2:1b`.
    pub model: String,

    /// Full URL of the generate endpoint. Default: local Ollama.
    pub endpoint: String,

    /// Sampling temperature. Default: 0.1.
    pub temperature: f32,

    /// Sampling seed. Default: 42.
    pub seed: u64,

    /// Leading characters of statement text kept in the prompt. Default: 2500.
    pub max_prompt_chars: usize,

    /// Which pages feed the prompt.
    pub page_policy: PageSelectionPolicy,

    /// Per-request timeout in seconds; `None` blocks until the service answers.
    /// Default: 120.
    ///
    /// Expiry is reported as a transport failure for that document only.
    pub request_timeout_secs: Option<u64>,

    /// Extra attempts after a transport failure. Default: 0 (single attempt).
    pub max_retries: u32,

    /// Initial retry delay in milliseconds, doubled per attempt. Default: 500.
    pub retry_backoff_ms: u64,

    /// Explicit pdfium library (file or directory). Falls back to
    /// `PDFIUM_LIB_PATH`, the working directory, then the system library.
    pub pdfium_lib_path: Option<PathBuf>,

    /// Per-document progress events.
    pub progress_callback: Option<ProgressCallback>,
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            model: DEFAULT_MODEL.to_string(),
            endpoint: DEFAULT_ENDPOINT.to_string(),
            temperature: DEFAULT_TEMPERATURE,
            seed: DEFAULT_SEED,
            max_prompt_chars: MAX_PROMPT_CHARS,
            page_policy: PageSelectionPolicy::default(),
            request_timeout_secs: Some(120),
            max_retries: 0,
            retry_backoff_ms: 500,
            pdfium_lib_path: None,
            progress_callback: None,
        }
    }
}

impl fmt::Debug for ExtractionConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExtractionConfig")
            .field("model", &self.model)
            .field("endpoint", &self.endpoint)
            .field("temperature", &self.temperature)
            .field("seed", &self.seed)
            .field("max_prompt_chars", &self.max_prompt_chars)
            .field("page_policy", &self.page_policy)
            .field("request_timeout_secs", &self.request_timeout_secs)
            .field("max_retries", &self.max_retries)
            .field("retry_backoff_ms", &self.retry_backoff_ms)
            .field("pdfium_lib_path", &self.pdfium_lib_path)
            .field(
                "progress_callback",
                &self.progress_callback.as_ref().map(|_| "<dyn ExtractionProgressCallback>"),
            )
            .finish()
    }
}

impl ExtractionConfig {
    /// Create a new builder for `ExtractionConfig`.
    pub fn builder() -> ExtractionConfigBuilder {
        ExtractionConfigBuilder {
            config: Self::default(),
        }
    }
}

/// Builder for [`ExtractionConfig`].
pub struct ExtractionConfigBuilder {
    config: ExtractionConfig,
}

impl fmt::Debug for ExtractionConfigBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExtractionConfigBuilder")
            .field("config", &self.config)
            .finish()
    }
}

impl ExtractionConfigBuilder {
    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.config.model = model.into();
        self
    }

    pub fn endpoint(mut self, url: impl Into<String>) -> Self {
        self.config.endpoint = url.into();
        self
    }

    pub fn temperature(mut self, t: f32) -> Self {
        self.config.temperature = t;
        self
    }

    pub fn seed(mut self, seed: u64) -> Self {
        self.config.seed = seed;
        self
    }

    pub fn max_prompt_chars(mut self, n: usize) -> Self {
        self.config.max_prompt_chars = n;
        self
    }

    pub fn page_policy(mut self, policy: PageSelectionPolicy) -> Self {
        self.config.page_policy = policy;
        self
    }

    pub fn request_timeout_secs(mut self, secs: u64) -> Self {
        self.config.request_timeout_secs = Some(secs);
        self
    }

    /// Wait for the service indefinitely, as a plain blocking call would.
    pub fn no_request_timeout(mut self) -> Self {
        self.config.request_timeout_secs = None;
        self
    }

    pub fn max_retries(mut self, n: u32) -> Self {
        self.config.max_retries = n;
        self
    }

    pub fn retry_backoff_ms(mut self, ms: u64) -> Self {
        self.config.retry_backoff_ms = ms;
        self
    }

    pub fn pdfium_lib_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.pdfium_lib_path = Some(path.into());
        self
    }

    pub fn progress_callback(mut self, cb: ProgressCallback) -> Self {
        self.config.progress_callback = Some(cb);
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<ExtractionConfig, StatementError> {
        let c = &self.config;
        if c.model.trim().is_empty() {
            return Err(StatementError::InvalidConfig(
                "Model name must not be empty".into(),
            ));
        }
        if !(c.endpoint.starts_with("http://") || c.endpoint.starts_with("https://")) {
            return Err(StatementError::InvalidConfig(format!(
                "Endpoint must be an http(s) URL, got '{}'",
                c.endpoint
            )));
        }
        if !(0.0..=2.0).contains(&c.temperature) {
            return Err(StatementError::InvalidConfig(format!(
                "Temperature must be 0.0–2.0, got {}",
                c.temperature
            )));
        }
        if c.max_prompt_chars == 0 {
            return Err(StatementError::InvalidConfig(
                "max_prompt_chars must be ≥ 1".into(),
            ));
        }
        if c.page_policy.max_pages == 0 {
            return Err(StatementError::InvalidConfig(
                "Page policy must read at least one page".into(),
            ));
        }
        if c.max_retries > MAX_RETRIES_LIMIT {
            return Err(StatementError::InvalidConfig(format!(
                "max_retries must be at most {}, got {}",
                MAX_RETRIES_LIMIT, c.max_retries
            )));
        }
        if c.request_timeout_secs == Some(0) {
            return Err(StatementError::InvalidConfig(
                "Request timeout must be ≥ 1 second".into(),
            ));
        }
        Ok(self.config)
    }
}

/// Decides how many leading pages are read for header text.
///
/// Page 1 is always read. The next page is appended while the accumulated
/// text is shorter than `min_chars` characters and fewer than `max_pages`
/// pages have been read. The defaults (100 characters, two pages) cover the
/// usual cover-page-then-summary layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageSelectionPolicy {
    pub min_chars: usize,
    pub max_pages: usize,
}

impl Default for PageSelectionPolicy {
    fn default() -> Self {
        Self {
            min_chars: MIN_HEADER_CHARS,
            max_pages: MAX_HEADER_PAGES,
        }
    }
}

impl PageSelectionPolicy {
    /// Whether another page should be read after `pages_read` pages produced
    /// `chars_so_far` characters.
    pub fn wants_more(&self, pages_read: usize, chars_so_far: usize) -> bool {
        pages_read < self.max_pages && chars_so_far < self.min_chars
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_documented_values() {
        let c = ExtractionConfig::default();
        assert_eq!(c.model, "llama3.2:1b");
        assert_eq!(c.endpoint, "http://localhost:11434/api/generate");
        assert_eq!(c.temperature, 0.1);
        assert_eq!(c.seed, 42);
        assert_eq!(c.max_prompt_chars, 2500);
        assert_eq!(c.page_policy.min_chars, 100);
        assert_eq!(c.page_policy.max_pages, 2);
        assert_eq!(c.max_retries, 0);
    }

    #[test]
    fn builder_rejects_empty_model() {
        let err = ExtractionConfig::builder().model("  ").build().unwrap_err();
        assert!(matches!(err, StatementError::InvalidConfig(_)));
    }

    #[test]
    fn builder_rejects_non_http_endpoint() {
        let err = ExtractionConfig::builder()
            .endpoint("localhost:11434")
            .build()
            .unwrap_err();
        assert!(err.to_string().contains("http(s)"));
    }

    #[test]
    fn builder_bounds_retries() {
        let err = ExtractionConfig::builder()
            .max_retries(70)
            .build()
            .unwrap_err();
        assert!(matches!(err, StatementError::InvalidConfig(_)));

        let c = ExtractionConfig::builder()
            .max_retries(MAX_RETRIES_LIMIT)
            .build()
            .unwrap();
        assert_eq!(c.max_retries, MAX_RETRIES_LIMIT);
    }

    #[test]
    fn builder_rejects_zero_pages() {
        let err = ExtractionConfig::builder()
            .page_policy(PageSelectionPolicy {
                min_chars: 100,
                max_pages: 0,
            })
            .build()
            .unwrap_err();
        assert!(matches!(err, StatementError::InvalidConfig(_)));
    }

    #[test]
    fn builder_overrides_model_per_run() {
        let c = ExtractionConfig::builder()
            .model("qwen2.5:3b")
            .no_request_timeout()
            .build()
            .unwrap();
        assert_eq!(c.model, "qwen2.5:3b");
        assert_eq!(c.request_timeout_secs, None);
    }

    #[test]
    fn policy_reads_second_page_only_when_short() {
        let p = PageSelectionPolicy::default();
        assert!(p.wants_more(1, 99));
        assert!(!p.wants_more(1, 100));
        assert!(!p.wants_more(2, 10));
    }

    #[test]
    fn debug_hides_callback() {
        let c = ExtractionConfig::builder()
            .progress_callback(std::sync::Arc::new(crate::progress::NoopProgressCallback))
            .build()
            .unwrap();
        let s = format!("{c:?}");
        assert!(s.contains("<dyn ExtractionProgressCallback>"));
    }
}
