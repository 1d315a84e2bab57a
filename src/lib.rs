//! # edgequake-statement
//!
//! Extract issuer, account suffix, statement date, due date and total
//! balance from credit-card statement PDFs with a locally hosted language
//! model. No document leaves the machine.
//!
//! ## Pipeline Overview
//!
//! ```text
//! PDF
//!  │
//!  ├─ 1. Text      page 1, plus page 2 when page 1 is under 100 chars (pdfium)
//!  ├─ 2. Prompt    first 2 500 chars + fixed sampling (temperature 0.1, seed 42, JSON)
//!  ├─ 3. Generate  one POST to the local model service (Ollama /api/generate)
//!  ├─ 4. Validate  decode the JSON answer; flag an issuer absent from the text
//!  └─ 5. Record    success fields or a typed failure, tagged with the filename
//! ```
//!
//! Documents are processed one at a time, in order. A failing document
//! yields a failure record and the batch carries on.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use edgequake_statement::{extract_statements, Document, ExtractionConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = ExtractionConfig::builder().model("llama3.2:1b").build()?;
//!     let docs = vec![Document::from_path("march.pdf"), Document::from_path("april.pdf")];
//!     for record in extract_statements(&docs, &config).await? {
//!         println!("{}", serde_json::to_string(&record)?);
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `stmt-extract` binary (clap + anyhow + tracing-subscriber + indicatif) |

// ── Modules ──────────────────────────────────────────────────────────────

pub mod config;
pub mod error;
pub mod export;
pub mod extract;
pub mod output;
pub mod pipeline;
pub mod progress;
pub mod prompts;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use config::{ExtractionConfig, ExtractionConfigBuilder, PageSelectionPolicy};
pub use error::{DocumentError, FailureKind, StatementError, ValidationWarning};
pub use extract::{extract_statements, extract_statements_sync, StatementExtractor};
pub use output::{ExtractedRecord, FailureRecord, Outcome, StatementFields};
pub use pipeline::input::{Document, SpooledDocument};
pub use pipeline::llm::{GenerationBackend, OllamaClient};
pub use pipeline::prompt::{ExtractionPrompt, GenerationOptions};
pub use pipeline::text::{PageSource, PdfiumTextExtractor, TextExtractor};
pub use progress::{ExtractionProgressCallback, NoopProgressCallback, ProgressCallback};
