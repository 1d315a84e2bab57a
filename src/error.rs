//! Error types for the edgequake-statement library.
//!
//! Two distinct error types reflect two distinct failure modes:
//!
//! * [`StatementError`]: **Fatal**: the extractor cannot be set up at all
//!   (bad configuration, HTTP client cannot be built, output file cannot be
//!   written). Returned as `Err(StatementError)` from constructors and
//!   export helpers.
//!
//! * [`DocumentError`]: **Non-fatal**: a single statement failed (no text
//!   layer, local model unreachable, model answered with something that is
//!   not JSON). Stored inside [`crate::output::ExtractedRecord`] so a batch
//!   always yields one record per document.
//!
//! [`ValidationWarning`] is neither: the record is still produced, but a
//! field was rewritten because it looked hallucinated.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

/// Detail string attached to every failure that happened after the model
/// was (or should have been) asked.
pub const MODEL_FAILED_DETAIL: &str = "Model failed to return JSON";

/// Message of the record produced when a PDF has no extractable text.
pub const EMPTY_TEXT_MESSAGE: &str = "Empty text. File might be an image.";

/// All fatal errors returned by the edgequake-statement library.
#[derive(Debug, Error)]
pub enum StatementError {
    // ── Config errors ─────────────────────────────────────────────────────
    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// The HTTP client for the generation service could not be created.
    #[error("Failed to build HTTP client for '{endpoint}': {reason}")]
    ClientBuildFailed { endpoint: String, reason: String },

    // ── Pdfium binding errors ─────────────────────────────────────────────
    /// Could not bind to a pdfium library.
    #[error(
        "Failed to bind to pdfium library: {0}\n\n\
Set PDFIUM_LIB_PATH=/path/to/libpdfium or pass --pdfium-lib to use an existing copy,\n\
or place libpdfium next to the working directory.\n"
    )]
    PdfiumBindingFailed(String),

    /// pdfium bound correctly but the document could not be opened.
    #[error("PDF '{path}' could not be opened: {detail}")]
    UnreadablePdf { path: PathBuf, detail: String },

    // ── I/O errors ────────────────────────────────────────────────────────
    /// Could not create or write an export file.
    #[error("Failed to write output file '{path}': {source}")]
    OutputWriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// CSV serialisation failed.
    #[error("CSV export failed: {0}")]
    Csv(#[from] csv::Error),

    // ── Catch-all ─────────────────────────────────────────────────────────
    /// Unexpected internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Category of a failed document, independent of the message wording.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    /// No usable text was extracted; the model was never called.
    EmptyText,
    /// The generation service was unreachable, timed out, or returned a
    /// non-success status.
    Transport,
    /// The service answered but the payload was not the expected JSON.
    MalformedResponse,
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            FailureKind::EmptyText => "empty_text",
            FailureKind::Transport => "transport",
            FailureKind::MalformedResponse => "malformed_response",
        })
    }
}

/// A non-fatal error for a single document.
///
/// Caught at the document boundary and turned into a failure record; it
/// never aborts the rest of a batch.
#[derive(Debug, Clone, Error, Serialize, Deserialize)]
pub enum DocumentError {
    /// Extraction produced whitespace only (image-only or empty PDF).
    #[error("Empty text. File might be an image.")]
    EmptyText,

    /// The generation service could not be reached or rejected the call.
    #[error("{message}")]
    Transport {
        message: String,
        status: Option<u16>,
    },

    /// The service responded but its payload could not be parsed.
    #[error("{reason}")]
    MalformedResponse { reason: String, raw: String },
}

impl DocumentError {
    /// The taxonomy bucket this error belongs to.
    pub fn kind(&self) -> FailureKind {
        match self {
            DocumentError::EmptyText => FailureKind::EmptyText,
            DocumentError::Transport { .. } => FailureKind::Transport,
            DocumentError::MalformedResponse { .. } => FailureKind::MalformedResponse,
        }
    }

    /// Diagnostic detail shown next to the message in exported records.
    ///
    /// Empty-text failures carry none: nothing was sent to the model.
    pub fn detail(&self) -> Option<&'static str> {
        match self {
            DocumentError::EmptyText => None,
            _ => Some(MODEL_FAILED_DETAIL),
        }
    }

    /// Raw model text, when the failure happened while parsing it.
    pub fn raw_response(&self) -> Option<&str> {
        match self {
            DocumentError::MalformedResponse { raw, .. } => Some(raw),
            _ => None,
        }
    }
}

/// A plausibility check failed; the value was replaced, the record kept.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ValidationWarning {
    /// The issuer the model reported does not appear in the statement text.
    IssuerNotInText { claimed: String },
}

impl fmt::Display for ValidationWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidationWarning::IssuerNotInText { claimed } => {
                write!(f, "issuer '{claimed}' not found in statement text")
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_text_display_matches_record_message() {
        assert_eq!(DocumentError::EmptyText.to_string(), EMPTY_TEXT_MESSAGE);
        assert_eq!(DocumentError::EmptyText.detail(), None);
    }

    #[test]
    fn transport_carries_model_detail() {
        let e = DocumentError::Transport {
            message: "connection refused".into(),
            status: None,
        };
        assert_eq!(e.kind(), FailureKind::Transport);
        assert_eq!(e.detail(), Some(MODEL_FAILED_DETAIL));
        assert!(e.raw_response().is_none());
    }

    #[test]
    fn malformed_keeps_raw_text() {
        let e = DocumentError::MalformedResponse {
            reason: "expected value at line 1 column 1".into(),
            raw: "not json".into(),
        };
        assert_eq!(e.kind(), FailureKind::MalformedResponse);
        assert_eq!(e.raw_response(), Some("not json"));
    }

    #[test]
    fn failure_kind_display() {
        assert_eq!(FailureKind::EmptyText.to_string(), "empty_text");
        assert_eq!(FailureKind::MalformedResponse.to_string(), "malformed_response");
    }

    #[test]
    fn pdfium_binding_display() {
        let e = StatementError::PdfiumBindingFailed("no such file".into());
        assert!(e.to_string().contains("PDFIUM_LIB_PATH"));
        assert!(e.to_string().contains("no such file"));
    }
}
