//! Document intake: pair a readable PDF path with its display name.
//!
//! Uploads usually arrive as bytes with a user-facing file name, while the
//! PDF engine needs a file-system path. [`SpooledDocument`] writes the bytes
//! to a managed temp file that is removed when the value is dropped, even if
//! extraction fails halfway.

use crate::error::StatementError;
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use tracing::debug;

/// A single statement to process.
///
/// `filename` is what ends up in the record; `path` is only used to read
/// the PDF and may point at a temp file with an unrelated name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Document {
    pub filename: String,
    pub path: PathBuf,
}

impl Document {
    pub fn new(filename: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        Self {
            filename: filename.into(),
            path: path.into(),
        }
    }

    /// Use the final path component as the display name.
    pub fn from_path(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let filename = display_name(&path);
        Self { filename, path }
    }
}

/// Uploaded bytes spooled to disk for the duration of one extraction.
pub struct SpooledDocument {
    document: Document,
    _file: NamedTempFile,
}

impl SpooledDocument {
    /// Write `bytes` to a fresh `.pdf` temp file.
    pub fn spool(filename: impl Into<String>, bytes: &[u8]) -> Result<Self, StatementError> {
        let mut file = tempfile::Builder::new()
            .prefix("statement-")
            .suffix(".pdf")
            .tempfile()
            .map_err(|e| StatementError::Internal(format!("tempfile: {e}")))?;
        file.write_all(bytes)
            .map_err(|e| StatementError::Internal(format!("tempfile write: {e}")))?;
        file.flush()
            .map_err(|e| StatementError::Internal(format!("tempfile flush: {e}")))?;

        let document = Document::new(filename, file.path());
        debug!(
            "Spooled '{}' ({} bytes) to {}",
            document.filename,
            bytes.len(),
            document.path.display()
        );
        Ok(Self {
            document,
            _file: file,
        })
    }

    pub fn document(&self) -> &Document {
        &self.document
    }
}

fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_path_uses_file_name() {
        let doc = Document::from_path("/tmp/uploads/march_2024.pdf");
        assert_eq!(doc.filename, "march_2024.pdf");
        assert_eq!(doc.path, PathBuf::from("/tmp/uploads/march_2024.pdf"));
    }

    #[test]
    fn from_path_without_file_name_falls_back_to_path() {
        let doc = Document::from_path("/");
        assert_eq!(doc.filename, "/");
    }

    #[test]
    fn spooled_file_is_removed_on_drop() {
        let spooled = SpooledDocument::spool("upload.pdf", b"%PDF-1.4\n").unwrap();
        let path = spooled.document().path.clone();
        assert_eq!(spooled.document().filename, "upload.pdf");
        assert_eq!(std::fs::read(&path).unwrap(), b"%PDF-1.4\n");
        drop(spooled);
        assert!(!path.exists());
    }
}
