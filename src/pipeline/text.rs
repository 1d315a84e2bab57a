//! Header-text extraction: pick the leading pages that carry account data.
//!
//! Issuer, account number, dates and balance sit on page 1 of almost every
//! statement. A cover page or a mostly-blank first page would starve the
//! prompt, so short page-1 text pulls in page 2 (see
//! [`PageSelectionPolicy`]). Later pages are never searched.

use crate::config::PageSelectionPolicy;
use crate::pipeline::pdf;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Read-only view of a document's pages.
pub trait PageSource {
    fn page_count(&self) -> usize;

    /// Text of page `index` (0-based). `None` when the page has no
    /// extractable text layer.
    fn page_text(&self, index: usize) -> Option<String>;
}

/// Concatenate leading pages according to `policy`, page order preserved.
///
/// Pages without a text layer count as empty strings. A document with no
/// pages yields an empty string.
pub fn select_header_text<S>(source: &S, policy: &PageSelectionPolicy) -> String
where
    S: PageSource + ?Sized,
{
    let total = source.page_count();
    let mut text = String::new();
    let mut chars = 0;
    let mut read = 0;

    while read < total && (read == 0 || policy.wants_more(read, chars)) {
        let page = source.page_text(read).unwrap_or_default();
        chars += page.chars().count();
        text.push_str(&page);
        read += 1;
    }

    debug!("Header text: {} chars from {}/{} pages", chars, read, total);
    text
}

/// Turns a PDF path into the text handed to the prompt builder.
///
/// Implementations never fail: anything unreadable becomes an empty string,
/// which the pipeline reports as an image-only document.
pub trait TextExtractor: Send + Sync {
    fn extract_text(&self, path: &Path) -> String;
}

/// [`TextExtractor`] backed by pdfium.
#[derive(Debug, Clone, Default)]
pub struct PdfiumTextExtractor {
    policy: PageSelectionPolicy,
    lib_path: Option<PathBuf>,
}

impl PdfiumTextExtractor {
    pub fn new(policy: PageSelectionPolicy, lib_path: Option<PathBuf>) -> Self {
        Self { policy, lib_path }
    }
}

impl TextExtractor for PdfiumTextExtractor {
    fn extract_text(&self, path: &Path) -> String {
        let policy = self.policy;
        match pdf::with_pages(path, self.lib_path.as_deref(), |pages| {
            select_header_text(pages, &policy)
        }) {
            Ok(text) => text,
            Err(e) => {
                warn!("Text extraction failed for {}: {}", path.display(), e);
                String::new()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;

    /// In-memory document that records which pages were read.
    struct FakePages {
        pages: Vec<Option<&'static str>>,
        reads: RefCell<Vec<usize>>,
    }

    impl FakePages {
        fn new(pages: Vec<Option<&'static str>>) -> Self {
            Self {
                pages,
                reads: RefCell::new(Vec::new()),
            }
        }
    }

    impl PageSource for FakePages {
        fn page_count(&self) -> usize {
            self.pages.len()
        }

        fn page_text(&self, index: usize) -> Option<String> {
            self.reads.borrow_mut().push(index);
            self.pages[index].map(str::to_string)
        }
    }

    const LONG_PAGE: &str = "FIRST NATIONAL BANK Credit Card Statement \
        Account Number 4111 1111 1111 1234 Statement Date 03/15/2024 \
        Payment Due 04/10/2024 New Balance $1,234.50";

    #[test]
    fn long_first_page_never_reads_page_two() {
        let doc = FakePages::new(vec![Some(LONG_PAGE), Some("PAGE-TWO-MARKER")]);
        let text = select_header_text(&doc, &PageSelectionPolicy::default());
        assert_eq!(text, LONG_PAGE);
        assert!(!text.contains("PAGE-TWO-MARKER"));
        assert_eq!(*doc.reads.borrow(), vec![0]);
    }

    #[test]
    fn short_first_page_appends_page_two_in_order() {
        let doc = FakePages::new(vec![Some("Cover"), Some("Details"), Some("Page three")]);
        let text = select_header_text(&doc, &PageSelectionPolicy::default());
        assert_eq!(text, "CoverDetails");
        assert_eq!(*doc.reads.borrow(), vec![0, 1]);
    }

    #[test]
    fn threshold_counts_characters_not_bytes() {
        // 99 two-byte characters: 198 bytes but still under the threshold.
        let page: &'static str = Box::leak("é".repeat(99).into_boxed_str());
        let doc = FakePages::new(vec![Some(page), Some("more")]);
        let text = select_header_text(&doc, &PageSelectionPolicy::default());
        assert!(text.ends_with("more"));
    }

    #[test]
    fn exactly_threshold_stays_on_page_one() {
        let page: &'static str = Box::leak("x".repeat(100).into_boxed_str());
        let doc = FakePages::new(vec![Some(page), Some("more")]);
        let text = select_header_text(&doc, &PageSelectionPolicy::default());
        assert_eq!(text.len(), 100);
    }

    #[test]
    fn missing_text_layer_is_empty_string() {
        let doc = FakePages::new(vec![None, Some("Second page text")]);
        let text = select_header_text(&doc, &PageSelectionPolicy::default());
        assert_eq!(text, "Second page text");
    }

    #[test]
    fn zero_pages_is_empty() {
        let doc = FakePages::new(vec![]);
        assert_eq!(select_header_text(&doc, &PageSelectionPolicy::default()), "");
    }

    #[test]
    fn single_short_page_is_returned_as_is() {
        let doc = FakePages::new(vec![Some("tiny")]);
        assert_eq!(select_header_text(&doc, &PageSelectionPolicy::default()), "tiny");
    }

    #[test]
    fn policy_can_widen_the_page_cap() {
        let doc = FakePages::new(vec![Some("a"), Some("b"), Some("c"), Some("d")]);
        let policy = PageSelectionPolicy {
            min_chars: 100,
            max_pages: 3,
        };
        assert_eq!(select_header_text(&doc, &policy), "abc");
    }

    #[test]
    fn zero_threshold_still_reads_first_page() {
        let doc = FakePages::new(vec![Some("a"), Some("b")]);
        let policy = PageSelectionPolicy {
            min_chars: 0,
            max_pages: 2,
        };
        assert_eq!(select_header_text(&doc, &policy), "a");
    }

    #[test]
    fn unreadable_path_yields_empty_string() {
        let dir = tempfile::tempdir().unwrap();
        let bogus = dir.path().join("corrupt.pdf");
        std::fs::write(&bogus, b"this is not a pdf").unwrap();

        let extractor = PdfiumTextExtractor::default();
        assert_eq!(extractor.extract_text(&bogus), "");
        assert_eq!(extractor.extract_text(&dir.path().join("missing.pdf")), "");
    }
}
