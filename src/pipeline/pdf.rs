//! pdfium access: bind the library and expose a document's page text.
//!
//! pdfium is a C++ library with thread-local state; every function here is
//! blocking and is called from `spawn_blocking` by the extractor. A document
//! handle lives only for the duration of one [`with_pages`] call, so the file
//! is closed before the model is contacted.

use crate::error::StatementError;
use crate::pipeline::text::PageSource;
use pdfium_render::prelude::*;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Environment variable pointing at an existing pdfium library or its directory.
pub const PDFIUM_LIB_ENV: &str = "PDFIUM_LIB_PATH";

/// Bind to pdfium, trying in order: `lib_path`, `PDFIUM_LIB_PATH`, the
/// working directory, then the system library search path.
pub fn bind_pdfium(lib_path: Option<&Path>) -> Result<Pdfium, StatementError> {
    let mut last_err = String::from("no pdfium library found");

    let env_path = std::env::var_os(PDFIUM_LIB_ENV).map(PathBuf::from);
    let candidates = lib_path
        .map(Path::to_path_buf)
        .into_iter()
        .chain(env_path)
        .chain(std::iter::once(PathBuf::from("./")));

    for candidate in candidates {
        let library = library_file(&candidate);
        match Pdfium::bind_to_library(&library) {
            Ok(bindings) => {
                debug!("Bound pdfium from {}", library.display());
                return Ok(Pdfium::new(bindings));
            }
            Err(e) => last_err = format!("{}: {:?}", library.display(), e),
        }
    }

    Pdfium::bind_to_system_library()
        .map(Pdfium::new)
        .map_err(|e| StatementError::PdfiumBindingFailed(format!("{last_err}; system: {e:?}")))
}

/// Resolve a directory to the platform library file inside it.
fn library_file(candidate: &Path) -> PathBuf {
    if candidate.is_dir() {
        Pdfium::pdfium_platform_library_name_at_path(&candidate.to_path_buf())
    } else {
        candidate.to_path_buf()
    }
}

/// Page text of an open pdfium document.
pub struct PdfiumPages<'a> {
    document: PdfDocument<'a>,
}

impl PageSource for PdfiumPages<'_> {
    fn page_count(&self) -> usize {
        self.document.pages().len() as usize
    }

    fn page_text(&self, index: usize) -> Option<String> {
        let page = match self.document.pages().get(index as u16) {
            Ok(page) => page,
            Err(e) => {
                warn!("Page {}: could not be loaded: {:?}", index + 1, e);
                return None;
            }
        };
        let text = match page.text() {
            Ok(text) => text,
            Err(e) => {
                debug!("Page {}: no text layer: {:?}", index + 1, e);
                return None;
            }
        };
        Some(text.all())
    }
}

/// Open `pdf_path`, hand its pages to `f`, and close the document again.
pub fn with_pages<T>(
    pdf_path: &Path,
    lib_path: Option<&Path>,
    f: impl FnOnce(&PdfiumPages<'_>) -> T,
) -> Result<T, StatementError> {
    let pdfium = bind_pdfium(lib_path)?;

    let document =
        pdfium
            .load_pdf_from_file(pdf_path, None)
            .map_err(|e| StatementError::UnreadablePdf {
                path: pdf_path.to_path_buf(),
                detail: format!("{:?}", e),
            })?;

    let pages = PdfiumPages { document };
    debug!(
        "Opened {} ({} pages)",
        pdf_path.display(),
        pages.page_count()
    );
    Ok(f(&pages))
}
