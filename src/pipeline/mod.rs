//! Pipeline stages for statement extraction.
//!
//! Each submodule implements exactly one step, and no stage calls back into
//! an earlier one.
//!
//! ## Data Flow
//!
//! ```text
//! input ──▶ text ──▶ prompt ──▶ llm ──▶ validate
//! (path)   (pdfium)  (bounded)  (HTTP)  (JSON + issuer check)
//! ```
//!
//! 1. [`input`]   : pair a PDF path with its display name; spool uploads
//! 2. [`text`]    : read page 1 (and page 2 when page 1 is short); backed
//!    by [`pdf`], which runs blocking pdfium calls
//! 3. [`prompt`]  : truncate the text and attach the fixed sampling options
//! 4. [`llm`]     : the only stage with network I/O
//! 5. [`validate`]: decode the answer and flag an issuer absent from the text
//!
//! Record assembly lives in [`crate::extract`].

pub mod input;
pub mod llm;
pub mod pdf;
pub mod prompt;
pub mod text;
pub mod validate;
