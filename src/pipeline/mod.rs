//! Pipeline stages for resume evaluation.
//!
//! Each submodule implements one step. The orchestrator in
//! [`crate::batch`] strings them together per document.
//!
//! ## Data Flow
//!
//! ```text
//! input ──▶ extract ──▶ encode ──▶ llm ──▶ parse
//! (path/URL) (pdfium)   (base64)  (model)  (JSON)
//!                                  └── retry ──┘
//! ```
//!
//! 1. [`input`]   — uploads: bytes, name and declared MIME type; reads local
//!    files and downloads URLs
//! 2. [`extract`] — PDF text via pdfium on the blocking pool; images decoded
//! 3. [`encode`]  — base64-wrap a resume image for the multimodal request
//! 4. [`llm`]     — build the ordered request and call the model; the only
//!    stage with network I/O
//! 5. [`parse`]   — strip code fences and read the verdict JSON
//! 6. [`retry`]   — re-run request + parse on any failure, fixed backoff
//! 7. [`throttle`] — pause between documents

pub mod encode;
pub mod extract;
pub mod input;
pub mod llm;
pub mod parse;
pub mod retry;
pub mod throttle;
