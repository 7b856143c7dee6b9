//! Error types for the deck2slides library.
//!
//! Two distinct error types reflect two distinct failure modes:
//!
//! * [`AnalyzeError`] — **Fatal**: the analysis cannot proceed at all
//!   (missing file, unsupported format, corrupt container). Returned as
//!   `Err(AnalyzeError)` from [`crate::analyze::analyze_presentation`] and
//!   mirrored into the progress session as a terminal `Error` record.
//!
//! * [`ToolError`] — **Non-fatal**: an external helper tool failed for one
//!   extraction step (pdftoppm missing, non-zero exit, timeout). Logged and
//!   swallowed; the affected slides degrade to a text-only representation
//!   rather than losing the whole deck.
//!
//! The separation keeps the policy from the original system intact: only
//! container-level failures surface to the caller, tool-level failures are
//! caught and execution continues.

use std::path::PathBuf;
use thiserror::Error;

/// All fatal errors returned by the deck2slides library.
///
/// External-tool failures use [`ToolError`] and never appear here; they are
/// handled inside the extraction stage that triggered them.
#[derive(Debug, Error)]
pub enum AnalyzeError {
    // ── Input errors ──────────────────────────────────────────────────────
    /// Input file was not found at the given path.
    #[error("Presentation file not found: '{}'\nCheck the uploads directory and filename.", path.display())]
    FileNotFound { path: PathBuf },

    /// The filename extension is neither a PPTX nor a PDF.
    #[error("Unsupported presentation format: '{filename}'\nSupported: .pptx, .pdf")]
    UnsupportedFormat { filename: String },

    // ── Container errors ──────────────────────────────────────────────────
    /// The PPTX ZIP container could not be opened or an entry is unreadable.
    #[error("PPTX archive '{}' is corrupt: {detail}", path.display())]
    CorruptArchive { path: PathBuf, detail: String },

    /// A slide XML part exists but could not be parsed.
    #[error("Slide XML part '{part}' could not be parsed: {detail}")]
    SlideXml { part: String, detail: String },

    /// The PDF header/xref is corrupt and cannot be parsed.
    #[error("PDF '{}' is corrupt: {detail}", path.display())]
    CorruptPdf { path: PathBuf, detail: String },

    // ── I/O errors ────────────────────────────────────────────────────────
    /// Could not create the per-webinar asset directory or write an
    /// extracted image / rendered output file.
    #[error("Failed to write '{}': {source}", path.display())]
    OutputWriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // ── Config errors ─────────────────────────────────────────────────────
    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // ── Catch-all ─────────────────────────────────────────────────────────
    /// Unexpected internal error (e.g. a blocking parse task panicked).
    #[error("Internal error: {0}")]
    Internal(String),
}

/// A non-fatal failure of an external command-line tool.
///
/// Produced by the rasterization and office-conversion helpers. The pipeline
/// logs these with `tracing::warn!` and continues with degraded output; they
/// are never propagated out of [`crate::analyze::analyze_presentation`].
#[derive(Debug, Error)]
pub enum ToolError {
    /// The tool binary could not be spawned (usually not installed).
    #[error("'{tool}' could not be started: {detail}\nIs it installed and on PATH?")]
    Unavailable { tool: String, detail: String },

    /// The tool ran but exited non-zero.
    #[error("'{tool}' exited with status {code:?}: {stderr}")]
    Failed {
        tool: String,
        code: Option<i32>,
        stderr: String,
    },

    /// The tool did not finish within the configured timeout and was killed.
    #[error("'{tool}' timed out after {secs}s and was terminated")]
    Timeout { tool: String, secs: u64 },
}
