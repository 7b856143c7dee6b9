//! # deck2slides
//!
//! Extract webinar presentation decks (PPTX, PDF) into structured slide
//! records: per-slide text, speaker-note scripts, and extracted images, with
//! deck-wide repetitive boilerplate (footers, page numbers, watermarks)
//! stripped out.
//!
//! ## Why this crate?
//!
//! A deck dropped into a webinar platform is not yet presentable content:
//! PPTX hides its text in namespaced XML parts inside a ZIP container, PDF
//! text arrives as one undifferentiated stream, and both carry per-slide
//! boilerplate that would be read aloud on every single slide by a speech
//! synthesizer. This crate does the whole normalization in one pass and
//! reports fine-grained progress while doing it, so an upload UI can show a
//! live percentage instead of a spinner.
//!
//! ## Pipeline Overview
//!
//! ```text
//! deck file
//!  │
//!  ├─ 1. Dispatch  .pptx / .pdf by extension
//!  ├─ 2. Extract   ZIP + slide XML parts, or lopdf text + pdftoppm previews
//!  ├─ 3. Detect    deck-wide repeated lines and images (threshold heuristics)
//!  ├─ 4. Filter    strip repetitive lines/images, rebuild structured content
//!  └─ 5. Output    Vec<Slide> + terminal progress record
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use deck2slides::{analyze_presentation, AnalysisConfig, ProgressStore};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = AnalysisConfig::default();
//!     let store = ProgressStore::new();
//!     let slides = analyze_presentation(
//!         "uploads/webinar-42/deck.pptx",
//!         "webinar-42",
//!         "session-1",
//!         &store,
//!         &config,
//!     )
//!     .await?;
//!     println!("{} slides", slides.len());
//!     Ok(())
//! }
//! ```
//!
//! Progress can be polled concurrently from another task via
//! [`ProgressStore::get`] or consumed once via [`ProgressStore::take_terminal`].
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `deck2slides` binary (clap + anyhow + tracing-subscriber + indicatif) |
//!
//! Disable `cli` when using only the library to avoid pulling in CLI-only deps:
//! ```toml
//! deck2slides = { version = "0.3", default-features = false }
//! ```
//!
//! ## External tools
//!
//! Two optional system binaries improve output quality; both are invoked
//! with a hard timeout and their absence only degrades the result:
//!
//! | Tool | Used for | Without it |
//! |------|----------|------------|
//! | `pdftoppm` | PDF page preview images | text-only PDF pages |
//! | `soffice`  | HTML fallback rendering | placeholder page |

// ── Modules ──────────────────────────────────────────────────────────────

pub mod analyze;
pub mod config;
pub mod error;
pub mod pipeline;
pub mod progress;
pub mod render;
pub mod slide;

pub(crate) mod tool;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use analyze::{analyze_file, analyze_presentation, inspect};
pub use config::{AnalysisConfig, AnalysisConfigBuilder, RepetitiveContentConfig};
pub use error::{AnalyzeError, ToolError};
pub use pipeline::detect::{detect_repetitive_images, detect_repetitive_text};
pub use pipeline::filter::filter_repetitive_content;
pub use progress::{AnalysisProgress, AnalysisStatus, ProgressStore, SessionReporter};
pub use render::{render_fallback, render_presentation, render_to_file};
pub use slide::{
    ContentNode, DeckFormat, DeckMetadata, ImageRef, ImageSize, Slide, StructuredDocument,
};
