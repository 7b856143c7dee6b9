//! Top-level analysis entry points.
//!
//! [`analyze_presentation`] is the session-aware entry: it dispatches on the
//! input format, reports milestones into the shared [`ProgressStore`], and
//! mirrors the final outcome (slides or error) into the session record so a
//! poller that missed intermediate updates still sees the terminal state.
//! [`analyze_file`] is the plain variant for callers that do not track
//! sessions.

use crate::config::AnalysisConfig;
use crate::error::AnalyzeError;
use crate::pipeline::{filter, pdf, pptx};
use crate::progress::{ProgressStore, SessionReporter};
use crate::slide::{DeckFormat, DeckMetadata, Slide};
use std::path::Path;
use std::time::Instant;
use tracing::{debug, info};

/// Analyze a presentation file and track progress under `session_id`.
///
/// # Arguments
/// * `path` — Local `.pptx` or `.pdf` file
/// * `webinar_id` — Namespace for extracted images under the uploads dir
/// * `session_id` — Key for progress polling in `store`
///
/// # Errors
/// Returns `Err(AnalyzeError)` only for fatal errors (missing file,
/// unsupported format, corrupt container). External tool failures degrade
/// the result instead: slides come back without images.
pub async fn analyze_presentation(
    path: impl AsRef<Path>,
    webinar_id: &str,
    session_id: &str,
    store: &ProgressStore,
    config: &AnalysisConfig,
) -> Result<Vec<Slide>, AnalyzeError> {
    store.create(session_id).await;
    let reporter = SessionReporter::new(store.clone(), session_id);

    match run_analysis(path.as_ref(), webinar_id, config, &reporter).await {
        Ok(slides) => {
            store.complete(session_id, slides.clone()).await;
            Ok(slides)
        }
        Err(err) => {
            store.fail(session_id, err.to_string()).await;
            Err(err)
        }
    }
}

/// Analyze a presentation file without session tracking.
pub async fn analyze_file(
    path: impl AsRef<Path>,
    webinar_id: &str,
    config: &AnalysisConfig,
) -> Result<Vec<Slide>, AnalyzeError> {
    let reporter = SessionReporter::detached();
    run_analysis(path.as_ref(), webinar_id, config, &reporter).await
}

async fn run_analysis(
    path: &Path,
    webinar_id: &str,
    config: &AnalysisConfig,
    reporter: &SessionReporter,
) -> Result<Vec<Slide>, AnalyzeError> {
    let total_start = Instant::now();
    info!("Starting analysis: {}", path.display());

    // ── Step 1: Dispatch on format ───────────────────────────────────────
    let format = detect_format(path)?;
    debug!(%format, "Detected input format");

    // ── Step 2: Extract slides ───────────────────────────────────────────
    let extract_start = Instant::now();
    let slides = match format {
        DeckFormat::Pptx => pptx::analyze_pptx(path, webinar_id, config, reporter).await?,
        DeckFormat::Pdf => pdf::analyze_pdf(path, webinar_id, config, reporter).await?,
    };
    debug!(
        slides = slides.len(),
        elapsed_ms = extract_start.elapsed().as_millis() as u64,
        "Extraction finished"
    );

    // ── Step 3: Strip repetitive content ─────────────────────────────────
    // Runs only after the whole deck is extracted; the occurrence ratios
    // are meaningless on a partial deck.
    let slides = filter::filter_repetitive_content(slides, config);

    info!(
        slides = slides.len(),
        elapsed_ms = total_start.elapsed().as_millis() as u64,
        "Analysis complete"
    );
    Ok(slides)
}

/// Inspect a deck without extracting anything: format and slide count.
pub async fn inspect(path: impl AsRef<Path>) -> Result<DeckMetadata, AnalyzeError> {
    let path = path.as_ref();
    let format = detect_format(path)?;

    let load_path = path.to_path_buf();
    let slide_count = tokio::task::spawn_blocking(move || match format {
        DeckFormat::Pptx => {
            let bytes = std::fs::read(&load_path).map_err(|e| match e.kind() {
                std::io::ErrorKind::NotFound => AnalyzeError::FileNotFound {
                    path: load_path.clone(),
                },
                _ => AnalyzeError::Internal(format!(
                    "Failed to read '{}': {e}",
                    load_path.display()
                )),
            })?;
            pptx::count_slides(bytes, &load_path)
        }
        DeckFormat::Pdf => pdf::count_pages(&load_path),
    })
    .await
    .map_err(|e| AnalyzeError::Internal(format!("Inspect task panicked: {e}")))??;

    Ok(DeckMetadata {
        format,
        slide_count,
    })
}

/// Map a file extension to a [`DeckFormat`].
///
/// Legacy binary `.ppt` is rejected explicitly: it is not a ZIP container
/// and none of the extractors can read it.
fn detect_format(path: &Path) -> Result<DeckFormat, AnalyzeError> {
    let ext = path
        .extension()
        .map(|e| e.to_string_lossy().to_ascii_lowercase())
        .unwrap_or_default();

    match ext.as_str() {
        "pptx" => Ok(DeckFormat::Pptx),
        "pdf" => Ok(DeckFormat::Pdf),
        _ => Err(AnalyzeError::UnsupportedFormat {
            filename: path
                .file_name()
                .map(|f| f.to_string_lossy().to_string())
                .unwrap_or_else(|| path.display().to_string()),
        }),
    }
}
