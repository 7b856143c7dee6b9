//! PDF extraction: text via `lopdf`, page images via `pdftoppm`.
//!
//! PDF text comes out of the document as one undifferentiated stream, so it
//! is divided evenly across pages by line count rather than by layout. Page
//! previews are rasterized with `pdftoppm`; when the tool is missing or
//! fails, the analysis degrades to text-only pages instead of aborting.

use crate::config::AnalysisConfig;
use crate::error::{AnalyzeError, ToolError};
use crate::progress::SessionReporter;
use crate::slide::{ImageRef, Slide};
use crate::tool::run_with_timeout;
use lopdf::Document;
use once_cell::sync::Lazy;
use regex::Regex;
use std::path::{Path, PathBuf};
use tokio::process::Command;
use tracing::{debug, warn};

/// `pdftoppm` output files: `page-1.png`, `page-01.png`, ...
static RE_PAGE_IMAGE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^page-0*(\d+)\.png$").unwrap());

/// Rasterization resolution in DPI. 150 keeps previews readable without
/// producing multi-megabyte files per page.
const RASTER_DPI: &str = "150";

/// Text and page count pulled out of the document on the blocking pool.
struct PdfText {
    page_count: usize,
    text: String,
}

/// Analyze a PDF: rasterize page previews, extract the text stream and
/// divide it evenly across pages.
pub async fn analyze_pdf(
    path: &Path,
    webinar_id: &str,
    config: &AnalysisConfig,
    reporter: &SessionReporter,
) -> Result<Vec<Slide>, AnalyzeError> {
    if !tokio::fs::try_exists(path).await.unwrap_or(false) {
        return Err(AnalyzeError::FileNotFound {
            path: path.to_path_buf(),
        });
    }

    let load_path = path.to_path_buf();
    let parsed = tokio::task::spawn_blocking(move || load_pdf_text(&load_path))
        .await
        .map_err(|e| AnalyzeError::Internal(format!("PDF parse task panicked: {e}")))??;

    reporter.report(10, "PDF file loaded...").await;
    reporter
        .report(30, format!("{} pages found...", parsed.page_count))
        .await;

    let images = match rasterize_pages(path, webinar_id, config).await {
        Ok(images) => images,
        Err(err) => {
            warn!(error = %err, "Page rasterization failed, continuing without images");
            Vec::new()
        }
    };
    let degraded = images.is_empty();
    reporter
        .report(60, format!("{} page images extracted...", images.len()))
        .await;

    let page_texts = split_text_into_pages(&parsed.text, parsed.page_count);

    let mut slides = Vec::with_capacity(parsed.page_count);
    let progress_per_page = if parsed.page_count > 0 {
        30.0 / parsed.page_count as f64
    } else {
        0.0
    };

    for (i, text) in page_texts.into_iter().enumerate() {
        let page_number = i + 1;
        let page_images: Vec<ImageRef> = images
            .iter()
            .filter(|img| img.page_number == Some(page_number))
            .cloned()
            .collect();

        // With no preview and no text a page would be entirely blank; give
        // it a per-page hint line instead so the viewer shows something.
        let text = if degraded && text.is_empty() {
            format!("Page {page_number} of the document (no preview available)")
        } else {
            text
        };

        debug!(
            page = page_number,
            chars = text.len(),
            images = page_images.len(),
            "Extracted page"
        );

        slides.push(Slide::new(
            format!("Page {page_number}"),
            text,
            page_images,
            config.heading_max_len,
        ));

        reporter
            .report(
                (60.0 + progress_per_page * page_number as f64).round() as u8,
                format!("Page {page_number}/{} processed...", parsed.page_count),
            )
            .await;
    }

    reporter.report(95, "Analysis finishing...").await;
    Ok(slides)
}

/// Count the pages without extracting anything.
pub fn count_pages(path: &Path) -> Result<usize, AnalyzeError> {
    let doc = Document::load(path).map_err(|e| AnalyzeError::CorruptPdf {
        path: path.to_path_buf(),
        detail: e.to_string(),
    })?;
    Ok(doc.get_pages().len())
}

// ── Text extraction (blocking) ───────────────────────────────────────────

fn load_pdf_text(path: &Path) -> Result<PdfText, AnalyzeError> {
    let doc = Document::load(path).map_err(|e| AnalyzeError::CorruptPdf {
        path: path.to_path_buf(),
        detail: e.to_string(),
    })?;

    let pages: Vec<u32> = doc.get_pages().keys().copied().collect();
    let page_count = pages.len();

    // Per-page extraction failures are tolerated; a page with an exotic
    // encoding contributes nothing rather than failing the document.
    let text = doc.extract_text(&pages).unwrap_or_default();

    Ok(PdfText { page_count, text })
}

/// Divide the document text evenly across `page_count` pages.
///
/// `ceil(lines / page_count)` lines go to each page in order; when there are
/// fewer lines than pages the trailing pages come back empty.
fn split_text_into_pages(text: &str, page_count: usize) -> Vec<String> {
    if page_count == 0 {
        return Vec::new();
    }

    let lines: Vec<&str> = text
        .split('\n')
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .collect();

    let per_page = lines.len().div_ceil(page_count).max(1);

    (0..page_count)
        .map(|i| {
            let start = (i * per_page).min(lines.len());
            let end = ((i + 1) * per_page).min(lines.len());
            lines[start..end].join("\n")
        })
        .collect()
}

// ── Rasterization ────────────────────────────────────────────────────────

/// Render every page to a PNG under `{uploads_dir}/{webinar_id}/` via
/// `pdftoppm` and return the per-page [`ImageRef`] list.
async fn rasterize_pages(
    path: &Path,
    webinar_id: &str,
    config: &AnalysisConfig,
) -> Result<Vec<ImageRef>, ToolError> {
    let image_dir: PathBuf = config.uploads_dir.join(webinar_id);
    tokio::fs::create_dir_all(&image_dir)
        .await
        .map_err(|e| ToolError::Unavailable {
            tool: "pdftoppm".to_string(),
            detail: format!("cannot create image directory: {e}"),
        })?;

    let mut cmd = Command::new("pdftoppm");
    cmd.arg("-png")
        .arg("-r")
        .arg(RASTER_DPI)
        .arg(path)
        .arg(image_dir.join("page"));
    let out = run_with_timeout(cmd, "pdftoppm", config.raster_timeout_secs).await?;
    if !out.stderr.is_empty() {
        debug!(stderr = %String::from_utf8_lossy(&out.stderr).trim(), "pdftoppm warnings");
    }

    collect_page_images(&image_dir, webinar_id, config).await
}

/// Gather the `page-N.png` files `pdftoppm` produced, sorted by page number.
async fn collect_page_images(
    image_dir: &Path,
    webinar_id: &str,
    config: &AnalysisConfig,
) -> Result<Vec<ImageRef>, ToolError> {
    let mut entries =
        tokio::fs::read_dir(image_dir)
            .await
            .map_err(|e| ToolError::Unavailable {
                tool: "pdftoppm".to_string(),
                detail: format!("cannot list image directory: {e}"),
            })?;

    let mut numbered: Vec<(usize, String)> = Vec::new();
    while let Ok(Some(entry)) = entries.next_entry().await {
        let filename = entry.file_name().to_string_lossy().to_string();
        if let Some(caps) = RE_PAGE_IMAGE.captures(&filename) {
            if let Ok(n) = caps[1].parse::<usize>() {
                numbered.push((n, filename));
            }
        }
    }
    numbered.sort_by_key(|(n, _)| *n);

    Ok(numbered
        .into_iter()
        .map(|(n, filename)| ImageRef {
            public_path: format!("{}/{webinar_id}/{filename}", config.public_base),
            original_path: filename.clone(),
            filename,
            page_number: Some(n),
        })
        .collect())
}
