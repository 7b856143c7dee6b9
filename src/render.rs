//! HTML presentation rendering.
//!
//! The primary path renders the structured slides produced by
//! [`crate::analyze`] into a single self-contained HTML file, one
//! `<section>` per slide. Two fallbacks cover decks where extraction
//! produced nothing usable:
//!
//! 1. LibreOffice (`soffice --headless --convert-to html`) renders the
//!    original file directly, under the configured conversion timeout.
//! 2. When LibreOffice is missing too, a placeholder page is written so the
//!    caller always ends up with a viewable artifact.

use crate::config::AnalysisConfig;
use crate::error::AnalyzeError;
use crate::slide::{ContentNode, Slide};
use crate::tool::run_with_timeout;
use std::path::Path;
use tokio::process::Command;
use tracing::{debug, info, warn};

/// Render slides to `output_path` as a standalone HTML presentation.
///
/// Writes atomically: the document goes to a `.tmp` sibling first and is
/// renamed into place, so a crash mid-write never leaves a truncated file.
pub async fn render_to_file(
    slides: &[Slide],
    title: &str,
    output_path: impl AsRef<Path>,
) -> Result<(), AnalyzeError> {
    let path = output_path.as_ref();
    let html = render_presentation(slides, title);
    write_atomic(path, &html).await?;
    info!(slides = slides.len(), path = %path.display(), "Rendered presentation");
    Ok(())
}

/// Render the original deck when extraction produced no usable slides.
///
/// Tries LibreOffice first; if it is unavailable or fails, writes a
/// placeholder page naming the source file. Never returns a tool error.
pub async fn render_fallback(
    source: &Path,
    output_dir: &Path,
    config: &AnalysisConfig,
) -> Result<(), AnalyzeError> {
    let mut cmd = Command::new("soffice");
    cmd.arg("--headless")
        .arg("--convert-to")
        .arg("html")
        .arg("--outdir")
        .arg(output_dir)
        .arg(source);

    match run_with_timeout(cmd, "soffice", config.convert_timeout_secs).await {
        Ok(out) => {
            if !out.stderr.is_empty() {
                debug!(stderr = %String::from_utf8_lossy(&out.stderr).trim(), "soffice warnings");
            }
            info!(source = %source.display(), "LibreOffice fallback conversion succeeded");
            Ok(())
        }
        Err(err) => {
            warn!(error = %err, "LibreOffice fallback failed, writing placeholder");
            let filename = source
                .file_name()
                .map(|f| f.to_string_lossy().to_string())
                .unwrap_or_else(|| source.display().to_string());
            let stem = source
                .file_stem()
                .map(|s| s.to_string_lossy().to_string())
                .unwrap_or_else(|| "presentation".to_string());
            let html = render_placeholder(&filename);
            write_atomic(&output_dir.join(format!("{stem}.html")), &html).await
        }
    }
}

// ── HTML assembly ────────────────────────────────────────────────────────

/// Assemble the full presentation document.
pub fn render_presentation(slides: &[Slide], title: &str) -> String {
    let mut html = String::with_capacity(slides.len() * 512 + 1024);
    html.push_str("<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n");
    html.push_str("<meta charset=\"utf-8\">\n");
    html.push_str(&format!("<title>{}</title>\n", escape_html(title)));
    html.push_str(STYLE);
    html.push_str("</head>\n<body>\n");

    for slide in slides {
        html.push_str("<section class=\"slide\">\n");
        html.push_str(&format!("<h2>{}</h2>\n", escape_html(&slide.title)));
        for node in &slide.content.nodes {
            html.push_str(&render_node(node));
        }
        if !slide.speaker_note.trim().is_empty() {
            html.push_str(&format!(
                "<aside class=\"speaker-note\" hidden>{}</aside>\n",
                escape_html(&slide.speaker_note)
            ));
        }
        html.push_str("</section>\n");
    }

    html.push_str("</body>\n</html>\n");
    html
}

fn render_node(node: &ContentNode) -> String {
    match node {
        ContentNode::Heading { level, text } => {
            // h1 is reserved for the document; clamp slide headings to h2-h6.
            let level = (*level).clamp(2, 6);
            format!("<h{level}>{}</h{level}>\n", escape_html(text))
        }
        ContentNode::Paragraph { text } => {
            format!("<p>{}</p>\n", escape_html(text))
        }
        ContentNode::Image { src, alt, size } => {
            format!(
                "<img class=\"{}\" src=\"{}\" alt=\"{}\">\n",
                size.css_class(),
                escape_html(src),
                escape_html(alt)
            )
        }
    }
}

fn render_placeholder(filename: &str) -> String {
    format!(
        "<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n<meta charset=\"utf-8\">\n\
         <title>{0}</title>\n{1}</head>\n<body>\n\
         <section class=\"slide\">\n<h2>{0}</h2>\n\
         <p>This presentation could not be converted for inline viewing. \
         Download the original file to see its contents.</p>\n\
         </section>\n</body>\n</html>\n",
        escape_html(filename),
        STYLE
    )
}

const STYLE: &str = "<style>\n\
    body { font-family: sans-serif; margin: 0; background: #f0f0f0; }\n\
    .slide { background: #fff; margin: 2rem auto; padding: 2rem; max-width: 60rem; \
      box-shadow: 0 1px 4px rgba(0,0,0,.2); }\n\
    .img-small { max-width: 25%; }\n\
    .img-medium { max-width: 50%; }\n\
    .img-large { max-width: 75%; }\n\
    .img-full { max-width: 100%; }\n\
    </style>\n";

fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

// Atomic write: write to temp, then rename.
async fn write_atomic(path: &Path, contents: &str) -> Result<(), AnalyzeError> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            tokio::fs::create_dir_all(parent).await.map_err(|e| {
                AnalyzeError::OutputWriteFailed {
                    path: path.to_path_buf(),
                    source: e,
                }
            })?;
        }
    }

    let tmp_path = path.with_extension("html.tmp");
    tokio::fs::write(&tmp_path, contents)
        .await
        .map_err(|e| AnalyzeError::OutputWriteFailed {
            path: path.to_path_buf(),
            source: e,
        })?;

    tokio::fs::rename(&tmp_path, path)
        .await
        .map_err(|e| AnalyzeError::OutputWriteFailed {
            path: path.to_path_buf(),
            source: e,
        })
}
