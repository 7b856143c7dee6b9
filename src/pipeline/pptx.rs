//! PPTX extraction: ZIP container + Office Open XML slide parts.
//!
//! ## Why spawn_blocking?
//!
//! The `zip` and `quick-xml` crates are synchronous; unpacking a deck with
//! hundreds of media entries is CPU-and-disk work that would stall the async
//! executor. The archive walk runs on the blocking pool, then image writing
//! and per-slide assembly resume on the async side where progress milestones
//! are reported.
//!
//! ## Slide ordering
//!
//! Slide parts are named `ppt/slides/slide{N}.xml`. They are sorted by the
//! numeric `N`, not lexically — `slide10.xml` sorts after `slide9.xml`, which
//! a string sort gets wrong.

use crate::config::AnalysisConfig;
use crate::error::AnalyzeError;
use crate::progress::SessionReporter;
use crate::slide::{ImageRef, Slide};
use once_cell::sync::Lazy;
use quick_xml::events::Event;
use quick_xml::Reader;
use regex::Regex;
use std::collections::HashMap;
use std::io::{Cursor, Read};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};
use zip::ZipArchive;

static RE_SLIDE_PART: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^ppt/slides/slide(\d+)\.xml$").unwrap());

/// Media extensions extracted from `ppt/media/`.
const IMAGE_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "gif", "svg"];

/// One slide XML part with its relationship part, pulled from the archive.
struct SlidePart {
    /// Numeric index from the part name (1-based).
    number: usize,
    xml: String,
    rels_xml: Option<String>,
}

/// Everything the async side needs from the ZIP container.
struct PptxParts {
    /// `(basename, bytes)` for every media image, in archive order.
    media: Vec<(String, Vec<u8>)>,
    /// Slide parts sorted by numeric index.
    slides: Vec<SlidePart>,
}

/// Analyze a PPTX deck: extract media once, then per-slide text and image
/// references, in numeric slide order.
pub async fn analyze_pptx(
    path: &Path,
    webinar_id: &str,
    config: &AnalysisConfig,
    reporter: &SessionReporter,
) -> Result<Vec<Slide>, AnalyzeError> {
    let bytes = tokio::fs::read(path).await.map_err(|e| match e.kind() {
        std::io::ErrorKind::NotFound => AnalyzeError::FileNotFound {
            path: path.to_path_buf(),
        },
        _ => AnalyzeError::Internal(format!("Failed to read '{}': {e}", path.display())),
    })?;

    reporter
        .report(10, "PPTX file loaded, scanning slides...")
        .await;

    let archive_path = path.to_path_buf();
    let parts = tokio::task::spawn_blocking(move || read_archive(bytes, &archive_path))
        .await
        .map_err(|e| AnalyzeError::Internal(format!("PPTX parse task panicked: {e}")))??;

    // Write all media once per deck, building the lookup the per-slide
    // relationship resolution maps into.
    let all_images = write_media(&parts.media, webinar_id, config).await?;
    reporter
        .report(30, format!("{} images extracted...", all_images.len()))
        .await;

    let slide_count = parts.slides.len();
    reporter
        .report(40, format!("{slide_count} slides found..."))
        .await;

    let mut slides = Vec::with_capacity(slide_count);
    let progress_per_slide = if slide_count > 0 {
        50.0 / slide_count as f64
    } else {
        0.0
    };

    for (i, part) in parts.slides.iter().enumerate() {
        let text = extract_text_runs(&part.xml).map_err(|detail| AnalyzeError::SlideXml {
            part: format!("ppt/slides/slide{}.xml", part.number),
            detail,
        })?;

        let relationships = match &part.rels_xml {
            Some(rels) => parse_relationships(rels).unwrap_or_else(|detail| {
                warn!(slide = part.number, detail, "Unreadable relationship part, skipping images");
                HashMap::new()
            }),
            None => HashMap::new(),
        };

        let images = resolve_slide_images(&part.xml, &relationships, &all_images)
            .map_err(|detail| AnalyzeError::SlideXml {
                part: format!("ppt/slides/slide{}.xml", part.number),
                detail,
            })?;

        debug!(
            slide = part.number,
            chars = text.len(),
            images = images.len(),
            "Extracted slide"
        );

        slides.push(Slide::new(
            format!("Slide {}", i + 1),
            text,
            images,
            config.heading_max_len,
        ));

        reporter
            .report(
                (40.0 + progress_per_slide * (i + 1) as f64).round() as u8,
                format!("Slide {}/{slide_count} processed...", i + 1),
            )
            .await;
    }

    reporter.report(95, "Analysis finishing...").await;
    Ok(slides)
}

/// Count the slide parts without extracting anything.
pub fn count_slides(bytes: Vec<u8>, path: &Path) -> Result<usize, AnalyzeError> {
    let archive = open_archive(bytes, path)?;
    Ok(archive
        .file_names()
        .filter(|name| RE_SLIDE_PART.is_match(name))
        .count())
}

// ── Archive walk (blocking) ──────────────────────────────────────────────

fn open_archive(bytes: Vec<u8>, path: &Path) -> Result<ZipArchive<Cursor<Vec<u8>>>, AnalyzeError> {
    ZipArchive::new(Cursor::new(bytes)).map_err(|e| AnalyzeError::CorruptArchive {
        path: path.to_path_buf(),
        detail: e.to_string(),
    })
}

/// Pull media bytes and slide/rels XML out of the container in one pass
/// over the archive.
fn read_archive(bytes: Vec<u8>, path: &Path) -> Result<PptxParts, AnalyzeError> {
    let mut archive = open_archive(bytes, path)?;

    let names: Vec<String> = archive.file_names().map(str::to_string).collect();

    let mut media = Vec::new();
    let mut numbered: Vec<(usize, String)> = Vec::new();

    for name in &names {
        if is_media_image(name) {
            let data = read_entry_bytes(&mut archive, name, path)?;
            let basename = entry_basename(name);
            media.push((basename, data));
        } else if let Some(caps) = RE_SLIDE_PART.captures(name) {
            // The capture is all digits; absurdly long numbers are ignored.
            if let Ok(n) = caps[1].parse::<usize>() {
                numbered.push((n, name.clone()));
            }
        }
    }

    numbered.sort_by_key(|(n, _)| *n);

    let mut slides = Vec::with_capacity(numbered.len());
    for (number, name) in numbered {
        let xml = read_entry_string(&mut archive, &name, path)?;
        let rels_name = format!("ppt/slides/_rels/slide{number}.xml.rels");
        let rels_xml = if names.iter().any(|n| n == &rels_name) {
            Some(read_entry_string(&mut archive, &rels_name, path)?)
        } else {
            None
        };
        slides.push(SlidePart {
            number,
            xml,
            rels_xml,
        });
    }

    Ok(PptxParts { media, slides })
}

fn is_media_image(name: &str) -> bool {
    if !name.starts_with("ppt/media/") {
        return false;
    }
    name.rsplit('.')
        .next()
        .map(|ext| IMAGE_EXTENSIONS.contains(&ext.to_ascii_lowercase().as_str()))
        .unwrap_or(false)
}

fn entry_basename(name: &str) -> String {
    name.rsplit('/').next().unwrap_or(name).to_string()
}

fn read_entry_bytes(
    archive: &mut ZipArchive<Cursor<Vec<u8>>>,
    name: &str,
    path: &Path,
) -> Result<Vec<u8>, AnalyzeError> {
    let mut entry = archive
        .by_name(name)
        .map_err(|e| AnalyzeError::CorruptArchive {
            path: path.to_path_buf(),
            detail: format!("entry '{name}': {e}"),
        })?;
    let mut data = Vec::with_capacity(entry.size() as usize);
    entry
        .read_to_end(&mut data)
        .map_err(|e| AnalyzeError::CorruptArchive {
            path: path.to_path_buf(),
            detail: format!("entry '{name}': {e}"),
        })?;
    Ok(data)
}

fn read_entry_string(
    archive: &mut ZipArchive<Cursor<Vec<u8>>>,
    name: &str,
    path: &Path,
) -> Result<String, AnalyzeError> {
    let data = read_entry_bytes(archive, name, path)?;
    String::from_utf8(data).map_err(|e| AnalyzeError::CorruptArchive {
        path: path.to_path_buf(),
        detail: format!("entry '{name}' is not UTF-8: {e}"),
    })
}

// ── Media persistence ────────────────────────────────────────────────────

/// Write every media image under `{uploads_dir}/{webinar_id}/` and return
/// the deck-wide [`ImageRef`] list.
async fn write_media(
    media: &[(String, Vec<u8>)],
    webinar_id: &str,
    config: &AnalysisConfig,
) -> Result<Vec<ImageRef>, AnalyzeError> {
    let image_dir: PathBuf = config.uploads_dir.join(webinar_id);
    tokio::fs::create_dir_all(&image_dir)
        .await
        .map_err(|e| AnalyzeError::OutputWriteFailed {
            path: image_dir.clone(),
            source: e,
        })?;

    let mut refs = Vec::with_capacity(media.len());
    for (basename, data) in media {
        let target = image_dir.join(basename);
        tokio::fs::write(&target, data)
            .await
            .map_err(|e| AnalyzeError::OutputWriteFailed {
                path: target.clone(),
                source: e,
            })?;
        refs.push(ImageRef {
            filename: basename.clone(),
            original_path: format!("ppt/media/{basename}"),
            public_path: format!("{}/{webinar_id}/{basename}", config.public_base),
            page_number: None,
        });
    }
    Ok(refs)
}

// ── Slide XML parsing ────────────────────────────────────────────────────

/// Collect all `<a:t>` text runs in document order, joined with spaces.
fn extract_text_runs(xml: &str) -> Result<String, String> {
    let mut reader = Reader::from_str(xml);
    let mut runs: Vec<String> = Vec::new();
    let mut in_text_run = false;

    loop {
        match reader.read_event() {
            Ok(Event::Start(ref e)) if local_name(e.name().as_ref()) == b"t" => {
                in_text_run = true;
            }
            Ok(Event::End(ref e)) if local_name(e.name().as_ref()) == b"t" => {
                in_text_run = false;
            }
            Ok(Event::Text(ref e)) if in_text_run => {
                let text = e.unescape().map_err(|e| e.to_string())?;
                let text = text.trim();
                if !text.is_empty() {
                    runs.push(text.to_string());
                }
            }
            Ok(Event::Eof) => break,
            Err(e) => return Err(e.to_string()),
            _ => {}
        }
    }

    Ok(runs.join(" "))
}

/// Collect `r:embed` relationship ids from the slide XML, in document order.
fn extract_image_ref_ids(xml: &str) -> Result<Vec<String>, String> {
    let mut reader = Reader::from_str(xml);
    let mut ids = Vec::new();

    loop {
        match reader.read_event() {
            Ok(Event::Start(ref e)) | Ok(Event::Empty(ref e)) => {
                for attr in e.attributes().flatten() {
                    if local_name(attr.key.as_ref()) == b"embed" {
                        ids.push(String::from_utf8_lossy(&attr.value).to_string());
                    }
                }
            }
            Ok(Event::Eof) => break,
            Err(e) => return Err(e.to_string()),
            _ => {}
        }
    }

    Ok(ids)
}

/// Map relationship ids to their targets from a slide's `.rels` part.
///
/// Targets use `../media/imageN.png` relative paths; replacing the traversal
/// prefix keeps resolution inside the `ppt/` tree.
fn parse_relationships(rels_xml: &str) -> Result<HashMap<String, String>, String> {
    let mut reader = Reader::from_str(rels_xml);
    let mut relationships = HashMap::new();

    loop {
        match reader.read_event() {
            Ok(Event::Start(ref e)) | Ok(Event::Empty(ref e))
                if local_name(e.name().as_ref()) == b"Relationship" =>
            {
                let mut id = None;
                let mut target = None;
                for attr in e.attributes().flatten() {
                    match attr.key.as_ref() {
                        b"Id" => id = Some(String::from_utf8_lossy(&attr.value).to_string()),
                        b"Target" => {
                            target = Some(
                                String::from_utf8_lossy(&attr.value).replace("../", "ppt/"),
                            );
                        }
                        _ => {}
                    }
                }
                if let (Some(id), Some(target)) = (id, target) {
                    relationships.insert(id, target);
                }
            }
            Ok(Event::Eof) => break,
            Err(e) => return Err(e.to_string()),
            _ => {}
        }
    }

    Ok(relationships)
}

/// Resolve a slide's `r:embed` ids through its relationships to the deck's
/// extracted media, preserving reference order and dropping dangling ids.
fn resolve_slide_images(
    slide_xml: &str,
    relationships: &HashMap<String, String>,
    all_images: &[ImageRef],
) -> Result<Vec<ImageRef>, String> {
    let ids = extract_image_ref_ids(slide_xml)?;
    Ok(ids
        .iter()
        .filter_map(|id| relationships.get(id))
        .map(|target| entry_basename(target))
        .filter_map(|basename| all_images.iter().find(|img| img.filename == basename))
        .cloned()
        .collect())
}

/// Strip an XML namespace prefix: `a:t` → `t`.
fn local_name(name: &[u8]) -> &[u8] {
    match name.iter().position(|&b| b == b':') {
        Some(pos) => &name[pos + 1..],
        None => name,
    }
}
