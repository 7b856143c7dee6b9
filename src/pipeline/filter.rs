//! Filtering: strip detected repetitive content and rebuild slide bodies.
//!
//! Runs after *all* extraction for a deck has finished — the detectors need
//! the complete ordered slide set to compute occurrence frequencies, so
//! filtering a slide before its siblings exist would see wrong counts.
//!
//! Pure function over the slide list: same input, same output, no disk I/O.
//! Removal is line-based (a line is kept or dropped in its entirety, by
//! trimmed-line equality) and filename-based for images. Each filtered
//! slide's content document is regenerated from what survived.

use crate::config::AnalysisConfig;
use crate::pipeline::detect::{detect_repetitive_images, detect_repetitive_text};
use crate::slide::{Slide, StructuredDocument};
use std::collections::HashSet;
use tracing::debug;

/// Remove deck-wide repetitive text lines and images from every slide.
///
/// Returns the input unchanged when fewer than 2 slides exist (no frequency
/// to measure). Otherwise runs both detectors once over the full set, strips
/// matches from each slide's raw text and image list, and rebuilds the
/// slide's [`StructuredDocument`] from the filtered remains. Slide order and
/// surviving per-slide content order are preserved.
///
/// Applying this twice is equivalent to applying it once: the removed
/// lines/images are gone after the first pass, so no remaining element
/// reaches a threshold on the second.
pub fn filter_repetitive_content(slides: Vec<Slide>, config: &AnalysisConfig) -> Vec<Slide> {
    if slides.len() < 2 {
        return slides;
    }

    let repetitive_text = detect_repetitive_text(&slides, &config.repetitive);
    let repetitive_images = detect_repetitive_images(&slides, &config.repetitive);

    if repetitive_text.is_empty() && repetitive_images.is_empty() {
        return slides;
    }
    debug!(
        texts = repetitive_text.len(),
        images = repetitive_images.len(),
        "Stripping repetitive deck content"
    );

    slides
        .into_iter()
        .map(|slide| filter_slide(slide, &repetitive_text, &repetitive_images, config))
        .collect()
}

/// Apply the detected sets to one slide.
fn filter_slide(
    slide: Slide,
    repetitive_text: &HashSet<String>,
    repetitive_images: &HashSet<String>,
    config: &AnalysisConfig,
) -> Slide {
    let text: String = slide
        .speaker_note
        .lines()
        .filter(|line| !repetitive_text.contains(line.trim()))
        .collect::<Vec<_>>()
        .join("\n");

    let images: Vec<_> = slide
        .images
        .into_iter()
        .filter(|img| !repetitive_images.contains(&img.filename))
        .collect();

    let content = StructuredDocument::from_text_and_images(&text, &images, config.heading_max_len);

    Slide {
        title: slide.title,
        content,
        speaker_note: text,
        images,
    }
}
