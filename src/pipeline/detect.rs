//! Repetitive-content detection: find deck-wide furniture.
//!
//! ## Why frequency thresholds?
//!
//! Headers, footers, page numbers, and logos are artifacts of the deck
//! template: they recur on most slides, while real content is slide-specific.
//! Counting exact trimmed-line occurrences across the deck and flagging
//! anything above a fraction of the slide count is cheap, O(total lines), and
//! explainable. No perceptual image hashing, no fuzzy text similarity —
//! exact-match only, trading recall (per-slide-varying "Page 1".."Page N"
//! strings are not caught) for zero false positives on legitimately repeated
//! slide content.
//!
//! Lines that *look* like boilerplate (pure page numbers, "Seite N",
//! pagination, copyright lines, dates) get a lower occurrence bar, since a
//! page-number line by construction never appears on every slide verbatim.

use crate::config::RepetitiveContentConfig;
use crate::slide::Slide;
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::{HashMap, HashSet};

/// Fixed boilerplate patterns checked against whole trimmed lines.
static BOILERPLATE: Lazy<Vec<Regex>> = Lazy::new(|| {
    [
        // Bare page number: "7"
        r"^\d+$",
        // "Page 3", "Seite 3", "Folie 3", "Slide 3"
        r"(?i)^(page|seite|folie|slide)\s+\d+$",
        // Pagination: "3/12", "3 / 12"
        r"^\d+\s*/\s*\d+$",
        // Copyright line carrying a year
        r"(?i)(©|\(c\)|copyright).*\d{4}",
        // Date-like: "01.02.2024", "1/2/24", "2024-02-01"
        r"^\d{1,4}[./-]\d{1,2}[./-]\d{1,4}$",
    ]
    .iter()
    .map(|p| Regex::new(p).unwrap())
    .collect()
});

/// Whether a trimmed line matches one of the known boilerplate shapes.
pub fn is_boilerplate(line: &str) -> bool {
    BOILERPLATE.iter().any(|re| re.is_match(line))
}

/// Minimum occurrence count for a fraction of the slide count:
/// `ceil(slide_count * fraction)`.
fn min_count(slide_count: usize, fraction: f64) -> usize {
    (slide_count as f64 * fraction).ceil() as usize
}

/// The distinct eligible lines of one slide's raw text.
///
/// Lines are trimmed, bounded to `min_text_len..=max_text_len` characters,
/// and deduplicated — a line repeated *within* one slide counts once for that
/// slide.
fn slide_lines(slide: &Slide, cfg: &RepetitiveContentConfig) -> HashSet<String> {
    slide
        .speaker_note
        .lines()
        .map(str::trim)
        .filter(|l| {
            let len = l.chars().count();
            len >= cfg.min_text_len && len <= cfg.max_text_len
        })
        .map(str::to_string)
        .collect()
}

/// The distinct image filenames of one slide.
fn slide_image_names(slide: &Slide) -> HashSet<String> {
    slide.images.iter().map(|i| i.filename.clone()).collect()
}

/// Detect text lines that recur across enough slides to be deck furniture.
///
/// A line is flagged when it occurs on at least
/// `ceil(n * general_threshold)` slides, or matches a boilerplate pattern and
/// occurs on at least `ceil(n * pattern_threshold)` slides. Matching is by
/// exact trimmed-line equality; order-independent.
///
/// Returns an empty set for fewer than 2 slides.
pub fn detect_repetitive_text(slides: &[Slide], cfg: &RepetitiveContentConfig) -> HashSet<String> {
    if slides.len() < 2 {
        return HashSet::new();
    }

    let mut counts: HashMap<String, usize> = HashMap::new();
    for slide in slides {
        for line in slide_lines(slide, cfg) {
            *counts.entry(line).or_insert(0) += 1;
        }
    }

    let general_min = min_count(slides.len(), cfg.general_threshold);
    let pattern_min = min_count(slides.len(), cfg.pattern_threshold);

    counts
        .into_iter()
        .filter(|(line, count)| {
            *count >= general_min || (*count >= pattern_min && is_boilerplate(line))
        })
        .map(|(line, _)| line)
        .collect()
}

/// Detect image filenames that recur across enough slides (logos, template
/// graphics). Same counting as text, single general threshold, no pattern
/// tier.
pub fn detect_repetitive_images(
    slides: &[Slide],
    cfg: &RepetitiveContentConfig,
) -> HashSet<String> {
    if slides.len() < 2 {
        return HashSet::new();
    }

    let mut counts: HashMap<String, usize> = HashMap::new();
    for slide in slides {
        for name in slide_image_names(slide) {
            *counts.entry(name).or_insert(0) += 1;
        }
    }

    let general_min = min_count(slides.len(), cfg.general_threshold);

    counts
        .into_iter()
        .filter(|(_, count)| *count >= general_min)
        .map(|(name, _)| name)
        .collect()
}
