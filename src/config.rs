//! Configuration types for presentation analysis.
//!
//! All analysis behaviour is controlled through [`AnalysisConfig`], built via
//! its [`AnalysisConfigBuilder`]. Keeping every knob in one struct makes it
//! trivial to share configs across tasks, serialise the tunables for logging,
//! and diff two runs to understand why their outputs differ.
//!
//! The repetitive-content thresholds live in their own
//! [`RepetitiveContentConfig`] so the detector can be exercised in isolation
//! with nothing but the numbers it actually reads.

use crate::error::AnalyzeError;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Tunables for deck-wide repetitive-content detection.
///
/// A text line is flagged repetitive when it occurs on at least
/// `ceil(slide_count * general_threshold)` slides, or when it matches one of
/// the fixed boilerplate patterns (page numbers, pagination, copyright, dates)
/// and occurs on at least `ceil(slide_count * pattern_threshold)` slides.
/// Lines shorter than `min_text_len` or longer than `max_text_len` characters
/// are never candidates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RepetitiveContentConfig {
    /// Minimum occurrence fraction for free-text matches. Default: 0.6.
    ///
    /// 60 % was the empirical sweet spot in the original deployment: headers
    /// and footers sit on nearly every slide, while legitimately repeated
    /// content (a recurring key message) rarely crosses half the deck.
    pub general_threshold: f64,

    /// Lower occurrence fraction for lines matching a boilerplate pattern.
    /// Default: 0.3.
    ///
    /// Template furniture like "Seite 4" only matches on slides that share
    /// the literal string, so a page-number line never reaches the general
    /// threshold. Lines that *look* like boilerplate get this lower bar.
    pub pattern_threshold: f64,

    /// Shortest candidate line, in characters (inclusive). Default: 3.
    pub min_text_len: usize,

    /// Longest candidate line, in characters (inclusive). Default: 200.
    pub max_text_len: usize,
}

impl Default for RepetitiveContentConfig {
    fn default() -> Self {
        Self {
            general_threshold: 0.6,
            pattern_threshold: 0.3,
            min_text_len: 3,
            max_text_len: 200,
        }
    }
}

/// Configuration for a presentation analysis run.
///
/// Built via [`AnalysisConfig::builder()`] or using
/// [`AnalysisConfig::default()`].
///
/// # Example
/// ```rust
/// use deck2slides::AnalysisConfig;
///
/// let config = AnalysisConfig::builder()
///     .uploads_dir("/srv/webinar/uploads")
///     .raster_timeout_secs(90)
///     .build()
///     .unwrap();
/// ```
#[derive(Debug, Clone)]
pub struct AnalysisConfig {
    /// Directory holding uploaded presentation files; extracted images are
    /// written to a per-webinar subdirectory of it. Default: `uploads`.
    pub uploads_dir: PathBuf,

    /// URL prefix under which `uploads_dir` is served. Used to build each
    /// [`crate::slide::ImageRef::public_path`] as
    /// `{public_base}/{webinar_id}/{filename}`. Default: `/uploads`.
    pub public_base: String,

    /// Repetitive-content detection tunables.
    pub repetitive: RepetitiveContentConfig,

    /// A paragraph this short (in characters, exclusive) is promoted to a
    /// heading when it opens a slide's content. Default: 100.
    pub heading_max_len: usize,

    /// Timeout for the `pdftoppm` page-rasterization subprocess, in seconds.
    /// Default: 120.
    ///
    /// Rasterizing a large deck is the slowest step by far; two minutes is
    /// generous for decks of tens of pages while still bounding a hung
    /// poppler process.
    pub raster_timeout_secs: u64,

    /// Timeout for the LibreOffice office-to-HTML fallback conversion, in
    /// seconds. Default: 60.
    pub convert_timeout_secs: u64,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            uploads_dir: PathBuf::from("uploads"),
            public_base: "/uploads".to_string(),
            repetitive: RepetitiveContentConfig::default(),
            heading_max_len: 100,
            raster_timeout_secs: 120,
            convert_timeout_secs: 60,
        }
    }
}

impl AnalysisConfig {
    /// Create a new builder for `AnalysisConfig`.
    pub fn builder() -> AnalysisConfigBuilder {
        AnalysisConfigBuilder {
            config: Self::default(),
        }
    }
}

/// Builder for [`AnalysisConfig`].
#[derive(Debug)]
pub struct AnalysisConfigBuilder {
    config: AnalysisConfig,
}

impl AnalysisConfigBuilder {
    pub fn uploads_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.config.uploads_dir = dir.into();
        self
    }

    pub fn public_base(mut self, base: impl Into<String>) -> Self {
        let base = base.into();
        // Keep the public path joinable: no trailing slash.
        self.config.public_base = base.trim_end_matches('/').to_string();
        self
    }

    pub fn general_threshold(mut self, t: f64) -> Self {
        self.config.repetitive.general_threshold = t.clamp(0.0, 1.0);
        self
    }

    pub fn pattern_threshold(mut self, t: f64) -> Self {
        self.config.repetitive.pattern_threshold = t.clamp(0.0, 1.0);
        self
    }

    pub fn text_len_bounds(mut self, min: usize, max: usize) -> Self {
        self.config.repetitive.min_text_len = min;
        self.config.repetitive.max_text_len = max;
        self
    }

    pub fn repetitive(mut self, cfg: RepetitiveContentConfig) -> Self {
        self.config.repetitive = cfg;
        self
    }

    pub fn heading_max_len(mut self, n: usize) -> Self {
        self.config.heading_max_len = n;
        self
    }

    pub fn raster_timeout_secs(mut self, secs: u64) -> Self {
        self.config.raster_timeout_secs = secs.max(1);
        self
    }

    pub fn convert_timeout_secs(mut self, secs: u64) -> Self {
        self.config.convert_timeout_secs = secs.max(1);
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<AnalysisConfig, AnalyzeError> {
        let c = &self.config;
        let r = &c.repetitive;
        if r.min_text_len > r.max_text_len {
            return Err(AnalyzeError::InvalidConfig(format!(
                "min_text_len ({}) must be <= max_text_len ({})",
                r.min_text_len, r.max_text_len
            )));
        }
        if r.pattern_threshold > r.general_threshold {
            return Err(AnalyzeError::InvalidConfig(format!(
                "pattern_threshold ({}) must be <= general_threshold ({})",
                r.pattern_threshold, r.general_threshold
            )));
        }
        if c.public_base.is_empty() {
            return Err(AnalyzeError::InvalidConfig(
                "public_base must not be empty".into(),
            ));
        }
        Ok(self.config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_documented_values() {
        let c = AnalysisConfig::default();
        assert_eq!(c.repetitive.general_threshold, 0.6);
        assert_eq!(c.repetitive.pattern_threshold, 0.3);
        assert_eq!(c.repetitive.min_text_len, 3);
        assert_eq!(c.repetitive.max_text_len, 200);
        assert_eq!(c.heading_max_len, 100);
        assert_eq!(c.raster_timeout_secs, 120);
        assert_eq!(c.convert_timeout_secs, 60);
    }

    #[test]
    fn builder_clamps_thresholds() {
        let c = AnalysisConfig::builder()
            .general_threshold(1.7)
            .pattern_threshold(-0.2)
            .build()
            .unwrap();
        assert_eq!(c.repetitive.general_threshold, 1.0);
        assert_eq!(c.repetitive.pattern_threshold, 0.0);
    }

    #[test]
    fn builder_strips_trailing_slash_from_public_base() {
        let c = AnalysisConfig::builder()
            .public_base("/assets/")
            .build()
            .unwrap();
        assert_eq!(c.public_base, "/assets");
    }

    #[test]
    fn build_rejects_inverted_length_bounds() {
        let err = AnalysisConfig::builder()
            .text_len_bounds(20, 5)
            .build()
            .unwrap_err();
        assert!(err.to_string().contains("min_text_len"));
    }

    #[test]
    fn build_rejects_pattern_threshold_above_general() {
        let err = AnalysisConfig::builder()
            .general_threshold(0.3)
            .pattern_threshold(0.6)
            .build()
            .unwrap_err();
        assert!(err.to_string().contains("pattern_threshold"));
    }
}
