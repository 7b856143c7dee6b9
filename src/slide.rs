//! Output types: slides, image references, and the structured content tree.
//!
//! A slide's body is stored as a [`StructuredDocument`] — a small typed node
//! tree — rather than HTML. The same representation backs both imported and
//! manually authored slides, so a single renderer can serve both, and the
//! repetitive-content filter can rebuild a slide's content from filtered raw
//! text without ever parsing markup.

use serde::{Deserialize, Serialize};

/// The container format a deck was imported from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeckFormat {
    Pptx,
    Pdf,
}

impl std::fmt::Display for DeckFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DeckFormat::Pptx => write!(f, "PPTX"),
            DeckFormat::Pdf => write!(f, "PDF"),
        }
    }
}

/// Deck-level facts available without running the full extraction.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeckMetadata {
    pub format: DeckFormat,
    /// Slide count for PPTX, page count for PDF.
    pub slide_count: usize,
}

/// A reference to an image extracted from the deck.
///
/// Identity is `filename`: the detector counts occurrences per distinct
/// filename, and the filter removes matches by filename.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageRef {
    /// Base filename, e.g. `image3.png` or `page-2.png`.
    pub filename: String,
    /// Where the image came from inside the container (`ppt/media/...`) or
    /// on disk for rasterized PDF pages.
    pub original_path: String,
    /// URL path the web layer serves the image under:
    /// `{public_base}/{webinar_id}/{filename}`.
    pub public_path: String,
    /// 1-indexed page number for rasterized PDF pages; `None` for PPTX media.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page_number: Option<usize>,
}

/// Display size of an image node, mirroring the renderer's sizing classes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImageSize {
    Small,
    #[default]
    Medium,
    Large,
    Full,
}

impl ImageSize {
    /// CSS class used by the HTML renderer.
    pub fn css_class(&self) -> &'static str {
        match self {
            ImageSize::Small => "img-small",
            ImageSize::Medium => "img-medium",
            ImageSize::Large => "img-large",
            ImageSize::Full => "img-full",
        }
    }
}

/// One typed node of a slide's structured content.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum ContentNode {
    Heading {
        level: u8,
        text: String,
    },
    Paragraph {
        text: String,
    },
    Image {
        src: String,
        alt: String,
        size: ImageSize,
    },
}

/// The normalized, renderer-agnostic tree representation of a slide body.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StructuredDocument {
    pub nodes: Vec<ContentNode>,
}

impl StructuredDocument {
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Build a content document from raw slide text and its image list.
    ///
    /// Paragraph split is on blank-line-or-newline runs; the first paragraph
    /// becomes a level-3 heading when shorter than `heading_max_len`
    /// characters. Each image becomes an [`ContentNode::Image`] sized
    /// [`ImageSize::Medium`], appended after the text in list order.
    pub fn from_text_and_images(
        text: &str,
        images: &[ImageRef],
        heading_max_len: usize,
    ) -> Self {
        let mut nodes = Vec::new();

        let mut paragraphs = text
            .split('\n')
            .map(str::trim)
            .filter(|p| !p.is_empty())
            .peekable();

        if let Some(first) = paragraphs.peek() {
            if first.chars().count() < heading_max_len {
                nodes.push(ContentNode::Heading {
                    level: 3,
                    text: (*first).to_string(),
                });
                paragraphs.next();
            }
        }
        for p in paragraphs {
            nodes.push(ContentNode::Paragraph {
                text: p.to_string(),
            });
        }

        for img in images {
            nodes.push(ContentNode::Image {
                src: img.public_path.clone(),
                alt: img.filename.clone(),
                size: ImageSize::default(),
            });
        }

        Self { nodes }
    }
}

/// One slide of the analyzed presentation.
///
/// Created by an extractor, rewritten once by the repetitive-content filter,
/// immutable thereafter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Slide {
    /// Display title, e.g. `Slide 3` or `Page 3`.
    pub title: String,
    /// Structured body content.
    pub content: StructuredDocument,
    /// Raw extracted text, later read back as the speech-synthesis script.
    pub speaker_note: String,
    /// Images referenced by this slide.
    pub images: Vec<ImageRef>,
}

impl Slide {
    /// Construct a slide, deriving `content` from the text and images.
    pub fn new(
        title: impl Into<String>,
        text: impl Into<String>,
        images: Vec<ImageRef>,
        heading_max_len: usize,
    ) -> Self {
        let text = text.into();
        let content = StructuredDocument::from_text_and_images(&text, &images, heading_max_len);
        Self {
            title: title.into(),
            content,
            speaker_note: text,
            images,
        }
    }
}
