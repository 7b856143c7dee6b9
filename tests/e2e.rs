//! End-to-end integration tests for deck2slides.
//!
//! No fixture files are required: each test synthesizes a minimal PPTX
//! (via `zip`) or PDF (via `lopdf`) in a tempdir and runs the full
//! analysis over it. PDF preview rasterization depends on `pdftoppm`
//! being installed; the assertions tolerate its absence because the
//! pipeline degrades to text-only pages.

use deck2slides::{
    analyze_presentation, inspect, AnalysisConfig, AnalysisStatus, DeckFormat, ProgressStore,
};
use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Document, Object, Stream};
use std::io::Write;
use std::path::{Path, PathBuf};
use zip::write::FileOptions;

// ── Test helpers ─────────────────────────────────────────────────────────────

/// Route library logs through the test writer; `RUST_LOG=debug cargo test
/// -- --nocapture` shows the per-slide extraction trace.
fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// A 1x1 transparent PNG.
const TINY_PNG: &[u8] = &[
    0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A, 0x00, 0x00, 0x00, 0x0D, 0x49, 0x48, 0x44,
    0x52, 0x00, 0x00, 0x00, 0x01, 0x00, 0x00, 0x00, 0x01, 0x08, 0x06, 0x00, 0x00, 0x00, 0x1F,
    0x15, 0xC4, 0x89, 0x00, 0x00, 0x00, 0x0D, 0x49, 0x44, 0x41, 0x54, 0x78, 0x9C, 0x63, 0x60,
    0x00, 0x02, 0x00, 0x00, 0x05, 0x00, 0x01, 0xE9, 0xFA, 0xDC, 0xD8, 0x00, 0x00, 0x00, 0x00,
    0x49, 0x45, 0x4E, 0x44, 0xAE, 0x42, 0x60, 0x82,
];

fn slide_xml(texts: &[&str], embed_id: Option<&str>) -> String {
    let runs: String = texts
        .iter()
        .map(|t| format!("<a:p><a:r><a:t>{t}</a:t></a:r></a:p>"))
        .collect();
    let pic = embed_id
        .map(|id| format!(r#"<p:pic><p:blipFill><a:blip r:embed="{id}"/></p:blipFill></p:pic>"#))
        .unwrap_or_default();
    format!(
        r#"<?xml version="1.0"?>
<p:sld xmlns:a="http://schemas.openxmlformats.org/drawingml/2006/main"
       xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships"
       xmlns:p="http://schemas.openxmlformats.org/presentationml/2006/main">
  <p:cSld><p:spTree><p:sp><p:txBody>{runs}</p:txBody></p:sp>{pic}</p:spTree></p:cSld>
</p:sld>"#
    )
}

const IMAGE_RELS: &str = r#"<?xml version="1.0"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">
  <Relationship Id="rId2" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/image" Target="../media/image1.png"/>
</Relationships>"#;

/// Write a synthetic PPTX: one slide part per entry of `slides`, each entry
/// being `(texts, optional rels xml)`.
fn build_pptx(path: &Path, slides: &[(Vec<&str>, Option<&str>)], with_media: bool) {
    let file = std::fs::File::create(path).unwrap();
    let mut zipw = zip::ZipWriter::new(file);
    let options: FileOptions = FileOptions::default();

    for (i, (texts, rels)) in slides.iter().enumerate() {
        let n = i + 1;
        let embed = rels.is_some().then_some("rId2");
        zipw.start_file(format!("ppt/slides/slide{n}.xml"), options)
            .unwrap();
        zipw.write_all(slide_xml(texts, embed).as_bytes()).unwrap();
        if let Some(rels_xml) = rels {
            zipw.start_file(format!("ppt/slides/_rels/slide{n}.xml.rels"), options)
                .unwrap();
            zipw.write_all(rels_xml.as_bytes()).unwrap();
        }
    }

    if with_media {
        zipw.start_file("ppt/media/image1.png", options).unwrap();
        zipw.write_all(TINY_PNG).unwrap();
    }

    zipw.finish().unwrap();
}

/// Write a PDF with one text page per entry of `page_texts`.
fn build_pdf(path: &Path, page_texts: &[&str]) {
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();

    let font_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Courier",
    });
    let resources_id = doc.add_object(dictionary! {
        "Font" => dictionary! { "F1" => font_id },
    });

    let mut kids: Vec<Object> = Vec::new();
    for text in page_texts {
        let content = Content {
            operations: vec![
                Operation::new("BT", vec![]),
                Operation::new("Tf", vec!["F1".into(), 24.into()]),
                Operation::new("Td", vec![72.into(), 700.into()]),
                Operation::new("Tj", vec![Object::string_literal(*text)]),
                Operation::new("ET", vec![]),
            ],
        };
        let content_id = doc.add_object(Stream::new(
            dictionary! {},
            content.encode().unwrap(),
        ));
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "Contents" => content_id,
            "Resources" => resources_id,
            "MediaBox" => vec![0.into(), 0.into(), 612.into(), 792.into()],
        });
        kids.push(page_id.into());
    }

    let count = kids.len() as i64;
    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => count,
        }),
    );
    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);
    doc.save(path).unwrap();
}

fn test_config(dir: &Path) -> AnalysisConfig {
    AnalysisConfig::builder()
        .uploads_dir(dir.join("uploads"))
        .build()
        .unwrap()
}

// ── PPTX ─────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn pptx_end_to_end() {
    init_tracing();
    let dir = tempfile::tempdir().unwrap();
    let deck = dir.path().join("deck.pptx");
    build_pptx(
        &deck,
        &[
            (vec!["Welcome"], None),
            (vec!["Agenda", "for the quarterly review"], None),
            (vec!["Questions"], None),
        ],
        false,
    );

    let store = ProgressStore::new();
    let config = test_config(dir.path());
    let slides = analyze_presentation(&deck, "w1", "s1", &store, &config)
        .await
        .unwrap();

    assert_eq!(slides.len(), 3);
    assert_eq!(slides[0].title, "Slide 1");
    assert_eq!(slides[2].title, "Slide 3");
    // Runs within a slide are joined with spaces.
    assert_eq!(slides[1].speaker_note, "Agenda for the quarterly review");
    // Short opening text is promoted to a heading.
    assert!(matches!(
        slides[0].content.nodes[0],
        deck2slides::ContentNode::Heading { .. }
    ));

    let terminal = store.take_terminal("s1").await.unwrap();
    assert_eq!(terminal.status, AnalysisStatus::Completed);
    assert_eq!(terminal.progress, 100);
    assert_eq!(terminal.slides.as_ref().unwrap().len(), 3);
    // Terminal records are removed once read.
    assert!(store.get("s1").await.is_none());
}

#[tokio::test]
async fn pptx_slides_come_back_in_numeric_order() {
    let dir = tempfile::tempdir().unwrap();
    let deck = dir.path().join("deck.pptx");
    let texts: Vec<String> = (1..=12).map(|n| format!("Body of slide number {n}")).collect();
    let slides_spec: Vec<(Vec<&str>, Option<&str>)> =
        texts.iter().map(|t| (vec![t.as_str()], None)).collect();
    build_pptx(&deck, &slides_spec, false);

    let store = ProgressStore::new();
    let config = test_config(dir.path());
    let slides = analyze_presentation(&deck, "w1", "s1", &store, &config)
        .await
        .unwrap();

    assert_eq!(slides.len(), 12);
    // A lexical sort would put slide10 before slide2.
    assert_eq!(slides[1].speaker_note, "Body of slide number 2");
    assert_eq!(slides[9].speaker_note, "Body of slide number 10");
}

#[tokio::test]
async fn pptx_images_extracted_and_mapped_to_slides() {
    let dir = tempfile::tempdir().unwrap();
    let deck = dir.path().join("deck.pptx");
    build_pptx(
        &deck,
        &[
            (vec!["Chart slide with one figure"], Some(IMAGE_RELS)),
            (vec!["Plain text slide"], None),
        ],
        true,
    );

    let store = ProgressStore::new();
    let config = test_config(dir.path());
    let slides = analyze_presentation(&deck, "webinar-7", "s1", &store, &config)
        .await
        .unwrap();

    assert_eq!(slides[0].images.len(), 1);
    assert_eq!(slides[0].images[0].filename, "image1.png");
    assert_eq!(
        slides[0].images[0].public_path,
        "/uploads/webinar-7/image1.png"
    );
    assert!(slides[1].images.is_empty());

    // The binary itself landed under the per-webinar uploads dir.
    let on_disk = dir.path().join("uploads/webinar-7/image1.png");
    assert_eq!(std::fs::read(on_disk).unwrap(), TINY_PNG);
}

#[tokio::test]
async fn repetitive_footer_stripped_across_deck() {
    let dir = tempfile::tempdir().unwrap();
    let deck = dir.path().join("deck.pptx");
    // Four slides consist of nothing but the footer; one carries content.
    let slides_spec: Vec<(Vec<&str>, Option<&str>)> = vec![
        (vec!["Acme Corp Confidential"], None),
        (vec!["Acme Corp Confidential"], None),
        (vec!["Acme Corp Confidential"], None),
        (vec!["Acme Corp Confidential"], None),
        (vec!["The one slide with real content"], None),
    ];
    build_pptx(&deck, &slides_spec, false);

    let store = ProgressStore::new();
    let config = test_config(dir.path());
    let slides = analyze_presentation(&deck, "w1", "s1", &store, &config)
        .await
        .unwrap();

    // 4/5 = 80% >= 60%: the footer line is stripped wherever it appears.
    for slide in &slides[..4] {
        assert!(slide.speaker_note.is_empty(), "footer survived filtering");
        assert!(slide.content.is_empty());
    }
    assert_eq!(slides[4].speaker_note, "The one slide with real content");
}

#[tokio::test]
async fn corrupt_pptx_is_a_fatal_error() {
    let dir = tempfile::tempdir().unwrap();
    let deck = dir.path().join("deck.pptx");
    std::fs::write(&deck, b"this is not a zip archive").unwrap();

    let store = ProgressStore::new();
    let config = test_config(dir.path());
    let result = analyze_presentation(&deck, "w1", "s1", &store, &config).await;

    assert!(result.is_err());
    let terminal = store.take_terminal("s1").await.unwrap();
    assert_eq!(terminal.status, AnalysisStatus::Error);
    assert!(terminal.error.is_some());
}

// ── PDF ──────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn pdf_end_to_end() {
    init_tracing();
    let dir = tempfile::tempdir().unwrap();
    let deck = dir.path().join("handout.pdf");
    build_pdf(&deck, &["First page text", "Second page text"]);

    let store = ProgressStore::new();
    let config = test_config(dir.path());
    let slides = analyze_presentation(&deck, "w1", "s1", &store, &config)
        .await
        .unwrap();

    // Works with or without pdftoppm installed; images just come back
    // empty in the degraded case.
    assert_eq!(slides.len(), 2);
    assert_eq!(slides[0].title, "Page 1");
    assert_eq!(slides[1].title, "Page 2");

    let terminal = store.take_terminal("s1").await.unwrap();
    assert_eq!(terminal.status, AnalysisStatus::Completed);
}

#[tokio::test]
async fn pdf_degrades_to_text_only_when_rasterization_cannot_run() {
    init_tracing();
    let dir = tempfile::tempdir().unwrap();
    let deck = dir.path().join("handout.pdf");
    build_pdf(&deck, &["Only page text"]);

    // Occupy the uploads path with a plain file: the image directory can
    // never be created, so rasterization fails before spawning anything,
    // regardless of whether pdftoppm is installed.
    std::fs::write(dir.path().join("uploads"), b"not a directory").unwrap();

    let store = ProgressStore::new();
    let config = test_config(dir.path());
    let slides = analyze_presentation(&deck, "w1", "s1", &store, &config)
        .await
        .unwrap();

    assert_eq!(slides.len(), 1);
    assert!(slides[0].images.is_empty());
    // Extracted text, or the per-page hint when there was none: a degraded
    // page is never entirely blank.
    assert!(!slides[0].speaker_note.is_empty());

    let terminal = store.take_terminal("s1").await.unwrap();
    assert_eq!(terminal.status, AnalysisStatus::Completed);
}

#[tokio::test]
async fn corrupt_pdf_is_a_fatal_error() {
    let dir = tempfile::tempdir().unwrap();
    let deck = dir.path().join("broken.pdf");
    std::fs::write(&deck, b"%PDF-1.5 truncated garbage").unwrap();

    let store = ProgressStore::new();
    let config = test_config(dir.path());
    assert!(analyze_presentation(&deck, "w1", "s1", &store, &config)
        .await
        .is_err());
}

// ── Dispatch and inspection ──────────────────────────────────────────────────

#[tokio::test]
async fn unsupported_extension_is_rejected_and_recorded() {
    let dir = tempfile::tempdir().unwrap();
    let deck = dir.path().join("legacy.ppt");
    std::fs::write(&deck, b"binary ppt").unwrap();

    let store = ProgressStore::new();
    let config = test_config(dir.path());
    let result = analyze_presentation(&deck, "w1", "s1", &store, &config).await;

    assert!(result.is_err());
    let terminal = store.take_terminal("s1").await.unwrap();
    assert_eq!(terminal.status, AnalysisStatus::Error);
    assert!(terminal
        .error
        .as_deref()
        .unwrap()
        .contains("Unsupported presentation format"));
}

#[tokio::test]
async fn inspect_reports_format_and_slide_count() {
    let dir = tempfile::tempdir().unwrap();

    let pptx = dir.path().join("deck.pptx");
    build_pptx(
        &pptx,
        &[(vec!["a"], None), (vec!["b"], None), (vec!["c"], None)],
        false,
    );
    let meta = inspect(&pptx).await.unwrap();
    assert_eq!(meta.format, DeckFormat::Pptx);
    assert_eq!(meta.slide_count, 3);

    let pdf = dir.path().join("doc.pdf");
    build_pdf(&pdf, &["one", "two"]);
    let meta = inspect(&pdf).await.unwrap();
    assert_eq!(meta.format, DeckFormat::Pdf);
    assert_eq!(meta.slide_count, 2);
}

#[tokio::test]
async fn missing_file_is_reported_with_its_path() {
    let store = ProgressStore::new();
    let config = AnalysisConfig::default();
    let missing = PathBuf::from("does-not-exist.pptx");
    let err = analyze_presentation(&missing, "w1", "s1", &store, &config)
        .await
        .unwrap_err();
    assert!(err.to_string().contains("does-not-exist.pptx"));
}

// ── Concurrent progress polling ──────────────────────────────────────────────

#[tokio::test]
async fn progress_is_observable_while_analysis_runs() {
    let dir = tempfile::tempdir().unwrap();
    let deck = dir.path().join("deck.pptx");
    let slides_spec: Vec<(Vec<&str>, Option<&str>)> = (0..20)
        .map(|_| (vec!["Some slide body text"], None))
        .collect();
    build_pptx(&deck, &slides_spec, false);

    let store = ProgressStore::new();
    let config = test_config(dir.path());

    let task = {
        let store = store.clone();
        let config = config.clone();
        let deck = deck.clone();
        tokio::spawn(
            async move { analyze_presentation(&deck, "w1", "poll", &store, &config).await },
        )
    };

    // Progress values must be monotone as observed by a poller.
    let mut last = 0u8;
    loop {
        if let Some(p) = store.get("poll").await {
            assert!(p.progress >= last, "progress went backwards");
            last = p.progress;
            if p.status.is_terminal() {
                break;
            }
        }
        if task.is_finished() && store.get("poll").await.is_none() {
            break;
        }
        tokio::time::sleep(std::time::Duration::from_millis(1)).await;
    }

    task.await.unwrap().unwrap();
}
