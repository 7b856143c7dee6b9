//! CLI binary for deck2slides.
//!
//! A thin shim over the library crate that maps CLI flags to
//! `AnalysisConfig`, polls the progress store for a live bar, and prints
//! the extracted slides.

use anyhow::{Context, Result};
use clap::Parser;
use deck2slides::{
    analyze_presentation, inspect, render_fallback, render_to_file, AnalysisConfig, ProgressStore,
};
use indicatif::{ProgressBar, ProgressStyle};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing_subscriber::EnvFilter;

// ── ANSI colour helpers (no extra deps) ──────────────────────────────────────

fn green(s: &str) -> String {
    format!("\x1b[32m{s}\x1b[0m")
}
fn red(s: &str) -> String {
    format!("\x1b[31m{s}\x1b[0m")
}
fn dim(s: &str) -> String {
    format!("\x1b[2m{s}\x1b[0m")
}
fn bold(s: &str) -> String {
    format!("\x1b[1m{s}\x1b[0m")
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # Analyze a deck, print slides as JSON to stdout
  deck2slides talk.pptx

  # Write slides JSON to a file, images under ./uploads/webinar-42/
  deck2slides talk.pptx --webinar-id webinar-42 -o slides.json

  # Also render a standalone HTML presentation
  deck2slides talk.pptx --html talk.html

  # Analyze a PDF (page previews need pdftoppm on PATH)
  deck2slides handout.pdf -o slides.json

  # Looser boilerplate stripping: only remove lines on 80%+ of slides
  deck2slides talk.pptx --general-threshold 0.8

  # Inspect format and slide count only, no extraction
  deck2slides talk.pptx --inspect-only

EXTERNAL TOOLS (optional):
  pdftoppm   PDF page preview images; without it PDF pages are text-only
  soffice    not used by the CLI directly, library fallback rendering only

ENVIRONMENT VARIABLES:
  DECK2SLIDES_UPLOADS_DIR   Where extracted images are written
  DECK2SLIDES_OUTPUT        Default --output path
  RUST_LOG                  Overrides the log filter (tracing_subscriber)
"#;

/// Extract presentation decks (PPTX, PDF) into structured slides.
#[derive(Parser, Debug)]
#[command(
    name = "deck2slides",
    version,
    about = "Extract PPTX/PDF decks into structured slides with boilerplate stripped",
    long_about = "Extract presentation decks into per-slide text, speaker-note scripts, and \
images. Lines and images repeated across most of the deck (footers, page numbers, logos) \
are detected and stripped so the slides carry only real content.",
    arg_required_else_help = true,
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    /// Local .pptx or .pdf file.
    input: PathBuf,

    /// Namespace for extracted images under the uploads directory.
    #[arg(long, default_value = "local")]
    webinar_id: String,

    /// Write slides JSON to this file instead of stdout.
    #[arg(short, long, env = "DECK2SLIDES_OUTPUT")]
    output: Option<PathBuf>,

    /// Also render a standalone HTML presentation to this path.
    #[arg(long)]
    html: Option<PathBuf>,

    /// Directory where extracted images are written.
    #[arg(long, env = "DECK2SLIDES_UPLOADS_DIR", default_value = "uploads")]
    uploads_dir: PathBuf,

    /// URL prefix used in image public paths.
    #[arg(long, default_value = "/uploads")]
    public_base: String,

    /// Fraction of slides a line must appear on to be stripped (0.0-1.0).
    #[arg(long, default_value_t = 0.6)]
    general_threshold: f64,

    /// Lower fraction for known boilerplate shapes like page numbers (0.0-1.0).
    #[arg(long, default_value_t = 0.3)]
    pattern_threshold: f64,

    /// pdftoppm timeout in seconds.
    #[arg(long, default_value_t = 120)]
    raster_timeout: u64,

    /// Print deck format and slide count only, no extraction.
    #[arg(long)]
    inspect_only: bool,

    /// Compact JSON instead of pretty-printed.
    #[arg(long)]
    compact: bool,

    /// Disable the progress bar.
    #[arg(long, env = "DECK2SLIDES_NO_PROGRESS")]
    no_progress: bool,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, env = "DECK2SLIDES_VERBOSE")]
    verbose: bool,

    /// Suppress all output except errors and the result.
    #[arg(short, long, env = "DECK2SLIDES_QUIET")]
    quiet: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    // Suppress INFO-level library logs when the progress bar is active;
    // the bar provides all the feedback that matters to the user.
    let show_progress = !cli.quiet && !cli.no_progress && !cli.inspect_only;
    let filter = if cli.verbose {
        "debug"
    } else if cli.quiet || show_progress {
        "error"
    } else {
        "info"
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(io::stderr)
        .init();

    // ── Inspect-only mode ────────────────────────────────────────────────
    if cli.inspect_only {
        let meta = inspect(&cli.input)
            .await
            .context("Failed to inspect deck")?;
        println!("File:    {}", cli.input.display());
        println!("Format:  {}", meta.format);
        println!("Slides:  {}", meta.slide_count);
        return Ok(());
    }

    // ── Build config ─────────────────────────────────────────────────────
    let config = AnalysisConfig::builder()
        .uploads_dir(cli.uploads_dir.as_path())
        .public_base(cli.public_base.as_str())
        .general_threshold(cli.general_threshold)
        .pattern_threshold(cli.pattern_threshold)
        .raster_timeout_secs(cli.raster_timeout)
        .build()
        .context("Invalid configuration")?;

    // ── Run analysis, polling the store for the progress bar ─────────────
    let store = ProgressStore::new();
    let session_id = "cli";

    let analysis = {
        let store = store.clone();
        let config = config.clone();
        let input = cli.input.clone();
        let webinar_id = cli.webinar_id.clone();
        tokio::spawn(async move {
            analyze_presentation(&input, &webinar_id, session_id, &store, &config).await
        })
    };

    if show_progress {
        let bar = ProgressBar::new(100);
        bar.set_style(
            ProgressStyle::with_template(
                "{spinner:.cyan} {prefix:.bold}  [{bar:42.green/238}] {pos:>3}%  {msg}",
            )
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("█▉▊▋▌▍▎▏  "),
        );
        bar.set_prefix("Analyzing");
        bar.enable_steady_tick(Duration::from_millis(80));

        let mut poll = tokio::time::interval(Duration::from_millis(150));
        loop {
            poll.tick().await;
            match store.get(session_id).await {
                Some(progress) => {
                    bar.set_position(progress.progress as u64);
                    bar.set_message(progress.message.clone());
                    if progress.status.is_terminal() {
                        break;
                    }
                }
                None => {
                    if analysis.is_finished() {
                        break;
                    }
                }
            }
        }
        bar.finish_and_clear();
    }

    let slides = analysis
        .await
        .context("Analysis task panicked")?
        .context("Analysis failed")?;

    if !cli.quiet {
        let image_count: usize = slides.iter().map(|s| s.images.len()).sum();
        eprintln!(
            "{}  {} slides, {} images  {}",
            green("✔"),
            bold(&slides.len().to_string()),
            image_count,
            dim(&format!(
                "images under {}",
                cli.uploads_dir.join(&cli.webinar_id).display()
            )),
        );
    }

    // ── Emit results ─────────────────────────────────────────────────────
    let json = if cli.compact {
        serde_json::to_string(&slides).context("Failed to serialize slides")?
    } else {
        serde_json::to_string_pretty(&slides).context("Failed to serialize slides")?
    };

    if let Some(ref output_path) = cli.output {
        tokio::fs::write(output_path, &json)
            .await
            .with_context(|| format!("Failed to write {}", output_path.display()))?;
        if !cli.quiet {
            eprintln!("   {}", bold(&output_path.display().to_string()));
        }
    } else {
        let stdout = io::stdout();
        let mut handle = stdout.lock();
        handle
            .write_all(json.as_bytes())
            .context("Failed to write to stdout")?;
        handle.write_all(b"\n").context("Failed to write to stdout")?;
    }

    if let Some(ref html_path) = cli.html {
        if slides.is_empty() {
            // Nothing to render ourselves; hand the deck to LibreOffice so
            // the user still gets a page (a placeholder if that fails too).
            let out_dir = html_path
                .parent()
                .filter(|p| !p.as_os_str().is_empty())
                .unwrap_or_else(|| Path::new("."));
            render_fallback(&cli.input, out_dir, &config)
                .await
                .context("Fallback HTML conversion failed")?;
            // The converter names its output after the source file.
            let stem = cli
                .input
                .file_stem()
                .map(|s| s.to_string_lossy().to_string())
                .unwrap_or_else(|| "presentation".to_string());
            if !cli.quiet {
                eprintln!("   {}", bold(&out_dir.join(format!("{stem}.html")).display().to_string()));
            }
        } else {
            let title = cli
                .input
                .file_stem()
                .map(|s| s.to_string_lossy().to_string())
                .unwrap_or_else(|| "Presentation".to_string());
            render_to_file(&slides, &title, html_path)
                .await
                .context("HTML rendering failed")?;
            if !cli.quiet {
                eprintln!("   {}", bold(&html_path.display().to_string()));
            }
        }
    }

    if slides.is_empty() {
        eprintln!("{}  Deck produced no slides", red("✘"));
    }

    Ok(())
}
