use std::path::PathBuf;

use anyhow::{Context, Result, anyhow};
use clap::Parser;
use tracing_subscriber::EnvFilter;

use plotweb::app::PlotwebApp;
use plotweb::config::Settings;
use plotweb::service::ServiceHandle;
use plotweb::story::{FileBackend, SceneAnalysis, StoryQuery};

#[derive(Debug, Parser)]
#[command(author, version, about)]
struct Args {
    /// Project snapshot JSON to explore.
    snapshot: PathBuf,

    /// Project to request; defaults to the one stored in the snapshot.
    #[arg(long)]
    project_id: Option<u64>,

    /// TOML file with simulation and view settings.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Scene analysis JSON to ingest before the first load.
    #[arg(long)]
    import: Option<PathBuf>,

    /// First chapter shown at startup (inclusive); needs --chapter-to.
    #[arg(long, requires = "chapter_to")]
    chapter_from: Option<u32>,

    /// Last chapter shown at startup (inclusive); needs --chapter-from.
    #[arg(long, requires = "chapter_from")]
    chapter_to: Option<u32>,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("plotweb=info")),
        )
        .init();

    let args = Args::parse();
    let settings = Settings::load(args.config.as_deref());

    let backend = FileBackend::open(&args.snapshot)
        .with_context(|| format!("failed to open snapshot {}", args.snapshot.display()))?;
    let query = StoryQuery::all_statuses(args.project_id.unwrap_or(backend.project_id()));

    let import = args
        .import
        .as_deref()
        .map(SceneAnalysis::load)
        .transpose()?;

    let chapters = args
        .chapter_from
        .zip(args.chapter_to)
        .map(|(from, to)| (from.min(to), from.max(to)));

    let service = ServiceHandle::spawn(backend);
    let options = eframe::NativeOptions {
        viewport: eframe::egui::ViewportBuilder::default().with_inner_size([1440.0, 920.0]),
        ..Default::default()
    };

    eframe::run_native(
        "plotweb",
        options,
        Box::new(move |cc| {
            Ok(Box::new(PlotwebApp::new(
                cc, service, query, settings, chapters, import,
            )))
        }),
    )
    .map_err(|error| anyhow!("window closed with an error: {error}"))
}
