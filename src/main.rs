use std::path::PathBuf;

use anyhow::anyhow;
use clap::Parser;
use tracing::info;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use kg_explorer::app::{ExplorerApp, LaunchOptions};
use kg_explorer::config::ExplorerConfig;
use kg_explorer::graph::DataSource;

#[derive(Debug, Parser)]
#[command(author, version, about)]
struct Args {
    /// Directory holding one `<name>.json` snapshot per dataset.
    #[arg(long, default_value = "data")]
    data_dir: PathBuf,

    /// Dataset to open first; defaults to the first one in the directory.
    #[arg(long)]
    dataset: Option<String>,

    /// Open a single snapshot file instead of a dataset directory.
    #[arg(long, conflicts_with_all = ["data_dir", "dataset"])]
    snapshot: Option<PathBuf>,

    /// JSON file overriding canvas, simulation, interaction and viewport settings.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Node id to select and center once the graph is loaded.
    #[arg(long)]
    focus: Option<String>,

    /// Comma separated node ids to emphasize.
    #[arg(long, value_delimiter = ',')]
    highlight: Vec<String>,

    /// Log filter used when RUST_LOG is not set, e.g. `debug` or `kg_explorer=trace`.
    #[arg(long)]
    log_level: Option<String>,
}

fn init_tracing(log_level: Option<&str>) {
    let filter = match log_level {
        Some(level) => EnvFilter::new(level),
        None => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
    };
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .init();
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    init_tracing(args.log_level.as_deref());

    let config = match &args.config {
        Some(path) => ExplorerConfig::from_file(path)?,
        None => ExplorerConfig::default(),
    };
    let source = match args.snapshot {
        Some(path) => DataSource::File(path),
        None => DataSource::Directory(args.data_dir),
    };
    info!(?source, "starting kg-explorer");

    let launch = LaunchOptions {
        source,
        dataset: args.dataset,
        focus: args.focus,
        highlight: args
            .highlight
            .into_iter()
            .map(|id| id.trim().to_owned())
            .filter(|id| !id.is_empty())
            .collect(),
    };

    let options = eframe::NativeOptions {
        viewport: eframe::egui::ViewportBuilder::default().with_inner_size([1440.0, 920.0]),
        ..Default::default()
    };

    eframe::run_native(
        "kg-explorer",
        options,
        Box::new(move |cc| Ok(Box::new(ExplorerApp::new(cc, config, launch)))),
    )
    .map_err(|error| anyhow!("viewer error: {error}"))
}
