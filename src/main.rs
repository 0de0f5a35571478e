mod app;
mod config;
mod graph;
mod util;

use std::path::PathBuf;

use anyhow::{Context, Result, anyhow};
use clap::Parser;
use tracing_subscriber::EnvFilter;

use crate::config::Settings;

#[derive(Debug, Parser)]
#[command(author, version, about)]
struct Args {
    /// JSON snapshot with `nodes` and `links` arrays.
    #[arg(long)]
    graph: Option<PathBuf>,

    /// JSON settings file; missing keys fall back to defaults.
    #[arg(long)]
    settings: Option<PathBuf>,

    /// Log at debug level unless RUST_LOG says otherwise.
    #[arg(long)]
    verbose: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();

    let default_level = if args.verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let settings = Settings::load(args.settings.as_deref()).context("failed to load settings")?;

    let options = eframe::NativeOptions {
        viewport: eframe::egui::ViewportBuilder::default().with_inner_size([1440.0, 920.0]),
        ..Default::default()
    };

    eframe::run_native(
        "graph-lens",
        options,
        Box::new(move |cc| {
            Ok(Box::new(app::GraphLensApp::new(
                cc,
                args.graph.clone(),
                settings,
            )))
        }),
    )
    .map_err(|error| anyhow!("failed to run the viewer: {error}"))
}
