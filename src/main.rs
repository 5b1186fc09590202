use anyhow::Context as _;
use clap::Parser;
use eframe::egui;
use log::info;

use peak::app::PeakApp;
use peak::cli::Args;
use peak::content::Content;
use peak::shell;

fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    shell::init_logger(args.verbosity);

    let content = match &args.content {
        Some(path) => Content::from_json(path).context("loading content deck")?,
        None => Content::default(),
    };

    info!(
        "peak v{} | frames: {} (*.{})",
        env!("CARGO_PKG_VERSION"),
        args.frames_root.display(),
        args.format
    );

    let mut viewport = egui::ViewportBuilder::default()
        .with_title("FLUX REAL 2026")
        .with_inner_size([450.0, 800.0])
        .with_min_inner_size([270.0, 480.0]);
    if args.fullscreen {
        viewport = viewport.with_fullscreen(true);
    }
    let options = eframe::NativeOptions { viewport, ..Default::default() };

    eframe::run_native(
        "peak",
        options,
        Box::new(move |cc| Ok(Box::new(PeakApp::new(cc, &args, content)))),
    )
    .map_err(|e| anyhow::anyhow!("eframe error: {e}"))?;

    Ok(())
}
