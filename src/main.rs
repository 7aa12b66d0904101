mod app;
mod autoscroll;
mod cli;
mod config;
mod error;
mod file_watcher;
mod log_buffer;
mod logging;
mod pane;
mod renderer;
mod viewport;

use clap::Parser;
use eframe::egui;

use app::LogPaneApp;
use cli::Args;
use config::AppConfig;

fn main() -> error::Result<()> {
    let args = Args::parse();
    logging::init(args.verbose);

    let mut config = AppConfig::load_or_default(args.config.as_deref())?;
    if args.no_tail {
        config.tail_log = false;
    }

    let options = eframe::NativeOptions {
        initial_window_size: Some(egui::vec2(1200.0, 800.0)),
        ..Default::default()
    };

    eframe::run_native(
        "Log Pane",
        options,
        Box::new(move |cc| Box::new(LogPaneApp::new(cc.egui_ctx.clone(), config, args))),
    )?;
    Ok(())
}
