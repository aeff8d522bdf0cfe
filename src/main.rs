#![cfg_attr(not(debug_assertions), windows_subsystem = "windows")] // hide console window on Windows in release

use anyhow::{Context, Result, anyhow};
use clap::Parser;
use eframe::NativeOptions;
use std::path::PathBuf;
use tokio::runtime::Runtime;

use credmark_terminal::config::PERSISTENCE;
use credmark_terminal::ui::config::UI_TEXT;
use credmark_terminal::{Cli, build_context, log_builder, run_app};

fn main() -> Result<()> {
    // A. Init Logging
    std::panic::set_hook(Box::new(|panic_info| {
        eprintln!("Application panicked: {:?}", panic_info);
    }));
    log_builder(log::LevelFilter::Info, env_logger::Env::default()).init();

    // B. Parse Args
    let args = Cli::parse();
    #[cfg(debug_assertions)]
    log::info!("Parsed arguments: {:?}", args);

    // C. Runtime for every gateway / wallet task; promises spawn onto it from the UI thread
    let rt = Runtime::new().context("failed to create Tokio runtime")?;
    let _guard = rt.enter();

    let context = build_context(&args)?;

    // D. Run Native App
    let options = NativeOptions {
        persistence_path: Some(PathBuf::from(PERSISTENCE.app_state_path)),
        ..Default::default()
    };

    eframe::run_native(
        UI_TEXT.app_title,
        options,
        Box::new(move |cc| Ok(run_app(cc, context))),
    )
    .map_err(|e| anyhow!("eframe exited with an error: {}", e))
}
