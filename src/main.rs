mod api;
mod app;
mod config;
mod download;
mod upload;
mod utils;

use app::EdgeUploader;
use eframe::egui;
use tracing_subscriber::EnvFilter;

fn main() -> eframe::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([700.0, 760.0])
            .with_min_inner_size([480.0, 560.0]),
        ..Default::default()
    };

    eframe::run_native(
        "EDGE Batch Uploader",
        options,
        Box::new(|cc| Box::new(EdgeUploader::new(cc))),
    )
}
