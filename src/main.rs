#![warn(clippy::all, rust_2018_idioms)]

use std::path::PathBuf;

use eframe_photo_editor::PhotoEditorApp;

fn main() -> eframe::Result {
    env_logger::init(); // Log to stderr (if you run with `RUST_LOG=debug`).

    let config_path = std::env::args_os().nth(1).map(PathBuf::from);

    let native_options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1024.0, 768.0])
            .with_min_inner_size([360.0, 480.0])
            .with_drag_and_drop(true),
        ..Default::default()
    };
    eframe::run_native(
        "Photo Editor",
        native_options,
        Box::new(|cc| Ok(Box::new(PhotoEditorApp::new(cc, config_path)))),
    )
}
