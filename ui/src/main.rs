#![warn(clippy::all, rust_2018_idioms)]
#![cfg_attr(not(debug_assertions), windows_subsystem = "windows")]

use qrstudio_ui::QrStudioApp;
use qrstudio_ui::state::State;

mod alloc {
    #[global_allocator]
    static MALLOC: mimalloc::MiMalloc = mimalloc::MiMalloc;
}

fn main() -> eframe::Result {
    // Log to stderr (if you run with `RUST_LOG=debug`).
    env_logger::Builder::from_env(env_logger::Env::default())
        .filter_module("egui_winit::clipboard", log::LevelFilter::Off)
        .init();

    // Generation commands are spawned on this runtime from the UI thread.
    let runtime = tokio::runtime::Runtime::new()
        .map_err(|err| eframe::Error::AppCreation(Box::new(err)))?;
    let _guard = runtime.enter();

    let native_options = eframe::NativeOptions {
        hardware_acceleration: eframe::HardwareAcceleration::Preferred,
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([820.0, 620.0])
            .with_min_inner_size([560.0, 420.0]),
        ..Default::default()
    };

    eframe::run_native(
        "QR Studio",
        native_options,
        Box::new(|_cc| {
            let app = QrStudioApp::builder().state(State::default()).build();
            Ok(Box::new(app))
        }),
    )
}
