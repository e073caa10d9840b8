//! Application entry point — vowelscope.
//!
//! # Startup sequence
//!
//! 1. Initialise logging.
//! 2. Load [`AppConfig`] from disk (returns default on first run).
//! 3. Create [`tokio`] runtime (multi-thread, 2 workers).
//! 4. Create the controller channels (`command`, `transport`).
//! 5. Open the streaming connection ([`StreamingClient::connect`]) — it
//!    reconnects in the background for the life of the process.
//! 6. Spawn the [`SessionController`] on the tokio runtime.
//! 7. Run [`eframe::run_native`] — blocks the main thread until the window
//!    is closed.

use std::sync::Arc;

use tokio::sync::mpsc;
use vowelscope::{
    app::VowelscopeApp,
    audio::{CaptureSource, CpalSource},
    config::AppConfig,
    net::{HttpReferenceSource, StreamingClient, Transport, TransportEvent},
    session::{new_shared_state, ControlCommand, SessionController},
};

use eframe::egui;

// ---------------------------------------------------------------------------
// Native options builder
// ---------------------------------------------------------------------------

fn native_options(config: &AppConfig) -> eframe::NativeOptions {
    let mut vp = egui::ViewportBuilder::default()
        .with_inner_size([900.0, 640.0])
        .with_min_inner_size([480.0, 400.0]);

    if config.ui.always_on_top {
        vp = vp.with_always_on_top();
    }

    if let Some((x, y)) = config.ui.window_position {
        vp = vp.with_position(egui::pos2(x, y));
    }

    eframe::NativeOptions {
        viewport: vp,
        ..Default::default()
    }
}

// ---------------------------------------------------------------------------
// main
// ---------------------------------------------------------------------------

fn main() -> eframe::Result<()> {
    // 1. Logging
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    log::info!("vowelscope starting up");

    // 2. Configuration
    let config = AppConfig::load().unwrap_or_else(|e| {
        log::warn!("Failed to load config ({e}); using defaults");
        AppConfig::default()
    });

    // 3. Tokio runtime (2 worker threads — transport + controller)
    let rt = tokio::runtime::Builder::new_multi_thread()
        .worker_threads(2)
        .enable_all()
        .build()
        .expect("failed to create tokio runtime");

    // 4. Channel setup
    let (command_tx, command_rx) = mpsc::channel::<ControlCommand>(16);
    let (transport_tx, transport_rx) = mpsc::channel::<TransportEvent>(32);

    // 5. Shared state + streaming connection (task spawns need the runtime
    //    context).
    let state = new_shared_state(config.speaker);
    let _guard = rt.enter();

    let client = Arc::new(StreamingClient::connect(
        config.backend.ws_url.clone(),
        transport_tx,
    ));
    let references = Arc::new(HttpReferenceSource::from_config(&config.backend));
    let capture = Arc::new(CpalSource);

    // 6. Session controller
    let controller = SessionController::new(
        Arc::clone(&state),
        Arc::clone(&client) as Arc<dyn Transport>,
        capture as Arc<dyn CaptureSource>,
        references,
        config.downsampler,
    );
    rt.spawn(controller.run(command_rx, transport_rx));

    // 7. Build the egui app and run it (blocks until the window is closed)
    let app = VowelscopeApp::new(Arc::clone(&state), command_tx);
    let options = native_options(&config);

    eframe::run_native(
        "Vowelscope",
        options,
        Box::new(move |_cc| Ok(Box::new(app))),
    )
}
