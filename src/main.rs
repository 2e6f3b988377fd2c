use color_eyre::{eyre::eyre, Result};
use eframe::egui;
use std::sync::Arc;
use swipedeck::api::{HttpBackend, MemoryBackend};
use swipedeck::config::AppConfig;
use swipedeck::engine::EngineHandle;
use swipedeck::ui::SwipeDeckUI;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

#[tokio::main]
async fn main() -> Result<()> {
    setup()?;

    let config = AppConfig::load().await?;
    let handle = spawn_engine(&config)?;

    info!("Starting UI");
    let mut native_options = eframe::NativeOptions::default();
    native_options.viewport = egui::ViewportBuilder::default()
        .with_title("Swipe Deck")
        .with_inner_size([config.engine.viewport_width + 40.0, 760.0]);

    let input = handle.sender();
    let view = handle.subscribe();
    let settings = config.engine.clone();
    let result = eframe::run_native(
        "Swipe Deck",
        native_options,
        Box::new(move |cc| Ok(Box::new(SwipeDeckUI::new(cc, input, view, settings)))),
    )
    .map_err(|e| eyre!("UI exited with error: {}", e));

    handle.shutdown().await;
    info!("Goodbye");
    result
}

fn spawn_engine(config: &AppConfig) -> Result<EngineHandle> {
    let settings = config.engine.clone();
    if config.backend.offline {
        info!("Offline mode, serving the built-in deck");
        let backend = Arc::new(MemoryBackend::seeded().with_auto_release());
        return Ok(EngineHandle::spawn(settings, backend));
    }

    info!("Using backend at {}", config.backend.base_url);
    let backend = HttpBackend::new(&config.backend.base_url, config.backend.timeout())
        .map_err(|e| eyre!("Failed to create HTTP client: {}", e))?;
    Ok(EngineHandle::spawn(settings, Arc::new(backend)))
}

fn setup() -> Result<()> {
    if std::env::var("RUST_LIB_BACKTRACE").is_err() {
        std::env::set_var("RUST_LIB_BACKTRACE", "0")
    }
    color_eyre::install()?;
    if std::env::var("RUST_LOG").is_err() {
        std::env::set_var("RUST_LOG", "info")
    }
    setup_logging_env();
    Ok(())
}

fn setup_logging_env() {
    FmtSubscriber::builder()
        .with_max_level(Level::INFO)
        .with_target(false)
        .with_thread_ids(true)
        .with_file(true)
        .with_line_number(true)
        .pretty()
        .init();
}
