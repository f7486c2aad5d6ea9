use anyhow::{Context, Result};
use ragchat::api::RagClient;
use ragchat::chat::{ChatSession, ChatWorker};
use ragchat::config::{ChatConfig, Preferences};
use ragchat::messages::MessageLog;
use ragchat::ui::{AppState, RagChatApp};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "ragchat=debug,info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let prefs_path = Preferences::default_path();
    let prefs = prefs_path
        .as_deref()
        .map(Preferences::load_or_default)
        .unwrap_or_default();
    let config = ChatConfig::load()
        .context("Failed to load configuration")?
        .with_preferences(&prefs);
    info!("Starting RAG chat against {}", config.base_url);

    let client = RagClient::new(config.base_url.clone())?;
    let log = MessageLog::new();
    let session = ChatSession::new(client, log.clone());
    let status = session.status().clone();

    let worker = ChatWorker::new(session);
    let commands = worker.command_sender();
    let events = worker.event_receiver();
    let _worker_handle = worker.start_worker()?;

    let mut state = AppState::new(&config, log, status).connect(commands, events);
    if let Some(path) = prefs_path {
        state = state.with_preferences_path(path);
    }
    let state = with_microphone(state, &config);

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([960.0, 720.0])
            .with_min_inner_size([560.0, 420.0])
            .with_title("RAG Chat"),
        ..Default::default()
    };

    eframe::run_native(
        "RAG Chat",
        options,
        Box::new(move |cc| Ok(Box::new(RagChatApp::new(cc, state)))),
    )
    .map_err(|e| anyhow::anyhow!("UI error: {}", e))?;

    Ok(())
}

#[cfg(feature = "audio-io")]
fn with_microphone(state: AppState, config: &ChatConfig) -> AppState {
    use ragchat::audio::{BoxedSource, CpalSource};

    if config.enable_audio_input {
        state.with_audio_source(BoxedSource::new(CpalSource::new()))
    } else {
        state
    }
}

#[cfg(not(feature = "audio-io"))]
fn with_microphone(state: AppState, _config: &ChatConfig) -> AppState {
    state
}
