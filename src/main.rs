use std::sync::Arc;
use std::time::Duration;

use autogent_realtime::client::RealtimeClient;
use autogent_realtime::config::RealtimeConfig;
use autogent_realtime::messages::ALL_SERVER_EVENTS;
use autogent_realtime::notify::LogSink;
use autogent_realtime::session::SessionStore;
use autogent_realtime::transport::WsTransport;

use color_eyre::Result;
use tracing_subscriber::EnvFilter;

const VERSION: &str = env!("CARGO_PKG_VERSION");

#[tokio::main]
async fn main() -> Result<()> {
    if std::env::args().any(|arg| arg == "--version") {
        println!("autogent-realtime {}", VERSION);
        std::process::exit(0);
    }

    color_eyre::install()?;

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("autogent_realtime=info")),
        )
        .with_target(false)
        .init();

    let mut config = RealtimeConfig::default();
    if let Ok(url) = std::env::var("AUTOGENT_WS_URL") {
        config = config.with_url(url);
    }

    // Saved session credentials are replayed on every (re)connect.
    if let Some(credentials) = SessionStore::new().and_then(|store| store.load()) {
        tracing::info!(user_id = %credentials.user_id, "loaded saved session");
        config = config.with_session(credentials);
    }

    let client = RealtimeClient::with_notifications(
        config,
        Arc::new(WsTransport::new()),
        Arc::new(LogSink),
    );

    register_logging_handlers(&client);

    client.connect();

    tokio::signal::ctrl_c().await?;
    tracing::info!("shutting down");
    client.disconnect();

    // Give the session task a moment to tear down cleanly.
    tokio::time::sleep(Duration::from_millis(100)).await;

    Ok(())
}

/// Log every known server event so the binary is useful as a protocol probe.
fn register_logging_handlers(client: &RealtimeClient) {
    for event in ALL_SERVER_EVENTS {
        client.on_message(event, move |data| {
            tracing::info!(%event, %data, "server event");
        });
    }
}
