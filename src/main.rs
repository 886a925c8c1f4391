mod caption;
mod config;
mod dispatch;
mod error;
mod event;
mod platform;
mod readiness;
mod server;

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::Config;
use crate::dispatch::Dispatcher;
use crate::platform::telegram::{describe_destination, TelegramMessenger};
use crate::readiness::Readiness;
use crate::server::AppState;

const HANDSHAKE_RETRY: Duration = Duration::from_secs(5);

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,jellyrelay=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    let config_path = std::env::args()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("config.toml"));

    info!("Loading configuration from: {}", config_path.display());
    let config = Config::load(&config_path)
        .with_context(|| format!("Failed to load config from {}", config_path.display()))?;

    info!("Configuration loaded successfully");
    info!("  Listen: {}", config.bind_addr());
    info!("  Destinations: {:?}", config.relay.destinations);

    let messenger = Arc::new(TelegramMessenger::new(&config.telegram.bot_token));
    let readiness = Readiness::new();

    tokio::spawn(connect(
        messenger.clone(),
        readiness.clone(),
        config.relay.destinations.clone(),
    ));

    let state = AppState {
        dispatcher: Arc::new(Dispatcher::new(messenger, config.relay.destinations.clone())),
        readiness,
        default_event_type: config.relay.default_event_type.clone(),
    };

    server::run(state, &config.bind_addr()).await
}

/// Establish the Telegram session, retrying until it succeeds, then open the gate.
async fn connect(messenger: Arc<TelegramMessenger>, readiness: Readiness, destinations: Vec<String>) {
    loop {
        match messenger.handshake().await {
            Ok(username) => {
                info!("✅ Telegram client is ready and connected as @{}", username);
                info!("📋 Destination chats:");
                for destination in &destinations {
                    match messenger.chat_title(destination).await {
                        Ok(title) => info!("{}", describe_destination(title.as_deref(), destination)),
                        Err(e) => {
                            warn!("Could not resolve {}: {:#}", destination, e);
                            info!("{}", describe_destination(None, destination));
                        }
                    }
                }
                readiness.mark_ready();
                return;
            }
            Err(e) => {
                warn!(
                    "Telegram handshake failed: {:#}; retrying in {}s",
                    e,
                    HANDSHAKE_RETRY.as_secs()
                );
                tokio::time::sleep(HANDSHAKE_RETRY).await;
            }
        }
    }
}
