use std::path::Path;
use std::sync::Arc;

use anyhow::Context;
use secrecy::ExposeSecret;

use kamiq_bot::commands::GroupCommandRouter;
use kamiq_bot::config::BotConfig;
use kamiq_bot::groups::GroupDirectory;
use kamiq_bot::handler::EventHandler;
use kamiq_bot::imgur::{ImageHost, ImgurClient};
use kamiq_bot::line::{ChatPlatform, LineClient};
use kamiq_bot::registration::{self, ConversationStore, RegistrationFlow};
use kamiq_bot::server::{AppState, webhook_routes};
use kamiq_bot::store::{LibSqlBackend, ProfileStore};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    let config = BotConfig::from_env().context("Failed to load configuration")?;

    // ── Database ─────────────────────────────────────────────────────────
    let store: Arc<dyn ProfileStore> = Arc::new(open_store(&config).await?);

    // ── Collaborators ────────────────────────────────────────────────────
    let platform: Arc<dyn ChatPlatform> =
        Arc::new(LineClient::new(config.channel_access_token.clone()));
    let images: Arc<dyn ImageHost> = Arc::new(ImgurClient::new(config.imgur_client_id.clone()));
    let groups = Arc::new(GroupDirectory::default());
    tracing::info!(
        recognized = groups.recognized().len(),
        regional = groups.regional().len(),
        "Group directory loaded"
    );

    let conversations = ConversationStore::new(config.registration_idle_ttl);
    let _expiry_handle = registration::spawn_expiry_task(conversations.clone());

    let flow = RegistrationFlow::new(
        platform.clone(),
        images,
        store.clone(),
        conversations,
        groups.clone(),
    );
    let commands = GroupCommandRouter::new(platform.clone(), store, groups);
    let handler = Arc::new(EventHandler::new(platform, flow, commands));

    // ── HTTP server ──────────────────────────────────────────────────────
    let app = webhook_routes(AppState {
        channel_secret: config.channel_secret.clone(),
        handler,
    });

    let listener = tokio::net::TcpListener::bind(("0.0.0.0", config.port))
        .await
        .with_context(|| format!("Failed to bind port {}", config.port))?;
    tracing::info!(
        port = config.port,
        version = env!("CARGO_PKG_VERSION"),
        "KamiQ bot listening"
    );

    axum::serve(listener, app).await.context("Server error")?;
    Ok(())
}

async fn open_store(config: &BotConfig) -> anyhow::Result<LibSqlBackend> {
    let backend = if config.is_remote_database() {
        let token = config
            .database_auth_token
            .as_ref()
            .map(|t| t.expose_secret().to_string())
            .unwrap_or_default();
        LibSqlBackend::new_remote(&config.database_url, &token).await
    } else if config.database_url == ":memory:" {
        tracing::warn!("Using an in-memory database; registrations will not survive a restart");
        LibSqlBackend::new_memory().await
    } else {
        LibSqlBackend::new_local(Path::new(&config.database_url)).await
    };
    backend.with_context(|| format!("Failed to open database at {}", config.database_url))
}
