//! pugbot binary entrypoint wiring the chat backend and the HTTP control plane.

use std::{env, net::SocketAddr, sync::Arc};

use anyhow::Context;
use axum::Router;
use tokio::net::TcpListener;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use pugbot::{
    config::AppConfig,
    routes,
    state::{AppState, SharedState},
};

/// Bot identity used when no chat service is configured.
const DRY_RUN_BOT_ID: u64 = 1;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();

    let config = AppConfig::load();
    let app_state = build_state(config).await?;
    let app = build_router(app_state);

    let port = env::var("PORT")
        .ok()
        .and_then(|value| value.parse::<u16>().ok())
        .unwrap_or(8080);

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    info!(%addr, "starting server");

    let listener = TcpListener::bind(addr).await.context("binding server")?;
    let service = app.into_make_service();
    axum::serve(listener, service)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("serving axum")?;

    Ok(())
}

/// Connect to Discord when a token is configured, otherwise render into memory.
#[cfg(feature = "discord-http")]
async fn build_state(config: AppConfig) -> anyhow::Result<SharedState> {
    use pugbot::backend::discord::{DiscordBackend, DiscordConfig, DiscordError};

    match DiscordConfig::from_env() {
        Ok(discord) => {
            let backend = DiscordBackend::connect(discord)
                .await
                .context("connecting to Discord")?;
            Ok(AppState::new(Arc::new(backend), config))
        }
        Err(DiscordError::MissingEnvVar { .. }) => {
            warn!("DISCORD_TOKEN not set; running in dry-run mode");
            Ok(AppState::dry_run(DRY_RUN_BOT_ID, config))
        }
        Err(err) => Err(err).context("reading Discord configuration"),
    }
}

#[cfg(not(feature = "discord-http"))]
async fn build_state(config: AppConfig) -> anyhow::Result<SharedState> {
    warn!("built without a chat backend; running in dry-run mode");
    Ok(AppState::dry_run(DRY_RUN_BOT_ID, config))
}

/// Build the top-level router and attach cross-cutting middleware layers.
fn build_router(state: SharedState) -> Router<()> {
    routes::router(state)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
}

/// Configure tracing subscribers so logs include spans by default.
fn init_tracing() {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "info,tower_http=debug".into());
    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer())
        .init();
}

/// Wait for Ctrl+C or SIGTERM and shut the server down gracefully.
async fn shutdown_signal() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{SignalKind, signal};

        let mut term = signal(SignalKind::terminate()).expect("install SIGTERM handler");
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {},
            _ = term.recv() => {},
        }
    }

    #[cfg(not(unix))]
    {
        let _ = tokio::signal::ctrl_c().await;
    }
}
