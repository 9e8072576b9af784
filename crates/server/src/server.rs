use axum::{
    Router,
    routing::{get, post},
};
use sea_orm::DatabaseConnection;

use std::sync::Arc;

use crate::{health, stars, yookassa};
use engine::Engine;

#[derive(Clone)]
pub struct ServerState {
    pub engine: Arc<Engine>,
    pub db: DatabaseConnection,
    pub webhooks: Arc<WebhookConfig>,
}

/// Per-provider shared secrets expected on webhook deliveries.
#[derive(Debug, Default)]
pub struct WebhookConfig {
    /// Required: YooKassa notifications are rejected outright when this is
    /// not configured.
    pub yookassa_secret: Option<String>,
    /// Optional: the bot process forwarding Stars payments may run on a
    /// trusted link; running without a secret is accepted but warned about.
    pub stars_secret: Option<String>,
}

impl WebhookConfig {
    fn log_startup_warnings(&self) {
        if self.yookassa_secret.is_none() {
            tracing::warn!(
                "yookassa webhook secret not configured; yookassa notifications will be rejected"
            );
        }
        if self.stars_secret.is_none() {
            tracing::warn!(
                "stars webhook secret not configured; stars notifications are accepted unverified"
            );
        }
    }
}

/// Builds the webhook router. Public so integration tests and embedders can
/// drive it without binding a socket.
pub fn router(state: ServerState) -> Router {
    Router::new()
        .route("/health", get(health::get))
        .route("/webhooks/yookassa", post(yookassa::notify))
        .route("/webhooks/stars", post(stars::notify))
        .with_state(state)
}

pub async fn run(engine: Engine, db: DatabaseConnection, webhooks: WebhookConfig) {
    let listener = match tokio::net::TcpListener::bind("127.0.0.1:3000").await {
        Ok(listener) => listener,
        Err(err) => {
            tracing::error!("failed to bind server listener: {err}");
            return;
        }
    };
    if let Err(err) = run_with_listener(engine, db, webhooks, listener).await {
        tracing::error!("server failed: {err}");
    }
}

pub async fn run_with_listener(
    engine: Engine,
    db: DatabaseConnection,
    webhooks: WebhookConfig,
    listener: tokio::net::TcpListener,
) -> Result<(), std::io::Error> {
    let addr = listener.local_addr()?;
    tracing::info!("Server listening on {}", addr);

    webhooks.log_startup_warnings();

    let state = ServerState {
        engine: Arc::new(engine),
        db,
        webhooks: Arc::new(webhooks),
    };

    axum::serve(listener, router(state)).await
}

pub fn spawn_with_listener(
    engine: Engine,
    db: DatabaseConnection,
    webhooks: WebhookConfig,
    listener: tokio::net::TcpListener,
) -> Result<std::net::SocketAddr, std::io::Error> {
    let addr = listener.local_addr()?;

    tokio::spawn(async move {
        if let Err(err) = run_with_listener(engine, db, webhooks, listener).await {
            tracing::error!("server failed: {err}");
        }
    });

    Ok(addr)
}
