use axum::{routing::get, Router};
use std::net::SocketAddr;
use tracing::{error, info};

async fn health() -> &'static str {
    "Bot is running!"
}

/// Liveness check for the hosting platform. Shares nothing with the bot.
pub fn router() -> Router {
    Router::new().route("/", get(health))
}

pub async fn serve(port: u16) {
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let listener = match tokio::net::TcpListener::bind(addr).await {
        Ok(listener) => listener,
        Err(e) => {
            error!("Health server could not bind {}: {}", addr, e);
            return;
        }
    };

    info!("Health server listening on {}", addr);
    if let Err(e) = axum::serve(listener, router()).await {
        error!("Health server stopped: {}", e);
    }
}
