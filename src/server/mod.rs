//! HTTP boundary for the vocabulary drill.
//!
//! Authentication, request parsing and status-code mapping live here; the
//! handlers call straight into [`crate::drill`] with an authenticated user id.

use std::{error::Error, sync::Arc, time::Duration};

use axum::{
    http::{
        header::{AUTHORIZATION, CONTENT_TYPE},
        HeaderValue, Method,
    },
    routing::{get, post},
    Router,
};
use tokio::{net::TcpListener, signal::ctrl_c};
use tower_http::cors::CorsLayer;
use tracing::{info, warn};

pub mod error;
pub mod metrics;
pub mod routes;
pub mod state;

use crate::config::Config;
use crate::store::SqliteStore;
use crate::vocabulary::WordList;
use routes::{
    attempt_handler, google_auth_handler, health_handler, logout_handler, me_handler,
    metrics_handler, oauth_config_handler, random_word_handler, statistics_handler,
};
pub use state::State;

#[cfg(unix)]
use tokio::signal::unix::{signal as unix_signal, SignalKind};

pub fn router(state: Arc<State>) -> Router {
    let cors = cors_layer(&state.config.cors_origins);

    Router::new()
        .route("/health", get(health_handler))
        .route("/metrics", get(metrics_handler))
        .route("/auth/config", get(oauth_config_handler))
        .route("/auth/google", post(google_auth_handler))
        .route("/auth/me", get(me_handler))
        .route("/auth/logout", post(logout_handler))
        .route("/vocabulary/random", get(random_word_handler))
        .route("/vocabulary/attempt", post(attempt_handler))
        .route("/vocabulary/statistics", get(statistics_handler))
        .layer(cors)
        .with_state(state)
}

fn cors_layer(origins: &[String]) -> CorsLayer {
    let origins: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| {
            HeaderValue::from_str(origin)
                .map_err(|e| warn!("Ignoring invalid CORS origin {origin:?}: {e}"))
                .ok()
        })
        .collect();

    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([CONTENT_TYPE, AUTHORIZATION])
        .max_age(Duration::from_secs(60 * 60))
}

/// Open the store, seed the bundled word list on first run and serve until
/// Ctrl+C or SIGTERM
pub async fn start_server(config: Config) -> Result<(), Box<dyn Error>> {
    info!("Initializing state...");
    let mut store = match &config.database_path {
        Some(path) => SqliteStore::open(path)?,
        None => SqliteStore::open_default()?,
    };
    store.seed_if_empty(&WordList::czech()?.words)?;

    if config.google_credentials().is_none() {
        warn!("Google OAuth credentials missing, /auth/google will be unavailable");
    }

    let address = format!("0.0.0.0:{}", config.port);
    let state = State::new(config, store);
    let app = router(state);

    info!("Binding to {address}");
    let listener = TcpListener::bind(&address).await?;
    info!("Server running on {address}");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server shut down");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = ctrl_c().await {
            warn!("Failed to install Ctrl+C handler: {e}");
            std::future::pending::<()>().await;
        }

        info!("Received Ctrl+C, shutting down");
    };

    #[cfg(unix)]
    let terminate = async {
        match unix_signal(SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
                info!("Received terminate signal, shutting down");
            }
            Err(e) => {
                warn!("Failed to install signal handler: {e}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
