//! Backend of a small business sales analytics dashboard.
//!
//!
//!
//! # General Infrastructure
//! - A simulator process appends sale records to the document store every few seconds
//! - After each insert it posts the record to `/notify-new-sale`
//! - The server relays that to every browser connected on `/events`
//! - Every view is recomputed from the full `sales_data` collection on each request
//!
//!
//!
//! # Endpoints
//!
//! | Method | Path | Body / Query | Response |
//! |---|---|---|---|
//! | GET | `/data` | `hours` (optional) | sale records |
//! | POST | `/generate` | `{prompt}` | `{response}` |
//! | GET | `/dashboard-data` | | `{data: {line, heatmap, pie}}` |
//! | GET | `/trends` | | `{data: {quarterly_growth, alerts}}` |
//! | GET | `/insight-cards` | | `{data: [{title, value}]}` |
//! | GET | `/recommendations` | | `{data: [string]}` |
//! | GET | `/sales-summary` | | `{data: [{key, total}]}` |
//! | POST | `/feedback` | any JSON object | `{status: "received"}` |
//! | GET | `/feedback` | | `{data: [feedback]}` |
//! | POST | `/ai-log` | any JSON | `{status: "logged"}` |
//! | POST | `/notify-new-sale` | sale record | `{status: "notified"}` |
//! | POST | `/generate-insight` | `{prompt}` | `{insight}` |
//! | GET | `/events` | | Server-Sent Events |
//!
//! Failures come back as `{"error": message}` with 400 or 500.
//!
//!
//!
//! # Notes
//!
//! ## Store
//! Records live in Redis lists, one per collection, namespaced by `DB_NAME`.
//! Point `DATABASE_URL` at `memory://` to run without Redis. The memory store is
//! private to the process, so the simulator cannot share it.
//!
//! ## Insights
//! Model backed text generation is switched off. `/generate` and
//! `/generate-insight` answer with a fixed placeholder.
//!
//!
//!
//! # Setup
//!
//! Start the server.
//! ```sh
//! RUST_LOG=info cargo run -p pulse
//! ```
//!
//! Feed it live sales.
//! ```sh
//! DATABASE_URL=redis://127.0.0.1:6379 cargo run -p simulator
//! ```
//!
//! Backfill a month of history.
//! ```sh
//! DATABASE_URL=redis://127.0.0.1:6379 cargo run -p simulator -- seed 30
//! ```
use std::{future::Future, io, sync::Arc, time::Duration};

use anyhow::Context;
use axum::{
    Router,
    http::{
        HeaderValue, Method,
        header::{AUTHORIZATION, CONTENT_TYPE},
    },
    routing::{get, post},
};
use signal::{
    ctrl_c,
    unix::{SignalKind, signal},
};
use tokio::{net::TcpListener, signal};
use tower_http::cors::{AllowOrigin, CorsLayer};
use tracing::{error, info, warn};
use tracing_subscriber::{EnvFilter, fmt};

pub mod analytics;
pub mod config;
pub mod error;
pub mod insight;
pub mod notify;
pub mod routes;
pub mod state;
pub mod utils;

use config::Config;
use notify::events_handler;
use routes::{
    ai_log_handler, dashboard_handler, data_handler, feedback_handler, feedback_log_handler,
    generate_handler, generate_insight_handler, insight_cards_handler, notify_new_sale_handler,
    recommendations_handler, sales_summary_handler, trends_handler,
};
use state::AppState;

pub async fn start_server() -> anyhow::Result<()> {
    fmt().with_env_filter(EnvFilter::from_default_env()).init();

    info!("Loading config...");
    let config = Config::load()?;

    info!("Initializing state...");
    let state = AppState::new(config)
        .await
        .context("Failed to connect to the document store")?;

    info!("Starting server...");
    let address = format!("0.0.0.0:{}", state.config.port);
    info!("Binding to {address}");

    let listener = TcpListener::bind(&address)
        .await
        .with_context(|| format!("Failed to bind {address}"))?;
    info!("Server running on {address}");

    serve(listener, state.clone(), shutdown_signal())
        .await
        .context("Server error")?;

    drop(state);
    info!("Server shut down, store released");

    Ok(())
}

/// Serves until `shutdown` resolves, then closes open event streams and
/// waits for in-flight requests.
pub async fn serve<F>(listener: TcpListener, state: Arc<AppState>, shutdown: F) -> io::Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    let notifier = state.notifier.clone();

    axum::serve(listener, app(state))
        .with_graceful_shutdown(async move {
            shutdown.await;
            notifier.close();
        })
        .await
}

pub fn app(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/data", get(data_handler))
        .route("/generate", post(generate_handler))
        .route("/dashboard-data", get(dashboard_handler))
        .route("/trends", get(trends_handler))
        .route("/insight-cards", get(insight_cards_handler))
        .route("/recommendations", get(recommendations_handler))
        .route("/sales-summary", get(sales_summary_handler))
        .route("/feedback", post(feedback_handler).get(feedback_log_handler))
        .route("/ai-log", post(ai_log_handler))
        .route("/notify-new-sale", post(notify_new_sale_handler))
        .route("/generate-insight", post(generate_insight_handler))
        .route("/events", get(events_handler))
        .layer(cors(&state.config.allowed_origins))
        .with_state(state)
}

fn cors(allowed_origins: &[String]) -> CorsLayer {
    let origins: Vec<HeaderValue> = allowed_origins
        .iter()
        .filter_map(|origin| {
            HeaderValue::from_str(origin)
                .map_err(|_| warn!("Ignoring invalid origin: {origin}"))
                .ok()
        })
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([CONTENT_TYPE, AUTHORIZATION])
        .allow_credentials(true)
        .max_age(Duration::from_secs(60 * 60))
}

async fn shutdown_signal() {
    let ctrl_c = async {
        match ctrl_c().await {
            Ok(()) => info!("Received Ctrl+C, shutting down"),
            Err(e) => {
                error!("Failed to install Ctrl+C handler: {e}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal(SignalKind::terminate()) {
            Ok(mut terminate) => {
                terminate.recv().await;
                info!("Received terminate signal, shutting down");
            }
            Err(e) => {
                error!("Failed to install signal handler: {e}");
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
