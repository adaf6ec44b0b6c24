//! Documentation of the JMS Motorsport site backend.
//!
//! Record keeper behind the team's marketing site. The frontend posts
//! contact forms, email signups, and page-visit beacons here; the admin
//! dashboard pulls visit statistics and CSV exports back out.
//!
//!
//!
//! # General Infrastructure
//! - Static frontend is hosted separately and talks to this server over CORS
//! - One container for the server, one for Redis, talking over internal names
//! - Every record is write-once: submissions are never updated or deleted here
//! - Exports are gated by a single shared bearer token, rotated via redeploy
//!
//!
//!
//! # Notes
//!
//! ## Redis
//! All records live in one Redis namespace as JSON strings:
//!
//! - `contact:<timestamp>:<uuid>` for contact form submissions
//! - `signup:<timestamp>:<uuid>` for email signups
//! - `visit:<timestamp>:<uuid>` for page-visit beacons
//!
//! The timestamp in the key is informational only. Scans return keys in
//! store order, so anything that needs chronological output sorts after
//! retrieval. Volume is marketing-site scale, which is why whole-prefix
//! scans are fine here.
//!
//! ## Endpoints
//! - `GET /health`
//! - `POST /contact`, `POST /signup`, `POST /track/visit`
//! - `GET /stats/visits`
//! - `GET /export/contacts`, `GET /export/signups`, `GET /export/visits`
use std::{sync::Arc, time::Duration};

use axum::{
    Router,
    http::{
        Method,
        header::{AUTHORIZATION, CONTENT_LENGTH, CONTENT_TYPE},
    },
    routing::{get, post},
};

use signal::{
    ctrl_c,
    unix::{SignalKind, signal},
};
use tokio::{net::TcpListener, signal};
use tower_http::cors::{Any, CorsLayer};
use tracing::info;
use tracing_subscriber::{EnvFilter, fmt};

pub mod auth;
pub mod config;
pub mod database;
pub mod error;
pub mod export;
pub mod records;
pub mod routes;
pub mod state;
pub mod stats;

use routes::{
    contact_handler, export_contacts_handler, export_signups_handler, export_visits_handler,
    health_handler, signup_handler, visit_handler, visit_stats_handler,
};
use state::AppState;

pub fn app(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([CONTENT_TYPE, AUTHORIZATION])
        .expose_headers([CONTENT_LENGTH])
        .max_age(Duration::from_secs(600));

    Router::new()
        .route("/health", get(health_handler))
        .route("/contact", post(contact_handler))
        .route("/signup", post(signup_handler))
        .route("/track/visit", post(visit_handler))
        .route("/stats/visits", get(visit_stats_handler))
        .route("/export/contacts", get(export_contacts_handler))
        .route("/export/signups", get(export_signups_handler))
        .route("/export/visits", get(export_visits_handler))
        .layer(cors)
        .with_state(state)
}

pub async fn start_server() {
    fmt().with_env_filter(EnvFilter::from_default_env()).init();

    info!("Initializing state...");
    let state = AppState::new().await;

    info!("Starting server...");
    let address = format!("0.0.0.0:{}", state.config.port);

    let app = app(state);

    info!("Binding to {address}");
    let listener = TcpListener::bind(&address).await.unwrap();
    info!("Server running on {address}");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .unwrap();

    println!("Server shutting down...");
}

async fn shutdown_signal() {
    let ctrl_c = async {
        ctrl_c().await.expect("Failed to install Ctrl+C handler");

        info!("Received Ctrl+C, shutting down");
    };

    #[cfg(unix)]
    let terminate = async {
        signal(SignalKind::terminate())
            .expect("Failed to install signal handler")
            .recv()
            .await;

        info!("Received terminate signal, shutting down");
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
