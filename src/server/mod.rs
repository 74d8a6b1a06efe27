//! HTTP surface for the classifier.
//!
//! Thin glue only: request parsing and upload extraction happen here, all
//! classification semantics live in [`crate::pipeline`].

mod routes;

pub use routes::ClassifyResponse;

use std::sync::Arc;

use axum::Router;
use axum::extract::DefaultBodyLimit;
use axum::http::{Method, header};
use axum::routing::{get, post};
use tokio::net::TcpListener;
use tower_http::cors::{Any, CorsLayer};
use tracing::info;

use crate::config::ServerConfig;
use crate::error::Result;
use crate::pipeline::Classifier;
use crate::upload::MAX_UPLOAD_BYTES;

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    pub classifier: Arc<Classifier>,
}

/// Build the router with classification, info and liveness routes.
pub fn router(classifier: Arc<Classifier>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE]);

    Router::new()
        .route("/", get(routes::home))
        .route("/info", get(routes::info_handler))
        .route("/classify-email", post(routes::classify_email))
        .layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES))
        .layer(cors)
        .with_state(AppState { classifier })
}

/// Bind the configured address and serve until the process exits.
pub async fn serve(config: &ServerConfig, classifier: Arc<Classifier>) -> Result<()> {
    let listener = TcpListener::bind((config.host.as_str(), config.port)).await?;
    info!(
        host = %config.host,
        port = config.port,
        "Email classifier server started"
    );
    axum::serve(listener, router(classifier)).await?;
    Ok(())
}
