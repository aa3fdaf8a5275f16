// src/routes/mod.rs
pub mod chat;
pub mod status;

use std::any::Any;
use std::path::Path;

use crate::config::{Config, Environment};
use crate::error::AppError;
use crate::state::SharedState;
use axum::{
    Router,
    http::{HeaderValue, Method, header},
    response::{IntoResponse, Response},
    routing::{get, post},
};
use chat::message_handler;
use status::{health_handler, root_handler};
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

pub fn create_router(static_dir: impl AsRef<Path>) -> Router<SharedState> {
    with_middleware(api_routes(static_dir))
}

pub fn api_routes(static_dir: impl AsRef<Path>) -> Router<SharedState> {
    Router::new()
        .route("/", get(root_handler))
        .route("/health", get(health_handler))
        .route("/api/message", post(message_handler))
        .nest_service("/ui", ServeDir::new(static_dir.as_ref()))
}

/// Panic recovery and request tracing. Only covers routes already on `router`.
pub fn with_middleware<S>(router: Router<S>) -> Router<S>
where
    S: Clone + Send + Sync + 'static,
{
    router
        .layer(CatchPanicLayer::custom(panic_response))
        .layer(TraceLayer::new_for_http())
}

/// Development accepts any caller; production only the configured origins.
pub fn cors_layer(config: &Config) -> CorsLayer {
    match config.environment {
        Environment::Development => CorsLayer::very_permissive(),
        Environment::Production => {
            let origins: Vec<HeaderValue> = config
                .allowed_origins
                .iter()
                .filter_map(|origin| match HeaderValue::from_str(origin) {
                    Ok(value) => Some(value),
                    Err(_) => {
                        tracing::warn!(%origin, "ignoring invalid CORS origin");
                        None
                    }
                })
                .collect();

            CorsLayer::new()
                .allow_origin(AllowOrigin::list(origins))
                .allow_methods([Method::GET, Method::POST])
                .allow_headers([header::CONTENT_TYPE])
        }
    }
}

pub fn panic_response(err: Box<dyn Any + Send + 'static>) -> Response {
    let detail = err
        .downcast_ref::<String>()
        .map(String::as_str)
        .or_else(|| err.downcast_ref::<&str>().copied())
        .unwrap_or("unknown panic payload");
    tracing::error!(%detail, "request handler panicked");
    AppError::Internal.into_response()
}
