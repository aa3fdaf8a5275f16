use axum::{Json, extract::State};

use crate::message::{HealthResponse, StatusResponse, now_iso8601};
use crate::state::SharedState;

pub async fn root_handler() -> Json<StatusResponse> {
    Json(StatusResponse {
        message: "Chat relay server is running!".to_string(),
        status: "healthy".to_string(),
        timestamp: now_iso8601(),
    })
}

pub async fn health_handler(State(state): State<SharedState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "OK".to_string(),
        uptime: state.uptime().as_secs_f64(),
    })
}
