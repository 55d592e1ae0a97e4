use crate::signaling::{SignalingService, ws_handler};
use axum::extract::State;
use axum::routing::get;
use axum::{Json, Router};
use serde::Serialize;
use tower_http::cors::{Any, CorsLayer};

#[derive(Debug, Serialize)]
pub struct HealthReport {
    pub status: &'static str,
    pub rooms: usize,
    pub participants: usize,
}

/// HTTP surface of the relay: the signaling socket plus a health probe.
pub fn router(service: SignalingService) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/ws/{meeting_code}/{user_id}", get(ws_handler))
        .route("/health", get(health))
        .layer(cors)
        .with_state(service)
}

async fn health(State(service): State<SignalingService>) -> Json<HealthReport> {
    let registry = service.registry();

    Json(HealthReport {
        status: "ok",
        rooms: registry.room_count(),
        participants: registry.participant_count(),
    })
}
