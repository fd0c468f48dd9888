use crate::config::OriginPolicy;
use crate::signaling::{SignalingService, ws_handler};
use axum::extract::State;
use axum::http::{HeaderValue, Method};
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Json, Router};
use serde_json::json;
use std::sync::Arc;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::warn;

#[derive(Clone)]
pub struct AppState {
    pub service: SignalingService,
    pub origins: Arc<OriginPolicy>,
}

pub fn router(service: SignalingService, origins: OriginPolicy) -> Router {
    let cors = cors_layer(&origins);
    let state = AppState {
        service,
        origins: Arc::new(origins),
    };

    Router::new()
        .route("/health", get(health_check))
        .route("/ws", get(ws_handler))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn health_check(State(state): State<AppState>) -> impl IntoResponse {
    let stats = state.service.stats();
    Json(json!({
        "status": "ok",
        "connections": stats.connections,
        "rooms": stats.rooms,
    }))
}

fn cors_layer(origins: &OriginPolicy) -> CorsLayer {
    let allow_origin = if origins.allows_any() {
        AllowOrigin::mirror_request()
    } else {
        let values: Vec<HeaderValue> = origins
            .origins()
            .filter_map(|origin| match HeaderValue::from_str(origin) {
                Ok(value) => Some(value),
                Err(_) => {
                    warn!("Ignoring unparsable origin {:?}", origin);
                    None
                }
            })
            .collect();
        AllowOrigin::list(values)
    };

    CorsLayer::new()
        .allow_origin(allow_origin)
        .allow_methods([Method::GET, Method::POST])
        .allow_credentials(true)
}
