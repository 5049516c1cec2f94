//! HTTP surface: the WebSocket upgrade plus health and stats endpoints.

use axum::{
    extract::{State, WebSocketUpgrade},
    http::Method,
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use serde_json::json;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::handler;
use crate::state::RelayState;

/// Build the relay's router. Any origin may connect.
pub fn build_router(state: RelayState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET])
        .allow_headers(Any);

    Router::new()
        .route("/ws", get(ws_handler))
        .route("/health", get(health_handler))
        .route("/stats", get(stats_handler))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// WebSocket upgrade handler for client connections.
async fn ws_handler(ws: WebSocketUpgrade, State(state): State<RelayState>) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handler::handle_websocket(socket, state))
}

/// Health check endpoint.
async fn health_handler() -> impl IntoResponse {
    Json(json!({
        "status": "ok",
        "service": "parley-relay",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

/// Statistics endpoint.
async fn stats_handler(State(state): State<RelayState>) -> impl IntoResponse {
    Json(json!({
        "online_connections": state.online_connections(),
        "online_users": state.online_users(),
        "known_sessions": state.known_sessions(),
        "logged_messages": state.logged_messages(),
        "uptime_secs": state.uptime_secs(),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::RelayConfig;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use serde_json::Value;
    use tower::ServiceExt;

    async fn get_json(app: Router, uri: &str) -> Value {
        let response = app
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&body).unwrap()
    }

    #[tokio::test]
    async fn test_health_endpoint() {
        let app = build_router(RelayState::new(RelayConfig::default()));
        let body = get_json(app, "/health").await;

        assert_eq!(body["status"], "ok");
        assert_eq!(body["service"], "parley-relay");
    }

    #[tokio::test]
    async fn test_stats_endpoint() {
        let app = build_router(RelayState::new(RelayConfig::default()));
        let body = get_json(app, "/stats").await;

        assert_eq!(body["online_connections"], 0);
        assert_eq!(body["online_users"], 0);
        assert_eq!(body["known_sessions"], 0);
        assert_eq!(body["logged_messages"], 0);
    }

    #[tokio::test]
    async fn test_unknown_route() {
        let app = build_router(RelayState::new(RelayConfig::default()));
        let response = app
            .oneshot(Request::builder().uri("/nope").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
