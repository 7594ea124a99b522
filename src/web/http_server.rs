//! HTTP server for rooms and signaling
//!
//! Routes:
//! - `POST /createRoom` registers a room
//! - `GET /getRoomSize?roomname=` reports a room's peer count
//! - `GET /ws?roomname=` upgrades to the signaling WebSocket
//! - `GET /health` and `GET /metrics` for monitoring
//! - everything else falls through to the static web client

use crate::relay::registry::MISSING_ROOM_SIZE;
use crate::relay::RelayError;
use crate::transport::{handle_signaling_connection, JoinedPeer};
use crate::web::shared::SharedState;
use axum::{
    body::{Body, Bytes},
    extract::ws::rejection::WebSocketUpgradeRejection,
    extract::{Query, State, WebSocketUpgrade},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Router,
};
use log::{info, warn};
use serde::Deserialize;
use serde_json::json;
use std::future::Future;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::services::{ServeDir, ServeFile};

pub type ServerError = Box<dyn std::error::Error + Send + Sync>;

#[derive(Debug, Deserialize)]
struct CreateRoomRequest {
    name: String,
}

#[derive(Debug, Default, Deserialize)]
struct RoomQuery {
    roomname: Option<String>,
}

/// Build the application router
pub fn build_router(state: Arc<SharedState>) -> Router {
    let app = Router::new()
        .route("/createRoom", post(create_room_handler))
        .route("/getRoomSize", get(room_size_handler))
        .route("/ws", get(signaling_handler))
        .route("/health", get(health_handler))
        .route("/metrics", get(metrics_handler));

    let app = if state.config.http.serve_static {
        let static_root = state.config.http.static_root.clone();
        let index_path = static_root.join("index.html");
        app.fallback_service(ServeDir::new(&static_root).fallback(ServeFile::new(index_path)))
    } else {
        app
    };

    app.with_state(state)
}

/// Bind the configured address and serve until `shutdown` resolves
pub async fn run_http_server<F>(state: Arc<SharedState>, shutdown: F) -> Result<(), ServerError>
where
    F: Future<Output = ()> + Send + 'static,
{
    let addr = state.config.bind_addr();

    if state.config.http.serve_static {
        let static_root = &state.config.http.static_root;
        info!("Serving web client from {:?}", static_root);
        if !static_root.join("index.html").exists() {
            info!("Web client index not found at {:?}", static_root.join("index.html"));
        }
    }

    let listener = TcpListener::bind(&addr).await?;
    info!("HTTP server listening on http://{}", addr);

    serve_listener(listener, state, shutdown).await
}

/// Serve on an already bound listener
pub async fn serve_listener<F>(
    listener: TcpListener,
    state: Arc<SharedState>,
    shutdown: F,
) -> Result<(), ServerError>
where
    F: Future<Output = ()> + Send + 'static,
{
    let app = build_router(state);
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown)
        .await?;
    Ok(())
}

/// Create a room from `{"name": "..."}`
async fn create_room_handler(State(state): State<Arc<SharedState>>, body: Bytes) -> Response {
    let request: CreateRoomRequest = match serde_json::from_slice(&body) {
        Ok(request) => request,
        Err(e) => {
            warn!("Rejecting createRoom request: {}", e);
            return json_response(
                StatusCode::BAD_REQUEST,
                json!({ "error": format!("Invalid request body: {}", e) }),
            );
        }
    };

    match state.registry.create(&request.name) {
        Ok(_) => json_response(
            StatusCode::CREATED,
            json!({ "message": "Room created successfully" }),
        ),
        Err(e @ RelayError::RoomConflict(_)) => {
            json_response(StatusCode::CONFLICT, json!({ "error": e.to_string() }))
        }
        Err(e) => json_response(StatusCode::BAD_REQUEST, json!({ "error": e.to_string() })),
    }
}

/// Peer count of a room; a bare `-1` when it does not exist
async fn room_size_handler(
    State(state): State<Arc<SharedState>>,
    Query(query): Query<RoomQuery>,
) -> Response {
    let size = query
        .roomname
        .as_deref()
        .map(|name| state.registry.size(name))
        .unwrap_or(MISSING_ROOM_SIZE);

    if size == MISSING_ROOM_SIZE {
        return Response::builder()
            .status(StatusCode::OK)
            .header(header::CONTENT_TYPE, "text/plain; charset=utf-8")
            .body(Body::from(MISSING_ROOM_SIZE.to_string()))
            .unwrap_or_else(|_| Response::new(Body::empty()));
    }

    json_response(StatusCode::OK, json!({ "size": size }))
}

/// Join a room over WebSocket
async fn signaling_handler(
    State(state): State<Arc<SharedState>>,
    Query(query): Query<RoomQuery>,
    ws: Result<WebSocketUpgrade, WebSocketUpgradeRejection>,
) -> Response {
    let room_name = query.roomname.unwrap_or_default();
    if state.registry.get(&room_name).is_none() {
        return room_not_found(&room_name);
    }

    let ws = match ws {
        Ok(ws) => ws,
        Err(rejection) => return rejection.into_response(),
    };

    let peer = match JoinedPeer::join(&state, &room_name) {
        Ok(peer) => peer,
        Err(RelayError::RoomNotFound(_)) => return room_not_found(&room_name),
        Err(e) => {
            warn!("Failed to join room {}: {}", room_name, e);
            return json_response(
                StatusCode::INTERNAL_SERVER_ERROR,
                json!({ "error": e.to_string() }),
            );
        }
    };

    ws.max_message_size(state.config.relay.max_message_bytes)
        .on_upgrade(move |socket| handle_signaling_connection(socket, peer))
}

/// Health check handler
async fn health_handler(State(state): State<Arc<SharedState>>) -> String {
    let uptime = state.uptime();

    format!(
        r#"{{
  "status": "healthy",
  "uptime_seconds": {:.2},
  "rooms": {},
  "peers": {},
  "version": "{}"
}}"#,
        uptime.as_secs_f64(),
        state.registry.room_count(),
        state.registry.peer_count(),
        env!("CARGO_PKG_VERSION")
    )
}

/// Metrics handler (Prometheus format)
async fn metrics_handler(State(state): State<Arc<SharedState>>) -> String {
    let uptime = state.uptime().as_secs_f64();
    let stats = state.stats.snapshot();

    format!(
        r#"# HELP signal_relay_uptime_seconds Server uptime in seconds
# TYPE signal_relay_uptime_seconds counter
signal_relay_uptime_seconds {}
# HELP signal_relay_rooms Current number of rooms
# TYPE signal_relay_rooms gauge
signal_relay_rooms {}
# HELP signal_relay_peers Current number of connected peers
# TYPE signal_relay_peers gauge
signal_relay_peers {}
# HELP signal_relay_connections_total Peers accepted into a room
# TYPE signal_relay_connections_total counter
signal_relay_connections_total {}
# HELP signal_relay_messages_relayed_total Messages queued for a recipient
# TYPE signal_relay_messages_relayed_total counter
signal_relay_messages_relayed_total {}
# HELP signal_relay_messages_dropped_total Messages with an unknown event or target
# TYPE signal_relay_messages_dropped_total counter
signal_relay_messages_dropped_total {}
# HELP signal_relay_messages_malformed_total Messages that failed to decode
# TYPE signal_relay_messages_malformed_total counter
signal_relay_messages_malformed_total {}
# HELP signal_relay_slow_peer_disconnects_total Peers disconnected for a full outbox
# TYPE signal_relay_slow_peer_disconnects_total counter
signal_relay_slow_peer_disconnects_total {}
"#,
        uptime,
        state.registry.room_count(),
        state.registry.peer_count(),
        stats.connections_total,
        stats.messages_relayed,
        stats.messages_dropped,
        stats.messages_malformed,
        stats.slow_peer_disconnects
    )
}

fn room_not_found(room_name: &str) -> Response {
    json_response(
        StatusCode::NOT_FOUND,
        json!({ "error": RelayError::RoomNotFound(room_name.to_string()).to_string() }),
    )
}

fn json_response(status: StatusCode, payload: serde_json::Value) -> Response {
    Response::builder()
        .status(status)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(payload.to_string()))
        .unwrap_or_else(|_| Response::new(Body::empty()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use axum::http::{Method, Request};
    use tower::ServiceExt;

    fn test_state() -> Arc<SharedState> {
        let mut config = Config::default();
        config.http.serve_static = false;
        Arc::new(SharedState::new(config))
    }

    async fn send(app: Router, request: Request<Body>) -> (StatusCode, String) {
        let response = app.oneshot(request).await.unwrap();
        let status = response.status();
        let body = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, String::from_utf8(body.to_vec()).unwrap())
    }

    fn create_request(body: &str) -> Request<Body> {
        Request::builder()
            .method(Method::POST)
            .uri("/createRoom")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    fn get_request(uri: &str) -> Request<Body> {
        Request::builder().uri(uri).body(Body::empty()).unwrap()
    }

    #[tokio::test]
    async fn test_create_room_then_conflict() {
        let state = test_state();
        let app = build_router(state.clone());

        let (status, body) = send(app.clone(), create_request(r#"{"name": "r1"}"#)).await;
        assert_eq!(status, StatusCode::CREATED);
        let value: serde_json::Value = serde_json::from_str(&body).unwrap();
        assert_eq!(value, json!({ "message": "Room created successfully" }));

        let (status, _) = send(app, create_request(r#"{"name": "r1"}"#)).await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(state.registry.room_count(), 1);
    }

    #[tokio::test]
    async fn test_create_room_bad_body() {
        let app = build_router(test_state());
        for body in ["", "{", r#"{"title": "r1"}"#, r#"{"name": 5}"#, r#"{"name": ""}"#] {
            let (status, _) = send(app.clone(), create_request(body)).await;
            assert_eq!(status, StatusCode::BAD_REQUEST, "body {:?}", body);
        }
    }

    #[tokio::test]
    async fn test_room_size() {
        let state = test_state();
        state.registry.create("r1").unwrap();
        let app = build_router(state);

        let (status, body) = send(app.clone(), get_request("/getRoomSize?roomname=r1")).await;
        assert_eq!(status, StatusCode::OK);
        let value: serde_json::Value = serde_json::from_str(&body).unwrap();
        assert_eq!(value, json!({ "size": 0 }));

        let (_, body) = send(app.clone(), get_request("/getRoomSize?roomname=missing")).await;
        assert_eq!(body, "-1");

        let (_, body) = send(app, get_request("/getRoomSize")).await;
        assert_eq!(body, "-1");
    }

    #[tokio::test]
    async fn test_ws_unknown_room_is_not_found() {
        let state = test_state();
        let app = build_router(state.clone());

        let request = Request::builder()
            .uri("/ws?roomname=ghost")
            .header(header::CONNECTION, "upgrade")
            .header(header::UPGRADE, "websocket")
            .header(header::SEC_WEBSOCKET_VERSION, "13")
            .header(header::SEC_WEBSOCKET_KEY, "dGhlIHNhbXBsZSBub25jZQ==")
            .body(Body::empty())
            .unwrap();
        let (status, _) = send(app, request).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(state.registry.room_count(), 0);
        assert_eq!(state.stats.snapshot().connections_total, 0);
    }

    #[tokio::test]
    async fn test_health_and_metrics() {
        let state = test_state();
        state.registry.create("r1").unwrap();
        let app = build_router(state);

        let (status, body) = send(app.clone(), get_request("/health")).await;
        assert_eq!(status, StatusCode::OK);
        let value: serde_json::Value = serde_json::from_str(&body).unwrap();
        assert_eq!(value["status"], "healthy");
        assert_eq!(value["rooms"], 1);
        assert_eq!(value["peers"], 0);

        let (_, body) = send(app, get_request("/metrics")).await;
        assert!(body.contains("signal_relay_rooms 1"));
        assert!(body.contains("signal_relay_messages_relayed_total 0"));
    }
}
