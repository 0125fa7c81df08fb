use std::net::SocketAddr;
use std::sync::Arc;
use axum::extract::connect_info::ConnectInfo;
use axum::extract::ws::WebSocketUpgrade;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::{delete, get};
use axum::{Json, Router, TypedHeader};
use serde_json::{json, Value};
use tower_http::trace::{DefaultMakeSpan, TraceLayer};
use tracing::info;
use crate::config::TrackerConfig;
use crate::handlers::source::MemoryStore;
use crate::handlers::websocket_actor::ScreenSession;
use crate::models::error::Result;

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<MemoryStore>,
    pub config: TrackerConfig,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/ws", get(screen_ws_handler))
        .route("/db/:path", get(read_value).put(write_value))
        .route("/db/:path/listeners", delete(cancel_listeners))
        // logging so we can see whats going on
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::default().include_headers(true)),
        )
        .with_state(state)
}

async fn screen_ws_handler(
    ws: WebSocketUpgrade,
    user_agent: Option<TypedHeader<headers::UserAgent>>,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    State(state): State<AppState>,
) -> impl IntoResponse {
    let agent = user_agent.map_or_else(|| "unknown".to_string(), |TypedHeader(agent)| agent.to_string());
    info!("Screen connected from {} ({})", addr, agent);

    ws.on_upgrade(move |socket| {
        let (session, ws_receiver) = ScreenSession::new(socket, state.store, state.config);
        session.run_actor(ws_receiver)
    })
}

async fn read_value(Path(path): Path<String>, State(state): State<AppState>) -> std::result::Result<Json<Value>, StatusCode> {
    state.store.get(&path).map(Json).ok_or(StatusCode::NOT_FOUND)
}

async fn write_value(
    Path(path): Path<String>,
    State(state): State<AppState>,
    Json(value): Json<Value>,
) -> Result<Json<Value>> {
    let listeners = state.store.set(&path, value)?;
    Ok(Json(json!({ "path": path, "listeners": listeners })))
}

async fn cancel_listeners(Path(path): Path<String>, State(state): State<AppState>) -> Result<Json<Value>> {
    let cancelled = state.store.cancel(&path, "permission denied")?;
    Ok(Json(json!({ "path": path, "cancelled": cancelled })))
}
