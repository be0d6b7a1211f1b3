//! WebSocket chat endpoint + REST routes.

use std::collections::HashMap;
use std::sync::Arc;

use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        Query, State,
    },
    http::{header, StatusCode},
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;
use tower_http::cors::CorsLayer;
use tracing::{debug, info, warn};
use uuid::Uuid;

use super::dispatch::Dispatcher;
use super::protocol::ClientMessage;
use super::registry::SessionRegistry;
use crate::assessment::{recommend, score, Answer, AssessmentOutcome, Catalog};
use crate::config::ServerConfig;
use crate::report::render_report;

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    pub catalog: Arc<Catalog>,
    pub registry: Arc<SessionRegistry>,
    pub dispatcher: Arc<Dispatcher>,
    pub config: ServerConfig,
}

/// Build the Axum router with the chat WebSocket and REST routes.
pub fn chat_routes(
    catalog: Arc<Catalog>,
    registry: Arc<SessionRegistry>,
    dispatcher: Arc<Dispatcher>,
    config: ServerConfig,
) -> Router {
    let state = AppState {
        catalog,
        registry,
        dispatcher,
        config,
    };

    Router::new()
        .route("/ws/chat", get(ws_chat_handler))
        .route("/health", get(health))
        .route("/api/questions", get(list_questions))
        .route("/api/assessment/score", post(score_assessment))
        .route("/api/report", post(generate_report))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

// ── Health ──────────────────────────────────────────────────────────────

async fn health() -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "ok",
        "service": "ayursutra"
    }))
}

// ── WebSocket ───────────────────────────────────────────────────────────

#[derive(Deserialize)]
struct WsQuery {
    session_id: Option<String>,
}

async fn ws_chat_handler(
    ws: WebSocketUpgrade,
    Query(query): Query<WsQuery>,
    State(state): State<AppState>,
) -> impl IntoResponse {
    // Session identifier from the query string, or a fresh opaque token.
    let session_id = query
        .session_id
        .unwrap_or_else(|| format!("session_{}", Uuid::new_v4()));
    info!(session_id = %session_id, "Chat client connecting");
    ws.on_upgrade(move |socket| handle_chat_socket(socket, state, session_id))
}

async fn handle_chat_socket(mut socket: WebSocket, state: AppState, session_id: String) {
    let (handle, mut outbound_rx) = state.registry.connect(&session_id).await;
    let connection_id = handle.connection_id();
    info!(session_id = %session_id, "Chat client connected");

    // Welcome goes out once per session, before any user input is handled.
    state.dispatcher.ensure_welcome(&session_id).await;

    loop {
        tokio::select! {
            // Forward outbound protocol messages to this client
            outbound = outbound_rx.recv() => {
                match outbound {
                    Some(msg) => {
                        if let Ok(json) = serde_json::to_string(&msg) {
                            if socket.send(Message::Text(json.into())).await.is_err() {
                                debug!("Chat client disconnected during send");
                                break;
                            }
                        }
                    }
                    None => {
                        // Registry entry torn down (delivery failure path).
                        debug!("Outbound channel closed");
                        break;
                    }
                }
            }

            // Receive messages from the client
            inbound = socket.recv() => {
                match inbound {
                    Some(Ok(Message::Text(text))) => {
                        match serde_json::from_str::<ClientMessage>(&text) {
                            Ok(client_msg) => {
                                // One message is handled to completion before
                                // the next frame is read.
                                state
                                    .dispatcher
                                    .handle_inbound(&session_id, &client_msg.message)
                                    .await;
                            }
                            Err(e) => {
                                debug!(error = %e, text = %text, "Invalid JSON from chat client");
                            }
                        }
                    }
                    Some(Ok(Message::Ping(data))) => {
                        if socket.send(Message::Pong(data)).await.is_err() {
                            break;
                        }
                    }
                    Some(Ok(Message::Close(_))) | None => {
                        info!(session_id = %session_id, "Chat client disconnected");
                        break;
                    }
                    Some(Err(e)) => {
                        warn!(session_id = %session_id, error = %e, "WebSocket error");
                        break;
                    }
                    _ => {}
                }
            }
        }
    }

    state.registry.disconnect(&session_id, connection_id).await;
    info!(session_id = %session_id, "Chat connection closed");
}

// ── REST Endpoints ──────────────────────────────────────────────────────

async fn list_questions(State(state): State<AppState>) -> impl IntoResponse {
    Json(state.catalog.questions().to_vec())
}

#[derive(Deserialize)]
struct ScoreRequest {
    /// Question id → selected display option.
    answers: HashMap<String, String>,
}

/// Stateless scoring of a complete answer map.
async fn score_assessment(
    State(state): State<AppState>,
    Json(body): Json<ScoreRequest>,
) -> impl IntoResponse {
    let catalog = &state.catalog;

    let mut answers = Vec::with_capacity(catalog.len());
    for question in catalog.questions() {
        let Some(selected) = body.answers.get(&question.id) else {
            return (
                StatusCode::BAD_REQUEST,
                Json(serde_json::json!({
                    "error": format!("Missing answer for question {}", question.id)
                })),
            );
        };
        match catalog.normalize(&question.id, selected) {
            Ok(token) => answers.push(Answer::new(question.id.clone(), token)),
            Err(e) => {
                return (
                    StatusCode::BAD_REQUEST,
                    Json(serde_json::json!({"error": e.to_string()})),
                );
            }
        }
    }

    match score(catalog, &answers) {
        Ok(dosha_results) => {
            let panchakarma_recs = recommend(&dosha_results, state.config.top_doshas);
            let outcome = AssessmentOutcome {
                dosha_results,
                panchakarma_recs,
            };
            (StatusCode::OK, Json(serde_json::json!(outcome)))
        }
        Err(e) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(serde_json::json!({"error": e.to_string()})),
        ),
    }
}

/// Render a Markdown report from engine output supplied by the caller.
async fn generate_report(Json(outcome): Json<AssessmentOutcome>) -> impl IntoResponse {
    let report = render_report(&outcome, chrono::Utc::now());
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "text/markdown; charset=utf-8")],
        report,
    )
}
