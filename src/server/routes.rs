//! The REST command surface.
//!
//! Boundary only: handlers validate input shape, hand the command to the
//! [`GameServer`] dispatcher and translate taxonomy errors to statuses. No
//! room state is touched here.

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Deserialize;
use serde_json::json;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::error::GameError;
use crate::protocol::{Difficulty, PlayerId};
use crate::websocket;

use super::{GameServer, MarkResult};

/// Build the application router with WebSocket support.
pub fn create_router(cors_origins: &str) -> Router<Arc<GameServer>> {
    let cors = if cors_origins == "*" {
        CorsLayer::permissive()
    } else {
        let origins: Vec<_> = cors_origins
            .split(',')
            .filter_map(|s| s.trim().parse::<axum::http::HeaderValue>().ok())
            .collect();

        if origins.is_empty() {
            tracing::warn!("No valid CORS origins configured, using permissive CORS");
            CorsLayer::permissive()
        } else {
            CorsLayer::new()
                .allow_origin(origins)
                .allow_methods(Any)
                .allow_headers(Any)
        }
    };

    Router::new()
        .route("/api/session", post(create_session))
        .route("/api/rooms", get(list_rooms))
        .route("/api/session/{code}", get(session_snapshot))
        .route("/api/session/{code}/join", post(join_session))
        .route("/api/session/{code}/leave", post(leave_session))
        .route("/api/session/{code}/destroy", post(destroy_session))
        .route("/api/session/{code}/share", post(issue_share))
        .route("/api/share/claim", post(claim_share))
        .route("/api/session/{code}/turn", post(set_turn))
        .route("/api/session/{code}/question/activate", post(activate_question))
        .route("/api/session/{code}/question/open", post(open_buzzers))
        .route("/api/session/{code}/question/mark", post(mark_question))
        .route("/api/session/{code}/question/cancel", post(cancel_question))
        .route("/ws/{code}", get(websocket::websocket_handler))
        .route("/healthz", get(health_check))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
}

async fn health_check(State(server): State<Arc<GameServer>>) -> impl IntoResponse {
    Json(json!({
        "status": "ok",
        "rooms": server.registry().len(),
    }))
}

async fn create_session(State(server): State<Arc<GameServer>>) -> impl IntoResponse {
    let created = server.create_room().await;
    (StatusCode::CREATED, Json(created))
}

async fn list_rooms(State(server): State<Arc<GameServer>>) -> impl IntoResponse {
    Json(server.list_rooms().await)
}

async fn session_snapshot(
    State(server): State<Arc<GameServer>>,
    Path(code): Path<String>,
) -> Result<impl IntoResponse, GameError> {
    let snapshot = server.snapshot(&code).await?;
    Ok(Json(snapshot))
}

#[derive(Debug, Deserialize)]
struct JoinBody {
    name: String,
}

async fn join_session(
    State(server): State<Arc<GameServer>>,
    Path(code): Path<String>,
    Json(body): Json<JoinBody>,
) -> Result<impl IntoResponse, GameError> {
    let joined = server.join(&code, &body.name).await?;
    Ok((StatusCode::CREATED, Json(joined)))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct LeaveBody {
    player_id: PlayerId,
}

async fn leave_session(
    State(server): State<Arc<GameServer>>,
    Path(code): Path<String>,
    Json(body): Json<LeaveBody>,
) -> Result<impl IntoResponse, GameError> {
    server.leave(&code, &body.player_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct HostBody {
    host_secret: String,
}

async fn destroy_session(
    State(server): State<Arc<GameServer>>,
    Path(code): Path<String>,
    Json(body): Json<HostBody>,
) -> Result<impl IntoResponse, GameError> {
    server.destroy(&code, &body.host_secret).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn issue_share(
    State(server): State<Arc<GameServer>>,
    Path(code): Path<String>,
    Json(body): Json<HostBody>,
) -> Result<impl IntoResponse, GameError> {
    let issued = server.issue_share(&code, &body.host_secret).await?;
    Ok(Json(issued))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ClaimBody {
    share_code: String,
}

async fn claim_share(
    State(server): State<Arc<GameServer>>,
    Json(body): Json<ClaimBody>,
) -> Result<impl IntoResponse, GameError> {
    let claimed = server.claim_share(&body.share_code).await?;
    Ok(Json(claimed))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TurnBody {
    host_secret: String,
    player_id: PlayerId,
}

async fn set_turn(
    State(server): State<Arc<GameServer>>,
    Path(code): Path<String>,
    Json(body): Json<TurnBody>,
) -> Result<impl IntoResponse, GameError> {
    server
        .set_turn(&code, &body.host_secret, &body.player_id)
        .await?;
    Ok(Json(json!({ "ok": true })))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ActivateBody {
    host_secret: String,
    category: Option<String>,
    difficulty: Option<String>,
}

async fn activate_question(
    State(server): State<Arc<GameServer>>,
    Path(code): Path<String>,
    Json(body): Json<ActivateBody>,
) -> Result<impl IntoResponse, GameError> {
    let difficulty = match body.difficulty.as_deref() {
        None => None,
        Some(raw) => Some(Difficulty::parse(raw).ok_or_else(|| {
            GameError::Validation("Difficulty must be easy, medium or hard".to_string())
        })?),
    };
    server
        .activate(
            &code,
            &body.host_secret,
            body.category,
            difficulty.map(|d| d.as_str().to_string()),
        )
        .await?;
    Ok(Json(json!({ "ok": true })))
}

async fn open_buzzers(
    State(server): State<Arc<GameServer>>,
    Path(code): Path<String>,
    Json(body): Json<HostBody>,
) -> Result<impl IntoResponse, GameError> {
    server.open_buzzers(&code, &body.host_secret).await?;
    Ok(Json(json!({ "ok": true })))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct MarkBody {
    host_secret: String,
    result: String,
    player_id: Option<PlayerId>,
    open_buzzers: Option<bool>,
}

async fn mark_question(
    State(server): State<Arc<GameServer>>,
    Path(code): Path<String>,
    Json(body): Json<MarkBody>,
) -> Result<impl IntoResponse, GameError> {
    let result = match body.result.as_str() {
        "correct" => MarkResult::Correct,
        "incorrect" => MarkResult::Incorrect,
        _ => {
            return Err(GameError::Validation(
                "Result must be correct or incorrect".to_string(),
            ))
        }
    };
    server
        .mark(
            &code,
            &body.host_secret,
            result,
            body.player_id.as_deref(),
            body.open_buzzers.unwrap_or(false),
        )
        .await?;
    Ok(Json(json!({ "ok": true })))
}

async fn cancel_question(
    State(server): State<Arc<GameServer>>,
    Path(code): Path<String>,
    Json(body): Json<HostBody>,
) -> Result<impl IntoResponse, GameError> {
    server.cancel(&code, &body.host_secret).await?;
    Ok(Json(json!({ "ok": true })))
}
