use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Extension, Json,
};
use mongodb::bson::oid::ObjectId;
use std::sync::Arc;

use crate::{
    middlewares::auth::JwtClaims,
    models::session::{StartSessionRequest, SubmitAnswerRequest},
    services::{session_service::SessionService, AppState},
};

fn owner_id(claims: &JwtClaims) -> Result<ObjectId, (StatusCode, String)> {
    ObjectId::parse_str(&claims.sub).map_err(|e| {
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            format!("Invalid user ID in token: {}", e),
        )
    })
}

fn map_session_error(e: anyhow::Error) -> (StatusCode, String) {
    let msg = e.to_string();
    let status = if msg.contains("not found") || msg.contains("Invalid quiz ID") {
        StatusCode::NOT_FOUND
    } else if msg.contains("invalid session transition") {
        StatusCode::CONFLICT
    } else {
        tracing::error!("Session operation failed: {}", e);
        StatusCode::INTERNAL_SERVER_ERROR
    };
    (status, msg)
}

/// POST /api/v1/sessions - Start a quiz attempt
pub async fn create_session(
    State(state): State<Arc<AppState>>,
    Extension(claims): Extension<JwtClaims>,
    Json(req): Json<StartSessionRequest>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let owner = owner_id(&claims)?;

    tracing::info!(
        "Starting session for user_id={}, quiz_id={}",
        claims.sub,
        req.quiz_id
    );

    let service = SessionService::new(state.clone());
    match service.start(&req.quiz_id, &owner).await {
        Ok(response) => Ok((StatusCode::CREATED, Json(response))),
        Err(e) => Err(map_session_error(e)),
    }
}

/// GET /api/v1/sessions/{id} - Current question or final results
pub async fn get_session(
    State(state): State<Arc<AppState>>,
    Extension(claims): Extension<JwtClaims>,
    Path(session_id): Path<String>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let owner = owner_id(&claims)?;

    let service = SessionService::new(state.clone());
    match service.view(&session_id, &owner) {
        Ok(view) => Ok((StatusCode::OK, Json(view))),
        Err(e) => Err(map_session_error(e)),
    }
}

/// POST /api/v1/sessions/{id}/answers - Record an answer for the current question
pub async fn submit_answer(
    State(state): State<Arc<AppState>>,
    Extension(claims): Extension<JwtClaims>,
    Path(session_id): Path<String>,
    Json(req): Json<SubmitAnswerRequest>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let owner = owner_id(&claims)?;

    tracing::info!("Submitting answer for session: {}", session_id);

    let service = SessionService::new(state.clone());
    match service.submit_answer(&session_id, &owner, &req.answer) {
        Ok(outcome) => Ok((StatusCode::OK, Json(outcome))),
        Err(e) => Err(map_session_error(e)),
    }
}

/// POST /api/v1/sessions/{id}/advance - Move to the next question or finish
pub async fn advance_session(
    State(state): State<Arc<AppState>>,
    Extension(claims): Extension<JwtClaims>,
    Path(session_id): Path<String>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let owner = owner_id(&claims)?;

    let service = SessionService::new(state.clone());
    match service.advance(&session_id, &owner) {
        Ok(view) => Ok((StatusCode::OK, Json(view))),
        Err(e) => Err(map_session_error(e)),
    }
}

/// DELETE /api/v1/sessions/{id} - Discard a session (navigate home)
pub async fn delete_session(
    State(state): State<Arc<AppState>>,
    Extension(claims): Extension<JwtClaims>,
    Path(session_id): Path<String>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let owner = owner_id(&claims)?;

    tracing::info!("Discarding session: {}", session_id);

    let service = SessionService::new(state.clone());
    match service.discard(&session_id, &owner) {
        Ok(()) => Ok((StatusCode::NO_CONTENT, ())),
        Err(e) => Err(map_session_error(e)),
    }
}
