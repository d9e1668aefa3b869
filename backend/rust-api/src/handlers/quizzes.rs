use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Extension, Json,
};
use mongodb::bson::oid::ObjectId;
use serde_json::json;
use std::sync::Arc;

use crate::{
    metrics::QUIZZES_UPLOADED_TOTAL,
    middlewares::auth::JwtClaims,
    models::quiz::{Quiz, QuizDetail, UploadQuizRequest},
    services::{quiz_service::QuizService, AppState},
};

fn owner_id(claims: &JwtClaims) -> Result<ObjectId, (StatusCode, String)> {
    ObjectId::parse_str(&claims.sub).map_err(|e| {
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            format!("Invalid user ID in token: {}", e),
        )
    })
}

/// POST /api/v1/quizzes - Parse and store an uploaded quiz text file.
/// A parse failure saves nothing.
pub async fn upload_quiz(
    State(state): State<Arc<AppState>>,
    Extension(claims): Extension<JwtClaims>,
    Json(req): Json<UploadQuizRequest>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let owner = owner_id(&claims)?;

    let quiz = match Quiz::parse(&req.text) {
        Ok(quiz) => quiz,
        Err(e) => {
            tracing::warn!(owner_id = %owner.to_hex(), "Rejected quiz upload: {}", e);
            QUIZZES_UPLOADED_TOTAL.with_label_values(&["rejected"]).inc();
            return Err((
                StatusCode::BAD_REQUEST,
                format!("Could not read the quiz file ({}). Check the file format.", e),
            ));
        }
    };

    let title = quiz.title.clone();
    let question_count = quiz.questions.len();

    let service = QuizService::new(state.mongo.clone());
    match service.create(quiz, &owner).await {
        Ok(quiz_id) => {
            QUIZZES_UPLOADED_TOTAL.with_label_values(&["accepted"]).inc();
            Ok((
                StatusCode::CREATED,
                Json(json!({
                    "id": quiz_id,
                    "title": title,
                    "question_count": question_count,
                })),
            ))
        }
        Err(e) => {
            tracing::error!("Failed to store quiz: {}", e);
            Err((
                StatusCode::INTERNAL_SERVER_ERROR,
                "Failed to save quiz".to_string(),
            ))
        }
    }
}

/// GET /api/v1/quizzes - List the caller's quizzes
pub async fn list_quizzes(
    State(state): State<Arc<AppState>>,
    Extension(claims): Extension<JwtClaims>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let owner = owner_id(&claims)?;

    let service = QuizService::new(state.mongo.clone());
    match service.list_by_owner(&owner).await {
        Ok(summaries) => Ok((StatusCode::OK, Json(summaries))),
        Err(e) => {
            tracing::error!("Failed to list quizzes: {}", e);
            Err((
                StatusCode::INTERNAL_SERVER_ERROR,
                "Failed to list quizzes".to_string(),
            ))
        }
    }
}

/// GET /api/v1/quizzes/{id} - Get one of the caller's quizzes
pub async fn get_quiz(
    State(state): State<Arc<AppState>>,
    Extension(claims): Extension<JwtClaims>,
    Path(quiz_id): Path<String>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let owner = owner_id(&claims)?;

    let service = QuizService::new(state.mongo.clone());
    match service.get(&quiz_id, &owner).await {
        Ok(document) => Ok((StatusCode::OK, Json(QuizDetail::from(document)))),
        Err(e) => {
            let msg = e.to_string();
            let status = if msg.contains("Quiz not found") || msg.contains("Invalid quiz ID") {
                StatusCode::NOT_FOUND
            } else {
                tracing::error!("Failed to get quiz: {}", e);
                StatusCode::INTERNAL_SERVER_ERROR
            };
            Err((status, msg))
        }
    }
}

/// DELETE /api/v1/quizzes/{id} - Delete one of the caller's quizzes
pub async fn delete_quiz(
    State(state): State<Arc<AppState>>,
    Extension(claims): Extension<JwtClaims>,
    Path(quiz_id): Path<String>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let owner = owner_id(&claims)?;

    let service = QuizService::new(state.mongo.clone());
    match service.delete(&quiz_id, &owner).await {
        Ok(()) => Ok((StatusCode::NO_CONTENT, ())),
        Err(e) => {
            let msg = e.to_string();
            let status = if msg.contains("Quiz not found") || msg.contains("Invalid quiz ID") {
                StatusCode::NOT_FOUND
            } else {
                tracing::error!("Failed to delete quiz: {}", e);
                StatusCode::INTERNAL_SERVER_ERROR
            };
            Err((status, msg))
        }
    }
}
