// src/handlers/practice.rs

use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};

use crate::{
    db::{DynQuestionStore, DynSessionRepository},
    error::AppError,
    extractors::AppJson,
    models::{
        exam::EXAM_CATALOG,
        practice_session::{StartSessionRequest, SubmitSessionRequest},
    },
    services::practice,
    utils::jwt::Claims,
};

/// Lists the exams with practice content, with departments and subjects.
pub async fn list_exams() -> impl IntoResponse {
    Json(EXAM_CATALOG)
}

/// Starts a practice session for the current user.
///
/// Samples questions for the chosen subjects and returns them without answer keys.
/// Returns 201 Created.
pub async fn start_session(
    State(questions): State<DynQuestionStore>,
    State(sessions): State<DynSessionRepository>,
    Extension(claims): Extension<Claims>,
    AppJson(req): AppJson<StartSessionRequest>,
) -> Result<impl IntoResponse, AppError> {
    let user_id = claims.user_id()?;

    let started =
        practice::start_session(questions.as_ref(), sessions.as_ref(), user_id, req).await?;

    Ok((StatusCode::CREATED, Json(started)))
}

/// Submits answers for a session and returns the graded result.
///
/// Only the user who started the session may submit it, and only once.
pub async fn submit_session(
    State(questions): State<DynQuestionStore>,
    State(sessions): State<DynSessionRepository>,
    Extension(claims): Extension<Claims>,
    Path(session_id): Path<i64>,
    AppJson(req): AppJson<SubmitSessionRequest>,
) -> Result<impl IntoResponse, AppError> {
    let user_id = claims.user_id()?;

    let outcome = practice::submit_session(
        questions.as_ref(),
        sessions.as_ref(),
        session_id,
        user_id,
        req,
    )
    .await?;

    let failed = outcome
        .stat_updates
        .iter()
        .filter(|o| o.error.is_some())
        .count();
    if failed > 0 {
        tracing::warn!(
            "Session {}: {} of {} question statistics updates failed",
            session_id,
            failed,
            outcome.stat_updates.len()
        );
    }

    Ok(Json(outcome.response))
}

/// Practice statistics for the current user.
pub async fn get_stats(
    State(questions): State<DynQuestionStore>,
    State(sessions): State<DynSessionRepository>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, AppError> {
    let user_id = claims.user_id()?;

    let stats = practice::get_user_stats(questions.as_ref(), sessions.as_ref(), user_id).await?;

    Ok(Json(stats))
}
