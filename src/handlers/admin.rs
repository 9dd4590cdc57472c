// src/handlers/admin.rs

use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};
use validator::Validate;

use crate::{
    db::DynQuestionStore,
    error::AppError,
    extractors::AppJson,
    models::question::{CreateQuestionRequest, Question},
};

/// Adds a question to the question bank.
/// Admin only.
pub async fn create_question(
    State(questions): State<DynQuestionStore>,
    AppJson(payload): AppJson<CreateQuestionRequest>,
) -> Result<impl IntoResponse, AppError> {
    if let Err(validation_errors) = payload.validate() {
        return Err(AppError::BadRequest(validation_errors.to_string()));
    }

    let question = questions.insert(Question::from(payload)).await?;

    tracing::info!(
        "Question {} added ({} / {} / {})",
        question.id,
        question.exam_code,
        question.subject,
        question.topic
    );

    Ok((StatusCode::CREATED, Json(question)))
}
