// src/services/practice.rs

//! Practice session lifecycle: build, grade, and report.
//!
//! Functions take the stores as trait objects and hold no state between
//! calls, so they run the same under any server model.

use std::collections::HashMap;

use chrono::{Local, Utc};
use validator::Validate;

use crate::{
    db::{QuestionStore, SessionRepository},
    error::AppError,
    models::{
        practice_session::{
            PracticeSession, QuestionResult, StartSessionRequest, StartSessionResponse,
            SubmitSessionRequest, SubmitSessionResponse,
        },
        question::{Question, QuestionFilter},
        stats::UserStats,
    },
    services::stats::build_user_stats,
};

/// Result of one best-effort statistics update.
#[derive(Debug, Clone, PartialEq)]
pub struct StatUpdateOutcome {
    pub question_id: i64,
    pub error: Option<String>,
}

/// Everything grading produced. Only `response` goes back to the client.
#[derive(Debug)]
pub struct SubmissionOutcome {
    pub response: SubmitSessionResponse,
    pub stat_updates: Vec<StatUpdateOutcome>,
}

/// Samples questions and opens a new in-progress session for `user_id`.
pub async fn start_session(
    questions: &dyn QuestionStore,
    sessions: &dyn SessionRepository,
    user_id: i64,
    req: StartSessionRequest,
) -> Result<StartSessionResponse, AppError> {
    req.validate()?;

    let filter = QuestionFilter {
        exam_code: req.exam_code.clone(),
        subjects: req.subjects.clone(),
        verified_only: true,
        difficulty: req.difficulty,
    };

    let sampled = questions
        .sample(&filter, req.question_count as usize)
        .await?;

    if sampled.is_empty() {
        return Err(AppError::NotFound(
            "No questions found for the selected subjects".to_string(),
        ));
    }

    let session = PracticeSession::new(
        user_id,
        &req.exam_code,
        &req.subjects,
        req.session_type.unwrap_or_default(),
        req.difficulty,
        req.time_limit,
        &sampled,
        Utc::now(),
    );
    let total_questions = session.total_questions;

    let session_id = sessions.create(session).await?;

    tracing::info!(
        "Practice session {} started for user {} ({} {}, {} questions, department {})",
        session_id,
        user_id,
        req.exam_code,
        req.subjects.join(", "),
        total_questions,
        req.department
    );

    Ok(StartSessionResponse {
        session_id,
        questions: sampled.iter().map(Question::to_public).collect(),
        time_limit: req.time_limit,
        total_questions,
    })
}

/// Grades a session owned by `user_id` and records per-question statistics.
///
/// The graded session is persisted before any statistics update runs. A failed
/// statistics update is logged and reported in the outcome; it never fails the
/// submission.
pub async fn submit_session(
    questions: &dyn QuestionStore,
    sessions: &dyn SessionRepository,
    session_id: i64,
    user_id: i64,
    req: SubmitSessionRequest,
) -> Result<SubmissionOutcome, AppError> {
    let mut session = sessions
        .get_by_id(session_id)
        .await?
        .ok_or(AppError::NotFound("Practice session not found".to_string()))?;

    if session.user_id != user_id {
        return Err(AppError::Forbidden("Access denied".to_string()));
    }

    if session.is_completed {
        return Err(AppError::Conflict(
            "Practice session has already been submitted".to_string(),
        ));
    }

    session.grade(&req.answers, Utc::now());
    // A concurrent submission may have completed the session since it was read.
    sessions.complete(&session).await?;

    tracing::info!(
        "Practice session {} graded: score={} correct={} wrong={} skipped={}",
        session.id,
        session.score,
        session.correct_answers,
        session.wrong_answers,
        session.skipped_questions
    );

    let stat_updates = update_question_statistics(questions, &session).await;

    let ids: Vec<i64> = session.questions.iter().map(|q| q.question_id).collect();
    let details: HashMap<i64, Question> = match questions.get_many(&ids).await {
        Ok(found) => found.into_iter().map(|q| (q.id, q)).collect(),
        Err(e) => {
            // The grade is already stored; review text is optional.
            tracing::warn!("Failed to load question details for session {}: {}", session.id, e);
            HashMap::new()
        }
    };

    let results = session
        .questions
        .iter()
        .map(|attempt| {
            let question = details.get(&attempt.question_id);
            QuestionResult {
                question_id: attempt.question_id,
                question_text: question.map(|q| q.question_text.clone()),
                user_answer: attempt.user_answer.clone(),
                correct_answer: attempt.correct_answer.clone(),
                is_correct: attempt.is_correct(),
                explanation: question.map(|q| q.explanation.clone()),
                topic: question.map(|q| q.topic.clone()),
            }
        })
        .collect();

    Ok(SubmissionOutcome {
        response: SubmitSessionResponse {
            session_id: session.id,
            score: session.score,
            correct_answers: session.correct_answers,
            wrong_answers: session.wrong_answers,
            skipped_questions: session.skipped_questions,
            total_time_spent: session.total_time_spent,
            performance: session.performance.clone(),
            results,
        },
        stat_updates,
    })
}

/// Applies one statistics update per graded question, each independently.
pub async fn update_question_statistics(
    questions: &dyn QuestionStore,
    session: &PracticeSession,
) -> Vec<StatUpdateOutcome> {
    let mut outcomes = Vec::with_capacity(session.questions.len());

    for attempt in &session.questions {
        let result = record_attempt(
            questions,
            attempt.question_id,
            attempt.is_correct(),
            attempt.time_spent,
        )
        .await;

        let error = match result {
            Ok(()) => None,
            Err(e) => {
                tracing::warn!(
                    "Failed to update statistics for question {} (session {}): {}",
                    attempt.question_id,
                    session.id,
                    e
                );
                Some(e.to_string())
            }
        };

        outcomes.push(StatUpdateOutcome {
            question_id: attempt.question_id,
            error,
        });
    }

    outcomes
}

async fn record_attempt(
    questions: &dyn QuestionStore,
    question_id: i64,
    is_correct: bool,
    time_spent: i64,
) -> Result<(), AppError> {
    let mut question = questions
        .get(question_id)
        .await?
        .ok_or(AppError::NotFound(format!("Question {} not found", question_id)))?;

    question.update_statistics(is_correct, time_spent);
    questions.persist(&question).await
}

/// Practice statistics over the user's completed sessions.
pub async fn get_user_stats(
    questions: &dyn QuestionStore,
    sessions: &dyn SessionRepository,
    user_id: i64,
) -> Result<UserStats, AppError> {
    let completed = sessions.list_by_user(user_id, true).await?;

    let mut ids: Vec<i64> = completed
        .iter()
        .flat_map(|s| s.questions.iter().map(|q| q.question_id))
        .collect();
    ids.sort_unstable();
    ids.dedup();

    let topics_by_question: HashMap<i64, String> = questions
        .get_many(&ids)
        .await?
        .into_iter()
        .map(|q| (q.id, q.topic))
        .collect();

    Ok(build_user_stats(&completed, &topics_by_question, &Local::now()))
}
