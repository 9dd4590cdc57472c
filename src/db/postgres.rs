// src/db/postgres.rs

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{PgPool, prelude::FromRow, types::Json};

use crate::{
    db::{QuestionStore, SessionRepository},
    error::AppError,
    models::{
        practice_session::{Performance, PracticeSession, QuestionAttempt},
        question::{Question, QuestionFilter, QuestionOption, QuestionStatistics},
    },
};

const QUESTION_COLUMNS: &str = r#"
    id, exam_code, subject, year, question_text, question_type, options,
    correct_answer, explanation, difficulty, topic, subtopic, points,
    time_allocation, source, is_verified, tags, statistics, created_at
"#;

const SESSION_COLUMNS: &str = r#"
    id, user_id, exam_code, subject, session_type, questions, total_questions,
    correct_answers, wrong_answers, skipped_questions, score, total_time_spent,
    time_limit, start_time, end_time, completed_at, is_completed, difficulty,
    topics, performance, created_at
"#;

/// Represents the 'questions' table in the database.
/// Options, tags and statistics are stored as JSONB.
#[derive(Debug, FromRow)]
struct QuestionRow {
    id: i64,
    exam_code: String,
    subject: String,
    year: i32,
    question_text: String,
    question_type: String,
    options: Json<Vec<QuestionOption>>,
    correct_answer: String,
    explanation: String,
    difficulty: String,
    topic: String,
    subtopic: Option<String>,
    points: i32,
    time_allocation: i32,
    source: String,
    is_verified: bool,
    tags: Json<Vec<String>>,
    statistics: Json<QuestionStatistics>,
    created_at: Option<DateTime<Utc>>,
}

impl TryFrom<QuestionRow> for Question {
    type Error = AppError;

    fn try_from(row: QuestionRow) -> Result<Self, Self::Error> {
        Ok(Question {
            id: row.id,
            exam_code: row.exam_code,
            subject: row.subject,
            year: row.year,
            question_text: row.question_text,
            question_type: row.question_type.parse().map_err(AppError::InternalServerError)?,
            options: row.options.0,
            correct_answer: row.correct_answer,
            explanation: row.explanation,
            difficulty: row.difficulty.parse().map_err(AppError::InternalServerError)?,
            topic: row.topic,
            subtopic: row.subtopic,
            points: row.points,
            time_allocation: row.time_allocation,
            source: row.source,
            is_verified: row.is_verified,
            tags: row.tags.0,
            statistics: row.statistics.0,
            created_at: row.created_at,
        })
    }
}

/// Represents the 'practice_sessions' table.
/// Question attempts, topics and performance are stored as JSONB documents.
#[derive(Debug, FromRow)]
struct SessionRow {
    id: i64,
    user_id: i64,
    exam_code: String,
    subject: String,
    session_type: String,
    questions: Json<Vec<QuestionAttempt>>,
    total_questions: i32,
    correct_answers: i32,
    wrong_answers: i32,
    skipped_questions: i32,
    score: i32,
    total_time_spent: i64,
    time_limit: i32,
    start_time: DateTime<Utc>,
    end_time: Option<DateTime<Utc>>,
    completed_at: Option<DateTime<Utc>>,
    is_completed: bool,
    difficulty: String,
    topics: Json<Vec<String>>,
    performance: Json<Performance>,
    created_at: DateTime<Utc>,
}

impl TryFrom<SessionRow> for PracticeSession {
    type Error = AppError;

    fn try_from(row: SessionRow) -> Result<Self, Self::Error> {
        Ok(PracticeSession {
            id: row.id,
            user_id: row.user_id,
            exam_code: row.exam_code,
            subject: row.subject,
            session_type: row.session_type.parse().map_err(AppError::InternalServerError)?,
            questions: row.questions.0,
            total_questions: row.total_questions.max(0) as u32,
            correct_answers: row.correct_answers.max(0) as u32,
            wrong_answers: row.wrong_answers.max(0) as u32,
            skipped_questions: row.skipped_questions.max(0) as u32,
            score: row.score.max(0) as u32,
            total_time_spent: row.total_time_spent,
            time_limit: row.time_limit.max(0) as u32,
            start_time: row.start_time,
            end_time: row.end_time,
            completed_at: row.completed_at,
            is_completed: row.is_completed,
            difficulty: row.difficulty,
            topics: row.topics.0,
            performance: row.performance.0,
            created_at: row.created_at,
        })
    }
}

#[derive(Clone)]
pub struct PgQuestionStore {
    pool: PgPool,
}

impl PgQuestionStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl QuestionStore for PgQuestionStore {
    async fn sample(&self, filter: &QuestionFilter, count: usize) -> Result<Vec<Question>, AppError> {
        let sql = format!(
            r#"
            SELECT {QUESTION_COLUMNS}
            FROM questions
            WHERE exam_code = $1
              AND subject = ANY($2)
              AND ($3 = FALSE OR is_verified)
              AND ($4::TEXT IS NULL OR difficulty = $4)
            ORDER BY RANDOM()
            LIMIT $5
            "#
        );

        let rows: Vec<QuestionRow> = sqlx::query_as(&sql)
            .bind(&filter.exam_code)
            .bind(&filter.subjects)
            .bind(filter.verified_only)
            .bind(filter.difficulty.map(|d| d.as_str()))
            .bind(count as i64)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| {
                tracing::error!("Failed to sample questions: {:?}", e);
                AppError::InternalServerError(e.to_string())
            })?;

        rows.into_iter().map(Question::try_from).collect()
    }

    async fn get(&self, id: i64) -> Result<Option<Question>, AppError> {
        let sql = format!("SELECT {QUESTION_COLUMNS} FROM questions WHERE id = $1");
        let row: Option<QuestionRow> = sqlx::query_as(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        row.map(Question::try_from).transpose()
    }

    async fn get_many(&self, ids: &[i64]) -> Result<Vec<Question>, AppError> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let sql = format!("SELECT {QUESTION_COLUMNS} FROM questions WHERE id = ANY($1)");
        let rows: Vec<QuestionRow> = sqlx::query_as(&sql)
            .bind(ids)
            .fetch_all(&self.pool)
            .await?;

        rows.into_iter().map(Question::try_from).collect()
    }

    async fn insert(&self, question: Question) -> Result<Question, AppError> {
        let sql = format!(
            r#"
            INSERT INTO questions (
                exam_code, subject, year, question_text, question_type, options,
                correct_answer, explanation, difficulty, topic, subtopic, points,
                time_allocation, source, is_verified, tags, statistics
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17)
            RETURNING {QUESTION_COLUMNS}
            "#
        );

        let row: QuestionRow = sqlx::query_as(&sql)
            .bind(&question.exam_code)
            .bind(&question.subject)
            .bind(question.year)
            .bind(&question.question_text)
            .bind(question.question_type.as_str())
            .bind(Json(&question.options))
            .bind(&question.correct_answer)
            .bind(&question.explanation)
            .bind(question.difficulty.as_str())
            .bind(&question.topic)
            .bind(&question.subtopic)
            .bind(question.points)
            .bind(question.time_allocation)
            .bind(&question.source)
            .bind(question.is_verified)
            .bind(Json(&question.tags))
            .bind(Json(&question.statistics))
            .fetch_one(&self.pool)
            .await
            .map_err(|e| {
                tracing::error!("Failed to insert question: {:?}", e);
                AppError::InternalServerError(e.to_string())
            })?;

        Question::try_from(row)
    }

    async fn persist(&self, question: &Question) -> Result<(), AppError> {
        let result = sqlx::query("UPDATE questions SET statistics = $1 WHERE id = $2")
            .bind(Json(&question.statistics))
            .bind(question.id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("Question {} not found", question.id)));
        }
        Ok(())
    }
}

#[derive(Clone)]
pub struct PgSessionRepository {
    pool: PgPool,
}

impl PgSessionRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl SessionRepository for PgSessionRepository {
    async fn create(&self, session: PracticeSession) -> Result<i64, AppError> {
        let (id,): (i64,) = sqlx::query_as(
            r#"
            INSERT INTO practice_sessions (
                user_id, exam_code, subject, session_type, questions, total_questions,
                time_limit, start_time, is_completed, difficulty, topics, performance,
                created_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, FALSE, $9, $10, $11, $12)
            RETURNING id
            "#,
        )
        .bind(session.user_id)
        .bind(&session.exam_code)
        .bind(&session.subject)
        .bind(session.session_type.as_str())
        .bind(Json(&session.questions))
        .bind(session.total_questions as i32)
        .bind(session.time_limit as i32)
        .bind(session.start_time)
        .bind(&session.difficulty)
        .bind(Json(&session.topics))
        .bind(Json(&session.performance))
        .bind(session.created_at)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to create practice session: {:?}", e);
            AppError::InternalServerError(e.to_string())
        })?;

        Ok(id)
    }

    async fn get_by_id(&self, id: i64) -> Result<Option<PracticeSession>, AppError> {
        let sql = format!("SELECT {SESSION_COLUMNS} FROM practice_sessions WHERE id = $1");
        let row: Option<SessionRow> = sqlx::query_as(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        row.map(PracticeSession::try_from).transpose()
    }

    async fn list_by_user(
        &self,
        user_id: i64,
        completed_only: bool,
    ) -> Result<Vec<PracticeSession>, AppError> {
        let sql = format!(
            r#"
            SELECT {SESSION_COLUMNS}
            FROM practice_sessions
            WHERE user_id = $1 AND ($2 = FALSE OR is_completed)
            ORDER BY created_at DESC, id DESC
            "#
        );
        let rows: Vec<SessionRow> = sqlx::query_as(&sql)
            .bind(user_id)
            .bind(completed_only)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| {
                tracing::error!("Failed to list practice sessions: {:?}", e);
                AppError::InternalServerError(e.to_string())
            })?;

        rows.into_iter().map(PracticeSession::try_from).collect()
    }

    async fn complete(&self, session: &PracticeSession) -> Result<(), AppError> {
        let result = sqlx::query(
            r#"
            UPDATE practice_sessions SET
                questions = $2,
                correct_answers = $3,
                wrong_answers = $4,
                skipped_questions = $5,
                score = $6,
                total_time_spent = $7,
                end_time = $8,
                completed_at = $9,
                is_completed = $10,
                performance = $11,
                updated_at = NOW()
            WHERE id = $1 AND is_completed = FALSE
            "#,
        )
        .bind(session.id)
        .bind(Json(&session.questions))
        .bind(session.correct_answers as i32)
        .bind(session.wrong_answers as i32)
        .bind(session.skipped_questions as i32)
        .bind(session.score as i32)
        .bind(session.total_time_spent)
        .bind(session.end_time)
        .bind(session.completed_at)
        .bind(session.is_completed)
        .bind(Json(&session.performance))
        .execute(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to update practice session {}: {:?}", session.id, e);
            AppError::InternalServerError(e.to_string())
        })?;

        if result.rows_affected() == 0 {
            let (exists,): (bool,) =
                sqlx::query_as("SELECT EXISTS(SELECT 1 FROM practice_sessions WHERE id = $1)")
                    .bind(session.id)
                    .fetch_one(&self.pool)
                    .await?;

            return Err(if exists {
                AppError::Conflict("Practice session has already been submitted".to_string())
            } else {
                AppError::NotFound(format!("Practice session {} not found", session.id))
            });
        }
        Ok(())
    }
}
