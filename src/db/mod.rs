// src/db/mod.rs

//! Storage seams for the practice engine.
//!
//! The engine only talks to [`QuestionStore`] and [`SessionRepository`]. A
//! Postgres implementation backs production; the in-memory one backs tests and
//! database-less runs.

use std::sync::Arc;

use async_trait::async_trait;

use crate::{
    error::AppError,
    models::{
        practice_session::PracticeSession,
        question::{Question, QuestionFilter},
    },
};

pub mod memory;
pub mod postgres;

/// Catalog of exam questions.
#[async_trait]
pub trait QuestionStore: Send + Sync {
    /// Uniform random sample without replacement of at most `count`
    /// questions matching `filter`.
    async fn sample(&self, filter: &QuestionFilter, count: usize) -> Result<Vec<Question>, AppError>;

    async fn get(&self, id: i64) -> Result<Option<Question>, AppError>;

    /// Fetches every question in `ids` that exists. Missing ids are left out.
    async fn get_many(&self, ids: &[i64]) -> Result<Vec<Question>, AppError>;

    /// Stores a new question and returns it with its assigned id.
    async fn insert(&self, question: Question) -> Result<Question, AppError>;

    /// Writes back a question's statistics.
    async fn persist(&self, question: &Question) -> Result<(), AppError>;
}

/// Storage for practice sessions.
#[async_trait]
pub trait SessionRepository: Send + Sync {
    /// Stores a new session and returns its id.
    async fn create(&self, session: PracticeSession) -> Result<i64, AppError>;

    async fn get_by_id(&self, id: i64) -> Result<Option<PracticeSession>, AppError>;

    /// A user's sessions, newest first.
    async fn list_by_user(
        &self,
        user_id: i64,
        completed_only: bool,
    ) -> Result<Vec<PracticeSession>, AppError>;

    /// Writes a graded session, but only over one that is still in progress.
    ///
    /// Fails with `Conflict` when the stored session is already completed, so
    /// of two racing submissions exactly one is recorded.
    async fn complete(&self, session: &PracticeSession) -> Result<(), AppError>;
}

pub type DynQuestionStore = Arc<dyn QuestionStore>;
pub type DynSessionRepository = Arc<dyn SessionRepository>;
