// src/models/stats.rs

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::models::practice_session::PracticeSession;

/// One row of the "recent sessions" list.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RecentSession {
    pub id: i64,
    pub exam_code: String,
    pub subject: String,
    pub score: u32,
    pub total_questions: u32,
    pub time_spent: i64,
    pub completed_at: Option<DateTime<Utc>>,
    pub difficulty: String,
}

impl From<&PracticeSession> for RecentSession {
    fn from(s: &PracticeSession) -> Self {
        RecentSession {
            id: s.id,
            exam_code: s.exam_code.clone(),
            subject: s.subject.clone(),
            score: s.score,
            total_questions: s.total_questions,
            time_spent: s.total_time_spent,
            completed_at: s.completed_at,
            difficulty: s.difficulty.clone(),
        }
    }
}

/// Aggregated practice statistics for the current user.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserStats {
    pub practice_sessions_completed: u32,
    pub total_questions_answered: u32,
    pub average_score: u32,
    pub study_streak: u32,
    pub recent_sessions: Vec<RecentSession>,
    pub weak_topics: Vec<String>,
    pub strong_topics: Vec<String>,
}

/// Accuracy of one topic across a user's completed sessions.
#[derive(Debug, Clone, PartialEq)]
pub struct TopicAccuracy {
    pub topic: String,
    pub accuracy: f64,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct TopicAnalysis {
    pub strong: Vec<String>,
    pub weak: Vec<String>,
}
