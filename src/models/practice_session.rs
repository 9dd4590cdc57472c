// src/models/practice_session.rs

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::{
    config::{DEFAULT_QUESTION_COUNT, DEFAULT_TIME_LIMIT_SECS},
    models::question::{Difficulty, PublicQuestion, Question},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SessionType {
    #[default]
    Practice,
    MockExam,
    TimedPractice,
    TopicBased,
}

impl SessionType {
    pub fn as_str(&self) -> &'static str {
        match self {
            SessionType::Practice => "practice",
            SessionType::MockExam => "mock-exam",
            SessionType::TimedPractice => "timed-practice",
            SessionType::TopicBased => "topic-based",
        }
    }
}

impl std::str::FromStr for SessionType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "practice" => Ok(SessionType::Practice),
            "mock-exam" => Ok(SessionType::MockExam),
            "timed-practice" => Ok(SessionType::TimedPractice),
            "topic-based" => Ok(SessionType::TopicBased),
            other => Err(format!("unknown session type '{}'", other)),
        }
    }
}

/// One question slot inside a session.
///
/// `correct_answer` is copied from the question when the session is built and
/// is the only answer key grading looks at.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuestionAttempt {
    pub question_id: i64,
    pub user_answer: Option<String>,
    pub correct_answer: String,
    pub is_correct: Option<bool>,
    #[serde(default)]
    pub time_spent: i64,
    #[serde(default)]
    pub skipped: bool,
}

impl QuestionAttempt {
    pub fn snapshot(question: &Question) -> Self {
        QuestionAttempt {
            question_id: question.id,
            user_answer: None,
            correct_answer: question.correct_answer.clone(),
            is_correct: None,
            time_spent: 0,
            skipped: false,
        }
    }

    pub fn is_correct(&self) -> bool {
        self.is_correct.unwrap_or(false)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Performance {
    /// Percentage correct among attempted (non-skipped) questions.
    pub accuracy: u32,
    /// Questions per minute, two decimals.
    pub speed: f64,
    /// Reserved.
    pub consistency: Option<f64>,
    pub strong_topics: Vec<String>,
    pub weak_topics: Vec<String>,
}

/// A practice session owned by one user.
///
/// Created in-progress by the session builder and moved to completed exactly
/// once by grading. `is_completed` never goes back to `false`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PracticeSession {
    pub id: i64,
    pub user_id: i64,
    pub exam_code: String,

    /// Display string; several subjects are joined with ", ".
    pub subject: String,
    pub session_type: SessionType,
    pub questions: Vec<QuestionAttempt>,
    pub total_questions: u32,
    pub correct_answers: u32,
    pub wrong_answers: u32,
    pub skipped_questions: u32,
    /// Percentage of all questions answered correctly.
    pub score: u32,
    pub total_time_spent: i64,
    pub time_limit: u32,
    pub start_time: DateTime<Utc>,
    pub end_time: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
    pub is_completed: bool,
    /// "Easy", "Medium", "Hard" or "Mixed".
    pub difficulty: String,
    pub topics: Vec<String>,
    pub performance: Performance,
    pub created_at: DateTime<Utc>,
}

/// A submitted answer for one question.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct SubmittedAnswer {
    pub answer: String,
    #[serde(default)]
    pub time_spent: Option<u32>,
}

impl PracticeSession {
    /// Builds an in-progress session from sampled questions.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        user_id: i64,
        exam_code: &str,
        subjects: &[String],
        session_type: SessionType,
        difficulty: Option<Difficulty>,
        time_limit: u32,
        questions: &[Question],
        now: DateTime<Utc>,
    ) -> Self {
        let mut topics: Vec<String> = Vec::new();
        for q in questions {
            if !topics.contains(&q.topic) {
                topics.push(q.topic.clone());
            }
        }

        PracticeSession {
            id: 0,
            user_id,
            exam_code: exam_code.to_string(),
            subject: subjects.join(", "),
            session_type,
            questions: questions.iter().map(QuestionAttempt::snapshot).collect(),
            total_questions: questions.len() as u32,
            correct_answers: 0,
            wrong_answers: 0,
            skipped_questions: 0,
            score: 0,
            total_time_spent: 0,
            time_limit,
            start_time: now,
            end_time: None,
            completed_at: None,
            is_completed: false,
            difficulty: difficulty.map_or("Mixed", |d| d.as_str()).to_string(),
            topics,
            performance: Performance::default(),
            created_at: now,
        }
    }

    /// Applies submitted answers to every question slot, then scores the session.
    ///
    /// A slot with no entry in `answers` is skipped. Matching is exact string
    /// equality against the snapshotted answer key.
    pub fn grade(&mut self, answers: &HashMap<i64, SubmittedAnswer>, now: DateTime<Utc>) {
        for attempt in &mut self.questions {
            match answers.get(&attempt.question_id) {
                Some(submitted) => {
                    attempt.is_correct = Some(submitted.answer == attempt.correct_answer);
                    attempt.user_answer = Some(submitted.answer.clone());
                    attempt.time_spent = i64::from(submitted.time_spent.unwrap_or(0));
                    attempt.skipped = false;
                }
                None => {
                    attempt.user_answer = None;
                    attempt.is_correct = Some(false);
                    attempt.time_spent = 0;
                    attempt.skipped = true;
                }
            }
        }

        self.calculate_performance(now);
    }

    /// Recomputes aggregate counters and marks the session completed.
    pub fn calculate_performance(&mut self, now: DateTime<Utc>) {
        let mut correct = 0;
        let mut wrong = 0;
        let mut skipped = 0;
        for q in &self.questions {
            if q.is_correct() {
                correct += 1;
            } else if q.skipped {
                skipped += 1;
            } else {
                wrong += 1;
            }
        }

        self.correct_answers = correct;
        self.wrong_answers = wrong;
        self.skipped_questions = skipped;
        self.total_time_spent = self.questions.iter().map(|q| q.time_spent).sum();

        self.score = percentage(self.correct_answers, self.total_questions);

        let attempted = self.total_questions.saturating_sub(self.skipped_questions);
        self.performance.accuracy = percentage(self.correct_answers, attempted);

        let minutes = self.total_time_spent as f64 / 60.0;
        self.performance.speed = if minutes > 0.0 {
            (f64::from(self.total_questions) / minutes * 100.0).round() / 100.0
        } else {
            0.0
        };

        self.is_completed = true;
        self.completed_at = Some(now);
        self.end_time = Some(now);
    }
}

/// `round(part / whole * 100)`, or 0 when `whole` is 0.
fn percentage(part: u32, whole: u32) -> u32 {
    if whole == 0 {
        return 0;
    }
    (f64::from(part) / f64::from(whole) * 100.0).round() as u32
}

fn default_question_count() -> u32 {
    DEFAULT_QUESTION_COUNT
}

fn default_time_limit() -> u32 {
    DEFAULT_TIME_LIMIT_SECS
}

/// DTO for starting a practice session.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct StartSessionRequest {
    #[serde(default)]
    #[validate(length(min = 1, max = 20, message = "Exam code is required."))]
    pub exam_code: String,
    #[serde(default)]
    #[validate(length(min = 1, max = 50, message = "Department is required."))]
    pub department: String,
    #[serde(default)]
    #[validate(
        length(min = 1, max = 10, message = "At least one subject is required."),
        custom(function = validate_subjects)
    )]
    pub subjects: Vec<String>,
    #[serde(default = "default_question_count")]
    #[validate(range(min = 1, max = 100))]
    pub question_count: u32,
    #[serde(default = "default_time_limit")]
    #[validate(range(min = 1, max = 86400))]
    pub time_limit: u32,
    pub difficulty: Option<Difficulty>,
    pub session_type: Option<SessionType>,
}

fn validate_subjects(subjects: &[String]) -> Result<(), validator::ValidationError> {
    if subjects.iter().any(|s| s.trim().is_empty() || s.len() > 100) {
        return Err(validator::ValidationError::new("subject_invalid"));
    }
    Ok(())
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StartSessionResponse {
    pub session_id: i64,
    pub questions: Vec<PublicQuestion>,
    pub time_limit: u32,
    pub total_questions: u32,
}

/// DTO for submitting a session.
/// Key: Question ID. Value: the answer and seconds spent on it.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct SubmitSessionRequest {
    pub answers: HashMap<i64, SubmittedAnswer>,
}

/// Per-question review row returned after grading.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QuestionResult {
    pub question_id: i64,
    pub question_text: Option<String>,
    pub user_answer: Option<String>,
    pub correct_answer: String,
    pub is_correct: bool,
    pub explanation: Option<String>,
    pub topic: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmitSessionResponse {
    pub session_id: i64,
    pub score: u32,
    pub correct_answers: u32,
    pub wrong_answers: u32,
    pub skipped_questions: u32,
    pub total_time_spent: i64,
    pub performance: Performance,
    pub results: Vec<QuestionResult>,
}
