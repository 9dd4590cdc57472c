// src/models/question.rs

use std::str::FromStr;

use serde::{Deserialize, Serialize};
use validator::Validate;

/// Question difficulty level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Difficulty {
    Easy,
    Medium,
    Hard,
}

impl Difficulty {
    pub fn as_str(&self) -> &'static str {
        match self {
            Difficulty::Easy => "Easy",
            Difficulty::Medium => "Medium",
            Difficulty::Hard => "Hard",
        }
    }
}

impl FromStr for Difficulty {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Easy" => Ok(Difficulty::Easy),
            "Medium" => Ok(Difficulty::Medium),
            "Hard" => Ok(Difficulty::Hard),
            other => Err(format!("unknown difficulty '{}'", other)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum QuestionType {
    #[default]
    MultipleChoice,
    TrueFalse,
    FillInBlank,
}

impl QuestionType {
    pub fn as_str(&self) -> &'static str {
        match self {
            QuestionType::MultipleChoice => "multiple-choice",
            QuestionType::TrueFalse => "true-false",
            QuestionType::FillInBlank => "fill-in-blank",
        }
    }
}

impl FromStr for QuestionType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "multiple-choice" => Ok(QuestionType::MultipleChoice),
            "true-false" => Ok(QuestionType::TrueFalse),
            "fill-in-blank" => Ok(QuestionType::FillInBlank),
            other => Err(format!("unknown question type '{}'", other)),
        }
    }
}

/// One answer option, e.g. `{ label: "A", text: "42", isCorrect: true }`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuestionOption {
    pub label: String,
    pub text: String,
    #[serde(default)]
    pub is_correct: bool,
}

/// Per-question attempt counters.
/// `average_time` is a running mean in seconds, never a sum.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct QuestionStatistics {
    pub total_attempts: u32,
    pub correct_attempts: u32,
    pub average_time: f64,
}

/// An exam question as held by the question store.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Question {
    pub id: i64,
    pub exam_code: String,
    pub subject: String,
    pub year: i32,
    pub question_text: String,
    pub question_type: QuestionType,
    pub options: Vec<QuestionOption>,

    /// The canonical answer string compared against submissions.
    pub correct_answer: String,

    pub explanation: String,
    pub difficulty: Difficulty,
    pub topic: String,
    pub subtopic: Option<String>,
    pub points: i32,

    /// Expected seconds per question. Pacing hint only.
    pub time_allocation: i32,

    /// e.g. "JAMB 2023".
    pub source: String,
    pub is_verified: bool,
    pub tags: Vec<String>,
    pub statistics: QuestionStatistics,
    pub created_at: Option<chrono::DateTime<chrono::Utc>>,
}

impl Question {
    /// Records one graded attempt.
    ///
    /// The previous mean is expanded back into a total using the previous
    /// attempt count, the new sample is added, and the result is divided by the
    /// new count and rounded to whole seconds.
    pub fn update_statistics(&mut self, is_correct: bool, time_spent: i64) {
        let stats = &mut self.statistics;
        let previous_total = stats.total_attempts;

        stats.total_attempts += 1;
        if is_correct {
            stats.correct_attempts += 1;
        }

        let total_time = stats.average_time * f64::from(previous_total) + time_spent as f64;
        stats.average_time = (total_time / f64::from(stats.total_attempts)).round();
    }

    /// Client-safe view handed out before grading.
    pub fn to_public(&self) -> PublicQuestion {
        PublicQuestion {
            id: self.id,
            question_text: self.question_text.clone(),
            options: self
                .options
                .iter()
                .map(|opt| PublicOption {
                    label: opt.label.clone(),
                    text: opt.text.clone(),
                })
                .collect(),
            subject: self.subject.clone(),
            topic: self.topic.clone(),
            time_allocation: self.time_allocation,
        }
    }
}

/// Option as shown to a student: no correctness flag.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PublicOption {
    pub label: String,
    pub text: String,
}

/// DTO for sending question to client (excludes answer, explanation and option flags).
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PublicQuestion {
    pub id: i64,
    pub question_text: String,
    pub options: Vec<PublicOption>,
    pub subject: String,
    pub topic: String,
    pub time_allocation: i32,
}

/// Filter used when sampling questions for a new session.
#[derive(Debug, Clone)]
pub struct QuestionFilter {
    pub exam_code: String,
    pub subjects: Vec<String>,
    pub verified_only: bool,
    pub difficulty: Option<Difficulty>,
}

impl QuestionFilter {
    pub fn matches(&self, question: &Question) -> bool {
        question.exam_code == self.exam_code
            && self.subjects.iter().any(|s| s == &question.subject)
            && (!self.verified_only || question.is_verified)
            && self.difficulty.is_none_or(|d| d == question.difficulty)
    }
}

/// DTO for creating a new question (admin).
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
#[validate(schema(function = validate_answer_key))]
pub struct CreateQuestionRequest {
    #[validate(length(min = 1, max = 20))]
    pub exam_code: String,
    #[validate(length(min = 1, max = 100))]
    pub subject: String,
    #[validate(range(min = 1900, max = 2100))]
    pub year: i32,
    #[validate(length(min = 1, max = 2000))]
    pub question_text: String,
    #[serde(default)]
    pub question_type: QuestionType,
    #[serde(default)]
    #[validate(custom(function = validate_options))]
    pub options: Vec<QuestionOption>,
    #[validate(length(min = 1, max = 500))]
    pub correct_answer: String,
    #[serde(default)]
    #[validate(length(max = 2000))]
    pub explanation: String,
    #[serde(default = "default_difficulty")]
    pub difficulty: Difficulty,
    #[validate(length(min = 1, max = 100))]
    pub topic: String,
    #[validate(length(max = 100))]
    pub subtopic: Option<String>,
    #[serde(default = "default_points")]
    #[validate(range(min = 1, max = 100))]
    pub points: i32,
    #[serde(default = "default_time_allocation")]
    #[validate(range(min = 1, max = 3600))]
    pub time_allocation: i32,
    #[validate(length(min = 1, max = 100))]
    pub source: String,
    #[serde(default)]
    pub is_verified: bool,
    #[serde(default)]
    pub tags: Vec<String>,
}

impl From<CreateQuestionRequest> for Question {
    /// Builds an unsaved question. The store assigns `id` and `created_at`.
    fn from(req: CreateQuestionRequest) -> Self {
        Question {
            id: 0,
            exam_code: req.exam_code,
            subject: req.subject,
            year: req.year,
            question_text: req.question_text,
            question_type: req.question_type,
            options: req.options,
            correct_answer: req.correct_answer,
            explanation: req.explanation,
            difficulty: req.difficulty,
            topic: req.topic,
            subtopic: req.subtopic,
            points: req.points,
            time_allocation: req.time_allocation,
            source: req.source,
            is_verified: req.is_verified,
            tags: req.tags,
            statistics: QuestionStatistics::default(),
            created_at: None,
        }
    }
}

fn default_difficulty() -> Difficulty {
    Difficulty::Medium
}

fn default_points() -> i32 {
    1
}

fn default_time_allocation() -> i32 {
    90
}

fn validate_options(options: &[QuestionOption]) -> Result<(), validator::ValidationError> {
    for opt in options {
        if opt.label.is_empty() || opt.label.len() > 10 {
            return Err(validator::ValidationError::new("option_label_invalid"));
        }
        if opt.text.len() > 500 {
            return Err(validator::ValidationError::new("option_too_long"));
        }
    }
    Ok(())
}

/// Choice questions need at least two options with exactly one flagged
/// correct, and the answer key must name that option by label or text.
/// Fill-in-blank questions may come without options.
fn validate_answer_key(req: &CreateQuestionRequest) -> Result<(), validator::ValidationError> {
    let needs_options = matches!(
        req.question_type,
        QuestionType::MultipleChoice | QuestionType::TrueFalse
    );
    if req.options.is_empty() && !needs_options {
        return Ok(());
    }
    if req.options.len() < 2 {
        return Err(validator::ValidationError::new("options_need_at_least_two"));
    }

    let mut flagged = req.options.iter().filter(|opt| opt.is_correct);
    let correct = match (flagged.next(), flagged.next()) {
        (Some(opt), None) => opt,
        _ => return Err(validator::ValidationError::new("exactly_one_correct_option")),
    };
    if correct.label != req.correct_answer && correct.text != req.correct_answer {
        return Err(validator::ValidationError::new("correct_answer_not_the_flagged_option"));
    }
    Ok(())
}
