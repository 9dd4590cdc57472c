// src/db/memory.rs

use std::{
    collections::BTreeMap,
    sync::atomic::{AtomicI64, Ordering},
};

use async_trait::async_trait;
use chrono::Utc;
use rand::seq::{IndexedRandom, SliceRandom};
use tokio::sync::RwLock;

use crate::{
    db::{QuestionStore, SessionRepository},
    error::AppError,
    models::{
        practice_session::PracticeSession,
        question::{Question, QuestionFilter},
    },
};

/// Question store kept in process memory.
#[derive(Default)]
pub struct InMemoryQuestionStore {
    questions: RwLock<BTreeMap<i64, Question>>,
    next_id: AtomicI64,
}

impl InMemoryQuestionStore {
    pub fn new() -> Self {
        Self::default()
    }
}

/// Draws up to `count` items uniformly without replacement.
fn sample_uniform(candidates: &[&Question], count: usize) -> Vec<Question> {
    let mut rng = rand::rng();
    let mut picked: Vec<Question> = candidates
        .choose_multiple(&mut rng, count)
        .map(|q| (*q).clone())
        .collect();
    picked.shuffle(&mut rng);
    picked
}

#[async_trait]
impl QuestionStore for InMemoryQuestionStore {
    async fn sample(&self, filter: &QuestionFilter, count: usize) -> Result<Vec<Question>, AppError> {
        let questions = self.questions.read().await;
        let candidates: Vec<&Question> = questions.values().filter(|q| filter.matches(q)).collect();
        Ok(sample_uniform(&candidates, count))
    }

    async fn get(&self, id: i64) -> Result<Option<Question>, AppError> {
        Ok(self.questions.read().await.get(&id).cloned())
    }

    async fn get_many(&self, ids: &[i64]) -> Result<Vec<Question>, AppError> {
        let questions = self.questions.read().await;
        Ok(ids.iter().filter_map(|id| questions.get(id).cloned()).collect())
    }

    async fn insert(&self, mut question: Question) -> Result<Question, AppError> {
        question.id = self.next_id.fetch_add(1, Ordering::SeqCst) + 1;
        question.created_at = Some(Utc::now());
        self.questions
            .write()
            .await
            .insert(question.id, question.clone());
        Ok(question)
    }

    async fn persist(&self, question: &Question) -> Result<(), AppError> {
        let mut questions = self.questions.write().await;
        match questions.get_mut(&question.id) {
            Some(existing) => {
                *existing = question.clone();
                Ok(())
            }
            None => Err(AppError::NotFound(format!(
                "Question {} not found",
                question.id
            ))),
        }
    }
}

/// Session repository kept in process memory.
#[derive(Default)]
pub struct InMemorySessionRepository {
    sessions: RwLock<BTreeMap<i64, PracticeSession>>,
    next_id: AtomicI64,
}

impl InMemorySessionRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SessionRepository for InMemorySessionRepository {
    async fn create(&self, mut session: PracticeSession) -> Result<i64, AppError> {
        let id = self.next_id.fetch_add(1, Ordering::SeqCst) + 1;
        session.id = id;
        self.sessions.write().await.insert(id, session);
        Ok(id)
    }

    async fn get_by_id(&self, id: i64) -> Result<Option<PracticeSession>, AppError> {
        Ok(self.sessions.read().await.get(&id).cloned())
    }

    async fn list_by_user(
        &self,
        user_id: i64,
        completed_only: bool,
    ) -> Result<Vec<PracticeSession>, AppError> {
        let sessions = self.sessions.read().await;
        let mut list: Vec<PracticeSession> = sessions
            .values()
            .filter(|s| s.user_id == user_id && (!completed_only || s.is_completed))
            .cloned()
            .collect();
        // Newest first; ids break ties between sessions created in the same instant.
        list.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        Ok(list)
    }

    async fn complete(&self, session: &PracticeSession) -> Result<(), AppError> {
        let mut sessions = self.sessions.write().await;
        match sessions.get_mut(&session.id) {
            Some(existing) if existing.is_completed => Err(AppError::Conflict(
                "Practice session has already been submitted".to_string(),
            )),
            Some(existing) => {
                *existing = session.clone();
                Ok(())
            }
            None => Err(AppError::NotFound(format!(
                "Practice session {} not found",
                session.id
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{
        practice_session::SessionType,
        question::{Difficulty, QuestionStatistics, QuestionType},
    };
    use std::collections::HashSet;

    fn question(subject: &str, verified: bool) -> Question {
        Question {
            id: 0,
            exam_code: "JAMB".to_string(),
            subject: subject.to_string(),
            year: 2020,
            question_text: "?".to_string(),
            question_type: QuestionType::FillInBlank,
            options: vec![],
            correct_answer: "x".to_string(),
            explanation: String::new(),
            difficulty: Difficulty::Hard,
            topic: "Topic".to_string(),
            subtopic: None,
            points: 1,
            time_allocation: 60,
            source: "JAMB 2020".to_string(),
            is_verified: verified,
            tags: vec![],
            statistics: QuestionStatistics::default(),
            created_at: None,
        }
    }

    fn filter() -> QuestionFilter {
        QuestionFilter {
            exam_code: "JAMB".to_string(),
            subjects: vec!["Biology".to_string()],
            verified_only: true,
            difficulty: None,
        }
    }

    #[tokio::test]
    async fn test_sample_is_capped_and_distinct() {
        let store = InMemoryQuestionStore::new();
        for _ in 0..10 {
            store.insert(question("Biology", true)).await.unwrap();
        }
        store.insert(question("Biology", false)).await.unwrap();
        store.insert(question("Physics", true)).await.unwrap();

        let picked = store.sample(&filter(), 4).await.unwrap();
        assert_eq!(picked.len(), 4);
        let ids: HashSet<i64> = picked.iter().map(|q| q.id).collect();
        assert_eq!(ids.len(), 4);

        let all = store.sample(&filter(), 50).await.unwrap();
        assert_eq!(all.len(), 10);
        assert!(all.iter().all(|q| q.is_verified && q.subject == "Biology"));
    }

    #[tokio::test]
    async fn test_sample_reaches_every_candidate() {
        let store = InMemoryQuestionStore::new();
        for _ in 0..6 {
            store.insert(question("Biology", true)).await.unwrap();
        }

        let mut seen = HashSet::new();
        for _ in 0..200 {
            for q in store.sample(&filter(), 1).await.unwrap() {
                seen.insert(q.id);
            }
        }
        assert_eq!(seen.len(), 6);
    }

    #[tokio::test]
    async fn test_persist_unknown_question_fails() {
        let store = InMemoryQuestionStore::new();
        let mut q = question("Biology", true);
        q.id = 99;
        assert!(matches!(store.persist(&q).await, Err(AppError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_complete_only_applies_once() {
        let repo = InMemorySessionRepository::new();
        let session = PracticeSession::new(
            1, "JAMB", &[], SessionType::Practice, None, 600, &[], Utc::now(),
        );
        let id = repo.create(session).await.unwrap();

        let mut graded = repo.get_by_id(id).await.unwrap().unwrap();
        graded.is_completed = true;
        graded.score = 80;
        repo.complete(&graded).await.unwrap();

        graded.score = 10;
        assert!(matches!(repo.complete(&graded).await, Err(AppError::Conflict(_))));
        assert_eq!(repo.get_by_id(id).await.unwrap().unwrap().score, 80);

        graded.id = 99;
        assert!(matches!(repo.complete(&graded).await, Err(AppError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_list_by_user_filters_and_orders() {
        let repo = InMemorySessionRepository::new();
        let base = Utc::now();

        for (offset, completed) in [(0, true), (1, false), (2, true)] {
            let mut s = PracticeSession::new(
                1,
                "JAMB",
                &["Biology".to_string()],
                SessionType::Practice,
                None,
                600,
                &[],
                base + chrono::Duration::minutes(offset),
            );
            s.is_completed = completed;
            repo.create(s).await.unwrap();
        }
        let other = PracticeSession::new(
            2, "JAMB", &[], SessionType::Practice, None, 600, &[], base,
        );
        repo.create(other).await.unwrap();

        let completed = repo.list_by_user(1, true).await.unwrap();
        assert_eq!(completed.len(), 2);
        assert!(completed[0].created_at > completed[1].created_at);

        let all = repo.list_by_user(1, false).await.unwrap();
        assert_eq!(all.len(), 3);
    }
}
