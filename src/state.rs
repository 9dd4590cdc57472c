use std::sync::Arc;

use axum::extract::FromRef;

use crate::{
    config::Config,
    db::{
        DynQuestionStore, DynSessionRepository,
        memory::{InMemoryQuestionStore, InMemorySessionRepository},
    },
};

#[derive(Clone)]
pub struct AppState {
    pub questions: DynQuestionStore,
    pub sessions: DynSessionRepository,
    pub config: Config,
}

impl AppState {
    /// State backed by process memory. Used without a database and in tests.
    pub fn in_memory(config: Config) -> Self {
        Self {
            questions: Arc::new(InMemoryQuestionStore::new()),
            sessions: Arc::new(InMemorySessionRepository::new()),
            config,
        }
    }
}

impl FromRef<AppState> for DynQuestionStore {
    fn from_ref(state: &AppState) -> Self {
        state.questions.clone()
    }
}

impl FromRef<AppState> for DynSessionRepository {
    fn from_ref(state: &AppState) -> Self {
        state.sessions.clone()
    }
}

impl FromRef<AppState> for Config {
    fn from_ref(state: &AppState) -> Self {
        state.config.clone()
    }
}
