//! Composition Lookup Session
//!
//! Point-in-time membership retrieval. Thin orchestration: one repository
//! call, `{loading, error, result}` state, no derived computation.

use std::sync::Arc;

use chrono::NaiveDate;
use parking_lot::Mutex;

use client::UniverseRepository;
use model::Composition;

use crate::error::{COMPOSITION_FETCH_FAILED, SessionError, user_message};

#[derive(Debug, Clone, Default)]
pub struct LookupState {
    pub loading: bool,
    pub error: Option<String>,
    pub result: Option<Composition>,
}

pub struct CompositionSession<R: UniverseRepository> {
    repo: Arc<R>,
    universe_id: String,
    state: Mutex<LookupState>,
}

impl<R: UniverseRepository> CompositionSession<R> {
    pub fn new(repo: Arc<R>, universe_id: impl Into<String>) -> Self {
        Self {
            repo,
            universe_id: universe_id.into(),
            state: Mutex::new(LookupState::default()),
        }
    }

    /// Membership at (or nearest before) `date`, passed through unmodified.
    pub async fn lookup(&self, date: NaiveDate) -> Result<Composition, SessionError> {
        {
            let mut state = self.state.lock();
            state.loading = true;
            state.error = None;
        }

        match self.repo.composition_at(&self.universe_id, date).await {
            Ok(composition) => {
                let mut state = self.state.lock();
                state.loading = false;
                state.result = Some(composition.clone());
                Ok(composition)
            }
            Err(err) => {
                let mut state = self.state.lock();
                state.loading = false;
                state.result = None;
                state.error = Some(user_message(&err, COMPOSITION_FETCH_FAILED));
                Err(err.into())
            }
        }
    }

    pub fn state(&self) -> LookupState {
        self.state.lock().clone()
    }
}
