//! Backfill Session
//!
//! Invokes a server-side historical backfill and reports its outcome
//! (created/updated/skipped counts). Orchestration only; the session never
//! inspects or reconciles the resulting snapshots itself.

use std::sync::Arc;

use parking_lot::Mutex;
use tracing::info;

use client::UniverseRepository;
use model::{BackfillOutcome, BackfillRequest};

use crate::error::{BACKFILL_FAILED, SessionError, user_message};

#[derive(Debug, Clone, Default)]
pub struct BackfillState {
    pub loading: bool,
    pub error: Option<String>,
    pub result: Option<BackfillOutcome>,
}

pub struct BackfillSession<R: UniverseRepository> {
    repo: Arc<R>,
    universe_id: String,
    state: Mutex<BackfillState>,
}

impl<R: UniverseRepository> BackfillSession<R> {
    pub fn new(repo: Arc<R>, universe_id: impl Into<String>) -> Self {
        Self {
            repo,
            universe_id: universe_id.into(),
            state: Mutex::new(BackfillState::default()),
        }
    }

    pub async fn run(&self, request: &BackfillRequest) -> Result<BackfillOutcome, SessionError> {
        {
            let mut state = self.state.lock();
            state.loading = true;
            state.error = None;
        }

        match self.repo.backfill_history(&self.universe_id, request).await {
            Ok(outcome) => {
                info!(
                    universe_id = %self.universe_id,
                    created = outcome.snapshots_created,
                    updated = outcome.snapshots_updated,
                    skipped = outcome.snapshots_skipped,
                    "backfill finished"
                );

                let mut state = self.state.lock();
                state.loading = false;
                state.result = Some(outcome);
                Ok(outcome)
            }
            Err(err) => {
                let mut state = self.state.lock();
                state.loading = false;
                state.result = None;
                state.error = Some(user_message(&err, BACKFILL_FAILED));
                Err(err.into())
            }
        }
    }

    pub fn state(&self) -> BackfillState {
        self.state.lock().clone()
    }
}
