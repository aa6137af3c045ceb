use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

use chrono::Utc;
use thiserror::Error;
use tokio::task::{spawn_blocking, JoinError};
use tidewatch_core::{DiffError, Merged, Output, Payload, State, TEXT_PLAIN};
use tidewatch_logging::{watch_debug, watch_error, watch_info, watch_warn};

use crate::{
    Action, CycleOutcome, CycleReport, Reaction, Stage, StateStore, StoreError, StoredState,
};

/// Cycle-aborting errors. Fetch and filter problems are not errors; they
/// surface as failure states in the [`CycleReport`].
#[derive(Debug, Error)]
pub enum RunError {
    #[error("reaction {reaction}: {source}")]
    Diff {
        reaction: String,
        #[source]
        source: DiffError,
    },
    #[error("reaction {reaction}: {source}")]
    Store {
        reaction: String,
        #[source]
        source: StoreError,
    },
    #[error("reaction {reaction}: state store task failed: {source}")]
    StoreTask {
        reaction: String,
        #[source]
        source: JoinError,
    },
}

/// Runs reaction cycles against one state store.
///
/// At most one cycle per reaction name is in flight at any time; cycles of
/// different reactions run concurrently.
pub struct ReactionRunner<P: Payload> {
    store: Arc<dyn StateStore<P>>,
    error_action: Option<Arc<dyn Action>>,
    locks: Mutex<HashMap<String, Arc<tokio::sync::Mutex<()>>>>,
}

impl<P: Payload> ReactionRunner<P> {
    pub fn new(store: Arc<dyn StateStore<P>>) -> Self {
        Self {
            store,
            error_action: None,
            locks: Mutex::new(HashMap::new()),
        }
    }

    /// Receives failure reports and empty-state warnings of every reaction.
    pub fn with_error_action(mut self, action: Arc<dyn Action>) -> Self {
        self.error_action = Some(action);
        self
    }

    /// Runs `work` against the store on the blocking pool; store calls do
    /// file IO and fsync.
    async fn with_store<T, F>(&self, reaction: &str, work: F) -> Result<T, RunError>
    where
        T: Send + 'static,
        F: FnOnce(&dyn StateStore<P>) -> Result<T, StoreError> + Send + 'static,
    {
        let store = self.store.clone();
        spawn_blocking(move || work(store.as_ref()))
            .await
            .map_err(|source| RunError::StoreTask {
                reaction: reaction.to_string(),
                source,
            })?
            .map_err(|source| RunError::Store {
                reaction: reaction.to_string(),
                source,
            })
    }

    /// Last stored state of `reaction`, read off the async workers.
    pub async fn load_last(&self, reaction: &str) -> Result<Option<StoredState<P>>, RunError> {
        let key = reaction.to_string();
        self.with_store(reaction, move |store| store.load_last(&key))
            .await
    }

    async fn load_last_success(&self, reaction: &str) -> Result<Option<StoredState<P>>, RunError> {
        let key = reaction.to_string();
        self.with_store(reaction, move |store| store.load_last_success(&key))
            .await
    }

    async fn save(&self, reaction: &str, stored: StoredState<P>) -> Result<(), RunError> {
        let key = reaction.to_string();
        self.with_store(reaction, move |store| store.save(&key, &stored))
            .await
    }

    fn lock_for(&self, reaction: &str) -> Arc<tokio::sync::Mutex<()>> {
        let mut locks = self.locks.lock().unwrap_or_else(PoisonError::into_inner);
        locks.entry(reaction.to_string()).or_default().clone()
    }

    /// Runs one full cycle: fetch, filter, diff against the last successful
    /// state, notify when the diff asks for it, persist.
    ///
    /// A failed fetch or filter skips diffing and notification; the failure
    /// is persisted with an increased fail count. A diff error aborts the
    /// cycle before anything is persisted.
    pub async fn run(&self, reaction: &Reaction<P>) -> Result<CycleReport, RunError> {
        let name = reaction.name();
        let lock = self.lock_for(name);
        let _guard = lock.lock().await;

        watch_debug!(reaction: name, "{} via {}", Stage::Fetching, reaction.query().describe());
        let fetched = reaction.query().fetch().await;

        watch_debug!(reaction: name, "{} through {:?}", Stage::Filtering, reaction.filters());
        let current = reaction.filters().apply(fetched);

        if !current.is_success() {
            let last = self.load_last(name).await?;
            let fail_count = last.map_or(0, |last| last.fail_count) + 1;
            let cause = current.cause().map(str::to_string);
            watch_warn!(
                reaction: name,
                "cycle failed ({} in a row): {}",
                fail_count,
                cause.as_deref().unwrap_or("unknown cause")
            );
            self.report(name, Merged::new(current.clone(), false).render(name))
                .await;

            watch_debug!(reaction: name, "{}", Stage::Persisting);
            self.save(name, StoredState::new(current, Utc::now(), fail_count))
                .await?;
            return Ok(CycleReport {
                reaction: name.to_string(),
                outcome: CycleOutcome::Failed { cause },
                fail_count,
            });
        }

        if let State::Success { payload } = &current {
            if payload.is_empty() {
                watch_warn!(reaction: name, "reached empty {} state", payload.kind());
                self.report(name, empty_state_output(name, payload.kind()))
                    .await;
            }
        }

        watch_debug!(reaction: name, "{} with {}", Stage::Diffing, reaction.diff().name());
        let previous = self
            .load_last_success(name)
            .await?
            .map_or_else(State::unknown_failure, |stored| stored.state);
        let merged = reaction
            .diff()
            .merge(&previous, current)
            .map_err(|source| RunError::Diff {
                reaction: name.to_string(),
                source,
            })?;

        let outcome = if merged.notify() {
            watch_info!(reaction: name, "{}: change detected", Stage::Notifying);
            let output = reaction.diff().render(name, &merged);
            match deliver(reaction.action().clone(), output).await {
                Ok(()) => CycleOutcome::Notified,
                Err(message) => {
                    watch_error!(reaction: name, "action failed: {message}");
                    CycleOutcome::ActionFailed { message }
                }
            }
        } else {
            CycleOutcome::Unchanged
        };

        watch_debug!(reaction: name, "{}", Stage::Persisting);
        self.save(name, StoredState::new(merged.into_state(), Utc::now(), 0))
            .await?;
        watch_debug!(reaction: name, "{}", Stage::Done);

        Ok(CycleReport {
            reaction: name.to_string(),
            outcome,
            fail_count: 0,
        })
    }

    async fn report(&self, reaction: &str, output: Output) {
        let Some(action) = &self.error_action else {
            return;
        };
        if let Err(message) = deliver(action.clone(), output).await {
            watch_error!(reaction: reaction, "error action failed: {message}");
        }
    }
}

/// Executes `action` on the blocking pool; actions write to stdout or disk.
async fn deliver(action: Arc<dyn Action>, output: Output) -> Result<(), String> {
    match spawn_blocking(move || action.execute(&output)).await {
        Ok(result) => result.map_err(|err| err.to_string()),
        Err(err) => Err(format!("action task failed: {err}")),
    }
}

fn empty_state_output(reaction: &str, kind: &str) -> Output {
    Output::new(format!("Reached Empty State for “{reaction}!”"))
        .with_text(TEXT_PLAIN, format!("The {kind} state for {reaction} was empty."))
}
