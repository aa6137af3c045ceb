use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use futures_util::future::join_all;
use tidewatch_core::Payload;
use tidewatch_logging::{watch_debug, watch_error, watch_info};
use tokio_util::sync::CancellationToken;

use crate::{CycleReport, Reaction, ReactionRunner, RunError};

/// Schedules the configured reactions.
///
/// A reaction is due `interval` after the `updated_at` of its last stored
/// state, or immediately when it has never run. Each reaction is driven by
/// its own task, so a slow reaction never delays the others.
pub struct Engine<P: Payload> {
    reactions: Vec<Reaction<P>>,
    runner: Arc<ReactionRunner<P>>,
}

impl<P: Payload> Engine<P> {
    pub fn new(reactions: Vec<Reaction<P>>, runner: ReactionRunner<P>) -> Self {
        Self {
            reactions,
            runner: Arc::new(runner),
        }
    }

    pub fn reactions(&self) -> &[Reaction<P>] {
        &self.reactions
    }

    pub fn runner(&self) -> &ReactionRunner<P> {
        &self.runner
    }

    /// Runs one cycle of each named reaction (all reactions when `names` is
    /// empty), concurrently. Unknown names are ignored.
    pub async fn run_once(&self, names: &[String]) -> Vec<Result<CycleReport, RunError>> {
        let selected = self
            .reactions
            .iter()
            .filter(|reaction| names.is_empty() || names.iter().any(|name| name == reaction.name()));
        join_all(selected.map(|reaction| self.runner.run(reaction))).await
    }

    /// Drives every reaction until `shutdown` is cancelled. A cycle in
    /// progress is finished before its task stops.
    pub async fn run(&self, shutdown: CancellationToken) {
        watch_info!("scheduling {} reaction(s)", self.reactions.len());
        let tasks = self.reactions.iter().cloned().map(|reaction| {
            let runner = self.runner.clone();
            let shutdown = shutdown.clone();
            tokio::spawn(async move { drive(runner, reaction, shutdown).await })
        });
        for joined in join_all(tasks).await {
            if let Err(err) = joined {
                watch_error!("reaction task ended abnormally: {err}");
            }
        }
        watch_info!("scheduler stopped");
    }
}

/// Time left until `reaction` is due according to its stored state.
async fn until_due<P: Payload>(runner: &ReactionRunner<P>, reaction: &Reaction<P>) -> Duration {
    match runner.load_last(reaction.name()).await {
        Ok(Some(last)) => {
            let elapsed = (Utc::now() - last.updated_at)
                .to_std()
                .unwrap_or(Duration::ZERO);
            reaction.interval().saturating_sub(elapsed)
        }
        Ok(None) => Duration::ZERO,
        Err(err) => {
            watch_error!(reaction: reaction.name(), "cannot read last state: {err}");
            reaction.interval()
        }
    }
}

async fn drive<P: Payload>(
    runner: Arc<ReactionRunner<P>>,
    reaction: Reaction<P>,
    shutdown: CancellationToken,
) {
    let name = reaction.name().to_string();
    // Cycles that abort before persisting must not be retried immediately.
    let mut not_before = Duration::ZERO;
    loop {
        let wait = until_due(&runner, &reaction).await.max(not_before);
        watch_debug!(reaction: name, "next cycle in {}s", wait.as_secs());
        tokio::select! {
            _ = shutdown.cancelled() => break,
            _ = tokio::time::sleep(wait) => {}
        }
        match runner.run(&reaction).await {
            Ok(report) => {
                watch_debug!(reaction: name, "cycle finished: {:?}", report.outcome);
            }
            Err(err) => watch_error!(reaction: name, "cycle aborted: {err}"),
        }
        not_before = reaction.interval();
    }
}
