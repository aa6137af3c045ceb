use std::sync::Arc;

use tidewatch_core::{Payload, State};
use tidewatch_logging::watch_debug;

use crate::ConfigurationError;

/// Produces the current state of an external resource.
///
/// Expected failures (unreachable host, bad status) are returned as
/// [`State::Failure`], never as panics or errors.
#[async_trait::async_trait]
pub trait Query<P: Payload>: Send + Sync {
    /// Human-readable description used in logs.
    fn describe(&self) -> String;

    async fn fetch(&self) -> State<P>;
}

/// Tries its child queries in order and returns the first success.
///
/// Later children are not invoked once one succeeds. When every child
/// fails, the failure of the last child is returned.
pub struct FallbackQuery<P> {
    queries: Vec<Arc<dyn Query<P>>>,
}

impl<P: Payload> FallbackQuery<P> {
    pub fn new(queries: Vec<Arc<dyn Query<P>>>) -> Result<Self, ConfigurationError> {
        if queries.is_empty() {
            return Err(ConfigurationError::EmptyFallback);
        }
        Ok(Self { queries })
    }
}

#[async_trait::async_trait]
impl<P: Payload> Query<P> for FallbackQuery<P> {
    fn describe(&self) -> String {
        let children: Vec<String> = self.queries.iter().map(|query| query.describe()).collect();
        format!("fallback[{}]", children.join(", "))
    }

    async fn fetch(&self) -> State<P> {
        let mut last = State::unknown_failure();
        for query in &self.queries {
            let state = query.fetch().await;
            if state.is_success() {
                return state;
            }
            watch_debug!(
                "{} failed ({}), trying next query",
                query.describe(),
                state.cause().unwrap_or("unknown cause")
            );
            last = state;
        }
        last
    }
}
