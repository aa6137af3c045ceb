use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use tidewatch_core::{DiffStrategy, FilterChain, Payload};

use crate::{Action, Query};

/// A named binding of query, filters, diff strategy and action.
///
/// The name is the persistence key, so it must be unique and stable across
/// runs. Reactions are immutable and cheap to clone.
pub struct Reaction<P: Payload> {
    name: String,
    query: Arc<dyn Query<P>>,
    filters: FilterChain<P>,
    diff: Arc<dyn DiffStrategy<P>>,
    action: Arc<dyn Action>,
    interval: Duration,
}

impl<P: Payload> Reaction<P> {
    pub fn new(
        name: impl Into<String>,
        query: Arc<dyn Query<P>>,
        filters: FilterChain<P>,
        diff: Arc<dyn DiffStrategy<P>>,
        action: Arc<dyn Action>,
        interval: Duration,
    ) -> Self {
        Self {
            name: name.into(),
            query,
            filters,
            diff,
            action,
            interval,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn query(&self) -> &dyn Query<P> {
        self.query.as_ref()
    }

    pub fn filters(&self) -> &FilterChain<P> {
        &self.filters
    }

    pub fn diff(&self) -> &dyn DiffStrategy<P> {
        self.diff.as_ref()
    }

    pub fn action(&self) -> &Arc<dyn Action> {
        &self.action
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }
}

impl<P: Payload> Clone for Reaction<P> {
    fn clone(&self) -> Self {
        Self {
            name: self.name.clone(),
            query: self.query.clone(),
            filters: self.filters.clone(),
            diff: self.diff.clone(),
            action: self.action.clone(),
            interval: self.interval,
        }
    }
}

impl<P: Payload> fmt::Debug for Reaction<P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Reaction")
            .field("name", &self.name)
            .field("query", &self.query.describe())
            .field("filters", &self.filters)
            .field("diff", &self.diff.name())
            .field("interval", &self.interval)
            .finish()
    }
}
