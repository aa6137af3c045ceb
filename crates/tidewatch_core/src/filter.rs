use std::fmt;
use std::sync::Arc;

use crate::State;

/// A pure `State -> State` transformation.
///
/// Implementations must pass an incoming `State::Failure` through unchanged
/// (or with a narrower cause) and never read a payload from it. A payload
/// shape the filter does not understand becomes a `Failure` naming the
/// mismatch.
pub trait Filter<P>: Send + Sync {
    fn name(&self) -> &str {
        std::any::type_name::<Self>()
    }

    fn apply(&self, state: State<P>) -> State<P>;
}

/// Adapts a closure into a named [`Filter`].
pub struct FnFilter<F> {
    name: String,
    f: F,
}

pub fn filter_fn<P, F>(name: impl Into<String>, f: F) -> FnFilter<F>
where
    F: Fn(State<P>) -> State<P> + Send + Sync,
{
    FnFilter {
        name: name.into(),
        f,
    }
}

impl<P, F> Filter<P> for FnFilter<F>
where
    F: Fn(State<P>) -> State<P> + Send + Sync,
{
    fn name(&self) -> &str {
        &self.name
    }

    fn apply(&self, state: State<P>) -> State<P> {
        (self.f)(state)
    }
}

/// Ordered sequence of filters applied one after the other.
pub struct FilterChain<P> {
    filters: Vec<Arc<dyn Filter<P>>>,
}

impl<P> FilterChain<P> {
    pub fn new() -> Self {
        Self {
            filters: Vec::new(),
        }
    }

    pub fn with(mut self, filter: impl Filter<P> + 'static) -> Self {
        self.push(Arc::new(filter));
        self
    }

    pub fn push(&mut self, filter: Arc<dyn Filter<P>>) {
        self.filters.push(filter);
    }

    pub fn len(&self) -> usize {
        self.filters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.filters.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &dyn Filter<P>> {
        self.filters.iter().map(|filter| filter.as_ref())
    }

    /// Folds `state` through every filter in order.
    ///
    /// Failures are not special-cased here; absorbing them is each filter's
    /// obligation.
    pub fn apply(&self, state: State<P>) -> State<P> {
        self.filters
            .iter()
            .fold(state, |state, filter| filter.apply(state))
    }
}

impl<P> Default for FilterChain<P> {
    fn default() -> Self {
        Self::new()
    }
}

impl<P> Clone for FilterChain<P> {
    fn clone(&self) -> Self {
        Self {
            filters: self.filters.clone(),
        }
    }
}

impl<P> FromIterator<Arc<dyn Filter<P>>> for FilterChain<P> {
    fn from_iter<I: IntoIterator<Item = Arc<dyn Filter<P>>>>(iter: I) -> Self {
        Self {
            filters: iter.into_iter().collect(),
        }
    }
}

impl<P> fmt::Debug for FilterChain<P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list()
            .entries(self.filters.iter().map(|filter| filter.name()))
            .finish()
    }
}
