use thiserror::Error;

use crate::{Output, Payload, State};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DiffError {
    /// The strategy cannot merge the payload shapes it was handed.
    #[error("{strategy} cannot merge {previous} into {current}")]
    IncompatiblePayloads {
        strategy: &'static str,
        previous: &'static str,
        current: &'static str,
    },
    #[error("{strategy} cannot merge a {kind} payload")]
    UnsupportedPayload {
        strategy: &'static str,
        kind: &'static str,
    },
}

/// Result of merging the previous and the current state of a reaction.
///
/// Rendering reads from this value only, so a notification can never be
/// built from anything but the state that was just merged.
#[derive(Debug, Clone, PartialEq)]
pub struct Merged<P> {
    state: State<P>,
    notify: bool,
    fresh: Option<P>,
}

impl<P: Payload> Merged<P> {
    pub fn new(state: State<P>, notify: bool) -> Self {
        Self {
            state,
            notify,
            fresh: None,
        }
    }

    /// Attaches the part of the merged payload that triggered the notification.
    pub fn with_fresh(mut self, fresh: P) -> Self {
        self.fresh = Some(fresh);
        self
    }

    pub fn state(&self) -> &State<P> {
        &self.state
    }

    pub fn into_state(self) -> State<P> {
        self.state
    }

    pub fn notify(&self) -> bool {
        self.notify
    }

    pub fn fresh(&self) -> Option<&P> {
        self.fresh.as_ref()
    }

    /// Renders the merged payload; a merged failure renders as an error notice.
    pub fn render(&self, reaction: &str) -> Output {
        match &self.state {
            State::Success { payload } => payload.render(reaction, self.fresh.as_ref()),
            State::Failure { cause } => {
                let text = format!("Failed: {}", cause.as_deref().unwrap_or("unknown cause"));
                Output::new(format!("Error while processing “{reaction}”"))
                    .with_text(crate::TEXT_PLAIN, text.clone())
                    .with_text(
                        crate::TEXT_HTML,
                        format!("<div>{}</div>", crate::escape_html(&text)),
                    )
            }
        }
    }
}

/// Decides what becomes the new persisted state and whether to notify.
///
/// `previous` is the last successful state of the reaction, or a failure of
/// unknown cause when there is none yet. Implementations must be pure; the
/// merge result carries everything the renderer needs.
pub trait DiffStrategy<P: Payload>: Send + Sync {
    fn name(&self) -> &'static str;

    fn merge(&self, previous: &State<P>, current: State<P>) -> Result<Merged<P>, DiffError>;

    fn render(&self, reaction: &str, merged: &Merged<P>) -> Output {
        merged.render(reaction)
    }
}

/// The current state always replaces the previous one, and every merge
/// notifies.
#[derive(Debug, Clone, Copy, Default)]
pub struct LastWins;

impl<P: Payload> DiffStrategy<P> for LastWins {
    fn name(&self) -> &'static str {
        "last-wins"
    }

    fn merge(&self, _previous: &State<P>, current: State<P>) -> Result<Merged<P>, DiffError> {
        Ok(Merged::new(current, true))
    }
}

/// Notifies when the current payload differs structurally from the previous
/// one. A missing or failed previous state counts as different.
#[derive(Debug, Clone, Copy, Default)]
pub struct Changed;

impl<P: Payload> DiffStrategy<P> for Changed {
    fn name(&self) -> &'static str {
        "changed"
    }

    fn merge(&self, previous: &State<P>, current: State<P>) -> Result<Merged<P>, DiffError> {
        let payload = match current {
            State::Success { payload } => payload,
            failed => return Ok(Merged::new(failed, false)),
        };
        let changed = match previous {
            State::Success { payload: previous } => *previous != payload,
            State::Failure { .. } => true,
        };
        let merged = Merged::new(State::success(payload.clone()), changed);
        Ok(if changed {
            merged.with_fresh(payload)
        } else {
            merged
        })
    }
}

/// Outcome of an append-only merge of two listings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Appended<T> {
    /// Previous entries followed by the fresh ones.
    pub merged: T,
    /// Entries of the current listing not seen before, in listing order.
    pub fresh: T,
    pub fresh_count: usize,
}

/// Appends every entry of `current` that does not occur anywhere in
/// `previous` (compared by value). Previous entries are never removed or
/// reordered, and an entry is added at most once.
pub fn append_new<T: PartialEq + Clone>(previous: &[T], current: &[T]) -> Appended<Vec<T>> {
    let mut merged = previous.to_vec();
    let mut fresh = Vec::new();
    for item in current {
        if !merged.contains(item) {
            merged.push(item.clone());
            fresh.push(item.clone());
        }
    }
    let fresh_count = fresh.len();
    Appended {
        merged,
        fresh,
        fresh_count,
    }
}

/// Payloads that are ordered listings and can be merged append-only.
pub trait AppendMerge: Sized {
    /// Merges `current` into `previous`; `None` means there is no previous
    /// listing yet.
    fn append_merge(previous: Option<&Self>, current: &Self) -> Result<Appended<Self>, DiffError>;
}

impl<T: PartialEq + Clone> AppendMerge for Vec<T> {
    fn append_merge(previous: Option<&Self>, current: &Self) -> Result<Appended<Self>, DiffError> {
        Ok(append_new(previous.map(Vec::as_slice).unwrap_or(&[]), current))
    }
}

/// Keeps every entry ever seen and notifies when the current listing holds
/// entries that were not seen before.
///
/// Tolerates upstream listings that temporarily omit known entries.
#[derive(Debug, Clone, Copy, Default)]
pub struct AppendOnly;

impl<P: Payload + AppendMerge> DiffStrategy<P> for AppendOnly {
    fn name(&self) -> &'static str {
        "append-only"
    }

    fn merge(&self, previous: &State<P>, current: State<P>) -> Result<Merged<P>, DiffError> {
        let payload = match current {
            State::Success { payload } => payload,
            failed => return Ok(Merged::new(failed, false)),
        };
        let previous = match previous {
            State::Success { payload } => Some(payload),
            State::Failure { .. } => None,
        };
        let appended = P::append_merge(previous, &payload)?;
        let notify = appended.fresh_count > 0;
        let merged = Merged::new(State::success(appended.merged), notify);
        Ok(if notify {
            merged.with_fresh(appended.fresh)
        } else {
            merged
        })
    }
}
