use std::fmt;

use thiserror::Error;

/// Steps of one reaction cycle, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Fetching,
    Filtering,
    Diffing,
    Notifying,
    Persisting,
    Done,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Stage::Fetching => "fetching",
            Stage::Filtering => "filtering",
            Stage::Diffing => "diffing",
            Stage::Notifying => "notifying",
            Stage::Persisting => "persisting",
            Stage::Done => "done",
        };
        f.write_str(label)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CycleOutcome {
    /// The diff strategy asked for a notification and the action ran.
    Notified,
    /// The diff strategy asked for a notification but the action failed.
    ActionFailed { message: String },
    /// Nothing noteworthy changed.
    Unchanged,
    /// Fetching or filtering produced a failure state.
    Failed { cause: Option<String> },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CycleReport {
    pub reaction: String,
    pub outcome: CycleOutcome,
    /// Consecutive failed cycles, including this one.
    pub fail_count: u32,
}

impl CycleReport {
    pub fn notified(&self) -> bool {
        matches!(
            self.outcome,
            CycleOutcome::Notified | CycleOutcome::ActionFailed { .. }
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{kind}: {message}")]
pub struct FetchError {
    pub kind: FailureKind,
    pub message: String,
}

impl FetchError {
    pub(crate) fn new(kind: FailureKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FailureKind {
    HttpStatus(u16),
    Timeout,
    RedirectLimitExceeded,
    TooLarge { max_bytes: u64, actual: Option<u64> },
    Decode,
    Network,
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailureKind::HttpStatus(code) => write!(f, "http status {code}"),
            FailureKind::Timeout => write!(f, "timeout"),
            FailureKind::RedirectLimitExceeded => write!(f, "redirect limit exceeded"),
            FailureKind::TooLarge { max_bytes, actual } => {
                write!(f, "response too large (max {max_bytes}, actual {actual:?})")
            }
            FailureKind::Decode => write!(f, "undecodable body"),
            FailureKind::Network => write!(f, "network error"),
        }
    }
}
