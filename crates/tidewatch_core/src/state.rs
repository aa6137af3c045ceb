use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StateError {
    #[error("payload requested from a failed state (cause: {})", .cause.as_deref().unwrap_or("unknown"))]
    InvalidStateAccess { cause: Option<String> },
}

/// Outcome of a fetch or transformation step.
///
/// A `Failure` never carries a payload. Every step that receives a `Failure`
/// must hand a `Failure` on; [`State::map`] and [`State::and_then`] do that
/// automatically.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum State<P> {
    Success { payload: P },
    Failure { cause: Option<String> },
}

impl<P> State<P> {
    pub fn success(payload: P) -> Self {
        State::Success { payload }
    }

    pub fn failure(cause: impl Into<String>) -> Self {
        State::Failure {
            cause: Some(cause.into()),
        }
    }

    /// A failure whose cause is not known.
    pub fn unknown_failure() -> Self {
        State::Failure { cause: None }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, State::Success { .. })
    }

    pub fn payload(&self) -> Result<&P, StateError> {
        match self {
            State::Success { payload } => Ok(payload),
            State::Failure { cause } => Err(StateError::InvalidStateAccess {
                cause: cause.clone(),
            }),
        }
    }

    pub fn into_payload(self) -> Result<P, StateError> {
        match self {
            State::Success { payload } => Ok(payload),
            State::Failure { cause } => Err(StateError::InvalidStateAccess { cause }),
        }
    }

    /// Failure cause; `None` on success and on failures of unknown cause.
    pub fn cause(&self) -> Option<&str> {
        match self {
            State::Success { .. } => None,
            State::Failure { cause } => cause.as_deref(),
        }
    }

    pub fn map<Q>(self, f: impl FnOnce(P) -> Q) -> State<Q> {
        match self {
            State::Success { payload } => State::success(f(payload)),
            State::Failure { cause } => State::Failure { cause },
        }
    }

    pub fn and_then<Q>(self, f: impl FnOnce(P) -> State<Q>) -> State<Q> {
        match self {
            State::Success { payload } => f(payload),
            State::Failure { cause } => State::Failure { cause },
        }
    }
}

impl<P> From<Result<P, String>> for State<P> {
    fn from(result: Result<P, String>) -> Self {
        match result {
            Ok(payload) => State::success(payload),
            Err(cause) => State::failure(cause),
        }
    }
}
