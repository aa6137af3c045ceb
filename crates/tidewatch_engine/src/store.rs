use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::{Mutex, PoisonError};

use chrono::{DateTime, Utc};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use sha2::{Digest, Sha256};
use thiserror::Error;
use tidewatch_core::{Payload, State};

use crate::{AtomicFileWriter, PersistError};

#[derive(Debug, Error)]
pub enum StoreError {
    #[error(transparent)]
    Persist(#[from] PersistError),
    #[error("state file {file} is not valid: {source}")]
    Corrupt {
        file: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("state for {reaction} cannot be serialized: {source}")]
    Serialize {
        reaction: String,
        #[source]
        source: serde_json::Error,
    },
}

/// A reaction state as persisted between cycles.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredState<P> {
    pub updated_at: DateTime<Utc>,
    /// Consecutive failed cycles up to and including this state.
    #[serde(default)]
    pub fail_count: u32,
    pub state: State<P>,
}

impl<P> StoredState<P> {
    pub fn new(state: State<P>, updated_at: DateTime<Utc>, fail_count: u32) -> Self {
        Self {
            updated_at,
            fail_count,
            state,
        }
    }
}

/// Persistence of reaction states, keyed by reaction name.
///
/// `save` always replaces the last state; it replaces the last successful
/// state only when the saved state is a success.
pub trait StateStore<P: Payload>: Send + Sync {
    fn load_last(&self, reaction: &str) -> Result<Option<StoredState<P>>, StoreError>;

    fn load_last_success(&self, reaction: &str) -> Result<Option<StoredState<P>>, StoreError>;

    fn save(&self, reaction: &str, stored: &StoredState<P>) -> Result<(), StoreError>;
}

/// File-system-safe key for a reaction name: `{sanitized}--{short_hash}`.
///
/// The hash keeps names that sanitize to the same text apart.
pub fn state_key(reaction: &str) -> String {
    format!("{}--{}", sanitize(reaction), short_hash(reaction))
}

fn sanitize(input: &str) -> String {
    let mut compacted = String::with_capacity(input.len());
    let mut previous_underscore = false;
    for c in input.chars() {
        let c = if c.is_alphanumeric() || matches!(c, '-' | '.') {
            c
        } else {
            '_'
        };
        if c == '_' && previous_underscore {
            continue;
        }
        previous_underscore = c == '_';
        compacted.push(c);
    }
    let mut cleaned: String = compacted
        .trim_matches(&['_', '.'][..])
        .chars()
        .take(60)
        .collect();
    if cleaned.is_empty() {
        cleaned = "reaction".to_string();
    }
    cleaned
}

fn short_hash(input: &str) -> String {
    use std::fmt::Write;

    let digest = Sha256::digest(input.as_bytes());
    let mut hex = String::with_capacity(8);
    for byte in digest.iter().take(4) {
        let _ = write!(&mut hex, "{byte:02x}");
    }
    hex
}

/// Stores each reaction as `{key}.last.json` and `{key}.success.json` in one
/// directory.
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    writer: AtomicFileWriter,
}

impl JsonFileStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            writer: AtomicFileWriter::new(dir),
        }
    }

    fn load<P: DeserializeOwned>(&self, file: &str) -> Result<Option<StoredState<P>>, StoreError> {
        let Some(bytes) = self.writer.read(file)? else {
            return Ok(None);
        };
        serde_json::from_slice(&bytes)
            .map(Some)
            .map_err(|source| StoreError::Corrupt {
                file: file.to_string(),
                source,
            })
    }
}

impl<P> StateStore<P> for JsonFileStore
where
    P: Payload + Serialize + DeserializeOwned,
{
    fn load_last(&self, reaction: &str) -> Result<Option<StoredState<P>>, StoreError> {
        self.load(&format!("{}.last.json", state_key(reaction)))
    }

    fn load_last_success(&self, reaction: &str) -> Result<Option<StoredState<P>>, StoreError> {
        self.load(&format!("{}.success.json", state_key(reaction)))
    }

    fn save(&self, reaction: &str, stored: &StoredState<P>) -> Result<(), StoreError> {
        let json = serde_json::to_vec_pretty(stored).map_err(|source| StoreError::Serialize {
            reaction: reaction.to_string(),
            source,
        })?;
        let key = state_key(reaction);
        self.writer.write(&format!("{key}.last.json"), &json)?;
        if stored.state.is_success() {
            self.writer.write(&format!("{key}.success.json"), &json)?;
        }
        Ok(())
    }
}

#[derive(Debug)]
struct Slots<P> {
    last: Option<StoredState<P>>,
    success: Option<StoredState<P>>,
}

/// In-memory store, mainly for tests and dry runs.
#[derive(Debug)]
pub struct MemoryStore<P> {
    slots: Mutex<HashMap<String, Slots<P>>>,
}

impl<P> Default for MemoryStore<P> {
    fn default() -> Self {
        Self {
            slots: Mutex::new(HashMap::new()),
        }
    }
}

impl<P: Payload> MemoryStore<P> {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(
        &self,
        reaction: &str,
        pick: fn(&Slots<P>) -> &Option<StoredState<P>>,
    ) -> Option<StoredState<P>> {
        let slots = self.slots.lock().unwrap_or_else(PoisonError::into_inner);
        slots.get(reaction).and_then(|slot| pick(slot).clone())
    }
}

impl<P: Payload> StateStore<P> for MemoryStore<P> {
    fn load_last(&self, reaction: &str) -> Result<Option<StoredState<P>>, StoreError> {
        Ok(self.read(reaction, |slot| &slot.last))
    }

    fn load_last_success(&self, reaction: &str) -> Result<Option<StoredState<P>>, StoreError> {
        Ok(self.read(reaction, |slot| &slot.success))
    }

    fn save(&self, reaction: &str, stored: &StoredState<P>) -> Result<(), StoreError> {
        let mut slots = self.slots.lock().unwrap_or_else(PoisonError::into_inner);
        let slot = slots.entry(reaction.to_string()).or_insert(Slots {
            last: None,
            success: None,
        });
        slot.last = Some(stored.clone());
        if stored.state.is_success() {
            slot.success = Some(stored.clone());
        }
        Ok(())
    }
}
