use std::io::Write;
use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use chrono::Utc;
use thiserror::Error;
use tidewatch_core::{Output, TEXT_PLAIN};
use tidewatch_logging::watch_info;

use crate::{AtomicFileWriter, PersistError};

#[derive(Debug, Error)]
pub enum ActionError {
    #[error("cannot write notification: {0}")]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Persist(#[from] PersistError),
    #[error("notification file {0} already exists")]
    Exists(PathBuf),
}

/// Delivers a rendered notification. Delivery is attempted once.
pub trait Action: Send + Sync {
    fn execute(&self, output: &Output) -> Result<(), ActionError>;
}

/// Prints the summary and the plain-text body to standard output.
#[derive(Debug, Default, Clone)]
pub struct StdoutAction;

impl Action for StdoutAction {
    fn execute(&self, output: &Output) -> Result<(), ActionError> {
        let mut stdout = std::io::stdout().lock();
        writeln!(stdout, "== {} ==", output.summary())?;
        if let Some(text) = output.text(TEXT_PLAIN) {
            writeln!(stdout, "{}", text.trim_end())?;
        }
        stdout.flush()?;
        Ok(())
    }
}

/// Logs the summary at info level.
#[derive(Debug, Default, Clone)]
pub struct LogAction;

impl Action for LogAction {
    fn execute(&self, output: &Output) -> Result<(), ActionError> {
        watch_info!("notification: {}", output.summary());
        Ok(())
    }
}

/// Writes every body of a notification to
/// `{dir}/{timestamp}-{sequence}-{name}.{extension}`.
///
/// Existing files are never replaced. The sequence number keeps
/// notifications delivered within the same millisecond apart, and a name
/// that is already taken moves on to the next number.
#[derive(Debug, Clone)]
pub struct DirectoryAction {
    name: String,
    writer: AtomicFileWriter,
    sequence: Arc<AtomicU64>,
}

const MAX_NAME_ATTEMPTS: usize = 64;

impl DirectoryAction {
    pub fn new(dir: impl Into<PathBuf>, name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            writer: AtomicFileWriter::new(dir),
            sequence: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Writes all bodies under `stem`. Returns `false` without writing
    /// anything when the first file name is taken.
    fn write_bodies(&self, stem: &str, output: &Output) -> Result<bool, ActionError> {
        for (index, (content_type, body)) in output.bodies().enumerate() {
            let filename = format!("{stem}.{}", extension(content_type));
            match self.writer.write_new(&filename, body.as_bytes())? {
                Some(path) => watch_info!("wrote {} ({content_type})", path.display()),
                None if index == 0 => return Ok(false),
                None => return Err(ActionError::Exists(self.writer.dir().join(filename))),
            }
        }
        Ok(true)
    }
}

fn extension(content_type: &str) -> &str {
    match content_type {
        "text/plain" => "txt",
        "text/html" => "html",
        "application/json" => "json",
        _ => "bin",
    }
}

impl Action for DirectoryAction {
    fn execute(&self, output: &Output) -> Result<(), ActionError> {
        let stamp = Utc::now().format("%Y%m%dT%H%M%S%.3fZ");
        let key = crate::state_key(&self.name);
        for _ in 0..MAX_NAME_ATTEMPTS {
            let sequence = self.sequence.fetch_add(1, Ordering::Relaxed);
            let stem = format!("{stamp}-{sequence:04}-{key}");
            if self.write_bodies(&stem, output)? {
                return Ok(());
            }
        }
        Err(ActionError::Exists(
            self.writer.dir().join(format!("{stamp}-*-{key}")),
        ))
    }
}
