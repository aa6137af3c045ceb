use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PersistError {
    #[error("directory {path} missing or not writable: {message}")]
    Directory { path: PathBuf, message: String },
    #[error("io error: {0}")]
    Io(#[from] io::Error),
}

/// Creates `dir` if needed and checks that files can be created in it.
pub fn ensure_output_dir(dir: &Path) -> Result<(), PersistError> {
    let unusable = |message: String| PersistError::Directory {
        path: dir.to_path_buf(),
        message,
    };
    if dir.exists() {
        let meta = fs::metadata(dir).map_err(|e| unusable(e.to_string()))?;
        if !meta.is_dir() {
            return Err(unusable("path is not a directory".into()));
        }
    } else {
        fs::create_dir_all(dir).map_err(|e| unusable(e.to_string()))?;
    }
    NamedTempFile::new_in(dir).map_err(|e| unusable(e.to_string()))?;
    Ok(())
}

/// Writes whole files inside one directory so that readers see either the
/// old or the new content, never a partial file.
#[derive(Debug, Clone)]
pub struct AtomicFileWriter {
    dir: PathBuf,
}

impl AtomicFileWriter {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Writes `{dir}/{filename}` through a synced temp file in the same
    /// directory, replacing any existing file.
    pub fn write(&self, filename: &str, content: &[u8]) -> Result<PathBuf, PersistError> {
        ensure_output_dir(&self.dir)?;

        let target = self.dir.join(filename);
        let mut tmp = NamedTempFile::new_in(&self.dir)?;
        tmp.write_all(content)?;
        tmp.flush()?;
        tmp.as_file_mut().sync_all()?;
        tmp.persist(&target).map_err(|e| PersistError::Io(e.error))?;
        Ok(target)
    }

    /// Like [`write`](Self::write), but leaves an existing file alone and
    /// returns `None` instead.
    pub fn write_new(
        &self,
        filename: &str,
        content: &[u8],
    ) -> Result<Option<PathBuf>, PersistError> {
        ensure_output_dir(&self.dir)?;

        let target = self.dir.join(filename);
        let mut tmp = NamedTempFile::new_in(&self.dir)?;
        tmp.write_all(content)?;
        tmp.flush()?;
        tmp.as_file_mut().sync_all()?;
        match tmp.persist_noclobber(&target) {
            Ok(_) => Ok(Some(target)),
            Err(err) if err.error.kind() == io::ErrorKind::AlreadyExists => Ok(None),
            Err(err) => Err(PersistError::Io(err.error)),
        }
    }

    /// Reads `{dir}/{filename}`; a missing file is `None`.
    pub fn read(&self, filename: &str) -> Result<Option<Vec<u8>>, PersistError> {
        match fs::read(self.dir.join(filename)) {
            Ok(bytes) => Ok(Some(bytes)),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(err) => Err(err.into()),
        }
    }
}
