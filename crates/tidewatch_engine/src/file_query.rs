use std::io::ErrorKind;
use std::path::PathBuf;

use chrono::{DateTime, Utc};
use tidewatch_core::State;

use crate::{Content, FileStatus, Query};

/// Reports existence, readability, size and modification time of a local
/// file.
///
/// A missing file is a successful observation; other IO errors are failures.
#[derive(Debug, Clone)]
pub struct FileQuery {
    path: PathBuf,
}

impl FileQuery {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait::async_trait]
impl Query<Content> for FileQuery {
    fn describe(&self) -> String {
        format!("file {}", self.path.display())
    }

    async fn fetch(&self) -> State<Content> {
        let path = self.path.display().to_string();
        let metadata = match tokio::fs::metadata(&self.path).await {
            Ok(metadata) => metadata,
            Err(err) if err.kind() == ErrorKind::NotFound => {
                return State::success(Content::File(FileStatus {
                    path,
                    exists: false,
                    readable: false,
                    size: None,
                    modified: None,
                }));
            }
            Err(err) => return State::failure(format!("cannot stat {path}: {err}")),
        };
        let readable = tokio::fs::File::open(&self.path).await.is_ok();
        State::success(Content::File(FileStatus {
            path,
            exists: true,
            readable,
            size: Some(metadata.len()),
            modified: metadata.modified().ok().map(DateTime::<Utc>::from),
        }))
    }
}
