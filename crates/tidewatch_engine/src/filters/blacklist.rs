use std::collections::HashSet;

use tidewatch_core::{Filter, State};

use crate::Content;

/// Drops torrents whose name contains one of the given words, ignoring case.
#[derive(Debug, Clone)]
pub struct BlacklistFilter {
    words: Vec<String>,
}

impl BlacklistFilter {
    pub fn new<I, S>(words: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            words: words
                .into_iter()
                .map(|word| word.as_ref().to_lowercase())
                .filter(|word| !word.is_empty())
                .collect(),
        }
    }

    fn is_blacklisted(&self, name: &str) -> bool {
        let name = name.to_lowercase();
        self.words.iter().any(|word| name.contains(word.as_str()))
    }
}

impl Filter<Content> for BlacklistFilter {
    fn name(&self) -> &str {
        "blacklist"
    }

    fn apply(&self, state: State<Content>) -> State<Content> {
        state.and_then(|content| match content {
            Content::Torrents(torrents) => State::success(Content::Torrents(
                torrents
                    .into_iter()
                    .filter(|torrent| !self.is_blacklisted(&torrent.name))
                    .collect(),
            )),
            other => State::failure(other.mismatch("torrents")),
        })
    }
}

/// Drops torrents whose size label is exactly one of the given labels.
///
/// Labels are compared verbatim, so `123 MB` and `123 MiB` are different.
#[derive(Debug, Clone)]
pub struct SizeBlacklistFilter {
    sizes: HashSet<String>,
}

impl SizeBlacklistFilter {
    pub fn new<I, S>(sizes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            sizes: sizes.into_iter().map(Into::into).collect(),
        }
    }
}

impl Filter<Content> for SizeBlacklistFilter {
    fn name(&self) -> &str {
        "size-blacklist"
    }

    fn apply(&self, state: State<Content>) -> State<Content> {
        state.and_then(|content| match content {
            Content::Torrents(torrents) => State::success(Content::Torrents(
                torrents
                    .into_iter()
                    .filter(|torrent| !self.sizes.contains(&torrent.size))
                    .collect(),
            )),
            other => State::failure(other.mismatch("torrents")),
        })
    }
}
