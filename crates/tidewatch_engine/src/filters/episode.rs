use regex::Regex;
use tidewatch_core::{Filter, State};

use crate::{ConfigurationError, Content, Episode, TorrentFile};

/// `S01E02` and `1x02` style episode markers. The first capture group is the
/// season, the second the episode.
pub const DEFAULT_EPISODE_PATTERNS: [&str; 2] =
    [r"[Ss](\d{2})[Ee](\d{2})", r"[^\d](\d{1,2})x(\d{2})[^\d]"];

/// Groups a torrent listing by the episode named in each torrent's name.
///
/// Patterns are tried in order; a torrent none of them matches is dropped.
/// Episodes come out sorted by season and episode, their torrents in listing
/// order.
#[derive(Debug, Clone)]
pub struct EpisodeFilter {
    patterns: Vec<Regex>,
}

impl EpisodeFilter {
    pub fn new() -> Result<Self, ConfigurationError> {
        Self::with_patterns(&DEFAULT_EPISODE_PATTERNS)
    }

    /// Uses custom patterns, each capturing the season then the episode.
    pub fn with_patterns<S: AsRef<str>>(patterns: &[S]) -> Result<Self, ConfigurationError> {
        let patterns = patterns
            .iter()
            .map(|pattern| compile(pattern.as_ref()))
            .collect::<Result<_, _>>()?;
        Ok(Self { patterns })
    }

    fn episode_of(&self, name: &str) -> Option<(u32, u32)> {
        self.patterns.iter().find_map(|pattern| {
            let captures = pattern.captures(name)?;
            let season = captures.get(1)?.as_str().parse().ok()?;
            let episode = captures.get(2)?.as_str().parse().ok()?;
            Some((season, episode))
        })
    }

    fn group(&self, torrents: Vec<TorrentFile>) -> Vec<Episode> {
        let mut episodes: Vec<Episode> = Vec::new();
        for torrent in torrents {
            let Some((season, number)) = self.episode_of(&torrent.name) else {
                continue;
            };
            match episodes
                .iter_mut()
                .find(|episode| episode.season == season && episode.episode == number)
            {
                Some(episode) => episode.torrents.push(torrent),
                None => episodes.push(Episode::new(season, number, vec![torrent])),
            }
        }
        episodes.sort_by_key(|episode| (episode.season, episode.episode));
        episodes
    }
}

fn compile(pattern: &str) -> Result<Regex, ConfigurationError> {
    let regex = Regex::new(pattern).map_err(|err| ConfigurationError::InvalidPattern {
        pattern: pattern.to_string(),
        message: err.to_string(),
    })?;
    if regex.captures_len() < 3 {
        return Err(ConfigurationError::InvalidPattern {
            pattern: pattern.to_string(),
            message: "needs a season and an episode capture group".to_string(),
        });
    }
    Ok(regex)
}

impl Filter<Content> for EpisodeFilter {
    fn name(&self) -> &str {
        "episodes"
    }

    fn apply(&self, state: State<Content>) -> State<Content> {
        state.and_then(|content| match content {
            Content::Torrents(torrents) => State::success(Content::Episodes(self.group(torrents))),
            other => State::failure(other.mismatch("torrents")),
        })
    }
}
