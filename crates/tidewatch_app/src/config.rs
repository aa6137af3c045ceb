//! RON configuration file: state directory, HTTP settings and reactions.

use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use tidewatch_engine::FetchSettings;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Directory holding the persisted reaction states.
    pub state_dir: PathBuf,
    /// Receives failure reports and empty-state warnings.
    #[serde(default)]
    pub error_action: Option<ActionSpec>,
    #[serde(default)]
    pub http: HttpConfig,
    pub reactions: Vec<ReactionConfig>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HttpConfig {
    pub connect_timeout_secs: u64,
    pub request_timeout_secs: u64,
    pub redirect_limit: usize,
    pub max_bytes: u64,
}

impl Default for HttpConfig {
    fn default() -> Self {
        let defaults = FetchSettings::default();
        Self {
            connect_timeout_secs: defaults.connect_timeout.as_secs(),
            request_timeout_secs: defaults.request_timeout.as_secs(),
            redirect_limit: defaults.redirect_limit,
            max_bytes: defaults.max_bytes,
        }
    }
}

impl HttpConfig {
    pub fn fetch_settings(&self) -> FetchSettings {
        FetchSettings {
            connect_timeout: Duration::from_secs(self.connect_timeout_secs),
            request_timeout: Duration::from_secs(self.request_timeout_secs),
            redirect_limit: self.redirect_limit,
            max_bytes: self.max_bytes,
            ..FetchSettings::default()
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReactionConfig {
    pub name: String,
    pub interval_secs: u64,
    pub query: QuerySpec,
    #[serde(default)]
    pub filters: Vec<FilterSpec>,
    pub diff: DiffSpec,
    pub action: ActionSpec,
}

impl ReactionConfig {
    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_secs)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum QuerySpec {
    Http { url: String },
    File { path: PathBuf },
    /// Children are tried in order until one succeeds.
    Fallback(Vec<QuerySpec>),
    /// Fetches the URL the `extract` filters pull out of the source state.
    Follow {
        source: Box<QuerySpec>,
        extract: Vec<FilterSpec>,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum FilterSpec {
    Html,
    ComicSite {
        #[serde(default)]
        title: Option<String>,
        image: String,
        #[serde(default)]
        comment_attribute: Option<String>,
    },
    TorrentSite {
        row: String,
        name: String,
        size: String,
        #[serde(default)]
        magnet: Option<String>,
        #[serde(default)]
        download: Option<String>,
        #[serde(default)]
        seeds: Option<String>,
        #[serde(default)]
        leechers: Option<String>,
        #[serde(default)]
        files: Option<String>,
    },
    ExtractUrl {
        selector: String,
        #[serde(default)]
        attribute: Option<String>,
    },
    /// Groups torrents by `S01E02` and `1x02` markers.
    Episodes,
    /// Groups torrents by custom patterns capturing season and episode.
    EpisodePatterns(Vec<String>),
    Blacklist(Vec<String>),
    SizeBlacklist(Vec<String>),
    WeatherJson {
        #[serde(default)]
        service: Option<String>,
        #[serde(default)]
        max_hours: Option<usize>,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DiffSpec {
    LastWins,
    Changed,
    AppendOnly,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ActionSpec {
    Stdout,
    Log,
    Directory { dir: PathBuf },
}

impl Config {
    pub fn load(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path)
            .with_context(|| format!("cannot read config file {}", path.display()))?;
        Self::parse(&text).with_context(|| format!("invalid config file {}", path.display()))
    }

    pub fn parse(text: &str) -> Result<Self> {
        let config: Config = ron::from_str(text)?;
        config.check()?;
        Ok(config)
    }

    /// Structural checks that need no reaction to be built: names present
    /// and unique, intervals non-zero, fallbacks non-empty.
    fn check(&self) -> Result<()> {
        let mut problems = Vec::new();
        let mut seen = HashSet::new();
        for reaction in &self.reactions {
            if reaction.name.trim().is_empty() {
                problems.push("reaction with empty name".to_string());
            } else if !seen.insert(reaction.name.as_str()) {
                problems.push(format!("duplicate reaction name '{}'", reaction.name));
            }
            if reaction.interval_secs == 0 {
                problems.push(format!("reaction '{}' has a zero interval", reaction.name));
            }
            if has_empty_fallback(&reaction.query) {
                problems.push(format!("reaction '{}' has an empty fallback", reaction.name));
            }
        }
        if problems.is_empty() {
            Ok(())
        } else {
            bail!(problems.join("; "))
        }
    }

    pub fn reaction(&self, name: &str) -> Option<&ReactionConfig> {
        self.reactions.iter().find(|reaction| reaction.name == name)
    }
}

fn has_empty_fallback(query: &QuerySpec) -> bool {
    match query {
        QuerySpec::Fallback(children) => {
            children.is_empty() || children.iter().any(has_empty_fallback)
        }
        QuerySpec::Follow { source, .. } => has_empty_fallback(source),
        QuerySpec::Http { .. } | QuerySpec::File { .. } => false,
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    const SAMPLE: &str = r#"(
        state_dir: "state",
        error_action: Some(Log),
        http: (request_timeout_secs: 5),
        reactions: [
            (
                name: "daily comic",
                interval_secs: 3600,
                query: Fallback([
                    Http(url: "https://comics.example/"),
                    Http(url: "https://mirror.comics.example/"),
                ]),
                filters: [
                    Html,
                    ComicSite(title: Some("h1"), image: "div#comic img", comment_attribute: Some("title")),
                ],
                diff: AppendOnly,
                action: Directory(dir: "out"),
            ),
            (
                name: "report",
                interval_secs: 60,
                query: File(path: "report.txt"),
                diff: Changed,
                action: Stdout,
            ),
        ],
    )"#;

    #[test]
    fn parses_sample_config() {
        let config = Config::parse(SAMPLE).unwrap();

        assert_eq!(config.state_dir, PathBuf::from("state"));
        assert_eq!(config.error_action, Some(ActionSpec::Log));
        assert_eq!(config.http.request_timeout_secs, 5);
        assert_eq!(config.http.redirect_limit, 5);
        assert_eq!(config.reactions.len(), 2);
        let comic = config.reaction("daily comic").unwrap();
        assert_eq!(comic.diff, DiffSpec::AppendOnly);
        assert_eq!(comic.filters.len(), 2);
        assert_eq!(comic.interval(), Duration::from_secs(3600));
        assert!(config.reaction("report").unwrap().filters.is_empty());
    }

    #[test]
    fn rejects_duplicate_names_and_zero_intervals() {
        let text = r#"(
            state_dir: "s",
            reactions: [
                (name: "a", interval_secs: 0, query: File(path: "x"), diff: Changed, action: Log),
                (name: "a", interval_secs: 10, query: Fallback([]), diff: Changed, action: Log),
            ],
        )"#;

        let err = Config::parse(text).unwrap_err().to_string();

        assert!(err.contains("zero interval"), "{err}");
        assert!(err.contains("duplicate reaction name 'a'"), "{err}");
        assert!(err.contains("empty fallback"), "{err}");
    }

    #[test]
    fn parses_followed_episode_listing() {
        let text = r#"(
            state_dir: "s",
            reactions: [
                (
                    name: "show",
                    interval_secs: 900,
                    query: Follow(
                        source: Http(url: "https://tracker.example/shows"),
                        extract: [Html, ExtractUrl(selector: "a.show")],
                    ),
                    filters: [Html, Episodes, EpisodePatterns(["(\\d+)\\.(\\d+)"])],
                    diff: AppendOnly,
                    action: Log,
                ),
                (
                    name: "broken",
                    interval_secs: 900,
                    query: Follow(source: Fallback([]), extract: []),
                    diff: AppendOnly,
                    action: Log,
                ),
            ],
        )"#;

        let err = Config::parse(text).unwrap_err().to_string();
        assert_eq!(err, "reaction 'broken' has an empty fallback");

        let config = Config::parse(&text.replace("Fallback([])", "File(path: \"x\")")).unwrap();
        let show = config.reaction("show").unwrap();
        assert_eq!(
            show.query,
            QuerySpec::Follow {
                source: Box::new(QuerySpec::Http {
                    url: "https://tracker.example/shows".into()
                }),
                extract: vec![
                    FilterSpec::Html,
                    FilterSpec::ExtractUrl {
                        selector: "a.show".into(),
                        attribute: None,
                    },
                ],
            }
        );
        assert_eq!(
            show.filters[2],
            FilterSpec::EpisodePatterns(vec![r"(\d+)\.(\d+)".into()])
        );
    }

    #[test]
    fn loads_from_file() {
        let temp = tempfile::TempDir::new().unwrap();
        let path = temp.path().join("tidewatch.ron");
        fs::write(&path, SAMPLE).unwrap();

        let config = Config::load(&path).unwrap();
        assert_eq!(config.reactions[0].name, "daily comic");

        let missing = Config::load(&temp.path().join("missing.ron")).unwrap_err();
        assert!(missing.to_string().starts_with("cannot read config file"));
    }
}
