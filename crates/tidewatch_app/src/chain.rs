//! Turns configuration entries into runnable reactions.

use std::sync::Arc;

use tidewatch_core::{AppendOnly, Changed, DiffStrategy, Filter, FilterChain, LastWins};
use tidewatch_engine::{
    Action, BlacklistFilter, ComicSiteFilter, ConfigurationError, Content, DirectoryAction,
    EpisodeFilter, ExtractUrlFilter, FallbackQuery, FetchSettings, FileQuery, FollowQuery,
    HtmlFilter, HttpQuery, LogAction, Query, Reaction, SizeBlacklistFilter, StdoutAction,
    TorrentSelectors, TorrentSiteFilter, WeatherJsonFilter,
};

use crate::config::{ActionSpec, DiffSpec, FilterSpec, QuerySpec, ReactionConfig};

pub fn build_reaction(
    spec: &ReactionConfig,
    fetch: &FetchSettings,
) -> Result<Reaction<Content>, ConfigurationError> {
    Ok(Reaction::new(
        spec.name.clone(),
        build_query(&spec.query, fetch)?,
        build_chain(&spec.filters)?,
        build_diff(spec.diff),
        build_action(&spec.action, &spec.name),
        spec.interval(),
    ))
}

fn build_query(
    spec: &QuerySpec,
    fetch: &FetchSettings,
) -> Result<Arc<dyn Query<Content>>, ConfigurationError> {
    let query: Arc<dyn Query<Content>> = match spec {
        QuerySpec::Http { url } => Arc::new(HttpQuery::new(url, fetch.clone())?),
        QuerySpec::File { path } => Arc::new(FileQuery::new(path.clone())),
        QuerySpec::Fallback(children) => {
            let children = children
                .iter()
                .map(|child| build_query(child, fetch))
                .collect::<Result<Vec<_>, _>>()?;
            Arc::new(FallbackQuery::new(children)?)
        }
        QuerySpec::Follow { source, extract } => Arc::new(FollowQuery::new(
            build_query(source, fetch)?,
            build_chain(extract)?,
            fetch.clone(),
        )?),
    };
    Ok(query)
}

fn build_chain(specs: &[FilterSpec]) -> Result<FilterChain<Content>, ConfigurationError> {
    specs.iter().map(build_filter).collect()
}

fn build_filter(spec: &FilterSpec) -> Result<Arc<dyn Filter<Content>>, ConfigurationError> {
    let filter: Arc<dyn Filter<Content>> = match spec {
        FilterSpec::Html => Arc::new(HtmlFilter::new()),
        FilterSpec::ComicSite {
            title,
            image,
            comment_attribute,
        } => {
            let filter = ComicSiteFilter::new(title.as_deref(), image)?;
            match comment_attribute {
                Some(attribute) => Arc::new(filter.with_comment_attribute(attribute.clone())),
                None => Arc::new(filter),
            }
        }
        FilterSpec::TorrentSite {
            row,
            name,
            size,
            magnet,
            download,
            seeds,
            leechers,
            files,
        } => Arc::new(TorrentSiteFilter::new(TorrentSelectors {
            row,
            name,
            size,
            magnet: magnet.as_deref(),
            download: download.as_deref(),
            seeds: seeds.as_deref(),
            leechers: leechers.as_deref(),
            files: files.as_deref(),
        })?),
        FilterSpec::ExtractUrl {
            selector,
            attribute,
        } => {
            let filter = ExtractUrlFilter::new(selector)?;
            match attribute {
                Some(attribute) => Arc::new(filter.with_attribute(attribute.clone())),
                None => Arc::new(filter),
            }
        }
        FilterSpec::Episodes => Arc::new(EpisodeFilter::new()?),
        FilterSpec::EpisodePatterns(patterns) => {
            Arc::new(EpisodeFilter::with_patterns(patterns.as_slice())?)
        }
        FilterSpec::Blacklist(words) => Arc::new(BlacklistFilter::new(words)),
        FilterSpec::SizeBlacklist(sizes) => Arc::new(SizeBlacklistFilter::new(sizes.clone())),
        FilterSpec::WeatherJson { service, max_hours } => {
            let mut filter = WeatherJsonFilter::new();
            if let Some(service) = service {
                filter = filter.with_service(service.clone());
            }
            if let Some(max_hours) = max_hours {
                filter = filter.with_max_hours(*max_hours);
            }
            Arc::new(filter)
        }
    };
    Ok(filter)
}

fn build_diff(spec: DiffSpec) -> Arc<dyn DiffStrategy<Content>> {
    match spec {
        DiffSpec::LastWins => Arc::new(LastWins),
        DiffSpec::Changed => Arc::new(Changed),
        DiffSpec::AppendOnly => Arc::new(AppendOnly),
    }
}

pub fn build_action(spec: &ActionSpec, name: &str) -> Arc<dyn Action> {
    match spec {
        ActionSpec::Stdout => Arc::new(StdoutAction),
        ActionSpec::Log => Arc::new(LogAction),
        ActionSpec::Directory { dir } => Arc::new(DirectoryAction::new(dir.clone(), name)),
    }
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use pretty_assertions::assert_eq;

    use super::*;

    fn spec(query: QuerySpec, filters: Vec<FilterSpec>) -> ReactionConfig {
        ReactionConfig {
            name: "torrents".to_string(),
            interval_secs: 600,
            query,
            filters,
            diff: DiffSpec::AppendOnly,
            action: ActionSpec::Log,
        }
    }

    #[test]
    fn builds_reaction_with_filters_in_order() {
        let reaction = build_reaction(
            &spec(
                QuerySpec::Fallback(vec![
                    QuerySpec::Http {
                        url: "https://tracker.example/search?q=show".into(),
                    },
                    QuerySpec::File {
                        path: PathBuf::from("listing.html"),
                    },
                ]),
                vec![
                    FilterSpec::Html,
                    FilterSpec::TorrentSite {
                        row: "tr".into(),
                        name: "td.name".into(),
                        size: "td.size".into(),
                        magnet: Some("a[href^=magnet]".into()),
                        download: None,
                        seeds: None,
                        leechers: None,
                        files: None,
                    },
                    FilterSpec::SizeBlacklist(vec!["313.97 MiB".into()]),
                ],
            ),
            &FetchSettings::default(),
        )
        .unwrap();

        assert_eq!(reaction.name(), "torrents");
        assert_eq!(reaction.diff().name(), "append-only");
        let names: Vec<&str> = reaction.filters().iter().map(|f| f.name()).collect();
        assert_eq!(names, vec!["html", "torrent-site", "size-blacklist"]);
        assert!(reaction.query().describe().starts_with("fallback[GET https://tracker.example/"));
    }

    #[test]
    fn builds_followed_episode_reaction() {
        let reaction = build_reaction(
            &spec(
                QuerySpec::Follow {
                    source: Box::new(QuerySpec::Http {
                        url: "https://tracker.example/shows".into(),
                    }),
                    extract: vec![
                        FilterSpec::Html,
                        FilterSpec::ExtractUrl {
                            selector: "a.show".into(),
                            attribute: None,
                        },
                    ],
                },
                vec![FilterSpec::Html, FilterSpec::Episodes],
            ),
            &FetchSettings::default(),
        )
        .unwrap();

        assert_eq!(
            reaction.query().describe(),
            "follow[GET https://tracker.example/shows via [\"html\", \"extract-url\"]]"
        );
        let names: Vec<&str> = reaction.filters().iter().map(|f| f.name()).collect();
        assert_eq!(names, vec!["html", "episodes"]);

        let bad_pattern = build_reaction(
            &spec(
                QuerySpec::File {
                    path: PathBuf::from("x"),
                },
                vec![FilterSpec::EpisodePatterns(vec!["(".into()])],
            ),
            &FetchSettings::default(),
        );
        assert!(matches!(
            bad_pattern,
            Err(ConfigurationError::InvalidPattern { .. })
        ));
    }

    #[test]
    fn bad_url_and_selector_fail_to_build() {
        let bad_url = build_reaction(
            &spec(QuerySpec::Http { url: "nope".into() }, Vec::new()),
            &FetchSettings::default(),
        );
        assert!(matches!(bad_url, Err(ConfigurationError::InvalidUrl { .. })));

        let bad_selector = build_reaction(
            &spec(
                QuerySpec::File {
                    path: PathBuf::from("x"),
                },
                vec![FilterSpec::ComicSite {
                    title: None,
                    image: "img[".into(),
                    comment_attribute: None,
                }],
            ),
            &FetchSettings::default(),
        );
        assert!(matches!(
            bad_selector,
            Err(ConfigurationError::InvalidSelector { .. })
        ));
    }
}
