//! Payload shapes produced by the shipped queries and filters.
mod comic;
mod episode;
mod torrent;
mod weather;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tidewatch_core::{
    append_new, escape_html, AppendMerge, Appended, DiffError, Output, Payload, TEXT_HTML,
    TEXT_PLAIN,
};

pub use comic::{Comic, Strip};
pub use episode::Episode;
pub use torrent::TorrentFile;
pub use weather::{HourForecast, WeatherSnapshot, WindDirection};

/// Raw response of an HTTP query, decoded to text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HttpDocument {
    /// Final URL after redirects.
    pub url: String,
    pub status: u16,
    pub content_type: Option<String>,
    pub encoding: String,
    pub body: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HtmlPage {
    pub url: String,
    pub title: Option<String>,
    pub html: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileStatus {
    pub path: String,
    pub exists: bool,
    pub readable: bool,
    pub size: Option<u64>,
    pub modified: Option<DateTime<Utc>>,
}

/// Every payload shape the shipped adapters understand.
///
/// Filters match on the variant they expect and turn anything else into a
/// failure naming both shapes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "data", rename_all = "snake_case")]
pub enum Content {
    Http(HttpDocument),
    Html(HtmlPage),
    Text(String),
    Torrents(Vec<TorrentFile>),
    Episodes(Vec<Episode>),
    Comics(Vec<Comic>),
    Weather(WeatherSnapshot),
    File(FileStatus),
}

impl Content {
    /// Failure cause for a filter handed a shape it does not process.
    pub(crate) fn mismatch(&self, expected: &str) -> String {
        format!("expected {expected}, got {}", self.kind())
    }
}

impl Payload for Content {
    fn kind(&self) -> &'static str {
        match self {
            Content::Http(_) => "http",
            Content::Html(_) => "html",
            Content::Text(_) => "text",
            Content::Torrents(_) => "torrents",
            Content::Episodes(_) => "episodes",
            Content::Comics(_) => "comics",
            Content::Weather(_) => "weather",
            Content::File(_) => "file",
        }
    }

    fn is_empty(&self) -> bool {
        match self {
            Content::Http(document) => document.body.trim().is_empty(),
            Content::Html(page) => page.html.trim().is_empty(),
            Content::Text(text) => text.trim().is_empty(),
            Content::Torrents(torrents) => torrents.is_empty(),
            Content::Episodes(episodes) => episodes.is_empty(),
            Content::Comics(comics) => comics.is_empty(),
            Content::Weather(snapshot) => snapshot.hours.is_empty(),
            Content::File(_) => false,
        }
    }

    fn summary(&self, reaction: &str) -> String {
        match self {
            Content::Torrents(torrents) => torrent::summary(reaction, torrents.len()),
            Content::Episodes(episodes) => episode::summary(reaction, episodes, episodes),
            Content::Comics(_) => comic::summary(reaction),
            Content::Weather(snapshot) => snapshot.summary(reaction),
            Content::File(status) => format!("{reaction}: {} changed", status.path),
            _ => format!("{reaction} changed"),
        }
    }

    fn plain_text(&self) -> String {
        match self {
            Content::Http(document) => document.body.clone(),
            Content::Html(page) => page.html.clone(),
            Content::Text(text) => text.clone(),
            Content::Torrents(torrents) => torrent::plain_text(torrents),
            Content::Episodes(episodes) => episode::plain_text(episodes, &[]),
            Content::Comics(comics) => comic::plain_text(comics),
            Content::Weather(snapshot) => snapshot.plain_text(),
            Content::File(status) => file_text(status),
        }
    }

    fn html_text(&self) -> String {
        match self {
            Content::Html(page) => page.html.clone(),
            Content::Torrents(torrents) => torrent::html_text(torrents, &[]),
            Content::Episodes(episodes) => episode::html_text(episodes, &[]),
            Content::Comics(comics) => comic::html_text(comics, &[]),
            Content::Weather(snapshot) => snapshot.html_text(),
            other => format!("<pre>{}</pre>", escape_html(&other.plain_text())),
        }
    }

    /// Listings render the fresh entries as text and show them in the
    /// context of the full merged listing as HTML.
    fn render(&self, reaction: &str, fresh: Option<&Self>) -> Output {
        match (self, fresh) {
            (Content::Torrents(all), Some(Content::Torrents(new))) => {
                Output::new(torrent::summary(reaction, new.len()))
                    .with_text(TEXT_PLAIN, torrent::plain_text(new))
                    .with_text(TEXT_HTML, torrent::html_text(all, new))
            }
            (Content::Episodes(all), Some(Content::Episodes(new))) => {
                Output::new(episode::summary(reaction, all, new))
                    .with_text(TEXT_PLAIN, episode::plain_text(all, new))
                    .with_text(TEXT_HTML, episode::html_text(all, new))
            }
            (Content::Comics(all), Some(Content::Comics(new))) => {
                Output::new(comic::summary(reaction))
                    .with_text(TEXT_PLAIN, comic::plain_text(new))
                    .with_text(TEXT_HTML, comic::html_text(all, new))
            }
            _ => {
                let subject = fresh.unwrap_or(self);
                Output::new(subject.summary(reaction))
                    .with_text(TEXT_PLAIN, subject.plain_text())
                    .with_text(TEXT_HTML, subject.html_text())
            }
        }
    }
}

impl AppendMerge for Content {
    fn append_merge(previous: Option<&Self>, current: &Self) -> Result<Appended<Self>, DiffError> {
        const STRATEGY: &str = "append-only";
        match (previous, current) {
            (None, Content::Torrents(current)) => {
                Ok(wrap(append_new(&[], current), Content::Torrents))
            }
            (Some(Content::Torrents(previous)), Content::Torrents(current)) => {
                Ok(wrap(append_new(previous, current), Content::Torrents))
            }
            (None, Content::Comics(current)) => Ok(wrap(append_new(&[], current), Content::Comics)),
            (Some(Content::Comics(previous)), Content::Comics(current)) => {
                Ok(wrap(append_new(previous, current), Content::Comics))
            }
            (None, Content::Episodes(current)) => {
                Ok(wrap(episode::merge(&[], current), Content::Episodes))
            }
            (Some(Content::Episodes(previous)), Content::Episodes(current)) => {
                Ok(wrap(episode::merge(previous, current), Content::Episodes))
            }
            (
                Some(previous),
                current @ (Content::Torrents(_) | Content::Episodes(_) | Content::Comics(_)),
            ) => {
                Err(DiffError::IncompatiblePayloads {
                    strategy: STRATEGY,
                    previous: previous.kind(),
                    current: current.kind(),
                })
            }
            (_, other) => Err(DiffError::UnsupportedPayload {
                strategy: STRATEGY,
                kind: other.kind(),
            }),
        }
    }
}

fn wrap<T>(appended: Appended<Vec<T>>, variant: fn(Vec<T>) -> Content) -> Appended<Content> {
    Appended {
        merged: variant(appended.merged),
        fresh: variant(appended.fresh),
        fresh_count: appended.fresh_count,
    }
}

fn file_text(status: &FileStatus) -> String {
    if !status.exists {
        return format!("{} does not exist\n", status.path);
    }
    let mut text = format!("{}\n", status.path);
    text.push_str(&format!("readable: {}\n", status.readable));
    if let Some(size) = status.size {
        text.push_str(&format!("size: {size} bytes\n"));
    }
    if let Some(modified) = status.modified {
        text.push_str(&format!("modified: {}\n", modified.to_rfc3339()));
    }
    text
}
