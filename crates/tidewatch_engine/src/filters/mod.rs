//! Filters over [`Content`](crate::Content) payloads.
//!
//! Every filter hands an incoming failure on unchanged and turns a payload
//! shape it does not process into a failure naming both shapes.
mod blacklist;
mod comic;
mod episode;
mod extract_url;
mod html;
mod torrent;
mod weather;

pub use blacklist::{BlacklistFilter, SizeBlacklistFilter};
pub use comic::ComicSiteFilter;
pub use episode::{EpisodeFilter, DEFAULT_EPISODE_PATTERNS};
pub use extract_url::ExtractUrlFilter;
pub use html::HtmlFilter;
pub use torrent::{TorrentSelectors, TorrentSiteFilter};
pub use weather::WeatherJsonFilter;

use scraper::ElementRef;
use url::Url;

/// Whitespace-collapsed text content of an element.
fn element_text(element: ElementRef<'_>) -> String {
    element
        .text()
        .flat_map(str::split_whitespace)
        .collect::<Vec<_>>()
        .join(" ")
}

/// Resolves `reference` against the page URL; fragments, empty references
/// and `javascript:` links resolve to nothing.
fn resolve_url(reference: &str, base: Option<&Url>) -> Option<String> {
    let trimmed = reference.trim();
    if trimmed.is_empty() {
        return None;
    }
    let lower = trimmed.to_ascii_lowercase();
    if lower.starts_with('#') || lower.starts_with("javascript:") {
        return None;
    }
    if let Ok(url) = Url::parse(trimmed) {
        return Some(url.to_string());
    }
    base.and_then(|base| base.join(trimmed).ok())
        .map(|url| url.to_string())
}
