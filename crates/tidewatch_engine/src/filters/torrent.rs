use scraper::{ElementRef, Html, Selector};
use tidewatch_core::{Filter, State};
use url::Url;

use super::{element_text, resolve_url};
use crate::error::parse_selector;
use crate::{ConfigurationError, Content, HtmlPage, TorrentFile};

/// Selector set for one torrent listing layout.
///
/// `row` selects one element per torrent; every other selector is evaluated
/// inside that row.
#[derive(Debug, Clone, Default)]
pub struct TorrentSelectors<'a> {
    pub row: &'a str,
    pub name: &'a str,
    pub size: &'a str,
    pub magnet: Option<&'a str>,
    pub download: Option<&'a str>,
    pub seeds: Option<&'a str>,
    pub leechers: Option<&'a str>,
    pub files: Option<&'a str>,
}

/// Extracts torrent entries from a listing page.
///
/// Rows without a name are skipped. Links are read from the `href` of the
/// matched elements and resolved against the page URL.
#[derive(Debug, Clone)]
pub struct TorrentSiteFilter {
    row: Selector,
    name: Selector,
    size: Selector,
    magnet: Option<Selector>,
    download: Option<Selector>,
    seeds: Option<Selector>,
    leechers: Option<Selector>,
    files: Option<Selector>,
}

impl TorrentSiteFilter {
    pub fn new(selectors: TorrentSelectors<'_>) -> Result<Self, ConfigurationError> {
        let optional = |selector: Option<&str>| selector.map(parse_selector).transpose();
        Ok(Self {
            row: parse_selector(selectors.row)?,
            name: parse_selector(selectors.name)?,
            size: parse_selector(selectors.size)?,
            magnet: optional(selectors.magnet)?,
            download: optional(selectors.download)?,
            seeds: optional(selectors.seeds)?,
            leechers: optional(selectors.leechers)?,
            files: optional(selectors.files)?,
        })
    }

    fn extract(&self, page: &HtmlPage) -> Vec<TorrentFile> {
        let doc = Html::parse_document(&page.html);
        let base = Url::parse(&page.url).ok();
        doc.select(&self.row)
            .filter_map(|row| self.torrent(row, base.as_ref()))
            .collect()
    }

    fn torrent(&self, row: ElementRef<'_>, base: Option<&Url>) -> Option<TorrentFile> {
        let name = first_text(row, &self.name).filter(|name| !name.is_empty())?;
        let size = first_text(row, &self.size).unwrap_or_default();
        let link = |selector: &Option<Selector>| {
            selector
                .as_ref()
                .and_then(|selector| row.select(selector).next())
                .and_then(|element| element.value().attr("href"))
                .and_then(|href| resolve_url(href, base))
        };
        let number = |selector: &Option<Selector>| {
            selector
                .as_ref()
                .and_then(|selector| first_text(row, selector))
                .and_then(|text| parse_count(&text))
        };
        Some(TorrentFile {
            name,
            size,
            file_count: number(&self.files),
            seed_count: number(&self.seeds),
            leech_count: number(&self.leechers),
            magnet_uri: link(&self.magnet),
            download_uri: link(&self.download),
        })
    }
}

fn first_text(row: ElementRef<'_>, selector: &Selector) -> Option<String> {
    row.select(selector).next().map(element_text)
}

/// Parses counts such as `1,234` or `12 seeds`.
fn parse_count(text: &str) -> Option<u32> {
    let digits: String = text
        .chars()
        .skip_while(|c| !c.is_ascii_digit())
        .take_while(|c| c.is_ascii_digit() || *c == ',' || *c == '.')
        .filter(char::is_ascii_digit)
        .collect();
    digits.parse().ok()
}

impl Filter<Content> for TorrentSiteFilter {
    fn name(&self) -> &str {
        "torrent-site"
    }

    fn apply(&self, state: State<Content>) -> State<Content> {
        state.and_then(|content| match content {
            Content::Html(page) => State::success(Content::Torrents(self.extract(&page))),
            other => State::failure(other.mismatch("html")),
        })
    }
}
