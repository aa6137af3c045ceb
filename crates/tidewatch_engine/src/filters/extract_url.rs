use scraper::{Html, Selector};
use tidewatch_core::{Filter, State};
use url::Url;

use super::resolve_url;
use crate::error::parse_selector;
use crate::{ConfigurationError, Content, HtmlPage};

/// Pulls one link out of a page, e.g. the "latest episode" link of an index
/// page, and hands it on as text.
///
/// The first element matching the selector whose attribute resolves to a URL
/// wins. A page without such an element is a failure.
#[derive(Debug, Clone)]
pub struct ExtractUrlFilter {
    selector: Selector,
    attribute: String,
}

impl ExtractUrlFilter {
    /// Reads the `href` of the matched element.
    pub fn new(selector: &str) -> Result<Self, ConfigurationError> {
        Ok(Self {
            selector: parse_selector(selector)?,
            attribute: "href".to_string(),
        })
    }

    pub fn with_attribute(mut self, attribute: impl Into<String>) -> Self {
        self.attribute = attribute.into();
        self
    }

    fn extract(&self, page: &HtmlPage) -> Option<String> {
        let doc = Html::parse_document(&page.html);
        let base = Url::parse(&page.url).ok();
        doc.select(&self.selector).find_map(|element| {
            resolve_url(element.value().attr(&self.attribute)?, base.as_ref())
        })
    }
}

impl Filter<Content> for ExtractUrlFilter {
    fn name(&self) -> &str {
        "extract-url"
    }

    fn apply(&self, state: State<Content>) -> State<Content> {
        state.and_then(|content| match content {
            Content::Html(page) => match self.extract(&page) {
                Some(url) => State::success(Content::Text(url)),
                None => State::failure(format!("no url found in {}", page.url)),
            },
            other => State::failure(other.mismatch("html")),
        })
    }
}
