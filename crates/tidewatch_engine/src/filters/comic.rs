use scraper::{Html, Selector};
use tidewatch_core::{Filter, State};
use url::Url;

use super::{element_text, resolve_url};
use crate::error::parse_selector;
use crate::{Comic, ConfigurationError, Content, HtmlPage, Strip};

/// Extracts the comic currently shown on a page.
///
/// The page yields at most one comic: its title comes from the title
/// selector (or the page `<title>` when none is configured) and its strips
/// from the `src` of every element matching the image selector. A page with
/// no title or no image yields an empty listing.
#[derive(Debug, Clone)]
pub struct ComicSiteFilter {
    title: Option<Selector>,
    image: Selector,
    comment_attribute: Option<String>,
}

impl ComicSiteFilter {
    pub fn new(
        title_selector: Option<&str>,
        image_selector: &str,
    ) -> Result<Self, ConfigurationError> {
        Ok(Self {
            title: title_selector.map(parse_selector).transpose()?,
            image: parse_selector(image_selector)?,
            comment_attribute: None,
        })
    }

    /// Reads each strip's comment from this attribute of the image element,
    /// e.g. `title` or `alt`.
    pub fn with_comment_attribute(mut self, attribute: impl Into<String>) -> Self {
        self.comment_attribute = Some(attribute.into());
        self
    }

    fn extract(&self, page: &HtmlPage) -> Vec<Comic> {
        let doc = Html::parse_document(&page.html);
        let base = Url::parse(&page.url).ok();

        let title = match &self.title {
            Some(selector) => doc
                .select(selector)
                .next()
                .map(element_text)
                .filter(|title| !title.is_empty()),
            None => page.title.clone(),
        };

        let strips: Vec<Strip> = doc
            .select(&self.image)
            .filter_map(|image| {
                let url = resolve_url(image.value().attr("src")?, base.as_ref())?;
                let comment = self
                    .comment_attribute
                    .as_deref()
                    .and_then(|attribute| image.value().attr(attribute))
                    .map(str::to_string);
                Some(Strip::new(url, comment))
            })
            .collect();

        match title {
            Some(title) if !strips.is_empty() => vec![Comic::new(title, strips)],
            _ => Vec::new(),
        }
    }
}

impl Filter<Content> for ComicSiteFilter {
    fn name(&self) -> &str {
        "comic-site"
    }

    fn apply(&self, state: State<Content>) -> State<Content> {
        state.and_then(|content| match content {
            Content::Html(page) => State::success(Content::Comics(self.extract(&page))),
            other => State::failure(other.mismatch("html")),
        })
    }
}
