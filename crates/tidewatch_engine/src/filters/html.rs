use scraper::{Html, Selector};
use tidewatch_core::{Filter, State};
use tidewatch_logging::watch_trace;

use crate::{Content, HtmlPage};

const HTML_TYPES: [&str; 2] = ["text/html", "application/xhtml+xml"];

/// Turns an HTTP document into an HTML page, pulling out its `<title>`.
///
/// Documents that declare a non-HTML content type are rejected; documents
/// without a content type are accepted as HTML.
#[derive(Debug, Default, Clone)]
pub struct HtmlFilter;

impl HtmlFilter {
    pub fn new() -> Self {
        Self
    }
}

impl Filter<Content> for HtmlFilter {
    fn name(&self) -> &str {
        "html"
    }

    fn apply(&self, state: State<Content>) -> State<Content> {
        state.and_then(|content| match content {
            Content::Http(document) => {
                if let Some(content_type) = document.content_type.as_deref() {
                    let mime = content_type.split(';').next().unwrap_or("").trim();
                    if !HTML_TYPES.iter().any(|html| html.eq_ignore_ascii_case(mime)) {
                        return State::failure(format!("expected html, got {mime}"));
                    }
                }
                watch_trace!("parsing {} ({} bytes)", document.url, document.body.len());
                let title = page_title(&document.body);
                State::success(Content::Html(HtmlPage {
                    url: document.url,
                    title,
                    html: document.body,
                }))
            }
            other => State::failure(other.mismatch("http")),
        })
    }
}

fn page_title(html: &str) -> Option<String> {
    let doc = Html::parse_document(html);
    let selector = Selector::parse("title").ok()?;
    doc.select(&selector)
        .next()
        .map(super::element_text)
        .filter(|title| !title.is_empty())
}
