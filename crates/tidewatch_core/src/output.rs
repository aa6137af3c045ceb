use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

pub const TEXT_PLAIN: &str = "text/plain";
pub const TEXT_HTML: &str = "text/html";

/// A rendered notification: a one-line summary plus full bodies keyed by
/// content type. Consumers must ignore content types they do not know.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Output {
    summary: String,
    bodies: BTreeMap<String, String>,
}

impl Output {
    pub fn new(summary: impl Into<String>) -> Self {
        Self {
            summary: summary.into(),
            bodies: BTreeMap::new(),
        }
    }

    pub fn with_text(mut self, content_type: impl Into<String>, text: impl Into<String>) -> Self {
        self.add_text(content_type, text);
        self
    }

    /// Adds or replaces the body for `content_type`.
    pub fn add_text(&mut self, content_type: impl Into<String>, text: impl Into<String>) {
        self.bodies.insert(content_type.into(), text.into());
    }

    pub fn summary(&self) -> &str {
        &self.summary
    }

    pub fn text(&self, content_type: &str) -> Option<&str> {
        self.bodies.get(content_type).map(String::as_str)
    }

    pub fn bodies(&self) -> impl Iterator<Item = (&str, &str)> {
        self.bodies
            .iter()
            .map(|(content_type, body)| (content_type.as_str(), body.as_str()))
    }
}
