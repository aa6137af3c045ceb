use std::fmt;

use crate::output::{Output, TEXT_HTML, TEXT_PLAIN};

/// A value carried by a successful [`State`](crate::State).
///
/// `PartialEq` decides whether two payloads describe the same thing, which is
/// what the diff strategies compare. It is usually structural, but a payload
/// may narrow it to an identity (a torrent is the same torrent whatever its
/// seed count). The rendering methods are only used once a diff strategy
/// decided to notify.
pub trait Payload: Clone + PartialEq + fmt::Debug + Send + Sync + 'static {
    /// Short label of the payload shape, used in failure causes and logs.
    fn kind(&self) -> &'static str;

    /// Whether the payload holds no data (an empty listing, an empty page).
    fn is_empty(&self) -> bool;

    fn summary(&self, reaction: &str) -> String {
        reaction.to_string()
    }

    fn plain_text(&self) -> String;

    fn html_text(&self) -> String {
        format!("<div>{}</div>", escape_html(&self.plain_text()))
    }

    /// Builds the notification for a merged payload.
    ///
    /// `fresh` holds only the part of the payload that caused the
    /// notification (new list entries, the changed snapshot), when the diff
    /// strategy could isolate it.
    fn render(&self, reaction: &str, fresh: Option<&Self>) -> Output {
        let subject = fresh.unwrap_or(self);
        Output::new(subject.summary(reaction))
            .with_text(TEXT_PLAIN, subject.plain_text())
            .with_text(TEXT_HTML, subject.html_text())
    }
}

/// Escapes text for inclusion in HTML element content and attribute values.
pub fn escape_html(input: &str) -> String {
    let mut escaped = String::with_capacity(input.len());
    for c in input.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            other => escaped.push(other),
        }
    }
    escaped
}
