use serde::{Deserialize, Serialize};
use tidewatch_core::escape_html;

/// Number of already known comics repeated below the new ones in HTML output.
const RECENT_COMICS_IN_HTML: usize = 7;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Strip {
    pub image_url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
}

impl Strip {
    pub fn new(image_url: impl Into<String>, comment: Option<String>) -> Self {
        Self {
            image_url: image_url.into(),
            comment: comment.filter(|comment| !comment.trim().is_empty()),
        }
    }
}

/// One published comic: a title and the strips shown under it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Comic {
    pub title: String,
    pub strips: Vec<Strip>,
}

impl Comic {
    pub fn new(title: impl Into<String>, strips: Vec<Strip>) -> Self {
        Self {
            title: title.into(),
            strips,
        }
    }
}

pub(super) fn summary(reaction: &str) -> String {
    format!("New Comic found for “{reaction}!”")
}

pub(super) fn plain_text(comics: &[Comic]) -> String {
    let mut text = String::new();
    for comic in comics {
        text.push_str(&format!("Comic Found: {}\n\n", comic.title));
        for strip in &comic.strips {
            text.push_str(&format!("Image: {}\n", strip.image_url));
            if let Some(comment) = &strip.comment {
                text.push_str(&format!("Comment: {comment}\n"));
            }
        }
        text.push_str("\n\n");
    }
    text
}

/// New comics first, followed by the most recent known ones, newest first.
pub(super) fn html_text(all: &[Comic], fresh: &[Comic]) -> String {
    let mut html = String::from("<body>");
    for comic in fresh {
        push_comic_html(&mut html, comic);
    }
    for comic in all
        .iter()
        .rev()
        .filter(|comic| !fresh.contains(comic))
        .take(RECENT_COMICS_IN_HTML)
    {
        push_comic_html(&mut html, comic);
    }
    html.push_str("</body>");
    html
}

fn push_comic_html(html: &mut String, comic: &Comic) {
    html.push_str(&format!("<h1>{}</h1>\n", escape_html(&comic.title)));
    for strip in &comic.strips {
        let comment = escape_html(strip.comment.as_deref().unwrap_or(""));
        html.push_str(&format!(
            "<div><img src=\"{}\" alt=\"{comment}\" title=\"{comment}\"></div>\n",
            escape_html(&strip.image_url)
        ));
        html.push_str(&format!("<div>{comment}</div>\n"));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn comic(n: usize) -> Comic {
        Comic::new(
            format!("Comic {n}"),
            vec![Strip::new(format!("https://c.example/{n}.png"), None)],
        )
    }

    #[test]
    fn blank_comments_are_dropped() {
        assert_eq!(Strip::new("a.png", Some("  ".into())).comment, None);
    }

    #[test]
    fn html_lists_fresh_then_recent_known_comics() {
        let all: Vec<Comic> = (1..=10).map(comic).collect();
        let fresh = vec![comic(10)];

        let html = html_text(&all, &fresh);

        let first = html.find("Comic 10").unwrap();
        let second = html.find("Comic 9").unwrap();
        assert!(first < second);
        assert!(html.contains("Comic 3"));
        assert!(!html.contains("Comic 2<"));
        assert_eq!(html.matches("Comic 10").count(), 1);
    }
}
