use std::hash::{Hash, Hasher};

use serde::{Deserialize, Serialize};
use tidewatch_core::escape_html;

/// A torrent listed on a tracker page.
///
/// Two entries are the same torrent when they share the info hash of their
/// magnet link; entries without a usable magnet link fall back to the
/// download link and finally to the name. Size and peer counts are not part
/// of the identity, so a listing refresh with new seed counts is not news.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TorrentFile {
    pub name: String,
    pub size: String,
    #[serde(default)]
    pub file_count: Option<u32>,
    #[serde(default)]
    pub seed_count: Option<u32>,
    #[serde(default)]
    pub leech_count: Option<u32>,
    #[serde(default)]
    pub magnet_uri: Option<String>,
    #[serde(default)]
    pub download_uri: Option<String>,
}

impl TorrentFile {
    pub fn new(name: impl Into<String>, size: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            size: size.into(),
            file_count: None,
            seed_count: None,
            leech_count: None,
            magnet_uri: None,
            download_uri: None,
        }
    }

    pub fn with_magnet(mut self, magnet_uri: impl Into<String>) -> Self {
        self.magnet_uri = Some(magnet_uri.into());
        self
    }

    pub fn with_download(mut self, download_uri: impl Into<String>) -> Self {
        self.download_uri = Some(download_uri.into());
        self
    }

    pub fn identity(&self) -> String {
        if let Some(hash) = self.magnet_uri.as_deref().and_then(exact_topic) {
            return hash;
        }
        match &self.download_uri {
            Some(uri) if !uri.is_empty() => uri.clone(),
            _ => self.name.clone(),
        }
    }
}

impl PartialEq for TorrentFile {
    fn eq(&self, other: &Self) -> bool {
        self.identity() == other.identity()
    }
}

impl Eq for TorrentFile {}

impl Hash for TorrentFile {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.identity().hash(state);
    }
}

/// The lower-cased `xt` parameter of a magnet link.
fn exact_topic(magnet: &str) -> Option<String> {
    let parsed = url::Url::parse(magnet).ok()?;
    if parsed.scheme() != "magnet" {
        return None;
    }
    parsed
        .query_pairs()
        .find(|(key, _)| key == "xt")
        .map(|(_, value)| value.to_lowercase())
        .filter(|value| !value.is_empty())
}

pub(super) fn summary(reaction: &str, fresh_count: usize) -> String {
    format!("Found {fresh_count} new Torrent(s) for “{reaction}!”")
}

pub(super) fn count(value: Option<u32>) -> String {
    value.map_or_else(|| "?".to_string(), |value| value.to_string())
}

pub(super) fn plain_text(fresh: &[TorrentFile]) -> String {
    let mut text = String::from("New Torrents:\n\n");
    for torrent in fresh {
        text.push_str(&format!("{}\n", torrent.name));
        text.push_str(&format!(
            "\t{} in {} file(s)\n",
            torrent.size,
            count(torrent.file_count)
        ));
        text.push_str(&format!(
            "\t{} seed(s), {} leecher(s)\n",
            count(torrent.seed_count),
            count(torrent.leech_count)
        ));
        for link in [&torrent.magnet_uri, &torrent.download_uri]
            .into_iter()
            .flatten()
        {
            text.push_str(&format!("\t{link}\n"));
        }
        text.push('\n');
    }
    text
}

/// Table of every known torrent with the new ones highlighted.
pub(super) fn html_text(all: &[TorrentFile], fresh: &[TorrentFile]) -> String {
    let mut html = String::from("<html><body>\n<table>\n<caption>All Known Torrents</caption>\n");
    html.push_str("<thead>\n<tr><th>Filename</th><th>Size</th><th>File(s)</th><th>Seeds</th><th>Leechers</th><th>Magnet</th><th>Download</th></tr>\n</thead>\n<tbody>\n");
    for torrent in all {
        if fresh.contains(torrent) {
            html.push_str("<tr style=\"color: #008000; font-weight: bold;\">");
        } else {
            html.push_str("<tr>");
        }
        html.push_str(&format!("<td>{}</td>", escape_html(&torrent.name)));
        html.push_str(&format!("<td>{}</td>", escape_html(&torrent.size)));
        html.push_str(&format!("<td>{}</td>", count(torrent.file_count)));
        html.push_str(&format!("<td>{}</td>", count(torrent.seed_count)));
        html.push_str(&format!("<td>{}</td>", count(torrent.leech_count)));
        for link in [&torrent.magnet_uri, &torrent.download_uri] {
            match link {
                Some(link) => html.push_str(&format!(
                    "<td><a href=\"{}\">Link</a></td>",
                    escape_html(link)
                )),
                None => html.push_str("<td></td>"),
            }
        }
        html.push_str("</tr>\n");
    }
    html.push_str("</tbody>\n</table>\n</body></html>\n");
    html
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identity_prefers_lowercased_magnet_topic() {
        let torrent = TorrentFile::new("Show S01E01", "1.2 GiB")
            .with_magnet("magnet:?xt=urn:btih:ABCDEF&dn=Show")
            .with_download("https://tracker.example/1.torrent");
        assert_eq!(torrent.identity(), "urn:btih:abcdef");
    }

    #[test]
    fn identity_falls_back_to_download_then_name() {
        let download = TorrentFile::new("a", "1 MB").with_download("https://t.example/a");
        assert_eq!(download.identity(), "https://t.example/a");
        assert_eq!(TorrentFile::new("plain", "1 MB").identity(), "plain");
    }

    #[test]
    fn peer_counts_do_not_affect_equality() {
        let mut first = TorrentFile::new("a", "1 MB").with_magnet("magnet:?xt=urn:btih:1");
        let mut second = first.clone();
        first.seed_count = Some(3);
        second.seed_count = Some(30);
        assert_eq!(first, second);
    }
}
