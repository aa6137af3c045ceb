use serde::{Deserialize, Serialize};
use tidewatch_core::{escape_html, Appended};

use super::torrent::count;
use crate::TorrentFile;

/// Torrents found for one episode of a series.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Episode {
    pub season: u32,
    pub episode: u32,
    pub torrents: Vec<TorrentFile>,
}

impl Episode {
    pub fn new(season: u32, episode: u32, torrents: Vec<TorrentFile>) -> Self {
        Self {
            season,
            episode,
            torrents,
        }
    }

    /// `S01E02` style name of the episode.
    pub fn identifier(&self) -> String {
        format!("S{:02}E{:02}", self.season, self.episode)
    }

    fn key(&self) -> (u32, u32) {
        (self.season, self.episode)
    }
}

/// Adds the torrents of `incoming` not yet in `known`, returning the added
/// ones in listing order.
fn absorb(known: &mut Vec<TorrentFile>, incoming: &[TorrentFile]) -> Vec<TorrentFile> {
    let mut added = Vec::new();
    for torrent in incoming {
        if !known.contains(torrent) {
            known.push(torrent.clone());
            added.push(torrent.clone());
        }
    }
    added
}

/// Merges a listing into the known episodes.
///
/// The fresh part holds new episodes with all their torrents and known
/// episodes with only the torrents that were not seen before; the fresh
/// count is the number of new torrents.
pub(super) fn merge(previous: &[Episode], current: &[Episode]) -> Appended<Vec<Episode>> {
    let mut merged = previous.to_vec();
    let mut fresh = Vec::new();
    let mut fresh_count = 0;
    for episode in current {
        let position = merged.iter().position(|known| known.key() == episode.key());
        let known = match position {
            Some(position) => &mut merged[position],
            None => {
                merged.push(Episode::new(episode.season, episode.episode, Vec::new()));
                let last = merged.len() - 1;
                &mut merged[last]
            }
        };
        let added = absorb(&mut known.torrents, &episode.torrents);
        if !added.is_empty() {
            fresh_count += added.len();
            fresh.push(Episode::new(episode.season, episode.episode, added));
        }
    }
    merged.retain(|episode| !episode.torrents.is_empty());
    merged.sort_by_key(Episode::key);
    fresh.sort_by_key(Episode::key);
    Appended {
        merged,
        fresh,
        fresh_count,
    }
}

/// A fresh episode is new when every torrent it has is fresh.
fn is_new(all: &[Episode], fresh: &Episode) -> bool {
    all.iter()
        .find(|known| known.key() == fresh.key())
        .map_or(true, |known| known.torrents.len() == fresh.torrents.len())
}

pub(super) fn summary(reaction: &str, all: &[Episode], fresh: &[Episode]) -> String {
    let new = fresh.iter().filter(|episode| is_new(all, episode)).count();
    let changed = fresh.len() - new;
    match (new, changed) {
        (0, changed) => format!("{changed} changed Torrent(s) for “{reaction}!”"),
        (new, 0) => format!("{new} new Torrent(s) for “{reaction}!”"),
        (new, changed) => {
            format!("{new} new and {changed} changed Torrent(s) for “{reaction}!”")
        }
    }
}

fn push_section(text: &mut String, title: &str, episodes: &[&Episode]) {
    if episodes.is_empty() {
        return;
    }
    text.push_str(&format!("{title}\n\n"));
    for episode in episodes {
        text.push_str(&format!("- {}\n", episode.identifier()));
        for torrent in &episode.torrents {
            text.push_str(&format!("  - {}, {}\n", torrent.name, torrent.size));
            if let Some(magnet) = torrent.magnet_uri.as_deref().filter(|uri| !uri.is_empty()) {
                text.push_str(&format!("    Magnet: {magnet}\n"));
            }
            if let Some(download) = torrent.download_uri.as_deref().filter(|uri| !uri.is_empty()) {
                text.push_str(&format!("    Download: {download}\n"));
            }
        }
    }
    text.push('\n');
}

/// New and changed episodes followed by every known episode by season.
pub(super) fn plain_text(all: &[Episode], fresh: &[Episode]) -> String {
    let (new, changed): (Vec<&Episode>, Vec<&Episode>) =
        fresh.iter().partition(|episode| is_new(all, episode));
    let mut text = String::new();
    push_section(&mut text, "New Episodes", &new);
    push_section(&mut text, "Changed Episodes", &changed);

    text.push_str("All Known Episodes\n\n");
    let mut season = None;
    for episode in all {
        if season != Some(episode.season) {
            season = Some(episode.season);
            text.push_str(&format!("  Season {}\n\n", episode.season));
        }
        text.push_str(&format!("    Episode {}\n", episode.episode));
        for torrent in &episode.torrents {
            text.push_str(&format!(
                "      Size: {} in {} file(s): {}\n",
                torrent.size,
                count(torrent.file_count),
                torrent.magnet_uri.as_deref().unwrap_or("")
            ));
        }
    }
    text
}

/// Table of every known torrent, latest episode first. Torrents of new
/// episodes are bold, new torrents of known episodes are only coloured.
pub(super) fn html_text(all: &[Episode], fresh: &[Episode]) -> String {
    let mut html = String::from("<html><body>\n<table>\n<caption>All Known Episodes</caption>\n");
    html.push_str("<thead>\n<tr><th>Season</th><th>Episode</th><th>Filename</th><th>Size</th><th>File(s)</th><th>Seeds</th><th>Leechers</th><th>Magnet</th><th>Download</th></tr>\n</thead>\n<tbody>\n");
    for episode in all.iter().rev() {
        let fresh_episode = fresh.iter().find(|candidate| candidate.key() == episode.key());
        let new_episode = fresh_episode.is_some_and(|candidate| is_new(all, candidate));
        for (index, torrent) in episode.torrents.iter().enumerate() {
            let new_torrent =
                fresh_episode.is_some_and(|candidate| candidate.torrents.contains(torrent));
            if new_episode {
                html.push_str("<tr style=\"color: #008000; font-weight: bold;\">");
            } else if new_torrent {
                html.push_str("<tr style=\"color: #008000;\">");
            } else {
                html.push_str("<tr>");
            }
            if index == 0 {
                html.push_str(&format!(
                    "<td>{}</td><td>{}</td>",
                    episode.season, episode.episode
                ));
            } else {
                html.push_str("<td colspan=\"2\"></td>");
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
    }
    html.push_str("</tbody>\n</table>\n</body></html>\n");
    html
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    fn torrent(name: &str) -> TorrentFile {
        TorrentFile::new(name, "350 MiB").with_magnet(format!("magnet:?xt=urn:btih:{name}"))
    }

    #[test]
    fn identifier_pads_numbers() {
        assert_eq!(Episode::new(1, 2, Vec::new()).identifier(), "S01E02");
        assert_eq!(Episode::new(12, 103, Vec::new()).identifier(), "S12E103");
    }

    #[test]
    fn merge_separates_new_episodes_from_new_files() {
        let previous = vec![Episode::new(1, 1, vec![torrent("s1e1-720p")])];
        let current = vec![
            Episode::new(1, 2, vec![torrent("s1e2")]),
            Episode::new(1, 1, vec![torrent("s1e1-720p"), torrent("s1e1-1080p")]),
        ];

        let appended = merge(&previous, &current);

        assert_eq!(appended.fresh_count, 2);
        assert_eq!(
            appended.fresh,
            vec![
                Episode::new(1, 1, vec![torrent("s1e1-1080p")]),
                Episode::new(1, 2, vec![torrent("s1e2")]),
            ]
        );
        assert_eq!(appended.merged[0].torrents.len(), 2);
        assert_eq!(
            summary("show", &appended.merged, &appended.fresh),
            "1 new and 1 changed Torrent(s) for “show!”"
        );
    }

    #[test]
    fn merge_keeps_episodes_that_left_the_listing() {
        let previous = vec![Episode::new(1, 1, vec![torrent("a")])];
        let appended = merge(&previous, &[]);
        assert_eq!(appended.fresh_count, 0);
        assert_eq!(appended.merged, previous);
    }

    #[test]
    fn html_marks_new_episodes_bold_and_new_files_coloured() {
        let previous = vec![Episode::new(1, 1, vec![torrent("old")])];
        let current = vec![
            Episode::new(1, 1, vec![torrent("old"), torrent("extra")]),
            Episode::new(1, 2, vec![torrent("fresh")]),
        ];
        let appended = merge(&previous, &current);

        let html = html_text(&appended.merged, &appended.fresh);

        assert_eq!(html.matches("font-weight: bold").count(), 1);
        assert_eq!(html.matches("<tr style=\"color: #008000;\">").count(), 1);
        assert!(html.find(">fresh<").unwrap() < html.find(">old<").unwrap());
        assert_eq!(html.matches("colspan=\"2\"").count(), 1);
    }

    #[test]
    fn plain_text_lists_sections_in_order() {
        let appended = merge(&[], &[Episode::new(2, 5, vec![torrent("s2e5")])]);
        let text = plain_text(&appended.merged, &appended.fresh);
        assert!(text.starts_with("New Episodes\n\n- S02E05\n  - s2e5, 350 MiB\n"));
        assert!(!text.contains("Changed Episodes"));
        assert!(text.contains("All Known Episodes\n\n  Season 2\n\n    Episode 5\n"));
    }
}
