//! Document model for the search page: a song panel and a recommendation
//! list, written to by at most one search action at a time.

use crate::client::orchestrator::SearchState;
use crate::models::TrackResult;
use std::fmt::{self, Write as _};

pub const NO_SONG_FOUND: &str = "No song found";
pub const EMPTY_QUERY: &str = "Please enter a song name to search for.";
pub const CATALOG_UNAUTHORIZED: &str =
    "The music catalog refused our credentials. Please try again later.";
pub const SEARCH_FAILED: &str = "Something went wrong while searching. Please try again.";
pub const RECOMMENDATIONS_FAILED: &str = "Could not load recommendations right now.";
pub const SEARCHING: &str = "Searching...";
pub const LOADING_RECOMMENDATIONS: &str = "Loading recommendations...";

#[derive(Debug, Clone, Default, PartialEq)]
pub enum SongPanel {
    #[default]
    Empty,
    Loading,
    Song(TrackResult),
    Message(String),
}

#[derive(Debug, Clone, Default, PartialEq)]
pub enum RecommendationList {
    #[default]
    Empty,
    Loading,
    Songs(Vec<String>),
    Message(String),
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Page {
    /// Sequence number of the search action that owns the page.
    pub(crate) current: u64,
    pub state: SearchState,
    pub song: SongPanel,
    pub recommendations: RecommendationList,
}

impl Page {
    /// Hands the page to a new search action and resets it.
    pub fn begin(&mut self, sequence: u64) -> bool {
        if sequence < self.current {
            return false;
        }
        self.current = sequence;
        self.state = SearchState::Searching;
        self.song = SongPanel::Loading;
        self.recommendations = RecommendationList::Empty;
        true
    }

    pub fn is_current(&self, sequence: u64) -> bool {
        self.current == sequence
    }

    /// Applies `update` only if `sequence` still owns the page.
    pub fn apply(&mut self, sequence: u64, update: impl FnOnce(&mut Page)) -> bool {
        if !self.is_current(sequence) {
            tracing::debug!(
                "Dropping stale update from search #{} (page owned by #{})",
                sequence,
                self.current
            );
            return false;
        }
        update(self);
        true
    }

    /// True until the owning action ends, or while a placeholder is showing.
    pub fn is_loading(&self) -> bool {
        !(self.state.is_terminal() || self.state == SearchState::Idle)
            || matches!(self.song, SongPanel::Loading)
            || matches!(self.recommendations, RecommendationList::Loading)
    }

    pub fn song_html(&self) -> String {
        match &self.song {
            SongPanel::Empty => String::new(),
            SongPanel::Loading => format!("<p>{}</p>", SEARCHING),
            SongPanel::Song(track) => format!(
                "<h3>{} by {}</h3>\n<p>Album: {}</p>\n<p>Genre: {}</p>",
                escape_html(&track.name),
                escape_html(&track.artist),
                escape_html(&track.album),
                escape_html(track.genre_or_unknown()),
            ),
            SongPanel::Message(msg) => format!("<p>{}</p>", escape_html(msg)),
        }
    }

    pub fn recommendations_html(&self) -> String {
        match &self.recommendations {
            RecommendationList::Empty => String::new(),
            RecommendationList::Loading => format!("<p>{}</p>", LOADING_RECOMMENDATIONS),
            RecommendationList::Songs(songs) => {
                songs.iter().fold(String::new(), |mut html, song| {
                    let _ = write!(html, "<li>{}</li>", escape_html(song));
                    html
                })
            }
            RecommendationList::Message(msg) => format!("<p>{}</p>", escape_html(msg)),
        }
    }
}

/// Plain-text rendering for the terminal client.
impl fmt::Display for Page {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.song {
            SongPanel::Empty => {}
            SongPanel::Loading => writeln!(f, "{}", SEARCHING)?,
            SongPanel::Song(track) => {
                writeln!(f, "{} by {}", track.name, track.artist)?;
                writeln!(f, "Album: {}", track.album)?;
                writeln!(f, "Genre: {}", track.genre_or_unknown())?;
            }
            SongPanel::Message(msg) => writeln!(f, "{}", msg)?,
        }

        match &self.recommendations {
            RecommendationList::Empty => {}
            RecommendationList::Loading => writeln!(f, "\n{}", LOADING_RECOMMENDATIONS)?,
            RecommendationList::Songs(songs) => {
                writeln!(f, "\nSimilar songs:")?;
                for song in songs {
                    writeln!(f, "  {}", song)?;
                }
            }
            RecommendationList::Message(msg) => writeln!(f, "\n{}", msg)?,
        }

        Ok(())
    }
}

/// One entry per non-blank line of the completion, in provider order.
pub fn split_recommendations(text: &str) -> Vec<String> {
    text.trim()
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect()
}

pub fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(c),
        }
    }
    escaped
}
