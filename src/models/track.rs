use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Genre shown when the catalog has nothing better to offer.
pub const UNKNOWN_GENRE: &str = "Unknown";

/// Body of the catalog's track search endpoint, and of our search proxy.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SearchResponse {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tracks: Option<TrackPage>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TrackPage {
    #[serde(default)]
    pub items: Vec<Track>,
}

/// A catalog track. Only the fields we read are typed; everything else the
/// provider sends is carried through untouched in `extra`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Track {
    pub name: String,
    pub artists: Vec<ArtistRef>,
    pub album: AlbumRef,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArtistRef {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlbumRef {
    pub name: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Artist record; only the genre list matters here.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Artist {
    #[serde(default)]
    pub genres: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct GenreResponse {
    pub genre: String,
}

impl SearchResponse {
    /// Wraps a single track in the provider's search shape.
    pub fn single(track: Track) -> Self {
        Self {
            tracks: Some(TrackPage { items: vec![track] }),
        }
    }

    pub fn into_first_track(self) -> Option<Track> {
        self.tracks.and_then(|page| page.items.into_iter().next())
    }
}

impl Track {
    pub fn primary_artist(&self) -> Option<&ArtistRef> {
        self.artists.first()
    }

    pub fn primary_artist_id(&self) -> Option<&str> {
        self.primary_artist()
            .and_then(|artist| artist.id.as_deref())
            .filter(|id| !id.trim().is_empty())
    }
}

/// Flattened, display-ready view of a track once its genre is known.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrackResult {
    pub name: String,
    pub artist: String,
    #[serde(rename = "artistId")]
    pub artist_id: Option<String>,
    pub album: String,
    pub genre: Option<String>,
}

impl TrackResult {
    /// `None` when the track has no artists at all.
    pub fn from_track(track: &Track) -> Option<Self> {
        let artist = track.primary_artist()?;
        Some(Self {
            name: track.name.clone(),
            artist: artist.name.clone(),
            artist_id: track.primary_artist_id().map(str::to_string),
            album: track.album.name.clone(),
            genre: None,
        })
    }

    pub fn with_genre(mut self, genre: impl Into<String>) -> Self {
        self.genre = Some(genre.into());
        self
    }

    pub fn genre_or_unknown(&self) -> &str {
        self.genre.as_deref().unwrap_or(UNKNOWN_GENRE)
    }
}
