pub mod recommendation;
pub mod track;

pub use recommendation::{ChatMessage, ChatRequest, RecommendRequest};
pub use track::{Artist, GenreResponse, SearchResponse, Track, TrackResult, UNKNOWN_GENRE};
