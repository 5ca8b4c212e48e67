use crate::client::page::{
    self, split_recommendations, Page, RecommendationList, SongPanel,
};
use crate::client::proxy::{ClientError, ProxyApi};
use crate::models::recommendation::completion_text;
use crate::models::TrackResult;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    Invalid,
    Unauthorized,
    Upstream,
}

/// Lifecycle of one search action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SearchState {
    #[default]
    Idle,
    Searching,
    Found,
    Enriching,
    Recommending,
    Rendered,
    NotFound,
    Failed(FailureKind),
    /// A newer search took over the page before this one finished.
    Superseded,
}

impl SearchState {
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            SearchState::Rendered
                | SearchState::NotFound
                | SearchState::Failed(_)
                | SearchState::Superseded
        )
    }
}

impl From<&ClientError> for FailureKind {
    fn from(error: &ClientError) -> Self {
        match error {
            ClientError::Invalid(_) => FailureKind::Invalid,
            ClientError::Unauthorized => FailureKind::Unauthorized,
            ClientError::NotFound | ClientError::Failed(_) => FailureKind::Upstream,
        }
    }
}

fn search_failure_message(kind: FailureKind) -> &'static str {
    match kind {
        FailureKind::Invalid => page::EMPTY_QUERY,
        FailureKind::Unauthorized => page::CATALOG_UNAUTHORIZED,
        FailureKind::Upstream => page::SEARCH_FAILED,
    }
}

/// Sequences search -> genre -> recommendations for each search action and
/// writes the results into a shared `Page`.
pub struct Orchestrator {
    proxy: Arc<dyn ProxyApi>,
    page: Arc<Mutex<Page>>,
    sequence: AtomicU64,
}

impl Orchestrator {
    pub fn new(proxy: Arc<dyn ProxyApi>) -> Self {
        Self {
            proxy,
            page: Arc::new(Mutex::new(Page::default())),
            sequence: AtomicU64::new(0),
        }
    }

    pub fn page(&self) -> Arc<Mutex<Page>> {
        self.page.clone()
    }

    pub async fn snapshot(&self) -> Page {
        self.page.lock().await.clone()
    }

    /// Runs one search action to a terminal state.
    pub async fn search(&self, query: &str) -> SearchState {
        let sequence = self.sequence.fetch_add(1, Ordering::SeqCst) + 1;
        if !self.page.lock().await.begin(sequence) {
            return SearchState::Superseded;
        }

        let state = self.run(sequence, query).await;
        if state != SearchState::Superseded {
            self.enter(sequence, state).await;
        }
        debug!("Search #{} finished in state {:?}", sequence, state);
        state
    }

    async fn show(&self, sequence: u64, update: impl FnOnce(&mut Page)) -> bool {
        self.page.lock().await.apply(sequence, update)
    }

    /// Records a state transition; false once the action has been superseded.
    async fn enter(&self, sequence: u64, state: SearchState) -> bool {
        debug!("Search #{} -> {:?}", sequence, state);
        self.show(sequence, |p| p.state = state).await
    }

    async fn run(&self, sequence: u64, query: &str) -> SearchState {
        let query = query.trim();
        if query.is_empty() {
            return self.fail_search(sequence, FailureKind::Invalid).await;
        }

        self.enter(sequence, SearchState::Searching).await;
        let track = match self.proxy.search(query).await {
            Ok(track) => track,
            Err(ClientError::NotFound) => {
                let shown = self
                    .show(sequence, |p| {
                        p.song = SongPanel::Message(page::NO_SONG_FOUND.to_string())
                    })
                    .await;
                return if shown { SearchState::NotFound } else { SearchState::Superseded };
            }
            Err(e) => {
                tracing::warn!("Search #{} failed: {}", sequence, e);
                return self.fail_search(sequence, FailureKind::from(&e)).await;
            }
        };

        let Some(result) = TrackResult::from_track(&track) else {
            return self.fail_search(sequence, FailureKind::Upstream).await;
        };

        if !self.enter(sequence, SearchState::Found).await {
            return SearchState::Superseded;
        }

        self.enter(sequence, SearchState::Enriching).await;
        let genre = self.proxy.genre(result.artist_id.as_deref()).await;
        let result = result.with_genre(genre);
        let (title, artist) = (result.name.clone(), result.artist.clone());

        let shown = self
            .show(sequence, |p| {
                p.song = SongPanel::Song(result);
                p.recommendations = RecommendationList::Loading;
            })
            .await;
        if !shown {
            return SearchState::Superseded;
        }

        self.enter(sequence, SearchState::Recommending).await;
        let outcome = match self.proxy.recommend(&title, &artist).await {
            Ok(completion) => completion_text(&completion)
                .map(split_recommendations)
                .ok_or(FailureKind::Upstream),
            Err(e) => {
                tracing::warn!("Recommendations for search #{} failed: {}", sequence, e);
                Err(FailureKind::from(&e))
            }
        };

        let state = match &outcome {
            Ok(_) => SearchState::Rendered,
            Err(kind) => SearchState::Failed(*kind),
        };

        let shown = self
            .show(sequence, |p| {
                p.recommendations = match outcome {
                    Ok(songs) => RecommendationList::Songs(songs),
                    Err(_) => RecommendationList::Message(page::RECOMMENDATIONS_FAILED.to_string()),
                };
            })
            .await;

        if shown {
            state
        } else {
            SearchState::Superseded
        }
    }

    async fn fail_search(&self, sequence: u64, kind: FailureKind) -> SearchState {
        let shown = self
            .show(sequence, |p| {
                p.song = SongPanel::Message(search_failure_message(kind).to_string());
                p.recommendations = RecommendationList::Empty;
            })
            .await;

        if shown {
            SearchState::Failed(kind)
        } else {
            SearchState::Superseded
        }
    }
}
