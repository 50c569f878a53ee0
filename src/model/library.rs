//! Library state machine
//!
//! Sequences authorization and fetching, and owns the loaded track list along
//! with the playable items behind it. Transitions:
//!
//! ```text
//! Idle -> Authorizing -> Unauthorized | Loading -> Loaded | Failed
//! Loaded | Failed -> Loading          (reload)
//! Unauthorized -> Authorizing         (request_authorization)
//! ```
//!
//! Overlapping calls are not serialized against each other. If a reload is
//! issued while another load is pending, whichever completes last wins.

use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

use super::library_client::LibraryClient;
use super::track::{PlayableItem, TrackSummary};
use super::types::{AuthorizationStatus, LibraryState};

/// Fixed fetch page size
pub const LIBRARY_PAGE_SIZE: usize = 200;

#[derive(Default)]
struct LibraryData {
    state: LibraryState,
    tracks: Vec<TrackSummary>,
    queue: Vec<PlayableItem>,
    lookup: HashMap<String, PlayableItem>,
}

/// Read-only view for rendering
#[derive(Clone, Debug, Default)]
pub struct LibrarySnapshot {
    pub state: LibraryState,
    pub tracks: Vec<TrackSummary>,
}

#[derive(Clone)]
pub struct LibraryModel {
    client: Arc<dyn LibraryClient>,
    data: Arc<RwLock<LibraryData>>,
}

impl LibraryModel {
    pub fn new(client: Arc<dyn LibraryClient>) -> Self {
        Self {
            client,
            data: Arc::new(RwLock::new(LibraryData::default())),
        }
    }

    /// Check access without prompting, then load or prompt as needed.
    pub async fn start(&self) {
        let status = self.client.authorization_status();
        tracing::debug!(status = ?status, "Library start");
        match status {
            AuthorizationStatus::Authorized => self.load_songs().await,
            AuthorizationStatus::NotDetermined => self.request_authorization().await,
            AuthorizationStatus::Denied
            | AuthorizationStatus::Restricted
            | AuthorizationStatus::Unknown(_) => {
                self.set_state(LibraryState::Unauthorized).await;
            }
        }
    }

    pub async fn request_authorization(&self) {
        self.set_state(LibraryState::Authorizing).await;
        let status = self.client.request_authorization().await;
        tracing::info!(status = ?status, "Authorization request finished");
        match status {
            AuthorizationStatus::Authorized => self.load_songs().await,
            _ => self.set_state(LibraryState::Unauthorized).await,
        }
    }

    /// Re-run the fetch regardless of the current state.
    pub async fn reload(&self) {
        self.load_songs().await;
    }

    pub async fn song_for(&self, track_id: &str) -> Option<PlayableItem> {
        self.data.read().await.lookup.get(track_id).cloned()
    }

    pub async fn playback_queue(&self) -> Vec<PlayableItem> {
        self.data.read().await.queue.clone()
    }

    pub async fn contains_track(&self, track_id: &str) -> bool {
        self.data
            .read()
            .await
            .tracks
            .iter()
            .any(|t| t.id == track_id)
    }

    pub async fn state(&self) -> LibraryState {
        self.data.read().await.state.clone()
    }

    pub async fn tracks(&self) -> Vec<TrackSummary> {
        self.data.read().await.tracks.clone()
    }

    pub async fn snapshot(&self) -> LibrarySnapshot {
        let data = self.data.read().await;
        LibrarySnapshot {
            state: data.state.clone(),
            tracks: data.tracks.clone(),
        }
    }

    async fn set_state(&self, state: LibraryState) {
        let mut data = self.data.write().await;
        tracing::debug!(from = %data.state, to = %state, "Library state transition");
        data.state = state;
    }

    async fn load_songs(&self) {
        self.set_state(LibraryState::Loading).await;

        // The lock is released while the fetch is pending.
        let result = self.client.fetch_library(LIBRARY_PAGE_SIZE).await;

        match result {
            Ok(payload) => {
                let lookup = payload
                    .items
                    .iter()
                    .map(|item| (item.id.clone(), item.clone()))
                    .collect();

                let mut data = self.data.write().await;
                tracing::info!(
                    tracks = payload.tracks.len(),
                    items = payload.items.len(),
                    "Library loaded"
                );
                data.tracks = payload.tracks;
                data.queue = payload.items;
                data.lookup = lookup;
                tracing::debug!(
                    from = %data.state,
                    to = %LibraryState::Loaded,
                    "Library state transition"
                );
                data.state = LibraryState::Loaded;
            }
            Err(e) => {
                tracing::error!(error = %e, "Library fetch failed");
                self.set_state(LibraryState::Failed(format!("{:#}", e))).await;
            }
        }
    }
}
