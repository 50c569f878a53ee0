//! Playback synchronization coordinator
//!
//! Bridges user intent (selecting a track) and external reality (whatever the
//! player reports as its current entry) into one "now playing" reference.
//!
//! - `selection`: the selection flow and its busy guard
//! - `sync`: pulling the external player's entry and the idempotent apply
//! - `presentation`: expand/collapse, drag tracking, play/pause toggle

mod presentation;
mod selection;
mod sync;

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio_util::sync::CancellationToken;

use crate::model::{LibraryModel, TrackSummary};
use crate::player::{ExternalPlayer, PlaybackControl};

pub use selection::SelectionOutcome;

/// Side channel for selection acknowledgement and failures
pub trait Feedback: Send + Sync {
    fn selection(&self);
    fn error(&self);
}

/// Feedback for the terminal, where there is nothing to vibrate
#[derive(Clone, Copy, Debug, Default)]
pub struct LogFeedback;

impl Feedback for LogFeedback {
    fn selection(&self) {
        tracing::trace!("Selection feedback");
    }

    fn error(&self) {
        tracing::trace!("Error feedback");
    }
}

/// The coordinator's belief about what is playing, plus presentation flags
#[derive(Clone, Debug, Default)]
pub struct NowPlaying {
    pub track: Option<TrackSummary>,
    pub is_expanded: bool,
    pub drag_offset: f32,
    /// Track id of the selection currently starting, if any
    pub starting_track: Option<String>,
    /// Bumped every time `track` is replaced
    pub revision: u64,
}

impl NowPlaying {
    pub fn is_starting_playback(&self) -> bool {
        self.starting_track.is_some()
    }

    pub fn is_starting(&self, track_id: &str) -> bool {
        self.starting_track.as_deref() == Some(track_id)
    }

    fn replace_track(&mut self, track: TrackSummary) {
        self.track = Some(track);
        self.revision += 1;
    }
}

#[derive(Clone)]
pub struct PlaybackCoordinator {
    library: LibraryModel,
    playback: Arc<dyn PlaybackControl>,
    player: Arc<dyn ExternalPlayer>,
    feedback: Arc<dyn Feedback>,
    state: Arc<Mutex<NowPlaying>>,
    observation: Arc<Mutex<Option<CancellationToken>>>,
}

impl PlaybackCoordinator {
    pub fn new(
        library: LibraryModel,
        playback: Arc<dyn PlaybackControl>,
        player: Arc<dyn ExternalPlayer>,
        feedback: Arc<dyn Feedback>,
    ) -> Self {
        Self {
            library,
            playback,
            player,
            feedback,
            state: Arc::new(Mutex::new(NowPlaying::default())),
            observation: Arc::new(Mutex::new(None)),
        }
    }

    pub fn now_playing(&self) -> NowPlaying {
        self.lock_state().clone()
    }

    fn lock_state(&self) -> MutexGuard<'_, NowPlaying> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
