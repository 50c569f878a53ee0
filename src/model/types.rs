//! Core type definitions for the application

use std::fmt;
use std::time::Instant;

/// Catalog access as reported by the library client
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum AuthorizationStatus {
    Authorized,
    Denied,
    Restricted,
    NotDetermined,
    /// A status this client does not know how to interpret. Treated as denied.
    Unknown(String),
}

/// Library lifecycle state
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum LibraryState {
    #[default]
    Idle,
    Authorizing,
    Unauthorized,
    Loading,
    Loaded,
    Failed(String),
}

impl LibraryState {
    pub fn is_busy(&self) -> bool {
        matches!(self, Self::Idle | Self::Authorizing | Self::Loading)
    }
}

impl fmt::Display for LibraryState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Idle => write!(f, "idle"),
            Self::Authorizing => write!(f, "authorizing"),
            Self::Unauthorized => write!(f, "unauthorized"),
            Self::Loading => write!(f, "loading"),
            Self::Loaded => write!(f, "loaded"),
            Self::Failed(message) => write!(f, "failed({})", message),
        }
    }
}

/// Playback status reported by the external player
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PlaybackStatus {
    Playing,
    Paused,
    SeekingForward,
    SeekingBackward,
    Other,
}

impl PlaybackStatus {
    /// Playing or actively seeking
    pub fn is_active(self) -> bool {
        matches!(
            self,
            Self::Playing | Self::SeekingForward | Self::SeekingBackward
        )
    }
}

/// Terminal UI state
#[derive(Clone, Debug, Default)]
pub struct UiState {
    pub selected: usize,
    pub error_message: Option<String>,
    pub error_timestamp: Option<Instant>,
    pub show_help_popup: bool,
    pub should_quit: bool,
    /// Row where a mouse drag on the expanded player began
    pub drag_origin: Option<u16>,
}
