//! Model module - Library state and data types
//!
//! - `types`: Core type definitions (authorization, library and playback states)
//! - `palette`: Artwork color samples and the colors derived from them
//! - `track`: Track summaries and playable items
//! - `library_client`: Library client capability plus the fixture client
//! - `spotify_client`: Live client backed by the Spotify Web API
//! - `library`: The library state machine

mod types;
mod palette;
mod track;
mod library_client;
mod spotify_client;
mod library;

pub use types::{LibraryState, PlaybackStatus, UiState};

pub use palette::ArtworkColor;

pub use track::{PlayableItem, TrackSummary};

pub use library_client::{FixtureLibraryClient, LibraryClient};

pub use spotify_client::SpotifyClient;

pub use library::{LibraryModel, LibrarySnapshot};

#[cfg(test)]
pub use types::AuthorizationStatus;
#[cfg(test)]
pub use track::Artwork;
#[cfg(test)]
pub use library_client::LibraryPayload;
