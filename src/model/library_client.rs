//! Library client capability and the in-memory fixture implementation

use anyhow::Result;
use async_trait::async_trait;

use super::palette::ArtworkColor;
use super::track::{Artwork, PlayableItem, TrackSummary};
use super::types::AuthorizationStatus;

/// Tracks plus the playable items backing them, in fetch order
#[derive(Clone, Debug, Default)]
pub struct LibraryPayload {
    pub tracks: Vec<TrackSummary>,
    pub items: Vec<PlayableItem>,
}

impl LibraryPayload {
    pub fn from_items(items: Vec<PlayableItem>) -> Self {
        let tracks = items.iter().map(TrackSummary::from_item).collect();
        Self { tracks, items }
    }
}

/// Gateway to the user's music catalog
#[async_trait]
pub trait LibraryClient: Send + Sync {
    /// Current access without prompting the user
    fn authorization_status(&self) -> AuthorizationStatus;

    /// Prompt the user for access
    async fn request_authorization(&self) -> AuthorizationStatus;

    async fn fetch_library(&self, limit: usize) -> Result<LibraryPayload>;
}

/// Canned library for headless runs. It has no playable items, so selecting
/// a track only presents it.
#[derive(Clone, Debug)]
pub struct FixtureLibraryClient {
    tracks: Vec<TrackSummary>,
}

impl FixtureLibraryClient {
    pub fn new() -> Self {
        let fixture = |id: &str, title: &str, artist: &str, rgb: (u8, u8, u8)| {
            let artwork = Artwork::new(format!("fixture://artwork/{}", id)).with_colors(
                Some(ArtworkColor::from_rgba8(rgb.0, rgb.1, rgb.2, 255)),
                ArtworkColor::from_components(&[1.0]),
                ArtworkColor::from_components(&[0.85]),
            );
            TrackSummary::new(id, title, artist, Some(artwork))
        };

        Self {
            tracks: vec![
                fixture("fixture-1", "Sunshine Dance", "DJ Sprout", (242, 201, 76)),
                fixture("fixture-2", "Rainbow Parade", "Lil Beats", (126, 87, 194)),
                fixture("fixture-3", "Starlight Lullaby", "Dream Band", (18, 32, 64)),
            ],
        }
    }
}

impl Default for FixtureLibraryClient {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl LibraryClient for FixtureLibraryClient {
    fn authorization_status(&self) -> AuthorizationStatus {
        AuthorizationStatus::Authorized
    }

    async fn request_authorization(&self) -> AuthorizationStatus {
        AuthorizationStatus::Authorized
    }

    async fn fetch_library(&self, limit: usize) -> Result<LibraryPayload> {
        tracing::debug!(limit, "Serving fixture library");
        Ok(LibraryPayload {
            tracks: self.tracks.iter().take(limit).cloned().collect(),
            items: Vec::new(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn fixtures_are_authorized_and_have_no_items() {
        let client = FixtureLibraryClient::new();
        assert_eq!(client.authorization_status(), AuthorizationStatus::Authorized);

        let payload = client.fetch_library(200).await.unwrap();
        assert_eq!(payload.tracks.len(), 3);
        assert!(payload.items.is_empty());
        assert_eq!(payload.tracks[0].title, "Sunshine Dance");
    }

    #[tokio::test]
    async fn fixture_palettes_follow_background_brightness() {
        let payload = FixtureLibraryClient::new().fetch_library(200).await.unwrap();
        // Bright yellow artwork wants dark text, deep navy wants light text.
        assert!(!payload.tracks[0].prefers_light_content());
        assert!(payload.tracks[2].prefers_light_content());
    }

    #[test]
    fn payload_from_items_keeps_order() {
        let item = |id: &str| PlayableItem {
            id: id.to_string(),
            uri: format!("spotify:track:{}", id),
            title: id.to_uppercase(),
            artist: "Artist".to_string(),
            album: "Album".to_string(),
            duration_ms: 0,
            artwork: None,
        };
        let payload = LibraryPayload::from_items(vec![item("b"), item("a")]);
        let ids: Vec<_> = payload.tracks.iter().map(|t| t.id.as_str()).collect();
        assert_eq!(ids, ["b", "a"]);
    }
}
