//! Track summaries and the playable items behind them

use super::palette::{ArtworkColor, ArtworkPalette};

/// Preferred edge length when picking among several artwork renditions
pub const PREFERRED_ARTWORK_SIZE: u32 = 600;

/// Artwork reference plus whatever color samples the catalog supplied
#[derive(Clone, Debug, PartialEq)]
pub struct Artwork {
    pub url: String,
    pub width: Option<u32>,
    pub height: Option<u32>,
    pub background_color: Option<ArtworkColor>,
    pub primary_text_color: Option<ArtworkColor>,
    pub secondary_text_color: Option<ArtworkColor>,
}

impl Artwork {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            width: None,
            height: None,
            background_color: None,
            primary_text_color: None,
            secondary_text_color: None,
        }
    }

    pub fn with_colors(
        mut self,
        background: Option<ArtworkColor>,
        primary_text: Option<ArtworkColor>,
        secondary_text: Option<ArtworkColor>,
    ) -> Self {
        self.background_color = background;
        self.primary_text_color = primary_text;
        self.secondary_text_color = secondary_text;
        self
    }

    pub fn palette(&self) -> Option<ArtworkPalette> {
        ArtworkPalette::from_samples(
            self.background_color,
            self.primary_text_color,
            self.secondary_text_color,
        )
    }

    /// Pick the rendition whose largest edge is closest to `size`.
    pub fn closest_to(candidates: Vec<Artwork>, size: u32) -> Option<Artwork> {
        candidates.into_iter().min_by_key(|artwork| {
            let edge = artwork.width.max(artwork.height).unwrap_or(0);
            edge.abs_diff(size)
        })
    }
}

/// The catalog entity handed to the external player
#[derive(Clone, Debug, PartialEq)]
pub struct PlayableItem {
    pub id: String,
    pub uri: String,
    pub title: String,
    pub artist: String,
    pub album: String,
    pub duration_ms: u32,
    pub artwork: Option<Artwork>,
}

/// Display-oriented projection of a catalog item.
///
/// Equality covers id, title, artist and artwork URL. The palette is derived
/// and may show up later at a different fidelity, so it does not take part.
#[derive(Clone, Debug)]
pub struct TrackSummary {
    pub id: String,
    pub title: String,
    pub artist: String,
    pub artwork: Option<Artwork>,
    pub artwork_url: Option<String>,
    pub artwork_palette: Option<ArtworkPalette>,
}

impl TrackSummary {
    pub fn new(
        id: impl Into<String>,
        title: impl Into<String>,
        artist: impl Into<String>,
        artwork: Option<Artwork>,
    ) -> Self {
        let artwork_url = artwork.as_ref().map(|a| a.url.clone());
        let artwork_palette = artwork.as_ref().and_then(Artwork::palette);
        Self {
            id: id.into(),
            title: title.into(),
            artist: artist.into(),
            artwork,
            artwork_url,
            artwork_palette,
        }
    }

    pub fn from_item(item: &PlayableItem) -> Self {
        Self::new(
            item.id.clone(),
            item.title.clone(),
            item.artist.clone(),
            item.artwork.clone(),
        )
    }

    pub fn artwork_background_color(&self) -> Option<ArtworkColor> {
        self.artwork_palette.map(|p| p.background_color())
    }

    pub fn artwork_highlight_color(&self) -> Option<ArtworkColor> {
        self.artwork_palette.map(|p| p.highlight_color())
    }

    pub fn artwork_gradient_colors(&self) -> Option<[ArtworkColor; 2]> {
        self.artwork_palette.map(|p| p.gradient_colors())
    }

    pub fn artwork_primary_text_color(&self) -> Option<ArtworkColor> {
        self.artwork_palette.and_then(|p| p.primary_text_color())
    }

    pub fn artwork_secondary_text_color(&self) -> Option<ArtworkColor> {
        self.artwork_palette.and_then(|p| p.secondary_text_color())
    }

    /// False when there is no palette to judge by.
    pub fn prefers_light_content(&self) -> bool {
        self.artwork_palette
            .map(|p| p.prefers_light_content())
            .unwrap_or(false)
    }
}

impl PartialEq for TrackSummary {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
            && self.title == other.title
            && self.artist == other.artist
            && self.artwork_url == other.artwork_url
    }
}

impl Eq for TrackSummary {}
