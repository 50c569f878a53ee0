//! Artwork palette derivation
//!
//! Converts raw artwork color samples into the small set of colors the player
//! surfaces use. Everything here is pure and deterministic.

/// Luminance below which a background is considered dark
pub const LIGHT_CONTENT_THRESHOLD: f64 = 0.45;

const HIGHLIGHT_OFFSET: f64 = 0.08;
const GRADIENT_TOP_OFFSET: f64 = 0.12;
const GRADIENT_BOTTOM_OFFSET: f64 = -0.05;

fn clamp01(value: f64) -> f64 {
    if value.is_nan() {
        0.0
    } else {
        value.clamp(0.0, 1.0)
    }
}

/// Light foreground content is preferred strictly below the threshold.
pub fn prefers_light_content(luminance: f64) -> bool {
    luminance < LIGHT_CONTENT_THRESHOLD
}

/// A normalized RGBA color sample, every channel in [0, 1]
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ArtworkColor {
    red: f64,
    green: f64,
    blue: f64,
    alpha: f64,
}

impl ArtworkColor {
    pub fn new(red: f64, green: f64, blue: f64, alpha: f64) -> Self {
        Self {
            red: clamp01(red),
            green: clamp01(green),
            blue: clamp01(blue),
            alpha: clamp01(alpha),
        }
    }

    pub fn from_rgba8(red: u8, green: u8, blue: u8, alpha: u8) -> Self {
        Self::new(
            f64::from(red) / 255.0,
            f64::from(green) / 255.0,
            f64::from(blue) / 255.0,
            f64::from(alpha) / 255.0,
        )
    }

    /// Build a sample from a raw component list.
    ///
    /// A single component is treated as gray, missing alpha is opaque.
    /// Returns `None` for an empty list.
    pub fn from_components(components: &[f64]) -> Option<Self> {
        let red = *components.first()?;
        let green = components.get(1).copied().unwrap_or(red);
        let blue = components.get(2).copied().unwrap_or(red);
        let alpha = components.get(3).copied().unwrap_or(1.0);
        Some(Self::new(red, green, blue, alpha))
    }

    /// Relative luminance (Rec. 709 weights)
    pub fn luminance(&self) -> f64 {
        0.2126 * self.red + 0.7152 * self.green + 0.0722 * self.blue
    }

    /// Offset every color channel by `amount`. Alpha is left as is.
    pub fn adjusted_by(&self, amount: f64) -> Self {
        Self::new(
            self.red + amount,
            self.green + amount,
            self.blue + amount,
            self.alpha,
        )
    }

    /// Channels as 8-bit values, alpha dropped
    pub fn to_rgb8(&self) -> (u8, u8, u8) {
        let scale = |c: f64| (c * 255.0).round() as u8;
        (scale(self.red), scale(self.green), scale(self.blue))
    }
}

/// Colors sampled from a track's artwork
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ArtworkPalette {
    pub background: ArtworkColor,
    pub primary_text: Option<ArtworkColor>,
    pub secondary_text: Option<ArtworkColor>,
}

impl ArtworkPalette {
    /// A palette exists only when a background sample is available.
    pub fn from_samples(
        background: Option<ArtworkColor>,
        primary_text: Option<ArtworkColor>,
        secondary_text: Option<ArtworkColor>,
    ) -> Option<Self> {
        Some(Self {
            background: background?,
            primary_text,
            secondary_text,
        })
    }

    pub fn luminance(&self) -> f64 {
        self.background.luminance()
    }

    /// True when the background is dark enough that light foreground
    /// content reads better on it.
    pub fn prefers_light_content(&self) -> bool {
        prefers_light_content(self.luminance())
    }

    pub fn background_color(&self) -> ArtworkColor {
        self.background
    }

    pub fn highlight_color(&self) -> ArtworkColor {
        self.background.adjusted_by(HIGHLIGHT_OFFSET)
    }

    /// Top-to-bottom gradient stops
    pub fn gradient_colors(&self) -> [ArtworkColor; 2] {
        [
            self.background.adjusted_by(GRADIENT_TOP_OFFSET),
            self.background.adjusted_by(GRADIENT_BOTTOM_OFFSET),
        ]
    }

    pub fn primary_text_color(&self) -> Option<ArtworkColor> {
        self.primary_text
    }

    pub fn secondary_text_color(&self) -> Option<ArtworkColor> {
        self.secondary_text
    }
}
