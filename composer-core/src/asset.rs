//! Artwork assets and the asset store.
//!
//! The [`AssetStore`] maps a character identity to its parsed SVG artwork and
//! is the source of truth for what a simple character looks like. Entries are
//! added through [`crate::merge`]; removal and clearing go through the
//! [`crate::Composer`] so every mutation is followed by a durable write.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::ComposerResult;

/// The empty document substituted for artwork that fails to parse.
pub const PLACEHOLDER_SVG: &str = r#"<svg xmlns="http://www.w3.org/2000/svg"/>"#;

/// Intrinsic size of an SVG document.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct ArtworkSize {
    /// Document width.
    pub width: f32,
    /// Document height.
    pub height: f32,
}

/// Validated SVG artwork for one simple character.
#[derive(Debug, Clone, PartialEq)]
pub struct Artwork {
    source: String,
    size: ArtworkSize,
}

impl Artwork {
    /// Parse SVG text.
    ///
    /// The placeholder document parses to [`Artwork::placeholder`].
    ///
    /// # Errors
    ///
    /// Returns [`crate::ComposerError::InvalidArtwork`] if the text is not
    /// valid SVG.
    pub fn parse(source: impl Into<String>) -> ComposerResult<Self> {
        let source = source.into();
        if source == PLACEHOLDER_SVG {
            return Ok(Self::placeholder());
        }
        let tree = usvg::Tree::from_str(&source, &usvg::Options::default())?;
        let size = ArtworkSize {
            width: tree.size().width(),
            height: tree.size().height(),
        };
        Ok(Self { source, size })
    }

    /// Parse SVG text, substituting the placeholder on failure.
    ///
    /// Failures are logged as diagnostics; the returned flag is `true` when
    /// the placeholder was substituted.
    pub fn parse_or_placeholder(identity: char, source: impl Into<String>) -> (Self, bool) {
        match Self::parse(source) {
            Ok(artwork) => (artwork, false),
            Err(e) => {
                tracing::warn!("Artwork for {identity} is not valid SVG, using placeholder: {e}");
                (Self::placeholder(), true)
            }
        }
    }

    /// The empty placeholder document.
    #[must_use]
    pub fn placeholder() -> Self {
        Self {
            source: PLACEHOLDER_SVG.to_string(),
            size: ArtworkSize::default(),
        }
    }

    /// Check if this is the placeholder document.
    #[must_use]
    pub fn is_placeholder(&self) -> bool {
        self.source == PLACEHOLDER_SVG
    }

    /// The SVG text.
    #[must_use]
    pub fn source(&self) -> &str {
        &self.source
    }

    /// The intrinsic document size.
    #[must_use]
    pub const fn size(&self) -> ArtworkSize {
        self.size
    }
}

/// Serialized form of an asset store: identity to SVG text.
pub type AssetRecord = BTreeMap<char, String>;

/// Mapping from character identity to artwork.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AssetStore {
    assets: BTreeMap<char, Artwork>,
}

impl AssetStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Get the artwork for an identity.
    #[must_use]
    pub fn get(&self, identity: char) -> Option<&Artwork> {
        self.assets.get(&identity)
    }

    /// Check if an identity has artwork.
    #[must_use]
    pub fn contains(&self, identity: char) -> bool {
        self.assets.contains_key(&identity)
    }

    /// Number of stored assets.
    #[must_use]
    pub fn len(&self) -> usize {
        self.assets.len()
    }

    /// Check if the store is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.assets.is_empty()
    }

    /// Iterate over all identities.
    pub fn identities(&self) -> impl Iterator<Item = char> + '_ {
        self.assets.keys().copied()
    }

    /// Iterate over all entries.
    pub fn iter(&self) -> impl Iterator<Item = (char, &Artwork)> {
        self.assets.iter().map(|(identity, artwork)| (*identity, artwork))
    }

    /// Serialize to the durable record shape.
    #[must_use]
    pub fn to_record(&self) -> AssetRecord {
        self.assets
            .iter()
            .map(|(identity, artwork)| (*identity, artwork.source.clone()))
            .collect()
    }

    pub(crate) fn insert(&mut self, identity: char, artwork: Artwork) -> Option<Artwork> {
        self.assets.insert(identity, artwork)
    }

    pub(crate) fn remove(&mut self, identity: char) -> Option<Artwork> {
        self.assets.remove(&identity)
    }

    pub(crate) fn clear(&mut self) {
        self.assets.clear();
    }
}
