//! Session configuration: display constants and durable storage keys.

use serde::{Deserialize, Serialize};

/// Default edge length of a character box, in grid units.
pub const DEFAULT_BOX_SIZE: i32 = 300;

/// Default border width around a character box, in grid units.
pub const DEFAULT_BORDER_SIZE: i32 = 6;

/// Default scale of the editing grid.
pub const DEFAULT_GRID_SCALE: f32 = 1.0;

/// Default scale of character thumbnails.
pub const DEFAULT_THUMBNAIL_SCALE: f32 = 0.25;

/// Default prefix shared by every durable storage record.
pub const DEFAULT_STORAGE_PREFIX: &str = "hanzi-composer";

/// Identities seeded from bundled artwork on first run.
pub const DEFAULT_SEED_IDENTITIES: [char; 9] = ['上', '下', '人', '口', '木', '日', '月', '言', '只'];

/// Display configuration carried in the session model.
///
/// Immutable for the lifetime of a session; missing fields in persisted
/// records fall back to the defaults.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DisplayConfig {
    /// Edge length of a character box.
    #[serde(default = "DisplayConfig::default_box_size")]
    pub box_size: i32,
    /// Border width inside a character box.
    #[serde(default = "DisplayConfig::default_border_size")]
    pub border_size: i32,
    /// Scale of the editing grid.
    #[serde(default = "DisplayConfig::default_grid_scale")]
    pub grid_scale: f32,
    /// Scale of thumbnails in character lists.
    #[serde(default = "DisplayConfig::default_thumbnail_scale")]
    pub thumbnail_scale: f32,
}

impl DisplayConfig {
    const fn default_box_size() -> i32 {
        DEFAULT_BOX_SIZE
    }

    const fn default_border_size() -> i32 {
        DEFAULT_BORDER_SIZE
    }

    const fn default_grid_scale() -> f32 {
        DEFAULT_GRID_SCALE
    }

    const fn default_thumbnail_scale() -> f32 {
        DEFAULT_THUMBNAIL_SCALE
    }

    /// Edge length of the drawable area of a fresh simple character.
    #[must_use]
    pub const fn inner_size(&self) -> i32 {
        self.box_size - self.border_size
    }
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            box_size: DEFAULT_BOX_SIZE,
            border_size: DEFAULT_BORDER_SIZE,
            grid_scale: DEFAULT_GRID_SCALE,
            thumbnail_scale: DEFAULT_THUMBNAIL_SCALE,
        }
    }
}

/// Names of the three independent durable storage records.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StorageKeys {
    prefix: String,
}

impl StorageKeys {
    /// Create keys under a custom prefix.
    #[must_use]
    pub fn with_prefix(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
        }
    }

    /// Key of the serialized session model.
    #[must_use]
    pub fn model(&self) -> String {
        format!("{}-model", self.prefix)
    }

    /// Key of the serialized asset store.
    #[must_use]
    pub fn assets(&self) -> String {
        format!("{}-simple-char-svgs", self.prefix)
    }

    /// Key of the opaque backup file handle.
    #[must_use]
    pub fn backup_handle(&self) -> String {
        format!("{}-backup-handle", self.prefix)
    }
}

impl Default for StorageKeys {
    fn default() -> Self {
        Self::with_prefix(DEFAULT_STORAGE_PREFIX)
    }
}
