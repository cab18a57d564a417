//! Canonical serialized representation of a backup file.

use serde::{Deserialize, Serialize};

use crate::asset::{AssetRecord, AssetStore};
use crate::error::{ComposerError, ComposerResult};
use crate::session::SessionModel;

/// Self-contained export of a session and its artwork.
///
/// Both fields are mandatory; a file missing either is rejected whole.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BackupSnapshot {
    /// The session model.
    pub model: SessionModel,
    /// Artwork text keyed by identity.
    #[serde(rename = "simpleCharSvgs")]
    pub simple_char_svgs: AssetRecord,
}

impl BackupSnapshot {
    /// Capture a snapshot of the model and assets.
    #[must_use]
    pub fn capture(model: &SessionModel, assets: &AssetStore) -> Self {
        Self {
            model: model.clone(),
            simple_char_svgs: assets.to_record(),
        }
    }

    /// Serialize the snapshot for the backup file.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn to_json(&self) -> ComposerResult<String> {
        serde_json::to_string_pretty(self).map_err(ComposerError::Decode)
    }

    /// Parse a backup file.
    ///
    /// # Errors
    ///
    /// Returns [`ComposerError::MalformedBackup`] if the file is not a
    /// complete snapshot.
    pub fn from_json(json: &str) -> ComposerResult<Self> {
        serde_json::from_str(json).map_err(|e| ComposerError::MalformedBackup(e.to_string()))
    }
}
