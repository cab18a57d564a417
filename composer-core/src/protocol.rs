//! # Boundary Message Protocol
//!
//! Messages exchanged between the composer and its host. The host owns the
//! file pickers, file I/O and durable key-value storage; the composer only
//! asks for them and receives the results later as separate events.
//!
//! All messages are JSON objects tagged by `type`.
//!
//! ### Composer -> Host ([`Request`])
//!
//! - `{"type": "pick_simple_character_files"}`
//! - `{"type": "upload_simple_character", "identity": "识"}`
//! - `{"type": "delete_asset", "key": "...", "identity": "识"}`
//! - `{"type": "clear_assets", "key": "..."}`
//! - `{"type": "store_assets", "key": "...", "assets": {"识": "<svg ...>"}}`
//! - `{"type": "persist_model", "key": "...", "model": {...}}`
//! - `{"type": "fetch_default_assets", "identities": ["上", "下"]}`
//! - `{"type": "acquire_backup_handle", "mode": "save"}`
//! - `{"type": "store_backup_handle", "key": "...", "handle": "..."}`
//! - `{"type": "verify_permission", "handle": "...", "mode": "read_write"}`
//! - `{"type": "write_backup", "handle": "...", "contents": "..."}`
//! - `{"type": "read_backup", "handle": "..."}`
//! - `{"type": "export_character", "identity": "林", "geometry": {...}}`
//! - `{"type": "report_backup_status", "status": {"outcome": "written"}}`
//!
//! ### Host -> Composer ([`Event`])
//!
//! - `{"type": "asset_batch_ready", "files": [{"name": "上.svg", "text": "..."}]}`
//! - `{"type": "assets_loaded", "assets": {...} | null}`
//! - `{"type": "model_loaded", "model": "<json>" | null}`
//! - `{"type": "backup_handle_loaded", "handle": "..." | null}`
//! - `{"type": "asset_uploaded", "identity": "识", "text": "..."}`
//! - `{"type": "backup_handle_acquired", "handle": "..."}`
//! - `{"type": "backup_handle_dismissed"}`
//! - `{"type": "permission_resolved", "granted": true}`
//! - `{"type": "backup_written"}`
//! - `{"type": "backup_read", "contents": "..."}`
//! - `{"type": "backup_failed", "message": "..."}`
//!
//! User intents travel through the same queue (`import_simple_characters`,
//! `compose`, `backup_now`, ...).

use serde::{Deserialize, Serialize};

use crate::asset::AssetRecord;
use crate::backup::{BackupHandle, BackupStatus, HandleMode, PermissionMode};
use crate::character::{Geometry, GlyphBox};
use crate::error::{ComposerError, ComposerResult};
use crate::session::SessionModel;

/// Identity used for a file whose name is empty.
pub const SENTINEL_IDENTITY: char = '\u{FFFD}';

/// A named text file delivered by the host.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NamedFile {
    /// File name, e.g. `上.svg`.
    pub name: String,
    /// File contents.
    pub text: String,
}

impl NamedFile {
    /// Create a named file.
    #[must_use]
    pub fn new(name: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            text: text.into(),
        }
    }
}

/// Identity derived from a file name: its first Unicode scalar.
///
/// Names that start with anything other than the intended character map to
/// the wrong identity; callers name files after their character.
#[must_use]
pub fn identity_from_filename(name: &str) -> char {
    name.chars().next().unwrap_or(SENTINEL_IDENTITY)
}

/// Key a batch of files by their file-name identity.
///
/// When two files map to the same identity the later one wins.
#[must_use]
pub fn decode_asset_batch(files: &[NamedFile]) -> AssetRecord {
    files
        .iter()
        .map(|file| (identity_from_filename(&file.name), file.text.clone()))
        .collect()
}

/// Message from the host (or the user) into the composer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Event {
    // -----------------------------------------------------------------------
    // Host responses
    // -----------------------------------------------------------------------
    /// New artwork files were picked.
    AssetBatchReady {
        /// Picked files.
        files: Vec<NamedFile>,
    },
    /// The asset record was read from durable storage at startup.
    AssetsLoaded {
        /// The record, or `None` on first run.
        #[serde(default)]
        assets: Option<AssetRecord>,
    },
    /// The model record was read from durable storage at startup.
    ModelLoaded {
        /// The model as JSON text, or `None` on first run.
        #[serde(default)]
        model: Option<String>,
    },
    /// The backup handle record was read from durable storage at startup.
    BackupHandleLoaded {
        /// The handle, or `None` if no backup location was ever chosen.
        #[serde(default)]
        handle: Option<BackupHandle>,
    },
    /// A replacement asset for one identity was picked.
    AssetUploaded {
        /// Identity the upload was requested for.
        identity: char,
        /// SVG text.
        text: String,
    },
    /// The backup file picker returned a handle.
    BackupHandleAcquired {
        /// The chosen file.
        handle: BackupHandle,
    },
    /// The backup file picker was closed without a choice.
    BackupHandleDismissed,
    /// The user answered a permission prompt.
    PermissionResolved {
        /// Whether access was granted.
        granted: bool,
    },
    /// The backup file was written.
    BackupWritten,
    /// The backup file was read.
    BackupRead {
        /// File contents.
        contents: String,
    },
    /// Reading or writing the backup file failed.
    BackupFailed {
        /// Host error message.
        message: String,
    },

    // -----------------------------------------------------------------------
    // User intents
    // -----------------------------------------------------------------------
    /// Import new simple characters from files.
    ImportSimpleCharacters,
    /// Replace the artwork of one simple character.
    ReplaceSimpleCharacter {
        /// Character to replace.
        identity: char,
    },
    /// Delete one simple character and its artwork.
    DeleteSimpleCharacter {
        /// Character to delete.
        identity: char,
    },
    /// Delete all stored artwork.
    ClearSimpleCharacters,
    /// Compose a compound character.
    Compose {
        /// Identity of the new character.
        identity: char,
        /// Identities of its components, in order.
        components: Vec<char>,
    },
    /// Move or resize a simple character.
    MoveSimpleCharacter {
        /// New placement; its identity selects the character.
        placement: GlyphBox,
    },
    /// Remove a character from the session.
    RemoveCharacter {
        /// Character to remove.
        identity: char,
    },
    /// Download one character's artwork.
    ExportCharacter {
        /// Character to export.
        identity: char,
    },
    /// Choose a new backup file and write to it.
    SetBackupLocation,
    /// Write a backup to the current backup file.
    BackupNow,
    /// Restore from a backup file.
    RestoreBackup,
}

impl Event {
    /// Decode an event from JSON.
    ///
    /// # Errors
    ///
    /// Returns [`ComposerError::Decode`] if the payload has the wrong shape.
    pub fn from_json(json: &str) -> ComposerResult<Self> {
        serde_json::from_str(json).map_err(ComposerError::Decode)
    }

    /// Short name of the event for diagnostics.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::AssetBatchReady { .. } => "asset_batch_ready",
            Self::AssetsLoaded { .. } => "assets_loaded",
            Self::ModelLoaded { .. } => "model_loaded",
            Self::BackupHandleLoaded { .. } => "backup_handle_loaded",
            Self::AssetUploaded { .. } => "asset_uploaded",
            Self::BackupHandleAcquired { .. } => "backup_handle_acquired",
            Self::BackupHandleDismissed => "backup_handle_dismissed",
            Self::PermissionResolved { .. } => "permission_resolved",
            Self::BackupWritten => "backup_written",
            Self::BackupRead { .. } => "backup_read",
            Self::BackupFailed { .. } => "backup_failed",
            Self::ImportSimpleCharacters => "import_simple_characters",
            Self::ReplaceSimpleCharacter { .. } => "replace_simple_character",
            Self::DeleteSimpleCharacter { .. } => "delete_simple_character",
            Self::ClearSimpleCharacters => "clear_simple_characters",
            Self::Compose { .. } => "compose",
            Self::MoveSimpleCharacter { .. } => "move_simple_character",
            Self::RemoveCharacter { .. } => "remove_character",
            Self::ExportCharacter { .. } => "export_character",
            Self::SetBackupLocation => "set_backup_location",
            Self::BackupNow => "backup_now",
            Self::RestoreBackup => "restore_backup",
        }
    }
}

/// Message from the composer to the host.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Request {
    /// Open a multi-file picker for SVG files.
    PickSimpleCharacterFiles,
    /// Open a single-file picker for a replacement asset.
    UploadSimpleCharacter {
        /// Identity the file will be stored under.
        identity: char,
    },
    /// Delete one asset from durable storage.
    DeleteAsset {
        /// Storage key of the asset record.
        key: String,
        /// Asset to delete.
        identity: char,
    },
    /// Replace the stored asset record with an empty one.
    ///
    /// The record must stay present: a missing record at startup means a
    /// first run and brings back the seed artwork.
    ClearAssets {
        /// Storage key of the asset record.
        key: String,
    },
    /// Write the full asset record to durable storage.
    StoreAssets {
        /// Storage key of the asset record.
        key: String,
        /// The record.
        assets: AssetRecord,
    },
    /// Write the session model to durable storage.
    PersistModel {
        /// Storage key of the model record.
        key: String,
        /// The model.
        model: SessionModel,
    },
    /// Load bundled artwork; answered with [`Event::AssetBatchReady`].
    FetchDefaultAssets {
        /// Identities to load.
        identities: Vec<char>,
    },
    /// Open a backup file picker.
    AcquireBackupHandle {
        /// Save or open picker.
        mode: HandleMode,
    },
    /// Persist the backup handle for later sessions.
    StoreBackupHandle {
        /// Storage key of the handle record.
        key: String,
        /// The handle.
        handle: BackupHandle,
    },
    /// Check, and prompt for if needed, access to the backup file.
    VerifyPermission {
        /// The file.
        handle: BackupHandle,
        /// Access needed.
        mode: PermissionMode,
    },
    /// Write a snapshot to the backup file.
    WriteBackup {
        /// The file.
        handle: BackupHandle,
        /// Serialized snapshot.
        contents: String,
    },
    /// Read the backup file.
    ReadBackup {
        /// The file.
        handle: BackupHandle,
    },
    /// Offer one character's artwork as a download.
    ExportCharacter {
        /// Character to export.
        identity: char,
        /// Its flattened geometry.
        geometry: Geometry,
    },
    /// Tell the user how a backup action ended.
    ReportBackupStatus {
        /// The outcome.
        status: BackupStatus,
    },
}

impl Request {
    /// Serialize the request to JSON.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn to_json(&self) -> ComposerResult<String> {
        serde_json::to_string(self).map_err(ComposerError::Decode)
    }
}
