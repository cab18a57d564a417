//! Error types for composer operations.

use thiserror::Error;

/// Result type for composer operations.
pub type ComposerResult<T> = Result<T, ComposerError>;

/// Errors that can occur in composer operations.
///
/// None of these are fatal to a session: callers log them and keep the
/// previous state.
#[derive(Debug, Error)]
pub enum ComposerError {
    /// No character with this identity exists in the session model.
    #[error("Character not found: {0}")]
    UnknownCharacter(char),

    /// A simple character has no artwork in the asset store.
    #[error("No artwork stored for simple character: {0}")]
    MissingAsset(char),

    /// The requested change would break the composition model.
    #[error("Invalid operation: {0}")]
    InvalidOperation(String),

    /// Artwork text is not valid SVG markup.
    #[error("Invalid artwork: {0}")]
    InvalidArtwork(#[from] usvg::Error),

    /// An inbound payload did not match the expected shape.
    #[error("Decode error: {0}")]
    Decode(#[from] serde_json::Error),

    /// A backup snapshot was present but unusable.
    #[error("Malformed backup: {0}")]
    MalformedBackup(String),
}
