//! # Hanzi Composer Core
//!
//! Character composition and persistence synchronization for the Hanzi
//! composer. Compiles to WASM for the browser host.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────┐
//! │            composer-core.wasm               │
//! ├─────────────────────────────────────────────┤
//! │  Character Model  │  Asset Store            │
//! │  - Simple glyphs  │  - Parsed SVG artwork   │
//! │  - Compounds      │  - Merge (last wins)    │
//! │  - Geometry       │                         │
//! ├─────────────────────────────────────────────┤
//! │  Composer         │  Backup Coordinator     │
//! │  - Event -> Reqs  │  - Handle/permission    │
//! │  - Event loop     │  - Snapshot round trip  │
//! └─────────────────────────────────────────────┘
//! ```
//!
//! The host (browser glue, or any [`Boundary`] implementation) performs all
//! file and storage I/O and feeds the results back as [`Event`]s.

#![forbid(unsafe_code)]
#![deny(missing_docs)]
#![deny(clippy::all)]
#![deny(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod asset;
pub mod backup;
pub mod character;
pub mod config;
pub mod error;
pub mod merge;
pub mod protocol;
pub mod runtime;
pub mod schema;
pub mod session;
pub mod state;

#[cfg(feature = "wasm")]
pub mod wasm;

pub use asset::{Artwork, ArtworkSize, AssetRecord, AssetStore, PLACEHOLDER_SVG};
pub use backup::{
    BackupAction, BackupCoordinator, BackupHandle, BackupPhase, BackupStatus, HandleMode,
    PermissionMode,
};
pub use character::{
    identity_of, Character, CharacterKind, CompoundCharacter, Geometry, GlyphBox, SimpleCharacter,
};
pub use config::{DisplayConfig, StorageKeys};
pub use error::{ComposerError, ComposerResult};
pub use merge::{merge, ConflictStrategy, MergeReport};
pub use protocol::{decode_asset_batch, identity_from_filename, Event, NamedFile, Request};
pub use runtime::{Boundary, EventLoop};
pub use schema::BackupSnapshot;
pub use session::SessionModel;
pub use state::Composer;

/// Composer core version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
