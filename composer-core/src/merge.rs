//! # Asset Merging
//!
//! Reconciles an incoming batch of artwork with the existing asset store.
//!
//! ## Rules
//!
//! ```text
//! key only in incoming  -> incoming value (added)
//! key only in existing  -> existing value (untouched)
//! key in both           -> decided by ConflictStrategy
//! ```
//!
//! Imports and restores use [`ConflictStrategy::IncomingWins`], so importing
//! a file for an existing identity overwrites its artwork.

use serde::{Deserialize, Serialize};

use crate::asset::{Artwork, AssetRecord, AssetStore};

/// How to resolve an identity present in both stores.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ConflictStrategy {
    /// Incoming artwork replaces existing artwork (last writer wins).
    #[default]
    IncomingWins,
    /// Existing artwork is kept.
    ExistingWins,
}

/// Summary of a merge.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MergeReport {
    /// Identities that were not in the existing store.
    pub added: Vec<char>,
    /// Identities whose existing artwork was replaced.
    pub replaced: Vec<char>,
    /// Identities whose incoming artwork was kept out by the strategy.
    pub kept: Vec<char>,
    /// Identities whose incoming artwork failed to parse.
    pub placeholders: Vec<char>,
}

impl MergeReport {
    /// Check whether the merge changed the store.
    #[must_use]
    pub fn changed(&self) -> bool {
        !self.added.is_empty() || !self.replaced.is_empty()
    }
}

/// Merge an incoming record into `existing`, returning the new store.
///
/// Incoming text that is not valid SVG becomes the placeholder document; it
/// never blocks the rest of the batch.
#[must_use]
pub fn merge(
    existing: &AssetStore,
    incoming: &AssetRecord,
    strategy: ConflictStrategy,
) -> (AssetStore, MergeReport) {
    let mut merged = existing.clone();
    let mut report = MergeReport::default();

    for (&identity, source) in incoming {
        let in_existing = existing.contains(identity);
        if in_existing && strategy == ConflictStrategy::ExistingWins {
            report.kept.push(identity);
            continue;
        }

        let (artwork, substituted) = Artwork::parse_or_placeholder(identity, source.as_str());
        if substituted {
            report.placeholders.push(identity);
        }
        merged.insert(identity, artwork);

        if in_existing {
            report.replaced.push(identity);
        } else {
            report.added.push(identity);
        }
    }

    tracing::debug!(
        added = report.added.len(),
        replaced = report.replaced.len(),
        placeholders = report.placeholders.len(),
        "Merged asset batch"
    );
    (merged, report)
}

/// Build a store from a durable record.
#[must_use]
pub fn from_record(record: &AssetRecord) -> (AssetStore, MergeReport) {
    merge(&AssetStore::new(), record, ConflictStrategy::IncomingWins)
}
