//! In-memory host for integration tests.
//!
//! Simulates the browser side of the protocol: a key-value store, backup
//! files addressed by handle tokens, and scripted answers to pickers and
//! permission prompts.

#![allow(dead_code)]

use std::collections::{BTreeMap, HashMap, HashSet, VecDeque};

use composer_core::{
    AssetRecord, BackupHandle, BackupStatus, Boundary, Event, Geometry, HandleMode, NamedFile,
    Request, StorageKeys,
};

/// Install a test-friendly tracing subscriber (once per process).
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// A small valid SVG document with a distinguishing stroke.
pub fn svg(stroke: &str) -> String {
    format!(
        r#"<svg xmlns="http://www.w3.org/2000/svg" width="100" height="100" viewBox="0 0 100 100"><path d="M10 10 L90 90" stroke="{stroke}"/></svg>"#
    )
}

/// Scripted host with in-memory storage.
#[derive(Debug, Default)]
pub struct MemoryHost {
    /// Durable key-value storage.
    pub storage: HashMap<String, String>,
    /// Backup files keyed by handle token.
    pub files: HashMap<String, String>,
    /// Handle tokens whose files have gone away.
    pub stale: HashSet<String>,
    /// Batches returned by successive multi-file pickers.
    pub picks: VecDeque<Vec<NamedFile>>,
    /// Texts returned by successive single-file upload pickers.
    pub uploads: VecDeque<String>,
    /// Handle returned by the next save picker; `None` dismisses it.
    pub save_target: Option<String>,
    /// Handle returned by the next open picker; `None` dismisses it.
    pub open_target: Option<String>,
    /// Answer to permission prompts.
    pub grant_permission: bool,
    /// Bundled seed artwork.
    pub bundled: BTreeMap<char, String>,
    /// Export downloads offered to the user.
    pub downloads: Vec<(char, Geometry)>,
    /// Backup outcomes shown to the user.
    pub statuses: Vec<BackupStatus>,
    /// Every request received, in order.
    pub log: Vec<Request>,
}

impl MemoryHost {
    /// A host that grants every permission.
    pub fn new() -> Self {
        Self {
            grant_permission: true,
            ..Self::default()
        }
    }

    /// Events a fresh page load would send, read from storage.
    pub fn startup_events(&self, keys: &StorageKeys) -> Vec<Event> {
        let assets = self
            .storage
            .get(&keys.assets())
            .map(|json| serde_json::from_str::<AssetRecord>(json).expect("stored record"));
        vec![
            Event::ModelLoaded {
                model: self.storage.get(&keys.model()).cloned(),
            },
            Event::AssetsLoaded { assets },
            Event::BackupHandleLoaded {
                handle: self.storage.get(&keys.backup_handle()).map(BackupHandle::new),
            },
        ]
    }

    /// The stored asset record, if any.
    pub fn stored_assets(&self, keys: &StorageKeys) -> Option<AssetRecord> {
        self.storage
            .get(&keys.assets())
            .map(|json| serde_json::from_str(json).expect("stored record"))
    }

    fn update_record(&mut self, key: &str, f: impl FnOnce(&mut AssetRecord)) {
        let mut record: AssetRecord = self
            .storage
            .get(key)
            .map(|json| serde_json::from_str(json).expect("stored record"))
            .unwrap_or_default();
        f(&mut record);
        self.storage.insert(
            key.to_string(),
            serde_json::to_string(&record).expect("serialize record"),
        );
    }
}

impl Boundary for MemoryHost {
    fn dispatch(&mut self, request: Request) -> Vec<Event> {
        self.log.push(request.clone());
        match request {
            Request::PickSimpleCharacterFiles => self
                .picks
                .pop_front()
                .map(|files| Event::AssetBatchReady { files })
                .into_iter()
                .collect(),
            Request::UploadSimpleCharacter { identity } => self
                .uploads
                .pop_front()
                .map(|text| Event::AssetUploaded { identity, text })
                .into_iter()
                .collect(),
            Request::DeleteAsset { key, identity } => {
                self.update_record(&key, |record| {
                    record.remove(&identity);
                });
                Vec::new()
            }
            Request::ClearAssets { key } => {
                self.update_record(&key, AssetRecord::clear);
                Vec::new()
            }
            Request::StoreAssets { key, assets } => {
                self.update_record(&key, |record| *record = assets);
                Vec::new()
            }
            Request::PersistModel { key, model } => {
                self.storage
                    .insert(key, model.to_json().expect("serialize model"));
                Vec::new()
            }
            Request::FetchDefaultAssets { identities } => {
                let files = identities
                    .iter()
                    .filter_map(|c| {
                        self.bundled
                            .get(c)
                            .map(|text| NamedFile::new(format!("{c}.svg"), text.clone()))
                    })
                    .collect();
                vec![Event::AssetBatchReady { files }]
            }
            Request::AcquireBackupHandle { mode } => {
                let target = match mode {
                    HandleMode::Save => self.save_target.clone(),
                    HandleMode::Open => self.open_target.clone(),
                };
                vec![match target {
                    Some(token) => Event::BackupHandleAcquired {
                        handle: BackupHandle::new(token),
                    },
                    None => Event::BackupHandleDismissed,
                }]
            }
            Request::StoreBackupHandle { key, handle } => {
                self.storage.insert(key, handle.as_str().to_string());
                Vec::new()
            }
            Request::VerifyPermission { handle, .. } => {
                if self.stale.contains(handle.as_str()) {
                    return vec![Event::BackupFailed {
                        message: format!("{handle} no longer exists"),
                    }];
                }
                vec![Event::PermissionResolved {
                    granted: self.grant_permission,
                }]
            }
            Request::WriteBackup { handle, contents } => {
                if self.stale.contains(handle.as_str()) {
                    return vec![Event::BackupFailed {
                        message: format!("{handle} no longer exists"),
                    }];
                }
                self.files.insert(handle.as_str().to_string(), contents);
                vec![Event::BackupWritten]
            }
            Request::ReadBackup { handle } => match self.files.get(handle.as_str()) {
                Some(contents) if !self.stale.contains(handle.as_str()) => {
                    vec![Event::BackupRead {
                        contents: contents.clone(),
                    }]
                }
                _ => vec![Event::BackupFailed {
                    message: format!("cannot read {handle}"),
                }],
            },
            Request::ExportCharacter { identity, geometry } => {
                self.downloads.push((identity, geometry));
                Vec::new()
            }
            Request::ReportBackupStatus { status } => {
                self.statuses.push(status);
                Vec::new()
            }
        }
    }
}
