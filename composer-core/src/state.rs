//! Composer state management.
//!
//! [`Composer::handle`] is the single entry point: it takes one inbound
//! [`Event`], updates the session, and returns the [`Request`]s the host must
//! carry out. It never calls into the host.

use crate::asset::{AssetRecord, AssetStore};
use crate::backup::{BackupAction, BackupCoordinator, BackupStatus, BackupStep};
use crate::character::Geometry;
use crate::config::{DisplayConfig, StorageKeys, DEFAULT_SEED_IDENTITIES};
use crate::error::{ComposerError, ComposerResult};
use crate::merge::{merge, ConflictStrategy};
use crate::protocol::{decode_asset_batch, Event, Request};
use crate::schema::BackupSnapshot;
use crate::session::SessionModel;

/// The complete composer state.
#[derive(Debug, Clone)]
pub struct Composer {
    model: SessionModel,
    assets: AssetStore,
    backup: BackupCoordinator,
    keys: StorageKeys,
    seed: Vec<char>,
}

impl Composer {
    /// Create a composer with an empty session.
    #[must_use]
    pub fn new(display: DisplayConfig) -> Self {
        let keys = StorageKeys::default();
        Self {
            model: SessionModel::new(display),
            assets: AssetStore::new(),
            backup: BackupCoordinator::new(keys.backup_handle()),
            keys,
            seed: DEFAULT_SEED_IDENTITIES.to_vec(),
        }
    }

    /// Use custom storage keys.
    #[must_use]
    pub fn with_storage_keys(mut self, keys: StorageKeys) -> Self {
        self.backup = BackupCoordinator::new(keys.backup_handle());
        self.keys = keys;
        self
    }

    /// Use a custom set of seed identities for first runs.
    #[must_use]
    pub fn with_seed(mut self, seed: Vec<char>) -> Self {
        self.seed = seed;
        self
    }

    /// The session model.
    #[must_use]
    pub fn model(&self) -> &SessionModel {
        &self.model
    }

    /// The asset store.
    #[must_use]
    pub fn assets(&self) -> &AssetStore {
        &self.assets
    }

    /// The backup coordinator.
    #[must_use]
    pub fn backup(&self) -> &BackupCoordinator {
        &self.backup
    }

    /// Durable storage keys.
    #[must_use]
    pub fn storage_keys(&self) -> &StorageKeys {
        &self.keys
    }

    /// Flattened geometry of one character.
    ///
    /// # Errors
    ///
    /// Returns [`ComposerError::UnknownCharacter`] if it does not exist.
    pub fn render_geometry(&self, identity: char) -> ComposerResult<Geometry> {
        self.model
            .get(identity)
            .map(crate::Character::render_geometry)
            .ok_or(ComposerError::UnknownCharacter(identity))
    }

    /// Decode a JSON event and handle it.
    ///
    /// Malformed payloads are logged and dropped without touching state.
    pub fn handle_json(&mut self, json: &str) -> Vec<Request> {
        match Event::from_json(json) {
            Ok(event) => self.handle(event),
            Err(e) => {
                tracing::warn!("Dropping malformed event: {e}");
                Vec::new()
            }
        }
    }

    /// Handle one event and return the requests it produces.
    pub fn handle(&mut self, event: Event) -> Vec<Request> {
        tracing::debug!(event = event.name(), "Handling event");
        match event {
            Event::AssetBatchReady { files } => self.import(&decode_asset_batch(&files)),
            Event::AssetUploaded { identity, text } => {
                self.import(&AssetRecord::from([(identity, text)]))
            }
            Event::AssetsLoaded { assets } => self.assets_loaded(assets),
            Event::ModelLoaded { model } => {
                self.model_loaded(model.as_deref());
                Vec::new()
            }
            Event::BackupHandleLoaded { handle } => {
                self.backup.restore_handle(handle);
                Vec::new()
            }

            Event::BackupHandleAcquired { handle } => {
                let step = self.backup.handle_acquired(handle);
                self.run_backup_step(step)
            }
            Event::BackupHandleDismissed => {
                let step = self.backup.handle_dismissed();
                self.run_backup_step(step)
            }
            Event::PermissionResolved { granted } => {
                let step = self.backup.permission_resolved(granted);
                self.run_backup_step(step)
            }
            Event::BackupWritten => {
                let step = self.backup.written();
                self.run_backup_step(step)
            }
            Event::BackupRead { contents } => {
                let step = self.backup.read(contents);
                self.run_backup_step(step)
            }
            Event::BackupFailed { message } => {
                let step = self.backup.failed(message);
                self.run_backup_step(step)
            }

            Event::ImportSimpleCharacters => vec![Request::PickSimpleCharacterFiles],
            Event::ReplaceSimpleCharacter { identity } => self.replace_simple(identity),
            Event::DeleteSimpleCharacter { identity } => self.delete_simple(identity),
            Event::ClearSimpleCharacters => {
                self.assets.clear();
                tracing::info!("Cleared all simple character artwork");
                vec![Request::ClearAssets {
                    key: self.keys.assets(),
                }]
            }
            Event::Compose {
                identity,
                components,
            } => {
                let result = self.model.compose(identity, &components).map(|_| ());
                self.persist_if_ok(result)
            }
            Event::MoveSimpleCharacter { placement } => {
                let result = self.model.update_simple_box(placement.identity, placement);
                self.persist_if_ok(result)
            }
            Event::RemoveCharacter { identity } => {
                let result = self.model.remove_character(identity).map(|_| ());
                self.persist_if_ok(result)
            }
            Event::ExportCharacter { identity } => self.export(identity),

            Event::SetBackupLocation => {
                let step = self.backup.begin(BackupAction::SetLocation);
                self.run_backup_step(step)
            }
            Event::BackupNow => {
                let step = self.backup.begin(BackupAction::BackupNow);
                self.run_backup_step(step)
            }
            Event::RestoreBackup => {
                let step = self.backup.begin(BackupAction::Restore);
                self.run_backup_step(step)
            }
        }
    }

    // -----------------------------------------------------------------------
    // Assets
    // -----------------------------------------------------------------------

    /// Merge imported artwork (incoming wins) and add simple characters for
    /// new identities.
    fn import(&mut self, record: &AssetRecord) -> Vec<Request> {
        if record.is_empty() {
            return Vec::new();
        }
        let (merged, report) = merge(&self.assets, record, ConflictStrategy::IncomingWins);
        self.assets = merged;
        if !report.placeholders.is_empty() {
            tracing::warn!(
                "Stored placeholders for unparseable artwork: {:?}",
                report.placeholders
            );
        }

        let mut requests = vec![self.store_assets()];
        if !self.model.add_simple_characters(record.keys().copied()).is_empty() {
            requests.push(self.persist_model());
        }
        requests
    }

    /// A missing record means a first run and requests the seed artwork. An
    /// empty record is a store the user cleared and is left empty.
    fn assets_loaded(&mut self, assets: Option<AssetRecord>) -> Vec<Request> {
        let Some(record) = assets else {
            tracing::info!("No stored assets, requesting {} defaults", self.seed.len());
            return vec![Request::FetchDefaultAssets {
                identities: self.seed.clone(),
            }];
        };
        // Anything imported before storage answered is newer.
        let (merged, report) = merge(&self.assets, &record, ConflictStrategy::ExistingWins);
        self.assets = merged;
        tracing::info!("Loaded {} stored assets", report.added.len());
        Vec::new()
    }

    fn replace_simple(&self, identity: char) -> Vec<Request> {
        if self.model.get_simple(identity).is_some() {
            vec![Request::UploadSimpleCharacter { identity }]
        } else {
            tracing::warn!("Cannot replace artwork of {identity}: not a simple character");
            Vec::new()
        }
    }

    fn delete_simple(&mut self, identity: char) -> Vec<Request> {
        let removed_model = self.model.remove_simple(identity).is_ok();
        let removed_asset = self.assets.remove(identity).is_some();
        if !removed_model && !removed_asset {
            tracing::warn!("Cannot delete {identity}: no simple character or artwork");
            return Vec::new();
        }

        let mut requests = vec![Request::DeleteAsset {
            key: self.keys.assets(),
            identity,
        }];
        if removed_model {
            requests.push(self.persist_model());
        }
        requests
    }

    fn export(&self, identity: char) -> Vec<Request> {
        let geometry = match self.render_geometry(identity) {
            Ok(geometry) => geometry,
            Err(e) => {
                tracing::warn!("Cannot export: {e}");
                return Vec::new();
            }
        };
        if let Err(e) = geometry.resolve(&self.assets) {
            tracing::warn!("Cannot export {identity}: {e}");
            return Vec::new();
        }
        vec![Request::ExportCharacter { identity, geometry }]
    }

    // -----------------------------------------------------------------------
    // Model
    // -----------------------------------------------------------------------

    fn model_loaded(&mut self, json: Option<&str>) {
        let Some(json) = json else {
            tracing::info!("No stored session model");
            return;
        };
        match SessionModel::from_json(json) {
            Ok(model) => {
                tracing::info!("Loaded session model with {} characters", model.len());
                self.model = model;
            }
            Err(e) => tracing::warn!("Ignoring unreadable session model: {e}"),
        }
    }

    fn persist_if_ok(&self, result: ComposerResult<()>) -> Vec<Request> {
        match result {
            Ok(()) => vec![self.persist_model()],
            Err(e) => {
                tracing::warn!("Rejected model change: {e}");
                Vec::new()
            }
        }
    }

    fn persist_model(&self) -> Request {
        Request::PersistModel {
            key: self.keys.model(),
            model: self.model.clone(),
        }
    }

    fn store_assets(&self) -> Request {
        Request::StoreAssets {
            key: self.keys.assets(),
            assets: self.assets.to_record(),
        }
    }

    // -----------------------------------------------------------------------
    // Backup
    // -----------------------------------------------------------------------

    fn run_backup_step(&mut self, step: BackupStep) -> Vec<Request> {
        match step {
            BackupStep::Requests(requests) => requests,
            BackupStep::Write(handle) => {
                match BackupSnapshot::capture(&self.model, &self.assets).to_json() {
                    Ok(contents) => vec![Request::WriteBackup { handle, contents }],
                    Err(e) => vec![self.backup.finish(BackupStatus::Failed {
                        message: e.to_string(),
                    })],
                }
            }
            BackupStep::Apply(contents) => match self.apply_snapshot(&contents) {
                Ok(mut requests) => {
                    requests.push(self.backup.finish(BackupStatus::Restored));
                    requests
                }
                Err(e) => vec![self.backup.finish(BackupStatus::Failed {
                    message: e.to_string(),
                })],
            },
        }
    }

    /// Apply a backup file: restored artwork wins, the model is replaced.
    fn apply_snapshot(&mut self, contents: &str) -> ComposerResult<Vec<Request>> {
        let snapshot = BackupSnapshot::from_json(contents)?;
        let (merged, report) = merge(
            &self.assets,
            &snapshot.simple_char_svgs,
            ConflictStrategy::IncomingWins,
        );
        self.assets = merged;
        self.model = snapshot.model;
        tracing::info!(
            characters = self.model.len(),
            added = report.added.len(),
            replaced = report.replaced.len(),
            "Restored backup"
        );
        Ok(vec![self.store_assets(), self.persist_model()])
    }
}

impl Default for Composer {
    fn default() -> Self {
        Self::new(DisplayConfig::default())
    }
}
