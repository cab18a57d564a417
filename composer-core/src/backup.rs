//! Backup and restore coordination.
//!
//! Each backup action walks through a small state machine:
//!
//! ```text
//! Idle -> AwaitingHandle -> AwaitingPermission -> Writing | Reading -> Idle
//!              |                    |                   |
//!              +---- dismissed -----+---- denied -------+---- failed --> Idle
//! ```
//!
//! The coordinator only sequences the steps. Building and applying the
//! snapshot is done by [`crate::Composer`], which owns the model and assets.

use serde::{Deserialize, Serialize};

use crate::protocol::Request;

/// Opaque reference to the user's backup file, issued by the host.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BackupHandle(String);

impl BackupHandle {
    /// Wrap a host-issued handle token.
    #[must_use]
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    /// The host token.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for BackupHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Kind of file picker to open.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HandleMode {
    /// Choose or create a file to write.
    Save,
    /// Choose an existing file to read.
    Open,
}

/// Access needed on a backup file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PermissionMode {
    /// Read only.
    Read,
    /// Read and write.
    ReadWrite,
}

/// A user-triggered backup action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BackupAction {
    /// Choose a new backup file, then write to it.
    SetLocation,
    /// Write to the current backup file.
    BackupNow,
    /// Read a backup file and apply it.
    Restore,
}

/// How a backup action ended.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum BackupStatus {
    /// The snapshot was written.
    Written,
    /// A snapshot was read and applied.
    Restored,
    /// The user dismissed the picker or denied permission.
    Aborted,
    /// File I/O failed or the snapshot was unusable.
    Failed {
        /// What went wrong.
        message: String,
    },
    /// Another backup action was still running.
    Rejected {
        /// Why the action was not started.
        reason: String,
    },
}

/// Current step of the running backup action.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum BackupPhase {
    /// No action running.
    #[default]
    Idle,
    /// Waiting for the file picker.
    AwaitingHandle {
        /// The running action.
        action: BackupAction,
    },
    /// Waiting for the permission prompt.
    AwaitingPermission {
        /// The running action.
        action: BackupAction,
        /// File the permission is for.
        handle: BackupHandle,
    },
    /// Waiting for the snapshot write.
    Writing {
        /// Target file.
        handle: BackupHandle,
    },
    /// Waiting for the snapshot read.
    Reading {
        /// Source file.
        handle: BackupHandle,
    },
}

/// What the composer must do after a coordinator transition.
#[derive(Debug, Clone, PartialEq)]
pub enum BackupStep {
    /// Forward these requests to the host.
    Requests(Vec<Request>),
    /// Serialize the current snapshot and write it to this file.
    Write(BackupHandle),
    /// Parse and apply these snapshot contents.
    Apply(String),
}

impl BackupStep {
    fn none() -> Self {
        Self::Requests(Vec::new())
    }
}

/// Sequences backup actions and owns the current backup handle.
#[derive(Debug, Clone)]
pub struct BackupCoordinator {
    phase: BackupPhase,
    handle: Option<BackupHandle>,
    handle_key: String,
    last_status: Option<BackupStatus>,
}

impl BackupCoordinator {
    /// Create an idle coordinator that persists handles under `handle_key`.
    #[must_use]
    pub fn new(handle_key: impl Into<String>) -> Self {
        Self {
            phase: BackupPhase::Idle,
            handle: None,
            handle_key: handle_key.into(),
            last_status: None,
        }
    }

    /// Current phase.
    #[must_use]
    pub fn phase(&self) -> &BackupPhase {
        &self.phase
    }

    /// Check if no action is running.
    #[must_use]
    pub fn is_idle(&self) -> bool {
        self.phase == BackupPhase::Idle
    }

    /// The current backup file, if one was chosen.
    #[must_use]
    pub fn handle(&self) -> Option<&BackupHandle> {
        self.handle.as_ref()
    }

    /// Outcome of the most recent finished action.
    #[must_use]
    pub fn last_status(&self) -> Option<&BackupStatus> {
        self.last_status.as_ref()
    }

    /// Adopt the handle persisted by an earlier session.
    ///
    /// A handle chosen during this session takes precedence.
    pub fn restore_handle(&mut self, handle: Option<BackupHandle>) {
        if self.handle.is_none() {
            self.handle = handle;
        }
    }

    /// End the running action and report `status`.
    pub fn finish(&mut self, status: BackupStatus) -> Request {
        match &status {
            BackupStatus::Failed { message } => tracing::warn!("Backup failed: {message}"),
            BackupStatus::Aborted => tracing::info!("Backup aborted"),
            _ => tracing::info!("Backup finished: {status:?}"),
        }
        self.phase = BackupPhase::Idle;
        self.last_status = Some(status.clone());
        Request::ReportBackupStatus { status }
    }

    /// Start a backup action.
    ///
    /// Backing up without a chosen file starts by choosing one.
    pub fn begin(&mut self, action: BackupAction) -> BackupStep {
        if !self.is_idle() {
            let reason = format!("backup action already running ({:?})", self.phase);
            tracing::warn!("Rejected {action:?}: {reason}");
            let status = BackupStatus::Rejected { reason };
            self.last_status = Some(status.clone());
            return BackupStep::Requests(vec![Request::ReportBackupStatus { status }]);
        }

        let request = match (action, self.handle.clone()) {
            (BackupAction::BackupNow, Some(handle)) => {
                self.phase = BackupPhase::AwaitingPermission {
                    action,
                    handle: handle.clone(),
                };
                Request::VerifyPermission {
                    handle,
                    mode: PermissionMode::ReadWrite,
                }
            }
            (BackupAction::BackupNow | BackupAction::SetLocation, _) => {
                self.phase = BackupPhase::AwaitingHandle {
                    action: BackupAction::SetLocation,
                };
                Request::AcquireBackupHandle {
                    mode: HandleMode::Save,
                }
            }
            (BackupAction::Restore, _) => {
                self.phase = BackupPhase::AwaitingHandle { action };
                Request::AcquireBackupHandle {
                    mode: HandleMode::Open,
                }
            }
        };
        tracing::debug!("Backup {action:?} -> {:?}", self.phase);
        BackupStep::Requests(vec![request])
    }

    /// The file picker returned a handle.
    pub fn handle_acquired(&mut self, handle: BackupHandle) -> BackupStep {
        let BackupPhase::AwaitingHandle { action } = self.phase else {
            tracing::warn!("Ignoring backup handle outside AwaitingHandle");
            return BackupStep::none();
        };

        let mut requests = Vec::with_capacity(2);
        let mode = if action == BackupAction::Restore {
            PermissionMode::Read
        } else {
            self.handle = Some(handle.clone());
            requests.push(Request::StoreBackupHandle {
                key: self.handle_key.clone(),
                handle: handle.clone(),
            });
            PermissionMode::ReadWrite
        };
        requests.push(Request::VerifyPermission {
            handle: handle.clone(),
            mode,
        });
        self.phase = BackupPhase::AwaitingPermission { action, handle };
        BackupStep::Requests(requests)
    }

    /// The file picker was closed without a choice.
    pub fn handle_dismissed(&mut self) -> BackupStep {
        if !matches!(self.phase, BackupPhase::AwaitingHandle { .. }) {
            tracing::warn!("Ignoring picker dismissal outside AwaitingHandle");
            return BackupStep::none();
        }
        BackupStep::Requests(vec![self.finish(BackupStatus::Aborted)])
    }

    /// The user answered the permission prompt.
    pub fn permission_resolved(&mut self, granted: bool) -> BackupStep {
        let (action, handle) = match std::mem::take(&mut self.phase) {
            BackupPhase::AwaitingPermission { action, handle } => (action, handle),
            other => {
                tracing::warn!("Ignoring permission result outside AwaitingPermission");
                self.phase = other;
                return BackupStep::none();
            }
        };

        if !granted {
            return BackupStep::Requests(vec![self.finish(BackupStatus::Aborted)]);
        }

        if action == BackupAction::Restore {
            self.phase = BackupPhase::Reading {
                handle: handle.clone(),
            };
            BackupStep::Requests(vec![Request::ReadBackup { handle }])
        } else {
            self.phase = BackupPhase::Writing {
                handle: handle.clone(),
            };
            BackupStep::Write(handle)
        }
    }

    /// The snapshot was written.
    pub fn written(&mut self) -> BackupStep {
        if !matches!(self.phase, BackupPhase::Writing { .. }) {
            tracing::warn!("Ignoring write completion outside Writing");
            return BackupStep::none();
        }
        BackupStep::Requests(vec![self.finish(BackupStatus::Written)])
    }

    /// The snapshot was read. The caller reports the outcome via
    /// [`BackupCoordinator::finish`] after applying it.
    pub fn read(&mut self, contents: String) -> BackupStep {
        if !matches!(self.phase, BackupPhase::Reading { .. }) {
            tracing::warn!("Ignoring backup contents outside Reading");
            return BackupStep::none();
        }
        BackupStep::Apply(contents)
    }

    /// File I/O failed, e.g. because the handle went stale.
    pub fn failed(&mut self, message: String) -> BackupStep {
        if self.is_idle() {
            tracing::warn!("Ignoring backup failure while idle: {message}");
            return BackupStep::none();
        }
        BackupStep::Requests(vec![self.finish(BackupStatus::Failed { message })])
    }
}
