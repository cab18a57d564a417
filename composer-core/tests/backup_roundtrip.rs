//! Backup and Restore Integration Tests
//!
//! Tests the backup file round trip through an in-memory host:
//! - Choosing a backup location and writing snapshots
//! - Restoring snapshots over changed or empty sessions
//! - Declined permissions, dismissed pickers and stale handles
//! - Rejection of incomplete backup files

mod common;

use common::{init_tracing, svg, MemoryHost};
use composer_core::{
    BackupSnapshot, BackupStatus, Composer, Event, EventLoop, NamedFile, StorageKeys,
};

const BACKUP_FILE: &str = "backup.json";

/// A session with two simple characters and one compound.
fn populated() -> EventLoop<MemoryHost> {
    init_tracing();
    let mut host = MemoryHost::new();
    host.save_target = Some(BACKUP_FILE.to_string());
    host.open_target = Some(BACKUP_FILE.to_string());
    host.picks.push_back(vec![
        NamedFile::new("日.svg", svg("black")),
        NamedFile::new("月.svg", svg("red")),
    ]);

    let mut event_loop = EventLoop::new(Composer::default(), host);
    event_loop.push(Event::ImportSimpleCharacters);
    event_loop.push(Event::Compose {
        identity: '明',
        components: vec!['日', '月'],
    });
    event_loop.run_until_idle();
    event_loop
}

fn run(event_loop: &mut EventLoop<MemoryHost>, event: Event) {
    event_loop.push(event);
    event_loop.run_until_idle();
}

fn last_status(event_loop: &EventLoop<MemoryHost>) -> Option<&BackupStatus> {
    event_loop.boundary().statuses.last()
}

// ============================================================================
// Writing
// ============================================================================

#[test]
fn test_set_location_persists_handle_and_writes() {
    let mut event_loop = populated();
    run(&mut event_loop, Event::SetBackupLocation);

    let host = event_loop.boundary();
    assert_eq!(
        host.storage.get(&StorageKeys::default().backup_handle()),
        Some(&BACKUP_FILE.to_string())
    );
    let contents = host.files.get(BACKUP_FILE).expect("backup written");
    let snapshot = BackupSnapshot::from_json(contents).expect("valid snapshot");
    assert_eq!(&snapshot.model, event_loop.composer().model());
    assert_eq!(snapshot.simple_char_svgs, event_loop.composer().assets().to_record());
    assert_eq!(last_status(&event_loop), Some(&BackupStatus::Written));
    assert!(event_loop.composer().backup().is_idle());
}

#[test]
fn test_backup_now_reuses_location_across_reload() {
    let mut event_loop = populated();
    run(&mut event_loop, Event::SetBackupLocation);

    let (_, mut host) = event_loop.into_parts();
    host.files.clear();
    // The picker must not be needed again
    host.save_target = None;

    let events = host.startup_events(&StorageKeys::default());
    let mut event_loop = EventLoop::new(Composer::default(), host);
    for event in events {
        event_loop.push(event);
    }
    run(&mut event_loop, Event::BackupNow);

    assert!(event_loop.boundary().files.contains_key(BACKUP_FILE));
    assert_eq!(last_status(&event_loop), Some(&BackupStatus::Written));
}

#[test]
fn test_backup_now_without_location_asks_for_one() {
    let mut event_loop = populated();
    run(&mut event_loop, Event::BackupNow);

    assert!(event_loop.boundary().files.contains_key(BACKUP_FILE));
    assert!(event_loop
        .boundary()
        .storage
        .contains_key(&StorageKeys::default().backup_handle()));
}

// ============================================================================
// Restoring
// ============================================================================

#[test]
fn test_restore_round_trip_after_changes() {
    let mut event_loop = populated();
    run(&mut event_loop, Event::SetBackupLocation);
    let model = event_loop.composer().model().clone();
    let assets = event_loop.composer().assets().clone();

    run(&mut event_loop, Event::ClearSimpleCharacters);
    run(&mut event_loop, Event::RemoveCharacter { identity: '明' });
    assert_ne!(event_loop.composer().model(), &model);

    run(&mut event_loop, Event::RestoreBackup);

    assert_eq!(event_loop.composer().model(), &model);
    assert_eq!(event_loop.composer().assets(), &assets);
    assert_eq!(last_status(&event_loop), Some(&BackupStatus::Restored));

    // Restored state is durable
    let stored = event_loop
        .boundary()
        .stored_assets(&StorageKeys::default())
        .expect("stored");
    assert_eq!(stored, assets.to_record());
}

#[test]
fn test_deeply_nested_session_survives_backup_and_reload() {
    let mut event_loop = populated();
    let mut previous = '明';
    for offset in 0..110 {
        let identity = char::from_u32(0x6000 + offset).expect("valid scalar");
        event_loop.push(Event::Compose {
            identity,
            components: vec![previous, '日'],
        });
        previous = identity;
    }
    event_loop.run_until_idle();
    run(&mut event_loop, Event::SetBackupLocation);
    let model = event_loop.composer().model().clone();
    assert_eq!(
        event_loop
            .composer()
            .render_geometry(previous)
            .expect("exists")
            .len(),
        112
    );

    // Reload from durable storage
    let (_, host) = event_loop.into_parts();
    let events = host.startup_events(&StorageKeys::default());
    let mut event_loop = EventLoop::new(Composer::default(), host);
    for event in events {
        event_loop.push(event);
    }
    event_loop.run_until_idle();
    assert_eq!(event_loop.composer().model(), &model);

    // Restore from the backup file
    run(&mut event_loop, Event::RemoveCharacter { identity: previous });
    run(&mut event_loop, Event::RestoreBackup);
    assert_eq!(last_status(&event_loop), Some(&BackupStatus::Restored));
    assert_eq!(event_loop.composer().model(), &model);
}

#[test]
fn test_restore_into_fresh_session() {
    let mut source = populated();
    run(&mut source, Event::SetBackupLocation);
    let contents = source.boundary().files[BACKUP_FILE].clone();

    let mut host = MemoryHost::new();
    host.open_target = Some("copy.json".to_string());
    host.files.insert("copy.json".to_string(), contents);
    let mut target = EventLoop::new(Composer::default(), host);
    run(&mut target, Event::RestoreBackup);

    assert_eq!(target.composer().model(), source.composer().model());
    assert_eq!(target.composer().assets(), source.composer().assets());
    // Restoring does not change the backup location
    assert!(target.composer().backup().handle().is_none());
}

#[test]
fn test_restored_artwork_wins_over_local() {
    let mut event_loop = populated();
    run(&mut event_loop, Event::SetBackupLocation);

    event_loop
        .boundary_mut()
        .picks
        .push_back(vec![NamedFile::new("日.svg", svg("green"))]);
    run(&mut event_loop, Event::ImportSimpleCharacters);
    run(&mut event_loop, Event::RestoreBackup);

    let artwork = event_loop.composer().assets().get('日').expect("present");
    assert_eq!(artwork.source(), svg("black"));
}

#[test]
fn test_incomplete_backup_is_rejected_whole() {
    let mut event_loop = populated();
    let model = event_loop.composer().model().clone();
    let assets = event_loop.composer().assets().clone();

    let incomplete = serde_json::json!({ "model": composer_core::SessionModel::default() });
    event_loop
        .boundary_mut()
        .files
        .insert(BACKUP_FILE.to_string(), incomplete.to_string());
    run(&mut event_loop, Event::RestoreBackup);

    assert_eq!(event_loop.composer().model(), &model);
    assert_eq!(event_loop.composer().assets(), &assets);
    assert!(matches!(
        last_status(&event_loop),
        Some(BackupStatus::Failed { .. })
    ));
}

// ============================================================================
// Declined and failed actions
// ============================================================================

#[test]
fn test_denied_permission_writes_nothing() {
    let mut event_loop = populated();
    event_loop.boundary_mut().grant_permission = false;
    run(&mut event_loop, Event::SetBackupLocation);

    assert!(event_loop.boundary().files.is_empty());
    assert_eq!(last_status(&event_loop), Some(&BackupStatus::Aborted));
    assert!(event_loop.composer().backup().is_idle());
}

#[test]
fn test_denied_permission_restores_nothing() {
    let mut event_loop = populated();
    run(&mut event_loop, Event::SetBackupLocation);
    let model = event_loop.composer().model().clone();

    run(&mut event_loop, Event::ClearSimpleCharacters);
    event_loop.boundary_mut().grant_permission = false;
    run(&mut event_loop, Event::RestoreBackup);

    assert!(event_loop.composer().assets().is_empty());
    assert_eq!(event_loop.composer().model(), &model);
    assert_eq!(last_status(&event_loop), Some(&BackupStatus::Aborted));
}

#[test]
fn test_dismissed_restore_picker_aborts() {
    let mut event_loop = populated();
    event_loop.boundary_mut().open_target = None;
    run(&mut event_loop, Event::RestoreBackup);

    assert_eq!(last_status(&event_loop), Some(&BackupStatus::Aborted));
    assert!(event_loop.composer().backup().is_idle());
}

#[test]
fn test_stale_handle_reports_failure_and_session_continues() {
    let mut event_loop = populated();
    run(&mut event_loop, Event::SetBackupLocation);
    event_loop
        .boundary_mut()
        .stale
        .insert(BACKUP_FILE.to_string());

    run(&mut event_loop, Event::BackupNow);
    assert!(matches!(
        last_status(&event_loop),
        Some(BackupStatus::Failed { .. })
    ));

    // The session keeps working after the failure
    run(
        &mut event_loop,
        Event::Compose {
            identity: '朋',
            components: vec!['月', '月'],
        },
    );
    assert!(event_loop.composer().model().get('朋').is_some());
    assert!(event_loop.composer().backup().is_idle());
}
