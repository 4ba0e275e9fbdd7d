/**
 * Backup and Restore Pipelines
 *
 * Delete-and-record: every scanned object is written to the backup before
 * its live deletion is attempted, so the backup stays complete even when
 * the server refuses a delete. Restore: replays the backup line by line;
 * a corrupt line is reported and skipped.
 *
 * Individual add/delete failures are logged with the record and never
 * stop a pipeline. Only backup I/O and scan failures are fatal.
 */
use world_backup_common::ObjectRecord;

use crate::activity_log::{ActivityLog, Attempt};
use crate::backup_file::{BackupFile, BackupLine};
use crate::client::ObjectStore;
use crate::error::{BackupError, WorldError};
use crate::stages::Stage;

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct BackupReport {
    pub recorded: usize,
    pub deleted: usize,
    pub delete_failed: usize,
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct RestoreReport {
    pub attempted: usize,
    pub restored: usize,
    pub add_failed: usize,
    /// Line numbers that could not be decoded
    pub corrupt: Vec<usize>,
}

/// Attempt to delete one object; failures are logged, not returned
pub fn try_delete<S: ObjectStore>(store: &S, record: &ObjectRecord) -> bool {
    match store.delete_object(record.number, record.x, record.z) {
        Ok(()) => true,
        Err(e) => {
            log::warn!("Failed to delete {:?}: {}", record, e);
            println!("Failed to delete #{} {} -- {}", record.number, record.label(), e);
            false
        }
    }
}

/// Attempt to build one object; failures are logged, not returned
pub fn try_add<S: ObjectStore>(store: &S, record: &ObjectRecord) -> Option<u32> {
    match store.add_object(record) {
        Ok(number) => {
            log::debug!("Restored #{} as #{}", record.number, number);
            Some(number)
        }
        Err(e) => {
            log::warn!("Failed to add {:?}: {}", record, e);
            println!("Failed to add #{} {} -- {}", record.number, record.label(), e);
            None
        }
    }
}

/// Record and delete every object the sequence yields
pub fn delete_and_record<S, I>(
    store: &S,
    records: I,
    backup: &BackupFile,
    activity: &ActivityLog,
) -> Result<BackupReport, BackupError>
where
    S: ObjectStore,
    I: IntoIterator<Item = Result<ObjectRecord, WorldError>>,
{
    backup.reset()?;
    let mut report = BackupReport::default();
    for record in records {
        let record = record.map_err(|source| BackupError::Stage { stage: Stage::ScanDeleteRecord, source })?;

        backup.append(&record)?;
        report.recorded += 1;

        if try_delete(store, &record) {
            report.deleted += 1;
        } else {
            report.delete_failed += 1;
        }

        println!("Attempting to delete {}", record.label());
        log::debug!("Attempting to delete {:?}", record);
        activity.record(Attempt::Delete, &record);
    }
    log::info!(
        "Backup to {} complete: {} recorded, {} deleted, {} delete failures",
        backup.path().display(),
        report.recorded,
        report.deleted,
        report.delete_failed
    );
    Ok(report)
}

/// Recreate every object recorded in the backup file
pub fn restore<S: ObjectStore>(
    store: &S,
    backup: &BackupFile,
    activity: &ActivityLog,
) -> Result<RestoreReport, BackupError> {
    let mut report = RestoreReport::default();
    for line in backup.reader()? {
        match line? {
            BackupLine::Record { line, record } => {
                log::debug!("Line {}: restoring #{}", line, record.number);
                report.attempted += 1;
                if try_add(store, &record).is_some() {
                    report.restored += 1;
                } else {
                    report.add_failed += 1;
                }
                println!("Attempting to add {}", record.label());
                log::debug!("Attempting to add {:?}", record);
                activity.record(Attempt::Add, &record);
            }
            BackupLine::Corrupt { line, error } => {
                log::error!("Corrupt record at line {} of {}: {}", line, backup.path().display(), error);
                println!("Skipping corrupt record at line {}: {}", line, error);
                report.corrupt.push(line);
            }
        }
    }
    log::info!(
        "Restore from {} complete: {} attempted, {} restored, {} add failures, {} corrupt lines",
        backup.path().display(),
        report.attempted,
        report.restored,
        report.add_failed,
        report.corrupt.len()
    );
    Ok(report)
}

/// List scanned objects without changing the world
pub fn survey<I>(records: I) -> Result<usize, BackupError>
where
    I: IntoIterator<Item = Result<ObjectRecord, WorldError>>,
{
    let mut count = 0;
    for record in records {
        let record = record.map_err(|source| BackupError::Stage { stage: Stage::Survey, source })?;
        println!("  [{}] {}", record.number, record.label());
        count += 1;
    }
    Ok(count)
}
