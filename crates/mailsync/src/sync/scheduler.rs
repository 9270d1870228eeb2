//! Copy scheduler
//!
//! For one folder job: diff the two reconciliation indexes, create the
//! destination folder when needed, then copy each missing message with
//! bounded retry and exponential backoff. Task lifecycle:
//!
//! ```text
//! Pending -> InFlight -> Succeeded
//!                     -> RetryScheduled -> InFlight (until budget spent)
//!                     -> FailedPermanent
//! ```
//!
//! Messages already present on both sides are counted skipped and never
//! touched, which is what makes repeated runs idempotent. Messages only
//! on the destination are left alone; sync is one-directional.

use log::{debug, warn};
use std::time::Duration;

use crate::config::SyncConfig;
use crate::fingerprint::{Fingerprint, FingerprintStrategy};
use crate::gateway::{ConnectionGateway, FolderHandle, GatewayError};
use crate::models::{FolderJob, FolderReport, MessageMeta, TaskFailure};

use super::error::SyncError;
use super::events::{CancelToken, SyncEvent};
use super::index::{ReconciliationIndex, build_index};

const BACKOFF_BASE: Duration = Duration::from_millis(100);
const BACKOFF_CAP: Duration = Duration::from_secs(10);
/// Granularity of cancellation checks inside a backoff sleep.
const SLEEP_SLICE: Duration = Duration::from_millis(20);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskState {
    Pending,
    InFlight,
    Succeeded,
    RetryScheduled,
    FailedPermanent,
}

/// One message scheduled for copying. Lives until terminal success or
/// permanent failure; abandoned (still pending or retry-scheduled) on
/// cancellation so a future run picks it up again.
#[derive(Debug)]
pub struct CopyTask {
    pub fingerprint: Fingerprint,
    pub meta: MessageMeta,
    pub state: TaskState,
    pub attempts: u32,
    pub last_error: Option<GatewayError>,
}

impl CopyTask {
    fn new(fingerprint: Fingerprint, meta: MessageMeta) -> Self {
        Self {
            fingerprint,
            meta,
            state: TaskState::Pending,
            attempts: 0,
            last_error: None,
        }
    }
}

/// Execute one folder job, accumulating into `report`.
///
/// `report` is mutated in place so the partial folder accounting
/// survives a fatal abort. Folder-level failures (source unavailable,
/// destination uncreatable) abandon the job and return `Ok`; only
/// authentication loss returns `Err`.
#[allow(clippy::too_many_arguments)]
pub fn sync_folder(
    job: &FolderJob,
    source: &mut dyn ConnectionGateway,
    dest: &mut dyn ConnectionGateway,
    config: &SyncConfig,
    strategy: &dyn FingerprintStrategy,
    cancel: &CancelToken,
    observer: &mut dyn FnMut(SyncEvent),
    report: &mut FolderReport,
) -> Result<(), SyncError> {
    let folder = job.source.path.to_string();

    // Source side.
    let source_handle = match source.select_folder(&job.source.path) {
        Ok(handle) => handle,
        Err(e) if e.is_fatal() => return Err(SyncError::AuthenticationLost(e)),
        Err(e) => {
            abandon_folder(report, &folder, &format!("source folder unavailable: {e}"));
            return Ok(());
        }
    };
    let source_index = match build_index(source, &source_handle, strategy) {
        Ok(index) => index,
        Err(e) if e.is_fatal() => return Err(SyncError::AuthenticationLost(e)),
        Err(e) => {
            abandon_folder(report, &folder, &format!("source enumeration failed: {e}"));
            return Ok(());
        }
    };
    report.skipped_duplicates = source_index.duplicates();
    report.fingerprint_failures += source_index.failures();

    // Destination side: select, or create on demand.
    let dest_exists = match dest.folder_exists(&job.destination_path) {
        Ok(exists) => exists,
        Err(e) if e.is_fatal() => return Err(SyncError::AuthenticationLost(e)),
        Err(e) => {
            abandon_folder(report, &folder, &format!("destination unavailable: {e}"));
            return Ok(());
        }
    };

    let (dest_handle, mut dest_index) = if dest_exists {
        let handle = match dest.select_folder(&job.destination_path) {
            Ok(handle) => handle,
            Err(e) if e.is_fatal() => return Err(SyncError::AuthenticationLost(e)),
            Err(e) => {
                abandon_folder(report, &folder, &format!("destination unavailable: {e}"));
                return Ok(());
            }
        };
        let index = match build_index(dest, &handle, strategy) {
            Ok(index) => index,
            Err(e) if e.is_fatal() => return Err(SyncError::AuthenticationLost(e)),
            Err(e) => {
                abandon_folder(report, &folder, &format!("destination enumeration failed: {e}"));
                return Ok(());
            }
        };
        report.fingerprint_failures += index.failures();
        (handle, index)
    } else {
        let creation_allowed = config.create_folders && dest.capabilities().create_folders;
        if !creation_allowed {
            fail_all_tasks(
                report,
                &folder,
                &source_index,
                "destination folder missing, creation disabled",
                observer,
            );
            return Ok(());
        }
        if let Err(e) = dest.create_folder(&job.destination_path) {
            if e.is_fatal() {
                return Err(SyncError::AuthenticationLost(e));
            }
            fail_all_tasks(
                report,
                &folder,
                &source_index,
                &format!("destination folder creation failed: {e}"),
                observer,
            );
            return Ok(());
        }
        let handle = match dest.select_folder(&job.destination_path) {
            Ok(handle) => handle,
            Err(e) if e.is_fatal() => return Err(SyncError::AuthenticationLost(e)),
            Err(e) => {
                fail_all_tasks(
                    report,
                    &folder,
                    &source_index,
                    &format!("created destination folder unusable: {e}"),
                    observer,
                );
                return Ok(());
            }
        };
        (handle, ReconciliationIndex::new())
    };

    // Diff: fingerprints on both sides are settled, the rest are tasks.
    let mut tasks: Vec<CopyTask> = Vec::new();
    for (fingerprint, meta) in source_index.entries() {
        if dest_index.contains(fingerprint) {
            report.skipped_existing += 1;
        } else {
            tasks.push(CopyTask::new(fingerprint.clone(), meta.clone()));
        }
    }
    // Deterministic copy order: oldest first, uid as tiebreak.
    tasks.sort_by_key(|t| (t.meta.internal_date, t.meta.uid));
    debug!(
        "{folder}: {} to copy, {} already present",
        tasks.len(),
        report.skipped_existing
    );

    let preserve_flags = dest.capabilities().flag_sync;

    for task in &mut tasks {
        if cancel.is_cancelled() {
            // Remaining tasks stay pending for a future run.
            return Ok(());
        }
        loop {
            task.state = TaskState::InFlight;
            task.attempts += 1;

            let outcome = copy_once(
                source,
                &source_handle,
                dest,
                &dest_handle,
                &task.meta,
                preserve_flags,
            );
            match outcome {
                Ok(()) => {
                    task.state = TaskState::Succeeded;
                    report.copied += 1;
                    if task.attempts > 1 {
                        report.retried_then_succeeded += 1;
                    }
                    // Later tasks (and dry-run simulation) must see the
                    // destination as containing this fingerprint now.
                    dest_index.insert(task.fingerprint.clone(), task.meta.clone());
                    observer(SyncEvent::MessageCopied {
                        folder: folder.clone(),
                        fingerprint: task.fingerprint.to_string(),
                    });
                    break;
                }
                Err(e) if e.is_fatal() => {
                    task.last_error = Some(e.clone());
                    return Err(SyncError::AuthenticationLost(e));
                }
                Err(e) if e.is_retryable() && task.attempts <= config.retry_budget => {
                    task.state = TaskState::RetryScheduled;
                    debug!(
                        "{folder}: uid {} attempt {} failed, retrying: {e}",
                        task.meta.uid.uid(),
                        task.attempts
                    );
                    observer(SyncEvent::CopyRetried {
                        folder: folder.clone(),
                        fingerprint: task.fingerprint.to_string(),
                        attempt: task.attempts,
                        error: e.to_string(),
                    });
                    task.last_error = Some(e);
                    if !sleep_cancellable(backoff_delay(task.attempts - 1), cancel) {
                        // Abandoned mid-backoff; not failed permanently.
                        return Ok(());
                    }
                }
                Err(e) => {
                    task.state = TaskState::FailedPermanent;
                    report.failed_permanent += 1;
                    warn!(
                        "{folder}: uid {} failed permanently after {} attempt(s): {e}",
                        task.meta.uid.uid(),
                        task.attempts
                    );
                    report.failures.push(TaskFailure {
                        folder: folder.clone(),
                        fingerprint: task.fingerprint.to_string(),
                        error: e.to_string(),
                        attempts: task.attempts,
                    });
                    observer(SyncEvent::CopyFailed {
                        folder: folder.clone(),
                        fingerprint: task.fingerprint.to_string(),
                        error: e.to_string(),
                    });
                    task.last_error = Some(e);
                    break;
                }
            }
        }
    }

    Ok(())
}

/// Fetch from the source and append to the destination, preserving the
/// internal date and, where supported, flags.
fn copy_once(
    source: &mut dyn ConnectionGateway,
    source_handle: &FolderHandle,
    dest: &mut dyn ConnectionGateway,
    dest_handle: &FolderHandle,
    meta: &MessageMeta,
    preserve_flags: bool,
) -> Result<(), GatewayError> {
    let content = source.fetch_content(source_handle, &meta.uid)?;
    let flags: &[String] = if preserve_flags { &meta.flags } else { &[] };
    dest.append(dest_handle, &content, flags, meta.internal_date)?;
    Ok(())
}

/// Record a folder-level failure that prevented any task from being
/// created, then abandon the job.
fn abandon_folder(report: &mut FolderReport, folder: &str, error: &str) {
    warn!("{folder}: abandoning folder: {error}");
    report.failures.push(TaskFailure {
        folder: folder.to_string(),
        fingerprint: "-".to_string(),
        error: error.to_string(),
        attempts: 0,
    });
}

/// Mark every would-be task for this folder permanently failed.
fn fail_all_tasks(
    report: &mut FolderReport,
    folder: &str,
    source_index: &ReconciliationIndex,
    error: &str,
    observer: &mut dyn FnMut(SyncEvent),
) {
    warn!("{folder}: {error}; failing {} task(s)", source_index.len());
    let mut fingerprints: Vec<&Fingerprint> =
        source_index.entries().map(|(fp, _)| fp).collect();
    fingerprints.sort();
    for fingerprint in fingerprints {
        report.failed_permanent += 1;
        report.failures.push(TaskFailure {
            folder: folder.to_string(),
            fingerprint: fingerprint.to_string(),
            error: error.to_string(),
            attempts: 0,
        });
        observer(SyncEvent::CopyFailed {
            folder: folder.to_string(),
            fingerprint: fingerprint.to_string(),
            error: error.to_string(),
        });
    }
}

/// Exponential backoff, doubling from the base up to the cap.
fn backoff_delay(retry: u32) -> Duration {
    BACKOFF_CAP.min(BACKOFF_BASE * 2u32.saturating_pow(retry.min(16)))
}

/// Sleep in slices, bailing out early when cancelled. Returns `false`
/// when the sleep was interrupted.
fn sleep_cancellable(delay: Duration, cancel: &CancelToken) -> bool {
    let mut remaining = delay;
    while remaining > Duration::ZERO {
        if cancel.is_cancelled() {
            return false;
        }
        let step = remaining.min(SLEEP_SLICE);
        std::thread::sleep(step);
        remaining -= step;
    }
    !cancel.is_cancelled()
}
