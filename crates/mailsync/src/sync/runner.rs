//! Top-level run orchestration
//!
//! One call per synchronization pass: plan folder jobs, execute them
//! sequentially over the two sessions, accumulate the report. Folder
//! entries are pushed as each job finalizes and never touched again, so
//! cancellation or a fatal abort still yields everything finished so
//! far.

use log::{error, info};
use std::time::Instant;

use crate::config::SyncConfig;
use crate::fingerprint::strategy_for;
use crate::gateway::{ConnectionGateway, DryRunGateway};
use crate::matcher::FolderPathMatcher;
use crate::models::{FolderReport, RunReport, RunStatus};

use super::events::{CancelToken, SyncEvent};
use super::folders::plan_folder_jobs;
use super::scheduler::sync_folder;

/// Synchronize `source` into `dest` per `config`, with no cancellation
/// and no event observer.
pub fn sync_mailboxes(
    source: &mut dyn ConnectionGateway,
    dest: &mut dyn ConnectionGateway,
    config: &SyncConfig,
) -> RunReport {
    sync_mailboxes_with(source, dest, config, &CancelToken::new(), &mut |_| {})
}

/// Full-control entry point: cooperative cancellation plus a
/// run-scoped structured event observer.
pub fn sync_mailboxes_with(
    source: &mut dyn ConnectionGateway,
    dest: &mut dyn ConnectionGateway,
    config: &SyncConfig,
    cancel: &CancelToken,
    observer: &mut dyn FnMut(SyncEvent),
) -> RunReport {
    let start = Instant::now();
    let mut report = RunReport::new();

    if let Err(e) = config.validate() {
        report.status = RunStatus::Aborted(e.to_string());
        return report;
    }

    source.set_operation_timeout(config.operation_timeout);
    dest.set_operation_timeout(config.operation_timeout);

    let case_insensitive = source.capabilities().case_insensitive_paths;
    let matcher = match FolderPathMatcher::from_sources(
        &config.exclude,
        config.exclude_file.as_deref(),
        case_insensitive,
    ) {
        Ok(matcher) => matcher,
        Err(e) => {
            report.status = RunStatus::Aborted(format!("{e:#}"));
            return report;
        }
    };

    let plan = match plan_folder_jobs(source, config, &matcher) {
        Ok(plan) => plan,
        Err(e) => {
            error!("aborting run: {e}");
            report.status = RunStatus::Aborted(e.to_string());
            report.duration_ms = start.elapsed().as_millis() as u64;
            return report;
        }
    };

    for path in &plan.excluded {
        observer(SyncEvent::FolderExcluded {
            folder: path.to_string(),
        });
    }
    report.excluded_folders = plan.excluded.iter().map(|p| p.to_string()).collect();

    info!(
        "starting {}sync of {} folder(s), {} excluded",
        if config.dry_run { "dry-run " } else { "" },
        plan.jobs.len(),
        plan.excluded.len()
    );
    observer(SyncEvent::RunStarted {
        folders: plan.jobs.len(),
    });

    let strategy = strategy_for(config.scan_mode);

    // A dry run drives identical decisions through a shadow overlay;
    // the real destination is only ever read.
    let mut overlay;
    let dest: &mut dyn ConnectionGateway = if config.dry_run {
        overlay = DryRunGateway::new(dest);
        &mut overlay
    } else {
        dest
    };

    for job in &plan.jobs {
        if cancel.is_cancelled() {
            report.status = RunStatus::Cancelled;
            break;
        }
        let folder = job.source.path.to_string();
        observer(SyncEvent::FolderStarted {
            folder: folder.clone(),
        });

        let mut folder_report = FolderReport::new(&folder);
        let result = sync_folder(
            job,
            source,
            dest,
            config,
            strategy.as_ref(),
            cancel,
            observer,
            &mut folder_report,
        );
        report.folders.push(folder_report);

        match result {
            Ok(()) => observer(SyncEvent::FolderFinished { folder }),
            Err(e) => {
                error!("aborting run in {folder}: {e}");
                report.status = RunStatus::Aborted(e.to_string());
                break;
            }
        }
    }

    if cancel.is_cancelled() && report.status == RunStatus::Completed {
        report.status = RunStatus::Cancelled;
    }

    report.duration_ms = start.elapsed().as_millis() as u64;
    info!(
        "run {:?}: {} copied, {} skipped, {} failed in {}ms",
        report.status,
        report.total_copied(),
        report.total_skipped_existing(),
        report.total_failed(),
        report.duration_ms
    );
    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::FolderSelection;
    use crate::gateway::{GatewayError, InMemoryGateway};
    use crate::models::FolderPath;
    use chrono::{TimeZone, Utc};

    fn date(ts: i64) -> chrono::DateTime<Utc> {
        Utc.timestamp_opt(ts, 0).unwrap()
    }

    #[test]
    fn test_invalid_config_aborts_before_io() {
        let mut source = InMemoryGateway::new();
        let mut dest = InMemoryGateway::new();
        let mut config = SyncConfig::default();
        config.selection = FolderSelection::Single(FolderPath::root());

        let report = sync_mailboxes(&mut source, &mut dest, &config);
        assert!(matches!(report.status, RunStatus::Aborted(_)));
        assert!(report.folders.is_empty());
    }

    #[test]
    fn test_fatal_enumeration_returns_partial_report() {
        let mut source = InMemoryGateway::new();
        source.fail_next_list(GatewayError::AuthFailure("login rejected".into()));
        let mut dest = InMemoryGateway::new();

        let report = sync_mailboxes(&mut source, &mut dest, &SyncConfig::default());
        assert!(matches!(report.status, RunStatus::Aborted(_)));
        assert!(report.folders.is_empty());
    }

    #[test]
    fn test_events_emitted_in_order() {
        let mut source = InMemoryGateway::new();
        source.add_message("INBOX", b"msg", &[], date(100));
        let mut dest = InMemoryGateway::new();

        let mut events = Vec::new();
        sync_mailboxes_with(
            &mut source,
            &mut dest,
            &SyncConfig::default(),
            &CancelToken::new(),
            &mut |e| events.push(e),
        );

        assert_eq!(events[0], SyncEvent::RunStarted { folders: 1 });
        assert_eq!(
            events[1],
            SyncEvent::FolderStarted {
                folder: "INBOX".to_string()
            }
        );
        assert!(matches!(events[2], SyncEvent::MessageCopied { .. }));
        assert_eq!(
            events[3],
            SyncEvent::FolderFinished {
                folder: "INBOX".to_string()
            }
        );
    }

    #[test]
    fn test_pre_cancelled_run_reports_cancelled() {
        let mut source = InMemoryGateway::new();
        source.add_message("INBOX", b"msg", &[], date(100));
        let mut dest = InMemoryGateway::new();

        let cancel = CancelToken::new();
        cancel.cancel();

        let report = sync_mailboxes_with(
            &mut source,
            &mut dest,
            &SyncConfig::default(),
            &cancel,
            &mut |_| {},
        );
        assert_eq!(report.status, RunStatus::Cancelled);
        assert_eq!(report.total_copied(), 0);
    }
}
