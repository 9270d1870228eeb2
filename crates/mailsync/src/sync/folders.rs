//! Folder job planning
//!
//! Walks the source folder hierarchy (or takes a single explicit
//! folder), applies exclusion pruning, and emits folder jobs in
//! parent-before-child order so destination folder creation for a child
//! never runs ahead of its parent.

use log::debug;

use crate::config::{FolderSelection, SyncConfig};
use crate::gateway::ConnectionGateway;
use crate::matcher::FolderPathMatcher;
use crate::models::{Folder, FolderJob, FolderPath};

use super::error::SyncError;

/// The ordered folder jobs for one run, plus the paths pruned by
/// exclusion patterns. Pruned folders never get a job or a report
/// entry.
#[derive(Debug)]
pub struct FolderPlan {
    pub jobs: Vec<FolderJob>,
    pub excluded: Vec<FolderPath>,
}

/// Resolve the configured folder selection into an ordered job list.
///
/// A root-level listing failure is fatal for the run; per-folder
/// trouble (a folder that cannot be selected or enumerated) surfaces
/// later as a folder-level failure during job execution.
pub fn plan_folder_jobs(
    source: &mut dyn ConnectionGateway,
    config: &SyncConfig,
    matcher: &FolderPathMatcher,
) -> Result<FolderPlan, SyncError> {
    match &config.selection {
        FolderSelection::Single(path) => {
            // Explicit selection overrides exclusion patterns.
            debug!("planning single-folder job for {path}");
            Ok(FolderPlan {
                jobs: vec![FolderJob::new(Folder::new(path.clone()))],
                excluded: Vec::new(),
            })
        }
        selection => {
            let subscribed_only = matches!(selection, FolderSelection::RecurseSubscribed);
            let folders = source
                .list_folders(&config.source_root, subscribed_only)
                .map_err(SyncError::EnumerationFailed)?;

            let mut jobs = Vec::new();
            let mut excluded = Vec::new();
            for folder in folders {
                if matcher.is_excluded(&folder.path) {
                    debug!("pruning excluded folder {}", folder.path);
                    excluded.push(folder.path);
                } else {
                    jobs.push(FolderJob::new(folder));
                }
            }
            jobs.sort_by(|a, b| a.source.path.cmp(&b.source.path));
            excluded.sort();
            debug!(
                "planned {} folder jobs ({} excluded)",
                jobs.len(),
                excluded.len()
            );
            Ok(FolderPlan { jobs, excluded })
        }
    }
}
