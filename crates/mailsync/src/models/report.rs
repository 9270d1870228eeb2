//! Run report accumulation
//!
//! The report is the engine's sole externally consumed result; callers
//! own formatting and persistence. Folder entries are appended as each
//! folder job finalizes and are never mutated afterwards, so a run
//! interrupted by cancellation or a fatal error still yields a usable
//! partial report.

use serde::{Deserialize, Serialize};

/// Terminal state of a synchronization run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RunStatus {
    /// All planned folder jobs were processed (individual tasks may
    /// still have failed permanently).
    #[default]
    Completed,
    /// The cancellation token fired; unprocessed tasks were abandoned
    /// and remain eligible for a future run.
    Cancelled,
    /// A fatal error (authentication lost, root enumeration impossible)
    /// stopped the run before the remaining folder jobs.
    Aborted(String),
}

/// One permanently failed copy task, with enough context to diagnose.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskFailure {
    pub folder: String,
    /// Reconciliation fingerprint of the message, or `"-"` when the
    /// failure happened before any task existed (folder-level errors).
    pub fingerprint: String,
    pub error: String,
    pub attempts: u32,
}

/// Per-folder outcome counts for one synchronization pass.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FolderReport {
    pub folder: String,
    /// Messages copied to the destination (or simulated in a dry run).
    pub copied: usize,
    /// Messages whose fingerprint already existed on the destination.
    pub skipped_existing: usize,
    /// Source messages sharing a fingerprint with an earlier message in
    /// the same folder; last seen wins, earlier ones counted here.
    pub skipped_duplicates: usize,
    /// Copies that succeeded only after at least one retry.
    pub retried_then_succeeded: usize,
    /// Tasks that ended `FailedPermanent`.
    pub failed_permanent: usize,
    /// Messages on either side whose fingerprint could not be computed;
    /// excluded from reconciliation, never copied this run.
    pub fingerprint_failures: usize,
    pub failures: Vec<TaskFailure>,
}

impl FolderReport {
    pub fn new(folder: impl Into<String>) -> Self {
        Self {
            folder: folder.into(),
            ..Default::default()
        }
    }
}

/// Aggregated result of one synchronization run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunReport {
    pub folders: Vec<FolderReport>,
    /// Folder paths pruned by exclusion patterns. Excluded folders get
    /// no `FolderReport` entry at all.
    pub excluded_folders: Vec<String>,
    pub status: RunStatus,
    pub duration_ms: u64,
}

impl RunReport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Look up the entry for a folder path, if the run reached it.
    pub fn folder(&self, path: &str) -> Option<&FolderReport> {
        self.folders.iter().find(|f| f.folder == path)
    }

    pub fn total_copied(&self) -> usize {
        self.folders.iter().map(|f| f.copied).sum()
    }

    pub fn total_skipped_existing(&self) -> usize {
        self.folders.iter().map(|f| f.skipped_existing).sum()
    }

    pub fn total_failed(&self) -> usize {
        self.folders.iter().map(|f| f.failed_permanent).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_totals() {
        let mut report = RunReport::new();
        let mut a = FolderReport::new("INBOX");
        a.copied = 2;
        a.skipped_existing = 1;
        let mut b = FolderReport::new("Archive");
        b.copied = 3;
        b.failed_permanent = 1;
        report.folders.push(a);
        report.folders.push(b);

        assert_eq!(report.total_copied(), 5);
        assert_eq!(report.total_skipped_existing(), 1);
        assert_eq!(report.total_failed(), 1);
        assert_eq!(report.folder("Archive").unwrap().copied, 3);
        assert!(report.folder("Trash").is_none());
    }

    #[test]
    fn test_serialization_round_trip() {
        let mut report = RunReport::new();
        let mut entry = FolderReport::new("INBOX");
        entry.failures.push(TaskFailure {
            folder: "INBOX".to_string(),
            fingerprint: "fast:10:1700000000".to_string(),
            error: "quota exceeded: over limit".to_string(),
            attempts: 1,
        });
        entry.failed_permanent = 1;
        report.folders.push(entry);
        report.status = RunStatus::Aborted("authentication failure: token expired".to_string());

        let json = serde_json::to_string(&report).unwrap();
        let back: RunReport = serde_json::from_str(&json).unwrap();
        assert_eq!(report, back);
    }
}
