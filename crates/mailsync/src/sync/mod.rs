//! Synchronization engine
//!
//! Orchestration: the runner plans folder jobs, builds a
//! reconciliation index per side for each job, then the copy scheduler
//! diffs the indexes and replicates missing messages with bounded
//! retry. Every pass is idempotent and safe to re-run indefinitely.

mod error;
mod events;
mod folders;
mod index;
mod runner;
mod scheduler;

pub use error::SyncError;
pub use events::{CancelToken, SyncEvent};
pub use folders::{FolderPlan, plan_folder_jobs};
pub use index::{ReconciliationIndex, build_index};
pub use runner::{sync_mailboxes, sync_mailboxes_with};
pub use scheduler::{CopyTask, TaskState, sync_folder};
