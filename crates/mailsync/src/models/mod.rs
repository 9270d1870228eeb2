//! Domain models for mailbox synchronization

mod folder;
mod message;
mod report;

pub use folder::{Folder, FolderJob, FolderPath};
pub use message::{MessageMeta, MessageRef};
pub use report::{FolderReport, RunReport, RunStatus, TaskFailure};
