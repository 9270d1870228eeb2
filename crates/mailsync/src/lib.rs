//! Mailbox synchronization engine
//!
//! Migrates messages between two mail stores reached over stateful,
//! session-oriented connections. Given a source and destination
//! endpoint, the engine determines which messages exist on the source
//! but not the destination and replicates them (with folder structure
//! and flags) without duplication and tolerant of transient failures.
//! Runs are discrete, idempotent passes: re-running against unchanged
//! stores copies nothing.
//!
//! This crate provides:
//! - Folder-tree discovery with wildcard exclusion pruning
//! - Message-identity reconciliation via pluggable fingerprints
//!   (fast metadata-only or accurate content-digest scanning)
//! - A copy state machine with bounded retry and exponential backoff
//! - A trustworthy dry-run mode backed by a shadow overlay
//! - Cooperative cancellation that always returns the partial report
//!
//! Transport is consumed through the [`gateway::ConnectionGateway`]
//! trait; connecting, authenticating and the wire protocol itself live
//! in external collaborators, as do CLI parsing and report formatting.

pub mod config;
pub mod fingerprint;
pub mod gateway;
pub mod matcher;
pub mod models;
pub mod sync;

pub use config::{FolderSelection, ScanMode, SyncConfig};
pub use fingerprint::{
    AccurateScan, FastScan, Fingerprint, FingerprintError, FingerprintStrategy, strategy_for,
};
pub use gateway::{
    ConnectionGateway, DryRunGateway, EndpointCapabilities, FolderHandle, GatewayError,
    GatewayResult, InMemoryGateway,
};
pub use matcher::FolderPathMatcher;
pub use models::{
    Folder, FolderJob, FolderPath, FolderReport, MessageMeta, MessageRef, RunReport, RunStatus,
    TaskFailure,
};
pub use sync::{
    CancelToken, CopyTask, FolderPlan, ReconciliationIndex, SyncError, SyncEvent, TaskState,
    build_index, plan_folder_jobs, sync_folder, sync_mailboxes, sync_mailboxes_with,
};
