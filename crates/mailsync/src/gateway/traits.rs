//! Gateway trait and error taxonomy

use chrono::{DateTime, Utc};
use std::time::Duration;

use crate::models::{Folder, FolderPath, MessageMeta, MessageRef};

/// Failure classes surfaced by gateway operations. The copy scheduler
/// keys its retry decisions on these, never on error text.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GatewayError {
    /// Network drop, timeout, server busy. Retryable.
    #[error("transient failure: {0}")]
    Transient(String),
    /// Session authentication lost or rejected. Fatal for the run.
    #[error("authentication failure: {0}")]
    AuthFailure(String),
    /// Folder or message does not exist. Non-retryable for the task.
    #[error("not found: {0}")]
    NotFound(String),
    /// Non-retryable for the task.
    #[error("permission denied: {0}")]
    PermissionDenied(String),
    /// Destination refused the write for space. Non-retryable.
    #[error("quota exceeded: {0}")]
    QuotaExceeded(String),
}

impl GatewayError {
    /// Whether a retry with backoff may succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, GatewayError::Transient(_))
    }

    /// Whether the whole run must abort.
    pub fn is_fatal(&self) -> bool {
        matches!(self, GatewayError::AuthFailure(_))
    }
}

pub type GatewayResult<T> = Result<T, GatewayError>;

/// What one endpoint's store can do. Consulted by the scheduler before
/// attempting folder creation or flag preservation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EndpointCapabilities {
    pub create_folders: bool,
    pub flag_sync: bool,
    pub case_insensitive_paths: bool,
}

impl Default for EndpointCapabilities {
    fn default() -> Self {
        Self {
            create_folders: true,
            flag_sync: true,
            case_insensitive_paths: false,
        }
    }
}

/// Token for a selected folder. Sessions are stateful; operations that
/// take a handle are only valid until the next `select_folder` on the
/// same gateway.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FolderHandle {
    pub path: FolderPath,
}

/// One authenticated, stateful session to a mailbox store.
///
/// Methods take `&mut self`: a session is a strictly sequential
/// resource (selected folder, pending fetches) and must never be driven
/// by two concurrent operations.
pub trait ConnectionGateway {
    fn capabilities(&self) -> EndpointCapabilities;

    /// Caller-supplied timeout applied to each subsequent operation.
    fn set_operation_timeout(&mut self, timeout: Duration);

    /// List folders under `root`, optionally restricted to subscribed
    /// ones. Returns the full subtree, not just direct children.
    fn list_folders(&mut self, root: &FolderPath, subscribed_only: bool)
    -> GatewayResult<Vec<Folder>>;

    fn folder_exists(&mut self, path: &FolderPath) -> GatewayResult<bool>;

    /// Create a folder (and any missing ancestors). Creating an
    /// existing folder is not an error.
    fn create_folder(&mut self, path: &FolderPath) -> GatewayResult<()>;

    fn select_folder(&mut self, path: &FolderPath) -> GatewayResult<FolderHandle>;

    /// Enumerate message metadata in the selected folder. Bodies are
    /// not fetched.
    fn enumerate_messages(&mut self, folder: &FolderHandle) -> GatewayResult<Vec<MessageMeta>>;

    /// Fetch the raw content of one message.
    fn fetch_content(&mut self, folder: &FolderHandle, message: &MessageRef)
    -> GatewayResult<Vec<u8>>;

    /// Append a message to the selected folder, preserving flags and
    /// internal date.
    fn append(
        &mut self,
        folder: &FolderHandle,
        content: &[u8],
        flags: &[String],
        internal_date: DateTime<Utc>,
    ) -> GatewayResult<MessageRef>;
}
