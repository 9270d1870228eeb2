//! Fatal error taxonomy for a synchronization run
//!
//! Only these abort a run; folder-level and task-level failures are
//! recorded in the report and the run continues.

use crate::gateway::GatewayError;

#[derive(Debug, thiserror::Error)]
pub enum SyncError {
    /// The session to one endpoint lost authentication. The partial
    /// report accumulated so far is still returned.
    #[error("authentication lost: {0}")]
    AuthenticationLost(GatewayError),
    /// Root folder enumeration failed outright; no traversal possible.
    #[error("folder enumeration failed: {0}")]
    EnumerationFailed(GatewayError),
}
