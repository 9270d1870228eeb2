//! Connection gateway abstraction
//!
//! The engine never speaks a wire protocol. It consumes an
//! authenticated session through [`ConnectionGateway`], implemented by
//! an external transport collaborator. The trait-based design lets the
//! same reconciliation logic run against a live session, the in-memory
//! store used in tests, or the dry-run overlay.

mod dryrun;
mod memory;
mod traits;

pub use dryrun::DryRunGateway;
pub use memory::InMemoryGateway;
pub use traits::{
    ConnectionGateway, EndpointCapabilities, FolderHandle, GatewayError, GatewayResult,
};
