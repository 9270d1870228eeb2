//! Run-scoped observability and cooperative cancellation
//!
//! No process-global state: events flow to a caller-supplied observer
//! whose lifetime is one run, and cancellation is a shared flag checked
//! at suspension points (between folder jobs, between copy attempts,
//! inside backoff sleeps).

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

/// Cooperative cancellation flag. Clone it into whatever context reacts
/// to operator interrupts; the engine only ever reads it.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Structured progress events emitted during a run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncEvent {
    RunStarted {
        folders: usize,
    },
    FolderExcluded {
        folder: String,
    },
    FolderStarted {
        folder: String,
    },
    FolderFinished {
        folder: String,
    },
    MessageCopied {
        folder: String,
        fingerprint: String,
    },
    CopyRetried {
        folder: String,
        fingerprint: String,
        attempt: u32,
        error: String,
    },
    CopyFailed {
        folder: String,
        fingerprint: String,
        error: String,
    },
}
