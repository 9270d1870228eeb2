//! Per-folder reconciliation index
//!
//! Maps each message fingerprint to its metadata for one side of a
//! folder job. Built once per folder per endpoint; the scheduler diffs
//! two of these to decide what to copy.

use log::warn;
use std::collections::HashMap;

use crate::fingerprint::{Fingerprint, FingerprintStrategy};
use crate::gateway::{ConnectionGateway, FolderHandle, GatewayResult};
use crate::models::MessageMeta;

#[derive(Debug, Default)]
pub struct ReconciliationIndex {
    entries: HashMap<Fingerprint, MessageMeta>,
    duplicates: usize,
    failures: usize,
}

impl ReconciliationIndex {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, fingerprint: &Fingerprint) -> bool {
        self.entries.contains_key(fingerprint)
    }

    pub fn get(&self, fingerprint: &Fingerprint) -> Option<&MessageMeta> {
        self.entries.get(fingerprint)
    }

    /// Insert an entry, returning the previous metadata when the
    /// fingerprint was already present (last seen wins).
    pub fn insert(&mut self, fingerprint: Fingerprint, meta: MessageMeta) -> Option<MessageMeta> {
        self.entries.insert(fingerprint, meta)
    }

    pub fn entries(&self) -> impl Iterator<Item = (&Fingerprint, &MessageMeta)> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Messages that shared a fingerprint with an earlier message in
    /// the same folder. Counted, never silently dropped.
    pub fn duplicates(&self) -> usize {
        self.duplicates
    }

    /// Messages whose fingerprint could not be computed. Excluded from
    /// the index; the source side effectively has items we cannot
    /// verify this run.
    pub fn failures(&self) -> usize {
        self.failures
    }
}

/// Enumerate the selected folder and fingerprint every message.
///
/// Content is fetched only when the strategy requires it. A message
/// that cannot be fetched or fingerprinted is logged, counted and
/// skipped; only authentication loss propagates.
pub fn build_index(
    gateway: &mut dyn ConnectionGateway,
    folder: &FolderHandle,
    strategy: &dyn FingerprintStrategy,
) -> GatewayResult<ReconciliationIndex> {
    let metas = gateway.enumerate_messages(folder)?;
    let mut index = ReconciliationIndex::new();

    for meta in metas {
        let content = if strategy.needs_content() {
            match gateway.fetch_content(folder, &meta.uid) {
                Ok(content) => Some(content),
                Err(e) if e.is_fatal() => return Err(e),
                Err(e) => {
                    warn!(
                        "skipping uid {} in {}: content fetch failed: {}",
                        meta.uid.uid(),
                        folder.path,
                        e
                    );
                    index.failures += 1;
                    continue;
                }
            }
        } else {
            None
        };

        match strategy.compute(&meta, content.as_deref()) {
            Ok(fingerprint) => {
                if index.insert(fingerprint, meta).is_some() {
                    index.duplicates += 1;
                }
            }
            Err(e) => {
                warn!(
                    "skipping uid {} in {}: fingerprint failed: {}",
                    meta.uid.uid(),
                    folder.path,
                    e
                );
                index.failures += 1;
            }
        }
    }

    Ok(index)
}
