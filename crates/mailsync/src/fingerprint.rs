//! Message fingerprinting strategies
//!
//! A fingerprint identifies "the same message" across two stores with
//! unrelated local identifiers. The strategy is pluggable so new
//! tradeoff points (a hybrid header-digest mode, say) can be added
//! without touching the copy scheduler.

use sha2::{Digest, Sha256};
use std::fmt;

use crate::config::ScanMode;
use crate::models::MessageMeta;

/// Reconciliation key for a message, comparable across stores.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Fingerprint(String);

impl Fingerprint {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum FingerprintError {
    #[error("message content required for content-digest fingerprinting")]
    MissingContent,
}

/// Computes fingerprints for one scan mode. Both endpoints of a folder
/// job must use the same strategy instance so keys are comparable.
pub trait FingerprintStrategy {
    /// Whether [`compute`](Self::compute) requires the raw message
    /// content. Strategies answering `false` let the indexer skip body
    /// fetches entirely.
    fn needs_content(&self) -> bool;

    fn compute(
        &self,
        meta: &MessageMeta,
        content: Option<&[u8]>,
    ) -> Result<Fingerprint, FingerprintError>;
}

/// Metadata-only fingerprinting: size plus internal date. Messages that
/// happen to share both alias to one key; acceptable for speed.
pub struct FastScan;

impl FingerprintStrategy for FastScan {
    fn needs_content(&self) -> bool {
        false
    }

    fn compute(
        &self,
        meta: &MessageMeta,
        _content: Option<&[u8]>,
    ) -> Result<Fingerprint, FingerprintError> {
        Ok(Fingerprint(format!(
            "fast:{}:{}",
            meta.size,
            meta.internal_date.timestamp()
        )))
    }
}

/// Content-digest fingerprinting: SHA-256 of the full raw message plus
/// internal date. Collision-resistant across stores.
pub struct AccurateScan;

impl FingerprintStrategy for AccurateScan {
    fn needs_content(&self) -> bool {
        true
    }

    fn compute(
        &self,
        meta: &MessageMeta,
        content: Option<&[u8]>,
    ) -> Result<Fingerprint, FingerprintError> {
        let content = content.ok_or(FingerprintError::MissingContent)?;
        let digest = Sha256::digest(content);
        let hex: String = digest.iter().map(|b| format!("{:02x}", b)).collect();
        Ok(Fingerprint(format!(
            "sha256:{}:{}",
            hex,
            meta.internal_date.timestamp()
        )))
    }
}

/// Strategy for a configured scan mode.
pub fn strategy_for(mode: ScanMode) -> Box<dyn FingerprintStrategy> {
    match mode {
        ScanMode::Fast => Box::new(FastScan),
        ScanMode::Accurate => Box::new(AccurateScan),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::MessageRef;
    use chrono::{TimeZone, Utc};

    fn make_meta(size: usize, ts: i64) -> MessageMeta {
        MessageMeta::new(MessageRef::new(1), size, Utc.timestamp_opt(ts, 0).unwrap())
    }

    #[test]
    fn test_fast_ignores_content() {
        let meta = make_meta(512, 1_700_000_000);
        let a = FastScan.compute(&meta, None).unwrap();
        let b = FastScan.compute(&meta, Some(b"whatever")).unwrap();
        assert_eq!(a, b);
        assert_eq!(a.as_str(), "fast:512:1700000000");
    }

    #[test]
    fn test_fast_aliases_equal_metadata() {
        // Known tradeoff: distinct content, same size and date.
        let meta = make_meta(4, 1_700_000_000);
        let a = FastScan.compute(&meta, Some(b"aaaa")).unwrap();
        let b = FastScan.compute(&meta, Some(b"bbbb")).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_accurate_distinguishes_content() {
        let meta = make_meta(4, 1_700_000_000);
        let a = AccurateScan.compute(&meta, Some(b"aaaa")).unwrap();
        let b = AccurateScan.compute(&meta, Some(b"bbbb")).unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn test_accurate_stable_across_stores() {
        // Same content and date but different store-local attributes
        // must produce the same key.
        let left = make_meta(4, 1_700_000_000);
        let mut right = make_meta(9999, 1_700_000_000);
        right.uid = MessageRef::new(42);
        let a = AccurateScan.compute(&left, Some(b"mail")).unwrap();
        let b = AccurateScan.compute(&right, Some(b"mail")).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_accurate_requires_content() {
        let meta = make_meta(4, 1_700_000_000);
        assert!(AccurateScan.compute(&meta, None).is_err());
    }

    #[test]
    fn test_strategy_factory() {
        assert!(!strategy_for(ScanMode::Fast).needs_content());
        assert!(strategy_for(ScanMode::Accurate).needs_content());
    }
}
