//! Engine configuration
//!
//! The CLI layer (external to this crate) resolves flags, prompts for
//! credentials and validates mutually-exclusive options; the engine
//! only ever receives an already-resolved `SyncConfig`. JSON loading is
//! provided for callers that persist run configurations.

use anyhow::{Context, Result, bail};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::models::FolderPath;

/// How message fingerprints are computed for reconciliation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScanMode {
    /// Metadata only (size + internal date). Never fetches message
    /// bodies, so indexing is cheap, but distinct messages with equal
    /// metadata alias to one fingerprint. A deliberate speed/accuracy
    /// tradeoff for very large mailboxes.
    Fast,
    /// Full-content digest. Collision-resistant across stores at the
    /// cost of fetching every message body on both sides. The default
    /// when not requested otherwise.
    #[default]
    Accurate,
}

/// Which folders a run covers. Resolved by the caller; the variants are
/// mutually exclusive by construction.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FolderSelection {
    /// Exactly one folder, no recursion. Explicit selection overrides
    /// exclusion patterns.
    Single(FolderPath),
    /// Every folder under the source root.
    #[default]
    RecurseAll,
    /// Only folders the source store reports as subscribed.
    RecurseSubscribed,
}

/// Configuration surface consumed by the synchronization engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SyncConfig {
    pub selection: FolderSelection,
    /// Root of the source traversal for recursive selections.
    pub source_root: FolderPath,
    /// Exclusion patterns supplied inline. Unioned with `exclude_file`.
    pub exclude: Vec<String>,
    /// Optional file of exclusion patterns, one per line; `#` comments
    /// and blank lines ignored. Merged with `exclude`, never replacing it.
    pub exclude_file: Option<PathBuf>,
    pub scan_mode: ScanMode,
    /// Rehearsal mode: decisions and the report are real, destination
    /// mutations are not.
    pub dry_run: bool,
    /// Whether missing destination folders may be created.
    pub create_folders: bool,
    /// Number of retries after the first attempt for transient
    /// failures. 0 means a single attempt with no retries.
    pub retry_budget: u32,
    /// Per-operation timeout handed to both gateways.
    pub operation_timeout: Duration,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            selection: FolderSelection::RecurseAll,
            source_root: FolderPath::root(),
            exclude: Vec::new(),
            exclude_file: None,
            scan_mode: ScanMode::Accurate,
            dry_run: false,
            create_folders: true,
            retry_budget: 2,
            operation_timeout: Duration::from_secs(30),
        }
    }
}

impl SyncConfig {
    /// Parse a configuration from a JSON string.
    pub fn from_json(json: &str) -> Result<Self> {
        let config: SyncConfig =
            serde_json::from_str(json).context("Failed to parse sync configuration JSON")?;
        config.validate()?;
        Ok(config)
    }

    /// Load a configuration from a JSON file.
    pub fn from_file(path: &Path) -> Result<Self> {
        let json = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read sync configuration from {}", path.display()))?;
        Self::from_json(&json)
    }

    /// Sanity checks on an already-resolved configuration. Flag-level
    /// validation (mutually exclusive selections etc.) belongs to the
    /// CLI layer.
    pub fn validate(&self) -> Result<()> {
        if let FolderSelection::Single(path) = &self.selection {
            if path.is_root() {
                bail!("single-folder selection requires a non-empty folder path");
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = SyncConfig::default();
        assert_eq!(config.scan_mode, ScanMode::Accurate);
        assert_eq!(config.selection, FolderSelection::RecurseAll);
        assert!(config.create_folders);
        assert!(!config.dry_run);
        assert_eq!(config.retry_budget, 2);
    }

    #[test]
    fn test_json_round_trip() {
        let mut config = SyncConfig::default();
        config.selection = FolderSelection::Single(FolderPath::parse("INBOX/Sub"));
        config.exclude = vec!["Trash*".to_string()];
        config.scan_mode = ScanMode::Fast;
        config.dry_run = true;

        let json = serde_json::to_string(&config).unwrap();
        let back = SyncConfig::from_json(&json).unwrap();
        assert_eq!(config, back);
    }

    #[test]
    fn test_parse_minimal_json() {
        let json = r#"{
            "selection": "recurse_subscribed",
            "source_root": [],
            "exclude": ["Spam", "Trash*"],
            "exclude_file": null,
            "scan_mode": "fast",
            "dry_run": false,
            "create_folders": true,
            "retry_budget": 0,
            "operation_timeout": { "secs": 10, "nanos": 0 }
        }"#;

        let config = SyncConfig::from_json(json).unwrap();
        assert_eq!(config.selection, FolderSelection::RecurseSubscribed);
        assert_eq!(config.scan_mode, ScanMode::Fast);
        assert_eq!(config.retry_budget, 0);
        assert_eq!(config.operation_timeout, Duration::from_secs(10));
    }

    #[test]
    fn test_validate_rejects_empty_single_folder() {
        let mut config = SyncConfig::default();
        config.selection = FolderSelection::Single(FolderPath::root());
        assert!(config.validate().is_err());
    }
}
