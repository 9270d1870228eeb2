//! Folder path and folder-pairing models

use serde::{Deserialize, Serialize};
use std::fmt;

/// A folder location inside a mailbox store, as an ordered sequence of
/// path segments. Stored `/`-normalized regardless of the delimiter the
/// underlying store uses; gateways translate at the session boundary.
///
/// The derived ordering is lexicographic by segment, which places every
/// parent before its children. Folder jobs rely on that so destination
/// folder creation never runs ahead of the parent folder.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct FolderPath(Vec<String>);

impl FolderPath {
    /// The store root (empty path).
    pub fn root() -> Self {
        Self(Vec::new())
    }

    /// Parse a `/`-separated path. Empty segments are dropped, so
    /// `"INBOX//Archive/"` parses the same as `"INBOX/Archive"`.
    pub fn parse(path: &str) -> Self {
        Self(
            path.split('/')
                .filter(|s| !s.is_empty())
                .map(|s| s.to_string())
                .collect(),
        )
    }

    pub fn from_segments(segments: Vec<String>) -> Self {
        Self(segments)
    }

    pub fn is_root(&self) -> bool {
        self.0.is_empty()
    }

    pub fn segments(&self) -> &[String] {
        &self.0
    }

    /// Last path segment, if any.
    pub fn name(&self) -> Option<&str> {
        self.0.last().map(|s| s.as_str())
    }

    /// Parent folder path; `None` at the root.
    pub fn parent(&self) -> Option<FolderPath> {
        if self.0.is_empty() {
            None
        } else {
            Some(Self(self.0[..self.0.len() - 1].to_vec()))
        }
    }

    /// Child path with one more segment.
    pub fn child(&self, name: impl Into<String>) -> FolderPath {
        let mut segments = self.0.clone();
        segments.push(name.into());
        Self(segments)
    }

    /// True when `prefix` is this path or one of its ancestors.
    pub fn starts_with(&self, prefix: &FolderPath) -> bool {
        self.0.len() >= prefix.0.len() && self.0[..prefix.0.len()] == prefix.0[..]
    }

    /// Proper ancestors, nearest first, excluding the root.
    pub fn ancestors(&self) -> impl Iterator<Item = FolderPath> + '_ {
        (1..self.0.len())
            .rev()
            .map(|n| Self(self.0[..n].to_vec()))
    }

    /// Case-folded copy, for stores with case-insensitive folder names.
    pub fn to_lowercase(&self) -> FolderPath {
        Self(self.0.iter().map(|s| s.to_lowercase()).collect())
    }
}

impl fmt::Display for FolderPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.join("/"))
    }
}

impl From<&str> for FolderPath {
    fn from(s: &str) -> Self {
        Self::parse(s)
    }
}

/// A folder as reported by a gateway's listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Folder {
    pub path: FolderPath,
    /// Whether the store reports this folder as subscribed.
    pub subscribed: bool,
    /// Message count hint from the listing, when the store provides one.
    /// Purely informational; reconciliation never trusts it.
    pub message_count: Option<usize>,
}

impl Folder {
    pub fn new(path: FolderPath) -> Self {
        Self {
            path,
            subscribed: true,
            message_count: None,
        }
    }
}

/// A source folder paired with the destination path it synchronizes
/// into. The destination path is always the identity mapping of the
/// source path; the destination folder itself may not exist yet and is
/// created on demand by the copy scheduler.
#[derive(Debug, Clone)]
pub struct FolderJob {
    pub source: Folder,
    pub destination_path: FolderPath,
}

impl FolderJob {
    pub fn new(source: Folder) -> Self {
        let destination_path = source.path.clone();
        Self {
            source,
            destination_path,
        }
    }
}
