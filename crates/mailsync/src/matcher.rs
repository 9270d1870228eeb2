//! Folder exclusion pattern matching
//!
//! Patterns use shell-style wildcards (`*` matches any run of
//! characters including the path separator, `?` matches exactly one);
//! a pattern without wildcards is an exact path match. Matching is
//! case-sensitive unless the endpoint declares case-insensitive folder
//! names. Pure and deterministic.

use anyhow::{Context, Result};
use std::path::Path;

use crate::models::FolderPath;

/// Compiled exclusion pattern set for one run.
#[derive(Debug, Clone)]
pub struct FolderPathMatcher {
    patterns: Vec<String>,
    case_insensitive: bool,
}

impl FolderPathMatcher {
    pub fn new<I, S>(patterns: I, case_insensitive: bool) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let patterns = patterns
            .into_iter()
            .map(|p| {
                let p: String = p.into();
                if case_insensitive { p.to_lowercase() } else { p }
            })
            .collect();
        Self {
            patterns,
            case_insensitive,
        }
    }

    /// Build a matcher from an explicit pattern list and an optional
    /// pattern file. The two sources are unioned; the file never
    /// overrides the list.
    pub fn from_sources(
        patterns: &[String],
        file: Option<&Path>,
        case_insensitive: bool,
    ) -> Result<Self> {
        let mut merged: Vec<String> = patterns.to_vec();
        if let Some(path) = file {
            let text = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read exclusion file {}", path.display()))?;
            for line in text.lines() {
                let line = line.trim();
                if line.is_empty() || line.starts_with('#') {
                    continue;
                }
                merged.push(line.to_string());
            }
        }
        Ok(Self::new(merged, case_insensitive))
    }

    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }

    /// Whether any pattern matches this exact path.
    pub fn matches(&self, path: &FolderPath) -> bool {
        let text = if self.case_insensitive {
            path.to_lowercase().to_string()
        } else {
            path.to_string()
        };
        self.patterns.iter().any(|p| wildcard_match(p, &text))
    }

    /// Whether the path or any of its ancestors matches. An excluded
    /// folder prunes its entire subtree from traversal.
    pub fn is_excluded(&self, path: &FolderPath) -> bool {
        if self.patterns.is_empty() {
            return false;
        }
        self.matches(path) || path.ancestors().any(|a| self.matches(&a))
    }
}

/// Iterative wildcard match with single-star backtracking.
fn wildcard_match(pattern: &str, text: &str) -> bool {
    let p: Vec<char> = pattern.chars().collect();
    let t: Vec<char> = text.chars().collect();
    let (mut pi, mut ti) = (0usize, 0usize);
    let mut star: Option<(usize, usize)> = None;

    while ti < t.len() {
        if pi < p.len() && (p[pi] == '?' || p[pi] == t[ti]) {
            pi += 1;
            ti += 1;
        } else if pi < p.len() && p[pi] == '*' {
            star = Some((pi, ti));
            pi += 1;
        } else if let Some((sp, st)) = star {
            // Widen the last star by one character and retry.
            pi = sp + 1;
            ti = st + 1;
            star = Some((sp, st + 1));
        } else {
            return false;
        }
    }

    while pi < p.len() && p[pi] == '*' {
        pi += 1;
    }
    pi == p.len()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_exact_match() {
        let matcher = FolderPathMatcher::new(vec!["Trash"], false);
        assert!(matcher.matches(&FolderPath::parse("Trash")));
        assert!(!matcher.matches(&FolderPath::parse("Trash2")));
        assert!(!matcher.matches(&FolderPath::parse("trash")));
    }

    #[test]
    fn test_wildcard_star() {
        let matcher = FolderPathMatcher::new(vec!["Trash*"], false);
        assert!(matcher.matches(&FolderPath::parse("Trash")));
        assert!(matcher.matches(&FolderPath::parse("Trash/Old")));
        assert!(matcher.matches(&FolderPath::parse("Trash2024")));
        assert!(!matcher.matches(&FolderPath::parse("INBOX/Trash")));
    }

    #[test]
    fn test_wildcard_question_mark() {
        let matcher = FolderPathMatcher::new(vec!["Spam?"], false);
        assert!(matcher.matches(&FolderPath::parse("Spam1")));
        assert!(!matcher.matches(&FolderPath::parse("Spam")));
        assert!(!matcher.matches(&FolderPath::parse("Spam12")));
    }

    #[test]
    fn test_interior_star() {
        let matcher = FolderPathMatcher::new(vec!["*/Drafts"], false);
        assert!(matcher.matches(&FolderPath::parse("Work/Drafts")));
        assert!(matcher.matches(&FolderPath::parse("Work/2024/Drafts")));
        assert!(!matcher.matches(&FolderPath::parse("Drafts")));
    }

    #[test]
    fn test_case_insensitive() {
        let matcher = FolderPathMatcher::new(vec!["trash*"], true);
        assert!(matcher.matches(&FolderPath::parse("TRASH/Old")));
        assert!(matcher.matches(&FolderPath::parse("Trash")));
    }

    #[test]
    fn test_is_excluded_covers_descendants() {
        let matcher = FolderPathMatcher::new(vec!["Trash"], false);
        assert!(matcher.is_excluded(&FolderPath::parse("Trash")));
        assert!(matcher.is_excluded(&FolderPath::parse("Trash/Old")));
        assert!(matcher.is_excluded(&FolderPath::parse("Trash/Old/2020")));
        assert!(!matcher.is_excluded(&FolderPath::parse("INBOX")));
    }

    #[test]
    fn test_empty_matcher_excludes_nothing() {
        let matcher = FolderPathMatcher::new(Vec::<String>::new(), false);
        assert!(!matcher.is_excluded(&FolderPath::parse("Trash")));
        assert!(matcher.is_empty());
    }

    #[test]
    fn test_from_sources_merges_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "# folders nobody wants").unwrap();
        writeln!(file, "Junk").unwrap();
        writeln!(file).unwrap();
        writeln!(file, "Lists/*").unwrap();
        file.flush().unwrap();

        let inline = vec!["Trash*".to_string()];
        let matcher =
            FolderPathMatcher::from_sources(&inline, Some(file.path()), false).unwrap();

        assert!(matcher.matches(&FolderPath::parse("Trash")));
        assert!(matcher.matches(&FolderPath::parse("Junk")));
        assert!(matcher.matches(&FolderPath::parse("Lists/rust-dev")));
        assert!(!matcher.matches(&FolderPath::parse("INBOX")));
    }

    #[test]
    fn test_from_sources_missing_file_errors() {
        let result = FolderPathMatcher::from_sources(
            &[],
            Some(Path::new("/nonexistent/excludes.txt")),
            false,
        );
        assert!(result.is_err());
    }
}
