//! Message reference and metadata models

use chrono::{DateTime, Utc};

/// Store-local unique identifier for a message within its folder.
///
/// Not stable across stores or across store re-indexing, which is why
/// reconciliation keys on fingerprints instead.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MessageRef(pub u32);

impl MessageRef {
    pub fn new(uid: u32) -> Self {
        Self(uid)
    }

    pub fn uid(&self) -> u32 {
        self.0
    }
}

/// Cheaply-available message attributes from a folder enumeration.
/// Raw content is fetched lazily through the gateway when needed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageMeta {
    pub uid: MessageRef,
    pub size: usize,
    pub internal_date: DateTime<Utc>,
    pub flags: Vec<String>,
}

impl MessageMeta {
    pub fn new(uid: MessageRef, size: usize, internal_date: DateTime<Utc>) -> Self {
        Self {
            uid,
            size,
            internal_date,
            flags: Vec::new(),
        }
    }

    pub fn with_flags(mut self, flags: Vec<String>) -> Self {
        self.flags = flags;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_meta_builder() {
        let meta = MessageMeta::new(MessageRef::new(7), 1024, Utc::now())
            .with_flags(vec!["\\Seen".to_string()]);
        assert_eq!(meta.uid.uid(), 7);
        assert_eq!(meta.size, 1024);
        assert_eq!(meta.flags, vec!["\\Seen"]);
    }
}
