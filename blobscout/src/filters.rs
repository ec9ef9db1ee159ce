/// Object filtering applied by the discoverer to every listed object.
///
/// Two cheap checks decide whether a listed object becomes a task:
///
/// 1. **Key match**: the configured key pattern must match somewhere in the key
///    (unanchored, like `grep`).
/// 2. **Looks empty**: an object whose declared size says it cannot hold any
///    content is skipped, saving a fetch. That is a size of zero, or exactly the
///    size of an empty archive for the compression format its key implies.
///
/// The size check is a heuristic only. Workers still cope with objects that
/// turn out to be empty after decompression.
use regex::Regex;

use crate::decompress::Compression;

/// Checks whether an object's declared size means it has no content
pub fn looks_empty(key: &str, size: u64) -> bool {
    if size == 0 {
        return true;
    }
    Compression::from_key(key).empty_archive_len() == Some(size)
}

/// Decides which listed objects are worth fetching
#[derive(Debug, Clone)]
pub struct ObjectFilter {
    key_pattern: Regex,
}

impl ObjectFilter {
    pub fn new(key_pattern: Regex) -> Self {
        Self { key_pattern }
    }

    pub fn key_pattern(&self) -> &Regex {
        &self.key_pattern
    }

    /// Checks if the key matches the pattern
    pub fn matches_key(&self, key: &str) -> bool {
        self.key_pattern.is_match(key)
    }

    /// Determines if an object should become a task
    pub fn should_process(&self, key: &str, size: u64) -> bool {
        self.matches_key(key) && !looks_empty(key, size)
    }
}
