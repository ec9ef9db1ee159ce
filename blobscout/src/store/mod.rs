//! Object store seam.
//!
//! The search pipeline only needs two operations from a bucket-style store:
//! paged listing under a prefix and whole-object fetch. Anything that can do
//! both (an S3 client, a directory tree, an in-memory map) implements
//! [`ObjectStore`] and plugs into [`search`](crate::search::search).
//!
//! Listing follows `ListObjectsV2` semantics: keys come back in ascending byte
//! order and each page carries the key to resume after, or `None` on the last
//! page.

mod local;
mod memory;

pub use local::LocalStore;
pub use memory::MemoryStore;

use serde::Serialize;
use std::io::Read;

use crate::errors::SearchResult;

/// Key and declared size of one listed object
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ObjectSummary {
    pub key: String,
    pub size: u64,
}

/// One page of a listing
#[derive(Debug, Clone, Default)]
pub struct ListPage {
    pub objects: Vec<ObjectSummary>,
    /// Key to pass as `start_after` for the next page; `None` when this is the last page
    pub next_start_after: Option<String>,
}

impl ListPage {
    pub fn is_last(&self) -> bool {
        self.next_start_after.is_none()
    }
}

/// A bucket-style object store
pub trait ObjectStore: Send + Sync {
    /// Lists up to `max_keys` objects under `prefix` whose keys sort after `start_after`.
    fn list_page(
        &self,
        bucket: &str,
        prefix: &str,
        start_after: Option<&str>,
        max_keys: usize,
    ) -> SearchResult<ListPage>;

    /// Opens an object's content as a byte stream.
    fn get_object(&self, bucket: &str, key: &str) -> SearchResult<Box<dyn Read + Send>>;
}

/// Cuts one page out of a key-sorted listing.
pub(crate) fn page_from_sorted(
    sorted: &[ObjectSummary],
    start_after: Option<&str>,
    max_keys: usize,
) -> ListPage {
    let start = match start_after {
        Some(after) => sorted.partition_point(|o| o.key.as_str() <= after),
        None => 0,
    };
    let end = start.saturating_add(max_keys.max(1)).min(sorted.len());
    let objects = sorted[start..end].to_vec();
    let next_start_after = if end < sorted.len() {
        objects.last().map(|o| o.key.clone())
    } else {
        None
    };
    ListPage {
        objects,
        next_start_after,
    }
}
