use std::collections::BTreeMap;
use std::io::{Cursor, Read};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use super::{page_from_sorted, ListPage, ObjectStore, ObjectSummary};
use crate::errors::{SearchError, SearchResult};

#[derive(Debug, Clone)]
struct StoredObject {
    data: Arc<Vec<u8>>,
    declared_size: u64,
}

/// In-memory object store, mainly for tests and benchmarks
#[derive(Debug, Default)]
pub struct MemoryStore {
    buckets: BTreeMap<String, BTreeMap<String, StoredObject>>,
    fetches: AtomicU64,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds an object whose declared size is its real length
    pub fn insert(&mut self, bucket: &str, key: &str, data: impl Into<Vec<u8>>) {
        let data = data.into();
        let size = data.len() as u64;
        self.insert_with_size(bucket, key, data, size);
    }

    /// Adds an object that reports `declared_size` in listings regardless of its content
    pub fn insert_with_size(
        &mut self,
        bucket: &str,
        key: &str,
        data: impl Into<Vec<u8>>,
        declared_size: u64,
    ) {
        self.buckets.entry(bucket.to_string()).or_default().insert(
            key.to_string(),
            StoredObject {
                data: Arc::new(data.into()),
                declared_size,
            },
        );
    }

    /// Number of `get_object` calls served so far
    pub fn fetch_count(&self) -> u64 {
        self.fetches.load(Ordering::Relaxed)
    }
}

impl ObjectStore for MemoryStore {
    fn list_page(
        &self,
        bucket: &str,
        prefix: &str,
        start_after: Option<&str>,
        max_keys: usize,
    ) -> SearchResult<ListPage> {
        let objects = self
            .buckets
            .get(bucket)
            .ok_or_else(|| SearchError::list_failed(prefix, format!("no such bucket: {}", bucket)))?;

        // BTreeMap iteration is already in byte order
        let sorted: Vec<ObjectSummary> = objects
            .range(prefix.to_string()..)
            .take_while(|(key, _)| key.starts_with(prefix))
            .map(|(key, obj)| ObjectSummary {
                key: key.clone(),
                size: obj.declared_size,
            })
            .collect();

        Ok(page_from_sorted(&sorted, start_after, max_keys))
    }

    fn get_object(&self, bucket: &str, key: &str) -> SearchResult<Box<dyn Read + Send>> {
        self.fetches.fetch_add(1, Ordering::Relaxed);
        let obj = self
            .buckets
            .get(bucket)
            .and_then(|objects| objects.get(key))
            .ok_or_else(|| SearchError::fetch_failed(key, "no such key"))?;
        Ok(Box::new(Cursor::new(SharedBytes(Arc::clone(&obj.data)))))
    }
}

/// Lets a `Cursor` read from shared bytes without copying them per fetch.
struct SharedBytes(Arc<Vec<u8>>);

impl AsRef<[u8]> for SharedBytes {
    fn as_ref(&self) -> &[u8] {
        self.0.as_slice()
    }
}
