use dashmap::DashMap;
use ignore::WalkBuilder;
use std::fs::File;
use std::io::Read;
use std::path::{Component, Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, trace};

use super::{page_from_sorted, ListPage, ObjectStore, ObjectSummary};
use crate::errors::{SearchError, SearchResult};

/// Directory tree exposed as a bucket store.
///
/// Each immediate subdirectory of `root` is a bucket and every regular file
/// below it is an object keyed by its `/`-separated relative path. Nothing is
/// skipped: hidden files and ignore files are ordinary objects here.
#[derive(Debug)]
pub struct LocalStore {
    root: PathBuf,
    listings: DashMap<(String, String), Arc<Vec<ObjectSummary>>>,
}

impl LocalStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            listings: DashMap::new(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn bucket_dir(&self, bucket: &str) -> PathBuf {
        self.root.join(bucket)
    }

    /// Walks the bucket once per prefix; later pages are cut from the cached listing.
    fn listing(&self, bucket: &str, prefix: &str) -> SearchResult<Arc<Vec<ObjectSummary>>> {
        let cache_key = (bucket.to_string(), prefix.to_string());
        if let Some(entry) = self.listings.get(&cache_key) {
            return Ok(Arc::clone(entry.value()));
        }

        let bucket_dir = self.bucket_dir(bucket);
        if !bucket_dir.is_dir() {
            return Err(SearchError::list_failed(
                prefix,
                format!("no such bucket: {}", bucket_dir.display()),
            ));
        }

        debug!("Walking bucket directory: {}", bucket_dir.display());
        let mut objects = Vec::new();
        for entry in WalkBuilder::new(&bucket_dir)
            .standard_filters(false)
            .follow_links(false)
            .build()
        {
            let entry = entry.map_err(|e| SearchError::list_failed(prefix, e))?;
            if !entry.file_type().is_some_and(|ft| ft.is_file()) {
                continue;
            }
            let Some(key) = key_for(&bucket_dir, entry.path()) else {
                continue;
            };
            if !key.starts_with(prefix) {
                continue;
            }
            let size = entry
                .metadata()
                .map_err(|e| SearchError::list_failed(prefix, e))?
                .len();
            trace!("Listed {} ({} bytes)", key, size);
            objects.push(ObjectSummary { key, size });
        }
        objects.sort_by(|a, b| a.key.cmp(&b.key));

        let objects = Arc::new(objects);
        self.listings.insert(cache_key, Arc::clone(&objects));
        Ok(objects)
    }
}

/// Relative path of `path` under `base` joined with `/`, or `None` if not representable.
fn key_for(base: &Path, path: &Path) -> Option<String> {
    let relative = path.strip_prefix(base).ok()?;
    let parts: Option<Vec<&str>> = relative
        .components()
        .map(|c| match c {
            Component::Normal(part) => part.to_str(),
            _ => None,
        })
        .collect();
    Some(parts?.join("/"))
}

impl ObjectStore for LocalStore {
    fn list_page(
        &self,
        bucket: &str,
        prefix: &str,
        start_after: Option<&str>,
        max_keys: usize,
    ) -> SearchResult<ListPage> {
        let listing = self.listing(bucket, prefix)?;
        Ok(page_from_sorted(&listing, start_after, max_keys))
    }

    fn get_object(&self, bucket: &str, key: &str) -> SearchResult<Box<dyn Read + Send>> {
        if key.split('/').any(|part| part.is_empty() || part == "." || part == "..") {
            return Err(SearchError::fetch_failed(key, "invalid object key"));
        }
        let mut path = self.bucket_dir(bucket);
        path.extend(key.split('/'));
        let file = File::open(&path).map_err(|e| SearchError::fetch_failed(key, e))?;
        Ok(Box::new(file))
    }
}
