//! Listing cache in front of any [`RemoteStore`].
//!
//! Resolution lists every ancestor of a path on each operation, so repeated
//! operations under the same directory hit the same pages over and over.
//! `CachingStore` keeps listing pages for a short TTL. Any mutation drops the
//! whole cache, both before it is sent and once it has completed: a move or
//! delete can change pages anywhere in the tree, and a listing running
//! alongside the mutation may have stored a page from before it.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;

use async_trait::async_trait;
use tokio::time::Instant;
use tracing::trace;

use crate::error::Result;
use crate::store::{ByteStream, ListingPage, RemoteEntry, RemoteStore};

type PageKey = (String, String, Option<String>);

struct CachedPage {
    page: ListingPage,
    stored_at: Instant,
}

/// Wraps a store and caches its listing pages.
pub struct CachingStore<S> {
    inner: S,
    ttl: Duration,
    pages: Mutex<HashMap<PageKey, CachedPage>>,
}

impl<S: RemoteStore> CachingStore<S> {
    pub fn new(inner: S, ttl: Duration) -> Self {
        Self {
            inner,
            ttl,
            pages: Mutex::new(HashMap::new()),
        }
    }

    /// The wrapped store.
    pub fn inner(&self) -> &S {
        &self.inner
    }

    /// Drop every cached page.
    pub fn invalidate(&self) {
        let mut pages = self.lock();
        if !pages.is_empty() {
            trace!(pages = pages.len(), "listing cache cleared");
            pages.clear();
        }
    }

    /// Number of pages currently held, expired ones included.
    pub fn cached_pages(&self) -> usize {
        self.lock().len()
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<PageKey, CachedPage>> {
        self.pages.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn lookup(&self, key: &PageKey) -> Option<ListingPage> {
        let mut pages = self.lock();
        let cached = pages.get(key)?;
        if cached.stored_at.elapsed() < self.ttl {
            return Some(cached.page.clone());
        }
        pages.remove(key);
        None
    }
}

#[async_trait]
impl<S: RemoteStore> RemoteStore for CachingStore<S> {
    async fn list_children_page(
        &self,
        drive_id: &str,
        node_id: &str,
        cursor: Option<&str>,
    ) -> Result<ListingPage> {
        let key = (
            drive_id.to_string(),
            node_id.to_string(),
            cursor.map(str::to_string),
        );
        if let Some(page) = self.lookup(&key) {
            trace!(drive = drive_id, node = node_id, "listing cache hit");
            return Ok(page);
        }

        let page = self.inner.list_children_page(drive_id, node_id, cursor).await?;
        self.lock().insert(
            key,
            CachedPage {
                page: page.clone(),
                stored_at: Instant::now(),
            },
        );
        Ok(page)
    }

    async fn create_folder(
        &self,
        drive_id: &str,
        parent_id: &str,
        name: &str,
    ) -> Result<RemoteEntry> {
        self.invalidate();
        let result = self.inner.create_folder(drive_id, parent_id, name).await;
        self.invalidate();
        result
    }

    async fn upload_content(
        &self,
        drive_id: &str,
        parent_id: &str,
        name: &str,
        data: Vec<u8>,
    ) -> Result<RemoteEntry> {
        self.invalidate();
        let result = self.inner.upload_content(drive_id, parent_id, name, data).await;
        self.invalidate();
        result
    }

    async fn download_content(&self, drive_id: &str, node_id: &str) -> Result<ByteStream> {
        self.inner.download_content(drive_id, node_id).await
    }

    async fn rename_node(&self, drive_id: &str, node_id: &str, new_name: &str) -> Result<()> {
        self.invalidate();
        let result = self.inner.rename_node(drive_id, node_id, new_name).await;
        self.invalidate();
        result
    }

    async fn move_node(&self, drive_id: &str, node_id: &str, new_parent_id: &str) -> Result<()> {
        self.invalidate();
        let result = self.inner.move_node(drive_id, node_id, new_parent_id).await;
        self.invalidate();
        result
    }

    async fn delete_node(&self, drive_id: &str, node_id: &str) -> Result<()> {
        self.invalidate();
        let result = self.inner.delete_node(drive_id, node_id).await;
        self.invalidate();
        result
    }
}
