//! The remote-store capability consumed by the resolution engine.
//!
//! kDrive addresses everything by node id and offers no path lookup, so the
//! engine only ever needs the handful of calls below. [`KdriveClient`] is the
//! HTTP implementation; [`MemoryStore`] is an in-process one and
//! [`CachingStore`] decorates either with a listing cache.
//!
//! [`KdriveClient`]: crate::api::KdriveClient

use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;
use futures::stream::BoxStream;
use serde::Deserialize;
use serde_json::Value;

use crate::api::types::deserialize_id;
use crate::error::Result;

pub mod cache;
pub mod memory;

pub use cache::CachingStore;
pub use memory::{MemoryStore, StoreCall};

/// Streamed file content as returned by a download.
pub type ByteStream = BoxStream<'static, Result<Bytes>>;

/// One entry of a listing, in the shape the remote API reports it.
///
/// Fields are kept close to the wire: the type tag is a string, the size may
/// be a number or a numeric string and the timestamp is in seconds.
/// [`Node::from_entry`](crate::fs::Node::from_entry) turns it into a typed node.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct RemoteEntry {
    /// Node id, unique within the drive
    #[serde(deserialize_with = "deserialize_id")]
    pub id: String,
    /// Leaf name
    #[serde(default)]
    pub name: String,
    /// Type tag (`"dir"` or `"file"`)
    #[serde(rename = "type", default)]
    pub kind_tag: String,
    /// Raw size value, absent for directories
    #[serde(default)]
    pub size: Option<Value>,
    /// Last modification, seconds since the Unix epoch
    #[serde(default)]
    pub last_modified_at: Option<i64>,
}

/// A single page of children.
#[derive(Debug, Clone, Default)]
pub struct ListingPage {
    /// Entries in remote order
    pub entries: Vec<RemoteEntry>,
    /// Cursor to pass back for the next page
    pub cursor: Option<String>,
    /// Whether another page follows
    pub has_more: bool,
}

/// Node-addressed operations offered by the remote store.
///
/// Every call is one independent round trip; implementations own retries and
/// timeouts.
#[async_trait]
pub trait RemoteStore: Send + Sync {
    /// List one page of the children of `node_id`. `cursor` is `None` for the
    /// first page.
    async fn list_children_page(
        &self,
        drive_id: &str,
        node_id: &str,
        cursor: Option<&str>,
    ) -> Result<ListingPage>;

    /// Create a folder named `name` under `parent_id`.
    async fn create_folder(&self, drive_id: &str, parent_id: &str, name: &str)
    -> Result<RemoteEntry>;

    /// Upload `data` as file `name` under `parent_id`, replacing an existing
    /// file of the same name.
    async fn upload_content(
        &self,
        drive_id: &str,
        parent_id: &str,
        name: &str,
        data: Vec<u8>,
    ) -> Result<RemoteEntry>;

    /// Download the content of a file.
    async fn download_content(&self, drive_id: &str, node_id: &str) -> Result<ByteStream>;

    /// Change the leaf name of a node.
    async fn rename_node(&self, drive_id: &str, node_id: &str, new_name: &str) -> Result<()>;

    /// Re-parent a node, keeping its name.
    async fn move_node(&self, drive_id: &str, node_id: &str, new_parent_id: &str) -> Result<()>;

    /// Delete a node; directories go with their whole subtree.
    async fn delete_node(&self, drive_id: &str, node_id: &str) -> Result<()>;
}

#[async_trait]
impl<S: RemoteStore + ?Sized> RemoteStore for Arc<S> {
    async fn list_children_page(
        &self,
        drive_id: &str,
        node_id: &str,
        cursor: Option<&str>,
    ) -> Result<ListingPage> {
        (**self).list_children_page(drive_id, node_id, cursor).await
    }

    async fn create_folder(
        &self,
        drive_id: &str,
        parent_id: &str,
        name: &str,
    ) -> Result<RemoteEntry> {
        (**self).create_folder(drive_id, parent_id, name).await
    }

    async fn upload_content(
        &self,
        drive_id: &str,
        parent_id: &str,
        name: &str,
        data: Vec<u8>,
    ) -> Result<RemoteEntry> {
        (**self).upload_content(drive_id, parent_id, name, data).await
    }

    async fn download_content(&self, drive_id: &str, node_id: &str) -> Result<ByteStream> {
        (**self).download_content(drive_id, node_id).await
    }

    async fn rename_node(&self, drive_id: &str, node_id: &str, new_name: &str) -> Result<()> {
        (**self).rename_node(drive_id, node_id, new_name).await
    }

    async fn move_node(&self, drive_id: &str, node_id: &str, new_parent_id: &str) -> Result<()> {
        (**self).move_node(drive_id, node_id, new_parent_id).await
    }

    async fn delete_node(&self, drive_id: &str, node_id: &str) -> Result<()> {
        (**self).delete_node(drive_id, node_id).await
    }
}
