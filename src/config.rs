//! Mount configuration.
//!
//! A mount is a kDrive folder addressed by its web URL, e.g.
//! `https://ksuite.infomaniak.com/kdrive/app/drive/497955/files/5`, plus an
//! API token and an optional sub-path below that folder.

use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use url::Url;

use crate::api::KdriveClient;
use crate::api::client::{DEFAULT_API_BASE, DEFAULT_MAX_RETRIES, DEFAULT_PAGE_SIZE};
use crate::error::{KdriveError, Result};
use crate::fs::NormalizedPath;
use crate::http::HttpClient;
use crate::store::{CachingStore, RemoteStore};

/// A type-erased store handle, as built from configuration.
pub type DynStore = Arc<dyn RemoteStore>;

fn default_api_base() -> String {
    DEFAULT_API_BASE.to_string()
}

fn default_page_size() -> usize {
    DEFAULT_PAGE_SIZE
}

fn default_max_retries() -> u32 {
    DEFAULT_MAX_RETRIES
}

fn default_timeout_secs() -> u64 {
    30
}

/// Everything needed to mount a kDrive folder.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MountConfig {
    /// Web URL of the folder serving as mount root
    pub root_url: String,
    /// Infomaniak API token
    pub api_token: String,
    /// Path below the mount root that callers' paths are relative to
    #[serde(default)]
    pub root: String,
    #[serde(default = "default_api_base")]
    pub api_base: String,
    #[serde(default = "default_page_size")]
    pub page_size: usize,
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
    #[serde(default = "default_timeout_secs")]
    pub request_timeout_secs: u64,
    /// Keep listing pages for this long; no caching when unset
    #[serde(default)]
    pub listing_cache_ttl_secs: Option<u64>,
    /// HTTP(S) or SOCKS proxy URL
    #[serde(default)]
    pub proxy: Option<String>,
}

impl MountConfig {
    pub fn new(root_url: impl Into<String>, api_token: impl Into<String>) -> Self {
        Self {
            root_url: root_url.into(),
            api_token: api_token.into(),
            root: String::new(),
            api_base: default_api_base(),
            page_size: default_page_size(),
            max_retries: default_max_retries(),
            request_timeout_secs: default_timeout_secs(),
            listing_cache_ttl_secs: None,
            proxy: None,
        }
    }

    /// Read the host plugin settings:
    /// `{"root_url": "...", "api_token": {"api_token": "..."}}`.
    ///
    /// The other fields of [`MountConfig`] are picked up when present at the
    /// top level.
    pub fn from_plugin_config(config: &Value) -> Result<Self> {
        let root_url = config
            .get("root_url")
            .and_then(Value::as_str)
            .ok_or_else(|| KdriveError::InvalidConfig("missing root_url".to_string()))?;
        let api_token = config
            .get("api_token")
            .and_then(|auth| auth.get("api_token"))
            .and_then(Value::as_str)
            .ok_or_else(|| KdriveError::InvalidConfig("missing api_token.api_token".to_string()))?;

        let mut mount = Self::new(root_url, api_token);
        if let Some(root) = config.get("root").and_then(Value::as_str) {
            mount.root = root.to_string();
        }
        if let Some(api_base) = config.get("api_base").and_then(Value::as_str) {
            mount.api_base = api_base.to_string();
        }
        if let Some(page_size) = config.get("page_size").and_then(Value::as_u64) {
            mount.page_size = page_size as usize;
        }
        if let Some(max_retries) = config.get("max_retries").and_then(Value::as_u64) {
            mount.max_retries = max_retries as u32;
        }
        if let Some(secs) = config.get("request_timeout_secs").and_then(Value::as_u64) {
            mount.request_timeout_secs = secs;
        }
        mount.listing_cache_ttl_secs = config.get("listing_cache_ttl_secs").and_then(Value::as_u64);
        mount.proxy = config.get("proxy").and_then(Value::as_str).map(str::to_string);
        Ok(mount)
    }

    /// Set the provider root path.
    pub fn with_root(mut self, root: impl Into<String>) -> Self {
        self.root = root.into();
        self
    }

    /// Drive and node ids of the mount root.
    pub fn mount_root(&self) -> Result<MountRoot> {
        MountRoot::parse(&self.root_url)
    }

    /// The provider root path, prefixed to every caller path.
    pub fn root_path(&self) -> NormalizedPath {
        NormalizedPath::parse(&self.root)
    }

    /// The HTTP client described by this configuration.
    pub fn build_client(&self) -> Result<KdriveClient> {
        let http = match &self.proxy {
            Some(proxy) => HttpClient::with_proxy(&self.api_token, proxy)?,
            None => HttpClient::new(&self.api_token)?,
        };

        Ok(KdriveClient::with_http(http)?
            .with_api_base(&self.api_base)?
            .with_page_size(self.page_size)
            .with_max_retries(self.max_retries)
            .with_timeout(Duration::from_secs(self.request_timeout_secs)))
    }

    /// The HTTP client, wrapped in a listing cache when a TTL is configured.
    pub fn build_store(&self) -> Result<DynStore> {
        let client = self.build_client()?;
        Ok(match self.listing_cache_ttl_secs {
            Some(ttl) if ttl > 0 => Arc::new(CachingStore::new(client, Duration::from_secs(ttl))),
            _ => Arc::new(client),
        })
    }
}

/// Drive id and node id of the folder a mount is rooted at.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MountRoot {
    pub drive_id: String,
    pub root_id: String,
}

impl MountRoot {
    /// Extract the ids from a kDrive web URL.
    ///
    /// The drive id is the segment after `drive` and the root id the segment
    /// after the `files` that follows it.
    pub fn parse(root_url: &str) -> Result<Self> {
        let invalid = || KdriveError::InvalidRootUrl(root_url.to_string());

        let url = Url::parse(root_url.trim()).map_err(|_| invalid())?;
        let segments: Vec<&str> = url
            .path_segments()
            .ok_or_else(invalid)?
            .filter(|s| !s.is_empty())
            .collect();

        let window = segments
            .windows(4)
            .rev()
            .find(|w| w[0] == "drive" && w[2] == "files")
            .ok_or_else(invalid)?;

        Ok(Self {
            drive_id: window[1].to_string(),
            root_id: window[3].to_string(),
        })
    }
}
