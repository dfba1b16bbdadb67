//! Offline application shell cache
//!
//! The cache is versioned by name. Installing fills the current version,
//! activating drops every other version, and fetches are served cache-first.
//! Nothing here is allowed to block notification delivery, so failures are
//! logged and skipped.

use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};

use async_trait::async_trait;
use reqwest::header::CONTENT_TYPE;
use tracing::{debug, info, warn};
use url::Url;

use crate::config::ShellCacheConfig;
use crate::error::PlatformError;

/// A stored response
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CachedResponse {
    pub status: u16,
    pub content_type: Option<String>,
    pub body: Vec<u8>,
}

impl CachedResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Named response caches
#[async_trait]
pub trait CacheStorage: Send + Sync {
    async fn cache_names(&self) -> Vec<String>;

    async fn put(&self, cache: &str, url: &Url, response: CachedResponse);

    async fn lookup(&self, cache: &str, url: &Url) -> Option<CachedResponse>;

    /// Drop a whole cache; `false` if it did not exist
    async fn delete(&self, cache: &str) -> bool;
}

/// Network access for cache misses
#[async_trait]
pub trait Network: Send + Sync {
    async fn fetch(&self, url: &Url) -> Result<CachedResponse, PlatformError>;
}

/// Process-local [`CacheStorage`]
#[derive(Debug, Default)]
pub struct MemoryCache {
    caches: RwLock<HashMap<String, HashMap<String, CachedResponse>>>,
}

impl MemoryCache {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl CacheStorage for MemoryCache {
    async fn cache_names(&self) -> Vec<String> {
        let caches = self.caches.read().unwrap_or_else(PoisonError::into_inner);
        let mut names: Vec<String> = caches.keys().cloned().collect();
        names.sort();
        names
    }

    async fn put(&self, cache: &str, url: &Url, response: CachedResponse) {
        let mut caches = self.caches.write().unwrap_or_else(PoisonError::into_inner);
        caches
            .entry(cache.to_string())
            .or_default()
            .insert(url.to_string(), response);
    }

    async fn lookup(&self, cache: &str, url: &Url) -> Option<CachedResponse> {
        let caches = self.caches.read().unwrap_or_else(PoisonError::into_inner);
        caches.get(cache)?.get(url.as_str()).cloned()
    }

    async fn delete(&self, cache: &str) -> bool {
        let mut caches = self.caches.write().unwrap_or_else(PoisonError::into_inner);
        caches.remove(cache).is_some()
    }
}

/// [`Network`] backed by reqwest
#[derive(Debug, Clone, Default)]
pub struct HttpNetwork {
    http_client: reqwest::Client,
}

impl HttpNetwork {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_client(http_client: reqwest::Client) -> Self {
        Self { http_client }
    }
}

#[async_trait]
impl Network for HttpNetwork {
    async fn fetch(&self, url: &Url) -> Result<CachedResponse, PlatformError> {
        let response = self
            .http_client
            .get(url.clone())
            .send()
            .await
            .map_err(|e| PlatformError::Failed(e.to_string()))?;

        let status = response.status().as_u16();
        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .map(String::from);
        let body = response
            .bytes()
            .await
            .map_err(|e| PlatformError::Failed(e.to_string()))?
            .to_vec();

        Ok(CachedResponse {
            status,
            content_type,
            body,
        })
    }
}

/// The versioned application shell cache
pub struct ShellCache {
    config: ShellCacheConfig,
    origin: Url,
    storage: Arc<dyn CacheStorage>,
    network: Arc<dyn Network>,
}

impl ShellCache {
    pub fn new(
        config: ShellCacheConfig,
        origin: Url,
        storage: Arc<dyn CacheStorage>,
        network: Arc<dyn Network>,
    ) -> Self {
        Self {
            config,
            origin,
            storage,
            network,
        }
    }

    /// Name of the current cache version
    pub fn name(&self) -> &str {
        &self.config.name
    }

    /// Store every shell asset in the current version
    ///
    /// Returns how many assets were cached.
    pub async fn install(&self) -> usize {
        let mut cached = 0;
        for asset in &self.config.assets {
            let url = match self.origin.join(asset) {
                Ok(url) => url,
                Err(e) => {
                    warn!("Skipping shell asset {}: {}", asset, e);
                    continue;
                }
            };

            match self.network.fetch(&url).await {
                Ok(response) if response.is_success() => {
                    self.storage.put(&self.config.name, &url, response).await;
                    cached += 1;
                }
                Ok(response) => {
                    warn!("Shell asset {} returned status {}", url, response.status);
                }
                Err(e) => warn!("Failed to fetch shell asset {}: {}", url, e),
            }
        }

        info!(
            "Cached {}/{} shell assets in {}",
            cached,
            self.config.assets.len(),
            self.config.name
        );
        cached
    }

    /// Drop every cache other than the current version
    ///
    /// Returns the purged cache names.
    pub async fn activate(&self) -> Vec<String> {
        let mut purged = Vec::new();
        for name in self.storage.cache_names().await {
            if name != self.config.name && self.storage.delete(&name).await {
                debug!("Purged stale cache {}", name);
                purged.push(name);
            }
        }
        purged
    }

    /// Serve from cache, otherwise forward to the network
    pub async fn fetch(&self, url: &Url) -> Result<CachedResponse, PlatformError> {
        if let Some(response) = self.storage.lookup(&self.config.name, url).await {
            debug!("Cache hit for {}", url);
            return Ok(response);
        }
        self.network.fetch(url).await
    }
}
