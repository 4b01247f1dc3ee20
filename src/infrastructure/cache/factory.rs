// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

use super::memory_store::{MemoryCacheStore, NoopCacheStore};
use super::redis_client::RedisCacheStore;
use super::rest_client::RestCacheStore;
use crate::config::settings::{CacheBackend, CacheSettings};
use crate::domain::repositories::cache_store::{CacheError, CacheStore};

/// 按配置创建缓存存储
///
/// 缓存只是优化手段：后端无法构造时记录警告并退化为 [`NoopCacheStore`]，
/// 数据层在无缓存的情况下继续工作。
pub fn create_cache_store(settings: &CacheSettings) -> Arc<dyn CacheStore> {
    match build(settings) {
        Ok(store) => {
            info!("Using {} cache store", store.name());
            store
        }
        Err(e) => {
            warn!(
                "Failed to construct {:?} cache store, caching disabled: {}",
                settings.backend, e
            );
            Arc::new(NoopCacheStore)
        }
    }
}

fn build(settings: &CacheSettings) -> Result<Arc<dyn CacheStore>, CacheError> {
    let timeout = Duration::from_millis(settings.timeout_ms);

    let store: Arc<dyn CacheStore> = match settings.backend {
        CacheBackend::Redis => {
            let url = required(settings.url.as_deref(), "cache.url")?;
            Arc::new(RedisCacheStore::new(
                url,
                settings.token.as_deref(),
                timeout,
            )?)
        }
        CacheBackend::Rest => {
            let url = required(settings.url.as_deref(), "cache.url")?;
            let token = required(settings.token.as_deref(), "cache.token")?;
            Arc::new(RestCacheStore::new(url, token, timeout)?)
        }
        CacheBackend::Memory => Arc::new(MemoryCacheStore::with_max_entries(settings.max_entries)),
        CacheBackend::None => Arc::new(NoopCacheStore),
    };
    Ok(store)
}

fn required<'a>(value: Option<&'a str>, name: &str) -> Result<&'a str, CacheError> {
    value.ok_or_else(|| CacheError::Protocol(format!("{} is not configured", name)))
}
