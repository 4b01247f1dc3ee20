// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use async_trait::async_trait;
use dashmap::DashMap;
use std::time::{Duration, Instant};
use tracing::debug;

use crate::domain::repositories::cache_store::{CacheError, CacheStore};
use crate::utils::glob::GlobPattern;

/// 缓存条目
#[derive(Clone)]
struct CacheEntry {
    payload: String,
    expires_at: Option<Instant>,
}

impl CacheEntry {
    fn new(payload: String, ttl: Option<Duration>) -> Self {
        Self {
            payload,
            expires_at: ttl.map(|ttl| Instant::now() + ttl),
        }
    }

    fn is_expired(&self) -> bool {
        self.expires_at
            .map(|deadline| Instant::now() >= deadline)
            .unwrap_or(false)
    }
}

/// 默认最大条目数
pub const DEFAULT_MAX_ENTRIES: usize = 10_000;

/// 进程内缓存
///
/// 基于 DashMap 的单进程缓存，过期条目在访问时惰性清除。
/// 条目数超过 `max_entries` 时先清理全部过期条目，仍超限则按过期时间
/// 从早到晚淘汰，额外多淘汰 10%。适用于测试与单实例部署。
pub struct MemoryCacheStore {
    entries: DashMap<String, CacheEntry>,
    max_entries: usize,
}

impl Default for MemoryCacheStore {
    fn default() -> Self {
        Self::with_max_entries(DEFAULT_MAX_ENTRIES)
    }
}

impl MemoryCacheStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_max_entries(max_entries: usize) -> Self {
        Self {
            entries: DashMap::new(),
            max_entries: max_entries.max(1),
        }
    }

    /// 底层存储的条目数，包含尚未清除的过期条目
    pub fn stored(&self) -> usize {
        self.entries.len()
    }

    /// 当前未过期条目数
    pub fn len(&self) -> usize {
        self.entries.iter().filter(|e| !e.value().is_expired()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// 未过期的全部键，按字典序排列
    pub fn keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = self
            .entries
            .iter()
            .filter(|e| !e.value().is_expired())
            .map(|e| e.key().clone())
            .collect();
        keys.sort();
        keys
    }

    fn evict_if_needed(&self) {
        if self.entries.len() <= self.max_entries {
            return;
        }

        self.entries.retain(|_, entry| !entry.is_expired());
        let current_size = self.entries.len();
        if current_size <= self.max_entries {
            debug!("Purged expired memory cache entries, {} left", current_size);
            return;
        }

        let to_evict = current_size - self.max_entries + self.max_entries / 10;

        // 没有过期时间的条目最后淘汰
        let mut candidates: Vec<(String, Option<Instant>)> = self
            .entries
            .iter()
            .map(|e| (e.key().clone(), e.value().expires_at))
            .collect();
        candidates.sort_by(|a, b| match (a.1, b.1) {
            (Some(x), Some(y)) => x.cmp(&y),
            (Some(_), None) => std::cmp::Ordering::Less,
            (None, Some(_)) => std::cmp::Ordering::Greater,
            (None, None) => std::cmp::Ordering::Equal,
        });

        for (key, _) in candidates.iter().take(to_evict) {
            self.entries.remove(key);
        }
        debug!("Evicted {} entries from memory cache", to_evict);
    }

    fn live_entry(&self, key: &str) -> Option<CacheEntry> {
        let entry = self.entries.get(key)?.value().clone();
        if entry.is_expired() {
            self.entries.remove(key);
            return None;
        }
        Some(entry)
    }
}

#[async_trait]
impl CacheStore for MemoryCacheStore {
    fn name(&self) -> &'static str {
        "memory"
    }

    async fn get_raw(&self, key: &str) -> Result<Option<String>, CacheError> {
        Ok(self.live_entry(key).map(|entry| entry.payload))
    }

    async fn set_raw(&self, key: &str, value: &str, ttl_seconds: u64) -> Result<(), CacheError> {
        let ttl = (ttl_seconds > 0).then(|| Duration::from_secs(ttl_seconds));
        self.entries
            .insert(key.to_string(), CacheEntry::new(value.to_string(), ttl));
        self.evict_if_needed();
        Ok(())
    }

    async fn del(&self, keys: &[String]) -> Result<u64, CacheError> {
        let removed = keys
            .iter()
            .filter_map(|key| self.entries.remove(key))
            .filter(|(_, entry)| !entry.is_expired())
            .count();
        Ok(removed as u64)
    }

    async fn clear_pattern(&self, pattern: &str) -> Result<u64, CacheError> {
        let glob =
            GlobPattern::new(pattern).map_err(|e| CacheError::InvalidPattern(e.to_string()))?;

        let matched: Vec<String> = self
            .entries
            .iter()
            .filter(|e| glob.is_match(e.key()))
            .map(|e| e.key().clone())
            .collect();

        let removed = self.del(&matched).await?;
        debug!("Cleared {} memory cache entries matching {}", removed, pattern);
        Ok(removed)
    }

    async fn exists(&self, key: &str) -> Result<bool, CacheError> {
        Ok(self.live_entry(key).is_some())
    }

    async fn ttl(&self, key: &str) -> Result<Option<u64>, CacheError> {
        Ok(self.live_entry(key).and_then(|entry| {
            entry
                .expires_at
                .map(|deadline| deadline.saturating_duration_since(Instant::now()).as_secs())
        }))
    }

    async fn incr(&self, key: &str) -> Result<i64, CacheError> {
        let mut slot = self
            .entries
            .entry(key.to_string())
            .or_insert_with(|| CacheEntry::new("0".to_string(), None));

        if slot.is_expired() {
            *slot = CacheEntry::new("0".to_string(), None);
        }

        let current: i64 = slot.payload.parse().map_err(|_| {
            CacheError::Protocol(format!("value at {} is not an integer", key))
        })?;
        let next = current + 1;
        slot.payload = next.to_string();
        Ok(next)
    }
}

/// 空缓存
///
/// 永远未命中、永远写入成功。在缓存被禁用或缓存后端无法构造时使用，
/// 系统在没有缓存的情况下仍保持正确。
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopCacheStore;

#[async_trait]
impl CacheStore for NoopCacheStore {
    fn name(&self) -> &'static str {
        "noop"
    }

    async fn get_raw(&self, _key: &str) -> Result<Option<String>, CacheError> {
        Ok(None)
    }

    async fn set_raw(&self, _key: &str, _value: &str, _ttl_seconds: u64) -> Result<(), CacheError> {
        Ok(())
    }

    async fn del(&self, _keys: &[String]) -> Result<u64, CacheError> {
        Ok(0)
    }

    async fn clear_pattern(&self, _pattern: &str) -> Result<u64, CacheError> {
        Ok(0)
    }

    async fn exists(&self, _key: &str) -> Result<bool, CacheError> {
        Ok(false)
    }

    async fn ttl(&self, _key: &str) -> Result<Option<u64>, CacheError> {
        Ok(None)
    }

    async fn incr(&self, _key: &str) -> Result<i64, CacheError> {
        Ok(0)
    }
}
