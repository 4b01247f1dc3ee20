// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Serialize;
use thiserror::Error;
use tracing::{debug, warn};

use crate::infrastructure::metrics;

/// 缓存错误类型
///
/// 缓存层错误一律被降级为未命中，不会传播给业务调用方。
#[derive(Error, Debug)]
pub enum CacheError {
    /// Redis 错误
    #[error("Redis error: {0}")]
    Redis(#[from] redis::RedisError),
    /// HTTP 错误
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
    /// 协议错误（响应格式不符合预期或服务端返回 error）
    #[error("Protocol error: {0}")]
    Protocol(String),
    /// 调用超时
    #[error("Cache call timed out after {0} ms")]
    Timeout(u64),
    /// 序列化错误
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
    /// 通配符模式不合法
    #[error("Invalid key pattern: {0}")]
    InvalidPattern(String),
}

/// 缓存存储特质
///
/// 旁路缓存，永远不是数据的权威来源。
/// 实现只需处理原始字符串负载，类型化读写由 [`CacheStoreExt`] 提供。
#[async_trait]
pub trait CacheStore: Send + Sync {
    /// 后端名称，用于日志与指标
    fn name(&self) -> &'static str;

    /// 读取原始负载
    async fn get_raw(&self, key: &str) -> Result<Option<String>, CacheError>;

    /// 写入原始负载并设置过期时间（秒），已存在的键被静默覆盖
    async fn set_raw(&self, key: &str, value: &str, ttl_seconds: u64) -> Result<(), CacheError>;

    /// 删除一个或多个键，返回实际删除数量；删除不存在的键不是错误
    async fn del(&self, keys: &[String]) -> Result<u64, CacheError>;

    /// 删除所有匹配通配符模式（`*`、`?`）的键，无匹配时返回 0
    async fn clear_pattern(&self, pattern: &str) -> Result<u64, CacheError>;

    /// 键是否存在
    async fn exists(&self, key: &str) -> Result<bool, CacheError>;

    /// 剩余存活时间（秒），键不存在或没有过期时间时返回 None
    async fn ttl(&self, key: &str) -> Result<Option<u64>, CacheError>;

    /// 自增计数器
    async fn incr(&self, key: &str) -> Result<i64, CacheError>;
}

/// 类型化缓存读写
///
/// 所有失败（连接、超时、反序列化）都记录日志并视为未命中。
#[async_trait]
pub trait CacheStoreExt: CacheStore {
    /// 读取并反序列化，失败时返回 None
    async fn get<T>(&self, key: &str) -> Option<T>
    where
        T: DeserializeOwned + Send,
    {
        let raw = match self.get_raw(key).await {
            Ok(Some(raw)) => raw,
            Ok(None) => return None,
            Err(e) => {
                warn!("Cache get failed for key {} on {}: {}", key, self.name(), e);
                metrics::record_cache_error(self.name(), "get");
                return None;
            }
        };

        match serde_json::from_str(&raw) {
            Ok(value) => Some(value),
            Err(e) => {
                warn!("Discarding undecodable cache entry {}: {}", key, e);
                metrics::record_cache_error(self.name(), "decode");
                None
            }
        }
    }

    /// 序列化并写入，失败只记录日志
    async fn set<T>(&self, key: &str, value: &T, ttl_seconds: u64)
    where
        T: Serialize + Sync + ?Sized,
    {
        let payload = match serde_json::to_string(value) {
            Ok(payload) => payload,
            Err(e) => {
                warn!("Skipping cache set for key {}: {}", key, e);
                return;
            }
        };

        match self.set_raw(key, &payload, ttl_seconds).await {
            Ok(()) => debug!("Cached key {} for {}s", key, ttl_seconds),
            Err(e) => {
                warn!("Cache set failed for key {} on {}: {}", key, self.name(), e);
                metrics::record_cache_error(self.name(), "set");
            }
        }
    }
}

impl<S: CacheStore + ?Sized> CacheStoreExt for S {}
