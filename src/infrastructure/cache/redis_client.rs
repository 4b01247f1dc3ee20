// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use async_trait::async_trait;
use redis::aio::MultiplexedConnection;
use redis::AsyncCommands;
use std::future::Future;
use std::time::Duration;
use tracing::debug;

use crate::domain::repositories::cache_store::{CacheError, CacheStore};
use crate::infrastructure::lazy::LazyClient;

/// 每轮 SCAN 建议返回的键数量
const SCAN_BATCH: usize = 500;

/// Redis缓存
///
/// 基于 RESP 协议的共享缓存。多路复用连接在首次使用时建立，
/// 每次调用都受 `timeout` 约束，超时按缓存错误处理。
pub struct RedisCacheStore {
    /// Redis客户端
    client: redis::Client,
    /// 延迟建立的多路复用连接
    connection: LazyClient<MultiplexedConnection>,
    /// 单次调用超时
    timeout: Duration,
}

impl RedisCacheStore {
    /// 创建新的Redis缓存实例
    ///
    /// # 参数
    ///
    /// * `redis_url` - Redis连接URL
    /// * `password` - 可选的访问凭据，覆盖 URL 中的密码
    /// * `timeout` - 单次调用超时
    ///
    /// # 返回值
    ///
    /// * `Ok(RedisCacheStore)` - 缓存实例，此时尚未建立连接
    /// * `Err(CacheError)` - URL 不合法
    pub fn new(
        redis_url: &str,
        password: Option<&str>,
        timeout: Duration,
    ) -> Result<Self, CacheError> {
        let url = match password {
            Some(password) => with_password(redis_url, password)?,
            None => redis_url.to_string(),
        };
        let client = redis::Client::open(url.as_str())?;

        Ok(Self {
            client,
            connection: LazyClient::new("redis"),
            timeout,
        })
    }

    async fn connection(&self) -> Result<MultiplexedConnection, CacheError> {
        let connection = self
            .connection
            .get_or_try_init(|| self.client.get_multiplexed_async_connection())
            .await?;
        Ok(connection.clone())
    }

    async fn bounded<T, F>(&self, call: F) -> Result<T, CacheError>
    where
        F: Future<Output = Result<T, CacheError>>,
    {
        tokio::time::timeout(self.timeout, call)
            .await
            .map_err(|_| CacheError::Timeout(self.timeout.as_millis() as u64))?
    }

    /// 执行一轮 SCAN，返回下一个游标与本轮的键
    async fn scan_round(&self, cursor: u64, pattern: &str) -> Result<(u64, Vec<String>), CacheError> {
        self.bounded(async {
            let mut con = self.connection().await?;
            let round: (u64, Vec<String>) = redis::cmd("SCAN")
                .arg(cursor)
                .arg("MATCH")
                .arg(pattern)
                .arg("COUNT")
                .arg(SCAN_BATCH)
                .query_async(&mut con)
                .await?;
            Ok(round)
        })
        .await
    }
}

fn with_password(redis_url: &str, password: &str) -> Result<String, CacheError> {
    let mut url = url::Url::parse(redis_url)
        .map_err(|e| CacheError::Protocol(format!("invalid redis url: {}", e)))?;
    url.set_password(Some(password))
        .map_err(|_| CacheError::Protocol("redis url cannot carry a password".to_string()))?;
    Ok(url.to_string())
}

#[async_trait]
impl CacheStore for RedisCacheStore {
    fn name(&self) -> &'static str {
        "redis"
    }

    async fn get_raw(&self, key: &str) -> Result<Option<String>, CacheError> {
        self.bounded(async {
            let mut con = self.connection().await?;
            let value: Option<String> = con.get(key).await?;
            Ok(value)
        })
        .await
    }

    async fn set_raw(&self, key: &str, value: &str, ttl_seconds: u64) -> Result<(), CacheError> {
        self.bounded(async {
            let mut con = self.connection().await?;
            if ttl_seconds > 0 {
                con.set_ex::<_, _, ()>(key, value, ttl_seconds).await?;
            } else {
                con.set::<_, _, ()>(key, value).await?;
            }
            Ok(())
        })
        .await
    }

    async fn del(&self, keys: &[String]) -> Result<u64, CacheError> {
        if keys.is_empty() {
            return Ok(0);
        }
        self.bounded(async {
            let mut con = self.connection().await?;
            let removed: u64 = con.del(keys).await?;
            Ok(removed)
        })
        .await
    }

    /// 逐轮 SCAN 并删除本轮匹配的键
    ///
    /// 超时只作用于单轮 SCAN 或 DEL，键空间再大也不会整体超时。
    async fn clear_pattern(&self, pattern: &str) -> Result<u64, CacheError> {
        let mut cursor: u64 = 0;
        let mut removed = 0;

        loop {
            let (next, keys) = self.scan_round(cursor, pattern).await?;
            removed += self.del(&keys).await?;
            if next == 0 {
                break;
            }
            cursor = next;
        }

        debug!("Cleared {} redis keys matching {}", removed, pattern);
        Ok(removed)
    }

    async fn exists(&self, key: &str) -> Result<bool, CacheError> {
        self.bounded(async {
            let mut con = self.connection().await?;
            let exists: bool = con.exists(key).await?;
            Ok(exists)
        })
        .await
    }

    async fn ttl(&self, key: &str) -> Result<Option<u64>, CacheError> {
        self.bounded(async {
            let mut con = self.connection().await?;
            let ttl: i64 = con.ttl(key).await?;
            Ok(u64::try_from(ttl).ok())
        })
        .await
    }

    async fn incr(&self, key: &str) -> Result<i64, CacheError> {
        self.bounded(async {
            let mut con = self.connection().await?;
            let value: i64 = con.incr(key, 1).await?;
            Ok(value)
        })
        .await
    }
}
