// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use anyhow::{anyhow, Result};
use std::sync::Arc;
use tracing::info;
use validator::Validate;

use super::cached_query::CachedQueryService;
use super::ttl_policy::TtlPolicy;
use crate::config::settings::Settings;
use crate::domain::repositories::cache_store::CacheStore;
use crate::domain::repositories::persistence_adapter::PersistenceAdapter;
use crate::infrastructure::cache::create_cache_store;
use crate::infrastructure::metrics;
use crate::infrastructure::repositories::create_adapter;

/// 数据层
///
/// 进程启动时构造一次并注入给请求处理方。持有唯一的持久化适配器、
/// 共享的缓存存储和在两者之上的查询服务。
#[derive(Clone)]
pub struct DataLayer {
    pub adapter: Arc<dyn PersistenceAdapter>,
    pub cache: Arc<dyn CacheStore>,
    pub queries: Arc<CachedQueryService>,
}

impl DataLayer {
    /// 从环境加载配置并构造数据层
    pub fn init() -> Result<Self> {
        let settings = Settings::new()?;
        info!("Configuration loaded");
        Self::from_settings(&settings)
    }

    /// 按配置构造数据层
    ///
    /// 只校验配置并创建客户端，数据库与缓存连接在首次使用时才建立。
    pub fn from_settings(settings: &Settings) -> Result<Self> {
        settings
            .validate()
            .map_err(|e| anyhow!("Invalid data layer configuration: {}", e))?;

        metrics::describe_metrics();

        let adapter = create_adapter(settings)?;
        let cache = create_cache_store(&settings.cache);
        let ttl = TtlPolicy::from(&settings.cache.ttl);

        info!(
            "Data layer ready: {} adapter, {} cache",
            adapter.kind(),
            cache.name()
        );
        Ok(Self::new(adapter, cache, ttl))
    }

    /// 用已构造的组件组装数据层
    pub fn new(
        adapter: Arc<dyn PersistenceAdapter>,
        cache: Arc<dyn CacheStore>,
        ttl: TtlPolicy,
    ) -> Self {
        let queries = Arc::new(CachedQueryService::new(
            adapter.clone(),
            cache.clone(),
            ttl,
        ));
        Self {
            adapter,
            cache,
            queries,
        }
    }
}
