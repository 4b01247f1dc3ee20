// Copyright 2025 Kirky.X
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use config::builder::DefaultState;
use config::{Config, ConfigBuilder, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::str::FromStr;
use validator::{Validate, ValidationError};

use crate::domain::models::entity::EntityType;
use crate::domain::repositories::persistence_adapter::AdapterKind;

/// 数据层配置
///
/// 包含持久化后端选择、远程服务凭据与缓存配置
#[derive(Debug, Clone, Deserialize, Validate)]
#[validate(schema(function = "validate_backends"))]
pub struct Settings {
    /// 数据库配置
    #[validate(nested)]
    pub database: DatabaseSettings,
    /// 远程服务（BaaS）配置
    #[serde(default)]
    #[validate(nested)]
    pub remote: RemoteSettings,
    /// 缓存配置
    #[validate(nested)]
    pub cache: CacheSettings,
}

/// 数据库配置设置
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct DatabaseSettings {
    /// 启用的持久化后端
    #[serde(default)]
    pub adapter: AdapterKind,
    /// 数据库连接URL
    #[serde(default)]
    pub url: String,
    /// 最大连接数
    #[validate(range(min = 1))]
    pub max_connections: Option<u32>,
    /// 最小连接数
    pub min_connections: Option<u32>,
    /// 连接超时时间（秒）
    pub connect_timeout: Option<u64>,
    /// 空闲连接超时时间（秒）
    pub idle_timeout: Option<u64>,
    /// 启动时执行迁移
    #[serde(default)]
    pub run_migrations: bool,
}

/// 远程服务配置设置
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct RemoteSettings {
    /// 项目URL
    #[validate(url)]
    pub url: Option<String>,
    /// API 密钥
    pub api_key: Option<String>,
    /// 数据库 schema
    #[serde(default = "default_remote_schema")]
    pub schema: String,
    /// 请求超时时间（秒）
    #[serde(default = "default_remote_timeout")]
    #[validate(range(min = 1))]
    pub timeout_seconds: u64,
}

impl Default for RemoteSettings {
    fn default() -> Self {
        Self {
            url: None,
            api_key: None,
            schema: default_remote_schema(),
            timeout_seconds: default_remote_timeout(),
        }
    }
}

fn default_remote_schema() -> String {
    "public".to_string()
}

fn default_remote_timeout() -> u64 {
    30
}

/// 缓存后端类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CacheBackend {
    /// Redis（RESP 协议）
    #[default]
    Redis,
    /// Upstash 风格的 REST 缓存服务
    Rest,
    /// 进程内缓存
    Memory,
    /// 禁用缓存
    None,
}

/// 缓存配置设置
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CacheSettings {
    /// 缓存后端
    #[serde(default)]
    pub backend: CacheBackend,
    /// 缓存服务URL
    pub url: Option<String>,
    /// 缓存服务凭据（Bearer token 或 Redis 密码）
    pub token: Option<String>,
    /// 单次缓存调用超时（毫秒）
    #[validate(range(min = 1))]
    pub timeout_ms: u64,
    /// 进程内缓存的最大条目数
    #[serde(default = "default_max_entries")]
    #[validate(range(min = 1))]
    pub max_entries: usize,
    /// 过期时间配置
    #[validate(nested)]
    pub ttl: TtlSettings,
}

fn default_max_entries() -> usize {
    10_000
}

/// 缓存过期时间配置
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct TtlSettings {
    /// 单条记录过期时间（秒）
    #[validate(range(min = 1))]
    pub entity_seconds: u64,
    /// 列表过期时间（秒）
    #[validate(range(min = 1))]
    pub list_seconds: u64,
    /// 聚合视图过期时间（秒）
    #[validate(range(min = 1))]
    pub aggregate_seconds: u64,
    /// 按实体类型覆盖
    #[serde(default)]
    #[validate(custom(function = "validate_overrides"))]
    pub overrides: HashMap<String, TtlOverride>,
}

/// 单个实体类型的过期时间覆盖
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct TtlOverride {
    pub entity: Option<u64>,
    pub list: Option<u64>,
    pub aggregate: Option<u64>,
}

fn validate_overrides(overrides: &HashMap<String, TtlOverride>) -> Result<(), ValidationError> {
    for (name, ttl) in overrides {
        if EntityType::from_str(name).is_err() {
            return Err(ValidationError::new("unknown_entity_type"));
        }
        if [ttl.entity, ttl.list, ttl.aggregate].contains(&Some(0)) {
            return Err(ValidationError::new("zero_ttl"));
        }
    }
    Ok(())
}

fn validate_backends(settings: &Settings) -> Result<(), ValidationError> {
    match settings.database.adapter {
        AdapterKind::Relational if settings.database.url.is_empty() => {
            return Err(ValidationError::new("missing_database_url"));
        }
        AdapterKind::RemoteService
            if settings.remote.url.is_none() || settings.remote.api_key.is_none() =>
        {
            return Err(ValidationError::new("missing_remote_credentials"));
        }
        _ => {}
    }

    let needs_url = matches!(settings.cache.backend, CacheBackend::Redis | CacheBackend::Rest);
    if needs_url && settings.cache.url.is_none() {
        return Err(ValidationError::new("missing_cache_url"));
    }
    if settings.cache.backend == CacheBackend::Rest && settings.cache.token.is_none() {
        return Err(ValidationError::new("missing_cache_token"));
    }
    Ok(())
}

impl Settings {
    /// 创建新的配置实例
    ///
    /// 依次叠加默认值、`config/default`、`config/{APP_ENVIRONMENT}` 与
    /// `GSCMS__` 前缀的环境变量
    ///
    /// # Returns
    ///
    /// * `Ok(Settings)` - 成功加载的配置
    /// * `Err(ConfigError)` - 配置加载失败
    pub fn new() -> Result<Self, ConfigError> {
        let env = std::env::var("APP_ENVIRONMENT").unwrap_or_else(|_| "default".to_string());
        let builder = Self::builder()?
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name(&format!("config/{}", env)).required(false))
            .add_source(Environment::with_prefix("GSCMS").separator("__"));

        builder.build()?.try_deserialize()
    }

    /// 仅包含默认值的配置构建器
    pub fn builder() -> Result<ConfigBuilder<DefaultState>, ConfigError> {
        Config::builder()
            // Default DB settings
            .set_default("database.adapter", "relational")?
            .set_default("database.max_connections", 20)?
            .set_default("database.min_connections", 1)?
            .set_default("database.connect_timeout", 10)?
            .set_default("database.idle_timeout", 300)?
            .set_default("database.run_migrations", false)?
            // Default cache settings
            .set_default("cache.backend", "redis")?
            .set_default("cache.url", "redis://127.0.0.1:6379")?
            .set_default("cache.timeout_ms", 500)?
            .set_default("cache.max_entries", 10_000)?
            .set_default("cache.ttl.entity_seconds", 300)?
            .set_default("cache.ttl.list_seconds", 60)?
            .set_default("cache.ttl.aggregate_seconds", 120)
    }
}
