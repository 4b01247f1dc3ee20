// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use std::collections::HashMap;
use std::str::FromStr;
use tracing::warn;

use crate::config::settings::{TtlOverride, TtlSettings};
use crate::domain::models::entity::EntityType;

/// 最短过期时间（秒）
const MIN_TTL_SECONDS: u64 = 1;

/// 缓存过期策略
///
/// 单条记录使用中等时长；列表过期更快，且永远不超过同类型单条记录的时长；
/// 聚合视图单独配置。可以按实体类型覆盖。
///
/// 所有时长至少为 1 秒：缓存后端把 0 视为永不过期。
#[derive(Debug, Clone)]
pub struct TtlPolicy {
    entity_seconds: u64,
    list_seconds: u64,
    aggregate_seconds: u64,
    overrides: HashMap<EntityType, TtlOverride>,
}

impl Default for TtlPolicy {
    fn default() -> Self {
        Self::new(300, 60, 120)
    }
}

impl TtlPolicy {
    pub fn new(entity_seconds: u64, list_seconds: u64, aggregate_seconds: u64) -> Self {
        Self {
            entity_seconds: entity_seconds.max(MIN_TTL_SECONDS),
            list_seconds: list_seconds.max(MIN_TTL_SECONDS),
            aggregate_seconds: aggregate_seconds.max(MIN_TTL_SECONDS),
            overrides: HashMap::new(),
        }
    }

    /// 设置某实体类型的覆盖值
    pub fn with_override(mut self, entity: EntityType, ttl: TtlOverride) -> Self {
        self.overrides.insert(entity, ttl);
        self
    }

    fn override_for(&self, entity: EntityType) -> TtlOverride {
        self.overrides.get(&entity).copied().unwrap_or_default()
    }

    /// 单条记录过期时间（秒）
    pub fn entity_ttl(&self, entity: EntityType) -> u64 {
        self.override_for(entity)
            .entity
            .unwrap_or(self.entity_seconds)
            .max(MIN_TTL_SECONDS)
    }

    /// 列表过期时间（秒），不超过单条记录过期时间
    pub fn list_ttl(&self, entity: EntityType) -> u64 {
        let list = self.override_for(entity).list.unwrap_or(self.list_seconds);
        list.clamp(MIN_TTL_SECONDS, self.entity_ttl(entity))
    }

    /// 聚合视图过期时间（秒）
    pub fn aggregate_ttl(&self, entity: EntityType) -> u64 {
        self.override_for(entity)
            .aggregate
            .unwrap_or(self.aggregate_seconds)
            .max(MIN_TTL_SECONDS)
    }
}

impl From<&TtlSettings> for TtlPolicy {
    fn from(settings: &TtlSettings) -> Self {
        let mut policy = TtlPolicy::new(
            settings.entity_seconds,
            settings.list_seconds,
            settings.aggregate_seconds,
        );

        for (name, ttl) in &settings.overrides {
            match EntityType::from_str(name) {
                Ok(entity) => policy = policy.with_override(entity, *ttl),
                Err(e) => warn!("Ignoring TTL override: {}", e),
            }
        }
        policy
    }
}
