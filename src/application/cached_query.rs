// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use serde::de::DeserializeOwned;
use serde::Serialize;
use std::collections::BTreeSet;
use std::future::Future;
use std::sync::Arc;
use tracing::{debug, warn};

use super::ttl_policy::TtlPolicy;
use crate::domain::models::entity::{EntityType, Record};
use crate::domain::models::operation::{AdapterOperation, OperationKind, OperationOutput};
use crate::domain::models::query::{Condition, Filter, FindManyArgs, OrderBy};
use crate::domain::models::views::{InquiryWithItems, UserWorkload, CLOSED_ITEM_STATUSES};
use crate::domain::repositories::cache_store::{CacheStore, CacheStoreExt};
use crate::domain::repositories::persistence_adapter::{AdapterError, PersistenceAdapter};
use crate::infrastructure::cache::invalidation::{
    self, Dependency, InvalidationSet, WITH_ITEMS_AGGREGATE, WORKLOAD_AGGREGATE,
};
use crate::infrastructure::cache::keys;
use crate::infrastructure::metrics;

/// 带缓存的查询服务
///
/// 读路径先查缓存，未命中时回源到持久化适配器并回填；
/// 写路径先调用适配器，成功后按失效规划删除受影响的缓存。
///
/// 缓存故障一律降级为未命中，适配器错误原样返回给调用方。
pub struct CachedQueryService {
    adapter: Arc<dyn PersistenceAdapter>,
    cache: Arc<dyn CacheStore>,
    ttl: TtlPolicy,
}

impl CachedQueryService {
    /// 创建新的查询服务
    ///
    /// # 参数
    ///
    /// * `adapter` - 进程内唯一的持久化适配器
    /// * `cache` - 缓存存储
    /// * `ttl` - 过期策略
    pub fn new(
        adapter: Arc<dyn PersistenceAdapter>,
        cache: Arc<dyn CacheStore>,
        ttl: TtlPolicy,
    ) -> Self {
        Self {
            adapter,
            cache,
            ttl,
        }
    }

    pub fn adapter(&self) -> &Arc<dyn PersistenceAdapter> {
        &self.adapter
    }

    pub fn cache(&self) -> &Arc<dyn CacheStore> {
        &self.cache
    }

    pub fn ttl(&self) -> &TtlPolicy {
        &self.ttl
    }

    /// 按主键读取单条记录
    ///
    /// 记录不存在时返回 `None`，且不写入缓存。
    pub async fn get_by_id(
        &self,
        entity: EntityType,
        id: &str,
    ) -> Result<Option<Record>, AdapterError> {
        let key = keys::entity_key(entity, id);
        if let Some(record) = self.cache.get::<Record>(&key).await {
            debug!("Cache hit for {}", key);
            metrics::record_cache_hit(entity.as_str(), "entity");
            return Ok(Some(record));
        }

        debug!("Cache miss for {}", key);
        metrics::record_cache_miss(entity.as_str(), "entity");

        let record = self.adapter.find_unique(entity, &Filter::by_id(id)).await?;
        if let Some(record) = &record {
            self.cache
                .set(&key, record, self.ttl.entity_ttl(entity))
                .await;
        }
        Ok(record)
    }

    /// 按过滤条件、排序与分页读取列表
    pub async fn get_list(
        &self,
        entity: EntityType,
        args: &FindManyArgs,
    ) -> Result<Vec<Record>, AdapterError> {
        let key = keys::list_key(entity, args);
        if let Some(records) = self.cache.get::<Vec<Record>>(&key).await {
            debug!("Cache hit for {}", key);
            metrics::record_cache_hit(entity.as_str(), "list");
            return Ok(records);
        }

        debug!("Cache miss for {}", key);
        metrics::record_cache_miss(entity.as_str(), "list");

        let records = self.adapter.find_many(entity, args).await?;
        self.cache
            .set(&key, &records, self.ttl.list_ttl(entity))
            .await;
        Ok(records)
    }

    /// 统计满足条件的记录数
    pub async fn get_count(&self, entity: EntityType, filter: &Filter) -> Result<u64, AdapterError> {
        let key = keys::count_key(entity, filter);
        if let Some(count) = self.cache.get::<u64>(&key).await {
            metrics::record_cache_hit(entity.as_str(), keys::COUNT_AGGREGATE);
            return Ok(count);
        }
        metrics::record_cache_miss(entity.as_str(), keys::COUNT_AGGREGATE);

        let count = self.adapter.count(entity, filter).await?;
        self.cache
            .set(&key, &count, self.ttl.aggregate_ttl(entity))
            .await;
        Ok(count)
    }

    /// 通用聚合视图读取
    ///
    /// 键为 `{owner}:{name}:{subject}`，未命中时调用 `loader` 计算并回填。
    /// 失效范围需要在 [`invalidation::dependencies`] 中声明。
    pub async fn get_aggregate<T, F, Fut>(
        &self,
        owner: EntityType,
        name: &'static str,
        subject: &str,
        loader: F,
    ) -> Result<T, AdapterError>
    where
        T: Serialize + DeserializeOwned + Send + Sync,
        F: FnOnce() -> Fut + Send,
        Fut: Future<Output = Result<T, AdapterError>> + Send,
    {
        let key = keys::aggregate_key(owner, name, subject);
        if let Some(value) = self.cache.get::<T>(&key).await {
            debug!("Cache hit for {}", key);
            metrics::record_cache_hit(owner.as_str(), name);
            return Ok(value);
        }

        debug!("Cache miss for {}", key);
        metrics::record_cache_miss(owner.as_str(), name);

        let value = loader().await?;
        self.cache
            .set(&key, &value, self.ttl.aggregate_ttl(owner))
            .await;
        Ok(value)
    }

    /// 用户工作量：指派给该用户、未关闭的询价明细
    pub async fn user_workload(&self, user_id: &str) -> Result<UserWorkload, AdapterError> {
        self.get_aggregate(EntityType::User, WORKLOAD_AGGREGATE, user_id, || async {
            let closed = CLOSED_ITEM_STATUSES.iter().map(|s| (*s).into()).collect();
            let filter = Filter::new()
                .eq("assigned_to", user_id)
                .with("status", Condition::NotIn(closed));
            let args = FindManyArgs::new(filter).order_by(OrderBy::asc("position"));

            let items = self.adapter.find_many(EntityType::InquiryItem, &args).await?;
            Ok(UserWorkload::from_items(user_id, items))
        })
        .await
    }

    /// 询价单及其按 `position` 排序的明细
    ///
    /// 询价单不存在时返回 `None`，不缓存空结果。
    pub async fn inquiry_with_items(
        &self,
        inquiry_id: &str,
    ) -> Result<Option<InquiryWithItems>, AdapterError> {
        if self.get_by_id(EntityType::Inquiry, inquiry_id).await?.is_none() {
            return Ok(None);
        }

        let view = self
            .get_aggregate(EntityType::Inquiry, WITH_ITEMS_AGGREGATE, inquiry_id, || async {
                let inquiry = self
                    .adapter
                    .find_unique(EntityType::Inquiry, &Filter::by_id(inquiry_id))
                    .await?
                    .ok_or(AdapterError::NotFound {
                        entity: EntityType::Inquiry,
                    })?;
                let args = FindManyArgs::new(Filter::new().eq("inquiry_id", inquiry_id))
                    .order_by(OrderBy::asc("position"));
                let items = self.adapter.find_many(EntityType::InquiryItem, &args).await?;
                Ok(InquiryWithItems { inquiry, items })
            })
            .await;

        match view {
            Ok(view) => Ok(Some(view)),
            Err(AdapterError::NotFound { .. }) => Ok(None),
            Err(e) => Err(e),
        }
    }

    /// 执行单个写操作并使受影响的缓存失效
    ///
    /// 适配器失败时不访问缓存，错误原样返回；失效失败只记录日志。
    pub async fn mutate(
        &self,
        entity: EntityType,
        kind: OperationKind,
    ) -> Result<OperationOutput, AdapterError> {
        let operation = AdapterOperation::new(entity, kind);
        let output = self.adapter.execute(&operation).await?;

        let set = invalidation::plan(&operation, &output);
        self.invalidate(entity, &set).await;
        Ok(output)
    }

    /// 批量执行写操作
    ///
    /// 成功时应用全部操作失效集合的并集。后端不支持原子事务且批量中途失败时，
    /// 部分写入可能已经生效，批量涉及的全部实体类型及其依赖视图整体清除。
    pub async fn mutate_batch(
        &self,
        operations: Vec<AdapterOperation>,
    ) -> Result<Vec<OperationOutput>, AdapterError> {
        let Some(first) = operations.first().map(|op| op.entity) else {
            return Ok(Vec::new());
        };

        match self.adapter.transaction(operations.clone()).await {
            Ok(outputs) => {
                let mut set = InvalidationSet::new();
                for (operation, output) in operations.iter().zip(&outputs) {
                    set.merge(invalidation::plan(operation, output));
                }
                self.invalidate(first, &set).await;
                Ok(outputs)
            }
            Err(e) => {
                if !self.adapter.supports_atomic_transaction() {
                    warn!(
                        "Non-atomic batch failed, clearing caches for all touched entity types: {}",
                        e
                    );
                    let set = touched_entities(&operations);
                    self.invalidate(first, &set).await;
                }
                Err(e)
            }
        }
    }

    /// 新建记录
    pub async fn create(&self, entity: EntityType, data: Record) -> Result<Record, AdapterError> {
        expect_record(self.mutate(entity, OperationKind::Create { data }).await?)
    }

    /// 更新单条记录
    pub async fn update(
        &self,
        entity: EntityType,
        filter: Filter,
        data: Record,
    ) -> Result<Record, AdapterError> {
        expect_record(self.mutate(entity, OperationKind::Update { filter, data }).await?)
    }

    /// 批量更新，返回影响行数
    pub async fn update_many(
        &self,
        entity: EntityType,
        filter: Filter,
        data: Record,
    ) -> Result<u64, AdapterError> {
        match self
            .mutate(entity, OperationKind::UpdateMany { filter, data })
            .await?
        {
            OperationOutput::Affected(count) => Ok(count),
            OperationOutput::Record(_) => Ok(1),
        }
    }

    /// 删除单条记录，返回被删除的记录
    pub async fn delete(&self, entity: EntityType, filter: Filter) -> Result<Record, AdapterError> {
        expect_record(self.mutate(entity, OperationKind::Delete { filter }).await?)
    }

    async fn invalidate(&self, entity: EntityType, set: &InvalidationSet) {
        let mut removed = 0;
        let mut failed = false;

        let explicit = set.keys();
        if !explicit.is_empty() {
            match self.cache.del(&explicit).await {
                Ok(count) => removed += count,
                Err(e) => {
                    warn!("Failed to invalidate keys {:?}: {}", explicit, e);
                    failed = true;
                }
            }
        }

        for pattern in set.patterns() {
            match self.cache.clear_pattern(pattern).await {
                Ok(count) => removed += count,
                Err(e) => {
                    warn!("Failed to invalidate pattern {}: {}", pattern, e);
                    failed = true;
                }
            }
        }

        if failed {
            metrics::record_invalidation_failure(entity.as_str());
        }
        metrics::record_invalidated_keys(entity.as_str(), removed);
        debug!("Invalidated {} cache entries after {} write", removed, entity);
    }
}

fn expect_record(output: OperationOutput) -> Result<Record, AdapterError> {
    output.into_record().ok_or_else(|| {
        AdapterError::InvalidPayload("adapter returned a row count instead of a record".to_string())
    })
}

/// 批量涉及的实体类型及其依赖视图，全部按模式清除
fn touched_entities(operations: &[AdapterOperation]) -> InvalidationSet {
    let mut entities = BTreeSet::new();
    for operation in operations {
        entities.insert(operation.entity);
        for dependency in invalidation::dependencies(operation.entity) {
            match dependency {
                Dependency::Parent { owner, .. } | Dependency::Aggregate { owner, .. } => {
                    entities.insert(*owner);
                }
            }
        }
    }

    let mut set = InvalidationSet::new();
    for entity in entities {
        set.add_pattern(keys::entity_pattern(entity));
    }
    set
}
