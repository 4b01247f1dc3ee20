// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use async_trait::async_trait;
use gscms::config::settings::DatabaseSettings;
use gscms::domain::repositories::persistence_adapter::AdapterKind;
use gscms::infrastructure::repositories::RelationalAdapter;
use gscms::{
    AdapterError, AdapterOperation, CacheError, CacheStore, Condition, EntityType, Filter,
    FindManyArgs, OperationOutput, PersistenceAdapter, Record, SortOrder,
};
use serde_json::Value;
use std::cmp::Ordering as CmpOrdering;
use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use uuid::Uuid;

type Tables = HashMap<EntityType, BTreeMap<String, Record>>;

/// 内存版持久化适配器
///
/// 实现与真实后端一致的过滤、排序与分页语义，并统计读取次数，
/// 用于观察缓存是否命中。可以注入写失败。
pub struct InMemoryAdapter {
    tables: Mutex<Tables>,
    atomic: bool,
    reads: AtomicUsize,
    writes: AtomicUsize,
    /// 剩余允许成功的写次数，`None` 表示不限制
    write_budget: Mutex<Option<usize>>,
}

#[allow(dead_code)]
impl InMemoryAdapter {
    pub fn new() -> Self {
        Self::with_atomicity(true)
    }

    pub fn non_atomic() -> Self {
        Self::with_atomicity(false)
    }

    fn with_atomicity(atomic: bool) -> Self {
        Self {
            tables: Mutex::new(HashMap::new()),
            atomic,
            reads: AtomicUsize::new(0),
            writes: AtomicUsize::new(0),
            write_budget: Mutex::new(None),
        }
    }

    /// 直接写入一条记录，不经过缓存
    pub fn seed(&self, entity: EntityType, record: Record) {
        let id = record.id().expect("seeded record needs an id").to_string();
        self.tables
            .lock()
            .unwrap()
            .entry(entity)
            .or_default()
            .insert(id, record);
    }

    /// 直接读取一条记录，不经过缓存
    pub fn stored(&self, entity: EntityType, id: &str) -> Option<Record> {
        self.tables
            .lock()
            .unwrap()
            .get(&entity)
            .and_then(|rows| rows.get(id).cloned())
    }

    pub fn reads(&self) -> usize {
        self.reads.load(Ordering::SeqCst)
    }

    pub fn writes(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }

    /// 之后所有写操作失败
    pub fn fail_writes(&self) {
        *self.write_budget.lock().unwrap() = Some(0);
    }

    /// 允许再成功 `n` 次写操作，之后失败
    pub fn fail_writes_after(&self, n: usize) {
        *self.write_budget.lock().unwrap() = Some(n);
    }

    fn begin_write(&self) -> Result<(), AdapterError> {
        let mut budget = self.write_budget.lock().unwrap();
        match budget.as_mut() {
            Some(0) => Err(AdapterError::Remote {
                status: 409,
                code: Some("23505".to_string()),
                message: "duplicate key value violates unique constraint".to_string(),
            }),
            Some(remaining) => {
                *remaining -= 1;
                self.writes.fetch_add(1, Ordering::SeqCst);
                Ok(())
            }
            None => {
                self.writes.fetch_add(1, Ordering::SeqCst);
                Ok(())
            }
        }
    }

    fn select(&self, entity: EntityType, filter: &Filter) -> Vec<Record> {
        self.tables
            .lock()
            .unwrap()
            .get(&entity)
            .map(|rows| {
                rows.values()
                    .filter(|r| matches_filter(r, filter))
                    .cloned()
                    .collect()
            })
            .unwrap_or_default()
    }

    fn first_id(&self, entity: EntityType, filter: &Filter) -> Result<String, AdapterError> {
        self.select(entity, filter)
            .into_iter()
            .next()
            .and_then(|r| r.id().map(str::to_string))
            .ok_or(AdapterError::NotFound { entity })
    }

    fn apply(&self, entity: EntityType, id: &str, data: &Record) -> Record {
        let mut tables = self.tables.lock().unwrap();
        let row = tables
            .entry(entity)
            .or_default()
            .get_mut(id)
            .expect("row located before apply");
        for (field, value) in data.fields() {
            row.insert(field.clone(), value.clone());
        }
        row.clone()
    }
}

fn compare(a: &Value, b: &Value) -> Option<CmpOrdering> {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => x.as_f64()?.partial_cmp(&y.as_f64()?),
        (Value::String(x), Value::String(y)) => Some(x.cmp(y)),
        (Value::Bool(x), Value::Bool(y)) => Some(x.cmp(y)),
        _ => None,
    }
}

fn matches_filter(record: &Record, filter: &Filter) -> bool {
    filter.iter().all(|(field, condition)| {
        let value = record.get(field).unwrap_or(&Value::Null);
        match condition {
            Condition::Equals(v) => value == v,
            Condition::Not(v) => !value.is_null() && value != v,
            Condition::In(values) => values.contains(value),
            Condition::NotIn(values) => !value.is_null() && !values.contains(value),
            Condition::Gt(v) => compare(value, v) == Some(CmpOrdering::Greater),
            Condition::Gte(v) => matches!(
                compare(value, v),
                Some(CmpOrdering::Greater | CmpOrdering::Equal)
            ),
            Condition::Lt(v) => compare(value, v) == Some(CmpOrdering::Less),
            Condition::Lte(v) => matches!(
                compare(value, v),
                Some(CmpOrdering::Less | CmpOrdering::Equal)
            ),
            Condition::Contains(s) => value.as_str().map(|v| v.contains(s)).unwrap_or(false),
            Condition::IsNull => value.is_null(),
            Condition::IsNotNull => !value.is_null(),
        }
    })
}

#[async_trait]
impl PersistenceAdapter for InMemoryAdapter {
    fn kind(&self) -> AdapterKind {
        if self.atomic {
            AdapterKind::Relational
        } else {
            AdapterKind::RemoteService
        }
    }

    fn supports_atomic_transaction(&self) -> bool {
        self.atomic
    }

    async fn find_unique(
        &self,
        entity: EntityType,
        filter: &Filter,
    ) -> Result<Option<Record>, AdapterError> {
        self.reads.fetch_add(1, Ordering::SeqCst);
        Ok(self.select(entity, filter).into_iter().next())
    }

    async fn find_many(
        &self,
        entity: EntityType,
        args: &FindManyArgs,
    ) -> Result<Vec<Record>, AdapterError> {
        self.reads.fetch_add(1, Ordering::SeqCst);
        let mut rows = self.select(entity, &args.filter);

        rows.sort_by(|a, b| {
            for order in &args.order_by {
                let left = a.get(&order.field).unwrap_or(&Value::Null);
                let right = b.get(&order.field).unwrap_or(&Value::Null);
                let ordering = compare(left, right).unwrap_or(CmpOrdering::Equal);
                let ordering = match order.direction {
                    SortOrder::Asc => ordering,
                    SortOrder::Desc => ordering.reverse(),
                };
                if ordering != CmpOrdering::Equal {
                    return ordering;
                }
            }
            CmpOrdering::Equal
        });

        let skip = args.skip.unwrap_or(0) as usize;
        let take = args.take.map(|t| t as usize).unwrap_or(usize::MAX);
        Ok(rows.into_iter().skip(skip).take(take).collect())
    }

    async fn create(&self, entity: EntityType, data: &Record) -> Result<Record, AdapterError> {
        self.begin_write()?;
        let mut record = data.clone();
        if record.id().is_none() {
            record.insert("id", Uuid::new_v4().to_string());
        }
        self.seed(entity, record.clone());
        Ok(record)
    }

    async fn update(
        &self,
        entity: EntityType,
        filter: &Filter,
        data: &Record,
    ) -> Result<Record, AdapterError> {
        self.begin_write()?;
        let id = self.first_id(entity, filter)?;
        Ok(self.apply(entity, &id, data))
    }

    async fn update_many(
        &self,
        entity: EntityType,
        filter: &Filter,
        data: &Record,
    ) -> Result<u64, AdapterError> {
        self.begin_write()?;
        let ids: Vec<String> = self
            .select(entity, filter)
            .iter()
            .filter_map(|r| r.id().map(str::to_string))
            .collect();
        for id in &ids {
            self.apply(entity, id, data);
        }
        Ok(ids.len() as u64)
    }

    async fn delete(&self, entity: EntityType, filter: &Filter) -> Result<Record, AdapterError> {
        self.begin_write()?;
        let id = self.first_id(entity, filter)?;
        let removed = self
            .tables
            .lock()
            .unwrap()
            .get_mut(&entity)
            .and_then(|rows| rows.remove(&id));
        removed.ok_or(AdapterError::NotFound { entity })
    }

    async fn count(&self, entity: EntityType, filter: &Filter) -> Result<u64, AdapterError> {
        self.reads.fetch_add(1, Ordering::SeqCst);
        Ok(self.select(entity, filter).len() as u64)
    }

    async fn transaction(
        &self,
        operations: Vec<AdapterOperation>,
    ) -> Result<Vec<OperationOutput>, AdapterError> {
        let snapshot = self.tables.lock().unwrap().clone();
        let mut outputs = Vec::new();

        for operation in &operations {
            match self.execute(operation).await {
                Ok(output) => outputs.push(output),
                Err(e) => {
                    if self.atomic {
                        *self.tables.lock().unwrap() = snapshot;
                    }
                    return Err(e);
                }
            }
        }
        Ok(outputs)
    }
}

/// 永远失败的缓存存储，模拟缓存服务整体不可用
pub struct FailingCacheStore {
    pub calls: AtomicUsize,
}

#[allow(dead_code)]
impl FailingCacheStore {
    pub fn new() -> Self {
        Self {
            calls: AtomicUsize::new(0),
        }
    }

    fn fail<T>(&self) -> Result<T, CacheError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Err(CacheError::Timeout(500))
    }
}

#[async_trait]
impl CacheStore for FailingCacheStore {
    fn name(&self) -> &'static str {
        "failing"
    }

    async fn get_raw(&self, _key: &str) -> Result<Option<String>, CacheError> {
        self.fail()
    }

    async fn set_raw(&self, _key: &str, _value: &str, _ttl: u64) -> Result<(), CacheError> {
        self.fail()
    }

    async fn del(&self, _keys: &[String]) -> Result<u64, CacheError> {
        self.fail()
    }

    async fn clear_pattern(&self, _pattern: &str) -> Result<u64, CacheError> {
        self.fail()
    }

    async fn exists(&self, _key: &str) -> Result<bool, CacheError> {
        self.fail()
    }

    async fn ttl(&self, _key: &str) -> Result<Option<u64>, CacheError> {
        self.fail()
    }

    async fn incr(&self, _key: &str) -> Result<i64, CacheError> {
        self.fail()
    }
}

/// SQLite 内存库设置
///
/// 内存库按连接隔离，连接池固定为单连接；迁移在首次连接时执行。
pub fn sqlite_settings() -> DatabaseSettings {
    DatabaseSettings {
        adapter: AdapterKind::Relational,
        url: "sqlite::memory:".to_string(),
        max_connections: Some(1),
        min_connections: None,
        connect_timeout: Some(5),
        idle_timeout: None,
        run_migrations: true,
    }
}

/// 延迟连接的 SQLite 关系型适配器
pub fn sqlite_adapter() -> RelationalAdapter {
    RelationalAdapter::new(sqlite_settings())
}

/// 构造记录
pub fn record(value: Value) -> Record {
    Record::try_from(value).expect("record literal must be an object")
}
