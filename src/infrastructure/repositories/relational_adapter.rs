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

use async_trait::async_trait;
use sea_orm::sea_query::SelectStatement;
use sea_orm::{
    ConnectionTrait, DatabaseConnection, FromQueryResult, JsonValue, TransactionTrait,
};
use tracing::{debug, warn};
use uuid::Uuid;

use crate::config::settings::DatabaseSettings;
use crate::domain::models::entity::{EntityType, Record};
use crate::domain::models::operation::{AdapterOperation, OperationKind, OperationOutput};
use crate::domain::models::query::{Filter, FindManyArgs};
use crate::domain::repositories::persistence_adapter::{
    AdapterError, AdapterKind, PersistenceAdapter,
};
use crate::infrastructure::database::{connection, statements};
use crate::infrastructure::lazy::LazyClient;

/// 关系型持久化适配器
///
/// 基于SeaORM与动态 sea-query 语句实现，行以 JSON 形式读回。
/// 连接池在首次使用时建立，并发的首次调用只会建立一个连接池。
pub struct RelationalAdapter {
    /// 数据库配置
    settings: Option<DatabaseSettings>,
    /// 数据库连接池
    pool: LazyClient<DatabaseConnection>,
}

impl RelationalAdapter {
    /// 创建延迟连接的适配器
    ///
    /// # 参数
    ///
    /// * `settings` - 数据库配置
    ///
    /// # 返回值
    ///
    /// 返回新的适配器实例，此时尚未连接数据库
    pub fn new(settings: DatabaseSettings) -> Self {
        Self {
            settings: Some(settings),
            pool: LazyClient::new("database"),
        }
    }

    /// 使用已建立的连接创建适配器
    pub fn with_connection(db: DatabaseConnection) -> Self {
        Self {
            settings: None,
            pool: LazyClient::with_value("database", db),
        }
    }

    async fn db(&self) -> Result<&DatabaseConnection, AdapterError> {
        self.pool
            .get_or_try_init(|| async {
                let settings = self.settings.as_ref().ok_or_else(|| {
                    AdapterError::Configuration("database settings are missing".to_string())
                })?;
                Ok::<_, AdapterError>(connection::connect(settings).await?)
            })
            .await
    }
}

fn into_record(row: JsonValue) -> Result<Record, AdapterError> {
    Record::try_from(row).map_err(AdapterError::InvalidPayload)
}

async fn fetch_one<C: ConnectionTrait>(
    conn: &C,
    stmt: &SelectStatement,
) -> Result<Option<Record>, AdapterError> {
    let statement = conn.get_database_backend().build(stmt);
    let row = JsonValue::find_by_statement(statement).one(conn).await?;
    row.map(into_record).transpose()
}

async fn fetch_all<C: ConnectionTrait>(
    conn: &C,
    stmt: &SelectStatement,
) -> Result<Vec<Record>, AdapterError> {
    let statement = conn.get_database_backend().build(stmt);
    let rows = JsonValue::find_by_statement(statement).all(conn).await?;
    rows.into_iter().map(into_record).collect()
}

/// 定位单条目标记录，未命中时返回 `NotFound`
async fn locate<C: ConnectionTrait>(
    conn: &C,
    entity: EntityType,
    filter: &Filter,
) -> Result<(String, Record), AdapterError> {
    let record = fetch_one(conn, &statements::select_one(entity, filter)?)
        .await?
        .ok_or(AdapterError::NotFound { entity })?;
    let id = record
        .id()
        .map(str::to_string)
        .ok_or_else(|| AdapterError::InvalidPayload(format!("{} row without id", entity)))?;
    Ok((id, record))
}

async fn count_on<C: ConnectionTrait>(
    conn: &C,
    entity: EntityType,
    filter: &Filter,
) -> Result<u64, AdapterError> {
    let stmt = statements::count(entity, filter)?;
    let statement = conn.get_database_backend().build(&stmt);
    let count = match conn.query_one(statement).await? {
        Some(row) => row.try_get::<i64>("", statements::COUNT_COLUMN)?,
        None => 0,
    };
    Ok(count.max(0) as u64)
}

async fn create_on<C: ConnectionTrait>(
    conn: &C,
    entity: EntityType,
    data: &Record,
) -> Result<Record, AdapterError> {
    let mut data = data.clone();
    if data.id().is_none() {
        data.insert("id", Uuid::new_v4().to_string());
    }

    let stmt = statements::insert(entity, &data)?;
    let statement = conn.get_database_backend().build(&stmt);
    let row = JsonValue::find_by_statement(statement)
        .one(conn)
        .await?
        .ok_or(AdapterError::NotFound { entity })?;
    into_record(row)
}

async fn update_on<C: ConnectionTrait>(
    conn: &C,
    entity: EntityType,
    filter: &Filter,
    data: &Record,
) -> Result<Record, AdapterError> {
    let (id, current) = locate(conn, entity, filter).await?;
    if data.is_empty() {
        return Ok(current);
    }

    let stmt = statements::update_by_id(entity, &id, data)?;
    let statement = conn.get_database_backend().build(&stmt);
    let row = JsonValue::find_by_statement(statement)
        .one(conn)
        .await?
        .ok_or(AdapterError::NotFound { entity })?;
    into_record(row)
}

async fn update_many_on<C: ConnectionTrait>(
    conn: &C,
    entity: EntityType,
    filter: &Filter,
    data: &Record,
) -> Result<u64, AdapterError> {
    if data.is_empty() {
        return count_on(conn, entity, filter).await;
    }
    let stmt = statements::update_where(entity, filter, data)?;
    let result = conn.execute(conn.get_database_backend().build(&stmt)).await?;
    Ok(result.rows_affected())
}

async fn delete_on<C: ConnectionTrait>(
    conn: &C,
    entity: EntityType,
    filter: &Filter,
) -> Result<Record, AdapterError> {
    let (id, current) = locate(conn, entity, filter).await?;
    let stmt = statements::delete_by_id(entity, &id);
    conn.execute(conn.get_database_backend().build(&stmt)).await?;
    Ok(current)
}

async fn execute_on<C: ConnectionTrait>(
    conn: &C,
    operation: &AdapterOperation,
) -> Result<OperationOutput, AdapterError> {
    let entity = operation.entity;
    match &operation.kind {
        OperationKind::Create { data } => create_on(conn, entity, data)
            .await
            .map(OperationOutput::Record),
        OperationKind::Update { filter, data } => update_on(conn, entity, filter, data)
            .await
            .map(OperationOutput::Record),
        OperationKind::UpdateMany { filter, data } => update_many_on(conn, entity, filter, data)
            .await
            .map(OperationOutput::Affected),
        OperationKind::Delete { filter } => delete_on(conn, entity, filter)
            .await
            .map(OperationOutput::Record),
    }
}

#[async_trait]
impl PersistenceAdapter for RelationalAdapter {
    fn kind(&self) -> AdapterKind {
        AdapterKind::Relational
    }

    fn supports_atomic_transaction(&self) -> bool {
        true
    }

    async fn find_unique(
        &self,
        entity: EntityType,
        filter: &Filter,
    ) -> Result<Option<Record>, AdapterError> {
        let stmt = statements::select_one(entity, filter)?;
        fetch_one(self.db().await?, &stmt).await
    }

    async fn find_many(
        &self,
        entity: EntityType,
        args: &FindManyArgs,
    ) -> Result<Vec<Record>, AdapterError> {
        let stmt = statements::select(entity, args)?;
        fetch_all(self.db().await?, &stmt).await
    }

    async fn create(&self, entity: EntityType, data: &Record) -> Result<Record, AdapterError> {
        create_on(self.db().await?, entity, data).await
    }

    async fn update(
        &self,
        entity: EntityType,
        filter: &Filter,
        data: &Record,
    ) -> Result<Record, AdapterError> {
        let txn = self.db().await?.begin().await?;
        let record = update_on(&txn, entity, filter, data).await?;
        txn.commit().await?;
        Ok(record)
    }

    async fn update_many(
        &self,
        entity: EntityType,
        filter: &Filter,
        data: &Record,
    ) -> Result<u64, AdapterError> {
        update_many_on(self.db().await?, entity, filter, data).await
    }

    async fn delete(&self, entity: EntityType, filter: &Filter) -> Result<Record, AdapterError> {
        let txn = self.db().await?.begin().await?;
        let record = delete_on(&txn, entity, filter).await?;
        txn.commit().await?;
        Ok(record)
    }

    async fn count(&self, entity: EntityType, filter: &Filter) -> Result<u64, AdapterError> {
        count_on(self.db().await?, entity, filter).await
    }

    async fn transaction(
        &self,
        operations: Vec<AdapterOperation>,
    ) -> Result<Vec<OperationOutput>, AdapterError> {
        let txn = self.db().await?.begin().await?;
        let mut outputs = Vec::with_capacity(operations.len());

        for (index, operation) in operations.iter().enumerate() {
            match execute_on(&txn, operation).await {
                Ok(output) => outputs.push(output),
                Err(e) => {
                    warn!(
                        "Rolling back transaction at operation {} ({} {}): {}",
                        index,
                        operation.kind.name(),
                        operation.entity,
                        e
                    );
                    txn.rollback().await?;
                    return Err(e);
                }
            }
        }

        txn.commit().await?;
        debug!("Committed transaction with {} operations", outputs.len());
        Ok(outputs)
    }

    async fn execute(&self, operation: &AdapterOperation) -> Result<OperationOutput, AdapterError> {
        match &operation.kind {
            OperationKind::Update { .. } | OperationKind::Delete { .. } => {
                let txn = self.db().await?.begin().await?;
                let output = execute_on(&txn, operation).await?;
                txn.commit().await?;
                Ok(output)
            }
            _ => execute_on(self.db().await?, operation).await,
        }
    }
}
