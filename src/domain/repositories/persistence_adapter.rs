// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::domain::models::entity::{EntityType, Record};
use crate::domain::models::operation::{AdapterOperation, OperationKind, OperationOutput};
use crate::domain::models::query::{Filter, FindManyArgs, QueryError};
use async_trait::async_trait;
use sea_orm::DbErr;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// 持久化后端类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum AdapterKind {
    /// 关系型数据库（ORM）
    #[default]
    Relational,
    /// 远程 REST 服务（BaaS）
    RemoteService,
}

impl fmt::Display for AdapterKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AdapterKind::Relational => write!(f, "relational"),
            AdapterKind::RemoteService => write!(f, "remote-service"),
        }
    }
}

/// 适配器错误类型
///
/// 后端错误原样向调用方传播，适配器本身不做重试。
#[derive(Error, Debug)]
pub enum AdapterError {
    /// 数据库错误
    #[error("Database error: {0}")]
    Database(#[from] DbErr),
    /// 远程服务返回的错误
    #[error("Remote service error ({status}): {message}")]
    Remote {
        status: u16,
        code: Option<String>,
        message: String,
    },
    /// HTTP 传输错误
    #[error("Transport error: {0}")]
    Transport(#[from] reqwest::Error),
    /// 记录未找到
    #[error("Record not found in {entity}")]
    NotFound { entity: EntityType },
    /// 请求负载不合法
    #[error("Invalid payload: {0}")]
    InvalidPayload(String),
    /// 序列化错误
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
    /// 适配器配置错误
    #[error("Adapter configuration error: {0}")]
    Configuration(String),
}

impl From<QueryError> for AdapterError {
    fn from(err: QueryError) -> Self {
        AdapterError::InvalidPayload(err.to_string())
    }
}

/// 持久化适配器特质
///
/// 为关系型后端与远程服务后端提供统一的 CRUD 与事务接口。
/// 每个进程只启用一个实现，在启动时由配置决定。
#[async_trait]
pub trait PersistenceAdapter: Send + Sync {
    /// 当前后端类型
    fn kind(&self) -> AdapterKind;

    /// 后端是否支持原子事务
    ///
    /// 返回 `false` 时，`transaction` 按顺序逐条执行，失败时已执行的写入不会回滚。
    fn supports_atomic_transaction(&self) -> bool;

    /// 按唯一条件查找单条记录
    async fn find_unique(
        &self,
        entity: EntityType,
        filter: &Filter,
    ) -> Result<Option<Record>, AdapterError>;

    /// 按条件、排序与分页查找多条记录
    async fn find_many(
        &self,
        entity: EntityType,
        args: &FindManyArgs,
    ) -> Result<Vec<Record>, AdapterError>;

    /// 新建记录，未提供 `id` 时由适配器生成
    async fn create(&self, entity: EntityType, data: &Record) -> Result<Record, AdapterError>;

    /// 更新单条记录，未命中时返回 `NotFound`
    async fn update(
        &self,
        entity: EntityType,
        filter: &Filter,
        data: &Record,
    ) -> Result<Record, AdapterError>;

    /// 批量更新，返回影响行数
    async fn update_many(
        &self,
        entity: EntityType,
        filter: &Filter,
        data: &Record,
    ) -> Result<u64, AdapterError>;

    /// 删除单条记录并返回被删除的记录，未命中时返回 `NotFound`
    async fn delete(&self, entity: EntityType, filter: &Filter) -> Result<Record, AdapterError>;

    /// 统计满足条件的记录数
    async fn count(&self, entity: EntityType, filter: &Filter) -> Result<u64, AdapterError>;

    /// 批量执行写操作
    async fn transaction(
        &self,
        operations: Vec<AdapterOperation>,
    ) -> Result<Vec<OperationOutput>, AdapterError>;

    /// 执行单个写操作
    async fn execute(&self, operation: &AdapterOperation) -> Result<OperationOutput, AdapterError> {
        let entity = operation.entity;
        match &operation.kind {
            OperationKind::Create { data } => {
                self.create(entity, data).await.map(OperationOutput::Record)
            }
            OperationKind::Update { filter, data } => self
                .update(entity, filter, data)
                .await
                .map(OperationOutput::Record),
            OperationKind::UpdateMany { filter, data } => self
                .update_many(entity, filter, data)
                .await
                .map(OperationOutput::Affected),
            OperationKind::Delete { filter } => {
                self.delete(entity, filter).await.map(OperationOutput::Record)
            }
        }
    }
}
