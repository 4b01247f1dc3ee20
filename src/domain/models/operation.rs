// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use serde::{Deserialize, Serialize};

use super::entity::{EntityType, Record};
use super::query::Filter;

/// 写操作类型及其负载
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum OperationKind {
    /// 新建记录
    Create { data: Record },
    /// 按唯一条件更新单条记录
    Update {
        #[serde(rename = "where")]
        filter: Filter,
        data: Record,
    },
    /// 批量更新
    UpdateMany {
        #[serde(rename = "where")]
        filter: Filter,
        data: Record,
    },
    /// 按唯一条件删除单条记录
    Delete {
        #[serde(rename = "where")]
        filter: Filter,
    },
}

impl OperationKind {
    pub fn name(&self) -> &'static str {
        match self {
            OperationKind::Create { .. } => "create",
            OperationKind::Update { .. } => "update",
            OperationKind::UpdateMany { .. } => "update_many",
            OperationKind::Delete { .. } => "delete",
        }
    }

    /// 本次写入会改写的字段
    pub fn written_fields(&self) -> Option<&Record> {
        match self {
            OperationKind::Create { data }
            | OperationKind::Update { data, .. }
            | OperationKind::UpdateMany { data, .. } => Some(data),
            OperationKind::Delete { .. } => None,
        }
    }
}

/// 适配器操作
///
/// 每次调用时构造，派发给当前唯一启用的后端，不做持久化。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AdapterOperation {
    pub entity: EntityType,
    #[serde(flatten)]
    pub kind: OperationKind,
}

impl AdapterOperation {
    pub fn new(entity: EntityType, kind: OperationKind) -> Self {
        Self { entity, kind }
    }

    pub fn create(entity: EntityType, data: Record) -> Self {
        Self::new(entity, OperationKind::Create { data })
    }

    pub fn update(entity: EntityType, filter: Filter, data: Record) -> Self {
        Self::new(entity, OperationKind::Update { filter, data })
    }

    pub fn update_many(entity: EntityType, filter: Filter, data: Record) -> Self {
        Self::new(entity, OperationKind::UpdateMany { filter, data })
    }

    pub fn delete(entity: EntityType, filter: Filter) -> Self {
        Self::new(entity, OperationKind::Delete { filter })
    }
}

/// 写操作结果
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum OperationOutput {
    /// 单条记录写入后的最新值（删除时为被删除的记录）
    Record(Record),
    /// 批量操作影响的行数
    Affected(u64),
}

impl OperationOutput {
    pub fn record(&self) -> Option<&Record> {
        match self {
            OperationOutput::Record(record) => Some(record),
            OperationOutput::Affected(_) => None,
        }
    }

    pub fn into_record(self) -> Option<Record> {
        match self {
            OperationOutput::Record(record) => Some(record),
            OperationOutput::Affected(_) => None,
        }
    }
}
