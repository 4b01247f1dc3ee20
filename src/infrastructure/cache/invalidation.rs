// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use serde_json::Value;
use std::collections::BTreeSet;

use super::keys::{
    aggregate_key, aggregate_pattern, entity_key, entity_pattern, list_pattern, COUNT_AGGREGATE,
};
use crate::domain::models::entity::{EntityType, Record};
use crate::domain::models::operation::{AdapterOperation, OperationKind, OperationOutput};

/// 工作量聚合视图名（`user:workload:{user_id}`）
pub const WORKLOAD_AGGREGATE: &str = "workload";
/// 询价单含明细聚合视图名（`inquiry:with_items:{inquiry_id}`）
pub const WITH_ITEMS_AGGREGATE: &str = "with_items";

/// 缓存依赖声明
///
/// 描述某类实体被写入后，还有哪些其他实体的缓存视图会变旧。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dependency {
    /// 通过外键 `via` 指向的父记录及其列表
    Parent {
        owner: EntityType,
        via: &'static str,
    },
    /// 以字段 `via` 的值为主体的聚合视图 `{owner}:{name}:{via}`
    Aggregate {
        owner: EntityType,
        name: &'static str,
        via: &'static str,
    },
}

impl Dependency {
    pub fn via(&self) -> &'static str {
        match self {
            Dependency::Parent { via, .. } | Dependency::Aggregate { via, .. } => via,
        }
    }
}

const INQUIRY_ITEM_DEPENDENCIES: &[Dependency] = &[
    Dependency::Parent {
        owner: EntityType::Inquiry,
        via: "inquiry_id",
    },
    Dependency::Aggregate {
        owner: EntityType::Inquiry,
        name: WITH_ITEMS_AGGREGATE,
        via: "inquiry_id",
    },
    Dependency::Aggregate {
        owner: EntityType::User,
        name: WORKLOAD_AGGREGATE,
        via: "assigned_to",
    },
];

const INQUIRY_DEPENDENCIES: &[Dependency] = &[Dependency::Aggregate {
    owner: EntityType::Inquiry,
    name: WITH_ITEMS_AGGREGATE,
    via: "id",
}];

const COST_CALCULATION_DEPENDENCIES: &[Dependency] = &[Dependency::Parent {
    owner: EntityType::InquiryItem,
    via: "inquiry_item_id",
}];

const APPROVAL_DEPENDENCIES: &[Dependency] = &[Dependency::Parent {
    owner: EntityType::CostCalculation,
    via: "cost_calculation_id",
}];

const QUOTE_DEPENDENCIES: &[Dependency] = &[Dependency::Parent {
    owner: EntityType::Inquiry,
    via: "inquiry_id",
}];

const PRODUCTION_ORDER_DEPENDENCIES: &[Dependency] = &[Dependency::Parent {
    owner: EntityType::Quote,
    via: "quote_id",
}];

/// 实体类型到受影响缓存视图的声明式映射
///
/// 所有写路径的失效范围都由这张表集中推导，调用点不再手写键列表。
pub fn dependencies(entity: EntityType) -> &'static [Dependency] {
    match entity {
        EntityType::User => &[],
        EntityType::Inquiry => INQUIRY_DEPENDENCIES,
        EntityType::InquiryItem => INQUIRY_ITEM_DEPENDENCIES,
        EntityType::CostCalculation => COST_CALCULATION_DEPENDENCIES,
        EntityType::Approval => APPROVAL_DEPENDENCIES,
        EntityType::Quote => QUOTE_DEPENDENCIES,
        EntityType::ProductionOrder => PRODUCTION_ORDER_DEPENDENCIES,
    }
}

/// 失效集合
///
/// 写入成功后需要删除的精确键与通配符模式。
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InvalidationSet {
    keys: BTreeSet<String>,
    patterns: BTreeSet<String>,
}

impl InvalidationSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_key(&mut self, key: String) {
        self.keys.insert(key);
    }

    pub fn add_pattern(&mut self, pattern: String) {
        self.patterns.insert(pattern);
    }

    pub fn merge(&mut self, other: InvalidationSet) {
        self.keys.extend(other.keys);
        self.patterns.extend(other.patterns);
    }

    pub fn keys(&self) -> Vec<String> {
        self.keys.iter().cloned().collect()
    }

    pub fn patterns(&self) -> impl Iterator<Item = &String> {
        self.patterns.iter()
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.keys.contains(key)
    }

    pub fn contains_pattern(&self, pattern: &str) -> bool {
        self.patterns.contains(pattern)
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty() && self.patterns.is_empty()
    }
}

/// 计算一次写操作的失效集合
///
/// # 参数
///
/// * `operation` - 已成功执行的写操作
/// * `output` - 适配器返回的结果；单条写入时携带最新（或被删除的）记录
///
/// # 返回值
///
/// 返回需要删除的键与模式。没有记录可用（批量更新）或关联字段被改写时，
/// 旧的关联主体无从得知，对应视图按模式整体清除。
pub fn plan(operation: &AdapterOperation, output: &OperationOutput) -> InvalidationSet {
    let entity = operation.entity;
    let record = output.record();
    let mut set = InvalidationSet::new();

    set.add_pattern(list_pattern(entity));
    set.add_pattern(aggregate_pattern(entity, COUNT_AGGREGATE));

    match record.and_then(Record::id) {
        Some(id) => set.add_key(entity_key(entity, id)),
        None => set.add_pattern(entity_pattern(entity)),
    }

    for dependency in dependencies(entity) {
        let current = record.and_then(|r| relation_value(r, dependency.via()));
        let stale_unknown = record.is_none() || rewrites_relation(&operation.kind, dependency.via());

        match *dependency {
            Dependency::Parent { owner, .. } => {
                set.add_pattern(list_pattern(owner));
                if let Some(parent_id) = &current {
                    set.add_key(entity_key(owner, parent_id));
                }
                if stale_unknown {
                    set.add_pattern(entity_pattern(owner));
                }
            }
            Dependency::Aggregate { owner, name, .. } => {
                if let Some(subject) = &current {
                    set.add_key(aggregate_key(owner, name, subject));
                }
                if stale_unknown {
                    set.add_pattern(aggregate_pattern(owner, name));
                }
            }
        }
    }

    set
}

/// 更新操作是否改写了关联字段（旧值不可知）
fn rewrites_relation(kind: &OperationKind, via: &str) -> bool {
    if matches!(kind, OperationKind::Create { .. }) {
        return false;
    }
    kind.written_fields()
        .map(|data| data.contains(via))
        .unwrap_or(false)
}

fn relation_value(record: &Record, field: &str) -> Option<String> {
    match record.get(field)? {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}
