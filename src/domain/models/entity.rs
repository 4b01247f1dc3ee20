// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use std::str::FromStr;

/// 业务实体类型
///
/// GS-CMS 中所有可被缓存与持久化的记录类型。
/// 缓存前缀使用单数蛇形命名，数据表使用复数蛇形命名。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityType {
    /// 用户
    User,
    /// 询价单
    Inquiry,
    /// 询价明细
    InquiryItem,
    /// 成本核算
    CostCalculation,
    /// 审批记录
    Approval,
    /// 报价单
    Quote,
    /// 生产订单
    ProductionOrder,
}

impl EntityType {
    /// 全部实体类型
    pub const ALL: [EntityType; 7] = [
        EntityType::User,
        EntityType::Inquiry,
        EntityType::InquiryItem,
        EntityType::CostCalculation,
        EntityType::Approval,
        EntityType::Quote,
        EntityType::ProductionOrder,
    ];

    /// 缓存键前缀
    pub fn as_str(&self) -> &'static str {
        match self {
            EntityType::User => "user",
            EntityType::Inquiry => "inquiry",
            EntityType::InquiryItem => "inquiry_item",
            EntityType::CostCalculation => "cost_calculation",
            EntityType::Approval => "approval",
            EntityType::Quote => "quote",
            EntityType::ProductionOrder => "production_order",
        }
    }

    /// 对应的数据表名
    pub fn table(&self) -> &'static str {
        match self {
            EntityType::User => "users",
            EntityType::Inquiry => "inquiries",
            EntityType::InquiryItem => "inquiry_items",
            EntityType::CostCalculation => "cost_calculations",
            EntityType::Approval => "approvals",
            EntityType::Quote => "quotes",
            EntityType::ProductionOrder => "production_orders",
        }
    }
}

impl fmt::Display for EntityType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EntityType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        EntityType::ALL
            .iter()
            .copied()
            .find(|entity| entity.as_str() == s || entity.table() == s)
            .ok_or_else(|| format!("Unknown entity type: {}", s))
    }
}

/// 业务记录
///
/// 对缓存层而言是不透明的 JSON 对象，只依赖 `id` 字段
/// 以及失效映射中声明的关联字段。
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Record(Map<String, Value>);

impl Record {
    pub fn new() -> Self {
        Self(Map::new())
    }

    /// 记录主键
    pub fn id(&self) -> Option<&str> {
        self.get_str("id")
    }

    pub fn get(&self, field: &str) -> Option<&Value> {
        self.0.get(field)
    }

    /// 读取字符串字段，非字符串或缺失时返回 None
    pub fn get_str(&self, field: &str) -> Option<&str> {
        self.0.get(field).and_then(Value::as_str)
    }

    pub fn contains(&self, field: &str) -> bool {
        self.0.contains_key(field)
    }

    pub fn insert(&mut self, field: impl Into<String>, value: impl Into<Value>) -> Option<Value> {
        self.0.insert(field.into(), value.into())
    }

    /// 构建器风格的字段设置
    pub fn with(mut self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.insert(field, value);
        self
    }

    pub fn fields(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.0.iter()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn into_value(self) -> Value {
        Value::Object(self.0)
    }
}

impl From<Map<String, Value>> for Record {
    fn from(map: Map<String, Value>) -> Self {
        Self(map)
    }
}

impl TryFrom<Value> for Record {
    type Error = String;

    fn try_from(value: Value) -> Result<Self, Self::Error> {
        match value {
            Value::Object(map) => Ok(Self(map)),
            other => Err(format!("Expected a JSON object, got {}", other)),
        }
    }
}
