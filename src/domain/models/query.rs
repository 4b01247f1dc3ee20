// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use serde::{de, Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use thiserror::Error;

/// 查询构造错误
#[derive(Error, Debug, Clone, PartialEq)]
pub enum QueryError {
    /// 过滤条件不是 JSON 对象
    #[error("Filter must be a JSON object")]
    NotAnObject,
    /// 字段名不合法
    #[error("Invalid field name '{0}'")]
    InvalidField(String),
    /// 不支持的操作符
    #[error("Unsupported filter operator '{operator}' on field '{field}'")]
    UnsupportedOperator { field: String, operator: String },
    /// 操作数类型不匹配
    #[error("Operator '{operator}' on field '{field}' expects {expected}")]
    InvalidOperand {
        field: String,
        operator: String,
        expected: &'static str,
    },
}

/// 单字段过滤条件
///
/// 操作符命名沿用 Prisma 风格：`equals`、`not`、`in`、`notIn`、
/// `gt`、`gte`、`lt`、`lte`、`contains`。
#[derive(Debug, Clone, PartialEq)]
pub enum Condition {
    Equals(Value),
    Not(Value),
    In(Vec<Value>),
    NotIn(Vec<Value>),
    Gt(Value),
    Gte(Value),
    Lt(Value),
    Lte(Value),
    Contains(String),
    IsNull,
    IsNotNull,
}

impl Condition {
    /// 从 JSON 解析单字段条件
    ///
    /// 标量即等值比较，`null` 即判空，单键对象即操作符。
    pub fn parse(field: &str, value: Value) -> Result<Self, QueryError> {
        let map = match value {
            Value::Null => return Ok(Condition::IsNull),
            Value::Object(map) => map,
            scalar => return Ok(Condition::Equals(scalar)),
        };

        if map.len() != 1 {
            return Err(QueryError::UnsupportedOperator {
                field: field.to_string(),
                operator: map.keys().cloned().collect::<Vec<_>>().join(","),
            });
        }

        let (operator, operand) = map.into_iter().next().ok_or(QueryError::NotAnObject)?;
        let invalid = |expected: &'static str| QueryError::InvalidOperand {
            field: field.to_string(),
            operator: operator.clone(),
            expected,
        };

        let condition = match (operator.as_str(), operand) {
            ("equals", Value::Null) => Condition::IsNull,
            ("equals", v) => Condition::Equals(v),
            ("not", Value::Null) => Condition::IsNotNull,
            ("not", v) => Condition::Not(v),
            ("in", Value::Array(values)) => Condition::In(values),
            ("notIn", Value::Array(values)) => Condition::NotIn(values),
            ("in" | "notIn", _) => return Err(invalid("an array")),
            ("gt", v) if !v.is_null() => Condition::Gt(v),
            ("gte", v) if !v.is_null() => Condition::Gte(v),
            ("lt", v) if !v.is_null() => Condition::Lt(v),
            ("lte", v) if !v.is_null() => Condition::Lte(v),
            ("gt" | "gte" | "lt" | "lte", _) => return Err(invalid("a non-null value")),
            ("contains", Value::String(s)) => Condition::Contains(s),
            ("contains", _) => return Err(invalid("a string")),
            (other, _) => {
                return Err(QueryError::UnsupportedOperator {
                    field: field.to_string(),
                    operator: other.to_string(),
                })
            }
        };
        Ok(condition)
    }

    /// 还原为 JSON 表示（与 `parse` 互逆）
    pub fn to_value(&self) -> Value {
        let op = |name: &str, v: Value| {
            let mut map = Map::new();
            map.insert(name.to_string(), v);
            Value::Object(map)
        };
        match self {
            Condition::Equals(v) => v.clone(),
            Condition::Not(v) => op("not", v.clone()),
            Condition::In(values) => op("in", Value::Array(values.clone())),
            Condition::NotIn(values) => op("notIn", Value::Array(values.clone())),
            Condition::Gt(v) => op("gt", v.clone()),
            Condition::Gte(v) => op("gte", v.clone()),
            Condition::Lt(v) => op("lt", v.clone()),
            Condition::Lte(v) => op("lte", v.clone()),
            Condition::Contains(s) => op("contains", Value::String(s.clone())),
            Condition::IsNull => Value::Null,
            Condition::IsNotNull => op("not", Value::Null),
        }
    }
}

/// 过滤条件集合
///
/// 按字段名有序存储，因此序列化结果与构造顺序无关。
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Filter(BTreeMap<String, Condition>);

impl Filter {
    pub fn new() -> Self {
        Self::default()
    }

    /// 主键过滤
    pub fn by_id(id: impl Into<String>) -> Self {
        Self::new().eq("id", id.into())
    }

    /// 追加等值条件
    pub fn eq(self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        let value = value.into();
        let condition = if value.is_null() {
            Condition::IsNull
        } else {
            Condition::Equals(value)
        };
        self.with(field, condition)
    }

    pub fn with(mut self, field: impl Into<String>, condition: Condition) -> Self {
        self.0.insert(field.into(), condition);
        self
    }

    /// 从 Prisma 风格的 JSON 对象解析
    pub fn from_json(value: Value) -> Result<Self, QueryError> {
        let Value::Object(map) = value else {
            return Err(QueryError::NotAnObject);
        };
        let mut conditions = BTreeMap::new();
        for (field, raw) in map {
            validate_field(&field)?;
            let condition = Condition::parse(&field, raw)?;
            conditions.insert(field, condition);
        }
        Ok(Self(conditions))
    }

    pub fn get(&self, field: &str) -> Option<&Condition> {
        self.0.get(field)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Condition)> {
        self.0.iter()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn to_value(&self) -> Value {
        Value::Object(
            self.0
                .iter()
                .map(|(field, condition)| (field.clone(), condition.to_value()))
                .collect(),
        )
    }
}

impl Serialize for Filter {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.to_value().serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for Filter {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = Value::deserialize(deserializer)?;
        Filter::from_json(value).map_err(de::Error::custom)
    }
}

/// 校验字段名，仅允许标识符字符
pub fn validate_field(field: &str) -> Result<(), QueryError> {
    let mut chars = field.chars();
    let valid_head = chars
        .next()
        .map(|c| c.is_ascii_alphabetic() || c == '_')
        .unwrap_or(false);
    if valid_head && chars.all(|c| c.is_ascii_alphanumeric() || c == '_') {
        Ok(())
    } else {
        Err(QueryError::InvalidField(field.to_string()))
    }
}

/// 排序方向
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    #[default]
    Asc,
    Desc,
}

impl SortOrder {
    pub fn as_str(&self) -> &'static str {
        match self {
            SortOrder::Asc => "asc",
            SortOrder::Desc => "desc",
        }
    }
}

/// 排序字段
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderBy {
    pub field: String,
    pub direction: SortOrder,
}

impl OrderBy {
    pub fn asc(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            direction: SortOrder::Asc,
        }
    }

    pub fn desc(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            direction: SortOrder::Desc,
        }
    }
}

/// 列表查询参数
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FindManyArgs {
    #[serde(default, rename = "where")]
    pub filter: Filter,
    #[serde(default, rename = "orderBy")]
    pub order_by: Vec<OrderBy>,
    #[serde(default)]
    pub skip: Option<u64>,
    #[serde(default)]
    pub take: Option<u64>,
}

impl FindManyArgs {
    pub fn new(filter: Filter) -> Self {
        Self {
            filter,
            ..Default::default()
        }
    }

    pub fn order_by(mut self, order: OrderBy) -> Self {
        self.order_by.push(order);
        self
    }

    pub fn skip(mut self, skip: u64) -> Self {
        self.skip = Some(skip);
        self
    }

    pub fn take(mut self, take: u64) -> Self {
        self.take = Some(take);
        self
    }
}
