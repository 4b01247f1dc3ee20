// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use serde_json::{Map, Value};

use crate::domain::models::entity::EntityType;
use crate::domain::models::query::{Filter, FindManyArgs};

/// 计数视图的聚合名
pub const COUNT_AGGREGATE: &str = "count";

/// 键段中需要转义的字符：分隔符、通配符与转义符本身
const RESERVED: &[char] = &['%', ':', '*', '?', '[', ']', '\\'];

/// 对 id 或聚合主体做百分号编码
///
/// 编码后的段不含 `:`，不会与列表、计数或聚合视图的键重叠，
/// 也不会在 SCAN MATCH 中被当作通配符。普通 UUID 保持原样。
pub fn encode_segment(segment: &str) -> String {
    let mut encoded = String::with_capacity(segment.len());
    for c in segment.chars() {
        if RESERVED.contains(&c) {
            encoded.push_str(&format!("%{:02X}", c as u32));
        } else {
            encoded.push(c);
        }
    }
    encoded
}

/// 单条记录缓存键：`{entity}:{id}`
pub fn entity_key(entity: EntityType, id: &str) -> String {
    format!("{}:{}", entity, encode_segment(id))
}

/// 列表缓存键：`{entity}:list:{规范化过滤条件}:{skip}:{take}`
///
/// 指定排序时追加 `:{field.dir,...}`，使不同排序的结果互不覆盖。
pub fn list_key(entity: EntityType, args: &FindManyArgs) -> String {
    let skip = args.skip.unwrap_or(0);
    let take = args
        .take
        .map(|take| take.to_string())
        .unwrap_or_else(|| "all".to_string());

    let mut key = format!(
        "{}:list:{}:{}:{}",
        entity,
        canonical_filter(&args.filter),
        skip,
        take
    );

    if !args.order_by.is_empty() {
        let order = args
            .order_by
            .iter()
            .map(|o| format!("{}.{}", o.field, o.direction.as_str()))
            .collect::<Vec<_>>()
            .join(",");
        key.push(':');
        key.push_str(&order);
    }
    key
}

/// 聚合视图缓存键：`{entity}:{aggregate}:{subject}`
pub fn aggregate_key(entity: EntityType, aggregate: &str, subject: &str) -> String {
    format!("{}:{}:{}", entity, aggregate, encode_segment(subject))
}

/// 计数缓存键：`{entity}:count:{规范化过滤条件}`
pub fn count_key(entity: EntityType, filter: &Filter) -> String {
    format!(
        "{}:{}:{}",
        entity,
        COUNT_AGGREGATE,
        canonical_filter(filter)
    )
}

/// 某类型全部缓存键
pub fn entity_pattern(entity: EntityType) -> String {
    format!("{}:*", entity)
}

/// 某类型全部列表缓存键
pub fn list_pattern(entity: EntityType) -> String {
    format!("{}:list:*", entity)
}

/// 某类型某个聚合视图的全部缓存键
pub fn aggregate_pattern(entity: EntityType, aggregate: &str) -> String {
    format!("{}:{}:*", entity, aggregate)
}

/// 过滤条件的规范化字符串
pub fn canonical_filter(filter: &Filter) -> String {
    canonical_json(&filter.to_value())
}

/// 规范化 JSON 序列化
///
/// 对象键递归按字典序排列，数组保持原顺序，输出紧凑格式。
/// 逻辑相同的值（仅键顺序不同）得到完全相同的字符串。
pub fn canonical_json(value: &Value) -> String {
    canonicalize(value).to_string()
}

fn canonicalize(value: &Value) -> Value {
    match value {
        Value::Object(map) => {
            let mut entries: Vec<(&String, &Value)> = map.iter().collect();
            entries.sort_by(|a, b| a.0.cmp(b.0));
            let mut sorted = Map::new();
            for (k, v) in entries {
                sorted.insert(k.clone(), canonicalize(v));
            }
            Value::Object(sorted)
        }
        Value::Array(items) => Value::Array(items.iter().map(canonicalize).collect()),
        other => other.clone(),
    }
}
