// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use sea_orm::sea_query::{
    Alias, Asterisk, Cond, DeleteStatement, Expr, InsertStatement, Keyword, LikeExpr, Order,
    Query, SelectStatement, SimpleExpr, UpdateStatement,
};
use serde_json::Value;

use crate::domain::models::entity::{EntityType, Record};
use crate::domain::models::query::{
    validate_field, Condition, Filter, FindManyArgs, QueryError, SortOrder,
};

/// 计数查询的结果列名
pub const COUNT_COLUMN: &str = "count";

/// JSON 值转换为 SQL 表达式
///
/// 整数优先按 i64 绑定，数组与对象按 JSON 绑定，`null` 直接写入关键字。
pub fn value_expr(value: &Value) -> SimpleExpr {
    match value {
        Value::Null => SimpleExpr::Keyword(Keyword::Null),
        Value::Bool(b) => (*b).into(),
        Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                i.into()
            } else if let Some(u) = n.as_u64() {
                u.into()
            } else {
                n.as_f64().unwrap_or_default().into()
            }
        }
        Value::String(s) => s.clone().into(),
        other => SimpleExpr::Value(sea_orm::sea_query::Value::Json(Some(Box::new(
            other.clone(),
        )))),
    }
}

fn condition_expr(field: &str, condition: &Condition) -> SimpleExpr {
    let column = Expr::col(Alias::new(field));
    match condition {
        Condition::Equals(v) => column.eq(value_expr(v)),
        Condition::Not(v) => column.ne(value_expr(v)),
        Condition::In(values) => column.is_in(values.iter().map(value_expr)),
        Condition::NotIn(values) => column.is_not_in(values.iter().map(value_expr)),
        Condition::Gt(v) => column.gt(value_expr(v)),
        Condition::Gte(v) => column.gte(value_expr(v)),
        Condition::Lt(v) => column.lt(value_expr(v)),
        Condition::Lte(v) => column.lte(value_expr(v)),
        Condition::Contains(s) => {
            column.like(LikeExpr::new(format!("%{}%", escape_like(s))).escape('\\'))
        }
        Condition::IsNull => column.is_null(),
        Condition::IsNotNull => column.is_not_null(),
    }
}

fn escape_like(s: &str) -> String {
    let mut escaped = String::with_capacity(s.len());
    for c in s.chars() {
        if matches!(c, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

/// 过滤条件转换为 WHERE 子句（各字段条件以 AND 连接）
pub fn where_clause(filter: &Filter) -> Result<Cond, QueryError> {
    let mut cond = Cond::all();
    for (field, condition) in filter.iter() {
        validate_field(field)?;
        cond = cond.add(condition_expr(field, condition));
    }
    Ok(cond)
}

/// `SELECT *`，带过滤、排序与分页
pub fn select(entity: EntityType, args: &FindManyArgs) -> Result<SelectStatement, QueryError> {
    let mut stmt = Query::select();
    stmt.column(Asterisk)
        .from(Alias::new(entity.table()))
        .cond_where(where_clause(&args.filter)?);

    for order in &args.order_by {
        validate_field(&order.field)?;
        let direction = match order.direction {
            SortOrder::Asc => Order::Asc,
            SortOrder::Desc => Order::Desc,
        };
        stmt.order_by(Alias::new(order.field.as_str()), direction);
    }

    if let Some(take) = args.take {
        stmt.limit(take);
    }
    if let Some(skip) = args.skip {
        stmt.offset(skip);
    }
    Ok(stmt)
}

/// 按过滤条件取第一条
pub fn select_one(entity: EntityType, filter: &Filter) -> Result<SelectStatement, QueryError> {
    let mut stmt = select(entity, &FindManyArgs::new(filter.clone()))?;
    stmt.limit(1);
    Ok(stmt)
}

/// `SELECT COUNT(*) AS count`
pub fn count(entity: EntityType, filter: &Filter) -> Result<SelectStatement, QueryError> {
    let mut stmt = Query::select();
    stmt.expr_as(Expr::col(Asterisk).count(), Alias::new(COUNT_COLUMN))
        .from(Alias::new(entity.table()))
        .cond_where(where_clause(filter)?);
    Ok(stmt)
}

/// `INSERT ... RETURNING *`
pub fn insert(entity: EntityType, data: &Record) -> Result<InsertStatement, QueryError> {
    let mut columns = Vec::new();
    let mut values = Vec::new();
    for (field, value) in data.fields() {
        validate_field(field)?;
        columns.push(Alias::new(field.as_str()));
        values.push(value_expr(value));
    }

    let mut stmt = Query::insert();
    stmt.into_table(Alias::new(entity.table()))
        .columns(columns)
        .values(values)
        .map_err(|e| QueryError::InvalidField(e.to_string()))?
        .returning_all();
    Ok(stmt)
}

fn assignments(data: &Record) -> Result<Vec<(Alias, SimpleExpr)>, QueryError> {
    data.fields()
        .map(|(field, value)| {
            validate_field(field)?;
            Ok((Alias::new(field.as_str()), value_expr(value)))
        })
        .collect()
}

/// 按主键更新单行，`RETURNING *`
pub fn update_by_id(
    entity: EntityType,
    id: &str,
    data: &Record,
) -> Result<UpdateStatement, QueryError> {
    let mut stmt = Query::update();
    stmt.table(Alias::new(entity.table()))
        .values(assignments(data)?)
        .and_where(Expr::col(Alias::new("id")).eq(id))
        .returning_all();
    Ok(stmt)
}

/// 按过滤条件批量更新
pub fn update_where(
    entity: EntityType,
    filter: &Filter,
    data: &Record,
) -> Result<UpdateStatement, QueryError> {
    let mut stmt = Query::update();
    stmt.table(Alias::new(entity.table()))
        .values(assignments(data)?)
        .cond_where(where_clause(filter)?);
    Ok(stmt)
}

/// 按主键删除单行
pub fn delete_by_id(entity: EntityType, id: &str) -> DeleteStatement {
    let mut stmt = Query::delete();
    stmt.from_table(Alias::new(entity.table()))
        .and_where(Expr::col(Alias::new("id")).eq(id));
    stmt
}
