// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// 领域模型模块
///
/// 该模块定义了数据访问层的核心数据结构，包括：
/// - 实体（entity）：实体类型与不透明的业务记录
/// - 查询（query）：过滤条件、排序与分页参数
/// - 操作（operation）：派发给持久化适配器的写操作
/// - 视图（views）：可缓存的聚合视图
pub mod entity;
pub mod operation;
pub mod query;
pub mod views;

pub use entity::{EntityType, Record};
pub use operation::{AdapterOperation, OperationKind, OperationOutput};
pub use query::{Condition, Filter, FindManyArgs, OrderBy, QueryError, SortOrder};
pub use views::{InquiryWithItems, UserWorkload};
