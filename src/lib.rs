// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

//! GS-CMS 数据层
//!
//! 在可插拔的持久化适配器（关系型数据库或远程 REST 服务）之前
//! 提供旁路读穿缓存，并在写入成功后按声明式依赖表使缓存失效。

/// 应用程序模块
///
/// 带缓存的查询服务与数据层装配
pub mod application;

/// 配置模块
///
/// 处理数据层的配置设置和环境变量
pub mod config;

/// 领域模块
///
/// 包含实体、查询模型以及持久化与缓存的接口
pub mod domain;

/// 基础设施模块
///
/// 提供外部服务集成，如数据库、缓存等
pub mod infrastructure;

/// 工具模块
///
/// 提供通用的工具函数和辅助功能
pub mod utils;

pub use application::{CachedQueryService, DataLayer, TtlPolicy};
pub use domain::models::{
    AdapterOperation, Condition, EntityType, Filter, FindManyArgs, OperationKind,
    OperationOutput, OrderBy, Record, SortOrder,
};
pub use domain::repositories::{
    AdapterError, AdapterKind, CacheError, CacheStore, CacheStoreExt, PersistenceAdapter,
};
