// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// 应用程序模块
///
/// 在持久化适配器与缓存存储之上提供带缓存的查询服务，
/// 以及数据层的启动装配
pub mod bootstrap;
pub mod cached_query;
pub mod ttl_policy;

pub use bootstrap::DataLayer;
pub use cached_query::CachedQueryService;
pub use ttl_policy::TtlPolicy;
