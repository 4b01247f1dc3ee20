// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// 仓库接口模块
///
/// 该模块定义了领域层依赖的两个抽象接口，具体实现由基础设施层提供：
/// - 持久化适配器（persistence_adapter）：统一的 CRUD 与事务接口
/// - 缓存存储（cache_store）：带过期时间的键值旁路缓存
pub mod cache_store;
pub mod persistence_adapter;

pub use cache_store::{CacheError, CacheStore, CacheStoreExt};
pub use persistence_adapter::{AdapterError, AdapterKind, PersistenceAdapter};
