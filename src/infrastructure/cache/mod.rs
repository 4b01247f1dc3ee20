// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// 缓存模块
///
/// 提供缓存存储的各个后端实现（Redis、REST、进程内、空实现），
/// 以及缓存键规则与写后失效规划
pub mod factory;
pub mod invalidation;
pub mod keys;
pub mod memory_store;
pub mod redis_client;
pub mod rest_client;

pub use factory::create_cache_store;
pub use memory_store::{MemoryCacheStore, NoopCacheStore};
pub use redis_client::RedisCacheStore;
pub use rest_client::RestCacheStore;
