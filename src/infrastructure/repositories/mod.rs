// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// 持久化适配器实现模块
///
/// 提供领域层 `PersistenceAdapter` 的两种后端实现：
/// 关系型数据库（SeaORM）与远程 REST 服务（PostgREST）
pub mod adapter_factory;
pub mod relational_adapter;
pub mod remote_adapter;

pub use adapter_factory::create_adapter;
pub use relational_adapter::RelationalAdapter;
pub use remote_adapter::RemoteAdapter;
