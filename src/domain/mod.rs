// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// 领域层模块
///
/// 该模块包含数据访问层的核心抽象，包括：
/// - 领域模型（models）：实体、查询与写操作
/// - 仓库接口（repositories）：持久化适配器与缓存存储的抽象接口
pub mod models;
pub mod repositories;
