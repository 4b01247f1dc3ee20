// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// 基础设施层模块
///
/// 该模块包含数据层的技术实现细节，负责与外部系统交互。
///
/// 包含的子模块：
/// - 缓存（cache）：缓存存储后端、缓存键规则与写后失效规划
/// - 数据库（database）：连接池与动态 SQL 语句
/// - 延迟初始化（lazy）：共享客户端的单次初始化
/// - 指标（metrics）：缓存命中、未命中与失效计数
/// - 仓库实现（repositories）：持久化适配器的具体实现
///
/// 基础设施层依赖于领域层的抽象接口，
/// 确保领域层保持纯粹的业务逻辑，不受技术实现的影响。
pub mod cache;
pub mod database;
pub mod lazy;
pub mod metrics;
pub mod repositories;
