// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// 配置模块
///
/// 处理数据层的配置设置，包括持久化后端、远程服务与缓存配置
pub mod settings;
