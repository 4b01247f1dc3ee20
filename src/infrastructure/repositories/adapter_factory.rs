// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use std::sync::Arc;
use tracing::info;

use super::relational_adapter::RelationalAdapter;
use super::remote_adapter::RemoteAdapter;
use crate::config::settings::Settings;
use crate::domain::repositories::persistence_adapter::{
    AdapterError, AdapterKind, PersistenceAdapter,
};

/// 按配置创建持久化适配器
///
/// 每个进程只调用一次；返回的适配器在进程生命周期内保持不变。
/// 关系型适配器的连接池在首次查询时才建立。
pub fn create_adapter(settings: &Settings) -> Result<Arc<dyn PersistenceAdapter>, AdapterError> {
    let adapter: Arc<dyn PersistenceAdapter> = match settings.database.adapter {
        AdapterKind::Relational => {
            if settings.database.url.is_empty() {
                return Err(AdapterError::Configuration(
                    "database.url is not set".to_string(),
                ));
            }
            Arc::new(RelationalAdapter::new(settings.database.clone()))
        }
        AdapterKind::RemoteService => Arc::new(RemoteAdapter::new(&settings.remote)?),
    };

    info!(
        "Using {} persistence adapter (atomic transactions: {})",
        adapter.kind(),
        adapter.supports_atomic_transaction()
    );
    Ok(adapter)
}
