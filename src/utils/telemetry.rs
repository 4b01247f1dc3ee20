// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use tracing_subscriber::util::TryInitError;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// 日志输出格式
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    /// 人类可读的单行文本
    Pretty,
    /// 每行一个 JSON 对象，便于日志平台采集
    Json,
}

impl LogFormat {
    /// 从 `GSCMS_LOG_FORMAT` 读取，未设置或无法识别时为 `Pretty`
    pub fn from_env() -> Self {
        match std::env::var("GSCMS_LOG_FORMAT") {
            Ok(v) if v.eq_ignore_ascii_case("json") => LogFormat::Json,
            _ => LogFormat::Pretty,
        }
    }
}

/// 安装全局 tracing 订阅者
///
/// 未设置 `RUST_LOG` 时默认 `info,gscms=debug`。重复调用返回错误而不是 panic。
pub fn init_telemetry() -> Result<(), TryInitError> {
    init_with_format(LogFormat::from_env())
}

pub fn init_with_format(format: LogFormat) -> Result<(), TryInitError> {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| "info,gscms=debug".into());
    let registry = tracing_subscriber::registry().with(filter);

    match format {
        LogFormat::Json => registry
            .with(tracing_subscriber::fmt::layer().json().with_current_span(false))
            .try_init(),
        LogFormat::Pretty => registry
            .with(tracing_subscriber::fmt::layer().with_target(true))
            .try_init(),
    }
}
