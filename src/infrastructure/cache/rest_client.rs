// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{json, Value};
use std::time::Duration;
use tracing::debug;

use crate::domain::repositories::cache_store::{CacheError, CacheStore};

/// 每轮 SCAN 建议返回的键数量
const SCAN_BATCH: usize = 500;

/// REST 命令响应
#[derive(Debug, Deserialize)]
struct CommandResponse {
    #[serde(default)]
    result: Option<Value>,
    #[serde(default)]
    error: Option<String>,
}

/// REST 缓存
///
/// 兼容 Upstash 的 HTTP 缓存服务：每条命令以 JSON 数组 POST 到服务地址，
/// 通过 Bearer token 认证。命令逐条发送，不做流水线。
pub struct RestCacheStore {
    /// HTTP 客户端
    client: reqwest::Client,
    /// 服务地址
    url: String,
    /// 访问凭据
    token: String,
    /// 单次调用超时
    timeout: Duration,
}

impl RestCacheStore {
    pub fn new(url: &str, token: &str, timeout: Duration) -> Result<Self, CacheError> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;

        Ok(Self {
            client,
            url: url.trim_end_matches('/').to_string(),
            token: token.to_string(),
            timeout,
        })
    }

    /// 执行一条命令并返回 `result`
    async fn command(&self, args: Value) -> Result<Value, CacheError> {
        let response = self
            .client
            .post(&self.url)
            .bearer_auth(&self.token)
            .json(&args)
            .send()
            .await
            .map_err(|e| self.transport_error(e))?;

        let status = response.status();
        let body: CommandResponse = match response.json().await {
            Ok(body) => body,
            Err(e) if status.is_success() => return Err(self.transport_error(e)),
            Err(_) => {
                return Err(CacheError::Protocol(format!(
                    "cache service responded with status {}",
                    status
                )))
            }
        };

        if let Some(error) = body.error {
            return Err(CacheError::Protocol(error));
        }
        if !status.is_success() {
            return Err(CacheError::Protocol(format!(
                "cache service responded with status {}",
                status
            )));
        }
        Ok(body.result.unwrap_or(Value::Null))
    }

    fn transport_error(&self, err: reqwest::Error) -> CacheError {
        if err.is_timeout() {
            CacheError::Timeout(self.timeout.as_millis() as u64)
        } else {
            CacheError::Http(err)
        }
    }

    async fn scan(&self, pattern: &str) -> Result<Vec<String>, CacheError> {
        let mut cursor = "0".to_string();
        let mut keys = Vec::new();

        loop {
            let result = self
                .command(json!(["SCAN", cursor, "MATCH", pattern, "COUNT", SCAN_BATCH]))
                .await?;

            let (next, batch) = match result {
                Value::Array(mut parts) if parts.len() == 2 => {
                    let batch = parts.pop().unwrap_or(Value::Null);
                    let next = parts.pop().unwrap_or(Value::Null);
                    (next, batch)
                }
                other => {
                    return Err(CacheError::Protocol(format!(
                        "unexpected SCAN reply: {}",
                        other
                    )))
                }
            };

            if let Value::Array(batch) = batch {
                keys.extend(
                    batch
                        .into_iter()
                        .filter_map(|k| k.as_str().map(str::to_string)),
                );
            }

            cursor = match next {
                Value::String(s) => s,
                Value::Number(n) => n.to_string(),
                other => {
                    return Err(CacheError::Protocol(format!(
                        "unexpected SCAN cursor: {}",
                        other
                    )))
                }
            };
            if cursor == "0" {
                break;
            }
        }

        keys.sort();
        keys.dedup();
        Ok(keys)
    }
}

fn as_integer(value: &Value) -> Result<i64, CacheError> {
    match value {
        Value::Number(n) => n
            .as_i64()
            .ok_or_else(|| CacheError::Protocol(format!("expected integer, got {}", n))),
        Value::String(s) => s
            .parse()
            .map_err(|_| CacheError::Protocol(format!("expected integer, got {}", s))),
        other => Err(CacheError::Protocol(format!(
            "expected integer, got {}",
            other
        ))),
    }
}

#[async_trait]
impl CacheStore for RestCacheStore {
    fn name(&self) -> &'static str {
        "rest"
    }

    async fn get_raw(&self, key: &str) -> Result<Option<String>, CacheError> {
        match self.command(json!(["GET", key])).await? {
            Value::Null => Ok(None),
            Value::String(s) => Ok(Some(s)),
            other => Ok(Some(other.to_string())),
        }
    }

    async fn set_raw(&self, key: &str, value: &str, ttl_seconds: u64) -> Result<(), CacheError> {
        let args = if ttl_seconds > 0 {
            json!(["SET", key, value, "EX", ttl_seconds])
        } else {
            json!(["SET", key, value])
        };
        self.command(args).await?;
        Ok(())
    }

    async fn del(&self, keys: &[String]) -> Result<u64, CacheError> {
        if keys.is_empty() {
            return Ok(0);
        }
        let mut args = vec![Value::from("DEL")];
        args.extend(keys.iter().map(|k| Value::from(k.as_str())));

        let removed = as_integer(&self.command(Value::Array(args)).await?)?;
        Ok(removed.max(0) as u64)
    }

    async fn clear_pattern(&self, pattern: &str) -> Result<u64, CacheError> {
        let keys = self.scan(pattern).await?;
        let removed = self.del(&keys).await?;
        debug!("Cleared {} rest cache keys matching {}", removed, pattern);
        Ok(removed)
    }

    async fn exists(&self, key: &str) -> Result<bool, CacheError> {
        Ok(as_integer(&self.command(json!(["EXISTS", key])).await?)? > 0)
    }

    async fn ttl(&self, key: &str) -> Result<Option<u64>, CacheError> {
        let ttl = as_integer(&self.command(json!(["TTL", key])).await?)?;
        Ok(u64::try_from(ttl).ok())
    }

    async fn incr(&self, key: &str) -> Result<i64, CacheError> {
        as_integer(&self.command(json!(["INCR", key])).await?)
    }
}
