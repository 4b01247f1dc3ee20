// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use async_trait::async_trait;
use reqwest::{Method, RequestBuilder, Response};
use serde::Deserialize;
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::config::settings::RemoteSettings;
use crate::domain::models::entity::{EntityType, Record};
use crate::domain::models::operation::{AdapterOperation, OperationOutput};
use crate::domain::models::query::{validate_field, Condition, Filter, FindManyArgs, QueryError};
use crate::domain::repositories::persistence_adapter::{
    AdapterError, AdapterKind, PersistenceAdapter,
};

/// PostgREST 错误响应体
#[derive(Debug, Deserialize)]
struct RemoteErrorBody {
    #[serde(default)]
    code: Option<String>,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    details: Option<String>,
}

/// 远程服务持久化适配器
///
/// 将统一的 CRUD 接口映射为 PostgREST（Supabase）按表划分的 REST 调用。
/// 后端不支持跨请求事务，`transaction` 顺序执行且不保证原子性。
pub struct RemoteAdapter {
    /// HTTP 客户端
    client: reqwest::Client,
    /// `{url}/rest/v1`
    base_url: String,
    /// API 密钥
    api_key: String,
    /// 数据库 schema
    schema: String,
}

impl RemoteAdapter {
    /// 创建新的远程适配器
    ///
    /// # 参数
    ///
    /// * `settings` - 远程服务配置，必须包含项目URL与API密钥
    ///
    /// # 返回值
    ///
    /// * `Ok(RemoteAdapter)` - 适配器实例
    /// * `Err(AdapterError)` - 配置缺失或 HTTP 客户端构造失败
    pub fn new(settings: &RemoteSettings) -> Result<Self, AdapterError> {
        let url = settings
            .url
            .as_deref()
            .ok_or_else(|| AdapterError::Configuration("remote.url is not set".to_string()))?;
        let api_key = settings
            .api_key
            .as_deref()
            .ok_or_else(|| AdapterError::Configuration("remote.api_key is not set".to_string()))?;

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(settings.timeout_seconds))
            .build()?;

        Ok(Self {
            client,
            base_url: format!("{}/rest/v1", url.trim_end_matches('/')),
            api_key: api_key.to_string(),
            schema: settings.schema.clone(),
        })
    }

    fn request(&self, method: Method, entity: EntityType) -> RequestBuilder {
        let profile_header = if method == Method::GET || method == Method::HEAD {
            "Accept-Profile"
        } else {
            "Content-Profile"
        };

        self.client
            .request(method, format!("{}/{}", self.base_url, entity.table()))
            .header("apikey", &self.api_key)
            .bearer_auth(&self.api_key)
            .header(profile_header, &self.schema)
    }

    async fn send(&self, request: RequestBuilder) -> Result<Response, AdapterError> {
        let response = request.send().await?;
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        let (code, message) = match serde_json::from_str::<RemoteErrorBody>(&body) {
            Ok(err) => {
                let message = match (err.message, err.details) {
                    (Some(message), Some(details)) => format!("{} ({})", message, details),
                    (Some(message), None) => message,
                    (None, _) => body.clone(),
                };
                (err.code, message)
            }
            Err(_) => (None, body),
        };

        Err(AdapterError::Remote {
            status: status.as_u16(),
            code,
            message,
        })
    }

    async fn records(&self, request: RequestBuilder) -> Result<Vec<Record>, AdapterError> {
        let response = self.send(request).await?;
        let rows: Vec<Record> = response.json().await?;
        Ok(rows)
    }

    async fn locate(&self, entity: EntityType, filter: &Filter) -> Result<String, AdapterError> {
        let record = self
            .find_unique(entity, filter)
            .await?
            .ok_or(AdapterError::NotFound { entity })?;
        record
            .id()
            .map(str::to_string)
            .ok_or_else(|| AdapterError::InvalidPayload(format!("{} row without id", entity)))
    }
}

/// 标量的 PostgREST 文本表示
fn scalar(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => "null".to_string(),
        other => other.to_string(),
    }
}

/// `in.(...)` 列表，字符串一律加引号
fn list(values: &[Value]) -> String {
    let items = values
        .iter()
        .map(|v| match v {
            Value::String(s) => format!("\"{}\"", s.replace('\\', "\\\\").replace('"', "\\\"")),
            other => scalar(other),
        })
        .collect::<Vec<_>>()
        .join(",");
    format!("({})", items)
}

/// 转义 `like` 模式中的通配符，与关系型后端的 `contains` 语义一致
fn escape_like(s: &str) -> String {
    let mut escaped = String::with_capacity(s.len());
    for c in s.chars() {
        if matches!(c, '\\' | '%' | '_' | '*') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

/// 过滤条件编码为 `column=op.value` 查询参数
pub fn filter_params(filter: &Filter) -> Result<Vec<(String, String)>, QueryError> {
    filter
        .iter()
        .map(|(field, condition)| {
            validate_field(field)?;
            let encoded = match condition {
                Condition::Equals(v) => format!("eq.{}", scalar(v)),
                Condition::Not(v) => format!("neq.{}", scalar(v)),
                Condition::In(values) => format!("in.{}", list(values)),
                Condition::NotIn(values) => format!("not.in.{}", list(values)),
                Condition::Gt(v) => format!("gt.{}", scalar(v)),
                Condition::Gte(v) => format!("gte.{}", scalar(v)),
                Condition::Lt(v) => format!("lt.{}", scalar(v)),
                Condition::Lte(v) => format!("lte.{}", scalar(v)),
                Condition::Contains(s) => format!("like.*{}*", escape_like(s)),
                Condition::IsNull => "is.null".to_string(),
                Condition::IsNotNull => "not.is.null".to_string(),
            };
            Ok((field.clone(), encoded))
        })
        .collect()
}

/// 列表查询参数：过滤、`order`、`offset`、`limit`
pub fn query_params(args: &FindManyArgs) -> Result<Vec<(String, String)>, QueryError> {
    let mut params = vec![("select".to_string(), "*".to_string())];
    params.extend(filter_params(&args.filter)?);

    if !args.order_by.is_empty() {
        let mut order = Vec::with_capacity(args.order_by.len());
        for o in &args.order_by {
            validate_field(&o.field)?;
            order.push(format!("{}.{}", o.field, o.direction.as_str()));
        }
        params.push(("order".to_string(), order.join(",")));
    }
    if let Some(skip) = args.skip {
        params.push(("offset".to_string(), skip.to_string()));
    }
    if let Some(take) = args.take {
        params.push(("limit".to_string(), take.to_string()));
    }
    Ok(params)
}

/// 从 `Content-Range`（如 `0-24/3573` 或 `*/0`）中解析总数
fn content_range_total(response: &Response) -> Result<u64, AdapterError> {
    response
        .headers()
        .get("content-range")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.rsplit('/').next())
        .and_then(|total| total.parse().ok())
        .ok_or_else(|| AdapterError::InvalidPayload("missing exact count in Content-Range".to_string()))
}

fn first(entity: EntityType, rows: Vec<Record>) -> Result<Record, AdapterError> {
    rows.into_iter()
        .next()
        .ok_or(AdapterError::NotFound { entity })
}

#[async_trait]
impl PersistenceAdapter for RemoteAdapter {
    fn kind(&self) -> AdapterKind {
        AdapterKind::RemoteService
    }

    fn supports_atomic_transaction(&self) -> bool {
        false
    }

    async fn find_unique(
        &self,
        entity: EntityType,
        filter: &Filter,
    ) -> Result<Option<Record>, AdapterError> {
        let params = query_params(&FindManyArgs::new(filter.clone()).take(1))?;
        let rows = self
            .records(self.request(Method::GET, entity).query(&params))
            .await?;
        Ok(rows.into_iter().next())
    }

    async fn find_many(
        &self,
        entity: EntityType,
        args: &FindManyArgs,
    ) -> Result<Vec<Record>, AdapterError> {
        let params = query_params(args)?;
        self.records(self.request(Method::GET, entity).query(&params))
            .await
    }

    async fn create(&self, entity: EntityType, data: &Record) -> Result<Record, AdapterError> {
        let mut data = data.clone();
        if data.id().is_none() {
            data.insert("id", Uuid::new_v4().to_string());
        }

        let request = self
            .request(Method::POST, entity)
            .header("Prefer", "return=representation")
            .json(&data);
        first(entity, self.records(request).await?)
    }

    async fn update(
        &self,
        entity: EntityType,
        filter: &Filter,
        data: &Record,
    ) -> Result<Record, AdapterError> {
        let id = self.locate(entity, filter).await?;
        let request = self
            .request(Method::PATCH, entity)
            .query(&[("id", format!("eq.{}", id))])
            .header("Prefer", "return=representation")
            .json(data);
        first(entity, self.records(request).await?)
    }

    async fn update_many(
        &self,
        entity: EntityType,
        filter: &Filter,
        data: &Record,
    ) -> Result<u64, AdapterError> {
        let request = self
            .request(Method::PATCH, entity)
            .query(&filter_params(filter)?)
            .header("Prefer", "return=minimal,count=exact")
            .json(data);
        let response = self.send(request).await?;
        content_range_total(&response)
    }

    async fn delete(&self, entity: EntityType, filter: &Filter) -> Result<Record, AdapterError> {
        let id = self.locate(entity, filter).await?;
        let request = self
            .request(Method::DELETE, entity)
            .query(&[("id", format!("eq.{}", id))])
            .header("Prefer", "return=representation");
        first(entity, self.records(request).await?)
    }

    async fn count(&self, entity: EntityType, filter: &Filter) -> Result<u64, AdapterError> {
        let request = self
            .request(Method::HEAD, entity)
            .query(&[("select", "*")])
            .query(&filter_params(filter)?)
            .header("Prefer", "count=exact");
        let response = self.send(request).await?;
        content_range_total(&response)
    }

    async fn transaction(
        &self,
        operations: Vec<AdapterOperation>,
    ) -> Result<Vec<OperationOutput>, AdapterError> {
        warn!(
            "Remote service backend cannot run {} operations atomically; executing sequentially",
            operations.len()
        );

        let mut outputs = Vec::with_capacity(operations.len());
        for (index, operation) in operations.iter().enumerate() {
            match self.execute(operation).await {
                Ok(output) => outputs.push(output),
                Err(e) => {
                    warn!(
                        "Sequential batch stopped at operation {} ({} {}); {} earlier writes remain applied: {}",
                        index,
                        operation.kind.name(),
                        operation.entity,
                        index,
                        e
                    );
                    return Err(e);
                }
            }
        }
        debug!("Executed {} operations sequentially", outputs.len());
        Ok(outputs)
    }
}
