// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use metrics::{counter, describe_counter};

/// 注册缓存相关指标的描述
///
/// 只负责描述指标，导出器（recorder）由宿主进程安装。
pub fn describe_metrics() {
    describe_counter!(
        "gscms_cache_hits_total",
        "Total number of read-through cache hits"
    );
    describe_counter!(
        "gscms_cache_misses_total",
        "Total number of read-through cache misses"
    );
    describe_counter!(
        "gscms_cache_errors_total",
        "Total number of cache store failures degraded to misses"
    );
    describe_counter!(
        "gscms_cache_invalidated_keys_total",
        "Total number of cache keys removed by post-write invalidation"
    );
    describe_counter!(
        "gscms_cache_invalidation_failures_total",
        "Total number of failed post-write invalidations"
    );
}

pub fn record_cache_hit(entity: &'static str, view: &'static str) {
    counter!("gscms_cache_hits_total", "entity" => entity, "view" => view).increment(1);
}

pub fn record_cache_miss(entity: &'static str, view: &'static str) {
    counter!("gscms_cache_misses_total", "entity" => entity, "view" => view).increment(1);
}

pub fn record_cache_error(backend: &'static str, operation: &'static str) {
    counter!("gscms_cache_errors_total", "backend" => backend, "operation" => operation)
        .increment(1);
}

pub fn record_invalidated_keys(entity: &'static str, count: u64) {
    counter!("gscms_cache_invalidated_keys_total", "entity" => entity).increment(count);
}

pub fn record_invalidation_failure(entity: &'static str) {
    counter!("gscms_cache_invalidation_failures_total", "entity" => entity).increment(1);
}
