// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::integration::helpers::{record, FailingCacheStore, InMemoryAdapter};
use gscms::infrastructure::cache::MemoryCacheStore;
use gscms::{
    AdapterError, AdapterOperation, CacheStore, CachedQueryService, EntityType, Filter,
    FindManyArgs, OrderBy, Record, TtlPolicy,
};
use serde_json::json;
use std::sync::atomic::Ordering;
use std::sync::Arc;

struct Fixture {
    adapter: Arc<InMemoryAdapter>,
    cache: Arc<MemoryCacheStore>,
    service: CachedQueryService,
}

fn fixture_with(adapter: InMemoryAdapter) -> Fixture {
    let adapter = Arc::new(adapter);
    let cache = Arc::new(MemoryCacheStore::new());
    let service = CachedQueryService::new(adapter.clone(), cache.clone(), TtlPolicy::default());
    Fixture {
        adapter,
        cache,
        service,
    }
}

fn fixture() -> Fixture {
    let fx = fixture_with(InMemoryAdapter::new());
    fx.adapter.seed(
        EntityType::Inquiry,
        record(json!({"id": "inq-1", "title": "Flanges", "status": "PENDING", "priority": "HIGH"})),
    );
    fx.adapter.seed(
        EntityType::Inquiry,
        record(json!({"id": "inq-2", "title": "Bolts", "status": "PENDING", "priority": "LOW"})),
    );
    fx
}

#[tokio::test]
async fn test_get_by_id_reads_through_once() {
    let fx = fixture();

    let first = fx.service.get_by_id(EntityType::Inquiry, "inq-1").await.unwrap();
    let second = fx.service.get_by_id(EntityType::Inquiry, "inq-1").await.unwrap();

    assert_eq!(first, second);
    assert_eq!(first.unwrap().get_str("title"), Some("Flanges"));
    assert_eq!(fx.adapter.reads(), 1);
    assert!(fx.cache.exists("inquiry:inq-1").await.unwrap());
    assert!(matches!(fx.cache.ttl("inquiry:inq-1").await.unwrap(), Some(299..=300)));
}

#[tokio::test]
async fn test_missing_record_is_not_cached() {
    let fx = fixture();

    assert!(fx.service.get_by_id(EntityType::Inquiry, "nope").await.unwrap().is_none());
    assert!(fx.service.get_by_id(EntityType::Inquiry, "nope").await.unwrap().is_none());

    assert_eq!(fx.adapter.reads(), 2);
    assert!(fx.cache.is_empty());
}

#[tokio::test]
async fn test_update_is_visible_on_next_read() {
    let fx = fixture();
    let before = fx.service.get_by_id(EntityType::Inquiry, "inq-1").await.unwrap().unwrap();
    assert_eq!(before.get_str("status"), Some("PENDING"));

    let updated = fx
        .service
        .update(
            EntityType::Inquiry,
            Filter::by_id("inq-1"),
            Record::new().with("status", "QUOTED"),
        )
        .await
        .unwrap();
    assert_eq!(updated.get_str("status"), Some("QUOTED"));

    let after = fx.service.get_by_id(EntityType::Inquiry, "inq-1").await.unwrap().unwrap();
    assert_eq!(after.get_str("status"), Some("QUOTED"));
    assert_eq!(fx.adapter.reads(), 2);
}

#[tokio::test]
async fn test_equivalent_filters_share_one_list_entry() {
    let fx = fixture();
    let a = FindManyArgs::new(Filter::from_json(json!({"status": "PENDING", "priority": "HIGH"})).unwrap());
    let b = FindManyArgs::new(Filter::from_json(json!({"priority": "HIGH", "status": "PENDING"})).unwrap());

    let first = fx.service.get_list(EntityType::Inquiry, &a).await.unwrap();
    let second = fx.service.get_list(EntityType::Inquiry, &b).await.unwrap();

    assert_eq!(first, second);
    assert_eq!(first.len(), 1);
    assert_eq!(fx.adapter.reads(), 1);
    assert_eq!(fx.cache.keys().len(), 1);
    assert!(matches!(fx.cache.ttl(&fx.cache.keys()[0]).await.unwrap(), Some(59..=60)));
}

#[tokio::test]
async fn test_create_invalidates_lists_and_counts_of_its_type() {
    let fx = fixture();
    let args = FindManyArgs::new(Filter::new().eq("status", "PENDING")).order_by(OrderBy::asc("title"));
    let pending = Filter::new().eq("status", "PENDING");

    assert_eq!(fx.service.get_list(EntityType::Inquiry, &args).await.unwrap().len(), 2);
    assert_eq!(fx.service.get_count(EntityType::Inquiry, &pending).await.unwrap(), 2);

    fx.service
        .create(
            EntityType::Inquiry,
            Record::new().with("title", "Gaskets").with("status", "PENDING"),
        )
        .await
        .unwrap();

    let titles: Vec<String> = fx
        .service
        .get_list(EntityType::Inquiry, &args)
        .await
        .unwrap()
        .iter()
        .filter_map(|r| r.get_str("title").map(str::to_string))
        .collect();
    assert_eq!(titles, vec!["Bolts", "Flanges", "Gaskets"]);
    assert_eq!(fx.service.get_count(EntityType::Inquiry, &pending).await.unwrap(), 3);
}

#[tokio::test]
async fn test_failing_cache_degrades_to_adapter_reads() {
    let adapter = Arc::new(InMemoryAdapter::new());
    adapter.seed(EntityType::User, record(json!({"id": "u-1", "name": "Wang"})));
    let cache = Arc::new(FailingCacheStore::new());
    let service = CachedQueryService::new(adapter.clone(), cache.clone(), TtlPolicy::default());

    let user = service.get_by_id(EntityType::User, "u-1").await.unwrap().unwrap();
    assert_eq!(user.get_str("name"), Some("Wang"));
    let users = service
        .get_list(EntityType::User, &FindManyArgs::default())
        .await
        .unwrap();
    assert_eq!(users.len(), 1);

    let renamed = service
        .update(EntityType::User, Filter::by_id("u-1"), Record::new().with("name", "Li"))
        .await
        .unwrap();
    assert_eq!(renamed.get_str("name"), Some("Li"));
    assert_eq!(
        service.get_by_id(EntityType::User, "u-1").await.unwrap().unwrap().get_str("name"),
        Some("Li")
    );
    assert!(cache.calls.load(Ordering::SeqCst) > 0);
}

#[tokio::test]
async fn test_adapter_failure_leaves_cache_untouched() {
    let fx = fixture();
    fx.service.get_by_id(EntityType::Inquiry, "inq-1").await.unwrap();
    fx.service
        .get_list(EntityType::Inquiry, &FindManyArgs::default())
        .await
        .unwrap();
    let cached_before = fx.cache.keys();

    fx.adapter.fail_writes();
    let err = fx
        .service
        .update(
            EntityType::Inquiry,
            Filter::by_id("inq-1"),
            Record::new().with("status", "QUOTED"),
        )
        .await
        .unwrap_err();

    assert!(matches!(err, AdapterError::Remote { status: 409, .. }));
    assert_eq!(fx.cache.keys(), cached_before);
}

#[tokio::test]
async fn test_not_found_delete_propagates() {
    let fx = fixture();
    let err = fx
        .service
        .delete(EntityType::Inquiry, Filter::by_id("missing"))
        .await
        .unwrap_err();
    assert!(matches!(err, AdapterError::NotFound { entity: EntityType::Inquiry }));
}

#[tokio::test]
async fn test_item_write_refreshes_inquiry_views() {
    let fx = fixture();
    fx.adapter.seed(
        EntityType::InquiryItem,
        record(json!({"id": "it-1", "inquiry_id": "inq-1", "name": "DN50", "position": 1})),
    );

    let view = fx.service.inquiry_with_items("inq-1").await.unwrap().unwrap();
    assert_eq!(view.items.len(), 1);
    assert!(fx.cache.exists("inquiry:with_items:inq-1").await.unwrap());

    fx.service
        .create(
            EntityType::InquiryItem,
            Record::new()
                .with("inquiry_id", "inq-1")
                .with("name", "DN25")
                .with("position", 0),
        )
        .await
        .unwrap();

    assert!(!fx.cache.exists("inquiry:with_items:inq-1").await.unwrap());
    assert!(!fx.cache.exists("inquiry:inq-1").await.unwrap());

    let view = fx.service.inquiry_with_items("inq-1").await.unwrap().unwrap();
    let names: Vec<&str> = view.items.iter().filter_map(|i| i.get_str("name")).collect();
    assert_eq!(names, vec!["DN25", "DN50"]);
    assert!(fx.service.inquiry_with_items("inq-404").await.unwrap().is_none());
}

#[tokio::test]
async fn test_reassignment_refreshes_both_workloads() {
    let fx = fixture();
    fx.adapter.seed(
        EntityType::InquiryItem,
        record(json!({
            "id": "it-1", "inquiry_id": "inq-1", "status": "PENDING",
            "assigned_to": "u-1", "position": 0
        })),
    );
    fx.adapter.seed(
        EntityType::InquiryItem,
        record(json!({
            "id": "it-2", "inquiry_id": "inq-1", "status": "COMPLETED",
            "assigned_to": "u-1", "position": 1
        })),
    );

    assert_eq!(fx.service.user_workload("u-1").await.unwrap().total, 1);
    assert_eq!(fx.service.user_workload("u-2").await.unwrap().total, 0);

    fx.service
        .update(
            EntityType::InquiryItem,
            Filter::by_id("it-1"),
            Record::new().with("assigned_to", "u-2"),
        )
        .await
        .unwrap();

    let old_owner = fx.service.user_workload("u-1").await.unwrap();
    let new_owner = fx.service.user_workload("u-2").await.unwrap();
    assert_eq!(old_owner.total, 0);
    assert_eq!(new_owner.total, 1);
    assert_eq!(new_owner.by_status["PENDING"], 1);
}

#[tokio::test]
async fn test_id_shaped_like_view_key_is_not_served_a_view() {
    let fx = fixture();
    fx.adapter.seed(
        EntityType::InquiryItem,
        record(json!({
            "id": "it-1", "inquiry_id": "inq-1", "status": "PENDING",
            "assigned_to": "u-1", "position": 0
        })),
    );

    assert_eq!(fx.service.user_workload("u-1").await.unwrap().total, 1);

    let user = fx
        .service
        .get_by_id(EntityType::User, "workload:u-1")
        .await
        .unwrap();
    assert!(user.is_none());
    assert!(fx.cache.exists("user:workload:u-1").await.unwrap());
}

#[tokio::test]
async fn test_batch_invalidates_every_operation() {
    let fx = fixture();
    fx.service.get_by_id(EntityType::Inquiry, "inq-1").await.unwrap();
    fx.service.get_by_id(EntityType::Inquiry, "inq-2").await.unwrap();

    let outputs = fx
        .service
        .mutate_batch(vec![
            AdapterOperation::update(
                EntityType::Inquiry,
                Filter::by_id("inq-1"),
                Record::new().with("status", "CLOSED"),
            ),
            AdapterOperation::delete(EntityType::Inquiry, Filter::by_id("inq-2")),
        ])
        .await
        .unwrap();

    assert_eq!(outputs.len(), 2);
    assert!(fx.cache.is_empty());
    assert!(fx.service.get_by_id(EntityType::Inquiry, "inq-2").await.unwrap().is_none());
}

#[tokio::test]
async fn test_failed_atomic_batch_keeps_cache() {
    let fx = fixture();
    fx.service.get_by_id(EntityType::Inquiry, "inq-1").await.unwrap();
    fx.adapter.fail_writes_after(1);

    let result = fx
        .service
        .mutate_batch(vec![
            AdapterOperation::update(
                EntityType::Inquiry,
                Filter::by_id("inq-1"),
                Record::new().with("status", "CLOSED"),
            ),
            AdapterOperation::create(EntityType::Quote, Record::new().with("inquiry_id", "inq-1")),
        ])
        .await;

    assert!(result.is_err());
    assert!(fx.cache.exists("inquiry:inq-1").await.unwrap());
    let stored = fx.adapter.stored(EntityType::Inquiry, "inq-1").unwrap();
    assert_eq!(stored.get_str("status"), Some("PENDING"));
}

#[tokio::test]
async fn test_failed_non_atomic_batch_clears_touched_types() {
    let fx = fixture_with(InMemoryAdapter::non_atomic());
    fx.adapter.seed(
        EntityType::Inquiry,
        record(json!({"id": "inq-1", "title": "Flanges", "status": "PENDING"})),
    );
    fx.adapter.seed(
        EntityType::Approval,
        record(json!({"id": "ap-1", "status": "PENDING"})),
    );
    fx.service.get_by_id(EntityType::Inquiry, "inq-1").await.unwrap();
    fx.service.get_by_id(EntityType::Approval, "ap-1").await.unwrap();

    fx.adapter.fail_writes_after(1);
    let result = fx
        .service
        .mutate_batch(vec![
            AdapterOperation::create(
                EntityType::InquiryItem,
                Record::new().with("inquiry_id", "inq-1").with("name", "DN80"),
            ),
            AdapterOperation::create(EntityType::Quote, Record::new().with("inquiry_id", "inq-1")),
        ])
        .await;

    assert!(result.is_err());
    assert_eq!(fx.adapter.writes(), 1);
    assert!(!fx.cache.exists("inquiry:inq-1").await.unwrap());
    assert!(fx.cache.exists("approval:ap-1").await.unwrap());
}
