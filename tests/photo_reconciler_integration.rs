//! Integration tests for the photo reconciler
//!
//! Settle-all commit, write-through delete and promote, capacity

use std::sync::Arc;
use std::time::Duration;

use elove::core::{FailurePlan, MemoryService, PhotoReconciler};
use elove::types::{EncodedImage, Error, ValidationError};
use pretty_assertions::assert_eq;

fn owner_with_photos(n: usize) -> (Arc<MemoryService>, String) {
    let service = MemoryService::new();
    let owner = service.add_user("Owner", 30, "");
    for i in 0..n {
        service.add_photo(&owner, &format!("/uploads/seed_{i}.jpg"));
    }
    (Arc::new(service), owner)
}

fn ids(photos: &PhotoReconciler<MemoryService>) -> Vec<String> {
    photos.photos().iter().map(|p| p.id.clone()).collect()
}

fn fail_upload_of(payload: &str) -> FailurePlan {
    FailurePlan {
        upload_payloads: [payload.to_string()].into_iter().collect(),
        ..FailurePlan::default()
    }
}

#[tokio::test]
async fn test_load_all_replaces_wholesale() {
    let (service, owner) = owner_with_photos(2);
    let mut photos = PhotoReconciler::new(service.clone());
    photos.add_local("file:///x.jpg", EncodedImage::jpeg("XXXX")).unwrap();

    assert_eq!(photos.load_all(&owner).await.unwrap(), 2);
    assert_eq!(photos.new_count(), 0);
    assert_eq!(
        ids(&photos),
        service.stored_photos(&owner).into_iter().map(|p| p.id).collect::<Vec<_>>()
    );
}

#[tokio::test]
async fn test_partial_upload_failure_settles_all() {
    let service = MemoryService::new().with_latency(Duration::from_millis(20));
    let owner = service.add_user("Owner", 30, "");
    service.set_failures(fail_upload_of("TWO"));
    let service = Arc::new(service);

    let mut photos = PhotoReconciler::new(service.clone());
    photos.add_local("file:///1.jpg", EncodedImage::jpeg("ONE")).unwrap();
    let second = photos.add_local("file:///2.jpg", EncodedImage::jpeg("TWO")).unwrap().id.clone();
    photos.add_local("file:///3.jpg", EncodedImage::jpeg("THREE")).unwrap();

    let report = photos.commit_new_photos(&owner).await.unwrap();

    assert_eq!(report.uploaded_count, 2);
    assert_eq!(report.failed_count, 1);
    assert_eq!(report.failed_items.len(), 1);
    assert_eq!(report.failed_items[0].local_id, second);
    assert_eq!(report.failed_items[0].error.status_code, 500);
    assert_eq!(report.reload_error, None);
    assert_eq!(service.counters().uploads, 3);

    // Post-commit reload shows exactly what the server accepted
    assert_eq!(photos.len(), 2);
    assert_eq!(photos.new_count(), 0);
    assert_eq!(service.stored_photos(&owner).len(), 2);

    photos.load_all(&owner).await.unwrap();
    assert_eq!(photos.len(), 2);
}

#[tokio::test]
async fn test_reload_failure_keeps_uploaded_as_persisted() {
    let (service, owner) = owner_with_photos(0);
    service.set_failures(fail_upload_of("BAD"));
    let mut photos = PhotoReconciler::new(service.clone());
    let good = photos.add_local("file:///good.jpg", EncodedImage::jpeg("GOOD")).unwrap().id.clone();
    let bad = photos.add_local("file:///bad.jpg", EncodedImage::jpeg("BAD")).unwrap().id.clone();

    service.update_failures(|f| f.photo_fetches = true);
    let report = photos.commit_new_photos(&owner).await.unwrap();

    assert_eq!(report.uploaded_count, 1);
    let reload = report.reload_error.clone().unwrap();
    assert_eq!(reload.status_code, 0);
    assert!(!report.is_clean());

    // Uploaded entry now carries its server id; the failed one is still new
    let stored = service.stored_photos(&owner);
    assert_eq!(stored.len(), 1);
    assert!(photos.get(&good).is_none());
    assert!(!photos.get(&stored[0].id).unwrap().is_new);
    assert!(photos.get(&bad).unwrap().is_new);

    // A retry only uploads what is still new
    service.set_failures(FailurePlan::default());
    let retry = photos.commit_new_photos(&owner).await.unwrap();
    assert_eq!(retry.uploaded_count, 1);
    assert_eq!(service.counters().uploads, 3);
    assert_eq!(service.stored_photos(&owner).len(), 2);
}

#[tokio::test]
async fn test_failed_persisted_delete_leaves_collection() {
    let (service, owner) = owner_with_photos(3);
    let mut photos = PhotoReconciler::new(service.clone());
    photos.load_all(&owner).await.unwrap();
    let before = photos.photos().to_vec();
    let target = before[1].id.clone();

    service.update_failures(|f| f.deletes = true);
    let err = photos.remove(&owner, &target).await.unwrap_err();

    assert_eq!(err.info().message, "Failed to delete photo");
    assert_eq!(photos.photos(), before.as_slice());
    assert_eq!(service.stored_photos(&owner).len(), 3);
}

#[tokio::test]
async fn test_persisted_delete_writes_through() {
    let (service, owner) = owner_with_photos(2);
    let mut photos = PhotoReconciler::new(service.clone());
    photos.load_all(&owner).await.unwrap();
    let target = photos.photos()[0].id.clone();

    photos.remove(&owner, &target).await.unwrap();

    assert_eq!(service.counters().deletes, 1);
    assert_eq!(photos.len(), 1);
    assert!(service.stored_photos(&owner).iter().all(|p| p.id != target));
}

#[tokio::test]
async fn test_set_main_persisted_promotes_then_reorders() {
    let (service, owner) = owner_with_photos(3);
    let mut photos = PhotoReconciler::new(service.clone());
    photos.load_all(&owner).await.unwrap();
    let order = ids(&photos);

    photos.set_main(&owner, &order[2]).await.unwrap();

    assert_eq!(service.counters().promotes, 1);
    assert_eq!(ids(&photos), vec![order[2].clone(), order[0].clone(), order[1].clone()]);
    assert_eq!(photos.main_photo_id(), Some(order[2].as_str()));
    assert!(service.stored_photos(&owner)[0].is_main);
    assert_eq!(service.stored_photos(&owner)[0].id, order[2]);
}

#[tokio::test]
async fn test_set_main_failure_keeps_order() {
    let (service, owner) = owner_with_photos(2);
    let mut photos = PhotoReconciler::new(service.clone());
    photos.load_all(&owner).await.unwrap();
    let order = ids(&photos);

    service.update_failures(|f| f.promotes = true);
    assert!(photos.set_main(&owner, &order[1]).await.is_err());
    assert_eq!(ids(&photos), order);
}

#[tokio::test]
async fn test_set_main_new_photo_is_local() {
    let (service, owner) = owner_with_photos(1);
    let mut photos = PhotoReconciler::new(service.clone());
    photos.load_all(&owner).await.unwrap();
    let local = photos.add_local("file:///n.jpg", EncodedImage::jpeg("NEW")).unwrap().id.clone();

    photos.set_main(&owner, &local).await.unwrap();

    assert_eq!(service.counters().promotes, 0);
    assert_eq!(photos.main_photo_id(), Some(local.as_str()));
}

#[tokio::test]
async fn test_capacity_counts_persisted_and_new() {
    let (service, owner) = owner_with_photos(5);
    let mut photos = PhotoReconciler::new(service.clone());
    photos.load_all(&owner).await.unwrap();

    photos.add_local("file:///6.jpg", EncodedImage::jpeg("SIX")).unwrap();
    let err = photos.add_local("file:///7.jpg", EncodedImage::jpeg("SEVEN")).unwrap_err();

    assert_eq!(err, ValidationError::CapacityExceeded { cap: 6 });
    assert_eq!(photos.len(), 6);
}

#[tokio::test]
async fn test_load_failure_propagates() {
    let (service, owner) = owner_with_photos(2);
    let mut photos = PhotoReconciler::new(service.clone());
    service.update_failures(|f| f.photo_fetches = true);

    let err = photos.load_all(&owner).await.unwrap_err();
    assert!(matches!(err, Error::Transport(_)));
    assert!(photos.is_empty());
}
