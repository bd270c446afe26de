//! Upload, download, delete and listing scenarios for the backup service.

use std::sync::Arc;
use std::time::Duration;

use backup_store_core::storage::{
    collect_stream, FilesystemAdapter, MemoryAdapter, ObjectStorageAdapter,
};
use backup_store_core::{
    BackupGetter, BackupService, Error, ObjectBackupService, StorageError, StorageMetrics,
};
use bytes::Bytes;

use super::helpers::{archive, log, metadata_json, names, FaultyAdapter, Op};

const BUCKET: &str = "ark-backups";

fn service(adapter: &Arc<FaultyAdapter>) -> ObjectBackupService {
    ObjectBackupService::new(adapter.clone())
}

async fn upload(service: &ObjectBackupService, name: &str) -> backup_store_core::Result<()> {
    service
        .upload_backup(BUCKET, name, metadata_json(name), archive(name), log(name))
        .await
}

async fn exists(adapter: &FaultyAdapter, key: &str) -> bool {
    adapter.object_exists(BUCKET, key).await.unwrap()
}

#[tokio::test]
async fn test_upload_success_writes_triad() {
    let adapter = Arc::new(FaultyAdapter::new());
    let service = service(&adapter);

    upload(&service, "b1").await.unwrap();

    assert!(exists(&adapter, "b1/ark-backup.json").await);
    assert!(exists(&adapter, "b1/b1.tar.gz").await);
    assert!(exists(&adapter, "b1/b1.log.gz").await);
    assert!(adapter.deletes().is_empty());
}

#[tokio::test]
async fn test_metadata_failure_is_hard_stop() {
    let adapter = Arc::new(FaultyAdapter::new());
    adapter.fail(Op::Put, "b1/ark-backup.json");
    let service = service(&adapter);

    let err = upload(&service, "b1").await.unwrap_err();
    assert!(matches!(err, Error::Storage(StorageError::Backend(_))));

    assert!(!exists(&adapter, "b1/b1.tar.gz").await);
    assert!(!exists(&adapter, "b1/b1.log.gz").await);
    assert!(adapter.deletes().is_empty());
}

#[tokio::test]
async fn test_archive_failure_rolls_back_metadata() {
    let adapter = Arc::new(FaultyAdapter::new());
    adapter.fail(Op::Put, "b1/b1.tar.gz");
    let service = service(&adapter);

    let err = upload(&service, "b1").await.unwrap_err();
    match &err {
        Error::Aggregate(agg) => {
            assert_eq!(agg.len(), 1);
            assert!(agg.errors()[0].to_string().contains("b1/b1.tar.gz"));
        }
        other => panic!("Expected aggregate error, got {:?}", other),
    }

    assert_eq!(adapter.deletes(), vec!["b1/ark-backup.json"]);
    assert!(!exists(&adapter, "b1/ark-backup.json").await);
    assert!(!exists(&adapter, "b1/b1.log.gz").await);

    // Nothing left behind, so the bucket still lists cleanly
    assert!(service.get_all_backups(BUCKET).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_rollback_on_filesystem_leaves_bucket_listable() {
    let temp_dir = tempfile::TempDir::new().unwrap();
    let adapter = Arc::new(FaultyAdapter::over(Arc::new(FilesystemAdapter::new(
        temp_dir.path().to_path_buf(),
    ))));
    let service = service(&adapter);

    upload(&service, "a").await.unwrap();
    adapter.fail(Op::Put, "b/b.tar.gz");
    assert!(upload(&service, "b").await.is_err());

    assert_eq!(adapter.deletes(), vec!["b/ark-backup.json"]);
    assert!(!exists(&adapter, "b/ark-backup.json").await);
    assert!(!temp_dir.path().join(BUCKET).join("b").exists());

    let backups = service.get_all_backups(BUCKET).await.unwrap();
    assert_eq!(names(&backups), vec!["a"]);
}

#[tokio::test]
async fn test_failed_rollback_reports_both_errors() {
    let adapter = Arc::new(FaultyAdapter::new());
    adapter.fail(Op::Put, "b1/b1.tar.gz");
    adapter.fail(Op::Delete, "b1/ark-backup.json");
    let service = service(&adapter);

    let err = upload(&service, "b1").await.unwrap_err();
    match &err {
        Error::Aggregate(agg) => {
            assert_eq!(agg.len(), 2);
            assert!(agg.errors()[0].to_string().contains("injected Put failure"));
            assert!(agg.errors()[1].to_string().contains("injected Delete failure"));
        }
        other => panic!("Expected aggregate error, got {:?}", other),
    }
    assert!(err.to_string().starts_with('['));

    // The orphaned metadata object remains and poisons the listing
    assert!(exists(&adapter, "b1/ark-backup.json").await);
    let list_err = service.get_all_backups(BUCKET).await.unwrap_err();
    assert!(list_err.is_not_found());
}

#[tokio::test]
async fn test_log_failure_is_swallowed() {
    let adapter = Arc::new(FaultyAdapter::new());
    adapter.fail(Op::Put, "b1/b1.log.gz");
    let metrics = Arc::new(StorageMetrics::new());
    let service = ObjectBackupService::new(adapter.clone()).with_metrics(metrics.clone());

    upload(&service, "b1").await.unwrap();

    assert!(exists(&adapter, "b1/ark-backup.json").await);
    assert!(exists(&adapter, "b1/b1.tar.gz").await);
    assert!(!exists(&adapter, "b1/b1.log.gz").await);
    assert!(metrics
        .encode()
        .contains("backup_store_log_upload_failures_total{bucket=\"ark-backups\"} 1"));

    let backups = service.get_all_backups(BUCKET).await.unwrap();
    assert_eq!(names(&backups), vec!["b1"]);
}

#[tokio::test]
async fn test_delete_attempts_both_keys() {
    let adapter = Arc::new(FaultyAdapter::new());
    let service = service(&adapter);
    upload(&service, "b1").await.unwrap();

    adapter.fail(Op::Delete, "b1/b1.tar.gz");
    let err = service.delete_backup(BUCKET, "b1").await.unwrap_err();

    match &err {
        Error::Aggregate(agg) => assert_eq!(agg.len(), 1),
        other => panic!("Expected aggregate error, got {:?}", other),
    }
    assert_eq!(adapter.deletes(), vec!["b1/b1.tar.gz", "b1/ark-backup.json"]);
    assert!(!exists(&adapter, "b1/ark-backup.json").await);
    assert!(exists(&adapter, "b1/b1.tar.gz").await);
}

#[tokio::test]
async fn test_delete_collects_all_failures() {
    let adapter = Arc::new(FaultyAdapter::new());
    adapter.fail(Op::Delete, "b1/b1.tar.gz");
    adapter.fail(Op::Delete, "b1/ark-backup.json");
    let service = service(&adapter);

    match service.delete_backup(BUCKET, "b1").await.unwrap_err() {
        Error::Aggregate(agg) => assert_eq!(agg.len(), 2),
        other => panic!("Expected aggregate error, got {:?}", other),
    }
}

#[tokio::test]
async fn test_delete_metadata_only_backup() {
    let adapter = Arc::new(FaultyAdapter::new());
    adapter
        .put_object(BUCKET, "b1/ark-backup.json", metadata_json("b1"))
        .await
        .unwrap();
    let service = service(&adapter);

    service.delete_backup(BUCKET, "b1").await.unwrap();
    assert_eq!(adapter.deletes(), vec!["b1/b1.tar.gz", "b1/ark-backup.json"]);
    assert!(!exists(&adapter, "b1/ark-backup.json").await);
}

#[tokio::test]
async fn test_listing_is_all_or_nothing() {
    let adapter = Arc::new(FaultyAdapter::new());
    let service = service(&adapter);
    upload(&service, "a").await.unwrap();
    adapter
        .put_object(BUCKET, "b/ark-backup.json", Bytes::from("{not json"))
        .await
        .unwrap();
    adapter
        .put_object(BUCKET, "b/b.tar.gz", archive("b"))
        .await
        .unwrap();

    match service.get_all_backups(BUCKET).await {
        Err(Error::Decode { bucket, key, .. }) => {
            assert_eq!(bucket, BUCKET);
            assert_eq!(key, "b/ark-backup.json");
        }
        other => panic!("Expected decode error, got {:?}", other),
    }
}

#[tokio::test]
async fn test_listing_fails_on_metadata_fetch_error() {
    let adapter = Arc::new(FaultyAdapter::new());
    let service = service(&adapter);
    upload(&service, "a").await.unwrap();
    upload(&service, "b").await.unwrap();
    adapter.fail(Op::Get, "b/ark-backup.json");

    assert!(service.get_all_backups(BUCKET).await.is_err());

    adapter.heal(Op::Get, "b/ark-backup.json");
    let backups = service.get_all_backups(BUCKET).await.unwrap();
    assert_eq!(names(&backups), vec!["a", "b"]);
}

#[tokio::test]
async fn test_listing_data_only_backup_fails() {
    let adapter = Arc::new(FaultyAdapter::new());
    adapter
        .put_object(BUCKET, "b1/b1.tar.gz", archive("b1"))
        .await
        .unwrap();
    let service = service(&adapter);

    let err = service.get_all_backups(BUCKET).await.unwrap_err();
    assert!(err.is_not_found());
}

#[tokio::test]
async fn test_listing_error_passes_through() {
    let adapter = Arc::new(FaultyAdapter::new());
    adapter.fail(Op::List, BUCKET);
    let service = service(&adapter);

    let err = service.get_all_backups(BUCKET).await.unwrap_err();
    assert!(matches!(err, Error::Storage(StorageError::Backend(_))));
}

#[tokio::test]
async fn test_wrong_kind_is_decode_error() {
    let adapter = Arc::new(MemoryAdapter::new());
    let restore = br#"{"apiVersion":"ark.heptio.com/v1","kind":"Restore","metadata":{"name":"r1"}}"#;
    adapter
        .put_object(BUCKET, "r1/ark-backup.json", Bytes::from_static(restore))
        .await
        .unwrap();
    adapter
        .put_object(BUCKET, "r1/r1.tar.gz", archive("r1"))
        .await
        .unwrap();
    let service = ObjectBackupService::new(adapter);

    match service.get_all_backups(BUCKET).await {
        Err(Error::Decode { message, .. }) => assert!(message.contains("unexpected type")),
        other => panic!("Expected decode error, got {:?}", other),
    }
}

#[tokio::test]
async fn test_download_round_trip() {
    let adapter = Arc::new(FaultyAdapter::new());
    let service = service(&adapter);
    upload(&service, "b1").await.unwrap();

    let stream = service.download_backup(BUCKET, "b1").await.unwrap();
    assert_eq!(collect_stream(stream).await.unwrap(), archive("b1"));
}

#[tokio::test]
async fn test_signed_urls_target_archive_and_log() {
    let adapter = Arc::new(FaultyAdapter::new());
    let service = service(&adapter);
    let ttl = Duration::from_secs(600);

    let archive_url = service
        .create_backup_signed_url(BUCKET, "b1", ttl)
        .await
        .unwrap();
    assert_eq!(
        archive_url,
        "https://signed.example/ark-backups/b1/b1.tar.gz?expires=600"
    );

    let log_url = service
        .create_backup_log_signed_url(BUCKET, "b1", ttl)
        .await
        .unwrap();
    assert_eq!(
        log_url,
        "https://signed.example/ark-backups/b1/b1.log.gz?expires=600"
    );
}

#[tokio::test]
async fn test_signed_url_error_passes_through() {
    let service = ObjectBackupService::new(Arc::new(MemoryAdapter::new()));
    let err = service
        .create_backup_signed_url(BUCKET, "b1", Duration::from_secs(60))
        .await
        .unwrap_err();
    assert!(matches!(err, Error::Storage(StorageError::Unsupported(_))));
}
