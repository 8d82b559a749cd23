//! Full mount lifecycle against an in-memory drive.

use std::sync::Arc;

use kdrivefs::{DriveFs, KdriveError, MemoryStore, MountConfig, StoreCall};
use serde_json::json;

const ROOT_URL: &str = "https://ksuite.infomaniak.com/kdrive/app/drive/497955/files/5";

/// Drive root `5` / folder `first` (10) / file `outside.png` (42, 2048 bytes).
fn drive() -> Arc<MemoryStore> {
    let store = MemoryStore::new("497955", "5");
    store.add_folder_with_id("5", "10", "first");
    store.add_file_with_id("10", "42", "outside.png", vec![0xAB; 2048], 1_700_000_000);
    Arc::new(store)
}

fn mount(store: &Arc<MemoryStore>) -> DriveFs<Arc<MemoryStore>> {
    let config = MountConfig::new(ROOT_URL, "token");
    DriveFs::from_config(&config, Arc::clone(store)).unwrap()
}

#[tokio::test]
async fn test_stat_reports_host_record() {
    let store = drive();
    let fs = mount(&store);

    let stat = fs.stat("/first/outside.png").await.unwrap().unwrap();
    assert_eq!(
        serde_json::to_value(&stat).unwrap(),
        json!({
            "path": "/first/outside.png",
            "size": 2048,
            "lastModified": 1_700_000_000_000i64,
            "isDirectory": false
        })
    );

    assert!(fs.stat("/first/missing.png").await.unwrap().is_none());
}

#[tokio::test]
async fn test_write_creates_missing_folders() {
    let store = drive();
    let fs = mount(&store);

    fs.write("/new/deep/file.txt", &mut &b"payload"[..]).await.unwrap();

    let created: Vec<String> = store
        .calls()
        .into_iter()
        .filter_map(|c| match c {
            StoreCall::CreateFolder { name, .. } => Some(name),
            _ => None,
        })
        .collect();
    assert_eq!(created, ["new", "deep"]);

    let stat = fs.stat("/new/deep/file.txt").await.unwrap().unwrap();
    assert_eq!(stat.size, 7);
    assert!(fs.stat("/new/deep").await.unwrap().unwrap().is_directory);

    let mut content = Vec::new();
    fs.read("/new/deep/file.txt", &mut content, None).await.unwrap();
    assert_eq!(content, b"payload");
}

#[tokio::test]
async fn test_rename_then_delete_subtree() {
    let store = drive();
    let fs = mount(&store);

    assert!(fs.move_path("/first/outside.png", "/first/renamed.png").await.unwrap());
    assert!(fs.stat("/first/outside.png").await.unwrap().is_none());
    let renamed = fs.stat("/first/renamed.png").await.unwrap().unwrap();
    assert_eq!(renamed.size, 2048);

    assert_eq!(fs.delete_recursive("/first").await.unwrap(), 1);
    assert!(!store.exists("10"));
    assert!(!store.exists("42"));
    assert!(fs.stat("/first/renamed.png").await.unwrap().is_none());
    assert!(fs.enumerate("/first", false).await.unwrap().is_none());
    assert_eq!(fs.delete_recursive("/first").await.unwrap(), 0);
}

#[tokio::test]
async fn test_enumerate_and_browse() {
    let store = drive();
    let fs = mount(&store);

    let files = fs.enumerate("/", false).await.unwrap().unwrap();
    assert_eq!(files.len(), 1);
    assert_eq!(files[0].path, "/first/outside.png");
    assert_eq!(files[0].last_modified, Some(1_700_000_000_000));

    let listing = serde_json::to_value(fs.browse("/first").await.unwrap()).unwrap();
    assert_eq!(listing["fullPath"], "/first");
    assert_eq!(listing["children"][0]["fullPath"], "/first/outside.png");
    assert_eq!(listing["children"][0]["directory"], false);

    assert_eq!(
        serde_json::to_value(fs.browse("/nowhere").await.unwrap()).unwrap(),
        json!({ "fullPath": null, "exists": false })
    );
}

#[tokio::test]
async fn test_read_missing_path_fails() {
    let store = drive();
    let fs = mount(&store);

    let mut sink = Vec::new();
    let err = fs.read("/first/missing.png", &mut sink, None).await.unwrap_err();
    assert!(matches!(err, KdriveError::NotFound(_)));
}

#[tokio::test]
async fn test_provider_root_prefix() {
    let store = drive();
    let config = MountConfig::new(ROOT_URL, "token").with_root("/first");
    let fs = DriveFs::from_config(&config, Arc::clone(&store)).unwrap();

    let stat = fs.stat("outside.png").await.unwrap().unwrap();
    assert_eq!(stat.path, "/outside.png");

    fs.write("/sub/x.bin", &mut &[1u8, 2, 3][..]).await.unwrap();
    assert!(store.id_at("first/sub/x.bin").is_some());
}

#[tokio::test]
async fn test_operations_run_concurrently() {
    let store = drive();
    let fs = Arc::new(mount(&store));

    let handles: Vec<_> = (0..8)
        .map(|_| {
            let fs = Arc::clone(&fs);
            tokio::spawn(async move { fs.stat("/first/outside.png").await })
        })
        .collect();

    for handle in handles {
        let stat = handle.await.unwrap().unwrap().unwrap();
        assert_eq!(stat.size, 2048);
    }
}
