//! Sidecar persistence against a real filesystem.

use std::sync::Arc;

use margin_store::{FilesystemBackend, StorageBackend, TagStore};

#[tokio::test]
async fn test_sidecar_survives_store_restart() {
    let dir = tempfile::tempdir().unwrap();
    let backend = Arc::new(FilesystemBackend::new(dir.path()));
    backend.ensure_dir().await.unwrap();

    let mut store = TagStore::new(backend.clone());
    store.initialize().await.unwrap();
    store
        .set_tags("Alpha", vec!["research".into(), "draft".into()])
        .await
        .unwrap();
    store.set_pinned("Alpha", true).await.unwrap();
    drop(store);

    // A fresh store sees the persisted state
    let mut store = TagStore::new(backend);
    store.initialize().await.unwrap();
    assert_eq!(store.get_tags("Alpha"), vec!["research", "draft"]);
    assert!(store.get_pinned("Alpha"));
}

#[tokio::test]
async fn test_corrupt_sidecar_file_resets_to_empty_on_disk() {
    let dir = tempfile::tempdir().unwrap();
    let backend = Arc::new(FilesystemBackend::new(dir.path()));
    backend.ensure_dir().await.unwrap();

    // Simulate a crash mid-write
    tokio::fs::write(dir.path().join("tags.json"), b"{\"tags\": {\"Al")
        .await
        .unwrap();

    let mut store = TagStore::new(backend.clone());
    store.initialize().await.unwrap();
    assert!(store.get_tags("Alpha").is_empty());

    // The on-disk document was rewritten to a valid empty structured form
    let raw = tokio::fs::read_to_string(dir.path().join("tags.json"))
        .await
        .unwrap();
    let value: serde_json::Value = serde_json::from_str(&raw).unwrap();
    assert!(value["tags"].as_object().unwrap().is_empty());
}

#[tokio::test]
async fn test_legacy_sidecar_is_readable_and_upgraded() {
    let dir = tempfile::tempdir().unwrap();
    let backend = Arc::new(FilesystemBackend::new(dir.path()));
    backend.ensure_dir().await.unwrap();

    tokio::fs::write(dir.path().join("tags.json"), br#"{"Alpha": ["x"]}"#)
        .await
        .unwrap();

    let mut store = TagStore::new(backend);
    store.initialize().await.unwrap();
    assert_eq!(store.get_tags("Alpha"), vec!["x"]);

    // First mutation converts the file to the structured format
    store.set_tags("Beta", vec!["y".into()]).await.unwrap();
    let raw = tokio::fs::read_to_string(dir.path().join("tags.json"))
        .await
        .unwrap();
    let value: serde_json::Value = serde_json::from_str(&raw).unwrap();
    assert_eq!(value["tags"]["Alpha"][0], "x");
    assert_eq!(value["tags"]["Beta"][0], "y");
}
