use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use base64::Engine;
use chrono::{DateTime, TimeZone, Utc};
use mintbox_core::{AssetMetadata, EditorConfig, RepoAccess};
use mintbox_services::{
    ExportFormat, ListError, MintError, NftEditor, NftRenderer, RemoveError, RemoveOutcome,
    StatusKind, StoreError, WorkflowKind, WorkflowStatus,
};
use mintbox_storage::{MemoryStore, StoreOp};
use tokio::sync::Semaphore;

const MINT_MILLIS: i64 = 1_700_000_000_000;

fn config(owner: &str) -> EditorConfig {
    let map: HashMap<String, String> = [
        ("GITHUB_TOKEN", "ghp_test"),
        ("GITHUB_OWNER", owner),
        ("GITHUB_REPO", "art"),
        ("CANVAS_WIDTH", "64"),
        ("CANVAS_HEIGHT", "36"),
    ]
    .into_iter()
    .map(|(k, v)| (k.to_string(), v.to_string()))
    .collect();
    EditorConfig::from_lookup(|key| map.get(key).cloned()).unwrap()
}

fn editor_with(store: Arc<MemoryStore>, owner: &str) -> NftEditor {
    let config = config(owner);
    let renderer = NftRenderer::without_font(&config.render);
    NftEditor::new(store, renderer, &config).with_seed(11)
}

fn mint_time() -> DateTime<Utc> {
    Utc.timestamp_millis_opt(MINT_MILLIS).unwrap()
}

fn metadata(name: &str) -> AssetMetadata {
    AssetMetadata {
        name: name.to_string(),
        description: "seeded".to_string(),
        image: format!("https://raw.githubusercontent.com/octo/art/main/nfts%2F{}.png", name),
        created_at: "2024-01-01T00:00:00.000Z".to_string(),
    }
}

fn server_error() -> StoreError {
    StoreError::Remote {
        status: 500,
        message: "Server Error".to_string(),
    }
}

fn yes(_: &str) -> bool {
    true
}

#[tokio::test]
async fn mint_writes_image_then_metadata() {
    let store = Arc::new(MemoryStore::new());
    let editor = editor_with(store.clone(), "octo");
    editor.set_title("Test NFT").await;

    let report = editor.mint_at(mint_time()).await.ran().unwrap().unwrap();

    let image_path = "nfts/Test_NFT_1700000000000.png";
    let metadata_path = "nfts/Test_NFT_1700000000000.json";
    assert_eq!(report.paths.image_path, image_path);
    assert_eq!(report.paths.metadata_path, metadata_path);
    assert_eq!(
        report.image_url,
        "https://raw.githubusercontent.com/octo/art/main/nfts%2FTest_NFT_1700000000000.png"
    );

    let puts: Vec<String> = store
        .calls_of(StoreOp::Put)
        .into_iter()
        .map(|c| c.path)
        .collect();
    assert_eq!(puts, vec![image_path, metadata_path]);

    let document: serde_json::Value =
        serde_json::from_slice(&store.file(metadata_path).unwrap()).unwrap();
    assert_eq!(document["name"], "Test NFT");
    assert_eq!(document["image"], report.image_url.as_str());
    assert_eq!(document["created_at"], "2023-11-14T22:13:20.000Z");

    let uploaded = image::load_from_memory(&store.file(image_path).unwrap())
        .unwrap()
        .to_rgba8();
    assert_eq!(&uploaded, editor.preview().await.unwrap().as_ref());

    let snapshot = editor.snapshot().await;
    assert_eq!(snapshot.status.message, "Done: image + metadata pushed.");
    assert_eq!(snapshot.status.kind, StatusKind::Success);
    let log = snapshot.log.messages();
    assert_eq!(log.first().unwrap(), "--- Starting generation ---");
    assert_eq!(
        log.last().unwrap(),
        &format!("All done. Image: {}", report.image_url)
    );
    assert_eq!(
        snapshot.workflows.status(WorkflowKind::Mint),
        WorkflowStatus::Succeeded
    );
}

#[tokio::test]
async fn mint_without_owner_makes_no_store_calls() {
    let store = Arc::new(MemoryStore::new());
    let editor = editor_with(store.clone(), "");

    let err = editor.mint().await.ran().unwrap().unwrap_err();

    assert!(matches!(err, MintError::Validation(_)));
    assert!(store.calls().is_empty());
    let snapshot = editor.snapshot().await;
    assert!(snapshot.status.is_error());
    assert!(snapshot.status.message.contains("owner"));
    assert!(snapshot.log.is_empty());
}

#[tokio::test]
async fn failed_metadata_upload_reports_the_orphaned_image() {
    let store = Arc::new(MemoryStore::new());
    store.fail_next_at(
        StoreOp::Put,
        "nfts/Test_NFT_1700000000000.json",
        server_error(),
    );
    let editor = editor_with(store.clone(), "octo");
    editor.set_title("Test NFT").await;

    let err = editor.mint_at(mint_time()).await.ran().unwrap().unwrap_err();

    let orphan = err.orphaned_image().unwrap();
    assert_eq!(orphan.path, "nfts/Test_NFT_1700000000000.png");
    assert!(store.contains("nfts/Test_NFT_1700000000000.png"));
    assert!(!store.contains("nfts/Test_NFT_1700000000000.json"));

    let status = editor.status().await;
    assert_eq!(status.message, "Error: GitHub API error 500: Server Error");

    let report = editor.scan_orphans().await.unwrap();
    assert_eq!(report.images_without_metadata.len(), 1);
    assert_eq!(
        report.images_without_metadata[0].path,
        "nfts/Test_NFT_1700000000000.png"
    );

    editor
        .purge_orphan(&report.images_without_metadata[0])
        .await
        .unwrap();
    assert!(store.paths().is_empty());
}

#[tokio::test]
async fn failed_image_upload_writes_nothing() {
    let store = Arc::new(MemoryStore::new());
    store.fail_next(StoreOp::Put, server_error());
    let editor = editor_with(store.clone(), "octo");

    let err = editor.mint().await.ran().unwrap().unwrap_err();

    assert!(matches!(err, MintError::ImageUpload(_)));
    assert_eq!(store.calls_of(StoreOp::Put).len(), 1);
    assert!(store.paths().is_empty());
    let log = editor.snapshot().await.log.messages();
    assert!(log.iter().any(|m| m.starts_with("ERROR: ")));
}

#[tokio::test]
async fn second_mint_while_running_is_not_queued() {
    let gate = Arc::new(Semaphore::new(0));
    let store = Arc::new(MemoryStore::new().with_put_gate(gate.clone()));
    let editor = Arc::new(editor_with(store.clone(), "octo"));

    let first = tokio::spawn({
        let editor = editor.clone();
        async move { editor.mint().await }
    });

    while !editor.is_running(WorkflowKind::Mint).await {
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    assert!(editor.mint().await.is_already_running());
    assert!(!editor.is_running(WorkflowKind::List).await);

    gate.add_permits(2);
    let report = first.await.unwrap().ran().unwrap().unwrap();
    assert_eq!(store.calls_of(StoreOp::Put).len(), 2);
    assert!(store.contains(&report.paths.metadata_path));
    assert!(!editor.is_running(WorkflowKind::Mint).await);
}

#[tokio::test]
async fn list_replaces_collection_in_listing_order() {
    let store = Arc::new(MemoryStore::new());
    store.insert_asset("nfts/c_3.json", &metadata("c_3"), true);
    store.insert_asset("nfts/a_1.json", &metadata("a_1"), true);
    store.insert_asset("nfts/b_2.json", &metadata("b_2"), true);
    let editor = editor_with(store.clone(), "octo");

    let records = editor.list().await.ran().unwrap().unwrap();

    // The in-memory listing is in path order.
    let listed: Vec<String> = store
        .paths()
        .into_iter()
        .filter(|p| p.starts_with("nfts/") && p.ends_with(".json"))
        .collect();
    let fetched: Vec<String> = store
        .calls_of(StoreOp::FetchMetadata)
        .into_iter()
        .map(|c| c.path)
        .collect();
    let paths: Vec<String> = records.iter().map(|r| r.metadata_path.clone()).collect();
    assert_eq!(fetched, listed);
    assert_eq!(paths, listed);
    assert_eq!(records[0].image_path, "nfts/a_1.png");

    assert_eq!(editor.assets().await, records);
    assert_eq!(editor.status().await.message, "Listed 3 NFTs.");
}

#[tokio::test]
async fn empty_prefix_reports_no_nfts_found() {
    let store = Arc::new(MemoryStore::new());
    store.insert_file("nfts/README.md", b"# NFTs".to_vec());
    let editor = editor_with(store.clone(), "octo");

    let records = editor.list().await.ran().unwrap().unwrap();

    assert!(records.is_empty());
    let status = editor.status().await;
    assert_eq!(status.message, "No NFTs found.");
    assert_eq!(status.kind, StatusKind::Success);
}

#[tokio::test]
async fn listing_a_missing_prefix_clears_the_collection() {
    let store = Arc::new(MemoryStore::new());
    store.insert_asset("nfts/a_1.json", &metadata("a_1"), true);
    let editor = editor_with(store.clone(), "octo");
    editor.list().await.ran().unwrap().unwrap();
    assert_eq!(editor.assets().await.len(), 1);

    editor.set_path_prefix("missing").await;
    let err = editor.list().await.ran().unwrap().unwrap_err();

    match err {
        ListError::Store(e) => assert!(e.is_not_found()),
        other => panic!("unexpected error {other:?}"),
    }
    assert!(editor.assets().await.is_empty());
    let status = editor.status().await;
    assert!(status.is_error());
    assert!(status.message.starts_with("Error listing NFTs: GitHub API error 404"));
}

#[tokio::test]
async fn remove_resolves_image_revision_then_deletes_metadata_first() {
    let store = Arc::new(MemoryStore::new());
    store.insert_asset("nfts/a_1.json", &metadata("a_1"), true);
    store.insert_asset("nfts/b_2.json", &metadata("b_2"), true);
    let image_sha = store.sha_of("nfts/a_1.png").unwrap();
    let editor = editor_with(store.clone(), "octo");
    let records = editor.list().await.ran().unwrap().unwrap();
    store.clear_calls();

    let outcome = editor
        .remove(&records[0], &yes)
        .await
        .ran()
        .unwrap()
        .unwrap();
    assert!(matches!(outcome, RemoveOutcome::Removed { .. }));

    let calls = store.calls();
    assert_eq!(calls[0].op, StoreOp::GetRevision);
    assert_eq!(calls[0].path, "nfts/a_1.png");
    assert_eq!(calls[1].op, StoreOp::Delete);
    assert_eq!(calls[1].path, "nfts/a_1.json");
    assert_eq!(calls[1].sha.as_deref(), Some(records[0].metadata_sha.as_str()));
    assert_eq!(calls[2].op, StoreOp::Delete);
    assert_eq!(calls[2].path, "nfts/a_1.png");
    assert_eq!(calls[2].sha.as_deref(), Some(image_sha.as_str()));
    assert_eq!(calls[3].op, StoreOp::ListEntries);

    let remaining: Vec<String> = editor
        .assets()
        .await
        .into_iter()
        .map(|r| r.metadata_path)
        .collect();
    assert_eq!(remaining, vec!["nfts/b_2.json"]);
    assert!(editor
        .snapshot()
        .await
        .log
        .messages()
        .contains(&"Removed nfts/a_1.json and nfts/a_1.png".to_string()));
}

#[tokio::test]
async fn failed_revision_lookup_deletes_nothing() {
    let store = Arc::new(MemoryStore::new());
    store.insert_asset("nfts/a_1.json", &metadata("a_1"), true);
    let editor = editor_with(store.clone(), "octo");
    let records = editor.list().await.ran().unwrap().unwrap();
    store.fail_next(
        StoreOp::GetRevision,
        StoreError::Remote {
            status: 404,
            message: "Not Found".to_string(),
        },
    );

    let err = editor
        .remove(&records[0], &yes)
        .await
        .ran()
        .unwrap()
        .unwrap_err();

    assert!(matches!(err, RemoveError::Revision(_)));
    assert!(store.calls_of(StoreOp::Delete).is_empty());
    assert_eq!(editor.assets().await, records);
    assert!(editor
        .status()
        .await
        .message
        .starts_with("Error removing NFT: GitHub API error 404"));
}

#[tokio::test]
async fn failed_image_delete_leaves_a_visible_orphan() {
    let store = Arc::new(MemoryStore::new());
    store.insert_asset("nfts/a_1.json", &metadata("a_1"), true);
    let editor = editor_with(store.clone(), "octo");
    let records = editor.list().await.ran().unwrap().unwrap();
    store.fail_next_at(StoreOp::Delete, "nfts/a_1.png", server_error());

    let err = editor
        .remove(&records[0], &yes)
        .await
        .ran()
        .unwrap()
        .unwrap_err();

    match &err {
        RemoveError::ImageDelete {
            deleted_metadata, ..
        } => assert_eq!(deleted_metadata.path, "nfts/a_1.json"),
        other => panic!("unexpected error {other:?}"),
    }
    assert!(!store.contains("nfts/a_1.json"));
    assert!(store.contains("nfts/a_1.png"));
    // The collection is not refreshed after a failure.
    assert_eq!(editor.assets().await.len(), 1);
    assert_eq!(store.calls_of(StoreOp::ListEntries).len(), 1);

    let report = editor.scan_orphans().await.unwrap();
    assert_eq!(report.images_without_metadata[0].path, "nfts/a_1.png");
    assert!(report.metadata_without_image.is_empty());
}

#[tokio::test]
async fn declined_remove_touches_nothing() {
    let store = Arc::new(MemoryStore::new());
    store.insert_asset("nfts/a_1.json", &metadata("a_1"), true);
    let editor = editor_with(store.clone(), "octo");
    let records = editor.list().await.ran().unwrap().unwrap();
    store.clear_calls();

    let outcome = editor
        .remove(&records[0], &|_: &str| false)
        .await
        .ran()
        .unwrap()
        .unwrap();

    assert!(matches!(outcome, RemoveOutcome::Declined));
    assert!(store.calls().is_empty());
    assert!(store.contains("nfts/a_1.json"));
}

#[tokio::test]
async fn invalid_access_is_reported_without_a_log_line() {
    let store = Arc::new(MemoryStore::new());
    let editor = editor_with(store.clone(), "octo");
    editor
        .set_access(RepoAccess::new("", "octo", "art", "main"))
        .await;

    let err = editor.list().await.ran().unwrap().unwrap_err();

    assert!(matches!(err, ListError::Validation(_)));
    assert!(store.calls().is_empty());
    assert!(editor.snapshot().await.log.is_empty());
    assert_eq!(
        editor.status().await.message,
        "Missing required fields: token"
    );
}

#[tokio::test]
async fn export_names_the_file_after_the_title() {
    let store = Arc::new(MemoryStore::new());
    let editor = editor_with(store.clone(), "octo");
    editor.set_title("Cosmic Dream #42").await;

    let png = editor.export_at(ExportFormat::Png, mint_time()).await.unwrap();
    assert_eq!(png.file_name, "Cosmic_Dream__42_1700000000000.png");
    assert_eq!(&png.bytes[..4], b"\x89PNG");
    assert_eq!(editor.status().await.message, "Downloaded as PNG");

    editor.set_title("   ").await;
    let svg = editor.export_at(ExportFormat::Svg, mint_time()).await.unwrap();
    assert_eq!(svg.file_name, "My_NFT_1700000000000.svg");
    assert!(store.calls().is_empty());
}

#[tokio::test]
async fn regenerate_picks_a_random_draft_and_redraws() {
    let store = Arc::new(MemoryStore::new());
    let first = editor_with(store.clone(), "octo");
    let second = editor_with(store, "octo");

    let a = first.regenerate().await.unwrap();
    let b = second.regenerate().await.unwrap();

    assert_eq!(a, b);
    assert!(a.title.contains(" #"));
    assert!(a.description.ends_with('.'));
    assert_eq!(first.draft().await, a);
    assert!(first.preview().await.is_some());
}

#[tokio::test]
async fn minted_metadata_is_base64_of_the_pretty_document() {
    let store = Arc::new(MemoryStore::new());
    let editor = editor_with(store.clone(), "octo");
    let report = editor.mint_at(mint_time()).await.ran().unwrap().unwrap();

    let stored = store.file(&report.paths.metadata_path).unwrap();
    assert_eq!(stored, report.document.to_document().unwrap());
    let encoded = base64::engine::general_purpose::STANDARD.encode(&stored);
    assert!(!encoded.is_empty());
    assert!(String::from_utf8(stored).unwrap().contains("\n  \"description\""));
}
