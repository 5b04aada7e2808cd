use mintbox_core::{DirectoryEntry, RepoAccess};
use mintbox_storage::{AssetStore, GitHubStore};
use mockito::Matcher;
use serde_json::json;

fn access() -> RepoAccess {
    RepoAccess::new("ghp_test", "octo", "art", "main")
}

fn store(server: &mockito::ServerGuard) -> GitHubStore {
    GitHubStore::new(server.url(), "2022-11-28", None).unwrap()
}

fn ref_main() -> Matcher {
    Matcher::UrlEncoded("ref".into(), "main".into())
}

#[tokio::test]
async fn put_file_sends_auth_and_commit_body() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("PUT", "/repos/octo/art/contents/nfts%2Fa.png")
        .match_header("authorization", "token ghp_test")
        .match_header("accept", "application/vnd.github+json")
        .match_header("x-github-api-version", "2022-11-28")
        .match_body(Matcher::PartialJson(json!({
            "message": "Add NFT image nfts/a.png",
            "content": "aGk=",
            "branch": "main"
        })))
        .with_status(201)
        .with_header("content-type", "application/json")
        .with_body(
            json!({
                "content": {"path": "nfts/a.png", "sha": "blob1"},
                "commit": {"sha": "commit1"}
            })
            .to_string(),
        )
        .create_async()
        .await;

    let handle = store(&server)
        .put_file(
            &access(),
            "nfts/a.png",
            "aGk=",
            Some("Add NFT image nfts/a.png"),
            None,
        )
        .await
        .unwrap();

    mock.assert_async().await;
    assert_eq!(handle.path, "nfts/a.png");
    assert_eq!(handle.sha, "blob1");
    assert_eq!(handle.commit_sha.as_deref(), Some("commit1"));
}

#[tokio::test]
async fn put_file_surfaces_remote_detail() {
    let mut server = mockito::Server::new_async().await;
    server
        .mock("PUT", "/repos/octo/art/contents/nfts%2Fa.png")
        .with_status(422)
        .with_body(
            json!({
                "message": "Invalid request",
                "errors": [{"field": "sha", "code": "missing"}]
            })
            .to_string(),
        )
        .create_async()
        .await;

    let err = store(&server)
        .put_file(&access(), "nfts/a.png", "aGk=", None, None)
        .await
        .unwrap_err();

    assert_eq!(err.status(), Some(422));
    let text = err.to_string();
    assert!(text.contains("422"));
    assert!(text.contains("Invalid request"));
    assert!(text.contains("missing"));
}

#[tokio::test]
async fn delete_file_presents_the_revision() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("DELETE", "/repos/octo/art/contents/nfts%2Fa.json")
        .match_body(Matcher::PartialJson(json!({
            "sha": "s1",
            "branch": "main",
            "message": "Delete nfts/a.json"
        })))
        .with_status(200)
        .with_body(json!({"content": null, "commit": {"sha": "c9"}}).to_string())
        .create_async()
        .await;

    let handle = store(&server)
        .delete_file(&access(), "nfts/a.json", "s1", None)
        .await
        .unwrap();

    mock.assert_async().await;
    assert_eq!(handle.sha, "s1");
    assert_eq!(handle.commit_sha.as_deref(), Some("c9"));
}

#[tokio::test]
async fn revision_is_read_from_the_branch() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("GET", "/repos/octo/art/contents/nfts%2Fa.png")
        .match_query(ref_main())
        .with_status(200)
        .with_body(json!({"name": "a.png", "path": "nfts/a.png", "sha": "img-sha"}).to_string())
        .create_async()
        .await;

    let sha = store(&server)
        .get_file_revision(&access(), "nfts/a.png")
        .await
        .unwrap();

    mock.assert_async().await;
    assert_eq!(sha, "img-sha");
}

#[tokio::test]
async fn list_assets_keeps_metadata_in_listing_order() {
    let mut server = mockito::Server::new_async().await;
    let url = server.url();
    let listing = json!([
        {"name": "b.json", "path": "nfts/b.json", "sha": "sb", "type": "file",
         "download_url": format!("{}/raw/nfts/b.json", url)},
        {"name": "b.png", "path": "nfts/b.png", "sha": "sbp", "type": "file",
         "download_url": format!("{}/raw/nfts/b.png", url)},
        {"name": "a.json", "path": "nfts/a.json", "sha": "sa", "type": "file",
         "download_url": format!("{}/raw/nfts/a.json", url)}
    ]);
    server
        .mock("GET", "/repos/octo/art/contents/nfts")
        .match_query(ref_main())
        .with_status(200)
        .with_body(listing.to_string())
        .create_async()
        .await;
    for name in ["a", "b"] {
        server
            .mock("GET", format!("/raw/nfts/{}.json", name).as_str())
            .match_header("authorization", "token ghp_test")
            .with_status(200)
            .with_body(
                json!({
                    "name": name.to_uppercase(),
                    "description": "d",
                    "image": format!("https://raw/{}.png", name),
                    "created_at": "2024-01-01T00:00:00.000Z"
                })
                .to_string(),
            )
            .create_async()
            .await;
    }

    let records = store(&server).list_assets(&access(), "nfts").await.unwrap();

    let names: Vec<&str> = records.iter().map(|r| r.name.as_str()).collect();
    assert_eq!(names, vec!["B", "A"]);
    assert_eq!(records[0].metadata_path, "nfts/b.json");
    assert_eq!(records[0].metadata_sha, "sb");
    assert_eq!(records[0].image_path, "nfts/b.png");
}

#[tokio::test]
async fn incomplete_metadata_document_still_lists() {
    let mut server = mockito::Server::new_async().await;
    let url = server.url();
    let listing = json!([
        {"name": "a.json", "path": "nfts/a.json", "sha": "sa", "type": "file",
         "download_url": format!("{}/raw/nfts/a.json", url)},
        {"name": "archive.json", "path": "nfts/archive.json", "sha": "sd", "type": "dir",
         "download_url": null},
        {"name": "b.json", "path": "nfts/b.json", "sha": "sb", "type": "file",
         "download_url": format!("{}/raw/nfts/b.json", url)}
    ]);
    server
        .mock("GET", "/repos/octo/art/contents/nfts")
        .match_query(ref_main())
        .with_status(200)
        .with_body(listing.to_string())
        .create_async()
        .await;
    server
        .mock("GET", "/raw/nfts/a.json")
        .with_status(200)
        .with_body(
            json!({
                "name": "A",
                "description": "d",
                "image": "https://raw/a.png",
                "created_at": "2024-01-01T00:00:00.000Z"
            })
            .to_string(),
        )
        .create_async()
        .await;
    server
        .mock("GET", "/raw/nfts/b.json")
        .with_status(200)
        .with_body(
            json!({"name": "B", "description": "d", "image": "https://raw/b.png"}).to_string(),
        )
        .create_async()
        .await;

    let records = store(&server).list_assets(&access(), "nfts").await.unwrap();

    assert_eq!(records.len(), 2);
    assert_eq!(records[0].name, "A");
    assert_eq!(records[0].created_at, "2024-01-01T00:00:00.000Z");
    assert_eq!(records[1].name, "B");
    assert_eq!(records[1].created_at, "");
    assert_eq!(records[1].image_path, "nfts/b.png");
}

#[tokio::test]
async fn metadata_body_that_is_not_json_fails_the_listing() {
    let mut server = mockito::Server::new_async().await;
    let url = server.url();
    let listing = json!([
        {"name": "a.json", "path": "nfts/a.json", "sha": "sa", "type": "file",
         "download_url": format!("{}/raw/nfts/a.json", url)}
    ]);
    server
        .mock("GET", "/repos/octo/art/contents/nfts")
        .match_query(ref_main())
        .with_status(200)
        .with_body(listing.to_string())
        .create_async()
        .await;
    server
        .mock("GET", "/raw/nfts/a.json")
        .with_status(200)
        .with_body("<html>not json</html>")
        .create_async()
        .await;

    let err = store(&server)
        .list_assets(&access(), "nfts")
        .await
        .unwrap_err();
    assert!(err.to_string().contains("Invalid metadata document nfts/a.json"));
}

#[tokio::test]
async fn listing_without_metadata_is_empty() {
    let mut server = mockito::Server::new_async().await;
    server
        .mock("GET", "/repos/octo/art/contents/nfts")
        .match_query(ref_main())
        .with_status(200)
        .with_body(json!([{"name": "README.md", "path": "nfts/README.md", "sha": "r"}]).to_string())
        .create_async()
        .await;

    let records = store(&server).list_assets(&access(), "nfts").await.unwrap();
    assert!(records.is_empty());
}

#[tokio::test]
async fn missing_prefix_is_a_not_found_error() {
    let mut server = mockito::Server::new_async().await;
    server
        .mock("GET", "/repos/octo/art/contents/nfts")
        .match_query(ref_main())
        .with_status(404)
        .with_body(json!({"message": "Not Found"}).to_string())
        .create_async()
        .await;

    let err = store(&server)
        .list_assets(&access(), "nfts")
        .await
        .unwrap_err();
    assert!(err.is_not_found());
    assert!(err.to_string().contains("Not Found"));
}

#[tokio::test]
async fn metadata_without_download_url_is_decoded_from_contents() {
    let mut server = mockito::Server::new_async().await;
    // base64 of {"name":"N","description":"D","image":"I","created_at":"T"}, line-wrapped
    let encoded = concat!(
        "eyJuYW1lIjoiTiIsImRlc2NyaXB0aW9uIjoiRCIsImltYWdlIjoiSSIsImNy\n",
        "ZWF0ZWRfYXQiOiJUIn0=\n"
    );
    server
        .mock("GET", "/repos/octo/art/contents/nfts%2Fa.json")
        .match_query(ref_main())
        .with_status(200)
        .with_body(json!({"sha": "sa", "content": encoded, "encoding": "base64"}).to_string())
        .create_async()
        .await;

    let entry = DirectoryEntry {
        name: "a.json".into(),
        path: "nfts/a.json".into(),
        sha: "sa".into(),
        download_url: None,
        kind: "file".into(),
    };
    let metadata = store(&server)
        .fetch_metadata(&access(), &entry)
        .await
        .unwrap();
    assert_eq!(metadata.name, "N");
    assert_eq!(metadata.created_at, "T");
}
