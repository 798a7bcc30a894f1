//! Single-shot request/response scenarios against the HTTP front door that
//! don't need a real socket or concurrent in-flight requests: the catalog
//! page, favicon/fallback routes, and the archive browser's serve/rename/
//! remove endpoints.

use std::path::{Path, PathBuf};

use axum::http::StatusCode;
use axum_test::TestServer;
use relay_server::config::Config;

fn test_config(folder: PathBuf) -> Config {
    Config {
        folder,
        port: 0,
        host: "127.0.0.1".to_string(),
        debug: false,
    }
}

async fn test_server(folder: PathBuf) -> TestServer {
    let app = relay_server::build_app(test_config(folder)).expect("build app");
    TestServer::new(app).expect("test server")
}

/// Mirrors `routes::url_segment`: the archive URL prefix is the configured
/// folder's own path, trimmed of leading/trailing slashes.
fn archive_url_prefix(folder: &Path) -> String {
    folder.to_string_lossy().trim_matches('/').to_string()
}

#[tokio::test]
async fn root_page_renders_catalog_with_no_live_or_archived_entries() {
    let tmp = tempfile::tempdir().unwrap();
    let server = test_server(tmp.path().to_path_buf()).await;

    let response = server.get("/").await;
    response.assert_status_ok();
    let body = response.text();
    assert!(body.contains("nothing is live right now"));
    assert!(body.contains("nothing archived yet"));
}

#[tokio::test]
async fn favicon_returns_empty_ok() {
    let tmp = tempfile::tempdir().unwrap();
    let server = test_server(tmp.path().to_path_buf()).await;

    let response = server.get("/favicon.ico").await;
    response.assert_status_ok();
    assert!(response.as_bytes().is_empty());
}

#[tokio::test]
async fn unsupported_method_on_a_relay_path_returns_empty_ok() {
    let tmp = tempfile::tempdir().unwrap();
    let server = test_server(tmp.path().to_path_buf()).await;

    let response = server.put("/some/path").await;
    response.assert_status_ok();
}

#[tokio::test]
async fn archive_browser_serves_an_existing_file() {
    let tmp = tempfile::tempdir().unwrap();
    let stamped_dir = tmp.path().join("202601010101");
    tokio::fs::create_dir_all(&stamped_dir).await.unwrap();
    tokio::fs::write(stamped_dir.join("clip.bin"), b"hello archive").await.unwrap();

    let prefix = archive_url_prefix(tmp.path());
    let server = test_server(tmp.path().to_path_buf()).await;

    let response = server.get(&format!("/{prefix}/202601010101/clip.bin")).await;
    response.assert_status_ok();
    assert_eq!(response.as_bytes().as_ref(), b"hello archive");
}

#[tokio::test]
async fn archive_browser_404s_on_missing_file() {
    let tmp = tempfile::tempdir().unwrap();
    let prefix = archive_url_prefix(tmp.path());
    let server = test_server(tmp.path().to_path_buf()).await;

    let response = server.get(&format!("/{prefix}/does-not-exist.bin")).await;
    response.assert_status(StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn archive_browser_rename_without_newname_reports_error() {
    let tmp = tempfile::tempdir().unwrap();
    tokio::fs::write(tmp.path().join("a.bin"), b"data").await.unwrap();
    let prefix = archive_url_prefix(tmp.path());
    let server = test_server(tmp.path().to_path_buf()).await;

    let response = server.get(&format!("/{prefix}/a.bin?rename=true")).await;
    response.assert_status_ok();
    assert_eq!(response.text(), "ERROR");
}

#[tokio::test]
async fn archive_browser_rename_moves_the_file_under_the_root() {
    let tmp = tempfile::tempdir().unwrap();
    tokio::fs::write(tmp.path().join("a.bin"), b"data").await.unwrap();
    let prefix = archive_url_prefix(tmp.path());
    let server = test_server(tmp.path().to_path_buf()).await;

    let response = server
        .get(&format!("/{prefix}/a.bin?rename=true&newname=b.bin"))
        .await;
    response.assert_status_ok();
    assert_eq!(response.text(), "OK");
    assert!(!tmp.path().join("a.bin").exists());
    assert!(tmp.path().join("b.bin").exists());
}

#[tokio::test]
async fn archive_browser_remove_deletes_the_file() {
    let tmp = tempfile::tempdir().unwrap();
    tokio::fs::write(tmp.path().join("a.bin"), b"data").await.unwrap();
    let prefix = archive_url_prefix(tmp.path());
    let server = test_server(tmp.path().to_path_buf()).await;

    let response = server.get(&format!("/{prefix}/a.bin?remove=true")).await;
    response.assert_status_ok();
    assert_eq!(response.text(), "OK");
    assert!(!tmp.path().join("a.bin").exists());
}

#[tokio::test]
async fn archive_browser_remove_of_missing_file_is_best_effort_and_does_not_crash() {
    let tmp = tempfile::tempdir().unwrap();
    let prefix = archive_url_prefix(tmp.path());
    let server = test_server(tmp.path().to_path_buf()).await;

    let response = server.get(&format!("/{prefix}/missing.bin?remove=true")).await;
    response.assert_status_ok();
    assert_eq!(response.text(), "OK");
}

#[tokio::test]
async fn archive_browser_rename_of_missing_file_is_best_effort_and_does_not_crash() {
    let tmp = tempfile::tempdir().unwrap();
    let prefix = archive_url_prefix(tmp.path());
    let server = test_server(tmp.path().to_path_buf()).await;

    let response = server
        .get(&format!("/{prefix}/missing.bin?rename=true&newname=also-missing.bin"))
        .await;
    response.assert_status_ok();
    assert_eq!(response.text(), "OK");
}
