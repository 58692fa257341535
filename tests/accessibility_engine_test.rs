//! Loading the accessibility rule engine from each supported source

use std::io::Write;

use kodegen_tools_siteaudit::AccessibilityEngineSource;
use kodegen_tools_siteaudit::analyzers::{http_client, load_engine_script};
use mockito::Server;
use tempfile::NamedTempFile;

const ENGINE: &str = "window.axe = { run: async () => ({ violations: [] }) };";

#[tokio::test]
async fn reads_engine_from_file() {
    let mut file = NamedTempFile::new().expect("temp file");
    file.write_all(ENGINE.as_bytes()).expect("write engine");

    let source = AccessibilityEngineSource::File(file.path().to_path_buf());
    let script = load_engine_script(&source, &http_client().expect("client"))
        .await
        .expect("engine loaded");
    assert_eq!(&*script, ENGINE);
}

#[tokio::test]
async fn missing_file_is_an_error() {
    let dir = tempfile::tempdir().expect("temp dir");
    let source = AccessibilityEngineSource::File(dir.path().join("axe.min.js"));
    let err = load_engine_script(&source, &http_client().expect("client"))
        .await
        .expect_err("missing file");
    assert!(format!("{err:#}").contains("Failed to read accessibility engine"));
}

#[tokio::test]
async fn downloads_engine_from_url() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("GET", "/axe.min.js")
        .with_status(200)
        .with_header("content-type", "application/javascript")
        .with_body(ENGINE)
        .expect(1)
        .create_async()
        .await;

    let source = AccessibilityEngineSource::Url(format!("{}/axe.min.js", server.url()));
    let script = load_engine_script(&source, &http_client().expect("client"))
        .await
        .expect("engine downloaded");
    assert_eq!(&*script, ENGINE);
    mock.assert_async().await;
}

#[tokio::test]
async fn http_error_is_an_error() {
    let mut server = Server::new_async().await;
    server
        .mock("GET", "/axe.min.js")
        .with_status(503)
        .create_async()
        .await;

    let source = AccessibilityEngineSource::Url(format!("{}/axe.min.js", server.url()));
    assert!(
        load_engine_script(&source, &http_client().expect("client"))
            .await
            .is_err()
    );
}
