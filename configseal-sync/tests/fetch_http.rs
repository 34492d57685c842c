//! HTTP fetch against a `wiremock` server.
//!
//! `fetch` is blocking, so every call runs on tokio's blocking pool while the
//! mock server keeps serving on the runtime.

use std::time::Duration;

use configseal_core::{seal, Key, SyncConfig, SyncConfigOverrides};
use configseal_sync::fetch::{fetch, FetchOptions};
use configseal_sync::{pipeline, SyncError};
use tempfile::TempDir;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const BUNDLE_PATH: &str = "/app.bundle";

async fn serve(template: ResponseTemplate) -> (MockServer, String) {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(BUNDLE_PATH))
        .respond_with(template)
        .mount(&server)
        .await;
    let url = format!("{}{BUNDLE_PATH}", server.uri());
    (server, url)
}

async fn fetch_blocking(url: &str, options: FetchOptions) -> Result<Vec<u8>, SyncError> {
    let url = url.to_owned();
    tokio::task::spawn_blocking(move || fetch(&url, &options))
        .await
        .expect("fetch task panicked")
}

fn options() -> FetchOptions {
    FetchOptions {
        timeout: Duration::from_secs(5),
        max_bytes: 1 << 20,
    }
}

#[tokio::test]
async fn fetches_body_over_http() {
    let template = ResponseTemplate::new(200).set_body_bytes(b"sealed bytes".to_vec());
    let (_server, url) = serve(template).await;

    let body = fetch_blocking(&url, options()).await.expect("fetch");
    assert_eq!(body, b"sealed bytes");
}

#[tokio::test]
async fn http_error_status_is_transport_failure() {
    let (_server, url) = serve(ResponseTemplate::new(404).set_body_string("nope")).await;

    let err = fetch_blocking(&url, options()).await.expect_err("404 must fail");
    assert_eq!(err.kind(), "TransportFailure");
    assert!(err.to_string().contains("404"), "{err}");
    assert!(err.to_string().contains(&url), "{err}");
}

#[tokio::test]
async fn oversized_body_is_transport_failure() {
    let template = ResponseTemplate::new(200).set_body_bytes(vec![7u8; 4096]);
    let (_server, url) = serve(template).await;
    let opts = FetchOptions {
        max_bytes: 1024,
        ..options()
    };

    let err = fetch_blocking(&url, opts).await.expect_err("over the cap");
    assert_eq!(err.kind(), "TransportFailure");
    assert!(err.to_string().contains("1024-byte limit"), "{err}");
}

#[tokio::test]
async fn slow_server_hits_deadline() {
    let (_server, url) = serve(
        ResponseTemplate::new(200)
            .set_body_bytes(b"late".to_vec())
            .set_delay(Duration::from_secs(5)),
    )
    .await;
    let opts = FetchOptions {
        timeout: Duration::from_millis(300),
        ..options()
    };

    let err = fetch_blocking(&url, opts).await.expect_err("must time out");
    assert_eq!(err.kind(), "TransportFailure");
}

#[tokio::test]
async fn full_pipeline_over_http() {
    let key = Key::generate().expect("key");
    let keys = TempDir::new().expect("keys");
    let target = TempDir::new().expect("target");
    let keyfile = keys.path().join("app.key");
    key.write_to(&keyfile, false).expect("write key");

    let mut builder = tar::Builder::new(Vec::new());
    let mut header = tar::Header::new_gnu();
    header.set_entry_type(tar::EntryType::Regular);
    header.set_size(4);
    header.set_mode(0o644);
    header.set_mtime(1_700_000_000);
    builder
        .append_data(&mut header, "app.conf", &b"A=1\n"[..])
        .expect("append");
    let payload = builder.into_inner().expect("tar");

    let sealed = seal::seal(&key, &payload).expect("seal");
    let (_server, url) = serve(ResponseTemplate::new(200).set_body_bytes(sealed)).await;
    let config = SyncConfig::resolve(SyncConfigOverrides {
        url: Some(url),
        keyfile: Some(keyfile),
        target: Some(target.path().to_path_buf()),
        fetch_timeout_secs: Some(5),
        ..Default::default()
    })
    .expect("config");

    let report = tokio::task::spawn_blocking(move || pipeline::run(&config))
        .await
        .expect("sync task panicked")
        .expect("sync");
    assert_eq!(report.changed(), 1);
    assert_eq!(
        std::fs::read(target.path().join("app.conf")).expect("read"),
        b"A=1\n"
    );
}
