//! Shared helpers for driving the gateway router in tests
#![allow(dead_code)]

use std::io::Write;
use std::path::{Path, PathBuf};

use axum::body::{to_bytes, Body};
use axum::http::{Request, Response};
use axum::Router;
use tempfile::TempDir;
use tower::ServiceExt;
use zip::write::SimpleFileOptions;
use zip::ZipWriter;

use service::http::{router, Config as HttpConfig};
use service::{Config, ServiceState};

/// A router over fresh storage and scratch roots.
pub struct TestGateway {
    pub temp: TempDir,
    pub storage: PathBuf,
    pub scratch: PathBuf,
    pub router: Router,
}

pub fn setup() -> TestGateway {
    let temp = TempDir::new().unwrap();
    let storage = temp.path().join("data");
    let scratch = temp.path().join("tmp");
    std::fs::create_dir_all(&storage).unwrap();
    std::fs::create_dir_all(&scratch).unwrap();

    let config = Config {
        storage_root: storage.clone(),
        scratch_root: scratch.clone(),
        ..Config::default()
    };
    let state = ServiceState::from_config(&config).unwrap();
    let router = router(&HttpConfig::from(&config), state);

    TestGateway {
        temp,
        storage,
        scratch,
        router,
    }
}

impl TestGateway {
    pub async fn send(&self, request: Request<Body>) -> Response<Body> {
        self.router.clone().oneshot(request).await.unwrap()
    }

    pub fn scratch_entries(&self) -> usize {
        std::fs::read_dir(&self.scratch).unwrap().count()
    }
}

/// Request against `host` with an empty body.
pub fn request(method: &str, host: &str, uri: &str) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header("host", host)
        .body(Body::empty())
        .unwrap()
}

pub fn request_with_body(method: &str, host: &str, uri: &str, body: &[u8]) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header("host", host)
        .body(Body::from(body.to_vec()))
        .unwrap()
}

pub async fn body_bytes(response: Response<Body>) -> Vec<u8> {
    to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap()
        .to_vec()
}

pub async fn body_string(response: Response<Body>) -> String {
    String::from_utf8(body_bytes(response).await).unwrap()
}

/// One archive member for [`write_zip`].
pub fn file<'a>(name: &'a str, data: &'a [u8]) -> (&'a str, &'a [u8]) {
    (name, data)
}

/// Write a ZIP archive holding `entries`; names ending in `/` are directories.
pub fn write_zip(path: &Path, entries: &[(&str, &[u8])]) {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).unwrap();
    }
    let mut zip = ZipWriter::new(std::fs::File::create(path).unwrap());
    let options = SimpleFileOptions::default();
    for (name, data) in entries {
        if name.ends_with('/') {
            zip.add_directory(*name, options).unwrap();
        } else {
            zip.start_file(*name, options).unwrap();
            zip.write_all(data).unwrap();
        }
    }
    zip.finish().unwrap();
}
