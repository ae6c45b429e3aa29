//! Tests for the fetcher

use super::*;
use crate::error::Error;
use crate::http::HttpClientConfig;
use tempfile::tempdir;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn fetcher_for(server: &MockServer) -> Fetcher {
    let config = HttpClientConfig::builder().base_url(server.uri()).build();
    Fetcher::new(HttpClient::with_config(config).unwrap())
}

#[tokio::test]
async fn test_fetch_writes_body() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/trip-data/yellow_tripdata_2025-01.parquet"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(b"PAR1 data PAR1".to_vec()))
        .expect(1)
        .mount(&server)
        .await;

    let dir = tempdir().unwrap();
    let target = dir.path().join("yellow_tripdata_2025-01.parquet");

    let written = fetcher_for(&server)
        .fetch("/trip-data/yellow_tripdata_2025-01.parquet", &target)
        .await
        .unwrap();

    assert_eq!(written, 14);
    assert_eq!(std::fs::read(&target).unwrap(), b"PAR1 data PAR1");
}

#[tokio::test]
async fn test_fetch_twice_is_identical() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/title.ratings.tsv.gz"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(vec![0x1f, 0x8b, 8, 0, 1, 2, 3]))
        .expect(2)
        .mount(&server)
        .await;

    let dir = tempdir().unwrap();
    let target = dir.path().join("title.ratings.tsv.gz");
    let fetcher = fetcher_for(&server);

    fetcher.fetch("/title.ratings.tsv.gz", &target).await.unwrap();
    let first = std::fs::read(&target).unwrap();
    fetcher.fetch("/title.ratings.tsv.gz", &target).await.unwrap();
    let second = std::fs::read(&target).unwrap();

    assert_eq!(first, second);
}

#[tokio::test]
async fn test_fetch_truncates_longer_file() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/small"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(b"abc".to_vec()))
        .mount(&server)
        .await;

    let dir = tempdir().unwrap();
    let target = dir.path().join("small");
    std::fs::write(&target, vec![b'x'; 1024]).unwrap();

    fetcher_for(&server).fetch("/small", &target).await.unwrap();
    assert_eq!(std::fs::read(&target).unwrap(), b"abc");
}

#[tokio::test]
async fn test_fetch_error_status_writes_nothing() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/missing.tsv.gz"))
        .respond_with(ResponseTemplate::new(404).set_body_string("<html>Not Found</html>"))
        .mount(&server)
        .await;

    let dir = tempdir().unwrap();
    let target = dir.path().join("missing.tsv.gz");

    let err = fetcher_for(&server)
        .fetch("/missing.tsv.gz", &target)
        .await
        .unwrap_err();

    assert!(err.is_not_found());
    assert!(!target.exists());
}

#[tokio::test]
async fn test_fetch_into_missing_directory() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(b"x".to_vec()))
        .mount(&server)
        .await;

    let dir = tempdir().unwrap();
    let target = dir.path().join("absent").join("file");

    let err = fetcher_for(&server).fetch("/file", &target).await.unwrap_err();
    assert!(matches!(err, Error::Output { .. }));
}
