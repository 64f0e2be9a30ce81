//! End-to-end tests for file-backed storage and retention.

mod helpers;

use std::io::Write;
use std::time::Duration;

use chrono::Utc;
use helpers::*;
use logbook_client::QueryParams;
use logbook_core::{LogEntry, LogLevel, Metadata};
use logbook_server::ServerConfig;
use logbook_store::FileLogRepository;

#[tokio::test]
async fn test_entries_survive_restart() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("logbook.jsonl");

    let server = TestServer::start_with(ServerConfig::default().with_file_storage(&path)).await;
    let client = server.client("ledger");
    let first = client.info("posted", "entry one", Metadata::new()).await.unwrap();
    let second = client
        .critical("entry two", Metadata::new())
        .await
        .unwrap();
    server.shutdown().await;

    let server = TestServer::start_with(ServerConfig::default().with_file_storage(&path)).await;
    let client = server.client("ledger");

    let page = client.query(&QueryParams::new()).await.unwrap();
    assert_eq!(page.total_count, 2);

    let restored = client.get(&first.id).await.unwrap();
    assert_eq!(restored.message, "entry one");
    let restored = client.get(&second.id).await.unwrap();
    assert_eq!(restored.level, LogLevel::Critical);

    server.shutdown().await;
}

#[tokio::test]
async fn test_retention_sweep_on_startup() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("logbook.jsonl");

    {
        let mut file = std::fs::File::create(&path).unwrap();
        for (id, age) in [
            ("stale-1", chrono::Duration::days(3)),
            ("stale-2", chrono::Duration::days(2)),
            ("fresh-1", chrono::Duration::minutes(5)),
        ] {
            let entry = LogEntry::builder()
                .id(id)
                .level(LogLevel::Info)
                .service("archive")
                .event("imported")
                .message("old data")
                .timestamp(Utc::now() - age)
                .build()
                .unwrap();
            writeln!(file, "{}", serde_json::to_string(&entry).unwrap()).unwrap();
        }
    }

    let config = ServerConfig::default()
        .with_file_storage(&path)
        .with_retention(Duration::from_secs(24 * 60 * 60));
    let server = TestServer::start_with(config).await;
    let client = server.client("archive");

    let swept = eventually(|| {
        let client = client.clone();
        async move {
            client
                .query(&QueryParams::new())
                .await
                .is_ok_and(|page| page.total_count == 1)
        }
    })
    .await;
    assert!(swept, "expired entries were not removed");

    let page = client.query(&QueryParams::new()).await.unwrap();
    assert_eq!(page.logs[0].id, "fresh-1");
    server.shutdown().await;

    let contents = std::fs::read_to_string(&path).unwrap();
    assert_eq!(contents.lines().count(), 1);

    let store = FileLogRepository::at(&path).unwrap();
    assert_eq!(store.memory().len(), 1);
    assert!(store.memory().get("fresh-1").is_ok());
}
