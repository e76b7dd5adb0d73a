//! Storage backend tests
//!
//! Tests for SeaOrmStorage using temporary SQLite databases.

use std::sync::Arc;

use chrono::{Duration, Utc};
use sea_orm::{ConnectionTrait, Database};
use serde_json::Map;
use tempfile::TempDir;

use condensr::analytics::ClickSink;
use condensr::config::DatabaseConfig;
use condensr::errors::CondensrError;
use condensr::storage::{
    DeviceTargets, InsertOutcome, Link, NewClickEvent, OpenGraph, SeaOrmStorage, StorageFactory,
    Utm,
};
use condensr::utils::device::DeviceType;

/// 创建临时 SQLite 数据库的存储实例，同时返回连接 URL
async fn create_temp_storage() -> (Arc<SeaOrmStorage>, String, TempDir) {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let db_path = temp_dir.path().join("storage_test.db");
    let db_url = format!("sqlite://{}?mode=rwc", db_path.display());

    let config = DatabaseConfig {
        database_url: db_url.clone(),
        ..Default::default()
    };
    let storage = StorageFactory::create(&config)
        .await
        .expect("Failed to create storage");

    (storage, db_url, temp_dir)
}

fn create_test_link(id: &str, short_code: &str, alias: Option<&str>) -> Link {
    Link {
        id: id.to_string(),
        owner_id: "owner-1".to_string(),
        original_url: format!("https://example.com/{}", id),
        short_code: short_code.to_string(),
        alias: alias.map(str::to_string),
        clicks: 0,
        max_clicks: None,
        password_hash: None,
        is_private: false,
        created_at: Utc::now(),
        expires_at: None,
        qr_code: None,
        tags: Vec::new(),
        category: None,
        metadata: Map::new(),
        utm: Utm::default(),
        device_targets: DeviceTargets::default(),
        open_graph: OpenGraph::default(),
    }
}

fn click(link_id: &str, browser: &str) -> NewClickEvent {
    NewClickEvent {
        link_id: link_id.to_string(),
        clicked_at: Utc::now(),
        country: None,
        device: DeviceType::Desktop,
        browser: browser.to_string(),
        referrer: None,
        ip_hash: None,
    }
}

// =============================================================================
// shortCode / alias 命名空间
// =============================================================================

#[tokio::test]
async fn test_insert_checks_both_code_columns() {
    let (storage, _, _dir) = create_temp_storage().await;

    let first = create_test_link("a", "abc123", Some("promo"));
    assert_eq!(storage.insert_link(&first).await.unwrap(), InsertOutcome::Inserted);

    // alias 撞上已有的 shortCode
    let alias_on_code = create_test_link("b", "zzz111", Some("abc123"));
    assert_eq!(
        storage.insert_link(&alias_on_code).await.unwrap(),
        InsertOutcome::AliasTaken
    );

    // shortCode 撞上已有的 alias
    let code_on_alias = create_test_link("c", "promo", None);
    assert_eq!(
        storage.insert_link(&code_on_alias).await.unwrap(),
        InsertOutcome::ShortCodeTaken
    );

    let same_code = create_test_link("d", "abc123", None);
    assert_eq!(
        storage.insert_link(&same_code).await.unwrap(),
        InsertOutcome::ShortCodeTaken
    );

    for id in ["b", "c", "d"] {
        assert!(storage.find_link(id).await.unwrap().is_none(), "{}", id);
    }
}

#[tokio::test]
async fn test_update_alias_onto_taken_code_conflicts() {
    let (storage, _, _dir) = create_temp_storage().await;

    storage
        .insert_link(&create_test_link("a", "abc123", None))
        .await
        .unwrap();
    let mut other = create_test_link("b", "def456", None);
    storage.insert_link(&other).await.unwrap();

    other.alias = Some("abc123".to_string());
    assert!(matches!(
        storage.update_link(&other).await,
        Err(CondensrError::LinkAliasTaken(_))
    ));

    // 自己的 shortCode 不算冲突
    other.alias = Some("def456".to_string());
    storage.update_link(&other).await.unwrap();
}

// =============================================================================
// 点击事件批量写入
// =============================================================================

#[tokio::test]
async fn test_failed_click_batch_writes_nothing() {
    let (storage, db_url, _dir) = create_temp_storage().await;

    // 第二个分块里的某一行会被触发器拒绝
    let db = Database::connect(db_url.as_str()).await.unwrap();
    db.execute_unprepared(
        "CREATE TRIGGER reject_marked_clicks BEFORE INSERT ON click_events \
         WHEN NEW.browser = 'Rejected' \
         BEGIN SELECT RAISE(ABORT, 'rejected click'); END;",
    )
    .await
    .unwrap();

    let mut events: Vec<NewClickEvent> = (0..700).map(|_| click("a", "Chrome")).collect();
    events[650] = click("a", "Rejected");

    assert!(storage.write_events(events.clone()).await.is_err());

    let since = Utc::now() - Duration::days(1);
    assert!(storage.click_rows(None, since).await.unwrap().is_empty());

    events[650] = click("a", "Firefox");
    storage.write_events(events).await.unwrap();
    assert_eq!(storage.click_rows(None, since).await.unwrap().len(), 700);
}
