use chrono::{TimeZone, Utc};
use zenstack_common::types::{DomainPatch, SslStatus};

use crate::store::{DomainFilter, Store};
use crate::StorageError;

async fn open_store() -> (tempfile::TempDir, Store) {
    let dir = tempfile::tempdir().expect("tempdir");
    let store = Store::new(dir.path()).await.expect("open store");
    (dir, store)
}

#[tokio::test]
async fn test_upsert_creates_and_normalizes_name() {
    let (_dir, store) = open_store().await;

    let created = store
        .upsert_domain(
            "  Example.COM. ",
            &DomainPatch {
                ssl_status: Some(SslStatus::Valid),
                is_live: Some(true),
                last_status_code: Some(200),
                ..Default::default()
            },
        )
        .await
        .expect("upsert");

    assert_eq!(created.domain_name, "example.com");
    assert_eq!(created.ssl_status, SslStatus::Valid);
    assert!(created.is_live);

    // A differently-cased spelling hits the same row.
    let again = store
        .upsert_domain("EXAMPLE.com", &DomainPatch::default())
        .await
        .expect("upsert");
    assert_eq!(again.id, created.id);
    assert_eq!(store.count_domains().await.unwrap(), 1);
}

#[tokio::test]
async fn test_patch_preserves_absent_fields() {
    let (_dir, store) = open_store().await;
    let expiry = Utc.with_ymd_and_hms(2025, 6, 1, 0, 0, 0).unwrap();

    store
        .upsert_domain(
            "example.com",
            &DomainPatch {
                ssl_expiry: Some(Some(expiry)),
                ssl_status: Some(SslStatus::Valid),
                issuer_org: Some(Some("Let's Encrypt".to_string())),
                registrar: Some("MarkMonitor Inc.".to_string()),
                ..Default::default()
            },
        )
        .await
        .expect("first upsert");

    // An HTTP-only patch must not clobber the TLS/WHOIS fields.
    let updated = store
        .upsert_domain(
            "example.com",
            &DomainPatch {
                is_live: Some(true),
                last_status_code: Some(200),
                response_time_ms: Some(42),
                ..Default::default()
            },
        )
        .await
        .expect("second upsert");

    assert_eq!(updated.ssl_expiry, Some(expiry));
    assert_eq!(updated.ssl_status, SslStatus::Valid);
    assert_eq!(updated.issuer_org.as_deref(), Some("Let's Encrypt"));
    assert_eq!(updated.registrar.as_deref(), Some("MarkMonitor Inc."));
    assert!(updated.is_live);
    assert_eq!(updated.last_status_code, 200);
}

#[tokio::test]
async fn test_updated_at_moves_forward_on_every_write() {
    let (_dir, store) = open_store().await;
    let first = store
        .upsert_domain("example.com", &DomainPatch::default())
        .await
        .unwrap();
    let second = store
        .upsert_domain(
            "example.com",
            &DomainPatch {
                is_live: Some(true),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert!(second.updated_at >= first.updated_at);
}

#[tokio::test]
async fn test_soft_delete_hides_row() {
    let (_dir, store) = open_store().await;
    let created = store
        .upsert_domain("gone.example.com", &DomainPatch::default())
        .await
        .unwrap();

    assert!(store.soft_delete_domain(&created.id).await.unwrap());
    assert!(store
        .get_domain_by_name("gone.example.com")
        .await
        .unwrap()
        .is_none());
    assert!(store
        .list_domains(&DomainFilter::default())
        .await
        .unwrap()
        .is_empty());
    // A second delete on the same id is a no-op.
    assert!(!store.soft_delete_domain(&created.id).await.unwrap());
}

#[tokio::test]
async fn test_list_filters_by_status_and_liveness() {
    let (_dir, store) = open_store().await;
    store
        .upsert_domain(
            "a.example.com",
            &DomainPatch {
                ssl_status: Some(SslStatus::Critical),
                is_live: Some(true),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    store
        .upsert_domain(
            "b.example.com",
            &DomainPatch {
                ssl_status: Some(SslStatus::Valid),
                is_live: Some(false),
                ..Default::default()
            },
        )
        .await
        .unwrap();

    let critical = store
        .list_domains(&DomainFilter {
            ssl_status: Some(SslStatus::Critical),
            is_live: None,
        })
        .await
        .unwrap();
    assert_eq!(critical.len(), 1);
    assert_eq!(critical[0].domain_name, "a.example.com");

    let down = store
        .list_domains(&DomainFilter {
            ssl_status: None,
            is_live: Some(false),
        })
        .await
        .unwrap();
    assert_eq!(down.len(), 1);
    assert_eq!(down[0].domain_name, "b.example.com");
}

#[tokio::test]
async fn test_template_event_name_is_unique() {
    let (_dir, store) = open_store().await;
    store
        .insert_message_template("SITE_DOWN", "t", "b", "x")
        .await
        .expect("first insert");
    let err = store
        .insert_message_template("SITE_DOWN", "t2", "b2", "x2")
        .await
        .expect_err("duplicate event_name must fail");
    assert!(matches!(err, StorageError::Conflict { .. }));
}

#[tokio::test]
async fn test_notification_config_crud() {
    let (_dir, store) = open_store().await;
    let created = store
        .insert_notification_config("Slack", "https://hooks.slack.test/abc", Some("s3cr3t"), true)
        .await
        .unwrap();

    let active = store.list_active_notification_configs().await.unwrap();
    assert_eq!(active.len(), 1);

    let updated = store
        .update_notification_config(
            &created.id,
            &crate::store::notification::NotificationConfigUpdate {
                active: Some(false),
                ..Default::default()
            },
        )
        .await
        .unwrap()
        .expect("row exists");
    assert!(!updated.active);
    assert!(store
        .list_active_notification_configs()
        .await
        .unwrap()
        .is_empty());

    assert!(store.delete_notification_config(&created.id).await.unwrap());
    assert!(store.list_notification_configs().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_delivery_record_round_trip() {
    let (_dir, store) = open_store().await;
    store
        .insert_delivery_record("SSL_CRITICAL", "example.com", "Slack", false, Some("timeout"))
        .await
        .unwrap();
    store
        .insert_delivery_record("SSL_CRITICAL", "example.com", "Telegram", true, None)
        .await
        .unwrap();

    let records = store.list_delivery_records(10).await.unwrap();
    assert_eq!(records.len(), 2);
    assert!(records.iter().any(|r| r.ok && r.channel == "Telegram"));
}

#[tokio::test]
async fn test_user_create_and_lookup() {
    let (_dir, store) = open_store().await;
    assert_eq!(store.count_users().await.unwrap(), 0);
    store
        .create_user("admin", "$2b$12$hash", "admin", "active")
        .await
        .unwrap();
    let user = store
        .get_user_by_username("admin")
        .await
        .unwrap()
        .expect("user exists");
    assert_eq!(user.role, "admin");
    assert_eq!(user.status, "active");
    assert!(store.get_user_by_username("nobody").await.unwrap().is_none());
}
