use chrono::{Duration, TimeZone, Utc};
use serde_json::{Value, json};
use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::SystemTime;
use storeshim::config::StoreConfig;
use storeshim::db::{
    ExchangeRateCreate, ExchangeRatePatch, ExchangeRateUpsert, SupplierCreate, SupplierPatch,
    SupplierUpsert,
};
use storeshim::{FindMany, Lookup, QueryShim, Record, ShimError, Table, UpsertArgs};
use tokio::fs;

fn temp_store(tag: &str) -> StoreConfig {
    let mut hasher = DefaultHasher::new();
    SystemTime::now().hash(&mut hasher);
    tag.hash(&mut hasher);
    StoreConfig::new(
        std::env::temp_dir(),
        format!("test_{tag}_{}.sqlite", hasher.finish()),
    )
}

async fn remove_store(cfg: &StoreConfig) {
    let db_path = cfg.database_path();
    let wal_path = PathBuf::from(format!("{}-wal", db_path.to_string_lossy()));
    let shm_path = PathBuf::from(format!("{}-shm", db_path.to_string_lossy()));
    let _ = fs::remove_file(&wal_path).await;
    let _ = fs::remove_file(&shm_path).await;
    let _ = fs::remove_file(&db_path).await;
}

async fn count_where(shim: &QueryShim, table: Table, column: &str, value: &str) -> usize {
    shim.find_many(table, FindMany::new().eq(column, value))
        .await
        .unwrap()
        .len()
}

fn aed_upsert(rate_update: f64) -> ExchangeRateUpsert {
    let t0 = Utc.with_ymd_and_hms(2025, 3, 1, 12, 0, 0).unwrap();
    ExchangeRateUpsert {
        currency: "AED".to_string(),
        update: ExchangeRatePatch {
            rate: Some(rate_update),
            last_updated: Some(t0 + Duration::hours(1)),
            ..Default::default()
        },
        create: ExchangeRateCreate {
            rate: 3.67,
            is_stable: true,
            volatility: 0.01,
            last_updated: t0,
        },
    }
}

#[tokio::test]
async fn test_exchange_rate_upsert_scenario() {
    let cfg = temp_store("upsert_aed");
    let shim = QueryShim::new(cfg.clone());
    shim.connect().await.unwrap();
    let t0 = Utc.with_ymd_and_hms(2025, 3, 1, 12, 0, 0).unwrap();

    // 1. Empty table: the create branch runs.
    assert_eq!(count_where(&shim, Table::ExchangeRate, "currency", "AED").await, 0);
    let created = shim.upsert_exchange_rate(aed_upsert(3.68)).await.unwrap();
    assert_eq!(created.currency, "AED");
    assert!((created.rate - 3.67).abs() < f64::EPSILON);
    assert!(created.is_stable);
    assert!((created.volatility - 0.01).abs() < f64::EPSILON);
    assert_eq!(created.last_updated, t0);

    // 2. Same key again: the update branch runs, no new row.
    let updated = shim.upsert_exchange_rate(aed_upsert(3.68)).await.unwrap();
    assert_eq!(updated.id, created.id);
    assert!((updated.rate - 3.68).abs() < f64::EPSILON);
    assert!(updated.is_stable, "columns outside the patch are untouched");
    assert_eq!(updated.last_updated, t0 + Duration::hours(1));
    assert_eq!(count_where(&shim, Table::ExchangeRate, "currency", "AED").await, 1);

    // 3. Stored state matches the returned row.
    let stored = shim
        .find_unique(Table::ExchangeRate, Lookup::new("currency", "AED"))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(stored["rate"], json!(3.68));
    assert_eq!(stored["isStable"], json!(1));

    shim.disconnect().await;
    remove_store(&cfg).await;
}

#[tokio::test]
async fn test_sequential_upsert_is_idempotent() {
    let cfg = temp_store("upsert_idempotent");
    let shim = QueryShim::new(cfg.clone());
    shim.connect().await.unwrap();

    let args = UpsertArgs::from_json(&json!({
        "where": { "currency": "JPY" },
        "update": { "rate": 151.2, "volatility": 0.2 },
        "create": { "rate": 150.0, "volatility": 0.3, "lastUpdated": "2025-03-01T00:00:00Z" }
    }))
    .unwrap();

    let first = shim.upsert(Table::ExchangeRate, args.clone()).await.unwrap();
    let second = shim.upsert(Table::ExchangeRate, args.clone()).await.unwrap();
    let third = shim.upsert(Table::ExchangeRate, args).await.unwrap();

    assert_eq!(first["rate"], json!(150.0));
    assert_eq!(second["id"], first["id"]);
    assert_eq!(second, third);
    assert_eq!(second["rate"], json!(151.2));
    assert_eq!(second["currency"], "JPY");
    assert_eq!(count_where(&shim, Table::ExchangeRate, "currency", "JPY").await, 1);

    shim.disconnect().await;
    remove_store(&cfg).await;
}

#[tokio::test]
async fn test_concurrent_upserts_on_new_key_leave_one_row() {
    let cfg = temp_store("upsert_race");
    let shim = Arc::new(QueryShim::new(cfg.clone()));
    shim.connect().await.unwrap();

    let mut tasks = Vec::new();
    for i in 0..8_u32 {
        let shim = Arc::clone(&shim);
        tasks.push(tokio::spawn(async move {
            let args = UpsertArgs {
                lookup: Lookup::new("currency", "CHF"),
                update: json!({ "rate": 0.9 + f64::from(i) / 100.0 })
                    .as_object()
                    .unwrap()
                    .clone(),
                create: json!({ "rate": 0.88, "lastUpdated": "2025-03-01T00:00:00Z" })
                    .as_object()
                    .unwrap()
                    .clone(),
            };
            shim.upsert(Table::ExchangeRate, args).await
        }));
    }

    let mut ids = Vec::new();
    for task in tasks {
        let row = task.await.unwrap().expect("every racing upsert succeeds");
        ids.push(row["id"].clone());
    }
    ids.dedup();
    assert_eq!(ids.len(), 1, "all callers observed the same row");
    assert_eq!(count_where(&shim, Table::ExchangeRate, "currency", "CHF").await, 1);

    shim.disconnect().await;
    remove_store(&cfg).await;
}

#[tokio::test]
async fn test_supplier_upsert_synthesizes_id_once() {
    let cfg = temp_store("upsert_supplier");
    let shim = QueryShim::new(cfg.clone());
    shim.connect().await.unwrap();

    let upsert = |name: Option<&str>| SupplierUpsert {
        external_id: "ext-42".to_string(),
        update: SupplierPatch {
            name: name.map(str::to_string),
            ..Default::default()
        },
        create: SupplierCreate {
            name: "Acme".to_string(),
            country: Some("AE".to_string()),
            contact_email: None,
            rating: Some(4.5),
        },
    };

    let created = shim.upsert_supplier(upsert(None)).await.unwrap();
    assert!(created.id.starts_with("supp_"));
    assert_eq!(created.external_id, "ext-42");
    assert_eq!(created.name, "Acme");
    assert_eq!(created.country.as_deref(), Some("AE"));
    assert_eq!(created.contact_email, None);

    let renamed = shim.upsert_supplier(upsert(Some("Acme Trading"))).await.unwrap();
    assert_eq!(renamed.id, created.id, "id is only assigned on insert");
    assert_eq!(renamed.name, "Acme Trading");
    assert_eq!(renamed.created_at, created.created_at);
    assert!(renamed.updated_at >= created.updated_at);
    assert_eq!(count_where(&shim, Table::Supplier, "externalId", "ext-42").await, 1);

    shim.disconnect().await;
    remove_store(&cfg).await;
}

#[tokio::test]
async fn test_supplier_create_synthesizes_id() {
    let cfg = temp_store("create_supplier");
    let shim = QueryShim::new(cfg.clone());
    shim.connect().await.unwrap();

    let data: Record = json!({ "externalId": "ext-7", "name": "Bolt Co" })
        .as_object()
        .unwrap()
        .clone();
    let created = shim.create(Table::Supplier, data).await.unwrap();
    let id = created["id"].as_str().unwrap().to_string();
    assert!(id.starts_with("supp_"));

    let stored = shim
        .find_unique(Table::Supplier, Lookup::new("externalId", "ext-7"))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(stored["id"], Value::String(id));

    shim.disconnect().await;
    remove_store(&cfg).await;
}

#[tokio::test]
async fn test_upsert_requires_natural_key() {
    let cfg = temp_store("upsert_invalid");
    let shim = QueryShim::new(cfg.clone());
    shim.connect().await.unwrap();

    let by_id = UpsertArgs {
        lookup: Lookup::new("id", 1),
        update: Record::new(),
        create: Record::new(),
    };
    let err = shim.upsert(Table::ExchangeRate, by_id.clone()).await.unwrap_err();
    assert!(matches!(err, ShimError::InvalidQuery(_)));

    let err = shim.upsert(Table::User, by_id).await.unwrap_err();
    assert!(matches!(err, ShimError::InvalidQuery(_)));

    shim.disconnect().await;
    remove_store(&cfg).await;
}
