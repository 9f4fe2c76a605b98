//! `QueryShim`: collection-style access to the embedded store.
//!
//! The host owns the instance and drives its lifecycle: `connect()` at
//! startup, `disconnect()` on every shutdown path. Until `connect()` succeeds
//! (and after `disconnect()`), every data operation fails with
//! [`ShimError::NotConnected`] without touching the store.

use ractor::concurrency::JoinHandle;
use serde_json::Value;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

use crate::config::StoreConfig;
use crate::db::{
    self, DbActorHandle, DbExchangeRate, DbSupplier, ExchangeRateUpsert, ExecuteOutcome, Record,
    SupplierUpsert, Table,
};
use crate::error::ShimError;
use crate::query::{FindMany, Lookup, UpsertArgs};

struct Connection {
    handle: DbActorHandle,
    join: JoinHandle<()>,
}

pub struct QueryShim {
    config: StoreConfig,
    conn: RwLock<Option<Connection>>,
}

impl QueryShim {
    pub fn new(config: StoreConfig) -> Self {
        Self {
            config,
            conn: RwLock::new(None),
        }
    }

    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    pub async fn is_connected(&self) -> bool {
        self.conn.read().await.is_some()
    }

    /// Opens the store file and applies the schema. No-op when already connected.
    pub async fn connect(&self) -> Result<(), ShimError> {
        let mut conn = self.conn.write().await;
        if conn.is_some() {
            debug!("connect() called on a connected store");
            return Ok(());
        }

        let path = self.config.database_path();
        let (handle, join) = db::spawn(path.clone()).await?;
        *conn = Some(Connection { handle, join });
        info!(path = %path.display(), "store ready");
        Ok(())
    }

    /// Closes the connection if open. Never fails; shutdown problems are logged.
    pub async fn disconnect(&self) {
        let Some(Connection { handle, join }) = self.conn.write().await.take() else {
            return;
        };

        handle.stop();
        match join.await {
            Ok(()) => info!("store disconnected"),
            Err(e) => warn!(error = %e, "store connection did not shut down cleanly"),
        }
    }

    async fn handle(&self) -> Result<DbActorHandle, ShimError> {
        self.conn
            .read()
            .await
            .as_ref()
            .map(|c| c.handle.clone())
            .ok_or(ShimError::NotConnected)
    }

    pub async fn find_many(&self, table: Table, query: FindMany) -> Result<Vec<Record>, ShimError> {
        self.handle().await?.find_many(table, query).await
    }

    /// Returns `Ok(None)` when no row matches.
    pub async fn find_unique(
        &self,
        table: Table,
        lookup: Lookup,
    ) -> Result<Option<Record>, ShimError> {
        self.handle().await?.find_unique(table, lookup).await
    }

    /// Inserts `data` and returns it with the row's `id` added. The row is not re-read.
    pub async fn create(&self, table: Table, data: Record) -> Result<Record, ShimError> {
        self.handle().await?.create(table, data).await
    }

    /// Updates by `lookup` and returns lookup + `data`. Succeeds even when no row matched.
    pub async fn update(
        &self,
        table: Table,
        lookup: Lookup,
        data: Record,
    ) -> Result<Record, ShimError> {
        self.handle().await?.update(table, lookup, data).await
    }

    /// Atomic insert-or-update on the table's natural key; returns the stored row.
    pub async fn upsert(&self, table: Table, args: UpsertArgs) -> Result<Record, ShimError> {
        self.handle().await?.upsert(table, args).await
    }

    pub async fn upsert_exchange_rate(
        &self,
        upsert: ExchangeRateUpsert,
    ) -> Result<DbExchangeRate, ShimError> {
        self.handle().await?.upsert_exchange_rate(upsert).await
    }

    pub async fn upsert_supplier(&self, upsert: SupplierUpsert) -> Result<DbSupplier, ShimError> {
        self.handle().await?.upsert_supplier(upsert).await
    }

    pub async fn raw_query(
        &self,
        sql: impl Into<String>,
        params: Vec<Value>,
    ) -> Result<Vec<Record>, ShimError> {
        self.handle().await?.raw_query(sql.into(), params).await
    }

    pub async fn raw_execute(
        &self,
        sql: impl Into<String>,
        params: Vec<Value>,
    ) -> Result<ExecuteOutcome, ShimError> {
        self.handle().await?.raw_execute(sql.into(), params).await
    }
}
