use crate::db::models::{DbExchangeRate, DbSupplier, ExchangeRateUpsert, SupplierUpsert};
use crate::db::schema::SQLITE_INIT;
use crate::db::tables::{IdStrategy, Table};
use crate::db::value::{Record, arguments, record_from_row};
use crate::error::ShimError;
use crate::query::{FindMany, Lookup, Statement, UpsertArgs, compile};
use ractor::concurrency::JoinHandle;
use ractor::{Actor, ActorProcessingErr, ActorRef, RpcReplyPort, SpawnErr};
use serde_json::Value;
use sqlx::SqlitePool;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteSynchronous};
use std::{path::PathBuf, time::Duration};
use tracing::{debug, info};

/// Result of a write through the raw escape hatch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExecuteOutcome {
    pub last_insert_id: i64,
    pub rows_affected: u64,
}

#[derive(Debug)]
pub enum DbActorMessage {
    FindMany(Table, FindMany, RpcReplyPort<Result<Vec<Record>, ShimError>>),

    /// Single-column lookup; `None` when nothing matches.
    FindUnique(Table, Lookup, RpcReplyPort<Result<Option<Record>, ShimError>>),

    /// Insert and echo the payload plus its id.
    Create(Table, Record, RpcReplyPort<Result<Record, ShimError>>),

    /// Update by lookup and echo lookup + payload.
    Update(Table, Lookup, Record, RpcReplyPort<Result<Record, ShimError>>),

    /// Atomic insert-or-update on the table's natural key.
    Upsert(Table, UpsertArgs, RpcReplyPort<Result<Record, ShimError>>),

    UpsertExchangeRate(
        ExchangeRateUpsert,
        RpcReplyPort<Result<DbExchangeRate, ShimError>>,
    ),

    UpsertSupplier(SupplierUpsert, RpcReplyPort<Result<DbSupplier, ShimError>>),

    RawQuery(String, Vec<Value>, RpcReplyPort<Result<Vec<Record>, ShimError>>),

    RawExecute(
        String,
        Vec<Value>,
        RpcReplyPort<Result<ExecuteOutcome, ShimError>>,
    ),
}

#[derive(Clone)]
pub struct DbActorHandle {
    actor: ActorRef<DbActorMessage>,
}

impl DbActorHandle {
    pub async fn find_many(&self, table: Table, query: FindMany) -> Result<Vec<Record>, ShimError> {
        ractor::call!(self.actor, DbActorMessage::FindMany, table, query)
            .map_err(|e| ShimError::RactorError(format!("DbActor FindMany RPC failed: {e}")))?
    }

    pub async fn find_unique(
        &self,
        table: Table,
        lookup: Lookup,
    ) -> Result<Option<Record>, ShimError> {
        ractor::call!(self.actor, DbActorMessage::FindUnique, table, lookup)
            .map_err(|e| ShimError::RactorError(format!("DbActor FindUnique RPC failed: {e}")))?
    }

    pub async fn create(&self, table: Table, data: Record) -> Result<Record, ShimError> {
        ractor::call!(self.actor, DbActorMessage::Create, table, data)
            .map_err(|e| ShimError::RactorError(format!("DbActor Create RPC failed: {e}")))?
    }

    pub async fn update(
        &self,
        table: Table,
        lookup: Lookup,
        data: Record,
    ) -> Result<Record, ShimError> {
        ractor::call!(self.actor, DbActorMessage::Update, table, lookup, data)
            .map_err(|e| ShimError::RactorError(format!("DbActor Update RPC failed: {e}")))?
    }

    pub async fn upsert(&self, table: Table, args: UpsertArgs) -> Result<Record, ShimError> {
        ractor::call!(self.actor, DbActorMessage::Upsert, table, args)
            .map_err(|e| ShimError::RactorError(format!("DbActor Upsert RPC failed: {e}")))?
    }

    pub async fn upsert_exchange_rate(
        &self,
        upsert: ExchangeRateUpsert,
    ) -> Result<DbExchangeRate, ShimError> {
        ractor::call!(self.actor, DbActorMessage::UpsertExchangeRate, upsert).map_err(|e| {
            ShimError::RactorError(format!("DbActor UpsertExchangeRate RPC failed: {e}"))
        })?
    }

    pub async fn upsert_supplier(&self, upsert: SupplierUpsert) -> Result<DbSupplier, ShimError> {
        ractor::call!(self.actor, DbActorMessage::UpsertSupplier, upsert).map_err(|e| {
            ShimError::RactorError(format!("DbActor UpsertSupplier RPC failed: {e}"))
        })?
    }

    pub async fn raw_query(&self, sql: String, params: Vec<Value>) -> Result<Vec<Record>, ShimError> {
        ractor::call!(self.actor, DbActorMessage::RawQuery, sql, params)
            .map_err(|e| ShimError::RactorError(format!("DbActor RawQuery RPC failed: {e}")))?
    }

    pub async fn raw_execute(
        &self,
        sql: String,
        params: Vec<Value>,
    ) -> Result<ExecuteOutcome, ShimError> {
        ractor::call!(self.actor, DbActorMessage::RawExecute, sql, params)
            .map_err(|e| ShimError::RactorError(format!("DbActor RawExecute RPC failed: {e}")))?
    }

    /// Asks the actor to stop; the pool is closed in `post_stop`.
    pub(crate) fn stop(&self) {
        self.actor.stop(None);
    }
}

struct DbActorState {
    pool: SqlitePool,
}

struct DbActor;

#[ractor::async_trait]
impl Actor for DbActor {
    type Msg = DbActorMessage;
    type State = DbActorState;
    type Arguments = PathBuf;

    async fn pre_start(
        &self,
        _myself: ActorRef<Self::Msg>,
        path: Self::Arguments,
    ) -> Result<Self::State, ActorProcessingErr> {
        let connect_opts = SqliteConnectOptions::new()
            .filename(&path)
            .create_if_missing(true)
            .busy_timeout(Duration::from_secs(5))
            .journal_mode(SqliteJournalMode::Wal)
            .synchronous(SqliteSynchronous::Normal);

        // One connection for the life of the actor.
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect_with(connect_opts)
            .await?;

        apply_schema(&pool).await?;

        info!(path = %path.display(), "DbActor initialized");
        Ok(DbActorState { pool })
    }

    async fn post_stop(
        &self,
        _myself: ActorRef<Self::Msg>,
        state: &mut Self::State,
    ) -> Result<(), ActorProcessingErr> {
        state.pool.close().await;
        info!("DbActor connection closed");
        Ok(())
    }

    async fn handle(
        &self,
        _myself: ActorRef<Self::Msg>,
        message: Self::Msg,
        state: &mut Self::State,
    ) -> Result<(), ActorProcessingErr> {
        match message {
            DbActorMessage::FindMany(table, query, reply) => {
                let res = self.find_many(&state.pool, table, &query).await;
                let _ = reply.send(res);
            }
            DbActorMessage::FindUnique(table, lookup, reply) => {
                let res = self.find_unique(&state.pool, table, &lookup).await;
                let _ = reply.send(res);
            }
            DbActorMessage::Create(table, data, reply) => {
                let res = self.create(&state.pool, table, data).await;
                let _ = reply.send(res);
            }
            DbActorMessage::Update(table, lookup, data, reply) => {
                let res = self.update(&state.pool, table, lookup, data).await;
                let _ = reply.send(res);
            }
            DbActorMessage::Upsert(table, args, reply) => {
                let res = self.upsert(&state.pool, table, args).await;
                let _ = reply.send(res);
            }
            DbActorMessage::UpsertExchangeRate(upsert, reply) => {
                let res = match UpsertArgs::try_from(&upsert) {
                    Ok(args) => {
                        self.upsert_as::<DbExchangeRate>(&state.pool, Table::ExchangeRate, args)
                            .await
                    }
                    Err(e) => Err(e),
                };
                let _ = reply.send(res);
            }
            DbActorMessage::UpsertSupplier(upsert, reply) => {
                let res = match UpsertArgs::try_from(&upsert) {
                    Ok(args) => {
                        self.upsert_as::<DbSupplier>(&state.pool, Table::Supplier, args)
                            .await
                    }
                    Err(e) => Err(e),
                };
                let _ = reply.send(res);
            }
            DbActorMessage::RawQuery(sql, params, reply) => {
                let res = self.raw_query(&state.pool, &sql, &params).await;
                let _ = reply.send(res);
            }
            DbActorMessage::RawExecute(sql, params, reply) => {
                let res = self.raw_execute(&state.pool, &sql, &params).await;
                let _ = reply.send(res);
            }
        }
        Ok(())
    }
}

impl DbActor {
    async fn fetch_records(
        &self,
        pool: &SqlitePool,
        stmt: &Statement,
    ) -> Result<Vec<Record>, ShimError> {
        let rows = sqlx::query_with(&stmt.sql, stmt.arguments()?)
            .fetch_all(pool)
            .await?;
        let records = rows
            .iter()
            .map(record_from_row)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(records)
    }

    async fn find_many(
        &self,
        pool: &SqlitePool,
        table: Table,
        query: &FindMany,
    ) -> Result<Vec<Record>, ShimError> {
        let stmt = compile::find_many(table, query)?;
        let records = self.fetch_records(pool, &stmt).await?;
        debug!(
            table = table.name(),
            params = stmt.params.len(),
            rows = records.len(),
            "find_many"
        );
        Ok(records)
    }

    async fn find_unique(
        &self,
        pool: &SqlitePool,
        table: Table,
        lookup: &Lookup,
    ) -> Result<Option<Record>, ShimError> {
        let stmt = compile::find_unique(table, lookup)?;
        let row = sqlx::query_with(&stmt.sql, stmt.arguments()?)
            .fetch_optional(pool)
            .await?;
        Ok(row.as_ref().map(record_from_row).transpose()?)
    }

    async fn create(
        &self,
        pool: &SqlitePool,
        table: Table,
        mut data: Record,
    ) -> Result<Record, ShimError> {
        table.assign_generated_id(&mut data);
        let stmt = compile::insert(table, &data)?;
        let res = sqlx::query_with(&stmt.sql, stmt.arguments()?)
            .execute(pool)
            .await?;

        if table.id_strategy() == IdStrategy::RowId {
            data.insert("id".to_string(), Value::from(res.last_insert_rowid()));
        }
        debug!(table = table.name(), id = ?data.get("id"), "row created");
        Ok(data)
    }

    async fn update(
        &self,
        pool: &SqlitePool,
        table: Table,
        lookup: Lookup,
        data: Record,
    ) -> Result<Record, ShimError> {
        let stmt = compile::update(table, &lookup, &data)?;
        let res = sqlx::query_with(&stmt.sql, stmt.arguments()?)
            .execute(pool)
            .await?;

        let affected = res.rows_affected();
        debug!(
            table = table.name(),
            key = %lookup.column,
            affected,
            "db update applied"
        );

        let mut echoed = Record::new();
        echoed.insert(lookup.column, lookup.value);
        echoed.extend(data);
        Ok(echoed)
    }

    async fn upsert(
        &self,
        pool: &SqlitePool,
        table: Table,
        mut args: UpsertArgs,
    ) -> Result<Record, ShimError> {
        table.assign_generated_id(&mut args.create);
        let stmt = compile::upsert(table, &args)?;
        let row = sqlx::query_with(&stmt.sql, stmt.arguments()?)
            .fetch_one(pool)
            .await?;
        debug!(table = table.name(), key = %args.lookup.value, "db upsert applied");
        Ok(record_from_row(&row)?)
    }

    async fn upsert_as<T>(
        &self,
        pool: &SqlitePool,
        table: Table,
        mut args: UpsertArgs,
    ) -> Result<T, ShimError>
    where
        T: for<'r> sqlx::FromRow<'r, sqlx::sqlite::SqliteRow> + Send + Unpin,
    {
        table.assign_generated_id(&mut args.create);
        let stmt = compile::upsert(table, &args)?;
        let row = sqlx::query_as_with::<_, T, _>(&stmt.sql, stmt.arguments()?)
            .fetch_one(pool)
            .await?;
        debug!(table = table.name(), key = %args.lookup.value, "db upsert applied");
        Ok(row)
    }

    async fn raw_query(
        &self,
        pool: &SqlitePool,
        sql: &str,
        params: &[Value],
    ) -> Result<Vec<Record>, ShimError> {
        let rows = sqlx::query_with(sql, arguments(params)?)
            .fetch_all(pool)
            .await?;
        let records = rows
            .iter()
            .map(record_from_row)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(records)
    }

    async fn raw_execute(
        &self,
        pool: &SqlitePool,
        sql: &str,
        params: &[Value],
    ) -> Result<ExecuteOutcome, ShimError> {
        let res = sqlx::query_with(sql, arguments(params)?)
            .execute(pool)
            .await?;
        Ok(ExecuteOutcome {
            last_insert_id: res.last_insert_rowid(),
            rows_affected: res.rows_affected(),
        })
    }
}

/// Spawn the database actor for the store file at `path`.
///
/// Open and schema failures come back as the underlying `sqlx::Error`.
pub async fn spawn(path: PathBuf) -> Result<(DbActorHandle, JoinHandle<()>), ShimError> {
    let (actor, join) = Actor::spawn(None, DbActor, path)
        .await
        .map_err(startup_error)?;

    Ok((DbActorHandle { actor }, join))
}

fn startup_error(err: SpawnErr) -> ShimError {
    match err {
        SpawnErr::StartupFailed(inner) => match inner.downcast::<sqlx::Error>() {
            Ok(db) => ShimError::Database(*db),
            Err(other) => ShimError::RactorError(format!("DbActor startup failed: {other}")),
        },
        other => ShimError::RactorError(format!("failed to spawn DbActor: {other}")),
    }
}

async fn apply_schema(pool: &SqlitePool) -> Result<(), sqlx::Error> {
    for stmt in SQLITE_INIT.split(';') {
        let s = stmt.trim();
        if s.is_empty() {
            continue;
        }
        sqlx::query(s).execute(pool).await?;
    }
    Ok(())
}
