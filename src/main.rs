use mimalloc::MiMalloc;
use serde_json::Value;
use storeshim::{QueryShim, ShimError, Table};
use tracing::{error, info};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};
#[global_allocator]
static GLOBAL: MiMalloc = MiMalloc;

/// `storeshim [SQL [JSON-PARAMS]]`
///
/// With a statement, runs it through the raw query hatch and prints the rows.
/// Without one, prints a row count per table.
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cfg = &storeshim::config::CONFIG;

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(cfg.basic.loglevel.clone()));
    tracing_subscriber::registry()
        .with(env_filter)
        .with(
            tracing_subscriber::fmt::layer()
                .compact()
                .with_level(true)
                .with_target(false)
                .with_writer(std::io::stderr),
        )
        .init();

    info!(
        data_dir = %cfg.store.data_dir.display(),
        db_file = %cfg.store.db_file,
        loglevel = %cfg.basic.loglevel,
    );

    let mut args = std::env::args().skip(1);
    let sql = args.next();
    let params = match args.next() {
        Some(raw) => match serde_json::from_str::<Value>(&raw)? {
            Value::Array(items) => items,
            other => vec![other],
        },
        None => Vec::new(),
    };

    tokio::fs::create_dir_all(&cfg.store.data_dir).await?;

    let shim = QueryShim::new(cfg.store.clone());
    shim.connect().await?;

    // Disconnect on every path once connected.
    let outcome = run(&shim, sql, params).await;
    shim.disconnect().await;

    if let Err(e) = &outcome {
        error!(error = %e, "storeshim failed");
    }
    outcome.map_err(Into::into)
}

async fn run(shim: &QueryShim, sql: Option<String>, params: Vec<Value>) -> Result<(), ShimError> {
    match sql {
        Some(sql) => {
            let rows = shim.raw_query(sql, params).await?;
            println!("{}", serde_json::to_string_pretty(&rows)?);
        }
        None => {
            for table in Table::ALL {
                let rows = shim
                    .raw_query(
                        format!("SELECT COUNT(*) AS count FROM \"{}\"", table.name()),
                        Vec::new(),
                    )
                    .await?;
                let count = rows
                    .first()
                    .and_then(|r| r.get("count"))
                    .and_then(Value::as_i64)
                    .unwrap_or(0);
                println!("{:<16} {count}", table.name());
            }
        }
    }
    Ok(())
}
