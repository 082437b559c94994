//! ledgerd - process entry point
//!
//! Owns config, logging and store lifecycle; the ledger core itself only
//! receives the connected store handle.

use anyhow::Context;
use ledgerd::config::AppConfig;
use ledgerd::gateway::{self, AppState};
use ledgerd::store::{LedgerStore, MemoryStore, PgStore};
use ledgerd::LedgerCore;
use std::sync::Arc;

fn get_env() -> String {
    let args: Vec<String> = std::env::args().collect();
    for i in 0..args.len() {
        if (args[i] == "--env" || args[i] == "-e") && i + 1 < args.len() {
            return args[i + 1].clone();
        }
    }
    "dev".to_string()
}

/// Get port override from command line (--port argument)
fn get_port_override() -> Option<u16> {
    let args: Vec<String> = std::env::args().collect();
    for i in 0..args.len() {
        if args[i] == "--port" && i + 1 < args.len() {
            return args[i + 1].parse().ok();
        }
    }
    None
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let env = get_env();
    let config = AppConfig::load(&env);
    let _log_guard = ledgerd::logging::init_logging(&config);

    tracing::info!("Starting ledgerd in {} mode", env);

    let store: Arc<dyn LedgerStore> = match &config.postgres_url {
        Some(url) => {
            let store = PgStore::connect(url)
                .await
                .context("failed to connect to PostgreSQL")?;
            store.migrate().await.context("schema migration failed")?;
            tracing::info!("using PostgreSQL store");
            Arc::new(store)
        }
        None => {
            tracing::warn!("postgres_url not configured - using in-memory store");
            Arc::new(MemoryStore::new())
        }
    };

    let core = LedgerCore::with_max_retries(store, config.ledger.max_retries);

    // Drain ledger events into the log until a real notification dispatcher
    // is attached.
    let mut events = core.subscribe();
    tokio::spawn(async move {
        while let Ok(event) = events.recv().await {
            tracing::info!(
                account_id = event.account_id,
                kind = %event.kind,
                "notify"
            );
        }
    });

    let state = AppState::new(core, &config.ledger);
    let app = gateway::router(state);

    let port = get_port_override().unwrap_or(config.gateway.port);
    let addr = format!("{}:{}", config.gateway.host, port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind {}", addr))?;
    tracing::info!("gateway listening on {}", addr);

    axum::serve(listener, app).await.context("server error")?;
    Ok(())
}
