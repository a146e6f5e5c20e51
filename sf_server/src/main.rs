//! Storefront wallet server.
//!
//! Serves the purchase, wallet, user and catalog HTTP API over two
//! PostgreSQL pools: users/wallets and the catalog.

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Error;
use log::info;
use pico_args::Arguments;
use sf_server::{
    api,
    config::{Overrides, ServerConfig},
    logging, metrics,
};
use storefront::{
    auth::AuthManager,
    catalog::CatalogRepository,
    db::{Database, PgWalletLedger},
    wallet::WalletManager,
};

const HELP: &str = "\
Run the storefront wallet server

USAGE:
  sf_server [OPTIONS]

OPTIONS:
  --bind            IP:PORT  Server socket bind address  [default: env SERVER_BIND or 127.0.0.1:3000]
  --db-url          URL      Users/wallets database      [default: env DATABASE_URL]
  --catalog-db-url  URL      Catalog database            [default: env CATALOG_DATABASE_URL or the users/wallets database]

FLAGS:
  --migrate                  Apply bundled migrations before serving
  -h, --help                 Print help information

ENVIRONMENT:
  SERVER_BIND              Server bind address (e.g., 0.0.0.0:8080)
  DATABASE_URL             PostgreSQL connection string
  CATALOG_DATABASE_URL     Catalog PostgreSQL connection string
  JWT_SECRET               JWT signing secret (required, >= 32 chars)
  PASSWORD_PEPPER          Password hashing pepper (required, >= 16 chars)
  DEFAULT_CURRENCY         Currency for new wallets and bare purchases [default: USD]
  WALLET_TX_TIMEOUT_SECS   Wallet transaction timeout [default: 10]
  METRICS_BIND             Prometheus listener address (optional)
  (See .env.example for all configuration options)
";

#[tokio::main]
async fn main() -> Result<(), Error> {
    // Load .env file if it exists
    let _ = dotenvy::dotenv();

    let mut pargs = Arguments::from_env();

    // Help has a higher priority and should be handled separately.
    if pargs.contains(["-h", "--help"]) {
        print!("{HELP}");
        std::process::exit(0);
    }

    let run_migrations = pargs.contains("--migrate");
    let overrides = Overrides {
        bind: pargs.opt_value_from_str::<_, SocketAddr>("--bind")?,
        database_url: pargs.opt_value_from_str("--db-url")?,
        catalog_database_url: pargs.opt_value_from_str("--catalog-db-url")?,
    };

    logging::init();

    let config = ServerConfig::from_env(overrides)?;
    config.validate()?;

    if let Some(addr) = config.metrics_bind {
        metrics::init_metrics(addr).map_err(anyhow::Error::msg)?;
        info!("Prometheus metrics listening on {addr}");
    }

    let db = Database::new(&config.database)
        .await
        .map_err(|e| anyhow::anyhow!("Failed to connect to database: {}", e))?;
    info!("Database connected successfully");

    if run_migrations {
        db.migrate()
            .await
            .map_err(|e| anyhow::anyhow!("Failed to run migrations: {}", e))?;
        info!("Migrations applied");
    }

    let pool = Arc::new(db.pool().clone());
    let catalog_pool = match &config.catalog_database {
        Some(catalog_config) => {
            let catalog_db = Database::new(catalog_config)
                .await
                .map_err(|e| anyhow::anyhow!("Failed to connect to catalog database: {}", e))?;
            info!("Catalog database connected successfully");
            Arc::new(catalog_db.pool().clone())
        }
        None => {
            info!("CATALOG_DATABASE_URL not set, serving catalog from the main database");
            pool.clone()
        }
    };

    let wallet_manager = Arc::new(WalletManager::new(
        Arc::new(PgWalletLedger::new(pool.clone())),
        config.wallet.to_wallet_config(),
    ));

    let auth_manager = Arc::new(
        AuthManager::new(
            pool.clone(),
            config.security.password_pepper.clone(),
            config.security.jwt_secret.clone(),
        )
        .with_access_token_ttl(config.security.access_token_ttl()?)
        .with_wallet_currency(config.wallet.default_currency.clone()),
    );

    let api_state = api::AppState {
        auth_manager,
        wallet_manager,
        catalog: Arc::new(CatalogRepository::new(catalog_pool)),
        database: db.clone(),
    };

    let app = api::create_router(api_state);

    let listener = tokio::net::TcpListener::bind(config.bind)
        .await
        .map_err(|e| anyhow::anyhow!("Failed to bind to {}: {}", config.bind, e))?;

    info!(
        "Server is running at http://{}. Press Ctrl+C to stop.",
        config.bind
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|e| anyhow::anyhow!("Server error: {}", e))?;

    info!("Shutting down server...");
    db.close().await;

    Ok(())
}

/// Graceful shutdown signal
async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        log::error!("Failed to install CTRL+C signal handler: {e}");
        std::future::pending::<()>().await;
    }
}
