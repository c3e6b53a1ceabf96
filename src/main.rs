use std::net::SocketAddr;
use std::sync::Arc;

use clap::Parser;
use tokio::net::TcpListener;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use gateway_bridge::adapters::{InMemoryTransactionStore, PostgresTransactionStore};
use gateway_bridge::cli::{self, Cli, Commands, DbCommands, TxCommands};
use gateway_bridge::config::Config;
use gateway_bridge::ports::TransactionStore;
use gateway_bridge::{create_app, db, AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing();
    let config = Config::from_env()?;

    match cli.command.unwrap_or(Commands::Serve) {
        Commands::Serve => serve(config).await,
        Commands::Tx(TxCommands::Show { vendor_tx_code }) => {
            let store = open_store(&config).await?;
            cli::handle_tx_show(store.as_ref(), &vendor_tx_code).await
        }
        Commands::Db(DbCommands::Migrate) => cli::handle_db_migrate(&config).await,
        Commands::Config => cli::handle_config_validate(&config),
    }
}

fn init_tracing() {
    let filter =
        tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into());
    let json = std::env::var("LOG_FORMAT").map(|f| f == "json").unwrap_or(false);

    if json {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer())
            .init();
    }
}

async fn open_store(config: &Config) -> anyhow::Result<Arc<dyn TransactionStore>> {
    match &config.database_url {
        Some(database_url) => {
            let pool = db::create_pool(database_url).await?;
            db::run_migrations(&pool).await?;
            Ok(Arc::new(PostgresTransactionStore::new(pool)))
        }
        None => {
            tracing::warn!("DATABASE_URL not set; transactions are kept in memory only");
            Ok(Arc::new(InMemoryTransactionStore::new()))
        }
    }
}

async fn serve(config: Config) -> anyhow::Result<()> {
    let store = open_store(&config).await?;
    let state = AppState::from_config(&config, store)?;
    tracing::info!(
        register_url = %config.gateway_register_url,
        vendor = %config.vendor_name,
        "Gateway client initialized"
    );

    let app = create_app(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.server_port));
    tracing::info!("listening on {}", addr);

    let listener = TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
