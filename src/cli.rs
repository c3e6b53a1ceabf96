use clap::{Parser, Subcommand};

use crate::config::Config;
use crate::ports::TransactionStore;
use crate::utils::sanitize::sanitize_json;

#[derive(Parser)]
#[command(name = "gateway-bridge")]
#[command(about = "Gateway Bridge - payment registration and notification handler", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Start the HTTP server (default)
    Serve,

    /// Transaction inspection commands
    #[command(subcommand)]
    Tx(TxCommands),

    /// Database management commands
    #[command(subcommand)]
    Db(DbCommands),

    /// Configuration validation
    Config,
}

#[derive(Subcommand)]
pub enum TxCommands {
    /// Print a stored transaction with secrets masked
    Show {
        #[arg(value_name = "VENDOR_TX_CODE")]
        vendor_tx_code: String,
    },
}

#[derive(Subcommand)]
pub enum DbCommands {
    /// Run database migrations
    Migrate,
}

pub async fn handle_tx_show(store: &dyn TransactionStore, vendor_tx_code: &str) -> anyhow::Result<()> {
    let transaction = store.get(vendor_tx_code).await?;
    let value = sanitize_json(&serde_json::to_value(&transaction)?);

    println!("{}", serde_json::to_string_pretty(&value)?);
    if transaction.is_pending() {
        println!("(awaiting notification)");
    }

    Ok(())
}

pub async fn handle_db_migrate(config: &Config) -> anyhow::Result<()> {
    let Some(database_url) = &config.database_url else {
        anyhow::bail!("DATABASE_URL must be set to run migrations");
    };

    let pool = crate::db::create_pool(database_url).await?;
    tracing::info!("Running database migrations...");
    crate::db::run_migrations(&pool).await?;

    println!("✓ Database migrations completed");
    Ok(())
}

pub fn handle_config_validate(config: &Config) -> anyhow::Result<()> {
    tracing::info!("Validating configuration...");

    println!("Configuration:");
    println!("  Server Port: {}", config.server_port);
    println!(
        "  Database URL: {}",
        config
            .database_url
            .as_deref()
            .map(mask_password)
            .unwrap_or_else(|| "(none, in-memory store)".to_string())
    );
    println!("  Gateway Register URL: {}", config.gateway_register_url);
    println!("  Vendor: {}", config.vendor_name);
    println!("  Notification URL: {}", config.notification_url);
    println!("  Completion URL: {}", config.completion_url);
    if let Some(url) = &config.failure_redirect_url {
        println!("  Failure Redirect URL: {}", url);
    }
    println!(
        "  Circuit Breaker: {} failures, {}s reset",
        config.gateway_failure_threshold, config.gateway_reset_timeout_secs
    );

    println!("✓ Configuration is valid");
    Ok(())
}

fn mask_password(url: &str) -> String {
    if let Some(at_pos) = url.rfind('@') {
        if let Some(colon_pos) = url[..at_pos].rfind(':') {
            if let Some(slash_pos) = url[..colon_pos].rfind("//") {
                let prefix = &url[..slash_pos + 2];
                let user = &url[slash_pos + 2..colon_pos];
                let suffix = &url[at_pos..];
                return format!("{}{}:****{}", prefix, user, suffix);
            }
        }
    }
    url.to_string()
}
