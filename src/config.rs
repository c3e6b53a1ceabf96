use anyhow::Context;
use dotenvy::dotenv;
use std::env;
use url::Url;

const MAX_RESET_TIMEOUT_SECS: u64 = 86_400;

#[derive(Debug, Clone)]
pub struct Config {
    pub server_port: u16,
    pub database_url: Option<String>,
    pub gateway_register_url: String,
    pub vendor_name: String,
    pub notification_url: String,
    pub completion_url: String,
    pub failure_redirect_url: Option<String>,
    pub tx_type: String,
    pub vps_protocol: String,
    pub gateway_failure_threshold: u32,
    pub gateway_reset_timeout_secs: u64,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        dotenv().ok(); // Load .env file if present

        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds the configuration from an arbitrary variable source.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
        let required = |key: &str| {
            lookup(key)
                .filter(|value| !value.trim().is_empty())
                .with_context(|| format!("{} must be set", key))
        };
        let optional = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        let config = Config {
            server_port: optional("SERVER_PORT")
                .unwrap_or_else(|| "3000".to_string())
                .parse()
                .context("SERVER_PORT must be a port number")?,
            database_url: optional("DATABASE_URL"),
            gateway_register_url: parse_url("GATEWAY_REGISTER_URL", required("GATEWAY_REGISTER_URL")?)?,
            vendor_name: required("GATEWAY_VENDOR_NAME")?,
            notification_url: parse_url("NOTIFICATION_URL", required("NOTIFICATION_URL")?)?,
            completion_url: parse_url("COMPLETION_URL", required("COMPLETION_URL")?)?,
            failure_redirect_url: optional("FAILURE_REDIRECT_URL")
                .map(|url| parse_url("FAILURE_REDIRECT_URL", url))
                .transpose()?,
            tx_type: optional("GATEWAY_TX_TYPE").unwrap_or_else(|| "PAYMENT".to_string()),
            vps_protocol: optional("GATEWAY_VPS_PROTOCOL").unwrap_or_else(|| "3.00".to_string()),
            gateway_failure_threshold: optional("GATEWAY_FAILURE_THRESHOLD")
                .unwrap_or_else(|| "3".to_string())
                .parse()
                .context("GATEWAY_FAILURE_THRESHOLD must be a positive integer")?,
            gateway_reset_timeout_secs: optional("GATEWAY_RESET_TIMEOUT_SECS")
                .unwrap_or_else(|| "60".to_string())
                .parse()
                .context("GATEWAY_RESET_TIMEOUT_SECS must be a number of seconds")?,
        };

        if config.gateway_failure_threshold == 0 {
            anyhow::bail!("GATEWAY_FAILURE_THRESHOLD must be at least 1");
        }
        if config.gateway_reset_timeout_secs > MAX_RESET_TIMEOUT_SECS {
            anyhow::bail!(
                "GATEWAY_RESET_TIMEOUT_SECS must be at most {}",
                MAX_RESET_TIMEOUT_SECS
            );
        }

        Ok(config)
    }
}

fn parse_url(key: &str, raw: String) -> anyhow::Result<String> {
    Url::parse(raw.trim()).with_context(|| format!("{} is not a valid URL", key))?;
    Ok(raw.trim().to_string())
}
