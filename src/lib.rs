pub mod adapters;
pub mod cli;
pub mod config;
pub mod db;
pub mod domain;
pub mod error;
pub mod gateway;
pub mod handlers;
pub mod middleware;
pub mod ports;
pub mod services;
pub mod use_cases;
pub mod utils;
pub mod validation;

use std::sync::Arc;

use axum::{
    routing::{get, post},
    Router,
};

use crate::adapters::TemplateCompletionUrl;
use crate::config::Config;
use crate::domain::{keys, Fields};
use crate::gateway::ServerProtocolClient;
use crate::ports::{PaymentGateway, TransactionStore};
use crate::services::KeyedMutex;
use crate::use_cases::{HandleNotification, RegisterTransaction};

#[derive(Clone)]
pub struct AppState {
    pub register: Arc<RegisterTransaction>,
    pub notifications: Arc<HandleNotification>,
    pub store: Arc<dyn TransactionStore>,
    /// Fields added to a registration when the caller omits them.
    pub registration_defaults: Arc<Fields>,
}

impl AppState {
    /// Wires the protocol handlers from configuration and a store.
    pub fn from_config(config: &Config, store: Arc<dyn TransactionStore>) -> anyhow::Result<Self> {
        let gateway: Arc<dyn PaymentGateway> = Arc::new(ServerProtocolClient::with_circuit_breaker(
            config.gateway_register_url.clone(),
            config.vendor_name.clone(),
            config.gateway_failure_threshold,
            config.gateway_reset_timeout_secs,
        ));
        let resolver = Arc::new(TemplateCompletionUrl::parse(&config.completion_url)?);

        let key_locks = Arc::new(KeyedMutex::new());
        let register = RegisterTransaction::new(gateway.clone(), store.clone())
            .with_key_locks(key_locks.clone());
        let notifications = HandleNotification::new(gateway, store.clone(), resolver)
            .with_failure_redirect(config.failure_redirect_url.clone())
            .with_key_locks(key_locks);

        Ok(AppState {
            register: Arc::new(register),
            notifications: Arc::new(notifications),
            store,
            registration_defaults: Arc::new(registration_defaults(config)),
        })
    }
}

pub fn registration_defaults(config: &Config) -> Fields {
    Fields::new()
        .with(keys::VPS_PROTOCOL, config.vps_protocol.as_str())
        .with(keys::TX_TYPE, config.tx_type.as_str())
        .with(keys::VENDOR, config.vendor_name.as_str())
        .with(keys::NOTIFICATION_URL, config.notification_url.as_str())
}

pub fn create_app(state: AppState) -> Router {
    Router::new()
        .route("/health", get(handlers::health))
        .route("/transactions", post(handlers::registration::register_transaction))
        .route(
            "/transactions/:vendor_tx_code",
            get(handlers::transactions::get_transaction),
        )
        .route("/notification", post(handlers::notification::notification))
        .layer(axum::middleware::from_fn(
            middleware::request_logger_middleware,
        ))
        .with_state(state)
}
