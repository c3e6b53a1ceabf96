//! Capabilities the protocol handlers depend on.
//! Implementations live in `gateway` and `adapters`; tests supply fakes.

use async_trait::async_trait;
use thiserror::Error;

use crate::domain::{Fields, RawNotification, Transaction};

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GatewayError {
    #[error("gateway unavailable: {0}")]
    Unavailable(String),
    #[error("malformed notification: {0}")]
    Malformed(String),
    #[error("cannot encode response: {0}")]
    Encoding(String),
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    #[error("transaction not found: {0}")]
    NotFound(String),
    #[error("storage backend error: {0}")]
    Backend(String),
}

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        StoreError::Backend(err.to_string())
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("cannot resolve completion url: {0}")]
pub struct ResolveError(pub String);

pub type StoreResult<T> = Result<T, StoreError>;

/// Wire exchange with the remote payment gateway.
#[async_trait]
pub trait PaymentGateway: Send + Sync {
    /// Submits a registration and returns the gateway's reply fields.
    async fn register(&self, fields: &Fields) -> Result<Fields, GatewayError>;

    /// Decodes an inbound notification.
    async fn parse_notification(&self, raw: &RawNotification) -> Result<Fields, GatewayError>;

    /// Checks the notification's signature against the secret issued at
    /// registration.
    fn verify_signature(&self, vps_tx_id: &str, security_key: &str, notification: &Fields) -> bool;

    /// Encodes an acknowledgement body.
    fn format_response(&self, fields: &Fields) -> Result<String, GatewayError>;
}

/// Durable transaction storage keyed by `VendorTxCode`.
///
/// `put` replaces the whole document. Concurrent read-modify-write cycles on
/// the same key must be serialised by the caller or by the store.
#[async_trait]
pub trait TransactionStore: Send + Sync {
    async fn put(&self, transaction: &Transaction) -> StoreResult<()>;

    async fn get(&self, vendor_tx_code: &str) -> StoreResult<Transaction>;
}

/// Chooses where the payer lands after a verified notification.
#[async_trait]
pub trait CompletionUrlResolver: Send + Sync {
    async fn resolve(
        &self,
        raw: &RawNotification,
        transaction: &Transaction,
    ) -> Result<String, ResolveError>;
}
