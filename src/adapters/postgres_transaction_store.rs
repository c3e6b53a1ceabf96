//! Postgres implementation of TransactionStore.

use async_trait::async_trait;
use sqlx::types::Json;
use sqlx::PgPool;

use crate::domain::{Exchange, Transaction};
use crate::ports::{StoreError, StoreResult, TransactionStore};

/// Postgres-backed transaction store. Each transaction is one row holding
/// its registration and notification exchanges as `json` (not `jsonb`, which
/// would reorder the fields).
#[derive(Clone)]
pub struct PostgresTransactionStore {
    pool: PgPool,
}

impl PostgresTransactionStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl TransactionStore for PostgresTransactionStore {
    async fn put(&self, transaction: &Transaction) -> StoreResult<()> {
        let vendor_tx_code = transaction.vendor_tx_code();
        if vendor_tx_code.is_empty() {
            return Err(StoreError::Backend(
                "transaction has no VendorTxCode".to_string(),
            ));
        }

        let registration = serde_json::to_string(&transaction.registration)
            .map_err(|e| StoreError::Backend(e.to_string()))?;
        let notification = transaction
            .notification
            .as_ref()
            .map(serde_json::to_string)
            .transpose()
            .map_err(|e| StoreError::Backend(e.to_string()))?;

        sqlx::query(
            r#"
            INSERT INTO gateway_transactions (vendor_tx_code, registration, notification)
            VALUES ($1, $2::json, $3::json)
            ON CONFLICT (vendor_tx_code) DO UPDATE
            SET registration = EXCLUDED.registration,
                notification = EXCLUDED.notification,
                updated_at = NOW()
            "#,
        )
        .bind(vendor_tx_code)
        .bind(registration)
        .bind(notification)
        .execute(&self.pool)
        .await
        .map_err(StoreError::from)?;

        Ok(())
    }

    async fn get(&self, vendor_tx_code: &str) -> StoreResult<Transaction> {
        let row = sqlx::query_as::<_, TransactionRow>(
            "SELECT registration, notification FROM gateway_transactions WHERE vendor_tx_code = $1",
        )
        .bind(vendor_tx_code)
        .fetch_optional(&self.pool)
        .await
        .map_err(StoreError::from)?;

        row.map(TransactionRow::into_domain)
            .ok_or_else(|| StoreError::NotFound(vendor_tx_code.to_string()))
    }
}

/// Internal row type for SQLx. Not exposed outside the adapter.
#[derive(Debug, sqlx::FromRow)]
struct TransactionRow {
    registration: Json<Exchange>,
    notification: Option<Json<Exchange>>,
}

impl TransactionRow {
    fn into_domain(self) -> Transaction {
        Transaction {
            registration: self.registration.0,
            notification: self.notification.map(|n| n.0),
        }
    }
}
