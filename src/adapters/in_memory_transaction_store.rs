//! In-process TransactionStore, used when no database is configured.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::domain::Transaction;
use crate::ports::{StoreError, StoreResult, TransactionStore};

#[derive(Clone, Default)]
pub struct InMemoryTransactionStore {
    transactions: Arc<RwLock<HashMap<String, Transaction>>>,
}

impl InMemoryTransactionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.transactions.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.transactions.read().await.is_empty()
    }
}

#[async_trait]
impl TransactionStore for InMemoryTransactionStore {
    async fn put(&self, transaction: &Transaction) -> StoreResult<()> {
        let key = transaction.vendor_tx_code();
        if key.is_empty() {
            return Err(StoreError::Backend(
                "transaction has no VendorTxCode".to_string(),
            ));
        }

        self.transactions
            .write()
            .await
            .insert(key.to_string(), transaction.clone());
        Ok(())
    }

    async fn get(&self, vendor_tx_code: &str) -> StoreResult<Transaction> {
        self.transactions
            .read()
            .await
            .get(vendor_tx_code)
            .cloned()
            .ok_or_else(|| StoreError::NotFound(vendor_tx_code.to_string()))
    }
}
