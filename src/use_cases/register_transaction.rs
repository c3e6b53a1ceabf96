//! Register transaction use case.
//! Submits a transaction to the gateway and records the accepted reply.

use std::sync::Arc;

use crate::domain::{keys, Fields, Transaction, ACCEPTED_REGISTRATION_STATUSES};
use crate::error::ProtocolError;
use crate::ports::{PaymentGateway, StoreError, TransactionStore};
use crate::services::KeyedMutex;
use crate::utils::sanitize::sanitize_fields;
use crate::validation::{validate_fields, validate_required};

/// Output of a successful registration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Registration {
    pub vendor_tx_code: String,
    /// Where the payer is sent to complete payment.
    pub next_url: String,
}

pub struct RegisterTransaction {
    gateway: Arc<dyn PaymentGateway>,
    store: Arc<dyn TransactionStore>,
    key_locks: Option<Arc<KeyedMutex>>,
}

impl RegisterTransaction {
    pub fn new(gateway: Arc<dyn PaymentGateway>, store: Arc<dyn TransactionStore>) -> Self {
        Self {
            gateway,
            store,
            key_locks: None,
        }
    }

    /// Serialises registrations per `VendorTxCode`, so two concurrent
    /// requests for the same code cannot both pass the existence check.
    pub fn with_key_locks(mut self, locks: Arc<KeyedMutex>) -> Self {
        self.key_locks = Some(locks);
        self
    }

    /// Validates, registers and persists `fields`, in that order.
    ///
    /// The transaction is stored before the redirect target is returned, so a
    /// payer is never sent to the gateway for a transaction that could not be
    /// recorded. A `VendorTxCode` that is already stored is refused before
    /// the gateway is contacted; a recorded transaction is never replaced.
    pub async fn execute(&self, fields: Fields) -> Result<Registration, ProtocolError> {
        validate_fields(&fields)?;
        validate_required(&fields, keys::VENDOR_TX_CODE)
            .map_err(|e| ProtocolError::MissingField(e.field))?;

        let vendor_tx_code = fields.get_or_empty(keys::VENDOR_TX_CODE).to_string();
        tracing::debug!(
            vendor_tx_code = %vendor_tx_code,
            fields = ?sanitize_fields(&fields),
            "Registering transaction"
        );

        let _guard = match &self.key_locks {
            Some(locks) => Some(locks.lock(&vendor_tx_code).await),
            None => None,
        };

        match self.store.get(&vendor_tx_code).await {
            Ok(_) => {
                tracing::warn!(vendor_tx_code = %vendor_tx_code, "Transaction already registered");
                return Err(ProtocolError::DuplicateTransaction(vendor_tx_code));
            }
            Err(StoreError::NotFound(_)) => {}
            Err(e) => return Err(e.into()),
        }

        let response = self.gateway.register(&fields).await?;

        let status = response.get_or_empty(keys::STATUS);
        if !ACCEPTED_REGISTRATION_STATUSES.contains(&status) {
            let detail = response.get_or_empty(keys::STATUS_DETAIL).to_string();
            tracing::warn!(
                vendor_tx_code = %vendor_tx_code,
                status = %status,
                detail = %detail,
                "Gateway rejected registration"
            );
            return Err(ProtocolError::RegistrationRejected {
                status: status.to_string(),
                detail,
            });
        }

        let next_url = response
            .get(keys::NEXT_URL)
            .filter(|url| !url.is_empty())
            .map(str::to_string)
            .ok_or_else(|| {
                ProtocolError::Unhandled(format!(
                    "gateway accepted {} without a {}",
                    vendor_tx_code,
                    keys::NEXT_URL
                ))
            })?;

        self.store
            .put(&Transaction::registered(fields, response))
            .await?;

        tracing::info!(vendor_tx_code = %vendor_tx_code, "Transaction registered");

        Ok(Registration {
            vendor_tx_code,
            next_url,
        })
    }
}
