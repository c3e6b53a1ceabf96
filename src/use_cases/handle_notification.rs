//! Handle notification use case.
//!
//! The gateway calls back once payment completes. The callback is verified
//! against the secret issued at registration, acknowledged, and only then
//! recorded against the transaction. Rejections the gateway understands
//! (`ERROR`, `INVALID`) are acknowledged with HTTP 200; anything else is
//! reported on the fatal channel.

use std::sync::Arc;

use tokio::sync::{oneshot, OwnedMutexGuard};

use crate::domain::{keys, Fields, RawNotification, Transaction};
use crate::error::ProtocolError;
use crate::ports::{CompletionUrlResolver, PaymentGateway, TransactionStore};
use crate::services::KeyedMutex;
use crate::utils::sanitize::sanitize_fields;

/// The single reply produced for a notification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reply {
    /// Formatted body to return to the gateway.
    Acknowledge { http_status: u16, body: String },
    /// No acknowledgement can be produced; the host answers with a 500.
    Fatal(ProtocolError),
}

/// What happened after the reply was sent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NotificationOutcome {
    Accepted { persisted: bool },
    /// Verified and acknowledged, but a notification was already recorded.
    Duplicate,
    Rejected,
    Failed,
}

/// A verified notification whose acknowledgement is ready to send.
struct Accepted {
    transaction: Transaction,
    request: Fields,
    response: Fields,
    body: String,
    _guard: Option<OwnedMutexGuard<()>>,
}

pub struct HandleNotification {
    gateway: Arc<dyn PaymentGateway>,
    store: Arc<dyn TransactionStore>,
    resolver: Arc<dyn CompletionUrlResolver>,
    failure_redirect_url: Option<String>,
    key_locks: Option<Arc<KeyedMutex>>,
}

impl HandleNotification {
    pub fn new(
        gateway: Arc<dyn PaymentGateway>,
        store: Arc<dyn TransactionStore>,
        resolver: Arc<dyn CompletionUrlResolver>,
    ) -> Self {
        Self {
            gateway,
            store,
            resolver,
            failure_redirect_url: None,
            key_locks: None,
        }
    }

    /// Redirect proposed to the gateway with `ERROR` and `INVALID` replies.
    pub fn with_failure_redirect(mut self, url: Option<String>) -> Self {
        self.failure_redirect_url = url;
        self
    }

    /// Serialises notifications that share a `VendorTxCode`.
    pub fn with_key_locks(mut self, locks: Arc<KeyedMutex>) -> Self {
        self.key_locks = Some(locks);
        self
    }

    /// Processes one notification and sends exactly one [`Reply`].
    ///
    /// The reply goes out before the transaction is written back; a write
    /// failure after that point is logged and does not change the reply.
    pub async fn execute(
        &self,
        raw: RawNotification,
        reply: oneshot::Sender<Reply>,
    ) -> NotificationOutcome {
        let accepted = match self.accept(&raw).await {
            Ok(accepted) => accepted,
            Err(err) => return self.reject(err, reply),
        };

        let vendor_tx_code = accepted.transaction.vendor_tx_code().to_string();
        send(
            reply,
            Reply::Acknowledge {
                http_status: 200,
                body: accepted.body.clone(),
            },
        );

        self.persist(accepted, &vendor_tx_code).await
    }

    async fn accept(&self, raw: &RawNotification) -> Result<Accepted, ProtocolError> {
        let request = self.gateway.parse_notification(raw).await?;
        let vendor_tx_code = request.get_or_empty(keys::VENDOR_TX_CODE).to_string();

        let guard = match &self.key_locks {
            Some(locks) => Some(locks.lock(&vendor_tx_code).await),
            None => None,
        };

        let transaction = self.store.get(&vendor_tx_code).await?;

        if !self
            .gateway
            .verify_signature(transaction.vps_tx_id(), transaction.security_key(), &request)
        {
            return Err(ProtocolError::InvalidSignature {
                vendor_tx_code,
                redirect_url: None,
            });
        }

        let redirect_url = self.resolver.resolve(raw, &transaction).await?;

        let response = Fields::new()
            .with(keys::STATUS, "OK")
            .with(keys::REDIRECT_URL_ACCEPTED, redirect_url);
        let body = self.gateway.format_response(&response)?;

        Ok(Accepted {
            transaction,
            request,
            response,
            body,
            _guard: guard,
        })
    }

    async fn persist(&self, accepted: Accepted, vendor_tx_code: &str) -> NotificationOutcome {
        let Accepted {
            transaction,
            request,
            response,
            _guard,
            ..
        } = accepted;

        if let Some(existing) = &transaction.notification {
            if existing.request != request {
                tracing::warn!(
                    vendor_tx_code = %vendor_tx_code,
                    fields = ?sanitize_fields(&request),
                    "Ignoring notification that differs from the recorded one"
                );
            } else {
                tracing::info!(vendor_tx_code = %vendor_tx_code, "Repeated notification acknowledged");
            }
            return NotificationOutcome::Duplicate;
        }

        let notified = transaction.with_notification(request, response);
        match self.store.put(&notified).await {
            Ok(()) => {
                tracing::info!(vendor_tx_code = %vendor_tx_code, "Notification recorded");
                NotificationOutcome::Accepted { persisted: true }
            }
            Err(err) => {
                tracing::error!(
                    vendor_tx_code = %vendor_tx_code,
                    error = %err,
                    "Notification acknowledged but not recorded"
                );
                NotificationOutcome::Accepted { persisted: false }
            }
        }
    }

    fn reject(&self, err: ProtocolError, reply: oneshot::Sender<Reply>) -> NotificationOutcome {
        let Some(status) = err.acknowledgement_status() else {
            tracing::error!(error = %err, "Notification failed");
            send(reply, Reply::Fatal(err));
            return NotificationOutcome::Failed;
        };

        let err = err.with_redirect(self.failure_redirect_url.clone());
        tracing::warn!(status = %status, error = %err, "Notification rejected");

        let mut response = Fields::new()
            .with(keys::STATUS, status)
            .with(keys::STATUS_DETAIL, err.to_string());
        if let Some(url) = err.redirect_url() {
            response.insert(keys::REDIRECT_URL, url);
        }

        match self.gateway.format_response(&response) {
            Ok(body) => {
                send(
                    reply,
                    Reply::Acknowledge {
                        http_status: 200,
                        body,
                    },
                );
                NotificationOutcome::Rejected
            }
            Err(secondary) => {
                let secondary = ProtocolError::from(secondary);
                tracing::error!(
                    error = %secondary,
                    cause = %err,
                    "Cannot format notification rejection"
                );
                send(reply, Reply::Fatal(secondary));
                NotificationOutcome::Failed
            }
        }
    }
}

fn send(reply: oneshot::Sender<Reply>, message: Reply) {
    if reply.send(message).is_err() {
        tracing::warn!("Notification reply dropped; gateway connection already closed");
    }
}
