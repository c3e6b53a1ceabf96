#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tokio::sync::Notify;

use gateway_bridge::adapters::InMemoryTransactionStore;
use gateway_bridge::domain::{Fields, RawNotification, Transaction};
use gateway_bridge::gateway::codec;
use gateway_bridge::ports::{
    CompletionUrlResolver, GatewayError, PaymentGateway, ResolveError, StoreError, StoreResult,
    TransactionStore,
};

/// Gateway double: canned registration reply, form-encoded notifications,
/// and a signature that is valid when `VPSSignature` equals
/// `<VPSTxId>:<SecurityKey>`.
pub struct FakeGateway {
    pub register_reply: Result<Fields, GatewayError>,
    pub fail_format: bool,
    pub registered: Mutex<Vec<Fields>>,
}

impl FakeGateway {
    pub fn replying(reply: Fields) -> Self {
        Self {
            register_reply: Ok(reply),
            fail_format: false,
            registered: Mutex::new(Vec::new()),
        }
    }

    pub fn unavailable() -> Self {
        Self {
            register_reply: Err(GatewayError::Unavailable("connection refused".to_string())),
            fail_format: false,
            registered: Mutex::new(Vec::new()),
        }
    }

    pub fn failing_format(mut self) -> Self {
        self.fail_format = true;
        self
    }

    pub fn register_calls(&self) -> usize {
        self.registered.lock().unwrap().len()
    }
}

#[async_trait]
impl PaymentGateway for FakeGateway {
    async fn register(&self, fields: &Fields) -> Result<Fields, GatewayError> {
        self.registered.lock().unwrap().push(fields.clone());
        self.register_reply.clone()
    }

    async fn parse_notification(&self, raw: &RawNotification) -> Result<Fields, GatewayError> {
        if raw.body.is_empty() {
            return Err(GatewayError::Malformed("empty body".to_string()));
        }
        Ok(codec::decode_form(&raw.body))
    }

    fn verify_signature(&self, vps_tx_id: &str, security_key: &str, notification: &Fields) -> bool {
        notification.get("VPSSignature") == Some(format!("{}:{}", vps_tx_id, security_key).as_str())
    }

    fn format_response(&self, fields: &Fields) -> Result<String, GatewayError> {
        if self.fail_format {
            return Err(GatewayError::Encoding("formatter exploded".to_string()));
        }
        codec::encode_lines(fields)
    }
}

/// In-memory store that records every write and can be told to fail or
/// to hold writes until released.
#[derive(Default)]
pub struct RecordingStore {
    inner: InMemoryTransactionStore,
    pub puts: Mutex<Vec<Transaction>>,
    pub fail_puts: Mutex<bool>,
    pub fail_gets: Mutex<bool>,
    pub gate: Option<Arc<Notify>>,
}

impl RecordingStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn gated(gate: Arc<Notify>) -> Self {
        Self {
            gate: Some(gate),
            ..Self::default()
        }
    }

    pub fn fail_puts(&self, fail: bool) {
        *self.fail_puts.lock().unwrap() = fail;
    }

    pub fn fail_gets(&self, fail: bool) {
        *self.fail_gets.lock().unwrap() = fail;
    }

    pub fn puts(&self) -> Vec<Transaction> {
        self.puts.lock().unwrap().clone()
    }

    pub async fn seed(&self, transaction: &Transaction) {
        self.inner.put(transaction).await.unwrap();
    }
}

#[async_trait]
impl TransactionStore for RecordingStore {
    async fn put(&self, transaction: &Transaction) -> StoreResult<()> {
        if let Some(gate) = &self.gate {
            gate.notified().await;
        }
        if *self.fail_puts.lock().unwrap() {
            return Err(StoreError::Backend("disk full".to_string()));
        }
        self.puts.lock().unwrap().push(transaction.clone());
        self.inner.put(transaction).await
    }

    async fn get(&self, vendor_tx_code: &str) -> StoreResult<Transaction> {
        if *self.fail_gets.lock().unwrap() {
            return Err(StoreError::Backend("connection reset".to_string()));
        }
        self.inner.get(vendor_tx_code).await
    }
}

pub struct FixedResolver(pub String);

#[async_trait]
impl CompletionUrlResolver for FixedResolver {
    async fn resolve(
        &self,
        _raw: &RawNotification,
        _transaction: &Transaction,
    ) -> Result<String, ResolveError> {
        Ok(self.0.clone())
    }
}

/// Resolver that always fails.
pub struct FailingResolver;

#[async_trait]
impl CompletionUrlResolver for FailingResolver {
    async fn resolve(
        &self,
        _raw: &RawNotification,
        _transaction: &Transaction,
    ) -> Result<String, ResolveError> {
        Err(ResolveError("no completion page for this vendor".to_string()))
    }
}

pub fn accepted_reply() -> Fields {
    Fields::new()
        .with("VPSProtocol", "3.00")
        .with("Status", "OK")
        .with("StatusDetail", "2014 : The Transaction was Registered Successfully.")
        .with("VPSTxId", "V1")
        .with("SecurityKey", "K1")
        .with("NextURL", "https://gw/pay/1")
}

pub fn registered_tx1() -> Transaction {
    Transaction::registered(
        Fields::new().with("VendorTxCode", "TX1").with("Amount", "10.00"),
        accepted_reply(),
    )
}

/// Form body for a notification signed the way `FakeGateway` expects.
pub fn signed_notification(vendor_tx_code: &str, signature: &str) -> RawNotification {
    let fields = Fields::new()
        .with("VPSProtocol", "3.00")
        .with("TxType", "PAYMENT")
        .with("VendorTxCode", vendor_tx_code)
        .with("VPSTxId", "V1")
        .with("Status", "OK")
        .with("VPSSignature", signature);
    RawNotification::form(codec::encode_form(&fields))
}
