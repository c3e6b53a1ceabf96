use async_trait::async_trait;
use failsafe::futures::CircuitBreaker as FuturesCircuitBreaker;
use failsafe::{backoff, failure_policy, Config, Error as FailsafeError, StateMachine};
use reqwest::{header, Client};
use std::time::Duration;

use super::{codec, signature};
use crate::domain::{keys, Fields, RawNotification};
use crate::ports::{GatewayError, PaymentGateway};

const FORM_CONTENT_TYPE: &str = "application/x-www-form-urlencoded";

/// HTTP client for the gateway's server-integration protocol
#[derive(Clone)]
pub struct ServerProtocolClient {
    client: Client,
    register_url: String,
    vendor_name: String,
    circuit_breaker: StateMachine<failure_policy::ConsecutiveFailures<backoff::EqualJittered>, ()>,
}

impl ServerProtocolClient {
    /// Creates a client that trips after 3 consecutive transport failures
    pub fn new(register_url: String, vendor_name: String) -> Self {
        Self::with_circuit_breaker(register_url, vendor_name, 3, 60)
    }

    /// Creates a client with custom circuit breaker configuration
    pub fn with_circuit_breaker(
        register_url: String,
        vendor_name: String,
        failure_threshold: u32,
        reset_timeout_secs: u64,
    ) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .unwrap_or_default();

        let backoff = backoff::equal_jittered(
            Duration::from_secs(reset_timeout_secs),
            Duration::from_secs(reset_timeout_secs.saturating_mul(2)),
        );
        let policy = failure_policy::consecutive_failures(failure_threshold, backoff);
        let circuit_breaker = Config::new().failure_policy(policy).build();

        ServerProtocolClient {
            client,
            register_url,
            vendor_name,
            circuit_breaker,
        }
    }

    /// Returns the current state of the circuit breaker
    pub fn circuit_state(&self) -> String {
        if self.circuit_breaker.is_call_permitted() {
            "closed".to_string()
        } else {
            "open".to_string()
        }
    }
}

#[async_trait]
impl PaymentGateway for ServerProtocolClient {
    async fn register(&self, fields: &Fields) -> Result<Fields, GatewayError> {
        let client = self.client.clone();
        let url = self.register_url.clone();
        let body = codec::encode_form(fields);

        let result = self
            .circuit_breaker
            .call(async move {
                let response = client
                    .post(&url)
                    .header(header::CONTENT_TYPE, FORM_CONTENT_TYPE)
                    .body(body)
                    .send()
                    .await
                    .map_err(|e| GatewayError::Unavailable(e.to_string()))?;

                if !response.status().is_success() {
                    return Err(GatewayError::Unavailable(format!(
                        "registration endpoint returned HTTP {}",
                        response.status()
                    )));
                }

                let text = response
                    .text()
                    .await
                    .map_err(|e| GatewayError::Unavailable(e.to_string()))?;
                codec::decode_lines(&text)
                    .map_err(|e| GatewayError::Unavailable(format!("unreadable reply: {}", e)))
            })
            .await;

        match result {
            Ok(fields) => Ok(fields),
            Err(FailsafeError::Rejected) => Err(GatewayError::Unavailable(
                "gateway circuit breaker is open".to_string(),
            )),
            Err(FailsafeError::Inner(e)) => Err(e),
        }
    }

    async fn parse_notification(&self, raw: &RawNotification) -> Result<Fields, GatewayError> {
        if let Some(content_type) = &raw.content_type {
            let mime = content_type.split(';').next().unwrap_or_default().trim();
            if !mime.eq_ignore_ascii_case(FORM_CONTENT_TYPE) {
                return Err(GatewayError::Malformed(format!(
                    "unexpected content type {:?}",
                    content_type
                )));
            }
        }

        if raw.body.is_empty() {
            return Err(GatewayError::Malformed("empty body".to_string()));
        }
        if std::str::from_utf8(&raw.body).is_err() {
            return Err(GatewayError::Malformed("body is not UTF-8".to_string()));
        }

        let fields = codec::decode_form(&raw.body);
        match fields.get(keys::VENDOR_TX_CODE) {
            Some(code) if !code.is_empty() => Ok(fields),
            _ => Err(GatewayError::Malformed(format!(
                "missing {}",
                keys::VENDOR_TX_CODE
            ))),
        }
    }

    fn verify_signature(&self, vps_tx_id: &str, security_key: &str, notification: &Fields) -> bool {
        signature::verify(vps_tx_id, security_key, &self.vendor_name, notification)
    }

    fn format_response(&self, fields: &Fields) -> Result<String, GatewayError> {
        codec::encode_lines(fields)
    }
}
