//! Ordered key-value payloads exchanged with the payment gateway.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::validation::ValidationError;

/// Field names used by the gateway protocol.
pub mod keys {
    pub const VENDOR_TX_CODE: &str = "VendorTxCode";
    pub const VENDOR: &str = "Vendor";
    pub const VPS_PROTOCOL: &str = "VPSProtocol";
    pub const TX_TYPE: &str = "TxType";
    pub const NOTIFICATION_URL: &str = "NotificationURL";
    pub const STATUS: &str = "Status";
    pub const STATUS_DETAIL: &str = "StatusDetail";
    pub const NEXT_URL: &str = "NextURL";
    pub const VPS_TX_ID: &str = "VPSTxId";
    pub const SECURITY_KEY: &str = "SecurityKey";
    pub const VPS_SIGNATURE: &str = "VPSSignature";
    /// Redirect key of an accepted notification acknowledgement.
    pub const REDIRECT_URL_ACCEPTED: &str = "RedirectUrl";
    /// Redirect key of a rejected notification acknowledgement.
    pub const REDIRECT_URL: &str = "RedirectURL";
}

/// Gateway statuses that mean a registration was accepted.
pub const ACCEPTED_REGISTRATION_STATUSES: &[&str] = &["OK", "OK REPEATED"];

/// An ordered mapping of field names to string values.
///
/// Insertion order is preserved so that a persisted request is exactly the
/// payload that was submitted.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Fields(IndexMap<String, String>);

impl Fields {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds fields from a JSON object, coercing scalar values to strings.
    ///
    /// Strings are kept verbatim, numbers and booleans use their display form
    /// and `null` becomes the empty string. Arrays and nested objects have no
    /// scalar form and are rejected.
    pub fn from_json(value: &Value) -> Result<Self, ValidationError> {
        let object = value
            .as_object()
            .ok_or_else(|| ValidationError::new("fields", "must be a JSON object"))?;

        let mut fields = Fields::new();
        for (key, value) in object {
            let coerced = match value {
                Value::String(s) => s.clone(),
                Value::Number(n) => n.to_string(),
                Value::Bool(b) => b.to_string(),
                Value::Null => String::new(),
                Value::Array(_) | Value::Object(_) => {
                    return Err(ValidationError::new(key, "must be a scalar value"));
                }
            };
            fields.insert(key.clone(), coerced);
        }

        Ok(fields)
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) -> Option<String> {
        self.0.insert(key.into(), value.into())
    }

    /// Builder-style insert.
    pub fn with(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.insert(key, value);
        self
    }

    /// Inserts `value` only when `key` is absent.
    pub fn insert_default(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.0.entry(key.into()).or_insert_with(|| value.into());
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(String::as_str)
    }

    /// Value for `key`, or the empty string when absent.
    pub fn get_or_empty(&self, key: &str) -> &str {
        self.get(key).unwrap_or_default()
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for Fields {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut fields = Fields::new();
        for (key, value) in iter {
            fields.insert(key, value);
        }
        fields
    }
}
