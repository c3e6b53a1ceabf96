//! Transaction domain entity.
//! The persisted record of one payment, keyed by its `VendorTxCode`.

use serde::{Deserialize, Serialize};

use super::fields::{keys, Fields};

/// A request sent together with the reply it produced.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Exchange {
    pub request: Fields,
    pub response: Fields,
}

impl Exchange {
    pub fn new(request: Fields, response: Fields) -> Self {
        Self { request, response }
    }
}

/// A registered transaction.
///
/// `registration` never changes once written. `notification` is attached
/// once, after a verified notification has been acknowledged.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    pub registration: Exchange,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notification: Option<Exchange>,
}

impl Transaction {
    /// A pending transaction for an accepted registration.
    pub fn registered(request: Fields, response: Fields) -> Self {
        Self {
            registration: Exchange::new(request, response),
            notification: None,
        }
    }

    pub fn vendor_tx_code(&self) -> &str {
        self.registration.request.get_or_empty(keys::VENDOR_TX_CODE)
    }

    /// Gateway transaction id from the registration reply.
    pub fn vps_tx_id(&self) -> &str {
        self.registration.response.get_or_empty(keys::VPS_TX_ID)
    }

    /// Notification signing secret from the registration reply.
    pub fn security_key(&self) -> &str {
        self.registration.response.get_or_empty(keys::SECURITY_KEY)
    }

    pub fn is_pending(&self) -> bool {
        self.notification.is_none()
    }

    /// Returns the transaction with `notification` attached. The
    /// registration block is carried over untouched.
    pub fn with_notification(self, request: Fields, response: Fields) -> Self {
        Self {
            registration: self.registration,
            notification: Some(Exchange::new(request, response)),
        }
    }
}
