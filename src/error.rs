use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::ports::{GatewayError, ResolveError, StoreError};
use crate::validation::ValidationError;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProtocolError {
    #[error("Invalid character: {0}")]
    InvalidCharacter(#[from] ValidationError),

    #[error("Missing required field: {0}")]
    MissingField(String),

    #[error("Transaction already registered: {0}")]
    DuplicateTransaction(String),

    #[error("Gateway unavailable: {0}")]
    GatewayUnavailable(String),

    #[error("Malformed notification: {0}")]
    MalformedNotification(String),

    #[error("Registration rejected ({status}): {detail}")]
    RegistrationRejected { status: String, detail: String },

    #[error("Transaction not found: {vendor_tx_code}")]
    NotFound {
        vendor_tx_code: String,
        redirect_url: Option<String>,
    },

    #[error("Signature verification failed for transaction {vendor_tx_code}")]
    InvalidSignature {
        vendor_tx_code: String,
        redirect_url: Option<String>,
    },

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Unhandled error: {0}")]
    Unhandled(String),
}

impl ProtocolError {
    /// Acknowledgement `Status` for errors the gateway expects a formatted
    /// reply to. `None` means the error goes to the fatal channel.
    pub fn acknowledgement_status(&self) -> Option<&'static str> {
        match self {
            ProtocolError::NotFound { .. } => Some("ERROR"),
            ProtocolError::InvalidSignature { .. } => Some("INVALID"),
            _ => None,
        }
    }

    /// Redirect proposed to the gateway alongside a rejection.
    pub fn redirect_url(&self) -> Option<&str> {
        match self {
            ProtocolError::NotFound { redirect_url, .. }
            | ProtocolError::InvalidSignature { redirect_url, .. } => redirect_url.as_deref(),
            _ => None,
        }
    }

    /// Attaches a proposed redirect to the kinds that can carry one.
    pub fn with_redirect(self, url: Option<String>) -> Self {
        match self {
            ProtocolError::NotFound { vendor_tx_code, .. } => ProtocolError::NotFound {
                vendor_tx_code,
                redirect_url: url,
            },
            ProtocolError::InvalidSignature { vendor_tx_code, .. } => {
                ProtocolError::InvalidSignature {
                    vendor_tx_code,
                    redirect_url: url,
                }
            }
            other => other,
        }
    }

    fn status_code(&self) -> StatusCode {
        match self {
            ProtocolError::InvalidCharacter(_) | ProtocolError::MissingField(_) => {
                StatusCode::BAD_REQUEST
            }
            ProtocolError::MalformedNotification(_) => StatusCode::BAD_REQUEST,
            ProtocolError::DuplicateTransaction(_) => StatusCode::CONFLICT,
            ProtocolError::RegistrationRejected { .. } => StatusCode::UNPROCESSABLE_ENTITY,
            ProtocolError::GatewayUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            ProtocolError::NotFound { .. } => StatusCode::NOT_FOUND,
            ProtocolError::InvalidSignature { .. } => StatusCode::UNAUTHORIZED,
            ProtocolError::Storage(_) | ProtocolError::Unhandled(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl From<GatewayError> for ProtocolError {
    fn from(err: GatewayError) -> Self {
        match err {
            GatewayError::Unavailable(msg) => ProtocolError::GatewayUnavailable(msg),
            GatewayError::Malformed(msg) => ProtocolError::MalformedNotification(msg),
            GatewayError::Encoding(msg) => ProtocolError::Unhandled(msg),
        }
    }
}

impl From<StoreError> for ProtocolError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound(vendor_tx_code) => ProtocolError::NotFound {
                vendor_tx_code,
                redirect_url: None,
            },
            StoreError::Backend(msg) => ProtocolError::Storage(msg),
        }
    }
}

impl From<ResolveError> for ProtocolError {
    fn from(err: ResolveError) -> Self {
        ProtocolError::Unhandled(err.to_string())
    }
}

impl IntoResponse for ProtocolError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = Json(json!({
            "error": self.to_string(),
            "status": status.as_u16(),
        }));

        (status, body).into_response()
    }
}
