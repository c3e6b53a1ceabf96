use axum::{
    extract::State,
    response::{IntoResponse, Redirect},
    Json,
};
use serde_json::Value;

use crate::domain::Fields;
use crate::error::ProtocolError;
use crate::AppState;

/// Registers a transaction and redirects the payer to the gateway.
///
/// The body is a flat JSON object of gateway fields; configured defaults
/// fill in any of `VPSProtocol`, `TxType`, `Vendor` and `NotificationURL`
/// the caller left out.
pub async fn register_transaction(
    State(state): State<AppState>,
    Json(payload): Json<Value>,
) -> Result<impl IntoResponse, ProtocolError> {
    let mut fields = Fields::from_json(&payload)?;
    for (key, value) in state.registration_defaults.iter() {
        fields.insert_default(key, value);
    }

    let registration = state.register.execute(fields).await?;

    Ok(Redirect::to(&registration.next_url))
}
