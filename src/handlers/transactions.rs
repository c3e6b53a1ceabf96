use axum::{
    extract::{Path, State},
    response::IntoResponse,
    Json,
};

use crate::error::ProtocolError;
use crate::utils::sanitize::sanitize_json;
use crate::AppState;

/// Looks up a stored transaction. Secrets are masked in the output.
pub async fn get_transaction(
    State(state): State<AppState>,
    Path(vendor_tx_code): Path<String>,
) -> Result<impl IntoResponse, ProtocolError> {
    let transaction = state.store.get(&vendor_tx_code).await?;
    let value = serde_json::to_value(&transaction)
        .map_err(|e| ProtocolError::Unhandled(e.to_string()))?;

    Ok(Json(sanitize_json(&value)))
}
