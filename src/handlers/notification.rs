use axum::{
    body::Bytes,
    extract::State,
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
};
use tokio::sync::oneshot;

use crate::domain::RawNotification;
use crate::use_cases::Reply;
use crate::AppState;

/// Gateway callback endpoint.
///
/// The notification is processed on its own task so that recording it can
/// finish after the acknowledgement has been returned to the gateway.
pub async fn notification(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let content_type = headers
        .get(header::CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .map(str::to_string);
    let raw = RawNotification::new(content_type, body.to_vec());

    let (reply_tx, reply_rx) = oneshot::channel();
    let handler = state.notifications.clone();
    tokio::spawn(async move {
        let outcome = handler.execute(raw, reply_tx).await;
        tracing::debug!(?outcome, "Notification processed");
    });

    match reply_rx.await {
        Ok(Reply::Acknowledge { http_status, body }) => (
            StatusCode::from_u16(http_status).unwrap_or(StatusCode::OK),
            [(header::CONTENT_TYPE, "text/plain")],
            body,
        )
            .into_response(),
        Ok(Reply::Fatal(err)) => {
            tracing::error!(error = %err, "Notification could not be acknowledged");
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
        Err(_) => {
            tracing::error!("Notification task ended without a reply");
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}
