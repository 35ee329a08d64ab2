//! HTTP request handlers
//!
//! Handlers extract data from the request, call the services, and turn the
//! result into a `{"status_message": ...}` response.

use axum::Json;
use axum::body::Bytes;
use axum::extract::State;
use axum::http::{HeaderMap, Method};
use tracing::{Instrument, field, info_span};

use crate::error::PaymentError;
use crate::models::{DebitRequest, PaymentResponse};
use crate::state::AppState;

/// Root endpoint - liveness probe
pub async fn root() -> &'static str {
    "momo-pay up"
}

/// Debit a subscriber and wait for the gateway's verdict
///
/// Checks run in order: method, caller identity, body. Once the body is
/// valid the flow runs in its own task, so a caller hanging up does not
/// stop the status polling of a debit that is already in flight.
pub async fn create_payment(
    State(state): State<AppState>,
    method: Method,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<PaymentResponse>, PaymentError> {
    if method != Method::POST {
        tracing::debug!(%method, "rejecting non-POST payment request");
        return Err(PaymentError::MethodNotAllowed);
    }

    let uid = state.authenticator.authenticate(&headers).await?;
    let request = DebitRequest::from_body(&body)?;

    let span = info_span!(
        "payment",
        %uid,
        reference = field::Empty,
        transaction_id = field::Empty
    );
    let orchestrator = state.orchestrator.clone();
    let outcome = tokio::spawn(async move { orchestrator.process(request).await }.instrument(span))
        .await
        .map_err(|e| PaymentError::Internal(e.to_string()))??;

    Ok(Json(PaymentResponse {
        status_message: outcome.status_message().to_string(),
    }))
}
