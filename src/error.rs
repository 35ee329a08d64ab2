//! Caller-facing errors
//!
//! Every failure that ends a payment request early is a [`PaymentError`].
//! Rendering always produces `{"status_message": ...}`; causes that come
//! from collaborators are logged where they happen and never echoed back.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use thiserror::Error;

use crate::models::PaymentResponse;

#[derive(Error, Debug)]
pub enum PaymentError {
    #[error("method not allowed")]
    MethodNotAllowed,

    #[error("missing or malformed authorization header")]
    Unauthorized,

    #[error("identity verification failed")]
    AuthenticationFailed,

    #[error("missing parameters")]
    MissingParameters,

    /// The gateway refused the debit submission.
    #[error("gateway rejected debit with status {status}: {body}")]
    GatewayRejected { status: u16, body: String },

    #[error("invalid payment response")]
    InvalidPaymentResponse,

    #[error("internal error: {0}")]
    Internal(String),
}

impl PaymentError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::MethodNotAllowed => StatusCode::METHOD_NOT_ALLOWED,
            Self::Unauthorized => StatusCode::UNAUTHORIZED,
            Self::MissingParameters => StatusCode::BAD_REQUEST,
            Self::GatewayRejected { status, .. } => {
                StatusCode::from_u16(*status).unwrap_or(StatusCode::BAD_GATEWAY)
            }
            Self::AuthenticationFailed | Self::InvalidPaymentResponse | Self::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    pub fn status_message(&self) -> String {
        match self {
            Self::MethodNotAllowed => "Method not allowed.".to_string(),
            Self::Unauthorized => "Non autorisé.".to_string(),
            Self::MissingParameters => "Missing parameters.".to_string(),
            Self::GatewayRejected { body, .. } => format!("Erreur lors du paiement : {body}"),
            Self::InvalidPaymentResponse => "Invalid payment response.".to_string(),
            Self::AuthenticationFailed | Self::Internal(_) => "An error occurred.".to_string(),
        }
    }
}

impl IntoResponse for PaymentError {
    fn into_response(self) -> Response {
        let body = PaymentResponse {
            status_message: self.status_message(),
        };
        (self.status_code(), Json(body)).into_response()
    }
}
