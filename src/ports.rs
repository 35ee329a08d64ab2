//! Seams to the external systems the service talks to.

use async_trait::async_trait;
use thiserror::Error;

use crate::models::DebitPayload;

#[derive(Error, Debug)]
pub enum VerifyError {
    #[error("identity provider rejected the token: {0}")]
    Rejected(String),
    #[error("identity provider unreachable: {0}")]
    Transport(String),
    #[error("unexpected identity provider response: {0}")]
    InvalidResponse(String),
}

#[derive(Error, Debug)]
pub enum GatewayError {
    #[error("gateway request failed: {0}")]
    Transport(String),
}

/// Raw HTTP answer from the gateway. Interpretation is left to the caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GatewayResponse {
    pub status: u16,
    pub content_type: Option<String>,
    pub body: String,
}

impl GatewayResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    pub fn is_html(&self) -> bool {
        self.content_type
            .as_deref()
            .is_some_and(|ct| ct.to_ascii_lowercase().contains("text/html"))
    }
}

/// Resolves a bearer token to the subject it was issued to.
#[async_trait]
pub trait IdentityVerifier: Send + Sync {
    async fn verify_token(&self, token: &str) -> Result<String, VerifyError>;
}

/// Mobile-money gateway.
#[async_trait]
pub trait PaymentGateway: Send + Sync {
    async fn submit_debit(&self, payload: &DebitPayload) -> Result<GatewayResponse, GatewayError>;
    async fn fetch_status(&self, transaction_id: &str) -> Result<GatewayResponse, GatewayError>;
}
