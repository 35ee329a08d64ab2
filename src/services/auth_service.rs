//! Request authentication
//!
//! Resolves the caller's bearer token to a subject id before any payment
//! work starts.

use std::sync::Arc;

use axum::http::HeaderMap;
use axum::http::header::AUTHORIZATION;
use tracing::{debug, warn};

use crate::error::PaymentError;
use crate::ports::IdentityVerifier;

const BEARER_PREFIX: &str = "Bearer ";

pub struct Authenticator {
    verifier: Arc<dyn IdentityVerifier>,
}

impl Authenticator {
    pub fn new(verifier: Arc<dyn IdentityVerifier>) -> Self {
        Self { verifier }
    }

    /// Returns the caller's uid.
    ///
    /// A missing or non-bearer header is [`PaymentError::Unauthorized`]; any
    /// failure past that point is [`PaymentError::AuthenticationFailed`] and
    /// its cause only reaches the logs.
    pub async fn authenticate(&self, headers: &HeaderMap) -> Result<String, PaymentError> {
        let Some(token) = bearer_token(headers) else {
            debug!("authorization header missing or malformed");
            return Err(PaymentError::Unauthorized);
        };

        match self.verifier.verify_token(token).await {
            Ok(uid) => {
                debug!(%uid, "caller authenticated");
                Ok(uid)
            }
            Err(e) => {
                warn!(error = %e, "token verification failed");
                Err(PaymentError::AuthenticationFailed)
            }
        }
    }
}

/// Extract the token from an `Authorization: Bearer <token>` header.
pub fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    let value = headers.get(AUTHORIZATION)?.to_str().ok()?;
    let token = value.strip_prefix(BEARER_PREFIX)?.trim();
    (!token.is_empty()).then_some(token)
}
