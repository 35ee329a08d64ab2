//! Identity provider client
//!
//! Resolves ID tokens through an `accounts:lookup` style endpoint: the token
//! is posted as `{"idToken": ...}` and the subject is read from
//! `users[0].localId`.

use async_trait::async_trait;
use reqwest::header::HeaderMap;
use serde::{Deserialize, Serialize};

use crate::config::IdentityConfig;
use crate::infrastructure::http_client;
use crate::ports::{IdentityVerifier, VerifyError};

#[derive(Serialize)]
struct LookupRequest<'a> {
    #[serde(rename = "idToken")]
    id_token: &'a str,
}

#[derive(Deserialize)]
struct LookupResponse {
    #[serde(default)]
    users: Vec<LookupUser>,
}

#[derive(Deserialize)]
struct LookupUser {
    #[serde(rename = "localId")]
    local_id: String,
}

pub struct HttpIdentityVerifier {
    config: IdentityConfig,
}

impl HttpIdentityVerifier {
    pub fn new(config: IdentityConfig) -> Self {
        Self { config }
    }

    fn lookup_url(&self) -> String {
        format!("{}?key={}", self.config.lookup_url, self.config.api_key)
    }
}

#[async_trait]
impl IdentityVerifier for HttpIdentityVerifier {
    async fn verify_token(&self, token: &str) -> Result<String, VerifyError> {
        let response = http_client::post_json(
            &self.lookup_url(),
            HeaderMap::new(),
            &LookupRequest { id_token: token },
        )
        .await
        .map_err(|e| VerifyError::Transport(e.without_url().to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(VerifyError::Rejected(format!("{status}: {body}")));
        }

        let lookup: LookupResponse = response
            .json()
            .await
            .map_err(|e| VerifyError::InvalidResponse(e.without_url().to_string()))?;

        lookup
            .users
            .into_iter()
            .next()
            .map(|user| user.local_id)
            .filter(|uid| !uid.is_empty())
            .ok_or_else(|| VerifyError::Rejected("no user bound to token".to_string()))
    }
}
