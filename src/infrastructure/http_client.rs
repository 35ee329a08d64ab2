use std::time::Duration;

use async_trait::async_trait;
use once_cell::sync::Lazy;
use reqwest::header::{ACCEPT, CONTENT_TYPE, HeaderMap, HeaderName, HeaderValue};
use serde::Serialize;

use crate::config::GatewayConfig;
use crate::models::DebitPayload;
use crate::ports::{GatewayError, GatewayResponse, PaymentGateway};

static CLIENT: Lazy<reqwest::Client> = Lazy::new(|| {
    reqwest::Client::builder()
        .pool_max_idle_per_host(50)
        .connect_timeout(Duration::from_secs(5))
        .timeout(Duration::from_secs(30))
        .build()
        .expect("Failed to build reqwest client")
});

pub async fn post_json<T: Serialize>(
    url: &str,
    headers: HeaderMap,
    payload: &T,
) -> Result<reqwest::Response, reqwest::Error> {
    CLIENT.post(url).headers(headers).json(payload).send().await
}

pub async fn get(url: &str, headers: HeaderMap) -> Result<reqwest::Response, reqwest::Error> {
    CLIENT.get(url).headers(headers).send().await
}

/// Gateway client speaking the credential-header protocol.
pub struct HttpPaymentGateway {
    config: GatewayConfig,
}

impl HttpPaymentGateway {
    pub fn new(config: GatewayConfig) -> Self {
        Self { config }
    }

    fn credential_headers(&self) -> Result<HeaderMap, GatewayError> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("*/*"));
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        for (name, value) in [
            ("x-client-id", &self.config.client_id),
            ("x-client-secret", &self.config.client_secret),
            ("x-wallet", &self.config.wallet),
        ] {
            let value = HeaderValue::from_str(value)
                .map_err(|_| GatewayError::Transport(format!("invalid value for header {name}")))?;
            headers.insert(HeaderName::from_static(name), value);
        }
        Ok(headers)
    }
}

#[async_trait]
impl PaymentGateway for HttpPaymentGateway {
    async fn submit_debit(&self, payload: &DebitPayload) -> Result<GatewayResponse, GatewayError> {
        let response = post_json(&self.config.submit_url, self.credential_headers()?, payload)
            .await
            .map_err(|e| GatewayError::Transport(e.to_string()))?;
        read_response(response).await
    }

    async fn fetch_status(&self, transaction_id: &str) -> Result<GatewayResponse, GatewayError> {
        let url = self.config.status_url(transaction_id);
        let response = get(&url, self.credential_headers()?)
            .await
            .map_err(|e| GatewayError::Transport(e.to_string()))?;
        read_response(response).await
    }
}

async fn read_response(response: reqwest::Response) -> Result<GatewayResponse, GatewayError> {
    let status = response.status().as_u16();
    let content_type = response
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .map(str::to_string);
    let body = response
        .text()
        .await
        .map_err(|e| GatewayError::Transport(e.to_string()))?;
    Ok(GatewayResponse {
        status,
        content_type,
        body,
    })
}
