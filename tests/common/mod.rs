#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use serde_json::{Value, json};
use tokio::time::Instant;
use tower::ServiceExt;

use momo_pay::config::PollingConfig;
use momo_pay::models::DebitPayload;
use momo_pay::ports::{GatewayError, GatewayResponse, IdentityVerifier, PaymentGateway, VerifyError};
use momo_pay::services::payment_service::OrchestratorConfig;
use momo_pay::{AppState, create_router};

pub const VALID_TOKEN: &str = "valid-token";
pub const UID: &str = "user-123";
pub const SUCCESS_FR: &str = "Transaction a ete effectue avec succes";
pub const PENDING: &str = "Transaction en cours de traitement";

pub fn json_reply(status: u16, body: Value) -> Result<GatewayResponse, GatewayError> {
    Ok(GatewayResponse {
        status,
        content_type: Some("application/json; charset=utf-8".to_string()),
        body: body.to_string(),
    })
}

pub fn status_reply(message: &str) -> Result<GatewayResponse, GatewayError> {
    json_reply(200, json!({ "status": { "message": message } }))
}

pub fn html_reply() -> Result<GatewayResponse, GatewayError> {
    Ok(GatewayResponse {
        status: 200,
        content_type: Some("text/html".to_string()),
        body: "<html><body>Bad Gateway</body></html>".to_string(),
    })
}

pub fn transport_failure() -> Result<GatewayResponse, GatewayError> {
    Err(GatewayError::Transport("connection reset".to_string()))
}

pub fn accepted_submission() -> Result<GatewayResponse, GatewayError> {
    json_reply(200, json!({ "transaction": { "id": "tx-001", "reference": "ignored" } }))
}

/// Gateway double with a scripted status sequence. Once the script runs
/// dry every status call answers with a pending message.
pub struct FakeGateway {
    submit_reply: Mutex<Option<Result<GatewayResponse, GatewayError>>>,
    status_script: Mutex<VecDeque<Result<GatewayResponse, GatewayError>>>,
    submitted: Mutex<Vec<Value>>,
    polled_ids: Mutex<Vec<String>>,
    poll_times: Mutex<Vec<Instant>>,
    submit_calls: AtomicUsize,
}

impl FakeGateway {
    pub fn new(
        submit_reply: Result<GatewayResponse, GatewayError>,
        status_script: Vec<Result<GatewayResponse, GatewayError>>,
    ) -> Arc<Self> {
        Arc::new(Self {
            submit_reply: Mutex::new(Some(submit_reply)),
            status_script: Mutex::new(status_script.into()),
            submitted: Mutex::new(Vec::new()),
            polled_ids: Mutex::new(Vec::new()),
            poll_times: Mutex::new(Vec::new()),
            submit_calls: AtomicUsize::new(0),
        })
    }

    pub fn submit_calls(&self) -> usize {
        self.submit_calls.load(Ordering::SeqCst)
    }

    pub fn status_calls(&self) -> usize {
        self.poll_times.lock().unwrap().len()
    }

    pub fn poll_gaps(&self) -> Vec<Duration> {
        self.poll_times
            .lock()
            .unwrap()
            .windows(2)
            .map(|pair| pair[1] - pair[0])
            .collect()
    }

    pub fn submitted_payloads(&self) -> Vec<Value> {
        self.submitted.lock().unwrap().clone()
    }

    pub fn polled_ids(&self) -> Vec<String> {
        self.polled_ids.lock().unwrap().clone()
    }
}

#[async_trait]
impl PaymentGateway for FakeGateway {
    async fn submit_debit(&self, payload: &DebitPayload) -> Result<GatewayResponse, GatewayError> {
        self.submit_calls.fetch_add(1, Ordering::SeqCst);
        self.submitted
            .lock()
            .unwrap()
            .push(serde_json::to_value(payload).unwrap());
        self.submit_reply
            .lock()
            .unwrap()
            .take()
            .expect("debit submitted more than once")
    }

    async fn fetch_status(&self, transaction_id: &str) -> Result<GatewayResponse, GatewayError> {
        self.poll_times.lock().unwrap().push(Instant::now());
        self.polled_ids.lock().unwrap().push(transaction_id.to_string());
        self.status_script
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| status_reply(PENDING))
    }
}

/// Accepts exactly [`VALID_TOKEN`].
#[derive(Default)]
pub struct FakeVerifier {
    calls: AtomicUsize,
}

impl FakeVerifier {
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl IdentityVerifier for FakeVerifier {
    async fn verify_token(&self, token: &str) -> Result<String, VerifyError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if token == VALID_TOKEN {
            Ok(UID.to_string())
        } else {
            Err(VerifyError::Rejected("token expired".to_string()))
        }
    }
}

pub fn orchestrator_config() -> OrchestratorConfig {
    OrchestratorConfig {
        portfolio: "portfolio-1".to_string(),
        disbursement: "disb-1".to_string(),
        polling: PollingConfig::default(),
        reference_length: 6,
    }
}

pub fn router(gateway: Arc<FakeGateway>, verifier: Arc<FakeVerifier>) -> Router {
    create_router(AppState::with_ports(verifier, gateway, orchestrator_config()))
}

pub fn payment_request(method: &str, token: Option<&str>, body: Value) -> Request<Body> {
    let mut builder = Request::builder()
        .method(method)
        .uri("/payment")
        .header("content-type", "application/json");
    if let Some(token) = token {
        builder = builder.header("authorization", format!("Bearer {token}"));
    }
    builder.body(Body::from(body.to_string())).unwrap()
}

pub async fn send(router: Router, request: Request<Body>) -> (StatusCode, String) {
    let response = router.oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let body: Value = serde_json::from_slice(&bytes).unwrap();
    let message = body["status_message"].as_str().unwrap().to_string();
    (status, message)
}

pub fn valid_body() -> Value {
    json!({ "numero": "0700000000", "amount": 1500 })
}
