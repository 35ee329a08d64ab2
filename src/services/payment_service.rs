//! Payment orchestration
//!
//! Submits a debit to the gateway, then polls the status endpoint at a fixed
//! interval until the gateway reports a final message or the attempts run
//! out. Submission is never retried: a second submission could charge the
//! subscriber twice.

use std::sync::Arc;

use rand::Rng;
use rand::distributions::Alphanumeric;
use serde_json::Value;
use tracing::{Span, debug, error, info, warn};

use crate::config::{AppConfig, PollingConfig};
use crate::error::PaymentError;
use crate::models::{
    DebitPayload, DebitRequest, GatewayTransaction, is_terminal_message, status_message,
    submitted_transaction_id,
};
use crate::ports::PaymentGateway;

pub const EXHAUSTED_MESSAGE: &str =
    "Impossible d'obtenir le statut de la transaction après plusieurs tentatives.";
pub const SERVER_ERROR_MESSAGE: &str = "Erreur de serveur lors de la vérification du statut.";
pub const STATUS_ERROR_MESSAGE: &str = "Erreur lors de la vérification du statut.";

/// Where the polling state machine stopped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PollOutcome {
    /// The gateway reported a final message, returned verbatim.
    Terminal(String),
    /// Every attempt returned a non-final message.
    Exhausted,
    /// The status endpoint answered with an HTML page.
    ServerError,
    /// The status endpoint answered with a non-2xx status.
    StatusError,
    /// A status call failed in transport or returned unparsable JSON.
    TransientError,
}

impl PollOutcome {
    pub fn status_message(&self) -> &str {
        match self {
            Self::Terminal(message) => message,
            Self::Exhausted => EXHAUSTED_MESSAGE,
            Self::ServerError => SERVER_ERROR_MESSAGE,
            Self::StatusError | Self::TransientError => STATUS_ERROR_MESSAGE,
        }
    }
}

#[derive(Debug, Clone)]
pub struct OrchestratorConfig {
    pub portfolio: String,
    pub disbursement: String,
    pub polling: PollingConfig,
    pub reference_length: usize,
}

impl From<&AppConfig> for OrchestratorConfig {
    fn from(config: &AppConfig) -> Self {
        Self {
            portfolio: config.gateway.portfolio.clone(),
            disbursement: config.gateway.disbursement.clone(),
            polling: config.polling,
            reference_length: config.reference_length,
        }
    }
}

pub struct PaymentOrchestrator {
    gateway: Arc<dyn PaymentGateway>,
    config: OrchestratorConfig,
}

impl PaymentOrchestrator {
    pub fn new(gateway: Arc<dyn PaymentGateway>, config: OrchestratorConfig) -> Self {
        Self { gateway, config }
    }

    /// Submit the debit and follow it to an outcome.
    ///
    /// Errors only come from the submission step; once the gateway has
    /// accepted the debit every result is a [`PollOutcome`].
    pub async fn process(&self, request: DebitRequest) -> Result<PollOutcome, PaymentError> {
        let transaction = self.submit(&request).await?;
        let outcome = self.poll_status(&transaction.transaction_id).await;
        info!(
            reference = %transaction.reference,
            transaction_id = %transaction.transaction_id,
            outcome = ?outcome,
            "payment flow finished"
        );
        Ok(outcome)
    }

    pub async fn submit(&self, request: &DebitRequest) -> Result<GatewayTransaction, PaymentError> {
        let reference = generate_reference(self.config.reference_length);
        Span::current().record("reference", reference.as_str());

        let payload = DebitPayload {
            amount: request.amount,
            reference: reference.clone(),
            client_msisdn: request.numero.clone(),
            portefeuille: self.config.portfolio.clone(),
            disbursement: self.config.disbursement.clone(),
            is_transfer: true,
        };
        debug!(amount = %payload.amount, %reference, "submitting debit");

        let response = self.gateway.submit_debit(&payload).await.map_err(|e| {
            error!(error = %e, "debit submission failed");
            PaymentError::Internal(e.to_string())
        })?;

        if !response.is_success() {
            warn!(status = response.status, body = %response.body, "gateway rejected debit");
            return Err(PaymentError::GatewayRejected {
                status: response.status,
                body: response.body,
            });
        }

        let transaction_id = serde_json::from_str::<Value>(&response.body)
            .ok()
            .as_ref()
            .and_then(submitted_transaction_id)
            .ok_or_else(|| {
                error!(body = %response.body, "submission response has no transaction id");
                PaymentError::InvalidPaymentResponse
            })?;

        Span::current().record("transaction_id", transaction_id.as_str());
        info!(%transaction_id, %reference, "debit accepted by gateway");

        Ok(GatewayTransaction {
            transaction_id,
            reference,
        })
    }

    /// Poll the status endpoint until a final message, a failure, or the
    /// attempt limit. The delay sits between attempts only.
    pub async fn poll_status(&self, transaction_id: &str) -> PollOutcome {
        let PollingConfig {
            max_attempts,
            delay,
        } = self.config.polling;

        for attempt in 1..=max_attempts {
            if attempt > 1 {
                debug!(?delay, "waiting before next status check");
                tokio::time::sleep(delay).await;
            }
            debug!(attempt, max_attempts, transaction_id, "checking transaction status");

            let response = match self.gateway.fetch_status(transaction_id).await {
                Ok(response) => response,
                Err(e) => {
                    warn!(attempt, error = %e, "status check failed");
                    return PollOutcome::TransientError;
                }
            };

            if response.is_html() {
                warn!(attempt, status = response.status, body = %response.body, "status endpoint returned HTML");
                return PollOutcome::ServerError;
            }

            if !response.is_success() {
                warn!(attempt, status = response.status, body = %response.body, "status endpoint returned an error");
                return PollOutcome::StatusError;
            }

            let body: Value = match serde_json::from_str(&response.body) {
                Ok(body) => body,
                Err(e) => {
                    warn!(attempt, error = %e, "status response is not JSON");
                    return PollOutcome::TransientError;
                }
            };

            match status_message(&body) {
                Some(message) if is_terminal_message(message) => {
                    info!(attempt, message, "final status reached");
                    return PollOutcome::Terminal(message.to_string());
                }
                Some(message) => debug!(attempt, message, "status not final yet"),
                None => debug!(attempt, "status response carries no message"),
            }
        }

        warn!(max_attempts, transaction_id, "status still pending after all attempts");
        PollOutcome::Exhausted
    }
}

/// Random idempotency reference drawn uniformly from `[0-9a-zA-Z]`.
pub fn generate_reference(length: usize) -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(length)
        .map(char::from)
        .collect()
}
