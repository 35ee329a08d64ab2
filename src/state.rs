//! Application state management
//!
//! Handlers share the authenticator and the orchestrator through this
//! cheaply cloneable state. Neither holds per-request data.

use std::sync::Arc;

use crate::config::AppConfig;
use crate::infrastructure::{HttpIdentityVerifier, HttpPaymentGateway};
use crate::ports::{IdentityVerifier, PaymentGateway};
use crate::services::auth_service::Authenticator;
use crate::services::payment_service::{OrchestratorConfig, PaymentOrchestrator};

#[derive(Clone)]
pub struct AppState {
    pub authenticator: Arc<Authenticator>,
    pub orchestrator: Arc<PaymentOrchestrator>,
}

impl AppState {
    /// State wired to the real identity provider and gateway.
    pub fn new(config: &AppConfig) -> Self {
        Self::with_ports(
            Arc::new(HttpIdentityVerifier::new(config.identity.clone())),
            Arc::new(HttpPaymentGateway::new(config.gateway.clone())),
            OrchestratorConfig::from(config),
        )
    }

    pub fn with_ports(
        verifier: Arc<dyn IdentityVerifier>,
        gateway: Arc<dyn PaymentGateway>,
        orchestrator_config: OrchestratorConfig,
    ) -> Self {
        Self {
            authenticator: Arc::new(Authenticator::new(verifier)),
            orchestrator: Arc::new(PaymentOrchestrator::new(gateway, orchestrator_config)),
        }
    }
}
