//! Mobile-money payment service library
//!
//! Authenticates callers, submits debits to a mobile-money gateway and
//! polls the gateway until the debit settles. The binary only wires this
//! library to the environment; tests drive [`create_router`] directly.

pub mod config;
pub mod error;
pub mod handlers;
pub mod infrastructure;
pub mod models;
pub mod ports;
pub mod services;
pub mod state;

use axum::Router;
use axum::routing::{any, get};

pub use config::AppConfig;
pub use error::PaymentError;
pub use models::TransactionStatus;
pub use state::AppState;

pub fn create_router(app_state: AppState) -> Router {
    Router::new()
        .route("/", get(handlers::root))
        .route("/payment", any(handlers::create_payment))
        .with_state(app_state)
}
