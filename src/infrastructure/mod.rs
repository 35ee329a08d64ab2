//! Infrastructure layer
//!
//! reqwest-backed implementations of the gateway and identity ports.

pub mod http_client;
pub mod identity_client;

pub use http_client::HttpPaymentGateway;
pub use identity_client::HttpIdentityVerifier;
