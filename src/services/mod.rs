//! Business logic services
//!
//! Services orchestrate domain operations and coordinate with infrastructure.

pub mod auth_service;
pub mod payment_service;
