//! # Token Validator Library
//!
//! Validates external bearer tokens against an OpenStack Identity v3
//! provider, keeping the service's own session alive by reauthenticating
//! when the provider rejects it.
//!
//! Modules:
//! - `config`: credentials and service settings, YAML loading and validation
//! - `identity`: credential exchange, service catalog, session and reauth
//! - `validator`: token validation and the process-wide construct-once accessor
//! - `server`: HTTP validation endpoint and metrics route

pub mod config;
pub mod errors;
pub mod helpers;
pub mod identity;
pub mod observability;
pub mod server;
pub mod utils;
pub mod validator;

#[cfg(test)]
mod tests;

pub use crate::config::credentials::{Credentials, ServiceConfig};
pub use crate::errors::{AuthError, ConfigError, EndpointNotFound, InitError, ValidationError, ValidatorError};
pub use crate::validator::{TokenValidator, ValidatorCell};
