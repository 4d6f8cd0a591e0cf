//! Identity v3 session handling: credential exchange, service catalog and
//! reauthentication of the service's own session.

pub mod auth;
pub mod catalog;
pub mod client;
pub mod session;

pub use auth::{AuthMethod, AuthOptions, DomainRef, UserIdentity};
pub use catalog::{Availability, EndpointFilter, ServiceCatalog};
pub use client::{IdentityClient, IssuedToken, TokenStatus};
pub use session::{Session, SessionState, SessionToken};
