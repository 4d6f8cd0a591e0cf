use tokio::sync::{Mutex, RwLock};
use tracing::{debug, info, warn};

use crate::errors::{AuthError, EndpointNotFound};
use crate::helpers::time::get_instant;
use crate::identity::auth::AuthOptions;
use crate::identity::catalog::{EndpointFilter, ServiceCatalog};
use crate::identity::client::{IdentityClient, IssuedToken};
use crate::observability::metrics::get_metrics;

static INITIAL_MSG: &str = "initial";
static REAUTH_MSG: &str = "reauth";
static OK_MSG: &str = "ok";
static ERROR_MSG: &str = "error";

/// Lifecycle of the service's own session.
///
/// ```text
/// Authenticated --(token rejected)--> Reauthenticating --(ok)--> Authenticated
///                                     Reauthenticating --(err)--> Unauthenticated
///                                     Reauthenticating --(cancelled)--> Unauthenticated
/// Unauthenticated --(token rejected)--> Reauthenticating
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Unauthenticated,
    Authenticated,
    Reauthenticating,
}

impl SessionState {
    fn begin_reauth(self) -> Result<SessionState, AuthError> {
        match self {
            SessionState::Authenticated | SessionState::Unauthenticated => {
                Ok(SessionState::Reauthenticating)
            }
            SessionState::Reauthenticating => Err(AuthError::ReauthNotPermitted(
                "reauthentication already in progress",
            )),
        }
    }

    fn finish_reauth(self, succeeded: bool) -> SessionState {
        debug_assert_eq!(self, SessionState::Reauthenticating);
        if succeeded {
            SessionState::Authenticated
        } else {
            SessionState::Unauthenticated
        }
    }
}

/// Snapshot of the session token. `generation` increases on every refresh.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionToken {
    pub value: String,
    pub generation: u64,
}

struct SessionInner {
    token: String,
    catalog: ServiceCatalog,
    state: SessionState,
    generation: u64,
}

/// The service's authenticated session with the identity provider.
pub struct Session {
    client: IdentityClient,
    endpoint: String,
    /// Present only when the session options allowed reauth; never allows it itself.
    reauth_options: Option<AuthOptions>,
    inner: RwLock<SessionInner>,
    reauth_lock: Mutex<()>,
}

impl Session {
    /// Run the initial credential exchange against `{endpoint}/auth/tokens`.
    pub async fn authenticate(
        client: IdentityClient,
        options: &AuthOptions,
        endpoint: &str,
    ) -> Result<Self, AuthError> {
        let metrics = get_metrics().await;
        let start = get_instant();

        let issued = client
            .create_token(endpoint, &options.method)
            .await
            .inspect_err(|e| {
                metrics.auth_requests.with_label_values(&[INITIAL_MSG, ERROR_MSG]).inc();
                warn!(endpoint = %endpoint, error = %e, "initial authentication failed");
            })?;

        metrics.auth_requests.with_label_values(&[INITIAL_MSG, OK_MSG]).inc();
        metrics.auth_duration.observe(start.elapsed().as_secs_f64());
        record_expiry(&issued).await;
        info!(
            endpoint = %endpoint,
            method = options.method.kind(),
            catalog_services = issued.catalog.len(),
            reauth = options.allow_reauth,
            "authenticated with identity provider"
        );

        Ok(Self {
            client,
            endpoint: endpoint.to_owned(),
            reauth_options: options.allow_reauth.then(|| options.without_reauth()),
            inner: RwLock::new(SessionInner {
                token: issued.value,
                catalog: issued.catalog,
                state: SessionState::Authenticated,
                generation: 0,
            }),
            reauth_lock: Mutex::new(()),
        })
    }

    pub fn client(&self) -> &IdentityClient {
        &self.client
    }

    pub fn can_reauth(&self) -> bool {
        self.reauth_options.is_some()
    }

    pub async fn token(&self) -> SessionToken {
        let inner = self.inner.read().await;
        SessionToken {
            value: inner.token.to_owned(),
            generation: inner.generation,
        }
    }

    pub async fn state(&self) -> SessionState {
        self.inner.read().await.state
    }

    pub async fn catalog(&self) -> ServiceCatalog {
        self.inner.read().await.catalog.clone()
    }

    /// Resolve against the most recent catalog, including one replaced by reauth.
    pub async fn locate_endpoint(&self, filter: &EndpointFilter) -> Result<String, EndpointNotFound> {
        self.inner.read().await.catalog.resolve_endpoint(filter)
    }

    /// Replace the session token after `rejected` was refused by the provider.
    ///
    /// Concurrent callers are serialized. A caller holding a token older than
    /// the current one gets the current token back without a new exchange.
    pub async fn reauthenticate(&self, rejected: &SessionToken) -> Result<SessionToken, AuthError> {
        let options = self
            .reauth_options
            .as_ref()
            .ok_or(AuthError::ReauthNotPermitted("session was created without reauth"))?;

        let _guard = self.reauth_lock.lock().await;
        {
            let mut inner = self.inner.write().await;
            if inner.generation != rejected.generation {
                debug!(
                    rejected = rejected.generation,
                    current = inner.generation,
                    "session already refreshed"
                );
                return Ok(SessionToken {
                    value: inner.token.to_owned(),
                    generation: inner.generation,
                });
            }
            // reauth_lock is held, so nobody else is mid-exchange
            if inner.state == SessionState::Reauthenticating {
                warn!("previous reauthentication was abandoned");
                inner.state = SessionState::Unauthenticated;
            }
            inner.state = inner.state.begin_reauth()?;
        }
        let mut in_flight = ReauthInFlight::new(&self.inner);

        let metrics = get_metrics().await;
        let start = get_instant();
        info!(generation = rejected.generation, "session token rejected, reauthenticating");

        match self.client.create_token(&self.endpoint, &options.method).await {
            Ok(issued) => {
                metrics.auth_requests.with_label_values(&[REAUTH_MSG, OK_MSG]).inc();
                metrics.auth_duration.observe(start.elapsed().as_secs_f64());
                record_expiry(&issued).await;

                let mut inner = self.inner.write().await;
                inner.token = issued.value;
                inner.catalog = issued.catalog;
                inner.generation += 1;
                inner.state = inner.state.finish_reauth(true);
                in_flight.disarm();
                info!(generation = inner.generation, "reauthenticated");
                Ok(SessionToken {
                    value: inner.token.to_owned(),
                    generation: inner.generation,
                })
            }
            Err(e) => {
                metrics.auth_requests.with_label_values(&[REAUTH_MSG, ERROR_MSG]).inc();
                let mut inner = self.inner.write().await;
                inner.state = inner.state.finish_reauth(false);
                in_flight.disarm();
                warn!(error = %e, "reauthentication failed");
                Err(e)
            }
        }
    }
}

/// Resets the state when a reauth future is dropped before the exchange ends,
/// e.g. on a caller timeout or a disconnected HTTP client.
struct ReauthInFlight<'a> {
    inner: &'a RwLock<SessionInner>,
    armed: bool,
}

impl<'a> ReauthInFlight<'a> {
    fn new(inner: &'a RwLock<SessionInner>) -> Self {
        Self { inner, armed: true }
    }

    fn disarm(&mut self) {
        self.armed = false;
    }
}

impl Drop for ReauthInFlight<'_> {
    fn drop(&mut self) {
        if !self.armed {
            return;
        }
        // a contended lock is left to the next reauthenticate call, which
        // clears the stale state under reauth_lock
        if let Ok(mut inner) = self.inner.try_write() {
            if inner.state == SessionState::Reauthenticating {
                inner.state = SessionState::Unauthenticated;
            }
        }
        debug!("reauthentication cancelled before completion");
    }
}

// session token stays out of logs
impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("endpoint", &self.endpoint)
            .field("reauth", &self.can_reauth())
            .finish_non_exhaustive()
    }
}

async fn record_expiry(issued: &IssuedToken) {
    if let Some(expires_at) = issued.expires_at {
        get_metrics()
            .await
            .session_token_expiry_unix
            .set(expires_at.timestamp());
        debug!(expires_at = %expires_at, "session token expiry");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reauth_cannot_start_while_reauthenticating() {
        assert_eq!(
            SessionState::Authenticated.begin_reauth().unwrap(),
            SessionState::Reauthenticating
        );
        assert_eq!(
            SessionState::Unauthenticated.begin_reauth().unwrap(),
            SessionState::Reauthenticating
        );
        assert!(matches!(
            SessionState::Reauthenticating.begin_reauth(),
            Err(AuthError::ReauthNotPermitted(_))
        ));
    }

    #[test]
    fn finishing_reauth_settles_state() {
        assert_eq!(
            SessionState::Reauthenticating.finish_reauth(true),
            SessionState::Authenticated
        );
        assert_eq!(
            SessionState::Reauthenticating.finish_reauth(false),
            SessionState::Unauthenticated
        );
    }
}
