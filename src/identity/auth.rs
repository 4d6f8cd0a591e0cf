use std::fmt;

use serde_json::{json, Value};

use crate::config::credentials::Credentials;

/// How the user is identified inside the password method.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UserIdentity {
    Id(String),
    Name { name: String, domain: DomainRef },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DomainRef {
    Id(String),
    Name(String),
}

/// Supported Identity v3 authentication methods.
#[derive(Clone, PartialEq, Eq)]
pub enum AuthMethod {
    Password {
        user: UserIdentity,
        password: String,
    },
    /// Password authentication scoped to a delegated trust.
    Trust {
        user: UserIdentity,
        password: String,
        trust_id: String,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthOptions {
    pub method: AuthMethod,
    pub allow_reauth: bool,
}

impl AuthMethod {
    /// Options for the exchange performed while reauthenticating. They can
    /// never start another reauthentication.
    pub fn without_reauth(&self) -> AuthOptions {
        match self {
            AuthMethod::Password { user, password } => AuthOptions {
                method: AuthMethod::Password {
                    user: user.clone(),
                    password: password.clone(),
                },
                allow_reauth: false,
            },
            AuthMethod::Trust {
                user,
                password,
                trust_id,
            } => AuthOptions {
                method: AuthMethod::Trust {
                    user: user.clone(),
                    password: password.clone(),
                    trust_id: trust_id.clone(),
                },
                allow_reauth: false,
            },
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            AuthMethod::Password { .. } => "password",
            AuthMethod::Trust { .. } => "trust",
        }
    }

    /// `POST /auth/tokens` request body.
    pub fn to_request_body(&self) -> Value {
        match self {
            AuthMethod::Password { user, password } => json!({
                "auth": {
                    "identity": password_identity(user, password),
                }
            }),
            AuthMethod::Trust {
                user,
                password,
                trust_id,
            } => json!({
                "auth": {
                    "identity": password_identity(user, password),
                    "scope": {
                        "OS-TRUST:trust": { "id": trust_id }
                    }
                }
            }),
        }
    }
}

// password stays out of logs
impl fmt::Debug for AuthMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AuthMethod::Password { user, .. } => f
                .debug_struct("Password")
                .field("user", user)
                .finish_non_exhaustive(),
            AuthMethod::Trust { user, trust_id, .. } => f
                .debug_struct("Trust")
                .field("user", user)
                .field("trust_id", trust_id)
                .finish_non_exhaustive(),
        }
    }
}

impl AuthOptions {
    pub fn without_reauth(&self) -> AuthOptions {
        self.method.without_reauth()
    }
}

impl From<&Credentials> for AuthOptions {
    fn from(credentials: &Credentials) -> Self {
        let user = if !credentials.user_id.is_empty() {
            UserIdentity::Id(credentials.user_id.to_owned())
        } else {
            let domain = if !credentials.domain_id.is_empty() {
                DomainRef::Id(credentials.domain_id.to_owned())
            } else {
                DomainRef::Name(credentials.domain_name.to_owned())
            };
            UserIdentity::Name {
                name: credentials.username.to_owned(),
                domain,
            }
        };
        let password = credentials.password.to_owned();

        let method = match credentials.trust_id.as_deref().filter(|id| !id.is_empty()) {
            Some(trust_id) => AuthMethod::Trust {
                user,
                password,
                trust_id: trust_id.to_owned(),
            },
            None => AuthMethod::Password { user, password },
        };

        AuthOptions {
            method,
            allow_reauth: true,
        }
    }
}

fn password_identity(user: &UserIdentity, password: &str) -> Value {
    let user = match user {
        UserIdentity::Id(id) => json!({ "id": id, "password": password }),
        UserIdentity::Name { name, domain } => {
            let domain = match domain {
                DomainRef::Id(id) => json!({ "id": id }),
                DomainRef::Name(name) => json!({ "name": name }),
            };
            json!({ "name": name, "domain": domain, "password": password })
        }
    };
    json!({
        "methods": ["password"],
        "password": { "user": user }
    })
}
