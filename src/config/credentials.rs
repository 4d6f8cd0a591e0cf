use serde::Deserialize;

use crate::config::settings::SettingsConfig;

/// ================================
/// Full service configuration
/// ================================
#[derive(Debug, Deserialize, Clone)]
pub struct ServiceConfig {
    pub global: Credentials,
    #[serde(default)]
    pub settings: SettingsConfig,
}

/// ================================
/// The service's own identity
/// ================================
#[derive(Clone, Deserialize, Default)]
pub struct Credentials {
    pub auth_url: String,
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub user_id: String,
    #[serde(default)]
    pub password: String,
    #[serde(default)]
    pub domain_id: String,
    #[serde(default)]
    pub domain_name: String,
    /// Trust to scope the session to, empty or absent for plain password auth.
    #[serde(default)]
    pub trust_id: Option<String>,
}

// password stays out of logs
impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("auth_url", &self.auth_url)
            .field("username", &self.username)
            .field("user_id", &self.user_id)
            .field("password", &"***")
            .field("domain_id", &self.domain_id)
            .field("domain_name", &self.domain_name)
            .field("trust_id", &self.trust_id)
            .finish()
    }
}
