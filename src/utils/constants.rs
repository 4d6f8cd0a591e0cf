//! Shared constants and invariants

pub const DEFAULT_HTTP_TIMEOUT_MS: u64 = 5000;
pub const DEFAULT_CONFIG_PATH: &str = "token-validator.yaml";

// Default validation endpoint filter
pub const DEFAULT_ENDPOINT_REGION: &str = "RegionOne";
pub const DEFAULT_ENDPOINT_SERVICE_TYPE: &str = "identity";

pub const DEFAULT_SERVER_HOST: &str = "127.0.0.1";
pub const DEFAULT_SERVER_PORT: &str = "8089";

// Identity v3 wire names
pub const TOKENS_PATH: &str = "/auth/tokens";
pub const AUTH_TOKEN_HEADER: &str = "X-Auth-Token";
pub const SUBJECT_TOKEN_HEADER: &str = "X-Subject-Token";
