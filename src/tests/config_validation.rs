#[cfg(test)]
mod tests {
    use std::fs::OpenOptions;
    use std::io::Write;
    use std::path::Path;
    use std::sync::Mutex;

    use serial_test::serial;
    use tracing::instrument::WithSubscriber;

    use crate::config::proc_loader::{file_to_config, parse_config};
    use crate::config::settings::LogFormat;
    use crate::errors::ConfigError;
    use crate::identity::catalog::{Availability, EndpointFilter};
    use crate::utils::config_loader;
    use crate::utils::logging::bootstrap_subscriber_with_writer;

    #[tokio::test]
    #[serial]
    async fn deploy_config_is_valid() {
        std::env::remove_var("KEYSTONE_AUTH_URL");
        std::env::remove_var("KEYSTONE_TRUST_ID");
        let path = Path::new("deploy/token-validator.yaml");
        let service_config = file_to_config(path)
            .await
            .expect("deploy/token-validator.yaml must exist in repo root for tests");

        assert_eq!(service_config.global.auth_url, "https://id.example/v3");
        assert_eq!(service_config.global.username, "svc");
        assert_eq!(service_config.global.domain_name, "default");
        assert_eq!(service_config.global.trust_id, None);
        assert_eq!(service_config.settings.endpoint, EndpointFilter::default());
        assert!(service_config.settings.metrics.is_enabled);
    }

    #[tokio::test]
    #[serial]
    async fn env_vars_are_expanded_from_file() {
        std::env::set_var("TOKEN_VALIDATOR_TEST_PASSWORD", "from-env-secret");
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"
global:
  auth_url: https://id.example/v3
  user_id: u-1
  password: ${{TOKEN_VALIDATOR_TEST_PASSWORD}}
  trust_id: ${{TOKEN_VALIDATOR_TEST_TRUST:trust-9}}
"#
        )
        .unwrap();

        let service_config = config_loader::run(file.path().to_str().unwrap()).await.unwrap();
        assert_eq!(service_config.global.password, "from-env-secret");
        assert_eq!(service_config.global.trust_id.as_deref(), Some("trust-9"));
    }

    #[tokio::test]
    async fn omitted_settings_take_defaults() {
        let cfg = parse_config(
            r#"
global:
  auth_url: http://keystone:5000/v3
  username: svc
  domain_id: d-1
  password: p
"#
            .to_string(),
        )
        .await
        .unwrap();

        let endpoint = &cfg.settings.endpoint;
        assert_eq!(endpoint.region.as_deref(), Some("RegionOne"));
        assert_eq!(endpoint.service_type, "identity");
        assert_eq!(endpoint.availability, Availability::Public);
        assert_eq!(cfg.settings.http.timeout_ms, 5000);
        assert!(cfg.settings.identity_endpoint.is_none());
        assert!(!cfg.settings.metrics.is_enabled);

        let logging = cfg.settings.logging.expect("logging default applied");
        assert_eq!(logging.level, "info");
        assert_eq!(logging.format, LogFormat::Compact);
    }

    #[tokio::test]
    async fn invalid_config_reports_all_errors() {
        let invalid_yaml = r#"
global:
  auth_url: keystone:5000/v3
  username: svc
settings:
  identity_endpoint: ftp://elsewhere
  endpoint:
    service_type: ""
    availability: internal
  http:
    timeout_ms: 0
  server:
    host: 127.0.0.1
    port: "not-a-port"
  metrics:
    path: metrics
  logging:
    level: loud
    format: json
"#;
        let errs = match parse_config(invalid_yaml.to_string()).await {
            Err(ConfigError::Invalid(errs)) => errs,
            other => panic!("invalid config unexpectedly accepted: {other:?}"),
        };

        let expect = |needle: &str| {
            assert!(
                errs.iter().any(|e| e.contains(needle)),
                "expected error containing '{}', got {:?}",
                needle,
                errs
            )
        };
        expect("global.auth_url");
        expect("requires domain_id or domain_name");
        expect("global.password is empty");
        expect("settings.identity_endpoint");
        expect("settings.endpoint.service_type");
        expect("timeout_ms");
        expect("settings.server.port");
        expect("settings.metrics.path");
        expect("settings.logging.level");
        assert_eq!(errs.len(), 9);
    }

    #[tokio::test]
    async fn missing_identity_is_reported() {
        let err = parse_config(
            r#"
global:
  auth_url: https://id.example/v3
  password: p
"#
            .to_string(),
        )
        .await
        .unwrap_err();
        assert!(err.to_string().contains("either user_id or username is required"));
    }

    #[tokio::test]
    async fn malformed_yaml_is_parse_error() {
        let err = parse_config("global: [unclosed".to_string()).await.unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));

        let err = parse_config("settings: {}".to_string()).await.unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)), "global section is required");
    }

    #[tokio::test]
    async fn missing_file_is_io_error() {
        let err = config_loader::run("/nonexistent/token-validator.yaml").await.unwrap_err();
        assert!(matches!(err, ConfigError::Io(_)));
    }

    #[tokio::test]
    async fn config_errors_reach_bootstrap_log() {
        let log = tempfile::NamedTempFile::new().unwrap();
        let log_writer = || Mutex::new(OpenOptions::new().append(true).open(log.path()).unwrap());
        let err = config_loader::run("/nonexistent/token-validator.yaml")
            .with_subscriber(bootstrap_subscriber_with_writer(None, log_writer()))
            .await
            .unwrap_err();
        assert!(matches!(err, ConfigError::Io(_)));

        let mut config = tempfile::NamedTempFile::new().unwrap();
        write!(config, "global:\n  auth_url: https://id.example/v3\n  user_id: u-1\n").unwrap();
        let err = config_loader::run(config.path().to_str().unwrap())
            .with_subscriber(bootstrap_subscriber_with_writer(None, log_writer()))
            .await
            .unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));

        let logged = std::fs::read_to_string(log.path()).unwrap();
        assert!(logged.contains("invalid config '/nonexistent/token-validator.yaml'"), "{logged}");
        assert!(logged.contains("global.password is empty"), "{logged}");
    }
}
