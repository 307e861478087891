//! Configuration loading from files and environment overrides.

mod support;

use std::io::Write;

use stable_welfare::config::{AppConfig, ConfigError, InfraErrorPolicy};
use stable_welfare::db::repository::SessionRepository;
use stable_welfare::db::RepositoryFactory;
use support::with_scoped_env;

const ENV_KEYS: [&str; 5] = [
    "STABLE_CONFIG",
    "HOST",
    "PORT",
    "REPOSITORY_TYPE",
    "WELFARE_ON_INFRA_ERROR",
];

fn cleared<'a>(set: &[(&'a str, &'a str)]) -> Vec<(&'a str, Option<&'a str>)> {
    ENV_KEYS
        .iter()
        .map(|key| {
            let value = set.iter().find(|(k, _)| k == key).map(|(_, v)| *v);
            (*key, value)
        })
        .collect()
}

fn config_file(content: &str) -> tempfile::NamedTempFile {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(content.as_bytes()).unwrap();
    file
}

#[test]
fn test_load_reads_file_named_by_env() {
    let file = config_file(
        r#"
[server]
port = 9100

[welfare]
on_infra_error = "allow"
default_max_work_hours = 3.5
"#,
    );
    let path = file.path().to_str().unwrap().to_string();

    let config =
        with_scoped_env(&cleared(&[("STABLE_CONFIG", path.as_str())]), AppConfig::load).unwrap();
    assert_eq!(config.server.port, 9100);
    assert_eq!(config.server.host, "0.0.0.0");
    assert_eq!(config.welfare.on_infra_error, InfraErrorPolicy::Allow);
    assert_eq!(config.welfare.default_max_work_hours, 3.5);
    assert_eq!(config.welfare.default_rest_hours, 1.0);
}

#[test]
fn test_env_overrides_win_over_file() {
    let file = config_file(
        r#"
[server]
host = "127.0.0.1"
port = 9100
"#,
    );
    let path = file.path().to_str().unwrap().to_string();

    let config = with_scoped_env(
        &cleared(&[
            ("STABLE_CONFIG", path.as_str()),
            ("PORT", "7000"),
            ("REPOSITORY_TYPE", "memory"),
            ("WELFARE_ON_INFRA_ERROR", "allow"),
        ]),
        AppConfig::load,
    )
    .unwrap();
    assert_eq!(config.server.bind_address(), "127.0.0.1:7000");
    assert_eq!(config.repository.repo_type, "memory");
    assert_eq!(config.welfare.on_infra_error, InfraErrorPolicy::Allow);
}

#[test]
fn test_bad_env_values_are_reported_by_key() {
    let port = with_scoped_env(&cleared(&[("PORT", "not-a-port")]), || {
        let mut config = AppConfig::default();
        config.apply_env_overrides()
    });
    assert!(matches!(port, Err(ConfigError::Invalid { ref key, .. }) if key == "PORT"));

    let repo = with_scoped_env(&cleared(&[("REPOSITORY_TYPE", "postgres")]), || {
        let mut config = AppConfig::default();
        config.apply_env_overrides()
    });
    assert!(
        matches!(repo, Err(ConfigError::Invalid { ref key, .. }) if key == "REPOSITORY_TYPE")
    );

    let policy = with_scoped_env(&cleared(&[("WELFARE_ON_INFRA_ERROR", "maybe")]), || {
        let mut config = AppConfig::default();
        config.apply_env_overrides()
    });
    assert!(
        matches!(policy, Err(ConfigError::Invalid { ref key, .. }) if key == "WELFARE_ON_INFRA_ERROR")
    );
}

#[test]
fn test_blank_env_values_are_ignored() {
    let config = with_scoped_env(&cleared(&[("HOST", "  "), ("PORT", "")]), || {
        let mut config = AppConfig::default();
        config.apply_env_overrides().map(|_| config)
    })
    .unwrap();
    assert_eq!(config.server.bind_address(), "0.0.0.0:8080");
}

#[test]
fn test_missing_config_file_fails_load() {
    let result = with_scoped_env(
        &cleared(&[("STABLE_CONFIG", "/nonexistent/stable.toml")]),
        AppConfig::load,
    );
    assert!(matches!(result, Err(ConfigError::Read { .. })));
}

#[tokio::test]
async fn test_factory_builds_store_from_loaded_config() {
    let config = with_scoped_env(&cleared(&[("REPOSITORY_TYPE", "local")]), || {
        let mut config = AppConfig::default();
        config.apply_env_overrides().map(|_| config)
    })
    .unwrap();

    let repo = RepositoryFactory::from_config(&config).unwrap();
    assert!(repo.health_check().await.unwrap());
}
