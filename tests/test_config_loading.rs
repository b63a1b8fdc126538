//! Configuration loading and validation tests
//!
//! Tests focus on BEHAVIOR of configuration loading, validation, and error
//! handling. We test observable outcomes, not implementation details of
//! TOML parsing.

use algoscope::config::{AppConfig, ConfigError};
use std::io::Write;
use tempfile::NamedTempFile;

#[test]
fn test_config_loads_successfully_from_valid_toml() {
    let mut temp_file = NamedTempFile::new().unwrap();
    writeln!(
        temp_file,
        r#"
[server]
port = 9090
bind = "127.0.0.1"

[llm]
provider = "anthropic"
model = "claude-3-5-haiku-20241022"
api_key_env = "ANTHROPIC_API_KEY"
temperature = 0.4

[session]
max_messages = 30
max_sessions = 256
idle_ttl_secs = 600

[limits]
max_array_len = 48
"#
    )
    .unwrap();

    let config = AppConfig::load_from_file(temp_file.path()).unwrap();

    assert_eq!(config.server.port, 9090);
    assert_eq!(config.server.bind, "127.0.0.1");

    let llm = config.llm.as_ref().unwrap();
    assert_eq!(llm.provider, "anthropic");
    assert_eq!(llm.model, "claude-3-5-haiku-20241022");
    assert_eq!(llm.api_key_env, "ANTHROPIC_API_KEY");
    assert_eq!(llm.temperature, Some(0.4));
    assert_eq!(llm.timeout_secs, 60);

    assert_eq!(config.session.max_messages, 30);
    assert_eq!(config.session.max_sessions, 256);
    assert_eq!(config.session.idle_ttl_secs, 600);

    // Unset limits keep their defaults
    assert_eq!(config.limits.max_array_len, 48);
    assert_eq!(config.limits.max_trace_steps, 20_000);
}

#[test]
fn test_empty_config_file_uses_defaults() {
    let mut temp_file = NamedTempFile::new().unwrap();
    writeln!(temp_file, "").unwrap();

    let config = AppConfig::load_from_file(temp_file.path()).unwrap();

    assert_eq!(config, AppConfig::default());
    assert_eq!(config.server.port, 8080);
    assert_eq!(config.server.bind, "0.0.0.0");
    assert!(config.llm.is_none());
    assert_eq!(config.session.max_messages, 20);
    assert_eq!(config.session.max_sessions, 1024);
    assert_eq!(config.session.idle_ttl_secs, 1800);
}

#[test]
fn test_missing_config_file_is_reported() {
    let result = AppConfig::load_from_file("/nonexistent/algoscope.toml");

    assert!(matches!(result, Err(ConfigError::FileNotFound { .. })));
}

#[test]
fn test_malformed_toml_is_reported_as_parse_error() {
    let mut temp_file = NamedTempFile::new().unwrap();
    writeln!(temp_file, "[server\nport = not closed").unwrap();

    let result = AppConfig::load_from_file(temp_file.path());

    assert!(matches!(result, Err(ConfigError::ParseError(_))));
}

#[test]
fn test_config_rejects_zero_port() {
    let mut temp_file = NamedTempFile::new().unwrap();
    writeln!(
        temp_file,
        r#"
[server]
port = 0
"#
    )
    .unwrap();

    let result = AppConfig::load_from_file(temp_file.path());

    assert!(matches!(result, Err(ConfigError::ValidationError { .. })));
}

#[test]
fn test_config_rejects_unparseable_bind_address() {
    let mut temp_file = NamedTempFile::new().unwrap();
    writeln!(
        temp_file,
        r#"
[server]
bind = "not-an-ip"
"#
    )
    .unwrap();

    let result = AppConfig::load_from_file(temp_file.path());

    assert!(matches!(result, Err(ConfigError::ValidationError { .. })));
}

#[test]
fn test_config_rejects_unknown_llm_provider() {
    let mut temp_file = NamedTempFile::new().unwrap();
    writeln!(
        temp_file,
        r#"
[llm]
provider = "acme"
model = "acme-mini"
"#
    )
    .unwrap();

    let result = AppConfig::load_from_file(temp_file.path());

    match result {
        Err(ConfigError::ValidationError { message }) => {
            assert!(message.contains("acme"), "message should name the provider");
        }
        other => panic!("expected a validation error, got {other:?}"),
    }
}

#[test]
fn test_config_rejects_malformed_llm_base_url() {
    let mut temp_file = NamedTempFile::new().unwrap();
    writeln!(
        temp_file,
        r#"
[llm]
provider = "openai"
model = "gpt-4o-mini"
base_url = "ftp://example.com"
"#
    )
    .unwrap();

    let result = AppConfig::load_from_file(temp_file.path());

    assert!(matches!(result, Err(ConfigError::ValidationError { .. })));
}

#[test]
fn test_config_rejects_session_cap_below_one_exchange() {
    let mut temp_file = NamedTempFile::new().unwrap();
    writeln!(
        temp_file,
        r#"
[session]
max_messages = 1
"#
    )
    .unwrap();

    let result = AppConfig::load_from_file(temp_file.path());

    assert!(matches!(result, Err(ConfigError::ValidationError { .. })));
}

#[test]
fn test_config_rejects_zero_limits() {
    let mut temp_file = NamedTempFile::new().unwrap();
    writeln!(
        temp_file,
        r#"
[limits]
max_trace_steps = 0
"#
    )
    .unwrap();

    let result = AppConfig::load_from_file(temp_file.path());

    assert!(matches!(result, Err(ConfigError::ValidationError { .. })));
}

#[test]
fn test_config_rejects_out_of_range_temperature() {
    let mut temp_file = NamedTempFile::new().unwrap();
    writeln!(
        temp_file,
        r#"
[llm]
provider = "anthropic"
model = "claude-3-5-haiku-20241022"
temperature = 3.5
"#
    )
    .unwrap();

    let result = AppConfig::load_from_file(temp_file.path());

    assert!(matches!(result, Err(ConfigError::ValidationError { .. })));
}

#[test]
fn test_api_key_resolution_from_environment() {
    let mut temp_file = NamedTempFile::new().unwrap();
    writeln!(
        temp_file,
        r#"
[llm]
provider = "openai"
model = "gpt-4o-mini"
api_key_env = "ALGOSCOPE_CONFIG_TEST_KEY"
"#
    )
    .unwrap();

    let config = AppConfig::load_from_file(temp_file.path()).unwrap();
    let llm = config.llm.as_ref().unwrap();

    std::env::remove_var("ALGOSCOPE_CONFIG_TEST_KEY");
    assert!(matches!(
        llm.resolve_api_key(),
        Err(ConfigError::EnvVarNotSet { .. })
    ));

    std::env::set_var("ALGOSCOPE_CONFIG_TEST_KEY", "sk-test-value");
    assert_eq!(llm.resolve_api_key().unwrap(), "sk-test-value");
    std::env::remove_var("ALGOSCOPE_CONFIG_TEST_KEY");
}

#[test]
fn test_listen_addr_combines_bind_and_port() {
    let mut temp_file = NamedTempFile::new().unwrap();
    writeln!(
        temp_file,
        r#"
[server]
port = 3000
bind = "127.0.0.1"
"#
    )
    .unwrap();

    let config = AppConfig::load_from_file(temp_file.path()).unwrap();
    let (ip, port) = config.listen_addr().unwrap();

    assert_eq!(ip.to_string(), "127.0.0.1");
    assert_eq!(port, 3000);
}
