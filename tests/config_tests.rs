//! Tests for configuration loading: defaults, YAML files, env overlay.

use std::io::Write;

use authgate::config::GateConfig;

#[test]
fn load_without_file_yields_documented_defaults() {
    let config = GateConfig::default();
    assert_eq!(config.addr, "0.0.0.0:8080");
    assert_eq!(
        config.public_paths,
        vec!["/teams", "/games", "/login", "/oauth2/**"]
    );
    assert_eq!(config.cors_allowed_origins, vec!["*"]);
    assert_eq!(config.cors_allowed_headers, vec!["*"]);
    assert!(config.cors_allow_credentials);
    assert_eq!(config.login_path, "/login");
    assert_eq!(config.oauth2_success_url, "/");
    assert_eq!(config.oauth2_failure_url, "/login?error=true");
    assert_eq!(config.session_cookie, "gate_session");
    assert!(config.uses_dev_signature());
}

#[test]
fn yaml_file_overrides_only_the_keys_it_sets() {
    let yaml = concat!(
        "addr: 127.0.0.1:9999\n",
        "public_paths:\n",
        "  - /status\n",
        "  - /docs/**\n",
        "cors_allow_credentials: false\n",
        "session_signature: yaml-signature\n",
    );
    let mut file = tempfile::NamedTempFile::new().expect("failed to create temp config");
    file.write_all(yaml.as_bytes())
        .expect("failed to write temp config");

    let config = GateConfig::from_yaml_file(file.path()).expect("config must parse");
    assert_eq!(config.addr, "127.0.0.1:9999");
    assert_eq!(config.public_paths, vec!["/status", "/docs/**"]);
    assert!(!config.cors_allow_credentials);
    assert_eq!(config.session_signature, "yaml-signature");
    assert!(!config.uses_dev_signature());
    // Unset keys keep their defaults.
    assert_eq!(config.login_path, "/login");
    assert_eq!(config.oauth2_failure_url, "/login?error=true");
}

#[test]
fn unreadable_file_is_an_error() {
    let result = GateConfig::from_yaml_file(std::path::Path::new("/nonexistent/gate.yaml"));
    assert!(result.is_err());
}

#[test]
fn env_overlay_overrides_defaults() {
    // Single test touches the environment to avoid races between tests.
    std::env::set_var("GATE_ADDR", "127.0.0.1:7777");
    std::env::set_var("GATE_PUBLIC_PATHS", "/ping, /pong/**");
    std::env::set_var("GATE_CORS_ALLOW_CREDENTIALS", "false");
    std::env::set_var("GATE_STACK_SIZE", "0x8000");

    let config = GateConfig::from_env();

    std::env::remove_var("GATE_ADDR");
    std::env::remove_var("GATE_PUBLIC_PATHS");
    std::env::remove_var("GATE_CORS_ALLOW_CREDENTIALS");
    std::env::remove_var("GATE_STACK_SIZE");

    assert_eq!(config.addr, "127.0.0.1:7777");
    assert_eq!(config.public_paths, vec!["/ping", "/pong/**"]);
    assert!(!config.cors_allow_credentials);
    assert_eq!(config.stack_size, 0x8000);
}
