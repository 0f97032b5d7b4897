use super::*;
use serial_test::serial;
use std::env;
use std::net::IpAddr;
use std::path::PathBuf;

fn with_env_vars<F, R>(vars: &[(&str, &str)], f: F) -> R
where
    F: FnOnce() -> R,
{
    // SAFETY: Test code only, we accept the thread-safety risk in tests.
    for (key, value) in vars {
        unsafe { env::set_var(key, value) };
    }

    let result = f();

    // SAFETY: Test code only, we accept the thread-safety risk in tests.
    for (key, _) in vars {
        unsafe { env::remove_var(key) };
    }

    result
}

fn clear_prism_env() {
    // SAFETY: Test code only, we accept the thread-safety risk in tests.
    unsafe {
        env::remove_var("PRISM_PORT");
        env::remove_var("PRISM_BIND_ADDR");
        env::remove_var("PRISM_QDRANT_URL");
        env::remove_var("PRISM_STORE_PATH");
        env::remove_var("PRISM_STORE_URL");
        env::remove_var("PRISM_TEXT_MODEL_PATH");
        env::remove_var("PRISM_CODE_MODEL_PATH");
        env::remove_var("PRISM_CLIP_MODEL_PATH");
        env::remove_var("PRISM_RERANKER_PATH");
        env::remove_var("PRISM_PLOT_TRANSCRIBER_URL");
        env::remove_var("PRISM_OVERFETCH_MULTIPLIER");
        env::remove_var("PRISM_RERANK_TIMEOUT_MS");
        env::remove_var("PRISM_STARTUP_MODE");
    }
}

#[test]
fn test_default_config() {
    let config = Config::default();

    assert_eq!(config.port, 8080);
    assert_eq!(
        config.bind_addr,
        IpAddr::V4(std::net::Ipv4Addr::new(127, 0, 0, 1))
    );
    assert_eq!(config.qdrant_url, "http://localhost:6334");
    assert_eq!(config.store_path, PathBuf::from("./.objects"));
    assert!(config.store_url.is_none());
    assert!(config.text_model_path.is_none());
    assert!(config.code_model_path.is_none());
    assert!(config.clip_model_path.is_none());
    assert!(config.reranker_path.is_none());
    assert!(config.plot_transcriber_url.is_none());
    assert_eq!(config.overfetch_multiplier, 5);
    assert_eq!(config.startup_mode, StartupMode::Lazy);
}

#[test]
fn test_socket_addr() {
    let config = Config::default();
    assert_eq!(config.socket_addr(), "127.0.0.1:8080");

    let config = Config {
        port: 3000,
        bind_addr: IpAddr::V4(std::net::Ipv4Addr::new(0, 0, 0, 0)),
        ..Default::default()
    };
    assert_eq!(config.socket_addr(), "0.0.0.0:3000");
}

#[test]
#[serial]
fn test_from_env_with_defaults() {
    clear_prism_env();

    let config = Config::from_env().expect("should parse with defaults");

    assert_eq!(config.port, 8080);
    assert_eq!(config.overfetch_multiplier, 5);
    assert_eq!(config.startup_mode, StartupMode::Lazy);
}

#[test]
#[serial]
fn test_from_env_with_overrides() {
    clear_prism_env();

    let config = with_env_vars(
        &[
            ("PRISM_PORT", "9999"),
            ("PRISM_BIND_ADDR", "0.0.0.0"),
            ("PRISM_QDRANT_URL", "http://qdrant:6334"),
            ("PRISM_OVERFETCH_MULTIPLIER", "8"),
            ("PRISM_STARTUP_MODE", "eager"),
        ],
        || Config::from_env().expect("should parse overrides"),
    );

    assert_eq!(config.port, 9999);
    assert_eq!(
        config.bind_addr,
        IpAddr::V4(std::net::Ipv4Addr::new(0, 0, 0, 0))
    );
    assert_eq!(config.qdrant_url, "http://qdrant:6334");
    assert_eq!(config.overfetch_multiplier, 8);
    assert_eq!(config.startup_mode, StartupMode::Eager);
}

#[test]
#[serial]
fn test_from_env_invalid_port() {
    clear_prism_env();

    let result = with_env_vars(&[("PRISM_PORT", "not-a-port")], Config::from_env);
    assert!(matches!(result, Err(ConfigError::PortParseError { .. })));

    let result = with_env_vars(&[("PRISM_PORT", "0")], Config::from_env);
    assert!(matches!(result, Err(ConfigError::InvalidPort { .. })));
}

#[test]
#[serial]
fn test_from_env_invalid_bind_addr() {
    clear_prism_env();

    let result = with_env_vars(&[("PRISM_BIND_ADDR", "999.0.0.1")], Config::from_env);
    assert!(matches!(result, Err(ConfigError::InvalidBindAddr { .. })));
}

#[test]
#[serial]
fn test_from_env_invalid_startup_mode() {
    clear_prism_env();

    let result = with_env_vars(&[("PRISM_STARTUP_MODE", "warm")], Config::from_env);
    assert!(matches!(result, Err(ConfigError::InvalidStartupMode { .. })));
}

#[test]
#[serial]
fn test_from_env_blank_optional_values_ignored() {
    clear_prism_env();

    let config = with_env_vars(
        &[("PRISM_STORE_URL", "  "), ("PRISM_TEXT_MODEL_PATH", "")],
        || Config::from_env().expect("should parse"),
    );

    assert!(config.store_url.is_none());
    assert!(config.text_model_path.is_none());
}

#[test]
fn test_validate_rejects_zero_overfetch() {
    let config = Config {
        overfetch_multiplier: 0,
        ..Default::default()
    };

    assert!(matches!(
        config.validate(),
        Err(ConfigError::InvalidOverfetch { value: 0 })
    ));
}

#[test]
fn test_validate_missing_model_path() {
    let config = Config {
        text_model_path: Some(PathBuf::from("/definitely/not/there.gguf")),
        ..Default::default()
    };

    assert!(matches!(
        config.validate(),
        Err(ConfigError::PathNotFound { .. })
    ));
}

#[test]
fn test_validate_model_path_must_be_file() {
    let dir = tempfile::tempdir().expect("tempdir");
    let config = Config {
        text_model_path: Some(dir.path().to_path_buf()),
        ..Default::default()
    };

    assert!(matches!(
        config.validate(),
        Err(ConfigError::NotAFile { .. })
    ));
}

#[test]
fn test_validate_default_config() {
    Config::default().validate().expect("defaults are valid");
}

#[test]
fn test_startup_mode_parsing() {
    assert_eq!("eager".parse::<StartupMode>().unwrap(), StartupMode::Eager);
    assert_eq!("LAZY".parse::<StartupMode>().unwrap(), StartupMode::Lazy);
    assert!("hot".parse::<StartupMode>().is_err());
}
