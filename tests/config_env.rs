// tests/config_env.rs
use article_summary_server::config::{AppConfig, Environment, SourceDir};
use std::{env, fs};

const VARS: [&str; 6] = [
    "APP_ENV",
    "PORT",
    "FRONTEND_DIR",
    "SUMMARY_SOURCES",
    "SUMMARY_CONFIG_PATH",
    "METRICS_ENABLED",
];

#[serial_test::serial]
#[test]
fn from_env_reads_process_environment() {
    // Isolate CWD so a developer's .env or config/ does not leak in
    let old = env::current_dir().unwrap();
    let tmp = tempfile::tempdir().unwrap();
    env::set_current_dir(tmp.path()).unwrap();
    for v in VARS {
        env::remove_var(v);
    }

    // 1) Nothing set -> production defaults
    let cfg = AppConfig::from_env().unwrap();
    assert_eq!(cfg.environment, Environment::Production);
    assert_eq!(cfg.port, 8000);
    assert_eq!(cfg.sources.len(), 1);
    assert!(!cfg.metrics_enabled);

    // 2) .env file is honoured
    fs::write(tmp.path().join(".env"), "PORT=8123\nMETRICS_ENABLED=1\n").unwrap();
    let cfg = AppConfig::from_env().unwrap();
    assert_eq!(cfg.port, 8123);
    assert!(cfg.metrics_enabled);

    // 3) explicit variables
    env::set_var("APP_ENV", "development");
    env::set_var("SUMMARY_SOURCES", "ft=/srv/ft,eco=/srv/eco");
    let cfg = AppConfig::from_env().unwrap();
    assert_eq!(cfg.environment, Environment::Development);
    assert_eq!(
        cfg.sources,
        vec![SourceDir::new("ft", "/srv/ft"), SourceDir::new("eco", "/srv/eco")]
    );

    for v in VARS {
        env::remove_var(v);
    }
    env::set_current_dir(&old).unwrap();
}
