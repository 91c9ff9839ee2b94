use mathos_admin::{
    AppConfig,
    config::{DEFAULT_API_URL, Env},
};
use serial_test::serial;
use std::{env, panic, time::Duration};

const CONFIG_VARS: [&str; 5] = [
    "APP_ENV",
    "API_URL",
    "IDENTITY_URL",
    "BIND_ADDR",
    "UPSTREAM_TIMEOUT_SECS",
];

// --- Setup/Teardown Utilities ---

/// Runs `test` and restores every configuration variable afterwards, even if it panics.
fn run_with_env<T, R>(test: T) -> R
where
    T: FnOnce() -> R + panic::UnwindSafe,
{
    let originals: Vec<(&str, Option<String>)> = CONFIG_VARS
        .iter()
        .map(|&var| (var, env::var(var).ok()))
        .collect();

    unsafe {
        for var in CONFIG_VARS {
            env::remove_var(var);
        }
    }

    let result = panic::catch_unwind(test);

    for (key, original_value) in originals {
        unsafe {
            match original_value {
                Some(val) => env::set_var(key, val),
                None => env::remove_var(key),
            }
        }
    }

    match result {
        Ok(value) => value,
        Err(e) => panic::resume_unwind(e),
    }
}

// --- Tests ---

#[test]
#[serial]
fn test_app_config_local_defaults() {
    let config = run_with_env(AppConfig::load);

    assert_eq!(config.env, Env::Local);
    assert_eq!(config.api_base_url, DEFAULT_API_URL);
    // Identity falls back to the data API host.
    assert_eq!(config.identity_base_url, DEFAULT_API_URL);
    assert_eq!(config.bind_addr.to_string(), "0.0.0.0:3000");
    assert_eq!(config.upstream_timeout, Duration::from_secs(10));
    assert!(!config.secure_cookies());
}

#[test]
#[serial]
fn test_app_config_production_overrides() {
    let config = run_with_env(|| {
        unsafe {
            env::set_var("APP_ENV", "production");
            env::set_var("API_URL", "https://api.example.test");
            env::set_var("IDENTITY_URL", "https://id.example.test");
            env::set_var("BIND_ADDR", "127.0.0.1:8080");
            env::set_var("UPSTREAM_TIMEOUT_SECS", "3");
        }
        AppConfig::load()
    });

    assert_eq!(config.env, Env::Production);
    assert_eq!(config.api_base_url, "https://api.example.test");
    assert_eq!(config.identity_base_url, "https://id.example.test");
    assert_eq!(config.bind_addr.port(), 8080);
    assert_eq!(config.upstream_timeout, Duration::from_secs(3));
    assert!(config.secure_cookies());
}

#[test]
#[serial]
fn test_blank_api_url_uses_default() {
    let config = run_with_env(|| {
        unsafe {
            env::set_var("API_URL", "  ");
        }
        AppConfig::load()
    });

    assert_eq!(config.api_base_url, DEFAULT_API_URL);
}

#[test]
#[serial]
fn test_unparsable_timeout_fails_fast() {
    let result = run_with_env(|| {
        panic::catch_unwind(|| {
            unsafe {
                env::set_var("UPSTREAM_TIMEOUT_SECS", "ten");
            }
            AppConfig::load()
        })
    });

    assert!(
        result.is_err(),
        "A malformed UPSTREAM_TIMEOUT_SECS should abort startup"
    );
}

#[test]
#[serial]
fn test_unparsable_bind_addr_fails_fast() {
    let result = run_with_env(|| {
        panic::catch_unwind(|| {
            unsafe {
                env::set_var("BIND_ADDR", "localhost");
            }
            AppConfig::load()
        })
    });

    assert!(result.is_err(), "A malformed BIND_ADDR should abort startup");
}
