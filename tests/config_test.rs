use std::{path::PathBuf, time::Duration};

use gplay::{
    Error,
    config::{self, Config, DurationValue, Environment, Profile, Timeouts},
};
use tempfile::TempDir;

fn env_in(dir: &TempDir) -> Environment {
    Environment {
        cwd: Some(dir.path().join("project")),
        home: Some(dir.path().join("home")),
        ..Default::default()
    }
}

fn service_account_profile(name: &str) -> Profile {
    Profile {
        name: name.to_string(),
        kind: "service_account".to_string(),
        key_path: format!("/keys/{name}.json"),
        ..Default::default()
    }
}

// ---------------------------------------------------------------------------
// Durations
// ---------------------------------------------------------------------------

#[test]
fn test_parse_duration() {
    assert_eq!(config::parse_duration("45").unwrap(), Duration::from_secs(45));
    assert_eq!(config::parse_duration("90s").unwrap(), Duration::from_secs(90));
    assert_eq!(config::parse_duration("1m30s").unwrap(), Duration::from_secs(90));
    assert_eq!(config::parse_duration("2h").unwrap(), Duration::from_secs(7200));
    assert_eq!(
        config::parse_duration("250ms").unwrap(),
        Duration::from_millis(250)
    );
    assert_eq!(
        config::parse_duration("1.5h").unwrap(),
        Duration::from_secs(5400)
    );
}

#[test]
fn test_parse_duration_invalid() {
    assert!(config::parse_duration("").is_err());
    assert!(config::parse_duration("abc").is_err());
    assert!(config::parse_duration("10x").is_err());
    assert!(config::parse_duration("m").is_err());
}

#[test]
fn test_parse_duration_out_of_range() {
    let err = config::parse_duration("99999999999999999999999h").unwrap_err();
    assert_eq!(
        err.to_string(),
        "invalid duration \"99999999999999999999999h\""
    );

    let value: DurationValue = serde_json::from_str(r#""99999999999999999999999h""#).unwrap();
    assert_eq!(value.value(), None);
}

#[test]
fn test_duration_value_keeps_raw_text() {
    let value: DurationValue = serde_json::from_str(r#""1m30s""#).unwrap();
    assert_eq!(value.value(), Some(Duration::from_secs(90)));
    assert_eq!(serde_json::to_string(&value).unwrap(), r#""1m30s""#);

    let seconds: DurationValue = serde_json::from_str("120").unwrap();
    assert_eq!(seconds.value(), Some(Duration::from_secs(120)));
    assert_eq!(seconds.to_string(), "120");
}

#[test]
fn test_duration_value_unparsable_disables_timeout() {
    let value: DurationValue = serde_json::from_str(r#""soon""#).unwrap();
    assert_eq!(value.value(), None);
    assert_eq!(value.raw, "soon");

    let zero = DurationValue::parse("0").unwrap();
    assert_eq!(zero.value(), None);
}

#[test]
fn test_parse_bool() {
    for truthy in ["1", "t", "T", "true", "TRUE", "True"] {
        assert_eq!(config::parse_bool(truthy), Some(true));
    }
    for falsy in ["0", "f", "F", "false", "FALSE", "False"] {
        assert_eq!(config::parse_bool(falsy), Some(false));
    }
    assert_eq!(config::parse_bool("yes"), None);
}

// ---------------------------------------------------------------------------
// Paths
// ---------------------------------------------------------------------------

#[test]
fn test_resolve_path_prefers_env_override() {
    let dir = TempDir::new().unwrap();
    let env = Environment {
        config_path: Some("/custom/config.json".to_string()),
        ..env_in(&dir)
    };
    assert_eq!(config::resolve_path(&env), PathBuf::from("/custom/config.json"));
}

#[test]
fn test_resolve_path_uses_local_config_when_present() {
    let dir = TempDir::new().unwrap();
    let env = env_in(&dir);

    assert_eq!(config::resolve_path(&env), config::global_path(&env));
    assert_eq!(
        config::global_path(&env),
        dir.path().join("home").join(".gplay").join("config.json")
    );

    let local = config::local_path(&env);
    std::fs::create_dir_all(local.parent().unwrap()).unwrap();
    std::fs::write(&local, "{}").unwrap();
    assert_eq!(config::resolve_path(&env), local);
}

// ---------------------------------------------------------------------------
// Load and save
// ---------------------------------------------------------------------------

#[tokio::test]
async fn test_save_and_load_roundtrip() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("nested").join("config.json");

    let mut cfg = Config {
        default_profile: "ci".to_string(),
        package_name: "com.example.app".to_string(),
        timeout: DurationValue::parse("2m").unwrap(),
        ..Default::default()
    };
    cfg.upsert_profile(service_account_profile("ci"));

    config::save_at(&path, &cfg).await.unwrap();
    let loaded = config::load_at(&path).await.unwrap();
    assert_eq!(loaded, cfg);

    let raw = std::fs::read_to_string(&path).unwrap();
    assert!(raw.contains(r#""type": "service_account""#));
    assert!(raw.contains(r#""timeout": "2m""#));

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        let mode = std::fs::metadata(&path).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o600);
    }
}

#[tokio::test]
async fn test_load_missing_file() {
    let dir = TempDir::new().unwrap();
    let env = env_in(&dir);

    let err = config::load(&env).await.unwrap_err();
    assert!(matches!(err, Error::ConfigNotFound));
    assert!(config::load_optional(&env).await.unwrap().is_none());
}

#[tokio::test]
async fn test_load_malformed_file() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("config.json");
    std::fs::write(&path, "{ not json").unwrap();

    let err = config::load_at(&path).await.unwrap_err();
    assert!(matches!(err, Error::Config { .. }));
    assert!(err.to_string().starts_with("failed to load config: "));
    assert!(err.hint().unwrap().contains("gplay auth init"));
}

// ---------------------------------------------------------------------------
// Profiles
// ---------------------------------------------------------------------------

#[test]
fn test_upsert_and_remove_profile() {
    let mut cfg = Config::default();
    cfg.upsert_profile(service_account_profile("ci"));
    cfg.upsert_profile(service_account_profile("prod"));

    let mut replacement = service_account_profile("ci");
    replacement.key_path = "/keys/rotated.json".to_string();
    cfg.upsert_profile(replacement);

    assert_eq!(cfg.profiles.len(), 2);
    assert_eq!(cfg.find_profile("ci").unwrap().key_path, "/keys/rotated.json");

    cfg.default_profile = "ci".to_string();
    assert!(cfg.remove_profile("ci"));
    assert!(cfg.default_profile.is_empty());
    assert!(!cfg.remove_profile("ci"));
    assert_eq!(cfg.profiles.len(), 1);
}

#[test]
fn test_resolve_profile_name() {
    let mut cfg = Config::default();
    cfg.upsert_profile(service_account_profile("only"));
    let env = Environment::default();

    // a single profile is selected implicitly
    assert_eq!(
        config::resolve_profile_name(Some(&cfg), &env).as_deref(),
        Some("only")
    );

    cfg.upsert_profile(service_account_profile("second"));
    assert_eq!(config::resolve_profile_name(Some(&cfg), &env), None);

    cfg.default_profile = "second".to_string();
    assert_eq!(
        config::resolve_profile_name(Some(&cfg), &env).as_deref(),
        Some("second")
    );

    let env = Environment {
        profile: Some("from-env".to_string()),
        ..Default::default()
    };
    assert_eq!(
        config::resolve_profile_name(Some(&cfg), &env).as_deref(),
        Some("from-env")
    );
    assert_eq!(config::resolve_profile_name(None, &Environment::default()), None);
}

#[test]
fn test_resolve_package_name_precedence() {
    let cfg = Config {
        package_name: "com.example.config".to_string(),
        ..Default::default()
    };
    let env = Environment {
        package_name: Some("com.example.env".to_string()),
        ..Default::default()
    };

    assert_eq!(
        config::resolve_package_name(Some("com.example.flag"), Some(&cfg), &env).as_deref(),
        Some("com.example.flag")
    );
    assert_eq!(
        config::resolve_package_name(Some("  "), Some(&cfg), &env).as_deref(),
        Some("com.example.env")
    );
    assert_eq!(
        config::resolve_package_name(None, Some(&cfg), &Environment::default()).as_deref(),
        Some("com.example.config")
    );
    assert_eq!(
        config::resolve_package_name(None, None, &Environment::default()),
        None
    );
}

#[test]
fn test_strict_auth_and_debug_flags() {
    let env = Environment {
        strict_auth: Some("true".to_string()),
        debug: Some("0".to_string()),
        ..Default::default()
    };
    assert!(config::strict_auth_enabled(&env));

    let cfg = Config {
        debug: "true".to_string(),
        ..Default::default()
    };
    // the environment wins over config
    assert!(!config::debug_enabled(Some(&cfg), &env));
    assert!(config::debug_enabled(Some(&cfg), &Environment::default()));

    let env = Environment {
        strict_auth: Some("maybe".to_string()),
        ..Default::default()
    };
    assert!(!config::strict_auth_enabled(&env));
}

// ---------------------------------------------------------------------------
// Timeouts
// ---------------------------------------------------------------------------

#[test]
fn test_resolve_timeouts_defaults_to_unbounded() {
    assert_eq!(
        config::resolve_timeouts(None, &Environment::default()),
        Timeouts::default()
    );
}

#[test]
fn test_resolve_timeouts_precedence() {
    let cfg = Config {
        timeout: DurationValue::parse("30s").unwrap(),
        upload_timeout_seconds: DurationValue::parse("600").unwrap(),
        ..Default::default()
    };

    let timeouts = config::resolve_timeouts(Some(&cfg), &Environment::default());
    assert_eq!(timeouts.request, Some(Duration::from_secs(30)));
    assert_eq!(timeouts.upload, Some(Duration::from_secs(600)));

    let env = Environment {
        timeout: Some("2m".to_string()),
        upload_timeout_seconds: Some("45".to_string()),
        ..Default::default()
    };
    let timeouts = config::resolve_timeouts(Some(&cfg), &env);
    assert_eq!(timeouts.request, Some(Duration::from_secs(120)));
    assert_eq!(timeouts.upload, Some(Duration::from_secs(45)));
}

#[test]
fn test_resolve_timeouts_ignores_out_of_range_env() {
    let cfg = Config {
        timeout: DurationValue::parse("30s").unwrap(),
        ..Default::default()
    };
    let env = Environment {
        timeout: Some("99999999999999999999999h".to_string()),
        ..Default::default()
    };

    let timeouts = config::resolve_timeouts(Some(&cfg), &env);
    assert_eq!(timeouts.request, Some(Duration::from_secs(30)));
}

#[test]
fn test_resolve_timeouts_ignores_invalid_env() {
    let cfg = Config {
        timeout_seconds: DurationValue::parse("15").unwrap(),
        ..Default::default()
    };
    let env = Environment {
        timeout: Some("forever".to_string()),
        ..Default::default()
    };
    let timeouts = config::resolve_timeouts(Some(&cfg), &env);
    assert_eq!(timeouts.request, Some(Duration::from_secs(15)));
}
