// idis-config/tests/config.rs
// ============================================================================
// Module: Config Tests
// Description: Layered configuration loading and validation.
// ============================================================================
//! ## Overview
//! Validates environment-over-file precedence, API-key registry parsing,
//! boolean flag validation, and the defaults applied without any sources.

#![allow(
    clippy::panic,
    clippy::print_stdout,
    clippy::print_stderr,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::use_debug,
    clippy::dbg_macro,
    clippy::panic_in_result_fn,
    clippy::unwrap_in_result,
    reason = "Test-only output and panic-based assertions are permitted."
)]

use std::collections::BTreeMap;

use idis_config::ConfigError;
use idis_config::ServiceConfig;

// ============================================================================
// SECTION: Fixtures
// ============================================================================

/// Environment lookup over a fixed map.
fn env_from(map: BTreeMap<&'static str, &'static str>) -> impl Fn(&str) -> Option<String> {
    move |name| map.get(name).map(|value| (*value).to_string())
}

// ============================================================================
// SECTION: Loading
// ============================================================================

/// Tests defaults with no sources at all.
#[test]
fn test_defaults_without_sources() {
    let config = ServiceConfig::from_sources(None, &|_| None).unwrap();
    assert!(config.database_url.is_none());
    assert!(config.api_keys.is_empty());
    assert_eq!(config.audit_log_path, "idis_audit.jsonl");
    assert!(config.break_glass_secret.is_empty());
    assert!(config.service_region.is_none());
    assert!(!config.require_otel);
}

/// Tests environment variables override file values.
#[test]
fn test_env_overrides_file() {
    let file = r#"
        service_region = "eu-west-1"
        audit_log_path = "/var/log/idis/audit.jsonl"
        otel_enabled = true
    "#;
    let env = env_from(BTreeMap::from([("IDIS_SERVICE_REGION", "me-south-1")]));
    let config = ServiceConfig::from_sources(Some(file), &env).unwrap();
    assert_eq!(config.service_region.as_deref(), Some("me-south-1"));
    assert_eq!(config.audit_log_path, "/var/log/idis/audit.jsonl");
    assert!(config.otel_enabled);
}

/// Tests the API key registry parses tenant bindings.
#[test]
fn test_api_key_registry_parsing() {
    let keys = r#"{
        "key-a": {
            "tenant_id": "11111111-1111-1111-1111-111111111111",
            "actor_id": "actor-a",
            "name": "Tenant A",
            "data_region": "me-south-1",
            "roles": ["ANALYST"]
        }
    }"#;
    let env = env_from(BTreeMap::from([("IDIS_API_KEYS_JSON", keys)]));
    let config = ServiceConfig::from_sources(None, &env).unwrap();

    let entry = config.lookup_api_key("key-a").unwrap();
    assert_eq!(entry.tenant_id, "11111111-1111-1111-1111-111111111111");
    assert_eq!(entry.data_region, "me-south-1");
    assert_eq!(entry.timezone, "UTC");
    assert_eq!(entry.roles, vec!["ANALYST".to_string()]);
    assert!(config.lookup_api_key("unknown-key").is_none());
}

/// Tests malformed registries are configuration errors, not fallbacks.
#[test]
fn test_invalid_api_keys_rejected() {
    let env = env_from(BTreeMap::from([("IDIS_API_KEYS_JSON", "not json")]));
    let result = ServiceConfig::from_sources(None, &env);
    assert!(matches!(result, Err(ConfigError::ApiKeysInvalid(_))));
}

/// Tests boolean flags accept canonical spellings only.
#[test]
fn test_bool_flag_validation() {
    let truthy = env_from(BTreeMap::from([("IDIS_REQUIRE_OTEL", "true")]));
    assert!(ServiceConfig::from_sources(None, &truthy).unwrap().require_otel);

    let numeric = env_from(BTreeMap::from([("IDIS_OTEL_ENABLED", "1")]));
    assert!(ServiceConfig::from_sources(None, &numeric).unwrap().otel_enabled);

    let garbage = env_from(BTreeMap::from([("IDIS_REQUIRE_OTEL", "maybe")]));
    let result = ServiceConfig::from_sources(None, &garbage);
    assert!(matches!(result, Err(ConfigError::InvalidValue { .. })));
}

/// Tests a blank service region is treated as unset (fail-closed later).
#[test]
fn test_blank_region_is_unset() {
    let env = env_from(BTreeMap::from([("IDIS_SERVICE_REGION", "   ")]));
    let config = ServiceConfig::from_sources(None, &env).unwrap();
    assert!(config.service_region.is_none());
}

/// Tests malformed TOML is rejected.
#[test]
fn test_invalid_toml_rejected() {
    let result = ServiceConfig::from_sources(Some("not = [valid"), &|_| None);
    assert!(matches!(result, Err(ConfigError::FileInvalid(_))));
}
