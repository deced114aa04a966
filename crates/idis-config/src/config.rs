// idis-config/src/config.rs
// ============================================================================
// Module: IDIS Service Configuration
// Description: Environment and file configuration with fail-closed validation.
// Purpose: One typed config struct for every deployable surface.
// Dependencies: serde, serde_json, toml
// ============================================================================

//! ## Overview
//! Configuration merges three layers, later layers winning: built-in
//! defaults, an optional TOML file, and `IDIS_*` environment variables. The
//! API-key registry is a JSON map from key to tenant context; parsing
//! failures are configuration errors, never silent fallbacks. A missing
//! service region is representable (the residency gate fails requests
//! closed) but a malformed one is not.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;
use std::path::Path;

use serde::Deserialize;
use serde::Serialize;
use thiserror::Error;

// ============================================================================
// SECTION: Environment Names
// ============================================================================

/// Database connection string.
pub const ENV_DATABASE_URL: &str = "IDIS_DATABASE_URL";
/// Privileged database connection string for migrations.
pub const ENV_DATABASE_ADMIN_URL: &str = "IDIS_DATABASE_ADMIN_URL";
/// JSON map of API keys to tenant contexts.
pub const ENV_API_KEYS_JSON: &str = "IDIS_API_KEYS_JSON";
/// Append-only audit log path.
pub const ENV_AUDIT_LOG_PATH: &str = "IDIS_AUDIT_LOG_PATH";
/// Break-glass HMAC secret.
pub const ENV_BREAK_GLASS_SECRET: &str = "IDIS_BREAK_GLASS_SECRET";
/// Deployed service region for residency pinning.
pub const ENV_SERVICE_REGION: &str = "IDIS_SERVICE_REGION";
/// Require OpenTelemetry wiring at startup.
pub const ENV_REQUIRE_OTEL: &str = "IDIS_REQUIRE_OTEL";
/// Enable OpenTelemetry export.
pub const ENV_OTEL_ENABLED: &str = "IDIS_OTEL_ENABLED";

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Configuration failures.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Config file could not be read.
    #[error("config file unreadable: {0}")]
    FileUnreadable(String),
    /// Config file failed to parse.
    #[error("config file invalid: {0}")]
    FileInvalid(String),
    /// API key registry JSON failed to parse.
    #[error("api key registry invalid: {0}")]
    ApiKeysInvalid(String),
    /// A required value failed validation.
    #[error("invalid config value for {field}: {reason}")]
    InvalidValue {
        /// Offending field.
        field: String,
        /// Why it was rejected.
        reason: String,
    },
}

// ============================================================================
// SECTION: API Key Registry
// ============================================================================

/// One API key's tenant binding.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiKeyEntry {
    /// Tenant the key authenticates.
    pub tenant_id: String,
    /// Actor identifier bound to the key.
    pub actor_id: String,
    /// Display name of the key.
    pub name: String,
    /// IANA timezone of the tenant.
    #[serde(default = "default_timezone")]
    pub timezone: String,
    /// Pinned data region of the tenant.
    pub data_region: String,
    /// Roles granted to the key.
    pub roles: Vec<String>,
}

/// Default tenant timezone.
fn default_timezone() -> String {
    "UTC".to_string()
}

// ============================================================================
// SECTION: Service Config
// ============================================================================

/// File-level configuration shape.
#[derive(Debug, Clone, Default, Deserialize)]
struct FileConfig {
    /// Database connection string.
    #[serde(default)]
    database_url: Option<String>,
    /// Privileged database connection string.
    #[serde(default)]
    database_admin_url: Option<String>,
    /// Audit log path.
    #[serde(default)]
    audit_log_path: Option<String>,
    /// Service region.
    #[serde(default)]
    service_region: Option<String>,
    /// Require OTel at startup.
    #[serde(default)]
    require_otel: Option<bool>,
    /// Enable OTel export.
    #[serde(default)]
    otel_enabled: Option<bool>,
}

/// Complete service configuration.
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    /// Database connection string, when persistence is configured.
    pub database_url: Option<String>,
    /// Privileged database connection string for migrations.
    pub database_admin_url: Option<String>,
    /// API keys keyed by the raw key value.
    pub api_keys: BTreeMap<String, ApiKeyEntry>,
    /// Append-only audit log path.
    pub audit_log_path: String,
    /// Break-glass HMAC secret bytes; empty disables break-glass.
    pub break_glass_secret: Vec<u8>,
    /// Deployed service region; `None` fails residency closed.
    pub service_region: Option<String>,
    /// Refuse startup without OTel wiring.
    pub require_otel: bool,
    /// Enable OTel export.
    pub otel_enabled: bool,
}

impl ServiceConfig {
    /// Loads configuration from the process environment only.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when a present value fails validation.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_layers(FileConfig::default(), &env_lookup)
    }

    /// Loads configuration from a TOML file with environment overrides.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] on unreadable or invalid files, or when a
    /// value fails validation.
    pub fn from_file_and_env(path: &Path) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path)
            .map_err(|err| ConfigError::FileUnreadable(err.to_string()))?;
        let file: FileConfig =
            toml::from_str(&raw).map_err(|err| ConfigError::FileInvalid(err.to_string()))?;
        Self::from_layers(file, &env_lookup)
    }

    /// Loads configuration from explicit sources, for hosts and tests that
    /// supply their own environment lookup.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] on invalid TOML or failed validation.
    pub fn from_sources(
        file_toml: Option<&str>,
        env: &dyn Fn(&str) -> Option<String>,
    ) -> Result<Self, ConfigError> {
        let file = match file_toml {
            None => FileConfig::default(),
            Some(raw) => {
                toml::from_str(raw).map_err(|err| ConfigError::FileInvalid(err.to_string()))?
            }
        };
        Self::from_layers(file, env)
    }

    /// Merges file defaults and an environment lookup into a validated config.
    fn from_layers(
        file: FileConfig,
        env: &dyn Fn(&str) -> Option<String>,
    ) -> Result<Self, ConfigError> {
        let api_keys = match env(ENV_API_KEYS_JSON) {
            None => BTreeMap::new(),
            Some(raw) => parse_api_keys(&raw)?,
        };

        let service_region = env(ENV_SERVICE_REGION)
            .or(file.service_region)
            .map(|region| region.trim().to_string())
            .filter(|region| !region.is_empty());

        let audit_log_path = env(ENV_AUDIT_LOG_PATH)
            .or(file.audit_log_path)
            .unwrap_or_else(|| "idis_audit.jsonl".to_string());

        let break_glass_secret =
            env(ENV_BREAK_GLASS_SECRET).map(String::into_bytes).unwrap_or_default();

        let require_otel = match env(ENV_REQUIRE_OTEL) {
            Some(raw) => parse_bool(ENV_REQUIRE_OTEL, &raw)?,
            None => file.require_otel.unwrap_or(false),
        };
        let otel_enabled = match env(ENV_OTEL_ENABLED) {
            Some(raw) => parse_bool(ENV_OTEL_ENABLED, &raw)?,
            None => file.otel_enabled.unwrap_or(false),
        };

        Ok(Self {
            database_url: env(ENV_DATABASE_URL).or(file.database_url),
            database_admin_url: env(ENV_DATABASE_ADMIN_URL).or(file.database_admin_url),
            api_keys,
            audit_log_path,
            break_glass_secret,
            service_region,
            require_otel,
            otel_enabled,
        })
    }

    /// Returns the tenant binding for an API key.
    #[must_use]
    pub fn lookup_api_key(&self, key: &str) -> Option<&ApiKeyEntry> {
        self.api_keys.get(key)
    }
}

// ============================================================================
// SECTION: Parsing
// ============================================================================

/// Reads one environment variable.
fn env_lookup(name: &str) -> Option<String> {
    std::env::var(name).ok()
}

/// Parses the API key registry JSON.
fn parse_api_keys(raw: &str) -> Result<BTreeMap<String, ApiKeyEntry>, ConfigError> {
    serde_json::from_str(raw).map_err(|err| ConfigError::ApiKeysInvalid(err.to_string()))
}

/// Parses a boolean flag value.
fn parse_bool(field: &str, raw: &str) -> Result<bool, ConfigError> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" => Ok(true),
        "0" | "false" | "no" => Ok(false),
        other => Err(ConfigError::InvalidValue {
            field: field.to_string(),
            reason: format!("expected a boolean, got '{other}'"),
        }),
    }
}
