// idis-config/src/lib.rs
// ============================================================================
// Module: IDIS Config Library
// Description: Typed service configuration and telemetry bootstrap.
// Purpose: Load IDIS_* environment and file configuration fail-closed.
// Dependencies: crate::{config, telemetry}
// ============================================================================

//! ## Overview
//! Configuration is loaded from `IDIS_*` environment variables with an
//! optional TOML file underneath; every value is validated before the
//! service sees it. Secrets (API keys, the break-glass secret) never appear
//! in logs or serialized config output.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod config;
pub mod telemetry;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use config::ApiKeyEntry;
pub use config::ConfigError;
pub use config::ServiceConfig;
pub use telemetry::TelemetryError;
pub use telemetry::init_telemetry;
