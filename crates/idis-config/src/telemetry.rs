// idis-config/src/telemetry.rs
// ============================================================================
// Module: IDIS Telemetry Bootstrap
// Description: Structured logging initialisation with env-filter control.
// Purpose: One tracing subscriber per process, honoring the OTel flags.
// Dependencies: tracing, tracing-subscriber
// ============================================================================

//! ## Overview
//! Hosts call [`init_telemetry`] once at startup. Log verbosity follows
//! `RUST_LOG` through the env filter; when `require_otel` is set but OTel
//! export is disabled, startup fails rather than running unobserved.

// ============================================================================
// SECTION: Imports
// ============================================================================

use thiserror::Error;
use tracing_subscriber::EnvFilter;

use crate::config::ServiceConfig;

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Telemetry bootstrap failures.
#[derive(Debug, Error)]
pub enum TelemetryError {
    /// OTel wiring required but not enabled.
    #[error("otel export required by configuration but not enabled")]
    OtelRequired,
    /// A global subscriber is already installed.
    #[error("telemetry already initialised")]
    AlreadyInitialised,
}

// ============================================================================
// SECTION: Bootstrap
// ============================================================================

/// Initialises the process-wide tracing subscriber.
///
/// # Errors
///
/// Returns [`TelemetryError::OtelRequired`] when the config demands OTel but
/// export is disabled, and [`TelemetryError::AlreadyInitialised`] when a
/// subscriber is already installed.
pub fn init_telemetry(config: &ServiceConfig) -> Result<(), TelemetryError> {
    if config.require_otel && !config.otel_enabled {
        return Err(TelemetryError::OtelRequired);
    }

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .try_init()
        .map_err(|_| TelemetryError::AlreadyInitialised)?;

    tracing::info!(
        region = config.service_region.as_deref().unwrap_or("unset"),
        otel = config.otel_enabled,
        "telemetry initialised"
    );
    Ok(())
}
