//! Logging and metrics for the auth service.

use metrics::counter;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::errors::{Error, Result};

/// Initialize the tracing subscriber.
///
/// The filter comes from `RUST_LOG`, defaulting to `info`. Set
/// `LOG_FORMAT=json` for structured output.
pub fn init_tracing() -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let json = std::env::var("LOG_FORMAT").map(|v| v == "json").unwrap_or(false);

    let registry = tracing_subscriber::registry().with(filter);

    let result = if json {
        registry.with(fmt::layer().json()).try_init()
    } else {
        registry.with(fmt::layer()).try_init()
    };

    result.map_err(|e| Error::config(format!("Failed to initialize tracing: {}", e)))
}

/// Record an authentication attempt outcome.
///
/// `status` is a low-cardinality label: `success`, `invalid_credentials`,
/// `account_inactive`, or `invalid_token`.
pub fn record_authentication(status: &'static str) {
    counter!("auth_attempts_total", "status" => status).increment(1);
}

/// Record a password reset lifecycle event (`requested`, `completed`,
/// `rejected`).
pub fn record_password_reset(event: &'static str) {
    counter!("password_reset_events_total", "event" => event).increment(1);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn metrics_recording_does_not_panic_without_recorder() {
        record_authentication("success");
        record_authentication("invalid_credentials");
        record_password_reset("requested");
    }
}
