//! # Authcore
//!
//! Credential and session lifecycle service: registration gated by
//! administrator validation, email/password login, JWT access and refresh
//! tokens, authenticated password change, and a single-use password reset
//! flow that resists account enumeration.
//!
//! ## Architecture
//!
//! - [`auth`] - hashing, token codec, validation, and the lifecycle service
//! - [`storage`] - SQLite pool, migrations, and repositories
//! - [`api`] - axum router and handlers
//! - [`mailer`] - reset link delivery (SMTP or log)
//! - [`config`] - environment-driven configuration
//! - [`observability`] - tracing and metrics

pub mod api;
pub mod auth;
pub mod config;
pub mod domain;
pub mod errors;
pub mod mailer;
pub mod observability;
pub mod storage;

pub use config::AppConfig;
pub use errors::{Error, Result};

/// Current version of the service
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Service name for logging and diagnostics
pub const APP_NAME: &str = env!("CARGO_PKG_NAME");
