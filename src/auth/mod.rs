//! Credential and session lifecycle.
//!
//! Registration, login, JWT session tokens, password change, and the
//! single-use reset flow. [`service::AuthService`] is the entry point; the
//! submodules hold the mechanics.

pub mod hashing;
pub mod jwt;
pub mod models;
pub mod reset;
pub mod service;
pub mod validation;

pub use jwt::{Claims, TokenCodec, TokenKind, TokenPair};
pub use models::{
    Account, AccountResponse, ChangePasswordRequest, ForgotPasswordRequest, LoginRequest,
    MessageResponse, NewAccount, RefreshTokenRequest, RegisterRequest, ResetPasswordRequest,
    ResetTokenRecord, Role,
};
pub use reset::ResetTokenService;
pub use service::{AuthService, DEFAULT_ROLE};
