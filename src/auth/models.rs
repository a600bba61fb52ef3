//! Account and role records plus the request/response shapes of the auth API.
//!
//! `Account` carries the stored password digest and therefore never crosses
//! the API boundary; responses go out as `AccountResponse`, which omits it.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::{ResetTokenId, RoleId, UserId};

/// A registered account as stored.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Account {
    pub id: UserId,
    pub email: String,
    pub name: String,
    pub phone: Option<String>,
    /// Argon2id digest in PHC string format. Never serialized to API clients.
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub role_id: RoleId,
    pub role_name: String,
    pub is_active: bool,
    pub is_validated: bool,
    pub must_change_password: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Account {
    /// Whether the account may authenticate.
    pub fn can_login(&self) -> bool {
        self.is_active
    }
}

/// A role reference row.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Role {
    pub id: RoleId,
    pub name: String,
    pub description: Option<String>,
}

/// Data needed to insert a new account.
#[derive(Debug, Clone)]
pub struct NewAccount {
    pub email: String,
    pub name: String,
    pub phone: Option<String>,
    pub password_hash: String,
    pub role_id: RoleId,
    pub is_active: bool,
    pub is_validated: bool,
}

/// An outstanding password reset token row.
#[derive(Debug, Clone)]
pub struct ResetTokenRecord {
    pub id: ResetTokenId,
    pub user_id: UserId,
    pub token: String,
    pub expires_at: DateTime<Utc>,
    pub used: bool,
    pub created_at: DateTime<Utc>,
}

impl ResetTokenRecord {
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at <= now
    }
}

/// Normalize an email for storage and lookup: surrounding whitespace is
/// trimmed, case is preserved. Addresses are unique case-sensitively, so
/// `Ada@x.com` and `ada@x.com` are distinct accounts.
pub fn normalize_email(email: &str) -> String {
    email.trim().to_string()
}

// --- Request bodies ---

#[derive(Debug, Clone, Deserialize)]
pub struct RegisterRequest {
    pub email: String,
    pub name: String,
    pub password: String,
    #[serde(default)]
    pub phone: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RefreshTokenRequest {
    pub refresh_token: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ChangePasswordRequest {
    pub current_password: String,
    pub new_password: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ForgotPasswordRequest {
    pub email: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ResetPasswordRequest {
    pub token: String,
    pub new_password: String,
}

// --- Response bodies ---

/// Public view of an account. No credential material.
#[derive(Debug, Clone, Serialize)]
pub struct AccountResponse {
    pub id: UserId,
    pub email: String,
    pub name: String,
    pub phone: Option<String>,
    pub role: String,
    pub is_active: bool,
    pub is_validated: bool,
    pub must_change_password: bool,
    pub created_at: DateTime<Utc>,
}

impl From<Account> for AccountResponse {
    fn from(account: Account) -> Self {
        Self {
            id: account.id,
            email: account.email,
            name: account.name,
            phone: account.phone,
            role: account.role_name,
            is_active: account.is_active,
            is_validated: account.is_validated,
            must_change_password: account.must_change_password,
            created_at: account.created_at,
        }
    }
}

/// Generic acknowledgement body for operations that return no data.
#[derive(Debug, Clone, Serialize)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self { message: message.into() }
    }
}
