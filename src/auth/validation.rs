//! Input validation for the auth request bodies.
//!
//! Password policy: at least 8 characters with one uppercase letter, one
//! lowercase letter, and one digit, capped at 128 characters to protect the
//! hasher. The policy is enforced at every plaintext intake point (register,
//! change-password, reset-password), so a non-compliant password is never
//! hashed or stored.

use lazy_static::lazy_static;
use regex::Regex;
use validator::{Validate, ValidationError, ValidationErrors};

use super::models::{
    ChangePasswordRequest, ForgotPasswordRequest, LoginRequest, RefreshTokenRequest,
    RegisterRequest, ResetPasswordRequest,
};

lazy_static! {
    // Email validation: basic RFC 5322 compliant pattern
    static ref EMAIL_REGEX: Regex = Regex::new(
        r"^[a-zA-Z0-9.!#$%&'*+/=?^_`{|}~-]+@[a-zA-Z0-9](?:[a-zA-Z0-9-]{0,61}[a-zA-Z0-9])?(?:\.[a-zA-Z0-9](?:[a-zA-Z0-9-]{0,61}[a-zA-Z0-9])?)*$"
    )
    .expect("EMAIL_REGEX should be a valid regex pattern");
}

/// Minimum password length requirement
const MIN_PASSWORD_LENGTH: usize = 8;

/// Maximum password length to prevent DoS
const MAX_PASSWORD_LENGTH: usize = 128;

/// Minimum display name length (after trimming)
const MIN_NAME_LENGTH: usize = 2;

/// Maximum display name length
const MAX_NAME_LENGTH: usize = 255;

/// Validate email format
pub fn validate_email(email: &str) -> Result<(), ValidationError> {
    let trimmed = email.trim();
    if trimmed.len() <= 254 && EMAIL_REGEX.is_match(trimmed) {
        Ok(())
    } else {
        Err(ValidationError::new("invalid_email"))
    }
}

/// Validate password strength
/// Requirements:
/// - At least 8 characters
/// - At most 128 characters (to prevent DoS)
/// - Contains at least one uppercase letter
/// - Contains at least one lowercase letter
/// - Contains at least one digit
pub fn validate_password(password: &str) -> Result<(), ValidationError> {
    if password.len() < MIN_PASSWORD_LENGTH {
        return Err(ValidationError::new("password_too_short"));
    }

    if password.len() > MAX_PASSWORD_LENGTH {
        return Err(ValidationError::new("password_too_long"));
    }

    let has_uppercase = password.chars().any(|c| c.is_uppercase());
    let has_lowercase = password.chars().any(|c| c.is_lowercase());
    let has_digit = password.chars().any(|c| c.is_numeric());

    if !has_uppercase {
        return Err(ValidationError::new("password_missing_uppercase"));
    }

    if !has_lowercase {
        return Err(ValidationError::new("password_missing_lowercase"));
    }

    if !has_digit {
        return Err(ValidationError::new("password_missing_digit"));
    }

    Ok(())
}

/// Validate display name (trimmed, bounded length)
pub fn validate_name(name: &str) -> Result<(), ValidationError> {
    let trimmed = name.trim();

    if trimmed.len() < MIN_NAME_LENGTH {
        return Err(ValidationError::new("name_too_short"));
    }

    if trimmed.len() > MAX_NAME_LENGTH {
        return Err(ValidationError::new("name_too_long"));
    }

    Ok(())
}

fn single_field_error(field: &'static str, error: ValidationError) -> ValidationErrors {
    let mut errors = ValidationErrors::new();
    errors.add(field, error);
    errors
}

impl Validate for RegisterRequest {
    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();

        if let Err(err) = validate_email(&self.email) {
            errors.add("email", err);
        }

        if let Err(err) = validate_name(&self.name) {
            errors.add("name", err);
        }

        if let Err(err) = validate_password(&self.password) {
            errors.add("password", err);
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}

impl Validate for LoginRequest {
    fn validate(&self) -> Result<(), ValidationErrors> {
        // Login never reveals policy details; an empty field is the only
        // thing rejected before the credential check.
        if self.email.trim().is_empty() {
            return Err(single_field_error("email", ValidationError::new("email_empty")));
        }
        if self.password.is_empty() {
            return Err(single_field_error("password", ValidationError::new("password_empty")));
        }
        Ok(())
    }
}

impl Validate for RefreshTokenRequest {
    fn validate(&self) -> Result<(), ValidationErrors> {
        if self.refresh_token.is_empty() {
            return Err(single_field_error("refresh_token", ValidationError::new("token_empty")));
        }
        Ok(())
    }
}

impl Validate for ChangePasswordRequest {
    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();

        if self.current_password.is_empty() {
            errors.add("current_password", ValidationError::new("password_empty"));
        }

        if let Err(err) = validate_password(&self.new_password) {
            errors.add("new_password", err);
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}

impl Validate for ForgotPasswordRequest {
    fn validate(&self) -> Result<(), ValidationErrors> {
        validate_email(&self.email).map_err(|err| single_field_error("email", err))
    }
}

impl Validate for ResetPasswordRequest {
    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();

        if self.token.is_empty() {
            errors.add("token", ValidationError::new("token_empty"));
        }

        if let Err(err) = validate_password(&self.new_password) {
            errors.add("new_password", err);
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}
