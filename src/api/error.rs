use axum::{http::StatusCode, response::IntoResponse, Json};
use serde::Serialize;

use crate::errors::{AuthErrorType, Error};

#[derive(Debug)]
pub enum ApiError {
    BadRequest(String),
    Conflict(String),
    NotFound(String),
    Unauthorized(String),
    Forbidden(String),
    ServiceUnavailable(String),
    Internal(String),
}

impl ApiError {
    fn status_code(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Conflict(_) => StatusCode::CONFLICT,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ApiError::Forbidden(_) => StatusCode::FORBIDDEN,
            ApiError::ServiceUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

#[derive(Serialize)]
struct ErrorBody {
    error: &'static str,
    message: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        let status = self.status_code();
        let error_kind = match self {
            ApiError::BadRequest(_) => "bad_request",
            ApiError::Conflict(_) => "conflict",
            ApiError::NotFound(_) => "not_found",
            ApiError::Unauthorized(_) => "unauthorized",
            ApiError::Forbidden(_) => "forbidden",
            ApiError::ServiceUnavailable(_) => "service_unavailable",
            ApiError::Internal(_) => "internal_error",
        };

        let message = match self {
            ApiError::BadRequest(msg)
            | ApiError::Conflict(msg)
            | ApiError::NotFound(msg)
            | ApiError::Unauthorized(msg)
            | ApiError::Forbidden(msg)
            | ApiError::ServiceUnavailable(msg)
            | ApiError::Internal(msg) => msg,
        };

        (status, Json(ErrorBody { error: error_kind, message })).into_response()
    }
}

impl From<Error> for ApiError {
    fn from(err: Error) -> Self {
        match err {
            Error::Validation { message, .. } => ApiError::BadRequest(message),
            Error::NotFound { resource_type, id } => {
                ApiError::NotFound(format!("{} '{}' not found", resource_type, id))
            }
            Error::Conflict { message, .. } => ApiError::Conflict(message),
            Error::Auth { message, error_type } => match error_type {
                AuthErrorType::InvalidCredentials | AuthErrorType::InvalidOrExpiredToken => {
                    ApiError::Unauthorized(message)
                }
                AuthErrorType::AccountInactive => ApiError::Forbidden(message),
                _ => ApiError::BadRequest(message),
            },
            Error::Database { source, context } => {
                if let Some(db_err) = source.as_database_error() {
                    if let Some(code) = db_err.code() {
                        if code.as_ref() == "2067" || code.as_ref().starts_with("SQLITE_CONSTRAINT")
                        {
                            return ApiError::Conflict(context);
                        }
                    }
                }
                ApiError::Internal(context)
            }
            Error::Config { message, .. } | Error::Internal { message, .. } => {
                ApiError::Internal(message)
            }
            Error::Io { context, .. } | Error::Serialization { context, .. } => {
                ApiError::Internal(context)
            }
        }
    }
}

impl ApiError {
    pub fn service_unavailable<S: Into<String>>(msg: S) -> Self {
        ApiError::ServiceUnavailable(msg.into())
    }

    pub fn unauthorized<S: Into<String>>(msg: S) -> Self {
        ApiError::Unauthorized(msg.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::AuthErrorType;

    #[test]
    fn auth_errors_map_to_documented_statuses() {
        let cases = [
            (AuthErrorType::InvalidCredentials, StatusCode::UNAUTHORIZED),
            (AuthErrorType::InvalidOrExpiredToken, StatusCode::UNAUTHORIZED),
            (AuthErrorType::AccountInactive, StatusCode::FORBIDDEN),
            (AuthErrorType::UsedResetToken, StatusCode::BAD_REQUEST),
            (AuthErrorType::ExpiredResetToken, StatusCode::BAD_REQUEST),
            (AuthErrorType::CurrentPasswordIncorrect, StatusCode::BAD_REQUEST),
        ];

        for (error_type, expected) in cases {
            let api_error = ApiError::from(Error::auth("test", error_type));
            assert_eq!(api_error.status_code(), expected, "{:?}", error_type);
        }
    }

    #[test]
    fn conflict_maps_to_409() {
        let api_error = ApiError::from(Error::conflict("Email is already registered", "account"));
        assert_eq!(api_error.status_code(), StatusCode::CONFLICT);
    }

    #[test]
    fn validation_maps_to_400() {
        let api_error = ApiError::from(Error::validation("bad input"));
        assert_eq!(api_error.status_code(), StatusCode::BAD_REQUEST);
    }
}
