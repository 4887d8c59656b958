//! Error handling middleware - RFC 7807 compliant responses.
//!
//! Every failure body names the page (`view`) it stands for, so a client can
//! render `404`, `403`, `error` or the post form again.

use actix_web::{HttpResponse, ResponseError, http::StatusCode, http::header};
use blog_core::domain::{FieldError, Principal};
use blog_core::error::{DomainError, RepoError};
use blog_core::ports::AuthError;
use blog_shared::{ErrorResponse, FieldErrorBody};

/// Page names.
pub mod view {
    pub const HOME: &str = "home";
    pub const POST: &str = "post";
    pub const POST_FORM: &str = "postForm";
    pub const NOT_FOUND: &str = "404";
    pub const FORBIDDEN: &str = "403";
    pub const ERROR: &str = "error";
}

/// Application-level error type that converts to RFC 7807 responses.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Not found: {detail}")]
    NotFound { detail: String, view: &'static str },

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// Authenticated, but lacking the required role.
    #[error("Access denied: {0}")]
    AccessDenied(String),

    /// Authenticated, but not the owner of the resource.
    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Validation failed: {} field error(s)", errors.len())]
    Validation {
        errors: Vec<FieldError>,
        view: Option<&'static str>,
        form: Option<serde_json::Value>,
    },

    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// Map a workflow outcome for `principal`. Missing posts render `not_found_view`.
    pub fn from_domain(err: DomainError, principal: &Principal, not_found_view: &'static str) -> Self {
        match err {
            DomainError::NotFound { entity_type, id } => AppError::NotFound {
                detail: format!("{} with id {} not found", entity_type, id),
                view: not_found_view,
            },
            DomainError::Forbidden { resource, username } => {
                tracing::warn!(username = %username, resource = %resource, "Ownership check failed");
                AppError::Forbidden(format!("You may not modify {}", resource))
            }
            DomainError::Unauthorized(role) if principal.is_anonymous() => {
                AppError::Unauthorized(format!("Sign in to continue ({} required)", role))
            }
            DomainError::Unauthorized(role) => {
                AppError::AccessDenied(format!("{} is required", role))
            }
            DomainError::Validation(errors) => AppError::Validation {
                errors,
                view: Some(view::POST_FORM),
                form: None,
            },
            DomainError::Internal(msg) => AppError::Internal(msg),
        }
    }

    /// Echo the rejected form back with a validation failure.
    pub fn with_form(self, form: serde_json::Value) -> Self {
        match self {
            AppError::Validation { errors, view, .. } => AppError::Validation {
                errors,
                view,
                form: Some(form),
            },
            other => other,
        }
    }
}

impl ResponseError for AppError {
    fn status_code(&self) -> StatusCode {
        match self {
            AppError::NotFound { .. } => StatusCode::NOT_FOUND,
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            AppError::AccessDenied(_) | AppError::Forbidden(_) => StatusCode::FORBIDDEN,
            AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::Validation { .. } => StatusCode::UNPROCESSABLE_ENTITY,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let error = match self {
            AppError::NotFound { detail, view } => {
                ErrorResponse::not_found(detail.clone()).with_view(*view)
            }
            AppError::BadRequest(detail) => ErrorResponse::bad_request(detail.clone()),
            AppError::Unauthorized(detail) => {
                ErrorResponse::unauthorized().with_detail(detail.clone())
            }
            AppError::AccessDenied(detail) => ErrorResponse::new(403, "Access Denied")
                .with_detail(detail.clone())
                .with_view(view::FORBIDDEN),
            AppError::Forbidden(detail) => ErrorResponse::forbidden()
                .with_detail(detail.clone())
                .with_view(view::FORBIDDEN),
            AppError::Conflict(detail) => ErrorResponse::conflict(detail.clone()),
            AppError::Validation { errors, view, form } => {
                let mut body = ErrorResponse::unprocessable(
                    errors
                        .iter()
                        .map(|e| FieldErrorBody {
                            field: e.field.clone(),
                            message: e.message.clone(),
                        })
                        .collect(),
                );
                if let Some(view) = view {
                    body = body.with_view(*view);
                }
                if let Some(form) = form {
                    body = body.with_form(form.clone());
                }
                body
            }
            AppError::Internal(detail) => {
                // Details stay in the log
                tracing::error!("Internal error: {}", detail);
                ErrorResponse::internal_error().with_view(view::ERROR)
            }
        };

        let mut response = HttpResponse::build(self.status_code());
        if let AppError::Unauthorized(_) = self {
            response.insert_header((header::WWW_AUTHENTICATE, "Bearer"));
        }
        response.json(error)
    }
}

impl From<RepoError> for AppError {
    fn from(err: RepoError) -> Self {
        match err {
            RepoError::NotFound => AppError::NotFound {
                detail: "Resource not found".to_string(),
                view: view::ERROR,
            },
            RepoError::Constraint(msg) => AppError::Conflict(msg),
            RepoError::Connection(msg) => {
                tracing::error!("Database connection error: {}", msg);
                AppError::Internal("Database error".to_string())
            }
            RepoError::Query(msg) => {
                tracing::error!("Database query error: {}", msg);
                AppError::Internal("Database error".to_string())
            }
        }
    }
}

impl From<AuthError> for AppError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::InvalidCredentials => AppError::Unauthorized("Invalid credentials".to_string()),
            AuthError::AccountDisabled => AppError::Unauthorized("Account disabled".to_string()),
            AuthError::TokenExpired => AppError::Unauthorized("Token expired".to_string()),
            AuthError::InvalidToken(msg) => AppError::Unauthorized(msg),
            AuthError::MissingAuth => AppError::Unauthorized("Missing authorization header".to_string()),
            AuthError::TokenGeneration(msg) | AuthError::HashingError(msg) => AppError::Internal(msg),
        }
    }
}

/// Result type alias for handlers.
pub type AppResult<T> = Result<T, AppError>;
