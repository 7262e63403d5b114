//! # Error Handling
//!
//! Two layers of errors live here:
//!
//! - [`FilterError`] and [`RegistryError`] describe failures inside the filter
//!   dispatch machinery. Filter failures caused by request input never abort a
//!   listing: the orchestrator records them per key and moves on. A registry
//!   lookup outside that path surfaces the missing key to the caller.
//! - [`ApiError`] is what listing handlers return. It maps to an HTTP status,
//!   sends a sanitized message to the client and logs internal details through
//!   `tracing`.
//!
//! ```rust,ignore
//! async fn list_products(
//!     State(db): State<DatabaseConnection>,
//!     Query(params): Query<ListParams>,
//! ) -> Result<Page<product::Model>, ApiError> {
//!     let orchestrator = QueryOrchestrator::for_model::<Product>();
//!     let select = orchestrator.apply_all(product::Entity::find(), &params);
//!     orchestrator.paginate_params(select, &db, &params).await
//! }
//! ```

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use sea_orm::DbErr;
use serde::Serialize;
use std::fmt;

/// Failure while resolving or applying a single filter.
#[derive(Debug, thiserror::Error)]
pub enum FilterError {
    /// The descriptor names a filter kind nobody registered.
    #[error(transparent)]
    Registry(#[from] RegistryError),

    /// The value cannot be turned into a predicate by this filter kind.
    #[error("filter `{kind}` cannot use value for `{field}`: {reason}")]
    InvalidValue {
        kind: String,
        field: String,
        reason: String,
    },
}

impl FilterError {
    pub fn invalid_value(
        kind: impl Into<String>,
        field: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        Self::InvalidValue {
            kind: kind.into(),
            field: field.into(),
            reason: reason.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RegistryError {
    #[error("no filter registered under key `{key}`")]
    NotFound { key: String },
}

/// API error type with automatic logging and sanitized responses
#[derive(Debug)]
pub enum ApiError {
    /// 500 Internal Server Error - Database error (details logged, not exposed)
    Database {
        /// User-facing generic message
        message: String,
        /// Internal error (logged, not sent to user)
        internal: DbErr,
    },

    /// 500 Internal Server Error - Misconfiguration or other internal failure
    Internal {
        /// User-facing generic message
        message: String,
        /// Internal error details (logged, not sent to user)
        internal: Option<String>,
    },
}

impl ApiError {
    /// Create a 500 Internal Server Error from a database error
    ///
    /// The database error details are logged but NOT sent to the user.
    #[must_use]
    pub fn database(err: DbErr) -> Self {
        Self::Database {
            message: "A database error occurred".to_string(),
            internal: err,
        }
    }

    pub fn internal(message: impl Into<String>, internal: Option<String>) -> Self {
        Self::Internal {
            message: message.into(),
            internal,
        }
    }

    /// Get the HTTP status code for this error
    #[must_use]
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::Database { .. } | Self::Internal { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Get the user-facing error message (sanitized)
    #[must_use]
    pub fn user_message(&self) -> &str {
        match self {
            Self::Database { message, .. }
            | Self::Internal { message, .. } => message,
        }
    }

    fn log_internal(&self) {
        match self {
            Self::Database { internal, .. } => {
                tracing::error!(error = ?internal, "Database error occurred");
            }
            Self::Internal {
                internal: Some(details),
                ..
            } => {
                tracing::error!(details = %details, "Internal error occurred");
            }
            _ => {
                tracing::debug!(
                    error = %self.user_message(),
                    status = %self.status_code(),
                    "API error"
                );
            }
        }
    }
}

/// Error response sent to users (sanitized)
#[derive(Serialize)]
struct ErrorResponse<'a> {
    error: &'a str,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        self.log_internal();

        let status = self.status_code();
        let body = Json(ErrorResponse {
            error: self.user_message(),
        });
        (status, body).into_response()
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.user_message())
    }
}

impl std::error::Error for ApiError {}

impl From<DbErr> for ApiError {
    fn from(err: DbErr) -> Self {
        Self::database(err)
    }
}

/// A missing registration is a bootstrap mistake, not bad user input.
impl From<RegistryError> for ApiError {
    fn from(err: RegistryError) -> Self {
        Self::internal("Listing is misconfigured", Some(err.to_string()))
    }
}
