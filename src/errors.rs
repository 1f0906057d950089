//! Errors for the fleet API
use axum::{
    extract::rejection::{JsonRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use sqlx::error::ErrorKind;
use thiserror::Error;
use tracing::error;

use crate::validation::ValidationError;

#[derive(Error, Debug)]
pub enum FleetError {
    #[error("{entity} not found: {key}")]
    NotFound { entity: &'static str, key: String },

    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("Invalid reference: {0}")]
    Reference(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Method \"{0}\" not allowed")]
    MethodNotAllowed(String),

    #[error("Geocoding failed: {0}")]
    Geocoding(String),

    #[error("Configuration error")]
    ConfigError(#[from] config::ConfigError),

    #[error("Invalid configuration: {message}")]
    ConfigurationError { message: String },

    #[error("IO error")]
    IoError(#[from] std::io::Error),

    #[error("HTTP client error")]
    HttpError(#[from] reqwest::Error),

    #[error("Database migration error")]
    MigrationError(#[from] sqlx::migrate::MigrateError),

    #[error("Database error")]
    DatabaseError(sqlx::Error),
}

impl FleetError {
    pub fn not_found(entity: &'static str, key: impl ToString) -> Self {
        FleetError::NotFound {
            entity,
            key: key.to_string(),
        }
    }

    /// Classify an error raised by a DELETE statement.
    ///
    /// A foreign key violation here means the row is still referenced
    /// (RESTRICT), which is a conflict rather than a bad reference.
    pub fn on_delete(err: sqlx::Error) -> Self {
        if let sqlx::Error::Database(db) = &err {
            if db.kind() == ErrorKind::ForeignKeyViolation {
                return FleetError::Conflict(format!(
                    "record is still referenced ({})",
                    db.constraint().unwrap_or("foreign key")
                ));
            }
        }
        err.into()
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            FleetError::NotFound { .. } => StatusCode::NOT_FOUND,
            FleetError::Validation(_) | FleetError::Reference(_) => StatusCode::BAD_REQUEST,
            FleetError::Conflict(_) => StatusCode::CONFLICT,
            FleetError::MethodNotAllowed(_) => StatusCode::METHOD_NOT_ALLOWED,
            FleetError::Geocoding(_) | FleetError::HttpError(_) => StatusCode::BAD_GATEWAY,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<sqlx::Error> for FleetError {
    fn from(err: sqlx::Error) -> Self {
        if let sqlx::Error::Database(db) = &err {
            let constraint = db.constraint().unwrap_or_default().to_string();
            match db.kind() {
                ErrorKind::ForeignKeyViolation => {
                    return FleetError::Reference(format!(
                        "referenced record does not exist ({constraint})"
                    ))
                }
                ErrorKind::UniqueViolation => {
                    return FleetError::Conflict(format!("duplicate record ({constraint})"))
                }
                _ => {}
            }
        }
        FleetError::DatabaseError(err)
    }
}

impl From<JsonRejection> for FleetError {
    fn from(rejection: JsonRejection) -> Self {
        ValidationError::field("body", rejection.body_text()).into()
    }
}

impl From<QueryRejection> for FleetError {
    fn from(rejection: QueryRejection) -> Self {
        ValidationError::field("query", rejection.body_text()).into()
    }
}

impl IntoResponse for FleetError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            // Display strings of infrastructure variants stay generic; details go to the log
            error!("Request failed: {:?}", self);
        }

        let body = Json(json!({
            "error": self.to_string(),
            "status": status.as_u16()
        }));

        (status, body).into_response()
    }
}
