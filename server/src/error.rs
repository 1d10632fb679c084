//! Central error type, grounded on the teacher's `error.rs`: one `AppError`
//! enum, `IntoResponse` for the surviving HTTP surface, and `From` impls at
//! every boundary so call sites can use `?`.
use axum::{http::StatusCode, response::{IntoResponse, Response}, Json};
use serde_json::json;

pub type AppResult<T> = Result<T, AppError>;

#[derive(Debug)]
pub enum AppError {
    NotFound(String),
    BadRequest(String),
    Internal(anyhow::Error),
    RequestTimeout,
    TooManyRequests,
    Unauthorized(String),
    DbError(sea_orm::error::DbErr),
    Conflict(String),
    EncryptToken,
    DecryptToken,
    Provider(ProviderError),
    Graph(neo4rs::Error),
    Stream(String),
}

impl From<anyhow::Error> for AppError {
    fn from(error: anyhow::Error) -> Self {
        AppError::Internal(error)
    }
}

impl From<reqwest::Error> for AppError {
    fn from(error: reqwest::Error) -> Self {
        tracing::error!("reqwest error: {:?}", error);
        match error.status() {
            Some(StatusCode::BAD_REQUEST) => AppError::BadRequest(error.to_string()),
            Some(StatusCode::REQUEST_TIMEOUT) => AppError::RequestTimeout,
            Some(StatusCode::TOO_MANY_REQUESTS) => AppError::TooManyRequests,
            _ => AppError::Internal(error.into()),
        }
    }
}

impl From<sea_orm::error::DbErr> for AppError {
    fn from(error: sea_orm::error::DbErr) -> Self {
        AppError::DbError(error)
    }
}

impl From<lib_utils::crypt::Error> for AppError {
    fn from(error: lib_utils::crypt::Error) -> Self {
        tracing::error!("crypt error: {:?}", error);
        match error {
            lib_utils::crypt::Error::EncryptFailed(_) => AppError::EncryptToken,
            _ => AppError::DecryptToken,
        }
    }
}

impl From<neo4rs::Error> for AppError {
    fn from(error: neo4rs::Error) -> Self {
        AppError::Graph(error)
    }
}

impl From<ProviderError> for AppError {
    fn from(error: ProviderError) -> Self {
        AppError::Provider(error)
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, body) = match self {
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            AppError::Internal(e) => {
                tracing::error!("internal error: {e}");
                (StatusCode::INTERNAL_SERVER_ERROR, "internal server error".into())
            }
            AppError::RequestTimeout => (StatusCode::REQUEST_TIMEOUT, "request took too long".into()),
            AppError::TooManyRequests => (StatusCode::TOO_MANY_REQUESTS, "too many requests".into()),
            AppError::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, msg),
            AppError::DbError(err) => {
                tracing::error!("database error: {err:?}");
                (StatusCode::INTERNAL_SERVER_ERROR, "database error".into())
            }
            AppError::Conflict(msg) => (StatusCode::CONFLICT, msg),
            AppError::EncryptToken | AppError::DecryptToken => {
                (StatusCode::INTERNAL_SERVER_ERROR, "token encryption error".into())
            }
            AppError::Provider(err) => {
                tracing::error!("provider error: {err:?}");
                (StatusCode::BAD_GATEWAY, "provider error".into())
            }
            AppError::Graph(err) => {
                tracing::error!("graph error: {err:?}");
                (StatusCode::INTERNAL_SERVER_ERROR, "graph store error".into())
            }
            AppError::Stream(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg),
        };

        (status, Json(json!({"error": {"code": status.as_u16(), "message": body}}))).into_response()
    }
}

/// Tagged provider error kinds per the REDESIGN FLAGS: a sum type plus a
/// `retriable` bit, surfaced identically at every provider call site instead
/// of source-style error wrapping.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProviderErrorKind {
    TokenExpired,
    RateLimited,
    NotFound,
    SyncRequired,
    Server,
    Other,
}

#[derive(Debug, Clone)]
pub struct ProviderError {
    pub kind: ProviderErrorKind,
    pub message: String,
}

impl ProviderError {
    pub fn new(kind: ProviderErrorKind, message: impl Into<String>) -> Self {
        Self { kind, message: message.into() }
    }

    /// Per §4.2/§7: only server-ish failures (5xx/429) are retriable and
    /// trip the circuit breaker. Client errors (400/401/403/404) and
    /// `sync_required` are terminal at this layer.
    pub fn retriable(&self) -> bool {
        matches!(self.kind, ProviderErrorKind::RateLimited | ProviderErrorKind::Server)
    }

    pub fn trips_breaker(&self) -> bool {
        self.retriable()
    }

    pub fn from_status(status: reqwest::StatusCode, message: impl Into<String>) -> Self {
        let kind = match status.as_u16() {
            401 => ProviderErrorKind::TokenExpired,
            404 => ProviderErrorKind::NotFound,
            429 | 500 | 502 | 503 => ProviderErrorKind::RateLimited,
            400..=499 => ProviderErrorKind::Other,
            _ => ProviderErrorKind::Server,
        };
        ProviderError::new(kind, message)
    }
}

impl std::fmt::Display for ProviderError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}: {}", self.kind, self.message)
    }
}

impl std::error::Error for ProviderError {}
