//! Fault taxonomy shared by every service.
//!
//! Two families of faults exist. [`HttpFault`] is meant for the caller: it
//! carries a status, a machine-readable [`ErrorCode`] and a [`MessageKey`]
//! that the RPC boundary translates. [`InternalFault`] never reaches the
//! caller verbatim; it carries cause, metadata and tags for the log and is
//! replaced with a generic server error at the boundary.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

/// Convenience alias for core results.
pub type CoreResult<T> = Result<T, CoreError>;

/// Errors produced by the core services and stores.
#[derive(Debug, Error)]
pub enum CoreError {
    #[error(transparent)]
    Http(#[from] HttpFault),

    #[error(transparent)]
    Internal(#[from] InternalFault),

    #[error("Token error: {0}")]
    TokenError(String),

    #[error("Database error: {0}")]
    DbError(#[from] sqlx::Error),
}

// =============================================================================
// Error codes & message keys
// =============================================================================

/// Machine-readable error codes returned to RPC callers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    AuthRequired,
    AuthInvalid,
    AuthExpired,
    Forbidden,
    ValidationError,
    InvalidInput,
    NotFound,
    AlreadyExists,
    Conflict,
    RateLimited,
    ServerError,
    Unavailable,
}

impl ErrorCode {
    /// HTTP status paired with this code.
    pub fn http_status(self) -> u16 {
        match self {
            ErrorCode::AuthRequired | ErrorCode::AuthInvalid | ErrorCode::AuthExpired => 401,
            ErrorCode::Forbidden => 403,
            ErrorCode::ValidationError | ErrorCode::InvalidInput => 400,
            ErrorCode::NotFound => 404,
            ErrorCode::AlreadyExists | ErrorCode::Conflict => 409,
            ErrorCode::RateLimited => 429,
            ErrorCode::ServerError => 500,
            ErrorCode::Unavailable => 503,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ErrorCode::AuthRequired => "AUTH_REQUIRED",
            ErrorCode::AuthInvalid => "AUTH_INVALID",
            ErrorCode::AuthExpired => "AUTH_EXPIRED",
            ErrorCode::Forbidden => "FORBIDDEN",
            ErrorCode::ValidationError => "VALIDATION_ERROR",
            ErrorCode::InvalidInput => "INVALID_INPUT",
            ErrorCode::NotFound => "NOT_FOUND",
            ErrorCode::AlreadyExists => "ALREADY_EXISTS",
            ErrorCode::Conflict => "CONFLICT",
            ErrorCode::RateLimited => "RATE_LIMITED",
            ErrorCode::ServerError => "SERVER_ERROR",
            ErrorCode::Unavailable => "UNAVAILABLE",
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Keys into the translated message tables.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MessageKey {
    #[serde(rename = "global_fallback")]
    Fallback,
    #[serde(rename = "global_exception_fallback")]
    ExceptionFallback,
    #[serde(rename = "global_exception_badRequest")]
    BadRequest,
    #[serde(rename = "global_exception_unauthorized")]
    Unauthorized,
    #[serde(rename = "global_exception_forbidden")]
    Forbidden,
    #[serde(rename = "global_exception_notFound")]
    NotFound,
    #[serde(rename = "global_exception_conflict")]
    Conflict,
    #[serde(rename = "global_exception_tooManyRequests")]
    TooManyRequests,
    #[serde(rename = "global_exception_internalServerError")]
    InternalServerError,
    #[serde(rename = "global_exception_serviceUnavailable")]
    ServiceUnavailable,
    /// A valid user lacking an admin role tried the admin surface.
    #[serde(rename = "error_forbidden_reason")]
    AdminAccessRequired,
}

impl MessageKey {
    /// Every key; each locale table must cover all of them.
    pub const ALL: [MessageKey; 11] = [
        MessageKey::Fallback,
        MessageKey::ExceptionFallback,
        MessageKey::BadRequest,
        MessageKey::Unauthorized,
        MessageKey::Forbidden,
        MessageKey::NotFound,
        MessageKey::Conflict,
        MessageKey::TooManyRequests,
        MessageKey::InternalServerError,
        MessageKey::ServiceUnavailable,
        MessageKey::AdminAccessRequired,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            MessageKey::Fallback => "global_fallback",
            MessageKey::ExceptionFallback => "global_exception_fallback",
            MessageKey::BadRequest => "global_exception_badRequest",
            MessageKey::Unauthorized => "global_exception_unauthorized",
            MessageKey::Forbidden => "global_exception_forbidden",
            MessageKey::NotFound => "global_exception_notFound",
            MessageKey::Conflict => "global_exception_conflict",
            MessageKey::TooManyRequests => "global_exception_tooManyRequests",
            MessageKey::InternalServerError => "global_exception_internalServerError",
            MessageKey::ServiceUnavailable => "global_exception_serviceUnavailable",
            MessageKey::AdminAccessRequired => "error_forbidden_reason",
        }
    }
}

impl fmt::Display for MessageKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// =============================================================================
// Client-facing faults
// =============================================================================

/// A fault intended to be propagated to the caller.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("HTTP {status} {code} ({message_key})")]
pub struct HttpFault {
    pub status: u16,
    pub code: ErrorCode,
    pub message_key: MessageKey,
}

impl HttpFault {
    pub fn new(status: u16, code: ErrorCode, message_key: MessageKey) -> Self {
        Self {
            status,
            code,
            message_key,
        }
    }

    pub fn bad_request() -> Self {
        Self::new(400, ErrorCode::ValidationError, MessageKey::BadRequest)
    }

    pub fn unauthorized() -> Self {
        Self::new(401, ErrorCode::AuthRequired, MessageKey::Unauthorized)
    }

    pub fn forbidden() -> Self {
        Self::new(403, ErrorCode::Forbidden, MessageKey::Forbidden)
    }

    pub fn not_found() -> Self {
        Self::new(404, ErrorCode::NotFound, MessageKey::NotFound)
    }

    pub fn conflict() -> Self {
        Self::new(409, ErrorCode::Conflict, MessageKey::Conflict)
    }

    pub fn too_many_requests() -> Self {
        Self::new(429, ErrorCode::RateLimited, MessageKey::TooManyRequests)
    }

    pub fn internal_server_error() -> Self {
        Self::new(500, ErrorCode::ServerError, MessageKey::InternalServerError)
    }

    pub fn service_unavailable() -> Self {
        Self::new(503, ErrorCode::Unavailable, MessageKey::ServiceUnavailable)
    }

    /// Override the machine code, keeping status and message.
    pub fn with_code(mut self, code: ErrorCode) -> Self {
        self.code = code;
        self
    }

    /// Override the message key, keeping status and code.
    pub fn with_message_key(mut self, message_key: MessageKey) -> Self {
        self.message_key = message_key;
        self
    }
}

// =============================================================================
// Internal faults
// =============================================================================

/// Category of an [`InternalFault`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InternalKind {
    AssertionFailed,
    ExternalServiceFailed,
    ExternalServiceDataValidation,
    MissingArgument,
    InvalidArgument,
    MissingField,
    InvalidField,
    PermissionDenied,
    PreconditionFailed,
    ResourceNotFound,
    Unexpected,
    InvalidConfiguration,
    Dependency,
    /// Expected interruption of control flow, not an error condition.
    ControlFlow,
}

impl InternalKind {
    pub fn name(self) -> &'static str {
        match self {
            InternalKind::AssertionFailed => "assertion_failed",
            InternalKind::ExternalServiceFailed => "external_service_failed",
            InternalKind::ExternalServiceDataValidation => "external_service_data_validation",
            InternalKind::MissingArgument => "missing_argument",
            InternalKind::InvalidArgument => "invalid_argument",
            InternalKind::MissingField => "missing_field",
            InternalKind::InvalidField => "invalid_field",
            InternalKind::PermissionDenied => "permission_denied",
            InternalKind::PreconditionFailed => "precondition_failed",
            InternalKind::ResourceNotFound => "resource_not_found",
            InternalKind::Unexpected => "unexpected",
            InternalKind::InvalidConfiguration => "invalid_configuration",
            InternalKind::Dependency => "dependency",
            InternalKind::ControlFlow => "control_flow",
        }
    }

    pub fn default_message(self) -> &'static str {
        match self {
            InternalKind::AssertionFailed => "Assertion failed",
            InternalKind::ExternalServiceFailed => "External service failure",
            InternalKind::ExternalServiceDataValidation => {
                "External service returned invalid data"
            }
            InternalKind::MissingArgument => "Missing argument",
            InternalKind::InvalidArgument => "Invalid argument",
            InternalKind::MissingField => "Missing field",
            InternalKind::InvalidField => "Invalid field",
            InternalKind::PermissionDenied => "Permission denied",
            InternalKind::PreconditionFailed => "Precondition failed",
            InternalKind::ResourceNotFound => "Resource not found",
            InternalKind::Unexpected => "An unexpected error occurred",
            InternalKind::InvalidConfiguration => "Invalid configuration",
            InternalKind::Dependency => "Dependency failure",
            InternalKind::ControlFlow => "Control flow interruption",
        }
    }
}

/// Where an internal fault was raised.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FaultOrigin {
    pub source: String,
    pub action: String,
}

/// A fault that stays inside the process and is only ever logged.
#[derive(Debug)]
pub struct InternalFault {
    pub kind: InternalKind,
    pub message: String,
    pub cause: Option<Box<dyn std::error::Error + Send + Sync + 'static>>,
    pub metadata: Map<String, Value>,
    pub origin: Option<FaultOrigin>,
    pub tags: Vec<String>,
}

impl InternalFault {
    /// New fault of `kind` with its default message.
    pub fn new(kind: InternalKind) -> Self {
        Self {
            kind,
            message: kind.default_message().to_string(),
            cause: None,
            metadata: Map::new(),
            origin: None,
            tags: Vec::new(),
        }
    }

    pub fn message(mut self, message: impl Into<String>) -> Self {
        self.message = message.into();
        self
    }

    pub fn cause(mut self, cause: impl std::error::Error + Send + Sync + 'static) -> Self {
        self.cause = Some(Box::new(cause));
        self
    }

    pub fn meta(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }

    pub fn origin(mut self, source: impl Into<String>, action: impl Into<String>) -> Self {
        self.origin = Some(FaultOrigin {
            source: source.into(),
            action: action.into(),
        });
        self
    }

    pub fn tags(mut self, tags: &[&str]) -> Self {
        self.tags.extend(tags.iter().map(|t| t.to_string()));
        self
    }
}

impl fmt::Display for InternalFault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

impl std::error::Error for InternalFault {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.cause
            .as_deref()
            .map(|e| e as &(dyn std::error::Error + 'static))
    }
}
