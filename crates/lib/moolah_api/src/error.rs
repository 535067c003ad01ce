//! RPC result envelope and fault translation.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use moolah_core::error::{CoreError, ErrorCode, HttpFault, InternalFault, MessageKey};
use serde::Serialize;
use serde::ser::{SerializeStruct, Serializer};
use serde_json::{Map, Value};
use thiserror::Error;
use tracing::error;

use crate::i18n::Translator;
use crate::rpc::RpcContext;

/// Collection metadata attached to list results.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RpcMeta {
    pub count: Option<u64>,
    pub next_cursor: Option<String>,
    pub previous_cursor: Option<String>,
}

/// Per-field validation detail.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RpcErrorDetail {
    pub field: String,
    pub message: String,
}

/// Error returned to RPC callers. `message` is already translated.
#[derive(Debug, Clone, PartialEq, Error, Serialize)]
#[error("{code}: {message}")]
pub struct RpcError {
    pub code: ErrorCode,
    pub message: String,
    pub context: Option<Map<String, Value>>,
    pub details: Option<Vec<RpcErrorDetail>>,
}

impl RpcError {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            context: None,
            details: None,
        }
    }

    /// Translate a client-facing fault for the caller's locale.
    pub fn from_fault(fault: &HttpFault, ctx: &RpcContext, translator: &dyn Translator) -> Self {
        Self::new(fault.code, translator.message(fault.message_key, ctx.locale))
    }

    pub fn status(&self) -> StatusCode {
        StatusCode::from_u16(self.code.http_status()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
    }
}

/// `{ok: true, data, meta}` or `{ok: false, error}`.
#[derive(Debug, Clone, PartialEq)]
pub enum RpcResult<T> {
    Success { data: T, meta: Option<RpcMeta> },
    Failure(RpcError),
}

impl<T> RpcResult<T> {
    pub fn ok(data: T, meta: Option<RpcMeta>) -> Self {
        RpcResult::Success { data, meta }
    }

    pub fn is_ok(&self) -> bool {
        matches!(self, RpcResult::Success { .. })
    }

    pub fn data(self) -> Option<T> {
        match self {
            RpcResult::Success { data, .. } => Some(data),
            RpcResult::Failure(_) => None,
        }
    }

    pub fn error(&self) -> Option<&RpcError> {
        match self {
            RpcResult::Success { .. } => None,
            RpcResult::Failure(err) => Some(err),
        }
    }
}

impl<T: Serialize> Serialize for RpcResult<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            RpcResult::Success { data, meta } => {
                let mut s = serializer.serialize_struct("RpcSuccess", 3)?;
                s.serialize_field("ok", &true)?;
                s.serialize_field("data", data)?;
                s.serialize_field("meta", meta)?;
                s.end()
            }
            RpcResult::Failure(err) => {
                let mut s = serializer.serialize_struct("RpcFailure", 2)?;
                s.serialize_field("ok", &false)?;
                s.serialize_field("error", err)?;
                s.end()
            }
        }
    }
}

/// Convert a service error into an [`RpcError`].
///
/// Client-facing faults are translated as-is. Anything else is logged once
/// and replaced with a generic server error.
pub fn to_rpc_failure(err: CoreError, ctx: &RpcContext, translator: &dyn Translator) -> RpcError {
    match err {
        CoreError::Http(fault) => RpcError::from_fault(&fault, ctx, translator),
        CoreError::Internal(fault) => {
            log_internal(&fault, ctx);
            server_error(ctx, translator)
        }
        other => {
            error!(
                request_id = ctx.id.as_deref(),
                cause = %other,
                tags = ?["rpc"],
                "Unexpected exception"
            );
            server_error(ctx, translator)
        }
    }
}

fn log_internal(fault: &InternalFault, ctx: &RpcContext) {
    let origin = fault.origin.as_ref();
    error!(
        request_id = ctx.id.as_deref(),
        exception_name = fault.kind.name(),
        exception_tags = ?fault.tags,
        cause = ?fault.cause,
        metadata = %serde_json::Value::Object(fault.metadata.clone()),
        source = origin.map(|o| o.source.as_str()),
        action = origin.map(|o| o.action.as_str()),
        tags = ?["rpc", "service"],
        "{}",
        fault.message
    );
}

fn server_error(ctx: &RpcContext, translator: &dyn Translator) -> RpcError {
    RpcError::new(
        ErrorCode::ServerError,
        translator.message(MessageKey::InternalServerError, ctx.locale),
    )
}

impl IntoResponse for RpcError {
    fn into_response(self) -> Response {
        let status = self.status();
        (status, Json(RpcResult::<()>::Failure(self))).into_response()
    }
}

impl<T: Serialize> IntoResponse for RpcResult<T> {
    fn into_response(self) -> Response {
        match self {
            RpcResult::Failure(err) => err.into_response(),
            success => (StatusCode::OK, Json(success)).into_response(),
        }
    }
}
