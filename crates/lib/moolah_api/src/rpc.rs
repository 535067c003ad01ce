//! Request context and the RPC handler wrapper.

use std::convert::Infallible;
use std::future::Future;
use std::sync::Arc;

use axum::extract::{FromRef, FromRequest, FromRequestParts, Json, Request};
use axum::http::HeaderMap;
use axum::http::header::ACCEPT_LANGUAGE;
use axum::http::request::Parts;
use moolah_core::error::{CoreResult, HttpFault};
use serde::de::DeserializeOwned;
use tracing::{Instrument, debug, info_span};

use crate::error::{RpcError, RpcMeta, RpcResult, to_rpc_failure};
use crate::i18n::{Locale, Translator};

pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// Per-call metadata: trace id and the locale errors are translated into.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RpcContext {
    pub id: Option<String>,
    pub locale: Locale,
}

impl RpcContext {
    pub fn new(id: Option<String>, locale: Locale) -> Self {
        Self { id, locale }
    }

    /// Read `x-request-id` and `Accept-Language`. A missing id gets a fresh one.
    pub fn from_headers(headers: &HeaderMap) -> Self {
        let id = headers
            .get(REQUEST_ID_HEADER)
            .and_then(|v| v.to_str().ok())
            .map(str::to_owned)
            .unwrap_or_else(|| uuid::Uuid::new_v4().to_string());
        let locale = headers
            .get(ACCEPT_LANGUAGE)
            .and_then(|v| v.to_str().ok())
            .map(Locale::from_accept_language)
            .unwrap_or_default();
        Self::new(Some(id), locale)
    }
}

impl<S: Send + Sync> FromRequestParts<S> for RpcContext {
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(Self::from_headers(&parts.headers))
    }
}

/// A page of items plus cursor metadata, for [`RpcHandler::rpc_list`].
#[derive(Debug, Clone)]
pub struct RpcList<T> {
    pub items: Vec<T>,
    pub count: Option<u64>,
    pub next_cursor: Option<String>,
    pub previous_cursor: Option<String>,
}

impl<T> RpcList<T> {
    /// Every item, counted.
    pub fn all(items: Vec<T>) -> Self {
        Self {
            count: Some(items.len() as u64),
            items,
            next_cursor: None,
            previous_cursor: None,
        }
    }
}

/// Runs service calls and turns their errors into translated failures.
#[derive(Clone)]
pub struct RpcHandler {
    translator: Arc<dyn Translator>,
}

impl RpcHandler {
    pub fn new(translator: Arc<dyn Translator>) -> Self {
        Self { translator }
    }

    pub fn translator(&self) -> &dyn Translator {
        self.translator.as_ref()
    }

    pub async fn rpc<T, F>(&self, ctx: &RpcContext, call: F) -> RpcResult<T>
    where
        F: Future<Output = CoreResult<T>>,
    {
        self.rpc_with_meta(ctx, call, None).await
    }

    pub async fn rpc_with_meta<T, F>(
        &self,
        ctx: &RpcContext,
        call: F,
        meta: Option<RpcMeta>,
    ) -> RpcResult<T>
    where
        F: Future<Output = CoreResult<T>>,
    {
        let span = info_span!("rpc", request_id = ctx.id.as_deref(), locale = %ctx.locale);
        match call.instrument(span).await {
            Ok(data) => RpcResult::ok(data, meta),
            Err(err) => RpcResult::Failure(to_rpc_failure(err, ctx, self.translator())),
        }
    }

    /// Like [`rpc`](Self::rpc), with count and cursors lifted into `meta`.
    pub async fn rpc_list<T, F>(&self, ctx: &RpcContext, call: F) -> RpcResult<Vec<T>>
    where
        F: Future<Output = CoreResult<RpcList<T>>>,
    {
        match self.rpc(ctx, call).await {
            RpcResult::Success { data: list, .. } => RpcResult::ok(
                list.items,
                Some(RpcMeta {
                    count: list.count,
                    next_cursor: list.next_cursor,
                    previous_cursor: list.previous_cursor,
                }),
            ),
            RpcResult::Failure(err) => RpcResult::Failure(err),
        }
    }

    /// Translate a fault raised outside a service call.
    pub fn reject(&self, fault: HttpFault, ctx: &RpcContext) -> RpcError {
        RpcError::from_fault(&fault, ctx, self.translator())
    }
}

/// JSON body extractor whose rejection is a translated RPC failure.
#[derive(Debug, Clone)]
pub struct RpcInput<T>(pub T);

impl<S, T> FromRequest<S> for RpcInput<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
    RpcHandler: FromRef<S>,
{
    type Rejection = RpcError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let ctx = RpcContext::from_headers(req.headers());
        match Json::<T>::from_request(req, state).await {
            Ok(Json(input)) => Ok(Self(input)),
            Err(rejection) => {
                debug!(reason = %rejection.body_text(), tags = ?["rpc"], "rejected RPC input");
                Err(RpcHandler::from_ref(state).reject(HttpFault::bad_request(), &ctx))
            }
        }
    }
}
