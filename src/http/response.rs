//! Response mapping for translated requests.
//!
//! # Responsibilities
//! - Represent the terminal state of each request
//! - Map terminal states to protocol status codes
//!
//! # Design Decisions
//! - 404 means "not mine, try the next proxy"; 403 means "mine, stop here".
//!   Once a route claims a module, failures must never fall through to a
//!   public proxy.
//! - Bodies are streamed verbatim on success

use axum::{
    body::Body,
    http::{header, StatusCode},
    response::{IntoResponse, Response},
};
use bytes::Bytes;

/// Terminal state of a translated request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProxyOutcome {
    /// Backend answered; body is returned verbatim.
    Served {
        body: Bytes,
        content_type: &'static str,
    },
    /// A route claimed the module but the request cannot be served.
    Rejected,
    /// No route claims the module, or the operation is not implemented.
    Unclaimed,
    /// The request path is not a module-fetch path.
    Malformed,
    /// Anything other than GET.
    MethodNotAllowed,
}

impl ProxyOutcome {
    /// Status code sent to the client.
    pub fn status(&self) -> StatusCode {
        match self {
            ProxyOutcome::Served { .. } => StatusCode::OK,
            ProxyOutcome::Rejected => StatusCode::FORBIDDEN,
            ProxyOutcome::Unclaimed => StatusCode::NOT_FOUND,
            ProxyOutcome::Malformed => StatusCode::BAD_REQUEST,
            ProxyOutcome::MethodNotAllowed => StatusCode::METHOD_NOT_ALLOWED,
        }
    }

    /// Short label for logs and metrics.
    pub fn label(&self) -> &'static str {
        match self {
            ProxyOutcome::Served { .. } => "served",
            ProxyOutcome::Rejected => "rejected",
            ProxyOutcome::Unclaimed => "unclaimed",
            ProxyOutcome::Malformed => "malformed",
            ProxyOutcome::MethodNotAllowed => "method_not_allowed",
        }
    }
}

impl IntoResponse for ProxyOutcome {
    fn into_response(self) -> Response {
        match self {
            ProxyOutcome::Served { body, content_type } => (
                StatusCode::OK,
                [(header::CONTENT_TYPE, content_type)],
                Body::from(body),
            )
                .into_response(),
            other => other.status().into_response(),
        }
    }
}
