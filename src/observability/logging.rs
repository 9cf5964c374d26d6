//! Structured logging.
//!
//! # Responsibilities
//! - Initialize logging subsystem
//! - Render captured request/response bodies for diagnostic logs
//!
//! # Design Decisions
//! - Uses tracing crate for structured logging
//! - Log level configurable via RUST_LOG, defaulting from the debug flag
//! - Bodies are decoded for logging only; undecodable bodies are not logged
//! - Bodies above a configurable limit are reported by size

use axum::http::{header, HeaderMap, StatusCode};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::http::capture::{Captured, CapturedBody, CapturedResponse};
use crate::http::decode::{decode, DecodeError};

/// Install the global tracing subscriber.
pub fn init_tracing(debug: bool) {
    let default_filter = if debug {
        "mirror_proxy=debug,tower_http=debug"
    } else {
        "mirror_proxy=info,tower_http=info"
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
}

/// How a body appears in the log.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BodyLog {
    /// Decoded body, lossily converted to UTF-8, with its decoded length.
    Full { text: String, decoded_len: usize },
    /// Decoded body was larger than the limit; only its length is logged.
    Oversized(usize),
}

/// Decode a raw body and decide how to log it.
pub fn render_body(encoding: Option<&str>, raw: &[u8], limit: usize) -> Result<BodyLog, DecodeError> {
    let decoded = decode(encoding, raw)?;
    if decoded.len() > limit {
        Ok(BodyLog::Oversized(decoded.len()))
    } else {
        Ok(BodyLog::Full {
            text: String::from_utf8_lossy(&decoded).into_owned(),
            decoded_len: decoded.len(),
        })
    }
}

fn content_encoding(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(header::CONTENT_ENCODING)
        .and_then(|v| v.to_str().ok())
}

fn log_body(request_id: &str, kind: &'static str, headers: &HeaderMap, raw: &[u8], limit: usize) {
    match render_body(content_encoding(headers), raw, limit) {
        Ok(BodyLog::Full { text, decoded_len }) => {
            tracing::info!(request_id = %request_id, kind, bytes = decoded_len, body = %text, "Body");
        }
        Ok(BodyLog::Oversized(size)) => {
            tracing::info!(request_id = %request_id, kind, bytes = size, "Body too large to log");
        }
        Err(e) => {
            tracing::warn!(request_id = %request_id, kind, error = %e, "Body not logged");
        }
    }
}

/// Wait for a captured request body and log it.
pub async fn log_request_body(request_id: String, headers: HeaderMap, captured: Captured, limit: usize) {
    match captured.await {
        Ok(CapturedBody::Copied(body)) if !body.is_empty() => {
            log_body(&request_id, "request", &headers, &body, limit)
        }
        Ok(_) => {}
        Err(_) => tracing::debug!(request_id = %request_id, "Request body incomplete, not logged"),
    }
}

/// Settings for [`log_response`].
#[derive(Debug, Clone, Copy)]
pub struct ResponseLogging {
    pub debug: bool,
    pub body_limit: usize,
}

/// Wait for a captured response body and log the completed response.
pub async fn log_response(
    request_id: String,
    status: StatusCode,
    headers: HeaderMap,
    captured: Captured,
    settings: ResponseLogging,
) {
    let captured = match captured.await {
        Ok(captured) => captured,
        Err(_) => {
            tracing::debug!(request_id = %request_id, status = %status, "Response aborted before completion");
            return;
        }
    };

    tracing::debug!(
        request_id = %request_id,
        status = %status,
        bytes = captured.len(),
        "Response completed"
    );

    if !settings.debug {
        return;
    }
    // Counted captures carry no body.
    if let CapturedBody::Copied(body) = captured {
        let response = CapturedResponse { status, headers, body };
        tracing::info!(request_id = %request_id, status = %response.status, headers = ?response.headers, "Response headers");
        log_body(&request_id, "response", &response.headers, &response.body, settings.body_limit);
    }
}
