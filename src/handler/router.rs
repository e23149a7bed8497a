//! Request dispatch module
//!
//! Entry point for HTTP request processing: method check, file serving and
//! access logging.

use crate::config::ServeContext;
use crate::handler::static_files;
use crate::http;
use crate::logger::{self, AccessLogEntry};
use http_body_util::Full;
use hyper::body::{Body, Bytes};
use hyper::header::{HeaderValue, SERVER};
use hyper::{Method, Request, Response, Version};
use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;

/// Request context encapsulating information needed for request processing
pub struct RequestContext {
    /// Raw (still percent-encoded) path
    pub path: String,
    pub query: Option<String>,
    pub is_head: bool,
    pub if_modified_since: Option<String>,
    pub range_header: Option<String>,
}

impl RequestContext {
    pub fn from_request<B>(req: &Request<B>) -> Self {
        let header = |name: &str| {
            req.headers()
                .get(name)
                .and_then(|v| v.to_str().ok())
                .map(ToString::to_string)
        };

        Self {
            path: req.uri().path().to_string(),
            query: req.uri().query().map(ToString::to_string),
            is_head: req.method() == Method::HEAD,
            if_modified_since: header("if-modified-since"),
            range_header: header("range"),
        }
    }
}

/// Main entry point for HTTP request handling
///
/// Never fails: every per-request problem becomes a status response.
pub async fn handle_request<B>(
    req: Request<B>,
    ctx: Arc<ServeContext>,
    peer_addr: SocketAddr,
) -> Result<Response<Full<Bytes>>, Infallible> {
    let started = Instant::now();

    let mut response = if matches!(*req.method(), Method::GET | Method::HEAD) {
        let request_ctx = RequestContext::from_request(&req);
        static_files::serve(&request_ctx, &ctx).await
    } else {
        logger::log_warning(&format!("Method not allowed: {}", req.method()));
        http::build_405_response()
    };

    if let Ok(value) = HeaderValue::from_str(&ctx.server_name) {
        response.headers_mut().insert(SERVER, value);
    }

    if ctx.access_log {
        let entry = access_entry(&req, &response, peer_addr, started);
        logger::log_access(&entry, &ctx.access_log_format);
    }

    Ok(response)
}

fn access_entry<B>(
    req: &Request<B>,
    response: &Response<Full<Bytes>>,
    peer_addr: SocketAddr,
    started: Instant,
) -> AccessLogEntry {
    let header = |name: &str| {
        req.headers()
            .get(name)
            .and_then(|v| v.to_str().ok())
            .map(ToString::to_string)
    };

    let mut entry = AccessLogEntry::new(
        peer_addr.ip().to_string(),
        req.method().to_string(),
        req.uri().path().to_string(),
    );
    entry.query = req.uri().query().map(ToString::to_string);
    entry.http_version = match req.version() {
        Version::HTTP_10 => "1.0",
        Version::HTTP_2 => "2",
        _ => "1.1",
    }
    .to_string();
    entry.status = response.status().as_u16();
    entry.body_bytes = response.body().size_hint().exact().unwrap_or(0);
    entry.referer = header("referer");
    entry.user_agent = header("user-agent");
    entry.request_time_us = u64::try_from(started.elapsed().as_micros()).unwrap_or(u64::MAX);
    entry
}
