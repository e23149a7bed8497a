//! HTTP response building module
//!
//! Builders for every status the file server answers with.

use http_body_util::Full;
use hyper::body::Bytes;
use hyper::{Response, StatusCode};

use super::range::ByteRange;

/// Headers shared by full and partial file responses
pub struct FileHeaders<'a> {
    pub content_type: &'a str,
    pub last_modified: Option<&'a str>,
}

/// Build 200 OK file response. `length` is the file size; for HEAD the
/// body is empty but the length is still advertised.
pub fn build_file_response(
    body: Bytes,
    length: u64,
    headers: &FileHeaders<'_>,
    is_head: bool,
) -> Response<Full<Bytes>> {
    let mut builder = Response::builder()
        .status(StatusCode::OK)
        .header("Content-Type", headers.content_type)
        .header("Content-Length", length)
        .header("Accept-Ranges", "bytes");
    if let Some(modified) = headers.last_modified {
        builder = builder.header("Last-Modified", modified);
    }

    let body = if is_head { Bytes::new() } else { body };
    builder.body(Full::new(body)).unwrap_or_else(|e| {
        log_build_error("200", &e);
        Response::new(Full::new(Bytes::new()))
    })
}

/// Build 206 Partial Content response
pub fn build_partial_response(
    body: Bytes,
    range: ByteRange,
    total_size: u64,
    headers: &FileHeaders<'_>,
    is_head: bool,
) -> Response<Full<Bytes>> {
    let mut builder = Response::builder()
        .status(StatusCode::PARTIAL_CONTENT)
        .header("Content-Type", headers.content_type)
        .header("Content-Length", range.len())
        .header(
            "Content-Range",
            format!("bytes {}-{}/{total_size}", range.start, range.end),
        )
        .header("Accept-Ranges", "bytes");
    if let Some(modified) = headers.last_modified {
        builder = builder.header("Last-Modified", modified);
    }

    let body = if is_head { Bytes::new() } else { body };
    builder.body(Full::new(body)).unwrap_or_else(|e| {
        log_build_error("206", &e);
        Response::new(Full::new(Bytes::new()))
    })
}

/// Build 304 Not Modified response
pub fn build_304_response(last_modified: &str) -> Response<Full<Bytes>> {
    Response::builder()
        .status(StatusCode::NOT_MODIFIED)
        .header("Last-Modified", last_modified)
        .body(Full::new(Bytes::new()))
        .unwrap_or_else(|e| {
            log_build_error("304", &e);
            Response::new(Full::new(Bytes::new()))
        })
}

/// Build 301 redirect, used to add the trailing slash to directory URLs
pub fn build_redirect_response(location: &str) -> Response<Full<Bytes>> {
    Response::builder()
        .status(StatusCode::MOVED_PERMANENTLY)
        .header("Location", location)
        .header("Content-Length", 0)
        .body(Full::new(Bytes::new()))
        .unwrap_or_else(|e| {
            log_build_error("301", &e);
            Response::new(Full::new(Bytes::new()))
        })
}

/// Build an HTML page response (directory listings)
pub fn build_html_response(content: String, is_head: bool) -> Response<Full<Bytes>> {
    let content_length = content.len();
    let body = if is_head {
        Bytes::new()
    } else {
        Bytes::from(content)
    };

    Response::builder()
        .status(StatusCode::OK)
        .header("Content-Type", "text/html; charset=utf-8")
        .header("Content-Length", content_length)
        .body(Full::new(body))
        .unwrap_or_else(|e| {
            log_build_error("HTML", &e);
            Response::new(Full::new(Bytes::new()))
        })
}

/// Build a plain-text error response, e.g. `404 Not Found`
pub fn build_error_response(status: StatusCode, is_head: bool) -> Response<Full<Bytes>> {
    let text = format!(
        "{} {}",
        status.as_str(),
        status.canonical_reason().unwrap_or("Error")
    );
    let content_length = text.len();
    let body = if is_head {
        Bytes::new()
    } else {
        Bytes::from(text)
    };

    Response::builder()
        .status(status)
        .header("Content-Type", "text/plain; charset=utf-8")
        .header("Content-Length", content_length)
        .body(Full::new(body))
        .unwrap_or_else(|e| {
            log_build_error(status.as_str(), &e);
            Response::new(Full::new(Bytes::new()))
        })
}

/// Build 405 Method Not Allowed response
pub fn build_405_response() -> Response<Full<Bytes>> {
    let mut response = build_error_response(StatusCode::METHOD_NOT_ALLOWED, false);
    response
        .headers_mut()
        .insert(hyper::header::ALLOW, hyper::header::HeaderValue::from_static("GET, HEAD"));
    response
}

/// Build 416 Range Not Satisfiable response
pub fn build_416_response(file_size: u64, is_head: bool) -> Response<Full<Bytes>> {
    let mut response = build_error_response(StatusCode::RANGE_NOT_SATISFIABLE, is_head);
    if let Ok(value) = hyper::header::HeaderValue::from_str(&format!("bytes */{file_size}")) {
        response
            .headers_mut()
            .insert(hyper::header::CONTENT_RANGE, value);
    }
    response
}

/// Log response build error
fn log_build_error(status: &str, error: &hyper::http::Error) {
    crate::logger::log_error(&format!("Failed to build {status} response: {error}"));
}
