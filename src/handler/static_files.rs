//! Static file serving module
//!
//! Maps request paths onto the serving root, applies the directory policy
//! (trailing-slash redirect, index file, generated listing) and answers with
//! the file contents and the Content-Type from the extension map.

use crate::config::ServeContext;
use crate::error::RequestError;
use crate::handler::listing;
use crate::handler::router::RequestContext;
use crate::http::response::{build_file_response, build_partial_response, FileHeaders};
use crate::http::{self, cache, range::ByteRange, range::RangeParseResult};
use crate::logger;
use http_body_util::Full;
use hyper::body::Bytes;
use hyper::Response;
use std::fs::Metadata;
use std::io::SeekFrom;
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::io::{AsyncReadExt, AsyncSeekExt};

/// Serve a GET/HEAD request; errors are rendered as status responses
pub async fn serve(req: &RequestContext, ctx: &ServeContext) -> Response<Full<Bytes>> {
    match resolve_and_serve(req, ctx).await {
        Ok(response) => response,
        Err(err) => {
            match &err {
                RequestError::Traversal(_) => {
                    logger::log_warning(&format!("Blocked request: {err}"));
                }
                RequestError::NotFound(_) => logger::log_debug(&err.to_string()),
                RequestError::PermissionDenied(_) | RequestError::Io { .. } => {
                    logger::log_error(&err.to_string());
                }
            }
            http::build_error_response(err.status(), req.is_head)
        }
    }
}

/// Decode a raw request path into a path relative to the serving root.
/// Any `..` segment is rejected outright, before touching the filesystem.
pub fn sanitize_path(raw: &str) -> Result<PathBuf, RequestError> {
    let decoded =
        urlencoding::decode(raw).map_err(|_| RequestError::NotFound(PathBuf::from(raw)))?;

    let mut relative = PathBuf::new();
    for segment in decoded.split('/') {
        match segment {
            "" | "." => {}
            ".." => return Err(RequestError::Traversal(raw.to_string())),
            s if s.contains('\0') => return Err(RequestError::NotFound(PathBuf::from(raw))),
            s if cfg!(windows) && (s.contains('\\') || s.contains(':')) => {
                return Err(RequestError::Traversal(raw.to_string()));
            }
            s => relative.push(s),
        }
    }
    Ok(relative)
}

async fn resolve_and_serve(
    req: &RequestContext,
    ctx: &ServeContext,
) -> Result<Response<Full<Bytes>>, RequestError> {
    let candidate = ctx.root.join(sanitize_path(&req.path)?);

    // Symlinks may still point outside the root
    let target = fs::canonicalize(&candidate)
        .await
        .map_err(|e| RequestError::from_io(&candidate, e))?;
    if !target.starts_with(&ctx.root) {
        return Err(RequestError::Traversal(req.path.clone()));
    }

    let meta = fs::metadata(&target)
        .await
        .map_err(|e| RequestError::from_io(&target, e))?;

    if meta.is_dir() {
        if !req.path.ends_with('/') {
            return Ok(http::build_redirect_response(&directory_location(req)));
        }
        if let Some((index, index_meta)) = find_index_file(&target, ctx).await {
            return serve_file(req, ctx, &index, &index_meta).await;
        }
        if ctx.directory_listing {
            let html = listing::render_listing(&target, &req.path).await?;
            return Ok(http::build_html_response(html, req.is_head));
        }
        return Err(RequestError::NotFound(target));
    }

    // `/file.txt/` names a directory that does not exist
    if !meta.is_file() || req.path.ends_with('/') {
        return Err(RequestError::NotFound(target));
    }

    serve_file(req, ctx, &target, &meta).await
}

/// `Location` for a directory requested without its trailing slash.
///
/// Leading slashes collapse to one so `//host` never becomes a
/// protocol-relative redirect.
fn directory_location(req: &RequestContext) -> String {
    let path = req.path.trim_start_matches('/');
    match &req.query {
        Some(q) => format!("/{path}/?{q}"),
        None => format!("/{path}/"),
    }
}

async fn find_index_file(dir: &Path, ctx: &ServeContext) -> Option<(PathBuf, Metadata)> {
    for name in &ctx.index_files {
        let Ok(path) = fs::canonicalize(dir.join(name)).await else {
            continue;
        };
        if !path.starts_with(&ctx.root) {
            continue;
        }
        if let Ok(meta) = fs::metadata(&path).await {
            if meta.is_file() {
                return Some((path, meta));
            }
        }
    }
    None
}

async fn serve_file(
    req: &RequestContext,
    ctx: &ServeContext,
    path: &Path,
    meta: &Metadata,
) -> Result<Response<Full<Bytes>>, RequestError> {
    let modified = meta.modified().ok();
    let last_modified = modified.map(cache::format_http_date);

    if req.range_header.is_none() {
        if let (Some(modified), Some(header)) = (modified, last_modified.as_deref()) {
            if cache::is_not_modified(req.if_modified_since.as_deref(), modified) {
                return Ok(http::build_304_response(header));
            }
        }
    }

    // Opened for HEAD too, so unreadable files answer 403 either way
    let mut file = fs::File::open(path)
        .await
        .map_err(|e| RequestError::from_io(path, e))?;

    let headers = FileHeaders {
        content_type: ctx.extensions.lookup(path),
        last_modified: last_modified.as_deref(),
    };
    let size = meta.len();

    match http::parse_range_header(req.range_header.as_deref(), size) {
        RangeParseResult::Satisfiable(range) => {
            let body = if req.is_head {
                Bytes::new()
            } else {
                read_range(&mut file, path, range).await?
            };
            Ok(build_partial_response(body, range, size, &headers, req.is_head))
        }
        RangeParseResult::NotSatisfiable => Ok(http::build_416_response(size, req.is_head)),
        RangeParseResult::Ignored => {
            if req.is_head {
                return Ok(build_file_response(Bytes::new(), size, &headers, true));
            }
            let body = read_all(&mut file, path).await?;
            let length = body.len() as u64;
            Ok(build_file_response(body, length, &headers, false))
        }
    }
}

async fn read_all(file: &mut fs::File, path: &Path) -> Result<Bytes, RequestError> {
    let mut buf = Vec::new();
    file.read_to_end(&mut buf)
        .await
        .map_err(|e| RequestError::from_io(path, e))?;
    Ok(Bytes::from(buf))
}

async fn read_range(
    file: &mut fs::File,
    path: &Path,
    range: ByteRange,
) -> Result<Bytes, RequestError> {
    file.seek(SeekFrom::Start(range.start))
        .await
        .map_err(|e| RequestError::from_io(path, e))?;

    let mut buf = Vec::new();
    file.take(range.len())
        .read_to_end(&mut buf)
        .await
        .map_err(|e| RequestError::from_io(path, e))?;
    Ok(Bytes::from(buf))
}
