//! Request routing dispatch module
//!
//! Entry point for HTTP request processing: method validation, path
//! resolution against the configured root, and dispatch to the resource
//! handlers.

use crate::config::Config;
use crate::handler::resource::{self, ServeError};
use crate::http;
use crate::logger;
use http_body_util::Full;
use hyper::body::Bytes;
use hyper::{Method, Request, Response};
use std::convert::Infallible;
use std::sync::Arc;

/// Request context encapsulating information needed for request processing
pub struct RequestContext<'a> {
    /// The original URL path as received; error messages and listing titles
    /// always name this, never the resolved filesystem path.
    pub path: &'a str,
    pub is_head: bool,
    pub access_log: bool,
}

/// Main entry point for HTTP request handling
pub async fn handle_request(
    req: Request<hyper::body::Incoming>,
    config: Arc<Config>,
) -> Result<Response<Full<Bytes>>, Infallible> {
    let method = req.method();
    let uri = req.uri();
    let path = uri.path();
    let is_head = *method == Method::HEAD;

    let access_log = config.logging.access_log;
    if access_log {
        logger::log_request(method, uri, req.version());
    }

    // 1. Check HTTP method
    if let Some(resp) = check_http_method(method) {
        return Ok(resp);
    }

    // 2. Log headers if enabled
    logger::log_headers_count(req.headers().len(), config.logging.show_headers);

    // 3. Resolve against the served root and dispatch
    let ctx = RequestContext {
        path,
        is_head,
        access_log,
    };

    Ok(serve_resource(&ctx, &config.server.root).await)
}

/// Check HTTP method and return appropriate response for non-GET/HEAD methods
fn check_http_method(method: &Method) -> Option<Response<Full<Bytes>>> {
    match method {
        &Method::GET | &Method::HEAD => None,
        &Method::OPTIONS => Some(http::build_options_response()),
        _ => {
            logger::log_warning(&format!("Method not allowed: {method}"));
            Some(http::build_405_response())
        }
    }
}

/// Resolve the request path and invoke the matching resource handler.
/// A `ServeError` never escapes: it is logged and rendered as the response
/// for this request alone.
pub async fn serve_resource(ctx: &RequestContext<'_>, root: &str) -> Response<Full<Bytes>> {
    let resolved = resource::resolve_path(root, ctx.path);

    match resource::serve(&resolved, ctx).await {
        Ok(resp) => {
            if ctx.access_log {
                let size = content_length_of(&resp);
                logger::log_response(resp.status().as_u16(), size);
            }
            resp
        }
        Err(err) => render_error(ctx, &err),
    }
}

fn render_error(ctx: &RequestContext<'_>, err: &ServeError) -> Response<Full<Bytes>> {
    logger::log_warning(&format!("{} -> {}: {}", ctx.path, err.status, err.message));
    if ctx.access_log {
        logger::log_response(err.status.as_u16(), err.message.len());
    }
    http::build_error_response(err.status, &err.message)
}

/// Read back the Content-Length a builder set, for access logging
fn content_length_of(resp: &Response<Full<Bytes>>) -> usize {
    resp.headers()
        .get("Content-Length")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.parse().ok())
        .unwrap_or(0)
}
