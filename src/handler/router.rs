//! Request routing dispatch module
//!
//! Entry point for HTTP request processing: method/path dispatch, body
//! collection, common response headers and access logging.

use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::Arc;

use http_body_util::Full;
use hyper::body::{Body, Bytes};
use hyper::header::{HeaderValue, ACCESS_CONTROL_ALLOW_ORIGIN, SERVER};
use hyper::{Method, Request, Response};

use super::api::{self, API_PATH};
use super::body::{read_body, BodyError, BODY_READ_MESSAGE};
use super::page;
use crate::config::AppState;
use crate::http;
use crate::logger::{self, AccessLogEntry};

const ROOT_PATH: &str = "/";
const LIVENESS_PATH: &str = "/healthz";
const READINESS_PATH: &str = "/readyz";

const ROOT_ALLOW: &str = "GET, HEAD, POST, OPTIONS";
const API_ALLOW: &str = "POST, OPTIONS";
const PROBE_ALLOW: &str = "GET, HEAD, OPTIONS";

/// Main entry point for HTTP request handling
pub async fn handle_request<B>(
    req: Request<B>,
    state: Arc<AppState>,
    peer_addr: Option<SocketAddr>,
) -> Result<Response<Full<Bytes>>, Infallible>
where
    B: Body,
    B::Error: Into<Box<dyn std::error::Error + Send + Sync>>,
{
    let mut entry = state
        .config
        .logging
        .access_log
        .then(|| AccessLogEntry::from_request(&req, peer_addr));

    let mut response = route_request(req, &state).await;
    apply_common_headers(&mut response, &state);

    if let Some(entry) = entry.as_mut() {
        let body_bytes = response
            .body()
            .size_hint()
            .exact()
            .and_then(|n| usize::try_from(n).ok())
            .unwrap_or(0);
        entry.finish(response.status().as_u16(), body_bytes);
        logger::log_access(entry, &state.config.logging.access_log_format);
    }

    Ok(response)
}

/// Methods a known path answers to, `None` for unknown paths
fn allowed_methods(path: &str) -> Option<&'static str> {
    match path {
        ROOT_PATH => Some(ROOT_ALLOW),
        API_PATH => Some(API_ALLOW),
        LIVENESS_PATH | READINESS_PATH => Some(PROBE_ALLOW),
        _ => None,
    }
}

/// Route request based on method and path
async fn route_request<B>(req: Request<B>, state: &AppState) -> Response<Full<Bytes>>
where
    B: Body,
    B::Error: Into<Box<dyn std::error::Error + Send + Sync>>,
{
    let method = req.method().clone();
    let path = req.uri().path().to_string();

    match (&method, path.as_str()) {
        (&Method::OPTIONS, p) => allowed_methods(p).map_or_else(http::build_404_response, |allow| {
            http::build_options_response(allow, state.config.http.enable_cors)
        }),
        (&Method::GET | &Method::HEAD, ROOT_PATH) => {
            page::serve_form(state, method == Method::HEAD)
        }
        (&Method::GET | &Method::HEAD, LIVENESS_PATH | READINESS_PATH) => {
            http::build_health_response("ok")
        }
        (&Method::POST, ROOT_PATH) => match collect(req, state).await {
            Ok(body) => page::handle_form_submit(state, &body),
            Err(BodyError::TooLarge) => http::build_413_response(),
            Err(BodyError::Read(_)) => page::handle_unreadable_body(state),
        },
        (&Method::POST, API_PATH) => match collect(req, state).await {
            Ok(body) => api::handle_convert(state, &body),
            Err(BodyError::TooLarge) => http::build_413_response(),
            Err(BodyError::Read(_)) => {
                http::build_json_error(hyper::StatusCode::BAD_REQUEST, BODY_READ_MESSAGE)
            }
        },
        (_, p) => match allowed_methods(p) {
            Some(allow) => {
                logger::log_warning(&format!("Method not allowed: {method} {p}"));
                http::build_405_response(allow)
            }
            None => http::build_404_response(),
        },
    }
}

/// Read the request body; each route picks the response for a failure
async fn collect<B>(req: Request<B>, state: &AppState) -> Result<Bytes, BodyError>
where
    B: Body,
    B::Error: Into<Box<dyn std::error::Error + Send + Sync>>,
{
    let (parts, body) = req.into_parts();
    read_body(&parts.headers, body, state.config.http.max_body_size)
        .await
        .inspect_err(|e| {
            if let BodyError::Read(reason) = e {
                logger::log_error(&format!("Failed to read request body: {reason}"));
            }
        })
}

fn apply_common_headers(response: &mut Response<Full<Bytes>>, state: &AppState) {
    let headers = response.headers_mut();
    match HeaderValue::from_str(&state.config.http.server_name) {
        Ok(value) => {
            headers.insert(SERVER, value);
        }
        Err(_) => logger::log_warning("http.server_name is not a valid header value"),
    }
    if state.config.http.enable_cors {
        headers.insert(ACCESS_CONTROL_ALLOW_ORIGIN, HeaderValue::from_static("*"));
    }
}
