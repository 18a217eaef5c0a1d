//! Request handling and transformation.
//!
//! # Responsibilities
//! - Extract the raw path (query parameter first, then the URI path)
//! - Read the session cookie
//! - Decode urlencoded form bodies
//!
//! # Design Decisions
//! - Request ID is assigned by tower-http before the handler runs
//! - Repeated form fields keep the last value

use std::collections::HashMap;

use axum::http::{header, HeaderMap, HeaderName, Uri};

/// Header carrying the per-request correlation id.
pub const X_REQUEST_ID: HeaderName = HeaderName::from_static("x-request-id");

/// Raw `handler/operation/params` path for this request.
///
/// The `param` query parameter wins when present (`/?url=posts/show/5`);
/// otherwise the URI path without its leading `/`. `None` when neither
/// carries anything.
pub fn raw_path(uri: &Uri, param: &str) -> Option<String> {
    if let Some(query) = uri.query() {
        let pairs: Vec<(String, String)> = serde_urlencoded::from_str(query).unwrap_or_default();
        if let Some((_, value)) = pairs.into_iter().rev().find(|(key, _)| key == param) {
            return Some(value);
        }
    }

    let path = uri.path().trim_start_matches('/');
    if path.is_empty() {
        None
    } else {
        Some(path.to_string())
    }
}

/// Value of the named cookie, if the client sent one.
pub fn session_cookie(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(key, _)| *key == name)
        .map(|(_, value)| value.trim_matches('"').to_string())
        .filter(|value| !value.is_empty())
}

/// Decode a form body. Bodies that are not urlencoded yield no fields.
pub fn parse_form(headers: &HeaderMap, body: &[u8]) -> Result<HashMap<String, String>, serde_urlencoded::de::Error> {
    let is_form = headers
        .get(header::CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .map(|value| value.starts_with("application/x-www-form-urlencoded"))
        .unwrap_or(false);
    if !is_form || body.is_empty() {
        return Ok(HashMap::new());
    }

    let pairs: Vec<(String, String)> = serde_urlencoded::from_bytes(body)?;
    Ok(pairs.into_iter().collect())
}
