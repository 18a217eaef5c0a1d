//! Response construction.
//!
//! # Responsibilities
//! - Turn a dispatch outcome into an HTML page or a redirect
//! - Attach or expire the session cookie
//!
//! # Design Decisions
//! - Redirects are `303 See Other` so a POST is followed by a GET
//! - Errors are mapped in `error.rs`, never here

use axum::http::{header, HeaderValue};
use axum::response::{Html, IntoResponse, Redirect, Response};

use crate::error::AppError;
use crate::routing::Outcome;
use crate::session::Session;
use crate::view::ViewRenderer;

/// Render or redirect. Rendering drains the session's flash messages.
pub fn respond(outcome: Outcome, views: &ViewRenderer, session: &mut Session) -> Result<Response, AppError> {
    match outcome {
        Outcome::Render(view) => Ok(Html(views.render(&view, session)?).into_response()),
        Outcome::Redirect(target) => Ok(Redirect::to(&views.url_for(&target)).into_response()),
    }
}

pub fn session_cookie_value(name: &str, id: &str) -> String {
    format!("{name}={id}; Path=/; HttpOnly; SameSite=Lax")
}

pub fn expired_cookie_value(name: &str) -> String {
    format!("{name}=; Path=/; HttpOnly; SameSite=Lax; Max-Age=0")
}

/// Append a `Set-Cookie` header. Values that are not valid header text are skipped.
pub fn set_cookie(response: &mut Response, value: &str) {
    match HeaderValue::from_str(value) {
        Ok(value) => {
            response.headers_mut().append(header::SET_COOKIE, value);
        }
        Err(e) => tracing::warn!(error = %e, "Invalid Set-Cookie value"),
    }
}
