//! Terminal results of a dispatched request.

use serde_json::Value;

/// A view identifier plus the data mapping handed to the renderer.
#[derive(Debug, Clone, PartialEq)]
pub struct View {
    /// Identifier such as `posts/add`.
    pub name: String,
    pub data: Value,
}

/// What a request ends in.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    /// Render a view with the given data.
    Render(View),
    /// Redirect to an application-relative path (e.g. `users/login`).
    Redirect(String),
}

impl Outcome {
    pub fn render(name: impl Into<String>, data: Value) -> Self {
        Outcome::Render(View {
            name: name.into(),
            data,
        })
    }

    pub fn redirect(target: impl Into<String>) -> Self {
        Outcome::Redirect(target.into())
    }

    pub fn is_redirect(&self) -> bool {
        matches!(self, Outcome::Redirect(_))
    }
}
