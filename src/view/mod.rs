//! View rendering.
//!
//! # Responsibilities
//! - Map view identifiers (`posts/add`) to compiled-in templates
//! - Merge handler data with site globals, flash messages and the session
//!   summary
//!
//! # Design Decisions
//! - Templates are embedded at compile time; a missing view is an error
//! - HTML auto-escaping is left on for every `.html` template

use std::collections::BTreeMap;

use minijinja::{context, Environment};
use serde::Serialize;

use crate::error::AppError;
use crate::routing::View;
use crate::session::{FlashMessage, Session, USER_NAME};

const TEMPLATES: &[(&str, &str)] = &[
    ("inc/layout.html", include_str!("../../templates/inc/layout.html")),
    ("pages/index.html", include_str!("../../templates/pages/index.html")),
    ("pages/about.html", include_str!("../../templates/pages/about.html")),
    ("users/register.html", include_str!("../../templates/users/register.html")),
    ("users/login.html", include_str!("../../templates/users/login.html")),
    ("posts/index.html", include_str!("../../templates/posts/index.html")),
    ("posts/show.html", include_str!("../../templates/posts/show.html")),
    ("posts/add.html", include_str!("../../templates/posts/add.html")),
    ("posts/edit.html", include_str!("../../templates/posts/edit.html")),
];

/// Signed-in user summary exposed to templates.
#[derive(Debug, Serialize)]
struct SessionSummary<'a> {
    logged_in: bool,
    user_id: Option<i64>,
    user_name: Option<&'a str>,
}

/// Renders views into HTML documents.
pub struct ViewRenderer {
    env: Environment<'static>,
    url_root: String,
}

impl ViewRenderer {
    pub fn new(site_name: &str, url_root: &str) -> Result<Self, AppError> {
        let mut env = Environment::new();
        for &(name, source) in TEMPLATES {
            env.add_template(name, source)?;
        }
        let url_root = url_root.trim_end_matches('/').to_string();
        env.add_global("site_name", site_name.to_string());
        env.add_global("url_root", url_root.clone());

        Ok(Self { env, url_root })
    }

    /// Absolute URL for an application-relative target (`users/login`).
    pub fn url_for(&self, target: &str) -> String {
        format!("{}/{}", self.url_root, target.trim_start_matches('/'))
    }

    pub fn has_view(&self, name: &str) -> bool {
        self.env.get_template(&template_name(name)).is_ok()
    }

    /// Render a view, draining the session's flash messages into it.
    pub fn render(&self, view: &View, session: &mut Session) -> Result<String, AppError> {
        let template = self
            .env
            .get_template(&template_name(&view.name))
            .map_err(|_| AppError::ViewNotFound(view.name.clone()))?;

        let flash: BTreeMap<String, FlashMessage> = session.take_flashes();
        let summary = SessionSummary {
            logged_in: session.is_logged_in(),
            user_id: session.user_id(),
            user_name: session.get(USER_NAME),
        };

        let html = template.render(context! {
            data => &view.data,
            flash => flash,
            session => summary,
        })?;
        Ok(html)
    }
}

fn template_name(view: &str) -> String {
    format!("{}.html", view.trim_matches('/'))
}
