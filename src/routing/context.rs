//! Per-request context handed to handlers.
//!
//! Handlers never reach for global state: the HTTP method, submitted form
//! fields, the caller's session and the shared collaborators all arrive here.

use std::collections::HashMap;
use std::sync::Arc;

use axum::http::Method;

use crate::persistence::{Database, DbError, SqliteDatabase};
use crate::security::password::{Argon2Hasher, PasswordHasher};
use crate::session::Session;

/// Collaborators shared by every request. Immutable after startup.
#[derive(Clone)]
pub struct Services {
    pub db: Arc<dyn Database>,
    pub hasher: Arc<dyn PasswordHasher>,
    /// Minimum accepted password length for registration and login.
    pub min_password_len: usize,
}

impl Services {
    pub fn new(db: Arc<dyn Database>, hasher: Arc<dyn PasswordHasher>) -> Self {
        Self {
            db,
            hasher,
            min_password_len: 6,
        }
    }

    /// In-memory database with the schema applied and the default hasher.
    pub fn in_memory() -> Result<Self, DbError> {
        let db = SqliteDatabase::in_memory()?;
        Ok(Self::new(Arc::new(db), Arc::new(Argon2Hasher)))
    }

    pub fn with_min_password_len(mut self, len: usize) -> Self {
        self.min_password_len = len;
        self
    }
}

/// Everything a handler may look at or mutate while serving one request.
pub struct RequestContext<'a> {
    pub method: Method,
    /// Submitted form fields (POST body), empty for GET.
    pub form: HashMap<String, String>,
    pub session: &'a mut Session,
    pub services: &'a Services,
}

impl<'a> RequestContext<'a> {
    pub fn new(method: Method, session: &'a mut Session, services: &'a Services) -> Self {
        Self {
            method,
            form: HashMap::new(),
            session,
            services,
        }
    }

    pub fn with_form(mut self, form: HashMap<String, String>) -> Self {
        self.form = form;
        self
    }

    pub fn is_post(&self) -> bool {
        self.method == Method::POST
    }

    /// Trimmed form field, empty when missing.
    pub fn field(&self, name: &str) -> String {
        self.form
            .get(name)
            .map(|v| v.trim().to_string())
            .unwrap_or_default()
    }
}
