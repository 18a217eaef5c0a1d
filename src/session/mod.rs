//! Session state.
//!
//! # Data Flow
//! ```text
//! Cookie header (session id)
//!     → store.rs (load existing or create fresh session)
//!     → RequestContext.session (handlers read/write values, set flashes)
//!     → renderer drains flash messages
//!     → store.rs (commit if modified, or remove when destroyed)
//!     → Set-Cookie when a new or renewed id was stored
//! ```
//!
//! # Design Decisions
//! - Session is a plain value passed explicitly, no globals
//! - Flash messages are one-shot: drained by the next render
//! - Logout destroys the whole session, not only the user keys
//! - Signing in issues a new id; the pre-login id stops working
//! - A session nobody modified is never stored

pub mod store;

pub use store::SessionStore;

use std::collections::{BTreeMap, HashMap};

use serde::Serialize;
use uuid::Uuid;

pub const USER_ID: &str = "user_id";
pub const USER_EMAIL: &str = "user_email";
pub const USER_NAME: &str = "user_name";

/// CSS class applied to flash messages unless one is given.
pub const DEFAULT_FLASH_CLASS: &str = "alert alert-success";

/// A one-shot message shown on the next rendered page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FlashMessage {
    pub message: String,
    pub class: String,
}

/// Per-visitor state persisted between requests.
#[derive(Debug, Clone, Default)]
pub struct Session {
    id: String,
    values: HashMap<String, String>,
    flashes: BTreeMap<String, FlashMessage>,
    fresh: bool,
    destroyed: bool,
    /// Set by every mutation; cleared when the store accepts the commit.
    dirty: bool,
    /// Store version this copy was loaded at.
    version: u64,
    /// Id this session had before `renew_id`.
    previous_id: Option<String>,
}

pub(crate) fn generate_id() -> String {
    Uuid::new_v4().to_string()
}

impl Session {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            ..Self::default()
        }
    }

    pub(crate) fn fresh(id: impl Into<String>) -> Self {
        Self {
            fresh: true,
            ..Self::new(id)
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    /// True when the session was created by this request.
    pub fn is_fresh(&self) -> bool {
        self.fresh
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.values.get(key).map(String::as_str)
    }

    /// True when this request changed anything that needs storing.
    pub fn is_modified(&self) -> bool {
        self.dirty
    }

    pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.values.insert(key.into(), value.into());
        self.dirty = true;
    }

    pub fn unset(&mut self, key: &str) -> Option<String> {
        let removed = self.values.remove(key);
        self.dirty |= removed.is_some();
        removed
    }

    /// Move the session to a new random id, keeping its contents.
    pub fn renew_id(&mut self) {
        let old = std::mem::replace(&mut self.id, generate_id());
        self.previous_id.get_or_insert(old);
        self.dirty = true;
    }

    /// The id the caller presented, when `renew_id` replaced it.
    pub fn previous_id(&self) -> Option<&str> {
        self.previous_id.as_deref()
    }

    pub fn user_id(&self) -> Option<i64> {
        self.get(USER_ID).and_then(|id| id.parse().ok())
    }

    pub fn is_logged_in(&self) -> bool {
        self.user_id().is_some()
    }

    /// Store the signed-in user's identity under a new session id.
    pub fn sign_in(&mut self, id: i64, email: &str, name: &str) {
        self.renew_id();
        self.set(USER_ID, id.to_string());
        self.set(USER_EMAIL, email);
        self.set(USER_NAME, name);
    }

    /// Clear identity and mark the session for removal.
    pub fn destroy(&mut self) {
        self.values.clear();
        self.flashes.clear();
        self.destroyed = true;
        self.dirty = true;
    }

    pub fn is_destroyed(&self) -> bool {
        self.destroyed
    }

    pub fn flash(&mut self, name: impl Into<String>, message: impl Into<String>) {
        self.flash_with_class(name, message, DEFAULT_FLASH_CLASS);
    }

    pub fn flash_with_class(
        &mut self,
        name: impl Into<String>,
        message: impl Into<String>,
        class: impl Into<String>,
    ) {
        self.flashes.insert(
            name.into(),
            FlashMessage {
                message: message.into(),
                class: class.into(),
            },
        );
        self.dirty = true;
    }

    /// Remove and return every pending flash message.
    pub fn take_flashes(&mut self) -> BTreeMap<String, FlashMessage> {
        self.dirty |= !self.flashes.is_empty();
        std::mem::take(&mut self.flashes)
    }

    pub fn has_flashes(&self) -> bool {
        !self.flashes.is_empty()
    }
}
