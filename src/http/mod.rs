//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, middleware, front controller)
//!     → request.rs (raw path, session cookie, form body)
//!     → [dispatcher selects handler + operation] (blocking pool)
//!     → response.rs (render view or redirect, session cookie)
//!     → Send to client
//! ```

pub mod request;
pub mod response;
pub mod server;

pub use request::X_REQUEST_ID;
pub use server::{AppState, HttpServer};
