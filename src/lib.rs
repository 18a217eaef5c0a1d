//! Front-controller web application library.
//!
//! Every request path has the shape `handler/operation/param1/param2/...`.
//! The dispatcher resolves the handler and operation by name through an
//! explicit registry, falls back to `Pages`/`index` when a name is unknown,
//! and hands the remaining segments to the operation as positional
//! parameters.

// Core subsystems
pub mod config;
pub mod http;
pub mod routing;

// Application
pub mod controllers;
pub mod models;
pub mod view;

// Collaborators
pub mod persistence;
pub mod security;
pub mod session;

// Cross-cutting concerns
pub mod error;
pub mod lifecycle;
pub mod observability;

pub use config::AppConfig;
pub use error::AppError;
pub use http::HttpServer;
pub use lifecycle::Shutdown;
