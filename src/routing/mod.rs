//! Routing subsystem.
//!
//! # Data Flow
//! ```text
//! Incoming raw path ("posts/show/5")
//!     → path.rs (sanitize, split into segments)
//!     → dispatcher.rs (select handler, operation, parameters)
//!         → registry.rs (resolve + construct handler, resolve operation)
//!     → operation(RequestContext, params)
//!     → Outcome (render a view or redirect)
//!
//! Registry compilation (at startup):
//!     Controller types
//!     → canonical name → factory, operation table
//!     → Freeze as immutable registry shared via Arc
//! ```
//!
//! # Design Decisions
//! - Convention routing: `handler/operation/param/...`, no patterns
//! - Registry immutable at runtime (thread-safe without locks)
//! - Deterministic: same path and session always select the same operation
//! - Fallback to defaults instead of 404 for unknown names

pub mod context;
pub mod dispatcher;
pub mod outcome;
pub mod path;
pub mod registry;

pub use context::{RequestContext, Services};
pub use dispatcher::{Dispatch, Dispatcher, RouteSelection};
pub use outcome::{Outcome, View};
pub use path::RequestPath;
pub use registry::{
    Construct, Controller, HandlerDescriptor, HandlerInstance, HandlerRegistry, Operation,
    OperationHandle, RegistryError,
};
