//! Handler registry.
//!
//! # Responsibilities
//! - Map canonical handler names to factories
//! - Construct handler instances (construction may halt the request)
//! - Look up named operations on a constructed instance
//!
//! # Design Decisions
//! - Built once at startup, immutable afterwards (shared via `Arc`, no locks)
//! - Names are canonicalized to ASCII lowercase: `posts`, `Posts` and `POSTS`
//!   are the same handler
//! - Operation tables are static slices of function pointers, no reflection
//! - An unknown name is `None`, never an error

use std::collections::HashMap;
use std::fmt;

use thiserror::Error;

use crate::error::AppError;
use crate::routing::context::RequestContext;
use crate::routing::outcome::Outcome;

/// An operation bound to a handler type.
pub type Operation<C> = fn(&mut C, &mut RequestContext<'_>, &[String]) -> Result<Outcome, AppError>;

/// Result of constructing a handler.
#[derive(Debug)]
pub enum Construct<T> {
    /// The instance is ready to serve an operation.
    Ready(T),
    /// Construction ended the request (e.g. redirect to login).
    Halt(Outcome),
}

/// A handler type the registry knows how to build.
pub trait Controller: Sized + Send + 'static {
    /// Display name, e.g. `Posts`.
    const NAME: &'static str;

    /// Named operations, lowercase.
    const OPERATIONS: &'static [(&'static str, Operation<Self>)];

    fn construct(ctx: &mut RequestContext<'_>) -> Result<Construct<Self>, AppError>;
}

/// Resolved reference to an operation on an instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OperationHandle {
    index: usize,
    name: &'static str,
}

impl OperationHandle {
    pub fn name(&self) -> &'static str {
        self.name
    }
}

/// Type-erased handler instance, alive for a single request.
pub trait HandlerInstance: Send {
    fn handler_name(&self) -> &'static str;

    fn resolve_operation(&self, name: &str) -> Option<OperationHandle>;

    fn invoke(
        &mut self,
        operation: OperationHandle,
        ctx: &mut RequestContext<'_>,
        params: &[String],
    ) -> Result<Outcome, AppError>;
}

struct Bound<C>(C);

impl<C: Controller> HandlerInstance for Bound<C> {
    fn handler_name(&self) -> &'static str {
        C::NAME
    }

    fn resolve_operation(&self, name: &str) -> Option<OperationHandle> {
        C::OPERATIONS
            .iter()
            .position(|(op, _)| op.eq_ignore_ascii_case(name))
            .map(|index| OperationHandle {
                index,
                name: C::OPERATIONS[index].0,
            })
    }

    fn invoke(
        &mut self,
        operation: OperationHandle,
        ctx: &mut RequestContext<'_>,
        params: &[String],
    ) -> Result<Outcome, AppError> {
        let (_, op) = C::OPERATIONS
            .get(operation.index)
            .ok_or_else(|| AppError::UnknownOperation {
                handler: C::NAME.to_string(),
                operation: operation.name.to_string(),
            })?;
        op(&mut self.0, ctx, params)
    }
}

type Factory = fn(&mut RequestContext<'_>) -> Result<Construct<Box<dyn HandlerInstance>>, AppError>;

fn construct_bound<C: Controller>(
    ctx: &mut RequestContext<'_>,
) -> Result<Construct<Box<dyn HandlerInstance>>, AppError> {
    Ok(match C::construct(ctx)? {
        Construct::Ready(instance) => Construct::Ready(Box::new(Bound(instance))),
        Construct::Halt(outcome) => Construct::Halt(outcome),
    })
}

/// A registered handler type.
pub struct HandlerDescriptor {
    name: &'static str,
    operations: Vec<&'static str>,
    factory: Factory,
}

impl HandlerDescriptor {
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Operation names exposed by this handler type.
    pub fn operations(&self) -> &[&'static str] {
        &self.operations
    }

    pub fn has_operation(&self, name: &str) -> bool {
        self.operations.iter().any(|op| op.eq_ignore_ascii_case(name))
    }
}

impl fmt::Debug for HandlerDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HandlerDescriptor")
            .field("name", &self.name)
            .field("operations", &self.operations)
            .finish()
    }
}

/// Errors raised while wiring the registry at startup.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum RegistryError {
    #[error("handler `{0}` registered twice")]
    Duplicate(String),
    #[error("default handler `{0}` is not registered")]
    MissingDefaultHandler(String),
    #[error("default handler `{handler}` has no default operation `{operation}`")]
    MissingDefaultOperation { handler: String, operation: String },
}

/// Canonical lookup key for a handler name.
pub fn canonical_name(name: &str) -> String {
    name.to_ascii_lowercase()
}

/// The set of known handlers.
#[derive(Debug, Default)]
pub struct HandlerRegistry {
    handlers: HashMap<String, HandlerDescriptor>,
}

impl HandlerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a handler type under its canonical name.
    pub fn register<C: Controller>(&mut self) -> Result<&mut Self, RegistryError> {
        let key = canonical_name(C::NAME);
        if self.handlers.contains_key(&key) {
            return Err(RegistryError::Duplicate(C::NAME.to_string()));
        }

        let descriptor = HandlerDescriptor {
            name: C::NAME,
            operations: C::OPERATIONS.iter().map(|(name, _)| *name).collect(),
            factory: construct_bound::<C>,
        };
        tracing::debug!(
            handler = C::NAME,
            operations = ?descriptor.operations,
            "Handler registered"
        );
        self.handlers.insert(key, descriptor);
        Ok(self)
    }

    pub fn resolve_handler(&self, name: &str) -> Option<&HandlerDescriptor> {
        self.handlers.get(&canonical_name(name))
    }

    pub fn construct(
        &self,
        descriptor: &HandlerDescriptor,
        ctx: &mut RequestContext<'_>,
    ) -> Result<Construct<Box<dyn HandlerInstance>>, AppError> {
        (descriptor.factory)(ctx)
    }

    pub fn resolve_operation(
        &self,
        instance: &dyn HandlerInstance,
        name: &str,
    ) -> Option<OperationHandle> {
        instance.resolve_operation(name)
    }

    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }

    /// Display names of all registered handlers, sorted.
    pub fn names(&self) -> Vec<&'static str> {
        let mut names: Vec<_> = self.handlers.values().map(|d| d.name).collect();
        names.sort_unstable();
        names
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::routing::context::Services;
    use crate::session::Session;
    use axum::http::Method;
    use serde_json::json;

    struct Widgets {
        greeting: &'static str,
    }

    impl Widgets {
        fn index(&mut self, _ctx: &mut RequestContext<'_>, _params: &[String]) -> Result<Outcome, AppError> {
            Ok(Outcome::render("widgets/index", json!({ "greeting": self.greeting })))
        }

        fn count(&mut self, _ctx: &mut RequestContext<'_>, params: &[String]) -> Result<Outcome, AppError> {
            Ok(Outcome::render("widgets/count", json!({ "count": params.len() })))
        }
    }

    impl Controller for Widgets {
        const NAME: &'static str = "Widgets";
        const OPERATIONS: &'static [(&'static str, Operation<Self>)] =
            &[("index", Widgets::index), ("count", Widgets::count)];

        fn construct(_ctx: &mut RequestContext<'_>) -> Result<Construct<Self>, AppError> {
            Ok(Construct::Ready(Widgets { greeting: "hello" }))
        }
    }

    fn registry() -> HandlerRegistry {
        let mut registry = HandlerRegistry::new();
        registry.register::<Widgets>().unwrap();
        registry
    }

    #[test]
    fn test_resolve_handler_is_case_insensitive() {
        let registry = registry();
        assert_eq!(registry.resolve_handler("widgets").unwrap().name(), "Widgets");
        assert_eq!(registry.resolve_handler("Widgets").unwrap().name(), "Widgets");
        assert_eq!(registry.resolve_handler("WIDGETS").unwrap().name(), "Widgets");
        assert!(registry.resolve_handler("gadgets").is_none());
    }

    #[test]
    fn test_duplicate_registration_rejected() {
        let mut registry = registry();
        assert_eq!(
            registry.register::<Widgets>().err(),
            Some(RegistryError::Duplicate("Widgets".into()))
        );
    }

    #[test]
    fn test_construct_and_invoke() {
        let registry = registry();
        let services = Services::in_memory().unwrap();
        let mut session = Session::new("test");
        let mut ctx = RequestContext::new(Method::GET, &mut session, &services);

        let descriptor = registry.resolve_handler("widgets").unwrap();
        let mut instance = match registry.construct(descriptor, &mut ctx).unwrap() {
            Construct::Ready(instance) => instance,
            Construct::Halt(_) => panic!("widgets never halt"),
        };

        assert!(registry.resolve_operation(instance.as_ref(), "missing").is_none());
        let op = registry.resolve_operation(instance.as_ref(), "COUNT").unwrap();
        assert_eq!(op.name(), "count");

        let params = vec!["a".to_string(), "b".to_string()];
        let outcome = instance.invoke(op, &mut ctx, &params).unwrap();
        assert_eq!(outcome, Outcome::render("widgets/count", json!({ "count": 2 })));
    }

    #[test]
    fn test_descriptor_lists_operations() {
        let registry = registry();
        let descriptor = registry.resolve_handler("widgets").unwrap();
        assert_eq!(descriptor.operations(), &["index", "count"]);
        assert!(descriptor.has_operation("Index"));
        assert_eq!(registry.names(), vec!["Widgets"]);
    }
}
