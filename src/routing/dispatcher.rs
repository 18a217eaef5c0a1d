//! Front-controller dispatch.
//!
//! # Algorithm
//! ```text
//! raw path → RequestPath (segments)
//!     segment 0 names a handler?    yes → consume it, no → default handler
//!     construct instance            Halt → stop, no operation runs
//!     segment 1 names an operation? yes → consume it, no → default operation
//!     unconsumed segments, in order → parameters
//!     invoke operation(parameters)
//! ```
//!
//! # Design Decisions
//! - Operation lookup is positional: it always inspects segment 1, even when
//!   segment 0 did not name a handler and stays a parameter
//! - No arity checks here; operations validate their own parameters
//! - Misses fall back silently (debug log + metric), they never fail the request

use std::sync::Arc;

use crate::config::RoutingConfig;
use crate::error::AppError;
use crate::observability::metrics;
use crate::routing::context::RequestContext;
use crate::routing::outcome::Outcome;
use crate::routing::path::RequestPath;
use crate::routing::registry::{Construct, HandlerDescriptor, HandlerRegistry, RegistryError};

/// The resolved handler, operation and parameters of a request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteSelection {
    pub handler: &'static str,
    pub operation: &'static str,
    pub params: Vec<String>,
}

/// Result of a dispatch run.
#[derive(Debug, Clone, PartialEq)]
pub enum Dispatch {
    /// An operation ran and produced the outcome.
    Invoked {
        selection: RouteSelection,
        outcome: Outcome,
    },
    /// Construction ended the request before any operation ran.
    Halted {
        handler: &'static str,
        outcome: Outcome,
    },
}

impl Dispatch {
    pub fn outcome(&self) -> &Outcome {
        match self {
            Dispatch::Invoked { outcome, .. } | Dispatch::Halted { outcome, .. } => outcome,
        }
    }

    pub fn into_outcome(self) -> Outcome {
        match self {
            Dispatch::Invoked { outcome, .. } | Dispatch::Halted { outcome, .. } => outcome,
        }
    }

    pub fn selection(&self) -> Option<&RouteSelection> {
        match self {
            Dispatch::Invoked { selection, .. } => Some(selection),
            Dispatch::Halted { .. } => None,
        }
    }
}

/// Resolves raw paths to handler operations and runs them.
#[derive(Debug)]
pub struct Dispatcher {
    registry: Arc<HandlerRegistry>,
    default_handler: String,
    default_operation: String,
}

impl Dispatcher {
    /// Build a dispatcher; the default handler must exist and expose the
    /// default operation.
    pub fn new(registry: Arc<HandlerRegistry>, routing: &RoutingConfig) -> Result<Self, RegistryError> {
        let default = registry
            .resolve_handler(&routing.default_handler)
            .ok_or_else(|| RegistryError::MissingDefaultHandler(routing.default_handler.clone()))?;

        if !default.has_operation(&routing.default_operation) {
            return Err(RegistryError::MissingDefaultOperation {
                handler: default.name().to_string(),
                operation: routing.default_operation.clone(),
            });
        }

        Ok(Self {
            registry,
            default_handler: routing.default_handler.clone(),
            default_operation: routing.default_operation.clone(),
        })
    }

    pub fn registry(&self) -> &HandlerRegistry {
        &self.registry
    }

    fn default_descriptor(&self) -> Result<&HandlerDescriptor, AppError> {
        self.registry
            .resolve_handler(&self.default_handler)
            .ok_or_else(|| AppError::UnknownOperation {
                handler: self.default_handler.clone(),
                operation: self.default_operation.clone(),
            })
    }

    /// Dispatch one request.
    pub fn dispatch(&self, raw_path: Option<&str>, ctx: &mut RequestContext<'_>) -> Result<Dispatch, AppError> {
        let segments = RequestPath::parse(raw_path).into_segments();

        // 1. Handler
        let (descriptor, handler_consumed) = match segments.first() {
            Some(name) => match self.registry.resolve_handler(name) {
                Some(descriptor) => (descriptor, true),
                None => {
                    tracing::debug!(segment = %name, "Unknown handler, using default");
                    metrics::record_fallback("handler");
                    (self.default_descriptor()?, false)
                }
            },
            None => (self.default_descriptor()?, false),
        };

        // 2. Construction
        let mut instance = match self.registry.construct(descriptor, ctx)? {
            Construct::Ready(instance) => instance,
            Construct::Halt(outcome) => {
                tracing::info!(handler = descriptor.name(), "Handler construction halted request");
                metrics::record_halt(descriptor.name());
                return Ok(Dispatch::Halted {
                    handler: descriptor.name(),
                    outcome,
                });
            }
        };

        // 3. Operation
        let requested = segments
            .get(1)
            .and_then(|name| self.registry.resolve_operation(instance.as_ref(), name));
        let operation_consumed = requested.is_some();
        let operation = match requested {
            Some(op) => op,
            None => {
                if let Some(name) = segments.get(1) {
                    tracing::debug!(
                        handler = descriptor.name(),
                        segment = %name,
                        "Unknown operation, using default"
                    );
                    metrics::record_fallback("operation");
                }
                self.registry
                    .resolve_operation(instance.as_ref(), &self.default_operation)
                    .ok_or_else(|| AppError::UnknownOperation {
                        handler: descriptor.name().to_string(),
                        operation: self.default_operation.clone(),
                    })?
            }
        };

        // 4. Parameters
        let params: Vec<String> = segments
            .into_iter()
            .enumerate()
            .filter(|(i, _)| !(*i == 0 && handler_consumed) && !(*i == 1 && operation_consumed))
            .map(|(_, segment)| segment)
            .collect();

        tracing::debug!(
            handler = instance.handler_name(),
            operation = operation.name(),
            params = ?params,
            "Dispatching"
        );
        metrics::record_dispatch(instance.handler_name(), operation.name());

        // 5. Invoke
        let outcome = instance.invoke(operation, ctx, &params)?;

        Ok(Dispatch::Invoked {
            selection: RouteSelection {
                handler: instance.handler_name(),
                operation: operation.name(),
                params,
            },
            outcome,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::routing::context::Services;
    use crate::routing::registry::{Controller, Operation};
    use crate::session::Session;
    use axum::http::Method;
    use serde_json::json;

    /// Records each invocation in the session so tests can observe it.
    fn record(ctx: &mut RequestContext<'_>, what: &str) {
        ctx.session.set("called", what);
    }

    struct Home;

    impl Home {
        fn index(&mut self, ctx: &mut RequestContext<'_>, params: &[String]) -> Result<Outcome, AppError> {
            record(ctx, "home.index");
            Ok(Outcome::render("home/index", json!({ "params": params })))
        }

        fn about(&mut self, ctx: &mut RequestContext<'_>, _params: &[String]) -> Result<Outcome, AppError> {
            record(ctx, "home.about");
            Ok(Outcome::render("home/about", json!({})))
        }
    }

    impl Controller for Home {
        const NAME: &'static str = "Home";
        const OPERATIONS: &'static [(&'static str, Operation<Self>)] =
            &[("index", Home::index), ("about", Home::about)];

        fn construct(_ctx: &mut RequestContext<'_>) -> Result<Construct<Self>, AppError> {
            Ok(Construct::Ready(Home))
        }
    }

    struct Vault;

    impl Vault {
        fn index(&mut self, ctx: &mut RequestContext<'_>, _params: &[String]) -> Result<Outcome, AppError> {
            record(ctx, "vault.index");
            Ok(Outcome::render("vault/index", json!({})))
        }

        fn open(&mut self, ctx: &mut RequestContext<'_>, params: &[String]) -> Result<Outcome, AppError> {
            record(ctx, "vault.open");
            let id = params.first().ok_or(AppError::MissingParameter {
                operation: "open",
                position: 0,
            })?;
            Ok(Outcome::render("vault/open", json!({ "id": id })))
        }
    }

    impl Controller for Vault {
        const NAME: &'static str = "Vault";
        const OPERATIONS: &'static [(&'static str, Operation<Self>)] =
            &[("index", Vault::index), ("open", Vault::open)];

        fn construct(ctx: &mut RequestContext<'_>) -> Result<Construct<Self>, AppError> {
            if ctx.session.is_logged_in() {
                Ok(Construct::Ready(Vault))
            } else {
                Ok(Construct::Halt(Outcome::redirect("users/login")))
            }
        }
    }

    fn dispatcher() -> Dispatcher {
        let mut registry = HandlerRegistry::new();
        registry.register::<Home>().unwrap();
        registry.register::<Vault>().unwrap();
        let routing = RoutingConfig {
            default_handler: "home".into(),
            ..RoutingConfig::default()
        };
        Dispatcher::new(Arc::new(registry), &routing).unwrap()
    }

    fn run(raw: Option<&str>, session: &mut Session) -> Result<Dispatch, AppError> {
        let services = Services::in_memory().unwrap();
        let mut ctx = RequestContext::new(Method::GET, session, &services);
        dispatcher().dispatch(raw, &mut ctx)
    }

    fn selection(raw: Option<&str>, session: &mut Session) -> RouteSelection {
        run(raw, session).unwrap().selection().cloned().unwrap()
    }

    fn logged_in() -> Session {
        let mut session = Session::new("s1");
        session.set("user_id", "1");
        session
    }

    #[test]
    fn test_absent_path_uses_defaults() {
        let sel = selection(None, &mut Session::new("s"));
        assert_eq!(sel.handler, "Home");
        assert_eq!(sel.operation, "index");
        assert!(sel.params.is_empty());
    }

    #[test]
    fn test_full_path_selects_handler_operation_params() {
        let mut session = logged_in();
        let sel = selection(Some("vault/open/5/extra"), &mut session);
        assert_eq!(sel.handler, "Vault");
        assert_eq!(sel.operation, "open");
        assert_eq!(sel.params, vec!["5", "extra"]);
        assert_eq!(session.get("called"), Some("vault.open"));
    }

    #[test]
    fn test_single_segment_uses_default_operation() {
        let sel = selection(Some("home"), &mut Session::new("s"));
        assert_eq!((sel.handler, sel.operation), ("Home", "index"));
        assert!(sel.params.is_empty());

        // Not a handler: stays as a parameter of the default handler.
        let sel = selection(Some("about"), &mut Session::new("s"));
        assert_eq!((sel.handler, sel.operation), ("Home", "index"));
        assert_eq!(sel.params, vec!["about"]);
    }

    #[test]
    fn test_unknown_handler_falls_back_and_keeps_segments() {
        let sel = selection(Some("unknownthing/foo"), &mut Session::new("s"));
        assert_eq!(sel.handler, "Home");
        assert_eq!(sel.operation, "index");
        assert_eq!(sel.params, vec!["unknownthing", "foo"]);
    }

    #[test]
    fn test_unknown_handler_known_operation_at_position_one() {
        let sel = selection(Some("unknownthing/about"), &mut Session::new("s"));
        assert_eq!((sel.handler, sel.operation), ("Home", "about"));
        assert_eq!(sel.params, vec!["unknownthing"]);
    }

    #[test]
    fn test_unknown_operation_becomes_parameter() {
        let mut session = logged_in();
        let sel = selection(Some("vault/peek/3"), &mut session);
        assert_eq!((sel.handler, sel.operation), ("Vault", "index"));
        assert_eq!(sel.params, vec!["peek", "3"]);
    }

    #[test]
    fn test_names_are_case_insensitive() {
        let mut session = logged_in();
        let sel = selection(Some("VAULT/Open/7"), &mut session);
        assert_eq!((sel.handler, sel.operation), ("Vault", "open"));
        assert_eq!(sel.params, vec!["7"]);
    }

    #[test]
    fn test_gated_handler_halts_without_invoking() {
        let mut session = Session::new("anon");
        let dispatch = run(Some("vault/open/5"), &mut session).unwrap();
        assert_eq!(
            dispatch,
            Dispatch::Halted {
                handler: "Vault",
                outcome: Outcome::redirect("users/login"),
            }
        );
        assert_eq!(session.get("called"), None);
    }

    #[test]
    fn test_missing_parameter_surfaces_from_operation() {
        let mut session = logged_in();
        let err = run(Some("vault/open"), &mut session).unwrap_err();
        assert!(matches!(err, AppError::MissingParameter { operation: "open", position: 0 }));
    }

    #[test]
    fn test_trailing_separator_is_insignificant() {
        let mut a = logged_in();
        let mut b = logged_in();
        assert_eq!(
            selection(Some("vault/open/5/"), &mut a),
            selection(Some("vault/open/5"), &mut b)
        );
    }

    #[test]
    fn test_missing_defaults_rejected() {
        let mut registry = HandlerRegistry::new();
        registry.register::<Vault>().unwrap();
        let registry = Arc::new(registry);

        let err = Dispatcher::new(Arc::clone(&registry), &RoutingConfig::default()).unwrap_err();
        assert_eq!(err, RegistryError::MissingDefaultHandler("pages".into()));

        let routing = RoutingConfig {
            default_handler: "vault".into(),
            default_operation: "list".into(),
            ..RoutingConfig::default()
        };
        let err = Dispatcher::new(registry, &routing).unwrap_err();
        assert_eq!(
            err,
            RegistryError::MissingDefaultOperation {
                handler: "Vault".into(),
                operation: "list".into(),
            }
        );
    }
}
