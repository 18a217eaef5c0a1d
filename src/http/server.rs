//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create Axum Router with the front controller on every path
//! - Wire up middleware (tracing, timeout, body limit, request ID)
//! - Bind server to listener with graceful shutdown
//! - Move each request onto the blocking pool for dispatch
//! - Load and commit the caller's session around dispatch
//! - Set the session cookie only once a new or renewed id is stored
//! - Observability (metrics, correlation IDs)

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::{
    body::Body,
    extract::State,
    http::{Method, Request, StatusCode},
    response::{IntoResponse, Response},
    routing::any,
    Router,
};
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower_http::{
    limit::RequestBodyLimitLayer,
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use crate::config::AppConfig;
use crate::controllers;
use crate::error::AppError;
use crate::http::request::{parse_form, raw_path, session_cookie, X_REQUEST_ID};
use crate::http::response::{expired_cookie_value, respond, session_cookie_value, set_cookie};
use crate::lifecycle::StartupError;
use crate::observability::metrics;
use crate::persistence::Database;
use crate::routing::{Dispatcher, RequestContext, Services};
use crate::security::Argon2Hasher;
use crate::session::{Session, SessionStore};
use crate::view::ViewRenderer;

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub dispatcher: Arc<Dispatcher>,
    pub services: Arc<Services>,
    pub sessions: SessionStore,
    pub views: Arc<ViewRenderer>,
    pub config: Arc<AppConfig>,
}

impl AppState {
    /// Wire registry, dispatcher, services and views for `config`.
    pub fn new(config: AppConfig, db: Arc<dyn Database>) -> Result<Self, StartupError> {
        let registry = Arc::new(controllers::registry()?);
        let dispatcher = Dispatcher::new(registry, &config.routing)?;
        let services =
            Services::new(db, Arc::new(Argon2Hasher)).with_min_password_len(config.security.min_password_len);
        let views = ViewRenderer::new(&config.site.site_name, &config.site.url_root)?;

        Ok(Self {
            dispatcher: Arc::new(dispatcher),
            services: Arc::new(services),
            sessions: SessionStore::new()
                .with_idle_timeout(Duration::from_secs(config.session.idle_timeout_secs)),
            views: Arc::new(views),
            config: Arc::new(config),
        })
    }

    /// One request, start to finish, on the calling thread.
    fn handle(
        &self,
        method: Method,
        raw: Option<String>,
        form: HashMap<String, String>,
        mut session: Session,
    ) -> Response {
        let fresh = session.is_fresh();

        let result = {
            let mut ctx = RequestContext::new(method, &mut session, &self.services).with_form(form);
            self.dispatcher.dispatch(raw.as_deref(), &mut ctx)
        };
        let rendered = result.and_then(|dispatch| respond(dispatch.into_outcome(), &self.views, &mut session));

        let cookie_name = &self.config.session.cookie_name;
        let destroyed = session.is_destroyed();
        let announce = fresh || session.previous_id().is_some();
        let id = session.id().to_string();
        let stored = self.sessions.commit(session);

        let cookie = if destroyed {
            Some(expired_cookie_value(cookie_name))
        } else if stored && announce {
            Some(session_cookie_value(cookie_name, &id))
        } else {
            None
        };

        let mut response = rendered.unwrap_or_else(|e| e.into_response());
        if let Some(cookie) = cookie {
            set_cookie(&mut response, &cookie);
        }
        response
    }
}

/// HTTP server for the front controller.
pub struct HttpServer {
    router: Router,
    state: AppState,
}

impl HttpServer {
    /// Create a new HTTP server with the given configuration and database.
    pub fn new(config: AppConfig, db: Arc<dyn Database>) -> Result<Self, StartupError> {
        let state = AppState::new(config, db)?;
        let router = Self::build_router(state.clone());
        Ok(Self { router, state })
    }

    /// Build the Axum router with all middleware layers.
    #[allow(deprecated)]
    fn build_router(state: AppState) -> Router {
        let timeout = Duration::from_secs(state.config.timeouts.request_secs);
        let max_body_size = state.config.security.max_body_size;

        Router::new()
            .route("/{*path}", any(front_controller))
            .route("/", any(front_controller))
            .with_state(state)
            .layer(RequestBodyLimitLayer::new(max_body_size))
            .layer(TimeoutLayer::new(timeout))
            .layer(PropagateRequestIdLayer::new(X_REQUEST_ID))
            .layer(TraceLayer::new_for_http())
            .layer(SetRequestIdLayer::new(X_REQUEST_ID, MakeRequestUuid))
    }

    /// The fully layered router, for driving the app without a socket.
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    pub fn state(&self) -> &AppState {
        &self.state
    }

    /// Run the server until `shutdown` fires, then drain in-flight requests.
    pub async fn run(self, listener: TcpListener, mut shutdown: broadcast::Receiver<()>) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(
            address = %addr,
            "HTTP server starting"
        );

        axum::serve(listener, self.router)
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
                tracing::info!("Shutdown signal received");
            })
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }
}

/// Front controller: every path and method lands here.
async fn front_controller(State(state): State<AppState>, request: Request<Body>) -> Response {
    let start = Instant::now();
    let request_id = request
        .headers()
        .get(X_REQUEST_ID)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("unknown")
        .to_string();

    let (parts, body) = request.into_parts();
    let raw = raw_path(&parts.uri, &state.config.routing.path_param);

    tracing::debug!(
        request_id = %request_id,
        method = %parts.method,
        raw_path = ?raw,
        "Handling request"
    );

    let form = if parts.method == Method::POST {
        let bytes = match axum::body::to_bytes(body, state.config.security.max_body_size).await {
            Ok(bytes) => bytes,
            Err(e) => {
                tracing::warn!(request_id = %request_id, error = %e, "Failed to read request body");
                metrics::record_request(StatusCode::PAYLOAD_TOO_LARGE.as_u16(), start);
                return (StatusCode::PAYLOAD_TOO_LARGE, "Request body too large").into_response();
            }
        };
        match parse_form(&parts.headers, &bytes) {
            Ok(form) => form,
            Err(e) => {
                tracing::warn!(request_id = %request_id, error = %e, "Malformed form body");
                metrics::record_request(StatusCode::BAD_REQUEST.as_u16(), start);
                return (StatusCode::BAD_REQUEST, "Malformed form body").into_response();
            }
        }
    } else {
        HashMap::new()
    };

    let cookie = session_cookie(&parts.headers, &state.config.session.cookie_name);
    let session = state.sessions.load(cookie.as_deref());
    let method = parts.method;

    let worker = state.clone();
    let response = match tokio::task::spawn_blocking(move || worker.handle(method, raw, form, session)).await {
        Ok(response) => response,
        Err(e) => AppError::Task(e.to_string()).into_response(),
    };

    tracing::debug!(
        request_id = %request_id,
        status = response.status().as_u16(),
        elapsed_ms = start.elapsed().as_millis() as u64,
        "Request complete"
    );
    metrics::record_request(response.status().as_u16(), start);
    response
}
