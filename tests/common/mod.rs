//! Shared utilities for integration testing.

#![allow(dead_code)]

use std::sync::Arc;

use axum::body::Body;
use axum::http::{header, Request, Response, StatusCode};
use axum::Router;
use tower::ServiceExt;

use front_router::config::AppConfig;
use front_router::http::HttpServer;
use front_router::persistence::{Database, DbError, Row, SqliteDatabase, Statement};
use serde_json::Value;

pub const COOKIE_NAME: &str = "front_session";

/// Defaults with an in-memory database and no URL prefix.
pub fn test_config() -> AppConfig {
    let mut config = AppConfig::default();
    config.database.path = ":memory:".into();
    config.listener.bind_address = "127.0.0.1:0".into();
    config
}

pub fn server() -> HttpServer {
    let db = SqliteDatabase::in_memory().unwrap();
    server_with(Arc::new(db))
}

pub fn server_with(db: Arc<dyn Database>) -> HttpServer {
    HttpServer::new(test_config(), db).unwrap()
}

/// A database whose every statement fails.
pub struct FailingDatabase;

struct FailingStatement;

impl Statement for FailingStatement {
    fn bind(&mut self, _placeholder: &str, _value: Value) {}

    fn execute(&mut self) -> Result<(), DbError> {
        Err(DbError::Failed("disk on fire".into()))
    }

    fn result_set(&mut self) -> Result<Vec<Row>, DbError> {
        Err(DbError::Failed("disk on fire".into()))
    }

    fn row_count(&self) -> usize {
        0
    }

    fn last_insert_id(&self) -> Option<i64> {
        None
    }
}

impl Database for FailingDatabase {
    fn query<'a>(&'a self, _sql: &str) -> Box<dyn Statement + 'a> {
        Box::new(FailingStatement)
    }
}

pub fn get(uri: &str, cookie: Option<&str>) -> Request<Body> {
    let mut builder = Request::get(uri);
    if let Some(cookie) = cookie {
        builder = builder.header(header::COOKIE, cookie);
    }
    builder.body(Body::empty()).unwrap()
}

pub fn post_form(uri: &str, cookie: Option<&str>, fields: &[(&str, &str)]) -> Request<Body> {
    let body = serde_urlencoded::to_string(fields).unwrap();
    let mut builder = Request::post(uri).header(header::CONTENT_TYPE, "application/x-www-form-urlencoded");
    if let Some(cookie) = cookie {
        builder = builder.header(header::COOKIE, cookie);
    }
    builder.body(Body::from(body)).unwrap()
}

pub async fn send(app: &Router, request: Request<Body>) -> Response<Body> {
    app.clone().oneshot(request).await.unwrap()
}

/// `name=value` pair from the response's `Set-Cookie`, ready for a `Cookie` header.
pub fn cookie_from(response: &Response<Body>) -> Option<String> {
    response
        .headers()
        .get(header::SET_COOKIE)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.split(';').next())
        .map(str::to_string)
}

pub fn location(response: &Response<Body>) -> String {
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    response.headers()[header::LOCATION].to_str().unwrap().to_string()
}

pub async fn body_text(response: Response<Body>) -> String {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}

/// Register a user; returns the cookie of the session holding the welcome flash.
pub async fn registered(app: &Router, name: &str, email: &str) -> String {
    let response = send(
        app,
        post_form(
            "/users/register",
            None,
            &[
                ("name", name),
                ("email", email),
                ("password", "much-secret"),
                ("confirm_password", "much-secret"),
            ],
        ),
    )
    .await;
    let cookie = cookie_from(&response).unwrap();
    assert_eq!(location(&response), "/users/login");
    cookie
}

/// Register and log in a user; returns the post-login session cookie.
pub async fn signed_in(app: &Router, name: &str, email: &str) -> String {
    let cookie = registered(app, name, email).await;

    let response = send(
        app,
        post_form(
            "/users/login",
            Some(&cookie),
            &[("email", email), ("password", "much-secret")],
        ),
    )
    .await;
    let renewed = cookie_from(&response).unwrap();
    assert_eq!(location(&response), "/posts");
    renewed
}
