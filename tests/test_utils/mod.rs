//! Test utilities for database and router testing.
//!
//! This module provides utilities for setting up in-memory SQLite databases
//! with migrations applied, fixtures for clients and employees, and helpers
//! for driving the router with `oneshot`.

#![allow(dead_code)]

use anyhow::Result;
use axum::{
    Router,
    body::{Body, to_bytes},
    http::{HeaderMap, Request, StatusCode, header},
};
use beacon::{
    config::AppConfig,
    demo::OrgPlacement,
    models::{client::Model as ClientModel, employee::Model as EmployeeModel},
    repositories::{ClientRepository, EmployeeRepository, NewEmployee},
    server::{AppState, create_app},
};
use migration::{Migrator, MigratorTrait};
use sea_orm::{ConnectionTrait, Database, DatabaseConnection, Statement};
use serde_json::Value;
use tower::ServiceExt;
use uuid::Uuid;

/// Bearer token accepted by [`test_config`]
pub const ADMIN_TOKEN: &str = "test-admin-token";
/// Admin password accepted by [`test_config`]
pub const ADMIN_PASSWORD: &str = "test-admin-password";

/// Sets up an in-memory SQLite database with all migrations applied.
pub async fn setup_test_db() -> Result<DatabaseConnection> {
    let db = Database::connect("sqlite::memory:").await?;

    Migrator::up(&db, None).await?;

    // Fixtures insert rows whose parents are irrelevant to the test.
    db.execute(Statement::from_string(
        db.get_database_backend(),
        "PRAGMA foreign_keys = OFF".to_string(),
    ))
    .await?;

    Ok(db)
}

/// Configuration for router tests: test profile with admin credentials set
pub fn test_config() -> AppConfig {
    AppConfig {
        profile: "test".to_string(),
        admin_password: Some(ADMIN_PASSWORD.to_string()),
        admin_api_tokens: vec![ADMIN_TOKEN.to_string()],
        ..Default::default()
    }
}

/// Router over `db` using `config`
pub fn test_app(config: AppConfig, db: DatabaseConnection) -> Result<Router> {
    Ok(create_app(AppState::new(config, db)?))
}

/// Creates a client with a unique name
pub async fn create_test_client(db: &DatabaseConnection) -> Result<ClientModel> {
    let name = format!("Test Client {}", &Uuid::new_v4().to_string()[..8]);
    Ok(ClientRepository::new(db).create(&name).await?)
}

/// Creates an active employee for `client_id`
pub async fn create_test_employee(
    db: &DatabaseConnection,
    client_id: Uuid,
    phone: Option<&str>,
    placement: OrgPlacement,
) -> Result<EmployeeModel> {
    Ok(EmployeeRepository::new(db)
        .create(
            client_id,
            NewEmployee {
                first_name: Some("Sam".to_string()),
                phone: phone.map(str::to_string),
                email: None,
                placement,
            },
        )
        .await?)
}

/// Response pieces returned by [`send`]
pub struct TestResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Vec<u8>,
}

impl TestResponse {
    pub fn json(&self) -> Value {
        serde_json::from_slice(&self.body).unwrap_or(Value::Null)
    }

    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }
}

/// Drive one request through the router
pub async fn send(app: &Router, request: Request<Body>) -> TestResponse {
    let response = app
        .clone()
        .oneshot(request)
        .await
        .expect("router is infallible");
    let status = response.status();
    let headers = response.headers().clone();
    let body = to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body collects")
        .to_vec();

    TestResponse {
        status,
        headers,
        body,
    }
}

/// GET with the admin bearer token
pub fn admin_get(uri: &str) -> Request<Body> {
    Request::builder()
        .method("GET")
        .uri(uri)
        .header(header::AUTHORIZATION, format!("Bearer {}", ADMIN_TOKEN))
        .body(Body::empty())
        .expect("valid request")
}

/// JSON request with the admin bearer token
pub fn admin_json(method: &str, uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(header::AUTHORIZATION, format!("Bearer {}", ADMIN_TOKEN))
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .expect("valid request")
}

/// JSON request without credentials
pub fn public_json(method: &str, uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .expect("valid request")
}

/// GET without credentials
pub fn public_get(uri: &str) -> Request<Body> {
    Request::builder()
        .method("GET")
        .uri(uri)
        .body(Body::empty())
        .expect("valid request")
}
