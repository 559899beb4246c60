//! Common test utilities for API integration tests
//!
//! The router is driven in-process through `tower::Service::call` against a
//! fresh `MemoryStore`, so no database or network listener is needed.

#![allow(dead_code)]

use std::sync::Arc;

use axum::body::Body;
use axum::http::{HeaderMap, Request, StatusCode};
use orghub_api::app::{build_router, AppState};
use orghub_api::config::{ApiConfig, Config, JwtConfig};
use orghub_shared::db::pool::DatabaseConfig;
use orghub_shared::store::MemoryStore;
use serde_json::{json, Value};
use tower::Service as _;
use uuid::Uuid;

pub const TEST_SECRET: &str = "test-secret-key-at-least-32-bytes-long";
pub const TEST_PASSWORD: &str = "password123";

/// Response captured for assertions
pub struct TestResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Value,
}

/// Registered user with a bearer token
pub struct TestUser {
    pub id: Uuid,
    pub email: String,
    pub token: String,
}

/// Test context containing the router and its backing store
pub struct TestContext {
    pub store: Arc<MemoryStore>,
    pub app: axum::Router,
    pub config: Config,
}

pub fn test_config() -> Config {
    Config {
        api: ApiConfig {
            host: "127.0.0.1".to_string(),
            port: 0,
        },
        database: DatabaseConfig::default(),
        jwt: JwtConfig {
            secret: TEST_SECRET.to_string(),
            expiration_hours: 1,
        },
    }
}

impl TestContext {
    pub fn new() -> Self {
        Self::with_config(test_config())
    }

    pub fn with_config(config: Config) -> Self {
        let store = Arc::new(MemoryStore::new());
        let state = AppState::new(store.clone(), config.clone());

        Self {
            store,
            app: build_router(state),
            config,
        }
    }

    /// Sends a request with an optional bearer token and JSON body
    pub async fn send(
        &self,
        method: &str,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> TestResponse {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header("authorization", format!("Bearer {}", token));
        }

        let request = match body {
            Some(body) => builder
                .header("content-type", "application/json")
                .body(Body::from(body.to_string())),
            None => builder.body(Body::empty()),
        }
        .unwrap();

        self.call(request).await
    }

    /// Sends a prebuilt request
    pub async fn call(&self, request: Request<Body>) -> TestResponse {
        let response = self.app.clone().call(request).await.unwrap();

        let status = response.status();
        let headers = response.headers().clone();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes)
                .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&bytes).into_owned()))
        };

        TestResponse {
            status,
            headers,
            body,
        }
    }

    /// Registers a user through the API
    pub async fn register(&self, email: &str) -> TestUser {
        let response = self
            .send(
                "POST",
                "/api/auth/register",
                None,
                Some(json!({ "email": email, "password": TEST_PASSWORD })),
            )
            .await;
        assert_eq!(
            response.status,
            StatusCode::CREATED,
            "register failed: {}",
            response.body
        );

        TestUser {
            id: response.body["user"]["id"].as_str().unwrap().parse().unwrap(),
            email: email.to_string(),
            token: response.body["token"].as_str().unwrap().to_string(),
        }
    }

    /// Creates an organization through the API and returns its id
    pub async fn create_organization(&self, owner: &TestUser, name: &str) -> Uuid {
        let response = self
            .send(
                "POST",
                "/api/organizations",
                Some(&owner.token),
                Some(json!({ "name": name })),
            )
            .await;
        assert_eq!(
            response.status,
            StatusCode::CREATED,
            "create organization failed: {}",
            response.body
        );

        response.body["id"].as_str().unwrap().parse().unwrap()
    }

    /// Adds `member` to `organization_id` as `role`, acting as `admin`
    pub async fn add_member(
        &self,
        admin: &TestUser,
        organization_id: Uuid,
        member: &TestUser,
        role: &str,
    ) -> TestResponse {
        self.send(
            "POST",
            &format!("/api/organizations/{}/members", organization_id),
            Some(&admin.token),
            Some(json!({ "email": member.email, "role": role })),
        )
        .await
    }
}
