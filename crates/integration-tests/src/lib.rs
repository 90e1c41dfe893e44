//! Integration tests for Handset.
//!
//! # Running Tests
//!
//! ```bash
//! # In-process tests (no database needed)
//! cargo test -p handset-integration-tests
//!
//! # Including the live PostgreSQL round trip
//! HANDSET_TEST_DATABASE_URL=postgres://... cargo test -p handset-integration-tests -- --ignored
//! ```
//!
//! # Test Categories
//!
//! - `users_api` - Sub-account listing, creation, detail and deletion
//! - `phones_api` - Catalog reads, authentication failures and caching
//!
//! Requests are driven through the real router with `tower::ServiceExt::oneshot`,
//! backed by [`InMemoryStore`] so storage calls can be counted.

#![allow(clippy::missing_panics_doc)]

use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use axum::body::Body;
use axum::http::{Method, Request, StatusCode, header};
use jsonwebtoken::{Algorithm, EncodingKey, Header};
use rust_decimal::Decimal;
use secrecy::SecretString;
use serde_json::{Value, json};
use tower::ServiceExt;

use handset_api::config::{ApiConfig, CacheConfig, JwtConfig};
use handset_api::db::memory::InMemoryStore;
use handset_api::models::{Customer, NewUser, Phone, User};
use handset_api::routes;
use handset_api::state::{AppState, Repositories};
use handset_core::{Email, PhoneId, Price, RoleSet};

/// HS256 key shared by the test server and [`TestContext::token_for`].
pub const JWT_SECRET: &str = "q8Vn3LzT0wKp5yRb2mXc7HdJ9sFgA4Ue";

/// Base URL used to build `Location` headers.
pub const BASE_URL: &str = "http://localhost:8000";

/// A response reduced to what the tests assert on.
#[derive(Debug)]
pub struct TestResponse {
    pub status: StatusCode,
    pub headers: axum::http::HeaderMap,
    pub body: Vec<u8>,
}

impl TestResponse {
    /// Parse the body as JSON.
    pub fn json(&self) -> Value {
        serde_json::from_slice(&self.body).expect("Response body is not JSON")
    }
}

/// An application wired to an in-memory store.
pub struct TestContext {
    pub store: Arc<InMemoryStore>,
    pub state: AppState,
    app: Router,
}

impl Default for TestContext {
    fn default() -> Self {
        Self::new()
    }
}

impl TestContext {
    /// Build the full router over an empty store.
    #[must_use]
    pub fn new() -> Self {
        let store = Arc::new(InMemoryStore::new());
        let state = AppState::new(test_config(), Repositories::single(Arc::clone(&store)));
        let app = routes::app(state.clone());
        Self { store, state, app }
    }

    /// Register a customer account.
    pub async fn customer(&self, email: &str, name: &str) -> Customer {
        let email = Email::parse(email).expect("Invalid test email");
        self.store.add_customer(email, name).await
    }

    /// Insert a sub-account owned by `owner`.
    pub async fn user(&self, owner: &Customer, email: &str) -> User {
        self.store
            .add_user(NewUser {
                customer_id: owner.id,
                email: Email::parse(email).expect("Invalid test email"),
                roles: RoleSet::default(),
                password_hash: "$argon2id$stub".to_owned(),
                first_name: "Test".to_owned(),
                last_name: "User".to_owned(),
            })
            .await
    }

    /// Add a phone to the catalog.
    pub async fn phone(&self, id: i32, name: &str) -> Phone {
        let phone = Phone {
            id: PhoneId::new(id),
            name: name.to_owned(),
            brand: "Acme".to_owned(),
            model: format!("{name} 128"),
            price: Price::new(Decimal::new(79_900, 2)).expect("Invalid test price"),
            color: "black".to_owned(),
            screen_size: "6.1".to_owned(),
            capacity: 128,
            description: format!("The {name}"),
            image: format!("https://img.example/{id}.png"),
        };
        self.store.add_phone(phone.clone()).await;
        phone
    }

    /// Mint a token whose `username` claim is `email`, valid for an hour.
    #[must_use]
    pub fn token_for(email: &str) -> String {
        sign(&json!({
            "username": email,
            "roles": ["ROLE_USER"],
            "iat": chrono::Utc::now().timestamp(),
            "exp": chrono::Utc::now().timestamp() + 3600,
        }))
    }

    /// Send a request, optionally authenticated and with a JSON body.
    pub async fn send(
        &self,
        method: Method,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> TestResponse {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
        }
        let body = match body {
            Some(value) => {
                builder = builder.header(header::CONTENT_TYPE, "application/json");
                Body::from(value.to_string())
            }
            None => Body::empty(),
        };
        let request = builder.body(body).expect("Failed to build request");

        let response = self
            .app
            .clone()
            .oneshot(request)
            .await
            .expect("Router is infallible");

        let status = response.status();
        let headers = response.headers().clone();
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("Failed to read response body")
            .to_vec();

        TestResponse {
            status,
            headers,
            body,
        }
    }

    /// `GET` as the customer identified by `email`.
    pub async fn get_as(&self, email: &str, uri: &str) -> TestResponse {
        let token = Self::token_for(email);
        self.send(Method::GET, uri, Some(&token), None).await
    }

    /// `POST` JSON as the customer identified by `email`.
    pub async fn post_as(&self, email: &str, uri: &str, body: Value) -> TestResponse {
        let token = Self::token_for(email);
        self.send(Method::POST, uri, Some(&token), Some(body)).await
    }

    /// `DELETE` as the customer identified by `email`.
    pub async fn delete_as(&self, email: &str, uri: &str) -> TestResponse {
        let token = Self::token_for(email);
        self.send(Method::DELETE, uri, Some(&token), None).await
    }
}

/// Configuration for the in-process server.
#[must_use]
pub fn test_config() -> ApiConfig {
    ApiConfig {
        database_url: SecretString::from("postgres://unused@localhost/handset".to_owned()),
        host: [127, 0, 0, 1].into(),
        port: 8000,
        base_url: url::Url::parse(BASE_URL).expect("Invalid base URL"),
        jwt: JwtConfig {
            secret: SecretString::from(JWT_SECRET.to_owned()),
            leeway_secs: 0,
        },
        cache: CacheConfig {
            max_capacity: 1_000,
            time_to_live: Duration::from_secs(60),
        },
        sentry_dsn: None,
        sentry_environment: None,
    }
}

/// Sign `claims` with [`JWT_SECRET`] as an HS256 JWT.
#[must_use]
pub fn sign(claims: &Value) -> String {
    jsonwebtoken::encode(
        &Header::new(Algorithm::HS256),
        claims,
        &EncodingKey::from_secret(JWT_SECRET.as_bytes()),
    )
    .expect("Failed to sign test token")
}
