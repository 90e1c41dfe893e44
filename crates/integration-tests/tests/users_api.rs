//! Integration tests for the sub-account endpoints.
//!
//! Run with: cargo test -p handset-integration-tests --test users_api

#![allow(clippy::unwrap_used)]

use axum::http::{StatusCode, header};
use serde_json::{Value, json};

use handset_api::models::user::messages;
use handset_api::services::USER_LIST_TAG;
use handset_api::services::access::ACCESS_DENIED;
use handset_api::services::users::USER_NOT_FOUND;
use handset_integration_tests::TestContext;

const ALICE: &str = "alice@retailer.example";
const BOB: &str = "bob@wholesale.example";

fn emails(body: &Value) -> Vec<&str> {
    body.as_array()
        .unwrap()
        .iter()
        .map(|user| user["email"].as_str().unwrap())
        .collect()
}

// ============================================================================
// Listing
// ============================================================================

#[tokio::test]
async fn test_list_returns_only_callers_users_and_caches_page() {
    let ctx = TestContext::new();
    let alice = ctx.customer(ALICE, "Alice Retail").await;
    let bob = ctx.customer(BOB, "Bob Wholesale").await;
    for i in 1..=3 {
        ctx.user(&alice, &format!("clerk{i}@retailer.example")).await;
    }
    ctx.user(&bob, "buyer@wholesale.example").await;

    let response = ctx.get_as(ALICE, "/api/users?page=1&limit=10").await;

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(
        response.headers[header::CONTENT_TYPE],
        "application/json"
    );
    let body = response.json();
    assert_eq!(
        emails(&body),
        vec![
            "clerk1@retailer.example",
            "clerk2@retailer.example",
            "clerk3@retailer.example",
        ]
    );
    assert!(body[0].get("password").is_none());
    assert_eq!(body[0]["customer_id"], json!(alice.id));
    assert_eq!(body[0]["roles"], json!(["ROLE_USER"]));

    // Second identical request is answered from the cache
    let again = ctx.get_as(ALICE, "/api/users?page=1&limit=10").await;
    assert_eq!(again.body, response.body);
    assert_eq!(ctx.store.user_page_calls(), 1);
}

#[tokio::test]
async fn test_list_cache_is_scoped_to_caller() {
    let ctx = TestContext::new();
    let alice = ctx.customer(ALICE, "Alice Retail").await;
    let bob = ctx.customer(BOB, "Bob Wholesale").await;
    ctx.user(&alice, "clerk@retailer.example").await;
    ctx.user(&bob, "buyer@wholesale.example").await;

    let for_alice = ctx.get_as(ALICE, "/api/users").await.json();
    let for_bob = ctx.get_as(BOB, "/api/users").await.json();

    assert_eq!(emails(&for_alice), vec!["clerk@retailer.example"]);
    assert_eq!(emails(&for_bob), vec!["buyer@wholesale.example"]);
    assert_eq!(ctx.store.user_page_calls(), 2);
}

#[tokio::test]
async fn test_list_pages_and_defaults() {
    let ctx = TestContext::new();
    let alice = ctx.customer(ALICE, "Alice Retail").await;
    for i in 1..=12 {
        ctx.user(&alice, &format!("clerk{i:02}@retailer.example")).await;
    }

    let first = ctx.get_as(ALICE, "/api/users").await.json();
    let second = ctx.get_as(ALICE, "/api/users?page=2").await.json();
    let beyond = ctx.get_as(ALICE, "/api/users?page=9&limit=5").await.json();

    assert_eq!(first.as_array().unwrap().len(), 10);
    assert_eq!(
        emails(&second),
        vec!["clerk11@retailer.example", "clerk12@retailer.example"]
    );
    assert_eq!(beyond, json!([]));
}

#[tokio::test]
async fn test_list_rejects_non_numeric_pagination() {
    let ctx = TestContext::new();
    ctx.customer(ALICE, "Alice Retail").await;

    let response = ctx.get_as(ALICE, "/api/users?page=abc").await;

    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert_eq!(response.json()["status"], 400);
    assert_eq!(ctx.store.user_page_calls(), 0);
}

// ============================================================================
// Detail
// ============================================================================

#[tokio::test]
async fn test_show_returns_owned_user() {
    let ctx = TestContext::new();
    let alice = ctx.customer(ALICE, "Alice Retail").await;
    let clerk = ctx.user(&alice, "clerk@retailer.example").await;

    let response = ctx
        .get_as(ALICE, &format!("/api/users/{}", clerk.id))
        .await;

    assert_eq!(response.status, StatusCode::OK);
    let body = response.json();
    assert_eq!(body["id"], json!(clerk.id));
    assert_eq!(body["email"], "clerk@retailer.example");
    assert_eq!(body["firstname"], "Test");
    assert_eq!(body["lastname"], "User");
}

#[tokio::test]
async fn test_show_foreign_user_is_forbidden() {
    let ctx = TestContext::new();
    ctx.customer(ALICE, "Alice Retail").await;
    let bob = ctx.customer(BOB, "Bob Wholesale").await;
    let buyer = ctx.user(&bob, "buyer@wholesale.example").await;

    let response = ctx
        .get_as(ALICE, &format!("/api/users/{}", buyer.id))
        .await;

    assert_eq!(response.status, StatusCode::FORBIDDEN);
    assert_eq!(
        response.json(),
        json!({"status": 403, "message": ACCESS_DENIED})
    );
}

#[tokio::test]
async fn test_show_unknown_user_is_not_found() {
    let ctx = TestContext::new();
    ctx.customer(ALICE, "Alice Retail").await;

    let response = ctx.get_as(ALICE, "/api/users/9999").await;

    assert_eq!(response.status, StatusCode::NOT_FOUND);
    assert_eq!(response.json()["message"], USER_NOT_FOUND);
}

#[tokio::test]
async fn test_show_non_numeric_id_is_bad_request() {
    let ctx = TestContext::new();
    ctx.customer(ALICE, "Alice Retail").await;

    let response = ctx.get_as(ALICE, "/api/users/abc").await;

    assert_eq!(response.status, StatusCode::BAD_REQUEST);
}

// ============================================================================
// Creation
// ============================================================================

#[tokio::test]
async fn test_create_persists_for_caller_and_invalidates_list() {
    let ctx = TestContext::new();
    let alice = ctx.customer(ALICE, "Alice Retail").await;
    ctx.user(&alice, "clerk@retailer.example").await;

    // Warm the cache
    let before = ctx.get_as(ALICE, "/api/users").await.json();
    assert_eq!(before.as_array().unwrap().len(), 1);
    let generation = ctx.state.cache().generation(USER_LIST_TAG);

    let response = ctx
        .post_as(
            ALICE,
            "/api/users",
            json!({
                "email": "new.clerk@retailer.example",
                "password": "s3cret-Passw0rd",
                "firstname": "Nina",
                "lastname": "Clerk",
                "roles": ["ROLE_ADMIN"],
            }),
        )
        .await;

    assert_eq!(response.status, StatusCode::CREATED);
    let created = response.json();
    let id = created["id"].as_i64().unwrap();
    assert_eq!(created["customer_id"], json!(alice.id));
    assert_eq!(created["roles"], json!(["ROLE_ADMIN", "ROLE_USER"]));
    assert!(created.get("password").is_none());
    assert_eq!(
        response.headers[header::LOCATION],
        format!("http://localhost:8000/api/users/{id}").as_str()
    );

    assert!(ctx.state.cache().generation(USER_LIST_TAG) > generation);
    let after = ctx.get_as(ALICE, "/api/users").await.json();
    assert_eq!(after.as_array().unwrap().len(), 2);
    assert_eq!(ctx.store.user_page_calls(), 2);
}

#[tokio::test]
async fn test_create_with_missing_email_is_rejected_without_side_effects() {
    let ctx = TestContext::new();
    ctx.customer(ALICE, "Alice Retail").await;
    let generation = ctx.state.cache().generation(USER_LIST_TAG);

    let response = ctx
        .post_as(
            ALICE,
            "/api/users",
            json!({
                "password": "s3cret-Passw0rd",
                "firstname": "Nina",
                "lastname": "Clerk",
            }),
        )
        .await;

    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    let body = response.json();
    assert_eq!(body["status"], 400);
    assert_eq!(body["errors"], json!({"email": messages::EMAIL_REQUIRED}));
    assert_eq!(ctx.store.save_calls(), 0);
    assert_eq!(ctx.state.cache().generation(USER_LIST_TAG), generation);
}

#[tokio::test]
async fn test_create_reports_every_invalid_field() {
    let ctx = TestContext::new();
    ctx.customer(ALICE, "Alice Retail").await;

    let response = ctx
        .post_as(
            ALICE,
            "/api/users",
            json!({
                "email": "not-an-email",
                "password": "",
                "firstname": "N".repeat(51),
            }),
        )
        .await;

    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert_eq!(
        response.json()["errors"],
        json!({
            "email": messages::EMAIL_INVALID,
            "password": messages::PASSWORD_REQUIRED,
            "firstname": messages::FIRSTNAME_TOO_LONG,
            "lastname": messages::LASTNAME_REQUIRED,
        })
    );
}

#[tokio::test]
async fn test_create_for_another_customer_is_forbidden() {
    let ctx = TestContext::new();
    ctx.customer(ALICE, "Alice Retail").await;
    let bob = ctx.customer(BOB, "Bob Wholesale").await;

    let response = ctx
        .post_as(
            ALICE,
            "/api/users",
            json!({
                "email": "mole@retailer.example",
                "password": "s3cret-Passw0rd",
                "firstname": "Mole",
                "lastname": "Clerk",
                "customer_id": bob.id,
            }),
        )
        .await;

    assert_eq!(response.status, StatusCode::FORBIDDEN);
    assert_eq!(ctx.store.save_calls(), 0);
    assert_eq!(ctx.store.user_count().await, 0);
}

#[tokio::test]
async fn test_create_with_taken_email_is_validation_error() {
    let ctx = TestContext::new();
    let alice = ctx.customer(ALICE, "Alice Retail").await;
    ctx.user(&alice, "clerk@retailer.example").await;

    let response = ctx
        .post_as(
            ALICE,
            "/api/users",
            json!({
                "email": "clerk@retailer.example",
                "password": "s3cret-Passw0rd",
                "firstname": "Copy",
                "lastname": "Cat",
            }),
        )
        .await;

    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert_eq!(
        response.json()["errors"],
        json!({"email": messages::EMAIL_TAKEN})
    );
}

#[tokio::test]
async fn test_create_with_malformed_json_is_bad_request() {
    let ctx = TestContext::new();
    ctx.customer(ALICE, "Alice Retail").await;

    let response = ctx
        .post_as(ALICE, "/api/users", json!(["not", "an", "object"]))
        .await;

    assert!(response.status.is_client_error());
    assert_eq!(ctx.store.save_calls(), 0);
}

// ============================================================================
// Deletion
// ============================================================================

#[tokio::test]
async fn test_delete_owned_user_invalidates_and_returns_no_content() {
    let ctx = TestContext::new();
    let alice = ctx.customer(ALICE, "Alice Retail").await;
    let clerk = ctx.user(&alice, "clerk@retailer.example").await;
    ctx.get_as(ALICE, "/api/users").await;
    let generation = ctx.state.cache().generation(USER_LIST_TAG);

    let response = ctx
        .delete_as(ALICE, &format!("/api/users/{}", clerk.id))
        .await;

    assert_eq!(response.status, StatusCode::NO_CONTENT);
    assert!(response.body.is_empty());
    assert_eq!(ctx.store.delete_calls(), 1);
    assert!(ctx.state.cache().generation(USER_LIST_TAG) > generation);

    let after = ctx.get_as(ALICE, "/api/users").await.json();
    assert_eq!(after, json!([]));
}

#[tokio::test]
async fn test_delete_foreign_user_is_forbidden_without_side_effects() {
    let ctx = TestContext::new();
    ctx.customer(ALICE, "Alice Retail").await;
    let bob = ctx.customer(BOB, "Bob Wholesale").await;
    let buyer = ctx.user(&bob, "buyer@wholesale.example").await;
    let generation = ctx.state.cache().generation(USER_LIST_TAG);

    let response = ctx
        .delete_as(ALICE, &format!("/api/users/{}", buyer.id))
        .await;

    assert_eq!(response.status, StatusCode::FORBIDDEN);
    assert_eq!(ctx.store.delete_calls(), 0);
    assert_eq!(ctx.store.user_count().await, 1);
    assert_eq!(ctx.state.cache().generation(USER_LIST_TAG), generation);
}

#[tokio::test]
async fn test_delete_unknown_user_is_not_found() {
    let ctx = TestContext::new();
    ctx.customer(ALICE, "Alice Retail").await;

    let response = ctx.delete_as(ALICE, "/api/users/404").await;

    assert_eq!(response.status, StatusCode::NOT_FOUND);
    assert_eq!(ctx.store.delete_calls(), 0);
}
