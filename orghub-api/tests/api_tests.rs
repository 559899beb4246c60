/// End-to-end tests for the OrgHub HTTP API
///
/// Every test builds a fresh router over an in-memory store and drives it
/// with real HTTP requests:
/// - Health, echo and CORS
/// - Bearer authentication failure codes
/// - Registration, login and `me`
/// - Organization lifecycle, switching and member management

mod common;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use common::{test_config, TestContext, TEST_PASSWORD};
use orghub_shared::auth::jwt::{create_token, Claims};
use orghub_shared::store::Store;
use serde_json::json;
use uuid::Uuid;

#[tokio::test]
async fn test_health_reports_connected_store() {
    let ctx = TestContext::new();

    let response = ctx.send("GET", "/api/health", None, None).await;

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["status"], "healthy");
    assert_eq!(response.body["database"], "connected");
    assert_eq!(response.body["version"], env!("CARGO_PKG_VERSION"));
}

#[tokio::test]
async fn test_echo_round_trips_message() {
    let ctx = TestContext::new();

    for message in ["hello", "", "ünïcødé ✓", "  spaced  ", "{\"nested\": true}"] {
        let response = ctx
            .send("POST", "/api/echo", None, Some(json!({ "message": message })))
            .await;

        assert_eq!(response.status, StatusCode::OK);
        assert_eq!(response.body, json!({ "echo": message }));
    }
}

#[tokio::test]
async fn test_echo_malformed_json_is_bad_request() {
    let ctx = TestContext::new();

    let request = Request::builder()
        .method("POST")
        .uri("/api/echo")
        .header("content-type", "application/json")
        .body(Body::from("{\"message\": "))
        .unwrap();
    let response = ctx.call(request).await;

    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert_eq!(response.body["code"], "BAD_REQUEST");
    assert!(response.body["error"].is_string());
}

#[tokio::test]
async fn test_echo_missing_field_is_validation_error() {
    let ctx = TestContext::new();

    let response = ctx
        .send("POST", "/api/echo", None, Some(json!({ "msg": "hello" })))
        .await;

    assert_eq!(response.status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(response.body["code"], "VALIDATION_ERROR");
}

#[tokio::test]
async fn test_cors_preflight() {
    let ctx = TestContext::new();

    let request = Request::builder()
        .method("OPTIONS")
        .uri("/api/organizations")
        .header("origin", "http://localhost:5173")
        .header("access-control-request-method", "POST")
        .header("access-control-request-headers", "authorization,content-type")
        .body(Body::empty())
        .unwrap();
    let response = ctx.call(request).await;

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.headers["access-control-allow-origin"], "*");
    assert!(!response.headers["access-control-allow-methods"].is_empty());
    assert!(!response.headers["access-control-allow-headers"].is_empty());
}

#[tokio::test]
async fn test_cors_header_on_regular_response() {
    let ctx = TestContext::new();

    let request = Request::builder()
        .method("GET")
        .uri("/api/health")
        .header("origin", "http://localhost:5173")
        .body(Body::empty())
        .unwrap();
    let response = ctx.call(request).await;

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.headers["access-control-allow-origin"], "*");
}

#[tokio::test]
async fn test_unknown_route_is_json_not_found() {
    let ctx = TestContext::new();

    let response = ctx.send("GET", "/api/nope", None, None).await;

    assert_eq!(response.status, StatusCode::NOT_FOUND);
    assert_eq!(response.body["code"], "NOT_FOUND");
}

#[tokio::test]
async fn test_protected_route_without_header() {
    let ctx = TestContext::new();

    let response = ctx.send("GET", "/api/organizations", None, None).await;

    assert_eq!(response.status, StatusCode::UNAUTHORIZED);
    assert_eq!(response.body["code"], "MISSING_AUTH_HEADER");
    assert!(response.body["error"].is_string());
}

#[tokio::test]
async fn test_auth_header_failure_codes() {
    let ctx = TestContext::new();

    let cases = [
        ("Basic dXNlcjpwYXNz", "INVALID_AUTH_FORMAT"),
        ("Bearer ", "MISSING_TOKEN"),
        ("Bearer not-a-token", "INVALID_TOKEN"),
    ];

    for (header, code) in cases {
        let request = Request::builder()
            .method("GET")
            .uri("/api/auth/me")
            .header("authorization", header)
            .body(Body::empty())
            .unwrap();
        let response = ctx.call(request).await;

        assert_eq!(response.status, StatusCode::UNAUTHORIZED, "header {:?}", header);
        assert_eq!(response.body["code"], code, "header {:?}", header);
    }
}

#[tokio::test]
async fn test_token_signed_with_other_secret_is_rejected() {
    let ctx = TestContext::new();
    let claims = Claims::new(Uuid::new_v4(), "a@example.com".to_string());
    let token = create_token(&claims, "a-completely-different-secret-of-32+").unwrap();

    let response = ctx.send("GET", "/api/auth/me", Some(&token), None).await;

    assert_eq!(response.status, StatusCode::UNAUTHORIZED);
    assert_eq!(response.body["code"], "INVALID_TOKEN");
    assert_eq!(response.body["error"], "invalid or expired token");
}

#[tokio::test]
async fn test_register_login_and_me() {
    let ctx = TestContext::new();
    let alice = ctx.register("alice@example.com").await;

    let login = ctx
        .send(
            "POST",
            "/api/auth/login",
            None,
            Some(json!({ "email": "alice@example.com", "password": TEST_PASSWORD })),
        )
        .await;
    assert_eq!(login.status, StatusCode::OK);
    assert_eq!(login.body["user"]["id"], alice.id.to_string());
    assert!(login.body["user"].get("password_hash").is_none());

    let token = login.body["token"].as_str().unwrap();
    let me = ctx.send("GET", "/api/auth/me", Some(token), None).await;
    assert_eq!(me.status, StatusCode::OK);
    assert_eq!(me.body["user"]["email"], "alice@example.com");
}

#[tokio::test]
async fn test_out_of_range_token_lifetime_is_internal_error() {
    for hours in [-1, i64::MAX] {
        let mut config = test_config();
        config.jwt.expiration_hours = hours;
        let ctx = TestContext::with_config(config);

        let response = ctx
            .send(
                "POST",
                "/api/auth/register",
                None,
                Some(json!({ "email": "alice@example.com", "password": TEST_PASSWORD })),
            )
            .await;

        assert_eq!(response.status, StatusCode::INTERNAL_SERVER_ERROR, "hours {}", hours);
        assert_eq!(response.body["code"], "INTERNAL_ERROR");
    }
}

#[tokio::test]
async fn test_deleted_user_token_is_rejected() {
    let ctx = TestContext::new();
    let alice = ctx.register("alice@example.com").await;
    ctx.create_organization(&alice, "Acme").await;

    assert!(ctx.store.soft_delete_user(alice.id).await.unwrap());

    for uri in ["/api/auth/me", "/api/organizations"] {
        let response = ctx.send("GET", uri, Some(&alice.token), None).await;
        assert_eq!(response.status, StatusCode::UNAUTHORIZED, "uri {}", uri);
        assert_eq!(response.body["code"], "INVALID_TOKEN");
    }
}

#[tokio::test]
async fn test_register_duplicate_email_conflicts() {
    let ctx = TestContext::new();
    ctx.register("alice@example.com").await;

    let response = ctx
        .send(
            "POST",
            "/api/auth/register",
            None,
            Some(json!({ "email": "alice@example.com", "password": TEST_PASSWORD })),
        )
        .await;

    assert_eq!(response.status, StatusCode::CONFLICT);
    assert_eq!(response.body["code"], "CONFLICT");
    assert_eq!(response.body["error"], "Email already registered");
}

#[tokio::test]
async fn test_register_validation() {
    let ctx = TestContext::new();

    let response = ctx
        .send(
            "POST",
            "/api/auth/register",
            None,
            Some(json!({ "email": "not-an-email", "password": "short" })),
        )
        .await;

    assert_eq!(response.status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(response.body["code"], "VALIDATION_ERROR");

    let fields: Vec<&str> = response.body["details"]
        .as_array()
        .unwrap()
        .iter()
        .map(|d| d["field"].as_str().unwrap())
        .collect();
    assert_eq!(fields, vec!["email", "password"]);
}

#[tokio::test]
async fn test_login_bad_credentials() {
    let ctx = TestContext::new();
    ctx.register("alice@example.com").await;

    for (email, password) in [
        ("alice@example.com", "wrong-password"),
        ("nobody@example.com", TEST_PASSWORD),
    ] {
        let response = ctx
            .send(
                "POST",
                "/api/auth/login",
                None,
                Some(json!({ "email": email, "password": password })),
            )
            .await;

        assert_eq!(response.status, StatusCode::UNAUTHORIZED);
        assert_eq!(response.body["code"], "INVALID_CREDENTIALS");
    }
}

#[tokio::test]
async fn test_create_and_list_organizations() {
    let ctx = TestContext::new();
    let alice = ctx.register("alice@example.com").await;

    let created = ctx
        .send(
            "POST",
            "/api/organizations",
            Some(&alice.token),
            Some(json!({ "name": "Zeta", "billing_details": { "plan": "pro" } })),
        )
        .await;
    assert_eq!(created.status, StatusCode::CREATED);
    assert_eq!(created.body["name"], "Zeta");
    assert_eq!(created.body["role"], "admin");
    assert_eq!(created.body["billing_details"]["plan"], "pro");

    ctx.create_organization(&alice, "Alpha").await;

    let listed = ctx
        .send("GET", "/api/organizations", Some(&alice.token), None)
        .await;
    assert_eq!(listed.status, StatusCode::OK);

    let orgs = listed.body.as_array().unwrap();
    assert_eq!(orgs.len(), 2);
    assert_eq!(orgs[0]["name"], "Alpha");
    assert_eq!(orgs[1]["name"], "Zeta");
    assert!(orgs.iter().all(|o| o["role"] == "admin"));
}

#[tokio::test]
async fn test_create_organization_duplicate_name_conflicts() {
    let ctx = TestContext::new();
    let alice = ctx.register("alice@example.com").await;
    let bob = ctx.register("bob@example.com").await;
    ctx.create_organization(&alice, "Acme").await;

    let response = ctx
        .send(
            "POST",
            "/api/organizations",
            Some(&bob.token),
            Some(json!({ "name": "Acme" })),
        )
        .await;

    assert_eq!(response.status, StatusCode::CONFLICT);
    assert_eq!(response.body["code"], "CONFLICT");
}

#[tokio::test]
async fn test_create_organization_validation() {
    let ctx = TestContext::new();
    let alice = ctx.register("alice@example.com").await;

    for body in [
        json!({ "name": "" }),
        json!({ "name": "   " }),
        json!({ "name": "Acme", "billing_details": "not an object" }),
    ] {
        let response = ctx
            .send("POST", "/api/organizations", Some(&alice.token), Some(body.clone()))
            .await;
        assert_eq!(
            response.status,
            StatusCode::UNPROCESSABLE_ENTITY,
            "body {}",
            body
        );
    }
}

#[tokio::test]
async fn test_switch_organization() {
    let ctx = TestContext::new();
    let alice = ctx.register("alice@example.com").await;
    let org_id = ctx.create_organization(&alice, "Acme").await;

    let response = ctx
        .send(
            "POST",
            &format!("/api/organizations/{}/switch", org_id),
            Some(&alice.token),
            None,
        )
        .await;

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["organization"]["id"], org_id.to_string());
    assert_eq!(response.body["organization"]["name"], "Acme");
    assert_eq!(response.body["role"], "admin");
    assert!(response.body["message"].as_str().unwrap().contains("Acme"));
}

#[tokio::test]
async fn test_switch_requires_membership() {
    let ctx = TestContext::new();
    let alice = ctx.register("alice@example.com").await;
    let mallory = ctx.register("mallory@example.com").await;
    let org_id = ctx.create_organization(&alice, "Acme").await;

    let response = ctx
        .send(
            "POST",
            &format!("/api/organizations/{}/switch", org_id),
            Some(&mallory.token),
            None,
        )
        .await;
    assert_eq!(response.status, StatusCode::FORBIDDEN);
    assert_eq!(response.body["code"], "FORBIDDEN");

    let response = ctx
        .send(
            "POST",
            &format!("/api/organizations/{}/switch", Uuid::new_v4()),
            Some(&alice.token),
            None,
        )
        .await;
    assert_eq!(response.status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_member_management() {
    let ctx = TestContext::new();
    let alice = ctx.register("alice@example.com").await;
    let bob = ctx.register("bob@example.com").await;
    let org_id = ctx.create_organization(&alice, "Acme").await;

    let added = ctx.add_member(&alice, org_id, &bob, "member").await;
    assert_eq!(added.status, StatusCode::CREATED);
    assert_eq!(added.body["role"], "member");

    let duplicate = ctx.add_member(&alice, org_id, &bob, "member").await;
    assert_eq!(duplicate.status, StatusCode::CONFLICT);

    // bob can read but not manage
    let members = ctx
        .send(
            "GET",
            &format!("/api/organizations/{}/members", org_id),
            Some(&bob.token),
            None,
        )
        .await;
    assert_eq!(members.status, StatusCode::OK);
    let emails: Vec<&str> = members
        .body
        .as_array()
        .unwrap()
        .iter()
        .map(|m| m["email"].as_str().unwrap())
        .collect();
    assert_eq!(emails, vec!["alice@example.com", "bob@example.com"]);

    let carol = ctx.register("carol@example.com").await;
    let forbidden = ctx.add_member(&bob, org_id, &carol, "member").await;
    assert_eq!(forbidden.status, StatusCode::FORBIDDEN);

    // bob now sees the organization in his list
    let listed = ctx
        .send("GET", "/api/organizations", Some(&bob.token), None)
        .await;
    assert_eq!(listed.body[0]["role"], "member");

    let removed = ctx
        .send(
            "DELETE",
            &format!("/api/organizations/{}/members/{}", org_id, bob.id),
            Some(&alice.token),
            None,
        )
        .await;
    assert_eq!(removed.status, StatusCode::NO_CONTENT);

    let gone = ctx
        .send(
            "GET",
            &format!("/api/organizations/{}", org_id),
            Some(&bob.token),
            None,
        )
        .await;
    assert_eq!(gone.status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_add_member_unknown_role_becomes_member() {
    let ctx = TestContext::new();
    let alice = ctx.register("alice@example.com").await;
    let bob = ctx.register("bob@example.com").await;
    let org_id = ctx.create_organization(&alice, "Acme").await;

    let added = ctx.add_member(&alice, org_id, &bob, "owner").await;

    assert_eq!(added.status, StatusCode::CREATED);
    assert_eq!(added.body["role"], "member");
}

#[tokio::test]
async fn test_add_member_unknown_email() {
    let ctx = TestContext::new();
    let alice = ctx.register("alice@example.com").await;
    let org_id = ctx.create_organization(&alice, "Acme").await;

    let response = ctx
        .send(
            "POST",
            &format!("/api/organizations/{}/members", org_id),
            Some(&alice.token),
            Some(json!({ "email": "ghost@example.com" })),
        )
        .await;

    assert_eq!(response.status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_last_admin_cannot_be_removed() {
    let ctx = TestContext::new();
    let alice = ctx.register("alice@example.com").await;
    let org_id = ctx.create_organization(&alice, "Acme").await;

    let response = ctx
        .send(
            "DELETE",
            &format!("/api/organizations/{}/members/{}", org_id, alice.id),
            Some(&alice.token),
            None,
        )
        .await;

    assert_eq!(response.status, StatusCode::CONFLICT);
}

#[tokio::test]
async fn test_deleted_admin_can_be_removed() {
    let ctx = TestContext::new();
    let alice = ctx.register("alice@example.com").await;
    let bob = ctx.register("bob@example.com").await;
    let org_id = ctx.create_organization(&alice, "Acme").await;

    let added = ctx.add_member(&alice, org_id, &bob, "admin").await;
    assert_eq!(added.status, StatusCode::CREATED);
    assert!(ctx.store.soft_delete_user(bob.id).await.unwrap());

    let removed = ctx
        .send(
            "DELETE",
            &format!("/api/organizations/{}/members/{}", org_id, bob.id),
            Some(&alice.token),
            None,
        )
        .await;
    assert_eq!(removed.status, StatusCode::NO_CONTENT);

    let last = ctx
        .send(
            "DELETE",
            &format!("/api/organizations/{}/members/{}", org_id, alice.id),
            Some(&alice.token),
            None,
        )
        .await;
    assert_eq!(last.status, StatusCode::CONFLICT);
    assert_eq!(last.body["error"], "Cannot remove the last admin of an organization");
}

#[tokio::test]
async fn test_remove_unknown_member_is_not_found() {
    let ctx = TestContext::new();
    let alice = ctx.register("alice@example.com").await;
    let org_id = ctx.create_organization(&alice, "Acme").await;

    let response = ctx
        .send(
            "DELETE",
            &format!("/api/organizations/{}/members/{}", org_id, Uuid::new_v4()),
            Some(&alice.token),
            None,
        )
        .await;

    assert_eq!(response.status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_delete_organization() {
    let ctx = TestContext::new();
    let alice = ctx.register("alice@example.com").await;
    let bob = ctx.register("bob@example.com").await;
    let org_id = ctx.create_organization(&alice, "Acme").await;
    ctx.add_member(&alice, org_id, &bob, "member").await;

    let uri = format!("/api/organizations/{}", org_id);

    let forbidden = ctx.send("DELETE", &uri, Some(&bob.token), None).await;
    assert_eq!(forbidden.status, StatusCode::FORBIDDEN);

    let deleted = ctx.send("DELETE", &uri, Some(&alice.token), None).await;
    assert_eq!(deleted.status, StatusCode::NO_CONTENT);

    let fetched = ctx.send("GET", &uri, Some(&alice.token), None).await;
    assert_eq!(fetched.status, StatusCode::NOT_FOUND);

    let listed = ctx
        .send("GET", "/api/organizations", Some(&alice.token), None)
        .await;
    assert_eq!(listed.body, json!([]));
}
