/// Integration tests for user signup, login, lookup and the token gate

mod common;

use axum::http::StatusCode;
use common::TestContext;
use restaurant_shared::{
    auth::password::INCORRECT_CREDENTIALS, models::user::User, store::RequestScope,
};
use serde_json::json;
use uuid::Uuid;

fn signup_body(email: &str, phone: &str) -> serde_json::Value {
    json!({
        "first_name": "Ana",
        "last_name": "Lopez",
        "email": email,
        "password": "Waiter#2024",
        "phone": phone
    })
}

#[tokio::test]
async fn test_signup_creates_user_and_issues_tokens() {
    let ctx = TestContext::new().await;

    let response = ctx
        .post_public("/users/signup", signup_body("ana@bistro.io", "+1-555-0100"))
        .await;
    assert_eq!(response.status, StatusCode::CREATED);

    let body = response.json();
    let user = &body["user"];
    assert_eq!(user["email"], "ana@bistro.io");
    assert!(user.get("password").is_none());

    // Public id is the hex of the internal id
    let internal: Uuid = user["_id"].as_str().unwrap().parse().unwrap();
    assert_eq!(user["user_id"], internal.simple().to_string());

    let claims = ctx
        .state
        .tokens
        .validate_token(body["token"].as_str().unwrap())
        .unwrap();
    assert_eq!(claims.uid, user["user_id"].as_str().unwrap());
    assert_eq!(claims.first_name, "Ana");
    assert!(ctx
        .state
        .tokens
        .validate_refresh_token(body["refresh_token"].as_str().unwrap())
        .is_ok());

    let stored = User::find_by_email(&ctx.state.users, &RequestScope::default(), "ana@bistro.io")
        .await
        .unwrap()
        .unwrap();
    assert!(stored.password.starts_with("$argon2id$"));
    assert_eq!(stored.token.as_deref(), body["token"].as_str());
}

#[tokio::test]
async fn test_signup_rejects_duplicate_email() {
    let ctx = TestContext::new().await;

    let mut body = signup_body(&ctx.user.email, "+1-555-9999");
    body["first_name"] = json!("Someone");
    body["last_name"] = json!("Else");

    let response = ctx.post_public("/users/signup", body).await;
    assert_eq!(response.status, StatusCode::CONFLICT);
    assert_eq!(response.json()["error"], "conflict");
    assert_eq!(ctx.store.len("users").await, 1);
}

#[tokio::test]
async fn test_signup_rejects_duplicate_phone() {
    let ctx = TestContext::new().await;

    let response = ctx
        .post_public("/users/signup", signup_body("fresh@bistro.io", &ctx.user.phone))
        .await;
    assert_eq!(response.status, StatusCode::CONFLICT);
    assert_eq!(ctx.store.len("users").await, 1);
}

#[tokio::test]
async fn test_signup_validation_short_circuits() {
    let ctx = TestContext::new().await;

    let response = ctx
        .post_public("/users/signup", signup_body("not-an-email", "+1-555-0100"))
        .await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);

    let body = response.json();
    assert_eq!(body["error"], "validation_error");
    assert_eq!(body["details"][0]["field"], "email");

    let mut weak = signup_body("ana@bistro.io", "+1-555-0100");
    weak["password"] = json!("password1");
    let response = ctx.post_public("/users/signup", weak).await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert_eq!(response.json()["details"][0]["field"], "password");

    assert_eq!(ctx.store.len("users").await, 1);
}

#[tokio::test]
async fn test_signup_malformed_body_is_bad_request() {
    let ctx = TestContext::new().await;

    let response = ctx
        .send(
            "POST",
            "/users/signup",
            None,
            Some(axum::body::Body::from("{\"email\": ")),
        )
        .await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert_eq!(response.json()["error"], "bad_request");
    assert_eq!(ctx.store.len("users").await, 1);
}

#[tokio::test]
async fn test_login_issues_and_persists_fresh_pair() {
    let ctx = TestContext::new().await;

    let signup = ctx
        .post_public("/users/signup", signup_body("ana@bistro.io", "+1-555-0100"))
        .await;
    assert_eq!(signup.status, StatusCode::CREATED);
    let user_id = signup.json()["user"]["user_id"].as_str().unwrap().to_string();

    // iat has one-second resolution
    tokio::time::sleep(std::time::Duration::from_millis(1100)).await;

    let response = ctx
        .post_public(
            "/users/login",
            json!({ "email": "ana@bistro.io", "password": "Waiter#2024" }),
        )
        .await;
    assert_eq!(response.status, StatusCode::OK);

    let body = response.json();
    assert_eq!(body["user"]["user_id"], user_id);
    assert_ne!(body["token"], signup.json()["token"]);

    let stored = User::find_by_user_id(&ctx.state.users, &RequestScope::default(), &user_id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(stored.token.as_deref(), body["token"].as_str());
    assert_eq!(stored.refresh_token.as_deref(), body["refresh_token"].as_str());

    // Response carries the same updated_at that was stored with the pair
    assert_ne!(body["user"]["updated_at"], signup.json()["user"]["updated_at"]);
    assert_eq!(body["user"]["updated_at"], serde_json::json!(stored.updated_at));

    // The new token opens protected routes
    let me = ctx
        .send(
            "GET",
            &format!("/users/{}", user_id),
            body["token"].as_str(),
            None,
        )
        .await;
    assert_eq!(me.status, StatusCode::OK);
}

#[tokio::test]
async fn test_login_failures_share_one_message() {
    let ctx = TestContext::new().await;

    ctx.post_public("/users/signup", signup_body("ana@bistro.io", "+1-555-0100"))
        .await;

    let wrong_password = ctx
        .post_public(
            "/users/login",
            json!({ "email": "ana@bistro.io", "password": "Waiter#2025" }),
        )
        .await;
    let unknown_email = ctx
        .post_public(
            "/users/login",
            json!({ "email": "nobody@bistro.io", "password": "Waiter#2024" }),
        )
        .await;

    assert_eq!(wrong_password.status, StatusCode::UNAUTHORIZED);
    assert_eq!(unknown_email.status, StatusCode::UNAUTHORIZED);
    assert_eq!(wrong_password.json()["message"], INCORRECT_CREDENTIALS);
    assert_eq!(wrong_password.json(), unknown_email.json());
}

#[tokio::test]
async fn test_protected_route_without_token_is_unauthorized() {
    let ctx = TestContext::new().await;

    let response = ctx.send("GET", "/users", None, None).await;
    assert_eq!(response.status, StatusCode::UNAUTHORIZED);
    assert!(response.body.is_empty());
}

#[tokio::test]
async fn test_tampered_token_is_forbidden() {
    let ctx = TestContext::new().await;

    let (unsigned, signature) = ctx.token.rsplit_once('.').unwrap();
    let flipped = if signature.starts_with('A') { 'B' } else { 'A' };
    let tampered = format!("{}.{}{}", unsigned, flipped, &signature[1..]);

    let response = ctx.send("GET", "/users", Some(&tampered), None).await;
    assert_eq!(response.status, StatusCode::FORBIDDEN);

    let body = response.json();
    assert_eq!(body["error"], "forbidden");
    assert!(!body["message"].as_str().unwrap().contains("expired"));
}

#[tokio::test]
async fn test_expired_token_is_forbidden_with_expired_reason() {
    let ctx = TestContext::new().await;

    let expired = ctx
        .token_service(chrono::Duration::seconds(-60))
        .issue_token_pair(
            &ctx.user.email,
            &ctx.user.first_name,
            &ctx.user.last_name,
            &ctx.user.user_id,
        )
        .unwrap()
        .token;

    let response = ctx.send("GET", "/users", Some(&expired), None).await;
    assert_eq!(response.status, StatusCode::FORBIDDEN);
    assert!(response.json()["message"]
        .as_str()
        .unwrap()
        .contains("expired"));
}

#[tokio::test]
async fn test_list_users_paginates_with_true_total() {
    let ctx = TestContext::new().await;
    ctx.seed_users(11).await;

    let response = ctx.get("/users?page=2&recordsPerPage=5").await;
    assert_eq!(response.status, StatusCode::OK);

    let body = response.json();
    assert_eq!(body["total_count"], 12);
    assert_eq!(body["page"], 2);
    assert_eq!(body["records_per_page"], 5);

    let items = body["items"].as_array().unwrap();
    assert_eq!(items.len(), 5);
    // Host user is first, so offset 5 lands on the fifth seeded user
    assert_eq!(items[0]["email"], "staff4@bistro.io");
    assert!(items.iter().all(|u| u.get("password").is_none()));
}

#[tokio::test]
async fn test_list_users_bad_params_fall_back_to_defaults() {
    let ctx = TestContext::new().await;
    ctx.seed_users(14).await;

    let response = ctx.get("/users?page=abc&recordsPerPage=-2").await;
    assert_eq!(response.status, StatusCode::OK);

    let body = response.json();
    assert_eq!(body["page"], 1);
    assert_eq!(body["records_per_page"], 10);
    assert_eq!(body["items"].as_array().unwrap().len(), 10);
    assert_eq!(body["total_count"], 15);
}

#[tokio::test]
async fn test_get_user_by_public_id() {
    let ctx = TestContext::new().await;

    let response = ctx.get(&format!("/users/{}", ctx.user.user_id)).await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.json()["email"], ctx.user.email);

    // Internal id is not a lookup key
    let response = ctx.get(&format!("/users/{}", ctx.user.id)).await;
    assert_eq!(response.status, StatusCode::NOT_FOUND);
    assert_eq!(response.json()["message"], "User not found");
}
