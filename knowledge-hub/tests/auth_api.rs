mod common;

use axum::http::StatusCode;
use common::test_app;
use knowledge_hub_core::auth::password::digest_reset_token;
use knowledge_hub_core::models::Role;
use serde_json::json;

#[tokio::test]
async fn register_login_me_logout() {
    let t = test_app().await;
    let (id, token) = t.register("Ada").await;

    let (status, body) = t.call("GET", "/api/auth/me", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["id"], id);
    assert_eq!(body["data"]["role"], "USER");
    assert!(body["data"].get("password_hash").is_none());

    let (status, body) = t
        .call(
            "POST",
            "/api/auth/login",
            None,
            Some(json!({ "email": "ADA@example.com", "password": "secret123" })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    let second = body["data"]["token"].as_str().unwrap().to_string();

    let (status, _) = t.call("POST", "/api/auth/logout", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    let (status, body) = t.call("GET", "/api/auth/me", Some(&token), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["success"], false);

    let (status, _) = t.call("GET", "/api/auth/me", Some(&second), None).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn bad_credentials_and_tokens() {
    let t = test_app().await;
    t.register("Ada").await;

    let (status, body) = t
        .call(
            "POST",
            "/api/auth/login",
            None,
            Some(json!({ "email": "ada@example.com", "password": "nope!!" })),
        )
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "Invalid credentials");

    let (status, body) = t.call("GET", "/api/auth/me", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "Access token required");

    let (status, body) = t.call("GET", "/api/auth/me", Some("garbage"), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "Invalid token");

    let (status, body) = t
        .call(
            "POST",
            "/api/auth/register",
            None,
            Some(json!({ "name": "A", "email": "a@example.com", "password": "secret123" })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Name must be at least 2 characters");

    let (status, _) = t
        .call("POST", "/api/auth/register", None, Some(json!("not an object")))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn invalid_token_on_public_route_is_anonymous() {
    let t = test_app().await;
    let (status, body) = t.call("GET", "/api/documents", Some("garbage"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["pagination"]["total"], 0);
}

#[tokio::test]
async fn password_reset() {
    let t = test_app().await;
    let (id, _) = t.register("Ada").await;

    let (status, unknown) = t
        .call("POST", "/api/auth/forgot-password", None, Some(json!({ "email": "x@example.com" })))
        .await;
    assert_eq!(status, StatusCode::OK);
    let (_, known) = t
        .call("POST", "/api/auth/forgot-password", None, Some(json!({ "email": "ada@example.com" })))
        .await;
    assert_eq!(unknown, known);

    // The link only goes to the log, so plant a known secret directly.
    t.state
        .store
        .insert_password_reset(
            id,
            &digest_reset_token("planted"),
            chrono::Utc::now() + chrono::Duration::minutes(5),
        )
        .await
        .unwrap();

    let (status, _) = t
        .call(
            "POST",
            "/api/auth/reset-password",
            None,
            Some(json!({ "token": "wrong", "password": "another1" })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    let (status, _) = t
        .call(
            "POST",
            "/api/auth/reset-password",
            None,
            Some(json!({ "token": "planted", "password": "another1" })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = t
        .call(
            "POST",
            "/api/auth/login",
            None,
            Some(json!({ "email": "ada@example.com", "password": "another1" })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn delete_account_invalidates_token() {
    let t = test_app().await;
    let (_, token) = t.register("Ada").await;
    let (status, _) = t.call("DELETE", "/api/auth/me", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    let (status, body) = t.call("GET", "/api/auth/me", Some(&token), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "User not found");
}

#[tokio::test]
async fn user_routes_respect_roles() {
    let t = test_app().await;
    let (ada_id, ada) = t.register("Ada").await;
    let (bob_id, bob) = t.register("Bob").await;

    let (status, body) = t.call("GET", "/api/users", Some(&ada), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["error"], "Insufficient permissions");
    let (status, _) = t
        .call("GET", &format!("/api/users/{bob_id}/documents"), Some(&ada), None)
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    t.state.store.set_user_role(ada_id, Role::Admin).await.unwrap();
    let (status, body) = t.call("GET", "/api/users", Some(&ada), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"].as_array().unwrap().len(), 2);

    let (status, body) = t
        .call(
            "PUT",
            &format!("/api/users/{bob_id}/role"),
            Some(&ada),
            Some(json!({ "role": "ADMIN" })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["role"], "ADMIN");

    let (_, body) = t.call("GET", "/api/users/search?query=b", None, None).await;
    assert_eq!(body["data"], json!([]));
    let (_, body) = t.call("GET", "/api/users/search?query=bo", None, None).await;
    assert_eq!(body["data"][0]["name"], "Bob");

    let (status, body) = t
        .call("PUT", "/api/users/profile", Some(&bob), Some(json!({ "name": "Robert" })))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["name"], "Robert");
    assert_eq!(body["message"], "Profile updated successfully");

    let (status, body) = t
        .call("GET", &format!("/api/users/{bob_id}/mentions"), Some(&bob), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["pagination"]["total"], 0);

    let (status, body) = t
        .call("PUT", "/api/users/notifications/77/read", Some(&bob), None)
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "Notification not found");
    let (status, _) = t
        .call("PUT", "/api/users/notifications/read-all", Some(&bob), None)
        .await;
    assert_eq!(status, StatusCode::OK);
}
