mod common;

use axum::http::StatusCode;
use common::test_app;
use serde_json::json;

#[tokio::test]
async fn share_upgrade_scenario() {
    let t = test_app().await;
    let (_, ada) = t.register("Ada").await;
    let (bob_id, bob) = t.register("Bob").await;

    let (status, body) = t
        .call(
            "POST",
            "/api/documents",
            Some(&ada),
            Some(json!({ "title": "Roadmap", "content": "<p>q3</p>", "isPublic": false })),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["success"], true);
    assert_eq!(body["message"], "Document created successfully");
    let id = body["data"]["id"].as_i64().unwrap();
    let doc = format!("/api/documents/{id}");

    let (status, body) = t.call("GET", &doc, None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["success"], false);
    assert_eq!(body["error"], "Authentication required to access this document");

    let (status, _) = t.call("GET", &doc, Some(&bob), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let share = format!("{doc}/share");
    let (status, _) = t
        .call("POST", &share, Some(&ada), Some(json!({ "userId": bob_id, "permission": "VIEW" })))
        .await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = t.call("GET", &doc, Some(&bob), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["content"], "<p>q3</p>");
    assert_eq!(body["data"]["access"]["basis"], "SHARE");
    assert_eq!(body["data"]["author"]["name"], "Ada");

    let edit = json!({ "content": "<p>q3 + q4</p>" });
    let (status, body) = t.call("PUT", &doc, Some(&bob), Some(edit.clone())).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["error"], "You do not have permission to edit this document");

    // userId may arrive as a string.
    let (status, _) = t
        .call(
            "POST",
            &share,
            Some(&ada),
            Some(json!({ "userId": bob_id.to_string(), "permission": "EDIT" })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = t.call("PUT", &doc, Some(&bob), Some(edit)).await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["data"]["content"], "<p>q3 + q4</p>");

    let (status, body) = t.call("GET", &format!("{doc}/versions"), Some(&bob), None).await;
    assert_eq!(status, StatusCode::OK);
    let versions = body["data"].as_array().unwrap();
    assert_eq!(versions.len(), 2);
    assert_eq!(versions[0]["version"], 2);
    assert_eq!(versions[0]["author_name"], "Bob");

    let first = versions[1]["id"].as_i64().unwrap();
    let (status, body) = t
        .call("GET", &format!("{doc}/versions/{first}"), Some(&ada), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["content"], "<p>q3</p>");

    // EDIT does not extend to deleting or managing shares.
    let (status, _) = t.call("DELETE", &doc, Some(&bob), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    let (status, _) = t
        .call("DELETE", &share, Some(&bob), Some(json!({ "userId": bob_id })))
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    // Two share calls, two notifications.
    let (_, body) = t.call("GET", "/api/users/notifications", Some(&bob), None).await;
    assert_eq!(body["pagination"]["total"], 2);
    assert_eq!(body["pagination"]["limit"], 20);
    assert_eq!(body["data"][0]["type"], "SHARE");
    assert_eq!(body["data"][0]["title"], "Document shared with you");
}

#[tokio::test]
async fn unshare_is_idempotent() {
    let t = test_app().await;
    let (_, ada) = t.register("Ada").await;
    let (bob_id, bob) = t.register("Bob").await;
    let (_, body) = t
        .call(
            "POST",
            "/api/documents",
            Some(&ada),
            Some(json!({ "title": "Plan", "content": "x" })),
        )
        .await;
    let id = body["data"]["id"].as_i64().unwrap();
    let share = format!("/api/documents/{id}/share");

    t.call("POST", &share, Some(&ada), Some(json!({ "userId": bob_id, "permission": "EDIT" })))
        .await;
    for _ in 0..2 {
        let (status, body) = t
            .call("DELETE", &share, Some(&ada), Some(json!({ "userId": bob_id })))
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["message"], "Share removed successfully");
    }
    let (status, _) = t
        .call("GET", &format!("/api/documents/{id}"), Some(&bob), None)
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn listing_is_paginated_and_searchable() {
    let t = test_app().await;
    let (_, ada) = t.register("Ada").await;
    for n in 0..12 {
        let (status, _) = t
            .call(
                "POST",
                "/api/documents",
                Some(&ada),
                Some(json!({ "title": format!("Note {n}"), "content": "body", "isPublic": true })),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED);
    }
    t.call(
        "POST",
        "/api/documents",
        Some(&ada),
        Some(json!({ "title": "Hidden", "content": "private body" })),
    )
    .await;

    let (_, body) = t.call("GET", "/api/documents?page=2&limit=5", None, None).await;
    assert_eq!(body["data"].as_array().unwrap().len(), 5);
    assert_eq!(body["pagination"], json!({ "page": 2, "limit": 5, "total": 12, "totalPages": 3 }));

    let (_, body) = t.call("GET", "/api/documents?limit=abc", Some(&ada), None).await;
    assert_eq!(body["pagination"]["limit"], 10);
    assert_eq!(body["pagination"]["total"], 13);

    let (_, body) = t.call("GET", "/api/documents?search=hidden", None, None).await;
    assert_eq!(body["pagination"]["total"], 0);
    let (_, body) = t
        .call("GET", "/api/documents?search=hidden", Some(&ada), None)
        .await;
    assert_eq!(body["data"][0]["title"], "Hidden");
    assert_eq!(body["data"][0]["author_name"], "Ada");
}

#[tokio::test]
async fn validation_and_not_found() {
    let t = test_app().await;
    let (_, ada) = t.register("Ada").await;

    let (status, body) = t
        .call("POST", "/api/documents", Some(&ada), Some(json!({ "title": " ", "content": "x" })))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Title is required");

    let (status, _) = t
        .call(
            "POST",
            "/api/documents",
            Some(&ada),
            Some(json!({ "title": "t", "content": "x", "mentions": [4242] })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = t.call("POST", "/api/documents", None, Some(json!({}))).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, body) = t.call("GET", "/api/documents/999", Some(&ada), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "Document not found");

    let (status, body) = t.call("GET", "/api/documents/abc", None, None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], false);

    let (_, body) = t
        .call("POST", "/api/documents", Some(&ada), Some(json!({ "title": "t", "content": "x" })))
        .await;
    let id = body["data"]["id"].as_i64().unwrap();
    let (status, body) = t
        .call("PUT", &format!("/api/documents/{id}"), Some(&ada), Some(json!({})))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "No fields to update");

    let (status, _) = t
        .call(
            "POST",
            &format!("/api/documents/{id}/share"),
            Some(&ada),
            Some(json!({ "userId": 1, "permission": "OWNER" })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn author_deletes_document() {
    let t = test_app().await;
    let (_, ada) = t.register("Ada").await;
    let (_, body) = t
        .call(
            "POST",
            "/api/documents",
            Some(&ada),
            Some(json!({ "title": "Old", "content": "x", "isPublic": true })),
        )
        .await;
    let doc = format!("/api/documents/{}", body["data"]["id"]);

    let (status, body) = t.call("DELETE", &doc, Some(&ada), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Document deleted successfully");
    let (status, _) = t.call("GET", &doc, None, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn deleted_editor_keeps_their_versions() {
    let t = test_app().await;
    let (_, ada) = t.register("Ada").await;
    let (bob_id, bob) = t.register("Bob").await;
    let (_, body) = t
        .call(
            "POST",
            "/api/documents",
            Some(&ada),
            Some(json!({ "title": "Shared", "content": "v1" })),
        )
        .await;
    let doc = format!("/api/documents/{}", body["data"]["id"]);
    t.call(
        "POST",
        &format!("{doc}/share"),
        Some(&ada),
        Some(json!({ "userId": bob_id, "permission": "EDIT" })),
    )
    .await;

    let (status, _) = t
        .call("PUT", &doc, Some(&bob), Some(json!({ "content": "v2 by bob" })))
        .await;
    assert_eq!(status, StatusCode::OK);
    let (status, _) = t.call("DELETE", "/api/auth/me", Some(&bob), None).await;
    assert_eq!(status, StatusCode::OK);
    let (status, _) = t
        .call("PUT", &doc, Some(&ada), Some(json!({ "content": "v3 by ada" })))
        .await;
    assert_eq!(status, StatusCode::OK);

    let (_, body) = t.call("GET", &format!("{doc}/versions"), Some(&ada), None).await;
    let versions = body["data"].as_array().unwrap();
    let numbers: Vec<i64> = versions.iter().map(|v| v["version"].as_i64().unwrap()).collect();
    assert_eq!(numbers, vec![3, 2, 1]);
    assert_eq!(versions[1]["content"], "v2 by bob");
    assert!(versions[1]["author_name"].is_null());
    assert_eq!(versions[0]["author_name"], "Ada");
}
