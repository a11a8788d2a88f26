mod common;

use axum::http::StatusCode;
use common::spawn_app;
use serde_json::json;

#[tokio::test]
async fn test_listing_users_requires_authentication() {
    let app = spawn_app().await;

    let response = app.get("/api/users", None).await;
    assert_eq!(response.status, StatusCode::UNAUTHORIZED);
    assert_eq!(response.body["success"], false);

    let (_, token) = app.register("reader").await;
    let response = app.get("/api/users", Some(&token)).await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["pagination"]["total_items"], 2);
}

#[tokio::test]
async fn test_admin_create_then_read_roundtrip() {
    let app = spawn_app().await;
    let admin = app.admin_token().await;

    let response = app
        .post(
            "/api/users",
            Some(&admin),
            json!({
                "username": "carol",
                "email": "carol@example.com",
                "password": "secret99",
                "role": "admin",
                "is_active": true
            }),
        )
        .await;
    assert_eq!(response.status, StatusCode::CREATED);
    assert_eq!(response.body["message"], "User created successfully");

    let created = response.body["data"].clone();
    assert!(created["id"].as_i64().is_some());
    assert_eq!(created["username"], "carol");
    assert_eq!(created["role"], "admin");
    assert!(created["created_at"].is_string());
    assert!(created.get("password_hash").is_none());
    assert!(created.get("password").is_none());

    let response = app
        .get(&format!("/api/users/{}", created["id"]), Some(&admin))
        .await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["data"], created);
}

#[tokio::test]
async fn test_non_admin_cannot_create_users() {
    let app = spawn_app().await;
    let (_, token) = app.register("plain").await;

    let response = app
        .post(
            "/api/users",
            Some(&token),
            json!({"username": "someone", "email": "someone@example.com"}),
        )
        .await;
    assert_eq!(response.status, StatusCode::FORBIDDEN);
    assert_eq!(response.body["error"], "Forbidden");
}

#[tokio::test]
async fn test_duplicate_username_never_creates_second_row() {
    let app = spawn_app().await;
    let admin = app.admin_token().await;

    let body = json!({"username": "dup", "email": "dup@example.com"});
    let response = app.post("/api/users", Some(&admin), body).await;
    assert_eq!(response.status, StatusCode::CREATED);

    let response = app
        .post(
            "/api/users",
            Some(&admin),
            json!({"username": "dup", "email": "dup2@example.com"}),
        )
        .await;
    assert_eq!(response.status, StatusCode::CONFLICT);
    assert_eq!(response.body["message"], "Username already exists");

    let response = app.get("/api/users?search=dup", Some(&admin)).await;
    assert_eq!(response.body["pagination"]["total_items"], 1);
}

#[tokio::test]
async fn test_create_collects_all_violations() {
    let app = spawn_app().await;
    let admin = app.admin_token().await;

    let response = app
        .post(
            "/api/users",
            Some(&admin),
            json!({"username": "x", "email": "bad", "role": "root"}),
        )
        .await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert_eq!(
        response.body["messages"],
        json!([
            "Username must be at least 3 characters",
            "Invalid email format",
            "Role must be one of: user, admin"
        ])
    );
}

#[tokio::test]
async fn test_missing_user_is_not_found() {
    let app = spawn_app().await;
    let admin = app.admin_token().await;

    let response = app.get("/api/users/9999", Some(&admin)).await;
    assert_eq!(response.status, StatusCode::NOT_FOUND);
    assert_eq!(response.body["message"], "User with ID 9999 not found");

    let response = app
        .put("/api/users/9999", Some(&admin), json!({"email": "a@b.co"}))
        .await;
    assert_eq!(response.status, StatusCode::NOT_FOUND);

    let response = app.delete("/api/users/9999", Some(&admin)).await;
    assert_eq!(response.status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_self_update_rules() {
    let app = spawn_app().await;
    let (me, token) = app.register("selfish").await;
    let (other, _) = app.register("bystander").await;

    let response = app
        .put(
            &format!("/api/users/{me}"),
            Some(&token),
            json!({"email": "new@example.com"}),
        )
        .await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["data"]["email"], "new@example.com");
    assert_eq!(response.body["data"]["username"], "selfish");

    let response = app
        .put(
            &format!("/api/users/{other}"),
            Some(&token),
            json!({"email": "hijack@example.com"}),
        )
        .await;
    assert_eq!(response.status, StatusCode::FORBIDDEN);

    let response = app
        .put(
            &format!("/api/users/{me}"),
            Some(&token),
            json!({"role": "admin"}),
        )
        .await;
    assert_eq!(response.status, StatusCode::FORBIDDEN);
    assert_eq!(
        response.body["message"],
        "Only admins can change role or active status"
    );

    // New password works for login
    let response = app
        .put(
            &format!("/api/users/{me}"),
            Some(&token),
            json!({"password": "changed123"}),
        )
        .await;
    assert_eq!(response.status, StatusCode::OK);
    app.login("selfish", "changed123").await;
}

#[tokio::test]
async fn test_update_to_taken_email_conflicts() {
    let app = spawn_app().await;
    let (me, token) = app.register("first").await;
    app.register("second").await;

    let response = app
        .put(
            &format!("/api/users/{me}"),
            Some(&token),
            json!({"email": "second@example.com"}),
        )
        .await;
    assert_eq!(response.status, StatusCode::CONFLICT);
    assert_eq!(response.body["message"], "Email already exists");

    // Re-submitting one's own email is not a conflict
    let response = app
        .put(
            &format!("/api/users/{me}"),
            Some(&token),
            json!({"email": "first@example.com"}),
        )
        .await;
    assert_eq!(response.status, StatusCode::OK);
}

#[tokio::test]
async fn test_admin_can_change_role() {
    let app = spawn_app().await;
    let admin = app.admin_token().await;
    let (user_id, _) = app.register("promoted").await;

    let response = app
        .put(
            &format!("/api/users/{user_id}"),
            Some(&admin),
            json!({"role": "admin"}),
        )
        .await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["data"]["role"], "admin");

    let token = app.login("promoted", "pw123456").await;
    let response = app
        .post(
            "/api/users",
            Some(&token),
            json!({"username": "minion", "email": "minion@example.com"}),
        )
        .await;
    assert_eq!(response.status, StatusCode::CREATED);
}

#[tokio::test]
async fn test_empty_update_only_touches_updated_at() {
    let app = spawn_app().await;
    let (me, token) = app.register("idle").await;

    let before = app.get(&format!("/api/users/{me}"), Some(&token)).await.body["data"].clone();
    tokio::time::sleep(std::time::Duration::from_millis(5)).await;

    let response = app
        .put(&format!("/api/users/{me}"), Some(&token), json!({}))
        .await;
    assert_eq!(response.status, StatusCode::OK);

    let after = response.body["data"].clone();
    for field in ["id", "username", "email", "role", "is_active", "created_at"] {
        assert_eq!(before[field], after[field], "{field} changed");
    }
    assert!(after["updated_at"].as_str().unwrap() > before["updated_at"].as_str().unwrap());
}

#[tokio::test]
async fn test_delete_rules() {
    let app = spawn_app().await;
    let admin = app.admin_token().await;
    let (victim, token) = app.register("victim").await;

    let response = app.delete("/api/users/1", Some(&admin)).await;
    assert_eq!(response.status, StatusCode::FORBIDDEN);
    assert_eq!(response.body["message"], "You cannot delete your own account");

    let response = app.delete("/api/users/1", Some(&token)).await;
    assert_eq!(response.status, StatusCode::FORBIDDEN);

    let response = app
        .delete(&format!("/api/users/{victim}"), Some(&admin))
        .await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["message"], "User deleted successfully");

    let response = app
        .get(&format!("/api/users/{victim}"), Some(&admin))
        .await;
    assert_eq!(response.status, StatusCode::NOT_FOUND);

    // The deleted user's token no longer resolves
    let response = app.get("/api/auth/me", Some(&token)).await;
    assert_eq!(response.status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_list_filters_and_sorting() {
    let app = spawn_app().await;
    let admin = app.admin_token().await;

    for name in ["delta", "alpha", "charlie", "bravo"] {
        app.register(name).await;
    }

    let response = app
        .get(
            "/api/users?role=user&sort_by=username&sort_order=asc",
            Some(&admin),
        )
        .await;
    let names: Vec<&str> = response.body["data"]
        .as_array()
        .unwrap()
        .iter()
        .map(|u| u["username"].as_str().unwrap())
        .collect();
    assert_eq!(names, vec!["alpha", "bravo", "charlie", "delta"]);

    let response = app.get("/api/users?role=admin", Some(&admin)).await;
    assert_eq!(response.body["pagination"]["total_items"], 1);

    let response = app.get("/api/users?search=ALPHA", Some(&admin)).await;
    assert_eq!(response.body["pagination"]["total_items"], 1);
    assert_eq!(response.body["data"][0]["username"], "alpha");

    // Unparseable filters and unknown sort fields are ignored
    let response = app
        .get(
            "/api/users?is_active=maybe&sort_by=password_hash&page=abc",
            Some(&admin),
        )
        .await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["pagination"]["total_items"], 5);
    assert_eq!(response.body["pagination"]["page"], 1);
}
