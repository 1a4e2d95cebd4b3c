use axum::body::{to_bytes, Body};
use axum::http::{header, Request, StatusCode};
use axum::response::Response;
use axum::Router;
use configs::AppConfig;
use serde_json::{json, Value};
use service::storage::Stores;
use tempfile::TempDir;
use tower::Service;

use server::routes;
use server::state::AppState;

fn cors() -> tower_http::cors::CorsLayer { tower_http::cors::CorsLayer::very_permissive() }

/// Router over in-memory stores; uploads and backups land in a temp dir.
fn build_app() -> anyhow::Result<(Router, TempDir)> {
    let dir = tempfile::tempdir()?;
    let mut cfg = AppConfig::default();
    cfg.auth.jwt_secret = "test-secret".into();
    cfg.storage.data_dir = dir.path().join("data").display().to_string();
    cfg.storage.upload_dir = dir.path().join("uploads").display().to_string();
    cfg.server.public_base_url = "http://library.test".into();
    let frontend = dir.path().join("frontend").display().to_string();
    let state = AppState::new(Stores::in_memory(), &cfg);
    Ok((routes::build_router(state, cors(), &frontend), dir))
}

fn post_json(uri: &str, body: Value, cookie: Option<&str>) -> anyhow::Result<Request<Body>> {
    let mut req = Request::builder().method("POST").uri(uri).header("content-type", "application/json");
    if let Some(c) = cookie {
        req = req.header(header::COOKIE, c);
    }
    Ok(req.body(Body::from(serde_json::to_vec(&body)?))?)
}

fn get(uri: &str, cookie: Option<&str>) -> anyhow::Result<Request<Body>> {
    let mut req = Request::builder().method("GET").uri(uri);
    if let Some(c) = cookie {
        req = req.header(header::COOKIE, c);
    }
    Ok(req.body(Body::empty())?)
}

async fn body_json(resp: Response) -> anyhow::Result<Value> {
    let bytes = to_bytes(resp.into_body(), usize::MAX).await?;
    Ok(serde_json::from_slice(&bytes)?)
}

/// `auth_token=<jwt>` taken from the login response.
fn session_from(resp: &Response) -> Option<String> {
    resp.headers()
        .get_all(header::SET_COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .find(|v| v.starts_with("auth_token="))
        .and_then(|v| v.split(';').next())
        .map(str::to_string)
}

async fn register_and_login(app: &mut Router, username: &str) -> anyhow::Result<String> {
    let email = format!("{username}@example.com");
    let resp = app
        .call(post_json("/register", json!({"username": username, "email": email, "password": "S3curePass!"}), None)?)
        .await?;
    assert_eq!(resp.status(), StatusCode::OK);
    let resp = app
        .call(post_json("/login", json!({"login": username, "password": "S3curePass!"}), None)?)
        .await?;
    assert_eq!(resp.status(), StatusCode::OK);
    session_from(&resp).ok_or_else(|| anyhow::anyhow!("login did not set auth_token"))
}

#[tokio::test]
async fn test_health_and_metrics_are_public() -> anyhow::Result<()> {
    let (mut app, _dir) = build_app()?;
    let resp = app.call(get("/health", None)?).await?;
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(body_json(resp).await?["status"], "ok");

    let resp = app.call(get("/metrics", None)?).await?;
    assert_eq!(resp.status(), StatusCode::OK);
    let text = to_bytes(resp.into_body(), usize::MAX).await?;
    assert!(String::from_utf8_lossy(&text).contains("edulib_http_requests_total"));
    Ok(())
}

#[tokio::test]
async fn test_register_and_login_flow() -> anyhow::Result<()> {
    let (mut app, _dir) = build_app()?;

    let resp = app
        .call(post_json("/register", json!({"username": "ada", "email": "ada@example.com", "password": "S3curePass!"}), None)?)
        .await?;
    assert_eq!(resp.status(), StatusCode::OK);
    let body = body_json(resp).await?;
    assert_eq!(body["user"]["username"], "ada");
    assert_eq!(body["user"]["is_admin"], true);
    assert!(body["user"].get("password_hash").is_none());

    // Login by email, cookie must be HttpOnly
    let resp = app
        .call(post_json("/login", json!({"login": "ada@example.com", "password": "S3curePass!"}), None)?)
        .await?;
    assert_eq!(resp.status(), StatusCode::OK);
    let raw = resp
        .headers()
        .get(header::SET_COOKIE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_string();
    assert!(raw.starts_with("auth_token="));
    assert!(raw.contains("HttpOnly"));
    let cookie = session_from(&resp).unwrap_or_default();

    let resp = app.call(get("/user-info", Some(&cookie))?).await?;
    let body = body_json(resp).await?;
    assert_eq!(body["logged_in"], true);
    assert_eq!(body["user"]["username"], "ada");
    Ok(())
}

#[tokio::test]
async fn test_duplicate_and_weak_registrations_rejected() -> anyhow::Result<()> {
    let (mut app, _dir) = build_app()?;
    register_and_login(&mut app, "ada").await?;

    let resp = app
        .call(post_json("/register", json!({"username": "ADA", "email": "other@example.com", "password": "S3curePass!"}), None)?)
        .await?;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    assert!(body_json(resp).await?["error"].is_string());

    let resp = app
        .call(post_json("/register", json!({"username": "bob", "email": "bob@example.com", "password": "short"}), None)?)
        .await?;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    Ok(())
}

#[tokio::test]
async fn test_login_wrong_password() -> anyhow::Result<()> {
    let (mut app, _dir) = build_app()?;
    register_and_login(&mut app, "ada").await?;

    let resp = app
        .call(post_json("/login", json!({"login": "ada", "password": "wrong-password"}), None)?)
        .await?;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    assert!(session_from(&resp).is_none());
    Ok(())
}

#[tokio::test]
async fn test_session_routes_require_cookie() -> anyhow::Result<()> {
    let (mut app, _dir) = build_app()?;

    let resp = app.call(get("/user-info", None)?).await?;
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(body_json(resp).await?["logged_in"], false);

    let resp = app.call(get("/messages/inbox", None)?).await?;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    assert!(body_json(resp).await?["error"].is_string());

    let resp = app.call(get("/support/tickets", Some("auth_token=not-a-jwt"))?).await?;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);

    let resp = app.call(post_json("/logout", json!({}), None)?).await?;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    Ok(())
}

#[tokio::test]
async fn test_admin_routes_gate_non_admins() -> anyhow::Result<()> {
    let (mut app, _dir) = build_app()?;
    let admin = register_and_login(&mut app, "ada").await?;
    let member = register_and_login(&mut app, "bob").await?;

    let resp = app.call(get("/admin/users", Some(&member))?).await?;
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);
    let resp = app.call(get("/analytics", Some(&member))?).await?;
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);

    let resp = app.call(get("/admin/users", Some(&admin))?).await?;
    assert_eq!(resp.status(), StatusCode::OK);
    let users = body_json(resp).await?;
    assert_eq!(users["users"].as_array().map(Vec::len), Some(2));

    let resp = app.call(get("/analytics", Some(&admin))?).await?;
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(body_json(resp).await?["total_users"], 2);
    Ok(())
}

#[tokio::test]
async fn test_deactivated_session_is_refused() -> anyhow::Result<()> {
    let (mut app, _dir) = build_app()?;
    let admin = register_and_login(&mut app, "ada").await?;
    let member = register_and_login(&mut app, "bob").await?;

    let resp = app.call(get("/admin/users", Some(&admin))?).await?;
    let users = body_json(resp).await?;
    let bob_id = users["users"]
        .as_array()
        .and_then(|list| list.iter().find(|u| u["username"] == "bob"))
        .and_then(|u| u["id"].as_str())
        .unwrap_or_default()
        .to_string();

    let resp = app
        .call(post_json(&format!("/admin/users/{bob_id}/toggle-status"), json!({}), Some(&admin))?)
        .await?;
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(body_json(resp).await?["is_active"], false);

    let resp = app.call(get("/messages/inbox", Some(&member))?).await?;
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);
    Ok(())
}

#[tokio::test]
async fn test_support_and_messages_round() -> anyhow::Result<()> {
    let (mut app, _dir) = build_app()?;
    let admin = register_and_login(&mut app, "ada").await?;
    let member = register_and_login(&mut app, "bob").await?;

    let resp = app
        .call(post_json("/support/tickets", json!({"title": "Broken link", "description": "404 on preview"}), Some(&member))?)
        .await?;
    assert_eq!(resp.status(), StatusCode::OK);
    let ticket = body_json(resp).await?;
    assert_eq!(ticket["id"], 1);
    assert_eq!(ticket["status"], "open");

    let resp = app
        .call(post_json("/admin/tickets/1/respond", json!({"response": "fixed"}), Some(&admin))?)
        .await?;
    assert_eq!(body_json(resp).await?["status"], "resolved");

    let resp = app
        .call(post_json("/messages/send", json!({"recipient": "ada", "subject": "hi", "body": "thanks"}), Some(&member))?)
        .await?;
    assert_eq!(resp.status(), StatusCode::OK);
    let resp = app.call(get("/messages/inbox", Some(&admin))?).await?;
    let inbox = body_json(resp).await?;
    assert_eq!(inbox["unread"], 1);
    assert_eq!(inbox["messages"][0]["body"], "thanks");

    let resp = app
        .call(post_json("/messages/send", json!({"recipient": "nobody", "body": "x"}), Some(&member))?)
        .await?;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    Ok(())
}

#[tokio::test]
async fn test_invite_link_uses_public_base_url() -> anyhow::Result<()> {
    let (mut app, _dir) = build_app()?;
    let member = register_and_login(&mut app, "ada").await?;

    let resp = app
        .call(post_json("/send-invite", json!({"email": "friend@example.com"}), Some(&member))?)
        .await?;
    assert_eq!(resp.status(), StatusCode::OK);
    let body = body_json(resp).await?;
    let link = body["invite_link"].as_str().unwrap_or_default();
    assert!(link.starts_with("http://library.test/?invite="));
    assert!(link.ends_with("&from=ada"));

    let resp = app
        .call(post_json("/send-invite", json!({"email": ""}), Some(&member))?)
        .await?;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    Ok(())
}

#[tokio::test]
async fn test_login_form_sends_username_key() -> anyhow::Result<()> {
    let (mut app, _dir) = build_app()?;
    register_and_login(&mut app, "ada").await?;

    for login in ["ada", "ada@example.com"] {
        let resp = app
            .call(post_json("/login", json!({"username": login, "password": "S3curePass!"}), None)?)
            .await?;
        assert_eq!(resp.status(), StatusCode::OK, "login as {login}");
        assert!(session_from(&resp).is_some());
    }
    Ok(())
}

async fn assert_bad_request(app: &mut Router, req: Request<Body>) -> anyhow::Result<()> {
    let uri = req.uri().to_string();
    let resp = app.call(req).await?;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST, "{uri}");
    let body = body_json(resp).await?;
    assert!(body["error"].is_string(), "{uri}: {body}");
    Ok(())
}

#[tokio::test]
async fn test_undecodable_requests_are_json_400s() -> anyhow::Result<()> {
    let (mut app, _dir) = build_app()?;

    assert_bad_request(&mut app, post_json("/register", json!({"username": "ada"}), None)?).await?;
    assert_bad_request(&mut app, post_json("/login", json!({}), None)?).await?;

    let raw = Request::builder()
        .method("POST")
        .uri("/register")
        .header("content-type", "application/json")
        .body(Body::from("{not json"))?;
    assert_bad_request(&mut app, raw).await?;

    let cookie = register_and_login(&mut app, "ada").await?;
    assert_bad_request(&mut app, post_json("/support/tickets", json!({"description": "no title"}), Some(&cookie))?).await?;
    assert_bad_request(&mut app, get("/support/tickets/abc", Some(&cookie))?).await?;
    assert_bad_request(&mut app, post_json("/messages/abc/read", json!({}), Some(&cookie))?).await?;
    assert_bad_request(&mut app, get("/files?featured=maybe", None)?).await?;
    Ok(())
}
