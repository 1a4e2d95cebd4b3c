use std::net::SocketAddr;

use configs::AppConfig;
use reqwest::multipart::{Form, Part};
use reqwest::StatusCode as HttpStatusCode;
use serde_json::{json, Value};
use tempfile::TempDir;
use tokio::net::TcpListener;

struct TestApp {
    base_url: String,
    root: TempDir,
}

impl TestApp {
    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}

/// Full server over the JSON file backend in a fresh temp dir.
async fn start_server() -> anyhow::Result<TestApp> {
    let root = tempfile::tempdir()?;
    let mut cfg = AppConfig::default();
    cfg.auth.jwt_secret = "test-secret".into();
    cfg.storage.data_dir = root.path().join("data").display().to_string();
    cfg.storage.upload_dir = root.path().join("uploads").display().to_string();
    cfg.storage.max_upload_mb = 1;
    cfg.server.frontend_dir = root.path().join("frontend").display().to_string();
    std::fs::create_dir_all(root.path().join("frontend"))?;
    std::fs::write(root.path().join("frontend").join("index.html"), "<h1>EduLibrary</h1>")?;

    let app = server::build_app(&cfg).await?;
    let listener = TcpListener::bind((std::net::Ipv4Addr::LOCALHOST, 0)).await?;
    let addr: SocketAddr = listener.local_addr()?;
    let base_url = format!("http://{}:{}", addr.ip(), addr.port());

    tokio::spawn(async move {
        if let Err(e) = axum::serve(listener, app).await { eprintln!("server error: {}", e); }
    });

    Ok(TestApp { base_url, root })
}

fn client() -> reqwest::Client {
    reqwest::Client::builder()
        .cookie_store(true)
        .build()
        .expect("reqwest client")
}

async fn signed_in(app: &TestApp, username: &str) -> anyhow::Result<reqwest::Client> {
    let c = client();
    let res = c
        .post(app.url("/register"))
        .json(&json!({"username": username, "email": format!("{username}@example.com"), "password": "S3curePass!"}))
        .send()
        .await?;
    assert_eq!(res.status(), HttpStatusCode::OK);
    let res = c
        .post(app.url("/login"))
        .json(&json!({"login": username, "password": "S3curePass!"}))
        .send()
        .await?;
    assert_eq!(res.status(), HttpStatusCode::OK);
    Ok(c)
}

fn pdf_form(name: &str, category: &str) -> anyhow::Result<Form> {
    let part = Part::bytes(b"%PDF-1.4 sample".to_vec())
        .file_name(name.to_string())
        .mime_str("application/pdf")?;
    Ok(Form::new().part("pdf", part).text("category", category.to_string()).text("tags", "notes, exam"))
}

async fn upload(app: &TestApp, c: &reqwest::Client, name: &str) -> anyhow::Result<Value> {
    let res = c.post(app.url("/upload")).multipart(pdf_form(name, "Science")?).send().await?;
    assert_eq!(res.status(), HttpStatusCode::OK);
    Ok(res.json::<Value>().await?)
}

async fn listed_names(app: &TestApp) -> anyhow::Result<Vec<String>> {
    let body = client().get(app.url("/files")).send().await?.json::<Value>().await?;
    Ok(body["files"]
        .as_array()
        .map(|files| files.iter().filter_map(|f| f["filename"].as_str().map(str::to_string)).collect())
        .unwrap_or_default())
}

#[tokio::test]
async fn e2e_public_health_and_frontend() -> anyhow::Result<()> {
    let app = start_server().await?;
    let res = client().get(app.url("/health")).send().await?;
    assert_eq!(res.status(), HttpStatusCode::OK);
    let body = res.json::<Value>().await?;
    assert_eq!(body["status"], "ok");

    let res = client().get(app.url("/")).send().await?;
    assert_eq!(res.status(), HttpStatusCode::OK);
    assert!(res.text().await?.contains("EduLibrary"));

    let res = client().get(app.url("/api-docs/openapi.json")).send().await?;
    assert_eq!(res.status(), HttpStatusCode::OK);
    let doc = res.json::<Value>().await?;
    assert!(doc["paths"]["/upload"].is_object());
    Ok(())
}

#[tokio::test]
async fn e2e_owner_and_admin_file_scenario() -> anyhow::Result<()> {
    let app = start_server().await?;
    // First registrant becomes admin
    let a = signed_in(&app, "alice").await?;
    let b = signed_in(&app, "bob").await?;

    let first = upload(&app, &b, "doc.pdf").await?;
    assert_eq!(first["filename"], "doc.pdf");
    let second = upload(&app, &a, "doc.pdf").await?;
    assert_eq!(second["filename"], "doc_1.pdf");
    assert_eq!(second["original_name"], "doc.pdf");

    let mut names = listed_names(&app).await?;
    names.sort();
    assert_eq!(names, ["doc.pdf", "doc_1.pdf"]);

    // B may not delete A's file
    let res = b.delete(app.url("/delete/doc_1.pdf")).send().await?;
    assert_eq!(res.status(), HttpStatusCode::FORBIDDEN);
    assert!(res.json::<Value>().await?["error"].is_string());

    let res = a.delete(app.url("/delete/doc_1.pdf")).send().await?;
    assert_eq!(res.status(), HttpStatusCode::OK);
    assert_eq!(listed_names(&app).await?, ["doc.pdf"]);
    assert!(!app.root.path().join("uploads").join("doc_1.pdf").exists());

    // Admin may delete B's file too
    let res = a.delete(app.url("/delete/doc.pdf")).send().await?;
    assert_eq!(res.status(), HttpStatusCode::OK);
    assert!(listed_names(&app).await?.is_empty());

    let res = a.delete(app.url("/delete/doc.pdf")).send().await?;
    assert_eq!(res.status(), HttpStatusCode::NOT_FOUND);
    Ok(())
}

#[tokio::test]
async fn e2e_download_counts_and_preview_does_not() -> anyhow::Result<()> {
    let app = start_server().await?;
    let a = signed_in(&app, "alice").await?;
    upload(&app, &a, "notes.pdf").await?;

    let res = client().get(app.url("/download/notes.pdf")).send().await?;
    assert_eq!(res.status(), HttpStatusCode::UNAUTHORIZED);

    let res = a.get(app.url("/download/notes.pdf")).send().await?;
    assert_eq!(res.status(), HttpStatusCode::OK);
    let disposition = res
        .headers()
        .get("content-disposition")
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_string();
    assert!(disposition.starts_with("attachment"));
    assert_eq!(res.content_length(), Some(b"%PDF-1.4 sample".len() as u64));
    assert_eq!(res.bytes().await?.as_ref(), b"%PDF-1.4 sample");

    let res = client().get(app.url("/preview/notes.pdf")).send().await?;
    assert_eq!(res.status(), HttpStatusCode::OK);

    let body = client().get(app.url("/files")).send().await?.json::<Value>().await?;
    assert_eq!(body["files"][0]["download_count"], 1);
    assert_eq!(body["files"][0]["tags"], json!(["notes", "exam"]));
    Ok(())
}

#[tokio::test]
async fn e2e_rejects_non_pdf_and_oversized_uploads() -> anyhow::Result<()> {
    let app = start_server().await?;
    let a = signed_in(&app, "alice").await?;

    let res = a.post(app.url("/upload")).multipart(pdf_form("notes.txt", "Science")?).send().await?;
    assert_eq!(res.status(), HttpStatusCode::BAD_REQUEST);

    let big = Part::bytes(vec![b'x'; 1024 * 1024 + 10]).file_name("big.pdf").mime_str("application/pdf")?;
    let res = a.post(app.url("/upload")).multipart(Form::new().part("pdf", big)).send().await?;
    assert_eq!(res.status(), HttpStatusCode::BAD_REQUEST);

    let res = a.post(app.url("/upload")).multipart(Form::new().text("category", "Science")).send().await?;
    assert_eq!(res.status(), HttpStatusCode::BAD_REQUEST);

    // Not a multipart body at all
    let res = a.post(app.url("/upload")).json(&json!({"pdf": "doc.pdf"})).send().await?;
    assert_eq!(res.status(), HttpStatusCode::BAD_REQUEST);
    assert!(res.json::<Value>().await?["error"].is_string());
    assert!(listed_names(&app).await?.is_empty());
    Ok(())
}

#[tokio::test]
async fn e2e_backup_writes_collection_documents() -> anyhow::Result<()> {
    let app = start_server().await?;
    let a = signed_in(&app, "alice").await?;
    let b = signed_in(&app, "bob").await?;
    upload(&app, &b, "doc.pdf").await?;

    let res = b.post(app.url("/admin/backup")).send().await?;
    assert_eq!(res.status(), HttpStatusCode::FORBIDDEN);

    let res = a.post(app.url("/admin/backup")).send().await?;
    assert_eq!(res.status(), HttpStatusCode::OK);
    let report = res.json::<Value>().await?;
    let dir = std::path::PathBuf::from(report["path"].as_str().unwrap_or_default());
    assert!(dir.starts_with(app.root.path().join("data").join("backups")));
    let users: Value = serde_json::from_slice(&std::fs::read(dir.join("users.json"))?)?;
    assert_eq!(users.as_object().map(|m| m.len()), Some(2));
    assert!(dir.join("file_metadata.json").is_file());
    Ok(())
}
