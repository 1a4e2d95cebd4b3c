use crate::{db, record_document};
use anyhow::Result;
use sea_orm::DatabaseConnection;

async fn setup_test_db() -> Result<DatabaseConnection> {
    let db = db::connect("sqlite::memory:").await?;
    db::migrate(&db).await?;
    Ok(db)
}

#[tokio::test]
async fn test_first_write_creates_row() -> Result<()> {
    let db = setup_test_db().await?;
    assert!(record_document::find(&db, "users").await?.is_none());

    let v = record_document::compare_and_swap(&db, "users", 0, "{}".into()).await?;
    assert_eq!(v, Some(1));

    let row = record_document::find(&db, "users").await?.expect("row");
    assert_eq!(row.document, "{}");
    assert_eq!(row.version, 1);
    Ok(())
}

#[tokio::test]
async fn test_stale_version_is_rejected() -> Result<()> {
    let db = setup_test_db().await?;
    record_document::compare_and_swap(&db, "tickets", 0, "{\"a\":1}".into()).await?;
    let v2 = record_document::compare_and_swap(&db, "tickets", 1, "{\"a\":2}".into()).await?;
    assert_eq!(v2, Some(2));

    // a writer still holding version 1 loses
    let stale = record_document::compare_and_swap(&db, "tickets", 1, "{\"a\":3}".into()).await?;
    assert_eq!(stale, None);
    // and a second "first insert" loses too
    let dup = record_document::compare_and_swap(&db, "tickets", 0, "{}".into()).await?;
    assert_eq!(dup, None);

    let row = record_document::find(&db, "tickets").await?.expect("row");
    assert_eq!(row.document, "{\"a\":2}");
    Ok(())
}

#[tokio::test]
async fn test_overwrite_ignores_version() -> Result<()> {
    let db = setup_test_db().await?;
    record_document::compare_and_swap(&db, "files", 0, "{}".into()).await?;
    let v = record_document::overwrite(&db, "files", "{\"x\":{}}".into()).await?;
    assert_eq!(v, 2);
    let v = record_document::overwrite(&db, "messages", "{}".into()).await?;
    assert_eq!(v, 1);
    Ok(())
}
