//! Environment/runtime helpers
//!
//! Sanity checks to ensure expected directories exist at startup.

use tracing::warn;

/// Ensure expected directories exist; warn on missing optional ones.
///
/// `frontend_dir` is optional (static assets only). `data_dir` and `upload_dir`
/// are created when missing since every store and blob lives underneath them.
pub async fn ensure_env(frontend_dir: &str, data_dir: &str, upload_dir: &str) -> anyhow::Result<()> {
    if tokio::fs::metadata(frontend_dir).await.is_err() {
        warn!(%frontend_dir, "frontend assets directory not found; static assets may 404");
    }
    for dir in [data_dir, upload_dir] {
        tokio::fs::create_dir_all(dir)
            .await
            .map_err(|e| anyhow::anyhow!("cannot create {dir}: {e}"))?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::ensure_env;

    #[tokio::test]
    async fn creates_data_and_upload_dirs() -> anyhow::Result<()> {
        let root = tempfile::tempdir()?;
        let data = root.path().join("data");
        let uploads = root.path().join("uploads");
        let missing_frontend = root.path().join("frontend");

        ensure_env(
            missing_frontend.to_str().unwrap(),
            data.to_str().unwrap(),
            uploads.to_str().unwrap(),
        )
        .await?;

        assert!(data.is_dir());
        assert!(uploads.is_dir());
        assert!(!missing_frontend.exists());
        Ok(())
    }
}
