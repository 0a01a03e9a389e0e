//! Local filesystem status adapter.

use embed_preflight_ports::{BoxFuture, PathKind, PathProbePort};
use embed_preflight_shared::{ErrorEnvelope, RequestContext, Result};
use std::path::PathBuf;

/// Path probe using async `lstat`.
#[derive(Debug, Clone, Copy, Default)]
pub struct LocalPathProbe;

impl LocalPathProbe {
    /// Build a local path probe.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

impl PathProbePort for LocalPathProbe {
    fn stat(&self, ctx: &RequestContext, path: PathBuf) -> BoxFuture<'_, Result<PathKind>> {
        let correlation_id = ctx.correlation_id().clone();
        Box::pin(async move {
            tracing::debug!(%correlation_id, path = %path.display(), "probing path");
            let metadata = tokio::fs::symlink_metadata(&path).await.map_err(|error| {
                ErrorEnvelope::from(error).with_metadata("path", path.to_string_lossy())
            })?;
            let file_type = metadata.file_type();
            let kind = if file_type.is_symlink() {
                PathKind::Symlink
            } else if file_type.is_dir() {
                PathKind::Directory
            } else if file_type.is_file() {
                PathKind::File
            } else {
                PathKind::Other
            };
            Ok(kind)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use embed_preflight_shared::ErrorCode;
    use std::fs;

    fn scratch_dir(name: &str) -> Result<PathBuf> {
        let root = std::env::temp_dir().join(format!(
            "embed_preflight_fs_{name}_{}",
            std::process::id()
        ));
        let _ = fs::remove_dir_all(&root);
        fs::create_dir_all(&root).map_err(ErrorEnvelope::from)?;
        Ok(root)
    }

    #[tokio::test]
    async fn reports_directories_and_files() -> Result<()> {
        let root = scratch_dir("kinds")?;
        let file = root.join("internal.db");
        fs::write(&file, "").map_err(ErrorEnvelope::from)?;
        let ctx = RequestContext::new_run();
        let probe = LocalPathProbe::new();

        assert_eq!(probe.stat(&ctx, root.clone()).await?, PathKind::Directory);
        assert_eq!(probe.stat(&ctx, file).await?, PathKind::File);

        let _ = fs::remove_dir_all(&root);
        Ok(())
    }

    #[tokio::test]
    async fn missing_path_is_not_found_with_path_metadata() -> Result<()> {
        let root = scratch_dir("missing")?;
        let missing = root.join("nope");
        let error = LocalPathProbe::new()
            .stat(&RequestContext::new_run(), missing.clone())
            .await
            .err();

        assert!(matches!(
            error,
            Some(ref envelope) if envelope.code == ErrorCode::not_found()
                && envelope.metadata.get("path").map(String::as_str)
                    == Some(missing.to_string_lossy().as_ref())
        ));
        let _ = fs::remove_dir_all(&root);
        Ok(())
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn symlinks_are_not_followed() -> Result<()> {
        let root = scratch_dir("symlink")?;
        let target = root.join("target");
        fs::create_dir_all(&target).map_err(ErrorEnvelope::from)?;
        let link = root.join("link");
        std::os::unix::fs::symlink(&target, &link).map_err(ErrorEnvelope::from)?;

        let kind = LocalPathProbe::new()
            .stat(&RequestContext::new_run(), link)
            .await?;
        assert_eq!(kind, PathKind::Symlink);

        let _ = fs::remove_dir_all(&root);
        Ok(())
    }
}
