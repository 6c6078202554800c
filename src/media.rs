//! Uploaded image storage.
//!
//! Images are written under `<media_root>/tasks/` and referred to by the
//! media-root-relative path (`tasks/<name>`), which is what the task record
//! stores and what `/media/` serves.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::io::{AsyncWrite, AsyncWriteExt};

use crate::task::IMAGE_UPLOAD_DIR;

#[derive(Debug, thiserror::Error)]
pub enum AssetError {
    #[error("failed to store image: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid asset reference: {0}")]
    InvalidReference(String),
}

/// Binary asset storage used for task images.
#[async_trait]
pub trait AssetStore: Send + Sync {
    /// Store `bytes` under a name derived from `file_name` and return the
    /// reference to record on the task.
    async fn save(&self, file_name: &str, bytes: &[u8]) -> Result<String, AssetError>;

    /// Delete a previously saved asset. Missing files are not an error.
    async fn remove(&self, reference: &str) -> Result<(), AssetError>;
}

/// Asset store backed by a directory on the local filesystem.
#[derive(Debug, Clone)]
pub struct FsAssetStore {
    root: PathBuf,
}

impl FsAssetStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn resolve(&self, reference: &str) -> Result<PathBuf, AssetError> {
        let rel = Path::new(reference);
        let safe = rel
            .components()
            .all(|c| matches!(c, std::path::Component::Normal(_)));
        if !safe || reference.is_empty() {
            return Err(AssetError::InvalidReference(reference.to_string()));
        }
        Ok(self.root.join(rel))
    }
}

/// Reduce an uploaded file name to a single safe path component.
///
/// Keeps ASCII letters, digits, `-`, `_` and `.`; spaces become `_`.
pub fn sanitize_file_name(name: &str) -> String {
    // Take only the filename portion (after any path separator)
    let filename = name.rsplit(['/', '\\']).next().unwrap_or(name).trim();
    let cleaned: String = filename
        .chars()
        .filter_map(|c| match c {
            ' ' => Some('_'),
            c if c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.') => Some(c),
            _ => None,
        })
        .collect();
    let cleaned = cleaned.trim_start_matches('.');
    if cleaned.is_empty() {
        "upload.bin".to_string()
    } else {
        cleaned.to_string()
    }
}

/// `name.ext` → `name_<suffix>.ext`
fn with_suffix(name: &str, suffix: &str) -> String {
    match name.rsplit_once('.') {
        Some((stem, ext)) if !stem.is_empty() => format!("{}_{}.{}", stem, suffix, ext),
        _ => format!("{}_{}", name, suffix),
    }
}

/// Write `bytes` into a file just claimed at `path`, deleting it again if
/// the write does not complete.
async fn fill_claimed<W>(mut file: W, path: &Path, bytes: &[u8]) -> Result<(), AssetError>
where
    W: AsyncWrite + Unpin,
{
    let written: std::io::Result<()> = async {
        file.write_all(bytes).await?;
        file.flush().await
    }
    .await;

    if let Err(e) = written {
        drop(file);
        if let Err(remove_err) = tokio::fs::remove_file(path).await {
            tracing::warn!(
                "Failed to remove partial image {}: {}",
                path.display(),
                remove_err
            );
        }
        return Err(e.into());
    }
    Ok(())
}

#[async_trait]
impl AssetStore for FsAssetStore {
    async fn save(&self, file_name: &str, bytes: &[u8]) -> Result<String, AssetError> {
        let dir = self.root.join(IMAGE_UPLOAD_DIR);
        tokio::fs::create_dir_all(&dir).await?;

        let base = sanitize_file_name(file_name);
        let mut name = base.clone();
        // create_new makes the name claim atomic; retry with a random suffix
        // while the name is taken.
        loop {
            let path = dir.join(&name);
            match tokio::fs::OpenOptions::new()
                .write(true)
                .create_new(true)
                .open(&path)
                .await
            {
                Ok(file) => {
                    fill_claimed(file, &path, bytes).await?;
                    tracing::debug!("Stored image {}", path.display());
                    return Ok(format!("{}/{}", IMAGE_UPLOAD_DIR, name));
                }
                Err(e) if e.kind() == ErrorKind::AlreadyExists => {
                    let suffix = uuid::Uuid::new_v4().simple().to_string();
                    name = with_suffix(&base, &suffix[..8]);
                }
                Err(e) => return Err(e.into()),
            }
        }
    }

    async fn remove(&self, reference: &str) -> Result<(), AssetError> {
        let path = self.resolve(reference)?;
        match tokio::fs::remove_file(&path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}
