use std::path::{Path, PathBuf};

use image::ImageFormat;
use reqwest::Client;
use thiserror::Error;
use tracing::info;
use uuid::Uuid;

pub const STATIC_PREFIX: &str = "/static";

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("download of {url} failed: {reason}")]
    Download { url: String, reason: String },
    #[error("invalid file name: {0}")]
    InvalidFilename(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArtifactFolder {
    Uploads,
    Generated,
}

impl ArtifactFolder {
    pub fn dir_name(self) -> &'static str {
        match self {
            ArtifactFolder::Uploads => "uploads",
            ArtifactFolder::Generated => "generated_images",
        }
    }
}

pub fn sniff_format(bytes: &[u8]) -> ImageFormat {
    match image::guess_format(bytes) {
        Ok(format @ (ImageFormat::Png | ImageFormat::Jpeg | ImageFormat::WebP | ImageFormat::Gif)) => format,
        _ => ImageFormat::Png,
    }
}

pub struct ArtifactStore {
    root: PathBuf,
    client: Client,
}

impl ArtifactStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into(), client: Client::new() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub async fn ensure_folders(&self) -> Result<(), StorageError> {
        for folder in [ArtifactFolder::Uploads, ArtifactFolder::Generated] {
            let dir = self.root.join(folder.dir_name());
            tokio::fs::create_dir_all(&dir)
                .await
                .map_err(|source| StorageError::Io { path: dir, source })?;
        }
        Ok(())
    }

    // Writes `bytes` into `folder` and returns the URL it is served under.
    // Without a `filename` a fresh `<uuid>.<ext>` name is used.
    pub async fn materialize(
        &self,
        bytes: &[u8],
        folder: ArtifactFolder,
        filename: Option<&str>,
    ) -> Result<String, StorageError> {
        let filename = match filename {
            Some(name) => {
                if name.is_empty() || name.contains(['/', '\\']) || name.contains("..") {
                    return Err(StorageError::InvalidFilename(name.to_string()));
                }
                name.to_string()
            }
            None => format!("{}.{}", Uuid::new_v4(), sniff_format(bytes).extensions_str()[0]),
        };

        let dir = self.root.join(folder.dir_name());
        tokio::fs::create_dir_all(&dir)
            .await
            .map_err(|source| StorageError::Io { path: dir.clone(), source })?;

        let path = dir.join(&filename);
        tokio::fs::write(&path, bytes)
            .await
            .map_err(|source| StorageError::Io { path: path.clone(), source })?;

        info!("💾 Stored {} bytes at {}", bytes.len(), path.display());
        Ok(format!("{}/{}/{}", STATIC_PREFIX, folder.dir_name(), filename))
    }

    pub async fn materialize_from_url(
        &self,
        url: &str,
        folder: ArtifactFolder,
    ) -> Result<String, StorageError> {
        let download_err = |reason: String| StorageError::Download { url: url.to_string(), reason };

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| download_err(e.to_string()))?;
        let status = response.status();
        if !status.is_success() {
            return Err(download_err(format!("status {}", status)));
        }
        let bytes = response.bytes().await.map_err(|e| download_err(e.to_string()))?;

        self.materialize(&bytes, folder, None).await
    }
}
