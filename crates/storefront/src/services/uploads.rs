//! Product image storage.
//!
//! Uploaded files are written to the configured upload directory as
//! `product_<unix-millis><ext>` and served back under `/images/`.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use axum::body::Bytes;
use chrono::Utc;
use thiserror::Error;
use tokio::io::AsyncWriteExt;
use url::Url;

/// Multipart field that carries product images.
pub const FIELD_NAME: &str = "product";

/// Maximum number of files accepted per request.
pub const MAX_FILES: usize = 10;

/// Errors that can occur while storing uploads.
#[derive(Debug, Error)]
pub enum UploadError {
    /// The request carried no files.
    #[error("No files uploaded")]
    NoFiles,

    /// The request carried more files than allowed.
    #[error("Too many files, at most {max} per upload")]
    TooManyFiles { max: usize },

    /// The multipart body could not be read.
    #[error("Invalid upload: {0}")]
    Multipart(String),

    /// Writing to the upload directory failed.
    #[error("storage error: {0}")]
    Io(#[from] std::io::Error),
}

/// One received file.
#[derive(Debug, Clone)]
pub struct UploadedFile {
    /// File name as sent by the client, used only for its extension.
    pub original_name: Option<String>,
    pub data: Bytes,
}

/// Writes images to disk and builds their public URLs.
#[derive(Debug, Clone)]
pub struct ImageStore {
    dir: PathBuf,
    base_url: Url,
}

impl ImageStore {
    /// Create a store rooted at `dir` whose files are public under `<base_url>/images/`.
    #[must_use]
    pub const fn new(dir: PathBuf, base_url: Url) -> Self {
        Self { dir, base_url }
    }

    /// Directory images are written to.
    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Store every file and return their public URLs in upload order.
    ///
    /// # Errors
    ///
    /// Returns `UploadError::NoFiles` or `UploadError::TooManyFiles` before
    /// anything is written, and `UploadError::Io` if a write fails.
    pub async fn save(&self, files: Vec<UploadedFile>) -> Result<Vec<String>, UploadError> {
        self.save_at(files, Utc::now().timestamp_millis()).await
    }

    async fn save_at(
        &self,
        files: Vec<UploadedFile>,
        millis: i64,
    ) -> Result<Vec<String>, UploadError> {
        check_count(files.len())?;
        tokio::fs::create_dir_all(&self.dir).await?;

        let mut urls = Vec::with_capacity(files.len());
        for file in files {
            let ext = extension(file.original_name.as_deref());
            let name = self.write_unique(millis, &ext, &file.data).await?;
            tracing::info!(file = %name, bytes = file.data.len(), "Image stored");
            urls.push(self.public_url(&name));
        }
        Ok(urls)
    }

    /// Write `data` under the first free name for `millis`.
    async fn write_unique(
        &self,
        millis: i64,
        ext: &str,
        data: &[u8],
    ) -> Result<String, UploadError> {
        let mut attempt = 0_u32;
        loop {
            let name = file_name(millis, attempt, ext);
            let opened = tokio::fs::OpenOptions::new()
                .write(true)
                .create_new(true)
                .open(self.dir.join(&name))
                .await;
            match opened {
                Ok(mut handle) => {
                    handle.write_all(data).await?;
                    handle.flush().await?;
                    return Ok(name);
                }
                Err(e) if e.kind() == ErrorKind::AlreadyExists => attempt += 1,
                Err(e) => return Err(e.into()),
            }
        }
    }

    /// Public URL for a stored file.
    #[must_use]
    pub fn public_url(&self, name: &str) -> String {
        format!(
            "{}/images/{name}",
            self.base_url.as_str().trim_end_matches('/')
        )
    }
}

/// Reject empty and oversized uploads.
///
/// # Errors
///
/// Returns `UploadError::NoFiles` for zero files and
/// `UploadError::TooManyFiles` above [`MAX_FILES`].
pub fn check_count(count: usize) -> Result<(), UploadError> {
    match count {
        0 => Err(UploadError::NoFiles),
        n if n > MAX_FILES => Err(UploadError::TooManyFiles { max: MAX_FILES }),
        _ => Ok(()),
    }
}

fn file_name(millis: i64, attempt: u32, ext: &str) -> String {
    if attempt == 0 {
        format!("{FIELD_NAME}_{millis}{ext}")
    } else {
        format!("{FIELD_NAME}_{millis}-{attempt}{ext}")
    }
}

/// Dotted, lowercased extension of `name`, or empty when it has none usable.
fn extension(name: Option<&str>) -> String {
    name.map(Path::new)
        .and_then(Path::extension)
        .and_then(|ext| ext.to_str())
        .filter(|ext| !ext.is_empty() && ext.chars().all(|c| c.is_ascii_alphanumeric()))
        .map(|ext| format!(".{}", ext.to_ascii_lowercase()))
        .unwrap_or_default()
}
