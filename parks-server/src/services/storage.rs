//! Image storage for park and species uploads
//!
//! Files land in `{upload_dir}/{bucket}/{uuid}.{ext}` and are served back
//! under `{public_prefix}/{bucket}/{filename}`.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use once_cell::sync::Lazy;
use regex::Regex;
use tracing::{debug, info};

use crate::config::StorageConfig;

pub const ALLOWED_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "webp"];

/// Stored names are generated by us; anything else is refused.
static STORED_NAME_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[A-Za-z0-9][A-Za-z0-9_-]*\.(jpg|jpeg|png|webp)$").expect("valid regex")
});

#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("invalid file type, allowed types: {}", ALLOWED_EXTENSIONS.join(", "))]
    InvalidExtension,

    #[error("file must be an image")]
    NotAnImage,

    #[error("file exceeds the maximum size of {max} bytes")]
    TooLarge { max: usize },

    #[error("invalid stored filename '{0}'")]
    InvalidFilename(String),

    #[error("storage io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Upload destinations
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Bucket {
    Parks,
    Species,
}

impl Bucket {
    pub const ALL: [Bucket; 2] = [Bucket::Parks, Bucket::Species];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Parks => "parks",
            Self::Species => "species",
        }
    }
}

/// One uploaded file as received from the client
#[derive(Debug, Clone)]
pub struct Upload {
    pub original_name: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

impl Upload {
    /// Lower-cased extension after checking it is an accepted image type.
    fn validated_extension(&self, max_size: usize) -> Result<String, StorageError> {
        let ext = Path::new(&self.original_name)
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase)
            .filter(|e| ALLOWED_EXTENSIONS.contains(&e.as_str()))
            .ok_or(StorageError::InvalidExtension)?;
        if !self.content_type.starts_with("image/") {
            return Err(StorageError::NotAnImage);
        }
        if self.bytes.len() > max_size {
            return Err(StorageError::TooLarge { max: max_size });
        }
        Ok(ext)
    }
}

#[async_trait]
pub trait FileStorage: Send + Sync {
    /// Validate and persist an upload, returning the stored filename.
    async fn save(&self, bucket: Bucket, upload: Upload) -> Result<String, StorageError>;

    /// Remove a stored file. Missing files are not an error.
    async fn delete(&self, bucket: Bucket, filename: &str) -> Result<(), StorageError>;

    /// Public URL for a stored filename.
    fn url_for(&self, bucket: Bucket, filename: &str) -> String;

    /// Filename behind a URL produced by [`FileStorage::url_for`], if it is one.
    fn stored_filename(&self, bucket: Bucket, url: &str) -> Option<String> {
        let prefix = self.url_for(bucket, "");
        url.strip_prefix(&prefix)
            .filter(|name| STORED_NAME_RE.is_match(name))
            .map(str::to_owned)
    }
}

/// Local filesystem storage
#[derive(Debug, Clone)]
pub struct LocalStorage {
    root: PathBuf,
    public_prefix: String,
    max_file_size: usize,
}

impl LocalStorage {
    pub fn new(config: &StorageConfig) -> Self {
        Self {
            root: config.upload_dir.clone(),
            public_prefix: config.public_prefix.trim_end_matches('/').to_owned(),
            max_file_size: config.max_file_size,
        }
    }

    /// Create the bucket directories.
    pub async fn ensure_dirs(&self) -> Result<(), StorageError> {
        for bucket in Bucket::ALL {
            tokio::fs::create_dir_all(self.root.join(bucket.as_str())).await?;
        }
        Ok(())
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn path_for(&self, bucket: Bucket, filename: &str) -> Result<PathBuf, StorageError> {
        if !STORED_NAME_RE.is_match(filename) {
            return Err(StorageError::InvalidFilename(filename.to_owned()));
        }
        Ok(self.root.join(bucket.as_str()).join(filename))
    }
}

#[async_trait]
impl FileStorage for LocalStorage {
    async fn save(&self, bucket: Bucket, upload: Upload) -> Result<String, StorageError> {
        let ext = upload.validated_extension(self.max_file_size)?;
        let filename = format!("{}.{}", uuid::Uuid::new_v4(), ext);
        let path = self.path_for(bucket, &filename)?;

        if let Some(dir) = path.parent() {
            tokio::fs::create_dir_all(dir).await?;
        }
        if let Err(e) = tokio::fs::write(&path, &upload.bytes).await {
            let _ = tokio::fs::remove_file(&path).await;
            return Err(e.into());
        }

        info!(
            bucket = bucket.as_str(),
            filename = %filename,
            size = upload.bytes.len(),
            "Stored upload"
        );
        Ok(filename)
    }

    async fn delete(&self, bucket: Bucket, filename: &str) -> Result<(), StorageError> {
        let path = self.path_for(bucket, filename)?;
        match tokio::fs::remove_file(&path).await {
            Ok(()) => {
                debug!(bucket = bucket.as_str(), filename, "Deleted upload");
                Ok(())
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    fn url_for(&self, bucket: Bucket, filename: &str) -> String {
        format!("{}/{}/{}", self.public_prefix, bucket.as_str(), filename)
    }
}
