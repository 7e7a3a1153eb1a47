//! Image uploads to Cloudinary via signed multipart requests.

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use thiserror::Error;
use tracing::info;

use configs::StorageConfig;

use crate::errors::ServiceError;

#[derive(Debug, Error)]
pub enum UploadError {
    #[error("image storage not configured")]
    NotConfigured,
    #[error("{0}")]
    Invalid(String),
    #[error("image storage unreachable: {0}")]
    Transport(String),
    #[error("image storage rejected upload: {0}")]
    Rejected(String),
}

impl From<UploadError> for ServiceError {
    fn from(e: UploadError) -> Self {
        match e {
            UploadError::NotConfigured => ServiceError::Unavailable("Image storage is not configured".into()),
            UploadError::Invalid(m) => ServiceError::Validation(m),
            other => {
                tracing::warn!(error = %other, "image_upload_failed");
                ServiceError::Upstream("Failed to upload image".into())
            }
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct StoredImage {
    pub url: String,
    pub public_id: String,
}

/// Incoming file as read from the request.
#[derive(Clone, Debug)]
pub struct ImageUpload {
    pub file_name: String,
    pub content_type: Option<String>,
    pub bytes: Vec<u8>,
}

impl ImageUpload {
    /// Reject empty bodies, oversize files and non-image content types.
    pub fn validate(&self, max_bytes: usize) -> Result<(), UploadError> {
        if self.bytes.is_empty() {
            return Err(UploadError::Invalid("File is required".into()));
        }
        if self.bytes.len() > max_bytes {
            return Err(UploadError::Invalid(format!("File exceeds {} bytes", max_bytes)));
        }
        if let Some(ct) = &self.content_type {
            if !ct.starts_with("image/") {
                return Err(UploadError::Invalid("Only image uploads are allowed".into()));
            }
        }
        Ok(())
    }
}

#[async_trait]
pub trait ImageStore: Send + Sync {
    async fn upload(&self, image: ImageUpload) -> Result<StoredImage, UploadError>;
}

pub struct CloudinaryStore {
    client: reqwest::Client,
    cfg: StorageConfig,
}

#[derive(Deserialize)]
struct CloudinaryResponse {
    secure_url: Option<String>,
    url: Option<String>,
    public_id: String,
}

/// SHA-256 signature over the sorted upload parameters followed by the secret.
pub fn sign_params(params: &[(&str, &str)], api_secret: &str) -> String {
    let mut sorted: Vec<_> = params.to_vec();
    sorted.sort_by(|a, b| a.0.cmp(b.0));
    let joined = sorted.iter().map(|(k, v)| format!("{k}={v}")).collect::<Vec<_>>().join("&");
    let mut hasher = Sha256::new();
    hasher.update(joined.as_bytes());
    hasher.update(api_secret.as_bytes());
    hex::encode(hasher.finalize())
}

impl CloudinaryStore {
    pub fn new(cfg: StorageConfig) -> Result<Self, UploadError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(60))
            .build()
            .map_err(|e| UploadError::Transport(e.to_string()))?;
        Ok(Self { client, cfg })
    }

    pub fn max_upload_bytes(&self) -> usize { self.cfg.max_upload_bytes }
}

#[async_trait]
impl ImageStore for CloudinaryStore {
    async fn upload(&self, image: ImageUpload) -> Result<StoredImage, UploadError> {
        if !self.cfg.is_configured() {
            return Err(UploadError::NotConfigured);
        }
        image.validate(self.cfg.max_upload_bytes)?;

        let timestamp = chrono::Utc::now().timestamp().to_string();
        let signature = sign_params(&[("folder", self.cfg.folder.as_str()), ("timestamp", timestamp.as_str())], &self.cfg.api_secret);
        let mut part = reqwest::multipart::Part::bytes(image.bytes).file_name(image.file_name);
        if let Some(ct) = &image.content_type {
            part = part.mime_str(ct).map_err(|e| UploadError::Invalid(e.to_string()))?;
        }
        let form = reqwest::multipart::Form::new()
            .part("file", part)
            .text("api_key", self.cfg.api_key.clone())
            .text("timestamp", timestamp)
            .text("folder", self.cfg.folder.clone())
            .text("signature", signature)
            .text("signature_algorithm", "sha256");

        let url = format!("https://api.cloudinary.com/v1_1/{}/image/upload", self.cfg.cloud_name);
        let resp = self
            .client
            .post(&url)
            .multipart(form)
            .send()
            .await
            .map_err(|e| UploadError::Transport(e.to_string()))?;
        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(UploadError::Rejected(format!("{status}: {body}")));
        }
        let body: CloudinaryResponse = resp.json().await.map_err(|e| UploadError::Rejected(e.to_string()))?;
        let url = body
            .secure_url
            .or(body.url)
            .ok_or_else(|| UploadError::Rejected("response missing url".into()))?;
        info!(public_id = %body.public_id, "image_uploaded");
        Ok(StoredImage { url, public_id: body.public_id })
    }
}

pub mod mock {
    use super::*;

    /// Accepts everything and returns a predictable URL.
    #[derive(Default)]
    pub struct MemoryStore;

    #[async_trait]
    impl ImageStore for MemoryStore {
        async fn upload(&self, image: ImageUpload) -> Result<StoredImage, UploadError> {
            image.validate(usize::MAX)?;
            Ok(StoredImage {
                url: format!("https://images.test/{}", image.file_name),
                public_id: format!("test/{}", image.file_name),
            })
        }
    }
}
