//! File storage collaborators used by the attachment resolver.
//!
//! [`DialFileStorage`] talks to the gateway's own file API (bucket discovery,
//! uploads, authenticated downloads); [`download_as_base64`] is the direct,
//! unauthenticated fetch used for external URLs. Failures are never retried
//! here; they surface as upstream-unavailable conditions.

use std::time::Duration;

use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use reqwest::multipart::{Form, Part};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tokio::sync::OnceCell;
use tracing::debug;
use url::Url;

use crate::errors::{GatewayError, GatewayResult};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileMetadata {
    pub name: String,
    #[serde(rename = "parentPath")]
    pub parent_path: String,
    pub bucket: String,
    pub url: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
struct Bucket {
    bucket: String,
    appdata: String,
}

#[async_trait]
pub trait FileStorage: Send + Sync {
    async fn upload(
        &self,
        filename: &str,
        content_type: &str,
        content: Vec<u8>,
    ) -> GatewayResult<FileMetadata>;

    async fn download_as_base64(&self, path: &str) -> GatewayResult<String>;
}

pub struct DialFileStorage {
    client: Client,
    base_url: Url,
    api_key: String,
    bucket: OnceCell<Bucket>,
}

impl DialFileStorage {
    pub fn new(base_url: &str, api_key: &str) -> GatewayResult<Self> {
        // `Url::join` treats the last segment of a slashless base as a file
        // and would replace it, so anchor the base as a directory.
        let base_url = if base_url.ends_with('/') {
            base_url.to_string()
        } else {
            format!("{}/", base_url)
        };
        let base_url = Url::parse(&base_url)
            .map_err(|e| GatewayError::validation(format!("Invalid storage URL: {}", e)))?;
        let client = Client::builder()
            .timeout(Duration::from_secs(600))
            .build()
            .map_err(upstream)?;

        Ok(Self {
            client,
            base_url,
            api_key: api_key.to_string(),
            bucket: OnceCell::new(),
        })
    }

    /// The bucket is discovered once per client instance.
    async fn get_bucket(&self) -> GatewayResult<&Bucket> {
        self.bucket
            .get_or_try_init(|| async {
                let url = self.join("v1/bucket")?;
                let bucket: Bucket = self
                    .client
                    .get(url)
                    .header("api-key", &self.api_key)
                    .send()
                    .await
                    .map_err(upstream)?
                    .error_for_status()
                    .map_err(upstream)?
                    .json()
                    .await
                    .map_err(upstream)?;

                debug!(bucket = %bucket.bucket, appdata = %bucket.appdata, "resolved storage bucket");
                Ok(bucket)
            })
            .await
    }

    fn join(&self, path: &str) -> GatewayResult<Url> {
        self.base_url
            .join(path)
            .map_err(|e| GatewayError::validation(format!("Invalid storage path {}: {}", path, e)))
    }

    /// Upload base64 content under a content-addressed name.
    pub async fn upload_file_as_base64(
        &self,
        upload_dir: &str,
        data: &str,
        content_type: &str,
    ) -> GatewayResult<FileMetadata> {
        let filename = format!("{}/{}", upload_dir, hash_digest(data));
        let content = BASE64
            .decode(data)
            .map_err(|e| GatewayError::validation(format!("Invalid base64 payload: {}", e)))?;
        self.upload(&filename, content_type, content).await
    }
}

#[async_trait]
impl FileStorage for DialFileStorage {
    async fn upload(
        &self,
        filename: &str,
        content_type: &str,
        content: Vec<u8>,
    ) -> GatewayResult<FileMetadata> {
        let bucket = self.get_bucket().await?;
        let ext = extension_for(content_type);
        let url = self.join(&format!("v1/files/{}/{}{}", bucket.appdata, filename, ext))?;

        let part = Part::bytes(content)
            .file_name(filename.to_string())
            .mime_str(content_type)
            .map_err(|e| GatewayError::validation(format!("Invalid content type: {}", e)))?;
        let form = Form::new().part("file", part);

        let metadata: FileMetadata = self
            .client
            .put(url.clone())
            .header("api-key", &self.api_key)
            .multipart(form)
            .send()
            .await
            .map_err(upstream)?
            .error_for_status()
            .map_err(upstream)?
            .json()
            .await
            .map_err(upstream)?;

        debug!(url = %url, name = %metadata.name, "uploaded file");
        Ok(metadata)
    }

    async fn download_as_base64(&self, path: &str) -> GatewayResult<String> {
        let url = self.join("v1/")?.join(path).map_err(|e| {
            GatewayError::validation(format!("Invalid attachment path {}: {}", path, e))
        })?;

        // The api-key is only meant for the gateway's own storage.
        let mut request = self.client.get(url.clone());
        if url
            .as_str()
            .to_lowercase()
            .starts_with(&self.base_url.as_str().to_lowercase())
        {
            request = request.header("api-key", &self.api_key);
        }

        let bytes = request
            .send()
            .await
            .map_err(upstream)?
            .error_for_status()
            .map_err(upstream)?
            .bytes()
            .await
            .map_err(upstream)?;

        Ok(BASE64.encode(bytes))
    }
}

/// Direct, unauthenticated fetch for URLs outside the gateway's storage.
pub async fn download_as_base64(url: &str) -> GatewayResult<String> {
    let client = Client::builder()
        .timeout(Duration::from_secs(600))
        .build()
        .map_err(upstream)?;

    let bytes = client
        .get(url)
        .send()
        .await
        .map_err(upstream)?
        .error_for_status()
        .map_err(upstream)?
        .bytes()
        .await
        .map_err(upstream)?;

    Ok(BASE64.encode(bytes))
}

fn upstream(error: reqwest::Error) -> GatewayError {
    GatewayError::Upstream(error.to_string())
}

fn hash_digest(content: &str) -> String {
    format!("{:x}", Sha256::digest(content.as_bytes()))
}

fn extension_for(content_type: &str) -> &'static str {
    match content_type {
        "image/png" => ".png",
        "image/jpeg" => ".jpeg",
        "image/gif" => ".gif",
        "image/webp" => ".webp",
        _ => "",
    }
}
