//! Supabase Storage: buckets and object uploads

use crate::config::SupabaseConfig;
use crate::error::{RestError, Result};
use reqwest::{Client, StatusCode};
use serde::Serialize;
use tracing::info;

/// Bucket settings sent on creation
#[derive(Debug, Clone, Serialize)]
pub struct BucketSpec {
    pub id: String,
    pub name: String,
    pub public: bool,
    pub file_size_limit: u64,
    pub allowed_mime_types: Vec<String>,
}

impl BucketSpec {
    /// Public image bucket, 5 MB per file
    pub fn public_images(name: &str) -> Self {
        Self {
            id: name.to_string(),
            name: name.to_string(),
            public: true,
            file_size_limit: 5 * 1024 * 1024,
            allowed_mime_types: vec!["image/png".to_string(), "image/jpeg".to_string()],
        }
    }
}

/// Object storage operations used by the pipelines
#[async_trait::async_trait]
pub trait ObjectStorage: Send + Sync {
    /// Create the bucket; an existing bucket is not an error
    async fn ensure_bucket(&self, spec: &BucketSpec) -> Result<()>;

    /// Upload (or overwrite) an object
    async fn upload(&self, bucket: &str, path: &str, content_type: &str, bytes: Vec<u8>)
        -> Result<()>;

    /// Public URL of an object in a public bucket
    fn public_url(&self, bucket: &str, path: &str) -> String;
}

/// reqwest implementation against `<url>/storage/v1`
pub struct StorageClient {
    config: SupabaseConfig,
    client: Client,
}

impl StorageClient {
    pub fn new(config: SupabaseConfig) -> Result<Self> {
        config.validate()?;
        let client = Client::builder().timeout(config.timeout()).build()?;
        Ok(Self { config, client })
    }
}

/// `<url>/storage/v1/object/public/<bucket>/<path>`
pub fn public_object_url(base_url: &str, bucket: &str, path: &str) -> String {
    format!("{}/storage/v1/object/public/{}/{}", base_url.trim_end_matches('/'), bucket, path)
}

#[async_trait::async_trait]
impl ObjectStorage for StorageClient {
    async fn ensure_bucket(&self, spec: &BucketSpec) -> Result<()> {
        let key = self.config.write_key();
        let response = self
            .client
            .post(format!("{}/bucket", self.config.storage_base()))
            .header("apikey", key)
            .bearer_auth(key)
            .json(spec)
            .send()
            .await?;

        let status = response.status();
        if status.is_success() {
            info!("Created bucket '{}'", spec.name);
            return Ok(());
        }

        let body = response.text().await.unwrap_or_default();
        if status == StatusCode::CONFLICT || body.to_lowercase().contains("already exists") {
            info!("Bucket '{}' already exists", spec.name);
            return Ok(());
        }
        Err(RestError::status("Create bucket", status.as_u16(), &body))
    }

    async fn upload(
        &self,
        bucket: &str,
        path: &str,
        content_type: &str,
        bytes: Vec<u8>,
    ) -> Result<()> {
        let key = self.config.write_key();
        let response = self
            .client
            .post(format!("{}/object/{}/{}", self.config.storage_base(), bucket, path))
            .header("apikey", key)
            .bearer_auth(key)
            .header("Content-Type", content_type)
            .header("x-upsert", "true")
            .body(bytes)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(RestError::status(format!("Upload {path}"), status.as_u16(), &body));
        }
        Ok(())
    }

    fn public_url(&self, bucket: &str, path: &str) -> String {
        public_object_url(&self.config.url, bucket, path)
    }
}
