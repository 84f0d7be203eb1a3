//! Object storage for generated documents. S3-compatible (MinIO locally, AWS or the
//! hosted platform's storage in production).

use async_trait::async_trait;
use aws_config::Region;
use aws_sdk_s3::config::Credentials;
use aws_sdk_s3::primitives::ByteStream;
use tracing::info;

use crate::config::Config;
use crate::errors::AppError;

#[async_trait]
pub trait ObjectStorage: Send + Sync {
    async fn put(&self, key: &str, body: Vec<u8>, content_type: &str) -> Result<(), AppError>;

    /// Public URL under which `key` can be downloaded.
    fn public_url(&self, key: &str) -> String;

    async fn bucket_exists(&self) -> Result<bool, AppError>;
}

pub struct S3Storage {
    client: aws_sdk_s3::Client,
    bucket: String,
    public_base: String,
}

impl S3Storage {
    /// Constructs an S3 client configured for MinIO (local) or AWS (production).
    pub async fn from_config(config: &Config) -> Self {
        let credentials = Credentials::new(
            &config.aws_access_key_id,
            &config.aws_secret_access_key,
            None,
            None,
            "careervision-static",
        );

        let s3_config = aws_config::defaults(aws_config::BehaviorVersion::latest())
            .region(Region::new("us-east-1"))
            .credentials_provider(credentials)
            .endpoint_url(&config.s3_endpoint)
            .load()
            .await;

        // MinIO and most hosted S3 APIs only serve path-style addressing.
        let s3_config = aws_sdk_s3::config::Builder::from(&s3_config)
            .force_path_style(true)
            .build();

        Self {
            client: aws_sdk_s3::Client::from_conf(s3_config),
            bucket: config.s3_bucket.clone(),
            public_base: config.s3_public_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn bucket(&self) -> &str {
        &self.bucket
    }
}

#[async_trait]
impl ObjectStorage for S3Storage {
    async fn put(&self, key: &str, body: Vec<u8>, content_type: &str) -> Result<(), AppError> {
        let size = body.len();
        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(key)
            .body(ByteStream::from(body))
            .content_type(content_type)
            .send()
            .await
            .map_err(|e| AppError::S3(format!("Upload of {key} failed: {e}")))?;

        info!("Uploaded {size} bytes to s3://{}/{}", self.bucket, key);
        Ok(())
    }

    fn public_url(&self, key: &str) -> String {
        join_public_url(&self.public_base, key)
    }

    async fn bucket_exists(&self) -> Result<bool, AppError> {
        match self.client.head_bucket().bucket(&self.bucket).send().await {
            Ok(_) => Ok(true),
            Err(e) if e.as_service_error().is_some_and(|se| se.is_not_found()) => Ok(false),
            Err(e) => Err(AppError::S3(format!("HeadBucket failed: {e}"))),
        }
    }
}

fn join_public_url(base: &str, key: &str) -> String {
    format!("{}/{}", base.trim_end_matches('/'), key.trim_start_matches('/'))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_join_public_url_normalizes_slashes() {
        assert_eq!(
            join_public_url("https://cdn.example.com/docs/", "/resumes/a.pdf"),
            "https://cdn.example.com/docs/resumes/a.pdf"
        );
    }
}
