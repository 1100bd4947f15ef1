use anyhow::Result;
use async_trait::async_trait;
use aws_sdk_s3::Client;
use aws_sdk_s3::primitives::ByteStream;

/// External blob store for avatar and cover images. `upload_image` returns
/// the durable public URL of the stored object; a failed upload surfaces as
/// an error, never a silent default.
#[async_trait]
pub trait StorageService: Send + Sync {
    async fn upload_image(&self, key: &str, data: Vec<u8>) -> Result<String>;
    async fn file_exists(&self, key: &str) -> Result<bool>;
}

pub struct S3StorageService {
    client: Client,
    bucket: String,
    public_base_url: String,
}

impl S3StorageService {
    pub fn new(client: Client, bucket: String, public_base_url: String) -> Self {
        Self {
            client,
            bucket,
            public_base_url: public_base_url.trim_end_matches('/').to_string(),
        }
    }
}

#[async_trait]
impl StorageService for S3StorageService {
    async fn upload_image(&self, key: &str, data: Vec<u8>) -> Result<String> {
        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(key)
            .body(ByteStream::from(data))
            .send()
            .await?;

        Ok(format!("{}/{}/{}", self.public_base_url, self.bucket, key))
    }

    async fn file_exists(&self, key: &str) -> Result<bool> {
        let res = self
            .client
            .head_object()
            .bucket(&self.bucket)
            .key(key)
            .send()
            .await;

        match res {
            Ok(_) => Ok(true),
            Err(e) => {
                let service_error = e.into_service_error();
                if service_error.is_not_found() {
                    Ok(false)
                } else {
                    Err(anyhow::anyhow!(service_error))
                }
            }
        }
    }
}
