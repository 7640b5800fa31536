use std::sync::Arc;

use anyhow::{Context, Result};
use async_trait::async_trait;
use gcp_auth::{CustomServiceAccount, TokenProvider};
use reqwest::Client;

const UPLOAD_API: &str = "https://storage.googleapis.com/upload/storage/v1/b";
const PUBLIC_HOST: &str = "https://storage.googleapis.com";
const SCOPE: &str = "https://www.googleapis.com/auth/devstorage.read_write";

/// Where post images end up. Returns the public URL of the stored object.
#[async_trait]
pub trait ImageStore: Send + Sync {
    async fn upload(&self, bytes: Vec<u8>, content_type: &str) -> Result<String>;
}

pub struct GcsImageStore {
    client: Client,
    account: Arc<CustomServiceAccount>,
    bucket: String,
}

impl GcsImageStore {
    pub fn new(client: Client, account: Arc<CustomServiceAccount>, bucket: String) -> Self {
        Self {
            client,
            account,
            bucket,
        }
    }
}

/// Object name for a new upload: `images/<unix-millis>-<suffix>.<ext>`.
pub fn object_name(content_type: &str, timestamp_millis: i64, suffix: &str) -> String {
    format!(
        "images/{timestamp_millis}-{suffix}.{}",
        extension_for(content_type)
    )
}

/// Eight hex characters, enough to keep same-millisecond uploads apart.
fn unique_suffix() -> String {
    let mut id = uuid::Uuid::new_v4().simple().to_string();
    id.truncate(8);
    id
}

pub fn public_url(bucket: &str, object: &str) -> String {
    format!("{PUBLIC_HOST}/{bucket}/{object}")
}

fn extension_for(content_type: &str) -> &'static str {
    match content_type {
        "image/png" => "png",
        "image/webp" => "webp",
        "image/gif" => "gif",
        _ => "jpg",
    }
}

#[async_trait]
impl ImageStore for GcsImageStore {
    async fn upload(&self, bytes: Vec<u8>, content_type: &str) -> Result<String> {
        let object = object_name(
            content_type,
            chrono::Utc::now().timestamp_millis(),
            &unique_suffix(),
        );
        let token = self
            .account
            .token(&[SCOPE])
            .await
            .context("failed to get Google access token")?;

        let size = bytes.len();
        let resp = self
            .client
            .post(format!("{UPLOAD_API}/{}/o", self.bucket))
            .query(&[
                ("uploadType", "media"),
                ("name", object.as_str()),
                ("predefinedAcl", "publicRead"),
            ])
            .bearer_auth(token.as_str())
            .header("Content-Type", content_type)
            .body(bytes)
            .send()
            .await
            .context("failed to upload image to Cloud Storage")?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            anyhow::bail!("Cloud Storage returned {status} uploading {object}: {body}");
        }

        tracing::info!(bucket = %self.bucket, object = %object, size, "uploaded image");
        Ok(public_url(&self.bucket, &object))
    }
}
