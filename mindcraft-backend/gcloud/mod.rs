pub mod credentials;
pub mod speech;
pub mod storage;

use std::sync::Arc;

use anyhow::{Context, Result};
use gcp_auth::CustomServiceAccount;

/// Build a service account from the `GCLOUD_KEY_FILE` value.
pub fn service_account(raw_key: &str) -> Result<Arc<CustomServiceAccount>> {
    let credentials =
        credentials::decode_credentials(raw_key).context("failed to decode GCLOUD_KEY_FILE")?;
    if let Some(project) = credentials.get("project_id").and_then(|v| v.as_str()) {
        tracing::info!(project = %project, "loaded Google service account");
    }
    let account = CustomServiceAccount::from_json(&credentials.to_string())
        .context("failed to load Google service account")?;
    Ok(Arc::new(account))
}
