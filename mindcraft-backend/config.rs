use std::path::PathBuf;

const DEFAULT_ORIGINS: &str = "http://localhost:3000,http://localhost";

/// Server configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub mongodb_url: Option<String>,
    pub mongodb_database: String,
    pub cloudflare_api_token: String,
    pub cloudflare_account_id: String,
    /// Service-account key, either raw JSON or base64 of it.
    pub gcloud_key: Option<String>,
    pub gcloud_project_id: Option<String>,
    pub gcloud_storage_bucket: Option<String>,
    pub environment: String,
    pub frontend_dir: PathBuf,
    pub allowed_origins: Vec<String>,
    pub sentry_dsn: Option<String>,
}

impl Config {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build a Config from a key lookup (as it would come from env vars).
    /// Used directly in tests to avoid mutating process-global environment.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let port = get("PORT").and_then(|v| v.parse().ok()).unwrap_or(5000);

        let environment = get("NODE_ENV")
            .or_else(|| get("ENVIRONMENT"))
            .unwrap_or_else(|| "local".to_string());

        let allowed_origins = get("ALLOWED_ORIGINS")
            .unwrap_or_else(|| DEFAULT_ORIGINS.to_string())
            .split(',')
            .map(|o| o.trim().to_string())
            .filter(|o| !o.is_empty())
            .collect();

        Config {
            port,
            mongodb_url: get("MONGODB_URL"),
            mongodb_database: get("MONGODB_DATABASE").unwrap_or_else(|| "mindcraft".to_string()),
            cloudflare_api_token: get("CLOUDFLARE_API_TOKEN").unwrap_or_default(),
            cloudflare_account_id: get("CLOUDFLARE_ACCOUNT_ID").unwrap_or_default(),
            gcloud_key: get("GCLOUD_KEY_FILE"),
            gcloud_project_id: get("GCLOUD_PROJECT_ID"),
            gcloud_storage_bucket: get("GCLOUD_STORAGE_BUCKET"),
            environment,
            frontend_dir: get("FRONTEND_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from("frontend").join("build")),
            allowed_origins,
            sentry_dsn: get("SENTRY_DSN"),
        }
    }

    pub fn is_production(&self) -> bool {
        self.environment.eq_ignore_ascii_case("production")
    }
}
