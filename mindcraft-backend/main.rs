mod api;
mod cloudflare;
mod config;
mod gcloud;
mod images;
mod language;
mod posts;

use anyhow::{Context, Result};
use axum::body::Body;
use axum::extract::Request;
use clap::Parser;
use dotenvy::dotenv;
use sentry::integrations::tower::{NewSentryLayer, SentryHttpLayer};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::sync::RwLock;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

use crate::cloudflare::client::{HttpWorkersAi, WorkersAi};
use crate::config::Config;
use crate::gcloud::speech::{GoogleSpeech, SpeechSynthesizer};
use crate::gcloud::storage::{GcsImageStore, ImageStore};
use crate::posts::mongo_repository::MongoPostRepository;
use crate::posts::repository::PostRepository;

#[derive(Parser)]
#[command(name = "mindcraft", about = "MindCraft AI backend")]
enum Cli {
    /// Start the HTTP server (default when no subcommand is given)
    #[command(alias = "run")]
    Serve {
        /// Override the PORT environment variable
        #[arg(long)]
        port: Option<u16>,
    },
    /// Validate configuration and provider credentials, then exit
    CheckConfig,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenv().ok();

    // Default to Serve when no subcommand is given,
    // but still allow --help and --version to work.
    let args: Vec<String> = std::env::args().collect();
    let cli = if args.len() <= 1 {
        Cli::Serve { port: None }
    } else {
        Cli::parse()
    };

    let mut config = Config::from_env();
    match cli {
        Cli::Serve { port } => {
            if let Some(port) = port {
                config.port = port;
            }
            run_server(config).await
        }
        Cli::CheckConfig => check_config(&config),
    }
}

fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("mindcraft=info,tower_http=warn,hyper=warn"));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_tree::HierarchicalLayer::new(2).with_targets(true).with_bracketed_fields(false))
        .with(sentry::integrations::tracing::layer().event_filter(
            |metadata| match *metadata.level() {
                tracing::Level::ERROR => sentry::integrations::tracing::EventFilter::Event,
                tracing::Level::WARN | tracing::Level::INFO => {
                    sentry::integrations::tracing::EventFilter::Breadcrumb
                }
                _ => sentry::integrations::tracing::EventFilter::Ignore,
            },
        ))
        .init();
}

fn check_config(config: &Config) -> Result<()> {
    let mut problems = Vec::new();
    if config.mongodb_url.is_none() {
        problems.push("MONGODB_URL is not set".to_string());
    }
    if config.cloudflare_api_token.is_empty() || config.cloudflare_account_id.is_empty() {
        problems.push("CLOUDFLARE_API_TOKEN / CLOUDFLARE_ACCOUNT_ID are not set".to_string());
    }
    if config.gcloud_storage_bucket.is_none() {
        problems.push("GCLOUD_STORAGE_BUCKET is not set".to_string());
    }
    match &config.gcloud_key {
        None => problems.push("GCLOUD_KEY_FILE is not set".to_string()),
        Some(raw) => {
            if let Err(e) = gcloud::service_account(raw) {
                problems.push(format!("{e:#}"));
            }
        }
    }

    if problems.is_empty() {
        println!("configuration ok (environment: {})", config.environment);
        return Ok(());
    }
    for problem in &problems {
        eprintln!("- {problem}");
    }
    anyhow::bail!("{} configuration problem(s)", problems.len())
}

async fn run_server(config: Config) -> Result<()> {
    init_tracing();

    let _guard = sentry::init((
        config.sentry_dsn.clone().unwrap_or_default(),
        sentry::ClientOptions {
            release: sentry::release_name!(),
            environment: Some(config.environment.clone().into()),
            send_default_pii: false,
            traces_sample_rate: 0.2,
            enable_logs: true,
            ..Default::default()
        },
    ));

    let http_client = Arc::new(
        reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(10))
            .timeout(Duration::from_secs(60))
            .build()
            .context("failed to build HTTP client")?,
    );

    let mongodb_url = config
        .mongodb_url
        .as_deref()
        .context("MONGODB_URL is not defined in environment variables")?;
    let mongo = mongodb::Client::with_uri_str(mongodb_url)
        .await
        .context("failed to connect to MongoDB")?;
    let post_repo = MongoPostRepository::new(&mongo.database(&config.mongodb_database));
    post_repo.ensure_indexes().await?;
    tracing::info!(database = %config.mongodb_database, "connected to MongoDB");

    let gcloud_key = config
        .gcloud_key
        .as_deref()
        .context("GCLOUD_KEY_FILE is not defined in environment variables")?;
    let account = gcloud::service_account(gcloud_key)?;
    if let Some(project) = config.gcloud_project_id.as_deref() {
        tracing::info!(project = %project, "using Google Cloud project");
    }
    let bucket = config
        .gcloud_storage_bucket
        .clone()
        .context("GCLOUD_STORAGE_BUCKET is not defined in environment variables")?;

    if config.cloudflare_api_token.is_empty() || config.cloudflare_account_id.is_empty() {
        tracing::warn!("Cloudflare credentials missing; Workers AI calls will fail");
    }

    let post_repo: Arc<dyn PostRepository> = Arc::new(post_repo);
    let image_store: Arc<dyn ImageStore> = Arc::new(GcsImageStore::new(
        (*http_client).clone(),
        account.clone(),
        bucket,
    ));
    let workers_ai: Arc<dyn WorkersAi> = Arc::new(HttpWorkersAi::new(
        (*http_client).clone(),
        config.cloudflare_account_id.clone(),
        config.cloudflare_api_token.clone(),
    ));
    let speech: Arc<dyn SpeechSynthesizer> =
        Arc::new(GoogleSpeech::new((*http_client).clone(), account));

    let frontend_dir = if config.is_production() {
        tracing::info!(dir = %config.frontend_dir.display(), "serving frontend build");
        Some(config.frontend_dir.clone())
    } else {
        None
    };

    let app_state = api::AppState {
        http_client,
        post_repo,
        image_store,
        workers_ai,
        speech,
        sockets: Arc::new(RwLock::new(HashMap::new())),
        frontend_dir,
        allowed_origins: config.allowed_origins.clone(),
    };

    let app = api::create_app(app_state)
        .layer(SentryHttpLayer::new().enable_transaction())
        .layer(NewSentryLayer::<Request<Body>>::new_from_top());

    let addr = format!("0.0.0.0:{}", config.port);
    let listener = TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    tracing::info!("Server running on http://{addr}");
    axum::serve(listener, app).await?;

    Ok(())
}
