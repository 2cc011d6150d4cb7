pub mod error;
pub mod models;
pub mod publishers;
pub mod services;
pub mod traits;

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use reqwest::Client;
use tracing::{info, warn};

use crate::error::Result;
use crate::models::types::RunOutcome;
use crate::models::visibility::Visibility;
use crate::publishers::mastodon::MastodonPublisher;
use crate::services::chat_api_openrouter::OpenRouterChatApi;
use crate::services::content::ContentFetcher;
use crate::services::crosspost::CrossPoster;
use crate::services::instagram::{InstagramClient, InstagramSession};
use crate::services::ledger::PostLedger;
use crate::services::media::MediaResolver;
use crate::services::settings::{AppConfig, load_config};
use crate::services::text_processor::TextProcessor;
use crate::traits::chat_api::ChatApi;

/// Where the content item of a run comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SourceRef {
    /// Latest post of a profile
    Profile(String),
    /// Post URL or bare identifier
    Reference(String),
}

/// Everything a single invocation asks for.
#[derive(Debug, Clone)]
pub struct RunRequest {
    pub source: SourceRef,
    pub visibility: Visibility,
    pub session: String,
    pub tracker: PathBuf,
    pub account: String,
}

/// Initialize structured logging (default to info if RUST_LOG not set)
pub fn init_logging() {
    let log_spec = std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string());
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::new(log_spec))
        .with_target(false)
        .with_writer(std::io::stderr)
        .compact()
        .try_init();
}

/// Assembles the pipeline for one run.
///
/// Account secrets are resolved first so configuration errors surface before any
/// network activity; the source session is loaded next.
pub fn build_cross_poster(cfg: &AppConfig, request: &RunRequest) -> Result<CrossPoster> {
    let account = cfg.account(&request.account)?;
    let session = InstagramSession::load(&cfg.source.session_dir, &request.session)?;

    let mut builder = Client::builder();
    if let Some(secs) = cfg.request_timeout_secs {
        builder = builder.timeout(Duration::from_secs(secs));
    }
    let client = builder.build()?;

    let instagram = InstagramClient::builder()
        .client(client.clone())
        .api_base_url(cfg.source.api_base_url.clone())
        .app_id(cfg.source.app_id.clone())
        .session(session)
        .build();
    let fetcher = ContentFetcher::new(Arc::new(instagram), cfg.source.window);

    let resolver = MediaResolver::builder()
        .client(client.clone())
        .endpoint(cfg.resolver.url.clone())
        .maybe_api_key(cfg.resolver_api_key())
        .maybe_temp_dir(cfg.resolver.temp_dir.clone())
        .build();

    let chat_api: Option<Arc<dyn ChatApi>> = match (cfg.llm.enabled, cfg.llm.api_key()) {
        (true, Some(key)) => Some(Arc::new(
            OpenRouterChatApi::builder()
                .client(client.clone())
                .base_url(cfg.llm.base_url.clone())
                .api_key(key)
                .model(cfg.llm.model.clone())
                .maybe_preview_chars(cfg.llm.log_preview_chars)
                .build(),
        )),
        (true, None) => {
            warn!(env = %cfg.llm.api_key_env, "llm: api key not set, captions use local fallback only");
            None
        }
        (false, _) => None,
    };
    let text_processor = TextProcessor::builder()
        .maybe_chat_api(chat_api)
        .max_chars(cfg.llm.max_chars)
        .maybe_summarize_template(cfg.llm.summarize_prompt.clone())
        .maybe_mentions_template(cfg.llm.mentions_prompt.clone())
        .build();

    let publisher = MastodonPublisher::builder()
        .client(client)
        .base_url(account.instance.clone())
        .access_token(account.access_token)
        .build();
    info!(account = %account.name, instance = %account.instance, "mastodon: client initialized");

    Ok(CrossPoster::builder()
        .fetcher(fetcher)
        .resolver(resolver)
        .text_processor(text_processor)
        .publisher(Arc::new(publisher))
        .ledger(PostLedger::new(request.tracker.clone()))
        .public_base_url(cfg.source.public_base_url.clone())
        .max_media_per_post(cfg.mastodon.max_media_per_post)
        .description_max_chars(cfg.mastodon.description_max_chars)
        .build())
}

/// Runs one cross-post with an already loaded configuration.
pub async fn run(cfg: &AppConfig, request: &RunRequest) -> Result<RunOutcome> {
    let poster = build_cross_poster(cfg, request)?;
    match &request.source {
        SourceRef::Profile(profile) => poster.post_latest(profile, request.visibility).await,
        SourceRef::Reference(reference) => poster.post_reference(reference, request.visibility).await,
    }
}

/// High-level entrypoint: load config, init logging, run once
pub async fn run_with_config_path(path: &str, request: &RunRequest) -> Result<RunOutcome> {
    let cfg = load_config(path)?;
    init_logging();
    run(&cfg, request).await
}
