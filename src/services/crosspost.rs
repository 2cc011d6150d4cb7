use std::sync::Arc;

use bon::Builder;
use tracing::{error, info, warn};

use crate::error::{CrossPostError, Result};
use crate::models::media::LocalMediaFile;
use crate::models::stage::PipelineStage;
use crate::models::types::{ContentId, ContentItem, MediaId, RunOutcome};
use crate::models::visibility::Visibility;
use crate::publishers::thread::publish_thread;
use crate::publishers::utils::trim_with_ellipsis;
use crate::services::content::{ContentFetcher, parse_reference};
use crate::services::ledger::PostLedger;
use crate::services::media::MediaResolver;
use crate::services::text_processor::TextProcessor;
use crate::traits::publisher::StatusApi;

const DEFAULT_DESCRIPTION: &str = "Instagram post";

/// Runs one content item through dedup, download, upload, caption rewrite and posting.
///
/// The ledger is written only after every post of the thread exists. Downloaded
/// files are released on every exit path.
#[derive(Builder)]
pub struct CrossPoster {
    fetcher: ContentFetcher,
    resolver: MediaResolver,
    text_processor: TextProcessor,
    publisher: Arc<dyn StatusApi>,
    ledger: PostLedger,
    #[builder(into)]
    public_base_url: String,
    #[builder(default = 4)]
    max_media_per_post: usize,
    #[builder(default = 1500)]
    description_max_chars: usize,
}

impl CrossPoster {
    /// Canonical public URL of a content item, as handed to the resolver.
    pub fn content_url(&self, id: &ContentId) -> String {
        format!("{}/p/{}/", self.public_base_url.trim_end_matches('/'), id)
    }

    fn enter(&self, stage: PipelineStage, id: &ContentId) {
        info!(stage = %stage, content_id = %id, "pipeline: stage");
    }

    fn skipped(&self, id: ContentId) -> RunOutcome {
        let content_url = self.content_url(&id);
        info!(stage = %PipelineStage::Done, content_id = %id, "pipeline: already posted, skipping");
        RunOutcome::Skipped { content_id: id, content_url }
    }

    fn failed(&self, reason: String) -> RunOutcome {
        warn!(stage = %PipelineStage::Failed, %reason, "pipeline: run failed");
        RunOutcome::Failed { reason }
    }

    /// Cross-posts the newest unpinned post of `profile`.
    pub async fn post_latest(&self, profile: &str, visibility: Visibility) -> Result<RunOutcome> {
        info!(stage = %PipelineStage::FetchContent, %profile, "pipeline: stage");
        match self.fetcher.latest(profile).await {
            Ok(Some(item)) => self.process(item, visibility).await,
            Ok(None) => Ok(self.failed(format!("no posts found for profile: {}", profile))),
            Err(CrossPostError::NotFound(what)) => Ok(self.failed(format!("not found: {}", what))),
            Err(e) => Err(e),
        }
    }

    /// Cross-posts a specific post given by URL or identifier.
    ///
    /// The identifier is known before fetching, so an already-posted item costs no source request.
    pub async fn post_reference(&self, reference: &str, visibility: Visibility) -> Result<RunOutcome> {
        let id = match parse_reference(reference) {
            Ok(id) => id,
            Err(e) => return Ok(self.failed(e.to_string())),
        };
        self.enter(PipelineStage::CheckDedup, &id);
        if self.ledger.exists(&id) {
            return Ok(self.skipped(id));
        }
        self.enter(PipelineStage::FetchContent, &id);
        match self.fetcher.by_reference(reference).await {
            Ok(item) => self.process(item, visibility).await,
            Err(e @ (CrossPostError::NotFound(_) | CrossPostError::InvalidReference(_))) => {
                Ok(self.failed(format!("could not find Instagram post {}: {}", reference, e)))
            }
            Err(e) => Err(e),
        }
    }

    async fn process(&self, item: ContentItem, visibility: Visibility) -> Result<RunOutcome> {
        let id = item.id.clone();
        self.enter(PipelineStage::CheckDedup, &id);
        if self.ledger.exists(&id) {
            return Ok(self.skipped(id));
        }
        let content_url = self.content_url(&id);
        info!(content_id = %id, %content_url, media_refs = item.media.len(), "pipeline: processing new post");

        self.enter(PipelineStage::ResolveMedia, &id);
        let files = self.resolver.resolve(&content_url).await.inspect_err(|e| self.abort(&id, e))?;
        if files.is_empty() {
            return Ok(self.failed(format!("no media files could be downloaded for {}", content_url)));
        }

        self.enter(PipelineStage::UploadMedia, &id);
        let media_ids = self.upload_all(&item, &files).await.inspect_err(|e| self.abort(&id, e))?;

        self.enter(PipelineStage::NormalizeText, &id);
        let text = self.text_processor.normalize(item.caption.as_deref().unwrap_or("")).await;

        self.enter(PipelineStage::Publish, &id);
        let posts = publish_thread(self.publisher.as_ref(), &text, &media_ids, visibility, self.max_media_per_post)
            .await
            .inspect_err(|e| self.abort(&id, e))?;

        self.enter(PipelineStage::CommitDedup, &id);
        info!(content_id = %id, ledger = %self.ledger.path().display(), posts = posts.len(), "pipeline: committing");
        self.ledger.record(&id).inspect_err(|e| self.abort(&id, e))?;

        self.enter(PipelineStage::Cleanup, &id);
        for file in files {
            let path = file.path().to_path_buf();
            if let Err(e) = file.cleanup() {
                warn!(path = %path.display(), error = %e, "pipeline: temp file cleanup failed");
            }
        }

        info!(stage = %PipelineStage::Done, content_id = %id, posts = posts.len(), "pipeline: cross-post complete");
        Ok(RunOutcome::Posted { content_id: id, content_url, posts })
    }

    async fn upload_all(&self, item: &ContentItem, files: &[LocalMediaFile]) -> Result<Vec<MediaId>> {
        let description = trim_with_ellipsis(
            item.caption_text().unwrap_or(DEFAULT_DESCRIPTION),
            self.description_max_chars,
        );
        let mut ids = Vec::with_capacity(files.len());
        for file in files {
            ids.push(self.publisher.upload_media(file.path(), file.kind(), &description).await?);
        }
        Ok(ids)
    }

    fn abort(&self, id: &ContentId, e: &CrossPostError) {
        error!(stage = %PipelineStage::Failed, content_id = %id, error = %e, "pipeline: run aborted");
    }
}
