use std::sync::Arc;

use once_cell::sync::Lazy;
use regex::Regex;
use tracing::info;

use crate::error::{CrossPostError, Result};
use crate::models::types::{ContentId, ContentItem};
use crate::traits::source::SourcePlatform;

static POST_PATH_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"/(?:p|reel)/([A-Za-z0-9_-]+)").expect("post path regex"));
static BARE_ID_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[A-Za-z0-9_-]+$").expect("bare id regex"));

/// Extracts a content identifier from a post URL or accepts a bare identifier.
///
/// URLs must contain a `/p/<id>` or `/reel/<id>` segment; the scheme and host are optional.
pub fn parse_reference(reference: &str) -> Result<ContentId> {
    let reference = reference.trim();
    if reference.starts_with("http") || reference.contains("instagram.com") {
        return POST_PATH_RE
            .captures(reference)
            .and_then(|c| c.get(1))
            .map(|m| ContentId::from(m.as_str()))
            .ok_or_else(|| {
                CrossPostError::InvalidReference(format!("no post identifier in {}", reference))
            });
    }
    if BARE_ID_RE.is_match(reference) {
        Ok(ContentId::from(reference))
    } else {
        Err(CrossPostError::InvalidReference(format!(
            "not a post URL or identifier: {}",
            reference
        )))
    }
}

/// Picks the newest unpinned item; on equal timestamps the earlier stream position wins.
pub fn select_latest(items: Vec<ContentItem>) -> Option<ContentItem> {
    items
        .into_iter()
        .filter(|i| !i.pinned)
        .fold(None, |best: Option<ContentItem>, item| match best {
            Some(b) if b.taken_at >= item.taken_at => Some(b),
            _ => Some(item),
        })
}

/// Resolves a profile or a post reference to a single content item.
pub struct ContentFetcher {
    platform: Arc<dyn SourcePlatform>,
    window: usize,
}

impl ContentFetcher {
    pub fn new(platform: Arc<dyn SourcePlatform>, window: usize) -> Self {
        Self { platform, window }
    }

    /// Latest unpinned post among the first `window` items of the profile stream.
    pub async fn latest(&self, profile: &str) -> Result<Option<ContentItem>> {
        let items = self.platform.profile_window(profile, self.window).await?;
        let candidates: Vec<ContentItem> = items.into_iter().take(self.window).collect();
        let total = candidates.len();
        let Some(picked) = select_latest(candidates) else {
            info!(%profile, window = total, "content: no unpinned posts in window");
            return Ok(None);
        };
        info!(%profile, content_id = %picked.id, taken_at = %picked.taken_at, "content: latest selected");
        let full = self.platform.fetch_content(&picked.id).await?;
        Ok(Some(full.unwrap_or(picked)))
    }

    pub async fn by_reference(&self, reference: &str) -> Result<ContentItem> {
        let id = parse_reference(reference)?;
        info!(%reference, content_id = %id, "content: fetch by reference");
        self.platform
            .fetch_content(&id)
            .await?
            .ok_or_else(|| CrossPostError::NotFound(format!("post {}", id)))
    }
}
