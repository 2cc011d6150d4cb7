use async_trait::async_trait;

use crate::error::Result;
use crate::models::types::{ContentId, ContentItem};

/// Read access to the source social-media platform.
#[async_trait]
pub trait SourcePlatform: Send + Sync {
    /// The first `limit` items of a profile's content stream, in stream order.
    async fn profile_window(&self, profile: &str, limit: usize) -> Result<Vec<ContentItem>>;

    /// Full content item for one identifier, `None` when the platform has no such item.
    async fn fetch_content(&self, id: &ContentId) -> Result<Option<ContentItem>>;
}
