use std::path::Path;

use async_trait::async_trait;

use crate::error::Result;
use crate::models::media::MediaKind;
use crate::models::types::{MediaId, Post, PostId};
use crate::models::visibility::Visibility;

/// Parameters of one status to create.
#[derive(Debug, Clone, PartialEq)]
pub struct NewStatus {
    pub text: String,
    pub media_ids: Vec<MediaId>,
    pub visibility: Visibility,
    pub in_reply_to_id: Option<PostId>,
}

/// Destination platform operations used by the thread publisher.
#[async_trait]
pub trait StatusApi: Send + Sync {
    async fn upload_media(&self, file: &Path, kind: MediaKind, description: &str) -> Result<MediaId>;

    async fn create_status(&self, status: NewStatus) -> Result<Post>;
}
