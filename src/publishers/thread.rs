use tracing::info;

use crate::error::Result;
use crate::models::types::{MediaId, Post};
use crate::models::visibility::Visibility;
use crate::traits::publisher::{NewStatus, StatusApi};

/// Posts `media_ids` as a reply chain of at most `limit` attachments per post.
///
/// The root carries `text` and the requested visibility. Each continuation replies
/// to the previous post, is always unlisted, and is labelled `(i/total)`.
/// A failure stops the chain; posts already created stay published.
pub async fn publish_thread(
    api: &dyn StatusApi,
    text: &str,
    media_ids: &[MediaId],
    visibility: Visibility,
    limit: usize,
) -> Result<Vec<Post>> {
    let limit = limit.max(1);
    if media_ids.len() <= limit {
        let post = api
            .create_status(NewStatus {
                text: text.to_string(),
                media_ids: media_ids.to_vec(),
                visibility,
                in_reply_to_id: None,
            })
            .await?;
        return Ok(vec![post]);
    }

    let chunks: Vec<&[MediaId]> = media_ids.chunks(limit).collect();
    let total = chunks.len();
    info!(media = media_ids.len(), posts = total, "thread: splitting media into reply chain");
    let mut posts: Vec<Post> = Vec::with_capacity(total);
    for (i, chunk) in chunks.into_iter().enumerate() {
        let status = match posts.last() {
            None => NewStatus {
                text: text.to_string(),
                media_ids: chunk.to_vec(),
                visibility,
                in_reply_to_id: None,
            },
            Some(parent) => NewStatus {
                text: format!("({}/{})", i + 1, total),
                media_ids: chunk.to_vec(),
                visibility: Visibility::Unlisted,
                in_reply_to_id: Some(parent.id.clone()),
            },
        };
        let post = api.create_status(status).await?;
        info!(index = i + 1, total, post_id = %post.id, "thread: post created");
        posts.push(post);
    }
    Ok(posts)
}
