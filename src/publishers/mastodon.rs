use std::fs;
use std::path::Path;

use async_trait::async_trait;
use bon::Builder;
use mastodon_async::data::Data;
use reqwest::multipart::{Form, Part};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{error, info};

use crate::error::{CrossPostError, Result};
use crate::models::media::MediaKind;
use crate::models::types::{MediaId, Post, PostId};
use crate::models::visibility::Visibility;
use crate::traits::publisher::{NewStatus, StatusApi};

#[derive(Debug, Serialize)]
struct StatusRequest<'a> {
    status: &'a str,
    media_ids: &'a [MediaId],
    visibility: Visibility,
    #[serde(skip_serializing_if = "Option::is_none")]
    in_reply_to_id: Option<&'a PostId>,
}

#[derive(Debug, Deserialize)]
struct MediaAttachment {
    id: MediaId,
}

#[derive(Debug, Deserialize)]
struct StatusResponse {
    id: PostId,
    url: Option<String>,
}

/// Mastodon REST client for one account.
#[derive(Builder)]
pub struct MastodonPublisher {
    pub client: Client,
    #[builder(into)]
    pub base_url: String,
    #[builder(into)]
    pub access_token: String,
}

impl MastodonPublisher {
    fn endpoint(&self, path: &str) -> String {
        format!("{}{}", self.base_url.trim_end_matches('/'), path)
    }
}

#[async_trait]
impl StatusApi for MastodonPublisher {
    async fn upload_media(&self, file: &Path, kind: MediaKind, description: &str) -> Result<MediaId> {
        let url = self.endpoint("/api/v2/media");
        let bytes = tokio::fs::read(file).await?;
        let file_name = file
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| format!("media{}", kind.extension()));
        info!(url = %url, file = %file_name, size = bytes.len(), mime = kind.mime(), "mastodon: upload_media");
        let part = Part::bytes(bytes).file_name(file_name).mime_str(kind.mime())?;
        let form = Form::new()
            .text("description", description.to_string())
            .part("file", part);
        let res = self
            .client
            .post(&url)
            .bearer_auth(&self.access_token)
            .multipart(form)
            .send()
            .await?;
        let code = res.status();
        let text = res.text().await.unwrap_or_default();
        if !code.is_success() {
            error!(status = %code, body = %text, "mastodon: upload_media error");
            return Err(CrossPostError::Upload { status: code, body: text });
        }
        let attachment: MediaAttachment = serde_json::from_str(&text)
            .map_err(|e| CrossPostError::Parse(format!("media response: {} - body: {}", e, text)))?;
        info!(status = %code, media_id = %attachment.id, "mastodon: upload_media ok");
        Ok(attachment.id)
    }

    async fn create_status(&self, status: NewStatus) -> Result<Post> {
        let url = self.endpoint("/api/v1/statuses");
        let body = StatusRequest {
            status: &status.text,
            media_ids: &status.media_ids,
            visibility: status.visibility,
            in_reply_to_id: status.in_reply_to_id.as_ref(),
        };
        info!(
            url = %url, text_len = status.text.chars().count(), media = status.media_ids.len(),
            visibility = %status.visibility, in_reply_to = ?status.in_reply_to_id, "mastodon: create_status"
        );
        let res = self
            .client
            .post(&url)
            .bearer_auth(&self.access_token)
            .json(&body)
            .send()
            .await?;
        let code = res.status();
        let text = res.text().await.unwrap_or_default();
        if !code.is_success() {
            error!(status = %code, body = %text, "mastodon: create_status error");
            return Err(CrossPostError::Publish { status: code, body: text });
        }
        let created: StatusResponse = serde_json::from_str(&text)
            .map_err(|e| CrossPostError::Parse(format!("status response: {} - body: {}", e, text)))?;
        info!(status = %code, post_id = %created.id, url = ?created.url, "mastodon: create_status ok");
        Ok(Post {
            id: created.id,
            url: created.url,
            text: status.text,
            visibility: status.visibility,
            media_ids: status.media_ids,
            in_reply_to_id: status.in_reply_to_id,
        })
    }
}

/// Load token from a mastodon-async credentials file if present.
pub fn load_token_from_secrets(
    token_path: &Path,
) -> std::result::Result<Option<String>, Box<dyn std::error::Error + Send + Sync>> {
    if token_path.exists() {
        let data = fs::read_to_string(token_path)?;
        let data: Data = serde_yaml::from_str(&data)?;
        if !data.token.is_empty() {
            return Ok(Some(data.token.into_owned()));
        }
    }
    Ok(None)
}
