use std::io::Write;
use std::path::PathBuf;

use bon::Builder;
use reqwest::header::{ACCEPT, AUTHORIZATION, CONTENT_TYPE};
use reqwest::Client;
use serde_json::json;
use tracing::{error, info, warn};

use crate::error::{CrossPostError, Result};
use crate::models::media::{LocalMediaFile, MediaKind};
use crate::models::resolution::{MediaResolution, RawResolution};

/// Client of the media resolution service (cobalt-compatible API).
///
/// Turns a content URL into downloaded temporary files, one GET per media item.
#[derive(Builder)]
pub struct MediaResolver {
    client: Client,
    #[builder(into)]
    endpoint: String,
    api_key: Option<String>,
    temp_dir: Option<PathBuf>,
}

impl MediaResolver {
    /// Asks the resolution service how to download `content_url`.
    pub async fn request(&self, content_url: &str) -> Result<MediaResolution> {
        info!(endpoint = %self.endpoint, %content_url, "resolver: request");
        let mut req = self
            .client
            .post(&self.endpoint)
            .header(ACCEPT, "application/json")
            .header(CONTENT_TYPE, "application/json")
            .json(&json!({ "url": content_url }));
        if let Some(key) = self.api_key.as_deref() {
            req = req.header(AUTHORIZATION, format!("Api-Key {}", key));
        }
        let res = req
            .send()
            .await
            .map_err(|e| CrossPostError::MediaResolution(format!("request failed: {}", e)))?;
        let code = res.status();
        let text = res.text().await.unwrap_or_default();
        if !code.is_success() {
            error!(status = %code, body = %text, "resolver: error response");
            return Err(CrossPostError::MediaResolution(format!("resolver returned {}: {}", code, text)));
        }
        let raw: RawResolution = serde_json::from_str(&text).map_err(|e| {
            error!(body = %text, "resolver: unparseable response");
            CrossPostError::MediaResolution(format!("invalid resolver response: {}", e))
        })?;
        if let Some(err) = raw.error.as_ref() {
            warn!(error = %err, "resolver: service reported an error");
        }
        Ok(raw.into())
    }

    /// Resolves and downloads every media item of `content_url`, in order.
    ///
    /// An unrecognized response yields an empty list rather than an error.
    pub async fn resolve(&self, content_url: &str) -> Result<Vec<LocalMediaFile>> {
        match self.request(content_url).await? {
            MediaResolution::MultiChoice { items } => {
                let total = items.len();
                let media: Vec<_> = items.into_iter().filter(|i| i.kind.is_media()).collect();
                info!(total, media = media.len(), "resolver: picker");
                let mut files = Vec::with_capacity(media.len());
                for (i, item) in media.iter().enumerate() {
                    info!(index = i + 1, kind = ?item.kind, url = %item.url, "resolver: picker item");
                    files.push(self.materialize(&item.url, None).await?);
                }
                Ok(files)
            }
            MediaResolution::Single { location } => {
                info!(url = %location, "resolver: tunnel");
                Ok(vec![self.materialize(&location, None).await?])
            }
            MediaResolution::Redirect { location, suggested_filename } => {
                info!(url = %location, filename = ?suggested_filename, "resolver: redirect");
                let hint = suggested_filename.as_deref().and_then(MediaKind::from_filename);
                Ok(vec![self.materialize(&location, hint).await?])
            }
            MediaResolution::Unrecognized { status } => {
                warn!(%status, %content_url, "resolver: unrecognized response, no media");
                Ok(Vec::new())
            }
        }
    }

    /// Downloads one location into a fresh temporary file.
    ///
    /// Without a `hint` the kind comes from the response content type, then from the location.
    async fn materialize(&self, location: &str, hint: Option<MediaKind>) -> Result<LocalMediaFile> {
        let res = self
            .client
            .get(location)
            .send()
            .await
            .map_err(|e| CrossPostError::MediaResolution(format!("download failed: {}", e)))?;
        let code = res.status();
        if !code.is_success() {
            let body = res.text().await.unwrap_or_default();
            error!(status = %code, url = %location, body = %body, "resolver: download error");
            return Err(CrossPostError::MediaResolution(format!("download of {} returned {}", location, code)));
        }
        let content_type = res
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default()
            .to_string();
        let kind = hint
            .or_else(|| MediaKind::from_content_type(&content_type))
            .unwrap_or_else(|| MediaKind::from_location(location));
        let bytes = res
            .bytes()
            .await
            .map_err(|e| CrossPostError::MediaResolution(format!("download failed: {}", e)))?;

        let mut builder = tempfile::Builder::new();
        builder.prefix("instadon-").suffix(kind.extension());
        let mut file = match self.temp_dir.as_deref() {
            Some(dir) => builder.tempfile_in(dir)?,
            None => builder.tempfile()?,
        };
        file.write_all(&bytes)?;
        file.flush()?;
        let path = file.into_temp_path();
        info!(path = %path.display(), size = bytes.len(), kind = ?kind, "resolver: media saved");
        Ok(LocalMediaFile::new(path, kind))
    }
}
