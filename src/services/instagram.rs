use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use bon::Builder;
use chrono::{DateTime, Utc};
use reqwest::header::{COOKIE, USER_AGENT};
use reqwest::{Client, RequestBuilder, StatusCode};
use serde::Deserialize;
use tracing::{info, warn};

use crate::error::{CrossPostError, Result};
use crate::models::types::{ContentId, ContentItem, MediaRef};
use crate::traits::source::SourcePlatform;

const BROWSER_AGENT: &str =
    "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0 Safari/537.36";

/// Pre-established web session: cookie name -> value.
#[derive(Debug, Clone)]
pub struct InstagramSession {
    cookies: BTreeMap<String, String>,
}

impl InstagramSession {
    /// Resolves `name` to a session file and loads it.
    ///
    /// `name` may be a path to an existing file; otherwise it is looked up as
    /// `session-<name>.json` inside `session_dir`.
    pub fn load(session_dir: &Path, name: &str) -> Result<Self> {
        let direct = PathBuf::from(name);
        let path = if direct.is_file() {
            direct
        } else {
            session_dir.join(format!("session-{}.json", name))
        };
        let data = std::fs::read_to_string(&path).map_err(|e| {
            CrossPostError::Session(format!("cannot read session file {}: {}", path.display(), e))
        })?;
        let cookies: BTreeMap<String, String> = serde_json::from_str(&data).map_err(|e| {
            CrossPostError::Session(format!("malformed session file {}: {}", path.display(), e))
        })?;
        if cookies.get("sessionid").is_none_or(|v| v.is_empty()) {
            return Err(CrossPostError::Session(format!(
                "session file {} has no sessionid",
                path.display()
            )));
        }
        info!(path = %path.display(), cookies = cookies.len(), "instagram: session loaded");
        Ok(Self { cookies })
    }

    pub fn cookie_header(&self) -> String {
        self.cookies
            .iter()
            .map(|(k, v)| format!("{}={}", k, v))
            .collect::<Vec<_>>()
            .join("; ")
    }

    pub fn csrf_token(&self) -> Option<&str> {
        self.cookies.get("csrftoken").map(String::as_str)
    }
}

#[derive(Debug, Deserialize)]
struct Edges<T> {
    edges: Vec<Edge<T>>,
}

#[derive(Debug, Deserialize)]
struct Edge<T> {
    node: T,
}

#[derive(Debug, Deserialize)]
struct CaptionNode {
    text: String,
}

#[derive(Debug, Deserialize)]
struct ChildNode {
    display_url: Option<String>,
    #[serde(default)]
    is_video: bool,
    video_url: Option<String>,
}

#[derive(Debug, Deserialize)]
struct MediaNode {
    shortcode: String,
    taken_at_timestamp: i64,
    is_pinned: Option<bool>,
    pinned_for_users: Option<Vec<serde_json::Value>>,
    edge_media_to_caption: Option<Edges<CaptionNode>>,
    display_url: Option<String>,
    #[serde(default)]
    is_video: bool,
    video_url: Option<String>,
    edge_sidecar_to_children: Option<Edges<ChildNode>>,
}

fn media_ref(is_video: bool, display_url: Option<String>, video_url: Option<String>) -> Option<MediaRef> {
    let url = if is_video { video_url.or(display_url) } else { display_url };
    url.map(|url| MediaRef { url, is_video })
}

impl From<MediaNode> for ContentItem {
    fn from(node: MediaNode) -> Self {
        let pinned = node.is_pinned.unwrap_or(false)
            || node.pinned_for_users.as_ref().is_some_and(|u| !u.is_empty());
        let caption = node
            .edge_media_to_caption
            .and_then(|c| c.edges.into_iter().next())
            .map(|e| e.node.text);
        let children: Vec<MediaRef> = node
            .edge_sidecar_to_children
            .map(|s| s.edges)
            .unwrap_or_default()
            .into_iter()
            .filter_map(|e| media_ref(e.node.is_video, e.node.display_url, e.node.video_url))
            .collect();
        let media = if children.is_empty() {
            media_ref(node.is_video, node.display_url, node.video_url).into_iter().collect()
        } else {
            children
        };
        ContentItem {
            id: node.shortcode.into(),
            caption,
            media,
            pinned,
            taken_at: DateTime::<Utc>::from_timestamp(node.taken_at_timestamp, 0).unwrap_or_default(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct ProfileResponse {
    data: ProfileData,
}

#[derive(Debug, Deserialize)]
struct ProfileData {
    user: Option<ProfileUser>,
}

#[derive(Debug, Deserialize)]
struct ProfileUser {
    edge_owner_to_timeline_media: Edges<MediaNode>,
}

#[derive(Debug, Deserialize)]
struct ShortcodeResponse {
    graphql: ShortcodeGraphql,
}

#[derive(Debug, Deserialize)]
struct ShortcodeGraphql {
    shortcode_media: Option<MediaNode>,
}

/// Instagram web API client authenticated with a stored browser session.
#[derive(Builder)]
pub struct InstagramClient {
    client: Client,
    #[builder(into)]
    api_base_url: String,
    #[builder(into)]
    app_id: String,
    session: InstagramSession,
}

impl InstagramClient {
    fn get(&self, url: &str) -> RequestBuilder {
        let mut req = self
            .client
            .get(url)
            .header(COOKIE, self.session.cookie_header())
            .header(USER_AGENT, BROWSER_AGENT)
            .header("X-IG-App-ID", &self.app_id);
        if let Some(csrf) = self.session.csrf_token() {
            req = req.header("X-CSRFToken", csrf);
        }
        req
    }

    fn base(&self) -> &str {
        self.api_base_url.trim_end_matches('/')
    }
}

#[async_trait]
impl SourcePlatform for InstagramClient {
    async fn profile_window(&self, profile: &str, limit: usize) -> Result<Vec<ContentItem>> {
        let url = format!("{}/api/v1/users/web_profile_info/", self.base());
        info!(%url, %profile, limit, "instagram: profile window");
        let res = self.get(&url).query(&[("username", profile)]).send().await?;
        if res.status() == StatusCode::NOT_FOUND {
            return Err(CrossPostError::NotFound(format!("profile {}", profile)));
        }
        let body: ProfileResponse = res.error_for_status()?.json().await?;
        let user = body
            .data
            .user
            .ok_or_else(|| CrossPostError::NotFound(format!("profile {}", profile)))?;
        let items: Vec<ContentItem> = user
            .edge_owner_to_timeline_media
            .edges
            .into_iter()
            .take(limit)
            .map(|e| e.node.into())
            .collect();
        info!(%profile, items = items.len(), "instagram: profile window fetched");
        Ok(items)
    }

    async fn fetch_content(&self, id: &ContentId) -> Result<Option<ContentItem>> {
        let url = format!("{}/p/{}/", self.base(), id);
        info!(%url, content_id = %id, "instagram: fetch content");
        let res = self
            .get(&url)
            .query(&[("__a", "1"), ("__d", "dis")])
            .send()
            .await?;
        if res.status() == StatusCode::NOT_FOUND {
            warn!(content_id = %id, "instagram: content not found");
            return Ok(None);
        }
        let body: ShortcodeResponse = res.error_for_status()?.json().await?;
        Ok(body.graphql.shortcode_media.map(ContentItem::from))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn node_with_sidecar_and_pin() {
        let node: MediaNode = serde_json::from_str(
            r#"{
                "shortcode": "C1",
                "taken_at_timestamp": 1700000000,
                "pinned_for_users": [{"id": "1"}],
                "edge_media_to_caption": {"edges": [{"node": {"text": "Hallo @kulturneubau"}}]},
                "display_url": "https://cdn/cover.jpg",
                "is_video": false,
                "edge_sidecar_to_children": {"edges": [
                    {"node": {"display_url": "https://cdn/1.jpg", "is_video": false}},
                    {"node": {"display_url": "https://cdn/2.jpg", "is_video": true, "video_url": "https://cdn/2.mp4"}}
                ]}
            }"#,
        )
        .unwrap();
        let item = ContentItem::from(node);
        assert_eq!(item.id.as_str(), "C1");
        assert!(item.pinned);
        assert_eq!(item.caption.as_deref(), Some("Hallo @kulturneubau"));
        assert_eq!(item.media.len(), 2);
        assert_eq!(item.media[1].url, "https://cdn/2.mp4");
        assert_eq!(item.taken_at.timestamp(), 1_700_000_000);
    }

    #[test]
    fn single_node_without_caption() {
        let node: MediaNode = serde_json::from_str(
            r#"{"shortcode": "C2", "taken_at_timestamp": 5, "is_pinned": false,
                "display_url": "https://cdn/x.jpg", "is_video": true, "video_url": "https://cdn/x.mp4"}"#,
        )
        .unwrap();
        let item = ContentItem::from(node);
        assert!(!item.pinned);
        assert!(item.caption.is_none());
        assert_eq!(item.media, vec![MediaRef { url: "https://cdn/x.mp4".into(), is_video: true }]);
    }

    #[test]
    fn session_requires_sessionid() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("session-bad.json"), r#"{"csrftoken": "x"}"#).unwrap();
        let err = InstagramSession::load(dir.path(), "bad").unwrap_err();
        assert!(matches!(err, CrossPostError::Session(_)));

        let err = InstagramSession::load(dir.path(), "absent").unwrap_err();
        assert!(matches!(err, CrossPostError::Session(_)));
    }

    #[test]
    fn session_cookie_header() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("mine.json");
        std::fs::write(&path, r#"{"sessionid": "s1", "csrftoken": "c1"}"#).unwrap();
        // an existing path is used as is
        let session = InstagramSession::load(Path::new("/nonexistent"), path.to_str().unwrap()).unwrap();
        assert_eq!(session.cookie_header(), "csrftoken=c1; sessionid=s1");
        assert_eq!(session.csrf_token(), Some("c1"));
    }
}
