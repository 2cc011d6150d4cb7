use bon::bon;
use chrono::{DateTime, Utc};
use derive_more::{AsRef, Display, From, FromStr, Into};
use serde::{Deserialize, Serialize};

use crate::models::visibility::Visibility;

/// Source-platform identifier of a content item (Instagram shortcode)
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, From, Into, Display, AsRef, FromStr)]
pub struct ContentId(String);

impl ContentId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for ContentId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// Destination-platform media attachment id
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, From, Into, Display, AsRef)]
pub struct MediaId(String);

impl MediaId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for MediaId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// Destination-platform status id
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, From, Into, Display, AsRef)]
pub struct PostId(String);

impl PostId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for PostId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// A media reference as reported by the source platform.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MediaRef {
    pub url: String,
    pub is_video: bool,
}

/// One source post. Immutable once fetched.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContentItem {
    pub id: ContentId,
    pub caption: Option<String>,
    pub media: Vec<MediaRef>,
    pub pinned: bool,
    pub taken_at: DateTime<Utc>,
}

#[bon]
impl ContentItem {
    #[builder]
    pub fn new(
        #[builder(into)] id: ContentId,
        #[builder(into)] caption: Option<String>,
        #[builder(default)] media: Vec<MediaRef>,
        #[builder(default = false)] pinned: bool,
        taken_at: DateTime<Utc>,
    ) -> Self {
        Self { id, caption, media, pinned, taken_at }
    }

    /// Caption with surrounding whitespace removed; `None` when blank.
    pub fn caption_text(&self) -> Option<&str> {
        self.caption.as_deref().map(str::trim).filter(|c| !c.is_empty())
    }
}

/// A created destination post. `in_reply_to_id` links thread members.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Post {
    pub id: PostId,
    pub url: Option<String>,
    pub text: String,
    pub visibility: Visibility,
    pub media_ids: Vec<MediaId>,
    pub in_reply_to_id: Option<PostId>,
}

/// Result of one cross-posting run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunOutcome {
    Posted {
        content_id: ContentId,
        content_url: String,
        posts: Vec<Post>,
    },
    Skipped {
        content_id: ContentId,
        content_url: String,
    },
    Failed {
        reason: String,
    },
}

impl RunOutcome {
    pub fn is_failure(&self) -> bool {
        matches!(self, RunOutcome::Failed { .. })
    }

    /// Thread root, present only for `Posted`.
    pub fn root_post(&self) -> Option<&Post> {
        match self {
            RunOutcome::Posted { posts, .. } => posts.first(),
            _ => None,
        }
    }
}
