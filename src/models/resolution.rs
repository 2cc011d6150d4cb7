//! Response shapes of the media resolution service.
//!
//! The wire format is a JSON object discriminated by `status`. It is parsed
//! leniently into [`RawResolution`] and then narrowed into the closed
//! [`MediaResolution`] sum type, so downstream code matches exhaustively
//! instead of inspecting strings.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PickerKind {
    Photo,
    Video,
    Gif,
    #[serde(other)]
    Other,
}

impl PickerKind {
    pub fn is_media(&self) -> bool {
        matches!(self, PickerKind::Photo | PickerKind::Video)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PickerItem {
    #[serde(rename = "type")]
    pub kind: PickerKind,
    pub url: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MediaResolution {
    /// `tunnel`: one stream to download
    Single { location: String },
    /// `picker`: several items, in display order
    MultiChoice { items: Vec<PickerItem> },
    /// `redirect`: one file, optionally with a suggested filename
    Redirect {
        location: String,
        suggested_filename: Option<String>,
    },
    /// Any other discriminator, or a known one missing its payload
    Unrecognized { status: String },
}

/// Lenient wire representation; every payload field is optional.
#[derive(Debug, Clone, Deserialize)]
pub struct RawResolution {
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub filename: Option<String>,
    #[serde(default)]
    pub picker: Option<Vec<PickerItem>>,
    #[serde(default)]
    pub error: Option<serde_json::Value>,
}

impl From<RawResolution> for MediaResolution {
    fn from(raw: RawResolution) -> Self {
        let status = raw.status.unwrap_or_default();
        match (status.as_str(), raw.url, raw.picker) {
            ("picker", _, Some(items)) => MediaResolution::MultiChoice { items },
            ("tunnel", Some(location), _) => MediaResolution::Single { location },
            ("redirect", Some(location), _) => MediaResolution::Redirect {
                location,
                suggested_filename: raw.filename.filter(|f| !f.trim().is_empty()),
            },
            _ => MediaResolution::Unrecognized { status },
        }
    }
}
