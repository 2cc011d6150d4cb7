use std::path::Path;

use tempfile::TempPath;

/// Kind of a downloaded asset, which fixes its file extension and upload MIME type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaKind {
    Image,
    Video,
}

impl MediaKind {
    pub fn extension(&self) -> &'static str {
        match self {
            MediaKind::Image => ".jpeg",
            MediaKind::Video => ".mp4",
        }
    }

    pub fn mime(&self) -> &'static str {
        match self {
            MediaKind::Image => "image/jpeg",
            MediaKind::Video => "video/mp4",
        }
    }

    /// Kind implied by a suggested filename, if its extension is one we know.
    pub fn from_filename(name: &str) -> Option<Self> {
        let lower = name.to_ascii_lowercase();
        if lower.ends_with(".mp4") {
            Some(MediaKind::Video)
        } else if lower.ends_with(".jpg") || lower.ends_with(".jpeg") {
            Some(MediaKind::Image)
        } else {
            None
        }
    }

    /// Kind implied by a `Content-Type` header value.
    pub fn from_content_type(content_type: &str) -> Option<Self> {
        let lower = content_type.to_ascii_lowercase();
        if lower.contains("video") {
            Some(MediaKind::Video)
        } else if lower.contains("image") {
            Some(MediaKind::Image)
        } else {
            None
        }
    }

    /// Kind guessed from the download location; anything that does not look like a video is an image.
    pub fn from_location(location: &str) -> Self {
        let lower = location.to_ascii_lowercase();
        if [".mp4", ".mov", ".avi"].iter().any(|ext| lower.contains(ext)) {
            MediaKind::Video
        } else {
            MediaKind::Image
        }
    }
}

/// A downloaded asset living in a temporary file.
///
/// The file is deleted when the value is dropped, so every exit path of a run
/// releases it; [`LocalMediaFile::cleanup`] does the same eagerly and reports errors.
#[derive(Debug)]
pub struct LocalMediaFile {
    path: TempPath,
    kind: MediaKind,
}

impl LocalMediaFile {
    pub fn new(path: TempPath, kind: MediaKind) -> Self {
        Self { path, kind }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn kind(&self) -> MediaKind {
        self.kind
    }

    pub fn cleanup(self) -> std::io::Result<()> {
        self.path.close()
    }
}
