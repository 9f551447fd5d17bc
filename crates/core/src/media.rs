//! Local files, generated media results, and locator resolution.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

/// A file picked by the user, held in memory.
///
/// The bytes are shared so the preview and the background upload can both
/// read them without copying.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocalFile {
    pub name: String,
    pub mime_type: String,
    pub bytes: Arc<[u8]>,
}

impl LocalFile {
    pub fn new(
        name: impl Into<String>,
        mime_type: impl Into<String>,
        bytes: impl Into<Arc<[u8]>>,
    ) -> Self {
        Self {
            name: name.into(),
            mime_type: mime_type.into(),
            bytes: bytes.into(),
        }
    }

    pub fn is_image(&self) -> bool {
        is_image_mime(&self.mime_type)
    }
}

/// What a workflow produces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MediaKind {
    Image,
    Video,
}

impl MediaKind {
    /// Lowercase noun used in user-facing copy ("image", "video").
    pub fn noun(self) -> &'static str {
        match self {
            MediaKind::Image => "image",
            MediaKind::Video => "video",
        }
    }
}

/// The outcome of a successful generation: an absolute locator for the
/// produced media.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenerationResult {
    pub media_url: String,
    pub kind: MediaKind,
}

impl GenerationResult {
    /// Build a result from the locator returned by the service, resolving
    /// it against `media_origin`.
    pub fn from_locator(media_origin: &str, locator: &str, kind: MediaKind) -> Self {
        Self {
            media_url: resolve_media_url(media_origin, locator),
            kind,
        }
    }
}

/// Resolve a media locator returned by the service against its origin.
///
/// Paths are appended to the origin (`/img/1.png` ->
/// `http://host:8000/img/1.png`). Locators that are already absolute
/// `http(s)` URLs are returned unchanged.
pub fn resolve_media_url(media_origin: &str, locator: &str) -> String {
    if locator.starts_with("http://") || locator.starts_with("https://") {
        return locator.to_string();
    }

    let origin = media_origin.trim_end_matches('/');
    if locator.starts_with('/') {
        format!("{origin}{locator}")
    } else {
        format!("{origin}/{locator}")
    }
}

/// Whether a MIME type denotes an image: anything starting with `image/`,
/// case-insensitively. A bare `image/` counts.
pub fn is_image_mime(mime_type: &str) -> bool {
    mime_type
        .get(..6)
        .is_some_and(|prefix| prefix.eq_ignore_ascii_case("image/"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn path_is_appended_to_origin() {
        assert_eq!(
            resolve_media_url("http://127.0.0.1:8000", "/img/1.png"),
            "http://127.0.0.1:8000/img/1.png"
        );
    }

    #[test]
    fn trailing_slash_on_origin_is_not_doubled() {
        assert_eq!(
            resolve_media_url("http://127.0.0.1:8000/", "/x"),
            "http://127.0.0.1:8000/x"
        );
    }

    #[test]
    fn relative_locator_gets_separator() {
        assert_eq!(
            resolve_media_url("http://host", "videos/out.mp4"),
            "http://host/videos/out.mp4"
        );
    }

    #[test]
    fn absolute_locator_is_kept() {
        let url = "https://cdn.example.com/img/2.png";
        assert_eq!(resolve_media_url("http://127.0.0.1:8000", url), url);
    }

    #[test]
    fn result_from_locator_carries_kind() {
        let result = GenerationResult::from_locator("http://o", "/v.mp4", MediaKind::Video);
        assert_eq!(result.media_url, "http://o/v.mp4");
        assert_eq!(result.kind, MediaKind::Video);
    }

    #[test]
    fn image_mime_detection() {
        assert!(is_image_mime("image/png"));
        assert!(is_image_mime("IMAGE/JPEG"));
        assert!(is_image_mime("image/"));
        assert!(!is_image_mime("image"));
        assert!(!is_image_mime("video/mp4"));
        assert!(!is_image_mime("application/pdf"));
        assert!(!is_image_mime(""));
    }
}
