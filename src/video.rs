//! YouTube URL parsing.

use lazy_static::lazy_static;
use regex::Regex;
use std::fmt;
use thiserror::Error;
use url::Url;

lazy_static! {
    static ref VIDEO_ID: Regex = Regex::new(r"^[A-Za-z0-9_-]+$").unwrap();
}

/// Hosts whose path carries the id directly, e.g. `youtu.be/<id>`
const SHORT_LINK_HOSTS: &[&str] = &["youtu.be", "www.youtu.be"];

/// Path prefixes on youtube.com that are followed by the id
const ID_PATH_PREFIXES: &[&str] = &["shorts", "embed", "live"];

#[derive(Error, Debug, PartialEq, Eq)]
pub enum UrlError {
    #[error("invalid YouTube URL: {0}")]
    Invalid(String),
}

/// A YouTube video identifier
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct VideoId(String);

impl VideoId {
    /// Validate a bare identifier
    pub fn parse(id: &str) -> Option<Self> {
        VIDEO_ID.is_match(id).then(|| Self(id.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for VideoId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Resolve the video id from a watch URL (`...?v=<id>`) or a short link
/// (`youtu.be/<id>`). A missing scheme is tolerated.
pub fn resolve_video_id(input: &str) -> Result<VideoId, UrlError> {
    let invalid = || UrlError::Invalid(input.to_string());
    let trimmed = input.trim();

    let url = Url::parse(trimmed)
        .or_else(|_| Url::parse(&format!("https://{}", trimmed)))
        .map_err(|_| invalid())?;

    if let Some((_, id)) = url.query_pairs().find(|(key, _)| key == "v") {
        return VideoId::parse(&id).ok_or_else(invalid);
    }

    let host = url.host_str().unwrap_or_default();
    let segments: Vec<&str> = url
        .path_segments()
        .map(|s| s.filter(|seg| !seg.is_empty()).collect())
        .unwrap_or_default();

    let candidate = if SHORT_LINK_HOSTS.contains(&host) {
        segments.last().copied()
    } else if is_youtube_host(host) {
        match segments.as_slice() {
            [prefix, id] if ID_PATH_PREFIXES.contains(prefix) => Some(*id),
            _ => None,
        }
    } else {
        None
    };

    candidate.and_then(VideoId::parse).ok_or_else(invalid)
}

fn is_youtube_host(host: &str) -> bool {
    host == "youtube.com" || host.ends_with(".youtube.com")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn id(url: &str) -> String {
        resolve_video_id(url).unwrap().as_str().to_string()
    }

    #[test]
    fn watch_url_stops_at_ampersand() {
        assert_eq!(id("https://www.youtube.com/watch?v=ABC123&t=10"), "ABC123");
    }

    #[test]
    fn watch_url_at_end_of_string() {
        assert_eq!(id("https://www.youtube.com/watch?v=dQw4w9WgXcQ"), "dQw4w9WgXcQ");
        assert_eq!(id("https://m.youtube.com/watch?feature=share&v=a_b-C"), "a_b-C");
    }

    #[test]
    fn short_link_uses_last_segment() {
        assert_eq!(id("https://youtu.be/XYZ789"), "XYZ789");
        assert_eq!(id("https://youtu.be/XYZ789?t=42"), "XYZ789");
        assert_eq!(id("youtu.be/XYZ789"), "XYZ789");
    }

    #[test]
    fn shorts_and_embed_paths() {
        assert_eq!(id("https://www.youtube.com/shorts/Sh0rt_1"), "Sh0rt_1");
        assert_eq!(id("https://www.youtube.com/embed/Emb3d"), "Emb3d");
    }

    #[test]
    fn other_shapes_are_invalid() {
        for url in [
            "https://example.com/video",
            "https://www.youtube.com/",
            "https://www.youtube.com/watch?v=",
            "https://www.youtube.com/watch?v=bad%20id",
            "https://youtu.be/",
            "not a url at all",
            "",
        ] {
            assert!(
                matches!(resolve_video_id(url), Err(UrlError::Invalid(_))),
                "accepted {url:?}"
            );
        }
    }
}
