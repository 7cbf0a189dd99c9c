//! Caption track retrieval for YouTube videos.
//!
//! Uses reqwest for fetching, scraper for the watch page and quick-xml for the
//! timed-text payload. The flow is: watch page (innertube key) → player
//! endpoint (track list) → timed-text XML for the chosen language.

use crate::config::TranscriptConfig;
use crate::extract::ExtractedText;
use crate::video::VideoId;
use lazy_static::lazy_static;
use quick_xml::events::Event;
use quick_xml::Reader;
use regex::Regex;
use reqwest::{header, Client, StatusCode};
use scraper::{Html, Selector};
use serde::Deserialize;
use std::borrow::Cow;
use std::time::Duration;
use thiserror::Error;
use url::Url;

/// User-Agent string identifying this client
const USER_AGENT: &str = concat!("precis/", env!("CARGO_PKG_VERSION"), " (https://github.com/cladam/precis)");

/// Innertube client the player request impersonates
const INNERTUBE_CLIENT_NAME: &str = "ANDROID";
const INNERTUBE_CLIENT_VERSION: &str = "20.10.38";

lazy_static! {
    static ref INNERTUBE_KEY: Regex =
        Regex::new(r#""INNERTUBE_API_KEY":\s*"([a-zA-Z0-9_-]+)""#).unwrap();
}

#[derive(Error, Debug)]
pub enum TranscriptError {
    #[error("video {0} is unavailable: {1}")]
    VideoUnavailable(String, String),
    #[error("captions are disabled for video {0}")]
    CaptionsDisabled(String),
    #[error("no captions in language '{requested}' (available: {})", .available.join(", "))]
    LanguageUnavailable {
        requested: String,
        available: Vec<String>,
    },
    #[error("YouTube refused the request: {0}")]
    Blocked(String),
    #[error("failed to fetch captions: {0}")]
    Network(#[from] reqwest::Error),
    #[error("unexpected response from YouTube: {0}")]
    Malformed(String),
    #[error("caption track contains no text")]
    Empty,
}

/// One timed caption segment
#[derive(Debug, Clone, PartialEq)]
pub struct CaptionEntry {
    /// Start offset in seconds
    pub start: f64,
    pub duration: f64,
    pub text: String,
}

impl CaptionEntry {
    pub fn new(start: f64, text: impl Into<String>) -> Self {
        Self {
            start,
            duration: 0.0,
            text: text.into(),
        }
    }
}

/// A caption track advertised by the player response
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CaptionTrack {
    pub base_url: String,
    pub language_code: String,
    /// "asr" for auto-generated tracks
    #[serde(default)]
    pub kind: Option<String>,
}

impl CaptionTrack {
    pub fn is_generated(&self) -> bool {
        self.kind.as_deref() == Some("asr")
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PlayerResponse {
    #[serde(default)]
    playability_status: Option<PlayabilityStatus>,
    #[serde(default)]
    captions: Option<Captions>,
}

#[derive(Debug, Deserialize)]
struct PlayabilityStatus {
    status: String,
    #[serde(default)]
    reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Captions {
    #[serde(rename = "playerCaptionsTracklistRenderer")]
    tracklist: Option<Tracklist>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Tracklist {
    #[serde(default)]
    caption_tracks: Vec<CaptionTrack>,
}

/// Client for the caption service. Requests are not retried.
pub struct TranscriptClient {
    client: Client,
    base_url: String,
}

impl TranscriptClient {
    pub fn new(config: &TranscriptConfig) -> Result<Self, TranscriptError> {
        let mut builder = Client::builder().user_agent(USER_AGENT);
        if let Some(secs) = config.timeout_secs {
            builder = builder.timeout(Duration::from_secs(secs));
        }

        Ok(Self {
            client: builder.build()?,
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }

    /// Fetch the caption track in `language` and flatten it into one string.
    pub async fn fetch_transcript(
        &self,
        video: &VideoId,
        language: &str,
    ) -> Result<ExtractedText, TranscriptError> {
        let tracks = self.list_tracks(video).await?;
        let track = select_track(&tracks, language)?;
        tracing::info!(
            video = %video,
            language,
            generated = track.is_generated(),
            "fetching caption track"
        );

        let entries = self.fetch_entries(track).await?;
        tracing::debug!(entries = entries.len(), "parsed caption entries");
        captions_to_text(entries)
    }

    /// List the caption tracks available for a video
    pub async fn list_tracks(&self, video: &VideoId) -> Result<Vec<CaptionTrack>, TranscriptError> {
        let html = self.fetch_watch_page(video).await?;
        let api_key = innertube_key(&html)?;
        let player = self.fetch_player(video, &api_key).await?;

        if let Some(status) = &player.playability_status {
            check_playability(video, status)?;
        }

        let tracks = player
            .captions
            .and_then(|c| c.tracklist)
            .map(|t| t.caption_tracks)
            .unwrap_or_default();

        if tracks.is_empty() {
            return Err(TranscriptError::CaptionsDisabled(video.to_string()));
        }
        Ok(tracks)
    }

    async fn fetch_watch_page(&self, video: &VideoId) -> Result<String, TranscriptError> {
        let url = self.endpoint("watch", &[("v", video.as_str())])?;
        tracing::debug!(%url, "fetching watch page");

        let response = self
            .client
            .get(url)
            .header(header::ACCEPT_LANGUAGE, "en-US")
            .send()
            .await?;
        let response = check_status(response)?;
        Ok(response.text().await?)
    }

    async fn fetch_player(
        &self,
        video: &VideoId,
        api_key: &str,
    ) -> Result<PlayerResponse, TranscriptError> {
        let url = self.endpoint("youtubei/v1/player", &[("key", api_key)])?;
        let body = serde_json::json!({
            "context": {
                "client": {
                    "clientName": INNERTUBE_CLIENT_NAME,
                    "clientVersion": INNERTUBE_CLIENT_VERSION,
                }
            },
            "videoId": video.as_str(),
        });

        let response = self
            .client
            .post(url)
            .json(&body)
            .send()
            .await?;
        let response = check_status(response)?;
        let text = response.text().await?;
        serde_json::from_str(&text).map_err(|e| TranscriptError::Malformed(e.to_string()))
    }

    fn endpoint(&self, path: &str, params: &[(&str, &str)]) -> Result<Url, TranscriptError> {
        Url::parse_with_params(&format!("{}/{}", self.base_url, path), params)
            .map_err(|e| TranscriptError::Malformed(format!("bad caption service URL: {e}")))
    }

    async fn fetch_entries(&self, track: &CaptionTrack) -> Result<Vec<CaptionEntry>, TranscriptError> {
        // srv3 is a different XML dialect; the default format is the one parsed here
        let url = track.base_url.replace("&fmt=srv3", "");
        let response = self.client.get(&url).send().await?;
        let response = check_status(response)?;
        let xml = response.text().await?;
        parse_timed_text(&xml)
    }
}

fn check_status(response: reqwest::Response) -> Result<reqwest::Response, TranscriptError> {
    if response.status() == StatusCode::TOO_MANY_REQUESTS {
        return Err(TranscriptError::Blocked("too many requests".to_string()));
    }
    Ok(response.error_for_status()?)
}

/// Pull the innertube API key out of the watch page, detecting the consent
/// interstitial and the reCAPTCHA wall on the way.
fn innertube_key(html: &str) -> Result<String, TranscriptError> {
    let document = Html::parse_document(html);

    let consent_selector = Selector::parse(r#"form[action^="https://consent.youtube.com"]"#).unwrap();
    if document.select(&consent_selector).next().is_some() {
        return Err(TranscriptError::Blocked("cookie consent required".to_string()));
    }
    let recaptcha_selector = Selector::parse("div.g-recaptcha").unwrap();
    if document.select(&recaptcha_selector).next().is_some() {
        return Err(TranscriptError::Blocked("reCAPTCHA challenge".to_string()));
    }

    let script_selector = Selector::parse("script").unwrap();
    document
        .select(&script_selector)
        .find_map(|script| {
            let body: String = script.text().collect();
            INNERTUBE_KEY
                .captures(&body)
                .map(|caps| caps[1].to_string())
        })
        .ok_or_else(|| TranscriptError::Malformed("watch page has no innertube key".to_string()))
}

fn check_playability(video: &VideoId, status: &PlayabilityStatus) -> Result<(), TranscriptError> {
    let reason = status.reason.clone().unwrap_or_default();
    match status.status.as_str() {
        "OK" => Ok(()),
        "LOGIN_REQUIRED" if reason.contains("not a bot") => Err(TranscriptError::Blocked(reason)),
        "ERROR" | "UNPLAYABLE" | "LOGIN_REQUIRED" => {
            let reason = if reason.is_empty() {
                status.status.to_lowercase()
            } else {
                reason
            };
            Err(TranscriptError::VideoUnavailable(video.to_string(), reason))
        }
        other => {
            tracing::debug!(status = other, "unrecognised playability status");
            Ok(())
        }
    }
}

/// Pick the track for `language`, preferring manually created captions.
pub fn select_track<'a>(
    tracks: &'a [CaptionTrack],
    language: &str,
) -> Result<&'a CaptionTrack, TranscriptError> {
    let matching: Vec<&CaptionTrack> = tracks
        .iter()
        .filter(|t| t.language_code == language)
        .collect();

    matching
        .iter()
        .find(|t| !t.is_generated())
        .or_else(|| matching.first())
        .copied()
        .ok_or_else(|| {
            let mut available: Vec<String> =
                tracks.iter().map(|t| t.language_code.clone()).collect();
            available.sort();
            available.dedup();
            TranscriptError::LanguageUnavailable {
                requested: language.to_string(),
                available,
            }
        })
}

/// Parse the timed-text XML (`<transcript><text start=".." dur="..">..</text>..`).
pub fn parse_timed_text(xml: &str) -> Result<Vec<CaptionEntry>, TranscriptError> {
    let mut reader = Reader::from_str(xml);
    let mut entries = Vec::new();
    let mut current: Option<(f64, f64, String)> = None;

    loop {
        let event = reader
            .read_event()
            .map_err(|e| TranscriptError::Malformed(e.to_string()))?;
        match event {
            Event::Start(e) if e.name().as_ref() == b"text" => {
                let mut start = 0.0;
                let mut duration = 0.0;
                for attr in e.attributes().flatten() {
                    let value = std::str::from_utf8(&attr.value).unwrap_or_default();
                    match attr.key.as_ref() {
                        b"start" => start = value.parse().unwrap_or(0.0),
                        b"dur" => duration = value.parse().unwrap_or(0.0),
                        _ => {}
                    }
                }
                current = Some((start, duration, String::new()));
            }
            Event::Text(t) => {
                if let Some((_, _, raw)) = current.as_mut() {
                    raw.push_str(&String::from_utf8_lossy(&t));
                }
            }
            Event::CData(t) => {
                if let Some((_, _, raw)) = current.as_mut() {
                    raw.push_str(&String::from_utf8_lossy(&t));
                }
            }
            Event::GeneralRef(r) => {
                if let Some((_, _, raw)) = current.as_mut() {
                    raw.push('&');
                    raw.push_str(&String::from_utf8_lossy(&r));
                    raw.push(';');
                }
            }
            Event::End(e) if e.name().as_ref() == b"text" => {
                if let Some((start, duration, raw)) = current.take() {
                    entries.push(CaptionEntry {
                        start,
                        duration,
                        text: unescape_twice(&raw),
                    });
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }

    Ok(entries)
}

/// Caption text arrives escaped twice (`&amp;#39;`); undo both layers,
/// keeping whatever survived if an entity is not XML.
fn unescape_twice(raw: &str) -> String {
    let once: Cow<'_, str> = quick_xml::escape::unescape(raw).unwrap_or(Cow::Borrowed(raw));
    match quick_xml::escape::unescape(&once) {
        Ok(twice) => twice.into_owned(),
        Err(_) => once.into_owned(),
    }
}

/// Join caption entries chronologically with single spaces.
pub fn captions_to_text(mut entries: Vec<CaptionEntry>) -> Result<ExtractedText, TranscriptError> {
    entries.sort_by(|a, b| a.start.total_cmp(&b.start));

    let text = entries
        .iter()
        .flat_map(|entry| entry.text.split_whitespace())
        .collect::<Vec<_>>()
        .join(" ");

    ExtractedText::new(text).ok_or(TranscriptError::Empty)
}
