use async_trait::async_trait;
use precis::extract::ExtractError;
use precis::model::{ModelError, SummarizationModel};
use precis::summary::LengthBounds;
use precis::transcript::TranscriptError;
use precis::video::UrlError;
use precis::{Config, RawInput, Summarizer, Workflow, WorkflowError};
use serde_json::json;
use std::sync::Arc;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const API_KEY: &str = "AIzaTestKey";

/// Returns the first `max` words of its input
struct EchoModel;

#[async_trait]
impl SummarizationModel for EchoModel {
    fn name(&self) -> &str {
        "echo"
    }

    async fn generate(&self, text: &str, bounds: LengthBounds) -> Result<String, ModelError> {
        Ok(text
            .split_whitespace()
            .take(bounds.max)
            .collect::<Vec<_>>()
            .join(" "))
    }
}

fn workflow(base_url: &str) -> Workflow {
    let mut config = Config::default();
    config.transcript.base_url = base_url.to_string();
    config.summary.max_length = 5;
    config.summary.min_length = 1;
    let summarizer = Arc::new(Summarizer::new(Box::new(EchoModel), &config));
    Workflow::new(&config, summarizer).unwrap()
}

fn watch_page() -> String {
    format!(
        r#"<!DOCTYPE html><html><head><script>var ytcfg = {{"INNERTUBE_API_KEY":"{API_KEY}","CLIENT":"web"}};</script></head><body></body></html>"#
    )
}

async fn mount_watch_page(server: &MockServer, video: &str) {
    Mock::given(method("GET"))
        .and(path("/watch"))
        .and(query_param("v", video))
        .respond_with(ResponseTemplate::new(200).set_body_string(watch_page()))
        .mount(server)
        .await;
}

async fn mount_player(server: &MockServer, body: serde_json::Value) {
    Mock::given(method("POST"))
        .and(path("/youtubei/v1/player"))
        .and(query_param("key", API_KEY))
        .respond_with(ResponseTemplate::new(200).set_body_json(body))
        .mount(server)
        .await;
}

fn player_with_tracks(server: &MockServer, tracks: &[(&str, Option<&str>)]) -> serde_json::Value {
    let tracks: Vec<_> = tracks
        .iter()
        .map(|(code, kind)| {
            let mut track = json!({
                "baseUrl": format!("{}/api/timedtext?v=ABC123&lang={code}&fmt=srv3", server.uri()),
                "languageCode": code,
                "name": { "runs": [{ "text": code }] },
            });
            if let Some(kind) = kind {
                track["kind"] = json!(kind);
            }
            track
        })
        .collect();

    json!({
        "playabilityStatus": { "status": "OK" },
        "captions": {
            "playerCaptionsTracklistRenderer": { "captionTracks": tracks }
        }
    })
}

async fn mount_timed_text(server: &MockServer, lang: &str, xml: &str) {
    Mock::given(method("GET"))
        .and(path("/api/timedtext"))
        .and(query_param("lang", lang))
        .respond_with(ResponseTemplate::new(200).set_body_string(xml.to_string()))
        .mount(server)
        .await;
}

fn video(url: &str, language: &str) -> RawInput {
    RawInput::VideoReference {
        url: url.to_string(),
        language: language.to_string(),
    }
}

#[tokio::test]
async fn video_transcript_is_fetched_and_summarized() {
    let server = MockServer::start().await;
    mount_watch_page(&server, "ABC123").await;
    mount_player(&server, player_with_tracks(&server, &[("en", None), ("hi", None)])).await;
    mount_timed_text(
        &server,
        "en",
        r#"<?xml version="1.0" encoding="utf-8" ?><transcript><text start="1.2" dur="1.0">world,</text><text start="0.0" dur="1.2">Hello</text><text start="2.2" dur="3.0">this is a
caption track that goes on</text></transcript>"#,
    )
    .await;

    let flow = workflow(&server.uri());
    let outcome = flow
        .run(video("https://www.youtube.com/watch?v=ABC123&t=10", "en"))
        .await
        .unwrap();

    assert_eq!(
        outcome.extracted.as_str(),
        "Hello world, this is a caption track that goes on"
    );
    assert_eq!(outcome.summary.text, "Hello world, this is a");
    assert!(!outcome.summary.truncated);
}

#[tokio::test]
async fn short_link_resolves_to_the_same_video() {
    let server = MockServer::start().await;
    mount_watch_page(&server, "ABC123").await;
    mount_player(&server, player_with_tracks(&server, &[("mr", Some("asr"))])).await;
    mount_timed_text(
        &server,
        "mr",
        r#"<transcript><text start="0" dur="1">namaskar</text></transcript>"#,
    )
    .await;

    let text = workflow(&server.uri())
        .extract(video("https://youtu.be/ABC123", "mr"))
        .await
        .unwrap();
    assert_eq!(text.as_str(), "namaskar");
}

#[tokio::test]
async fn missing_language_is_reported_as_unavailable() {
    let server = MockServer::start().await;
    mount_watch_page(&server, "ABC123").await;
    mount_player(&server, player_with_tracks(&server, &[("en", None)])).await;

    let err = workflow(&server.uri())
        .run(video("https://youtu.be/ABC123", "hi"))
        .await
        .unwrap_err();

    assert!(matches!(
        &err,
        WorkflowError::TranscriptUnavailable(TranscriptError::LanguageUnavailable { requested, .. })
            if requested == "hi"
    ));
    assert!(err.to_string().starts_with("transcript not available:"));
}

#[tokio::test]
async fn video_without_captions_is_reported_as_unavailable() {
    let server = MockServer::start().await;
    mount_watch_page(&server, "ABC123").await;
    mount_player(&server, json!({ "playabilityStatus": { "status": "OK" } })).await;

    let err = workflow(&server.uri())
        .run(video("https://youtu.be/ABC123", "en"))
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        WorkflowError::TranscriptUnavailable(TranscriptError::CaptionsDisabled(_))
    ));
}

#[tokio::test]
async fn unplayable_video_is_reported_as_unavailable() {
    let server = MockServer::start().await;
    mount_watch_page(&server, "ABC123").await;
    mount_player(
        &server,
        json!({ "playabilityStatus": { "status": "ERROR", "reason": "Video unavailable" } }),
    )
    .await;

    let err = workflow(&server.uri())
        .run(video("https://youtu.be/ABC123", "en"))
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        WorkflowError::TranscriptUnavailable(TranscriptError::VideoUnavailable(_, reason))
            if reason == "Video unavailable"
    ));
}

#[tokio::test]
async fn rate_limited_watch_page_is_reported_as_blocked() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/watch"))
        .respond_with(ResponseTemplate::new(429))
        .mount(&server)
        .await;

    let err = workflow(&server.uri())
        .run(video("https://youtu.be/ABC123", "en"))
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        WorkflowError::TranscriptUnavailable(TranscriptError::Blocked(_))
    ));
}

#[tokio::test]
async fn server_error_is_reported_as_network_failure() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/watch"))
        .respond_with(ResponseTemplate::new(500))
        .expect(1)
        .mount(&server)
        .await;

    let err = workflow(&server.uri())
        .run(video("https://youtu.be/ABC123", "en"))
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        WorkflowError::TranscriptUnavailable(TranscriptError::Network(_))
    ));
}

#[tokio::test]
async fn invalid_url_never_reaches_the_network() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let err = workflow(&server.uri())
        .run(video("https://example.com/video", "en"))
        .await
        .unwrap_err();
    assert!(matches!(err, WorkflowError::InvalidUrl(UrlError::Invalid(_))));
}

#[tokio::test]
async fn plain_text_round_trip() {
    let flow = workflow("http://127.0.0.1:9");
    let outcome = flow
        .run(RawInput::PlainText(
            "  Rust gives you memory safety without a garbage collector.  ".to_string(),
        ))
        .await
        .unwrap();
    assert_eq!(
        outcome.extracted.as_str(),
        "Rust gives you memory safety without a garbage collector."
    );
    assert_eq!(outcome.summary.text, "Rust gives you memory safety");
}

#[tokio::test]
async fn blank_text_is_empty_input() {
    let err = workflow("http://127.0.0.1:9")
        .run(RawInput::PlainText(" \n ".to_string()))
        .await
        .unwrap_err();
    assert!(matches!(err, WorkflowError::Extract(ExtractError::EmptyInput)));
}

#[tokio::test]
async fn failed_request_does_not_affect_the_next() {
    let flow = workflow("http://127.0.0.1:9");

    let err = flow
        .run(RawInput::DocumentBytes(b"%PDF-not really".to_vec()))
        .await
        .unwrap_err();
    assert!(matches!(err, WorkflowError::Extract(ExtractError::DocumentParse(_))));

    let outcome = flow
        .run(RawInput::PlainText("still works".to_string()))
        .await
        .unwrap();
    assert_eq!(outcome.summary.text, "still works");
}
