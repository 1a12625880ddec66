// SPDX-License-Identifier: GPL-3.0-or-later

use std::io::Cursor;
use std::time::Duration;

use async_trait::async_trait;
use hound::{SampleFormat, WavSpec, WavWriter};
use mixid_domain::Match;
use reqwest::multipart::{Form, Part};
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use tracing::{debug, trace};
use url::Url;

use crate::error::{RecognitionError, Result};
use crate::recognizer::RecognitionService;

const AUDD_API_BASE: &str = "https://api.audd.io";
const USER_AGENT: &str = concat!("mixid/", env!("CARGO_PKG_VERSION"));

/// Segment sample rate produced by the extractor.
pub const SAMPLE_RATE: u32 = 16_000;

/// Client for AudD-compatible recognition endpoints.
#[derive(Debug, Clone)]
pub struct AuddClient {
    client: Client,
    base_url: String,
    api_token: Option<String>,
}

impl AuddClient {
    pub fn builder() -> AuddClientBuilder {
        AuddClientBuilder::default()
    }

    fn endpoint(&self) -> String {
        format!("{}/", self.base_url.trim_end_matches('/'))
    }

    async fn submit(&self, wav: Vec<u8>) -> Result<Option<Match>> {
        let part = Part::bytes(wav)
            .file_name("segment.wav")
            .mime_str("audio/wav")?;
        let mut form = Form::new().part("file", part);
        if let Some(token) = &self.api_token {
            form = form.text("api_token", token.clone());
        }

        let response = self
            .client
            .post(self.endpoint())
            .multipart(form)
            .send()
            .await?;

        let status = response.status();
        debug!(target: "recognition", "recognition response status: {}", status);

        let body = response.text().await?;
        trace!(target: "recognition", "recognition response: {}", body);

        classify_response(status, &body)
    }
}

#[async_trait]
impl RecognitionService for AuddClient {
    async fn identify(&self, pcm: &[u8]) -> Result<Option<Match>> {
        let wav = pcm_to_wav(pcm)?;
        self.submit(wav).await
    }
}

/// Map an HTTP reply onto match / no match / rate limited / hard failure.
fn classify_response(status: StatusCode, body: &str) -> Result<Option<Match>> {
    if status == StatusCode::TOO_MANY_REQUESTS {
        return Err(RecognitionError::RateLimited(format!("HTTP {}", status)));
    }

    if looks_like_html(body) {
        return Err(RecognitionError::RateLimited(format!(
            "HTTP {}: HTML page instead of JSON",
            status
        )));
    }

    let value: serde_json::Value = serde_json::from_str(body).map_err(|e| {
        RecognitionError::RateLimited(format!("response is not valid JSON: {}", e))
    })?;

    if !status.is_success() {
        return Err(RecognitionError::ApiError(format!("HTTP {}: {}", status, body)));
    }

    let parsed: AuddResponse = serde_json::from_value(value).map_err(|e| {
        RecognitionError::ApiError(format!("unexpected response shape: {}", e))
    })?;

    if !parsed.status.eq_ignore_ascii_case("success") {
        let message = parsed
            .error
            .map(|e| match (e.error_code, e.error_message) {
                (Some(code), Some(message)) => format!("#{}: {}", code, message),
                (None, Some(message)) => message,
                (Some(code), None) => format!("#{}", code),
                (None, None) => "Unknown error".to_string(),
            })
            .unwrap_or_else(|| "Unknown error".to_string());
        return Err(RecognitionError::ApiError(message));
    }

    Ok(parsed.result.map(AuddTrack::into_match))
}

fn looks_like_html(body: &str) -> bool {
    let head = body.trim_start();
    let prefix: String = head.chars().take(15).collect::<String>().to_ascii_lowercase();
    prefix.starts_with("<!doctype") || prefix.starts_with("<html")
}

/// Wrap raw s16le mono PCM in a WAV container.
pub fn pcm_to_wav(pcm: &[u8]) -> Result<Vec<u8>> {
    if pcm.len() < 2 {
        return Err(RecognitionError::AudioProcessing(
            "segment contains no samples".to_string(),
        ));
    }

    let spec = WavSpec {
        channels: 1,
        sample_rate: SAMPLE_RATE,
        bits_per_sample: 16,
        sample_format: SampleFormat::Int,
    };

    let mut buffer = Cursor::new(Vec::with_capacity(pcm.len() + 44));
    {
        let mut writer = WavWriter::new(&mut buffer, spec).map_err(|e| {
            RecognitionError::AudioProcessing(format!("Failed to create WAV writer: {}", e))
        })?;

        for chunk in pcm.chunks_exact(2) {
            writer
                .write_sample(i16::from_le_bytes([chunk[0], chunk[1]]))
                .map_err(|e| {
                    RecognitionError::AudioProcessing(format!("Failed to write sample: {}", e))
                })?;
        }

        writer.finalize().map_err(|e| {
            RecognitionError::AudioProcessing(format!("Failed to finalize WAV: {}", e))
        })?;
    }

    Ok(buffer.into_inner())
}

#[derive(Debug, Deserialize)]
struct AuddResponse {
    status: String,
    #[serde(default)]
    result: Option<AuddTrack>,
    #[serde(default)]
    error: Option<AuddApiError>,
}

#[derive(Debug, Deserialize)]
struct AuddTrack {
    title: Option<String>,
    artist: Option<String>,
    album: Option<String>,
    release_date: Option<String>,
}

impl AuddTrack {
    fn into_match(self) -> Match {
        let non_empty = |value: Option<String>| value.filter(|s| !s.trim().is_empty());
        Match {
            title: non_empty(self.title).unwrap_or_else(|| "Unknown".to_string()),
            artist: non_empty(self.artist).unwrap_or_else(|| "Unknown".to_string()),
            album: non_empty(self.album),
            year: non_empty(self.release_date).map(|date| date.chars().take(4).collect()),
        }
    }
}

#[derive(Debug, Deserialize)]
struct AuddApiError {
    error_code: Option<i64>,
    error_message: Option<String>,
}

/// Builder for the recognition client.
#[derive(Debug)]
pub struct AuddClientBuilder {
    api_token: Option<String>,
    base_url: String,
    timeout: Duration,
}

impl Default for AuddClientBuilder {
    fn default() -> Self {
        Self {
            api_token: None,
            base_url: AUDD_API_BASE.to_string(),
            timeout: Duration::from_secs(30),
        }
    }
}

impl AuddClientBuilder {
    pub fn api_token(mut self, token: impl Into<String>) -> Self {
        self.api_token = Some(token.into());
        self
    }

    /// Set a custom base URL (useful for testing).
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Build the client.
    ///
    /// # Errors
    /// Returns an error if the base URL is malformed or the HTTP client cannot be created.
    pub fn build(self) -> Result<AuddClient> {
        Url::parse(&self.base_url)
            .map_err(|e| RecognitionError::InvalidConfig(format!("Invalid base URL: {}", e)))?;

        let client = Client::builder()
            .timeout(self.timeout)
            .user_agent(USER_AGENT)
            .build()?;

        Ok(AuddClient {
            client,
            base_url: self.base_url,
            api_token: self.api_token,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::delay::RecordingDelay;
    use crate::recognizer::{Recognizer, RetryPolicy};
    use std::sync::Arc;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const RATE_LIMIT_PAGE: &str =
        "<!DOCTYPE html><html><head><title>Too busy</title></head><body>Try later</body></html>";

    fn pcm() -> Vec<u8> {
        (0..1600i16).flat_map(|s| s.to_le_bytes()).collect()
    }

    fn match_response() -> serde_json::Value {
        serde_json::json!({
            "status": "success",
            "result": {
                "artist": "Daft Punk",
                "title": "Around the World",
                "album": "Homework",
                "release_date": "1997-01-20",
                "label": "Virgin"
            }
        })
    }

    async fn client_for(server: &MockServer) -> AuddClient {
        AuddClient::builder()
            .api_token("test-token")
            .base_url(server.uri())
            .build()
            .unwrap()
    }

    #[tokio::test]
    async fn identifies_a_match() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/"))
            .respond_with(ResponseTemplate::new(200).set_body_json(match_response()))
            .mount(&server)
            .await;

        let found = client_for(&server).await.identify(&pcm()).await.unwrap();

        assert_eq!(
            found,
            Some(
                Match::new("Around the World", "Daft Punk")
                    .with_album("Homework")
                    .with_year("1997")
            )
        );
    }

    #[tokio::test]
    async fn null_result_is_no_match() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(serde_json::json!({"status": "success", "result": null})),
            )
            .mount(&server)
            .await;

        let found = client_for(&server).await.identify(&pcm()).await.unwrap();
        assert_eq!(found, None);
    }

    #[tokio::test]
    async fn missing_fields_fall_back() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "status": "success",
                "result": { "title": "Untitled", "album": "", "release_date": null }
            })))
            .mount(&server)
            .await;

        let found = client_for(&server)
            .await
            .identify(&pcm())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(found.title, "Untitled");
        assert_eq!(found.artist, "Unknown");
        assert_eq!(found.album, None);
        assert_eq!(found.year, None);
    }

    #[tokio::test]
    async fn html_page_is_rate_limited() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_string(RATE_LIMIT_PAGE))
            .mount(&server)
            .await;

        let err = client_for(&server)
            .await
            .identify(&pcm())
            .await
            .unwrap_err();
        assert!(err.is_rate_limited(), "unexpected error: {:?}", err);
    }

    #[tokio::test]
    async fn too_many_requests_is_rate_limited() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(429))
            .mount(&server)
            .await;

        let err = client_for(&server)
            .await
            .identify(&pcm())
            .await
            .unwrap_err();
        assert!(err.is_rate_limited());
    }

    #[tokio::test]
    async fn api_error_is_hard_failure() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "status": "error",
                "error": { "error_code": 900, "error_message": "Wrong API token" }
            })))
            .mount(&server)
            .await;

        let err = client_for(&server)
            .await
            .identify(&pcm())
            .await
            .unwrap_err();
        assert!(!err.is_rate_limited());
        match err {
            RecognitionError::ApiError(message) => assert!(message.contains("Wrong API token")),
            other => panic!("Expected ApiError, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn server_error_with_json_is_hard_failure() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(
                ResponseTemplate::new(500).set_body_json(serde_json::json!({"status": "error"})),
            )
            .mount(&server)
            .await;

        let err = client_for(&server)
            .await
            .identify(&pcm())
            .await
            .unwrap_err();
        assert!(matches!(err, RecognitionError::ApiError(_)));
    }

    #[tokio::test]
    async fn unexpected_json_shape_is_hard_failure() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(serde_json::json!({"result": null})),
            )
            .mount(&server)
            .await;

        let delay = RecordingDelay::new();
        let recognizer = Recognizer::new(
            client_for(&server).await,
            RetryPolicy::default(),
            Arc::new(delay.clone()),
        );

        let err = recognizer.recognize(&pcm()).await.unwrap_err();

        assert!(!err.is_rate_limited(), "unexpected error: {:?}", err);
        assert!(matches!(err, RecognitionError::ApiError(_)));
        assert!(delay.waits().is_empty());
        assert_eq!(server.received_requests().await.unwrap().len(), 1);
    }

    #[test]
    fn mistyped_field_is_hard_failure() {
        let err = classify_response(
            StatusCode::OK,
            r#"{"status":"success","result":{"title":123}}"#,
        )
        .unwrap_err();
        assert!(matches!(err, RecognitionError::ApiError(_)));
    }

    #[test]
    fn non_json_body_is_rate_limited() {
        let err = classify_response(StatusCode::OK, "Service temporarily unavailable").unwrap_err();
        assert!(err.is_rate_limited());
    }

    #[tokio::test]
    async fn recognizer_retries_through_rate_limit_pages() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_string(RATE_LIMIT_PAGE))
            .up_to_n_times(2)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(match_response()))
            .mount(&server)
            .await;

        let delay = RecordingDelay::new();
        let recognizer = Recognizer::new(
            client_for(&server).await,
            RetryPolicy::default(),
            Arc::new(delay.clone()),
        );

        let found = recognizer.recognize(&pcm()).await.unwrap().unwrap();

        assert_eq!(found.title, "Around the World");
        assert_eq!(
            delay.waits(),
            vec![Duration::from_secs(10), Duration::from_secs(20)]
        );
        assert_eq!(server.received_requests().await.unwrap().len(), 3);
    }

    #[test]
    fn empty_segment_is_rejected() {
        assert!(matches!(
            pcm_to_wav(&[]),
            Err(RecognitionError::AudioProcessing(_))
        ));
    }

    #[test]
    fn wav_wrapping_preserves_samples() {
        let wav = pcm_to_wav(&pcm()).unwrap();
        let reader = hound::WavReader::new(Cursor::new(wav)).unwrap();
        assert_eq!(reader.spec().sample_rate, SAMPLE_RATE);
        assert_eq!(reader.spec().channels, 1);
        assert_eq!(reader.len(), 1600);
    }

    #[test]
    fn invalid_base_url_is_rejected() {
        let result = AuddClient::builder().base_url("not-a-valid-url").build();
        assert!(matches!(result, Err(RecognitionError::InvalidConfig(_))));
    }
}
