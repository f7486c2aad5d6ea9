use super::types::ChatRequest;
use crate::{RagChatError, Result};
use reqwest::header::ACCEPT;
use reqwest::multipart::{Form, Part};
use reqwest::Response;
use tracing::{debug, error, info};

const CHAT_PATH: &str = "chat/";
const AUDIO_PATH: &str = "process_audio/";
const DELETE_PATH: &str = "delete_chat/";

/// Multipart field and file name the audio endpoint expects
pub const AUDIO_FIELD: &str = "audio";
pub const AUDIO_FILE_NAME: &str = "audio.wav";
pub const AUDIO_MIME: &str = "audio/wav";

/// Client for the three backend endpoints
#[derive(Debug, Clone)]
pub struct RagClient {
    http: reqwest::Client,
    base_url: String,
}

impl RagClient {
    pub fn new(base_url: impl Into<String>) -> Result<Self> {
        let http = reqwest::Client::builder()
            .user_agent(concat!("ragchat/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| RagChatError::Config(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            http,
            base_url: base_url.into(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.base_url.trim_end_matches('/'), path)
    }

    /// Submit a text turn. The response body is a `data:` framed stream.
    pub async fn post_chat(&self, request: &ChatRequest) -> Result<Response> {
        let url = self.endpoint(CHAT_PATH);
        debug!("POST {} ({} chars)", url, request.content.len());

        self.http
            .post(&url)
            .header(ACCEPT, "text/event-stream")
            .json(request)
            .send()
            .await
            .map_err(|e| {
                error!("Chat request failed: {}", e);
                RagChatError::Network(e.to_string())
            })
    }

    /// Upload a recorded WAV clip. The response body is a `data:` framed stream.
    pub async fn post_audio(&self, wav: Vec<u8>) -> Result<Response> {
        let url = self.endpoint(AUDIO_PATH);
        debug!("POST {} ({} bytes of audio)", url, wav.len());

        let part = Part::bytes(wav)
            .file_name(AUDIO_FILE_NAME)
            .mime_str(AUDIO_MIME)
            .map_err(|e| {
                RagChatError::AudioProcessing(format!("Failed to build multipart audio part: {}", e))
            })?;
        let form = Form::new().part(AUDIO_FIELD, part);

        self.http
            .post(&url)
            .multipart(form)
            .send()
            .await
            .map_err(|e| {
                error!("Audio upload failed: {}", e);
                RagChatError::Network(e.to_string())
            })
    }

    /// Ask the backend to forget the conversation
    pub async fn delete_chat(&self) -> Result<()> {
        let url = self.endpoint(DELETE_PATH);
        debug!("DELETE {}", url);

        let response = self.http.delete(&url).send().await.map_err(|e| {
            error!("Delete chat request failed: {}", e);
            RagChatError::Network(e.to_string())
        })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            error!("Delete chat failed with status {}: {}", status, body);
            return Err(RagChatError::HttpStatus {
                status: status.as_u16(),
                body,
            });
        }

        info!("Server-side conversation cleared");
        Ok(())
    }
}

/// Reject responses that cannot carry a reply stream.
///
/// A non-success status becomes `HttpStatus` with the body text; a body that
/// is declared empty becomes `StreamUnavailable`.
pub async fn ensure_streamable(response: Response) -> Result<Response> {
    let status = response.status();
    if !status.is_success() {
        let body = response
            .text()
            .await
            .unwrap_or_else(|_| "Failed to read error response".to_string());
        error!("Server error {}: {}", status, body);
        return Err(RagChatError::HttpStatus {
            status: status.as_u16(),
            body,
        });
    }

    if response.content_length() == Some(0) {
        error!("Response with status {} has no body", status);
        return Err(RagChatError::StreamUnavailable("no response body".to_string()));
    }

    Ok(response)
}
