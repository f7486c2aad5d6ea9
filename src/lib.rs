pub mod api;
pub mod audio;
pub mod chat;
pub mod config;
pub mod messages;
pub mod stream;
pub mod ui;

use thiserror::Error;

#[derive(Error, Debug, Clone)]
pub enum RagChatError {
    #[error("HTTP status {status}: {body}")]
    HttpStatus { status: u16, body: String },

    #[error("Stream unavailable: {0}")]
    StreamUnavailable(String),

    #[error("JSON parse error: {0}")]
    JsonParse(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Microphone permission denied: {0}")]
    PermissionDenied(String),

    #[error("Audio device error: {0}")]
    AudioDevice(String),

    #[error("Audio processing error: {0}")]
    AudioProcessing(String),

    #[error("IO error: {0}")]
    IO(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("A conversational turn is already in progress")]
    SessionBusy,

    #[error("Channel error: {0}")]
    Channel(String),
}

impl From<std::io::Error> for RagChatError {
    fn from(e: std::io::Error) -> Self {
        RagChatError::IO(e.to_string())
    }
}

impl From<serde_json::Error> for RagChatError {
    fn from(e: serde_json::Error) -> Self {
        RagChatError::JsonParse(e.to_string())
    }
}

impl From<reqwest::Error> for RagChatError {
    fn from(e: reqwest::Error) -> Self {
        RagChatError::Network(e.to_string())
    }
}

impl RagChatError {
    /// Check if this error is recoverable
    pub fn is_recoverable(&self) -> bool {
        match self {
            // The backend may answer differently on the next turn
            RagChatError::HttpStatus { .. } => true,
            RagChatError::StreamUnavailable(_) => true,
            // Malformed frames are skipped, the stream carries on
            RagChatError::JsonParse(_) => true,
            RagChatError::Network(_) => true,
            // The user has to grant access first
            RagChatError::PermissionDenied(_) => false,
            RagChatError::AudioDevice(_) => false,
            RagChatError::AudioProcessing(_) => true,
            RagChatError::IO(_) => false,
            RagChatError::Config(_) => false,
            RagChatError::SessionBusy => true,
            RagChatError::Channel(_) => false,
        }
    }

    /// Get a user-friendly description
    pub fn user_message(&self) -> String {
        match self {
            RagChatError::HttpStatus { status, .. } => format!("Server error: {}", status),
            RagChatError::StreamUnavailable(_) => "Stream error: no response body".to_string(),
            RagChatError::JsonParse(_) => "Received a malformed reply fragment.".to_string(),
            RagChatError::Network(_) => "Network error".to_string(),
            RagChatError::PermissionDenied(_) => {
                "Microphone access was denied. Please allow access to record your voice."
                    .to_string()
            }
            RagChatError::AudioDevice(_) => {
                "Audio device error. Please check your microphone.".to_string()
            }
            RagChatError::AudioProcessing(_) => {
                "Failed to process audio. Please try again.".to_string()
            }
            RagChatError::IO(_) => "File system error occurred.".to_string(),
            RagChatError::Config(_) => "Configuration error. Please check settings.".to_string(),
            RagChatError::SessionBusy => {
                "Please wait for the current reply to finish.".to_string()
            }
            RagChatError::Channel(_) => {
                "Internal communication error. Please restart the application.".to_string()
            }
        }
    }
}

pub type Result<T> = std::result::Result<T, RagChatError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_http_status_message_carries_code() {
        let err = RagChatError::HttpStatus {
            status: 500,
            body: "boom".to_string(),
        };
        assert_eq!(err.user_message(), "Server error: 500");
        assert!(err.to_string().contains("boom"));
        assert!(err.is_recoverable());
    }

    #[test]
    fn test_permission_denied_is_not_recoverable() {
        let err = RagChatError::PermissionDenied("no device".to_string());
        assert!(!err.is_recoverable());
    }

    #[test]
    fn test_json_error_conversion() {
        let err: RagChatError = serde_json::from_str::<serde_json::Value>("{oops")
            .unwrap_err()
            .into();
        assert!(matches!(err, RagChatError::JsonParse(_)));
    }
}
