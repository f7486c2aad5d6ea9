//! Folds a reply stream into the message log

use super::decoder::{LineSplitter, Utf8StreamDecoder};
use super::frame::{parse_line, Fragment};
use crate::api::client::ensure_streamable;
use crate::messages::{LogMutator, Message, RetrievalSettings};
use crate::{RagChatError, Result};
use futures::{Stream, StreamExt};
use tracing::{debug, info, warn};

/// Payload shape expected on the stream
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamMode {
    /// `{"response": ...}` frames from the chat endpoint
    Text,
    /// `{"type": "transcription"|"assistant", "response": ...}` frames from the audio endpoint
    Audio,
}

/// Summary of one consumed stream
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConsumeReport {
    /// Raw bytes received
    pub bytes_read: usize,
    /// Fragments appended to a message
    pub frames_applied: usize,
    /// Malformed or unrecognized frames
    pub frames_skipped: usize,
    /// Error messages the backend sent inside the stream
    pub backend_errors: Vec<String>,
    /// Index of the user placeholder (audio mode only)
    pub user_index: Option<usize>,
    /// Index of the assistant placeholder
    pub assistant_index: usize,
}

/// Turns a byte stream into log mutations.
///
/// A consumer is used once: `consume` takes it by value, so when the stream
/// has ended nothing can touch the anchored messages through it anymore.
#[derive(Debug, Clone)]
pub struct StreamConsumer {
    mode: StreamMode,
    metadata: Option<RetrievalSettings>,
}

impl StreamConsumer {
    pub fn new(mode: StreamMode) -> Self {
        Self {
            mode,
            metadata: None,
        }
    }

    /// Retrieval settings to record on the assistant placeholder
    pub fn with_metadata(mut self, metadata: RetrievalSettings) -> Self {
        self.metadata = Some(metadata);
        self
    }

    pub fn mode(&self) -> StreamMode {
        self.mode
    }

    /// Check the response status and body, then consume its body stream.
    ///
    /// On a failed check the log is left untouched.
    pub async fn consume_response<L>(
        self,
        response: reqwest::Response,
        log: &L,
    ) -> Result<ConsumeReport>
    where
        L: LogMutator + ?Sized,
    {
        let response = ensure_streamable(response).await?;
        self.consume(response.bytes_stream(), log).await
    }

    /// Consume a stream of byte chunks until it ends.
    pub async fn consume<S, B, E, L>(self, stream: S, log: &L) -> Result<ConsumeReport>
    where
        S: Stream<Item = std::result::Result<B, E>>,
        B: AsRef<[u8]>,
        E: std::fmt::Display,
        L: LogMutator + ?Sized,
    {
        let mut stream = std::pin::pin!(stream);
        let mut fold = Fold::anchor(self.mode, self.metadata, log);
        let mut decoder = Utf8StreamDecoder::new();
        let mut lines = LineSplitter::new();

        while let Some(chunk) = stream.next().await {
            let chunk = chunk.map_err(|e| {
                warn!("Reply stream interrupted: {}", e);
                RagChatError::Network(e.to_string())
            })?;
            let bytes = chunk.as_ref();
            fold.report.bytes_read += bytes.len();

            let text = decoder.decode(bytes);
            for line in lines.push(&text) {
                fold.apply_line(&line, log);
            }
        }

        let tail = decoder.finish();
        for line in lines.push(&tail) {
            fold.apply_line(&line, log);
        }
        if let Some(line) = lines.finish() {
            fold.apply_line(&line, log);
        }

        info!(
            "Stream finished: {} bytes, {} fragments, {} skipped",
            fold.report.bytes_read, fold.report.frames_applied, fold.report.frames_skipped
        );
        Ok(fold.report)
    }
}

/// Running buffers plus the placeholder positions they write to
struct Fold {
    mode: StreamMode,
    transcription: String,
    reply: String,
    report: ConsumeReport,
}

impl Fold {
    /// Append the placeholders for `mode` and remember where they live
    fn anchor<L>(mode: StreamMode, metadata: Option<RetrievalSettings>, log: &L) -> Self
    where
        L: LogMutator + ?Sized,
    {
        let user_index = match mode {
            StreamMode::Text => None,
            StreamMode::Audio => Some(log.append(Message::user(""))),
        };

        let assistant = match metadata {
            Some(metadata) => Message::assistant("").with_metadata(metadata),
            None => Message::assistant(""),
        };
        let assistant_index = log.append(assistant);

        Self {
            mode,
            transcription: String::new(),
            reply: String::new(),
            report: ConsumeReport {
                user_index,
                assistant_index,
                ..Default::default()
            },
        }
    }

    fn apply_line<L>(&mut self, line: &str, log: &L)
    where
        L: LogMutator + ?Sized,
    {
        let Some(parsed) = parse_line(line, self.mode) else {
            return;
        };

        match parsed {
            Ok(Fragment::Text(text)) | Ok(Fragment::Assistant(text)) => {
                self.reply.push_str(&text);
                self.write(self.report.assistant_index, log, true);
            }
            Ok(Fragment::Transcription(text)) => match self.report.user_index {
                Some(index) => {
                    self.transcription.push_str(&text);
                    self.write(index, log, false);
                }
                None => self.report.frames_skipped += 1,
            },
            Ok(Fragment::BackendError(message)) => {
                warn!("Backend reported an error mid-stream: {}", message);
                self.report.backend_errors.push(message);
            }
            Ok(Fragment::Unrecognized) => {
                debug!("Ignoring frame with no usable payload: {}", line.trim());
                self.report.frames_skipped += 1;
            }
            Err(e) => {
                warn!("Failed to parse stream frame: {} ({})", e, line.trim());
                self.report.frames_skipped += 1;
            }
        }
    }

    fn write<L>(&mut self, index: usize, log: &L, reply: bool)
    where
        L: LogMutator + ?Sized,
    {
        let content = if reply { &self.reply } else { &self.transcription };
        if log.update_content(index, content) {
            self.report.frames_applied += 1;
        } else {
            warn!("Message {} vanished from the log, dropping fragment", index);
            self.report.frames_skipped += 1;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::messages::{MessageLog, Role};
    use futures::stream;
    use std::convert::Infallible;

    fn chunks(parts: &[&[u8]]) -> impl Stream<Item = std::result::Result<Vec<u8>, Infallible>> {
        stream::iter(
            parts
                .iter()
                .map(|p| Ok(p.to_vec()))
                .collect::<Vec<_>>(),
        )
    }

    #[tokio::test]
    async fn test_text_mode_appends_one_placeholder() {
        let log = MessageLog::new();
        let report = StreamConsumer::new(StreamMode::Text)
            .with_metadata(RetrievalSettings::default())
            .consume(chunks(&[]), &log)
            .await
            .unwrap();

        assert_eq!(log.len(), 1);
        assert_eq!(report.assistant_index, 0);
        assert_eq!(report.user_index, None);
        let message = log.get(0).unwrap();
        assert_eq!(message.role(), Role::Assistant);
        assert!(message.content.is_empty());
        assert_eq!(message.metadata(), Some(&RetrievalSettings::default()));
    }

    #[tokio::test]
    async fn test_audio_mode_appends_pair() {
        let log = MessageLog::new();
        log.append(Message::user("earlier"));

        let report = StreamConsumer::new(StreamMode::Audio)
            .consume(chunks(&[]), &log)
            .await
            .unwrap();

        assert_eq!(report.user_index, Some(1));
        assert_eq!(report.assistant_index, 2);
        assert_eq!(log.get(1).unwrap().role(), Role::User);
        assert_eq!(log.get(2).unwrap().role(), Role::Assistant);
    }

    #[tokio::test]
    async fn test_unterminated_last_frame_is_applied() {
        let log = MessageLog::new();
        let report = StreamConsumer::new(StreamMode::Text)
            .consume(chunks(&[b"data: {\"response\":\"end\"}"]), &log)
            .await
            .unwrap();

        assert_eq!(log.get(0).unwrap().content, "end");
        assert_eq!(report.frames_applied, 1);
    }

    #[tokio::test]
    async fn test_backend_error_frames_are_collected() {
        let log = MessageLog::new();
        let report = StreamConsumer::new(StreamMode::Text)
            .consume(
                chunks(&[b"data: {\"response\":\"par\"}\n\ndata: {\"error\":\"llm timeout\"}\n\n"]),
                &log,
            )
            .await
            .unwrap();

        assert_eq!(log.get(0).unwrap().content, "par");
        assert_eq!(report.backend_errors, vec!["llm timeout".to_string()]);
    }

    #[tokio::test]
    async fn test_read_error_surfaces_as_network_error() {
        let log = MessageLog::new();
        let failing = stream::iter(vec![
            Ok(b"data: {\"response\":\"a\"}\n".to_vec()),
            Err("connection reset"),
        ]);

        let result = StreamConsumer::new(StreamMode::Text)
            .consume(failing, &log)
            .await;

        assert!(matches!(result, Err(RagChatError::Network(_))));
        assert_eq!(log.get(0).unwrap().content, "a");
    }
}
