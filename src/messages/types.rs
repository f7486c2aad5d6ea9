use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

/// Retrieval configuration attached to outgoing chat requests.
///
/// The values are opaque to the client; the backend decides what they mean.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetrievalSettings {
    pub approach: String,
    pub chunk_size: String,
    pub retriever: String,
}

impl RetrievalSettings {
    pub const APPROACHES: [&'static str; 2] = ["Native-chunking", "Late-chunking"];
    pub const CHUNK_SIZES: [&'static str; 2] = ["750", "250"];
    pub const RETRIEVERS: [&'static str; 4] = [
        "Similarity-research",
        "Contextual-Compression",
        "Parent-document",
        "Hybrid-fusion",
    ];

    pub fn new(
        approach: impl Into<String>,
        chunk_size: impl Into<String>,
        retriever: impl Into<String>,
    ) -> Self {
        Self {
            approach: approach.into(),
            chunk_size: chunk_size.into(),
            retriever: retriever.into(),
        }
    }
}

impl Default for RetrievalSettings {
    fn default() -> Self {
        Self::new(
            Self::APPROACHES[0],
            Self::CHUNK_SIZES[0],
            Self::RETRIEVERS[0],
        )
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    pub id: Uuid,
    role: Role,
    pub content: String,
    pub timestamp: DateTime<Utc>,
    metadata: Option<RetrievalSettings>,
}

impl Message {
    pub fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            role,
            content: content.into(),
            timestamp: Utc::now(),
            metadata: None,
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self::new(Role::User, content)
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new(Role::Assistant, content)
    }

    /// Attach the retrieval settings in effect when this reply was requested.
    pub fn with_metadata(mut self, metadata: RetrievalSettings) -> Self {
        self.metadata = Some(metadata);
        self
    }

    pub fn role(&self) -> Role {
        self.role
    }

    pub fn metadata(&self) -> Option<&RetrievalSettings> {
        self.metadata.as_ref()
    }

    pub fn is_user(&self) -> bool {
        self.role == Role::User
    }

    pub fn is_assistant(&self) -> bool {
        self.role == Role::Assistant
    }
}
