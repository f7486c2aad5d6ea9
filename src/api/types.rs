use crate::messages::RetrievalSettings;
use serde::{Deserialize, Serialize};

/// Body of `POST /chat/`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatRequest {
    pub content: String,
    #[serde(rename = "selectedapproach")]
    pub approach: String,
    #[serde(rename = "selectedChunkSize")]
    pub chunk_size: String,
    #[serde(rename = "selectedapproachRetriever")]
    pub retriever: String,
}

impl ChatRequest {
    pub fn new(content: impl Into<String>, settings: &RetrievalSettings) -> Self {
        Self {
            content: content.into(),
            approach: settings.approach.clone(),
            chunk_size: settings.chunk_size.clone(),
            retriever: settings.retriever.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wire_field_names() {
        let request = ChatRequest::new(
            "Quando è stato approvato il PNRR?",
            &RetrievalSettings::new("Late-chunking", "250", "Hybrid-fusion"),
        );
        let value = serde_json::to_value(&request).unwrap();

        assert_eq!(value["content"], "Quando è stato approvato il PNRR?");
        assert_eq!(value["selectedapproach"], "Late-chunking");
        assert_eq!(value["selectedChunkSize"], "250");
        assert_eq!(value["selectedapproachRetriever"], "Hybrid-fusion");
    }
}
