use serde::{Deserialize, Serialize};

/// A disaster message as read from the messages file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageRecord {
    /// Unique identifier
    pub id: i64,

    /// Message text (English translation)
    pub message: String,

    /// Text in the original language, when the message was translated
    #[serde(default)]
    pub original: Option<String>,

    /// Source genre ("news", "social", "direct", ...)
    pub genre: String,
}

/// Packed category labels for one message
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryAssignment {
    /// Identifier of the labelled message
    pub id: i64,

    /// `name-value` tokens separated by `;`
    pub categories: String,
}

/// A message joined with its packed categories
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JoinedRecord {
    pub id: i64,
    pub message: String,
    pub original: Option<String>,
    pub genre: String,

    /// `None` when no category row matched the message
    pub categories: Option<String>,
}

impl JoinedRecord {
    pub fn new(message: MessageRecord, categories: Option<String>) -> Self {
        Self {
            id: message.id,
            message: message.message,
            original: message.original,
            genre: message.genre,
            categories,
        }
    }
}
