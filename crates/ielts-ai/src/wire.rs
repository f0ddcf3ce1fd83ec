//! Messages API wire format types

use serde::{Deserialize, Serialize};

// -- Request types --

/// Messages API request body
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessagesRequest {
    /// Model identifier
    pub model: String,
    /// Maximum tokens to generate (required by the provider)
    pub max_tokens: u32,
    /// Sampling temperature
    pub temperature: f64,
    /// System prompt (top-level, not in messages)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub system: Option<String>,
    /// Conversation messages
    pub messages: Vec<WireMessage>,
}

/// Message in a request body
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WireMessage {
    /// Role ("user" or "assistant")
    pub role: String,
    /// Plain text content
    pub content: String,
}

impl WireMessage {
    pub fn user(content: &str) -> Self {
        Self {
            role: "user".to_owned(),
            content: content.to_owned(),
        }
    }

    pub fn assistant(content: &str) -> Self {
        Self {
            role: "assistant".to_owned(),
            content: content.to_owned(),
        }
    }
}

// -- Response types --

/// Messages API response envelope
///
/// Every field is optional so that a partial envelope still parses and the
/// caller can tell "no text" apart from "not JSON".
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MessagesResponse {
    /// Response identifier
    #[serde(default)]
    pub id: Option<String>,
    /// Model used
    #[serde(default)]
    pub model: Option<String>,
    /// Response content blocks
    #[serde(default)]
    pub content: Vec<ResponseBlock>,
    /// Stop reason
    #[serde(default)]
    pub stop_reason: Option<String>,
    /// Token usage
    #[serde(default)]
    pub usage: Option<Usage>,
}

impl MessagesResponse {
    /// Text of the first content block, if it has any
    pub fn first_text(&self) -> Option<&str> {
        self.content
            .first()
            .and_then(|block| block.text.as_deref())
            .filter(|text| !text.is_empty())
    }
}

/// Content block in a response
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ResponseBlock {
    /// Block type ("text", "tool_use", ...)
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub block_type: Option<String>,
    /// Text for text blocks
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
}

/// Token usage statistics
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Usage {
    /// Input tokens consumed
    #[serde(default)]
    pub input_tokens: u32,
    /// Output tokens generated
    #[serde(default)]
    pub output_tokens: u32,
}
