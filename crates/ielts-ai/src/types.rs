//! Provider-agnostic request types

use serde::{Deserialize, Serialize};

use crate::validation::{self, ValidationError};
use crate::wire::{MessagesRequest, WireMessage};

/// Sampling temperature used when a request does not set one
pub const DEFAULT_TEMPERATURE: f64 = 0.3;

/// Longest prompt accepted for a single message, in characters
pub const MAX_MESSAGE_CHARS: usize = 100_000;

/// Role of a message author
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// System instruction
    System,
    /// User message
    User,
    /// Assistant response
    Assistant,
}

/// Message in a conversation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    /// Role of the message author
    pub role: Role,
    /// Message text
    pub content: String,
}

impl Message {
    pub fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
        }
    }
}

/// A single completion request
///
/// Built once with the `with_*` methods and then only read.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AiRequest {
    model: String,
    max_tokens: u32,
    temperature: f64,
    messages: Vec<Message>,
}

impl AiRequest {
    /// Start a request for `model` with an output token ceiling
    pub fn new(model: impl Into<String>, max_tokens: u32) -> Self {
        Self {
            model: model.into(),
            max_tokens,
            temperature: DEFAULT_TEMPERATURE,
            messages: Vec::new(),
        }
    }

    #[must_use]
    pub const fn with_temperature(mut self, temperature: f64) -> Self {
        self.temperature = temperature;
        self
    }

    #[must_use]
    pub fn with_message(mut self, role: Role, content: impl Into<String>) -> Self {
        self.messages.push(Message::new(role, content));
        self
    }

    #[must_use]
    pub fn with_system(self, content: impl Into<String>) -> Self {
        self.with_message(Role::System, content)
    }

    #[must_use]
    pub fn with_user(self, content: impl Into<String>) -> Self {
        self.with_message(Role::User, content)
    }

    #[must_use]
    pub fn with_assistant(self, content: impl Into<String>) -> Self {
        self.with_message(Role::Assistant, content)
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub const fn max_tokens(&self) -> u32 {
        self.max_tokens
    }

    pub const fn temperature(&self) -> f64 {
        self.temperature
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    /// Check the request before anything is sent
    ///
    /// # Errors
    ///
    /// Returns the first field that fails validation
    pub fn validate(&self) -> Result<(), ValidationError> {
        validation::require_non_empty("model", &self.model)?;
        validation::require_positive("max_tokens", self.max_tokens)?;
        validation::require_range("temperature", self.temperature, 0.0, 1.0)?;

        if self.messages.is_empty() {
            return Err(ValidationError::new("messages", "must contain at least one message"));
        }

        for message in &self.messages {
            validation::require_non_empty("messages.content", &message.content)?;
            validation::require_max_len("messages.content", &message.content, MAX_MESSAGE_CHARS)?;
        }

        if self.messages.iter().all(|m| m.role == Role::System) {
            return Err(ValidationError::new(
                "messages",
                "must contain at least one user or assistant message",
            ));
        }

        Ok(())
    }
}

impl From<&AiRequest> for MessagesRequest {
    fn from(request: &AiRequest) -> Self {
        let system: Vec<&str> = request
            .messages
            .iter()
            .filter(|m| m.role == Role::System)
            .map(|m| m.content.as_str())
            .collect();

        let messages = request
            .messages
            .iter()
            .filter_map(|m| match m.role {
                Role::System => None,
                Role::User => Some(WireMessage::user(&m.content)),
                Role::Assistant => Some(WireMessage::assistant(&m.content)),
            })
            .collect();

        Self {
            model: request.model.clone(),
            max_tokens: request.max_tokens,
            temperature: request.temperature,
            system: (!system.is_empty()).then(|| system.join("\n\n")),
            messages,
        }
    }
}
