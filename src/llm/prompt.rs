//! Wire types for OpenAI-compatible `/v1/chat/completions`.
//!
//! The correction instruction travels as the system message and the
//! user's selection, verbatim, as the user message.

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Request
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChatMessage<'a> {
    pub role: &'static str,
    pub content: &'a str,
}

/// Request body for one correction attempt.
///
/// # Example
/// ```rust
/// use text_corrector::llm::ChatRequest;
///
/// let req = ChatRequest::correction("gpt-4o-mini", 0.3, "Fix grammar.", "hello wrld");
/// assert_eq!(req.messages[0].role, "system");
/// assert_eq!(req.messages[1].content, "hello wrld");
/// ```
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChatRequest<'a> {
    pub model: &'a str,
    pub messages: [ChatMessage<'a>; 2],
    pub temperature: f32,
    pub stream: bool,
}

impl<'a> ChatRequest<'a> {
    pub fn correction(model: &'a str, temperature: f32, prompt: &'a str, text: &'a str) -> Self {
        Self {
            model,
            messages: [
                ChatMessage {
                    role: "system",
                    content: prompt,
                },
                ChatMessage {
                    role: "user",
                    content: text,
                },
            ],
            temperature,
            stream: false,
        }
    }
}

// ---------------------------------------------------------------------------
// Response
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
pub struct ChatResponse {
    #[serde(default)]
    pub choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
pub struct ChatChoice {
    pub message: ChatReply,
}

#[derive(Debug, Deserialize)]
pub struct ChatReply {
    #[serde(default)]
    pub content: Option<String>,
}

impl ChatResponse {
    /// Text of the first choice, exactly as returned.  `None` when absent
    /// or blank.
    pub fn into_text(self) -> Option<String> {
        self.choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .filter(|s| !s.trim().is_empty())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
