//! Buddy chat client
//!
//! The relay endpoint is opaque: it takes a bounded history of role/content
//! pairs and answers `{ reply }` or `{ error }`. Replies are shown after a
//! human-looking delay.

use rand::Rng;
use serde::{Deserialize, Serialize};

/// Content beyond this many characters is cut before sending
pub const MAX_CONTENT_CHARS: usize = 1200;
/// Only the most recent turns are sent
pub const MAX_HISTORY_TURNS: usize = 12;
/// First line shown in the log
pub const GREETING: &str = "Hey, you're online. Want to chat?";

/// Reply delay: base, per-character, cap and jitter (ms)
pub const REPLY_BASE_MS: u32 = 700;
pub const REPLY_PER_CHAR_MS: u32 = 14;
pub const REPLY_READ_CAP_MS: u32 = 1700;
pub const REPLY_JITTER_MS: u32 = 260;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
    System,
}

impl Role {
    /// Name shown before the message
    pub fn speaker(&self) -> &'static str {
        match self {
            Role::User => "You:",
            Role::Assistant | Role::System => "Anthony:",
        }
    }

    /// Log line class
    pub fn line_class(&self) -> &'static str {
        match self {
            Role::User => "aim-line aim-line-outgoing",
            Role::Assistant | Role::System => "aim-line aim-line-incoming",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

impl ChatMessage {
    pub fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
        }
    }
}

/// Request body
#[derive(Debug, Serialize)]
pub struct ChatRequest {
    pub messages: Vec<ChatMessage>,
}

/// Response body; either field may be missing
#[derive(Debug, Default, Deserialize)]
pub struct ChatResponse {
    #[serde(default)]
    pub reply: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
}

/// Why a reply could not be shown
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChatError {
    NotFound { endpoint: String },
    Server(String),
    Unreachable,
    EmptyReply,
    Offline,
}

impl std::fmt::Display for ChatError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ChatError::NotFound { endpoint } => write!(
                f,
                "Chat endpoint not found. If deployed, add a backend route at `{endpoint}`."
            ),
            ChatError::Server(message) => f.write_str(message),
            ChatError::Unreachable => f.write_str("Unable to reach chat service."),
            ChatError::EmptyReply => f.write_str("Empty response from chat service."),
            ChatError::Offline => {
                f.write_str("Buddy Chat is offline right now. Please try again in a moment.")
            }
        }
    }
}

impl std::error::Error for ChatError {}

/// The slice of history the relay accepts
pub fn outbound_history(messages: &[ChatMessage]) -> Vec<ChatMessage> {
    let kept: Vec<ChatMessage> = messages
        .iter()
        .filter(|m| matches!(m.role, Role::User | Role::Assistant))
        .map(|m| ChatMessage::new(m.role, m.content.chars().take(MAX_CONTENT_CHARS).collect::<String>()))
        .collect();
    let skip = kept.len().saturating_sub(MAX_HISTORY_TURNS);
    kept.into_iter().skip(skip).collect()
}

/// Delay before showing `reply` (ms)
pub fn reply_delay_ms<R: Rng>(reply: &str, rng: &mut R) -> u32 {
    let read_and_type = (reply.chars().count() as u32)
        .saturating_mul(REPLY_PER_CHAR_MS)
        .min(REPLY_READ_CAP_MS);
    REPLY_BASE_MS + read_and_type + rng.random_range(0..REPLY_JITTER_MS)
}

/// Turn an HTTP status and body into a reply or an error
pub fn interpret_response(status: u16, body: Option<&str>, endpoint: &str) -> Result<String, ChatError> {
    let payload: Option<ChatResponse> = body.and_then(|b| serde_json::from_str(b).ok());

    if !(200..300).contains(&status) {
        if status == 404 {
            return Err(ChatError::NotFound {
                endpoint: endpoint.to_string(),
            });
        }
        return Err(payload
            .and_then(|p| p.error)
            .map(ChatError::Server)
            .unwrap_or(ChatError::Unreachable));
    }

    let reply = payload
        .and_then(|p| p.reply)
        .map(|r| r.trim().to_string())
        .unwrap_or_default();
    if reply.is_empty() {
        return Err(ChatError::EmptyReply);
    }
    Ok(reply)
}

/// Running conversation, greeting first
#[derive(Debug, Clone)]
pub struct Conversation {
    messages: Vec<ChatMessage>,
}

impl Default for Conversation {
    fn default() -> Self {
        Self::new()
    }
}

impl Conversation {
    pub fn new() -> Self {
        Self {
            messages: vec![ChatMessage::new(Role::Assistant, GREETING)],
        }
    }

    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    /// Record the user's line; blank input is ignored
    pub fn push_user(&mut self, text: &str) -> Option<&ChatMessage> {
        let text = text.trim();
        if text.is_empty() {
            return None;
        }
        self.messages.push(ChatMessage::new(Role::User, text));
        self.messages.last()
    }

    pub fn push_assistant(&mut self, text: impl Into<String>) {
        self.messages.push(ChatMessage::new(Role::Assistant, text));
    }

    /// JSON body for the relay
    pub fn request_body(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(&ChatRequest {
            messages: outbound_history(&self.messages),
        })
    }
}

/// POST the conversation to the relay (WASM only)
#[cfg(target_arch = "wasm32")]
pub async fn send(endpoint: &str, conversation: &Conversation) -> Result<String, ChatError> {
    use wasm_bindgen::JsCast;
    use wasm_bindgen::JsValue;
    use wasm_bindgen_futures::JsFuture;

    let body = conversation.request_body().map_err(|_| ChatError::Offline)?;

    let opts = web_sys::RequestInit::new();
    opts.set_method("POST");
    opts.set_body(&JsValue::from_str(&body));
    let request =
        web_sys::Request::new_with_str_and_init(endpoint, &opts).map_err(|_| ChatError::Offline)?;
    request
        .headers()
        .set("Content-Type", "application/json")
        .map_err(|_| ChatError::Offline)?;

    let window = web_sys::window().ok_or(ChatError::Offline)?;
    let response = JsFuture::from(window.fetch_with_request(&request))
        .await
        .map_err(|e| {
            log::warn!("Chat relay unreachable: {:?}", e);
            ChatError::Offline
        })?;
    let response: web_sys::Response = response.dyn_into().map_err(|_| ChatError::Offline)?;

    let text = match response.text() {
        Ok(promise) => JsFuture::from(promise).await.ok().and_then(|v| v.as_string()),
        Err(_) => None,
    };

    let result = interpret_response(response.status(), text.as_deref(), endpoint);
    if let Err(err) = &result {
        log::warn!("Chat relay error: {}", err);
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_pcg::Pcg32;

    #[test]
    fn test_history_filters_truncates_and_bounds() {
        let mut messages = vec![ChatMessage::new(Role::System, "be nice")];
        for i in 0..20 {
            let role = if i % 2 == 0 { Role::User } else { Role::Assistant };
            messages.push(ChatMessage::new(role, format!("m{i}")));
        }
        messages.push(ChatMessage::new(Role::User, "x".repeat(2000)));

        let out = outbound_history(&messages);
        assert_eq!(out.len(), MAX_HISTORY_TURNS);
        assert!(out.iter().all(|m| m.role != Role::System));
        assert_eq!(out[0].content, "m9");
        assert_eq!(out.last().map(|m| m.content.len()), Some(MAX_CONTENT_CHARS));
    }

    #[test]
    fn test_reply_delay_bounds() {
        let mut rng = Pcg32::seed_from_u64(5);
        for _ in 0..100 {
            let short = reply_delay_ms("hey", &mut rng);
            assert!((742..1002).contains(&short));
            let long = reply_delay_ms(&"a".repeat(500), &mut rng);
            assert!((2400..2660).contains(&long));
        }
    }

    #[test]
    fn test_interpret_response() {
        let endpoint = "/api/buddy-chat";
        assert_eq!(
            interpret_response(200, Some(r#"{"reply":"  sup  "}"#), endpoint),
            Ok("sup".to_string())
        );
        assert_eq!(
            interpret_response(200, Some(r#"{"reply":"   "}"#), endpoint),
            Err(ChatError::EmptyReply)
        );
        assert_eq!(interpret_response(200, None, endpoint), Err(ChatError::EmptyReply));
        assert_eq!(
            interpret_response(502, Some(r#"{"error":"upstream"}"#), endpoint),
            Err(ChatError::Server("upstream".to_string()))
        );
        assert_eq!(interpret_response(500, Some("<html>"), endpoint), Err(ChatError::Unreachable));

        let not_found = interpret_response(404, None, endpoint).unwrap_err();
        assert!(not_found.to_string().contains("/api/buddy-chat"));
    }

    #[test]
    fn test_conversation_body() {
        let mut convo = Conversation::new();
        assert!(convo.push_user("   ").is_none());
        assert_eq!(convo.push_user(" hi ").map(|m| m.content.as_str()), Some("hi"));
        convo.push_assistant("hello");

        let body = convo.request_body().unwrap();
        let value: serde_json::Value = serde_json::from_str(&body).unwrap();
        assert_eq!(value["messages"][0]["role"], "assistant");
        assert_eq!(value["messages"][0]["content"], GREETING);
        assert_eq!(value["messages"][1]["role"], "user");
        assert_eq!(value["messages"].as_array().map(Vec::len), Some(3));
    }

    #[test]
    fn test_speakers() {
        assert_eq!(Role::User.speaker(), "You:");
        assert_eq!(Role::Assistant.speaker(), "Anthony:");
        assert!(Role::User.line_class().ends_with("outgoing"));
    }
}
