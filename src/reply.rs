//! Reply orchestrator: simulates the counterparty answering a message.
//!
//! The text-generation collaborator is a black box behind [`ReplyGenerator`]:
//! prompt in, text out.  A failed or empty call never reaches the user as an
//! error; it degrades to a fixed fallback phrase and a log line.
//!
//! Orchestration around the call: show the typing indicator, wait a
//! randomized "thinking" delay, generate, persist the reply as a
//! counterparty-authored message (already `seen`; their read state is
//! irrelevant to the local user), hold the indicator briefly for realism,
//! then clear it.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use rand::Rng;
use tokio_util::sync::CancellationToken;

use crate::lifecycle::{Event, SharedEngine};
use crate::model::{Message, User};
use crate::{logging, mlog};

/// Used when the collaborator call fails outright.
pub const FALLBACK_REPLY: &str = "Nice! 👍";

/// Used when the collaborator succeeds but returns nothing usable.
pub const EMPTY_REPLY: &str = "That's cool! 🙌";

const THINKING_DELAY_MIN_MS: u64 = 2_000;
const THINKING_DELAY_MAX_MS: u64 = 4_000;

/// How long the typing indicator lingers after the reply is persisted.
const TYPING_HOLD: Duration = Duration::from_millis(1_000);

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

#[derive(Debug)]
pub enum GeneratorError {
    Http(reqwest::Error),
    Api(String),
}

impl std::fmt::Display for GeneratorError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            GeneratorError::Http(e) => write!(f, "http error: {e}"),
            GeneratorError::Api(msg) => write!(f, "api error: {msg}"),
        }
    }
}

impl std::error::Error for GeneratorError {}

impl From<reqwest::Error> for GeneratorError {
    fn from(e: reqwest::Error) -> Self {
        GeneratorError::Http(e)
    }
}

// ---------------------------------------------------------------------------
// Generators
// ---------------------------------------------------------------------------

/// External text-generation collaborator: one prompt in, one string out.
#[async_trait]
pub trait ReplyGenerator: Send + Sync {
    async fn generate(&self, prompt: &str) -> Result<String, GeneratorError>;

    /// Short name for startup logging and the health endpoint.
    fn label(&self) -> &'static str;
}

/// Default model used when none is configured.
pub const DEFAULT_GEMINI_MODEL: &str = "gemini-3-pro-preview";

/// HTTP client for the Gemini `generateContent` REST endpoint.
pub struct GeminiGenerator {
    client: reqwest::Client,
    api_key: String,
    model: String,
}

impl GeminiGenerator {
    pub fn new(api_key: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_key: api_key.into(),
            model: model.into(),
        }
    }
}

#[async_trait]
impl ReplyGenerator for GeminiGenerator {
    async fn generate(&self, prompt: &str) -> Result<String, GeneratorError> {
        let url = format!(
            "https://generativelanguage.googleapis.com/v1beta/models/{}:generateContent?key={}",
            self.model, self.api_key
        );
        let body = serde_json::json!({
            "contents": [{ "parts": [{ "text": prompt }] }],
        });

        let resp = self.client.post(&url).json(&body).send().await?;
        if !resp.status().is_success() {
            return Err(GeneratorError::Api(format!(
                "generateContent returned {}",
                resp.status()
            )));
        }

        let value: serde_json::Value = resp.json().await?;
        let text = value["candidates"][0]["content"]["parts"][0]["text"]
            .as_str()
            .unwrap_or_default()
            .to_string();
        Ok(text)
    }

    fn label(&self) -> &'static str {
        "gemini"
    }
}

/// Offline generator cycling through canned replies.  Used when no API key
/// is configured, and by tests.
pub struct ScriptedGenerator {
    replies: Vec<String>,
    cursor: AtomicUsize,
}

impl ScriptedGenerator {
    pub fn new(replies: Vec<String>) -> Self {
        Self {
            replies,
            cursor: AtomicUsize::new(0),
        }
    }
}

impl Default for ScriptedGenerator {
    fn default() -> Self {
        Self::new(vec![
            "Haha love that! 😄".to_string(),
            "No way, tell me more!".to_string(),
            "Sounds good to me 🙌".to_string(),
            "That's wild 😂".to_string(),
        ])
    }
}

#[async_trait]
impl ReplyGenerator for ScriptedGenerator {
    async fn generate(&self, _prompt: &str) -> Result<String, GeneratorError> {
        if self.replies.is_empty() {
            return Err(GeneratorError::Api("no scripted replies".to_string()));
        }
        let i = self.cursor.fetch_add(1, Ordering::Relaxed) % self.replies.len();
        Ok(self.replies[i].clone())
    }

    fn label(&self) -> &'static str {
        "scripted"
    }
}

// ---------------------------------------------------------------------------
// Orchestration
// ---------------------------------------------------------------------------

/// Collaborator sees only the latest user message and the counterparty's
/// display name; no conversation-level context crosses the boundary.
pub fn build_prompt(user_message: &str, counterparty_name: &str) -> String {
    format!(
        "You are simulating a conversation on a social app. You are talking to \
         {counterparty_name}. Respond to their message: \"{user_message}\" in a \
         friendly, concise social media style."
    )
}

fn thinking_delay() -> Duration {
    let ms = rand::thread_rng().gen_range(THINKING_DELAY_MIN_MS..=THINKING_DELAY_MAX_MS);
    Duration::from_millis(ms)
}

/// Spawn the auto-reply task for one qualifying sent message.
pub fn spawn_auto_reply(
    engine: SharedEngine,
    conv_id: String,
    user_text: String,
    counterparty: User,
    token: CancellationToken,
) {
    tokio::spawn(run_auto_reply(
        engine,
        conv_id,
        user_text,
        counterparty,
        token,
    ));
}

async fn run_auto_reply(
    engine: SharedEngine,
    conv_id: String,
    user_text: String,
    counterparty: User,
    token: CancellationToken,
) {
    let (generator, events) = {
        let eng = engine.lock().await;
        (Arc::clone(&eng.generator), eng.events.clone())
    };

    let _ = events.send(Event::TypingStarted {
        conversation_id: conv_id.clone(),
    });

    tokio::select! {
        _ = token.cancelled() => {
            let _ = events.send(Event::TypingStopped { conversation_id: conv_id });
            return;
        }
        _ = tokio::time::sleep(thinking_delay()) => {}
    }

    let prompt = build_prompt(&user_text, &counterparty.username);
    let reply_text = tokio::select! {
        _ = token.cancelled() => {
            let _ = events.send(Event::TypingStopped { conversation_id: conv_id });
            return;
        }
        result = generator.generate(&prompt) => match result {
            Ok(text) if text.trim().is_empty() => EMPTY_REPLY.to_string(),
            Ok(text) => text,
            Err(e) => {
                mlog!(
                    "reply: generation failed for {}, using fallback: {}",
                    logging::conv_id(&conv_id),
                    e
                );
                FALLBACK_REPLY.to_string()
            }
        }
    };

    {
        let mut eng = engine.lock().await;
        let mut message = Message::new(counterparty.id.clone(), reply_text);
        message.seen = true;
        match eng.repository.add_message(&conv_id, message.clone()) {
            Ok(_) => {
                mlog!(
                    "reply: {} persisted in {}",
                    logging::msg_id(&message.id),
                    logging::conv_id(&conv_id)
                );
                let _ = eng.events.send(Event::NewMessage {
                    conversation_id: conv_id.clone(),
                    message,
                });
            }
            Err(e) if e.is_not_found() => {
                // Conversation deleted while we were thinking.
                let _ = events.send(Event::TypingStopped { conversation_id: conv_id });
                return;
            }
            Err(e) => mlog!("reply: persist failed for {}: {}", logging::conv_id(&conv_id), e),
        }
    }

    // Keep the indicator up briefly after the reply lands.
    tokio::select! {
        _ = token.cancelled() => {}
        _ = tokio::time::sleep(TYPING_HOLD) => {}
    }
    let _ = events.send(Event::TypingStopped {
        conversation_id: conv_id,
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prompt_carries_message_and_name() {
        let prompt = build_prompt("see you at 8?", "masta_otf");
        assert!(prompt.contains("masta_otf"));
        assert!(prompt.contains("\"see you at 8?\""));
    }

    #[tokio::test]
    async fn scripted_generator_cycles() {
        let gen = ScriptedGenerator::new(vec!["a".into(), "b".into()]);
        assert_eq!(gen.generate("x").await.unwrap(), "a");
        assert_eq!(gen.generate("x").await.unwrap(), "b");
        assert_eq!(gen.generate("x").await.unwrap(), "a");
    }

    #[tokio::test]
    async fn scripted_generator_without_replies_fails() {
        let gen = ScriptedGenerator::new(Vec::new());
        assert!(gen.generate("x").await.is_err());
    }
}
