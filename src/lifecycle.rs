//! Message lifecycle engine.
//!
//! Governs the send protocol and the timer-driven `sent -> seen` transition
//! that simulates a remote read receipt.  All mutations funnel through one
//! async mutex around the repository, so deferred callbacks and user actions
//! serialize instead of clobbering each other's whole-list writes.
//!
//! Timers are cancellable tasks keyed by conversation id: deleting a
//! conversation cancels everything still scheduled for it, and a new
//! qualifying send cancels any auto-reply that is still pending, so exactly
//! one reply is in flight per conversation.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{broadcast, Mutex};
use tokio_util::sync::CancellationToken;

use crate::model::{Conversation, Message, User, LOCAL_USER_ID};
use crate::reply::{self, ReplyGenerator};
use crate::repository::{ConversationRepository, RepoError};
use crate::{logging, mlog};

/// Delay before a locally-authored message is marked seen, simulating the
/// counterparty's read latency.
pub const SEEN_DELAY: Duration = Duration::from_secs(2);

const EVENT_CHANNEL_CAPACITY: usize = 256;

/// Events broadcast to the presentation layer (WebSocket clients).
#[derive(Clone, Debug, serde::Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Event {
    NewMessage {
        conversation_id: String,
        message: Message,
    },
    MessageSeen {
        conversation_id: String,
        message_id: String,
    },
    TypingStarted {
        conversation_id: String,
    },
    TypingStopped {
        conversation_id: String,
    },
    ConversationRead {
        conversation_id: String,
    },
    ConversationDeleted {
        conversation_id: String,
    },
}

/// Cancellation tokens keyed by conversation id.
///
/// Each conversation owns one root token; seen-mark timers and the pending
/// auto-reply run under child tokens of it.  Cancelling the root (on
/// deletion) tears everything down; starting a new reply cancels only the
/// previous reply.
#[derive(Default)]
pub struct TimerRegistry {
    conversations: HashMap<String, CancellationToken>,
    replies: HashMap<String, CancellationToken>,
}

impl TimerRegistry {
    fn conversation_token(&mut self, conv_id: &str) -> CancellationToken {
        self.conversations
            .entry(conv_id.to_string())
            .or_default()
            .clone()
    }

    /// Child token for a one-shot timer scoped to the conversation.
    pub fn timer_token(&mut self, conv_id: &str) -> CancellationToken {
        self.conversation_token(conv_id).child_token()
    }

    /// Token for a new pending reply, cancelling any reply still in flight
    /// for this conversation.
    pub fn begin_reply(&mut self, conv_id: &str) -> CancellationToken {
        if let Some(prev) = self.replies.remove(conv_id) {
            prev.cancel();
        }
        let token = self.conversation_token(conv_id).child_token();
        self.replies.insert(conv_id.to_string(), token.clone());
        token
    }

    /// Cancel every timer and pending reply for the conversation.
    pub fn cancel_conversation(&mut self, conv_id: &str) {
        if let Some(token) = self.conversations.remove(conv_id) {
            token.cancel();
        }
        self.replies.remove(conv_id);
    }
}

/// Everything the messaging core shares between user actions and fired
/// timers.
pub struct Engine {
    pub repository: ConversationRepository,
    pub generator: Arc<dyn ReplyGenerator>,
    pub events: broadcast::Sender<Event>,
    pub timers: TimerRegistry,
}

pub type SharedEngine = Arc<Mutex<Engine>>;

impl Engine {
    pub fn new(repository: ConversationRepository, generator: Arc<dyn ReplyGenerator>) -> Self {
        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Self {
            repository,
            generator,
            events,
            timers: TimerRegistry::default(),
        }
    }

    pub fn shared(
        repository: ConversationRepository,
        generator: Arc<dyn ReplyGenerator>,
    ) -> SharedEngine {
        Arc::new(Mutex::new(Self::new(repository, generator)))
    }
}

/// Send protocol:
///
/// 1. Construct the message; when impersonating, the sender is the
///    counterparty, otherwise the local user.
/// 2. Persist it and broadcast `NewMessage`.
/// 3. Not impersonating: schedule the deferred seen-mark.
/// 4. Not impersonating and AI enabled: hand off to the reply orchestrator.
///
/// Impersonated sends bypass both timers entirely.
pub async fn send_message(
    engine: &SharedEngine,
    conv_id: &str,
    text: &str,
    impersonate: bool,
) -> Result<(Message, Vec<Conversation>), RepoError> {
    let (message, conversations, ai_enabled, counterparty) = {
        let mut eng = engine.lock().await;

        let list = eng.repository.list_conversations()?;
        let conv = list
            .iter()
            .find(|c| c.id == conv_id)
            .ok_or_else(|| RepoError::ConversationNotFound(conv_id.to_string()))?;
        let counterparty: User = conv.user.clone();
        let ai_enabled = conv.ai_enabled;

        let sender = if impersonate {
            counterparty.id.clone()
        } else {
            LOCAL_USER_ID.to_string()
        };
        let message = Message::new(sender, text);

        let conversations = eng.repository.add_message(conv_id, message.clone())?;
        mlog!(
            "send: {} appended to {} (impersonate={})",
            logging::msg_id(&message.id),
            logging::conv_id(conv_id),
            impersonate
        );
        let _ = eng.events.send(Event::NewMessage {
            conversation_id: conv_id.to_string(),
            message: message.clone(),
        });

        (message, conversations, ai_enabled, counterparty)
    };
    // Lock released before any timer is spawned.

    if !impersonate {
        let token = {
            let mut eng = engine.lock().await;
            eng.timers.timer_token(conv_id)
        };
        schedule_seen_mark(
            Arc::clone(engine),
            conv_id.to_string(),
            message.id.clone(),
            token,
        );

        if ai_enabled {
            let reply_token = {
                let mut eng = engine.lock().await;
                eng.timers.begin_reply(conv_id)
            };
            reply::spawn_auto_reply(
                Arc::clone(engine),
                conv_id.to_string(),
                text.to_string(),
                counterparty,
                reply_token,
            );
        }
    }

    Ok((message, conversations))
}

/// Delete a conversation, first cancelling every timer scheduled for it so a
/// stale callback cannot resurrect removed state.
pub async fn delete_conversation(
    engine: &SharedEngine,
    conv_id: &str,
) -> Result<Vec<Conversation>, RepoError> {
    let mut eng = engine.lock().await;
    eng.timers.cancel_conversation(conv_id);
    let conversations = eng.repository.delete_conversation(conv_id)?;
    let _ = eng.events.send(Event::ConversationDeleted {
        conversation_id: conv_id.to_string(),
    });
    Ok(conversations)
}

/// Deferred read receipt: after [`SEEN_DELAY`], flag the message seen and
/// broadcast the transition.  A message or conversation deleted in the
/// meantime makes this a silent no-op.
fn schedule_seen_mark(
    engine: SharedEngine,
    conv_id: String,
    msg_id: String,
    token: CancellationToken,
) {
    tokio::spawn(async move {
        tokio::select! {
            _ = token.cancelled() => return,
            _ = tokio::time::sleep(SEEN_DELAY) => {}
        }

        let mut eng = engine.lock().await;
        match eng.repository.mark_message_seen(&conv_id, &msg_id) {
            Ok(_) => {
                let _ = eng.events.send(Event::MessageSeen {
                    conversation_id: conv_id.clone(),
                    message_id: msg_id.clone(),
                });
                mlog!(
                    "seen: {} in {}",
                    logging::msg_id(&msg_id),
                    logging::conv_id(&conv_id)
                );
            }
            Err(e) if e.is_not_found() => {} // deleted while the timer ran
            Err(e) => mlog!("seen-mark failed for {}: {}", logging::msg_id(&msg_id), e),
        }
    });
}
