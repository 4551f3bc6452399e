//! Data model for conversations, messages, reactions, and profiles.
//!
//! These types serialize to the camelCase JSON shape held in the blob store,
//! so an existing data file keeps loading across releases.  Timestamps are
//! display strings, not instants: the store is a presentation cache, and the
//! UI renders them verbatim.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};

/// Sender id for everything the local operator writes as themselves.
pub const LOCAL_USER_ID: &str = "me";

/// Conversation-list label for a thread with no messages yet.
pub const NO_MESSAGES: &str = "No messages";

/// Conversation-list timestamp label applied on every message mutation.
pub const NOW_LABEL: &str = "Now";

/// A participant identity.  Counterparty users are embedded copies owned by
/// their conversation; editing one never affects another thread.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: String,
    pub username: String,
    pub full_name: String,
    pub avatar: String,
    #[serde(default)]
    pub is_verified: bool,
    #[serde(default)]
    pub is_active: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub followers: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub posts_count: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub following_since: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mutual_follows: Option<String>,
}

/// The local user's singleton record: a [`User`] plus profile-page extras.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Profile {
    #[serde(flatten)]
    pub user: User,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bio: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub website: Option<String>,
}

/// Single-emoji annotation on a message.  At most one per sender.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Reaction {
    pub emoji: String,
    pub sender_id: String,
}

/// A chat message.  Immutable after creation except for `seen` and
/// `reactions`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    pub id: String,
    pub sender_id: String,
    pub text: String,
    pub timestamp: String,
    #[serde(default)]
    pub seen: bool,
    #[serde(default)]
    pub reactions: Vec<Reaction>,
}

impl Message {
    /// Construct a fresh unseen message stamped with the current wall-clock
    /// display time.
    pub fn new(sender_id: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            id: fresh_id("msg"),
            sender_id: sender_id.into(),
            text: text.into(),
            timestamp: display_time(),
            seen: false,
            reactions: Vec::new(),
        }
    }
}

/// A persisted thread between the local user and one counterparty.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Conversation {
    pub id: String,
    pub user: User,
    pub last_message: String,
    pub timestamp: String,
    pub unread: bool,
    pub messages: Vec<Message>,
    #[serde(default, rename = "isAiEnabled")]
    pub ai_enabled: bool,
}

impl Conversation {
    /// Fresh empty thread with the given counterparty, prepend-ready.
    pub fn new(user: User) -> Self {
        Self {
            id: fresh_id("conv"),
            user,
            last_message: NO_MESSAGES.to_string(),
            timestamp: NOW_LABEL.to_string(),
            unread: false,
            messages: Vec::new(),
            ai_enabled: false,
        }
    }

    /// Re-derive `last_message`/`timestamp` from the message tail, or the
    /// sentinel when the thread is empty.
    pub fn refresh_summary(&mut self) {
        self.last_message = self
            .messages
            .last()
            .map(|m| m.text.clone())
            .unwrap_or_else(|| NO_MESSAGES.to_string());
        self.timestamp = NOW_LABEL.to_string();
    }

    /// Summary invariant check, used by tests after every mutation.
    pub fn summary_matches_tail(&self) -> bool {
        match self.messages.last() {
            Some(m) => self.last_message == m.text,
            None => self.last_message == NO_MESSAGES,
        }
    }
}

/// Partial [`User`] update.  Absent fields are left untouched.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserPatch {
    pub username: Option<String>,
    pub full_name: Option<String>,
    pub avatar: Option<String>,
    pub is_verified: Option<bool>,
    pub is_active: Option<bool>,
    pub followers: Option<String>,
    pub posts_count: Option<String>,
    pub following_since: Option<String>,
    pub mutual_follows: Option<String>,
}

impl UserPatch {
    /// Shallow-merge the set fields into `user`.
    pub fn apply(&self, user: &mut User) {
        if let Some(v) = &self.username {
            user.username = v.clone();
        }
        if let Some(v) = &self.full_name {
            user.full_name = v.clone();
        }
        if let Some(v) = &self.avatar {
            user.avatar = v.clone();
        }
        if let Some(v) = self.is_verified {
            user.is_verified = v;
        }
        if let Some(v) = self.is_active {
            user.is_active = v;
        }
        if let Some(v) = &self.followers {
            user.followers = Some(v.clone());
        }
        if let Some(v) = &self.posts_count {
            user.posts_count = Some(v.clone());
        }
        if let Some(v) = &self.following_since {
            user.following_since = Some(v.clone());
        }
        if let Some(v) = &self.mutual_follows {
            user.mutual_follows = Some(v.clone());
        }
    }
}

/// Partial [`Profile`] update.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfilePatch {
    #[serde(flatten)]
    pub user: UserPatch,
    pub bio: Option<String>,
    pub website: Option<String>,
}

impl ProfilePatch {
    /// Shallow-merge the set fields into `profile`.
    pub fn apply(&self, profile: &mut Profile) {
        self.user.apply(&mut profile.user);
        if let Some(v) = &self.bio {
            profile.bio = Some(v.clone());
        }
        if let Some(v) = &self.website {
            profile.website = Some(v.clone());
        }
    }
}

static ID_COUNTER: AtomicU64 = AtomicU64::new(0);

/// Generate a unique id of the form `{prefix}-{millis}-{n}`.  The counter
/// disambiguates ids minted within the same millisecond.
pub fn fresh_id(prefix: &str) -> String {
    let millis = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis();
    let n = ID_COUNTER.fetch_add(1, Ordering::Relaxed);
    format!("{prefix}-{millis}-{n}")
}

/// Current wall-clock time as an `HH:MM` display string.
pub fn display_time() -> String {
    let secs = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs();
    let time_secs = secs % 86400;
    format!("{:02}:{:02}", time_secs / 3600, (time_secs % 3600) / 60)
}
